//! Two small supervised classifiers written from scratch.
//!
//! - [`Network`]: a fully-connected feed-forward network trained by mini-batch
//!   stochastic gradient descent with backpropagation.
//! - [`Lvq`]: a Learning Vector Quantization classifier that keeps one or more
//!   prototype vectors per class and trains by attracting/repelling the
//!   nearest prototype.
//!
//! Both implement [`Classifier`], which provides accuracy, error rate and a
//! confusion matrix over a [`Dataset`].
//!
//! # Strategies
//!
//! Pluggable functions are closed enums selected by string key:
//! [`Activation`], [`Cost`] and [`Regularization`] for the network,
//! [`Distance`] and [`PrototypeInit`] for LVQ. Saved models store these keys
//! and resolve them again on load.
//!
//! # Data layout and shapes
//!
//! - Scalars are `f64`.
//! - Layer weights are row-major with shape `(out_dim, in_dim)`.
//! - LVQ prototypes are stored class-major: row `slot * output_size + class`.
//!
//! # Panics vs `Result`
//!
//! Everything that takes user data (inputs, datasets, persisted files,
//! strategy keys) is shape-checked and returns [`Result`]. The low-level
//! [`Network::sgd_step`] treats mismatched gradients as a programmer error and
//! panics.
//!
//! # Quick start
//!
//! ```rust
//! use nn_lvq::{Classifier, Dataset, Monitoring, NetworkBuilder, TrainConfig};
//! use rand::SeedableRng;
//!
//! # fn main() -> nn_lvq::Result<()> {
//! let xs = vec![
//!     vec![0.0, 0.0],
//!     vec![0.0, 1.0],
//!     vec![1.0, 0.0],
//!     vec![1.0, 1.0],
//! ];
//! let train = Dataset::from_class_rows(&xs, &[0, 1, 1, 0], 2)?;
//!
//! let mut net = NetworkBuilder::new(&[2, 4, 2])?
//!     .cost("cross-entropy")?
//!     .learning_rate(1.0)?
//!     .build_with_seed(0)?;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(0);
//! let report = net.train(
//!     &train,
//!     None,
//!     &TrainConfig {
//!         epochs: 50,
//!         batch_size: 2,
//!         monitoring: Monitoring::all(),
//!         early_stop_patience: None,
//!     },
//!     &mut rng,
//! )?;
//! assert_eq!(report.history.train_cost.len(), 50);
//! let _errors = net.eval_error_rate(&train)?;
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod builder;
pub mod cost;
pub mod data;
pub mod distance;
pub mod error;
pub mod eval;
pub mod layer;
pub mod lvq;
pub(crate) mod matmul;
pub mod metrics;
pub mod network;
pub mod prototype_init;
pub mod regularization;
pub mod serde_model;
pub mod state;
pub mod strategy;
pub mod train;

pub use activation::Activation;
pub use builder::NetworkBuilder;
pub use cost::Cost;
pub use data::{Dataset, Label};
pub use distance::Distance;
pub use error::{Error, Result};
pub use eval::{Classifier, ConfusionMatrix};
pub use layer::Layer;
pub use lvq::{Lvq, LvqConfig, LvqReport, LvqTrainConfig};
pub use metrics::{Metric, Monitoring};
pub use network::{ForwardCache, Gradients, Hyperparameters, Network};
pub use prototype_init::PrototypeInit;
pub use regularization::Regularization;
pub use serde_model::{SerializedLvq, SerializedNetwork};
pub use state::ModelState;
pub use strategy::Strategy;
pub use train::{MetricHistory, TrainConfig, TrainOutcome, TrainReport};
