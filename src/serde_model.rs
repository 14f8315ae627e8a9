//! Model persistence.
//!
//! Models are not serialized directly. They are converted to the versioned
//! `SerializedNetwork` / `SerializedLvq` containers, which hold nested rows
//! and strategy keys so the files stay readable and hand-editable. Loading
//! re-resolves every strategy key and validates every shape.
//!
//! With the `serde` feature, `save`/`load` write YAML unless the path ends in
//! `.json`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "serde")]
use std::path::Path;

use crate::network::Hyperparameters;
use crate::strategy::Strategy;
use crate::{
    Activation, Cost, Distance, Error, Layer, Lvq, LvqConfig, Network, PrototypeInit,
    Regularization, Result,
};

pub const MODEL_FORMAT_VERSION: u32 = 1;

#[cfg(feature = "serde")]
fn current_version() -> u32 {
    MODEL_FORMAT_VERSION
}

#[cfg(feature = "serde")]
fn default_regularization() -> String {
    Regularization::None.key().to_owned()
}

#[cfg(feature = "serde")]
fn default_lambda() -> f64 {
    Hyperparameters::default().lambda
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SerializedNetwork {
    #[cfg_attr(feature = "serde", serde(default = "current_version"))]
    pub format_version: u32,
    #[cfg_attr(feature = "serde", serde(alias = "struct"))]
    pub sizes: Vec<usize>,
    pub activation: String,
    pub cost: String,
    #[cfg_attr(feature = "serde", serde(default = "default_regularization"))]
    pub regularization: String,
    #[cfg_attr(feature = "serde", serde(alias = "eta"))]
    pub learning_rate: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_lambda"))]
    pub lambda: f64,
    /// One `(sizes[l + 1], sizes[l])` matrix per layer, as rows.
    pub weights: Vec<Vec<Vec<f64>>>,
    pub biases: Vec<Vec<f64>>,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SerializedLvq {
    #[cfg_attr(feature = "serde", serde(default = "current_version"))]
    pub format_version: u32,
    pub input_size: usize,
    pub output_size: usize,
    pub prototypes_per_class: usize,
    pub distance: String,
    pub init: String,
    /// Rows in storage order; empty for an uninitialized model.
    #[cfg_attr(feature = "serde", serde(default))]
    pub prototypes: Vec<Vec<f64>>,
}

fn check_version(version: u32) -> Result<()> {
    if version != MODEL_FORMAT_VERSION {
        return Err(Error::MalformedPersistedState(format!(
            "unsupported format_version {version}; expected {MODEL_FORMAT_VERSION}"
        )));
    }
    Ok(())
}

/// Shape problems in a persisted file are reported as malformed state; every
/// other error (unknown strategy, incompatible combination) keeps its kind.
fn malformed(context: &str, err: Error) -> Error {
    match err {
        Error::DimensionMismatch { .. } | Error::InvalidData(_) | Error::InvalidConfig(_) => {
            Error::MalformedPersistedState(format!("{context}: {err}"))
        }
        other => other,
    }
}

impl From<&Network> for SerializedNetwork {
    fn from(network: &Network) -> Self {
        let weights = network
            .layers()
            .iter()
            .map(|l| l.weights().chunks(l.in_dim()).map(<[f64]>::to_vec).collect())
            .collect();
        let biases = network.layers().iter().map(|l| l.biases().to_vec()).collect();
        Self {
            format_version: MODEL_FORMAT_VERSION,
            sizes: network.sizes().to_vec(),
            activation: network.activation().key().to_owned(),
            cost: network.cost().key().to_owned(),
            regularization: network.regularization().key().to_owned(),
            learning_rate: network.learning_rate(),
            lambda: network.lambda(),
            weights,
            biases,
        }
    }
}

impl TryFrom<SerializedNetwork> for Network {
    type Error = Error;

    fn try_from(value: SerializedNetwork) -> Result<Self> {
        check_version(value.format_version)?;

        let hyper = Hyperparameters {
            activation: Activation::from_key(&value.activation)?,
            cost: Cost::from_key(&value.cost)?,
            regularization: Regularization::from_key(&value.regularization)?,
            learning_rate: value.learning_rate,
            lambda: value.lambda,
        };
        hyper.validate().map_err(|e| malformed("hyperparameters", e))?;

        let sizes = value.sizes;
        if sizes.len() < 2 {
            return Err(Error::MalformedPersistedState(
                "sizes must include input and output dims".to_owned(),
            ));
        }
        let num_layers = sizes.len() - 1;
        if value.weights.len() != num_layers || value.biases.len() != num_layers {
            return Err(Error::MalformedPersistedState(format!(
                "expected {num_layers} weight and bias entries, found {} and {}",
                value.weights.len(),
                value.biases.len()
            )));
        }

        let mut layers = Vec::with_capacity(num_layers);
        let params = value.weights.into_iter().zip(value.biases);
        for (idx, (rows, biases)) in params.enumerate() {
            let (in_dim, out_dim) = (sizes[idx], sizes[idx + 1]);
            if rows.len() != out_dim || rows.iter().any(|r| r.len() != in_dim) {
                return Err(Error::MalformedPersistedState(format!(
                    "layer {idx} weights are not a {out_dim}x{in_dim} matrix"
                )));
            }
            let weights = rows.into_iter().flatten().collect();
            let layer = Layer::from_parts(in_dim, out_dim, weights, biases)
                .map_err(|e| malformed(&format!("layer {idx}"), e))?;
            layers.push(layer);
        }

        Network::from_layers(layers, hyper).map_err(|e| malformed("network", e))
    }
}

impl From<&Lvq> for SerializedLvq {
    fn from(lvq: &Lvq) -> Self {
        let config = lvq.config();
        Self {
            format_version: MODEL_FORMAT_VERSION,
            input_size: config.input_size,
            output_size: config.output_size,
            prototypes_per_class: config.prototypes_per_class,
            distance: config.distance.key().to_owned(),
            init: config.init.key().to_owned(),
            prototypes: lvq.prototype_rows(),
        }
    }
}

impl TryFrom<SerializedLvq> for Lvq {
    type Error = Error;

    fn try_from(value: SerializedLvq) -> Result<Self> {
        check_version(value.format_version)?;
        let config = LvqConfig {
            input_size: value.input_size,
            output_size: value.output_size,
            prototypes_per_class: value.prototypes_per_class,
            distance: Distance::from_key(&value.distance)?,
            init: PrototypeInit::from_key(&value.init)?,
        };
        let lvq = if value.prototypes.is_empty() {
            Lvq::new(config)
        } else {
            Lvq::from_prototypes(config, &value.prototypes)
        };
        lvq.map_err(|e| malformed("lvq", e))
    }
}

impl Network {
    pub fn to_serialized(&self) -> SerializedNetwork {
        SerializedNetwork::from(self)
    }
}

impl Lvq {
    pub fn to_serialized(&self) -> SerializedLvq {
        SerializedLvq::from(self)
    }
}

#[cfg(feature = "serde")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Yaml,
    Json,
}

#[cfg(feature = "serde")]
impl Format {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Yaml,
        }
    }

    fn write<T: Serialize>(self, value: &T) -> Result<String> {
        match self {
            Format::Yaml => serde_yaml::to_string(value)
                .map_err(|e| Error::InvalidData(format!("failed to serialize model: {e}"))),
            Format::Json => serde_json::to_string_pretty(value)
                .map_err(|e| Error::InvalidData(format!("failed to serialize model: {e}"))),
        }
    }

    fn read<T: for<'de> Deserialize<'de>>(self, s: &str) -> Result<T> {
        match self {
            Format::Yaml => serde_yaml::from_str(s)
                .map_err(|e| Error::MalformedPersistedState(format!("invalid yaml: {e}"))),
            Format::Json => serde_json::from_str(s)
                .map_err(|e| Error::MalformedPersistedState(format!("invalid json: {e}"))),
        }
    }
}

#[cfg(feature = "serde")]
fn save_as<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let s = Format::from_path(path).write(value)?;
    std::fs::write(path, s)?;
    tracing::debug!(path = %path.display(), "saved model");
    Ok(())
}

#[cfg(feature = "serde")]
fn load_from<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let s = std::fs::read_to_string(path)?;
    Format::from_path(path).read(&s)
}

#[cfg(feature = "serde")]
impl Network {
    pub fn to_yaml_string(&self) -> Result<String> {
        Format::Yaml.write(&self.to_serialized())
    }

    pub fn from_yaml_str(s: &str) -> Result<Self> {
        Format::Yaml.read::<SerializedNetwork>(s)?.try_into()
    }

    /// Pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Format::Json.write(&self.to_serialized())
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Format::Json.read::<SerializedNetwork>(s)?.try_into()
    }

    /// Write the network to `path`: JSON for a `.json` extension, YAML
    /// otherwise.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        save_as(&self.to_serialized(), path.as_ref())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        load_from::<SerializedNetwork>(path.as_ref())?.try_into()
    }
}

#[cfg(feature = "serde")]
impl Lvq {
    pub fn to_yaml_string(&self) -> Result<String> {
        Format::Yaml.write(&self.to_serialized())
    }

    pub fn from_yaml_str(s: &str) -> Result<Self> {
        Format::Yaml.read::<SerializedLvq>(s)?.try_into()
    }

    pub fn to_json_string(&self) -> Result<String> {
        Format::Json.write(&self.to_serialized())
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Format::Json.read::<SerializedLvq>(s)?.try_into()
    }

    /// Same format rules as `Network::save`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        save_as(&self.to_serialized(), path.as_ref())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        load_from::<SerializedLvq>(path.as_ref())?.try_into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ModelState, NetworkBuilder};

    fn small_network() -> Network {
        let l1 = Layer::from_parts(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![0.1, 0.2, 0.3])
            .unwrap();
        let l2 = Layer::from_parts(3, 1, vec![7.0, 8.0, 9.0], vec![0.4]).unwrap();
        Network::from_layers(vec![l1, l2], Hyperparameters::default()).unwrap()
    }

    #[test]
    fn weights_are_nested_rows() {
        let ser = small_network().to_serialized();
        assert_eq!(ser.sizes, vec![2, 3, 1]);
        assert_eq!(
            ser.weights[0],
            vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]
        );
        assert_eq!(ser.weights[1], vec![vec![7.0, 8.0, 9.0]]);
        assert_eq!(ser.activation, "sigmoid");
        assert_eq!(ser.regularization, "none");

        let back = Network::try_from(ser).unwrap();
        assert_eq!(back, small_network());
    }

    #[test]
    fn strategy_keys_are_resolved_on_load() {
        let net = NetworkBuilder::new(&[2, 2])
            .and_then(|b| b.activation("tanh"))
            .and_then(|b| b.regularization("L2"))
            .and_then(|b| b.build_with_seed(0))
            .unwrap();
        let mut ser = net.to_serialized();
        ser.activation = "Tanh".to_owned();
        let back = Network::try_from(ser.clone()).unwrap();
        assert_eq!(back.activation(), Activation::Tanh);
        assert_eq!(back.regularization(), Regularization::L2);

        ser.activation = "softplus".to_owned();
        assert!(matches!(
            Network::try_from(ser),
            Err(Error::UnsupportedStrategy { family: "activation", .. })
        ));
    }

    #[test]
    fn ragged_weights_are_malformed() {
        let mut ser = small_network().to_serialized();
        ser.weights[0][1].pop();
        assert!(matches!(
            Network::try_from(ser),
            Err(Error::MalformedPersistedState(_))
        ));

        let mut ser = small_network().to_serialized();
        ser.biases[1].push(0.0);
        assert!(matches!(
            Network::try_from(ser),
            Err(Error::MalformedPersistedState(_))
        ));
    }

    #[test]
    fn unknown_version_is_malformed() {
        let mut ser = small_network().to_serialized();
        ser.format_version = 999;
        let err = Network::try_from(ser).unwrap_err();
        assert!(format!("{err}").contains("format_version"));
    }

    #[test]
    fn lvq_keeps_initialization_state() {
        let lvq = Lvq::new(LvqConfig::new(2, 3)).unwrap();
        let back = Lvq::try_from(lvq.to_serialized()).unwrap();
        assert_eq!(back.state(), ModelState::Uninitialized);

        let lvq = Lvq::from_prototypes(LvqConfig::new(1, 2), &[vec![0.5], vec![-0.5]]).unwrap();
        let back = Lvq::try_from(lvq.to_serialized()).unwrap();
        assert_eq!(back.prototypes(), &[0.5, -0.5]);
        assert_eq!(back.state(), ModelState::Initialized);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn loads_minimal_yaml_with_legacy_keys() {
        let yaml = "\
struct: [2, 1]
activation: sigmoid
cost: cross-entropy
eta: 0.5
weights:
  - [[0.25, -0.5]]
biases:
  - [0.1]
";
        let net = Network::from_yaml_str(yaml).unwrap();
        assert_eq!(net.sizes(), &[2, 1]);
        assert_eq!(net.cost(), Cost::CrossEntropy);
        assert_eq!(net.regularization(), Regularization::None);
        assert_eq!(net.learning_rate(), 0.5);
        assert_eq!(net.lambda(), 0.1);
        assert_eq!(net.layer(0).unwrap().weights(), &[0.25, -0.5]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_and_yaml_strings_round_trip() {
        let net = small_network();
        assert_eq!(Network::from_json_str(&net.to_json_string().unwrap()).unwrap(), net);
        assert_eq!(Network::from_yaml_str(&net.to_yaml_string().unwrap()).unwrap(), net);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn overflowing_lvq_sizes_are_malformed() {
        let yaml = "\
input_size: 1
output_size: 4294967296
prototypes_per_class: 4294967296
distance: euclidean
init: average
prototypes:
  - [0.0]
";
        assert!(matches!(
            Lvq::from_yaml_str(yaml),
            Err(Error::MalformedPersistedState(_))
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            Network::from_json_str("{\"sizes\": 3}"),
            Err(Error::MalformedPersistedState(_))
        ));
    }
}
