use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported {family} strategy: {key:?}")]
    UnsupportedStrategy { family: &'static str, key: String },

    #[error("cost {cost:?} cannot be used with activation {activation:?}")]
    IncompatibleCostActivation {
        cost: &'static str,
        activation: &'static str,
    },

    #[error("dimension mismatch: {what} has len {actual}, expected {expected}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("model is not initialized; train or load it first")]
    ModelNotInitialized,

    #[error("malformed persisted state: {0}")]
    MalformedPersistedState(String),

    #[error("numerical divergence: {0}")]
    NumericalDivergence(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn dims(what: impl Into<String>, expected: usize, actual: usize) -> Self {
        Error::DimensionMismatch {
            what: what.into(),
            expected,
            actual,
        }
    }
}
