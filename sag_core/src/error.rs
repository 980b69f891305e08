use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SagError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("sensor error: {0}")]
    Sensor(String),
    #[error("sensor timeout")]
    Timeout,
    #[error("link error: {0}")]
    Link(String),
    #[error("io error: {0}")]
    Io(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("missing sensor")]
    MissingSensor,
    #[error("missing panel")]
    MissingPanel,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
