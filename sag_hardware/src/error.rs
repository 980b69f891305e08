use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("spi error: {0}")]
    Spi(String),
    #[error("adc timeout")]
    Timeout,
    #[error("short spi transfer: {0} of 3 bytes")]
    ShortTransfer(usize),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
