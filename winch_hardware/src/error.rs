use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("i2c error: {0}")]
    I2c(String),
    #[error("unknown driver channel {0}")]
    UnknownChannel(usize),
    #[error("record size mismatch: expected {expected} bytes, got {got}")]
    RecordSize { expected: usize, got: usize },
    #[error("edge handler already registered")]
    AlreadyRegistered,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
