use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum WinchError {
    #[error("motor driver error: {0}")]
    Driver(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("encoder input error: {0}")]
    Encoder(String),
    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
