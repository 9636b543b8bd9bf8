use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Notify error: {0}")]
    Notify(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Handler error: {0}")]
    Handler(#[from] HandlerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum HandlerError {
    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),
}

pub type Result<T> = std::result::Result<T, RelayError>;
