use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Address errors
    #[error("Invalid reader address: {0}")]
    InvalidAddress(String),

    #[error("Invalid port: {0}")]
    InvalidPort(u16),

    // Protocol errors
    #[error("Invalid command code: 0x{0:02X}")]
    InvalidCommandCode(u8),

    #[error("Payload too large: {size} bytes (max {max_size})")]
    PayloadTooLarge { size: usize, max_size: usize },

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing configuration key: {0}")]
    MissingConfig(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
