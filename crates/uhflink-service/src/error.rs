use thiserror::Error;
use uhflink_network::NetworkError;

/// Errors returned by the reader service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Invalid address, port or configuration value.
    #[error(transparent)]
    Core(#[from] uhflink_core::Error),

    #[error(transparent)]
    Network(#[from] NetworkError),

    /// Reading or writing the config file failed.
    #[error("Config file error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid JSON for [`ReaderConfig`](crate::ReaderConfig).
    #[error("Invalid config file: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
