use thiserror::Error;

/// Failures raised by the stores and services below the HTTP layer.
///
/// Both variants are faults of the local durable storage and are never
/// retried.
#[derive(Debug, Error)]
pub enum Error {
    #[error("storage unavailable: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("blob directory error: {0}")]
    Blob(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
