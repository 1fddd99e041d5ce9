use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// The payload normalized to zero rows. Transports surface this as a
    /// client-visible rejection, not a server error.
    #[error("payload contained no usable sensor data")]
    NoUsableData,

    #[error("another history sync is already running")]
    SyncAlreadyRunning,

    #[error("document store error: {0}")]
    DocumentStore(#[source] anyhow::Error),

    #[error("row store error: {0}")]
    RowStore(#[source] anyhow::Error),
}

pub type SyncResult<T> = Result<T, SyncError>;
