//! Sync error taxonomy
//!
//! Batch-fatal errors are returned before any network call. Row-scoped errors
//! end up in [`RowState::Failed`](super::outcome::RowState) and in the row's
//! response column; they never abort a batch.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncError {
    // Batch-fatal
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("found no data rows on sheet '{0}'")]
    NoDataRows(String),

    #[error("couldn't find an identifying property ({0}) in the header row")]
    NoIdentifyingColumn(String),

    #[error("found no selected column(s) with a valid header")]
    NoSelectedColumns,

    // Row-scoped
    #[error("no identifying property")]
    IdentifyingKeyMissing,

    #[error("not found")]
    RemoteNotFound,

    #[error("HTTP {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("validation failed: {0}")]
    Validation(String),
}

impl SyncError {
    /// Does this error abort the whole batch?
    pub fn is_batch_fatal(&self) -> bool {
        matches!(
            self,
            SyncError::Configuration(_)
                | SyncError::NoDataRows(_)
                | SyncError::NoIdentifyingColumn(_)
                | SyncError::NoSelectedColumns
        )
    }

    /// HTTP status carried by the error, if the portal answered
    pub fn status(&self) -> Option<u16> {
        match self {
            SyncError::RemoteNotFound => Some(404),
            SyncError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}
