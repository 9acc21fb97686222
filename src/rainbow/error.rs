//! Rainbow writer errors

use super::writer::WriterState;

/// Errors that can occur while writing a Rainbow volume
#[derive(Debug, thiserror::Error)]
pub enum RainbowError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Writer method called out of order
    #[error("Cannot {operation} in state {state:?}")]
    InvalidState {
        /// Operation attempted
        operation: &'static str,
        /// State the writer was in
        state: WriterState,
    },

    /// Volume timestamp cannot be represented
    #[error("Invalid volume time: {0}")]
    InvalidTime(i64),

    /// Blob framing is inconsistent
    #[error("Invalid blob: {0}")]
    InvalidBlob(String),
}
