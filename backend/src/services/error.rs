//! Error types for explorer operations.

use crate::models::{DateRangeError, InputError};
use crate::remote::RemoteError;
use crate::storage::StorageError;

/// Result type for explorer operations
pub type ExplorerResult<T> = Result<T, ExplorerError>;

/// Something the caller had to provide before the operation could start.
///
/// Checked before any network call; the operation is not attempted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreconditionError {
    #[error("Please select a time period.")]
    MissingDateRange,
    #[error("Please select an area of interest (parcel search, map click or coordinates).")]
    MissingAoi,
    #[error("The area of interest is not a usable polygon: {0}")]
    InvalidAoi(String),
    #[error("Please select at least one index to compute.")]
    NoIndices,
    #[error("Please select at least one date from the list.")]
    NoDatesSelected,
    #[error("Please enter a parcel ID or region name + number.")]
    EmptyParcelQuery,
    #[error("Run an analysis first.")]
    NoAnalysis,
    #[error("Load map layers first; the pixel inspector reads the first visible index layer.")]
    NoVisibleLayer,
    #[error("Zoom in to level {min} or closer to inspect pixels (current: {zoom}).")]
    ZoomOutOfRange { zoom: u8, min: u8 },
    #[error("Saved field {0} does not exist.")]
    UnknownSavedField(usize),
    #[error("Overlay layer {0} does not exist.")]
    UnknownLayer(String),
    #[error("No legend entry for index {0}.")]
    UnknownLegend(String),
}

/// Error type for explorer operations.
#[derive(Debug, thiserror::Error)]
pub enum ExplorerError {
    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    DateRange(#[from] DateRangeError),

    /// Parcel search or locate found nothing.
    #[error("{0}")]
    ParcelNotFound(String),

    #[error(transparent)]
    Remote(RemoteError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A newer analysis or overlay load started while this one was in flight.
    #[error("Superseded by a newer request.")]
    Superseded,
}

impl ExplorerError {
    /// Errors the user can fix by changing their input.
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            ExplorerError::Precondition(_) | ExplorerError::Input(_) | ExplorerError::DateRange(_)
        )
    }

    /// Text for the status line.
    pub fn user_message(&self) -> String {
        match self {
            ExplorerError::Remote(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

impl From<RemoteError> for ExplorerError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::NotFound { message, .. } => ExplorerError::ParcelNotFound(message),
            other => ExplorerError::Remote(other),
        }
    }
}
