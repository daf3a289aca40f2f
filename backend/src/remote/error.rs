//! Error types for calls to the remote analysis service.
//!
//! Every variant carries the name of the operation that failed so log lines
//! and API errors can say which endpoint misbehaved.

use std::fmt;

/// Result type for remote calls
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Remote operation names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Analyze,
    VisualizeBatch,
    PixelValue,
    SearchParcel,
    LocateParcel,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Analyze => "calculate_biomass",
            Operation::VisualizeBatch => "visualize_batch",
            Operation::PixelValue => "pixel_value",
            Operation::SearchParcel => "uldk_search",
            Operation::LocateParcel => "uldk_locate",
        }
    }

    /// Parcel endpoints report an unknown parcel as HTTP 404.
    pub fn is_parcel_lookup(&self) -> bool {
        matches!(self, Operation::SearchParcel | Operation::LocateParcel)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for remote calls.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RemoteError {
    /// The request never produced an HTTP response (DNS, connect, timeout).
    #[error("{operation}: transport error: {message}")]
    Transport {
        operation: Operation,
        message: String,
    },

    /// Non-2xx response; `detail` is the service's `{detail}` field if any.
    #[error("{operation}: {}", status_message(.status, .detail))]
    Status {
        operation: Operation,
        status: u16,
        detail: Option<String>,
    },

    /// Parcel lookup found nothing (HTTP 404 or an empty result set).
    #[error("{operation}: not found: {message}")]
    NotFound {
        operation: Operation,
        message: String,
    },

    /// 2xx response whose body did not match the expected shape.
    #[error("{operation}: invalid response: {message}")]
    Decode {
        operation: Operation,
        message: String,
    },

    /// Client could not be constructed from configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

fn status_message(status: &u16, detail: &Option<String>) -> String {
    match detail {
        Some(detail) => detail.clone(),
        None => format!("Server returned an error ({})", status),
    }
}

impl RemoteError {
    pub fn transport(operation: Operation, message: impl ToString) -> Self {
        Self::Transport {
            operation,
            message: message.to_string(),
        }
    }

    pub fn status(operation: Operation, status: u16, detail: Option<String>) -> Self {
        Self::Status {
            operation,
            status,
            detail,
        }
    }

    pub fn not_found(operation: Operation, message: impl Into<String>) -> Self {
        Self::NotFound {
            operation,
            message: message.into(),
        }
    }

    pub fn decode(operation: Operation, message: impl ToString) -> Self {
        Self::Decode {
            operation,
            message: message.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound { .. })
    }

    /// Short text suitable for a status line (no operation prefix).
    pub fn user_message(&self) -> String {
        match self {
            RemoteError::Transport { message, .. } => format!("Network error: {}", message),
            RemoteError::Status { status, detail, .. } => status_message(status, detail),
            RemoteError::NotFound { message, .. } => message.clone(),
            RemoteError::Decode { message, .. } => format!("Unexpected server response: {}", message),
            RemoteError::Configuration(message) => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message_prefers_detail() {
        let err = RemoteError::status(Operation::Analyze, 500, Some("Earth Engine quota".into()));
        assert_eq!(err.user_message(), "Earth Engine quota");
        assert_eq!(err.to_string(), "calculate_biomass: Earth Engine quota");

        let bare = RemoteError::status(Operation::VisualizeBatch, 502, None);
        assert_eq!(bare.user_message(), "Server returned an error (502)");
    }

    #[test]
    fn test_not_found() {
        let err = RemoteError::not_found(Operation::SearchParcel, "No parcel found.");
        assert!(err.is_not_found());
        assert!(Operation::LocateParcel.is_parcel_lookup());
        assert!(!Operation::Analyze.is_parcel_lookup());
    }
}
