use std::fmt;

use thiserror::Error;

use crate::session::WorkflowState;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Workflow Error: {0}")]
    Workflow(#[from] WorkflowError),
    #[error("Network Error: {0}")]
    Network(#[from] NetworkError),
    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Setup Error: {0}")]
    Setup(String),
    #[error("Usage: {0}")]
    Usage(String),
}

/// The kinds of request the controller allows at most one of at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Location,
    Camera,
    Upload,
    Analyze,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::Location => "location",
            OperationKind::Camera => "camera",
            OperationKind::Upload => "upload",
            OperationKind::Analyze => "analyze",
        };
        f.write_str(name)
    }
}

// Workflow Error Type, every variant leaves the session retryable.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("{0}")]
    Precondition(#[from] PreconditionError),
    #[error("Camera error: {0}")]
    Device(#[from] DeviceError),
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
    #[error("{message}")]
    Backend {
        message: String,
        color: Option<String>,
    },
    #[error("A {0} request is already in progress.")]
    InFlight(OperationKind),
    #[error("Cannot {operation} while {state}.")]
    InvalidState {
        operation: &'static str,
        state: WorkflowState,
    },
    #[error("The session was reset before the {0} response arrived.")]
    Superseded(OperationKind),
}

impl WorkflowError {
    pub fn backend(message: impl Into<String>, color: Option<String>) -> Self {
        WorkflowError::Backend {
            message: message.into(),
            color,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("Location not available.")]
    MissingLocation,
    #[error("Photo not available. Upload or capture a photo first.")]
    MissingPhoto,
    #[error("No photo is ready for analysis while {0}.")]
    NotReady(WorkflowState),
    #[error("No photo selected.")]
    EmptyFile,
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),
    #[error("Photo is {size} bytes, the limit is {limit} bytes.")]
    FileTooLarge { size: usize, limit: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("Camera access denied: {0}")]
    Denied(String),
    #[error("Camera unavailable: {0}")]
    Unavailable(String),
    #[error("Failed to capture frame: {0}")]
    Capture(String),
    #[error("Failed to encode frame: {0}")]
    Encode(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Request to {0} timed out")]
    Timeout(String),
    #[error("Could not connect to {url}: {reason}")]
    Connect { url: String, reason: String },
    #[error("HTTP {code} from {url}")]
    Status { code: u16, url: String },
    #[error("Invalid response from {url}: {reason}")]
    Decode { url: String, reason: String },
    #[error("Request failed: {0}")]
    Request(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_displays_server_message() {
        let err = WorkflowError::backend("Foto não encontrada.", Some("#FF0000".to_string()));
        assert_eq!(err.to_string(), "Foto não encontrada.");
    }

    #[test]
    fn guard_errors_name_the_operation() {
        let err = WorkflowError::InFlight(OperationKind::Analyze);
        assert_eq!(err.to_string(), "A analyze request is already in progress.");

        let err = WorkflowError::InvalidState {
            operation: "capture a photo",
            state: WorkflowState::Idle,
        };
        assert_eq!(err.to_string(), "Cannot capture a photo while idle.");
    }

    #[test]
    fn precondition_converts_into_workflow_error() {
        let err: WorkflowError = PreconditionError::MissingLocation.into();
        assert!(matches!(
            err,
            WorkflowError::Precondition(PreconditionError::MissingLocation)
        ));
    }
}
