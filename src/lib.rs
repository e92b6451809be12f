pub mod backend;
pub mod config;
pub mod error;
pub mod media;
pub mod presentation;
pub mod session;
pub mod workflow;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{AppError, DeviceError, NetworkError, PreconditionError, WorkflowError};

pub use backend::{AnalysisBackend, HttpBackend, LocationService};
pub use config::Configuration;
pub use media::{MediaDevice, MediaStream, PhotoFile, StillImageDevice};
pub use session::{AnalysisResult, PhotoRef, SessionSnapshot, WorkflowState};
pub use workflow::{WorkflowController, WorkflowControllerBuilder};
