mod controller;
mod export;
mod in_flight;

pub use controller::{WorkflowController, WorkflowControllerBuilder};
pub use export::{ExportFile, ExportSummary, export_file_name};
