use std::fmt;

use serde::{Deserialize, Serialize};

/// Where the photo-acquisition and analysis workflow currently stands.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum WorkflowState {
    #[default]
    Idle,
    LocationPending,
    LocationFailed,
    /// Location resolved, no photo acquired yet.
    Ready,
    CameraActive,
    PhotoReady,
    Analyzing,
    ResultShown,
}

impl WorkflowState {
    /// States the location lookup may still move out of when it resolves.
    pub fn awaits_location(self) -> bool {
        matches!(
            self,
            WorkflowState::Idle | WorkflowState::LocationPending | WorkflowState::LocationFailed
        )
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowState::Idle => "idle",
            WorkflowState::LocationPending => "locating",
            WorkflowState::LocationFailed => "location is unavailable",
            WorkflowState::Ready => "ready",
            WorkflowState::CameraActive => "the camera is active",
            WorkflowState::PhotoReady => "a photo is ready",
            WorkflowState::Analyzing => "analyzing",
            WorkflowState::ResultShown => "showing a result",
        };
        f.write_str(name)
    }
}
