mod result;
mod state;

pub use result::{AnalysisResult, PhotoRef, UV_UNAVAILABLE};
pub use state::WorkflowState;

use serde::Serialize;
use uuid::Uuid;

use crate::media::StreamLease;

/// Per-page-load workflow state, owned by exactly one controller.
pub struct Session {
    id: Uuid,
    state: WorkflowState,
    location: Option<String>,
    location_error: Option<String>,
    photo_ref: Option<PhotoRef>,
    media_stream: Option<StreamLease>,
    result: Option<AnalysisResult>,
    /// State restored when the camera closes without producing a photo.
    camera_return_state: WorkflowState,
    /// Bumped by `reset`; responses carrying an older epoch are stale.
    epoch: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub state: WorkflowState,
    pub location: Option<String>,
    pub location_error: Option<String>,
    pub photo_ref: Option<PhotoRef>,
    pub camera_open: bool,
    pub result: Option<AnalysisResult>,
    pub analyze_enabled: bool,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: WorkflowState::Idle,
            location: None,
            location_error: None,
            photo_ref: None,
            media_stream: None,
            result: None,
            camera_return_state: WorkflowState::Idle,
            epoch: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn photo_ref(&self) -> Option<&PhotoRef> {
        self.photo_ref.as_ref()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn camera_open(&self) -> bool {
        self.media_stream.is_some()
    }

    pub fn analyze_enabled(&self) -> bool {
        self.location.is_some()
            && self.photo_ref.is_some()
            && self.state == WorkflowState::PhotoReady
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            state: self.state,
            location: self.location.clone(),
            location_error: self.location_error.clone(),
            photo_ref: self.photo_ref.clone(),
            camera_open: self.camera_open(),
            result: self.result.clone(),
            analyze_enabled: self.analyze_enabled(),
        }
    }

    pub(crate) fn begin_location(&mut self) {
        if self.state.awaits_location() {
            self.state = WorkflowState::LocationPending;
        }
    }

    pub(crate) fn resolve_location(&mut self, location: String) {
        self.location = Some(location);
        self.location_error = None;
        if self.state.awaits_location() {
            self.state = WorkflowState::Ready;
        }
        if self.camera_return_state.awaits_location() {
            self.camera_return_state = WorkflowState::Ready;
        }
    }

    pub(crate) fn fail_location(&mut self, reason: String) {
        self.location_error = Some(reason);
        if self.state.awaits_location() {
            self.state = WorkflowState::LocationFailed;
        }
        if self.camera_return_state.awaits_location() {
            self.camera_return_state = WorkflowState::LocationFailed;
        }
    }

    pub(crate) fn open_camera(&mut self, lease: StreamLease) {
        self.camera_return_state = self.state;
        self.state = WorkflowState::CameraActive;
        self.media_stream = Some(lease);
    }

    /// Hands the open stream to a capture in progress. The session stays
    /// `CameraActive` until the capture settles.
    pub(crate) fn take_stream(&mut self) -> Option<StreamLease> {
        self.media_stream.take()
    }

    /// Releases any open stream and leaves `CameraActive` for the state the
    /// camera was opened from.
    pub(crate) fn close_camera(&mut self) {
        if let Some(mut lease) = self.media_stream.take() {
            lease.release();
        }
        if self.state == WorkflowState::CameraActive {
            self.state = self.camera_return_state;
        }
    }

    pub(crate) fn store_photo(&mut self, photo_ref: PhotoRef) {
        if let Some(mut lease) = self.media_stream.take() {
            lease.release();
        }
        self.photo_ref = Some(photo_ref);
        self.state = WorkflowState::PhotoReady;
    }

    pub(crate) fn begin_analysis(&mut self) {
        self.state = WorkflowState::Analyzing;
    }

    pub(crate) fn abort_analysis(&mut self) {
        if self.state == WorkflowState::Analyzing {
            self.state = WorkflowState::PhotoReady;
        }
    }

    pub(crate) fn complete_analysis(&mut self, result: AnalysisResult) {
        self.result = Some(result);
        self.photo_ref = None;
        self.state = WorkflowState::ResultShown;
    }

    pub(crate) fn reset(&mut self) {
        if let Some(mut lease) = self.media_stream.take() {
            lease.release();
        }
        self.photo_ref = None;
        self.result = None;
        self.state = WorkflowState::Idle;
        self.camera_return_state = WorkflowState::Idle;
        self.epoch += 1;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
