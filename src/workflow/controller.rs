use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, broadcast, watch};
use tracing::{debug, info, warn};

use super::in_flight::InFlight;
use crate::backend::{AnalysisBackend, AnalyzeRequest, LocationService};
use crate::config::Configuration;
use crate::error::{AppError, DeviceError, OperationKind, PreconditionError, WorkflowError};
use crate::media::{MediaDevice, PhotoFile, PhotoPayload, StreamLease};
use crate::presentation::{self, COLOR_SUCCESS, PresentedResult, StatusEvent};
use crate::session::{AnalysisResult, PhotoRef, Session, SessionSnapshot, WorkflowState};

/// Drives one session through photo acquisition and analysis.
///
/// The session sits behind a mutex that is only held for the synchronous
/// bookkeeping around each collaborator call, never across an await on a
/// device or the network. Concurrent calls are arbitrated by the session
/// state and by one in-flight flag per request kind.
pub struct WorkflowController {
    session: Mutex<Session>,
    pub(super) backend: Arc<dyn AnalysisBackend>,
    location_service: Arc<dyn LocationService>,
    camera: Arc<dyn MediaDevice>,
    configuration: Configuration,
    status_tx: broadcast::Sender<StatusEvent>,
    pub(super) count_tx: watch::Sender<Option<u64>>,
    location_busy: AtomicBool,
    camera_busy: AtomicBool,
    upload_busy: AtomicBool,
}

struct AcceptedUpload {
    photo_ref: PhotoRef,
    status: StatusEvent,
}

impl WorkflowController {
    pub fn builder(configuration: Configuration) -> WorkflowControllerBuilder {
        WorkflowControllerBuilder::new(configuration)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.status_tx.subscribe()
    }

    /// The stored analysis count, refreshed after each completed analysis
    /// and database export.
    pub fn watch_analysis_count(&self) -> watch::Receiver<Option<u64>> {
        self.count_tx.subscribe()
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().await.snapshot()
    }

    pub async fn state(&self) -> WorkflowState {
        self.session.lock().await.state()
    }

    pub async fn analyze_enabled(&self) -> bool {
        self.session.lock().await.analyze_enabled()
    }

    /// The last analysis result, formatted for display.
    pub async fn presented_result(&self) -> Option<PresentedResult> {
        let session = self.session.lock().await;
        session
            .result()
            .map(|result| presentation::present(result, &self.configuration.presentation))
    }

    pub async fn request_location(&self) -> Result<String, WorkflowError> {
        let _pending = InFlight::try_acquire(&self.location_busy, OperationKind::Location)
            .map_err(|e| self.fail(e))?;
        self.session.lock().await.begin_location();
        info!("Detecting location");

        let outcome = self.location_service.detect_location().await;

        let mut session = self.session.lock().await;
        match outcome {
            Ok(response) if response.status.is_success() => {
                match response.location.filter(|location| !location.trim().is_empty()) {
                    Some(location) => {
                        info!("Location detected: {}", location);
                        session.resolve_location(location.clone());
                        self.publish(StatusEvent::new(
                            response.message,
                            response.message_color.as_deref(),
                        ));
                        Ok(location)
                    }
                    None => {
                        let err = WorkflowError::backend(
                            "Location service reported success without a location.",
                            None,
                        );
                        session.fail_location(err.to_string());
                        Err(self.fail(err))
                    }
                }
            }
            Ok(response) => {
                let err = Self::backend_failure(
                    response.message,
                    response.message_color,
                    "Location detection failed.",
                );
                session.fail_location(err.to_string());
                Err(self.fail(err))
            }
            Err(e) => {
                session.fail_location(e.to_string());
                Err(self.fail(e.into()))
            }
        }
    }

    pub async fn start_camera(&self) -> Result<(), WorkflowError> {
        let _pending = InFlight::try_acquire(&self.camera_busy, OperationKind::Camera)
            .map_err(|e| self.fail(e))?;
        let epoch = {
            let session = self.session.lock().await;
            match session.state() {
                WorkflowState::CameraActive if self.upload_busy.load(Ordering::Acquire) => {
                    return Err(self.fail(WorkflowError::InFlight(OperationKind::Upload)));
                }
                WorkflowState::CameraActive => {
                    debug!("Camera already active");
                    return Ok(());
                }
                WorkflowState::Analyzing => {
                    return Err(self.fail(WorkflowError::InvalidState {
                        operation: "start the camera",
                        state: WorkflowState::Analyzing,
                    }));
                }
                _ => session.epoch(),
            }
        };

        let lease = StreamLease::new(self.camera.open().await.map_err(|e| self.fail(e.into()))?);

        let mut session = self.session.lock().await;
        if session.epoch() != epoch {
            warn!("Session reset while the camera was opening; releasing stream {}", lease.id());
            return Err(WorkflowError::Superseded(OperationKind::Camera));
        }
        if session.state() == WorkflowState::Analyzing {
            return Err(self.fail(WorkflowError::InvalidState {
                operation: "start the camera",
                state: WorkflowState::Analyzing,
            }));
        }
        info!("Camera stream {} opened", lease.id());
        session.open_camera(lease);
        self.publish(StatusEvent::progress("Position your hand and capture the photo."));
        Ok(())
    }

    pub async fn stop_camera(&self) {
        let mut session = self.session.lock().await;
        if session.camera_open() || session.state() == WorkflowState::CameraActive {
            info!("Stopping camera");
            session.close_camera();
        }
    }

    /// Snapshots the open stream, submits the frame, then releases the stream
    /// whatever the outcome.
    pub async fn capture_photo(&self) -> Result<PhotoRef, WorkflowError> {
        let _pending = InFlight::try_acquire(&self.upload_busy, OperationKind::Upload)
            .map_err(|e| self.fail(e))?;
        let (mut lease, epoch) = {
            let mut session = self.session.lock().await;
            let state = session.state();
            if state != WorkflowState::CameraActive {
                return Err(self.fail(WorkflowError::InvalidState {
                    operation: "capture a photo",
                    state,
                }));
            }
            let lease = session.take_stream().ok_or_else(|| {
                self.fail(DeviceError::Unavailable("no open camera stream".to_string()).into())
            })?;
            (lease, session.epoch())
        };

        self.publish(StatusEvent::progress("Processing captured photo..."));
        let outcome = self.capture_and_submit(&mut lease).await;
        lease.release();

        let mut session = self.session.lock().await;
        if session.epoch() != epoch {
            warn!("Discarding capture result for a reset session");
            return Err(WorkflowError::Superseded(OperationKind::Upload));
        }
        match outcome {
            Ok(accepted) => {
                info!("Captured photo stored as {}", accepted.photo_ref);
                session.store_photo(accepted.photo_ref.clone());
                self.publish(accepted.status);
                Ok(accepted.photo_ref)
            }
            Err(e) => {
                session.close_camera();
                Err(self.fail(e))
            }
        }
    }

    pub async fn upload_photo(&self, file: PhotoFile) -> Result<PhotoRef, WorkflowError> {
        file.validate(&self.configuration.upload)
            .map_err(|e| self.fail(e.into()))?;
        let _pending = InFlight::try_acquire(&self.upload_busy, OperationKind::Upload)
            .map_err(|e| self.fail(e))?;
        let epoch = {
            let session = self.session.lock().await;
            if session.state() == WorkflowState::Analyzing {
                return Err(self.fail(WorkflowError::InvalidState {
                    operation: "upload a photo",
                    state: WorkflowState::Analyzing,
                }));
            }
            session.epoch()
        };

        self.publish(StatusEvent::progress("Uploading photo..."));
        let outcome = self.submit(file.into_payload()).await;

        let mut session = self.session.lock().await;
        if session.epoch() != epoch {
            warn!("Discarding upload result for a reset session");
            return Err(WorkflowError::Superseded(OperationKind::Upload));
        }
        let accepted = outcome.map_err(|e| self.fail(e))?;
        if session.camera_open() {
            info!("Upload replaces the camera; releasing stream");
        }
        info!("Uploaded photo stored as {}", accepted.photo_ref);
        session.store_photo(accepted.photo_ref.clone());
        self.publish(accepted.status);
        Ok(accepted.photo_ref)
    }

    pub async fn analyze(&self) -> Result<AnalysisResult, WorkflowError> {
        let (request, epoch) = {
            let mut session = self.session.lock().await;
            let state = session.state();
            if state == WorkflowState::Analyzing {
                debug!("Analysis already in progress; ignoring duplicate request");
                return Err(WorkflowError::InFlight(OperationKind::Analyze));
            }
            if self.upload_busy.load(Ordering::Acquire) {
                return Err(self.fail(WorkflowError::InFlight(OperationKind::Upload)));
            }
            let location = session
                .location()
                .map(str::to_string)
                .ok_or_else(|| self.fail(PreconditionError::MissingLocation.into()))?;
            let photo_ref = session
                .photo_ref()
                .cloned()
                .ok_or_else(|| self.fail(PreconditionError::MissingPhoto.into()))?;
            if state != WorkflowState::PhotoReady {
                return Err(self.fail(PreconditionError::NotReady(state).into()));
            }
            session.begin_analysis();
            (AnalyzeRequest { location, photo_ref }, session.epoch())
        };

        self.publish(StatusEvent::progress("Analyzing..."));
        let outcome = self.backend.analyze(&request).await;

        let mut session = self.session.lock().await;
        if session.epoch() != epoch || session.state() != WorkflowState::Analyzing {
            warn!("Discarding stale analysis response for {}", request.photo_ref);
            return Err(WorkflowError::Superseded(OperationKind::Analyze));
        }
        let result = match outcome {
            Ok(response) if response.status.is_success() => response.into_result(COLOR_SUCCESS),
            Ok(response) => {
                session.abort_analysis();
                return Err(self.fail(Self::backend_failure(
                    response.message,
                    response.message_color,
                    "Analysis failed.",
                )));
            }
            Err(e) => {
                session.abort_analysis();
                return Err(self.fail(e.into()));
            }
        };
        info!("Analysis of {} complete", request.photo_ref);
        session.complete_analysis(result.clone());
        self.publish(StatusEvent::new(
            result.message.clone(),
            Some(&result.severity_color),
        ));
        drop(session);

        self.refresh_analysis_count().await;
        Ok(result)
    }

    pub async fn reset(&self) {
        let mut session = self.session.lock().await;
        info!("Resetting session {} from {}", session.id(), session.state());
        session.reset();
    }

    async fn capture_and_submit(&self, lease: &mut StreamLease) -> Result<AcceptedUpload, WorkflowError> {
        let frame = lease.capture_frame().await?;
        let (width, height) = frame.dimensions();
        debug!("Captured {}x{} frame {}", width, height, frame.frame_id());
        let capture = &self.configuration.capture;
        let bytes = frame.encode_jpeg(capture.jpeg_quality)?;
        self.submit(PhotoPayload::captured_jpeg(capture.file_name.clone(), bytes))
            .await
    }

    async fn submit(&self, payload: PhotoPayload) -> Result<AcceptedUpload, WorkflowError> {
        let response = self.backend.upload_photo(payload).await?;
        if !response.status.is_success() {
            return Err(Self::backend_failure(
                response.message,
                response.message_color,
                "Photo upload failed.",
            ));
        }
        let photo_ref = response.photo_ref.ok_or_else(|| {
            WorkflowError::backend("Upload accepted without a photo reference.", None)
        })?;
        Ok(AcceptedUpload {
            photo_ref,
            status: StatusEvent::new(response.message, response.message_color.as_deref()),
        })
    }

    fn backend_failure(message: String, color: Option<String>, fallback: &str) -> WorkflowError {
        let message = if message.trim().is_empty() {
            fallback.to_string()
        } else {
            message
        };
        WorkflowError::backend(message, color)
    }

    pub(super) fn publish(&self, event: StatusEvent) {
        debug!("Status: {}", event.message);
        // No subscribers is not an error.
        let _ = self.status_tx.send(event);
    }

    pub(super) fn fail(&self, error: WorkflowError) -> WorkflowError {
        warn!("{}", error);
        self.publish(StatusEvent::failure(&error));
        error
    }
}

pub struct WorkflowControllerBuilder {
    configuration: Configuration,
    backend: Option<Arc<dyn AnalysisBackend>>,
    location_service: Option<Arc<dyn LocationService>>,
    camera: Option<Arc<dyn MediaDevice>>,
}

impl WorkflowControllerBuilder {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration,
            backend: None,
            location_service: None,
            camera: None,
        }
    }

    pub fn backend(mut self, backend: Arc<dyn AnalysisBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn location_service(mut self, location_service: Arc<dyn LocationService>) -> Self {
        self.location_service = Some(location_service);
        self
    }

    pub fn camera(mut self, camera: Arc<dyn MediaDevice>) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn build(self) -> Result<WorkflowController, AppError> {
        let backend = self
            .backend
            .ok_or(AppError::Setup("Analysis backend not set".to_string()))?;
        let location_service = self
            .location_service
            .ok_or(AppError::Setup("Location service not set".to_string()))?;
        let camera = self
            .camera
            .ok_or(AppError::Setup("Camera not set".to_string()))?;
        let (status_tx, _) = broadcast::channel(self.configuration.status_channel_capacity.max(1));
        let (count_tx, _) = watch::channel(None);
        Ok(WorkflowController {
            session: Mutex::new(Session::new()),
            backend,
            location_service,
            camera,
            configuration: self.configuration,
            status_tx,
            count_tx,
            location_busy: AtomicBool::new(false),
            camera_busy: AtomicBool::new(false),
            upload_busy: AtomicBool::new(false),
        })
    }
}
