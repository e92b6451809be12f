use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::DynamicImage;
use uuid::Uuid;

use crate::backend::{
    AnalysisBackend, AnalyzeRequest, AnalyzeResponse, CountResponse, ExportDbResponse,
    LocationResponse, LocationService, ResponseStatus, UploadResponse,
};
use crate::config::Configuration;
use crate::error::{DeviceError, NetworkError};
use crate::media::{Frame, MediaDevice, MediaStream, PhotoFile, PhotoPayload};
use crate::session::PhotoRef;
use crate::workflow::WorkflowController;

pub fn photo(file_name: &str) -> PhotoFile {
    PhotoFile::new(file_name, vec![0xFF, 0xD8, 0xFF, 0xE0])
}

#[derive(Clone, Copy)]
pub enum LocationMode {
    Success,
    Warning,
    Down,
}

pub struct FakeLocation {
    mode: LocationMode,
    calls: AtomicUsize,
}

impl FakeLocation {
    pub fn new(mode: LocationMode) -> Self {
        Self {
            mode,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LocationService for FakeLocation {
    async fn detect_location(&self) -> Result<LocationResponse, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            LocationMode::Success => Ok(LocationResponse {
                status: ResponseStatus::Success,
                location: Some("Lisbon, Portugal".to_string()),
                message: "Localização detectada!".to_string(),
                message_color: Some("#00B300".to_string()),
            }),
            LocationMode::Warning => Ok(LocationResponse {
                status: ResponseStatus::Warning,
                location: Some("Lisboa, Portugal".to_string()),
                message: "Fallback: API key faltando".to_string(),
                message_color: Some("#FFA500".to_string()),
            }),
            LocationMode::Down => Err(NetworkError::Connect {
                url: "http://backend/detect_location".to_string(),
                reason: "connection refused".to_string(),
            }),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum AnalyzeMode {
    Success(Option<f64>),
    BackendFailure,
    NetworkFailure,
}

pub struct FakeBackend {
    upload_calls: AtomicUsize,
    analyze_calls: AtomicUsize,
    upload_fails: AtomicBool,
    upload_delay: Mutex<Duration>,
    analyze_delay: Mutex<Duration>,
    analyze_mode: Mutex<AnalyzeMode>,
    last_analyzed: Mutex<Option<PhotoRef>>,
    last_upload_content_type: Mutex<Option<&'static str>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            upload_calls: AtomicUsize::new(0),
            analyze_calls: AtomicUsize::new(0),
            upload_fails: AtomicBool::new(false),
            upload_delay: Mutex::new(Duration::ZERO),
            analyze_delay: Mutex::new(Duration::ZERO),
            analyze_mode: Mutex::new(AnalyzeMode::Success(Some(6.5))),
            last_analyzed: Mutex::new(None),
            last_upload_content_type: Mutex::new(None),
        }
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn analyze_calls(&self) -> usize {
        self.analyze_calls.load(Ordering::SeqCst)
    }

    pub fn set_upload_fails(&self, fails: bool) {
        self.upload_fails.store(fails, Ordering::SeqCst);
    }

    pub fn set_upload_delay(&self, delay: Duration) {
        *self.upload_delay.lock().unwrap() = delay;
    }

    pub fn set_analyze_delay(&self, delay: Duration) {
        *self.analyze_delay.lock().unwrap() = delay;
    }

    pub fn set_analyze_mode(&self, mode: AnalyzeMode) {
        *self.analyze_mode.lock().unwrap() = mode;
    }

    pub fn last_analyzed(&self) -> Option<PhotoRef> {
        self.last_analyzed.lock().unwrap().clone()
    }

    pub fn last_upload_content_type(&self) -> Option<&'static str> {
        *self.last_upload_content_type.lock().unwrap()
    }
}

async fn pause(delay: Duration) {
    if delay.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(delay).await;
    }
}

#[async_trait]
impl AnalysisBackend for FakeBackend {
    async fn upload_photo(&self, photo: PhotoPayload) -> Result<UploadResponse, NetworkError> {
        let call = self.upload_calls.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_upload_content_type.lock().unwrap() = Some(photo.content_type);
        let delay = *self.upload_delay.lock().unwrap();
        pause(delay).await;
        if self.upload_fails.load(Ordering::SeqCst) {
            return Ok(UploadResponse {
                status: ResponseStatus::Error,
                message: "Tipo inválido.".to_string(),
                message_color: Some("#FF0000".to_string()),
                photo_ref: None,
            });
        }
        Ok(UploadResponse {
            status: ResponseStatus::Success,
            message: "Foto carregada!".to_string(),
            message_color: Some("#00B300".to_string()),
            photo_ref: Some(PhotoRef::new(format!("photo-{}", call))),
        })
    }

    async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalyzeResponse, NetworkError> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_analyzed.lock().unwrap() = Some(request.photo_ref.clone());
        let delay = *self.analyze_delay.lock().unwrap();
        pause(delay).await;
        let mode = *self.analyze_mode.lock().unwrap();
        match mode {
            AnalyzeMode::Success(uv_index) => {
                let uv = uv_index.map(|uv| format!("{:.1}", uv)).unwrap_or_default();
                Ok(AnalyzeResponse {
                    status: ResponseStatus::Success,
                    message: "Análise concluída!".to_string(),
                    message_color: Some("#00B300".to_string()),
                    result_markup: Some(format!(
                        "<p><strong>Índice UV:</strong> {}</p>\n<p><strong>Tipo de pele:</strong> III</p>",
                        uv
                    )),
                    uv_index,
                })
            }
            AnalyzeMode::BackendFailure => Ok(AnalyzeResponse {
                status: ResponseStatus::Error,
                message: "Foto não encontrada.".to_string(),
                message_color: Some("#FF0000".to_string()),
                result_markup: None,
                uv_index: None,
            }),
            AnalyzeMode::NetworkFailure => Err(NetworkError::Timeout(
                "http://backend/analyze".to_string(),
            )),
        }
    }

    async fn export_csv(&self) -> Result<Vec<u8>, NetworkError> {
        Ok(b"id_collector,timestamp,event_type\ndefault,2025-01-01T10:00:00,analysis_completed\n".to_vec())
    }

    async fn export_db(&self) -> Result<ExportDbResponse, NetworkError> {
        Ok(ExportDbResponse {
            count: Some(3),
            errors: vec!["registo 2 sem imagem".to_string()],
        })
    }

    async fn count_analyses(&self) -> Result<CountResponse, NetworkError> {
        Ok(CountResponse {
            status: ResponseStatus::Success,
            count: self.analyze_calls() as u64,
            message: None,
        })
    }
}

pub struct FakeCamera {
    opens: AtomicUsize,
    open_streams: Arc<AtomicUsize>,
    stops: Arc<AtomicUsize>,
    open_fails: AtomicBool,
    open_delay: Mutex<Duration>,
    capture_fails: Arc<AtomicBool>,
}

impl FakeCamera {
    pub fn new() -> Self {
        Self {
            opens: AtomicUsize::new(0),
            open_streams: Arc::new(AtomicUsize::new(0)),
            stops: Arc::new(AtomicUsize::new(0)),
            open_fails: AtomicBool::new(false),
            open_delay: Mutex::new(Duration::ZERO),
            capture_fails: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn open_streams(&self) -> usize {
        self.open_streams.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn set_open_fails(&self, fails: bool) {
        self.open_fails.store(fails, Ordering::SeqCst);
    }

    pub fn set_open_delay(&self, delay: Duration) {
        *self.open_delay.lock().unwrap() = delay;
    }

    pub fn set_capture_fails(&self, fails: bool) {
        self.capture_fails.store(fails, Ordering::SeqCst);
    }
}

#[async_trait]
impl MediaDevice for FakeCamera {
    async fn open(&self) -> Result<Box<dyn MediaStream>, DeviceError> {
        if self.open_fails.load(Ordering::SeqCst) {
            return Err(DeviceError::Denied("NotAllowedError".to_string()));
        }
        let delay = *self.open_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.open_streams.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeStream {
            id: Uuid::new_v4(),
            open_streams: self.open_streams.clone(),
            stops: self.stops.clone(),
            capture_fails: self.capture_fails.clone(),
            stopped: false,
        }))
    }
}

struct FakeStream {
    id: Uuid,
    open_streams: Arc<AtomicUsize>,
    stops: Arc<AtomicUsize>,
    capture_fails: Arc<AtomicBool>,
    stopped: bool,
}

#[async_trait]
impl MediaStream for FakeStream {
    fn id(&self) -> Uuid {
        self.id
    }

    async fn capture_frame(&mut self) -> Result<Frame, DeviceError> {
        if self.capture_fails.load(Ordering::SeqCst) {
            return Err(DeviceError::Capture("video not ready".to_string()));
        }
        Ok(Frame::new(self.id, DynamicImage::new_rgb8(4, 4)))
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.stops.fetch_add(1, Ordering::SeqCst);
            self.open_streams.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

/// A controller wired to fakes, with handles on the fakes for assertions.
pub struct Fixture {
    pub controller: WorkflowController,
    pub backend: Arc<FakeBackend>,
    pub camera: Arc<FakeCamera>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_location(LocationMode::Success)
    }

    pub fn with_location_warning() -> Self {
        Self::with_location(LocationMode::Warning)
    }

    pub fn with_location_down() -> Self {
        Self::with_location(LocationMode::Down)
    }

    /// Location resolved and one uploaded photo ready for analysis.
    pub async fn ready() -> Self {
        let fixture = Self::new();
        fixture.controller.request_location().await.unwrap();
        fixture.controller.upload_photo(photo("mao.jpg")).await.unwrap();
        fixture
    }

    fn with_location(mode: LocationMode) -> Self {
        let backend = Arc::new(FakeBackend::new());
        let camera = Arc::new(FakeCamera::new());
        let controller = WorkflowController::builder(Configuration::default())
            .backend(backend.clone())
            .location_service(Arc::new(FakeLocation::new(mode)))
            .camera(camera.clone())
            .build()
            .unwrap();
        Self {
            controller,
            backend,
            camera,
        }
    }
}
