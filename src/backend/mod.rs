mod http;
mod types;

pub use http::HttpBackend;
pub use types::{
    AnalyzeRequest, AnalyzeResponse, CountResponse, ExportDbResponse, LocationResponse,
    ResponseStatus, UploadResponse,
};

use async_trait::async_trait;

use crate::error::NetworkError;
use crate::media::PhotoPayload;

/// One-shot geolocation lookup.
#[async_trait]
pub trait LocationService: Send + Sync {
    async fn detect_location(&self) -> Result<LocationResponse, NetworkError>;
}

/// The remote side of the workflow: the upload sink, the analysis call and
/// the data export routes. Failures reported in a response body are returned
/// as `Ok`; only transport failures are errors.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn upload_photo(&self, photo: PhotoPayload) -> Result<UploadResponse, NetworkError>;
    async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalyzeResponse, NetworkError>;
    async fn export_csv(&self) -> Result<Vec<u8>, NetworkError>;
    async fn export_db(&self) -> Result<ExportDbResponse, NetworkError>;
    async fn count_analyses(&self) -> Result<CountResponse, NetworkError>;
}
