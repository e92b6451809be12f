use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::{
    AnalysisBackend, AnalyzeRequest, AnalyzeResponse, CountResponse, ExportDbResponse,
    LocationResponse, LocationService, UploadResponse,
};
use crate::config::BackendConfig;
use crate::error::NetworkError;
use crate::media::PhotoPayload;

/// Multipart field the upload route reads the image from.
const PHOTO_FIELD: &str = "photo";

/// The backend contract spoken over HTTP.
#[derive(Clone)]
pub struct HttpBackend {
    config: BackendConfig,
    client: Client,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> Result<Self, NetworkError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| NetworkError::Request(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    fn url(&self, endpoint: &str) -> String {
        self.config.url(endpoint)
    }

    async fn decode<T: DeserializeOwned>(url: &str, response: Response) -> Result<T, NetworkError> {
        let response = Self::check_status(url, response)?;
        response.json::<T>().await.map_err(|e| NetworkError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    fn check_status(url: &str, response: Response) -> Result<Response, NetworkError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(NetworkError::Status {
                code: status.as_u16(),
                url: url.to_string(),
            })
        }
    }

    fn map_reqwest_error(e: reqwest::Error, url: &str) -> NetworkError {
        if e.is_timeout() {
            NetworkError::Timeout(url.to_string())
        } else if e.is_connect() {
            NetworkError::Connect {
                url: url.to_string(),
                reason: e.to_string(),
            }
        } else if let Some(status) = e.status() {
            NetworkError::Status {
                code: status.as_u16(),
                url: url.to_string(),
            }
        } else {
            NetworkError::Request(e.to_string())
        }
    }
}

#[async_trait]
impl LocationService for HttpBackend {
    async fn detect_location(&self) -> Result<LocationResponse, NetworkError> {
        let url = self.url(&self.config.endpoints.detect_location);
        debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Self::map_reqwest_error(e, &url))?;
        Self::decode(&url, response).await
    }
}

#[async_trait]
impl AnalysisBackend for HttpBackend {
    async fn upload_photo(&self, photo: PhotoPayload) -> Result<UploadResponse, NetworkError> {
        let url = self.url(&self.config.endpoints.upload);
        info!(
            "Uploading {} ({} bytes, {:?}) to {}",
            photo.file_name,
            photo.bytes.len(),
            photo.source,
            url
        );
        let part = Part::bytes(photo.bytes)
            .file_name(photo.file_name)
            .mime_str(photo.content_type)
            .map_err(|e| NetworkError::Request(e.to_string()))?;
        let form = Form::new().part(PHOTO_FIELD, part);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Self::map_reqwest_error(e, &url))?;
        Self::decode(&url, response).await
    }

    async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalyzeResponse, NetworkError> {
        let url = self.url(&self.config.endpoints.analyze);
        info!("Requesting analysis of {} at {}", request.photo_ref, request.location);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| Self::map_reqwest_error(e, &url))?;
        Self::decode(&url, response).await
    }

    async fn export_csv(&self) -> Result<Vec<u8>, NetworkError> {
        let url = self.url(&self.config.endpoints.export_csv);
        debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Self::map_reqwest_error(e, &url))?;
        let bytes = Self::check_status(&url, response)?
            .bytes()
            .await
            .map_err(|e| Self::map_reqwest_error(e, &url))?;
        Ok(bytes.to_vec())
    }

    async fn export_db(&self) -> Result<ExportDbResponse, NetworkError> {
        let url = self.url(&self.config.endpoints.export_db);
        debug!("POST {}", url);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| Self::map_reqwest_error(e, &url))?;
        Self::decode(&url, response).await
    }

    async fn count_analyses(&self) -> Result<CountResponse, NetworkError> {
        let url = self.url(&self.config.endpoints.count_analyses);
        debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Self::map_reqwest_error(e, &url))?;
        Self::decode(&url, response).await
    }
}
