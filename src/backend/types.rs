use serde::{Deserialize, Serialize};

use crate::session::{AnalysisResult, PhotoRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Warning,
    Error,
    #[serde(other)]
    Unknown,
}

impl ResponseStatus {
    pub fn is_success(self) -> bool {
        self == ResponseStatus::Success
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationResponse {
    pub status: ResponseStatus,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub message_color: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub status: ResponseStatus,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub message_color: Option<String>,
    #[serde(rename = "photoRef", default)]
    pub photo_ref: Option<PhotoRef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeRequest {
    pub location: String,
    #[serde(rename = "photoRef")]
    pub photo_ref: PhotoRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeResponse {
    pub status: ResponseStatus,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub message_color: Option<String>,
    #[serde(rename = "resultMarkup", default)]
    pub result_markup: Option<String>,
    #[serde(rename = "uvIndex", default)]
    pub uv_index: Option<f64>,
}

impl AnalyzeResponse {
    /// The result carried by a successful response.
    pub fn into_result(self, default_color: &str) -> AnalysisResult {
        AnalysisResult {
            message: self.message,
            severity_color: self
                .message_color
                .unwrap_or_else(|| default_color.to_string()),
            result_markup: self.result_markup.unwrap_or_default(),
            uv_index: self.uv_index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExportDbResponse {
    #[serde(rename = "quantidade", default)]
    pub count: Option<u64>,
    #[serde(rename = "erros", default)]
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CountResponse {
    pub status: ResponseStatus,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub message: Option<String>,
}
