use std::fmt;

use serde::{Deserialize, Serialize};

/// Value the backend reports when it could not obtain a UV reading.
pub const UV_UNAVAILABLE: f64 = -1.0;

/// Opaque server-assigned identifier for an uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoRef(String);

impl PhotoRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhotoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub message: String,
    pub severity_color: String,
    pub result_markup: String,
    pub uv_index: Option<f64>,
}

impl AnalysisResult {
    /// `None` when the backend sent no reading or the unavailable sentinel.
    pub fn uv_reading(&self) -> Option<f64> {
        self.uv_index.filter(|uv| *uv != UV_UNAVAILABLE)
    }
}
