use std::path::Path;

use crate::config::UploadConfig;
use crate::error::PreconditionError;

/// A file chosen from the local file picker.
#[derive(Debug, Clone)]
pub struct PhotoFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoSource {
    Upload,
    Camera,
}

/// Image bytes as submitted to the upload sink.
#[derive(Debug, Clone)]
pub struct PhotoPayload {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
    pub source: PhotoSource,
}

impl PhotoFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub async fn read(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "photo".to_string());
        Ok(Self { file_name, bytes })
    }

    pub fn extension(&self) -> Option<String> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
    }

    pub fn validate(&self, limits: &UploadConfig) -> Result<(), PreconditionError> {
        if self.bytes.is_empty() {
            return Err(PreconditionError::EmptyFile);
        }
        let extension = self.extension().unwrap_or_default();
        if !limits
            .allowed_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(&extension))
        {
            return Err(PreconditionError::UnsupportedFileType(self.file_name.clone()));
        }
        if self.bytes.len() > limits.max_bytes {
            return Err(PreconditionError::FileTooLarge {
                size: self.bytes.len(),
                limit: limits.max_bytes,
            });
        }
        Ok(())
    }

    pub fn into_payload(self) -> PhotoPayload {
        let content_type = content_type_for(self.extension().as_deref());
        PhotoPayload {
            file_name: self.file_name,
            content_type,
            bytes: self.bytes,
            source: PhotoSource::Upload,
        }
    }
}

impl PhotoPayload {
    pub fn captured_jpeg(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: "image/jpeg",
            bytes,
            source: PhotoSource::Camera,
        }
    }
}

fn content_type_for(extension: Option<&str>) -> &'static str {
    match extension {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}
