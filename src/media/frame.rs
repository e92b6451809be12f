use std::io::Cursor;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use uuid::Uuid;

use crate::error::DeviceError;

/// A single still snapshotted from an open media stream.
#[derive(Debug, Clone)]
pub struct Frame {
    stream_id: Uuid,
    image: Arc<DynamicImage>,
    captured_at: DateTime<Utc>,
    frame_id: Uuid,
}

impl Frame {
    pub fn new(stream_id: Uuid, image: DynamicImage) -> Self {
        Self::from_shared(stream_id, Arc::new(image))
    }

    pub fn from_shared(stream_id: Uuid, image: Arc<DynamicImage>) -> Self {
        Self {
            stream_id,
            image,
            captured_at: Utc::now(),
            frame_id: Uuid::new_v4(),
        }
    }

    pub fn stream_id(&self) -> Uuid {
        self.stream_id
    }

    pub fn frame_id(&self) -> Uuid {
        self.frame_id
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    /// Encodes the frame as JPEG. JPEG has no alpha channel, so the image is
    /// flattened to RGB first.
    pub fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>, DeviceError> {
        let (width, height) = self.dimensions();
        if width == 0 || height == 0 {
            return Err(DeviceError::Encode("frame has no pixels".to_string()));
        }
        let rgb = self.image.to_rgb8();
        let mut cursor = Cursor::new(Vec::new());
        let encoder = JpegEncoder::new_with_quality(&mut cursor, quality.clamp(1, 100));
        rgb.write_with_encoder(encoder)
            .map_err(|e| DeviceError::Encode(e.to_string()))?;
        Ok(cursor.into_inner())
    }
}
