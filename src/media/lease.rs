use tracing::debug;
use uuid::Uuid;

use super::{Frame, MediaStream};
use crate::error::DeviceError;

/// Exclusive ownership of an open media stream. The stream is stopped exactly
/// once: on `release`, or when the lease is dropped.
pub struct StreamLease {
    id: Uuid,
    stream: Option<Box<dyn MediaStream>>,
}

impl StreamLease {
    pub fn new(stream: Box<dyn MediaStream>) -> Self {
        Self {
            id: stream.id(),
            stream: Some(stream),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_released(&self) -> bool {
        self.stream.is_none()
    }

    pub async fn capture_frame(&mut self) -> Result<Frame, DeviceError> {
        match self.stream.as_mut() {
            Some(stream) => stream.capture_frame().await,
            None => Err(DeviceError::Unavailable(format!(
                "stream {} was already released",
                self.id
            ))),
        }
    }

    pub fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            debug!("Releasing media stream {}", self.id);
            stream.stop();
        }
    }
}

impl Drop for StreamLease {
    fn drop(&mut self) {
        self.release();
    }
}
