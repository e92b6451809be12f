use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use image::DynamicImage;
use tracing::{debug, info};
use uuid::Uuid;

use super::{Frame, MediaDevice, MediaStream};
use crate::error::DeviceError;

/// A camera stand-in that serves the same decoded image as every frame.
pub struct StillImageDevice {
    path: PathBuf,
    open_streams: Arc<AtomicUsize>,
}

impl StillImageDevice {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            open_streams: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn open_streams(&self) -> usize {
        self.open_streams.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaDevice for StillImageDevice {
    async fn open(&self) -> Result<Box<dyn MediaStream>, DeviceError> {
        let path = self.path.clone();
        let image = tokio::task::spawn_blocking(move || image::open(&path))
            .await
            .map_err(|e| DeviceError::Unavailable(e.to_string()))?
            .map_err(|e| DeviceError::Unavailable(format!("{}: {}", self.path.display(), e)))?;

        let stream = StillImageStream {
            id: Uuid::new_v4(),
            image: Arc::new(image),
            open_streams: self.open_streams.clone(),
            stopped: false,
        };
        self.open_streams.fetch_add(1, Ordering::SeqCst);
        info!("Opened still image stream {} from {}", stream.id, self.path.display());
        Ok(Box::new(stream))
    }
}

struct StillImageStream {
    id: Uuid,
    image: Arc<DynamicImage>,
    open_streams: Arc<AtomicUsize>,
    stopped: bool,
}

#[async_trait]
impl MediaStream for StillImageStream {
    fn id(&self) -> Uuid {
        self.id
    }

    async fn capture_frame(&mut self) -> Result<Frame, DeviceError> {
        if self.stopped {
            return Err(DeviceError::Capture("stream is stopped".to_string()));
        }
        Ok(Frame::from_shared(self.id, self.image.clone()))
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.open_streams.fetch_sub(1, Ordering::SeqCst);
            debug!("Stopped still image stream {}", self.id);
        }
    }
}
