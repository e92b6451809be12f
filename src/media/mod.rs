mod frame;
mod lease;
mod photo;
mod still;

pub use frame::Frame;
pub use lease::StreamLease;
pub use photo::{PhotoFile, PhotoPayload, PhotoSource};
pub use still::StillImageDevice;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DeviceError;

/// A camera that can be asked for a stream, e.g. the rear-facing device.
#[async_trait]
pub trait MediaDevice: Send + Sync {
    async fn open(&self) -> Result<Box<dyn MediaStream>, DeviceError>;
}

/// An open camera handle. `stop` must release the underlying device.
#[async_trait]
pub trait MediaStream: Send {
    fn id(&self) -> Uuid;
    async fn capture_frame(&mut self) -> Result<Frame, DeviceError>;
    fn stop(&mut self);
}
