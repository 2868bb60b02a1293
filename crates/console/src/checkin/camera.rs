use async_trait::async_trait;
use schooldesk_core::errors::DeskResult;
use std::time::Duration;
use tracing::{debug, warn};

pub const MIN_FPS: u32 = 10;
pub const MAX_FPS: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    pub id: String,
    pub label: String,
}

impl CameraDevice {
    /// True for labels that name a rear-facing camera.
    pub fn is_rear_facing(&self) -> bool {
        let label = self.label.to_lowercase();
        ["back", "rear", "environment"]
            .iter()
            .any(|hint| label.contains(hint))
    }
}

/// Picks the rear camera when one is labelled as such, else the first.
pub fn preferred_device(devices: &[CameraDevice]) -> Option<&CameraDevice> {
    devices
        .iter()
        .find(|d| d.is_rear_facing())
        .or_else(|| devices.first())
}

/// Decode rate and the side of the square central capture region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSettings {
    pub fps: u32,
    pub box_size: u32,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            fps: MIN_FPS,
            box_size: 250,
        }
    }
}

impl ScanSettings {
    pub fn new(fps: u32, box_size: u32) -> Self {
        Self {
            fps: fps.clamp(MIN_FPS, MAX_FPS),
            box_size: box_size.max(1),
        }
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.fps.max(1)))
    }
}

/// A QR-decoding camera.
#[async_trait]
pub trait Camera: Send {
    async fn devices(&mut self) -> DeskResult<Vec<CameraDevice>>;

    async fn start(&mut self, device: &CameraDevice, settings: ScanSettings) -> DeskResult<()>;

    /// Decodes the next frame.
    ///
    /// `Ok(None)` is a frame without a readable code. An error means the
    /// stream is gone.
    async fn next_frame(&mut self) -> DeskResult<Option<String>>;

    async fn stop(&mut self) -> DeskResult<()>;

    /// Drops any rendering or buffered state. Must be safe to call at any time.
    fn clear(&mut self);
}

/// Stops and clears `camera`, logging instead of failing.
pub async fn release_camera<C: Camera + ?Sized>(camera: &mut C) {
    if let Err(e) = camera.stop().await {
        debug!(error = %e, "Camera stop failed during release");
    }
    camera.clear();
}

/// Exclusive hold on a streaming camera.
///
/// [`CameraLease::release`] stops and clears the camera. A lease dropped
/// without being released still clears it.
pub struct CameraLease<'a, C: Camera + ?Sized> {
    camera: &'a mut C,
    active: bool,
}

impl<'a, C: Camera + ?Sized> CameraLease<'a, C> {
    /// Wraps a camera whose stream has already been started.
    pub fn started(camera: &'a mut C) -> Self {
        Self {
            camera,
            active: true,
        }
    }

    /// Starts `device` and wraps the camera on success.
    pub async fn acquire(camera: &'a mut C, device: &CameraDevice, settings: ScanSettings) -> DeskResult<Self> {
        camera.start(device, settings).await?;
        Ok(Self::started(camera))
    }

    pub fn camera(&mut self) -> &mut C {
        &mut *self.camera
    }

    pub async fn release(mut self) {
        if self.active {
            self.active = false;
            release_camera(&mut *self.camera).await;
        }
    }
}

impl<C: Camera + ?Sized> Drop for CameraLease<'_, C> {
    fn drop(&mut self) {
        if self.active {
            warn!("Camera lease dropped while streaming, clearing camera");
            self.camera.clear();
        }
    }
}
