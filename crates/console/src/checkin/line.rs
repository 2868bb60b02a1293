use async_trait::async_trait;
use schooldesk_core::errors::{DeskError, DeskResult};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use super::camera::{Camera, CameraDevice, ScanSettings};

/// Keyboard-wedge scanner: every line read is one decoded frame.
pub struct LineCamera<R> {
    reader: R,
    device: CameraDevice,
    streaming: bool,
    buffer: String,
}

impl<R: AsyncBufRead + Unpin + Send> LineCamera<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            device: CameraDevice {
                id: "stdin".to_string(),
                label: "Keyboard wedge scanner".to_string(),
            },
            streaming: false,
            buffer: String::new(),
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> Camera for LineCamera<R> {
    async fn devices(&mut self) -> DeskResult<Vec<CameraDevice>> {
        Ok(vec![self.device.clone()])
    }

    async fn start(&mut self, device: &CameraDevice, settings: ScanSettings) -> DeskResult<()> {
        if device.id != self.device.id {
            return Err(DeskError::Hardware(format!("Unknown device {}", device.id)));
        }
        debug!(fps = settings.fps, "Line scanner ready");
        self.streaming = true;
        Ok(())
    }

    async fn next_frame(&mut self) -> DeskResult<Option<String>> {
        if !self.streaming {
            return Err(DeskError::Hardware("Scanner is not started".into()));
        }
        self.buffer.clear();
        let read = self
            .reader
            .read_line(&mut self.buffer)
            .await
            .map_err(|e| DeskError::Hardware(e.to_string()))?;
        if read == 0 {
            return Err(DeskError::Hardware("Scanner input closed".into()));
        }
        let line = self.buffer.trim();
        Ok((!line.is_empty()).then(|| line.to_string()))
    }

    async fn stop(&mut self) -> DeskResult<()> {
        self.streaming = false;
        Ok(())
    }

    fn clear(&mut self) {
        self.buffer.clear();
    }
}
