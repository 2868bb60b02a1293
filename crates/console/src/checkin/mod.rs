//! QR check-in dialog.
//!
//! A [`CheckInDialog`] drives one camera session through
//! `Idle → Acquiring → Scanning → Decoded → Submitting → Result → Idle`.
//! The dialog is closed from outside through a [`CloseHandle`]; closing
//! while acquiring or scanning stops and clears the camera before the
//! dialog returns to idle.

pub mod camera;
pub mod line;

use tokio::sync::watch;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::pagination::Refresh;
use crate::reconcile::{ReconciliationEngine, ScanResult};
use camera::{Camera, CameraDevice, CameraLease, ScanSettings, preferred_device, release_camera};

pub const NO_CAMERA: &str = "No camera devices found";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Acquiring,
    Scanning { device_id: String },
    Decoded { payload: String },
    Submitting { payload: String },
    Result(ScanResult),
}

/// [`ScanState`] without its data, for recording transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Idle,
    Acquiring,
    Scanning,
    Decoded,
    Submitting,
    Result,
}

impl ScanState {
    pub fn phase(&self) -> ScanPhase {
        match self {
            ScanState::Idle => ScanPhase::Idle,
            ScanState::Acquiring => ScanPhase::Acquiring,
            ScanState::Scanning { .. } => ScanPhase::Scanning,
            ScanState::Decoded { .. } => ScanPhase::Decoded,
            ScanState::Submitting { .. } => ScanPhase::Submitting,
            ScanState::Result(_) => ScanPhase::Result,
        }
    }
}

/// Camera and payload of the attempt in progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSession {
    pub device_id: Option<String>,
    pub payload: Option<String>,
}

/// How a run of the dialog ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Closed before anything was decoded.
    Cancelled,
    Finished(ScanResult),
}

/// Closes an open dialog from outside the running session.
#[derive(Debug, Clone)]
pub struct CloseHandle {
    tx: watch::Sender<bool>,
}

impl CloseHandle {
    pub fn close(&self) {
        self.tx.send_replace(true);
    }
}

pub struct CheckInDialog {
    settings: ScanSettings,
    state: ScanState,
    trail: Vec<ScanPhase>,
    session: Option<ScanSession>,
    closed: Option<watch::Receiver<bool>>,
}

impl CheckInDialog {
    pub fn new(settings: ScanSettings) -> Self {
        Self {
            settings,
            state: ScanState::Idle,
            trail: vec![ScanPhase::Idle],
            session: None,
            closed: None,
        }
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    /// Phases entered since the dialog was last opened.
    pub fn trail(&self) -> &[ScanPhase] {
        &self.trail
    }

    pub fn session(&self) -> Option<&ScanSession> {
        self.session.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.closed.is_some()
    }

    /// Opens the dialog. Returns `None` when it is already open or a result
    /// is still waiting to be dismissed.
    pub fn open(&mut self) -> Option<CloseHandle> {
        if self.is_open() || self.state != ScanState::Idle {
            debug!("Check-in dialog already open");
            return None;
        }
        let (tx, rx) = watch::channel(false);
        self.closed = Some(rx);
        self.session = Some(ScanSession::default());
        self.trail = vec![ScanPhase::Idle];
        Some(CloseHandle { tx })
    }

    /// Leaves the result screen.
    pub fn dismiss(&mut self) {
        if matches!(self.state, ScanState::Result(_)) {
            self.transition(ScanState::Idle);
        }
    }

    /// Runs one session until a result is produced or the dialog is closed.
    pub async fn run<C, V>(&mut self, camera: &mut C, engine: &ReconciliationEngine, view: &mut V) -> ScanOutcome
    where
        C: Camera + ?Sized,
        V: Refresh + ?Sized,
    {
        let Some(mut closed) = self.closed.clone() else {
            debug!("Check-in dialog is not open");
            return ScanOutcome::Cancelled;
        };

        self.transition(ScanState::Acquiring);
        let device = tokio::select! {
            biased;
            _ = wait_closed(&mut closed) => return self.cancel(camera).await,
            device = pick_device(camera) => device,
        };
        let device = match device {
            Ok(device) => device,
            Err(message) => return self.fail(message),
        };

        let started = tokio::select! {
            biased;
            _ = wait_closed(&mut closed) => return self.cancel(camera).await,
            started = camera.start(&device, self.settings) => started,
        };
        if let Err(e) = started {
            warn!(device = %device.id, error = %e, "Failed to start camera");
            release_camera(camera).await;
            return self.fail(e.user_message());
        }

        if let Some(session) = self.session.as_mut() {
            session.device_id = Some(device.id.clone());
        }
        info!(device = %device.label, "Camera started");
        self.transition(ScanState::Scanning {
            device_id: device.id.clone(),
        });

        let mut lease = CameraLease::started(camera);
        let mut ticker = tokio::time::interval(self.settings.frame_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let payload = loop {
            let frame = tokio::select! {
                biased;
                _ = wait_closed(&mut closed) => None,
                frame = paced_frame(lease.camera(), &mut ticker) => Some(frame),
            };
            match frame {
                None => {
                    lease.release().await;
                    return self.close_to_idle();
                }
                Some(Ok(None)) => trace!("No code in frame"),
                Some(Ok(Some(payload))) => break payload,
                Some(Err(e)) => {
                    warn!(error = %e, "Camera stream lost");
                    lease.release().await;
                    return self.fail(e.user_message());
                }
            }
        };

        lease.release().await;
        if let Some(session) = self.session.as_mut() {
            session.payload = Some(payload.clone());
        }
        self.transition(ScanState::Decoded {
            payload: payload.clone(),
        });

        self.close_dialog();
        self.transition(ScanState::Submitting {
            payload: payload.clone(),
        });
        let result = engine.submit_scan(view, &payload).await;
        self.transition(ScanState::Result(result.clone()));
        ScanOutcome::Finished(result)
    }

    async fn cancel<C: Camera + ?Sized>(&mut self, camera: &mut C) -> ScanOutcome {
        release_camera(camera).await;
        self.close_to_idle()
    }

    fn close_to_idle(&mut self) -> ScanOutcome {
        debug!("Check-in dialog closed");
        self.close_dialog();
        self.transition(ScanState::Idle);
        ScanOutcome::Cancelled
    }

    /// Hardware failures end the session and close the dialog.
    fn fail(&mut self, message: String) -> ScanOutcome {
        self.close_dialog();
        let result = ScanResult::Failure(message);
        self.transition(ScanState::Result(result.clone()));
        ScanOutcome::Finished(result)
    }

    fn close_dialog(&mut self) {
        self.closed = None;
        self.session = None;
    }

    fn transition(&mut self, next: ScanState) {
        debug!(from = ?self.state.phase(), to = ?next.phase(), "Check-in state change");
        self.trail.push(next.phase());
        self.state = next;
    }
}

async fn wait_closed(closed: &mut watch::Receiver<bool>) {
    if closed.wait_for(|closed| *closed).await.is_err() {
        std::future::pending::<()>().await;
    }
}

async fn pick_device<C: Camera + ?Sized>(camera: &mut C) -> Result<CameraDevice, String> {
    let devices = camera.devices().await.map_err(|e| {
        warn!(error = %e, "Failed to enumerate cameras");
        e.user_message()
    })?;
    preferred_device(&devices)
        .cloned()
        .ok_or_else(|| NO_CAMERA.to_string())
}

async fn paced_frame<C: Camera + ?Sized>(
    camera: &mut C,
    ticker: &mut Interval,
) -> schooldesk_core::errors::DeskResult<Option<String>> {
    ticker.tick().await;
    camera.next_frame().await
}
