//! Submission guard for form modals.

use schooldesk_core::errors::{DeskError, DeskResult};
use std::future::Future;
use tracing::debug;

/// Proof that a submit was started in a given modal epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitToken {
    epoch: u64,
}

/// State of one add/edit modal.
///
/// A modal accepts one submission at a time. Closing or reopening it starts
/// a new epoch, and results that belong to an earlier epoch are ignored.
#[derive(Debug, Default)]
pub struct FormModal {
    open: bool,
    in_flight: bool,
    error: Option<String>,
    epoch: u64,
}

impl FormModal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self) {
        self.reset(true);
    }

    pub fn close(&mut self) {
        self.reset(false);
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn begin_submit(&mut self) -> DeskResult<SubmitToken> {
        if !self.open {
            return Err(DeskError::Validation("The form is not open".into()));
        }
        if self.in_flight {
            return Err(DeskError::Busy);
        }
        self.in_flight = true;
        self.error = None;
        Ok(SubmitToken { epoch: self.epoch })
    }

    /// Records the outcome of a submit. Returns false when the result was
    /// dropped because the modal has moved on.
    pub fn finish<T>(&mut self, token: SubmitToken, result: &DeskResult<T>) -> bool {
        if token.epoch != self.epoch {
            debug!(
                token = token.epoch,
                current = self.epoch,
                "Ignoring result for a closed form"
            );
            return false;
        }
        self.in_flight = false;
        match result {
            Ok(_) => self.close(),
            Err(e) => self.error = Some(e.user_message()),
        }
        true
    }

    /// Runs `action` under the guard: success closes the modal, failure
    /// keeps it open with the error message.
    pub async fn submit<T, F, Fut>(&mut self, action: F) -> DeskResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = DeskResult<T>>,
    {
        let token = self.begin_submit()?;
        let result = action().await;
        self.finish(token, &result);
        result
    }

    fn reset(&mut self, open: bool) {
        self.open = open;
        self.in_flight = false;
        self.error = None;
        self.epoch += 1;
    }
}
