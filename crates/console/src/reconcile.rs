//! Mutations followed by refetch.
//!
//! Every successful write reloads the affected view from the backend so
//! denormalized names and totals always come from the server. A failed
//! write leaves the view untouched and hands the error back to the caller.

use schooldesk_core::errors::{DeskError, DeskResult};
use schooldesk_core::models::grade::{GradeCatalog, GradeSheet};
use schooldesk_core::models::user::StudentIdentity;
use schooldesk_core::models::{Collection, RecordId};
use schooldesk_store::RecordClient;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::identity::match_student;
use crate::pagination::Refresh;

/// Shown when a scan fails without a server-supplied reason.
pub const SCAN_FAILURE: &str = "Failed to record attendance";

/// Result of a bulk grade submission in which every record was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkReport {
    pub attempted: usize,
    pub created: usize,
}

/// What the check-in result dialog shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanResult {
    Success(String),
    Failure(String),
}

impl ScanResult {
    pub fn message(&self) -> &str {
        match self {
            ScanResult::Success(m) | ScanResult::Failure(m) => m,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ScanResult::Success(_))
    }
}

#[derive(Clone)]
pub struct ReconciliationEngine {
    client: RecordClient,
    roster: Vec<StudentIdentity>,
}

impl ReconciliationEngine {
    pub fn new(client: RecordClient) -> Self {
        Self {
            client,
            roster: Vec::new(),
        }
    }

    pub fn with_roster(mut self, roster: Vec<StudentIdentity>) -> Self {
        self.roster = roster;
        self
    }

    pub fn client(&self) -> &RecordClient {
        &self.client
    }

    pub fn roster(&self) -> &[StudentIdentity] {
        &self.roster
    }

    /// Loads the students scanned payloads are matched against.
    pub async fn load_roster(&mut self) -> DeskResult<usize> {
        self.roster = self.client.student_roster().await?;
        debug!(students = self.roster.len(), "Loaded student roster");
        Ok(self.roster.len())
    }

    pub async fn create<B, V>(&self, view: &mut V, collection: Collection, body: &B) -> DeskResult<Value>
    where
        B: Serialize + ?Sized,
        V: Refresh + ?Sized,
    {
        let created = self.client.create(collection, body).await?;
        info!(collection = collection.path(), "Record created");
        view.refresh().await;
        Ok(created)
    }

    pub async fn update<B, V>(
        &self,
        view: &mut V,
        collection: Collection,
        id: RecordId,
        body: &B,
    ) -> DeskResult<Value>
    where
        B: Serialize + ?Sized,
        V: Refresh + ?Sized,
    {
        let updated = self.client.update(collection, id, body).await?;
        info!(collection = collection.path(), id, "Record updated");
        view.refresh().await;
        Ok(updated)
    }

    pub async fn delete<V>(&self, view: &mut V, collection: Collection, id: RecordId) -> DeskResult<()>
    where
        V: Refresh + ?Sized,
    {
        self.client.delete(collection, id).await?;
        info!(collection = collection.path(), id, "Record deleted");
        view.refresh().await;
        Ok(())
    }

    /// Creates one grade per scored subject of `sheet`.
    ///
    /// Subjects are submitted one after another and a failure does not stop
    /// the remaining ones. The view is reloaded if anything was created.
    pub async fn submit_grade_sheet<V>(
        &self,
        view: &mut V,
        sheet: &GradeSheet,
        catalog: &GradeCatalog,
    ) -> DeskResult<BulkReport>
    where
        V: Refresh + ?Sized,
    {
        let requests = sheet.to_requests(catalog)?;
        let attempted = requests.len();
        let mut created = 0;
        let mut failures = Vec::new();

        for request in &requests {
            match self.client.create(Collection::Grades, request).await {
                Ok(_) => created += 1,
                Err(e) => {
                    warn!(subject_id = request.subject_id, error = %e, "Grade submission failed");
                    let subject = catalog
                        .subjects
                        .iter()
                        .find(|s| s.id == request.subject_id)
                        .map(|s| s.name.clone())
                        .unwrap_or_else(|| request.subject_id.to_string());
                    failures.push(format!("{}: {}", subject, e.user_message()));
                }
            }
        }

        if created > 0 {
            view.refresh().await;
        }
        info!(
            student_id = sheet.student_id,
            attempted, created, "Grade sheet submitted"
        );

        if failures.is_empty() {
            Ok(BulkReport { attempted, created })
        } else {
            Err(DeskError::PartialFailure {
                attempted,
                failures,
            })
        }
    }

    /// Submits a decoded QR payload as a check-in.
    pub async fn submit_scan<V>(&self, view: &mut V, payload: &str) -> ScanResult
    where
        V: Refresh + ?Sized,
    {
        let student = match_student(payload, &self.roster);
        match student {
            Some(s) => debug!(student_id = s.id, "Scanned payload matches {}", s.name),
            None => debug!("Scanned payload did not match a known student"),
        }

        match self.client.scan_check_in(payload).await {
            Ok(receipt) => {
                info!("Scan check-in recorded");
                view.refresh().await;
                let message = if receipt.message.trim().is_empty() {
                    match student {
                        Some(s) => format!("Attendance recorded for {}", s.name),
                        None => "Attendance recorded".to_string(),
                    }
                } else {
                    receipt.message
                };
                ScanResult::Success(message)
            }
            Err(e) => {
                warn!(error = %e, "Scan check-in failed");
                ScanResult::Failure(match e {
                    DeskError::Rejected { message, .. } | DeskError::Authentication(message)
                        if !message.trim().is_empty() =>
                    {
                        message
                    }
                    _ => SCAN_FAILURE.to_string(),
                })
            }
        }
    }

    pub async fn assign_teacher<V>(&self, view: &mut V, subject_id: RecordId, teacher_id: RecordId) -> DeskResult<()>
    where
        V: Refresh + ?Sized,
    {
        self.client.assign_teacher(subject_id, teacher_id).await?;
        info!(subject_id, teacher_id, "Teacher assigned");
        view.refresh().await;
        Ok(())
    }

    pub async fn unassign_teacher<V>(&self, view: &mut V, subject_id: RecordId, teacher_id: RecordId) -> DeskResult<()>
    where
        V: Refresh + ?Sized,
    {
        self.client.unassign_teacher(subject_id, teacher_id).await?;
        info!(subject_id, teacher_id, "Teacher unassigned");
        view.refresh().await;
        Ok(())
    }
}

/// Holds the record awaiting delete confirmation.
#[derive(Debug, Default)]
pub struct DeleteGate {
    pending: Option<RecordId>,
}

impl DeleteGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the confirmation for `id`, replacing any earlier request.
    pub fn request(&mut self, id: RecordId) {
        self.pending = Some(id);
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn pending(&self) -> Option<RecordId> {
        self.pending
    }

    pub fn is_open(&self) -> bool {
        self.pending.is_some()
    }

    /// Deletes the pending record.
    ///
    /// The gate is cleared before the call is issued and stays cleared
    /// whatever the outcome; a failure is handed back to the caller.
    /// Returns `Ok(None)` without touching the backend when nothing is
    /// pending.
    pub async fn confirm<V>(
        &mut self,
        engine: &ReconciliationEngine,
        view: &mut V,
        collection: Collection,
    ) -> DeskResult<Option<RecordId>>
    where
        V: Refresh + ?Sized,
    {
        let Some(id) = self.pending.take() else {
            return Ok(None);
        };
        engine.delete(view, collection, id).await?;
        Ok(Some(id))
    }
}
