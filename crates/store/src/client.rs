use schooldesk_core::errors::DeskResult;
use schooldesk_core::models::attendance::{AttendanceHistory, ScanReceipt, ScanRequest};
use schooldesk_core::models::grade::GradeCatalog;
use schooldesk_core::models::page::{PageQuery, ViewPage, normalize_rows};
use schooldesk_core::models::stats::{Total, WeeklyAttendance};
use schooldesk_core::models::subject::{Subject, Teacher, TeacherAssignment};
use schooldesk_core::models::user::{StudentIdentity, User, students_only};
use schooldesk_core::models::{Collection, ListScope, Record, RecordId};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use crate::RecordStore;

/// Largest page requested when a view needs a whole collection at once.
pub const CATALOG_LIMIT: usize = 1000;

/// Typed access to the backend on top of any [`RecordStore`].
#[derive(Clone)]
pub struct RecordClient {
    store: Arc<dyn RecordStore>,
}

impl RecordClient {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn list<T: Record>(&self, scope: ListScope, query: PageQuery) -> DeskResult<ViewPage<T>> {
        self.store
            .list(scope, query)
            .await?
            .try_map(|row| Ok(serde_json::from_value(row)?))
    }

    pub async fn create<B: Serialize + ?Sized>(&self, collection: Collection, body: &B) -> DeskResult<Value> {
        self.store.create(collection, serde_json::to_value(body)?).await
    }

    pub async fn update<B: Serialize + ?Sized>(
        &self,
        collection: Collection,
        id: RecordId,
        body: &B,
    ) -> DeskResult<Value> {
        self.store
            .update(collection, id, serde_json::to_value(body)?)
            .await
    }

    pub async fn delete(&self, collection: Collection, id: RecordId) -> DeskResult<()> {
        self.store.delete(collection, id).await
    }

    pub async fn attendance_history(&self, user_id: RecordId) -> DeskResult<AttendanceHistory> {
        self.get(format!("attendances/history/{}", user_id)).await
    }

    /// `POST /attendances/scan` with the decoded QR payload.
    pub async fn scan_check_in(&self, qrcode: &str) -> DeskResult<ScanReceipt> {
        let body = serde_json::to_value(ScanRequest {
            qrcode: qrcode.to_string(),
        })?;
        let response = self
            .store
            .action("attendances/scan".to_string(), body)
            .await?;
        match response {
            Value::Null => Ok(ScanReceipt {
                message: String::new(),
            }),
            other => Ok(serde_json::from_value(other)?),
        }
    }

    pub async fn today_total(&self) -> DeskResult<Total> {
        self.get("attendances/total-today".to_string()).await
    }

    pub async fn weekly_attendance(&self) -> DeskResult<WeeklyAttendance> {
        self.get("attendances/total-this-week".to_string()).await
    }

    pub async fn student_total(&self) -> DeskResult<Total> {
        self.get("user/total-students".to_string()).await
    }

    pub async fn user(&self, id: RecordId) -> DeskResult<User> {
        self.get(format!("user/{}", id)).await
    }

    pub async fn teachers(&self) -> DeskResult<Vec<Teacher>> {
        self.rows(Collection::Teachers.path().to_string()).await
    }

    /// Every row of `scope` the backend returns in one page of
    /// [`CATALOG_LIMIT`] rows.
    pub async fn list_all<T: Record>(&self, scope: ListScope) -> DeskResult<Vec<T>> {
        let page = self.list::<T>(scope, PageQuery::first(CATALOG_LIMIT)).await?;
        if page.total > page.rows.len() as u64 {
            warn!(
                scope = %scope.path(),
                total = page.total,
                loaded = page.rows.len(),
                "Collection larger than one catalog page, extra rows were not loaded"
            );
        }
        Ok(page.rows)
    }

    pub async fn subjects(&self) -> DeskResult<Vec<Subject>> {
        self.list_all(ListScope::All(Collection::Subjects)).await
    }

    /// Subjects and teachers a grade sheet is validated against.
    pub async fn grade_catalog(&self) -> DeskResult<GradeCatalog> {
        let (subjects, teachers) = tokio::try_join!(self.subjects(), self.teachers())?;
        Ok(GradeCatalog { subjects, teachers })
    }

    /// Every account with the student role.
    pub async fn student_roster(&self) -> DeskResult<Vec<StudentIdentity>> {
        let users = self.list_all::<User>(ListScope::All(Collection::Users)).await?;
        Ok(students_only(&users))
    }

    pub async fn assign_teacher(&self, subject_id: RecordId, teacher_id: RecordId) -> DeskResult<Value> {
        self.teacher_action(subject_id, "assign-teacher", teacher_id).await
    }

    pub async fn unassign_teacher(&self, subject_id: RecordId, teacher_id: RecordId) -> DeskResult<Value> {
        self.teacher_action(subject_id, "unassign-teacher", teacher_id)
            .await
    }

    async fn teacher_action(&self, subject_id: RecordId, action: &str, teacher_id: RecordId) -> DeskResult<Value> {
        let body = serde_json::to_value(TeacherAssignment { teacher_id })?;
        self.store
            .action(format!("subjects/{}/{}", subject_id, action), body)
            .await
    }

    async fn get<T: DeserializeOwned>(&self, path: String) -> DeskResult<T> {
        Ok(serde_json::from_value(self.store.fetch(path).await?)?)
    }

    async fn rows<T: DeserializeOwned>(&self, path: String) -> DeskResult<Vec<T>> {
        normalize_rows(self.store.fetch(path).await?)?
            .into_iter()
            .map(|row| Ok(serde_json::from_value(row)?))
            .collect()
    }
}
