use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::subject::{Subject, SubjectRef, Teacher, TeacherRef};
use super::user::PersonRef;
use super::{Collection, Record, RecordId};
use crate::errors::{DeskError, DeskResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeRecord {
    pub id: RecordId,
    pub user: PersonRef,
    pub subject: SubjectRef,
    pub teacher: TeacherRef,
    pub semester: String,
    pub score: f64,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for GradeRecord {
    const COLLECTION: Collection = Collection::Grades;

    fn id(&self) -> RecordId {
        self.id
    }
}

impl GradeRecord {
    pub fn display_score(&self) -> String {
        format!("{:.2}", self.score)
    }

    pub fn display_remarks(&self) -> &str {
        self.remarks.as_deref().filter(|r| !r.is_empty()).unwrap_or("-")
    }
}

/// Body of a single `POST /grades`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeRequest {
    pub user_id: RecordId,
    pub subject_id: RecordId,
    pub teacher_id: RecordId,
    pub semester: String,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

/// Body of `PUT /grades/{id}`; only these fields are editable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeUpdate {
    pub subject_id: RecordId,
    pub teacher_id: RecordId,
    pub semester: String,
    pub score: f64,
    pub remarks: Option<String>,
}

impl GradeUpdate {
    pub fn from_record(record: &GradeRecord) -> Self {
        Self {
            subject_id: record.subject.id,
            teacher_id: record.teacher.id,
            semester: record.semester.clone(),
            score: record.score,
            remarks: record.remarks.clone(),
        }
    }
}

/// One subject row of a grade sheet, holding the raw text the operator typed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetEntry {
    pub subject_id: RecordId,
    pub score: String,
    pub remarks: String,
}

/// Full subject-score sheet for one student, submitted as one record per
/// scored subject.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GradeSheet {
    pub student_id: RecordId,
    pub teacher_id: Option<RecordId>,
    pub semester: String,
    pub entries: Vec<SheetEntry>,
}

/// Subjects and teachers fetched before a sheet may be submitted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GradeCatalog {
    pub subjects: Vec<Subject>,
    pub teachers: Vec<Teacher>,
}

impl GradeSheet {
    /// Blank sheet with one entry per known subject.
    pub fn for_student(student_id: RecordId, catalog: &GradeCatalog) -> Self {
        Self {
            student_id,
            teacher_id: None,
            semester: String::new(),
            entries: catalog
                .subjects
                .iter()
                .map(|subject| SheetEntry {
                    subject_id: subject.id,
                    ..SheetEntry::default()
                })
                .collect(),
        }
    }

    pub fn set_score(&mut self, subject_id: RecordId, score: impl Into<String>) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.subject_id == subject_id) {
            entry.score = score.into();
        }
    }

    pub fn set_remarks(&mut self, subject_id: RecordId, remarks: impl Into<String>) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.subject_id == subject_id) {
            entry.remarks = remarks.into();
        }
    }

    /// Converts the sheet into creation requests, one per scored subject.
    ///
    /// Blank scores are skipped. Any unparsable score, unknown subject or
    /// unknown teacher rejects the whole sheet before anything is sent.
    pub fn to_requests(&self, catalog: &GradeCatalog) -> DeskResult<Vec<GradeRequest>> {
        let teacher_id = self
            .teacher_id
            .ok_or_else(|| DeskError::Validation("Select a teacher before submitting".into()))?;
        if !catalog.teachers.iter().any(|t| t.id == teacher_id) {
            return Err(DeskError::Validation(format!("Unknown teacher {}", teacher_id)));
        }

        let mut requests = Vec::new();
        for entry in &self.entries {
            let raw = entry.score.trim();
            if raw.is_empty() {
                continue;
            }
            if !catalog.subjects.iter().any(|s| s.id == entry.subject_id) {
                return Err(DeskError::Validation(format!(
                    "Unknown subject {}",
                    entry.subject_id
                )));
            }
            let score: f64 = raw.parse().map_err(|_| {
                DeskError::Validation(format!(
                    "Score for subject {} is not a number: {}",
                    entry.subject_id, raw
                ))
            })?;
            if !score.is_finite() {
                return Err(DeskError::Validation(format!(
                    "Score for subject {} is not a number: {}",
                    entry.subject_id, raw
                )));
            }
            let remarks = entry.remarks.trim();
            requests.push(GradeRequest {
                user_id: self.student_id,
                subject_id: entry.subject_id,
                teacher_id,
                semester: self.semester.trim().to_string(),
                score,
                remarks: (!remarks.is_empty()).then(|| remarks.to_string()),
            });
        }

        if requests.is_empty() {
            return Err(DeskError::Validation(
                "Please enter at least one score before submitting".into(),
            ));
        }
        Ok(requests)
    }
}
