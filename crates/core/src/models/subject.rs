use serde::{Deserialize, Serialize};

use super::{Collection, Record, RecordId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectRef {
    pub id: RecordId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherUser {
    pub id: RecordId,
    pub name: String,
}

/// Teacher as embedded in grade rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherRef {
    pub id: RecordId,
    pub user: TeacherUser,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: RecordId,
    pub user_id: RecordId,
    pub user: Option<TeacherUser>,
}

impl Teacher {
    pub fn display_name(&self) -> &str {
        self.user.as_ref().map(|u| u.name.as_str()).unwrap_or("Unknown")
    }
}

impl Record for Teacher {
    const COLLECTION: Collection = Collection::Teachers;

    fn id(&self) -> RecordId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub teachers: Vec<TeacherRef>,
}

impl Record for Subject {
    const COLLECTION: Collection = Collection::Subjects;

    fn id(&self) -> RecordId {
        self.id
    }
}

impl Subject {
    pub fn has_teacher(&self, teacher_id: RecordId) -> bool {
        self.teachers.iter().any(|t| t.id == teacher_id)
    }
}

/// Body of `POST /subjects` and `PUT /subjects/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectForm {
    pub name: String,
}

/// Body of the assign/unassign teacher actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherAssignment {
    pub teacher_id: RecordId,
}
