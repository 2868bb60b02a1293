use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Collection, Record, RecordId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Student,
    #[serde(other)]
    User,
}

/// An account as returned by `GET /user`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: RecordId,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<DateTime<Utc>>,
}

impl Record for User {
    const COLLECTION: Collection = Collection::Users;

    fn id(&self) -> RecordId {
        self.id
    }
}

impl User {
    pub fn is_student(&self) -> bool {
        self.role == Role::Student
    }

    /// Student view of this account, `None` for every other role.
    pub fn as_student(&self) -> Option<StudentIdentity> {
        self.is_student().then(|| StudentIdentity {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        })
    }
}

/// Foreign lookup used by attendance and grade views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentIdentity {
    pub id: RecordId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Keeps only the accounts that may appear in student pickers.
pub fn students_only(users: &[User]) -> Vec<StudentIdentity> {
    users.iter().filter_map(User::as_student).collect()
}

/// Denormalized person reference embedded in attendance and grade rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRef {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserForm {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<DateTime<Utc>>,
    pub role: Role,
}
