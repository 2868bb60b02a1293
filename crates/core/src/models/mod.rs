use serde::de::DeserializeOwned;

pub mod attendance;
pub mod auth;
pub mod grade;
pub mod page;
pub mod stats;
pub mod subject;
pub mod user;

/// Server-assigned identifier shared by every collection.
pub type RecordId = u64;

/// Remote collections exposed by the school backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Attendances,
    Grades,
    Subjects,
    Users,
    Teachers,
}

impl Collection {
    /// Path segment relative to the API base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Collection::Attendances => "attendances",
            Collection::Grades => "grades",
            Collection::Subjects => "subjects",
            Collection::Users => "user",
            Collection::Teachers => "teachers",
        }
    }

    /// Users are patched, every other collection is replaced with PUT.
    pub fn patches_on_update(&self) -> bool {
        matches!(self, Collection::Users)
    }
}

/// What a list view pages over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    All(Collection),
    GradesOfUser(RecordId),
}

impl ListScope {
    pub fn path(&self) -> String {
        match self {
            ListScope::All(collection) => collection.path().to_string(),
            ListScope::GradesOfUser(user_id) => format!("grades/user/{}", user_id),
        }
    }

    /// Collection whose mutations invalidate this scope.
    pub fn collection(&self) -> Collection {
        match self {
            ListScope::All(collection) => *collection,
            ListScope::GradesOfUser(_) => Collection::Grades,
        }
    }
}

/// A row type that can be listed from the backend.
pub trait Record: DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: Collection;

    fn id(&self) -> RecordId;
}
