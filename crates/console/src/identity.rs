//! Resolution of scanned QR payloads to known students.

use schooldesk_core::models::RecordId;
use schooldesk_core::models::user::StudentIdentity;
use serde_json::Value;

/// What a scanned payload claims to identify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScannedIdentity {
    Id(RecordId),
    Email(String),
    /// Token only the backend can resolve.
    Opaque(String),
}

impl ScannedIdentity {
    /// Accepts a bare numeric id, an email address, or a JSON object
    /// carrying `userId`, `id` or `email`.
    pub fn parse(payload: &str) -> Self {
        let payload = payload.trim();
        if let Ok(id) = payload.parse::<RecordId>() {
            return ScannedIdentity::Id(id);
        }
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(payload) {
            let id = ["userId", "id"]
                .iter()
                .filter_map(|key| map.get(*key))
                .find_map(as_record_id);
            if let Some(id) = id {
                return ScannedIdentity::Id(id);
            }
            if let Some(email) = map.get("email").and_then(Value::as_str) {
                return ScannedIdentity::Email(email.trim().to_string());
            }
        }
        if looks_like_email(payload) {
            return ScannedIdentity::Email(payload.to_string());
        }
        ScannedIdentity::Opaque(payload.to_string())
    }

    pub fn matches(&self, student: &StudentIdentity) -> bool {
        match self {
            ScannedIdentity::Id(id) => student.id == *id,
            ScannedIdentity::Email(email) => student.email.eq_ignore_ascii_case(email),
            ScannedIdentity::Opaque(_) => false,
        }
    }
}

/// Finds the student a payload refers to among `roster`.
pub fn match_student<'a>(payload: &str, roster: &'a [StudentIdentity]) -> Option<&'a StudentIdentity> {
    let scanned = ScannedIdentity::parse(payload);
    roster.iter().find(|student| scanned.matches(student))
}

fn as_record_id(value: &Value) -> Option<RecordId> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn looks_like_email(raw: &str) -> bool {
    match raw.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !raw.contains(char::is_whitespace),
        None => false,
    }
}
