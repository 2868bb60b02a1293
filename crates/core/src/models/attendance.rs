use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use super::user::PersonRef;
use super::{Collection, Record, RecordId};
use crate::errors::{DeskError, DeskResult};

/// Closed set of attendance outcomes.
///
/// Views label these differently (the backend also emits Indonesian
/// labels), so deserialization accepts every known alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    #[serde(alias = "Present", alias = "hadir", alias = "Hadir")]
    Present,
    #[serde(alias = "Late", alias = "terlambat", alias = "Terlambat")]
    Late,
    #[serde(alias = "Sick", alias = "sakit", alias = "Sakit")]
    Sick,
    #[serde(alias = "Permission", alias = "excused", alias = "izin", alias = "Izin")]
    Permission,
    #[serde(alias = "Absent", alias = "alpa", alias = "Alpa", alias = "alpha", alias = "Alpha")]
    Absent,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 5] = [
        AttendanceStatus::Present,
        AttendanceStatus::Late,
        AttendanceStatus::Sick,
        AttendanceStatus::Permission,
        AttendanceStatus::Absent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Sick => "sick",
            AttendanceStatus::Permission => "permission",
            AttendanceStatus::Absent => "absent",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AttendanceStatus {
    type Err = DeskError;

    fn from_str(s: &str) -> DeskResult<Self> {
        serde_json::from_value(serde_json::Value::String(s.trim().to_string()))
            .map_err(|_| DeskError::Validation(format!("Unknown attendance status: {}", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckInMethod {
    Manual,
    Scan,
}

/// One check-in event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: RecordId,
    #[serde(alias = "student")]
    pub user: PersonRef,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(with = "flexible_date")]
    pub date: NaiveDate,
    #[serde(with = "flexible_time")]
    pub time: NaiveTime,
    pub method: CheckInMethod,
    pub status: AttendanceStatus,
}

impl Record for AttendanceRecord {
    const COLLECTION: Collection = Collection::Attendances;

    fn id(&self) -> RecordId {
        self.id
    }
}

impl AttendanceRecord {
    /// Date and time combined into the instant the backend stores.
    pub fn instant(&self) -> DateTime<Utc> {
        combine(self.date, self.time)
    }
}

/// Row of `GET /attendances/history/{userId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: RecordId,
    #[serde(with = "flexible_date")]
    pub date: NaiveDate,
    #[serde(with = "flexible_time")]
    pub time: NaiveTime,
    pub method: CheckInMethod,
    pub status: AttendanceStatus,
}

impl Record for HistoryEntry {
    const COLLECTION: Collection = Collection::Attendances;

    fn id(&self) -> RecordId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryOwner {
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceHistory {
    #[serde(default)]
    pub attendance: Vec<HistoryEntry>,
    pub user: Option<HistoryOwner>,
}

/// Body of `POST /attendances` and `PUT /attendances/{id}`.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceForm {
    pub user_id: RecordId,
    pub class_name: Option<String>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub method: CheckInMethod,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRequest {
    pub user_id: RecordId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    pub date: DateTime<Utc>,
    pub time: DateTime<Utc>,
    pub method: CheckInMethod,
    pub status: AttendanceStatus,
}

impl AttendanceForm {
    /// Prefills an edit form from an existing row.
    pub fn from_record(record: &AttendanceRecord) -> Self {
        Self {
            user_id: record.user.id,
            class_name: record.class_name.clone(),
            date: record.date,
            time: record.time,
            method: record.method,
            status: record.status,
        }
    }

    pub fn to_request(&self) -> AttendanceRequest {
        let instant = combine(self.date, self.time);
        AttendanceRequest {
            user_id: self.user_id,
            class_name: self.class_name.clone().filter(|c| !c.trim().is_empty()),
            date: instant,
            time: instant,
            method: self.method,
            status: self.status,
        }
    }
}

/// Body of `POST /attendances/scan`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRequest {
    pub qrcode: String,
}

/// Confirmation returned by a successful scan submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReceipt {
    #[serde(default)]
    pub message: String,
}

pub fn combine(date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    NaiveDateTime::new(date, time).and_utc()
}

/// English weekday name, as shown in the history filter.
pub fn weekday_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Accepts RFC 3339 instants as well as plain dates or times.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc).date_naive());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc).time());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.time());
    }
    NaiveTime::parse_from_str(raw, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

mod flexible_date {
    use super::*;

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format("%Y-%m-%d").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", raw)))
    }
}

mod flexible_time {
    use super::*;

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M:%S").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_time(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid time: {}", raw)))
    }
}
