use serde::{Deserialize, Serialize};

/// `GET /attendances/total-today` and `GET /user/total-students`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Total {
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub day: String,
    pub total: u64,
}

/// `GET /attendances/total-this-week`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyAttendance {
    #[serde(default)]
    pub daily: Vec<DailyTotal>,
    pub total: u64,
}
