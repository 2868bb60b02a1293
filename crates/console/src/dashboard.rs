use schooldesk_core::models::stats::WeeklyAttendance;
use schooldesk_store::RecordClient;
use tracing::warn;

/// Overview figures. A figure that failed to load is `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSummary {
    pub attendance_today: Option<u64>,
    pub attendance_this_week: Option<WeeklyAttendance>,
    pub total_students: Option<u64>,
}

impl DashboardSummary {
    /// Loads every figure concurrently; never fails as a whole.
    pub async fn load(client: &RecordClient) -> Self {
        let (today, week, students) = tokio::join!(
            client.today_total(),
            client.weekly_attendance(),
            client.student_total()
        );

        Self {
            attendance_today: today
                .map_err(|e| warn!(error = %e, "Failed to load today's attendance"))
                .ok()
                .map(|t| t.total),
            attendance_this_week: week
                .map_err(|e| warn!(error = %e, "Failed to load this week's attendance"))
                .ok(),
            total_students: students
                .map_err(|e| warn!(error = %e, "Failed to load student total"))
                .ok()
                .map(|t| t.total),
        }
    }
}
