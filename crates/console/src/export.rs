//! Spreadsheet export of loaded rows.

use chrono::NaiveDate;
use eyre::WrapErr;
use schooldesk_core::errors::DeskResult;
use schooldesk_core::models::attendance::{AttendanceRecord, AttendanceStatus, CheckInMethod};
use schooldesk_core::models::grade::GradeRecord;
use std::io;

const ATTENDANCE_HEADER: &str = "No,Name,Email,Class,Date,Time,Method,Status\n";
const GRADE_HEADER: &str = "Subject,Teacher,Semester,Score,Remarks\n";

/// Attendance rows as CSV, numbered from 1 in the order given.
pub fn attendance_csv(rows: &[AttendanceRecord]) -> String {
    let mut csv = String::from(ATTENDANCE_HEADER);
    for (i, record) in rows.iter().enumerate() {
        let method = match record.method {
            CheckInMethod::Manual => "manual",
            CheckInMethod::Scan => "scan",
        };
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{}\n",
            i + 1,
            csv_quote(&record.user.name),
            csv_quote(&record.user.email),
            csv_quote(record.class_name.as_deref().unwrap_or("-")),
            record.date.format("%Y-%m-%d"),
            record.time.format("%H:%M"),
            method,
            record.status.as_str()
        ));
    }
    csv
}

pub fn grades_csv(rows: &[GradeRecord]) -> String {
    let mut csv = String::from(GRADE_HEADER);
    for record in rows {
        csv.push_str(&format!(
            "{},{},{},{},{}\n",
            csv_quote(&record.subject.name),
            csv_quote(&record.teacher.user.name),
            csv_quote(&record.semester),
            record.display_score(),
            csv_quote(record.display_remarks())
        ));
    }
    csv
}

pub fn write_attendance<W: io::Write>(mut writer: W, rows: &[AttendanceRecord]) -> DeskResult<()> {
    writer
        .write_all(attendance_csv(rows).as_bytes())
        .wrap_err("Failed to write attendance export")?;
    writer.flush().wrap_err("Failed to flush attendance export")?;
    Ok(())
}

pub fn write_grades<W: io::Write>(mut writer: W, rows: &[GradeRecord]) -> DeskResult<()> {
    writer
        .write_all(grades_csv(rows).as_bytes())
        .wrap_err("Failed to write grade export")?;
    writer.flush().wrap_err("Failed to flush grade export")?;
    Ok(())
}

/// Rows recorded on `day`.
pub fn rows_on(rows: &[AttendanceRecord], day: NaiveDate) -> Vec<AttendanceRecord> {
    rows.iter().filter(|r| r.date == day).cloned().collect()
}

pub fn rows_with_status(rows: &[AttendanceRecord], status: AttendanceStatus) -> Vec<AttendanceRecord> {
    rows.iter().filter(|r| r.status == status).cloned().collect()
}

pub fn today_file_name(today: NaiveDate) -> String {
    format!("attendance-today-{}.csv", today.format("%Y-%m-%d"))
}

pub fn status_file_name(status: AttendanceStatus) -> String {
    format!("attendance-{}.csv", status.as_str())
}

pub fn grades_file_name(student: &str) -> String {
    format!("grades-{}.csv", slug(student))
}

fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn slug(raw: &str) -> String {
    let mut out = String::new();
    for c in raw.trim().chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    let trimmed = out.trim_end_matches('-');
    if trimmed.is_empty() {
        "student".to_string()
    } else {
        trimmed.to_string()
    }
}
