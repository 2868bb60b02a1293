use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use dotenv::dotenv;
use schooldesk_console::checkin::line::LineCamera;
use schooldesk_console::checkin::{CheckInDialog, ScanOutcome};
use schooldesk_console::config::ConsoleConfig;
use schooldesk_console::dashboard::DashboardSummary;
use schooldesk_console::export;
use schooldesk_console::history::{Filter, HistoryController};
use schooldesk_console::pagination::ListController;
use schooldesk_console::reconcile::ReconciliationEngine;
use schooldesk_core::models::attendance::{AttendanceRecord, weekday_name};
use schooldesk_core::models::grade::GradeRecord;
use schooldesk_core::models::{Collection, ListScope, RecordId};
use schooldesk_store::client::CATALOG_LIMIT;
use schooldesk_store::http::HttpStore;
use schooldesk_store::session::SessionContext;
use schooldesk_store::RecordClient;
use tokio::io::BufReader;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(version, about = "SchoolDesk administration console")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and remember the session
    Login { email: String, password: String },
    /// Sign out and forget the session
    Logout,
    /// Show the signed-in account
    Whoami,
    /// List attendance records (pages start at 1)
    Attendances {
        #[arg(default_value_t = 1)]
        page: usize,
        limit: Option<usize>,
    },
    /// List one student's grades
    Grades {
        user_id: RecordId,
        #[arg(default_value_t = 1)]
        page: usize,
        limit: Option<usize>,
    },
    /// Show a student's attendance history, optionally filtered by
    /// YYYY-MM-DD or weekday name
    History {
        user_id: RecordId,
        filter: Option<String>,
    },
    /// Show today's and this week's attendance and the student count
    Dashboard,
    /// Write today's attendance to a CSV file
    ExportToday {
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Write one student's grades to a CSV file
    ExportGrades {
        user_id: RecordId,
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Check a student in from a scanner that types codes on stdin
    Checkin,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Load environment variables
    dotenv().ok();

    // Load configuration
    let config = ConsoleConfig::from_env()?;
    schooldesk_console::init_tracing(config.log_level)?;

    let args = Args::parse();

    let session = Arc::new(SessionContext::restore(&config.session_file).await);
    let store = Arc::new(HttpStore::new(
        config.api_url.clone(),
        config.timeout(),
        session.clone(),
    )?);
    let client = RecordClient::new(store.clone());

    match args.command {
        Command::Login { email, password } => {
            let user = store.login(&email, &password).await?;
            println!("Signed in as {} <{}>", user.name, user.email);
        }
        Command::Logout => {
            store.logout().await?;
            println!("Signed out");
        }
        Command::Whoami => {
            let user = store.current_user().await?;
            println!("{} <{}> ({:?})", user.name, user.email, user.role);
        }
        Command::Attendances { page, limit } => {
            let mut view = ListController::<AttendanceRecord>::new(
                client,
                ListScope::All(Collection::Attendances),
                limit.unwrap_or(config.page_size),
            );
            view.reload().await;
            if page > 1 {
                view.set_page(page - 1).await;
            }
            if let Some(message) = view.last_error() {
                error!("Failed to load attendances: {}", message);
            }
            for record in view.rows() {
                println!(
                    "{:>5}  {:<24} {:<6} {} {}  {:<6} {}",
                    record.id,
                    record.user.name,
                    record.class_name.as_deref().unwrap_or("-"),
                    record.date,
                    record.time.format("%H:%M"),
                    format!("{:?}", record.method).to_lowercase(),
                    record.status
                );
            }
            println!(
                "Page {} of {} ({} records)",
                view.page() + 1,
                view.last_page() + 1,
                view.total()
            );
        }
        Command::Grades {
            user_id,
            page,
            limit,
        } => {
            let mut view = ListController::<GradeRecord>::new(
                client,
                ListScope::GradesOfUser(user_id),
                limit.unwrap_or(config.page_size),
            );
            view.reload().await;
            if page > 1 {
                view.set_page(page - 1).await;
            }
            if let Some(message) = view.last_error() {
                error!("Failed to load grades: {}", message);
            }
            for grade in view.rows() {
                println!(
                    "{:<20} {:<20} {:<10} {:>7}  {}",
                    grade.subject.name,
                    grade.teacher.user.name,
                    grade.semester,
                    grade.display_score(),
                    grade.display_remarks()
                );
            }
            println!(
                "Page {} of {} ({} grades)",
                view.page() + 1,
                view.last_page() + 1,
                view.total()
            );
        }
        Command::History { user_id, filter } => {
            let mut view = HistoryController::new(client, user_id, CATALOG_LIMIT);
            view.reload().await;
            if let Some(message) = view.last_error() {
                error!("Failed to load history: {}", message);
            }
            if let Some(raw) = filter {
                view.set_filter(Filter::parse(&raw));
            }
            if let Some(owner) = view.owner() {
                println!("{} <{}>", owner.name, owner.email);
            }
            for entry in view.view_page().rows {
                println!(
                    "{}  {:<9} {}  {}",
                    entry.date,
                    weekday_name(entry.date),
                    entry.time.format("%H:%M"),
                    entry.status
                );
            }
            println!("{} entries", view.count());
        }
        Command::Dashboard => {
            let summary = DashboardSummary::load(&client).await;
            let show = |value: Option<u64>| value.map_or_else(|| "-".to_string(), |v| v.to_string());
            println!("Attendance today:     {}", show(summary.attendance_today));
            println!(
                "Attendance this week: {}",
                show(summary.attendance_this_week.as_ref().map(|w| w.total))
            );
            if let Some(week) = &summary.attendance_this_week {
                for day in &week.daily {
                    println!("  {:<10} {}", day.day, day.total);
                }
            }
            println!("Students:             {}", show(summary.total_students));
        }
        Command::ExportToday { dir } => {
            let today = Utc::now().date_naive();
            let all = client
                .list_all::<AttendanceRecord>(ListScope::All(Collection::Attendances))
                .await?;
            let rows = export::rows_on(&all, today);
            let path = dir.join(export::today_file_name(today));
            let file = std::fs::File::create(&path)
                .wrap_err_with(|| format!("Failed to create {}", path.display()))?;
            export::write_attendance(file, &rows)?;
            info!(rows = rows.len(), "Exported today's attendance");
            println!("Wrote {} rows to {}", rows.len(), path.display());
        }
        Command::ExportGrades { user_id, dir } => {
            let (student, grades) = tokio::try_join!(
                client.user(user_id),
                client.list_all::<GradeRecord>(ListScope::GradesOfUser(user_id))
            )?;
            let path = dir.join(export::grades_file_name(&student.name));
            let file = std::fs::File::create(&path)
                .wrap_err_with(|| format!("Failed to create {}", path.display()))?;
            export::write_grades(file, &grades)?;
            info!(user_id, rows = grades.len(), "Exported grades");
            println!("Wrote {} grades for {} to {}", grades.len(), student.name, path.display());
        }
        Command::Checkin => {
            let mut engine = ReconciliationEngine::new(client.clone());
            if let Err(e) = engine.load_roster().await {
                warn!("Student roster unavailable, matching left to the server: {}", e);
            }
            let mut view = ListController::<AttendanceRecord>::new(
                client,
                ListScope::All(Collection::Attendances),
                config.page_size,
            );
            let mut dialog = CheckInDialog::new(config.scan);
            let Some(close) = dialog.open() else {
                return Ok(());
            };
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    close.close();
                }
            });

            println!("Scan a QR code (Ctrl-C to cancel)");
            let mut camera = LineCamera::new(BufReader::new(tokio::io::stdin()));
            match dialog.run(&mut camera, &engine, &mut view).await {
                ScanOutcome::Cancelled => println!("Check-in cancelled"),
                ScanOutcome::Finished(result) if result.is_success() => {
                    println!("{}", result.message())
                }
                ScanOutcome::Finished(result) => {
                    error!("Check-in failed: {}", result.message());
                    println!("{}", result.message());
                }
            }
            dialog.dismiss();
        }
    }

    Ok(())
}
