//! # SchoolDesk Console
//!
//! Headless controllers behind the school-administration console. Each
//! controller owns the state of one view and talks to the backend through
//! a [`schooldesk_store::RecordClient`].
//!
//! ## Architecture
//!
//! - **Pagination**: server-paged list views and the client-side history view
//! - **Selection**: page-scoped row selection
//! - **Reconcile**: mutations that always end in a refetch, plus the delete gate
//! - **Check-in**: the QR camera session state machine
//! - **Modal**: duplicate-submission guard for forms
//! - **Dashboard / Export**: overview figures and CSV export
//! - **Config**: environment configuration

/// Configuration module for console settings
pub mod config;

pub mod checkin;
pub mod dashboard;
pub mod export;
pub mod history;
pub mod identity;
pub mod modal;
pub mod pagination;
pub mod reconcile;
pub mod selection;

use eyre::Result;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Installs the global `tracing` subscriber at `level`.
pub fn init_tracing(level: Level) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
