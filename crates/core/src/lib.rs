//! # SchoolDesk Core
//!
//! Shared vocabulary for the SchoolDesk console: the records exchanged with the
//! school backend, the page envelope every list view renders, and the error
//! taxonomy used across the workspace.

pub mod errors;
pub mod models;
