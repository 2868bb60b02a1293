//! # SchoolDesk Store
//!
//! Boundary between the console and the school REST backend.
//!
//! - [`RecordStore`] is the transport seam: JSON in, JSON out, every
//!   collection response already normalized into a [`ViewPage`].
//! - [`http::HttpStore`] implements it over `reqwest`.
//! - [`client::RecordClient`] is the typed facade the console talks to.
//! - [`session::SessionContext`] owns the signed-in operator's credentials.
//! - [`mock`] provides a `mockall` double of the transport for tests.

pub mod client;
pub mod http;
pub mod mock;
pub mod session;

use async_trait::async_trait;
use schooldesk_core::errors::DeskResult;
use schooldesk_core::models::page::{PageQuery, ViewPage};
use schooldesk_core::models::{Collection, ListScope, RecordId};
use serde_json::Value;

pub use client::RecordClient;

/// Raw access to the backend's collections.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// `GET {scope}?page&limit`, normalized into a page.
    async fn list(&self, scope: ListScope, query: PageQuery) -> DeskResult<ViewPage<Value>>;

    /// `GET {path}` for endpoints that are not paged collections.
    async fn fetch(&self, path: String) -> DeskResult<Value>;

    async fn create(&self, collection: Collection, body: Value) -> DeskResult<Value>;

    async fn update(&self, collection: Collection, id: RecordId, body: Value) -> DeskResult<Value>;

    async fn delete(&self, collection: Collection, id: RecordId) -> DeskResult<()>;

    /// `POST {path}` for non-CRUD actions such as scan submission.
    async fn action(&self, path: String, body: Value) -> DeskResult<Value>;
}
