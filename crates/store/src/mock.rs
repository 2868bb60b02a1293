use async_trait::async_trait;
use mockall::mock;
use schooldesk_core::errors::DeskResult;
use schooldesk_core::models::page::{PageQuery, ViewPage};
use schooldesk_core::models::{Collection, ListScope, RecordId};
use serde_json::Value;

use crate::RecordStore;

// Mock backend for testing
mock! {
    pub Backend {}

    #[async_trait]
    impl RecordStore for Backend {
        async fn list(&self, scope: ListScope, query: PageQuery) -> DeskResult<ViewPage<Value>>;

        async fn fetch(&self, path: String) -> DeskResult<Value>;

        async fn create(&self, collection: Collection, body: Value) -> DeskResult<Value>;

        async fn update(&self, collection: Collection, id: RecordId, body: Value) -> DeskResult<Value>;

        async fn delete(&self, collection: Collection, id: RecordId) -> DeskResult<()>;

        async fn action(&self, path: String, body: Value) -> DeskResult<Value>;
    }
}
