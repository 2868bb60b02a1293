use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use pretty_assertions::assert_eq;
use schooldesk_core::errors::{DeskError, GENERIC_FAILURE};
use schooldesk_core::models::auth::SessionUser;
use schooldesk_core::models::page::PageQuery;
use schooldesk_core::models::user::Role;
use schooldesk_core::models::{Collection, ListScope};
use schooldesk_store::RecordClient;
use schooldesk_store::RecordStore;
use schooldesk_store::http::HttpStore;
use schooldesk_store::session::{Session, SessionContext};
use serde_json::{Value, json};
use tempfile::tempdir;

#[derive(Debug, Clone)]
struct Seen {
    method: Method,
    uri: String,
    authorization: Option<String>,
    body: String,
}

/// In-process stand-in for the school backend.
#[derive(Clone, Default)]
struct FakeBackend {
    seen: Arc<Mutex<Vec<Seen>>>,
    replies: Arc<HashMap<(Method, String), (StatusCode, String)>>,
}

impl FakeBackend {
    fn with_replies(replies: Vec<(Method, &str, StatusCode, Value)>) -> Self {
        let replies = replies
            .into_iter()
            .map(|(method, path, status, body)| {
                let body = if body.is_null() {
                    String::new()
                } else {
                    body.to_string()
                };
                ((method, format!("/api/{}", path)), (status, body))
            })
            .collect();
        Self {
            seen: Arc::default(),
            replies: Arc::new(replies),
        }
    }

    fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    async fn serve(self) -> String {
        let app = Router::new().fallback(reply).with_state(self);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/api", addr)
    }
}

async fn reply(
    State(backend): State<FakeBackend>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    backend.seen.lock().unwrap().push(Seen {
        method: method.clone(),
        uri: uri.to_string(),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });
    let (status, body) = backend
        .replies
        .get(&(method, uri.path().to_string()))
        .cloned()
        .unwrap_or((StatusCode::NOT_FOUND, json!({"message": "Not found"}).to_string()));
    (status, [(header::CONTENT_TYPE, "application/json")], body)
}

fn operator() -> SessionUser {
    SessionUser {
        id: 1,
        name: "Rina Admin".to_string(),
        email: "rina@school.test".to_string(),
        role: Role::Admin,
    }
}

async fn signed_in_store(base_url: String) -> HttpStore {
    let session = Arc::new(SessionContext::ephemeral());
    session
        .sign_in(Session {
            token: "secret-token".to_string(),
            user: operator(),
        })
        .await
        .unwrap();
    HttpStore::new(base_url, Duration::from_secs(5), session).unwrap()
}

fn attendance_row(id: u64) -> Value {
    json!({
        "id": id,
        "user": {"id": 40 + id, "name": format!("Student {}", id), "email": "s@school.test"},
        "className": "7A",
        "date": "2024-05-01T07:15:00.000Z",
        "time": "2024-05-01T07:15:00.000Z",
        "method": "scan",
        "status": "present"
    })
}

#[test_log::test(tokio::test)]
async fn test_list_sends_one_based_page_and_bearer_token() {
    let backend = FakeBackend::with_replies(vec![(
        Method::GET,
        "attendances",
        StatusCode::OK,
        json!({"data": [attendance_row(6), attendance_row(7)], "meta": {"total": 7}}),
    )]);
    let store = signed_in_store(backend.clone().serve().await).await;

    let page = store
        .list(ListScope::All(Collection::Attendances), PageQuery::new(1, 5))
        .await
        .unwrap();

    assert_eq!(page.rows.len(), 2);
    assert_eq!(page.total, 7);
    assert_eq!(page.page, 1);

    let seen = backend.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].uri, "/api/attendances?page=2&limit=5");
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer secret-token"));
}

#[tokio::test]
async fn test_bare_array_is_sliced_client_side() {
    let subjects: Vec<Value> = (1..=7)
        .map(|id| json!({"id": id, "name": format!("Subject {}", id)}))
        .collect();
    let backend = FakeBackend::with_replies(vec![(
        Method::GET,
        "subjects",
        StatusCode::OK,
        Value::Array(subjects),
    )]);
    let store = signed_in_store(backend.serve().await).await;

    let page = store
        .list(ListScope::All(Collection::Subjects), PageQuery::new(1, 5))
        .await
        .unwrap();

    assert_eq!(page.total, 7);
    let ids: Vec<u64> = page.rows.iter().filter_map(|r| r["id"].as_u64()).collect();
    assert_eq!(ids, vec![6, 7]);
}

#[tokio::test]
async fn test_rejection_message_is_surfaced_verbatim() {
    let backend = FakeBackend::with_replies(vec![(
        Method::POST,
        "attendances",
        StatusCode::CONFLICT,
        json!({"message": "Student already checked in today"}),
    )]);
    let store = signed_in_store(backend.serve().await).await;

    let err = store
        .create(Collection::Attendances, json!({"userId": 3}))
        .await
        .unwrap_err();

    assert!(matches!(err, DeskError::Rejected { status: 409, .. }));
    assert_eq!(err.user_message(), "Student already checked in today");
}

#[tokio::test]
async fn test_rejection_without_message_uses_generic_text() {
    let backend = FakeBackend::with_replies(vec![(
        Method::DELETE,
        "grades/9",
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({}),
    )]);
    let store = signed_in_store(backend.serve().await).await;

    let err = store.delete(Collection::Grades, 9).await.unwrap_err();

    assert_eq!(err.user_message(), GENERIC_FAILURE);
}

#[tokio::test]
async fn test_unauthorized_maps_to_authentication_error() {
    let backend = FakeBackend::with_replies(vec![(
        Method::GET,
        "user/total-students",
        StatusCode::UNAUTHORIZED,
        json!({"message": "Token expired"}),
    )]);
    let store = signed_in_store(backend.serve().await).await;

    let err = store
        .fetch("user/total-students".to_string())
        .await
        .unwrap_err();

    assert!(matches!(err, DeskError::Authentication(ref m) if m == "Token expired"));
}

#[tokio::test]
async fn test_users_are_patched_and_other_collections_put() {
    let backend = FakeBackend::with_replies(vec![
        (Method::PATCH, "user/3", StatusCode::OK, json!({"id": 3})),
        (Method::PUT, "subjects/4", StatusCode::OK, json!({"id": 4})),
    ]);
    let store = signed_in_store(backend.clone().serve().await).await;

    store
        .update(Collection::Users, 3, json!({"name": "Budi"}))
        .await
        .unwrap();
    store
        .update(Collection::Subjects, 4, json!({"name": "Biology"}))
        .await
        .unwrap();

    let seen = backend.seen();
    assert_eq!(seen[0].method, Method::PATCH);
    assert_eq!(seen[0].uri, "/api/user/3");
    assert_eq!(seen[1].method, Method::PUT);
    assert_eq!(seen[1].uri, "/api/subjects/4");
}

#[tokio::test]
async fn test_empty_success_body_decodes_as_null() {
    let backend = FakeBackend::with_replies(vec![(
        Method::DELETE,
        "attendances/5",
        StatusCode::OK,
        Value::Null,
    )]);
    let store = signed_in_store(backend.clone().serve().await).await;

    store.delete(Collection::Attendances, 5).await.unwrap();

    assert_eq!(backend.seen()[0].method, Method::DELETE);
}

#[tokio::test]
async fn test_scan_check_in_posts_payload_and_reads_confirmation() {
    let backend = FakeBackend::with_replies(vec![(
        Method::POST,
        "attendances/scan",
        StatusCode::CREATED,
        json!({"message": "Attendance recorded for Siti"}),
    )]);
    let store = signed_in_store(backend.clone().serve().await).await;
    let client = RecordClient::new(Arc::new(store));

    let receipt = client.scan_check_in("QR123").await.unwrap();

    assert_eq!(receipt.message, "Attendance recorded for Siti");
    let body: Value = serde_json::from_str(&backend.seen()[0].body).unwrap();
    assert_eq!(body, json!({"qrcode": "QR123"}));
}

#[tokio::test]
async fn test_login_persists_session_and_logout_always_clears_it() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.json");
    let backend = FakeBackend::with_replies(vec![
        (
            Method::POST,
            "auth/login",
            StatusCode::OK,
            json!({"token": "fresh", "user": {"id": 1, "name": "Rina Admin", "email": "rina@school.test", "role": "admin"}}),
        ),
        (
            Method::POST,
            "auth/logout",
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"message": "boom"}),
        ),
    ]);
    let base_url = backend.clone().serve().await;
    let session = Arc::new(SessionContext::restore(&path).await);
    let store = HttpStore::new(base_url, Duration::from_secs(5), session.clone()).unwrap();

    let user = store.login("rina@school.test", "hunter2").await.unwrap();

    assert_eq!(user, operator());
    assert!(path.exists());
    assert_eq!(session.token().await.as_deref(), Some("fresh"));

    store.logout().await.unwrap();

    assert!(!session.is_signed_in().await);
    assert!(!path.exists());
    let seen = backend.seen();
    assert_eq!(seen[1].authorization.as_deref(), Some("Bearer fresh"));
}

#[tokio::test]
async fn test_failed_login_is_an_authentication_error() {
    let backend = FakeBackend::with_replies(vec![(
        Method::POST,
        "auth/login",
        StatusCode::BAD_REQUEST,
        json!({"message": "Invalid credentials"}),
    )]);
    let session = Arc::new(SessionContext::ephemeral());
    let store =
        HttpStore::new(backend.serve().await, Duration::from_secs(5), session.clone()).unwrap();

    let err = store.login("x@school.test", "wrong").await.unwrap_err();

    assert!(matches!(err, DeskError::Authentication(ref m) if m == "Invalid credentials"));
    assert!(!session.is_signed_in().await);
}

#[tokio::test]
async fn test_current_user_unwraps_user_key() {
    let backend = FakeBackend::with_replies(vec![(
        Method::GET,
        "auth/me",
        StatusCode::OK,
        json!({"user": {"id": 1, "name": "Rina Admin", "email": "rina@school.test", "role": "admin"}}),
    )]);
    let store = signed_in_store(backend.serve().await).await;

    assert_eq!(store.current_user().await.unwrap(), operator());
}

#[tokio::test]
async fn test_unreachable_backend_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let store = signed_in_store(format!("http://{}/api", addr)).await;

    let err = store.fetch("teachers".to_string()).await.unwrap_err();

    assert!(err.is_transient());
}
