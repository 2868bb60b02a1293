//! `reqwest` implementation of [`RecordStore`].

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use schooldesk_core::errors::{DeskError, DeskResult};
use schooldesk_core::models::auth::{LoginRequest, LoginResponse, SessionUser};
use schooldesk_core::models::page::{PageQuery, ViewPage};
use schooldesk_core::models::{Collection, ListScope, RecordId};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::RecordStore;
use crate::session::{Session, SessionContext};

/// Default request timeout, matching the web console.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpStore {
    client: Client,
    base_url: String,
    session: Arc<SessionContext>,
}

impl HttpStore {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        session: Arc<SessionContext>,
    ) -> DeskResult<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| DeskError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    /// Sends a request with the session's bearer token and decodes the body.
    async fn send(&self, builder: RequestBuilder) -> DeskResult<Value> {
        let builder = match self.session.token().await {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };
        let request = builder.build().map_err(transport)?;
        let method = request.method().clone();
        let url = request.url().to_string();
        let start = Instant::now();

        let response = self.client.execute(request).await.map_err(|e| {
            warn!(%method, %url, error = %e, "Request failed");
            transport(e)
        })?;

        debug!(
            %method,
            %url,
            status = response.status().as_u16(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Request completed"
        );
        decode(response).await
    }
}

#[async_trait]
impl RecordStore for HttpStore {
    async fn list(&self, scope: ListScope, query: PageQuery) -> DeskResult<ViewPage<Value>> {
        let body = self
            .send(self.request(Method::GET, &scope.path()).query(&query.to_params()))
            .await?;
        ViewPage::normalize(body, query)
    }

    async fn fetch(&self, path: String) -> DeskResult<Value> {
        self.send(self.request(Method::GET, &path)).await
    }

    async fn create(&self, collection: Collection, body: Value) -> DeskResult<Value> {
        self.send(self.request(Method::POST, collection.path()).json(&body))
            .await
    }

    async fn update(&self, collection: Collection, id: RecordId, body: Value) -> DeskResult<Value> {
        let method = if collection.patches_on_update() {
            Method::PATCH
        } else {
            Method::PUT
        };
        let path = format!("{}/{}", collection.path(), id);
        self.send(self.request(method, &path).json(&body)).await
    }

    async fn delete(&self, collection: Collection, id: RecordId) -> DeskResult<()> {
        let path = format!("{}/{}", collection.path(), id);
        self.send(self.request(Method::DELETE, &path)).await?;
        Ok(())
    }

    async fn action(&self, path: String, body: Value) -> DeskResult<Value> {
        self.send(self.request(Method::POST, &path).json(&body)).await
    }
}

impl HttpStore {
    /// Signs in and stores the returned session.
    pub async fn login(&self, email: &str, password: &str) -> DeskResult<SessionUser> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let body = self
            .send(self.request(Method::POST, "auth/login").json(&request))
            .await
            .map_err(|e| match e {
                DeskError::Rejected { message, .. } => DeskError::Authentication(message),
                other => other,
            })?;
        let response: LoginResponse = serde_json::from_value(body)?;
        let user = response.user.clone();
        self.session
            .sign_in(Session {
                token: response.token,
                user: response.user,
            })
            .await?;
        info!("Signed in as {}", user.email);
        Ok(user)
    }

    /// `GET /auth/me`.
    pub async fn current_user(&self) -> DeskResult<SessionUser> {
        let body = self.send(self.request(Method::GET, "auth/me")).await?;
        let user = match body {
            Value::Object(mut map) if map.contains_key("user") => {
                map.remove("user").unwrap_or(Value::Null)
            }
            other => other,
        };
        Ok(serde_json::from_value(user)?)
    }

    /// Notifies the backend and always clears the local session.
    pub async fn logout(&self) -> DeskResult<()> {
        if self.session.is_signed_in().await {
            if let Err(e) = self
                .send(self.request(Method::POST, "auth/logout"))
                .await
            {
                warn!("Logout request failed, clearing session anyway: {}", e);
            }
        }
        self.session.sign_out().await
    }
}

fn transport(err: reqwest::Error) -> DeskError {
    if err.is_decode() {
        DeskError::Decode(err.to_string())
    } else {
        DeskError::Transport(err.to_string())
    }
}

async fn decode(response: Response) -> DeskResult<Value> {
    let status = response.status();
    let bytes = response.bytes().await.map_err(transport)?;

    if !status.is_success() {
        let message = rejection_message(&bytes);
        return Err(if status.as_u16() == 401 {
            DeskError::Authentication(message)
        } else {
            DeskError::Rejected {
                status: status.as_u16(),
                message,
            }
        });
    }

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

/// Pulls the human-readable reason out of an error body.
fn rejection_message(bytes: &[u8]) -> String {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(body) => body
            .get("message")
            .or_else(|| body.get("error"))
            .and_then(|m| match m {
                Value::String(s) => Some(s.clone()),
                Value::Array(items) => Some(
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .collect::<Vec<_>>()
                        .join(", "),
                ),
                _ => None,
            })
            .unwrap_or_default(),
        Err(_) => String::from_utf8_lossy(bytes).trim().to_string(),
    }
}
