//! HTTP client for the remote task API.
//!
//! Endpoints consumed (bearer-authorized unless noted):
//! - `POST /auth/login` / `POST /auth/register` (unauthorized) → `{token}`
//! - `DELETE /auth/delete` — deletes the account server-side
//! - `GET /tasks` → ordered task list
//! - `POST /tasks {title}` → created task with server-assigned id
//! - `PUT /tasks/:id {title?, completed?}` → updated task
//! - `DELETE /tasks/:id`
//!
//! ## Design
//! - Every call is fire-once: no retry, no backoff, no queueing.
//! - Non-success statuses are classified in exactly one place
//!   ([`classify`]): 401 becomes [`ApiError::Unauthorized`], everything
//!   else an [`ApiError::Status`] carrying the server's `{"error": ...}`
//!   message when one was sent.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-request timeout.
const REQUEST_TIMEOUT_SECS: u64 = 30;

// ── Wire models ──────────────────────────────────────────────────

/// A single task as the server represents it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Server-assigned opaque identifier.
    #[serde(rename = "_id")]
    pub id: String,
    /// Task text.
    pub title: String,
    /// Completion flag.
    pub completed: bool,
}

/// Partial update for `PUT /tasks/:id`. Fields left `None` are omitted
/// from the request body and stay untouched server-side.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

/// Successful auth response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

/// Error body shape the server uses for failures.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
struct AuthRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateTaskRequest<'a> {
    title: &'a str,
}

// ── Client ───────────────────────────────────────────────────────

/// HTTP client for the remote task API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Create a client for the given base URL (trailing slash tolerated).
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn bearer(&self, token: &str) -> String {
        format!("Bearer {token}")
    }

    // ── Auth endpoints ───────────────────────────────────────

    /// Exchange email + password for a session token.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let resp = self
            .http
            .post(self.url("/auth/login"))
            .json(&AuthRequest { email, password })
            .send()
            .await?;

        let resp = classify(resp).await?;
        let body: TokenResponse = resp.json().await?;
        Ok(body.token)
    }

    /// Register a new account; returns the session token on success.
    pub async fn register(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let resp = self
            .http
            .post(self.url("/auth/register"))
            .json(&AuthRequest { email, password })
            .send()
            .await?;

        let resp = classify(resp).await?;
        let body: TokenResponse = resp.json().await?;
        Ok(body.token)
    }

    /// Delete the account behind the given credential.
    pub async fn delete_account(&self, token: &str) -> Result<(), ApiError> {
        let resp = self
            .http
            .delete(self.url("/auth/delete"))
            .header("Authorization", self.bearer(token))
            .send()
            .await?;

        classify(resp).await?;
        Ok(())
    }

    // ── Task endpoints ───────────────────────────────────────

    /// Fetch the full task collection, in server order.
    pub async fn list_tasks(&self, token: &str) -> Result<Vec<Task>, ApiError> {
        let resp = self
            .http
            .get(self.url("/tasks"))
            .header("Authorization", self.bearer(token))
            .send()
            .await?;

        let resp = classify(resp).await?;
        Ok(resp.json().await?)
    }

    /// Create a task; the server assigns the id.
    pub async fn create_task(&self, token: &str, title: &str) -> Result<Task, ApiError> {
        let resp = self
            .http
            .post(self.url("/tasks"))
            .header("Authorization", self.bearer(token))
            .json(&CreateTaskRequest { title })
            .send()
            .await?;

        let resp = classify(resp).await?;
        Ok(resp.json().await?)
    }

    /// Apply a partial update; returns the server's full updated record.
    pub async fn update_task(
        &self,
        token: &str,
        id: &str,
        patch: &TaskPatch,
    ) -> Result<Task, ApiError> {
        let resp = self
            .http
            .put(self.url(&format!("/tasks/{id}")))
            .header("Authorization", self.bearer(token))
            .json(patch)
            .send()
            .await?;

        let resp = classify(resp).await?;
        Ok(resp.json().await?)
    }

    /// Delete a task by id.
    pub async fn delete_task(&self, token: &str, id: &str) -> Result<(), ApiError> {
        let resp = self
            .http
            .delete(self.url(&format!("/tasks/{id}")))
            .header("Authorization", self.bearer(token))
            .send()
            .await?;

        classify(resp).await?;
        Ok(())
    }
}

/// Classify a response: pass successes through, map 401 to
/// [`ApiError::Unauthorized`], and extract the server's error message for
/// everything else.
async fn classify(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|e| e.error)
        .ok()
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });

    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

// ── Tests ────────────────────────────────────────────────────────
