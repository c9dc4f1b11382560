//! HTTP client for the ForkLog backend. Thin wrapper over reqwest: attaches
//! the auth token from the settings store, decodes JSON, and normalizes
//! every failure to a single message string for the UI.

use log::debug;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::models::{CookingSession, LogEntry, Recipe, RecipeVersion, RecipeVersionPayload, User};
use crate::settings::SettingsStore;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-2xx response; message is `data.error ?? data.detail ?? statusText`.
    #[error("{message}")]
    Api { status: StatusCode, message: String },
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            ApiError::Api {
                status: StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN,
                ..
            }
        )
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Extract the error message the backend contract guarantees: `error`, then
/// `detail`, then the HTTP status text.
fn error_message(status: StatusCode, body: &Value) -> String {
    body.get("error")
        .or_else(|| body.get("detail"))
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_owned()
        })
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    settings: SettingsStore,
}

impl ApiClient {
    pub fn new(settings: SettingsStore) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.api_base_url(), path)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> ApiResult<T> {
        debug!("{} {}", method, path);
        let mut req = self.http.request(method, self.url(path));
        if let Some(token) = self.settings.auth_token() {
            req = req.header("Authorization", format!("Token {token}"));
        }
        if let Some(body) = body {
            req = req.json(&body);
        }

        let res = req.send().await?;
        let status = res.status();
        // A body that is not JSON is treated as an empty object, matching the
        // backend error contract.
        let data: Value = res.json().await.unwrap_or_else(|_| json!({}));

        if !status.is_success() {
            return Err(ApiError::Api {
                status,
                message: error_message(status, &data),
            });
        }
        Ok(serde_json::from_value(data)?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request(Method::GET, path, None).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ApiResult<T> {
        self.request(Method::POST, path, Some(serde_json::to_value(body)?))
            .await
    }

    async fn patch<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ApiResult<T> {
        self.request(Method::PATCH, path, Some(serde_json::to_value(body)?))
            .await
    }

    async fn delete(&self, path: &str) -> ApiResult<()> {
        let _: Value = self.request(Method::DELETE, path, None).await?;
        Ok(())
    }

    // ── auth ──────────────────────────────────────────────────────────

    pub async fn login(&self, username: &str, password: &str) -> ApiResult<AuthResponse> {
        self.post("/auth/login/", &json!({ "username": username, "password": password }))
            .await
    }

    pub async fn register(&self, username: &str, password: &str) -> ApiResult<AuthResponse> {
        self.post("/auth/register/", &json!({ "username": username, "password": password }))
            .await
    }

    pub async fn me(&self) -> ApiResult<User> {
        self.get("/auth/me/").await
    }

    // ── recipes ───────────────────────────────────────────────────────

    pub async fn list_recipes(&self) -> ApiResult<Vec<Recipe>> {
        self.get("/recipes/").await
    }

    pub async fn get_recipe(&self, slug: &str) -> ApiResult<Recipe> {
        self.get(&format!("/recipes/{slug}/")).await
    }

    pub async fn create_recipe(&self, payload: &RecipeVersionPayload) -> ApiResult<Recipe> {
        self.post("/recipes/", payload).await
    }

    pub async fn update_recipe(&self, slug: &str, body: &Value) -> ApiResult<Recipe> {
        self.patch(&format!("/recipes/{slug}/"), body).await
    }

    pub async fn delete_recipe(&self, slug: &str) -> ApiResult<()> {
        self.delete(&format!("/recipes/{slug}/")).await
    }

    // ── versions ──────────────────────────────────────────────────────

    pub async fn list_versions(&self, slug: &str) -> ApiResult<Vec<RecipeVersion>> {
        self.get(&format!("/recipes/{slug}/versions/")).await
    }

    pub async fn get_version(&self, slug: &str, id: i64) -> ApiResult<RecipeVersion> {
        self.get(&format!("/recipes/{slug}/versions/{id}/")).await
    }

    pub async fn create_version(
        &self,
        slug: &str,
        payload: &RecipeVersionPayload,
    ) -> ApiResult<RecipeVersion> {
        self.post(&format!("/recipes/{slug}/versions/"), payload).await
    }

    pub async fn update_version(&self, slug: &str, id: i64, body: &Value) -> ApiResult<RecipeVersion> {
        self.patch(&format!("/recipes/{slug}/versions/{id}/"), body).await
    }

    pub async fn delete_version(&self, slug: &str, id: i64) -> ApiResult<()> {
        self.delete(&format!("/recipes/{slug}/versions/{id}/")).await
    }

    // ── cooking sessions ──────────────────────────────────────────────

    pub async fn list_sessions(&self, slug: &str) -> ApiResult<Vec<CookingSession>> {
        self.get(&format!("/recipes/{slug}/sessions/")).await
    }

    pub async fn get_session(&self, slug: &str, id: i64) -> ApiResult<CookingSession> {
        self.get(&format!("/recipes/{slug}/sessions/{id}/")).await
    }

    pub async fn create_session(&self, slug: &str, body: &Value) -> ApiResult<CookingSession> {
        self.post(&format!("/recipes/{slug}/sessions/"), body).await
    }

    pub async fn update_session(
        &self,
        slug: &str,
        id: i64,
        body: &Value,
    ) -> ApiResult<CookingSession> {
        self.patch(&format!("/recipes/{slug}/sessions/{id}/"), body).await
    }

    pub async fn list_my_sessions(&self) -> ApiResult<Vec<CookingSession>> {
        self.get("/sessions/").await
    }

    // ── AI endpoints ──────────────────────────────────────────────────

    /// Chat-style cooking assistant. The backend replies with the assistant
    /// message for the given session/log context.
    pub async fn guide(&self, body: &Value) -> ApiResult<GuideResponse> {
        self.post("/ai/guide/", body).await
    }

    /// Parse pasted free text into a recipe document.
    pub async fn import_text(&self, source: &str) -> ApiResult<RecipeVersionPayload> {
        self.post("/ai/import/", &json!({ "source": source })).await
    }

    /// Parse a fetched webpage into a recipe document.
    pub async fn import_webpage(
        &self,
        url: &str,
        content: &str,
        language: &str,
    ) -> ApiResult<RecipeVersionPayload> {
        self.post(
            "/ai/import/",
            &json!({ "url": url, "content": content, "language": language }),
        )
        .await
    }

    /// Fetch a page body for the webpage import. Plain GET; the backend does
    /// the actual parsing.
    pub async fn fetch_page(&self, url: &str) -> ApiResult<String> {
        let res = self.http.get(url).send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(ApiError::Api {
                status,
                message: error_message(status, &json!({})),
            });
        }
        Ok(res.text().await?)
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct AuthResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GuideResponse {
    pub reply: String,
    #[serde(default)]
    pub log_entries: Option<Vec<LogEntry>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_error_field() {
        let body = json!({ "error": "bad slug", "detail": "ignored" });
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, &body),
            "bad slug"
        );
    }

    #[test]
    fn error_message_falls_back_to_detail() {
        let body = json!({ "detail": "not found" });
        assert_eq!(error_message(StatusCode::NOT_FOUND, &body), "not found");
    }

    #[test]
    fn error_message_falls_back_to_status_text() {
        assert_eq!(
            error_message(StatusCode::NOT_FOUND, &json!({})),
            "Not Found"
        );
    }
}
