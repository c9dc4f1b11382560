use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::recipe::RecipeVersion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRole {
    User,
    Assistant,
}

/// One chat turn in a cooking session. `log_entries` on the session is
/// append-only; array order is conversation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub role: LogRole,
    pub content: String,
    pub at: DateTime<Utc>,
}

/// A cooking run against one recipe version, persisted by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookingSession {
    pub id: i64,
    #[serde(default)]
    pub recipe_version: Option<RecipeVersion>,
    #[serde(default)]
    pub recipe_slug: Option<String>,
    #[serde(default)]
    pub recipe_name: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub step_durations_seconds: Vec<u64>,
    #[serde(default)]
    pub session_notes: String,
    #[serde(default)]
    pub modifications: String,
    #[serde(default)]
    pub log_entries: Vec<LogEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
}
