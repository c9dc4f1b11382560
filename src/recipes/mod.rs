//! Recipe browsing and version history against the backend. Mostly thin
//! passthroughs over the API client; the detail view fetches the recipe and
//! its version list concurrently.

pub mod commands;

use anyhow::Result;
use serde::Serialize;

use crate::api::ApiClient;
use crate::models::{CookingSession, Recipe, RecipeVersion};

/// Everything the recipe detail screen needs in one round trip from the
/// frontend's perspective.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDetail {
    pub recipe: Recipe,
    pub versions: Vec<RecipeVersion>,
    pub sessions: Vec<CookingSession>,
}

pub async fn fetch_detail(api: &ApiClient, slug: &str) -> Result<RecipeDetail> {
    let (recipe, versions, sessions) = tokio::try_join!(
        api.get_recipe(slug),
        api.list_versions(slug),
        api.list_sessions(slug),
    )?;
    Ok(RecipeDetail {
        recipe,
        versions,
        sessions,
    })
}
