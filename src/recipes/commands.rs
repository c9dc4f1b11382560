use serde_json::json;
use tauri::State;

use crate::editor::{EditorState, NormalizedRecipe};
use crate::models::{CookingSession, Recipe, RecipeVersion};
use crate::AppState;

use super::{fetch_detail, RecipeDetail};

#[tauri::command]
pub async fn list_recipes(state: State<'_, AppState>) -> Result<Vec<Recipe>, String> {
    state
        .auth
        .require_authenticated(Some("/recipes"))
        .await
        .map_err(|e| e.to_string())?;
    state.api.list_recipes().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn get_recipe_detail(
    state: State<'_, AppState>,
    slug: String,
) -> Result<RecipeDetail, String> {
    state
        .auth
        .require_authenticated(Some(&format!("/recipes/{slug}")))
        .await
        .map_err(|e| e.to_string())?;
    fetch_detail(&state.api, &slug)
        .await
        .map_err(|e| e.to_string())
}

/// Create a new recipe from the editor. The editor is normalized first; the
/// caller gets the created recipe plus any field problems that were dropped.
#[tauri::command]
pub async fn create_recipe(
    state: State<'_, AppState>,
    editor: EditorState,
) -> Result<CreatedRecipe, String> {
    state
        .auth
        .require_authenticated(Some("/recipes/new"))
        .await
        .map_err(|e| e.to_string())?;
    let NormalizedRecipe { payload, problems } = editor.normalize();
    let recipe = state
        .api
        .create_recipe(&payload)
        .await
        .map_err(|e| e.to_string())?;
    Ok(CreatedRecipe { recipe, problems })
}

#[derive(serde::Serialize)]
pub struct CreatedRecipe {
    pub recipe: Recipe,
    pub problems: Vec<String>,
}

#[tauri::command]
pub async fn rename_recipe(
    state: State<'_, AppState>,
    slug: String,
    name: String,
) -> Result<Recipe, String> {
    state
        .auth
        .require_authenticated(Some(&format!("/recipes/{slug}")))
        .await
        .map_err(|e| e.to_string())?;
    state
        .api
        .update_recipe(&slug, &json!({ "name": name }))
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn delete_recipe(state: State<'_, AppState>, slug: String) -> Result<(), String> {
    state
        .auth
        .require_authenticated(Some(&format!("/recipes/{slug}")))
        .await
        .map_err(|e| e.to_string())?;
    state.api.delete_recipe(&slug).await.map_err(|e| e.to_string())
}

// ── versions ──────────────────────────────────────────────────────────

#[tauri::command]
pub async fn get_version(
    state: State<'_, AppState>,
    slug: String,
    version_id: i64,
) -> Result<RecipeVersion, String> {
    state
        .auth
        .require_authenticated(Some(&format!("/recipes/{slug}")))
        .await
        .map_err(|e| e.to_string())?;
    state
        .api
        .get_version(&slug, version_id)
        .await
        .map_err(|e| e.to_string())
}

/// Save an edited recipe as a new immutable version.
#[tauri::command]
pub async fn save_version(
    state: State<'_, AppState>,
    slug: String,
    editor: EditorState,
) -> Result<SavedVersion, String> {
    state
        .auth
        .require_authenticated(Some(&format!("/recipes/{slug}/edit")))
        .await
        .map_err(|e| e.to_string())?;
    let NormalizedRecipe { payload, problems } = editor.normalize();
    let version = state
        .api
        .create_version(&slug, &payload)
        .await
        .map_err(|e| e.to_string())?;
    Ok(SavedVersion { version, problems })
}

#[derive(serde::Serialize)]
pub struct SavedVersion {
    pub version: RecipeVersion,
    pub problems: Vec<String>,
}

#[tauri::command]
pub async fn delete_version(
    state: State<'_, AppState>,
    slug: String,
    version_id: i64,
) -> Result<(), String> {
    state
        .auth
        .require_authenticated(Some(&format!("/recipes/{slug}")))
        .await
        .map_err(|e| e.to_string())?;
    state
        .api
        .delete_version(&slug, version_id)
        .await
        .map_err(|e| e.to_string())
}

// ── cooking sessions ──────────────────────────────────────────────────

#[tauri::command]
pub async fn list_my_sessions(
    state: State<'_, AppState>,
) -> Result<Vec<CookingSession>, String> {
    state
        .auth
        .require_authenticated(Some("/sessions"))
        .await
        .map_err(|e| e.to_string())?;
    state.api.list_my_sessions().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn get_session(
    state: State<'_, AppState>,
    slug: String,
    session_id: i64,
) -> Result<CookingSession, String> {
    state
        .auth
        .require_authenticated(Some(&format!("/recipes/{slug}/sessions/{session_id}")))
        .await
        .map_err(|e| e.to_string())?;
    state
        .api
        .get_session(&slug, session_id)
        .await
        .map_err(|e| e.to_string())
}

/// Post-cook review: rating, freeform notes, and the modifications the cook
/// made this time around.
#[tauri::command]
pub async fn review_session(
    state: State<'_, AppState>,
    slug: String,
    session_id: i64,
    rating: Option<u8>,
    session_notes: Option<String>,
    modifications: Option<String>,
) -> Result<CookingSession, String> {
    state
        .auth
        .require_authenticated(Some(&format!("/recipes/{slug}/sessions/{session_id}")))
        .await
        .map_err(|e| e.to_string())?;
    let mut body = serde_json::Map::new();
    if let Some(rating) = rating {
        body.insert("rating".into(), json!(rating));
    }
    if let Some(notes) = session_notes {
        body.insert("session_notes".into(), json!(notes));
    }
    if let Some(modifications) = modifications {
        body.insert("modifications".into(), json!(modifications));
    }
    state
        .api
        .update_session(&slug, session_id, &json!(body))
        .await
        .map_err(|e| e.to_string())
}
