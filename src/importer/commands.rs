use tauri::State;

use crate::editor::EditorState;
use crate::models::{Recipe, RecipeVersionPayload};
use crate::AppState;

#[tauri::command]
pub async fn import_recipe(
    state: State<'_, AppState>,
    source: String,
) -> Result<EditorState, String> {
    state
        .auth
        .require_authenticated(Some("/import"))
        .await
        .map_err(|e| e.to_string())?;
    state.importer.import(&source).await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn pending_import(
    state: State<'_, AppState>,
) -> Result<Option<RecipeVersionPayload>, String> {
    Ok(state.importer.pending().await)
}

#[tauri::command]
pub async fn create_imported_recipe(
    state: State<'_, AppState>,
    editor: EditorState,
) -> Result<Recipe, String> {
    state
        .auth
        .require_authenticated(Some("/import"))
        .await
        .map_err(|e| e.to_string())?;
    state
        .importer
        .create_reviewed(&editor)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn discard_import(state: State<'_, AppState>) -> Result<(), String> {
    state.importer.discard().await;
    Ok(())
}
