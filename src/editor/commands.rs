use tauri::State;

use crate::editor::{EditorState, NormalizedRecipe};
use crate::AppState;

#[tauri::command]
pub fn empty_editor() -> EditorState {
    EditorState::empty()
}

#[tauri::command]
pub async fn editor_from_version(
    state: State<'_, AppState>,
    slug: String,
    version_id: i64,
) -> Result<EditorState, String> {
    state
        .auth
        .require_authenticated(Some(&format!("/recipes/{slug}/edit")))
        .await
        .map_err(|e| e.to_string())?;
    let version = state
        .api
        .get_version(&slug, version_id)
        .await
        .map_err(|e| e.to_string())?;
    Ok(EditorState::from_version(&version))
}

/// Pure normalization, exposed so the frontend can preview the canonical
/// payload and any field problems before committing.
#[tauri::command]
pub fn normalize_editor(editor: EditorState) -> NormalizedRecipe {
    editor.normalize()
}
