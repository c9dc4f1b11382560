use tauri::{AppHandle, Emitter, State};

use crate::auth::AuthSnapshot;
use crate::AppState;

fn emit_auth_state(app_handle: &AppHandle, snapshot: &AuthSnapshot) {
    let _ = app_handle.emit("auth-state-changed", snapshot);
}

#[tauri::command]
pub async fn get_auth_state(state: State<'_, AppState>) -> Result<AuthSnapshot, String> {
    Ok(state.auth.snapshot().await)
}

#[tauri::command]
pub async fn login(
    state: State<'_, AppState>,
    app_handle: AppHandle,
    username: String,
    password: String,
) -> Result<AuthSnapshot, String> {
    let snapshot = state
        .auth
        .login(&username, &password)
        .await
        .map_err(|e| e.to_string())?;
    emit_auth_state(&app_handle, &snapshot);
    Ok(snapshot)
}

#[tauri::command]
pub async fn register(
    state: State<'_, AppState>,
    app_handle: AppHandle,
    username: String,
    password: String,
) -> Result<AuthSnapshot, String> {
    let snapshot = state
        .auth
        .register(&username, &password)
        .await
        .map_err(|e| e.to_string())?;
    emit_auth_state(&app_handle, &snapshot);
    Ok(snapshot)
}

#[tauri::command]
pub async fn login_with_token(
    state: State<'_, AppState>,
    app_handle: AppHandle,
    token: String,
) -> Result<AuthSnapshot, String> {
    let snapshot = state
        .auth
        .login_with_token(&token)
        .await
        .map_err(|e| e.to_string())?;
    emit_auth_state(&app_handle, &snapshot);
    Ok(snapshot)
}

#[tauri::command]
pub async fn logout(
    state: State<'_, AppState>,
    app_handle: AppHandle,
) -> Result<AuthSnapshot, String> {
    let snapshot = state.auth.logout().await.map_err(|e| e.to_string())?;
    emit_auth_state(&app_handle, &snapshot);
    Ok(snapshot)
}

#[tauri::command]
pub async fn take_pending_location(state: State<'_, AppState>) -> Result<Option<String>, String> {
    Ok(state.auth.take_pending_location().await)
}
