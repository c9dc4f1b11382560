use tauri::State;

use crate::db::CookRun;
use crate::models::LogEntry;
use crate::AppState;

use super::{CookSnapshot, ExitOutcome, TimerSnapshot};

#[tauri::command]
pub async fn start_cook_mode(
    state: State<'_, AppState>,
    slug: String,
) -> Result<CookSnapshot, String> {
    state
        .auth
        .require_authenticated(Some(&format!("/recipes/{slug}/cook")))
        .await
        .map_err(|e| e.to_string())?;
    state.cook.start(&slug).await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn get_cook_state(state: State<'_, AppState>) -> Result<CookSnapshot, String> {
    state.cook.snapshot().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn cook_next_slide(state: State<'_, AppState>) -> Result<CookSnapshot, String> {
    state.cook.go_next().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn cook_prev_slide(state: State<'_, AppState>) -> Result<CookSnapshot, String> {
    state.cook.go_prev().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn choose_step_timer(
    state: State<'_, AppState>,
    wanted: bool,
) -> Result<CookSnapshot, String> {
    state.cook.choose_timer(wanted).await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn set_step_timer_minutes(
    state: State<'_, AppState>,
    minutes: u32,
) -> Result<TimerSnapshot, String> {
    state
        .cook
        .set_timer_minutes(minutes)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn start_step_timer(state: State<'_, AppState>) -> Result<TimerSnapshot, String> {
    state.cook.start_timer().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn pause_step_timer(state: State<'_, AppState>) -> Result<TimerSnapshot, String> {
    state.cook.pause_timer().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn reset_step_timer(state: State<'_, AppState>) -> Result<TimerSnapshot, String> {
    state.cook.reset_timer().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn exit_cook_mode(
    state: State<'_, AppState>,
    confirmed: bool,
) -> Result<ExitOutcome, String> {
    state.cook.exit(confirmed).await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn send_guide_message(
    state: State<'_, AppState>,
    content: String,
) -> Result<Vec<LogEntry>, String> {
    state
        .cook
        .send_guide_message(&content)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn list_cook_runs(state: State<'_, AppState>) -> Result<Vec<CookRun>, String> {
    state.db.list_runs().await.map_err(|e| e.to_string())
}
