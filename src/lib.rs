mod api;
mod audio;
mod auth;
mod cook;
mod db;
mod editor;
mod importer;
mod models;
mod recipes;
mod settings;

use std::sync::Arc;

use api::ApiClient;
use audio::{Chime, ChimeHandle};
use auth::{
    commands::{get_auth_state, login, login_with_token, logout, register, take_pending_location},
    AuthController,
};
use cook::{
    commands::{
        choose_step_timer, cook_next_slide, cook_prev_slide, exit_cook_mode, get_cook_state,
        list_cook_runs, pause_step_timer, reset_step_timer, send_guide_message,
        set_step_timer_minutes, start_cook_mode, start_step_timer,
    },
    CookController,
};
use db::Database;
use editor::commands::{editor_from_version, empty_editor, normalize_editor};
use importer::{
    commands::{create_imported_recipe, discard_import, import_recipe, pending_import},
    ImportController,
};
use recipes::commands::{
    create_recipe, delete_recipe, delete_version, get_recipe_detail, get_session, get_version,
    list_my_sessions, list_recipes, rename_recipe, review_session, save_version,
};
use settings::{SettingsSnapshot, SettingsStore};
use tauri::{Emitter, Manager, State};

pub(crate) struct AppState {
    pub(crate) api: ApiClient,
    pub(crate) auth: AuthController,
    pub(crate) importer: ImportController,
    pub(crate) cook: CookController,
    pub(crate) db: Database,
    pub(crate) settings: SettingsStore,
}

#[tauri::command]
fn get_settings(state: State<AppState>) -> Result<SettingsSnapshot, String> {
    Ok(state.settings.snapshot())
}

#[tauri::command]
fn update_settings(
    state: State<AppState>,
    api_base_url: Option<String>,
    confirm_exit_cook_mode: Option<bool>,
) -> Result<SettingsSnapshot, String> {
    state
        .settings
        .update(api_base_url, confirm_exit_cook_mode)
        .map_err(|e| e.to_string())?;
    Ok(state.settings.snapshot())
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("ForkLog starting up...");

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .setup(|app| {
            let result = (|| -> anyhow::Result<()> {
                let app_data_dir = app
                    .path()
                    .app_data_dir()
                    .map_err(|err| anyhow::anyhow!(err))?;
                std::fs::create_dir_all(&app_data_dir)?;

                let db_path = app_data_dir.join("forklog.sqlite3");
                let database = Database::new(db_path)?;

                let settings_path = app_data_dir.join("settings.json");
                let settings_store = SettingsStore::new(settings_path)?;

                let api = ApiClient::new(settings_store.clone());
                let auth = AuthController::new(api.clone(), settings_store.clone());
                let importer = ImportController::new(api.clone());
                let chime: Arc<dyn Chime> = Arc::new(ChimeHandle::new());
                let cook = CookController::new(
                    app.handle().clone(),
                    api.clone(),
                    database.clone(),
                    settings_store.clone(),
                    chime,
                );

                // Close out runs that were live when the app last crashed.
                {
                    let cook_for_recovery = cook.clone();
                    tauri::async_runtime::block_on(async move {
                        cook_for_recovery.recover_interrupted_runs().await
                    })?;
                }

                // Validate any stored token in the background; the frontend
                // shows the loading state until auth-state-changed fires.
                {
                    let auth_for_startup = auth.clone();
                    let handle = app.handle().clone();
                    tauri::async_runtime::spawn(async move {
                        let snapshot = auth_for_startup.load_user().await;
                        let _ = handle.emit("auth-state-changed", &snapshot);
                    });
                }

                app.manage(AppState {
                    api,
                    auth,
                    importer,
                    cook,
                    db: database,
                    settings: settings_store,
                });

                Ok(())
            })();

            result.map_err(|err| err.into())
        })
        .invoke_handler(tauri::generate_handler![
            get_auth_state,
            login,
            register,
            login_with_token,
            logout,
            take_pending_location,
            list_recipes,
            get_recipe_detail,
            create_recipe,
            rename_recipe,
            delete_recipe,
            get_version,
            save_version,
            delete_version,
            list_my_sessions,
            get_session,
            review_session,
            empty_editor,
            editor_from_version,
            normalize_editor,
            import_recipe,
            pending_import,
            create_imported_recipe,
            discard_import,
            start_cook_mode,
            get_cook_state,
            cook_next_slide,
            cook_prev_slide,
            choose_step_timer,
            set_step_timer_minutes,
            start_step_timer,
            pause_step_timer,
            reset_step_timer,
            exit_cook_mode,
            send_guide_message,
            list_cook_runs,
            get_settings,
            update_settings,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
