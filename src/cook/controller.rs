use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;
use serde_json::json;
use tokio::{sync::Mutex, task::JoinHandle, time};
use uuid::Uuid;

use crate::{
    api::ApiClient,
    audio::Chime,
    db::{CookRun, CookRunStatus, Database},
    models::{LogEntry, LogRole, RecipeVersion, Step},
    settings::SettingsStore,
};

use super::{
    slides::{Slide, SlideDeck},
    timer::{StepTimer, Tick, TimerPhase, DEFAULT_TIMER_MINUTES},
};

use tauri::{AppHandle, Emitter};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub phase: TimerPhase,
    pub minutes: u32,
    pub seconds_remaining: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CookSnapshot {
    pub recipe_slug: String,
    pub recipe_name: String,
    pub slide: Slide,
    pub position: usize,
    pub total_slides: usize,
    pub step_count: usize,
    /// Current step content when the slide is a step.
    pub step: Option<Step>,
    pub step_started_at: Option<DateTime<Utc>>,
    /// None until the learner answers "would you like a timer?".
    pub timer_wanted: Option<bool>,
    pub timer: TimerSnapshot,
    pub log_entries: Vec<LogEntry>,
    pub confirm_exit: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitOutcome {
    /// Exit was blocked pending the confirmation prompt.
    pub needs_confirmation: bool,
    pub session_id: Option<i64>,
    /// Set when the final session sync failed; the run is still closed
    /// locally.
    pub sync_error: Option<String>,
}

#[derive(Serialize, Clone)]
struct StepTimerTickEvent {
    #[serde(rename = "secondsRemaining")]
    seconds_remaining: u32,
}

struct ActiveCook {
    recipe_slug: String,
    recipe_name: String,
    version: RecipeVersion,
    /// Steps pre-sorted by `order`; slide indices refer to this list.
    steps: Vec<Step>,
    deck: SlideDeck,
    timer_wanted: Option<bool>,
    timer: StepTimer,
    log_entries: Vec<LogEntry>,
    run_id: String,
    remote_session_id: Option<i64>,
}

impl ActiveCook {
    fn current_step(&self) -> Option<&Step> {
        match self.deck.current() {
            Slide::Step(i) => self.steps.get(i),
            _ => None,
        }
    }

    fn default_minutes_for(&self, step_index: usize) -> u32 {
        self.steps
            .get(step_index)
            .and_then(|s| s.duration_minutes)
            .unwrap_or(DEFAULT_TIMER_MINUTES)
    }

    /// Per-step choices never leak across steps: entering a step re-asks the
    /// timer question and re-derives the default duration.
    fn reset_step_state(&mut self) {
        if let Slide::Step(i) = self.deck.current() {
            self.timer_wanted = None;
            self.timer = StepTimer::new(self.default_minutes_for(i));
        }
    }

    /// Move the deck one slide. Returns whether the slide actually changed;
    /// a saturated move at either end keeps the current step's timer intact.
    fn navigate(&mut self, forward: bool, now: DateTime<Utc>) -> bool {
        let before = self.deck.current();
        let after = if forward {
            self.deck.go_next(now)
        } else {
            self.deck.go_prev(now)
        };
        let changed = after != before;
        if changed {
            self.reset_step_state();
        }
        changed
    }

    /// Append one turn and return the whole log. The log is append-only so
    /// concurrent sends interleave instead of clobbering each other.
    fn append_log(&mut self, entry: LogEntry) -> Vec<LogEntry> {
        self.log_entries.push(entry);
        self.log_entries.clone()
    }

    fn snapshot(&self, confirm_exit: bool) -> CookSnapshot {
        let slide = self.deck.current();
        let (step, step_started_at) = match slide {
            Slide::Step(i) => (self.steps.get(i).cloned(), self.deck.step_started_at(i)),
            _ => (None, None),
        };
        CookSnapshot {
            recipe_slug: self.recipe_slug.clone(),
            recipe_name: self.recipe_name.clone(),
            slide,
            position: slide.position(),
            total_slides: self.deck.total_slides(),
            step_count: self.deck.step_count(),
            step,
            step_started_at,
            timer_wanted: self.timer_wanted,
            timer: TimerSnapshot {
                phase: self.timer.phase(),
                minutes: self.timer.minutes(),
                seconds_remaining: self.timer.seconds_remaining(),
            },
            log_entries: self.log_entries.clone(),
            confirm_exit,
        }
    }
}

#[derive(Clone)]
pub struct CookController {
    state: Arc<Mutex<Option<ActiveCook>>>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    api: ApiClient,
    db: Database,
    settings: SettingsStore,
    chime: Arc<dyn Chime>,
    app_handle: AppHandle,
}

impl CookController {
    pub fn new(
        app_handle: AppHandle,
        api: ApiClient,
        db: Database,
        settings: SettingsStore,
        chime: Arc<dyn Chime>,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(None)),
            ticker: Arc::new(Mutex::new(None)),
            api,
            db,
            settings,
            chime,
            app_handle,
        }
    }

    /// Enter cook mode for a recipe's latest version. Creates the backend
    /// cooking session best-effort: the local run proceeds even when the
    /// session call fails, and the failure is only logged.
    pub async fn start(&self, slug: &str) -> Result<CookSnapshot> {
        let recipe = self.api.get_recipe(slug).await?;
        let version = recipe
            .latest_version
            .ok_or_else(|| anyhow!("No version to cook. Add a version first."))?;

        let steps = version.sorted_steps();
        let started_at = Utc::now();
        let run_id = Uuid::new_v4().to_string();

        let remote_session_id = match self
            .api
            .create_session(slug, &json!({ "recipe_version": version.id }))
            .await
        {
            Ok(session) => Some(session.id),
            Err(err) => {
                warn!("cooking session not created, continuing offline: {err}");
                None
            }
        };

        let run = CookRun {
            id: run_id.clone(),
            recipe_slug: slug.to_owned(),
            recipe_name: recipe.name.clone(),
            version_id: version.id,
            remote_session_id,
            started_at,
            ended_at: None,
            status: CookRunStatus::Running,
            step_durations_seconds: vec![],
        };
        self.db.insert_run(&run).await?;

        let cook = ActiveCook {
            recipe_slug: slug.to_owned(),
            recipe_name: recipe.name,
            deck: SlideDeck::new(steps.len()),
            timer_wanted: None,
            timer: StepTimer::new(DEFAULT_TIMER_MINUTES),
            log_entries: Vec::new(),
            run_id,
            remote_session_id,
            version,
            steps,
        };
        let snapshot = cook.snapshot(self.settings.confirm_exit_cook_mode());

        *self.state.lock().await = Some(cook);
        info!("cook mode started for '{slug}' ({} steps)", snapshot.step_count);
        self.emit_state(&snapshot);
        Ok(snapshot)
    }

    pub async fn snapshot(&self) -> Result<CookSnapshot> {
        let guard = self.state.lock().await;
        let cook = guard.as_ref().ok_or_else(|| anyhow!("cook mode not active"))?;
        Ok(cook.snapshot(self.settings.confirm_exit_cook_mode()))
    }

    pub async fn go_next(&self) -> Result<CookSnapshot> {
        self.navigate(true).await
    }

    pub async fn go_prev(&self) -> Result<CookSnapshot> {
        self.navigate(false).await
    }

    async fn navigate(&self, forward: bool) -> Result<CookSnapshot> {
        let (changed, snapshot) = {
            let mut guard = self.state.lock().await;
            let cook = guard.as_mut().ok_or_else(|| anyhow!("cook mode not active"))?;
            let changed = cook.navigate(forward, Utc::now());
            (changed, cook.snapshot(self.settings.confirm_exit_cook_mode()))
        };
        // A saturated move stays on the same step; its countdown keeps going.
        if changed {
            self.cancel_ticker().await;
        }
        self.emit_state(&snapshot);
        Ok(snapshot)
    }

    pub async fn choose_timer(&self, wanted: bool) -> Result<CookSnapshot> {
        let snapshot = {
            let mut guard = self.state.lock().await;
            let cook = guard.as_mut().ok_or_else(|| anyhow!("cook mode not active"))?;
            if cook.current_step().is_none() {
                return Err(anyhow!("no step active"));
            }
            cook.timer_wanted = Some(wanted);
            cook.snapshot(self.settings.confirm_exit_cook_mode())
        };
        self.emit_state(&snapshot);
        Ok(snapshot)
    }

    pub async fn set_timer_minutes(&self, minutes: u32) -> Result<TimerSnapshot> {
        let mut guard = self.state.lock().await;
        let cook = guard.as_mut().ok_or_else(|| anyhow!("cook mode not active"))?;
        cook.timer.set_minutes(minutes);
        Ok(TimerSnapshot {
            phase: cook.timer.phase(),
            minutes: cook.timer.minutes(),
            seconds_remaining: cook.timer.seconds_remaining(),
        })
    }

    pub async fn start_timer(&self) -> Result<TimerSnapshot> {
        let snapshot = {
            let mut guard = self.state.lock().await;
            let cook = guard.as_mut().ok_or_else(|| anyhow!("cook mode not active"))?;
            cook.timer.start();
            if cook.timer.phase() != TimerPhase::Running {
                return Err(anyhow!("timer cannot start"));
            }
            TimerSnapshot {
                phase: cook.timer.phase(),
                minutes: cook.timer.minutes(),
                seconds_remaining: cook.timer.seconds_remaining(),
            }
        };
        self.spawn_ticker().await;
        Ok(snapshot)
    }

    pub async fn pause_timer(&self) -> Result<TimerSnapshot> {
        self.cancel_ticker().await;
        let mut guard = self.state.lock().await;
        let cook = guard.as_mut().ok_or_else(|| anyhow!("cook mode not active"))?;
        cook.timer.pause();
        Ok(TimerSnapshot {
            phase: cook.timer.phase(),
            minutes: cook.timer.minutes(),
            seconds_remaining: cook.timer.seconds_remaining(),
        })
    }

    pub async fn reset_timer(&self) -> Result<TimerSnapshot> {
        self.cancel_ticker().await;
        let mut guard = self.state.lock().await;
        let cook = guard.as_mut().ok_or_else(|| anyhow!("cook mode not active"))?;
        cook.timer.reset();
        Ok(TimerSnapshot {
            phase: cook.timer.phase(),
            minutes: cook.timer.minutes(),
            seconds_remaining: cook.timer.seconds_remaining(),
        })
    }

    /// Leave cook mode. When the confirm setting is on and the caller has
    /// not confirmed, nothing happens beyond flagging the prompt. Otherwise
    /// the run is closed locally and the backend session is finalized with
    /// `ended_at` plus the per-step durations.
    pub async fn exit(&self, confirmed: bool) -> Result<ExitOutcome> {
        if self.settings.confirm_exit_cook_mode() && !confirmed {
            let guard = self.state.lock().await;
            if guard.is_some() {
                return Ok(ExitOutcome {
                    needs_confirmation: true,
                    session_id: None,
                    sync_error: None,
                });
            }
            return Err(anyhow!("cook mode not active"));
        }

        self.cancel_ticker().await;
        let ended_at = Utc::now();

        let (run_id, slug, session_id, durations) = {
            let mut guard = self.state.lock().await;
            let cook = guard.take().ok_or_else(|| anyhow!("cook mode not active"))?;
            (
                cook.run_id,
                cook.recipe_slug,
                cook.remote_session_id,
                cook.deck.step_durations_seconds(ended_at),
            )
        };

        self.db
            .mark_run_status(&run_id, CookRunStatus::Completed, durations.clone(), Some(ended_at))
            .await?;

        let mut sync_error = None;
        if let Some(session_id) = session_id {
            let body = json!({
                "ended_at": ended_at,
                "step_durations_seconds": durations,
            });
            if let Err(err) = self.api.update_session(&slug, session_id, &body).await {
                warn!("failed to finalize cooking session {session_id}: {err}");
                sync_error = Some(err.to_string());
            }
        }

        info!("cook mode exited for '{slug}'");
        let _ = self.app_handle.emit("cook-mode-exited", session_id);
        Ok(ExitOutcome {
            needs_confirmation: false,
            session_id,
            sync_error,
        })
    }

    /// Ask the AI cooking assistant a question in the context of the active
    /// run. Appends the user turn and the assistant reply to the session's
    /// append-only log, then mirrors the log to the backend.
    pub async fn send_guide_message(&self, content: &str) -> Result<Vec<LogEntry>> {
        let (slug, session_id, version_id, entries) = {
            let mut guard = self.state.lock().await;
            let cook = guard.as_mut().ok_or_else(|| anyhow!("cook mode not active"))?;
            let entries = cook.append_log(LogEntry {
                role: LogRole::User,
                content: content.to_owned(),
                at: Utc::now(),
            });
            (
                cook.recipe_slug.clone(),
                cook.remote_session_id,
                cook.version.id,
                entries,
            )
        };

        let body = json!({
            "session_id": session_id,
            "recipe_version": version_id,
            "log_entries": entries,
            "message": content,
        });
        let reply = self.api.guide(&body).await?;

        let assistant = LogEntry {
            role: LogRole::Assistant,
            content: reply.reply,
            at: Utc::now(),
        };

        // Other sends may have landed during the await; append onto the live
        // log rather than writing back the pre-await copy.
        let entries = {
            let mut guard = self.state.lock().await;
            match guard.as_mut() {
                Some(cook) => cook.append_log(assistant),
                None => {
                    let mut entries = entries;
                    entries.push(assistant);
                    entries
                }
            }
        };

        if let Some(session_id) = session_id {
            let body = json!({ "log_entries": entries });
            if let Err(err) = self.api.update_session(&slug, session_id, &body).await {
                warn!("failed to sync session log: {err}");
            }
        }

        Ok(entries)
    }

    /// Close out any run left Running by a crash. Called once at startup.
    pub async fn recover_interrupted_runs(&self) -> Result<()> {
        let now = Utc::now();
        for run in self.db.get_incomplete_runs().await? {
            warn!("Recovered incomplete cook run {}; marking as Interrupted", run.id);
            self.db.mark_run_interrupted(&run.id, now).await?;
        }
        Ok(())
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let state = self.state.clone();
        let app_handle = self.app_handle.clone();
        let chime = self.chime.clone();

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(time::Duration::from_secs(1));
            // The first tick of a tokio interval fires immediately; skip it
            // so the countdown moves one second per second.
            interval.tick().await;
            loop {
                interval.tick().await;

                let outcome = {
                    let mut guard = state.lock().await;
                    match guard.as_mut() {
                        Some(cook) => cook.timer.tick(),
                        None => break,
                    }
                };

                match outcome {
                    Tick::Idle => break,
                    Tick::Running { seconds_remaining } => {
                        let _ = app_handle.emit(
                            "step-timer-tick",
                            StepTimerTickEvent { seconds_remaining },
                        );
                    }
                    Tick::Ended => {
                        chime.ring();
                        let _ = app_handle.emit("step-timer-ended", ());
                        break;
                    }
                }
            }
        });

        *ticker_guard = Some(handle);
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }

    fn emit_state(&self, snapshot: &CookSnapshot) {
        let _ = self.app_handle.emit("cook-state-changed", snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cook_with_steps(count: usize) -> ActiveCook {
        let steps = (0..count)
            .map(|i| Step {
                id: format!("step_{:03}", i + 1),
                order: (i + 1) as u32,
                instruction: format!("step {}", i + 1),
                duration_minutes: Some(1),
                ..Step::default()
            })
            .collect::<Vec<_>>();
        ActiveCook {
            recipe_slug: "sourdough".into(),
            recipe_name: "Sourdough".into(),
            version: RecipeVersion::default(),
            deck: SlideDeck::new(count),
            timer_wanted: None,
            timer: StepTimer::new(DEFAULT_TIMER_MINUTES),
            log_entries: Vec::new(),
            run_id: "run".into(),
            remote_session_id: None,
            steps,
        }
    }

    fn turn(role: LogRole, content: &str) -> LogEntry {
        LogEntry {
            role,
            content: content.into(),
            at: Utc::now(),
        }
    }

    #[test]
    fn saturated_next_keeps_the_running_timer() {
        let mut cook = cook_with_steps(2);
        let now = Utc::now();
        cook.navigate(true, now); // ingredients
        cook.navigate(true, now); // step 0
        cook.navigate(true, now); // step 1, the last slide
        assert_eq!(cook.deck.current(), Slide::Step(1));

        cook.timer.start();
        cook.timer.tick();
        let remaining = cook.timer.seconds_remaining();

        // Next past the end is a no-op and must not disturb the countdown.
        assert!(!cook.navigate(true, now));
        assert_eq!(cook.timer.phase(), TimerPhase::Running);
        assert_eq!(cook.timer.seconds_remaining(), remaining);
    }

    #[test]
    fn entering_a_new_step_reasks_the_timer_question() {
        let mut cook = cook_with_steps(2);
        let now = Utc::now();
        cook.navigate(true, now);
        cook.navigate(true, now); // step 0
        cook.timer_wanted = Some(true);
        cook.timer.start();
        cook.timer.tick();

        assert!(cook.navigate(true, now)); // step 1
        assert_eq!(cook.timer_wanted, None);
        assert_eq!(cook.timer.phase(), TimerPhase::Stopped);
        assert_eq!(cook.timer.seconds_remaining(), 60);
    }

    #[test]
    fn guide_log_appends_instead_of_replacing() {
        let mut cook = cook_with_steps(1);
        cook.append_log(turn(LogRole::User, "how hot should the pan be?"));
        // A second question lands while the first reply is in flight.
        cook.append_log(turn(LogRole::User, "can I use butter instead?"));
        let log = cook.append_log(turn(LogRole::Assistant, "Medium-high heat."));

        let contents: Vec<&str> = log.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(
            contents,
            vec![
                "how hot should the pan be?",
                "can I use butter instead?",
                "Medium-high heat.",
            ]
        );
    }
}
