//! Local journal of cook runs. SQLite lives on a dedicated worker thread;
//! callers send closures over a channel and await the reply, so the async
//! side never blocks on the connection.

use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use log::{error, info};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

mod migrations;

use migrations::run_migrations;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CookRunStatus {
    Running,
    Completed,
    Abandoned,
    Interrupted,
}

impl CookRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CookRunStatus::Running => "Running",
            CookRunStatus::Completed => "Completed",
            CookRunStatus::Abandoned => "Abandoned",
            CookRunStatus::Interrupted => "Interrupted",
        }
    }
}

fn status_from_str(value: &str) -> Result<CookRunStatus> {
    match value {
        "Running" => Ok(CookRunStatus::Running),
        "Completed" => Ok(CookRunStatus::Completed),
        "Abandoned" => Ok(CookRunStatus::Abandoned),
        "Interrupted" => Ok(CookRunStatus::Interrupted),
        _ => Err(anyhow!("unknown cook run status '{value}'")),
    }
}

/// One local record of a cook-mode run, mirrored to the backend session when
/// the network cooperates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookRun {
    pub id: String,
    pub recipe_slug: String,
    pub recipe_name: String,
    pub version_id: i64,
    pub remote_session_id: Option<i64>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub status: CookRunStatus,
    pub step_durations_seconds: Vec<u64>,
}

fn parse_datetime(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| anyhow!("invalid datetime '{value}': {err}"))
}

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum DbCommand {
    Execute(DbTask),
    Shutdown,
}

struct DatabaseInner {
    sender: mpsc::Sender<DbCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(DbCommand::Shutdown) {
                error!("Failed to send shutdown to DB thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("Failed to join DB thread: {join_err:?}");
            }
        }
    }
}

#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
    db_path: Arc<PathBuf>,
}

impl Database {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let (command_tx, command_rx) = mpsc::channel::<DbCommand>();
        let (ready_tx, ready_rx) = mpsc::channel();
        let path_for_thread = db_path.clone();

        let worker = thread::Builder::new()
            .name("forklog-db".into())
            .spawn(move || {
                let mut conn = match Connection::open(&path_for_thread) {
                    Ok(connection) => connection,
                    Err(err) => {
                        let _ = ready_tx.send(Err(anyhow::Error::new(err)
                            .context("failed to open SQLite database")));
                        return;
                    }
                };

                if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
                    error!("Failed to enable WAL mode: {err}");
                }

                let init_result =
                    run_migrations(&mut conn).context("failed to run database migrations");
                if ready_tx.send(init_result).is_err() {
                    error!("DB initialization receiver dropped before ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        DbCommand::Execute(task) => {
                            task(&mut conn);
                        }
                        DbCommand::Shutdown => break,
                    }
                }

                info!("Database thread shutting down");
            })
            .with_context(|| "failed to spawn database worker thread")?;

        ready_rx
            .recv()
            .context("database worker exited before signaling readiness")??;

        info!("Database initialized at {}", db_path.as_path().display());

        Ok(Self {
            inner: Arc::new(DatabaseInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
            db_path: Arc::new(db_path),
        })
    }

    pub fn path(&self) -> &Path {
        self.db_path.as_path()
    }

    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sender = self.inner.sender.clone();
        let (reply_tx, reply_rx) = oneshot::channel();

        let command = DbCommand::Execute(Box::new(move |conn| {
            let result = task(conn);
            if reply_tx.send(result).is_err() {
                error!("DB caller dropped before receiving result");
            }
        }));

        sender
            .send(command)
            .map_err(|err| anyhow!("failed to send command to DB thread: {err}"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("database thread terminated unexpectedly"))?
    }

    pub async fn insert_run(&self, run: &CookRun) -> Result<()> {
        let record = run.clone();
        self.execute(move |conn| {
            let durations = serde_json::to_string(&record.step_durations_seconds)?;
            conn.execute(
                "INSERT INTO cook_runs (id, recipe_slug, recipe_name, version_id, remote_session_id, started_at, ended_at, status, step_durations, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
                params![
                    record.id,
                    record.recipe_slug,
                    record.recipe_name,
                    record.version_id,
                    record.remote_session_id,
                    record.started_at.to_rfc3339(),
                    record.ended_at.as_ref().map(|dt| dt.to_rfc3339()),
                    record.status.as_str(),
                    durations,
                    Utc::now().to_rfc3339(),
                ],
            )
            .with_context(|| "failed to insert cook run")?;
            Ok(())
        })
        .await
    }

    pub async fn mark_run_status(
        &self,
        run_id: &str,
        status: CookRunStatus,
        step_durations_seconds: Vec<u64>,
        ended_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let run_id = run_id.to_string();
        self.execute(move |conn| {
            let durations = serde_json::to_string(&step_durations_seconds)?;
            conn.execute(
                "UPDATE cook_runs
                 SET status = ?1,
                     step_durations = ?2,
                     ended_at = ?3,
                     updated_at = ?4
                 WHERE id = ?5",
                params![
                    status.as_str(),
                    durations,
                    ended_at.map(|dt| dt.to_rfc3339()),
                    Utc::now().to_rfc3339(),
                    run_id,
                ],
            )
            .with_context(|| "failed to update cook run status")?;
            Ok(())
        })
        .await
    }

    /// Runs still marked Running, newest first. Only non-empty after a crash.
    pub async fn get_incomplete_runs(&self) -> Result<Vec<CookRun>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, recipe_slug, recipe_name, version_id, remote_session_id, started_at, ended_at, status, step_durations
                 FROM cook_runs
                 WHERE status = 'Running'
                 ORDER BY started_at DESC",
            )?;
            let mut rows = stmt.query([])?;
            let mut runs = Vec::new();
            while let Some(row) = rows.next()? {
                runs.push(row_to_run(row)?);
            }
            Ok(runs)
        })
        .await
    }

    pub async fn mark_run_interrupted(&self, run_id: &str, at: DateTime<Utc>) -> Result<()> {
        let run_id = run_id.to_string();
        self.execute(move |conn| {
            conn.execute(
                "UPDATE cook_runs
                 SET status = 'Interrupted', ended_at = ?1, updated_at = ?1
                 WHERE id = ?2",
                params![at.to_rfc3339(), run_id],
            )
            .with_context(|| "failed to mark cook run interrupted")?;
            Ok(())
        })
        .await
    }

    pub async fn list_runs(&self) -> Result<Vec<CookRun>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, recipe_slug, recipe_name, version_id, remote_session_id, started_at, ended_at, status, step_durations
                 FROM cook_runs
                 ORDER BY started_at DESC",
            )?;
            let mut rows = stmt.query([])?;
            let mut runs = Vec::new();
            while let Some(row) = rows.next()? {
                runs.push(row_to_run(row)?);
            }
            Ok(runs)
        })
        .await
    }
}

fn row_to_run(row: &rusqlite::Row<'_>) -> Result<CookRun> {
    let durations_json: String = row.get(8)?;
    Ok(CookRun {
        id: row.get(0)?,
        recipe_slug: row.get(1)?,
        recipe_name: row.get(2)?,
        version_id: row.get(3)?,
        remote_session_id: row.get(4)?,
        started_at: parse_datetime(&row.get::<_, String>(5)?)?,
        ended_at: row
            .get::<_, Option<String>>(6)?
            .map(|s| parse_datetime(&s))
            .transpose()?,
        status: status_from_str(&row.get::<_, String>(7)?)?,
        step_durations_seconds: serde_json::from_str(&durations_json)
            .context("invalid step_durations json")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(id: &str) -> CookRun {
        CookRun {
            id: id.into(),
            recipe_slug: "sourdough".into(),
            recipe_name: "Sourdough".into(),
            version_id: 7,
            remote_session_id: None,
            started_at: Utc::now(),
            ended_at: None,
            status: CookRunStatus::Running,
            step_durations_seconds: vec![],
        }
    }

    #[tokio::test]
    async fn insert_and_complete_run() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("journal.sqlite3")).unwrap();

        db.insert_run(&run("r1")).await.unwrap();
        db.mark_run_status(
            "r1",
            CookRunStatus::Completed,
            vec![120, 45],
            Some(Utc::now()),
        )
        .await
        .unwrap();

        let runs = db.list_runs().await.unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].status, CookRunStatus::Completed);
        assert_eq!(runs[0].step_durations_seconds, vec![120, 45]);
        assert!(runs[0].ended_at.is_some());
    }

    #[tokio::test]
    async fn crash_recovery_marks_running_runs_interrupted() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("journal.sqlite3")).unwrap();

        db.insert_run(&run("r1")).await.unwrap();
        db.insert_run(&CookRun {
            status: CookRunStatus::Completed,
            ..run("r2")
        })
        .await
        .unwrap();

        let incomplete = db.get_incomplete_runs().await.unwrap();
        assert_eq!(incomplete.len(), 1);
        assert_eq!(incomplete[0].id, "r1");

        db.mark_run_interrupted("r1", Utc::now()).await.unwrap();
        assert!(db.get_incomplete_runs().await.unwrap().is_empty());
    }
}
