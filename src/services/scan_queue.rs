use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

use crate::configuration::Settings;

use super::{RunSummary, Scanner};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    Queued,
    Running,
    Completed { summary: RunSummary },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub run_id: Uuid,
    pub requested_at: DateTime<Utc>,
    #[serde(flatten)]
    pub state: RunState,
}

#[derive(Clone, Default)]
pub struct RunRegistry {
    runs: Arc<Mutex<Vec<RunRecord>>>,
}

impl RunRegistry {
    fn lock(&self) -> MutexGuard<'_, Vec<RunRecord>> {
        self.runs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn insert(&self, run_id: Uuid) {
        self.lock().push(RunRecord {
            run_id,
            requested_at: Utc::now(),
            state: RunState::Queued,
        });
    }

    pub fn set_state(&self, run_id: Uuid, state: RunState) {
        if let Some(run) = self.lock().iter_mut().find(|r| r.run_id == run_id) {
            run.state = state;
        }
    }

    pub fn get(&self, run_id: Uuid) -> Option<RunRecord> {
        self.lock().iter().find(|r| r.run_id == run_id).cloned()
    }

    pub fn list(&self) -> Vec<RunRecord> {
        self.lock().clone()
    }
}

#[derive(Clone)]
pub struct ScanRequestSender {
    pub sender: UnboundedSender<Uuid>,
    pub registry: RunRegistry,
}

impl ScanRequestSender {
    pub fn request(&self) -> Option<Uuid> {
        let run_id = Uuid::new_v4();
        self.registry.insert(run_id);

        match self.sender.send(run_id) {
            Ok(_) => Some(run_id),
            Err(e) => {
                log::error!("Scan handler is gone, dropping run {}: {:?}", run_id, e);
                self.registry.set_state(
                    run_id,
                    RunState::Failed {
                        error: "scan handler unavailable".to_string(),
                    },
                );
                None
            }
        }
    }
}

pub async fn scan_job_handler(
    mut receiver: UnboundedReceiver<Uuid>,
    registry: RunRegistry,
    settings: Arc<Settings>,
    pool: Option<PgPool>,
) {
    log::info!("Started scan job handler");

    while let Some(run_id) = receiver.recv().await {
        log::info!("Starting run {}", run_id);
        registry.set_state(run_id, RunState::Running);

        let today = Local::now().date_naive();
        let state = match Scanner::new(&settings, pool.as_ref()).run(today).await {
            Ok(summary) => RunState::Completed { summary },
            Err(e) => {
                log::error!("Run {} aborted: {}", run_id, e);
                RunState::Failed {
                    error: e.to_string(),
                }
            }
        };
        registry.set_state(run_id, state);
    }

    log::info!("Scan job handler stopped");
}
