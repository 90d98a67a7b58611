//! Replication status summary
//!
//! Joins the configured replication processes of a stage with their runtime
//! records and derives per-process and aggregate states for display.

use crate::config::ReplicationConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::warn;

/// Timestamp format used in status output
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Displayed state of a process or a whole stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplicationState {
    Undefined,
    Synchron,
    Running,
    Faulty,
    Disabled,
}

impl fmt::Display for ReplicationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReplicationState::Undefined => "undefined",
            ReplicationState::Synchron => "synchron",
            ReplicationState::Running => "running",
            ReplicationState::Faulty => "faulty",
            ReplicationState::Disabled => "disabled",
        };
        f.write_str(name)
    }
}

/// Runtime phase reported by a replication process
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessPhase {
    #[default]
    Idle,
    Awaiting,
    Processing,
    Success,
    Error,
}

/// Runtime record of one process, as written by the orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRecord {
    pub id: String,
    #[serde(default)]
    pub phase: ProcessPhase,
    #[serde(default)]
    pub synchronized: bool,
    #[serde(default)]
    pub completion_percentage: i64,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_replication: Option<DateTime<Utc>>,
}

impl ProcessRecord {
    /// Parse a JSON array of records
    pub fn parse_all(json: &str) -> Result<Vec<ProcessRecord>, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn is_running(&self) -> bool {
        matches!(self.phase, ProcessPhase::Processing | ProcessPhase::Awaiting)
    }

    fn is_faulty(&self) -> bool {
        self.phase == ProcessPhase::Error
    }
}

/// Status of one process
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessStatus {
    pub id: String,
    pub title: String,
    pub state: ReplicationState,
    pub enabled: bool,
    pub synchronized: bool,
    pub running: bool,
    pub faulty: bool,
    pub last_replication: String,
    pub started_at: String,
    pub finished_at: String,
    pub progress: u8,
}

impl ProcessStatus {
    /// Status of a configured process; without a record it is undefined
    pub fn new(id: &str, config: &ReplicationConfig, record: Option<&ProcessRecord>) -> Self {
        let enabled = config.enabled;
        let running = record.map_or(false, ProcessRecord::is_running);
        let faulty = record.map_or(false, ProcessRecord::is_faulty);
        let synchronized = record.map_or(false, |r| r.synchronized);

        let state = if running {
            ReplicationState::Running
        } else if !enabled {
            ReplicationState::Disabled
        } else if faulty {
            ReplicationState::Faulty
        } else if synchronized {
            ReplicationState::Synchron
        } else {
            ReplicationState::Undefined
        };
        let progress = if synchronized {
            100
        } else {
            record.map_or(0, |r| r.completion_percentage.clamp(0, 100) as u8)
        };

        Self {
            id: id.to_string(),
            title: config.display_title(id),
            state,
            enabled,
            synchronized,
            running,
            faulty,
            last_replication: timestamp(record.and_then(|r| r.last_replication)),
            started_at: timestamp(record.and_then(|r| r.started_at)),
            finished_at: timestamp(record.and_then(|r| r.finished_at)),
            progress,
        }
    }

    fn sort_key(&self) -> (bool, &str) {
        (!self.enabled, &self.title)
    }
}

fn timestamp(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| t.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default()
}

/// Aggregate status of a stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub stage: String,
    pub state: ReplicationState,
    pub synchronized: bool,
    pub running: bool,
    pub faulty: bool,
    pub progress: u8,
    pub processes: Vec<ProcessStatus>,
}

impl StatusSummary {
    /// Summarize the processes configured for `stage`
    pub fn build(
        stage: &str,
        replications: &BTreeMap<String, ReplicationConfig>,
        records: &[ProcessRecord],
    ) -> Self {
        let by_id: HashMap<&str, &ProcessRecord> =
            records.iter().map(|r| (r.id.as_str(), r)).collect();
        for record in records {
            if !replications.contains_key(&record.id) {
                warn!(id = %record.id, "Status record for an unconfigured process, ignoring");
            }
        }

        let mut processes: Vec<ProcessStatus> = replications
            .iter()
            .filter(|(_, config)| config.stage == stage)
            .map(|(id, config)| ProcessStatus::new(id, config, by_id.get(id.as_str()).copied()))
            .collect();
        processes.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        Self::from_processes(stage, processes)
    }

    /// Aggregate already computed process states
    pub fn from_processes(stage: &str, processes: Vec<ProcessStatus>) -> Self {
        let enabled: Vec<&ProcessStatus> = processes.iter().filter(|p| p.enabled).collect();
        let running = enabled.iter().any(|p| p.running);
        let faulty = enabled.iter().any(|p| p.faulty);
        let synchronized = !enabled.is_empty() && enabled.iter().all(|p| p.synchronized);

        let state = if running {
            ReplicationState::Running
        } else if faulty {
            ReplicationState::Faulty
        } else if synchronized {
            ReplicationState::Synchron
        } else {
            ReplicationState::Undefined
        };
        let progress = if synchronized && !running {
            100
        } else if enabled.is_empty() {
            0
        } else {
            let total: usize = enabled.iter().map(|p| p.progress as usize).sum();
            (total / enabled.len()) as u8
        };

        Self {
            stage: stage.to_string(),
            state,
            synchronized,
            running,
            faulty,
            progress,
            processes,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
