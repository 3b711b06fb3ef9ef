//! Container status queries and display classification.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::error::{DeckError, DeckResult};

/// How long a `ps` query may take before it counts as failed.
const QUERY_TIMEOUT_SECS: u64 = 30;

/// One container row as reported by the engine. Raw text only; the
/// display category is always derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerStatus {
    pub name: String,
    pub status: String,
    pub health: String,
    pub age: String,
}

/// Display classification derived from the raw status/health text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCategory {
    Active,
    Warning,
    Error,
    Unknown,
}

impl ContainerStatus {
    pub fn category(&self) -> StatusCategory {
        if self.health.eq_ignore_ascii_case("unhealthy") {
            return StatusCategory::Error;
        }
        let status = self.status.trim();
        if status.starts_with("Up") {
            if self.health.eq_ignore_ascii_case("starting") {
                return StatusCategory::Warning;
            }
            return StatusCategory::Active;
        }
        if status.starts_with("Exited") {
            // "Exited (0) ..." is a clean stop; anything else went wrong.
            if status.starts_with("Exited (0)") {
                return StatusCategory::Warning;
            }
            return StatusCategory::Error;
        }
        if status.starts_with("Restarting")
            || status.starts_with("Paused")
            || status.starts_with("Created")
        {
            return StatusCategory::Warning;
        }
        if status.starts_with("Dead") {
            return StatusCategory::Error;
        }
        StatusCategory::Unknown
    }
}

/// Supplies the current set of container statuses. Order is whatever the
/// provider reports; the UI does not re-sort.
#[async_trait]
pub trait StatusProvider: Send + Sync {
    async fn query(&self) -> DeckResult<Vec<ContainerStatus>>;
}

/// Row shape of `docker compose ps --format json`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PsRow {
    name: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    health: String,
    #[serde(default)]
    running_for: String,
}

impl From<PsRow> for ContainerStatus {
    fn from(row: PsRow) -> Self {
        Self {
            name: row.name,
            status: row.status,
            health: row.health,
            age: row.running_for,
        }
    }
}

/// Depending on the engine version, `ps --format json` emits either one
/// JSON array or one object per line. Accept both.
fn parse_ps_output(raw: &str) -> DeckResult<Vec<ContainerStatus>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if trimmed.starts_with('[') {
        let rows: Vec<PsRow> = serde_json::from_str(trimmed)
            .map_err(|e| DeckError::StatusFetch(format!("bad ps json: {e}")))?;
        return Ok(rows.into_iter().map(ContainerStatus::from).collect());
    }
    let mut out = Vec::new();
    for line in trimmed.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row: PsRow = serde_json::from_str(line)
            .map_err(|e| DeckError::StatusFetch(format!("bad ps json: {e}")))?;
        out.push(row.into());
    }
    Ok(out)
}

/// Queries statuses via `docker compose ps`.
pub struct ComposeStatusProvider {
    compose_file: PathBuf,
    project_dir: Option<PathBuf>,
}

impl ComposeStatusProvider {
    pub fn new(compose_file: PathBuf, project_dir: Option<PathBuf>) -> Self {
        Self {
            compose_file,
            project_dir,
        }
    }
}

#[async_trait]
impl StatusProvider for ComposeStatusProvider {
    async fn query(&self) -> DeckResult<Vec<ContainerStatus>> {
        let mut cmd = Command::new("docker");
        cmd.arg("compose")
            .arg("-f")
            .arg(&self.compose_file)
            .args(["ps", "-a", "--format", "json"]);
        if let Some(ref dir) = self.project_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let result =
            tokio::time::timeout(Duration::from_secs(QUERY_TIMEOUT_SECS), cmd.output()).await;
        let output = match result {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(DeckError::StatusFetch(e.to_string())),
            Err(_) => {
                return Err(DeckError::StatusFetch(format!(
                    "ps timed out after {QUERY_TIMEOUT_SECS}s"
                )))
            }
        };
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DeckError::StatusFetch(stderr.trim().to_string()));
        }
        parse_ps_output(&String::from_utf8_lossy(&output.stdout))
    }
}
