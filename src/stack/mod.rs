//! Stack controller — runs container-engine commands for lifecycle
//! operations and streams their combined output.
//!
//! Each [`ActionKind`] maps to a declarative list of engine steps, so the
//! order of compound operations (restart runs the stop, build and start
//! steps back to back) is plain data. Execution happens in worker tasks;
//! lines are pushed to a channel as they are produced, never buffered
//! until completion. A per-step timeout bounds every external command.

pub mod status;
pub mod stream;

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::sync::mpsc::UnboundedSender;

use crate::error::{DeckError, DeckResult};
use stream::LineAssembler;

/// Hard ceiling on a single engine step.
const STEP_TIMEOUT_SECS: u64 = 600;

/// One engine invocation within a lifecycle operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Short label used in errors ("up", "build", ...).
    pub label: &'static str,
    /// Arguments appended after `docker compose -f <file>`.
    pub args: &'static [&'static str],
}

const STEP_UP: Step = Step {
    label: "up",
    args: &["up", "-d"],
};
const STEP_DOWN: Step = Step {
    label: "down",
    args: &["down"],
};
const STEP_BUILD: Step = Step {
    label: "build",
    args: &["build"],
};

/// A lifecycle operation the operator can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Start,
    Stop,
    Restart,
    Build,
    WizardSave,
}

impl ActionKind {
    /// Engine steps, run strictly in order; the first failure aborts the
    /// remaining steps.
    pub fn steps(self) -> &'static [Step] {
        match self {
            ActionKind::Start => &[STEP_UP],
            ActionKind::Stop => &[STEP_DOWN],
            ActionKind::Restart => &[STEP_DOWN, STEP_BUILD, STEP_UP],
            ActionKind::Build => &[STEP_BUILD],
            // Saving configuration rebuilds and re-ups so the new values
            // actually reach the containers.
            ActionKind::WizardSave => &[STEP_BUILD, STEP_UP],
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionKind::Start => "start",
            ActionKind::Stop => "stop",
            ActionKind::Restart => "restart",
            ActionKind::Build => "build",
            ActionKind::WizardSave => "save",
        };
        f.write_str(name)
    }
}

/// Runs lifecycle steps against the managed stack, streaming combined
/// output line by line into `lines`.
#[async_trait]
pub trait StackController: Send + Sync {
    async fn execute(
        &self,
        steps: &[Step],
        env_file: Option<&Path>,
        lines: UnboundedSender<String>,
    ) -> DeckResult<()>;
}

/// Drives `docker compose` as the container engine.
pub struct ComposeController {
    compose_file: PathBuf,
    project_dir: Option<PathBuf>,
    step_timeout: Duration,
}

impl ComposeController {
    pub fn new(compose_file: PathBuf, project_dir: Option<PathBuf>) -> Self {
        Self {
            compose_file,
            project_dir,
            step_timeout: Duration::from_secs(STEP_TIMEOUT_SECS),
        }
    }

    fn command(&self, step: &Step, env_file: Option<&Path>) -> Command {
        let mut cmd = Command::new("docker");
        cmd.arg("compose").arg("-f").arg(&self.compose_file);
        if let Some(env) = env_file {
            cmd.arg("--env-file").arg(env);
        }
        cmd.args(step.args);
        if let Some(ref dir) = self.project_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd
    }

    async fn run_step(
        &self,
        step: &Step,
        env_file: Option<&Path>,
        lines: &UnboundedSender<String>,
    ) -> DeckResult<()> {
        let mut child = self
            .command(step, env_file)
            .spawn()
            .map_err(|source| DeckError::Spawn {
                step: step.label,
                source,
            })?;

        // Both pipes feed the same channel, so stdout and stderr stay
        // interleaved in production order.
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let out_task = stdout.map(|r| tokio::spawn(forward_lines(r, lines.clone())));
        let err_task = stderr.map(|r| tokio::spawn(forward_lines(r, lines.clone())));

        let status = match tokio::time::timeout(self.step_timeout, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => return Err(DeckError::Io(e)),
            Err(_) => {
                let _ = child.kill().await;
                return Err(DeckError::Timeout {
                    step: step.label,
                    secs: self.step_timeout.as_secs(),
                });
            }
        };

        if let Some(t) = out_task {
            let _ = t.await;
        }
        if let Some(t) = err_task {
            let _ = t.await;
        }

        if !status.success() {
            return Err(DeckError::ExitStatus {
                step: step.label,
                code: status.code().unwrap_or(-1),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl StackController for ComposeController {
    async fn execute(
        &self,
        steps: &[Step],
        env_file: Option<&Path>,
        lines: UnboundedSender<String>,
    ) -> DeckResult<()> {
        for step in steps {
            let _ = lines.send(format!("$ docker compose {}", step.args.join(" ")));
            self.run_step(step, env_file, &lines).await?;
        }
        Ok(())
    }
}

/// Read a child pipe to EOF, pushing assembled lines into the channel.
async fn forward_lines<R>(mut reader: R, tx: UnboundedSender<String>)
where
    R: AsyncReadExt + Unpin,
{
    let mut asm = LineAssembler::new();
    let mut buf = [0u8; 4096];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                for line in asm.push(&String::from_utf8_lossy(&buf[..n])) {
                    if tx.send(line).is_err() {
                        return;
                    }
                }
            }
        }
    }
    if let Some(rest) = asm.flush() {
        let _ = tx.send(rest);
    }
}
