//! TUI runner — main loop that wires everything together.
//!
//! Creates the terminal, then runs the event loop: a `tokio::select!`
//! over the poll interval, the render interval, the worker message queue
//! and crossterm input. `App::update` is the only state mutator; after
//! each message the loop consumes the app's effect requests and launches
//! the matching workers. Workers only ever hold a queue sender and the
//! `Arc`'d collaborators — they never see `App`.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::sync::Mutex;
use tokio::time::interval;

use crate::config::EnvStore;
use crate::stack::status::StatusProvider;
use crate::stack::{ActionKind, StackController};

use super::app::App;
use super::event::{ActionEvent, Msg};
use super::layout;

/// Everything the workers need, shared by `Arc`.
pub struct Collaborators {
    pub controller: Arc<dyn StackController>,
    pub provider: Arc<dyn StatusProvider>,
    pub store: Arc<Mutex<EnvStore>>,
    /// Env file handed to the engine (only when it exists on disk).
    pub env_file: PathBuf,
}

/// Run the TUI main loop. Blocks until quit.
pub async fn run_tui(deps: Collaborators, poll_secs: u64) -> anyhow::Result<()> {
    enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, deps, poll_secs).await;

    // Always restore, even if the loop errored.
    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    deps: Collaborators,
    poll_secs: u64,
) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut app = App::new();

    // First poll tick fires immediately, covering the startup fetch.
    let mut poll = interval(Duration::from_secs(poll_secs.max(1)));
    let mut render = interval(Duration::from_millis(33)); // ~30fps

    loop {
        dispatch_effects(&mut app, &tx, &deps);
        if app.should_quit {
            break;
        }

        tokio::select! {
            _ = poll.tick() => {
                app.update(Msg::PollTick);
            }
            _ = render.tick() => {
                app.maintain(Instant::now());
                terminal.draw(|f| layout::draw(f, &mut app))?;
            }
            Some(msg) = rx.recv() => {
                app.update(msg);
            }
            // Poll crossterm events without blocking the loop.
            result = tokio::task::spawn_blocking(|| {
                if event::poll(Duration::from_millis(10)).unwrap_or(false) {
                    event::read().ok()
                } else {
                    None
                }
            }) => {
                if let Ok(Some(Event::Key(key))) = result {
                    app.update(Msg::Input(key));
                }
            }
        }
    }

    Ok(())
}

/// Consume the app's effect requests and launch the matching workers.
fn dispatch_effects(app: &mut App, tx: &UnboundedSender<Msg>, deps: &Collaborators) {
    if let Some(kind) = app.pending_action.take() {
        spawn_action_worker(
            kind,
            tx.clone(),
            deps.controller.clone(),
            existing_env_file(deps),
        );
    }
    if let Some(pairs) = app.pending_wizard_save.take() {
        spawn_save_worker(
            pairs,
            tx.clone(),
            deps.controller.clone(),
            deps.store.clone(),
            existing_env_file(deps),
        );
    }
    if app.pending_fetch {
        app.pending_fetch = false;
        spawn_fetch_worker(tx.clone(), deps.provider.clone());
    }
    if app.pending_config_reload {
        app.pending_config_reload = false;
        spawn_reload_worker(tx.clone(), deps.store.clone());
    }
}

fn existing_env_file(deps: &Collaborators) -> Option<PathBuf> {
    deps.env_file.exists().then(|| deps.env_file.clone())
}

/// Drive the controller through an action's steps, forwarding every
/// output line tagged with the action kind, then post exactly one
/// terminal event.
pub(crate) async fn run_steps(
    kind: ActionKind,
    controller: Arc<dyn StackController>,
    env_file: Option<PathBuf>,
    tx: &UnboundedSender<Msg>,
) -> ActionEvent {
    let (line_tx, mut line_rx) = mpsc::unbounded_channel();
    let exec = tokio::spawn({
        let controller = controller.clone();
        let env_file = env_file.clone();
        async move {
            controller
                .execute(kind.steps(), env_file.as_deref(), line_tx)
                .await
        }
    });

    while let Some(line) = line_rx.recv().await {
        if tx
            .send(Msg::Action {
                kind,
                event: ActionEvent::Line(line),
            })
            .is_err()
        {
            // Loop gone; nothing left to report to.
            break;
        }
    }

    match exec.await {
        Ok(Ok(())) => ActionEvent::Done,
        Ok(Err(e)) => ActionEvent::Err(e.to_string()),
        Err(e) => ActionEvent::Err(format!("operation task failed: {e}")),
    }
}

fn spawn_action_worker(
    kind: ActionKind,
    tx: UnboundedSender<Msg>,
    controller: Arc<dyn StackController>,
    env_file: Option<PathBuf>,
) {
    tokio::spawn(async move {
        let event = run_steps(kind, controller, env_file, &tx).await;
        let _ = tx.send(Msg::Action { kind, event });
    });
}

/// Persist the wizard's pairs, then run the rebuild side effect. A write
/// failure is the terminal error; a rebuild failure is reported the same
/// way but the persisted configuration stays.
fn spawn_save_worker(
    pairs: Vec<(String, String)>,
    tx: UnboundedSender<Msg>,
    controller: Arc<dyn StackController>,
    store: Arc<Mutex<EnvStore>>,
    env_file: Option<PathBuf>,
) {
    tokio::spawn(async move {
        let kind = ActionKind::WizardSave;
        let written = {
            let mut store = store.lock().await;
            for (key, value) in pairs {
                store.set(key, value);
            }
            store.write().map(|()| store.path().display().to_string())
        };
        match written {
            Err(e) => {
                let _ = tx.send(Msg::Action {
                    kind,
                    event: ActionEvent::Err(e.to_string()),
                });
                return;
            }
            Ok(path) => {
                let _ = tx.send(Msg::Action {
                    kind,
                    event: ActionEvent::Line(format!("configuration written to {path}")),
                });
            }
        }
        let event = run_steps(kind, controller, env_file, &tx).await;
        let _ = tx.send(Msg::Action { kind, event });
    });
}

fn spawn_fetch_worker(tx: UnboundedSender<Msg>, provider: Arc<dyn StatusProvider>) {
    tokio::spawn(async move {
        let msg = match provider.query().await {
            Ok(statuses) => Msg::StatusFetched(statuses),
            Err(e) => {
                tracing::warn!("status query failed: {e}");
                Msg::StatusFetchFailed(e.to_string())
            }
        };
        let _ = tx.send(msg);
    });
}

fn spawn_reload_worker(tx: UnboundedSender<Msg>, store: Arc<Mutex<EnvStore>>) {
    tokio::spawn(async move {
        let msg = {
            let mut store = store.lock().await;
            match store.load() {
                Ok(pairs) => Msg::ConfigLoaded(pairs),
                Err(e) => Msg::ConfigLoadFailed(e.to_string()),
            }
        };
        let _ = tx.send(msg);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DeckError, DeckResult};
    use crate::stack::Step;
    use async_trait::async_trait;
    use std::path::Path;
    use tempfile::TempDir;

    /// Controller that emits scripted lines and a scripted outcome.
    struct ScriptedController {
        lines: Vec<&'static str>,
        fail: Option<&'static str>,
    }

    #[async_trait]
    impl StackController for ScriptedController {
        async fn execute(
            &self,
            _steps: &[Step],
            _env_file: Option<&Path>,
            lines: mpsc::UnboundedSender<String>,
        ) -> DeckResult<()> {
            for line in &self.lines {
                let _ = lines.send(line.to_string());
            }
            match self.fail {
                Some(step) => Err(DeckError::ExitStatus { step, code: 1 }),
                None => Ok(()),
            }
        }
    }

    async fn collect_run(controller: ScriptedController, kind: ActionKind) -> Vec<Msg> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let event = run_steps(kind, Arc::new(controller), None, &tx).await;
        let _ = tx.send(Msg::Action { kind, event });
        drop(tx);

        let mut msgs = Vec::new();
        while let Some(msg) = rx.recv().await {
            msgs.push(msg);
        }
        msgs
    }

    fn terminal_count(msgs: &[Msg]) -> usize {
        msgs.iter()
            .filter(|m| {
                matches!(
                    m,
                    Msg::Action {
                        event: ActionEvent::Done | ActionEvent::Err(_),
                        ..
                    }
                )
            })
            .count()
    }

    #[tokio::test]
    async fn run_emits_lines_then_exactly_one_done() {
        let msgs = collect_run(
            ScriptedController {
                lines: vec!["step one", "step two"],
                fail: None,
            },
            ActionKind::Build,
        )
        .await;

        assert_eq!(terminal_count(&msgs), 1);
        assert!(matches!(
            msgs.last(),
            Some(Msg::Action {
                kind: ActionKind::Build,
                event: ActionEvent::Done
            })
        ));
        let line_count = msgs
            .iter()
            .filter(|m| matches!(m, Msg::Action { event: ActionEvent::Line(_), .. }))
            .count();
        assert_eq!(line_count, 2);
    }

    #[tokio::test]
    async fn failed_run_emits_exactly_one_err() {
        let msgs = collect_run(
            ScriptedController {
                lines: vec!["partial output"],
                fail: Some("build"),
            },
            ActionKind::Restart,
        )
        .await;

        assert_eq!(terminal_count(&msgs), 1);
        match msgs.last() {
            Some(Msg::Action {
                kind: ActionKind::Restart,
                event: ActionEvent::Err(e),
            }) => assert!(e.contains("build")),
            other => panic!("expected Err terminal, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn every_message_carries_the_kind() {
        let msgs = collect_run(
            ScriptedController {
                lines: vec!["a", "b", "c"],
                fail: None,
            },
            ActionKind::Stop,
        )
        .await;
        for msg in &msgs {
            match msg {
                Msg::Action { kind, .. } => assert_eq!(*kind, ActionKind::Stop),
                other => panic!("unexpected message {other:?}"),
            }
        }
    }

    // ── Wizard save worker ──

    async fn drain(mut rx: mpsc::UnboundedReceiver<Msg>) -> Vec<Msg> {
        let mut msgs = Vec::new();
        while let Some(msg) = rx.recv().await {
            msgs.push(msg);
        }
        msgs
    }

    #[tokio::test]
    async fn save_worker_writes_every_pair_then_rebuilds() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(Mutex::new(EnvStore::new(dir.path().join(".env"))));
        let (tx, rx) = mpsc::unbounded_channel();

        spawn_save_worker(
            vec![
                ("PORT".into(), String::new()),
                ("TOKEN".into(), String::new()),
            ],
            tx,
            Arc::new(ScriptedController {
                lines: vec!["rebuilding"],
                fail: None,
            }),
            store.clone(),
            None,
        );
        let msgs = drain(rx).await;

        assert_eq!(terminal_count(&msgs), 1);
        assert!(matches!(
            msgs.last(),
            Some(Msg::Action {
                kind: ActionKind::WizardSave,
                event: ActionEvent::Done
            })
        ));
        // Empty values count as writes: every key lands in the store.
        let store = store.lock().await;
        assert_eq!(store.pairs()["PORT"], "");
        assert_eq!(store.pairs()["TOKEN"], "");
        let content = std::fs::read_to_string(dir.path().join(".env")).unwrap();
        assert!(content.contains("PORT="));
        assert!(content.contains("TOKEN="));
    }

    #[tokio::test]
    async fn save_worker_surfaces_write_failure_and_skips_rebuild() {
        let dir = TempDir::new().unwrap();
        // Parent directory does not exist, so the write fails.
        let store = Arc::new(Mutex::new(EnvStore::new(
            dir.path().join("missing").join(".env"),
        )));
        let (tx, rx) = mpsc::unbounded_channel();

        spawn_save_worker(
            vec![("A".into(), "1".into())],
            tx,
            Arc::new(ScriptedController {
                lines: vec!["must not run"],
                fail: None,
            }),
            store,
            None,
        );
        let msgs = drain(rx).await;

        assert_eq!(terminal_count(&msgs), 1);
        match msgs.last() {
            Some(Msg::Action {
                kind: ActionKind::WizardSave,
                event: ActionEvent::Err(e),
            }) => assert!(e.contains("config write failed")),
            other => panic!("expected Err terminal, got {other:?}"),
        }
        assert!(!msgs.iter().any(|m| {
            matches!(m, Msg::Action { event: ActionEvent::Line(l), .. } if l.contains("must not run"))
        }));
    }

    #[tokio::test]
    async fn rebuild_failure_keeps_written_config() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(Mutex::new(EnvStore::new(dir.path().join(".env"))));
        let (tx, rx) = mpsc::unbounded_channel();

        spawn_save_worker(
            vec![("NAME".into(), "web".into())],
            tx,
            Arc::new(ScriptedController {
                lines: vec![],
                fail: Some("build"),
            }),
            store,
            None,
        );
        let msgs = drain(rx).await;

        assert!(matches!(
            msgs.last(),
            Some(Msg::Action {
                event: ActionEvent::Err(_),
                ..
            })
        ));
        // The save itself stuck: the file is on disk with the new value.
        let content = std::fs::read_to_string(dir.path().join(".env")).unwrap();
        assert!(content.contains("NAME=web"));
    }
}
