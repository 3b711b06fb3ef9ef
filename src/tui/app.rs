//! App — the TEA model.
//!
//! All mutable state lives here, owned by the event loop. `update`
//! receives messages and mutates state; it is the only mutator in the
//! program. Side effects are requested through `pending_*` fields that
//! the runner consumes after each message — update itself never does I/O.
//!
//! The view field is a five-state machine. Every transition is an
//! explicit method responsible for cleanup of the state being left; the
//! central invariant is that the Dashboard never shows operation logs.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::stack::status::ContainerStatus;
use crate::stack::ActionKind;

use super::event::{ActionEvent, Msg};
use super::input;
use super::logs::LogRing;
use super::wizard::WizardSession;

/// How long a success note stays on screen.
const SUCCESS_TTL: Duration = Duration::from_secs(4);

/// Which view is active. Exactly one at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Logs,
    Action,
    Config,
    Wizard,
}

/// The current lifecycle operation. `current` doubles as the tag that
/// identifies which worker's messages are still owned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionState {
    pub current: Option<ActionKind>,
    pub running: bool,
}

/// A transient "it worked" banner with a fixed expiry.
#[derive(Debug, Clone)]
pub struct SuccessNote {
    pub text: String,
    pub expires_at: Instant,
}

impl SuccessNote {
    fn new(text: String) -> Self {
        Self {
            text,
            expires_at: Instant::now() + SUCCESS_TTL,
        }
    }
}

/// The main application state (TEA model).
pub struct App {
    /// Active view.
    pub view: View,
    /// Container statuses, replaced wholesale on each successful poll.
    pub statuses: Vec<ContainerStatus>,
    /// Operation log panel.
    pub logs: LogRing,
    /// Saved log panel content, restored on Dashboard → Logs.
    pub log_buffer: Option<Vec<String>>,
    /// Current lifecycle operation.
    pub action: ActionState,
    /// Loaded configuration pairs (on demand).
    pub config_pairs: BTreeMap<String, String>,
    /// Wizard session. `Some` iff `view == Wizard`.
    pub wizard: Option<WizardSession>,
    /// Transient success banner.
    pub success: Option<SuccessNote>,
    /// A poll tick arrived while an action ran; consumed on completion.
    pub pending_refresh: bool,
    /// Config view: show secret values in the clear.
    pub reveal_secrets: bool,
    /// Whether the app should quit.
    pub should_quit: bool,

    // Viewport state (set by the renderer, used by paging keys).
    pub log_scroll: u16,
    pub log_auto_scroll: bool,
    pub log_viewport: u16,
    pub config_scroll: u16,
    pub config_viewport: u16,

    // Effect requests, consumed by the runner after each message.
    /// Launch an action worker for this kind.
    pub pending_action: Option<ActionKind>,
    /// Launch a one-shot status fetch.
    pub pending_fetch: bool,
    /// Launch a configuration reload.
    pub pending_config_reload: bool,
    /// Persist these pairs, then run the rebuild side effect.
    pub pending_wizard_save: Option<Vec<(String, String)>>,
    /// Wizard open deferred until the in-flight reload lands.
    pub wizard_after_reload: bool,
}

impl App {
    pub fn new() -> Self {
        Self {
            view: View::Dashboard,
            statuses: Vec::new(),
            logs: LogRing::new(),
            log_buffer: None,
            action: ActionState::default(),
            config_pairs: BTreeMap::new(),
            wizard: None,
            success: None,
            pending_refresh: false,
            reveal_secrets: false,
            should_quit: false,
            log_scroll: 0,
            log_auto_scroll: true,
            log_viewport: 20,
            config_scroll: 0,
            config_viewport: 20,
            pending_action: None,
            pending_fetch: false,
            pending_config_reload: false,
            pending_wizard_save: None,
            wizard_after_reload: false,
        }
    }

    /// Handle one message (TEA update). The sole mutator.
    pub fn update(&mut self, msg: Msg) {
        match msg {
            Msg::Input(key) => input::handle_key(self, key),
            Msg::Action { kind, event } => self.handle_action_event(kind, event),
            Msg::PollTick => {
                if self.action.running {
                    // Don't interleave a status query with a live
                    // operation; catch up once it finishes.
                    self.pending_refresh = true;
                } else {
                    self.pending_fetch = true;
                }
            }
            Msg::StatusFetched(statuses) => {
                self.statuses = statuses;
            }
            Msg::StatusFetchFailed(e) => {
                tracing::warn!("status fetch failed: {e}");
                self.push_log(&format!("status: {e}"));
            }
            Msg::ConfigLoaded(pairs) => {
                self.config_pairs = pairs;
                if self.wizard_after_reload {
                    self.wizard_after_reload = false;
                    // The deferred open only lands if the operator is
                    // still waiting on the dashboard.
                    if self.view == View::Dashboard {
                        self.open_wizard();
                    }
                }
            }
            Msg::ConfigLoadFailed(e) => {
                tracing::warn!("config reload failed: {e}");
                self.wizard_after_reload = false;
                self.push_log(&format!("config: {e}"));
            }
        }
    }

    /// Drop expired transients. Called by the runner before each frame.
    pub fn maintain(&mut self, now: Instant) {
        if let Some(ref note) = self.success {
            if note.expires_at <= now {
                self.success = None;
            }
        }
    }

    // ── Action lifecycle ──

    /// Launch a lifecycle operation, or reject it if one is live. The
    /// busy rejection is the concurrency guarantee: nothing is queued.
    pub fn start_action(&mut self, kind: ActionKind) {
        if self.action.running {
            let current = self.action.current.unwrap_or(kind);
            self.push_log(&format!("busy: {current} is already running, {kind} ignored"));
            return;
        }
        self.action = ActionState {
            current: Some(kind),
            running: true,
        };
        self.pending_action = Some(kind);
        self.enter_action();
    }

    fn handle_action_event(&mut self, kind: ActionKind, event: ActionEvent) {
        // Stale-message rule: output from a superseded worker is dropped
        // silently. Correctness never depends on cancelling the worker.
        if self.action.current != Some(kind) {
            return;
        }
        match event {
            ActionEvent::Line(line) => {
                self.push_log(&line);
            }
            ActionEvent::Done => {
                self.push_log(&format!("{kind} complete"));
                self.success = Some(SuccessNote::new(format!("{kind} complete")));
                self.return_to_dashboard();
                self.pending_fetch = true;
                self.pending_refresh = false;
            }
            ActionEvent::Err(e) => {
                self.push_log(&format!("{kind} failed: {e}"));
                tracing::warn!("{kind} failed: {e}");
                self.return_to_dashboard();
                self.pending_fetch = true;
                self.pending_refresh = false;
            }
        }
    }

    // ── View transitions ──

    pub fn enter_logs(&mut self) {
        if let Some(ref buf) = self.log_buffer {
            self.logs.restore(buf.clone());
        }
        self.view = View::Logs;
        self.log_scroll = 0;
        self.log_auto_scroll = true;
    }

    fn enter_action(&mut self) {
        // Fresh stream; the dashboard invariant guarantees the panel is
        // already empty.
        self.view = View::Action;
        self.log_scroll = 0;
        self.log_auto_scroll = true;
    }

    pub fn enter_config(&mut self) {
        self.pending_config_reload = true;
        self.view = View::Config;
        self.config_scroll = 0;
        self.reveal_secrets = false;
    }

    pub fn enter_wizard(&mut self) {
        if self.config_pairs.is_empty() {
            self.wizard_after_reload = true;
            self.pending_config_reload = true;
            return;
        }
        self.open_wizard();
    }

    fn open_wizard(&mut self) {
        self.wizard = Some(WizardSession::new(&self.config_pairs));
        self.view = View::Wizard;
    }

    /// Generic cleanup back to the dashboard. Saves the log panel into
    /// the buffer when leaving Logs/Action, discards any wizard, clears
    /// the action, and empties the panel — the dashboard must never
    /// display operation logs.
    pub fn return_to_dashboard(&mut self) {
        if matches!(self.view, View::Logs | View::Action) {
            self.log_buffer = Some(self.logs.lines().to_vec());
        }
        self.wizard = None;
        self.action = ActionState::default();
        self.logs.clear();
        self.log_scroll = 0;
        self.log_auto_scroll = true;
        self.view = View::Dashboard;
    }

    // ── Wizard save ──

    /// Validate every field from its live input and hand the pair set to
    /// the save worker. The first invalid field aborts the whole save;
    /// nothing reaches the store.
    pub fn save_wizard(&mut self) {
        let Some(ref session) = self.wizard else {
            return;
        };
        if self.action.running {
            if let Some(session) = self.wizard.as_mut() {
                session.error = Some("an operation is already running".into());
            }
            return;
        }
        match session.validate_all() {
            Err((key, e)) => {
                if let Some(session) = self.wizard.as_mut() {
                    session.error = Some(format!("{key}: {e}"));
                }
            }
            Ok(pairs) => {
                self.return_to_dashboard();
                self.action = ActionState {
                    current: Some(ActionKind::WizardSave),
                    running: true,
                };
                self.pending_wizard_save = Some(pairs);
                self.enter_action();
            }
        }
    }

    // ── Log panel ──

    /// Append to the log panel. Appends in Dashboard view are suppressed
    /// entirely (leak prevention).
    pub fn push_log(&mut self, line: &str) {
        if self.view == View::Dashboard {
            return;
        }
        self.logs.push(line);
    }

    // ── Scroll helpers (saturating moves; End re-arms auto-scroll) ──

    pub fn scroll_up(&mut self, lines: u16) {
        match self.view {
            View::Logs | View::Action => {
                self.log_auto_scroll = false;
                self.log_scroll = self.log_scroll.saturating_sub(lines);
            }
            View::Config => {
                self.config_scroll = self.config_scroll.saturating_sub(lines);
            }
            _ => {}
        }
    }

    pub fn scroll_down(&mut self, lines: u16) {
        match self.view {
            View::Logs | View::Action => {
                self.log_auto_scroll = false;
                self.log_scroll = self.log_scroll.saturating_add(lines);
            }
            View::Config => {
                self.config_scroll = self.config_scroll.saturating_add(lines);
            }
            _ => {}
        }
    }

    pub fn scroll_home(&mut self) {
        match self.view {
            View::Logs | View::Action => {
                self.log_auto_scroll = false;
                self.log_scroll = 0;
            }
            View::Config => self.config_scroll = 0,
            _ => {}
        }
    }

    pub fn scroll_end(&mut self) {
        if matches!(self.view, View::Logs | View::Action) {
            self.log_auto_scroll = true;
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
