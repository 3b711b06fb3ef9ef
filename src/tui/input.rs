//! Key binding dispatch for the TUI.
//!
//! Keys are interpreted per view. Ctrl+C is the one global quit honored
//! in every state; `q` also quits everywhere except the wizard, where
//! printable characters belong to the focused field.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::stack::ActionKind;

use super::app::{App, View};

/// Handle a key event, mutating app state.
pub fn handle_key(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.view {
        View::Dashboard => dashboard_key(app, key),
        View::Logs | View::Action => pane_key(app, key),
        View::Config => config_key(app, key),
        View::Wizard => wizard_key(app, key),
    }
}

fn dashboard_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('a') => app.start_action(ActionKind::Start),
        KeyCode::Char('s') => app.start_action(ActionKind::Stop),
        KeyCode::Char('r') => app.start_action(ActionKind::Restart),
        KeyCode::Char('b') => app.start_action(ActionKind::Build),
        KeyCode::Char('l') => app.enter_logs(),
        KeyCode::Char('c') => app.enter_config(),
        KeyCode::Char('w') => app.enter_wizard(),
        _ => {}
    }
}

fn pane_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Esc => {
            // Leaving mid-action is blocked; the run ends on Done/Err.
            if !app.action.running {
                app.return_to_dashboard();
            }
        }
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::PageUp => app.scroll_up(app.log_viewport),
        KeyCode::PageDown => app.scroll_down(app.log_viewport),
        KeyCode::Home => app.scroll_home(),
        KeyCode::End => app.scroll_end(),
        // Lifecycle keys fall through to the busy check while a run is
        // live, so a premature relaunch gets one warning line.
        KeyCode::Char('a') if app.view == View::Action => app.start_action(ActionKind::Start),
        KeyCode::Char('s') if app.view == View::Action => app.start_action(ActionKind::Stop),
        KeyCode::Char('r') if app.view == View::Action => app.start_action(ActionKind::Restart),
        KeyCode::Char('b') if app.view == View::Action => app.start_action(ActionKind::Build),
        _ => {}
    }
}

fn config_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Esc => app.return_to_dashboard(),
        KeyCode::Char('r') => app.pending_config_reload = true,
        KeyCode::Char(' ') => app.reveal_secrets = !app.reveal_secrets,
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::PageUp => app.scroll_up(app.config_viewport),
        KeyCode::PageDown => app.scroll_down(app.config_viewport),
        KeyCode::Home => app.scroll_home(),
        KeyCode::End => app.scroll_end(),
        _ => {}
    }
}

fn wizard_key(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.save_wizard();
        return;
    }
    match key.code {
        KeyCode::Esc => app.return_to_dashboard(),
        KeyCode::Left => {
            if let Some(session) = app.wizard.as_mut() {
                session.prev();
            }
        }
        KeyCode::Right => {
            if let Some(session) = app.wizard.as_mut() {
                session.next();
            }
        }
        KeyCode::Backspace => {
            if let Some(field) = app.wizard.as_mut().and_then(|s| s.field_mut()) {
                field.input.backspace();
            }
        }
        KeyCode::Tab => {
            if let Some(field) = app.wizard.as_mut().and_then(|s| s.field_mut()) {
                field.revealed = !field.revealed;
            }
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            if let Some(field) = app.wizard.as_mut().and_then(|s| s.field_mut()) {
                field.input.insert(c);
            }
        }
        _ => {}
    }
}
