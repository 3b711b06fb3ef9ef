//! Tool configuration — project-level settings and the persisted stack
//! environment the wizard edits.
//!
//! Project-level settings: `.deckhand.yaml` in the project directory
//! (compose file, env file, poll cadence — no secrets, safe to commit).
//! CLI flags override file values; a missing file means defaults.

pub mod store;
pub mod validate;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use store::EnvStore;

/// Name of the optional per-project settings file.
const SETTINGS_FILE: &str = ".deckhand.yaml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
    /// Compose file driving the stack.
    pub compose_file: PathBuf,
    /// Environment file the wizard edits and the engine consumes.
    pub env_file: PathBuf,
    /// Status poll interval in seconds.
    pub poll_secs: u64,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            compose_file: PathBuf::from("docker-compose.yml"),
            env_file: PathBuf::from(".env"),
            poll_secs: 5,
        }
    }
}

impl DeckConfig {
    /// Load settings from `<dir>/.deckhand.yaml`, falling back to
    /// defaults when the file is missing or unreadable.
    pub fn load(dir: &Path) -> Self {
        match std::fs::read_to_string(dir.join(SETTINGS_FILE)) {
            Ok(content) => serde_yaml::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_when_missing() {
        let dir = TempDir::new().unwrap();
        let cfg = DeckConfig::load(dir.path());
        assert_eq!(cfg.compose_file, PathBuf::from("docker-compose.yml"));
        assert_eq!(cfg.env_file, PathBuf::from(".env"));
        assert_eq!(cfg.poll_secs, 5);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            "compose_file: stack/compose.yml\n",
        )
        .unwrap();
        let cfg = DeckConfig::load(dir.path());
        assert_eq!(cfg.compose_file, PathBuf::from("stack/compose.yml"));
        assert_eq!(cfg.poll_secs, 5);
    }

    #[test]
    fn garbage_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), ": not yaml [").unwrap();
        let cfg = DeckConfig::load(dir.path());
        assert_eq!(cfg.poll_secs, 5);
    }
}
