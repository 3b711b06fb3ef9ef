//! Persisted stack configuration — a dotenv-style `KEY=VALUE` file.
//!
//! Keys are unique; a later set overwrites. A missing file loads as an
//! empty store so first runs work without setup.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{DeckError, DeckResult};

pub struct EnvStore {
    path: PathBuf,
    pairs: BTreeMap<String, String>,
}

impl EnvStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            pairs: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pairs(&self) -> &BTreeMap<String, String> {
        &self.pairs
    }

    /// Reload from disk, replacing in-memory state. Returns a copy of the
    /// loaded pairs.
    pub fn load(&mut self) -> DeckResult<BTreeMap<String, String>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(DeckError::Io(e)),
        };
        self.pairs = parse_env(&content);
        Ok(self.pairs.clone())
    }

    /// Set a key in memory. Overwrites, never duplicates.
    pub fn set(&mut self, key: String, value: String) {
        self.pairs.insert(key, value);
    }

    /// Persist all pairs to disk, sorted by key.
    pub fn write(&self) -> DeckResult<()> {
        let mut out = String::new();
        for (key, value) in &self.pairs {
            if value.contains(char::is_whitespace) || value.contains('#') {
                out.push_str(&format!("{key}=\"{value}\"\n"));
            } else {
                out.push_str(&format!("{key}={value}\n"));
            }
        }
        std::fs::write(&self.path, out)
            .map_err(|e| DeckError::Persistence(format!("{}: {e}", self.path.display())))
    }
}

fn parse_env(content: &str) -> BTreeMap<String, String> {
    let mut pairs = BTreeMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        pairs.insert(key.to_string(), unquote(value.trim()).to_string());
    }
    pairs
}

/// Strip one matching pair of surrounding quotes, if present.
fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> EnvStore {
        EnvStore::new(dir.path().join(".env"))
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn parse_skips_comments_and_blanks() {
        let pairs = parse_env("# comment\n\nPORT=8080\n  \nNAME=web\n");
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs["PORT"], "8080");
        assert_eq!(pairs["NAME"], "web");
    }

    #[test]
    fn parse_strips_export_and_quotes() {
        let pairs = parse_env("export TOKEN=\"abc def\"\nMSG='hi'\n");
        assert_eq!(pairs["TOKEN"], "abc def");
        assert_eq!(pairs["MSG"], "hi");
    }

    #[test]
    fn duplicate_keys_overwrite() {
        let pairs = parse_env("PORT=1\nPORT=2\n");
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs["PORT"], "2");
    }

    #[test]
    fn value_may_contain_equals() {
        let pairs = parse_env("URL=postgres://u:p@db:5432/app?sslmode=disable\n");
        assert_eq!(pairs["URL"], "postgres://u:p@db:5432/app?sslmode=disable");
    }

    #[test]
    fn set_overwrites() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.set("PORT".into(), "8080".into());
        store.set("PORT".into(), "9090".into());
        assert_eq!(store.pairs().len(), 1);
        assert_eq!(store.pairs()["PORT"], "9090");
    }

    #[test]
    fn write_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.set("NAME".into(), "my stack".into());
        store.set("PORT".into(), "8080".into());
        store.set("EMPTY".into(), String::new());
        store.write().unwrap();

        let mut fresh = store_in(&dir);
        let pairs = fresh.load().unwrap();
        assert_eq!(pairs["NAME"], "my stack");
        assert_eq!(pairs["PORT"], "8080");
        assert_eq!(pairs["EMPTY"], "");
    }

    #[test]
    fn write_is_sorted() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.set("ZETA".into(), "1".into());
        store.set("ALPHA".into(), "2".into());
        store.write().unwrap();

        let content = std::fs::read_to_string(dir.path().join(".env")).unwrap();
        let alpha = content.find("ALPHA").unwrap();
        let zeta = content.find("ZETA").unwrap();
        assert!(alpha < zeta);
    }

    #[test]
    fn write_failure_is_persistence_error() {
        let dir = TempDir::new().unwrap();
        let store = EnvStore::new(dir.path().join("missing").join(".env"));
        let err = store.write().unwrap_err();
        assert!(matches!(err, DeckError::Persistence(_)));
    }
}
