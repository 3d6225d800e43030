//! Preference store — flat TOML key/value file with change notification.
//!
//! The store owns one file under the work dir (`prefs.toml`). Every write
//! persists the full table and then fans a [`PrefChangeEvent`] out to all
//! subscribers: a `(key, snapshot)` pair, where the snapshot is the complete
//! post-write state. Subscribers that have gone away are dropped silently.
//!
//! Events are delivered on whatever thread performs the write — observers
//! must not assume the startup context.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, RwLock},
};

use tokio::sync::mpsc;
use tracing::warn;

use crate::error::AppError;

/// A single preference value.
#[derive(Debug, Clone, PartialEq)]
pub enum PrefValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

/// Immutable copy of the whole preference table at one point in time.
#[derive(Debug, Clone, Default)]
pub struct PrefSnapshot {
    entries: BTreeMap<String, PrefValue>,
}

impl PrefSnapshot {
    pub fn get(&self, key: &str) -> Option<&PrefValue> {
        self.entries.get(key)
    }

    /// Boolean lookup with a default for absent or non-boolean entries.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.entries.get(key) {
            Some(PrefValue::Bool(b)) => *b,
            _ => default,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PrefValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Delivered to subscribers after every persisted entry change.
#[derive(Debug, Clone)]
pub struct PrefChangeEvent {
    /// The key that changed.
    pub key: String,
    /// Full table state after the change.
    pub snapshot: PrefSnapshot,
}

/// TOML-file-backed preference store.
#[derive(Debug)]
pub struct PrefStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, PrefValue>>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<PrefChangeEvent>>>,
}

impl PrefStore {
    /// Open the store at `path`. A missing file is an empty store; the
    /// parent directory is created so the first write can persist.
    pub fn open(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::Prefs(format!("cannot create {}: {e}", parent.display())))?;
        }

        let entries = if path.exists() {
            let raw = fs::read_to_string(path)
                .map_err(|e| AppError::Prefs(format!("cannot read {}: {e}", path.display())))?;
            parse_table(&raw, path)?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            entries: RwLock::new(entries),
            subscribers: Mutex::new(Vec::new()),
        })
    }

    pub fn get(&self, key: &str) -> Option<PrefValue> {
        self.entries.read().expect("prefs lock poisoned").get(key).cloned()
    }

    /// Boolean lookup with a default for absent or non-boolean entries.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some(PrefValue::Bool(b)) => b,
            _ => default,
        }
    }

    pub fn set_bool(&self, key: &str, value: bool) -> Result<(), AppError> {
        self.set(key, PrefValue::Bool(value))
    }

    /// Write one entry: persist the table, then notify subscribers.
    /// Writing an unchanged value is a no-op (no persist, no event).
    pub fn set(&self, key: &str, value: PrefValue) -> Result<(), AppError> {
        let snapshot = {
            let mut entries = self.entries.write().expect("prefs lock poisoned");
            if entries.get(key) == Some(&value) {
                return Ok(());
            }
            entries.insert(key.to_string(), value);
            self.persist(&entries)?;
            PrefSnapshot {
                entries: entries.clone(),
            }
        };

        self.notify(PrefChangeEvent {
            key: key.to_string(),
            snapshot,
        });
        Ok(())
    }

    /// Full table state at this instant.
    pub fn snapshot(&self) -> PrefSnapshot {
        PrefSnapshot {
            entries: self.entries.read().expect("prefs lock poisoned").clone(),
        }
    }

    /// Subscribe to change events. The subscription lives until the receiver
    /// is dropped; the store never unregisters it on its own.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<PrefChangeEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .expect("subscriber lock poisoned")
            .push(tx);
        rx
    }

    fn notify(&self, event: PrefChangeEvent) {
        let mut subscribers = self.subscribers.lock().expect("subscriber lock poisoned");
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn persist(&self, entries: &BTreeMap<String, PrefValue>) -> Result<(), AppError> {
        let mut table = toml::Table::new();
        for (key, value) in entries {
            let v = match value {
                PrefValue::Bool(b) => toml::Value::Boolean(*b),
                PrefValue::Int(i) => toml::Value::Integer(*i),
                PrefValue::Text(s) => toml::Value::String(s.clone()),
            };
            table.insert(key.clone(), v);
        }
        let rendered = toml::to_string(&table)
            .map_err(|e| AppError::Prefs(format!("cannot serialize preferences: {e}")))?;
        fs::write(&self.path, rendered)
            .map_err(|e| AppError::Prefs(format!("cannot write {}: {e}", self.path.display())))
    }
}

fn parse_table(raw: &str, path: &Path) -> Result<BTreeMap<String, PrefValue>, AppError> {
    let table: toml::Table = toml::from_str(raw)
        .map_err(|e| AppError::Prefs(format!("parse error in {}: {e}", path.display())))?;

    let mut entries = BTreeMap::new();
    for (key, value) in table {
        let parsed = match value {
            toml::Value::Boolean(b) => PrefValue::Bool(b),
            toml::Value::Integer(i) => PrefValue::Int(i),
            toml::Value::String(s) => PrefValue::Text(s),
            other => {
                warn!(key, kind = other.type_str(), "ignoring unsupported preference value");
                continue;
            }
        };
        entries.insert(key, parsed);
    }
    Ok(entries)
}
