//! # Client-local state
//!
//! A small string key/value store standing in for browser local storage, and the
//! typed boundary the controller uses on top of it.
//!
//! Placeholder values live under a key scoped to the rendering context, so signed-in
//! and demo sessions never see each other's values. The payload is a flat JSON object
//! of strings. Decoding is strict at the top level: anything but an object is treated
//! as absent and the entry is removed. Inside an object, entries whose value is not a
//! string are dropped one by one.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

use crate::template::PlaceholderValues;

const KEY_PREFIX: &str = "pv:v1";

#[derive(Debug, Error)]
pub enum LocalStorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait LocalStorage {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), LocalStorageError>;
    fn remove_item(&mut self, key: &str) -> Result<(), LocalStorageError>;
}

/// Which session the placeholder values belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderContext {
    SignedIn,
    Demo,
}

impl RenderContext {
    pub fn scope(self) -> &'static str {
        match self {
            RenderContext::SignedIn => "app",
            RenderContext::Demo => "demo",
        }
    }

    pub fn is_read_only(self) -> bool {
        self == RenderContext::Demo
    }
}

pub fn placeholder_values_key(context: RenderContext) -> String {
    format!("{KEY_PREFIX}:placeholders:{}", context.scope())
}

pub fn pane_width_key() -> String {
    format!("{KEY_PREFIX}:pane-width")
}

/// Decodes a stored payload. `None` means the whole entry is unusable.
pub fn decode_placeholder_values(raw: &str) -> Option<PlaceholderValues> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(entries)) => Some(
            entries
                .into_iter()
                .filter_map(|(key, value)| match value {
                    Value::String(text) => Some((key, text)),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    }
}

pub fn load_placeholder_values<L: LocalStorage>(
    storage: &mut L,
    context: RenderContext,
) -> PlaceholderValues {
    let key = placeholder_values_key(context);
    let Some(raw) = storage.get_item(&key) else {
        return PlaceholderValues::new();
    };

    match decode_placeholder_values(&raw) {
        Some(values) => {
            debug!(%key, count = values.len(), "placeholder values loaded");
            values
        }
        None => {
            warn!(%key, "discarding malformed placeholder values");
            if let Err(e) = storage.remove_item(&key) {
                warn!(%key, error = %e, "failed to remove malformed entry");
            }
            PlaceholderValues::new()
        }
    }
}

/// Overwrites the stored values. An empty map removes the entry instead.
pub fn save_placeholder_values<L: LocalStorage>(
    storage: &mut L,
    context: RenderContext,
    values: &PlaceholderValues,
) -> Result<(), LocalStorageError> {
    let key = placeholder_values_key(context);
    if values.is_empty() {
        return storage.remove_item(&key);
    }
    let encoded = serde_json::to_string(values)?;
    storage.set_item(&key, &encoded)
}

pub fn clear_placeholder_values<L: LocalStorage>(
    storage: &mut L,
    context: RenderContext,
) -> Result<(), LocalStorageError> {
    storage.remove_item(&placeholder_values_key(context))
}

/// Reads the stored pane width. Non-numeric and non-finite values are ignored.
pub fn load_pane_width<L: LocalStorage>(storage: &L) -> Option<f64> {
    storage
        .get_item(&pane_width_key())
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|width| width.is_finite())
}

pub fn save_pane_width<L: LocalStorage>(
    storage: &mut L,
    width: f64,
) -> Result<(), LocalStorageError> {
    storage.set_item(&pane_width_key(), &width.to_string())
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl LocalStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), LocalStorageError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), LocalStorageError> {
        self.items.remove(key);
        Ok(())
    }
}

/// Local storage kept in a single JSON document on disk.
///
/// Items are cached in memory and the whole document is rewritten on every change.
#[derive(Debug)]
pub struct FileLocalStorage {
    path: PathBuf,
    items: BTreeMap<String, String>,
}

impl FileLocalStorage {
    /// Opens the document at `path`. A missing or unreadable document starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let items = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "local state is corrupt, starting empty");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self { path, items }
    }

    fn flush(&self) -> Result<(), LocalStorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.items)?)?;
        Ok(())
    }
}

impl LocalStorage for FileLocalStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), LocalStorageError> {
        self.items.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove_item(&mut self, key: &str) -> Result<(), LocalStorageError> {
        if self.items.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}
