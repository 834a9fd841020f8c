//! Persisted undo history.
//!
//! The history is written as flat keys under a caller-supplied prefix:
//!
//! ```text
//! {prefix}.hash        decimal 32-bit hash of the text the history applies to
//! {prefix}.maxSize     -1 = unbounded
//! {prefix}.position
//! {prefix}.size
//! {prefix}.{i}.start / .before / .after
//! ```
//!
//! Restoring against a text with a different hash is rejected, so deltas are never replayed
//! against the wrong base text.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{RestoreError, StoreError};
use crate::history::{EditHistory, EditItem};

/// String key-value storage (a preferences file, a JSON file, an in-memory map).
pub trait KeyValueStore {
    /// Value of `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Set `key` to `value`.
    fn put(&mut self, key: &str, value: String);

    /// Remove every key starting with `prefix`.
    fn remove_prefix(&mut self, prefix: &str);

    /// Set `key` to the decimal form of `value`.
    fn put_int(&mut self, key: &str, value: i64) {
        self.put(key, value.to_string());
    }

    /// Integer value of `key`, if present and parsable.
    fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key)?.parse().ok()
    }
}

/// In-memory store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the store has no keys.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn put(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }

    fn remove_prefix(&mut self, prefix: &str) {
        self.values.retain(|key, _| !key.starts_with(prefix));
    }
}

/// Store backed by a JSON object file. Changes are written by [`JsonFileStore::flush`].
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open `path`; a missing file yields an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self { path, values })
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the store atomically (temp file + rename).
    pub fn flush(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.values)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn put(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }

    fn remove_prefix(&mut self, prefix: &str) {
        self.values.retain(|key, _| !key.starts_with(prefix));
    }
}

/// 32-bit string hash over UTF-16 code units (`h = 31 * h + unit`, wrapping).
///
/// Compatible with hashes written by the Java-based editor this storage layout comes from.
pub fn text_hash(text: &str) -> i32 {
    text.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

/// Write `history` (recorded against `text`) under `prefix`, replacing older state.
pub fn store_history(
    history: &EditHistory,
    text: &str,
    store: &mut impl KeyValueStore,
    prefix: &str,
) {
    store.remove_prefix(&format!("{prefix}."));
    store.put(&format!("{prefix}.hash"), text_hash(text).to_string());
    let max_size = history
        .max_size()
        .map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));
    store.put_int(&format!("{prefix}.maxSize"), max_size);
    store.put_int(&format!("{prefix}.position"), history.position() as i64);
    store.put_int(&format!("{prefix}.size"), history.len() as i64);

    for (i, item) in history.entries().iter().enumerate() {
        store.put_int(&format!("{prefix}.{i}.start"), item.start as i64);
        store.put(&format!("{prefix}.{i}.before"), item.before.clone());
        store.put(&format!("{prefix}.{i}.after"), item.after.clone());
    }
}

/// Read a history stored under `prefix` for the live `text`.
///
/// - `Ok(None)`: nothing was stored (no hash key).
/// - `Err(_)`: the stored history belongs to a different text, or is malformed.
pub fn restore_history(
    store: &impl KeyValueStore,
    prefix: &str,
    text: &str,
) -> Result<Option<EditHistory>, RestoreError> {
    let hash_key = format!("{prefix}.hash");
    let Some(raw_hash) = store.get(&hash_key) else {
        return Ok(None);
    };
    let stored: i32 = raw_hash.trim().parse().map_err(|_| RestoreError::InvalidValue {
        key: hash_key,
        value: raw_hash.clone(),
    })?;
    let current = text_hash(text);
    if stored != current {
        debug!(stored, current, "stored history belongs to another text");
        return Err(RestoreError::HashMismatch { stored, current });
    }

    let max_size = match optional_int(store, &format!("{prefix}.maxSize"))? {
        None => None,
        Some(n) if n < 0 => None,
        Some(n) => Some(n as usize),
    };
    let size = required_usize(store, &format!("{prefix}.size"))?;

    let mut entries = Vec::with_capacity(size.min(4096));
    for i in 0..size {
        let start = required_usize(store, &format!("{prefix}.{i}.start"))?;
        let before = required_string(store, &format!("{prefix}.{i}.before"))?;
        let after = required_string(store, &format!("{prefix}.{i}.after"))?;
        entries.push(EditItem::new(start, before, after));
    }

    let position = required_usize(store, &format!("{prefix}.position"))?;
    if position > size {
        return Err(RestoreError::PositionOutOfRange { position, size });
    }

    Ok(Some(EditHistory::from_parts(entries, position, max_size)))
}

fn required_string(store: &impl KeyValueStore, key: &str) -> Result<String, RestoreError> {
    store
        .get(key)
        .ok_or_else(|| RestoreError::MissingField(key.to_string()))
}

fn optional_int(store: &impl KeyValueStore, key: &str) -> Result<Option<i64>, RestoreError> {
    let Some(raw) = store.get(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|_| RestoreError::InvalidValue {
            key: key.to_string(),
            value: raw,
        })
}

fn required_usize(store: &impl KeyValueStore, key: &str) -> Result<usize, RestoreError> {
    let value = optional_int(store, key)?
        .ok_or_else(|| RestoreError::MissingField(key.to_string()))?;
    usize::try_from(value).map_err(|_| RestoreError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}
