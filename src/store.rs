//! Persistence of the two parcel lists.
//!
//! Lists live in a string-valued key-value store under two fixed keys. Each
//! value is the JSON encoding of one ordered list. Every save rewrites both
//! keys; there is no incremental persistence.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, TrackerError};
use crate::model::{ItemId, ListKind, TrackingItem};
use crate::util::atomic_write;

/// Key holding the active list.
pub const ACTIVE_KEY: &str = "tracking_items";

/// Key holding the archived list.
pub const ARCHIVED_KEY: &str = "archived_items";

/// Store key for a list.
#[must_use]
pub const fn key_for(kind: ListKind) -> &'static str {
    match kind {
        ListKind::Active => ACTIVE_KEY,
        ListKind::Archived => ARCHIVED_KEY,
    }
}

/// String-valued key-value storage.
pub trait KeyValueStore {
    /// Read a value, `None` if the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a single value.
    fn set(&mut self, key: &str, value: String) -> Result<()>;

    /// Write several values in one operation.
    ///
    /// The default calls [`set`](Self::set) per entry; backends that can
    /// commit a batch at once should override it.
    fn set_many(&mut self, entries: Vec<(&str, String)>) -> Result<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Remove a key. Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-memory store, used for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// JSON-file store: a single object mapping keys to string values.
///
/// The whole file is rewritten atomically on every write.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`. A missing file is an empty store.
    ///
    /// A file that does not decode is an error; see
    /// [`open_with_policy`](Self::open_with_policy) to reset it instead.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with_policy(path, CorruptPolicy::Fail)
    }

    /// Open the store at `path`, applying `policy` if the file is corrupt.
    ///
    /// Under [`CorruptPolicy::Reset`] an undecodable file is logged and
    /// treated as empty; it is overwritten by the next save.
    pub fn open_with_policy(path: impl Into<PathBuf>, policy: CorruptPolicy) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                TrackerError::io(format!("Failed to read store file: {}", path.display()), e)
            })?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                match serde_json::from_str(&content) {
                    Ok(entries) => entries,
                    Err(e) => match policy {
                        CorruptPolicy::Fail => {
                            return Err(TrackerError::CorruptStoreFile {
                                message: e.to_string(),
                                path,
                                source: e,
                            })
                        }
                        CorruptPolicy::Reset => {
                            warn!(
                                path = %path.display(),
                                error = %e,
                                "Store file is corrupt, starting empty"
                            );
                            BTreeMap::new()
                        }
                    },
                }
            }
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), keys = entries.len(), "Opened store");
        Ok(Self { path, entries })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.entries).map_err(|e| {
            TrackerError::SerializationError {
                context: "Failed to serialize store".to_string(),
                source: e,
            }
        })?;
        atomic_write(&self.path, content.as_bytes())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        self.flush()
    }

    fn set_many(&mut self, entries: Vec<(&str, String)>) -> Result<()> {
        for (key, value) in entries {
            self.entries.insert(key.to_string(), value);
        }
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// Behaviour when a stored list fails to decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorruptPolicy {
    /// Fail the load with [`TrackerError::CorruptStore`].
    Fail,
    /// Log a warning and treat that list as empty.
    #[default]
    Reset,
}

/// Saves and loads the active and archived lists.
#[derive(Debug, Clone)]
pub struct Persistence<S> {
    store: S,
    policy: CorruptPolicy,
}

impl<S: KeyValueStore> Persistence<S> {
    /// Wrap a store with the default corruption policy.
    pub fn new(store: S) -> Self {
        Self {
            store,
            policy: CorruptPolicy::default(),
        }
    }

    /// Set the corruption policy.
    #[must_use]
    pub fn with_policy(mut self, policy: CorruptPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Rewrite both lists.
    pub fn save(&mut self, active: &[TrackingItem], archived: &[TrackingItem]) -> Result<()> {
        let active_json = serde_json::to_string(active)?;
        let archived_json = serde_json::to_string(archived)?;
        self.store
            .set_many(vec![(ACTIVE_KEY, active_json), (ARCHIVED_KEY, archived_json)])?;
        debug!(active = active.len(), archived = archived.len(), "Saved lists");
        Ok(())
    }

    /// Read both lists. An absent key yields an empty list.
    ///
    /// Items stored without an id get a fresh one that is not written back;
    /// use [`load_and_assign_ids`](Self::load_and_assign_ids) to keep them.
    pub fn load(&self) -> Result<(Vec<TrackingItem>, Vec<TrackingItem>)> {
        let (active, _) = self.load_list(ListKind::Active)?;
        let (archived, _) = self.load_list(ListKind::Archived)?;
        debug!(active = active.len(), archived = archived.len(), "Loaded lists");
        Ok((active, archived))
    }

    /// Read both lists, saving them once if any item was missing an id.
    ///
    /// A failed write-back is logged and the lists are still returned.
    pub fn load_and_assign_ids(&mut self) -> Result<(Vec<TrackingItem>, Vec<TrackingItem>)> {
        let (active, active_missing) = self.load_list(ListKind::Active)?;
        let (archived, archived_missing) = self.load_list(ListKind::Archived)?;
        debug!(active = active.len(), archived = archived.len(), "Loaded lists");

        let missing = active_missing + archived_missing;
        if missing > 0 {
            match self.save(&active, &archived) {
                Ok(()) => info!(count = missing, "Assigned ids to stored items"),
                Err(e) => warn!(error = %e, count = missing, "Failed to save assigned ids"),
            }
        }
        Ok((active, archived))
    }

    /// Decode one list, returning it and how many items had no id.
    fn load_list(&self, kind: ListKind) -> Result<(Vec<TrackingItem>, usize)> {
        let key = key_for(kind);
        let Some(raw) = self.store.get(key)? else {
            return Ok((Vec::new(), 0));
        };

        match serde_json::from_str::<Option<Vec<StoredItem>>>(&raw) {
            // A stored `null` decodes like an absent key.
            Ok(stored) => {
                let stored = stored.unwrap_or_default();
                let missing = stored.iter().filter(|s| s.id.is_none()).count();
                Ok((stored.into_iter().map(TrackingItem::from).collect(), missing))
            }
            Err(e) => match self.policy {
                CorruptPolicy::Fail => Err(TrackerError::CorruptStore {
                    key: key.to_string(),
                    message: e.to_string(),
                    source: e,
                }),
                CorruptPolicy::Reset => {
                    warn!(key, error = %e, "Stored list is corrupt, starting with an empty list");
                    Ok((Vec::new(), 0))
                }
            },
        }
    }
}

/// Stored form of an item. Lists written before ids existed lack `id`.
#[derive(Debug, Deserialize)]
struct StoredItem {
    #[serde(default)]
    name: String,
    #[serde(default)]
    code: String,
    #[serde(default)]
    id: Option<ItemId>,
    #[serde(default)]
    added_at: Option<DateTime<Utc>>,
}

impl From<StoredItem> for TrackingItem {
    fn from(stored: StoredItem) -> Self {
        Self {
            name: stored.name,
            code: stored.code,
            id: stored.id.unwrap_or_default(),
            added_at: stored.added_at,
        }
    }
}
