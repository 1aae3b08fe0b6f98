//! File-backed document store.
//!
//! Each collection lives in one JSON file, `<data_dir>/<collection>.json`:
//!
//! ```json
//! { "version": 1, "documents": [ ... ], "applied_commands": [ "..." ] }
//! ```
//!
//! Reads parse the file on every call; there is no in-memory copy to go
//! stale. Writes load, modify and save under a store-wide mutex, so
//! concurrent admin edits are serialized and the last writer wins. The new
//! contents are written to a sibling temp file and renamed into place, which
//! keeps a crash mid-write from leaving a truncated collection behind.
//!
//! A missing file is an empty collection. A file whose `version` this build
//! does not understand is an error rather than being silently discarded.
//!
//! ## Rank batches
//!
//! [`FileStore`] is the production [`RankWriter`]. A reorder command is
//! applied as a single load-modify-save of its collection, and its key is
//! remembered in `applied_commands` (the most recent
//! [`REMEMBERED_COMMANDS`]) so a replay is acknowledged without writing.

use crate::gallery::{CommandKey, RankWriter, ReorderCommand, ReorderScope, WriteOutcome};
use crate::records::{Collection, PortfolioItem, Property};
use crate::types::DocId;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Version of the collection file format.
const STORE_VERSION: u32 = 1;

/// How many applied reorder keys each collection remembers.
pub const REMEMBERED_COMMANDS: usize = 64;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error in {collection}: {source}")]
    Json {
        collection: &'static str,
        source: serde_json::Error,
    },
    #[error("{collection}/{id} not found")]
    NotFound { collection: &'static str, id: DocId },
    #[error("{collection}/{id} already exists")]
    Duplicate { collection: &'static str, id: DocId },
    #[error("{id} is not part of {collection}")]
    UnknownItem { collection: &'static str, id: DocId },
    #[error("{collection} has unsupported format version {found} (expected {STORE_VERSION})")]
    Version { collection: &'static str, found: u32 },
}

#[derive(Debug, Serialize, Deserialize)]
struct CollectionFile<T> {
    version: u32,
    documents: Vec<T>,
    #[serde(default)]
    applied_commands: Vec<CommandKey>,
}

impl<T> CollectionFile<T> {
    fn empty() -> Self {
        Self {
            version: STORE_VERSION,
            documents: Vec::new(),
            applied_commands: Vec::new(),
        }
    }

    fn position(&self, id: &DocId) -> Option<usize>
    where
        T: Collection,
    {
        self.documents.iter().position(|d| d.id() == id)
    }

    fn has_applied(&self, key: &CommandKey) -> bool {
        self.applied_commands.contains(key)
    }

    fn remember(&mut self, key: CommandKey) {
        self.applied_commands.push(key);
        let excess = self
            .applied_commands
            .len()
            .saturating_sub(REMEMBERED_COMMANDS);
        self.applied_commands.drain(..excess);
    }
}

pub struct FileStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `data_dir`.
    pub fn open(data_dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(data_dir)?;
        Ok(Self {
            root: data_dir.to_path_buf(),
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a collection's file.
    pub fn collection_path(&self, collection: &str) -> PathBuf {
        self.root.join(format!("{collection}.json"))
    }

    /// All documents, in stored order.
    pub fn list<T: Collection>(&self) -> Result<Vec<T>, StoreError> {
        Ok(self.load::<T>()?.documents)
    }

    pub fn get<T: Collection>(&self, id: &DocId) -> Result<T, StoreError> {
        self.load::<T>()?
            .documents
            .into_iter()
            .find(|d| d.id() == id)
            .ok_or_else(|| StoreError::NotFound {
                collection: T::NAME,
                id: id.clone(),
            })
    }

    /// Add a new document. Its id must not already exist.
    pub fn insert<T: Collection>(&self, doc: T) -> Result<T, StoreError> {
        self.modify::<T, _>(|file| {
            if file.position(doc.id()).is_some() {
                return Err(StoreError::Duplicate {
                    collection: T::NAME,
                    id: doc.id().clone(),
                });
            }
            file.documents.push(doc.clone());
            Ok(doc)
        })
    }

    /// Replace an existing document with the same id.
    pub fn put<T: Collection>(&self, doc: T) -> Result<T, StoreError> {
        self.modify::<T, _>(|file| {
            let i = file.position(doc.id()).ok_or_else(|| StoreError::NotFound {
                collection: T::NAME,
                id: doc.id().clone(),
            })?;
            file.documents[i] = doc.clone();
            Ok(doc)
        })
    }

    pub fn delete<T: Collection>(&self, id: &DocId) -> Result<T, StoreError> {
        self.modify::<T, _>(|file| {
            let i = file.position(id).ok_or_else(|| StoreError::NotFound {
                collection: T::NAME,
                id: id.clone(),
            })?;
            Ok(file.documents.remove(i))
        })
    }

    /// The single document of a singleton collection, if one was saved.
    pub fn singleton<T: Collection>(&self) -> Result<Option<T>, StoreError> {
        Ok(self.load::<T>()?.documents.into_iter().next())
    }

    /// Save the single document of a singleton collection.
    pub fn put_singleton<T: Collection>(&self, doc: T) -> Result<T, StoreError> {
        self.modify::<T, _>(|file| {
            file.documents = vec![doc.clone()];
            Ok(doc)
        })
    }

    fn load<T: Collection>(&self) -> Result<CollectionFile<T>, StoreError> {
        let path = self.collection_path(T::NAME);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(CollectionFile::empty()),
            Err(e) => return Err(e.into()),
        };
        let json = |source: serde_json::Error| StoreError::Json {
            collection: T::NAME,
            source,
        };

        // Check the version before the documents so a newer layout reports
        // as a version mismatch rather than a field error.
        let header: VersionHeader = serde_json::from_str(&content).map_err(json)?;
        if header.version != STORE_VERSION {
            return Err(StoreError::Version {
                collection: T::NAME,
                found: header.version,
            });
        }
        serde_json::from_str(&content).map_err(json)
    }

    fn save<T: Collection>(&self, file: &CollectionFile<T>) -> Result<(), StoreError> {
        let path = self.collection_path(T::NAME);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(file).map_err(|source| StoreError::Json {
            collection: T::NAME,
            source,
        })?;
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Load, modify and save one collection under the write lock. Nothing is
    /// written when `f` fails.
    fn modify<T, R>(
        &self,
        f: impl FnOnce(&mut CollectionFile<T>) -> Result<R, StoreError>,
    ) -> Result<R, StoreError>
    where
        T: Collection,
    {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut file = self.load::<T>()?;
        let result = f(&mut file)?;
        self.save(&file)?;
        tracing::debug!(collection = T::NAME, documents = file.documents.len(), "collection saved");
        Ok(result)
    }

    fn write_portfolio_ranks(&self, command: &ReorderCommand) -> Result<WriteOutcome, StoreError> {
        self.modify::<PortfolioItem, _>(|file| {
            if file.has_applied(&command.key) {
                return Ok(WriteOutcome::Duplicate);
            }
            for update in &command.ranks {
                let i = file
                    .position(&update.id)
                    .ok_or_else(|| StoreError::UnknownItem {
                        collection: PortfolioItem::NAME,
                        id: update.id.clone(),
                    })?;
                file.documents[i].order = update.rank;
            }
            file.remember(command.key.clone());
            Ok(WriteOutcome::Applied)
        })
    }

    fn write_gallery_ranks(
        &self,
        property_id: &DocId,
        command: &ReorderCommand,
    ) -> Result<WriteOutcome, StoreError> {
        self.modify::<Property, _>(|file| {
            if file.has_applied(&command.key) {
                return Ok(WriteOutcome::Duplicate);
            }
            let i = file
                .position(property_id)
                .ok_or_else(|| StoreError::NotFound {
                    collection: Property::NAME,
                    id: property_id.clone(),
                })?;
            let property = &mut file.documents[i];
            let known = property.gallery_ids();
            if let Some(stray) = command.order.iter().find(|id| !known.contains(id)) {
                return Err(StoreError::UnknownItem {
                    collection: Property::NAME,
                    id: stray.clone(),
                });
            }
            property.apply_gallery_order(&command.order);
            property.updated_at = Utc::now();
            file.remember(command.key.clone());
            Ok(WriteOutcome::Applied)
        })
    }
}

#[derive(Deserialize)]
struct VersionHeader {
    version: u32,
}

impl RankWriter for FileStore {
    type Error = StoreError;

    fn write_ranks(&self, command: &ReorderCommand) -> Result<WriteOutcome, StoreError> {
        match &command.scope {
            ReorderScope::Portfolio => self.write_portfolio_ranks(command),
            ReorderScope::Gallery { property_id } => {
                self.write_gallery_ranks(property_id, command)
            }
        }
    }
}
