//! Where record blobs come from.
//!
//! The primary source is a redb database with one `records` table mapping
//! raw key bytes (`image_000001`, `annotation_000001`, ...) to raw value
//! bytes. A plain directory of `{id}.jpg` / `{id}.json` files is supported as
//! an alternate source with the same lookup contract.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use boxstore_core::{Identifier, RecordKey, RecordKind};
use redb::{Database, ReadOnlyTable, ReadTransaction, ReadableTable, TableDefinition};
use serde::Serialize;

use crate::error::{DatasetError, Result};

/// The single table every boxstore database carries.
pub const RECORDS: TableDefinition<'static, &'static [u8], &'static [u8]> =
    TableDefinition::new("records");

/// Lookup of raw record blobs by key.
pub trait RecordSource {
    /// `Ok(None)` when the key is simply absent.
    fn fetch(&self, key: &RecordKey) -> Result<Option<Vec<u8>>>;

    /// Like [`fetch`](Self::fetch), but absence is `KeyNotFound`.
    fn require(&self, key: &RecordKey) -> Result<Vec<u8>> {
        self.fetch(key)?.ok_or_else(|| DatasetError::KeyNotFound {
            key: key.to_string(),
        })
    }
}

// ============================================================================
// redb
// ============================================================================

/// A redb database held open with one long-lived read transaction.
///
/// The database, its read transaction and the table handle are acquired
/// together in [`open`](Self::open) and released together on
/// [`close`](Self::close) or drop. Fields drop in declaration order, so the
/// table goes first and the database last.
///
/// redb locks the file, so a process opens a given store once; further
/// readers over the same file come from [`reader`](Self::reader).
pub struct RedbStore {
    table: ReadOnlyTable<&'static [u8], &'static [u8]>,
    txn: ReadTransaction,
    db: Arc<Database>,
    path: PathBuf,
}

impl RedbStore {
    /// Open an existing store. Any failure here is fatal for the dataset.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let opened = (|| -> std::result::Result<_, redb::Error> {
            let db = Arc::new(Database::open(path)?);
            let (txn, table) = Self::begin(&db)?;
            Ok((db, txn, table))
        })();

        let (db, txn, table) = opened.map_err(|source| DatasetError::StoreOpen {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "opened record store");

        Ok(Self {
            table,
            txn,
            db,
            path: path.to_path_buf(),
        })
    }

    /// A second reader over the same database, with its own read
    /// transaction. The database closes once every reader is closed.
    pub fn reader(&self) -> Result<Self> {
        let (txn, table) = Self::begin(&self.db)?;
        Ok(Self {
            table,
            txn,
            db: Arc::clone(&self.db),
            path: self.path.clone(),
        })
    }

    fn begin(
        db: &Database,
    ) -> std::result::Result<(ReadTransaction, ReadOnlyTable<&'static [u8], &'static [u8]>), redb::Error>
    {
        let txn = db.begin_read()?;
        let table = txn.open_table(RECORDS)?;
        Ok((txn, table))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the table, the read transaction and the database, in that
    /// order.
    pub fn close(self) {
        let Self {
            table,
            txn,
            db,
            path,
        } = self;
        drop(table);
        drop(txn);
        drop(db);
        tracing::debug!(path = %path.display(), "closed record store");
    }

    /// Walk every key in the store and tally it by record kind.
    pub fn census(&self) -> Result<KeyCensus> {
        let mut census = KeyCensus::default();
        let mut pairs: BTreeMap<Identifier, (bool, bool)> = BTreeMap::new();

        for entry in self.table.iter()? {
            let (key, _) = entry?;
            let raw = key.value();
            let Some(parsed) = RecordKey::parse(raw) else {
                let shown = String::from_utf8_lossy(raw).into_owned();
                tracing::warn!(key = %shown, "unrecognised key in record store");
                census.unrecognized.push(shown);
                continue;
            };
            let slot = pairs.entry(parsed.id).or_default();
            match parsed.kind {
                RecordKind::Image => {
                    census.images += 1;
                    slot.0 = true;
                }
                RecordKind::Annotation => {
                    census.annotations += 1;
                    slot.1 = true;
                }
            }
        }

        census.index_span = pairs
            .keys()
            .next()
            .zip(pairs.keys().next_back())
            .map(|(first, last)| (first.index(), last.index()));
        census.unpaired = pairs
            .into_iter()
            .filter(|(_, (image, annotation))| !(*image && *annotation))
            .map(|(id, _)| id.to_string())
            .collect();

        Ok(census)
    }
}

impl RecordSource for RedbStore {
    fn fetch(&self, key: &RecordKey) -> Result<Option<Vec<u8>>> {
        let raw = key.to_bytes();
        Ok(self
            .table
            .get(raw.as_slice())?
            .map(|value| value.value().to_vec()))
    }
}

/// Key tally over a whole store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeyCensus {
    pub images: usize,
    pub annotations: usize,
    /// Smallest and largest record index seen, if any.
    pub index_span: Option<(usize, usize)>,
    /// Identifiers with an image but no annotation, or the reverse.
    pub unpaired: Vec<String>,
    /// Keys that are not `{kind}_{6 digits}`.
    pub unrecognized: Vec<String>,
}

// ============================================================================
// Directory
// ============================================================================

/// Records stored as `{base_dir}{id}.jpg` and `{base_dir}{id}.json`.
///
/// `base_dir` is prefixed verbatim, so it needs its own trailing separator.
/// It is kept as an OS path, so non-UTF-8 directories resolve as given.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    base_dir: PathBuf,
}

impl DirectorySource {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Build from a directory path, adding the trailing separator.
    pub fn from_dir(dir: &Path) -> Self {
        // Joining an empty component appends the separator when missing.
        Self {
            base_dir: dir.join(""),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Where `key` lives under this source.
    pub fn record_path(&self, key: &RecordKey) -> PathBuf {
        let mut path = self.base_dir.clone().into_os_string();
        path.push(key.file_name());
        PathBuf::from(path)
    }
}

impl RecordSource for DirectorySource {
    fn fetch(&self, key: &RecordKey) -> Result<Option<Vec<u8>>> {
        let path = self.record_path(key);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(DatasetError::Io { path, source }),
        }
    }
}
