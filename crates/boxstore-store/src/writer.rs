//! Building record stores.

use std::path::{Path, PathBuf};

use boxstore_core::{parse_annotation, RecordKey, RecordKind};
use redb::Database;

use crate::config::validate_range;
use crate::error::{DatasetError, Result};
use crate::source::{RecordSource, RECORDS};

/// Summary of a [`StoreWriter::copy_from`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackReport {
    pub records: usize,
    pub image_bytes: u64,
    pub annotation_bytes: u64,
}

/// Writes records into a new (or existing) redb store.
pub struct StoreWriter {
    db: Database,
    path: PathBuf,
}

impl StoreWriter {
    /// Create the store if needed and make sure the `records` table exists,
    /// so a freshly created store can be opened for reading right away.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let created = (|| -> std::result::Result<_, redb::Error> {
            let db = Database::create(path)?;
            let txn = db.begin_write()?;
            txn.open_table(RECORDS)?;
            txn.commit()?;
            Ok(db)
        })();

        let db = created.map_err(|source| DatasetError::StoreOpen {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Store one record's image and annotation bytes in a single transaction.
    ///
    /// The bytes are written as given; nothing is decoded.
    pub fn put_record(&self, index: usize, image: &[u8], annotation: &[u8]) -> Result<()> {
        let image_key = RecordKey::new(RecordKind::Image, index)?.to_bytes();
        let annotation_key = RecordKey::new(RecordKind::Annotation, index)?.to_bytes();
        self.put_raw_many(&[
            (image_key.as_slice(), image),
            (annotation_key.as_slice(), annotation),
        ])
    }

    /// Store arbitrary key/value pairs in a single transaction.
    pub fn put_raw_many(&self, entries: &[(&[u8], &[u8])]) -> Result<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(RECORDS)?;
            for (key, value) in entries {
                table.insert(*key, *value)?;
            }
        }
        txn.commit()?;
        Ok(())
    }

    /// Copy records `start..=end` from `source` into this store in one
    /// transaction. Annotations must parse as JSON objects; images are
    /// copied unchecked.
    pub fn copy_from<S>(&self, source: &S, start: usize, end: usize) -> Result<PackReport>
    where
        S: RecordSource + ?Sized,
    {
        validate_range(start, end)?;
        let mut report = PackReport::default();

        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(RECORDS)?;
            for index in start..=end {
                let image_key = RecordKey::new(RecordKind::Image, index)?;
                let annotation_key = RecordKey::new(RecordKind::Annotation, index)?;

                let image = source.require(&image_key)?;
                let annotation = source.require(&annotation_key)?;
                parse_annotation(&annotation).map_err(|err| DatasetError::Parse {
                    key: annotation_key.to_string(),
                    source: err,
                })?;

                table.insert(image_key.to_bytes().as_slice(), image.as_slice())?;
                table.insert(annotation_key.to_bytes().as_slice(), annotation.as_slice())?;

                report.records += 1;
                report.image_bytes += image.len() as u64;
                report.annotation_bytes += annotation.len() as u64;
            }
        }
        txn.commit()?;

        tracing::info!(
            path = %self.path.display(),
            records = report.records,
            image_bytes = report.image_bytes,
            "packed records"
        );
        Ok(report)
    }

    pub fn finish(self) {
        tracing::debug!(path = %self.path.display(), "closed store writer");
    }
}
