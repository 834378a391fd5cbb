//! The dataset index contract: `len()` samples, addressed by local index.

use boxstore_core::{parse_annotation, Identifier, RecordKey, RecordKind, Target};
use ndarray::Array3;

use crate::config::{validate_range, DatasetConfig, TransformConfig};
use crate::error::{DatasetError, Result};
use crate::source::{RecordSource, RedbStore};
use crate::transform::ImageTransform;

/// One training sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Identifier of the record this sample was read from.
    pub id: Identifier,
    /// `[3, H, W]`, values in `[0, 1]`.
    pub image: Array3<f32>,
    pub target: Target,
}

/// Load the record at store index `index`.
///
/// Both blobs are fetched (and their presence checked) before anything is
/// decoded. Any failure fails the whole sample.
pub fn load_sample<S>(source: &S, transform: &ImageTransform, index: usize) -> Result<Sample>
where
    S: RecordSource + ?Sized,
{
    let image_key = RecordKey::new(RecordKind::Image, index)?;
    let annotation_key = RecordKey::new(RecordKind::Annotation, index)?;

    let image_bytes = source.require(&image_key)?;
    let annotation_bytes = source.require(&annotation_key)?;

    let image = transform
        .apply(&image_bytes)
        .map_err(|source| DatasetError::Decode {
            key: image_key.to_string(),
            source,
        })?;

    let record = parse_annotation(&annotation_bytes).map_err(|source| DatasetError::Parse {
        key: annotation_key.to_string(),
        source,
    })?;
    let target = Target::from_annotation(&record).map_err(|source| DatasetError::Target {
        key: annotation_key.to_string(),
        source,
    })?;

    tracing::trace!(id = %image_key.id, objects = target.len(), "loaded sample");
    Ok(Sample {
        id: image_key.id,
        image,
        target,
    })
}

/// A contiguous, inclusive slice `start_index..=end_index` of a record
/// source, exposed as local indices `0..len()`.
pub struct StoreDataset<S = RedbStore> {
    source: S,
    transform: ImageTransform,
    start_index: usize,
    end_index: usize,
}

impl StoreDataset<RedbStore> {
    /// Open the store named by `config` and hold it until [`close`](Self::close).
    pub fn open(config: &DatasetConfig) -> Result<Self> {
        config.validate()?;
        let store = RedbStore::open(&config.store_path)?;
        let dataset = Self::with_source(
            store,
            config.start_index,
            config.end_index,
            config.transform.clone(),
        )?;
        tracing::debug!(
            path = %config.store_path.display(),
            start = config.start_index,
            end = config.end_index,
            "opened dataset"
        );
        Ok(dataset)
    }

    /// Release the store handle and its read transaction.
    pub fn close(self) {
        self.source.close();
    }
}

impl<S: RecordSource> StoreDataset<S> {
    pub fn with_source(
        source: S,
        start_index: usize,
        end_index: usize,
        transform: TransformConfig,
    ) -> Result<Self> {
        validate_range(start_index, end_index)?;
        Ok(Self {
            source,
            transform: ImageTransform::new(transform)?,
            start_index,
            end_index,
        })
    }

    pub fn len(&self) -> usize {
        self.end_index - self.start_index + 1
    }

    /// Always false: the range is inclusive and validated non-empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn start_index(&self) -> usize {
        self.start_index
    }

    pub fn end_index(&self) -> usize {
        self.end_index
    }

    pub fn transform(&self) -> &ImageTransform {
        &self.transform
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Sample at local index `local_index` (store index
    /// `local_index + start_index`).
    pub fn get(&self, local_index: usize) -> Result<Sample> {
        if local_index >= self.len() {
            return Err(DatasetError::IndexOutOfBounds {
                index: local_index,
                len: self.len(),
            });
        }
        load_sample(&self.source, &self.transform, local_index + self.start_index)
    }

    /// Every sample in local-index order. Failures are yielded, not skipped.
    pub fn iter(&self) -> impl Iterator<Item = Result<Sample>> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }
}
