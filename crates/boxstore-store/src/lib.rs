//! boxstore storage layer
//!
//! Reads detection samples out of an embedded redb store:
//!
//! ```text
//!   local index ──► store index ──► image_NNNNNN ──► decode/resize ──► [3, H, W] f32
//!                     (+start)   └► annotation_NNNNNN ──► JSON ──► boxes (N,4) f32
//!                                                              └► labels (N,) i64
//! ```
//!
//! - `source`: the `RecordSource` boundary (redb store, plain directory)
//! - `transform`: image decoding into tensors
//! - `dataset`: `StoreDataset` with `len` / `get`, and `load_sample`
//! - `writer`: building stores (`StoreWriter`)
//! - `config`: serde configs for datasets and transforms

pub mod config;
pub mod dataset;
pub mod error;
pub mod source;
pub mod transform;
pub mod writer;

pub use config::{DatasetConfig, ResizeFilter, TransformConfig};
pub use dataset::{load_sample, Sample, StoreDataset};
pub use error::{DatasetError, Result};
pub use source::{DirectorySource, KeyCensus, RecordSource, RedbStore, RECORDS};
pub use transform::ImageTransform;
pub use writer::{PackReport, StoreWriter};
