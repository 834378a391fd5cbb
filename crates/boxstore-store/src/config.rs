//! Dataset and transform configuration.
//!
//! Both structs are plain serde types so a dataset can be described by a JSON
//! file and reopened elsewhere. Each dataset owns its own `TransformConfig`;
//! two datasets with different resolutions never share state.

use std::path::{Path, PathBuf};

use boxstore_core::MAX_RECORDS;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use crate::error::{DatasetError, Result};

/// Resampling filter used when resizing to the target resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeFilter {
    Nearest,
    /// Bilinear.
    #[default]
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Decode-time image transform: resize to `width` x `height`, then scale to
/// a channel-first `[0, 1]` tensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    pub width: u32,
    pub height: u32,
    pub filter: ResizeFilter,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 800,
            filter: ResizeFilter::Triangle,
        }
    }
}

/// Where a dataset lives and which slice of it to expose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Path to the redb store.
    pub store_path: PathBuf,
    /// First store index exposed as local index 0 (inclusive).
    pub start_index: usize,
    /// Last store index exposed (inclusive).
    pub end_index: usize,
    #[serde(default)]
    pub transform: TransformConfig,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("./dataset.redb"),
            start_index: 0,
            end_index: 0,
            transform: TransformConfig::default(),
        }
    }
}

impl DatasetConfig {
    pub fn new(store_path: impl Into<PathBuf>, start_index: usize, end_index: usize) -> Self {
        Self {
            store_path: store_path.into(),
            start_index,
            end_index,
            transform: TransformConfig::default(),
        }
    }

    pub fn with_transform(mut self, transform: TransformConfig) -> Self {
        self.transform = transform;
        self
    }

    /// Load a config from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| DatasetError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<()> {
        validate_range(self.start_index, self.end_index)?;
        validate_transform(&self.transform)
    }
}

/// Inclusive `start..=end` must be non-empty and nameable by the key codec.
pub(crate) fn validate_range(start: usize, end: usize) -> Result<()> {
    let invalid = |reason: &'static str| DatasetError::InvalidRange { start, end, reason };
    if start > end {
        return Err(invalid("start index is past end index"));
    }
    if end >= MAX_RECORDS {
        return Err(invalid("end index has no 6-digit identifier"));
    }
    Ok(())
}

pub(crate) fn validate_transform(config: &TransformConfig) -> Result<()> {
    if config.width == 0 || config.height == 0 {
        return Err(DatasetError::InvalidTransform {
            width: config.width,
            height: config.height,
        });
    }
    Ok(())
}
