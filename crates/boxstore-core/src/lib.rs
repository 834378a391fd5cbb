//! boxstore core: record naming and annotation decoding
//!
//! A boxstore dataset is a flat key-value store holding two blobs per record:
//!
//! ```text
//!   image_000001       -> encoded image bytes (JPEG/PNG/...)
//!   annotation_000001  -> JSON object { "<object name>": { "bounding_box": [x, y, w, h],
//!                                                          "category_id": 5, ... }, ... }
//! ```
//!
//! This crate holds the pure pieces of that layout:
//!
//! - `keys`: index -> fixed-width identifier -> record key / file path
//! - `extract`: pulling one named field out of every object in an annotation
//! - `target`: turning extracted boxes and labels into `ndarray` tensors
//!
//! Nothing here touches storage or image codecs; see `boxstore-store`.

pub mod extract;
pub mod keys;
pub mod target;

pub use extract::{extract_attribute, parse_annotation, AnnotationRecord, ParseError};
pub use keys::{
    annotation_key, annotation_path, identifier_of, image_key, image_path, Identifier, KeyError,
    RecordKey, RecordKind, IDENTIFIER_WIDTH, MAX_RECORDS,
};
pub use target::{Target, TargetError, FIELD_BOUNDING_BOX, FIELD_CATEGORY_ID};
