//! Detection targets: bounding boxes and category labels as tensors.

use ndarray::{Array1, Array2};
use serde_json::Value;
use thiserror::Error;

use crate::extract::{extract_attribute, json_kind, AnnotationRecord};

pub const FIELD_BOUNDING_BOX: &str = "bounding_box";
pub const FIELD_CATEGORY_ID: &str = "category_id";

/// Coordinates per bounding box (`[x, y, w, h]`).
pub const BOX_COORDS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    /// Extraction returned Absent: some object carried `null` for the field.
    #[error("annotation field `{field}` is null in at least one object")]
    AttributeMissing { field: &'static str },
    #[error("annotation field `{field}` at position {position}: {reason}")]
    InvalidAttribute {
        field: &'static str,
        position: usize,
        reason: String,
    },
    #[error("annotation has {boxes} bounding boxes but {labels} labels")]
    ShapeMismatch { boxes: usize, labels: usize },
}

/// Training target for one image.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    /// Shape `(N, 4)`.
    pub boxes: Array2<f32>,
    /// Shape `(N,)`.
    pub labels: Array1<i64>,
}

impl Target {
    /// Extract `bounding_box` and `category_id` from every object in the
    /// annotation and pack them into arrays with matching lengths.
    pub fn from_annotation(record: &AnnotationRecord) -> Result<Self, TargetError> {
        let boxes = extract_attribute(record, FIELD_BOUNDING_BOX).ok_or(
            TargetError::AttributeMissing {
                field: FIELD_BOUNDING_BOX,
            },
        )?;
        let labels = extract_attribute(record, FIELD_CATEGORY_ID).ok_or(
            TargetError::AttributeMissing {
                field: FIELD_CATEGORY_ID,
            },
        )?;
        Self::from_values(&boxes, &labels)
    }

    pub fn from_values(boxes: &[&Value], labels: &[&Value]) -> Result<Self, TargetError> {
        let boxes = boxes_to_array(boxes)?;
        let labels = labels_to_array(labels)?;
        if boxes.nrows() != labels.len() {
            return Err(TargetError::ShapeMismatch {
                boxes: boxes.nrows(),
                labels: labels.len(),
            });
        }
        Ok(Self { boxes, labels })
    }

    /// Number of annotated objects.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

fn boxes_to_array(values: &[&Value]) -> Result<Array2<f32>, TargetError> {
    let mut boxes = Array2::<f32>::zeros((values.len(), BOX_COORDS));

    for (position, value) in values.iter().enumerate() {
        let invalid = |reason: String| TargetError::InvalidAttribute {
            field: FIELD_BOUNDING_BOX,
            position,
            reason,
        };
        let coords = value.as_array().ok_or_else(|| {
            invalid(format!(
                "expected an array of {BOX_COORDS} numbers, found {}",
                json_kind(value)
            ))
        })?;
        if coords.len() != BOX_COORDS {
            return Err(invalid(format!(
                "expected {BOX_COORDS} coordinates, found {}",
                coords.len()
            )));
        }
        for (axis, coord) in coords.iter().enumerate() {
            let number = coord.as_f64().ok_or_else(|| {
                invalid(format!("coordinate {axis} is a {}", json_kind(coord)))
            })?;
            boxes[[position, axis]] = number as f32;
        }
    }

    Ok(boxes)
}

fn labels_to_array(values: &[&Value]) -> Result<Array1<i64>, TargetError> {
    values
        .iter()
        .enumerate()
        .map(|(position, value)| {
            integral(value).ok_or_else(|| TargetError::InvalidAttribute {
                field: FIELD_CATEGORY_ID,
                position,
                reason: format!("expected an integer, found {value}"),
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Array1::from)
}

/// Integers, and floats with no fractional part (`5.0`), fit a label.
fn integral(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    (f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64).then_some(f as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use serde_json::json;

    fn record(value: Value) -> AnnotationRecord {
        value.as_object().cloned().expect("object")
    }

    #[test]
    fn single_object() {
        let anno = record(json!({"obj1": {"bounding_box": [10, 20, 30, 40], "category_id": 5}}));
        let target = Target::from_annotation(&anno).unwrap();
        assert_eq!(target.boxes, array![[10.0f32, 20.0, 30.0, 40.0]]);
        assert_eq!(target.labels, array![5i64]);
        assert_eq!(target.len(), 1);
    }

    #[test]
    fn empty_annotation_gives_empty_arrays() {
        let target = Target::from_annotation(&record(json!({"meta": {"source": "cam"}}))).unwrap();
        assert!(target.is_empty());
        assert_eq!(target.boxes.shape(), &[0, BOX_COORDS]);
        assert_eq!(target.labels.shape(), &[0]);
    }

    #[test]
    fn null_label_is_attribute_missing() {
        let anno = record(json!({
            "a": {"bounding_box": [0, 0, 1, 1], "category_id": 1},
            "b": {"bounding_box": [0, 0, 2, 2], "category_id": null},
        }));
        assert_eq!(
            Target::from_annotation(&anno),
            Err(TargetError::AttributeMissing {
                field: FIELD_CATEGORY_ID
            })
        );
    }

    #[test]
    fn null_box_is_reported_first() {
        let anno = record(json!({"a": {"bounding_box": null, "category_id": null}}));
        assert_eq!(
            Target::from_annotation(&anno),
            Err(TargetError::AttributeMissing {
                field: FIELD_BOUNDING_BOX
            })
        );
    }

    #[test]
    fn count_mismatch_is_rejected() {
        let anno = record(json!({
            "a": {"bounding_box": [0, 0, 1, 1], "category_id": 1},
            "b": {"bounding_box": [0, 0, 2, 2]},
        }));
        assert_eq!(
            Target::from_annotation(&anno),
            Err(TargetError::ShapeMismatch { boxes: 2, labels: 1 })
        );
    }

    #[test]
    fn malformed_boxes_are_rejected() {
        for bad in [json!([1, 2, 3]), json!("0,0,1,1"), json!([1, 2, "3", 4])] {
            let anno = record(json!({"a": {"bounding_box": bad, "category_id": 1}}));
            assert!(matches!(
                Target::from_annotation(&anno),
                Err(TargetError::InvalidAttribute {
                    field: FIELD_BOUNDING_BOX,
                    position: 0,
                    ..
                })
            ));
        }
    }

    #[test]
    fn labels_accept_integral_floats_only() {
        let ok = Target::from_values(&[&json!([0, 0, 1, 1])], &[&json!(7.0)]).unwrap();
        assert_eq!(ok.labels, array![7i64]);

        for bad in [json!(7.5), json!("7"), json!(true), json!([7])] {
            assert!(matches!(
                Target::from_values(&[&json!([0, 0, 1, 1])], &[&bad]),
                Err(TargetError::InvalidAttribute {
                    field: FIELD_CATEGORY_ID,
                    ..
                })
            ));
        }
    }

    #[test]
    fn fractional_coordinates_survive() {
        let target = Target::from_values(&[&json!([0.5, 1.25, 2, 3])], &[&json!(2)]).unwrap();
        assert_eq!(target.boxes.row(0).to_vec(), vec![0.5f32, 1.25, 2.0, 3.0]);
    }
}
