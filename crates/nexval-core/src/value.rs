//! # Typed Values
//!
//! Storage-level element types and the flattened value arrays held by
//! fields and attributes. Values are stored row-major; the shape lives on
//! the owning [`Field`](crate::Field).

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::error::TreeError;

/// Storage element type of a field or attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    Bool,
    Int,
    Uint,
    Float,
    Complex,
    String,
    Binary,
}

impl ElementType {
    /// Integer, unsigned, float, or complex.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::Uint | Self::Float | Self::Complex)
    }

    /// Lowercase name as used in tree documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Float => "float",
            Self::Complex => "complex",
            Self::String => "string",
            Self::Binary => "binary",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A flattened array of homogeneous elements.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(Vec<bool>),
    Int(Vec<i64>),
    Uint(Vec<u64>),
    Float(Vec<f64>),
    /// Complex numbers as `[re, im]` pairs.
    Complex(Vec<[f64; 2]>),
    Str(Vec<String>),
    Binary(Vec<u8>),
}

impl Value {
    /// Scalar string value.
    pub fn string(s: impl Into<String>) -> Self {
        Value::Str(vec![s.into()])
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            Value::Bool(_) => ElementType::Bool,
            Value::Int(_) => ElementType::Int,
            Value::Uint(_) => ElementType::Uint,
            Value::Float(_) => ElementType::Float,
            Value::Complex(_) => ElementType::Complex,
            Value::Str(_) => ElementType::String,
            Value::Binary(_) => ElementType::Binary,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Value::Bool(v) => v.len(),
            Value::Int(v) => v.len(),
            Value::Uint(v) => v.len(),
            Value::Float(v) => v.len(),
            Value::Complex(v) => v.len(),
            Value::Str(v) => v.len(),
            Value::Binary(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The single string element, if this is a one-element string value.
    pub fn as_scalar_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) if v.len() == 1 => Some(v[0].as_str()),
            _ => None,
        }
    }

    /// Integer elements widened to `i128`, for signed and unsigned values.
    pub fn as_integers(&self) -> Option<Vec<i128>> {
        match self {
            Value::Int(v) => Some(v.iter().map(|&x| i128::from(x)).collect()),
            Value::Uint(v) => Some(v.iter().map(|&x| i128::from(x)).collect()),
            Value::Binary(v) => Some(v.iter().map(|&x| i128::from(x)).collect()),
            _ => None,
        }
    }

    /// Every element rendered as text. Strings are returned verbatim;
    /// numbers use their shortest decimal form.
    pub fn render_elements(&self) -> Vec<String> {
        match self {
            Value::Bool(v) => v.iter().map(|b| b.to_string()).collect(),
            Value::Int(v) => v.iter().map(|x| x.to_string()).collect(),
            Value::Uint(v) => v.iter().map(|x| x.to_string()).collect(),
            Value::Float(v) => v.iter().map(|x| x.to_string()).collect(),
            Value::Complex(v) => v.iter().map(|[re, im]| format!("{re}{im:+}j")).collect(),
            Value::Str(v) => v.clone(),
            Value::Binary(v) => v.iter().map(|x| x.to_string()).collect(),
        }
    }

    /// Decode a (possibly nested) JSON array as elements of `dtype`,
    /// returning the flattened value and the shape implied by the nesting.
    pub fn from_json(dtype: ElementType, json: &Json, path: &str) -> Result<(Value, Vec<usize>), TreeError> {
        let mut leaves = Vec::new();
        let shape = flatten(json, &mut leaves, path, dtype)?;
        let invalid = |reason: String| TreeError::InvalidValue {
            path: path.to_string(),
            dtype: dtype.to_string(),
            reason,
        };

        let value = match dtype {
            ElementType::Bool => Value::Bool(
                leaves
                    .iter()
                    .map(|j| j.as_bool().ok_or_else(|| invalid(format!("{j} is not a boolean"))))
                    .collect::<Result<_, _>>()?,
            ),
            ElementType::Int => Value::Int(
                leaves
                    .iter()
                    .map(|j| j.as_i64().ok_or_else(|| invalid(format!("{j} is not a signed integer"))))
                    .collect::<Result<_, _>>()?,
            ),
            ElementType::Uint => Value::Uint(
                leaves
                    .iter()
                    .map(|j| j.as_u64().ok_or_else(|| invalid(format!("{j} is not an unsigned integer"))))
                    .collect::<Result<_, _>>()?,
            ),
            ElementType::Float => Value::Float(
                leaves
                    .iter()
                    .map(|j| j.as_f64().ok_or_else(|| invalid(format!("{j} is not a number"))))
                    .collect::<Result<_, _>>()?,
            ),
            ElementType::Complex => {
                // Complex elements are [re, im] pairs, so the innermost axis
                // belongs to the element rather than the shape.
                let mut leaves = Vec::new();
                let shape = flatten_complex(json, &mut leaves, path)?;
                return Ok((Value::Complex(leaves), shape));
            }
            ElementType::String => Value::Str(
                leaves
                    .iter()
                    .map(|j| {
                        j.as_str()
                            .map(str::to_string)
                            .ok_or_else(|| invalid(format!("{j} is not a string")))
                    })
                    .collect::<Result<_, _>>()?,
            ),
            ElementType::Binary => Value::Binary(
                leaves
                    .iter()
                    .map(|j| {
                        j.as_u64()
                            .and_then(|x| u8::try_from(x).ok())
                            .ok_or_else(|| invalid(format!("{j} is not a byte")))
                    })
                    .collect::<Result<_, _>>()?,
            ),
        };
        Ok((value, shape))
    }

    /// Infer a value from untyped JSON, as used for attributes.
    ///
    /// Arrays must be homogeneous; integer arrays containing any float are
    /// widened to float.
    pub fn infer_json(json: &Json, path: &str) -> Result<Value, TreeError> {
        let mut leaves = Vec::new();
        flatten(json, &mut leaves, path, ElementType::String)?;
        let invalid = |reason: &str| TreeError::InvalidValue {
            path: path.to_string(),
            dtype: "attribute".to_string(),
            reason: reason.to_string(),
        };

        if leaves.is_empty() {
            return Ok(Value::Str(Vec::new()));
        }
        if leaves.iter().all(|j| j.is_string()) {
            return Value::from_json(ElementType::String, json, path).map(|(v, _)| v);
        }
        if leaves.iter().all(|j| j.is_boolean()) {
            return Value::from_json(ElementType::Bool, json, path).map(|(v, _)| v);
        }
        if !leaves.iter().all(|j| j.is_number()) {
            return Err(invalid("attribute arrays must be homogeneous"));
        }
        if leaves.iter().all(|j| j.is_i64()) {
            return Value::from_json(ElementType::Int, json, path).map(|(v, _)| v);
        }
        if leaves.iter().all(|j| j.is_u64()) {
            return Value::from_json(ElementType::Uint, json, path).map(|(v, _)| v);
        }
        Value::from_json(ElementType::Float, json, path).map(|(v, _)| v)
    }
}

/// Collect leaves of a rectangular nested array, returning its shape.
fn flatten<'a>(
    json: &'a Json,
    out: &mut Vec<&'a Json>,
    path: &str,
    dtype: ElementType,
) -> Result<Vec<usize>, TreeError> {
    match json {
        Json::Array(items) => {
            let mut inner: Option<Vec<usize>> = None;
            for item in items {
                let shape = flatten(item, out, path, dtype)?;
                match &inner {
                    None => inner = Some(shape),
                    Some(first) if *first != shape => {
                        return Err(TreeError::InvalidValue {
                            path: path.to_string(),
                            dtype: dtype.to_string(),
                            reason: "nested arrays are not rectangular".to_string(),
                        })
                    }
                    Some(_) => {}
                }
            }
            let mut shape = vec![items.len()];
            shape.extend(inner.unwrap_or_default());
            Ok(shape)
        }
        leaf => {
            out.push(leaf);
            Ok(Vec::new())
        }
    }
}

fn flatten_complex(json: &Json, out: &mut Vec<[f64; 2]>, path: &str) -> Result<Vec<usize>, TreeError> {
    let invalid = |reason: &str| TreeError::InvalidValue {
        path: path.to_string(),
        dtype: ElementType::Complex.to_string(),
        reason: reason.to_string(),
    };
    match json {
        Json::Array(items) if items.len() == 2 && items.iter().all(Json::is_number) => {
            let re = items[0].as_f64().ok_or_else(|| invalid("real part is not a number"))?;
            let im = items[1].as_f64().ok_or_else(|| invalid("imaginary part is not a number"))?;
            out.push([re, im]);
            Ok(Vec::new())
        }
        Json::Array(items) => {
            let mut inner: Option<Vec<usize>> = None;
            for item in items {
                let shape = flatten_complex(item, out, path)?;
                match &inner {
                    None => inner = Some(shape),
                    Some(first) if *first != shape => {
                        return Err(invalid("nested arrays are not rectangular"))
                    }
                    Some(_) => {}
                }
            }
            let mut shape = vec![items.len()];
            shape.extend(inner.unwrap_or_default());
            Ok(shape)
        }
        _ => Err(invalid("complex elements must be [re, im] pairs")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_arrays_flatten_with_shape() {
        let (v, shape) = Value::from_json(ElementType::Int, &json!([[1, 2, 3], [4, 5, 6]]), "/d").unwrap();
        assert_eq!(shape, vec![2, 3]);
        assert_eq!(v, Value::Int(vec![1, 2, 3, 4, 5, 6]));
    }

    #[test]
    fn scalar_has_empty_shape() {
        let (v, shape) = Value::from_json(ElementType::String, &json!("NXmx"), "/d").unwrap();
        assert!(shape.is_empty());
        assert_eq!(v.as_scalar_str(), Some("NXmx"));
    }

    #[test]
    fn ragged_arrays_are_rejected() {
        let err = Value::from_json(ElementType::Int, &json!([[1, 2], [3]]), "/d").unwrap_err();
        assert!(matches!(err, TreeError::InvalidValue { .. }));
    }

    #[test]
    fn wrong_leaf_type_is_rejected() {
        let err = Value::from_json(ElementType::Uint, &json!([1, -2]), "/d").unwrap_err();
        assert!(err.to_string().contains("not an unsigned integer"));
    }

    #[test]
    fn complex_pairs_do_not_add_an_axis() {
        let (v, shape) = Value::from_json(ElementType::Complex, &json!([[1.0, 2.0], [3.0, -4.0]]), "/c").unwrap();
        assert_eq!(shape, vec![2]);
        assert_eq!(v.render_elements(), vec!["1+2j", "3-4j"]);
    }

    #[test]
    fn attribute_inference() {
        assert_eq!(Value::infer_json(&json!("mm"), "/a").unwrap(), Value::string("mm"));
        assert_eq!(Value::infer_json(&json!([0, 0, 1]), "/a").unwrap(), Value::Int(vec![0, 0, 1]));
        assert_eq!(
            Value::infer_json(&json!([0, 0.5, 1]), "/a").unwrap(),
            Value::Float(vec![0.0, 0.5, 1.0])
        );
        assert!(Value::infer_json(&json!(["a", 1]), "/a").is_err());
    }

    #[test]
    fn integers_widen_across_signedness() {
        assert_eq!(Value::Uint(vec![3]).as_integers(), Some(vec![3]));
        assert_eq!(Value::Int(vec![-3]).as_integers(), Some(vec![-3]));
        assert_eq!(Value::Float(vec![3.0]).as_integers(), None);
    }
}
