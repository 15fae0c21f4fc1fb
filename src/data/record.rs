//! Structured input/output records for element construction.
//!
//! Parsing the textual input grammar happens upstream; this layer sees a
//! keyword-value map. [`ElementEntity::initialize_from`] consumes the keys
//! listed in [`keys`] and [`ElementEntity::give_input_record`] re-emits them.
//!
//! [`ElementEntity::initialize_from`]: crate::element::ElementEntity::initialize_from
//! [`ElementEntity::give_input_record`]: crate::element::ElementEntity::give_input_record

use crate::geometry_error::GeometryError;
use std::collections::BTreeMap;

/// Keywords recognized by the element layer.
pub mod keys {
    pub const MATERIAL: &str = "mat";
    pub const CROSS_SECTION: &str = "crosssect";
    pub const NODES: &str = "nodes";
    pub const LOCAL_CS: &str = "lcs";
    pub const NIP: &str = "nip";
    pub const ACTIVITY_LTF: &str = "activityltf";
}

/// A single record value.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum RecordValue {
    Int(i64),
    Real(f64),
    IntList(Vec<i64>),
    RealList(Vec<f64>),
}

/// Keyword → value map describing one component.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InputRecord {
    /// Component keyword, e.g. the element type name.
    pub keyword: String,
    /// Component number.
    pub number: u64,
    fields: BTreeMap<String, RecordValue>,
}

impl InputRecord {
    pub fn new(keyword: impl Into<String>, number: u64) -> Self {
        Self {
            keyword: keyword.into(),
            number,
            fields: BTreeMap::new(),
        }
    }

    /// Insert or replace a field.
    pub fn set(&mut self, key: impl Into<String>, value: RecordValue) -> &mut Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Builder variant of [`InputRecord::set`].
    pub fn with(mut self, key: impl Into<String>, value: RecordValue) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&RecordValue> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Iterate fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RecordValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Optional integer field.
    pub fn optional_int(&self, key: &'static str) -> Result<Option<i64>, GeometryError> {
        match self.fields.get(key) {
            None => Ok(None),
            Some(RecordValue::Int(v)) => Ok(Some(*v)),
            Some(other) => Err(wrong_shape(key, "integer", other)),
        }
    }

    /// Mandatory integer field.
    pub fn required_int(&self, key: &'static str) -> Result<i64, GeometryError> {
        self.optional_int(key)?.ok_or_else(|| missing(key))
    }

    /// Mandatory non-negative index field.
    pub fn required_index(&self, key: &'static str) -> Result<usize, GeometryError> {
        let v = self.required_int(key)?;
        to_index(key, v)
    }

    /// Optional non-negative index field.
    pub fn optional_index(&self, key: &'static str) -> Result<Option<usize>, GeometryError> {
        self.optional_int(key)?.map(|v| to_index(key, v)).transpose()
    }

    /// Mandatory integer-list field.
    pub fn required_int_list(&self, key: &'static str) -> Result<&[i64], GeometryError> {
        match self.fields.get(key) {
            None => Err(missing(key)),
            Some(RecordValue::IntList(v)) => Ok(v),
            Some(other) => Err(wrong_shape(key, "integer list", other)),
        }
    }

    /// Optional real-list field; integer lists are widened.
    pub fn optional_real_list(&self, key: &'static str) -> Result<Option<Vec<f64>>, GeometryError> {
        match self.fields.get(key) {
            None => Ok(None),
            Some(RecordValue::RealList(v)) => Ok(Some(v.clone())),
            Some(RecordValue::IntList(v)) => Ok(Some(v.iter().map(|&x| x as f64).collect())),
            Some(other) => Err(wrong_shape(key, "real list", other)),
        }
    }
}

fn missing(key: &'static str) -> GeometryError {
    GeometryError::MalformedRecord {
        key,
        reason: "mandatory field missing".into(),
    }
}

fn wrong_shape(key: &'static str, expected: &str, found: &RecordValue) -> GeometryError {
    GeometryError::MalformedRecord {
        key,
        reason: format!("expected {expected}, found {found:?}"),
    }
}

fn to_index(key: &'static str, v: i64) -> Result<usize, GeometryError> {
    usize::try_from(v).map_err(|_| GeometryError::MalformedRecord {
        key,
        reason: format!("negative value {v}"),
    })
}
