//! Core value types and the mapping from declared field types to storage.
//!
//! A [`FieldAnnotation`] is what a caller declares for a field; a
//! [`FieldKind`] is the scalar kind that actually reaches storage. The
//! mapping between the two, plus the boolean integer codec, lives here.

use rusqlite::types::{self, ToSqlOutput, ValueRef};
use rusqlite::ToSql;
use serde::{Deserialize, Serialize};

/// Core value type for SQLite operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Boolean(bool),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Blob(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl From<types::Value> for Value {
    fn from(v: types::Value) -> Self {
        match v {
            types::Value::Null => Self::Null,
            types::Value::Integer(i) => Self::Integer(i),
            types::Value::Real(r) => Self::Real(r),
            types::Value::Text(s) => Self::Text(s),
            types::Value::Blob(b) => Self::Blob(b),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Null => ToSqlOutput::Owned(types::Value::Null),
            Self::Integer(i) => ToSqlOutput::Owned(types::Value::Integer(*i)),
            Self::Real(r) => ToSqlOutput::Owned(types::Value::Real(*r)),
            Self::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Self::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
            // Booleans are stored as integer 0/1.
            Self::Boolean(b) => ToSqlOutput::Owned(types::Value::Integer(i64::from(*b))),
        })
    }
}

/// A declared field type, as registered on a schema.
///
/// Only the scalar shapes (optionally wrapped in `Optional`) map to storage;
/// the remaining shapes exist so a declaration can carry fields that storage
/// cannot hold, which the schema deriver drops from persisted metadata.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldAnnotation {
    Text,
    Integer,
    Real,
    Boolean,
    /// Nullable wrapper; unwraps to the underlying type.
    Optional(Box<FieldAnnotation>),
    /// A nested record type, not representable as a column.
    Record(String),
    /// A union of alternatives. Only a degenerate single-alternative union
    /// maps to a column.
    Union(Vec<FieldAnnotation>),
}

/// The scalar kind of a persisted field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Real,
    Boolean,
}

impl FieldKind {
    /// The SQLite column type this kind is stored as.
    pub const fn sql_type(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Integer | Self::Boolean => "INTEGER",
            Self::Real => "REAL",
        }
    }

    /// Convert a field value to its storage representation.
    ///
    /// Booleans become integer 0/1; everything else, including `Null`,
    /// passes through unchanged.
    pub fn encode(self, value: Value) -> Value {
        match (self, value) {
            (Self::Boolean, Value::Boolean(b)) => Value::Integer(i64::from(b)),
            (_, value) => value,
        }
    }

    /// Convert a storage value back to its field representation.
    pub fn decode(self, value: Value) -> Value {
        match (self, value) {
            (Self::Boolean, Value::Integer(i)) => Value::Boolean(i != 0),
            (_, value) => value,
        }
    }
}

/// Map a declared annotation to the scalar kind it is stored as.
///
/// Returns `None` for annotations that have no storage mapping; the schema
/// deriver excludes such fields from persisted metadata.
pub fn column_kind(annotation: &FieldAnnotation) -> Option<FieldKind> {
    match annotation {
        FieldAnnotation::Text => Some(FieldKind::Text),
        FieldAnnotation::Integer => Some(FieldKind::Integer),
        FieldAnnotation::Real => Some(FieldKind::Real),
        FieldAnnotation::Boolean => Some(FieldKind::Boolean),
        FieldAnnotation::Optional(inner) => column_kind(inner),
        FieldAnnotation::Union(alternatives) if alternatives.len() == 1 => {
            column_kind(&alternatives[0])
        }
        FieldAnnotation::Record(_) | FieldAnnotation::Union(_) => None,
    }
}
