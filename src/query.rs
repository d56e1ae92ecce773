//! Translation of keyed filter conditions into parameterized predicates.
//!
//! Filter keys follow the `field` / `field__operator` grammar. Each entry
//! becomes one `field <op> ?` clause; clauses are joined with `AND` in the
//! order the caller supplied them.

use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::value::Value;

/// Comparison operators supported in filter keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Exact,
    GreaterThan,
    LessThan,
    Like,
}

impl FilterOp {
    /// Parse an operator suffix such as `gt` or `like`.
    pub fn from_suffix(suffix: &str) -> Result<Self> {
        match suffix {
            "exact" => Ok(Self::Exact),
            "gt" => Ok(Self::GreaterThan),
            "lt" => Ok(Self::LessThan),
            "like" => Ok(Self::Like),
            other => Err(Error::UnsupportedOperator(other.to_string())),
        }
    }

    /// The SQL comparison symbol for this operator.
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Exact => "=",
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::Like => "LIKE",
        }
    }
}

/// Split a filter key into its field name and operator.
///
/// The key is split on its last `__`. A recognized suffix yields that
/// operator; otherwise the whole key, suffix included, is the field name
/// under `Exact`.
pub fn parse_filter_key(key: &str) -> (&str, FilterOp) {
    if let Some((field, suffix)) = key.rsplit_once("__") {
        if let Ok(op) = FilterOp::from_suffix(suffix) {
            return (field, op);
        }
    }
    (key, FilterOp::Exact)
}

/// An ordered set of filter conditions for one query call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters {
    entries: Vec<(String, Value)>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(key, value);
        self
    }

    /// Add a condition in place.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.push((key.into(), value.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Build the WHERE predicate and its parameter list.
    ///
    /// Every parsed field must be a persisted field of `schema` or the
    /// identity column; validation happens here, before any SQL executes.
    /// An empty set yields a predicate matching all rows.
    pub(crate) fn translate(&self, schema: &Schema) -> Result<(String, Vec<Value>)> {
        let mut clauses = Vec::with_capacity(self.entries.len());
        let mut params = Vec::with_capacity(self.entries.len());

        for (key, value) in &self.entries {
            let (field, op) = parse_filter_key(key);
            if field != "id" && schema.field(field).is_none() {
                return Err(Error::UnknownField {
                    field: field.to_string(),
                    model: schema.type_name().to_string(),
                });
            }
            clauses.push(format!("{} {} ?", field, op.symbol()));
            params.push(value.clone());
        }

        if clauses.is_empty() {
            Ok(("1=1".to_string(), params))
        } else {
            Ok((clauses.join(" AND "), params))
        }
    }
}
