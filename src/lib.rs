//! A minimal model/record mapping layer over SQLite.
//!
//! # Intention
//!
//! - Declare a record type once and get create/get/all/filter/save/delete
//!   without hand-writing SQL.
//! - Encapsulate SQLite-specific types, value conversion, and error
//!   handling behind derived schema metadata.
//!
//! # Architectural Boundaries
//!
//! - Only schema metadata, value conversion, query translation, and the
//!   connection wrapper belong here.
//! - No migrations, no relations, no pooling; persistence semantics are
//!   whatever SQLite provides natively.

pub mod connection;
pub mod error;
pub mod model;
pub mod query;
pub mod schema;
pub mod value;

pub use connection::{Database, DatabaseOptions};
pub use error::{Error, Result};
pub use model::{Model, Record, Transients, Validator};
pub use query::{parse_filter_key, FilterOp, Filters};
pub use schema::{FieldDescriptor, Schema, SchemaBuilder};
pub use value::{column_kind, FieldAnnotation, FieldKind, Value};
