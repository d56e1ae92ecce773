//! Schema metadata derived from record type declarations.
//!
//! A [`Schema`] is built exactly once through [`SchemaBuilder`] when a record
//! type is registered, and is immutable afterwards. Field order is
//! declaration order and fixes the column order of all generated SQL; the
//! implicit `id` column is always first and is not a declared field.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::value::{column_kind, FieldAnnotation, FieldKind, Value};

/// Storage metadata for one declared field. Immutable once derived.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    name: String,
    annotation: FieldAnnotation,
    kind: FieldKind,
    sql_type: &'static str,
    default: Option<Value>,
}

impl FieldDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn annotation(&self) -> &FieldAnnotation {
        &self.annotation
    }

    /// The scalar kind this field is stored as.
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// The SQLite column type for this field.
    pub fn sql_type(&self) -> &'static str {
        self.sql_type
    }

    /// Declared default, applied when a record is built without a value.
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// A raw field declaration, kept so subtypes can inherit it.
#[derive(Debug, Clone, PartialEq)]
struct DeclaredField {
    name: String,
    annotation: FieldAnnotation,
    default: Option<Value>,
}

/// Derived metadata for one record type.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    type_name: String,
    /// Resolved table name. `None` only for abstract types without an
    /// explicit override.
    table: Option<String>,
    abstract_: bool,
    declared: Vec<DeclaredField>,
    fields: Vec<FieldDescriptor>,
}

impl Schema {
    /// Start declaring a record type.
    pub fn builder(type_name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            type_name: type_name.into(),
            table: None,
            abstract_: None,
            declared: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Table name backing this type, if it can be persisted.
    pub fn table_name(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn is_abstract(&self) -> bool {
        self.abstract_
    }

    /// Persisted fields in declaration order, identity column excluded.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Look up a persisted field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Table name usable for SQL, or the abstract-model error.
    pub(crate) fn persistent_table(&self) -> Result<&str> {
        if self.abstract_ {
            return Err(Error::AbstractModel {
                model: self.type_name.clone(),
            });
        }
        self.table.as_deref().ok_or_else(|| Error::AbstractModel {
            model: self.type_name.clone(),
        })
    }

    /// SQL creating this type's table.
    ///
    /// The identity column is an auto-incrementing primary key and always
    /// comes first, followed by the declared fields in metadata order.
    pub fn create_table_sql(&self) -> Result<String> {
        let table = self.persistent_table()?;
        let mut columns = vec!["id INTEGER PRIMARY KEY AUTOINCREMENT".to_string()];
        for field in &self.fields {
            columns.push(format!("{} {}", field.name, field.sql_type));
        }
        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            table,
            columns.join(", ")
        ))
    }
}

/// Collects a record type's declaration and derives its [`Schema`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    type_name: String,
    table: Option<String>,
    abstract_: Option<bool>,
    declared: Vec<DeclaredField>,
}

impl SchemaBuilder {
    /// Override the table name. Defaults to the lowercase type name.
    pub fn table(mut self, name: impl Into<String>) -> Self {
        self.table = Some(name.into());
        self
    }

    /// Mark the type abstract: it derives no field metadata and can never
    /// be persisted.
    pub fn abstract_base(mut self) -> Self {
        self.abstract_ = Some(true);
        self
    }

    /// Explicitly mark the type concrete, overriding an inherited abstract
    /// setting.
    pub fn concrete(mut self) -> Self {
        self.abstract_ = Some(false);
        self
    }

    /// Declare a field. Re-declaring a name replaces its annotation in
    /// place, keeping the original position.
    pub fn field(self, name: impl Into<String>, annotation: FieldAnnotation) -> Self {
        self.declare(name.into(), annotation, None)
    }

    /// Declare a field with a default applied when a record is built
    /// without a value for it.
    pub fn field_with_default(
        self,
        name: impl Into<String>,
        annotation: FieldAnnotation,
        default: impl Into<Value>,
    ) -> Self {
        self.declare(name.into(), annotation, Some(default.into()))
    }

    fn declare(mut self, name: String, annotation: FieldAnnotation, default: Option<Value>) -> Self {
        match self.declared.iter_mut().find(|d| d.name == name) {
            Some(existing) => {
                existing.annotation = annotation;
                existing.default = default;
            }
            None => self.declared.push(DeclaredField {
                name,
                annotation,
                default,
            }),
        }
        self
    }

    /// Inherit from a parent type: its declared fields come first, and its
    /// table-name/abstractness settings apply unless overridden here.
    pub fn extends(mut self, parent: &Schema) -> Self {
        if self.table.is_none() {
            self.table = parent.table.clone();
        }
        if self.abstract_.is_none() && parent.abstract_ {
            self.abstract_ = Some(true);
        }
        let mut declared = parent.declared.clone();
        for field in std::mem::take(&mut self.declared) {
            match declared.iter_mut().find(|d| d.name == field.name) {
                Some(existing) => *existing = field,
                None => declared.push(field),
            }
        }
        self.declared = declared;
        self
    }

    /// Derive the immutable schema metadata.
    ///
    /// Skipped during derivation: the `id` field, names starting with the
    /// reserved `_` prefix, and declarations with no storage mapping. The
    /// latter are dropped silently so a declaration can carry
    /// non-persisted helper fields.
    pub fn build(self) -> Arc<Schema> {
        let abstract_ = self.abstract_.unwrap_or(false);
        let table = if abstract_ {
            self.table
        } else {
            Some(
                self.table
                    .unwrap_or_else(|| self.type_name.to_lowercase()),
            )
        };

        let mut fields = Vec::new();
        if !abstract_ {
            for decl in &self.declared {
                if decl.name == "id" || decl.name.starts_with('_') {
                    continue;
                }
                if let Some(kind) = column_kind(&decl.annotation) {
                    fields.push(FieldDescriptor {
                        name: decl.name.clone(),
                        annotation: decl.annotation.clone(),
                        kind,
                        sql_type: kind.sql_type(),
                        default: decl.default.clone(),
                    });
                }
            }
        }

        Arc::new(Schema {
            type_name: self.type_name,
            table,
            abstract_,
            declared: self.declared,
            fields,
        })
    }
}
