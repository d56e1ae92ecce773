//! The model facade: create/get/all/filter/save/delete over one record type.
//!
//! A [`Model`] binds derived schema metadata to a record type and generates
//! all SQL from it; callers never write statements by hand. Every operation
//! takes the [`Database`] handle explicitly and requires a non-abstract
//! schema. Tables are created lazily before the first data operation, and
//! each write commits immediately.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::connection::Database;
use crate::error::{Error, Result};
use crate::query::Filters;
use crate::schema::Schema;
use crate::value::Value;

/// Non-declared construction values, handed back to the caller instead of
/// being merged into the record. Never persisted, never validated.
pub type Transients = BTreeMap<String, Value>;

/// Validation hook invoked before every insert and update.
pub type Validator = Box<dyn Fn(&Record) -> std::result::Result<(), String> + Send + Sync>;

/// One row of a model's table, owned by the caller.
///
/// Holds the identity (absent until persisted) and a value for every
/// declared field of its schema.
#[derive(Debug, Clone)]
pub struct Record {
    schema: Arc<Schema>,
    id: Option<i64>,
    values: BTreeMap<String, Value>,
}

impl Record {
    fn new(schema: Arc<Schema>) -> Self {
        let values = schema
            .fields()
            .iter()
            .map(|f| {
                let value = f.default().cloned().unwrap_or(Value::Null);
                (f.name().to_string(), value)
            })
            .collect();
        Self {
            schema,
            id: None,
            values,
        }
    }

    /// Identity assigned by storage, if the record has been persisted.
    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn set_id(&mut self, id: Option<i64>) {
        self.id = id;
    }

    /// Value of a declared field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Set a declared field. Non-declared names are rejected.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        if self.schema.field(field).is_none() {
            return Err(Error::UnknownField {
                field: field.to_string(),
                model: self.schema.type_name().to_string(),
            });
        }
        self.values.insert(field.to_string(), value.into());
        Ok(())
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.schema.type_name() == other.schema.type_name()
            && self.id == other.id
            && self.values == other.values
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "<{}(id={})>", self.schema.type_name(), id),
            None => write!(f, "<{}>", self.schema.type_name()),
        }
    }
}

/// Binds a schema and an optional validation hook into CRUD operations.
pub struct Model {
    schema: Arc<Schema>,
    validator: Option<Validator>,
}

impl Model {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            validator: None,
        }
    }

    /// Attach a validation hook, run before every insert and update. A
    /// rejection aborts the write with a validation error.
    pub fn with_validator(
        mut self,
        validator: impl Fn(&Record) -> std::result::Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.validator = Some(Box::new(validator));
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// A fresh record with declared defaults applied and every other field
    /// set to `Null`.
    pub fn record(&self) -> Record {
        Record::new(Arc::clone(&self.schema))
    }

    /// Build a record from positional values, assigned to declared fields
    /// in metadata order. Surplus values are ignored.
    pub fn record_from_positional(&self, values: impl IntoIterator<Item = Value>) -> Record {
        let mut record = self.record();
        for (field, value) in self.schema.fields().iter().zip(values) {
            record.values.insert(field.name().to_string(), value);
        }
        record
    }

    /// Build a record from named values.
    ///
    /// Declared names populate the record; an integer `id` entry sets the
    /// identity; everything else is returned in the [`Transients`]
    /// side-channel, owned by the caller and never persisted.
    pub fn record_from_named(
        &self,
        values: impl IntoIterator<Item = (String, Value)>,
    ) -> (Record, Transients) {
        let mut record = self.record();
        let mut transients = Transients::new();
        for (name, value) in values {
            if name == "id" {
                match value {
                    Value::Integer(id) => record.id = Some(id),
                    Value::Null => record.id = None,
                    other => {
                        transients.insert(name, other);
                    }
                }
            } else if self.schema.field(&name).is_some() {
                record.values.insert(name, value);
            } else {
                transients.insert(name, value);
            }
        }
        (record, transients)
    }

    /// Insert a new row from declared field values and return the
    /// populated record.
    pub fn create(&self, db: &mut Database, values: &[(&str, Value)]) -> Result<Record> {
        self.schema.persistent_table()?;
        let mut record = self.record();
        for (name, value) in values {
            record.set(name, value.clone())?;
        }
        self.save(db, &mut record)?;
        Ok(record)
    }

    /// Insert or update a record and return its id.
    ///
    /// A record without an identity is inserted and receives the generated
    /// id; one with an identity has every declared field updated on its
    /// row.
    pub fn save(&self, db: &mut Database, record: &mut Record) -> Result<i64> {
        let table = self.schema.persistent_table()?.to_string();
        self.validate(record)?;
        self.ensure_table(db)?;

        let columns: Vec<&str> = self.schema.fields().iter().map(|f| f.name()).collect();
        let params: Vec<Value> = self
            .schema
            .fields()
            .iter()
            .map(|f| {
                let value = record.values.get(f.name()).cloned().unwrap_or(Value::Null);
                f.kind().encode(value)
            })
            .collect();

        match record.id {
            None => {
                let placeholders = vec!["?"; columns.len()].join(", ");
                let sql = format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    table,
                    columns.join(", "),
                    placeholders
                );
                db.execute(&sql, &params)?;
                db.commit()?;
                let id = db.last_insert_rowid()?;
                record.id = Some(id);
                debug!(%table, id, "inserted record");
                Ok(id)
            }
            Some(id) => {
                let assignments: Vec<String> =
                    columns.iter().map(|c| format!("{c} = ?")).collect();
                let sql = format!(
                    "UPDATE {} SET {} WHERE id = ?",
                    table,
                    assignments.join(", ")
                );
                let mut params = params;
                params.push(Value::Integer(id));
                db.execute(&sql, &params)?;
                db.commit()?;
                debug!(%table, id, "updated record");
                Ok(id)
            }
        }
    }

    /// Fetch one record by id. Absence is `None`, not an error.
    pub fn get(&self, db: &mut Database, id: i64) -> Result<Option<Record>> {
        let table = self.schema.persistent_table()?.to_string();
        self.ensure_table(db)?;
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?",
            self.select_columns(),
            table
        );
        let mut rows = db.query(&sql, &[Value::Integer(id)])?;
        if rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.record_from_row(rows.remove(0))))
    }

    /// Fetch every row, in storage-native order.
    pub fn all(&self, db: &mut Database) -> Result<Vec<Record>> {
        let table = self.schema.persistent_table()?.to_string();
        self.ensure_table(db)?;
        let sql = format!("SELECT {} FROM {}", self.select_columns(), table);
        let rows = db.query(&sql, &[])?;
        Ok(rows.into_iter().map(|r| self.record_from_row(r)).collect())
    }

    /// Fetch the rows matching the given filter conditions.
    ///
    /// The predicate is translated and validated before any storage
    /// access; an unknown field or operator never reaches the engine.
    pub fn filter(&self, db: &mut Database, filters: &Filters) -> Result<Vec<Record>> {
        let table = self.schema.persistent_table()?.to_string();
        let (predicate, params) = filters.translate(&self.schema)?;
        self.ensure_table(db)?;
        let sql = format!(
            "SELECT {} FROM {} WHERE {}",
            self.select_columns(),
            table,
            predicate
        );
        let rows = db.query(&sql, &params)?;
        Ok(rows.into_iter().map(|r| self.record_from_row(r)).collect())
    }

    /// Delete a persisted record's row and clear its identity.
    pub fn delete(&self, db: &mut Database, record: &mut Record) -> Result<()> {
        let table = self.schema.persistent_table()?.to_string();
        let id = record.id.ok_or(Error::MissingId)?;
        self.ensure_table(db)?;
        let sql = format!("DELETE FROM {table} WHERE id = ?");
        db.execute(&sql, &[Value::Integer(id)])?;
        db.commit()?;
        record.id = None;
        debug!(%table, id, "deleted record");
        Ok(())
    }

    /// Create the model's table if it does not exist yet.
    pub fn create_table(&self, db: &mut Database) -> Result<()> {
        let table = self.schema.persistent_table()?.to_string();
        if self.table_exists(db, &table)? {
            return Ok(());
        }
        let sql = self.schema.create_table_sql()?;
        db.execute(&sql, &[])?;
        db.commit()?;
        debug!(%table, "created table");
        Ok(())
    }

    fn ensure_table(&self, db: &mut Database) -> Result<()> {
        self.create_table(db)
    }

    fn table_exists(&self, db: &mut Database, table: &str) -> Result<bool> {
        let rows = db.query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
            &[Value::Text(table.to_string())],
        )?;
        Ok(!rows.is_empty())
    }

    fn validate(&self, record: &Record) -> Result<()> {
        if let Some(validator) = &self.validator {
            validator(record).map_err(Error::Validation)?;
        }
        Ok(())
    }

    fn select_columns(&self) -> String {
        let mut columns = vec!["id"];
        columns.extend(self.schema.fields().iter().map(|f| f.name()));
        columns.join(", ")
    }

    /// Rebuild a record from a row shaped as `id, <fields in metadata
    /// order>`, decoding each value through the field's codec.
    fn record_from_row(&self, row: Vec<Value>) -> Record {
        let mut record = self.record();
        let mut cells = row.into_iter();
        record.id = match cells.next() {
            Some(Value::Integer(id)) => Some(id),
            _ => None,
        };
        for (field, value) in self.schema.fields().iter().zip(cells) {
            record
                .values
                .insert(field.name().to_string(), field.kind().decode(value));
        }
        record
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("schema", &self.schema)
            .field("has_validator", &self.validator.is_some())
            .finish()
    }
}
