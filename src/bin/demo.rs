//! End-to-end walkthrough: declare a model, then create, fetch, update,
//! filter, and delete records against a file-backed database.

use anyhow::{Context, Result};
use litemodel::{Database, FieldAnnotation, Filters, Model, Schema, Value};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let db_path = std::env::temp_dir().join("litemodel-demo.db");
    let mut db = Database::open(&db_path);

    let users = Model::new(
        Schema::builder("User")
            .table("users")
            .field("name", FieldAnnotation::Text)
            .field("email", FieldAnnotation::Text)
            .field_with_default("age", FieldAnnotation::Integer, 18)
            .build(),
    )
    .with_validator(|record| match record.get("name") {
        Some(Value::Text(name)) if !name.is_empty() => Ok(()),
        _ => Err("name must be a non-empty string".to_string()),
    });

    users.create_table(&mut db)?;

    let mut alice = users.record_from_positional(vec![
        Value::from("Alice"),
        Value::from("alice@mail.com"),
        Value::from(25),
    ]);
    let alice_id = users.save(&mut db, &mut alice)?;
    println!("saved {alice}");

    let fetched = users
        .get(&mut db, alice_id)?
        .context("alice should exist")?;
    println!("fetched {} name={:?}", fetched, fetched.get("name"));

    let mut renamed = fetched;
    renamed.set("name", "Alice Smith")?;
    users.save(&mut db, &mut renamed)?;
    println!("renamed {renamed}");

    // Bob keeps the declared default age of 18.
    users.create(
        &mut db,
        &[
            ("name", Value::from("Bob")),
            ("email", Value::from("bob@mail.com")),
        ],
    )?;
    println!("total users: {}", users.all(&mut db)?.len());

    let adults = users.filter(&mut db, &Filters::new().with("age__gt", 18))?;
    println!("users older than 18: {}", adults.len());

    users.delete(&mut db, &mut renamed)?;
    println!(
        "after delete, get(alice) = {:?}",
        users.get(&mut db, alice_id)?.map(|r| r.to_string())
    );

    db.close()?;
    std::fs::remove_file(&db_path).ok();
    Ok(())
}
