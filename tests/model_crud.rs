use litemodel::{Database, Error, FieldAnnotation, Filters, Model, Schema, Value};
use tempfile::NamedTempFile;

fn users_model() -> Model {
    Model::new(
        Schema::builder("User")
            .table("users")
            .field("name", FieldAnnotation::Text)
            .field("email", FieldAnnotation::Text)
            .field_with_default("age", FieldAnnotation::Integer, 18)
            .build(),
    )
}

#[test]
fn test_scenario_end_to_end() {
    let file = NamedTempFile::new().unwrap();
    let mut db = Database::open(file.path());
    let users = users_model();

    let mut alice = users
        .create(
            &mut db,
            &[
                ("name", "Alice".into()),
                ("email", "alice@mail.com".into()),
                ("age", 25.into()),
            ],
        )
        .unwrap();
    let bob = users
        .create(
            &mut db,
            &[("name", "Bob".into()), ("email", "bob@mail.com".into())],
        )
        .unwrap();

    // Bob keeps the declared default.
    assert_eq!(bob.get("age"), Some(&Value::Integer(18)));

    let adults = users
        .filter(&mut db, &Filters::new().with("age__gt", 18))
        .unwrap();
    assert_eq!(adults.len(), 1);
    assert_eq!(adults[0].get("name"), Some(&Value::Text("Alice".into())));

    let alice_id = alice.id().unwrap();
    users.delete(&mut db, &mut alice).unwrap();
    assert_eq!(alice.id(), None);
    assert!(users.get(&mut db, alice_id).unwrap().is_none());

    let remaining = users.all(&mut db).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(
        remaining[0].get("name"),
        Some(&Value::Text("Bob".into()))
    );
}

#[test]
fn test_save_then_fetch_is_field_for_field_equal() {
    let mut db = Database::in_memory();
    let users = users_model();

    let mut record = users.record_from_positional(vec![
        Value::from("Alice"),
        Value::from("alice@mail.com"),
        Value::from(25),
    ]);
    let id = users.save(&mut db, &mut record).unwrap();
    assert_eq!(record.id(), Some(id));

    let fetched = users.get(&mut db, id).unwrap().unwrap();
    assert_eq!(fetched, record);
}

#[test]
fn test_update_preserves_identity_and_persists_the_change() {
    let mut db = Database::in_memory();
    let users = users_model();

    let mut record = users
        .create(
            &mut db,
            &[
                ("name", "Alice".into()),
                ("email", "alice@mail.com".into()),
            ],
        )
        .unwrap();
    let id = record.id().unwrap();

    record.set("name", "Alice Smith").unwrap();
    let saved_id = users.save(&mut db, &mut record).unwrap();
    assert_eq!(saved_id, id);

    let fetched = users.get(&mut db, id).unwrap().unwrap();
    assert_eq!(
        fetched.get("name"),
        Some(&Value::Text("Alice Smith".into()))
    );
    assert_eq!(users.all(&mut db).unwrap().len(), 1);
}

#[test]
fn test_get_missing_row_is_absence_not_an_error() {
    let mut db = Database::in_memory();
    let users = users_model();
    assert!(users.get(&mut db, 999).unwrap().is_none());
}

#[test]
fn test_filter_with_no_conditions_matches_all() {
    let mut db = Database::in_memory();
    let users = users_model();
    for (name, age) in [("Alice", 25), ("Bob", 17), ("Cara", 40)] {
        users
            .create(
                &mut db,
                &[("name", name.into()), ("age", age.into())],
            )
            .unwrap();
    }

    let filtered = users.filter(&mut db, &Filters::new()).unwrap();
    let all = users.all(&mut db).unwrap();
    assert_eq!(filtered, all);
    assert_eq!(filtered.len(), 3);
}

#[test]
fn test_filter_operator_semantics() {
    let mut db = Database::in_memory();
    let users = users_model();
    for (name, age) in [("Alice", 25), ("Bob", 17), ("Cara", 40)] {
        users
            .create(
                &mut db,
                &[("name", name.into()), ("age", age.into())],
            )
            .unwrap();
    }

    let names = |records: Vec<litemodel::Record>| -> Vec<String> {
        records
            .iter()
            .map(|r| match r.get("name") {
                Some(Value::Text(name)) => name.clone(),
                other => panic!("unexpected name value: {other:?}"),
            })
            .collect()
    };

    let gt = users
        .filter(&mut db, &Filters::new().with("age__gt", 25))
        .unwrap();
    assert_eq!(names(gt), ["Cara"]);

    let lt = users
        .filter(&mut db, &Filters::new().with("age__lt", 25))
        .unwrap();
    assert_eq!(names(lt), ["Bob"]);

    let exact = users
        .filter(&mut db, &Filters::new().with("age", 25))
        .unwrap();
    assert_eq!(names(exact), ["Alice"]);

    let explicit_exact = users
        .filter(&mut db, &Filters::new().with("age__exact", 25))
        .unwrap();
    assert_eq!(names(explicit_exact), ["Alice"]);

    let like = users
        .filter(&mut db, &Filters::new().with("name__like", "%li%"))
        .unwrap();
    assert_eq!(names(like), ["Alice"]);

    let combined = users
        .filter(
            &mut db,
            &Filters::new().with("age__gt", 16).with("age__lt", 26),
        )
        .unwrap();
    assert_eq!(names(combined), ["Alice", "Bob"]);
}

#[test]
fn test_unknown_filter_field_fails_before_touching_storage() {
    // A handle whose path can never open: any storage access would surface
    // a storage error instead of the translation error.
    let mut db = Database::open("/nonexistent-litemodel-dir/unreachable.db");
    let users = users_model();

    let err = users
        .filter(&mut db, &Filters::new().with("height__gt", 180))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::UnknownField { field, model } if field == "height" && model == "User"
    ));
    assert!(!db.is_open());

    // Sanity check: a valid filter on the same handle does reach storage.
    let err = users
        .filter(&mut db, &Filters::new().with("age__gt", 18))
        .unwrap_err();
    assert!(matches!(err, Error::Storage(_)));
}

#[test]
fn test_abstract_model_cannot_be_persisted() {
    let mut db = Database::in_memory();
    let base = Model::new(
        Schema::builder("Base")
            .abstract_base()
            .field("name", FieldAnnotation::Text)
            .build(),
    );

    let err = base.all(&mut db).unwrap_err();
    assert!(matches!(err, Error::AbstractModel { model } if model == "Base"));
    let err = base.create(&mut db, &[]).unwrap_err();
    assert!(matches!(err, Error::AbstractModel { .. }));
    let err = base.create_table(&mut db).unwrap_err();
    assert!(matches!(err, Error::AbstractModel { .. }));
}

#[test]
fn test_validation_hook_aborts_the_write() {
    let mut db = Database::in_memory();
    let users = users_model().with_validator(|record| match record.get("name") {
        Some(Value::Text(name)) if !name.is_empty() => Ok(()),
        _ => Err("name must be a non-empty string".to_string()),
    });

    let err = users
        .create(&mut db, &[("email", "x@mail.com".into())])
        .unwrap_err();
    assert!(matches!(err, Error::Validation(reason) if reason.contains("name")));
    assert!(users.all(&mut db).unwrap().is_empty());

    users
        .create(
            &mut db,
            &[("name", "Alice".into()), ("email", "alice@mail.com".into())],
        )
        .unwrap();
    assert_eq!(users.all(&mut db).unwrap().len(), 1);
}

#[test]
fn test_delete_without_id_is_a_usage_error() {
    let mut db = Database::in_memory();
    let users = users_model();
    let mut record = users.record();
    let err = users.delete(&mut db, &mut record).unwrap_err();
    assert!(matches!(err, Error::MissingId));
}

#[test]
fn test_create_rejects_non_declared_fields() {
    let mut db = Database::in_memory();
    let users = users_model();
    let err = users
        .create(
            &mut db,
            &[("name", "Alice".into()), ("nickname", "Al".into())],
        )
        .unwrap_err();
    assert!(matches!(err, Error::UnknownField { field, .. } if field == "nickname"));
}

#[test]
fn test_transients_are_not_persisted() {
    let mut db = Database::in_memory();
    let users = users_model();

    let (mut record, transients) = users.record_from_named(vec![
        ("name".to_string(), Value::Text("Alice".into())),
        ("email".to_string(), Value::Text("alice@mail.com".into())),
        ("session_token".to_string(), Value::Text("abc123".into())),
    ]);
    assert_eq!(
        transients.get("session_token"),
        Some(&Value::Text("abc123".into()))
    );

    let id = users.save(&mut db, &mut record).unwrap();
    let fetched = users.get(&mut db, id).unwrap().unwrap();
    assert_eq!(fetched.get("session_token"), None);
    assert_eq!(fetched.get("name"), Some(&Value::Text("Alice".into())));
}

#[test]
fn test_boolean_fields_round_trip_through_storage() {
    let mut db = Database::in_memory();
    let flags = Model::new(
        Schema::builder("Flag")
            .field("label", FieldAnnotation::Text)
            .field("active", FieldAnnotation::Boolean)
            .build(),
    );

    flags
        .create(
            &mut db,
            &[("label", "on".into()), ("active", true.into())],
        )
        .unwrap();
    flags
        .create(
            &mut db,
            &[("label", "off".into()), ("active", false.into())],
        )
        .unwrap();

    // Stored as integer 0/1.
    let raw = db.query("SELECT active FROM flag ORDER BY id", &[]).unwrap();
    assert_eq!(
        raw,
        vec![vec![Value::Integer(1)], vec![Value::Integer(0)]]
    );

    // Decoded back to booleans on read.
    let active = flags
        .filter(&mut db, &Filters::new().with("active", true))
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].get("active"), Some(&Value::Boolean(true)));
    assert_eq!(active[0].get("label"), Some(&Value::Text("on".into())));
}

#[test]
fn test_optional_fields_persist_null() {
    let mut db = Database::in_memory();
    let notes = Model::new(
        Schema::builder("Note")
            .field("title", FieldAnnotation::Text)
            .field(
                "body",
                FieldAnnotation::Optional(Box::new(FieldAnnotation::Text)),
            )
            .build(),
    );

    let record = notes
        .create(&mut db, &[("title", "empty".into())])
        .unwrap();
    let fetched = notes.get(&mut db, record.id().unwrap()).unwrap().unwrap();
    assert_eq!(fetched.get("body"), Some(&Value::Null));
}

#[test]
fn test_rows_persist_across_reopen() {
    let file = NamedTempFile::new().unwrap();
    let users = users_model();

    {
        let mut db = Database::open(file.path());
        users
            .create(
                &mut db,
                &[("name", "Alice".into()), ("email", "alice@mail.com".into())],
            )
            .unwrap();
        db.close().unwrap();
    }

    let mut db = Database::open(file.path());
    let all = users.all(&mut db).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].get("name"), Some(&Value::Text("Alice".into())));
}

#[test]
fn test_filtering_by_id_uses_the_identity_column() {
    let mut db = Database::in_memory();
    let users = users_model();
    let alice = users
        .create(&mut db, &[("name", "Alice".into())])
        .unwrap();
    users.create(&mut db, &[("name", "Bob".into())]).unwrap();

    let matched = users
        .filter(
            &mut db,
            &Filters::new().with("id", alice.id().unwrap()),
        )
        .unwrap();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].get("name"), Some(&Value::Text("Alice".into())));
}
