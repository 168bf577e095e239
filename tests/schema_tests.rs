//! Tests for schema introspection and the mirror's key constraints.

use formflow_sync::db::Database;

/// Helper to create a fresh in-memory database for testing.
fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

#[test]
fn get_schema_returns_all_tables() {
    let db = setup_db();

    let schema = db.get_schema().expect("Failed to get schema");
    assert!(!schema.sqlite_version.is_empty());

    let names: Vec<&str> = schema.tables.iter().map(|t| t.name.as_str()).collect();
    for expected in [
        "aggregated_results",
        "option_counts",
        "popular_answers",
        "questions",
        "templates",
    ] {
        assert!(names.contains(&expected), "missing table {}", expected);
    }
    assert!(
        !names.iter().any(|n| n.starts_with("refinery_")),
        "migration history should be hidden"
    );
}

#[test]
fn unique_keys_match_upsert_keys() {
    let db = setup_db();
    let schema = db.get_schema().unwrap();

    assert!(schema.table("templates").unwrap().has_unique(&["external_id"]));
    assert!(
        schema
            .table("questions")
            .unwrap()
            .has_unique(&["template_id", "external_id"])
    );
    assert!(
        schema
            .table("aggregated_results")
            .unwrap()
            .has_unique(&["template_id", "question_external_id"])
    );
}

#[test]
fn children_cascade_on_delete() {
    let db = setup_db();
    let schema = db.get_schema().unwrap();

    for (table, parent) in [
        ("questions", "templates"),
        ("aggregated_results", "templates"),
        ("option_counts", "aggregated_results"),
        ("popular_answers", "aggregated_results"),
    ] {
        let info = schema.table(table).unwrap();
        let fk = info
            .foreign_keys
            .iter()
            .find(|fk| fk.to_table == parent)
            .unwrap_or_else(|| panic!("{} has no foreign key to {}", table, parent));
        assert_eq!(fk.on_delete, "CASCADE");
    }
}

#[test]
fn reopening_file_database_keeps_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mirror.db");

    {
        let db = Database::open(&path).unwrap();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO templates (external_id, title, author) VALUES ('t', 'T', 'A')",
                [],
            )?;
            Ok(())
        })
        .unwrap();
    }

    let db = Database::open(&path).unwrap();
    assert_eq!(db.list_templates().unwrap().len(), 1);
}
