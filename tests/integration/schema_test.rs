//! Schema introspection integration tests.

use super::common::TestDb;

#[tokio::test]
async fn test_empty_database_has_empty_descriptor() {
    let test = TestDb::new();

    let schema = test.db.read_schema().await.unwrap();

    assert!(schema.is_empty());
    assert_eq!(schema.describe(), "");
}

#[tokio::test]
async fn test_descriptor_keeps_declaration_order() {
    let test = TestDb::new();
    test.db
        .execute_script("CREATE TABLE employees (name TEXT, salary INTEGER, department TEXT)")
        .await
        .unwrap();

    let schema = test.db.read_schema().await.unwrap();

    assert_eq!(
        schema.describe(),
        "Table: employees(name, salary, department)"
    );
    let columns = &schema.tables[0].columns;
    assert_eq!(columns[1].data_type, "INTEGER");
}

#[tokio::test]
async fn test_descriptor_uses_smallest_table_name() {
    let test = TestDb::new();
    test.db
        .execute_script(
            "CREATE TABLE zones (code TEXT);
             CREATE TABLE employees (name TEXT);
             CREATE TABLE payroll (amount REAL);",
        )
        .await
        .unwrap();

    let schema = test.db.read_schema().await.unwrap();

    let names: Vec<_> = schema.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["employees", "payroll", "zones"]);
    assert_eq!(schema.describe(), "Table: employees(name)");
}

#[tokio::test]
async fn test_internal_tables_are_hidden() {
    let test = TestDb::new();
    test.db
        .execute_script(
            "CREATE TABLE counters (id INTEGER PRIMARY KEY AUTOINCREMENT, n INTEGER NOT NULL);
             INSERT INTO counters (n) VALUES (1);",
        )
        .await
        .unwrap();

    let schema = test.db.read_schema().await.unwrap();

    // AUTOINCREMENT creates sqlite_sequence behind the scenes.
    assert_eq!(schema.tables.len(), 1);
    let columns = &schema.tables[0].columns;
    assert!(columns[0].is_primary_key);
    assert!(!columns[1].is_nullable);
}
