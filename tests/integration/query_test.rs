//! Query execution integration tests.

use hr_ask::db::{QueryOutcome, Value};

use super::common::TestDb;

async fn seeded() -> TestDb {
    let test = TestDb::new();
    test.db
        .execute_script(
            "CREATE TABLE employees (name TEXT, salary INTEGER, department TEXT);
             INSERT INTO employees VALUES ('Ana', 50000, 'Eng'), ('Bo', 42000, 'Ops');",
        )
        .await
        .unwrap();
    test
}

#[tokio::test]
async fn test_rows_match_column_count() {
    let test = seeded().await;

    let outcome = test
        .db
        .execute_query("SELECT name, salary FROM employees ORDER BY name")
        .await;
    let result = outcome.result().unwrap();

    assert_eq!(result.column_names(), vec!["name", "salary"]);
    assert!(result.rows.iter().all(|row| row.len() == result.columns.len()));
    assert_eq!(result.rows[0], vec![Value::from("Ana"), Value::Int(50000)]);
}

#[tokio::test]
async fn test_expression_column_names() {
    let test = seeded().await;

    let outcome = test
        .db
        .execute_query("SELECT department, AVG(salary) FROM employees GROUP BY department ORDER BY department")
        .await;

    assert_eq!(outcome.column_names(), vec!["department", "AVG(salary)"]);
    let result = outcome.result().unwrap();
    assert_eq!(result.rows[0], vec![Value::from("Eng"), Value::Float(50000.0)]);
}

#[tokio::test]
async fn test_empty_result_keeps_columns() {
    let test = seeded().await;

    let outcome = test
        .db
        .execute_query("SELECT name FROM employees WHERE salary > 1000000")
        .await;

    let result = outcome.result().unwrap();
    assert_eq!(result.column_names(), vec!["name"]);
    assert!(result.is_empty());
}

#[tokio::test]
async fn test_failures_are_contained() {
    let test = seeded().await;

    for sql in [
        "SELECT * FROM missing_table",
        "SELEC name FROM employees",
        "```sql\nSELECT 1\n```",
        "",
    ] {
        let outcome = test.db.execute_query(sql).await;
        if let QueryOutcome::Failed { message } = &outcome {
            assert!(!message.is_empty(), "{sql:?}");
            assert!(outcome.column_names().is_empty());
        } else if !sql.is_empty() {
            panic!("expected failure for {sql:?}");
        }
    }

    let outcome = test.db.execute_query("SELECT * FROM missing_table").await;
    assert_eq!(outcome.error(), Some("no such table: missing_table"));
}

#[tokio::test]
async fn test_statements_without_rows() {
    let test = seeded().await;

    let outcome = test
        .db
        .execute_query("UPDATE employees SET salary = salary + 1")
        .await;

    let result = outcome.result().unwrap();
    assert!(result.columns.is_empty());
    assert!(result.rows.is_empty());

    let outcome = test
        .db
        .execute_query("SELECT salary FROM employees WHERE name = 'Ana'")
        .await;
    assert_eq!(outcome.result().unwrap().rows[0], vec![Value::Int(50001)]);
}

#[tokio::test]
async fn test_multiple_statements_are_refused() {
    let test = seeded().await;

    let outcome = test
        .db
        .execute_query("SELECT name FROM employees; SELECT name, salary FROM employees")
        .await;

    assert_eq!(
        outcome.error(),
        Some("You can only execute one statement at a time.")
    );
    assert!(outcome.column_names().is_empty());
}

#[tokio::test]
async fn test_trailing_write_is_not_executed() {
    let test = seeded().await;

    let outcome = test.db.execute_query("SELECT 1; DROP TABLE employees").await;
    assert!(outcome.error().is_some());

    let schema = test.db.read_schema().await.unwrap();
    assert_eq!(
        schema.describe(),
        "Table: employees(name, salary, department)"
    );
    let outcome = test.db.execute_query("SELECT COUNT(*) FROM employees;").await;
    assert_eq!(outcome.result().unwrap().rows[0], vec![Value::Int(2)]);
}
