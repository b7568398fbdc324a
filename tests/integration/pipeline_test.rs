//! End-to-end question answering with stubbed SQL generation.

use hr_ask::db::{QueryOutcome, Value};
use hr_ask::ingest::Ingestor;
use hr_ask::llm::{LlmSqlGenerator, MockLlmClient};
use hr_ask::pipeline::{AskOutcome, Assistant};
use pretty_assertions::assert_eq;

use super::common::{Call, StubGenerator, TestDb, EMPLOYEES_CSV};

async fn with_employees(csv: &[u8]) -> TestDb {
    let test = TestDb::new();
    Ingestor::new(test.db.clone(), test.uploads_dir())
        .ingest("staff.csv", csv)
        .await
        .unwrap();
    test
}

#[tokio::test]
async fn test_average_salary_by_department() {
    let test = with_employees(b"name,salary,department\nAna,50000,Eng\n").await;
    let generator =
        StubGenerator::returning("SELECT department, AVG(salary) FROM employees GROUP BY department");
    let assistant = Assistant::new(test.db.clone(), Box::new(generator.clone()));

    let outcome = assistant
        .ask("What is the average salary by department?")
        .await
        .unwrap();

    assert_eq!(
        generator.calls(),
        vec![Call {
            question: "What is the average salary by department?".to_string(),
            schema: "Table: employees(name, salary, department)".to_string(),
        }]
    );
    let AskOutcome::Executed { sql, outcome } = outcome else {
        panic!("expected executed outcome");
    };
    assert_eq!(
        sql,
        "SELECT department, AVG(salary) FROM employees GROUP BY department"
    );
    let result = outcome.result().unwrap();
    assert_eq!(result.column_names(), vec!["department", "AVG(salary)"]);
    assert_eq!(
        result.rows,
        vec![vec![Value::from("Eng"), Value::Float(50000.0)]]
    );
}

#[tokio::test]
async fn test_no_tables_skips_generation() {
    let test = TestDb::new();
    let generator = StubGenerator::returning("SELECT 1");
    let assistant = Assistant::new(test.db.clone(), Box::new(generator.clone()));

    let outcome = assistant.ask("How many employees are there?").await.unwrap();

    assert!(matches!(outcome, AskOutcome::NoSchema { .. }));
    assert!(generator.calls().is_empty());
}

#[tokio::test]
async fn test_generation_failure_is_reported() {
    let test = with_employees(EMPLOYEES_CSV).await;
    let generator = StubGenerator::failing("Request timed out. Try again.");
    let assistant = Assistant::new(test.db.clone(), Box::new(generator.clone()));

    let outcome = assistant.ask("Who earns the most?").await.unwrap();

    match outcome {
        AskOutcome::GenerationFailed { message } => {
            assert!(message.contains("Request timed out"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(generator.calls().len(), 1);
}

#[tokio::test]
async fn test_bad_sql_is_reported_not_raised() {
    let test = with_employees(EMPLOYEES_CSV).await;
    let generator = StubGenerator::returning("SELECT nickname FROM employees");
    let assistant = Assistant::new(test.db.clone(), Box::new(generator));

    let outcome = assistant.ask("Nicknames?").await.unwrap();

    assert_eq!(outcome.sql(), Some("SELECT nickname FROM employees"));
    match outcome.outcome().unwrap() {
        QueryOutcome::Failed { message } => assert_eq!(message, "no such column: nickname"),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn test_write_statements_run_unless_read_only() {
    let test = with_employees(EMPLOYEES_CSV).await;
    let assistant = Assistant::new(
        test.db.clone(),
        Box::new(StubGenerator::returning("DELETE FROM employees WHERE department = 'Ops'")),
    );

    let outcome = assistant.ask("Remove Ops").await.unwrap();
    assert!(outcome.outcome().unwrap().error().is_none());

    let remaining = test.db.execute_query("SELECT COUNT(*) FROM employees").await;
    assert_eq!(remaining.result().unwrap().rows[0], vec![Value::Int(2)]);

    let guarded = Assistant::new(
        test.db.clone(),
        Box::new(StubGenerator::returning("DELETE FROM employees")),
    )
    .read_only(true);

    let outcome = guarded.ask("Remove everyone").await.unwrap();
    assert!(outcome.outcome().unwrap().error().is_some());

    let remaining = test.db.execute_query("SELECT COUNT(*) FROM employees").await;
    assert_eq!(remaining.result().unwrap().rows[0], vec![Value::Int(2)]);
}

#[tokio::test]
async fn test_mock_client_through_generator() {
    let test = with_employees(EMPLOYEES_CSV).await;
    let generator = LlmSqlGenerator::new(Box::new(MockLlmClient::new()));
    let assistant = Assistant::new(test.db.clone(), Box::new(generator));

    let outcome = assistant.ask("How many employees do we have?").await.unwrap();

    assert_eq!(outcome.sql(), Some("SELECT COUNT(*) FROM employees"));
    let result = outcome.outcome().and_then(QueryOutcome::result).unwrap();
    assert_eq!(result.rows, vec![vec![Value::Int(3)]]);
}

#[tokio::test]
async fn test_generated_sql_with_two_statements_is_refused() {
    let test = with_employees(EMPLOYEES_CSV).await;
    let assistant = Assistant::new(
        test.db.clone(),
        Box::new(StubGenerator::returning("SELECT name FROM employees; DROP TABLE employees")),
    );

    let outcome = assistant.ask("Names?").await.unwrap();

    assert_eq!(
        outcome.outcome().unwrap().error(),
        Some("You can only execute one statement at a time.")
    );
    assert_eq!(
        test.db.read_schema().await.unwrap().describe(),
        "Table: employees(name, salary, department)"
    );
}
