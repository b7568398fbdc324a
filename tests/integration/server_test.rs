//! HTTP API tests against a server on an ephemeral port.

use std::net::SocketAddr;

use hr_ask::ingest::Ingestor;
use hr_ask::pipeline::Assistant;
use hr_ask::server::{self, AppState};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use super::common::{StubGenerator, TestDb, EMPLOYEES_CSV};

const UPLOAD_LIMIT: usize = 64 * 1024;

struct TestServer {
    test: TestDb,
    addr: SocketAddr,
    client: reqwest::Client,
    _shutdown: oneshot::Sender<()>,
}

impl TestServer {
    async fn start(generator: StubGenerator) -> Self {
        let test = TestDb::new();
        let assistant = Assistant::new(test.db.clone(), Box::new(generator));
        let ingestor = Ingestor::new(test.db.clone(), test.uploads_dir());
        let app = server::router(AppState::new(assistant, ingestor), UPLOAD_LIMIT);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(server::serve(listener, app, async {
            let _ = rx.await;
        }));

        Self {
            test,
            addr,
            client: reqwest::Client::new(),
            _shutdown: tx,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn upload(&self, file_name: &str, bytes: &[u8]) -> reqwest::Response {
        let part = Part::bytes(bytes.to_vec()).file_name(file_name.to_string());
        self.client
            .post(self.url("/api/upload"))
            .multipart(Form::new().part("file", part))
            .send()
            .await
            .unwrap()
    }

    async fn ask(&self, question: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/ask"))
            .json(&json!({ "question": question }))
            .send()
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn test_health_and_index() {
    let server = TestServer::start(StubGenerator::returning("SELECT 1")).await;

    let health: Value = server
        .client
        .get(server.url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");

    let page = server
        .client
        .get(server.url("/"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("HR Data Assistant"));
    assert!(page.contains("accept=\".csv,.sql\""));
}

#[tokio::test]
async fn test_page_handles_empty_results_and_failed_loads() {
    let server = TestServer::start(StubGenerator::returning("SELECT 1")).await;

    let page = server
        .client
        .get(server.url("/"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(page.contains("outcome.rows.length === 0"));
    assert!(page.contains("\"No results found.\""));
    assert!(page.contains("error.category === \"Ingest Error\""));
}

#[tokio::test]
async fn test_upload_then_ask() {
    let generator =
        StubGenerator::returning("SELECT department, COUNT(*) FROM employees GROUP BY department ORDER BY department");
    let server = TestServer::start(generator.clone()).await;

    let response = server.upload("staff.csv", EMPLOYEES_CSV).await;
    assert_eq!(response.status(), StatusCode::OK);
    let upload: Value = response.json().await.unwrap();
    assert_eq!(upload["file_name"], "staff.csv");
    assert_eq!(upload["report"]["kind"], "csv");
    assert_eq!(upload["report"]["rows_loaded"], 3);
    assert_eq!(upload["report"]["preview"]["rows"][0], json!(["Ana", 50000, "Eng"]));
    assert!(server.test.uploads_dir().join("staff.csv").exists());

    let schema: Value = server
        .client
        .get(server.url("/api/schema"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        schema["descriptor"],
        "Table: employees(name, salary, department)"
    );

    let response = server.ask("Headcount per department?").await;
    assert_eq!(response.status(), StatusCode::OK);
    let answer: Value = response.json().await.unwrap();
    assert_eq!(answer["status"], "executed");
    assert_eq!(answer["outcome"]["kind"], "rows");
    assert_eq!(
        answer["outcome"]["columns"][1]["name"],
        "COUNT(*)"
    );
    assert_eq!(answer["outcome"]["rows"], json!([["Eng", 2], ["Ops", 1]]));
    assert_eq!(generator.calls().len(), 1);
}

#[tokio::test]
async fn test_ask_before_upload_warns() {
    let generator = StubGenerator::returning("SELECT 1");
    let server = TestServer::start(generator.clone()).await;

    let answer: Value = server.ask("Anything?").await.json().await.unwrap();

    assert_eq!(answer["status"], "no_schema");
    assert!(generator.calls().is_empty());
}

#[tokio::test]
async fn test_blank_question_is_bad_request() {
    let server = TestServer::start(StubGenerator::returning("SELECT 1")).await;

    let response = server.ask("  ").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["category"], "Invalid Input");
}

#[tokio::test]
async fn test_unsupported_upload_is_bad_request() {
    let server = TestServer::start(StubGenerator::returning("SELECT 1")).await;

    let response = server.upload("notes.txt", b"hello").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["category"], "Unsupported File");
    assert!(!server.test.uploads_dir().join("notes.txt").exists());
}

#[tokio::test]
async fn test_broken_csv_is_unprocessable() {
    let server = TestServer::start(StubGenerator::returning("SELECT 1")).await;

    let response = server.upload("broken.csv", b"a,b\n1,2,3\n").await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["category"], "Ingest Error");
    // The page reports the saved file alongside the load error.
    assert!(server.test.uploads_dir().join("broken.csv").exists());
}

#[tokio::test]
async fn test_sql_upload_and_generation_failure() {
    let server = TestServer::start(StubGenerator::failing("Rate limited")).await;

    let response = server
        .upload("seed.sql", b"CREATE TABLE departments (id INTEGER, name TEXT);")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let upload: Value = response.json().await.unwrap();
    assert_eq!(upload["report"]["kind"], "script");

    let answer: Value = server.ask("List departments").await.json().await.unwrap();
    assert_eq!(answer["status"], "generation_failed");
    assert!(answer["message"].as_str().unwrap().contains("Rate limited"));
}
