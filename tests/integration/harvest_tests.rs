//! End-to-end harvests over HTTP

use exam_harvest::config::{parse_config, validate, Config};
use exam_harvest::crawler::{run_harvest, HarvestOptions};
use exam_harvest::remote::HttpCatalogClient;
use exam_harvest::storage::open_checkpoints;
use exam_harvest::{HarvestError, Record};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// A validated config pointed at `server`, writing into `dir`
fn test_config(server: &MockServer, dir: &TempDir, extra_collection: &str) -> Config {
    let toml = format!(
        r#"
[api]
base-url = "{base}/api/questions"
api-key = "test-key"

[collection]
exam = "JAMB"
polite-delay-ms = 0
variant-delay-ms = 0
{extra}

[retry]
backoff-step-ms = 0

[output]
directory = "{out}"
checkpoint-path = "{checkpoint}"
"#,
        base = server.uri(),
        extra = extra_collection,
        out = dir.path().join("outputs").display(),
        checkpoint = dir.path().join("checkpoint_JAMB.json").display(),
    );
    let config = parse_config(&toml).unwrap();
    validate(&config).unwrap();
    config
}

async fn mount_exams(server: &MockServer, exams: Value) {
    Mock::given(method("POST"))
        .and(path("/api/questions"))
        .and(query_param("get", "exam"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": exams })))
        .mount(server)
        .await;
}

/// Everything not matched by a more specific mock gets an empty question page
async fn mount_empty_fallback(server: &MockServer) {
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"questions": []}})))
        .mount(server)
        .await;
}

/// JSON bodies of question listing requests (no `get` selector)
fn question_bodies(requests: &[Request]) -> Vec<Value> {
    requests
        .iter()
        .filter(|r| r.url.query_pairs().all(|(k, _)| k != "get"))
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

fn client(config: &Config) -> Arc<HttpCatalogClient> {
    Arc::new(HttpCatalogClient::from_config(config).unwrap())
}

#[tokio::test]
async fn test_quota_met_from_first_page_never_touches_older_years() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_exams(&mock_server, json!(["JAMB", "WAEC"])).await;
    Mock::given(method("POST"))
        .and(path("/api/questions"))
        .and(body_partial_json(json!({"exam_year_id": "2023", "subject": "mathematics", "page": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "questions": [
                    {"id": 1, "question_text": "What is 1 + 1?", "options": {"a": "1", "b": "2"}, "correct_answer": "b"},
                    {"id": 2, "question_text": "What is 2 * 3?", "options": {"a": "6", "b": "5"}, "correct_answer": "a"}
                ],
                "pagination": {"current_page": 1, "total_pages": 4}
            }
        })))
        .mount(&mock_server)
        .await;
    mount_empty_fallback(&mock_server).await;

    let config = test_config(
        &mock_server,
        &dir,
        "per-subject-target = 2\nyears = [\"2023\", \"2022\"]\nsubjects = [\"mathematics\"]",
    );
    let outcome = run_harvest(&config, client(&config), HarvestOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.report.total_records, 2);
    assert_eq!(outcome.report.per_subject["mathematics"], 2);

    let requests = mock_server.received_requests().await.unwrap();
    let bodies = question_bodies(&requests);
    assert_eq!(bodies.len(), 1);
    assert!(bodies.iter().all(|b| b["exam_year_id"] != "2022"));

    let saved = open_checkpoints(Path::new(&config.checkpoint_path()))
        .load()
        .unwrap();
    let pointer = saved.state.pointer("mathematics").unwrap();
    assert_eq!(pointer.collected, 2);
    assert!(!pointer.exhausted);
    assert!(saved.state.done);

    let exported: Vec<Record> =
        serde_json::from_str(&std::fs::read_to_string(&outcome.files.records_json).unwrap()).unwrap();
    assert_eq!(exported.len(), 2);
    assert_eq!(exported[0].source_id.as_deref(), Some("1"));
    assert_eq!(exported[1].answer.as_deref(), Some("a"));
}

#[tokio::test]
async fn test_discovery_resolution_and_exhaustion() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_exams(&mock_server, json!(["JAMB"])).await;
    Mock::given(method("POST"))
        .and(query_param("get", "exam_year_id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [2023, 2022, "n/a"]})))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(query_param("get", "subject"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "subjects": [{"name": "Further Mathematics"}, {"name": "Civic Education"}]
        })))
        .mount(&mock_server)
        .await;
    // only the hyphenated slug has data, and only on 2022 page 1
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"exam_year_id": "2022", "subject": "further-mathematics", "page": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "questions": [{"question": "Find dy/dx of x^3"}, {"question": "Integrate 1/x"}]
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"subject": "Civic Education"})))
        .respond_with(ResponseTemplate::new(404).set_body_string("Subject not found"))
        .mount(&mock_server)
        .await;
    mount_empty_fallback(&mock_server).await;

    let config = test_config(&mock_server, &dir, "per-subject-target = 10\nyears-back = 5");
    let outcome = run_harvest(&config, client(&config), HarvestOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.report.total_records, 2);
    assert_eq!(outcome.report.per_subject["Further Mathematics"], 2);
    assert_eq!(outcome.report.per_subject["Civic Education"], 0);
    assert_eq!(outcome.report.exhausted_subjects, 2);

    let saved = open_checkpoints(Path::new(&config.checkpoint_path()))
        .load()
        .unwrap();
    assert_eq!(saved.state.years, vec!["2023", "2022"]);
    assert_eq!(saved.items[0].subject, "Further Mathematics");
    assert_eq!(saved.items[0].subject_variant, "further-mathematics");
    assert_eq!(saved.items[0].year, "2022");

    let subject_file = outcome
        .files
        .directory
        .join("subjects")
        .join("Further_Mathematics.json");
    assert!(subject_file.exists());
}

#[tokio::test]
async fn test_second_run_resumes_done_checkpoint_without_question_requests() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_exams(&mock_server, json!(["JAMB"])).await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"exam_year_id": "2024", "page": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"questions": [{"question": "Name a noble gas"}]}
        })))
        .mount(&mock_server)
        .await;
    mount_empty_fallback(&mock_server).await;

    let config = test_config(
        &mock_server,
        &dir,
        "target = 4\nyears = [\"2024\"]\nsubjects = [\"chemistry\", \"physics\"]",
    );

    let first = run_harvest(&config, client(&config), HarvestOptions::default())
        .await
        .unwrap();
    assert_eq!(first.report.quota, 2);
    assert_eq!(first.report.total_records, 2);

    let before = question_bodies(&mock_server.received_requests().await.unwrap()).len();

    let second = run_harvest(&config, client(&config), HarvestOptions::default())
        .await
        .unwrap();
    let after = question_bodies(&mock_server.received_requests().await.unwrap()).len();

    assert_eq!(before, after);
    assert_eq!(second.report.total_records, 2);
    assert!(second.files.summary.exists());
}

#[tokio::test]
async fn test_exam_missing_from_catalog_aborts() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_exams(&mock_server, json!(["WAEC"])).await;
    mount_empty_fallback(&mock_server).await;

    let config = test_config(&mock_server, &dir, "per-subject-target = 5");
    let result = run_harvest(&config, client(&config), HarvestOptions::default()).await;

    assert!(matches!(result, Err(HarvestError::ExamNotFound { .. })));
    let requests = mock_server.received_requests().await.unwrap();
    assert!(question_bodies(&requests).is_empty());
    assert!(!Path::new(&config.checkpoint_path()).exists());
}
