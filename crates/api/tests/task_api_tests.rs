use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use taskboard_api::create_app;
use taskboard_config::ApiConfig;
use taskboard_testing_utils::{url_param, url_path, MockBlobStore, MockStores, TaskEntityBuilder};

fn app(stores: &MockStores) -> Router {
    create_app(Arc::new(stores.orchestrator()), &ApiConfig::default())
}

async fn call(app: Router, method: &str, uri: &str, body: Body) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(body)
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    call(app, "POST", uri, Body::from(body.to_string())).await
}

fn ship_release() -> Value {
    json!({
        "taskName": "Ship release",
        "assignee": "alice",
        "deadline": "2025-01-01T00:00:00Z"
    })
}

#[tokio::test]
async fn test_health_endpoint() {
    let stores = MockStores::new();
    let (status, body) = call(app(&stores), "GET", "/health", Body::empty()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "taskboard");
}

#[tokio::test]
async fn test_create_then_get_task() {
    let stores = MockStores::new();

    let (status, body) =
        post_json(app(&stores), "/api/storage/create-record", ship_release()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["attachmentUploaded"], false);
    assert_eq!(body["data"]["notification"]["status"], "sent");
    assert_eq!(
        stores.log.calls(),
        vec!["record.upsert_replace", "queue.send"]
    );

    let partition_key = body["data"]["partitionKey"].as_str().unwrap().to_string();
    let row_key = body["data"]["rowKey"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["id"].as_str().unwrap(), partition_key);

    let uri = format!(
        "/api/storage/get-task?partitionKey={partition_key}&rowKey={row_key}&fileName=report.pdf"
    );
    let (status, body) = call(app(&stores), "GET", &uri, Body::empty()).await;
    assert_eq!(status, StatusCode::OK);

    let task = &body["data"]["task"];
    assert_eq!(task["taskName"], "Ship release");
    assert_eq!(task["assignee"], "alice");
    assert_eq!(task["deadline"], "2025-01-01T00:00:00Z");
    assert_eq!(task["partitionKey"], partition_key.as_str());
    assert_eq!(task["rowKey"], row_key.as_str());
    let file_url = task["fileUrl"].as_str().unwrap();
    assert_eq!(
        url_path(file_url),
        format!("{}/report.pdf", MockBlobStore::BASE_URL)
    );

    assert_eq!(
        body["data"]["notification"]["message"],
        "A new task successfully added."
    );
    assert_eq!(stores.queue.get_acked_messages(), vec!["msg-1".to_string()]);
}

#[tokio::test]
async fn test_create_with_data_url_attachment() {
    let stores = MockStores::new();
    let mut request = ship_release();
    request["fileName"] = json!("notes.txt");
    request["base64File"] = json!("data:text/plain;base64,aGVsbG8=");

    let (status, body) = post_json(app(&stores), "/api/storage/create-record", request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["attachmentUploaded"], true);
    assert_eq!(
        stores.log.calls(),
        vec!["record.upsert_replace", "blob.upload", "queue.send"]
    );
    let blob = stores.blobs.get_blob("notes.txt").unwrap();
    assert_eq!(&blob.content[..], b"hello");
    assert_eq!(blob.content_type, "text/plain");
}

#[tokio::test]
async fn test_create_with_file_name_but_no_content_skips_upload() {
    let stores = MockStores::new();
    let mut request = ship_release();
    request["fileName"] = json!("notes.txt");
    request["base64File"] = json!("");

    let (status, _) = post_json(app(&stores), "/api/storage/create-record", request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(stores.log.count("blob."), 0);
    let records = stores.records.get_all_records();
    assert_eq!(records[0].file_name.as_deref(), Some("notes.txt"));
}

#[tokio::test]
async fn test_create_rejects_missing_payload() {
    let stores = MockStores::new();

    for body in ["", "null", "{\"taskName\":\"x\"}", "not json"] {
        let (status, response) = call(
            app(&stores),
            "POST",
            "/api/storage/create-record",
            Body::from(body),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body:?}");
        assert_eq!(response["error"]["message"], "Required data is not provided.");
        assert_eq!(response["error"]["type"], "INVALID_INPUT");
    }
    assert!(stores.log.calls().is_empty());
}

#[tokio::test]
async fn test_create_rejects_undecodable_file() {
    let stores = MockStores::new();
    let mut request = ship_release();
    request["fileName"] = json!("notes.txt");
    request["base64File"] = json!("%%%");

    let (status, _) = post_json(app(&stores), "/api/storage/create-record", request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(stores.log.calls().is_empty());
}

#[tokio::test]
async fn test_create_record_store_failure_is_internal_error() {
    let stores = MockStores::new();
    stores.records.fail_on("upsert_replace");

    let (status, body) =
        post_json(app(&stores), "/api/storage/create-record", ship_release()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["type"], "RECORD_STORE_FAILURE");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("injected failure"));
    assert_eq!(stores.log.count("blob."), 0);
    assert_eq!(stores.log.count("queue."), 0);
}

#[tokio::test]
async fn test_create_upload_failure_leaves_readable_record() {
    let stores = MockStores::new();
    stores.blobs.fail_on("upload");
    let mut request = ship_release();
    request["fileName"] = json!("notes.txt");
    request["base64File"] = json!("aGVsbG8=");

    let (status, body) = post_json(app(&stores), "/api/storage/create-record", request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["type"], "ATTACHMENT_FAILURE");
    assert_eq!(stores.log.count("queue."), 0);

    let (status, body) = call(app(&stores), "GET", "/api/storage/get-tasks", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    let tasks = body["data"].as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["fileName"], "notes.txt");
    assert!(tasks[0]["fileUrl"].is_string());
}

#[tokio::test]
async fn test_create_succeeds_when_queue_is_missing() {
    let stores = MockStores::new();
    stores.queue.set_exists(false);

    let (status, body) =
        post_json(app(&stores), "/api/storage/create-record", ship_release()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["notification"]["status"], "failed");
}

#[tokio::test]
async fn test_get_task_requires_every_parameter() {
    let stores = MockStores::new();

    for uri in [
        "/api/storage/get-task",
        "/api/storage/get-task?partitionKey=pk&rowKey=rk",
        "/api/storage/get-task?partitionKey=pk&rowKey=&fileName=a.txt",
    ] {
        let (status, body) = call(app(&stores), "GET", uri, Body::empty()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "uri: {uri}");
        assert_eq!(body["error"]["message"], "Required data is not provided.");
    }
    assert!(stores.log.calls().is_empty());
}

#[tokio::test]
async fn test_get_missing_task_is_bad_request() {
    let stores = MockStores::new();

    let (status, body) = call(
        app(&stores),
        "GET",
        "/api/storage/get-task?partitionKey=pk&rowKey=rk&fileName=a.txt",
        Body::empty(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Required data not found.");
    assert_eq!(body["error"]["type"], "NOT_FOUND");
}

#[tokio::test]
async fn test_list_tasks_empty_is_not_found() {
    let stores = MockStores::new();

    let (status, body) = call(app(&stores), "GET", "/api/storage/get-tasks", Body::empty()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "NOT_FOUND");
}

#[tokio::test]
async fn test_list_tasks_signs_only_records_with_attachments() {
    let stores = MockStores::new();
    stores
        .records
        .insert(TaskEntityBuilder::new().with_keys("a", "1").with_file_name("a.txt").build());
    stores
        .records
        .insert(TaskEntityBuilder::new().with_keys("b", "2").build());

    let (status, body) = call(app(&stores), "GET", "/api/storage/get-tasks", Body::empty()).await;

    assert_eq!(status, StatusCode::OK);
    let tasks = body["data"].as_array().unwrap();
    assert_eq!(tasks.len(), 2);
    let with_file = tasks.iter().find(|t| t["partitionKey"] == "a").unwrap();
    let without_file = tasks.iter().find(|t| t["partitionKey"] == "b").unwrap();
    let url = with_file["fileUrl"].as_str().unwrap();
    assert_eq!(url_param(url, "sp"), Some("r"));
    assert!(without_file["fileUrl"].is_null());
}

#[tokio::test]
async fn test_unsafe_file_name_is_rejected_and_list_stays_available() {
    let stores = MockStores::new();

    let (status, _) = post_json(app(&stores), "/api/storage/create-record", ship_release()).await;
    assert_eq!(status, StatusCode::OK);

    for base64_file in [None, Some("aGVsbG8=")] {
        let mut request = ship_release();
        request["taskName"] = json!("bad");
        request["fileName"] = json!("../x");
        if let Some(content) = base64_file {
            request["base64File"] = json!(content);
        }
        let (status, body) =
            post_json(app(&stores), "/api/storage/create-record", request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "INVALID_INPUT");
    }
    assert_eq!(stores.records.count(), 1);
    assert_eq!(stores.blobs.count(), 0);

    // 表中已有的坏名称记录不影响其他条目的列出
    stores
        .records
        .insert(TaskEntityBuilder::new().with_keys("legacy", "1").with_file_name("../x").build());
    let (status, body) = call(app(&stores), "GET", "/api/storage/get-tasks", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    let tasks = body["data"].as_array().unwrap();
    assert_eq!(tasks.len(), 2);
    let legacy = tasks.iter().find(|t| t["partitionKey"] == "legacy").unwrap();
    assert!(legacy["fileUrl"].is_null());

    for (method, uri) in [
        ("GET", "/api/storage/get-task?partitionKey=legacy&rowKey=1&fileName=..%2Fx"),
        ("DELETE", "/api/storage/delete-task?partitionKey=legacy&rowKey=1&fileName=..%2Fx"),
    ] {
        let (status, body) = call(app(&stores), method, uri, Body::empty()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "INVALID_INPUT");
    }
    assert_eq!(stores.records.count(), 2);
}

#[tokio::test]
async fn test_list_files() {
    let stores = MockStores::new();

    let (status, _) = call(app(&stores), "GET", "/api/storage/get-files", Body::empty()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    stores.blobs.insert("b.txt", "b");
    stores.blobs.insert("a.txt", "a");
    let (status, body) = call(app(&stores), "GET", "/api/storage/get-files", Body::empty()).await;

    assert_eq!(status, StatusCode::OK);
    let files = body["data"].as_array().unwrap();
    assert_eq!(files[0]["fileName"], "a.txt");
    assert_eq!(files[1]["fileName"], "b.txt");
    assert!(files[0]["fileUrl"]
        .as_str()
        .unwrap()
        .starts_with(MockBlobStore::BASE_URL));
}

#[tokio::test]
async fn test_delete_task_with_attachment() {
    let stores = MockStores::new();
    stores
        .records
        .insert(TaskEntityBuilder::new().with_keys("pk", "rk").with_file_name("a.txt").build());
    stores.blobs.insert("a.txt", "content");

    let (status, body) = call(
        app(&stores),
        "DELETE",
        "/api/storage/delete-task?partitionKey=pk&rowKey=rk&fileName=a.txt",
        Body::empty(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_null());
    assert!(body["data"]["attachmentWarning"].is_null());
    assert_eq!(stores.records.count(), 0);
    assert_eq!(stores.blobs.count(), 0);
}

#[tokio::test]
async fn test_delete_twice_reports_soft_warning() {
    let stores = MockStores::new();
    let uri = "/api/storage/delete-task?partitionKey=pk&rowKey=rk&fileName=a.txt";

    for _ in 0..2 {
        let (status, body) = call(app(&stores), "DELETE", uri, Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Uploaded file is not successfully deleted.");
        assert_eq!(body["data"]["attachmentWarning"]["fileName"], "a.txt");
        assert_eq!(body["data"]["attachmentWarning"]["reason"], "missing");
    }
}

#[tokio::test]
async fn test_delete_blob_failure_is_soft_warning() {
    let stores = MockStores::new();
    stores.blobs.fail_on("delete");

    let (status, body) = call(
        app(&stores),
        "DELETE",
        "/api/storage/delete-task?partitionKey=pk&rowKey=rk&fileName=a.txt",
        Body::empty(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["attachmentWarning"]["reason"], "failed");
}

#[tokio::test]
async fn test_delete_record_store_failure_is_internal_error() {
    let stores = MockStores::new();
    stores.records.fail_on("delete");

    let (status, body) = call(
        app(&stores),
        "DELETE",
        "/api/storage/delete-task?partitionKey=pk&rowKey=rk&fileName=a.txt",
        Body::empty(),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["type"], "RECORD_STORE_FAILURE");
    assert_eq!(stores.log.count("blob."), 0);
}

#[tokio::test]
async fn test_delete_requires_parameters() {
    let stores = MockStores::new();

    let (status, _) = call(
        app(&stores),
        "DELETE",
        "/api/storage/delete-task?partitionKey=pk",
        Body::empty(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(stores.log.calls().is_empty());
}

#[tokio::test]
async fn test_request_body_limit() {
    let stores = MockStores::new();
    let config = ApiConfig {
        max_request_size_mb: 1,
        ..ApiConfig::default()
    };
    let app = create_app(Arc::new(stores.orchestrator()), &config);

    let oversized = "x".repeat(2 * 1024 * 1024);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/storage/create-record")
                .body(Body::from(oversized))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(stores.log.calls().is_empty());
}
