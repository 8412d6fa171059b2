//! Firestore REST contract tests.
//!
//! The token endpoint and the Firestore API are both served by a local
//! `wiremock` server, so the whole credential → request path is exercised.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use taskping_common::config::AppConfig;
use taskping_common::credentials::{GoogleTokenSource, ServiceAccount};
use taskping_common::error::AppError;
use taskping_common::firestore::FirestoreStore;
use taskping_common::store::{TaskQuery, TaskStore};
use taskping_common::types::{FieldValue, TaskStatus};

const TEST_KEY: &str = include_str!("fixtures/test_service_account_key.pem");
const DOCS: &str = "/projects/demo-project/databases/(default)/documents";

// ============================================================
// Helpers
// ============================================================

async fn mount_token(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.test",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn build_store(server: &MockServer) -> FirestoreStore {
    let account = ServiceAccount {
        project_id: "demo-project".to_string(),
        client_email: "svc@demo-project.iam.gserviceaccount.com".to_string(),
        private_key: TEST_KEY.to_string(),
        token_uri: format!("{}/token", server.uri()),
    };
    let http = reqwest::Client::new();
    let tokens = Arc::new(GoogleTokenSource::new(account, http.clone()));

    let mut config = AppConfig::local();
    config.firestore_base_url = server.uri();
    FirestoreStore::from_config(&config, Some(tokens), http)
}

// ============================================================
// Queries
// ============================================================

#[tokio::test]
async fn test_query_by_status_decodes_documents() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("POST"))
        .and(path(format!("{}:runQuery", DOCS)))
        .and(header("authorization", "Bearer ya29.test"))
        .and(body_partial_json(json!({
            "structuredQuery": {
                "from": [{ "collectionId": "todos" }],
                "where": { "fieldFilter": { "op": "EQUAL", "value": { "stringValue": "todo" } } }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "document": {
                    "name": "projects/demo-project/databases/(default)/documents/todos/t1",
                    "fields": {
                        "title": { "stringValue": "Native" },
                        "dueDate": { "timestampValue": "2026-10-19T08:35:00Z" }
                    }
                },
                "readTime": "2026-10-19T08:30:00Z"
            },
            {
                "document": {
                    "name": "projects/demo-project/databases/(default)/documents/todos/t2",
                    "fields": {
                        "title": { "stringValue": "String" },
                        "dueDate": { "stringValue": "2026-10-19T08:35:00.000Z" }
                    }
                },
                "readTime": "2026-10-19T08:30:00Z"
            },
            { "readTime": "2026-10-19T08:30:00Z" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let store = build_store(&server);
    let docs = store
        .query_tasks(&TaskQuery::ByStatus(TaskStatus::Todo))
        .await
        .unwrap();

    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].id, "t1");
    assert!(matches!(docs[0].get("dueDate"), Some(FieldValue::Timestamp(_))));
    assert!(matches!(docs[1].get("dueDate"), Some(FieldValue::String(_))));
}

#[tokio::test]
async fn test_token_is_cached_across_calls() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("POST"))
        .and(path(format!("{}:runQuery", DOCS)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let store = build_store(&server);
    let query = TaskQuery::ByStatus(TaskStatus::Todo);
    assert!(store.query_tasks(&query).await.unwrap().is_empty());
    assert!(store.query_tasks(&query).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_query_failure_is_store_error() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("POST"))
        .and(path(format!("{}:runQuery", DOCS)))
        .respond_with(
            ResponseTemplate::new(400).set_body_string("FAILED_PRECONDITION: The query requires an index"),
        )
        .mount(&server)
        .await;

    let store = build_store(&server);
    let result = store
        .query_tasks(&TaskQuery::ByStatus(TaskStatus::Todo))
        .await;

    match result {
        Err(AppError::Store(msg)) => assert!(msg.contains("requires an index")),
        other => panic!("expected store error, got {:?}", other),
    }
}

// ============================================================
// Users
// ============================================================

#[tokio::test]
async fn test_get_user_reads_contact_fields() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path(format!("{}/users/u1", DOCS)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "projects/demo-project/databases/(default)/documents/users/u1",
            "fields": {
                "fcmToken": { "stringValue": "tok1" },
                "email": { "stringValue": "a@b.com" },
                "displayName": { "stringValue": "An" }
            }
        })))
        .mount(&server)
        .await;

    let store = build_store(&server);
    let user = store.get_user("u1").await.unwrap().unwrap();
    assert_eq!(user.id, "u1");
    assert_eq!(user.fcm_token.as_deref(), Some("tok1"));
    assert_eq!(user.email.as_deref(), Some("a@b.com"));
    assert_eq!(user.name(), "An");
}

#[tokio::test]
async fn test_get_missing_user_is_none() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path(format!("{}/users/ghost", DOCS)))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": 404, "status": "NOT_FOUND" }
        })))
        .mount(&server)
        .await;

    let store = build_store(&server);
    assert!(store.get_user("ghost").await.unwrap().is_none());
}

// ============================================================
// Completion mark
// ============================================================

#[tokio::test]
async fn test_mark_notified_patches_single_field() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("PATCH"))
        .and(path(format!("{}/todos/t1", DOCS)))
        .and(query_param("updateMask.fieldPaths", "notificationSent"))
        .and(query_param("currentDocument.exists", "true"))
        .and(body_json(json!({
            "fields": { "notificationSent": { "booleanValue": true } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "projects/demo-project/databases/(default)/documents/todos/t1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = build_store(&server);
    store.mark_notified("t1").await.unwrap();
}

#[tokio::test]
async fn test_token_exchange_failure_is_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_grant"))
        .mount(&server)
        .await;

    let store = build_store(&server);
    let result = store.mark_notified("t1").await;
    assert!(matches!(result, Err(AppError::Auth(_))));
}
