//! Firestore REST implementation of `TaskStore`.
//!
//! Speaks the v1 REST API directly: structured queries via `:runQuery`,
//! point reads via document GET, and single-field updates via PATCH with an
//! update mask. Field values travel in Firestore's typed JSON encoding
//! (`{"stringValue": ...}`, `{"timestampValue": ...}`, ...).

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::StatusCode;
use serde_json::{Value, json};

use crate::config::AppConfig;
use crate::credentials::GoogleTokenSource;
use crate::error::AppError;
use crate::store::{TaskQuery, TaskStore};
use crate::types::{FieldValue, StoredDocument, User};

const NOT_INITIALIZED: &str = "Firebase app not initialized. Check your environment variables.";

/// Firestore-backed task store.
pub struct FirestoreStore {
    base_url: String,
    project_id: Option<String>,
    todos_collection: String,
    users_collection: String,
    tokens: Option<Arc<GoogleTokenSource>>,
    http: reqwest::Client,
}

impl FirestoreStore {
    pub fn from_config(
        config: &AppConfig,
        tokens: Option<Arc<GoogleTokenSource>>,
        http: reqwest::Client,
    ) -> Self {
        let project_id = config
            .firebase_project_id
            .clone()
            .or_else(|| tokens.as_ref().map(|t| t.project_id().to_string()));

        Self {
            base_url: config.firestore_base_url.trim_end_matches('/').to_string(),
            project_id,
            todos_collection: config.todos_collection.clone(),
            users_collection: config.users_collection.clone(),
            tokens,
            http,
        }
    }

    /// Documents root plus a bearer token, or a configuration error when
    /// credentials were never supplied.
    async fn session(&self) -> Result<(String, String), AppError> {
        let (Some(tokens), Some(project_id)) = (self.tokens.as_ref(), self.project_id.as_ref())
        else {
            return Err(AppError::Config(NOT_INITIALIZED.to_string()));
        };
        let token = tokens.access_token().await?;
        let root = format!(
            "{}/projects/{}/databases/(default)/documents",
            self.base_url, project_id
        );
        Ok((root, token))
    }

    /// Build the `structuredQuery` body for a candidate query.
    pub fn structured_query(&self, query: &TaskQuery) -> Value {
        let filter = match query {
            TaskQuery::ByStatus(status) => field_filter(
                "status",
                "EQUAL",
                &FieldValue::String(status.as_str().to_string()),
            ),
            TaskQuery::DueWindow { status, from, to } => json!({
                "compositeFilter": {
                    "op": "AND",
                    "filters": [
                        field_filter("status", "EQUAL", &FieldValue::String(status.as_str().to_string())),
                        field_filter("dueDate", "GREATER_THAN_OR_EQUAL", &FieldValue::Timestamp(*from)),
                        field_filter("dueDate", "LESS_THAN_OR_EQUAL", &FieldValue::Timestamp(*to)),
                        field_filter("notificationSent", "NOT_EQUAL", &FieldValue::Bool(true)),
                    ]
                }
            }),
        };

        json!({
            "structuredQuery": {
                "from": [{ "collectionId": self.todos_collection }],
                "where": filter,
            }
        })
    }
}

#[async_trait]
impl TaskStore for FirestoreStore {
    async fn query_tasks(&self, query: &TaskQuery) -> Result<Vec<StoredDocument>, AppError> {
        let (root, token) = self.session().await?;
        let response = self
            .http
            .post(format!("{}:runQuery", root))
            .bearer_auth(token)
            .json(&self.structured_query(query))
            .send()
            .await?;

        let rows: Vec<Value> = expect_success(response).await?.json().await?;
        let docs = rows
            .iter()
            .filter_map(|row| row.get("document"))
            .map(decode_document)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(count = docs.len(), "Queried todo documents");
        Ok(docs)
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        let (root, token) = self.session().await?;
        let response = self
            .http
            .get(document_url(&root, &self.users_collection, user_id)?)
            .bearer_auth(token)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let doc: Value = expect_success(response).await?.json().await?;
        Ok(Some(User::from_document(&decode_document(&doc)?)))
    }

    async fn mark_notified(&self, task_id: &str) -> Result<(), AppError> {
        let (root, token) = self.session().await?;
        let response = self
            .http
            .patch(document_url(&root, &self.todos_collection, task_id)?)
            .query(&[
                ("updateMask.fieldPaths", "notificationSent"),
                ("currentDocument.exists", "true"),
            ])
            .bearer_auth(token)
            .json(&json!({ "fields": { "notificationSent": encode_value(&FieldValue::Bool(true)) } }))
            .send()
            .await?;

        expect_success(response).await?;
        Ok(())
    }
}

/// URL of one document; the id is percent-encoded as a single path segment.
pub fn document_url(root: &str, collection: &str, id: &str) -> Result<reqwest::Url, AppError> {
    let mut url = reqwest::Url::parse(root)
        .map_err(|e| AppError::Config(format!("invalid Firestore URL {:?}: {}", root, e)))?;
    url.path_segments_mut()
        .map_err(|_| AppError::Config(format!("Firestore URL cannot take a path: {}", root)))?
        .push(collection)
        .push(id);
    Ok(url)
}

async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AppError::Store(format!("{} - {}", status, body)))
}

fn field_filter(path: &str, op: &str, value: &FieldValue) -> Value {
    json!({
        "fieldFilter": {
            "field": { "fieldPath": path },
            "op": op,
            "value": encode_value(value),
        }
    })
}

/// Decode a REST `Document` into an id plus decoded fields.
pub fn decode_document(doc: &Value) -> Result<StoredDocument, AppError> {
    let name = doc
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::Store("document without a name".to_string()))?;
    let id = name.rsplit('/').next().unwrap_or(name).to_string();

    let fields = match doc.get("fields").and_then(Value::as_object) {
        Some(map) => map
            .iter()
            .map(|(k, v)| decode_value(v).map(|fv| (k.clone(), fv)))
            .collect::<Result<BTreeMap<_, _>, _>>()?,
        None => BTreeMap::new(),
    };

    Ok(StoredDocument { id, fields })
}

/// Decode one typed Firestore value.
pub fn decode_value(value: &Value) -> Result<FieldValue, AppError> {
    let Some((kind, inner)) = value.as_object().and_then(|m| m.iter().next()) else {
        return Err(AppError::Parse(format!("malformed field value: {}", value)));
    };

    let decoded = match kind.as_str() {
        "nullValue" => FieldValue::Null,
        "booleanValue" => FieldValue::Bool(inner.as_bool().unwrap_or(false)),
        "integerValue" => {
            let n = match inner {
                Value::String(s) => s.parse().ok(),
                other => other.as_i64(),
            };
            FieldValue::Integer(
                n.ok_or_else(|| AppError::Parse(format!("bad integerValue: {}", inner)))?,
            )
        }
        "doubleValue" => FieldValue::Double(inner.as_f64().unwrap_or_default()),
        "stringValue" | "referenceValue" => {
            FieldValue::String(inner.as_str().unwrap_or_default().to_string())
        }
        "timestampValue" => {
            let raw = inner.as_str().unwrap_or_default();
            let ts = DateTime::parse_from_rfc3339(raw)
                .map_err(|e| AppError::Parse(format!("bad timestampValue {:?}: {}", raw, e)))?;
            FieldValue::Timestamp(ts.with_timezone(&Utc))
        }
        "mapValue" => {
            let fields = match inner.get("fields").and_then(Value::as_object) {
                Some(map) => map
                    .iter()
                    .map(|(k, v)| decode_value(v).map(|fv| (k.clone(), fv)))
                    .collect::<Result<BTreeMap<_, _>, _>>()?,
                None => BTreeMap::new(),
            };
            FieldValue::Map(fields)
        }
        "arrayValue" => {
            let values = match inner.get("values").and_then(Value::as_array) {
                Some(items) => items
                    .iter()
                    .map(decode_value)
                    .collect::<Result<Vec<_>, _>>()?,
                None => Vec::new(),
            };
            FieldValue::Array(values)
        }
        // bytes and geo points carry nothing this service reads
        _ => FieldValue::Null,
    };

    Ok(decoded)
}

/// Encode a value into Firestore's typed JSON.
pub fn encode_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => json!({ "nullValue": null }),
        FieldValue::Bool(b) => json!({ "booleanValue": b }),
        FieldValue::Integer(n) => json!({ "integerValue": n.to_string() }),
        FieldValue::Double(d) => json!({ "doubleValue": d }),
        FieldValue::String(s) => json!({ "stringValue": s }),
        FieldValue::Timestamp(ts) => {
            json!({ "timestampValue": ts.to_rfc3339_opts(SecondsFormat::Millis, true) })
        }
        FieldValue::Map(fields) => {
            let encoded: serde_json::Map<String, Value> = fields
                .iter()
                .map(|(k, v)| (k.clone(), encode_value(v)))
                .collect();
            json!({ "mapValue": { "fields": encoded } })
        }
        FieldValue::Array(items) => {
            json!({ "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() } })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::types::TaskStatus;

    fn store() -> FirestoreStore {
        FirestoreStore::from_config(&AppConfig::local(), None, reqwest::Client::new())
    }

    const ROOT: &str = "https://firestore.googleapis.com/v1/projects/p/databases/(default)/documents";

    #[test]
    fn test_document_url_plain_id() {
        let url = document_url(ROOT, "users", "u1").unwrap();
        assert_eq!(url.path(), "/v1/projects/p/databases/(default)/documents/users/u1");
    }

    #[test]
    fn test_document_url_encodes_reserved_characters() {
        let url = document_url(ROOT, "todos", "a#b?c/d").unwrap();
        assert_eq!(
            url.path(),
            "/v1/projects/p/databases/(default)/documents/todos/a%23b%3Fc%2Fd"
        );
        assert!(url.query().is_none());
        assert!(url.fragment().is_none());
    }

    #[test]
    fn test_document_url_rejects_bad_root() {
        assert!(matches!(
            document_url("not a url", "users", "u1"),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_decode_document_mixed_due_dates() {
        let doc = json!({
            "name": "projects/p/databases/(default)/documents/todos/t1",
            "fields": {
                "title": { "stringValue": "Ship it" },
                "dueDate": { "timestampValue": "2026-10-19T08:30:00.123456Z" },
                "altDue": { "stringValue": "2026-10-19T08:30:00Z" },
                "priority": { "integerValue": "3" },
                "notificationSent": { "booleanValue": false },
                "tags": { "arrayValue": { "values": [{ "stringValue": "work" }] } },
                "meta": { "mapValue": { "fields": { "x": { "nullValue": null } } } }
            }
        });

        let decoded = decode_document(&doc).unwrap();
        assert_eq!(decoded.id, "t1");
        assert!(matches!(decoded.get("dueDate"), Some(FieldValue::Timestamp(_))));
        assert_eq!(
            decoded.get("altDue"),
            Some(&FieldValue::String("2026-10-19T08:30:00Z".into()))
        );
        assert_eq!(decoded.get("priority"), Some(&FieldValue::Integer(3)));
        assert_eq!(
            decoded.get("tags"),
            Some(&FieldValue::Array(vec![FieldValue::String("work".into())]))
        );
        assert!(matches!(decoded.get("meta"), Some(FieldValue::Map(_))));
    }

    #[test]
    fn test_decode_value_rejects_bad_timestamp() {
        let result = decode_value(&json!({ "timestampValue": "yesterday" }));
        assert!(matches!(result, Err(AppError::Parse(_))));
    }

    #[test]
    fn test_encode_timestamp_is_rfc3339_z() {
        let ts = Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap();
        assert_eq!(
            encode_value(&FieldValue::Timestamp(ts)),
            json!({ "timestampValue": "2026-10-19T08:30:00.000Z" })
        );
    }

    #[test]
    fn test_narrow_query_filters_status_only() {
        let body = store().structured_query(&TaskQuery::ByStatus(TaskStatus::Todo));
        let filter = &body["structuredQuery"]["where"]["fieldFilter"];
        assert_eq!(filter["field"]["fieldPath"], "status");
        assert_eq!(filter["op"], "EQUAL");
        assert_eq!(filter["value"]["stringValue"], "todo");
        assert_eq!(body["structuredQuery"]["from"][0]["collectionId"], "todos");
    }

    #[test]
    fn test_precise_query_has_full_predicate() {
        let from = Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2026, 10, 19, 8, 10, 0).unwrap();
        let body = store().structured_query(&TaskQuery::DueWindow {
            status: TaskStatus::Todo,
            from,
            to,
        });
        let filters = body["structuredQuery"]["where"]["compositeFilter"]["filters"]
            .as_array()
            .unwrap();
        let ops: Vec<&str> = filters
            .iter()
            .map(|f| f["fieldFilter"]["op"].as_str().unwrap())
            .collect();
        assert_eq!(
            ops,
            vec!["EQUAL", "GREATER_THAN_OR_EQUAL", "LESS_THAN_OR_EQUAL", "NOT_EQUAL"]
        );
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_at_first_use() {
        let store = store();
        let result = store.get_user("u1").await;
        match result {
            Err(AppError::Config(msg)) => assert!(msg.contains("not initialized")),
            other => panic!("expected config error, got {:?}", other),
        }
    }
}
