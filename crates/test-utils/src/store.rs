//! In-memory task store with operation recording.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use taskping_common::error::AppError;
use taskping_common::store::{TaskQuery, TaskStore};
use taskping_common::types::{FieldValue, StoredDocument, User};

/// Record of a store operation for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOp {
    Query(TaskQuery),
    GetUser(String),
    Mark(String),
}

/// In-memory `todos` and `users` collections.
///
/// `DueWindow` queries follow document-store range semantics: a timestamp
/// range never matches string-typed due dates, and `!=` never matches a
/// document that lacks the field.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    todos: Arc<Mutex<BTreeMap<String, StoredDocument>>>,
    users: Arc<Mutex<BTreeMap<String, StoredDocument>>>,
    ops: Arc<Mutex<Vec<StoreOp>>>,
    fail_queries: Arc<AtomicBool>,
    fail_users: Arc<AtomicBool>,
    fail_marks: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_todo(&self, doc: StoredDocument) {
        self.todos.lock().unwrap().insert(doc.id.clone(), doc);
    }

    pub fn insert_user(&self, doc: StoredDocument) {
        self.users.lock().unwrap().insert(doc.id.clone(), doc);
    }

    pub fn todo(&self, id: &str) -> Option<StoredDocument> {
        self.todos.lock().unwrap().get(id).cloned()
    }

    /// Whether the todo's `notificationSent` flag is `true`.
    pub fn is_marked(&self, id: &str) -> bool {
        self.todo(id)
            .and_then(|doc| doc.get("notificationSent").and_then(FieldValue::as_bool))
            .unwrap_or(false)
    }

    pub fn ops(&self) -> Vec<StoreOp> {
        self.ops.lock().unwrap().clone()
    }

    pub fn mark_count(&self) -> usize {
        self.ops()
            .iter()
            .filter(|op| matches!(op, StoreOp::Mark(_)))
            .count()
    }

    /// Make every subsequent query fail.
    pub fn fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent owner lookup fail.
    pub fn fail_users(&self, fail: bool) {
        self.fail_users.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent completion mark fail.
    pub fn fail_marks(&self, fail: bool) {
        self.fail_marks.store(fail, Ordering::SeqCst);
    }

    fn record(&self, op: StoreOp) {
        self.ops.lock().unwrap().push(op);
    }

    fn matches(doc: &StoredDocument, query: &TaskQuery) -> bool {
        let status_is = |wanted: &str| doc.get("status").and_then(FieldValue::as_str) == Some(wanted);
        match query {
            TaskQuery::ByStatus(status) => status_is(status.as_str()),
            TaskQuery::DueWindow { status, from, to } => {
                let in_range = matches!(
                    doc.get("dueDate"),
                    Some(FieldValue::Timestamp(ts)) if from <= ts && ts <= to
                );
                let not_sent = matches!(doc.get("notificationSent"), Some(v) if v != &FieldValue::Bool(true));
                status_is(status.as_str()) && in_range && not_sent
            }
        }
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn query_tasks(&self, query: &TaskQuery) -> Result<Vec<StoredDocument>, AppError> {
        self.record(StoreOp::Query(query.clone()));
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(AppError::Store("503 - store unavailable".to_string()));
        }
        Ok(self
            .todos
            .lock()
            .unwrap()
            .values()
            .filter(|doc| Self::matches(doc, query))
            .cloned()
            .collect())
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.record(StoreOp::GetUser(user_id.to_string()));
        if self.fail_users.load(Ordering::SeqCst) {
            return Err(AppError::Store("503 - store unavailable".to_string()));
        }
        Ok(self
            .users
            .lock()
            .unwrap()
            .get(user_id)
            .map(User::from_document))
    }

    async fn mark_notified(&self, task_id: &str) -> Result<(), AppError> {
        self.record(StoreOp::Mark(task_id.to_string()));
        if self.fail_marks.load(Ordering::SeqCst) {
            return Err(AppError::Store("503 - store unavailable".to_string()));
        }
        let mut todos = self.todos.lock().unwrap();
        let doc = todos
            .get_mut(task_id)
            .ok_or_else(|| AppError::NotFound(format!("todo {}", task_id)))?;
        doc.fields
            .insert("notificationSent".to_string(), FieldValue::Bool(true));
        Ok(())
    }
}
