//! Recording delivery fakes and an in-process claim guard.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use taskping_common::error::AppError;
use taskping_engine::claim::ClaimGuard;
use taskping_notifier::{Channels, DeliveryError, EmailMessage, EmailSender, PushMessage, PushSender};

/// Push fake that remembers every message and optionally fails.
#[derive(Debug, Clone, Default)]
pub struct RecordingPush {
    sent: Arc<Mutex<Vec<PushMessage>>>,
    failure: Option<String>,
}

impl RecordingPush {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every send fails with a provider rejection carrying `body`.
    pub fn failing(body: &str) -> Self {
        Self {
            failure: Some(body.to_string()),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<PushMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushSender for RecordingPush {
    async fn send_push(&self, message: &PushMessage) -> Result<String, DeliveryError> {
        self.sent.lock().unwrap().push(message.clone());
        if let Some(body) = &self.failure {
            return Err(DeliveryError::Rejected {
                status: 500,
                body: body.clone(),
            });
        }
        Ok(format!("projects/test/messages/{}", self.sent.lock().unwrap().len()))
    }
}

/// Email fake that remembers every message and optionally fails.
#[derive(Debug, Clone, Default)]
pub struct RecordingEmail {
    sent: Arc<Mutex<Vec<EmailMessage>>>,
    failure: Option<String>,
}

impl RecordingEmail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(body: &str) -> Self {
        Self {
            failure: Some(body.to_string()),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for RecordingEmail {
    async fn send_email(&self, message: &EmailMessage) -> Result<String, DeliveryError> {
        self.sent.lock().unwrap().push(message.clone());
        if let Some(body) = &self.failure {
            return Err(DeliveryError::Rejected {
                status: 400,
                body: body.clone(),
            });
        }
        Ok("OK".to_string())
    }
}

/// Wrap two fakes into `Channels`.
pub fn recording_channels(push: &RecordingPush, email: &RecordingEmail) -> Channels {
    Channels::new(Arc::new(push.clone()), Arc::new(email.clone()))
}

/// Claim guard backed by a set; shared by clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryClaims {
    claimed: Arc<Mutex<HashSet<String>>>,
}

impl MemoryClaims {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate another cycle holding the claim.
    pub fn preclaim(&self, task_id: &str) {
        self.claimed.lock().unwrap().insert(task_id.to_string());
    }
}

#[async_trait]
impl ClaimGuard for MemoryClaims {
    async fn try_claim(&self, task_id: &str) -> Result<bool, AppError> {
        Ok(self.claimed.lock().unwrap().insert(task_id.to_string()))
    }
}
