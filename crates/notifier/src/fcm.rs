//! Push delivery through the FCM HTTP v1 API.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use taskping_common::config::AppConfig;
use taskping_common::credentials::GoogleTokenSource;

use crate::channels::PushSender;
use crate::error::DeliveryError;
use crate::message::PushMessage;

const NOT_INITIALIZED: &str = "Firebase app not initialized. Check your environment variables.";

#[derive(Debug, Deserialize)]
struct SendResponse {
    name: String,
}

/// FCM sender authenticated with the shared service account.
pub struct FcmSender {
    base_url: String,
    project_id: Option<String>,
    tokens: Option<Arc<GoogleTokenSource>>,
    http: reqwest::Client,
}

impl FcmSender {
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
            base_url: config.fcm_base_url.trim_end_matches('/').to_string(),
            project_id,
            tokens,
            http,
        }
    }

    /// Request body for `messages:send`: high priority on Android and a
    /// background-wakeup flag for APNs.
    pub fn request_body(message: &PushMessage) -> Value {
        json!({
            "message": {
                "token": message.token,
                "notification": {
                    "title": message.title,
                    "body": message.body,
                },
                "android": { "priority": "high" },
                "apns": { "payload": { "aps": { "content-available": 1 } } },
            }
        })
    }
}

#[async_trait]
impl PushSender for FcmSender {
    async fn send_push(&self, message: &PushMessage) -> Result<String, DeliveryError> {
        let (Some(tokens), Some(project_id)) = (self.tokens.as_ref(), self.project_id.as_ref())
        else {
            return Err(DeliveryError::NotConfigured(NOT_INITIALIZED.to_string()));
        };
        let access_token = tokens.access_token().await?;

        let response = self
            .http
            .post(format!(
                "{}/projects/{}/messages:send",
                self.base_url, project_id
            ))
            .bearer_auth(access_token)
            .json(&Self::request_body(message))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let sent: SendResponse = response.json().await?;
        Ok(sent.name)
    }
}
