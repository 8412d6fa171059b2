//! Email delivery through the EmailJS REST API.

use async_trait::async_trait;
use serde_json::{Value, json};

use taskping_common::config::EmailJsConfig;

use crate::channels::EmailSender;
use crate::error::DeliveryError;
use crate::message::EmailMessage;

pub struct EmailJsSender {
    config: EmailJsConfig,
    http: reqwest::Client,
}

impl EmailJsSender {
    pub fn new(config: EmailJsConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    pub fn request_body(&self, message: &EmailMessage) -> Value {
        let mut body = json!({
            "service_id": self.config.service_id,
            "template_id": self.config.template_id,
            "user_id": self.config.public_key,
            "template_params": {
                "to_email": message.to_email,
                "user_name": message.user_name,
                "task_title": message.task_title,
                "due_time": message.due_time,
                "minutes_left": message.minutes_left.clone().unwrap_or_default(),
                "subject": message.subject,
            },
        });
        if let Some(private_key) = &self.config.private_key {
            body["accessToken"] = json!(private_key);
        }
        body
    }
}

#[async_trait]
impl EmailSender for EmailJsSender {
    async fn send_email(&self, message: &EmailMessage) -> Result<String, DeliveryError> {
        let response = self
            .http
            .post(&self.config.api_url)
            .json(&self.request_body(message))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }
}
