//! Channel seams and the two-channel delivery facade.

use std::sync::Arc;

use async_trait::async_trait;

use taskping_common::config::AppConfig;
use taskping_common::credentials::GoogleTokenSource;
use taskping_common::types::{ChannelResults, ChannelStatus};

use crate::emailjs::EmailJsSender;
use crate::error::DeliveryError;
use crate::fcm::FcmSender;
use crate::message::{EmailMessage, PushMessage};
use crate::smtp::SmtpSender;

/// Push-notification delivery.
#[async_trait]
pub trait PushSender: Send + Sync {
    /// Send one push; returns the provider's message identifier.
    async fn send_push(&self, message: &PushMessage) -> Result<String, DeliveryError>;
}

/// Email delivery.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Send one email; returns the provider's response text.
    async fn send_email(&self, message: &EmailMessage) -> Result<String, DeliveryError>;
}

/// Both delivery channels, injected once per process.
#[derive(Clone)]
pub struct Channels {
    pub push: Arc<dyn PushSender>,
    pub email: Arc<dyn EmailSender>,
}

impl Channels {
    pub fn new(push: Arc<dyn PushSender>, email: Arc<dyn EmailSender>) -> Self {
        Self { push, email }
    }

    /// Wire the production adapters: FCM for push, and SMTP when a relay is
    /// configured, EmailJS otherwise.
    pub fn from_config(
        config: &AppConfig,
        tokens: Option<Arc<GoogleTokenSource>>,
        http: reqwest::Client,
    ) -> anyhow::Result<Self> {
        let push = Arc::new(FcmSender::from_config(config, tokens, http.clone()));
        let email: Arc<dyn EmailSender> = match &config.smtp {
            Some(smtp) => Arc::new(SmtpSender::new(smtp)?),
            None => Arc::new(EmailJsSender::new(config.emailjs.clone(), http)),
        };
        Ok(Self::new(push, email))
    }

    /// Attempt both channels independently and concurrently.
    ///
    /// An absent message leaves its channel `Skipped`. A failure on one
    /// channel never prevents the other attempt.
    pub async fn deliver(
        &self,
        push: Option<&PushMessage>,
        email: Option<&EmailMessage>,
    ) -> ChannelResults {
        let push_attempt = async {
            match push {
                Some(message) => match self.push.send_push(message).await {
                    Ok(id) => ChannelStatus::Success(id),
                    Err(e) => {
                        tracing::warn!(channel = "fcm", error = %e, "Push delivery failed");
                        ChannelStatus::Failed(e.to_string())
                    }
                },
                None => ChannelStatus::Skipped,
            }
        };

        let email_attempt = async {
            match email {
                Some(message) => match self.email.send_email(message).await {
                    Ok(reply) => ChannelStatus::Success(reply),
                    Err(e) => {
                        tracing::warn!(channel = "email", error = %e, "Email delivery failed");
                        ChannelStatus::Failed(e.to_string())
                    }
                },
                None => ChannelStatus::Skipped,
            }
        };

        let (fcm, email) = tokio::join!(push_attempt, email_attempt);
        ChannelResults { fcm, email }
    }
}
