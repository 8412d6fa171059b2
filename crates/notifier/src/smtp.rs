//! Email delivery through an SMTP relay.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use taskping_common::config::SmtpConfig;

use crate::channels::EmailSender;
use crate::error::DeliveryError;
use crate::message::EmailMessage;

pub struct SmtpSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpSender {
    /// Build the relay transport. `secure` selects implicit TLS, otherwise
    /// the connection is upgraded with STARTTLS.
    pub fn new(config: &SmtpConfig) -> Result<Self, DeliveryError> {
        let builder = if config.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        }
        .map_err(|e| DeliveryError::Smtp(e.to_string()))?;

        let mut builder = builder.port(config.port);
        if let (Some(user), Some(pass)) = (&config.user, &config.pass) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let from = config
            .from
            .parse()
            .map_err(|_| DeliveryError::InvalidAddress(config.from.clone()))?;

        tracing::info!(host = %config.host, port = config.port, secure = config.secure, "SMTP relay configured");
        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    pub fn build_message(&self, message: &EmailMessage) -> Result<Message, DeliveryError> {
        let to: Mailbox = message
            .to_email
            .parse()
            .map_err(|_| DeliveryError::InvalidAddress(message.to_email.clone()))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(message.plain_text())
            .map_err(|e| DeliveryError::Smtp(e.to_string()))
    }
}

#[async_trait]
impl EmailSender for SmtpSender {
    async fn send_email(&self, message: &EmailMessage) -> Result<String, DeliveryError> {
        let email = self.build_message(message)?;
        let response = self
            .transport
            .send(email)
            .await
            .map_err(|e| DeliveryError::Smtp(e.to_string()))?;

        let detail: Vec<&str> = response.message().collect();
        Ok(format!("{} {}", response.code(), detail.join(" ")))
    }
}
