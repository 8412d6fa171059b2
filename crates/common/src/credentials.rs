//! Google service-account credentials and OAuth2 access tokens.
//!
//! The store and the push provider both authenticate with a short-lived
//! bearer token obtained by exchanging a self-signed RS256 assertion at the
//! account's `token_uri`. Tokens are cached until shortly before expiry.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::AppConfig;
use crate::error::AppError;

/// OAuth2 scopes needed for Firestore and FCM.
pub const GOOGLE_SCOPES: &str =
    "https://www.googleapis.com/auth/datastore https://www.googleapis.com/auth/firebase.messaging";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Refresh a cached token this long before it expires.
const REFRESH_MARGIN_SECONDS: i64 = 60;

/// Lifetime requested for the signed assertion.
const ASSERTION_LIFETIME_SECONDS: i64 = 3600;

/// Fields of a service-account JSON key that are needed here.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccount {
    pub project_id: String,
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccount {
    /// Parse the raw JSON blob from `FIREBASE_SERVICE_ACCOUNT_KEY`.
    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        serde_json::from_str(raw)
            .map_err(|e| AppError::Config(format!("Invalid service account key: {}", e)))
    }
}

/// Claims of the JWT-bearer grant assertion.
#[derive(Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Sign a JWT-bearer assertion for the account.
pub fn encode_assertion(account: &ServiceAccount, now: DateTime<Utc>) -> Result<String, AppError> {
    let key = EncodingKey::from_rsa_pem(account.private_key.as_bytes())
        .map_err(|e| AppError::Config(format!("Invalid service account private key: {}", e)))?;

    let claims = AssertionClaims {
        iss: account.client_email.clone(),
        scope: GOOGLE_SCOPES.to_string(),
        aud: account.token_uri.clone(),
        iat: now.timestamp(),
        exp: (now + Duration::seconds(ASSERTION_LIFETIME_SECONDS)).timestamp(),
    };

    encode(&Header::new(Algorithm::RS256), &claims, &key)
        .map_err(|e| AppError::Auth(format!("Failed to sign assertion: {}", e)))
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Caching access-token source shared by the store and push clients.
pub struct GoogleTokenSource {
    account: ServiceAccount,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl GoogleTokenSource {
    pub fn new(account: ServiceAccount, http: reqwest::Client) -> Self {
        Self {
            account,
            http,
            cached: Mutex::new(None),
        }
    }

    /// Build a token source from configuration.
    ///
    /// Missing or malformed credentials are logged and yield `None`; the
    /// clients that need a token then fail at first use instead of at startup.
    pub fn from_config(config: &AppConfig, http: reqwest::Client) -> Option<Arc<Self>> {
        let Some(raw) = config.firebase_service_account_key.as_deref() else {
            tracing::warn!(
                "FIREBASE_SERVICE_ACCOUNT_KEY missing. Store and push calls will be unavailable."
            );
            return None;
        };

        match ServiceAccount::from_json(raw) {
            Ok(account) => {
                tracing::info!(project_id = %account.project_id, "Service account loaded");
                Some(Arc::new(Self::new(account, http)))
            }
            Err(e) => {
                tracing::error!(error = %e, "Service account initialization error");
                None
            }
        }
    }

    pub fn project_id(&self) -> &str {
        &self.account.project_id
    }

    /// Return a valid bearer token, exchanging a fresh assertion when needed.
    pub async fn access_token(&self) -> Result<String, AppError> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();

        if let Some(token) = cached.as_ref()
            && token.expires_at > now + Duration::seconds(REFRESH_MARGIN_SECONDS)
        {
            return Ok(token.token.clone());
        }

        let assertion = encode_assertion(&self.account, now)?;
        let response = self
            .http
            .post(&self.account.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Auth(format!(
                "Token exchange failed: {} - {}",
                status, body
            )));
        }

        let body: TokenResponse = response.json().await?;
        tracing::debug!(
            client_email = %self.account.client_email,
            expires_in = body.expires_in,
            "Obtained Google access token"
        );

        *cached = Some(CachedToken {
            token: body.access_token.clone(),
            expires_at: now + Duration::seconds(body.expires_in),
        });
        Ok(body.access_token)
    }
}
