use serde::Deserialize;

use crate::types::{ScanStrategy, UnreachablePolicy};

/// Upper bound of the lookahead window (one week).
pub const MAX_WINDOW_MINUTES: i64 = 7 * 24 * 60;

/// Upper bound of the late-invocation tolerance (one day).
pub const MAX_GRACE_SECONDS: i64 = 24 * 60 * 60;

/// Largest offset a fixed UTC offset can represent.
pub const MAX_UTC_OFFSET_MINUTES: i32 = 23 * 60 + 59;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Raw service-account JSON for the store and push provider.
    /// Absent credentials only fail the calls that need them.
    pub firebase_service_account_key: Option<String>,

    /// Overrides the project id embedded in the service account
    pub firebase_project_id: Option<String>,

    /// Firestore REST base URL
    pub firestore_base_url: String,

    /// FCM HTTP v1 base URL
    pub fcm_base_url: String,

    /// Collection holding task documents
    pub todos_collection: String,

    /// Collection holding user documents
    pub users_collection: String,

    pub emailjs: EmailJsConfig,

    /// SMTP relay settings; when present they replace EmailJS
    pub smtp: Option<SmtpConfig>,

    pub scan: ScanConfig,

    /// Redis connection string for the claim guard (disabled when absent)
    pub redis_url: Option<String>,

    /// Lifetime of a per-task claim in seconds (default: 900)
    pub claim_ttl_seconds: u64,

    /// Language code for scan-cycle email subjects (default: "vi")
    pub notify_language: String,

    /// UTC offset used to render due times (default: +07:00)
    pub notify_utc_offset_minutes: i32,

    /// Bearer secret expected on the scan endpoint
    pub cron_secret: Option<String>,

    /// HTTP listen port (default: 3000)
    pub api_port: u16,
}

/// EmailJS REST identifiers.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailJsConfig {
    pub api_url: String,
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
    pub private_key: Option<String>,
}

/// SMTP relay settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    /// Implicit TLS on connect; STARTTLS otherwise
    pub secure: bool,
    pub user: Option<String>,
    pub pass: Option<String>,
    pub from: String,
}

/// Deadline scanner tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    /// Lookahead window in minutes (default: 10)
    pub window_minutes: i64,
    /// Lower-bound tolerance for late invocations, in seconds (default: 0)
    pub grace_seconds: i64,
    pub strategy: ScanStrategy,
    pub unreachable_policy: UnreachablePolicy,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            window_minutes: 10,
            grace_seconds: 0,
            strategy: ScanStrategy::Narrow,
            unreachable_policy: UnreachablePolicy::MarkNotified,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let smtp = match optional("SMTP_HOST") {
            Some(host) => Some(SmtpConfig {
                port: parsed("SMTP_PORT", "587")?,
                secure: parsed("SMTP_SECURE", "false")?,
                user: optional("SMTP_USER"),
                pass: optional("SMTP_PASS"),
                from: std::env::var("SMTP_FROM")
                    .or_else(|_| std::env::var("SMTP_USER"))
                    .unwrap_or_else(|_| format!("no-reply@{}", host)),
                host,
            }),
            None => None,
        };

        let config = Self {
            firebase_service_account_key: optional("FIREBASE_SERVICE_ACCOUNT_KEY"),
            firebase_project_id: optional("FIREBASE_PROJECT_ID"),
            firestore_base_url: with_default(
                "FIRESTORE_BASE_URL",
                "https://firestore.googleapis.com/v1",
            ),
            fcm_base_url: with_default("FCM_BASE_URL", "https://fcm.googleapis.com/v1"),
            todos_collection: with_default("TODOS_COLLECTION", "todos"),
            users_collection: with_default("USERS_COLLECTION", "users"),
            emailjs: EmailJsConfig {
                api_url: with_default(
                    "EMAILJS_API_URL",
                    "https://api.emailjs.com/api/v1.0/email/send",
                ),
                service_id: with_default("EMAILJS_SERVICE_ID", "service_lx2vsyo"),
                template_id: with_default("EMAILJS_TEMPLATE_ID", "template_x7tbqfs"),
                public_key: with_default("EMAILJS_PUBLIC_KEY", "VrD4W6V_afAXyBvag"),
                private_key: optional("EMAILJS_PRIVATE_KEY"),
            },
            smtp,
            scan: ScanConfig {
                window_minutes: parsed("SCAN_WINDOW_MINUTES", "10")?,
                grace_seconds: parsed("SCAN_GRACE_SECONDS", "0")?,
                strategy: parsed("SCAN_STRATEGY", "narrow")?,
                unreachable_policy: parsed("UNREACHABLE_POLICY", "mark")?,
            },
            redis_url: optional("REDIS_URL"),
            claim_ttl_seconds: parsed("CLAIM_TTL_SECONDS", "900")?,
            notify_language: with_default("NOTIFY_LANGUAGE", "vi"),
            notify_utc_offset_minutes: parsed("NOTIFY_UTC_OFFSET_MINUTES", "420")?,
            cron_secret: optional("CRON_SECRET"),
            api_port: parsed("API_PORT", "3000")?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Range checks for values that parse but cannot be used.
    pub fn validate(&self) -> anyhow::Result<()> {
        let window = self.scan.window_minutes;
        if !(0..=MAX_WINDOW_MINUTES).contains(&window) {
            anyhow::bail!(
                "SCAN_WINDOW_MINUTES must be between 0 and {}, got {}",
                MAX_WINDOW_MINUTES,
                window
            );
        }
        let grace = self.scan.grace_seconds;
        if !(0..=MAX_GRACE_SECONDS).contains(&grace) {
            anyhow::bail!(
                "SCAN_GRACE_SECONDS must be between 0 and {}, got {}",
                MAX_GRACE_SECONDS,
                grace
            );
        }
        let offset = self.notify_utc_offset_minutes;
        if !(-MAX_UTC_OFFSET_MINUTES..=MAX_UTC_OFFSET_MINUTES).contains(&offset) {
            anyhow::bail!(
                "NOTIFY_UTC_OFFSET_MINUTES must be within ±{}, got {}",
                MAX_UTC_OFFSET_MINUTES,
                offset
            );
        }
        Ok(())
    }

    /// Configuration with every default applied and no credentials.
    pub fn local() -> Self {
        Self {
            firebase_service_account_key: None,
            firebase_project_id: None,
            firestore_base_url: "https://firestore.googleapis.com/v1".to_string(),
            fcm_base_url: "https://fcm.googleapis.com/v1".to_string(),
            todos_collection: "todos".to_string(),
            users_collection: "users".to_string(),
            emailjs: EmailJsConfig {
                api_url: "https://api.emailjs.com/api/v1.0/email/send".to_string(),
                service_id: "service_lx2vsyo".to_string(),
                template_id: "template_x7tbqfs".to_string(),
                public_key: "VrD4W6V_afAXyBvag".to_string(),
                private_key: None,
            },
            smtp: None,
            scan: ScanConfig::default(),
            redis_url: None,
            claim_ttl_seconds: 900,
            notify_language: "vi".to_string(),
            notify_utc_offset_minutes: 420,
            cron_secret: None,
            api_port: 3000,
        }
    }
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn with_default(key: &str, default: &str) -> String {
    optional(key).unwrap_or_else(|| default.to_string())
}

fn parsed<T: std::str::FromStr>(key: &str, default: &str) -> anyhow::Result<T> {
    let raw = with_default(key, default);
    raw.trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("{} has an invalid value: {:?}", key, raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_defaults() {
        let config = AppConfig::local();
        assert_eq!(config.scan.window_minutes, 10);
        assert_eq!(config.scan.grace_seconds, 0);
        assert_eq!(config.scan.strategy, ScanStrategy::Narrow);
        assert_eq!(
            config.scan.unreachable_policy,
            UnreachablePolicy::MarkNotified
        );
        assert!(config.firebase_service_account_key.is_none());
        assert_eq!(config.todos_collection, "todos");
    }

    #[test]
    fn test_local_defaults_validate() {
        assert!(AppConfig::local().validate().is_ok());
    }

    #[test]
    fn test_negative_window_rejected() {
        let mut config = AppConfig::local();
        config.scan.window_minutes = -10;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("SCAN_WINDOW_MINUTES"));
    }

    #[test]
    fn test_oversized_window_rejected() {
        let mut config = AppConfig::local();
        config.scan.window_minutes = i64::MAX / 1000;
        assert!(config.validate().is_err());

        config.scan.window_minutes = MAX_WINDOW_MINUTES;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_grace_out_of_range_rejected() {
        let mut config = AppConfig::local();
        config.scan.grace_seconds = -1;
        assert!(config.validate().is_err());

        config.scan.grace_seconds = MAX_GRACE_SECONDS + 1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("SCAN_GRACE_SECONDS"));
    }

    #[test]
    fn test_utc_offset_out_of_range_rejected() {
        let mut config = AppConfig::local();
        config.notify_utc_offset_minutes = 1440;
        assert!(config.validate().is_err());

        config.notify_utc_offset_minutes = -1439;
        assert!(config.validate().is_ok());

        config.notify_utc_offset_minutes = i32::MAX;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("NOTIFY_UTC_OFFSET_MINUTES"));
    }

    #[test]
    fn test_parsed_rejects_garbage() {
        let result: anyhow::Result<u16> = parsed("TASKPING_TEST_UNSET_PORT", "not-a-port");
        assert!(result.is_err());
    }

    #[test]
    fn test_parsed_uses_default() {
        let value: i64 = parsed("TASKPING_TEST_UNSET_WINDOW", "10").unwrap();
        assert_eq!(value, 10);
    }
}
