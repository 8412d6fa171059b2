//! Explicitly constructed service context.
//!
//! Holds the store, the delivery channels and the optional claim guard,
//! built once per process and handed to whoever runs a cycle. Tests build
//! it with `ServiceContext::new` and in-memory fakes.

use std::sync::Arc;

use taskping_common::config::AppConfig;
use taskping_common::credentials::GoogleTokenSource;
use taskping_common::firestore::FirestoreStore;
use taskping_common::redis_pool::connect_redis;
use taskping_common::store::TaskStore;
use taskping_notifier::Channels;

use crate::claim::{ClaimGuard, RedisClaimGuard};
use crate::dispatcher::{DispatchSettings, NotificationDispatcher};
use crate::on_demand::OnDemandNotifier;
use crate::processor::DeadlineProcessor;
use crate::scanner::DeadlineScanner;

#[derive(Clone)]
pub struct ServiceContext {
    pub config: AppConfig,
    pub store: Arc<dyn TaskStore>,
    pub channels: Channels,
    pub claims: Option<Arc<dyn ClaimGuard>>,
}

impl ServiceContext {
    pub fn new(config: AppConfig, store: Arc<dyn TaskStore>, channels: Channels) -> Self {
        Self {
            config,
            store,
            channels,
            claims: None,
        }
    }

    pub fn with_claims(mut self, claims: Arc<dyn ClaimGuard>) -> Self {
        self.claims = Some(claims);
        self
    }

    /// Wire the production adapters from configuration.
    ///
    /// Missing Firebase credentials do not fail here; store and push calls
    /// report a configuration error when first used.
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("taskping/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let tokens = GoogleTokenSource::from_config(&config, http.clone());
        let store: Arc<dyn TaskStore> = Arc::new(FirestoreStore::from_config(
            &config,
            tokens.clone(),
            http.clone(),
        ));
        let channels = Channels::from_config(&config, tokens, http)?;
        let mut context = Self::new(config, store, channels);

        if let Some(redis_url) = context.config.redis_url.clone() {
            let redis = connect_redis(&redis_url).await?;
            let ttl = context.config.claim_ttl_seconds;
            context = context.with_claims(Arc::new(RedisClaimGuard::new(redis, ttl)));
        }

        Ok(context)
    }

    pub fn dispatch_settings(&self) -> DispatchSettings {
        DispatchSettings {
            language: self.config.notify_language.clone(),
            utc_offset_minutes: self.config.notify_utc_offset_minutes,
            unreachable_policy: self.config.scan.unreachable_policy,
        }
    }

    pub fn processor(&self) -> DeadlineProcessor {
        let scanner = DeadlineScanner::new(self.store.clone(), self.config.scan.clone());
        let mut dispatcher = NotificationDispatcher::new(
            self.store.clone(),
            self.channels.clone(),
            self.dispatch_settings(),
        );
        if let Some(claims) = &self.claims {
            dispatcher = dispatcher.with_claims(claims.clone());
        }
        DeadlineProcessor::new(scanner, dispatcher)
    }

    pub fn on_demand(&self) -> OnDemandNotifier {
        OnDemandNotifier::new(self.channels.clone())
    }
}
