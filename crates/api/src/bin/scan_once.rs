//! Run a single scan-and-notify cycle and print its report.
//!
//! Meant for external schedulers (cron, Cloud Scheduler jobs) that prefer a
//! process over an HTTP call. Exits with status 1 when the cycle fails.

use chrono::Utc;

use taskping_common::config::AppConfig;
use taskping_engine::context::ServiceContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskping_engine=info,taskping_notifier=info".into()),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_env()?;
    let context = ServiceContext::from_config(config).await?;

    match context.processor().run_cycle(Utc::now()).await {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "Scan cycle failed");
            let body = serde_json::json!({
                "error": "Failed to check deadlines",
                "message": e.to_string(),
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
            std::process::exit(1);
        }
    }
}
