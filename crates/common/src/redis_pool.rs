use redis::Client;
use redis::aio::ConnectionManager;

/// Open a Redis connection manager for the claim guard.
///
/// The manager reconnects on its own, so one instance is created per process
/// and cloned into every dispatcher.
pub async fn connect_redis(redis_url: &str) -> anyhow::Result<ConnectionManager> {
    let client = Client::open(redis_url)?;
    let manager = ConnectionManager::new(client).await?;

    tracing::info!("Connected to Redis for task claims");
    Ok(manager)
}
