//! Claim guard — Redis-backed per-task claims taken before delivery.
//!
//! Without a guard, two overlapping scan cycles can both see
//! `notificationSent == false` and both deliver. With a guard, a cycle must
//! win `SET task:claim:<id> 1 NX EX ttl` before sending; the loser skips the
//! task. While the claim lives, a task whose completion mark failed is not
//! delivered again. Once the TTL elapses it is picked up only if its due date
//! still falls inside `[now - grace, now + window]`; with the defaults
//! (900 s TTL, 10 min window, no grace) it has left the window by then and is
//! never retried.

use async_trait::async_trait;
use redis::aio::ConnectionManager;

use taskping_common::error::AppError;

/// Atomic per-task claim.
#[async_trait]
pub trait ClaimGuard: Send + Sync {
    /// Returns `true` if this caller now owns the task, `false` if another
    /// caller already does.
    async fn try_claim(&self, task_id: &str) -> Result<bool, AppError>;
}

pub struct RedisClaimGuard {
    redis: ConnectionManager,
    ttl_seconds: u64,
}

impl RedisClaimGuard {
    pub fn new(redis: ConnectionManager, ttl_seconds: u64) -> Self {
        Self { redis, ttl_seconds }
    }

    pub fn key(task_id: &str) -> String {
        format!("task:claim:{}", task_id)
    }
}

#[async_trait]
impl ClaimGuard for RedisClaimGuard {
    async fn try_claim(&self, task_id: &str) -> Result<bool, AppError> {
        let mut redis = self.redis.clone();

        // SET key "1" NX EX ttl
        // Some("OK") when the key was set, None when it already existed
        let result: Option<String> = redis::cmd("SET")
            .arg(Self::key(task_id))
            .arg("1")
            .arg("NX")
            .arg("EX")
            .arg(self.ttl_seconds)
            .query_async(&mut redis)
            .await?;

        let won = result.is_some();
        if !won {
            tracing::debug!(
                todo_id = %task_id,
                ttl_seconds = self.ttl_seconds,
                "Todo already claimed by another cycle"
            );
        }
        Ok(won)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_key_format() {
        assert_eq!(RedisClaimGuard::key("t1"), "task:claim:t1");
    }
}
