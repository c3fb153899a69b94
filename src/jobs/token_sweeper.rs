//! Periodic removal of refresh-token rows past expiry. Hygiene only: expired
//! rows are already unusable, so this job never changes security state and
//! can run concurrently with everything else.

use std::time::Duration;

use sqlx::PgPool;
use tokio::time::{interval, MissedTickBehavior};

use crate::db::token_repo;

pub fn spawn(pool: PgPool, interval_secs: u64) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match token_repo::sweep_expired(&pool).await {
                Ok(0) => {}
                Ok(swept) => tracing::info!(swept, "removed expired refresh tokens"),
                Err(e) => tracing::error!("refresh token sweep failed: {e}"),
            }
        }
    })
}
