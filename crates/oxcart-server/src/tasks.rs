//! Background maintenance tasks.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use oxcart_auth::session::SessionManager;

/// Spawns the periodic token garbage-collection loop.
///
/// Each tick deletes expired refresh records, revoked records past the
/// retention window, and expired blacklist entries. Errors are logged and
/// the loop continues. Abort the returned handle on shutdown.
pub fn spawn_token_cleanup(
    sessions: Arc<SessionManager>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // A delayed tick should not cause a burst of catch-up passes.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = interval.as_secs(), "token cleanup task started");

        loop {
            ticker.tick().await;
            match sessions.cleanup_expired_tokens().await {
                Ok(report) if report.total() == 0 => {
                    debug!("token cleanup pass: nothing to delete");
                }
                Ok(report) => {
                    info!(
                        expired_refresh_tokens = report.expired_refresh_tokens,
                        stale_revoked_tokens = report.stale_revoked_tokens,
                        expired_blacklist_entries = report.expired_blacklist_entries,
                        "token cleanup pass completed"
                    );
                }
                Err(e) => {
                    warn!(error = %e, "token cleanup pass failed; will retry next tick");
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use oxcart_auth::storage::{
        MemoryBlacklistStore, MemoryRefreshTokenStore, MemoryUserStore, RefreshTokenStore,
    };
    use oxcart_auth::token::TokenCodec;
    use oxcart_auth::types::RefreshTokenRecord;
    use time::{Duration as TimeDuration, OffsetDateTime};
    use uuid::Uuid;

    #[tokio::test]
    async fn cleanup_task_sweeps_expired_records() {
        let refresh_tokens = Arc::new(MemoryRefreshTokenStore::new());
        let sessions = Arc::new(SessionManager::new(
            Arc::new(TokenCodec::new(
                "test-secret-material-at-least-32-bytes",
                Duration::from_secs(900),
                Duration::from_secs(7 * 24 * 3600),
            )),
            Arc::clone(&refresh_tokens) as Arc<dyn RefreshTokenStore>,
            Arc::new(MemoryBlacklistStore::new()),
            Arc::new(MemoryUserStore::new()),
            Duration::from_secs(30 * 24 * 3600),
        ));

        let expired = RefreshTokenRecord::new(
            "tok-expired",
            Uuid::new_v4(),
            OffsetDateTime::now_utc() - TimeDuration::hours(1),
        );
        refresh_tokens.save(&expired).await.unwrap();

        let handle = spawn_token_cleanup(Arc::clone(&sessions), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.abort();

        let remaining = refresh_tokens.find_by_token("tok-expired").await.unwrap();
        assert!(remaining.is_none());
    }
}
