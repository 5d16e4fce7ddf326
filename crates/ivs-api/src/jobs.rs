//! Periodic maintenance tasks.

use std::time::Duration;

use sqlx::PgPool;
use tokio::{task::JoinHandle, time::interval};

use ivs_db::repositories::{mock_interview as mock_repo, token as token_repo};

const TOKEN_CLEANUP_DELAY: Duration = Duration::from_secs(3600);
const TOKEN_CLEANUP_PERIOD: Duration = Duration::from_secs(6 * 3600);
const MOCK_EXPIRY_PERIOD: Duration = Duration::from_secs(5 * 60);

/// Start all background jobs. The handles can be aborted on shutdown.
pub fn start_background_jobs(pool: PgPool) -> Vec<JoinHandle<()>> {
    vec![
        tokio::spawn(periodic_token_cleanup_job(pool.clone())),
        tokio::spawn(periodic_mock_expiry_job(pool)),
    ]
}

/// Delete expired refresh tokens every 6 hours, first run after 1 hour.
async fn periodic_token_cleanup_job(pool: PgPool) {
    tokio::time::sleep(TOKEN_CLEANUP_DELAY).await;

    let mut interval = interval(TOKEN_CLEANUP_PERIOD);

    loop {
        interval.tick().await;

        match token_repo::cleanup_expired_refresh_tokens(&pool).await {
            Ok(deleted) if deleted > 0 => {
                tracing::info!(deleted, "Expired refresh tokens cleaned up");
            }
            Ok(_) => {
                tracing::debug!("Token cleanup complete: no expired tokens found");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to clean up refresh tokens");
            }
        }
    }
}

/// Flip overdue mock interviews to `expired` every 5 minutes.
async fn periodic_mock_expiry_job(pool: PgPool) {
    let mut interval = interval(MOCK_EXPIRY_PERIOD);

    loop {
        interval.tick().await;

        match mock_repo::expire_overdue(&pool).await {
            Ok(expired) if expired > 0 => {
                tracing::info!(expired, "Overdue mock interviews expired");
            }
            Ok(_) => {
                tracing::debug!("No overdue mock interviews");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to expire mock interviews");
            }
        }
    }
}
