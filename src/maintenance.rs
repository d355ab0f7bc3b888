//! Periodic maintenance: marks open assignments past their deadline as
//! overdue and clears review drafts past their expiry.

use std::sync::Arc;
use std::time::Duration;

use crate::db;
use crate::state::AppState;

pub fn spawn_sweeper(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(Duration::from_secs(state.config.sweep_interval_secs));
        loop {
            interval.tick().await;
            if let Err(e) = sweep(&state).await {
                tracing::error!("maintenance sweep failed: {}", e);
            }
        }
    });
}

async fn sweep(state: &AppState) -> Result<(), sqlx::Error> {
    let pool = state.pool.as_ref();

    let overdue = db::assignments::mark_overdue(pool).await?;
    if overdue > 0 {
        tracing::info!(count = overdue, "assignments marked overdue");
    }

    let cleared = db::assignments::clear_expired_drafts(pool).await?;
    if cleared > 0 {
        tracing::info!(count = cleared, "expired review drafts cleared");
    }

    Ok(())
}
