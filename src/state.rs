use crate::config::Config;
use crate::db::DbPool;
use std::sync::Arc;

/// Shared handler state: connection pool plus runtime configuration.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<Config>,
}
