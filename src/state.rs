use crate::config::Config;
use axum::extract::FromRef;
use sqlx::SqlitePool;

/// Shared handles for every request. The pool is opened by the host binary
/// and passed in here; nothing in the crate holds a global store handle.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
