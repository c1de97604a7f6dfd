use crate::cache::{FileStore, TtlCache};
use crate::config::Config;
use crate::dashboard::DashboardSnapshot;
use rusqlite::Connection;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub type DashboardCache = TtlCache<DashboardSnapshot, FileStore>;

pub struct Workspace {
    pub path: PathBuf,
    pub conn: Connection,
    pub dashboard: DashboardCache,
}

impl Workspace {
    pub fn dashboard_key(user_id: &str, semester_id: Option<&str>) -> String {
        format!("{}/{}", user_id, semester_id.unwrap_or(""))
    }

    /// Drops the cached dashboard data for a user after one of their records
    /// changed. Failure only costs a stale read, so it is logged, not raised.
    pub fn invalidate_dashboard(&mut self, user_id: &str, semester_id: Option<&str>) {
        let mut keys = vec![Self::dashboard_key(user_id, None)];
        if semester_id.is_some() {
            keys.push(Self::dashboard_key(user_id, semester_id));
        }
        for key in keys {
            if let Err(e) = self.dashboard.invalidate(&key) {
                warn!(key = %key, error = %e, "failed to invalidate dashboard cache");
            }
        }
    }
}

pub struct AppState {
    pub config: Config,
    pub workspace: Option<Workspace>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            workspace: None,
        }
    }
}
