use crate::cache::{FileStore, SystemClock, TtlCache};
use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request, Workspace};
use anyhow::Context;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::info;

pub const CACHE_DIR: &str = "cache";

/// Opens (creating if needed) the workspace database and its cache directory.
pub fn open_workspace(state: &AppState, path: &Path) -> anyhow::Result<Workspace> {
    let conn = db::open_db(path)
        .with_context(|| format!("failed to open workspace {}", path.to_string_lossy()))?;
    let dashboard = TtlCache::new(
        "dashboard",
        FileStore::new(path.join(CACHE_DIR)),
        SystemClock,
        state.config.cache_ttl,
        state.config.cache_refresh_after,
    );
    info!(workspace = %path.to_string_lossy(), "workspace opened");
    Ok(Workspace {
        path: path.to_path_buf(),
        conn,
        dashboard,
    })
}

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|w| w.path.to_string_lossy().to_string())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match open_workspace(state, &path) {
        Ok(ws) => {
            state.workspace = Some(ws);
            ok(&req.id, json!({ "workspacePath": path.to_string_lossy() }))
        }
        Err(e) => err(&req.id, "db_open_failed", format!("{e:?}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
