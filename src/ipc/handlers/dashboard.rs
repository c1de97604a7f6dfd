use crate::cache::Lookup;
use crate::dashboard::{self, DashboardSnapshot};
use crate::db;
use crate::ipc::error::HandlerErr;
use crate::ipc::helpers::{get_now, get_optional_str, get_required_str, with_workspace};
use crate::ipc::types::{AppState, Request, Workspace};
use serde_json::{json, Value};
use tracing::{info, warn};

fn load_snapshot(
    ws: &Workspace,
    user_id: &str,
    semester_id: Option<&str>,
) -> Result<DashboardSnapshot, HandlerErr> {
    Ok(DashboardSnapshot {
        courses: db::list_courses(&ws.conn, user_id, semester_id)?,
        classes: db::list_classes(&ws.conn, user_id, semester_id)?,
        tasks: db::list_tasks(&ws.conn, user_id, semester_id)?,
    })
}

/// Fresh cache hits are served as-is. Stale hits and misses reload from the
/// database and re-store; a broken cache degrades to a miss.
fn dashboard_summary(ws: &mut Workspace, params: &Value) -> Result<Value, HandlerErr> {
    let user_id = get_required_str(params, "userId")?;
    let semester_id = get_optional_str(params, "semesterId")?;
    let now = get_now(params)?;
    let key = Workspace::dashboard_key(&user_id, semester_id.as_deref());

    let lookup = ws.dashboard.get(&key).unwrap_or_else(|e| {
        warn!(key = %key, error = %e, "dashboard cache read failed");
        Lookup::Miss
    });
    let (snapshot, source) = match lookup {
        Lookup::Fresh(snapshot) => (snapshot, "cache"),
        Lookup::Stale { age, .. } => {
            info!(key = %key, age_secs = age.as_secs(), "dashboard cache stale, refreshing");
            (load_snapshot(ws, &user_id, semester_id.as_deref())?, "refreshed")
        }
        Lookup::Miss => (load_snapshot(ws, &user_id, semester_id.as_deref())?, "db"),
    };
    if source != "cache" {
        if let Err(e) = ws.dashboard.put(&key, &snapshot) {
            warn!(key = %key, error = %e, "dashboard cache write failed");
        }
    }

    Ok(json!({
        "summary": dashboard::summarize(&snapshot, now),
        "source": source,
        "refreshed": source != "cache",
    }))
}

fn dashboard_invalidate(ws: &mut Workspace, params: &Value) -> Result<Value, HandlerErr> {
    let user_id = get_required_str(params, "userId")?;
    let semester_id = get_optional_str(params, "semesterId")?;
    ws.invalidate_dashboard(&user_id, semester_id.as_deref());
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "dashboard.summary" => Some(with_workspace(state, req, dashboard_summary)),
        "dashboard.invalidate" => Some(with_workspace(state, req, dashboard_invalidate)),
        _ => None,
    }
}
