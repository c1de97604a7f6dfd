use crate::db;
use crate::ipc::error::HandlerErr;
use crate::ipc::helpers::{get_optional_str, get_optional_u32, get_required_str, with_workspace};
use crate::ipc::types::{AppState, Request, Workspace};
use crate::models::ActivityType;
use serde_json::{json, Value};

fn activity_list(ws: &mut Workspace, params: &Value) -> Result<Value, HandlerErr> {
    let user_id = get_required_str(params, "userId")?;
    let kind = match get_optional_str(params, "type")?.as_deref() {
        None | Some("all") => None,
        Some(raw) => Some(ActivityType::parse(raw).ok_or_else(|| {
            HandlerErr::bad_params("type must be attendance, task or all")
        })?),
    };
    let mut activities = db::list_activities(&ws.conn, &user_id, kind)?;
    if let Some(limit) = get_optional_u32(params, "limit")? {
        activities.truncate(limit as usize);
    }
    Ok(json!({ "activities": activities }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "activity.list" => Some(with_workspace(state, req, activity_list)),
        _ => None,
    }
}
