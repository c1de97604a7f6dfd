use crate::db;
use crate::ipc::error::HandlerErr;
use crate::ipc::helpers::{get_optional_str, get_required_str, respond};
use crate::ipc::types::{AppState, Request};
use crate::time::{self, TimeFormat};
use serde_json::{json, Value};

fn time_to_24_hour(params: &Value) -> Result<Value, HandlerErr> {
    let input = get_required_str(params, "time")?;
    let out = time::to_24_hour(&input)?;
    Ok(json!({ "time": out }))
}

fn time_to_12_hour(params: &Value) -> Result<Value, HandlerErr> {
    let input = get_required_str(params, "time")?;
    let out = time::to_12_hour(&input)?;
    Ok(json!({ "time": out }))
}

/// Explicit `format` wins; otherwise the user's saved preference, which
/// needs an open workspace.
fn time_format(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let input = get_required_str(params, "time")?;
    let format = match get_optional_str(params, "format")? {
        Some(raw) => TimeFormat::parse(&raw)
            .ok_or_else(|| HandlerErr::bad_params("format must be 12h or 24h"))?,
        None => {
            let user_id = get_required_str(params, "userId")
                .map_err(|_| HandlerErr::bad_params("missing format or userId"))?;
            let Some(ws) = state.workspace.as_ref() else {
                return Err(HandlerErr::new("no_workspace", "select a workspace first"));
            };
            db::settings_or_default(&ws.conn, &user_id)?.time_format
        }
    };
    let out = time::format_for_display(&input, format)?;
    Ok(json!({ "time": out, "format": format.as_str() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "time.to24Hour" => Some(respond(req, time_to_24_hour(&req.params))),
        "time.to12Hour" => Some(respond(req, time_to_12_hour(&req.params))),
        "time.format" => Some(respond(req, time_format(state, &req.params))),
        _ => None,
    }
}
