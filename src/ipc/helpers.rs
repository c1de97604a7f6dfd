use crate::ipc::error::{err, ok, HandlerErr};
use crate::ipc::types::{AppState, Request, Workspace};
use crate::models::{Activity, ActivityType};
use crate::schedule::Weekday;
use crate::time::TimeOfDay;
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

pub fn get_required_str(params: &Value, key: &str) -> Result<String, HandlerErr> {
    let s = params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))?;
    if s.is_empty() {
        return Err(HandlerErr::bad_params(format!("{} must not be empty", key)));
    }
    Ok(s)
}

/// Missing or null is `None`; anything other than a string is rejected.
pub fn get_optional_str(params: &Value, key: &str) -> Result<Option<String>, HandlerErr> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let t = s.trim();
            Ok((!t.is_empty()).then(|| t.to_string()))
        }
        Some(_) => Err(HandlerErr::bad_params(format!("{} must be a string", key))),
    }
}

pub fn get_optional_u32(params: &Value, key: &str) -> Result<Option<u32>, HandlerErr> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| HandlerErr::bad_params(format!("{} must be a non-negative integer", key))),
    }
}

pub fn get_required_u32(params: &Value, key: &str) -> Result<u32, HandlerErr> {
    get_optional_u32(params, key)?.ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_optional_f64(params: &Value, key: &str) -> Result<Option<f64>, HandlerErr> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| HandlerErr::bad_params(format!("{} must be a number", key))),
    }
}

pub fn get_optional_bool(params: &Value, key: &str) -> Result<Option<bool>, HandlerErr> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_bool()
            .map(Some)
            .ok_or_else(|| HandlerErr::bad_params(format!("{} must be boolean", key))),
    }
}

pub fn get_weekday(params: &Value, key: &str) -> Result<Weekday, HandlerErr> {
    let raw = get_required_str(params, key)?;
    Weekday::parse(&raw).ok_or_else(|| {
        HandlerErr::bad_params(format!("{} must be one of monday..friday, got {:?}", key, raw))
    })
}

pub fn get_time(params: &Value, key: &str) -> Result<TimeOfDay, HandlerErr> {
    let raw = get_required_str(params, key)?;
    Ok(TimeOfDay::parse_any(&raw)?)
}

pub fn get_optional_time(params: &Value, key: &str) -> Result<Option<TimeOfDay>, HandlerErr> {
    match get_optional_str(params, key)? {
        Some(raw) => Ok(Some(TimeOfDay::parse_any(&raw)?)),
        None => Ok(None),
    }
}

pub fn get_patch(params: &Value) -> Result<&serde_json::Map<String, Value>, HandlerErr> {
    params
        .get("patch")
        .and_then(|v| v.as_object())
        .ok_or_else(|| HandlerErr::bad_params("missing patch object"))
}

/// `now` as an RFC 3339 timestamp, defaulting to the current time.
pub fn get_now(params: &Value) -> Result<DateTime<FixedOffset>, HandlerErr> {
    match get_optional_str(params, "now")? {
        Some(raw) => DateTime::parse_from_rfc3339(&raw)
            .map_err(|_| HandlerErr::bad_params("now must be an RFC 3339 timestamp")),
        None => Ok(Utc::now().into()),
    }
}

pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn record_activity(
    ws: &Workspace,
    user_id: &str,
    activity_type: ActivityType,
    label: String,
    status: Option<&str>,
    related_id: &str,
) {
    let activity = Activity {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        activity_type,
        label,
        time: now_rfc3339(),
        status: status.map(str::to_string),
        related_id: Some(related_id.to_string()),
    };
    if let Err(e) = crate::db::insert_activity(&ws.conn, &activity) {
        warn!(user_id, error = %e, "failed to record activity");
    }
}

pub fn respond(req: &Request, result: Result<Value, HandlerErr>) -> Value {
    match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => {
            warn!(id = %req.id, method = %req.method, code = e.code, message = %e.message, "request failed");
            e.response(&req.id)
        }
    }
}

/// Runs a handler that needs an open workspace.
pub fn with_workspace<F>(state: &mut AppState, req: &Request, f: F) -> Value
where
    F: FnOnce(&mut Workspace, &Value) -> Result<Value, HandlerErr>,
{
    let Some(ws) = state.workspace.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    respond(req, f(ws, &req.params))
}
