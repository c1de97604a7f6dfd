use crate::db;
use crate::ipc::error::{write_failed, HandlerErr};
use crate::ipc::helpers::{get_patch, get_required_str, with_workspace};
use crate::ipc::types::{AppState, Request, Workspace};
use crate::models::{Settings, Theme};
use crate::time::TimeFormat;
use chrono::NaiveDate;
use serde_json::{json, Value};
use tracing::info;

const LECTURE_RANGE: (u64, u64) = (30, 180);
const LAB_RANGE: (u64, u64) = (30, 240);

fn settings_get(ws: &mut Workspace, params: &Value) -> Result<Value, HandlerErr> {
    let user_id = get_required_str(params, "userId")?;
    let stored = db::load_settings(&ws.conn, &user_id)?;
    let is_stored = stored.is_some();
    let settings = stored.unwrap_or_else(|| Settings::defaults(&user_id));
    Ok(json!({
        "settings": settings,
        "stored": is_stored,
        "semesterId": settings.semester_id(),
    }))
}

struct Problems(Vec<Value>);

impl Problems {
    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(json!({ "field": field, "message": message.into() }));
    }
}

fn duration_field(
    patch: &serde_json::Map<String, Value>,
    key: &str,
    (min, max): (u64, u64),
    problems: &mut Problems,
) -> Option<u32> {
    let v = patch.get(key)?;
    match v.as_u64() {
        Some(n) if (min..=max).contains(&n) => Some(n as u32),
        _ => {
            problems.push(key, format!("must be an integer between {} and {}", min, max));
            None
        }
    }
}

/// `Some(None)` clears the date; ISO `YYYY-MM-DD` otherwise.
fn date_field(
    patch: &serde_json::Map<String, Value>,
    key: &str,
    problems: &mut Problems,
) -> Option<Option<String>> {
    match patch.get(key)? {
        Value::Null => Some(None),
        Value::String(s) => match NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d") {
            Ok(d) => Some(Some(d.format("%Y-%m-%d").to_string())),
            Err(_) => {
                problems.push(key, "must be a YYYY-MM-DD date");
                None
            }
        },
        _ => {
            problems.push(key, "must be a YYYY-MM-DD date or null");
            None
        }
    }
}

/// Applies every valid field of `patch`; any invalid field rejects the
/// whole update with all problems listed.
pub fn apply_patch(
    current: &Settings,
    patch: &serde_json::Map<String, Value>,
) -> Result<Settings, HandlerErr> {
    let mut next = current.clone();
    let mut problems = Problems(Vec::new());

    if let Some(n) = duration_field(patch, "lectureDuration", LECTURE_RANGE, &mut problems) {
        next.lecture_duration = n;
    }
    if let Some(n) = duration_field(patch, "labDuration", LAB_RANGE, &mut problems) {
        next.lab_duration = n;
    }
    if let Some(v) = patch.get("notifSound") {
        match v.as_bool() {
            Some(b) => next.notif_sound = b,
            None => problems.push("notifSound", "must be boolean"),
        }
    }
    if let Some(v) = patch.get("timeFormat") {
        match v.as_str().and_then(TimeFormat::parse) {
            Some(f) => next.time_format = f,
            None => problems.push("timeFormat", "must be 12h or 24h"),
        }
    }
    if let Some(v) = patch.get("theme") {
        match v.as_str().and_then(Theme::parse) {
            Some(t) => next.theme = t,
            None => problems.push("theme", "must be light, dark or system"),
        }
    }
    if let Some(d) = date_field(patch, "semesterStart", &mut problems) {
        next.semester_start = d;
    }
    if let Some(d) = date_field(patch, "semesterEnd", &mut problems) {
        next.semester_end = d;
    }
    // Zero-padded ISO dates compare correctly as strings.
    if let (Some(start), Some(end)) = (&next.semester_start, &next.semester_end) {
        if start > end {
            problems.push("semesterEnd", "must not be before semesterStart");
        }
    }

    if !problems.0.is_empty() {
        return Err(HandlerErr::bad_params("invalid settings")
            .with_details(json!({ "errors": problems.0 })));
    }
    Ok(next)
}

fn settings_update(ws: &mut Workspace, params: &Value) -> Result<Value, HandlerErr> {
    let user_id = get_required_str(params, "userId")?;
    let patch = get_patch(params)?;
    let current = db::settings_or_default(&ws.conn, &user_id)?;
    let next = apply_patch(&current, patch)?;
    db::save_settings(&ws.conn, &next).map_err(write_failed("db_update_failed", "settings"))?;
    ws.invalidate_dashboard(&user_id, None);
    info!(user_id = %user_id, "settings updated");
    Ok(json!({
        "settings": next,
        "semesterId": next.semester_id(),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "settings.get" => Some(with_workspace(state, req, settings_get)),
        "settings.update" => Some(with_workspace(state, req, settings_update)),
        _ => None,
    }
}
