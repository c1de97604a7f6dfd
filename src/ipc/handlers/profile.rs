use crate::db;
use crate::ipc::error::{write_failed, HandlerErr};
use crate::ipc::helpers::{get_optional_str, get_required_str, with_workspace};
use crate::ipc::types::{AppState, Request, Workspace};
use crate::models::Profile;
use serde_json::{json, Value};
use tracing::info;

fn get_email(params: &Value) -> Result<String, HandlerErr> {
    let email = get_required_str(params, "email")?;
    if !email.contains('@') {
        return Err(HandlerErr::bad_params("email must contain @"));
    }
    Ok(email)
}

/// Absent leaves the field alone; null or an empty string clears it.
fn text_field(params: &Value, key: &str, field: &mut Option<String>) -> Result<(), HandlerErr> {
    if params.get(key).is_some() {
        *field = get_optional_str(params, key)?;
    }
    Ok(())
}

fn profile_get(ws: &mut Workspace, params: &Value) -> Result<Value, HandlerErr> {
    let email = get_email(params)?;
    let profile = db::load_profile(&ws.conn, &email)?;
    Ok(json!({ "profile": profile }))
}

fn profile_update(ws: &mut Workspace, params: &Value) -> Result<Value, HandlerErr> {
    let email = get_email(params)?;
    let mut profile = db::load_profile(&ws.conn, &email)?.unwrap_or_else(|| Profile::new(&email));
    text_field(params, "name", &mut profile.name)?;
    text_field(params, "college", &mut profile.college)?;
    text_field(params, "image", &mut profile.image)?;
    if let Some(user_id) = get_optional_str(params, "userId")? {
        profile.user_id = user_id;
    }
    db::save_profile(&ws.conn, &profile).map_err(write_failed("db_update_failed", "users"))?;
    info!(email = %email, "profile updated");
    Ok(json!({ "profile": profile }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "profile.get" => Some(with_workspace(state, req, profile_get)),
        "profile.update" => Some(with_workspace(state, req, profile_update)),
        _ => None,
    }
}
