use crate::db;
use crate::ipc::error::{write_failed, HandlerErr};
use crate::ipc::helpers::{get_now, get_required_str, get_required_u32, with_workspace};
use crate::ipc::types::{AppState, Request, Workspace};
use crate::models::DailyCounter;
use chrono::SecondsFormat;
use serde_json::{json, Value};
use tracing::info;

fn load(ws: &Workspace, user_id: &str) -> Result<DailyCounter, HandlerErr> {
    Ok(db::load_counter(&ws.conn, user_id)?.unwrap_or_else(|| DailyCounter::idle(user_id)))
}

fn save(ws: &Workspace, counter: &DailyCounter) -> Result<Value, HandlerErr> {
    db::save_counter(&ws.conn, counter).map_err(write_failed("db_update_failed", "counters"))?;
    Ok(json!(counter))
}

fn counter_get(ws: &mut Workspace, params: &Value) -> Result<Value, HandlerErr> {
    let user_id = get_required_str(params, "userId")?;
    let now = get_now(params)?;
    let mut counter = load(ws, &user_id)?;
    if counter.catch_up(now) {
        return save(ws, &counter);
    }
    Ok(json!(counter))
}

fn counter_set(ws: &mut Workspace, params: &Value) -> Result<Value, HandlerErr> {
    let user_id = get_required_str(params, "userId")?;
    let value = get_required_u32(params, "value")?;
    let mut counter = load(ws, &user_id)?;
    counter.counter = value;
    save(ws, &counter)
}

fn counter_start(ws: &mut Workspace, params: &Value) -> Result<Value, HandlerErr> {
    let user_id = get_required_str(params, "userId")?;
    let now = get_now(params)?;
    let counter = DailyCounter {
        user_id: user_id.clone(),
        counter: 0,
        start_date: Some(now.to_rfc3339_opts(SecondsFormat::Secs, true)),
        running: true,
    };
    info!(user_id = %user_id, "daily counter started");
    save(ws, &counter)
}

fn counter_stop(ws: &mut Workspace, params: &Value) -> Result<Value, HandlerErr> {
    let user_id = get_required_str(params, "userId")?;
    let mut counter = load(ws, &user_id)?;
    counter.running = false;
    info!(user_id = %user_id, value = counter.counter, "daily counter stopped");
    save(ws, &counter)
}

fn counter_reset(ws: &mut Workspace, params: &Value) -> Result<Value, HandlerErr> {
    let user_id = get_required_str(params, "userId")?;
    db::delete_counter(&ws.conn, &user_id).map_err(write_failed("db_delete_failed", "counters"))?;
    info!(user_id = %user_id, "daily counter reset");
    Ok(json!(DailyCounter::idle(&user_id)))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "counter.get" => Some(with_workspace(state, req, counter_get)),
        "counter.set" => Some(with_workspace(state, req, counter_set)),
        "counter.start" => Some(with_workspace(state, req, counter_start)),
        "counter.stop" => Some(with_workspace(state, req, counter_stop)),
        "counter.reset" => Some(with_workspace(state, req, counter_reset)),
        _ => None,
    }
}
