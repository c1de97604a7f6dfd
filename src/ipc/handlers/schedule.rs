use crate::db;
use crate::ipc::error::{write_failed, HandlerErr};
use crate::ipc::helpers::{
    get_optional_str, get_optional_time, get_optional_u32, get_patch, get_required_str, get_time,
    get_weekday, with_workspace,
};
use crate::ipc::types::{AppState, Request, Workspace};
use crate::models::{ClassEntry, ClassType, Settings};
use crate::schedule::{self, ClassSlot, Weekday};
use crate::time::{TimeFormat, TimeOfDay};
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

fn load_class(ws: &Workspace, class_id: &str) -> Result<ClassEntry, HandlerErr> {
    db::get_class(&ws.conn, class_id)?.ok_or_else(|| HandlerErr::not_found("class not found"))
}

fn class_type_param(params: &Value) -> Result<Option<ClassType>, HandlerErr> {
    get_optional_str(params, "type")?
        .map(|s| {
            ClassType::parse(&s).ok_or_else(|| HandlerErr::bad_params("type must be lecture or lab"))
        })
        .transpose()
}

fn default_end(settings: &Settings, start: TimeOfDay, class_type: ClassType) -> Result<TimeOfDay, HandlerErr> {
    Ok(start.checked_add_minutes(settings.duration_for(class_type))?)
}

fn conflict_json(c: &ClassEntry) -> Value {
    json!({
        "classId": c.id,
        "courseId": c.course_id,
        "courseName": c.course_name,
        "day": c.day,
        "startTime": c.start_time,
        "endTime": c.end_time,
    })
}

/// Stored classes that collide with `candidate`, skipping the class being edited.
fn find_conflicts(
    ws: &Workspace,
    user_id: &str,
    semester_id: Option<&str>,
    candidate: &ClassSlot,
    ignore_id: Option<&str>,
) -> Result<Vec<ClassEntry>, HandlerErr> {
    let existing = db::list_classes(&ws.conn, user_id, semester_id)?;
    let slots: Vec<ClassSlot> = existing.iter().map(ClassEntry::slot).collect();
    let hits: Vec<String> = schedule::conflicts(candidate, &slots, ignore_id)
        .into_iter()
        .filter_map(|s| s.id.clone())
        .collect();
    Ok(existing.into_iter().filter(|c| hits.contains(&c.id)).collect())
}

fn ensure_free(
    ws: &Workspace,
    entry: &ClassEntry,
    ignore_id: Option<&str>,
) -> Result<(), HandlerErr> {
    let clash = find_conflicts(ws, &entry.user_id, entry.semester_id.as_deref(), &entry.slot(), ignore_id)?;
    if clash.is_empty() {
        return Ok(());
    }
    debug!(day = %entry.day, start = %entry.start_time, conflicts = clash.len(), "schedule conflict");
    Err(HandlerErr::new(
        "schedule_conflict",
        format!(
            "{} {}-{} overlaps {} existing class(es)",
            entry.day,
            entry.start_time,
            entry.end_time,
            clash.len()
        ),
    )
    .with_details(json!({ "conflicts": clash.iter().map(conflict_json).collect::<Vec<_>>() })))
}

fn classes_list(ws: &mut Workspace, params: &Value) -> Result<Value, HandlerErr> {
    let user_id = get_required_str(params, "userId")?;
    let semester_id = get_optional_str(params, "semesterId")?;
    let day = match get_optional_str(params, "day")? {
        Some(_) => Some(get_weekday(params, "day")?),
        None => None,
    };
    let classes: Vec<ClassEntry> = db::list_classes(&ws.conn, &user_id, semester_id.as_deref())?
        .into_iter()
        .filter(|c| day.map_or(true, |d| c.day == d))
        .collect();
    Ok(json!({ "classes": classes }))
}

fn classes_create(ws: &mut Workspace, params: &Value) -> Result<Value, HandlerErr> {
    let user_id = get_required_str(params, "userId")?;
    let course_id = get_required_str(params, "courseId")?;
    let course = db::get_course(&ws.conn, &course_id)?
        .ok_or_else(|| HandlerErr::not_found("course not found"))?;
    let day = get_weekday(params, "day")?;
    let start = get_time(params, "startTime")?;
    let class_type = class_type_param(params)?.unwrap_or(course.class_type);
    let settings = db::settings_or_default(&ws.conn, &user_id)?;
    let end = match get_optional_time(params, "endTime")? {
        Some(t) => t,
        None => default_end(&settings, start, class_type)?,
    };
    ClassSlot::new(None, &course_id, day, start, end)?;

    let entry = ClassEntry {
        id: Uuid::new_v4().to_string(),
        semester_id: match get_optional_str(params, "semesterId")? {
            Some(s) => Some(s),
            None => course.semester_id.clone(),
        },
        user_id,
        course_id,
        course_name: course.course_name,
        day,
        start_time: start,
        end_time: end,
        class_type,
        instructor: get_optional_str(params, "instructor")?,
        room: get_optional_str(params, "room")?.unwrap_or_default(),
    };
    ensure_free(ws, &entry, None)?;

    ws.conn
        .execute(
            "INSERT INTO classes(id, user_id, semester_id, course_id, course_name, day,
                                 start_time, end_time, type, instructor, room)
             VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                &entry.id,
                &entry.user_id,
                &entry.semester_id,
                &entry.course_id,
                &entry.course_name,
                entry.day.as_str(),
                entry.start_time.format_24h(),
                entry.end_time.format_24h(),
                entry.class_type.as_str(),
                &entry.instructor,
                &entry.room,
            ),
        )
        .map_err(write_failed("db_insert_failed", "classes"))?;

    ws.invalidate_dashboard(&entry.user_id, entry.semester_id.as_deref());
    info!(class_id = %entry.id, day = %entry.day, start = %entry.start_time, "class created");
    Ok(json!({ "classId": entry.id, "class": entry }))
}

fn classes_update(ws: &mut Workspace, params: &Value) -> Result<Value, HandlerErr> {
    let class_id = get_required_str(params, "classId")?;
    let patch = Value::Object(get_patch(params)?.clone());
    let mut entry = load_class(ws, &class_id)?;

    if patch.get("day").is_some() {
        entry.day = get_weekday(&patch, "day")?;
    }
    if patch.get("room").is_some() {
        entry.room = get_optional_str(&patch, "room")?.unwrap_or_default();
    }
    if patch.get("instructor").is_some() {
        entry.instructor = get_optional_str(&patch, "instructor")?;
    }
    let new_start = get_optional_time(&patch, "startTime")?;
    let new_type = class_type_param(&patch)?;
    if let Some(t) = new_start {
        entry.start_time = t;
    }
    if let Some(t) = new_type {
        entry.class_type = t;
    }
    match get_optional_time(&patch, "endTime")? {
        Some(t) => entry.end_time = t,
        None if new_start.is_some() || new_type.is_some() => {
            let settings = db::settings_or_default(&ws.conn, &entry.user_id)?;
            entry.end_time = default_end(&settings, entry.start_time, entry.class_type)?;
        }
        None => {}
    }
    ClassSlot::new(None, &entry.course_id, entry.day, entry.start_time, entry.end_time)?;
    ensure_free(ws, &entry, Some(&class_id))?;

    ws.conn
        .execute(
            "UPDATE classes
             SET day = ?, start_time = ?, end_time = ?, type = ?, instructor = ?, room = ?
             WHERE id = ?",
            (
                entry.day.as_str(),
                entry.start_time.format_24h(),
                entry.end_time.format_24h(),
                entry.class_type.as_str(),
                &entry.instructor,
                &entry.room,
                &entry.id,
            ),
        )
        .map_err(write_failed("db_update_failed", "classes"))?;

    ws.invalidate_dashboard(&entry.user_id, entry.semester_id.as_deref());
    Ok(json!({ "class": entry }))
}

fn classes_delete(ws: &mut Workspace, params: &Value) -> Result<Value, HandlerErr> {
    let class_id = get_required_str(params, "classId")?;
    let entry = load_class(ws, &class_id)?;
    ws.conn
        .execute("DELETE FROM classes WHERE id = ?", [&class_id])
        .map_err(write_failed("db_delete_failed", "classes"))?;
    ws.invalidate_dashboard(&entry.user_id, entry.semester_id.as_deref());
    Ok(json!({ "ok": true }))
}

fn schedule_check_overlap(ws: &mut Workspace, params: &Value) -> Result<Value, HandlerErr> {
    let user_id = get_required_str(params, "userId")?;
    let semester_id = get_optional_str(params, "semesterId")?;
    let ignore_id = get_optional_str(params, "ignoreClassId")?;
    let candidate = ClassSlot::new(
        None,
        "",
        get_weekday(params, "day")?,
        get_time(params, "startTime")?,
        get_time(params, "endTime")?,
    )?;
    let clash = find_conflicts(ws, &user_id, semester_id.as_deref(), &candidate, ignore_id.as_deref())?;
    Ok(json!({
        "overlaps": !clash.is_empty(),
        "conflicts": clash.iter().map(conflict_json).collect::<Vec<_>>(),
    }))
}

fn schedule_suggest_slot(
    ws: &mut Workspace,
    params: &Value,
    day_window: (TimeOfDay, TimeOfDay),
) -> Result<Value, HandlerErr> {
    let user_id = get_required_str(params, "userId")?;
    let semester_id = get_optional_str(params, "semesterId")?;
    let day = get_weekday(params, "day")?;
    let settings = db::settings_or_default(&ws.conn, &user_id)?;
    let duration = match get_optional_u32(params, "durationMinutes")? {
        Some(n) => n,
        None => settings.duration_for(class_type_param(params)?.unwrap_or(ClassType::Lecture)),
    };
    let duration = u16::try_from(duration)
        .ok()
        .filter(|d| *d > 0)
        .ok_or_else(|| HandlerErr::bad_params("durationMinutes must be between 1 and 1439"))?;
    let day_start = get_optional_time(params, "dayStart")?.unwrap_or(day_window.0);
    let day_end = get_optional_time(params, "dayEnd")?.unwrap_or(day_window.1);
    if day_start >= day_end {
        return Err(HandlerErr::bad_params("dayStart must be before dayEnd"));
    }

    let slots: Vec<ClassSlot> = db::list_classes(&ws.conn, &user_id, semester_id.as_deref())?
        .iter()
        .map(ClassEntry::slot)
        .collect();
    let found = schedule::suggest_next_free_slot(day, duration, &slots, day_start, day_end);
    let Some(start) = found else {
        return Ok(json!({ "found": false, "durationMinutes": duration }));
    };
    let end = start.checked_add_minutes(u32::from(duration))?;
    Ok(json!({
        "found": true,
        "day": day,
        "startTime": start,
        "endTime": end,
        "durationMinutes": duration,
        "display": {
            "startTime": start.format(settings.time_format),
            "endTime": end.format(settings.time_format),
        },
    }))
}

fn agenda_json(entries: &[ClassEntry], day: Weekday, format: TimeFormat) -> Vec<Value> {
    let slots: Vec<ClassSlot> = entries.iter().map(ClassEntry::slot).collect();
    schedule::day_agenda(day, &slots)
        .into_iter()
        .filter_map(|slot| entries.iter().find(|c| Some(&c.id) == slot.id.as_ref()))
        .map(|c| {
            json!({
                "class": c,
                "display": {
                    "startTime": c.start_time.format(format),
                    "endTime": c.end_time.format(format),
                },
            })
        })
        .collect()
}

fn schedule_day(ws: &mut Workspace, params: &Value) -> Result<Value, HandlerErr> {
    let user_id = get_required_str(params, "userId")?;
    let semester_id = get_optional_str(params, "semesterId")?;
    let day = get_weekday(params, "day")?;
    let settings = db::settings_or_default(&ws.conn, &user_id)?;
    let entries = db::list_classes(&ws.conn, &user_id, semester_id.as_deref())?;
    Ok(json!({
        "day": day,
        "timeFormat": settings.time_format,
        "classes": agenda_json(&entries, day, settings.time_format),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "classes.list" => Some(with_workspace(state, req, classes_list)),
        "classes.create" => Some(with_workspace(state, req, classes_create)),
        "classes.update" => Some(with_workspace(state, req, classes_update)),
        "classes.delete" => Some(with_workspace(state, req, classes_delete)),
        "schedule.checkOverlap" => Some(with_workspace(state, req, schedule_check_overlap)),
        "schedule.suggestSlot" => {
            let window = (state.config.day_start, state.config.day_end);
            Some(with_workspace(state, req, |ws, params| {
                schedule_suggest_slot(ws, params, window)
            }))
        }
        "schedule.day" => Some(with_workspace(state, req, schedule_day)),
        _ => None,
    }
}
