use crate::db;
use crate::ipc::error::{write_failed, HandlerErr};
use crate::ipc::helpers::{
    get_optional_f64, get_optional_str, get_optional_u32, get_patch, get_required_str,
    get_required_u32, now_rfc3339, record_activity, respond, with_workspace,
};
use crate::ipc::types::{AppState, Request, Workspace};
use crate::models::{ActivityType, ClassType, Course};
use crate::projection::{self, AttendanceRecord, ProjectionError};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

const DEFAULT_WEEKLY: u32 = 3;
const DEFAULT_REQUIRED: f64 = 75.0;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CourseView<'a> {
    #[serde(flatten)]
    course: &'a Course,
    percent: f64,
    meets_requirement: bool,
    suggestion: String,
}

fn view(course: &Course) -> CourseView<'_> {
    let (meets_requirement, suggestion) = match course.record() {
        Ok(r) => (r.meets_requirement(), projection::suggestion(&r)),
        Err(e) => (false, e.to_string()),
    };
    CourseView {
        course,
        percent: course.percent(),
        meets_requirement,
        suggestion,
    }
}

fn validate(course: &Course) -> Result<(), HandlerErr> {
    if course.course_name.trim().is_empty() {
        return Err(HandlerErr::bad_params("courseName must not be empty"));
    }
    course.record()?;
    Ok(())
}

fn load_course(ws: &Workspace, course_id: &str) -> Result<Course, HandlerErr> {
    db::get_course(&ws.conn, course_id)?.ok_or_else(|| HandlerErr::not_found("course not found"))
}

fn class_type_param(raw: Option<String>) -> Result<Option<ClassType>, HandlerErr> {
    raw.map(|s| {
        ClassType::parse(&s).ok_or_else(|| HandlerErr::bad_params("type must be lecture or lab"))
    })
    .transpose()
}

fn courses_list(ws: &mut Workspace, params: &Value) -> Result<Value, HandlerErr> {
    let user_id = get_required_str(params, "userId")?;
    let semester_id = get_optional_str(params, "semesterId")?;
    let below = get_optional_f64(params, "belowPercent")?;

    let courses = db::list_courses(&ws.conn, &user_id, semester_id.as_deref())?;
    let views: Vec<CourseView<'_>> = courses
        .iter()
        .filter(|c| below.map_or(true, |p| c.percent() < p))
        .map(view)
        .collect();
    Ok(json!({ "courses": views }))
}

fn courses_create(ws: &mut Workspace, params: &Value) -> Result<Value, HandlerErr> {
    let user_id = get_required_str(params, "userId")?;
    let semester_id = match get_optional_str(params, "semesterId")? {
        Some(s) => Some(s),
        None => db::settings_or_default(&ws.conn, &user_id)?.semester_id(),
    };
    let course = Course {
        id: Uuid::new_v4().to_string(),
        user_id,
        semester_id,
        course_name: get_required_str(params, "courseName")?,
        course_code: get_optional_str(params, "courseCode")?.unwrap_or_default(),
        instructor: get_optional_str(params, "instructor")?.unwrap_or_default(),
        weekly: get_optional_u32(params, "weekly")?.unwrap_or(DEFAULT_WEEKLY),
        class_type: class_type_param(get_optional_str(params, "type")?)?
            .unwrap_or(ClassType::Lecture),
        required: get_optional_f64(params, "required")?.unwrap_or(DEFAULT_REQUIRED),
        attended: get_optional_u32(params, "attended")?.unwrap_or(0),
        total: get_optional_u32(params, "total")?.unwrap_or(0),
    };
    validate(&course)?;

    ws.conn
        .execute(
            "INSERT INTO courses(id, user_id, semester_id, course_name, course_code, instructor,
                                 weekly, type, required, attended, total, created_at)
             VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                &course.id,
                &course.user_id,
                &course.semester_id,
                &course.course_name,
                &course.course_code,
                &course.instructor,
                course.weekly,
                course.class_type.as_str(),
                course.required,
                course.attended,
                course.total,
                now_rfc3339(),
            ),
        )
        .map_err(write_failed("db_insert_failed", "courses"))?;

    ws.invalidate_dashboard(&course.user_id, course.semester_id.as_deref());
    info!(course_id = %course.id, user_id = %course.user_id, "course created");
    Ok(json!({ "courseId": course.id, "course": view(&course) }))
}

fn patch_course(course: &mut Course, patch: &serde_json::Map<String, Value>) -> Result<(), HandlerErr> {
    let p = Value::Object(patch.clone());
    if patch.contains_key("courseName") {
        course.course_name = get_required_str(&p, "courseName")?;
    }
    if patch.contains_key("courseCode") {
        course.course_code = get_optional_str(&p, "courseCode")?.unwrap_or_default();
    }
    if patch.contains_key("instructor") {
        course.instructor = get_optional_str(&p, "instructor")?.unwrap_or_default();
    }
    if let Some(n) = get_optional_u32(&p, "weekly")? {
        course.weekly = n;
    }
    if let Some(t) = class_type_param(get_optional_str(&p, "type")?)? {
        course.class_type = t;
    }
    if let Some(r) = get_optional_f64(&p, "required")? {
        course.required = r;
    }
    if let Some(n) = get_optional_u32(&p, "attended")? {
        course.attended = n;
    }
    if let Some(n) = get_optional_u32(&p, "total")? {
        course.total = n;
    }
    Ok(())
}

fn courses_update(ws: &mut Workspace, params: &Value) -> Result<Value, HandlerErr> {
    let course_id = get_required_str(params, "courseId")?;
    let patch = get_patch(params)?;
    let mut course = load_course(ws, &course_id)?;
    let old_name = course.course_name.clone();
    patch_course(&mut course, patch)?;
    validate(&course)?;

    let tx = ws
        .conn
        .unchecked_transaction()
        .map_err(|e| HandlerErr::new("db_tx_failed", e.to_string()))?;
    tx.execute(
        "UPDATE courses
         SET course_name = ?, course_code = ?, instructor = ?, weekly = ?, type = ?,
             required = ?, attended = ?, total = ?
         WHERE id = ?",
        (
            &course.course_name,
            &course.course_code,
            &course.instructor,
            course.weekly,
            course.class_type.as_str(),
            course.required,
            course.attended,
            course.total,
            &course.id,
        ),
    )
    .map_err(write_failed("db_update_failed", "courses"))?;
    // Classes carry the course name for display.
    if course.course_name != old_name {
        tx.execute(
            "UPDATE classes SET course_name = ? WHERE course_id = ?",
            (&course.course_name, &course.id),
        )
        .map_err(write_failed("db_update_failed", "classes"))?;
    }
    tx.commit()
        .map_err(|e| HandlerErr::new("db_commit_failed", e.to_string()))?;

    ws.invalidate_dashboard(&course.user_id, course.semester_id.as_deref());
    Ok(json!({ "course": view(&course) }))
}

fn courses_delete(ws: &mut Workspace, params: &Value) -> Result<Value, HandlerErr> {
    let course_id = get_required_str(params, "courseId")?;
    let course = load_course(ws, &course_id)?;

    let tx = ws
        .conn
        .unchecked_transaction()
        .map_err(|e| HandlerErr::new("db_tx_failed", e.to_string()))?;
    let classes_removed = tx
        .execute("DELETE FROM classes WHERE course_id = ?", [&course_id])
        .map_err(write_failed("db_delete_failed", "classes"))?;
    tx.execute("DELETE FROM courses WHERE id = ?", [&course_id])
        .map_err(write_failed("db_delete_failed", "courses"))?;
    tx.commit()
        .map_err(|e| HandlerErr::new("db_commit_failed", e.to_string()))?;

    ws.invalidate_dashboard(&course.user_id, course.semester_id.as_deref());
    info!(course_id = %course_id, classes_removed, "course deleted");
    Ok(json!({ "ok": true, "classesRemoved": classes_removed }))
}

fn attendance_mark(ws: &mut Workspace, params: &Value) -> Result<Value, HandlerErr> {
    let course_id = get_required_str(params, "courseId")?;
    let attended = match get_required_str(params, "status")?.as_str() {
        "attended" => true,
        "missed" => false,
        _ => return Err(HandlerErr::bad_params("status must be attended or missed")),
    };
    let mut course = load_course(ws, &course_id)?;
    course.total = course
        .total
        .checked_add(1)
        .ok_or_else(|| HandlerErr::bad_params("total overflow"))?;
    if attended {
        course.attended += 1;
    }

    ws.conn
        .execute(
            "UPDATE courses SET attended = ?, total = ? WHERE id = ?",
            (course.attended, course.total, &course.id),
        )
        .map_err(write_failed("db_update_failed", "courses"))?;

    let (label, status) = if attended {
        (format!("Attended {}", course.course_name), "yes")
    } else {
        (format!("Missed {}", course.course_name), "no")
    };
    record_activity(
        ws,
        &course.user_id,
        ActivityType::Attendance,
        label,
        Some(status),
        &course.id,
    );
    ws.invalidate_dashboard(&course.user_id, course.semester_id.as_deref());
    Ok(json!({ "course": view(&course) }))
}

/// `courseId` reads the stored tally; otherwise `attended`, `total` and
/// `required` are taken from the params. Only the first form needs a workspace.
fn record_from_params(state: &AppState, params: &Value) -> Result<AttendanceRecord, HandlerErr> {
    if let Some(course_id) = get_optional_str(params, "courseId")? {
        let Some(ws) = state.workspace.as_ref() else {
            return Err(HandlerErr::new("no_workspace", "select a workspace first"));
        };
        return Ok(load_course(ws, &course_id)?.record()?);
    }
    let attended = get_required_u32(params, "attended")?;
    let total = get_required_u32(params, "total")?;
    let required = get_optional_f64(params, "required")?
        .ok_or_else(|| HandlerErr::bad_params("missing required"))?;
    Ok(AttendanceRecord::new(attended, total, required)?)
}

fn attendance_project(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let record = record_from_params(state, params)?;
    let mut out = json!({
        "attended": record.attended,
        "total": record.total,
        "required": record.required_percent,
        "percent": record.percent(),
        "meetsRequirement": record.meets_requirement(),
        "suggestion": projection::suggestion(&record),
    });
    match record.project() {
        Ok(p) => out["projection"] = json!(p),
        Err(ProjectionError::UnreachableTarget { missed, .. }) => {
            out["projection"] = json!({ "status": "unreachable", "missed": missed });
        }
        Err(ProjectionError::Unbounded { .. }) => {
            out["projection"] = json!({ "status": "unbounded" });
        }
        Err(e) => return Err(e.into()),
    }
    Ok(out)
}

fn attendance_can_skip(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let r = record_from_params(state, params)?;
    let n = projection::classes_can_skip(r.attended, r.total, r.required_percent)?;
    Ok(json!({ "canSkip": n }))
}

fn attendance_needed(state: &AppState, params: &Value) -> Result<Value, HandlerErr> {
    let r = record_from_params(state, params)?;
    let n = projection::classes_needed_to_reach(r.attended, r.total, r.required_percent)?;
    Ok(json!({ "mustAttend": n }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "courses.list" => Some(with_workspace(state, req, courses_list)),
        "courses.create" => Some(with_workspace(state, req, courses_create)),
        "courses.update" => Some(with_workspace(state, req, courses_update)),
        "courses.delete" => Some(with_workspace(state, req, courses_delete)),
        "attendance.mark" => Some(with_workspace(state, req, attendance_mark)),
        "attendance.project" => Some(respond(req, attendance_project(state, &req.params))),
        "attendance.canSkip" => Some(respond(req, attendance_can_skip(state, &req.params))),
        "attendance.neededToReach" => Some(respond(req, attendance_needed(state, &req.params))),
        _ => None,
    }
}
