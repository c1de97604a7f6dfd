use crate::db;
use crate::ipc::error::{write_failed, HandlerErr};
use crate::ipc::helpers::{
    get_optional_bool, get_optional_str, get_patch, get_required_str, record_activity,
    with_workspace,
};
use crate::ipc::types::{AppState, Request, Workspace};
use crate::models::{ActivityType, Priority, Task};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

/// RFC 3339 passes through normalized; a bare `YYYY-MM-DD` means midnight UTC.
pub fn parse_due(raw: &str) -> Result<String, HandlerErr> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.to_rfc3339_opts(SecondsFormat::Secs, true));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().to_rfc3339_opts(SecondsFormat::Secs, true))
        .ok_or_else(|| HandlerErr::bad_params("due must be an RFC 3339 timestamp or YYYY-MM-DD"))
}

fn priority_param(params: &Value) -> Result<Option<Priority>, HandlerErr> {
    get_optional_str(params, "priority")?
        .map(|s| {
            Priority::parse(&s)
                .ok_or_else(|| HandlerErr::bad_params("priority must be high, medium or low"))
        })
        .transpose()
}

fn load_task(ws: &Workspace, task_id: &str) -> Result<Task, HandlerErr> {
    db::get_task(&ws.conn, task_id)?.ok_or_else(|| HandlerErr::not_found("task not found"))
}

/// Priority first (high before low), then earliest due; unparsable dates last.
pub fn sort_tasks(tasks: &mut [Task]) {
    tasks.sort_by_key(|t| {
        let due = t.due_at().map(|d| d.with_timezone(&Utc));
        (t.priority, due.is_none(), due)
    });
}

fn tasks_list(ws: &mut Workspace, params: &Value) -> Result<Value, HandlerErr> {
    let user_id = get_required_str(params, "userId")?;
    let semester_id = get_optional_str(params, "semesterId")?;
    let filter = get_optional_str(params, "filter")?.unwrap_or_else(|| "all".to_string());
    let keep: fn(&Task) -> bool = match filter.as_str() {
        "all" => |_| true,
        "completed" => |t| t.completed,
        "incomplete" => |t| !t.completed,
        _ => {
            return Err(HandlerErr::bad_params(
                "filter must be all, completed or incomplete",
            ))
        }
    };
    let mut tasks: Vec<Task> = db::list_tasks(&ws.conn, &user_id, semester_id.as_deref())?
        .into_iter()
        .filter(keep)
        .collect();
    sort_tasks(&mut tasks);
    Ok(json!({ "tasks": tasks }))
}

/// `courseId` pulls the display name from the stored course; a free-text
/// `course` label is accepted when the task is not tied to one.
fn course_ref(ws: &Workspace, params: &Value) -> Result<Option<(String, String)>, HandlerErr> {
    if let Some(course_id) = get_optional_str(params, "courseId")? {
        let course = db::get_course(&ws.conn, &course_id)?
            .ok_or_else(|| HandlerErr::not_found("course not found"))?;
        return Ok(Some((course.id, course.course_name)));
    }
    Ok(get_optional_str(params, "course")?.map(|name| (String::new(), name)))
}

fn tasks_create(ws: &mut Workspace, params: &Value) -> Result<Value, HandlerErr> {
    let user_id = get_required_str(params, "userId")?;
    let semester_id = match get_optional_str(params, "semesterId")? {
        Some(s) => Some(s),
        None => db::settings_or_default(&ws.conn, &user_id)?.semester_id(),
    };
    let (course_id, course) = course_ref(ws, params)?.unwrap_or_default();
    let task = Task {
        id: Uuid::new_v4().to_string(),
        user_id,
        semester_id,
        course_id,
        course,
        title: get_required_str(params, "title")?,
        description: get_optional_str(params, "description")?.unwrap_or_default(),
        priority: priority_param(params)?.unwrap_or(Priority::Medium),
        due: parse_due(&get_required_str(params, "due")?)?,
        completed: get_optional_bool(params, "completed")?.unwrap_or(false),
    };

    ws.conn
        .execute(
            "INSERT INTO tasks(id, user_id, semester_id, course_id, course, title, description,
                               priority, due, completed)
             VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                &task.id,
                &task.user_id,
                &task.semester_id,
                &task.course_id,
                &task.course,
                &task.title,
                &task.description,
                task.priority.as_str(),
                &task.due,
                task.completed as i64,
            ),
        )
        .map_err(write_failed("db_insert_failed", "tasks"))?;

    record_activity(
        ws,
        &task.user_id,
        ActivityType::Task,
        format!("Added: {}", task.title),
        None,
        &task.id,
    );
    ws.invalidate_dashboard(&task.user_id, task.semester_id.as_deref());
    info!(task_id = %task.id, "task created");
    Ok(json!({ "taskId": task.id, "task": task }))
}

fn tasks_update(ws: &mut Workspace, params: &Value) -> Result<Value, HandlerErr> {
    let task_id = get_required_str(params, "taskId")?;
    let patch = Value::Object(get_patch(params)?.clone());
    let mut task = load_task(ws, &task_id)?;
    let was_completed = task.completed;

    if patch.get("title").is_some() {
        task.title = get_required_str(&patch, "title")?;
    }
    if patch.get("description").is_some() {
        task.description = get_optional_str(&patch, "description")?.unwrap_or_default();
    }
    if let Some(p) = priority_param(&patch)? {
        task.priority = p;
    }
    if patch.get("due").is_some() {
        task.due = parse_due(&get_required_str(&patch, "due")?)?;
    }
    if let Some(c) = get_optional_bool(&patch, "completed")? {
        task.completed = c;
    }
    if patch.get("courseId").is_some() || patch.get("course").is_some() {
        let (course_id, course) = course_ref(ws, &patch)?.unwrap_or_default();
        task.course_id = course_id;
        task.course = course;
    }

    ws.conn
        .execute(
            "UPDATE tasks
             SET course_id = ?, course = ?, title = ?, description = ?, priority = ?, due = ?,
                 completed = ?
             WHERE id = ?",
            (
                &task.course_id,
                &task.course,
                &task.title,
                &task.description,
                task.priority.as_str(),
                &task.due,
                task.completed as i64,
                &task.id,
            ),
        )
        .map_err(write_failed("db_update_failed", "tasks"))?;

    if task.completed && !was_completed {
        record_activity(
            ws,
            &task.user_id,
            ActivityType::Task,
            format!("Completed task: {}", task.title),
            Some("completed"),
            &task.id,
        );
    }
    ws.invalidate_dashboard(&task.user_id, task.semester_id.as_deref());
    Ok(json!({ "task": task }))
}

fn tasks_delete(ws: &mut Workspace, params: &Value) -> Result<Value, HandlerErr> {
    let task_id = get_required_str(params, "taskId")?;
    let task = load_task(ws, &task_id)?;
    ws.conn
        .execute("DELETE FROM tasks WHERE id = ?", [&task_id])
        .map_err(write_failed("db_delete_failed", "tasks"))?;
    ws.invalidate_dashboard(&task.user_id, task.semester_id.as_deref());
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "tasks.list" => Some(with_workspace(state, req, tasks_list)),
        "tasks.create" => Some(with_workspace(state, req, tasks_create)),
        "tasks.update" => Some(with_workspace(state, req, tasks_update)),
        "tasks.delete" => Some(with_workspace(state, req, tasks_delete)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, priority: Priority, due: &str) -> Task {
        Task {
            id: id.into(),
            user_id: "u".into(),
            semester_id: None,
            course_id: String::new(),
            course: String::new(),
            title: id.into(),
            description: String::new(),
            priority,
            due: due.into(),
            completed: false,
        }
    }

    #[test]
    fn due_accepts_plain_dates() {
        assert_eq!(parse_due("2026-11-02").unwrap(), "2026-11-02T00:00:00Z");
        assert_eq!(
            parse_due("2026-11-02T09:30:00+02:00").unwrap(),
            "2026-11-02T09:30:00+02:00"
        );
        assert!(parse_due("next week").is_err());
    }

    #[test]
    fn sorts_by_priority_then_due() {
        let mut tasks = vec![
            task("low-early", Priority::Low, "2026-10-20T00:00:00Z"),
            task("high-late", Priority::High, "2026-12-01T00:00:00Z"),
            task("high-early", Priority::High, "2026-10-21T00:00:00Z"),
            task("medium-bad", Priority::Medium, "whenever"),
            task("medium", Priority::Medium, "2026-10-25T00:00:00Z"),
        ];
        sort_tasks(&mut tasks);
        let ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(
            ids,
            ["high-early", "high-late", "medium", "medium-bad", "low-early"]
        );
    }
}
