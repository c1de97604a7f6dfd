use crate::models::{ClassEntry, Course, Priority, Task};
use crate::projection;
use crate::schedule::{self, Weekday};
use crate::time::TimeOfDay;
use chrono::{DateTime, Datelike, Duration, FixedOffset, Timelike};
use serde::{Deserialize, Serialize};

/// Raw records the dashboard is computed from. This is what gets cached;
/// the summary itself depends on the current time and is rebuilt per call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub courses: Vec<Course>,
    pub classes: Vec<ClassEntry>,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub courses: usize,
    pub classes_today: usize,
    pub tasks_due: usize,
    pub below_required: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextClass {
    pub class_id: String,
    pub course_name: String,
    pub day: Weekday,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub room: String,
    pub is_today: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingTask {
    pub task_id: String,
    pub title: String,
    pub course: String,
    pub priority: Priority,
    pub due: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseAttendance {
    pub course_id: String,
    pub course_name: String,
    pub percentage: u32,
    pub attended: u32,
    pub total: u32,
    pub required: f64,
    pub meets_requirement: bool,
    pub suggestion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub stats: DashboardStats,
    pub next_class: Option<NextClass>,
    pub upcoming_task: Option<UpcomingTask>,
    pub attendance: Vec<CourseAttendance>,
    pub task_completion: u32,
}

fn course_attendance(c: &Course) -> CourseAttendance {
    let (meets_requirement, suggestion) = match c.record() {
        Ok(record) => (record.meets_requirement(), projection::suggestion(&record)),
        Err(e) => (false, e.to_string()),
    };
    CourseAttendance {
        course_id: c.id.clone(),
        course_name: c.course_name.clone(),
        percentage: c.percent().round() as u32,
        attended: c.attended,
        total: c.total,
        required: c.required,
        meets_requirement,
        suggestion,
    }
}

fn next_class(classes: &[ClassEntry], now: &DateTime<FixedOffset>) -> Option<NextClass> {
    let to_next = |c: &ClassEntry, is_today: bool| NextClass {
        class_id: c.id.clone(),
        course_name: c.course_name.clone(),
        day: c.day,
        start_time: c.start_time,
        end_time: c.end_time,
        room: c.room.clone(),
        is_today,
    };
    let now_minutes = (now.hour() * 60 + now.minute()) as u16;
    if let Some(today) = Weekday::from_chrono(now.weekday()) {
        let upcoming = classes
            .iter()
            .filter(|c| c.day == today && c.start_time.minutes() > now_minutes)
            .min_by_key(|c| c.start_time);
        if let Some(c) = upcoming {
            return Some(to_next(c, true));
        }
    }
    // Walk forward a full week; the seventh step is today's weekday again.
    (1..=7)
        .filter_map(|offset| Weekday::from_chrono((*now + Duration::days(offset)).weekday()))
        .find_map(|day| {
            classes
                .iter()
                .filter(|c| c.day == day)
                .min_by_key(|c| c.start_time)
        })
        .map(|c| to_next(c, false))
}

fn upcoming_task(tasks: &[Task], now: &DateTime<FixedOffset>) -> Option<UpcomingTask> {
    tasks
        .iter()
        .filter(|t| !t.completed)
        .filter_map(|t| t.due_at().filter(|due| due > now).map(|due| (due, t)))
        .min_by_key(|(due, _)| *due)
        .map(|(_, t)| UpcomingTask {
            task_id: t.id.clone(),
            title: t.title.clone(),
            course: t.course.clone(),
            priority: t.priority,
            due: t.due.clone(),
        })
}

pub fn summarize(snapshot: &DashboardSnapshot, now: DateTime<FixedOffset>) -> DashboardSummary {
    let today_date = now.date_naive();
    let classes_today = Weekday::from_chrono(now.weekday())
        .map(|day| schedule::day_agenda(day, &slots(&snapshot.classes)).len())
        .unwrap_or(0);
    let tasks_due = snapshot
        .tasks
        .iter()
        .filter_map(Task::due_at)
        .filter(|due| due.with_timezone(now.offset()).date_naive() == today_date)
        .count();
    let attendance: Vec<CourseAttendance> = snapshot.courses.iter().map(course_attendance).collect();
    let below_required = attendance.iter().filter(|a| !a.meets_requirement).count();

    let completed = snapshot.tasks.iter().filter(|t| t.completed).count();
    let task_completion = if snapshot.tasks.is_empty() {
        0
    } else {
        (completed as f64 / snapshot.tasks.len() as f64 * 100.0).round() as u32
    };

    DashboardSummary {
        stats: DashboardStats {
            courses: snapshot.courses.len(),
            classes_today,
            tasks_due,
            below_required,
        },
        next_class: next_class(&snapshot.classes, &now),
        upcoming_task: upcoming_task(&snapshot.tasks, &now),
        attendance,
        task_completion,
    }
}

fn slots(classes: &[ClassEntry]) -> Vec<schedule::ClassSlot> {
    classes.iter().map(ClassEntry::slot).collect()
}
