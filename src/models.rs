use crate::projection::{AttendanceRecord, ProjectionError};
use crate::schedule::{ClassSlot, Weekday};
use crate::time::{TimeFormat, TimeOfDay};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

pub const DEFAULT_LECTURE_MINUTES: u32 = 60;
pub const DEFAULT_LAB_MINUTES: u32 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassType {
    Lecture,
    Lab,
}

impl ClassType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "lecture" => Some(Self::Lecture),
            "lab" => Some(Self::Lab),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lecture => "lecture",
            Self::Lab => "lab",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Attendance,
    Task,
}

impl ActivityType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "attendance" => Some(Self::Attendance),
            "task" => Some(Self::Task),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Attendance => "attendance",
            Self::Task => "task",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    System,
}

impl Theme {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            "system" => Some(Self::System),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }
}

/// A tracked course with its running attendance tally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub user_id: String,
    pub semester_id: Option<String>,
    pub course_name: String,
    pub course_code: String,
    pub instructor: String,
    pub weekly: u32,
    #[serde(rename = "type")]
    pub class_type: ClassType,
    pub required: f64,
    pub attended: u32,
    pub total: u32,
}

impl Course {
    pub fn record(&self) -> Result<AttendanceRecord, ProjectionError> {
        AttendanceRecord::new(self.attended, self.total, self.required)
    }

    pub fn percent(&self) -> f64 {
        crate::projection::attendance_percent(self.attended, self.total)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassEntry {
    pub id: String,
    pub user_id: String,
    pub semester_id: Option<String>,
    pub course_id: String,
    pub course_name: String,
    pub day: Weekday,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    #[serde(rename = "type")]
    pub class_type: ClassType,
    pub instructor: Option<String>,
    pub room: String,
}

impl ClassEntry {
    pub fn slot(&self) -> ClassSlot {
        ClassSlot {
            id: Some(self.id.clone()),
            course_id: self.course_id.clone(),
            day: self.day,
            start: self.start_time,
            end: self.end_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub semester_id: Option<String>,
    pub course_id: String,
    pub course: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    /// RFC 3339.
    pub due: String,
    pub completed: bool,
}

impl Task {
    pub fn due_at(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.due).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub user_id: String,
    pub lecture_duration: u32,
    pub lab_duration: u32,
    pub semester_start: Option<String>,
    pub semester_end: Option<String>,
    pub notif_sound: bool,
    pub time_format: TimeFormat,
    pub theme: Theme,
}

impl Settings {
    pub fn defaults(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            lecture_duration: DEFAULT_LECTURE_MINUTES,
            lab_duration: DEFAULT_LAB_MINUTES,
            semester_start: None,
            semester_end: None,
            notif_sound: true,
            time_format: TimeFormat::TwelveHour,
            theme: Theme::System,
        }
    }

    pub fn duration_for(&self, class_type: ClassType) -> u32 {
        match class_type {
            ClassType::Lecture => self.lecture_duration,
            ClassType::Lab => self.lab_duration,
        }
    }

    pub fn semester_id(&self) -> Option<String> {
        match (&self.semester_start, &self.semester_end) {
            (Some(start), Some(end)) => Some(format!("{}_{}", start, end)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub label: String,
    pub time: String,
    pub status: Option<String>,
    pub related_id: Option<String>,
}

/// The part of an email before `@`, used as a user id when none is given.
pub fn user_id_from_email(email: &str) -> &str {
    email.split_once('@').map_or(email, |(local, _)| local)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub email: String,
    pub user_id: String,
    pub name: Option<String>,
    pub college: Option<String>,
    pub image: Option<String>,
}

impl Profile {
    pub fn new(email: &str) -> Self {
        Self {
            email: email.to_string(),
            user_id: user_id_from_email(email).to_string(),
            name: None,
            college: None,
            image: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCounter {
    #[serde(skip)]
    pub user_id: String,
    pub counter: u32,
    pub start_date: Option<String>,
    pub running: bool,
}

impl DailyCounter {
    pub fn idle(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            counter: 0,
            start_date: None,
            running: false,
        }
    }

    /// While running, raises the counter to the whole days elapsed since the
    /// start date. Returns whether the value changed; it never goes down.
    pub fn catch_up(&mut self, now: DateTime<FixedOffset>) -> bool {
        if !self.running {
            return false;
        }
        let Some(start) = self
            .start_date
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        else {
            return false;
        };
        match u32::try_from((now - start).num_days()) {
            Ok(days) if days > self.counter => {
                self.counter = days;
                true
            }
            _ => false,
        }
    }
}
