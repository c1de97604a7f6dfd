use crate::time::TimeOfDay;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const SLOT_STEP_MINUTES: u16 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Weekday {
    pub const ALL: [Weekday; 5] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monday" => Some(Self::Monday),
            "tuesday" => Some(Self::Tuesday),
            "wednesday" => Some(Self::Wednesday),
            "thursday" => Some(Self::Thursday),
            "friday" => Some(Self::Friday),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
        }
    }

    /// Weekends have no classes.
    pub fn from_chrono(day: chrono::Weekday) -> Option<Self> {
        match day {
            chrono::Weekday::Mon => Some(Self::Monday),
            chrono::Weekday::Tue => Some(Self::Tuesday),
            chrono::Weekday::Wed => Some(Self::Wednesday),
            chrono::Weekday::Thu => Some(Self::Thursday),
            chrono::Weekday::Fri => Some(Self::Friday),
            chrono::Weekday::Sat | chrono::Weekday::Sun => None,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("class must end after it starts ({start} - {end})")]
    EmptyInterval { start: TimeOfDay, end: TimeOfDay },
}

/// A recurring weekly class occupying `[start, end)` on `day`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSlot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub course_id: String,
    pub day: Weekday,
    #[serde(rename = "startTime")]
    pub start: TimeOfDay,
    #[serde(rename = "endTime")]
    pub end: TimeOfDay,
}

impl ClassSlot {
    pub fn new(
        id: Option<String>,
        course_id: impl Into<String>,
        day: Weekday,
        start: TimeOfDay,
        end: TimeOfDay,
    ) -> Result<Self, ScheduleError> {
        if start >= end {
            return Err(ScheduleError::EmptyInterval { start, end });
        }
        Ok(Self {
            id,
            course_id: course_id.into(),
            day,
            start,
            end,
        })
    }

    pub fn duration_minutes(&self) -> u16 {
        self.end.minutes().saturating_sub(self.start.minutes())
    }
}

pub fn intervals_overlap(s1: TimeOfDay, e1: TimeOfDay, s2: TimeOfDay, e2: TimeOfDay) -> bool {
    s1 < e2 && s2 < e1
}

fn same_day_others<'a>(
    candidate: &'a ClassSlot,
    existing: &'a [ClassSlot],
    ignore_id: Option<&'a str>,
) -> impl Iterator<Item = &'a ClassSlot> + 'a {
    existing.iter().filter(move |slot| {
        slot.day == candidate.day
            && !matches!((ignore_id, slot.id.as_deref()), (Some(skip), Some(id)) if skip == id)
    })
}

pub fn has_overlap(candidate: &ClassSlot, existing: &[ClassSlot], ignore_id: Option<&str>) -> bool {
    same_day_others(candidate, existing, ignore_id)
        .any(|slot| intervals_overlap(candidate.start, candidate.end, slot.start, slot.end))
}

pub fn conflicts<'a>(
    candidate: &'a ClassSlot,
    existing: &'a [ClassSlot],
    ignore_id: Option<&'a str>,
) -> Vec<&'a ClassSlot> {
    same_day_others(candidate, existing, ignore_id)
        .filter(|slot| intervals_overlap(candidate.start, candidate.end, slot.start, slot.end))
        .collect()
}

pub fn suggest_next_free_slot(
    day: Weekday,
    duration_minutes: u16,
    existing: &[ClassSlot],
    day_start: TimeOfDay,
    day_end: TimeOfDay,
) -> Option<TimeOfDay> {
    suggest_next_free_slot_with_step(
        day,
        duration_minutes,
        existing,
        day_start,
        day_end,
        SLOT_STEP_MINUTES,
    )
}

/// First start time in `[day_start, day_end - duration]`, walked in `step`
/// minute increments, whose slot collides with nothing on `day`.
pub fn suggest_next_free_slot_with_step(
    day: Weekday,
    duration_minutes: u16,
    existing: &[ClassSlot],
    day_start: TimeOfDay,
    day_end: TimeOfDay,
    step: u16,
) -> Option<TimeOfDay> {
    if duration_minutes == 0 || step == 0 {
        return None;
    }
    let last_start = day_end.minutes().checked_sub(duration_minutes)?;
    if last_start < day_start.minutes() {
        return None;
    }
    (day_start.minutes()..=last_start)
        .step_by(usize::from(step))
        .filter_map(|start| {
            let start = TimeOfDay::from_minutes(start)?;
            let end = TimeOfDay::from_minutes(start.minutes() + duration_minutes)?;
            Some(ClassSlot {
                id: None,
                course_id: String::new(),
                day,
                start,
                end,
            })
        })
        .find(|candidate| !has_overlap(candidate, existing, None))
        .map(|slot| slot.start)
}

/// Slots on `day` ordered by start time.
pub fn day_agenda(day: Weekday, slots: &[ClassSlot]) -> Vec<&ClassSlot> {
    let mut out: Vec<&ClassSlot> = slots.iter().filter(|s| s.day == day).collect();
    out.sort_by_key(|s| (s.start, s.end));
    out
}
