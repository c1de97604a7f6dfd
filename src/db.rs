use crate::models::{
    Activity, ActivityType, ClassEntry, ClassType, Course, DailyCounter, Priority, Profile,
    Settings, Task, Theme,
};
use crate::schedule::Weekday;
use crate::time::{TimeFormat, TimeOfDay};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};
use std::path::Path;

pub const DB_FILE: &str = "edutracker.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings(
            user_id TEXT PRIMARY KEY,
            lecture_duration INTEGER NOT NULL,
            lab_duration INTEGER NOT NULL,
            semester_start TEXT,
            semester_end TEXT,
            notif_sound INTEGER NOT NULL,
            time_format TEXT NOT NULL,
            theme TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS courses(
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            semester_id TEXT,
            course_name TEXT NOT NULL,
            course_code TEXT NOT NULL,
            instructor TEXT NOT NULL,
            weekly INTEGER NOT NULL,
            type TEXT NOT NULL,
            required REAL NOT NULL,
            attended INTEGER NOT NULL,
            total INTEGER NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_courses_user ON courses(user_id, semester_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS classes(
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            semester_id TEXT,
            course_id TEXT NOT NULL,
            course_name TEXT NOT NULL,
            day TEXT NOT NULL,
            start_time TEXT NOT NULL,
            end_time TEXT NOT NULL,
            type TEXT NOT NULL,
            instructor TEXT,
            room TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_classes_user_day ON classes(user_id, day)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS tasks(
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            semester_id TEXT,
            course_id TEXT NOT NULL,
            course TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            priority TEXT NOT NULL,
            due TEXT NOT NULL,
            completed INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_tasks_user ON tasks(user_id, semester_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS activities(
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            type TEXT NOT NULL,
            label TEXT NOT NULL,
            time TEXT NOT NULL,
            status TEXT,
            related_id TEXT
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_activities_user_time ON activities(user_id, time)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users(
            email TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT,
            college TEXT,
            image TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS counters(
            user_id TEXT PRIMARY KEY,
            value INTEGER NOT NULL,
            start_date TEXT,
            running INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;

    Ok(conn)
}

fn bad_column(idx: usize, what: &str, raw: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        Type::Text,
        format!("invalid {}: {:?}", what, raw).into(),
    )
}

fn class_type_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<ClassType> {
    let raw: String = row.get(idx)?;
    ClassType::parse(&raw).ok_or_else(|| bad_column(idx, "class type", &raw))
}

fn time_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<TimeOfDay> {
    let raw: String = row.get(idx)?;
    TimeOfDay::parse_any(&raw).map_err(|_| bad_column(idx, "time", &raw))
}

const COURSE_COLUMNS: &str = "id, user_id, semester_id, course_name, course_code, instructor, weekly, type, required, attended, total";

fn course_from_row(row: &Row<'_>) -> rusqlite::Result<Course> {
    Ok(Course {
        id: row.get(0)?,
        user_id: row.get(1)?,
        semester_id: row.get(2)?,
        course_name: row.get(3)?,
        course_code: row.get(4)?,
        instructor: row.get(5)?,
        weekly: row.get(6)?,
        class_type: class_type_at(row, 7)?,
        required: row.get(8)?,
        attended: row.get(9)?,
        total: row.get(10)?,
    })
}

/// Courses for a user, optionally narrowed to one semester, in creation order.
pub fn list_courses(
    conn: &Connection,
    user_id: &str,
    semester_id: Option<&str>,
) -> rusqlite::Result<Vec<Course>> {
    let sql = format!(
        "SELECT {COURSE_COLUMNS}
         FROM courses
         WHERE user_id = ?1 AND (?2 IS NULL OR semester_id = ?2)
         ORDER BY created_at, rowid"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map((user_id, semester_id), course_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_course(conn: &Connection, course_id: &str) -> rusqlite::Result<Option<Course>> {
    let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = ?");
    conn.query_row(&sql, [course_id], course_from_row).optional()
}

const CLASS_COLUMNS: &str = "id, user_id, semester_id, course_id, course_name, day, start_time, end_time, type, instructor, room";

fn class_from_row(row: &Row<'_>) -> rusqlite::Result<ClassEntry> {
    let day_raw: String = row.get(5)?;
    Ok(ClassEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        semester_id: row.get(2)?,
        course_id: row.get(3)?,
        course_name: row.get(4)?,
        day: Weekday::parse(&day_raw).ok_or_else(|| bad_column(5, "day", &day_raw))?,
        start_time: time_at(row, 6)?,
        end_time: time_at(row, 7)?,
        class_type: class_type_at(row, 8)?,
        instructor: row.get(9)?,
        room: row.get(10)?,
    })
}

pub fn list_classes(
    conn: &Connection,
    user_id: &str,
    semester_id: Option<&str>,
) -> rusqlite::Result<Vec<ClassEntry>> {
    let sql = format!(
        "SELECT {CLASS_COLUMNS}
         FROM classes
         WHERE user_id = ?1 AND (?2 IS NULL OR semester_id = ?2)
         ORDER BY CASE day
                    WHEN 'monday' THEN 1
                    WHEN 'tuesday' THEN 2
                    WHEN 'wednesday' THEN 3
                    WHEN 'thursday' THEN 4
                    ELSE 5
                  END,
                  start_time"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map((user_id, semester_id), class_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_class(conn: &Connection, class_id: &str) -> rusqlite::Result<Option<ClassEntry>> {
    let sql = format!("SELECT {CLASS_COLUMNS} FROM classes WHERE id = ?");
    conn.query_row(&sql, [class_id], class_from_row).optional()
}

const TASK_COLUMNS: &str =
    "id, user_id, semester_id, course_id, course, title, description, priority, due, completed";

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    let priority_raw: String = row.get(7)?;
    Ok(Task {
        id: row.get(0)?,
        user_id: row.get(1)?,
        semester_id: row.get(2)?,
        course_id: row.get(3)?,
        course: row.get(4)?,
        title: row.get(5)?,
        description: row.get(6)?,
        priority: Priority::parse(&priority_raw)
            .ok_or_else(|| bad_column(7, "priority", &priority_raw))?,
        due: row.get(8)?,
        completed: row.get::<_, i64>(9)? != 0,
    })
}

pub fn list_tasks(
    conn: &Connection,
    user_id: &str,
    semester_id: Option<&str>,
) -> rusqlite::Result<Vec<Task>> {
    let sql = format!(
        "SELECT {TASK_COLUMNS}
         FROM tasks
         WHERE user_id = ?1 AND (?2 IS NULL OR semester_id = ?2)
         ORDER BY rowid"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map((user_id, semester_id), task_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_task(conn: &Connection, task_id: &str) -> rusqlite::Result<Option<Task>> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?");
    conn.query_row(&sql, [task_id], task_from_row).optional()
}

/// Stored settings, or `None` if the user never saved any.
pub fn load_settings(conn: &Connection, user_id: &str) -> rusqlite::Result<Option<Settings>> {
    conn.query_row(
        "SELECT user_id, lecture_duration, lab_duration, semester_start, semester_end,
                notif_sound, time_format, theme
         FROM settings WHERE user_id = ?",
        [user_id],
        |row| {
            let time_format_raw: String = row.get(6)?;
            let theme_raw: String = row.get(7)?;
            Ok(Settings {
                user_id: row.get(0)?,
                lecture_duration: row.get(1)?,
                lab_duration: row.get(2)?,
                semester_start: row.get(3)?,
                semester_end: row.get(4)?,
                notif_sound: row.get::<_, i64>(5)? != 0,
                time_format: TimeFormat::parse(&time_format_raw)
                    .ok_or_else(|| bad_column(6, "time format", &time_format_raw))?,
                theme: Theme::parse(&theme_raw).ok_or_else(|| bad_column(7, "theme", &theme_raw))?,
            })
        },
    )
    .optional()
}

pub fn settings_or_default(conn: &Connection, user_id: &str) -> rusqlite::Result<Settings> {
    Ok(load_settings(conn, user_id)?.unwrap_or_else(|| Settings::defaults(user_id)))
}

pub fn save_settings(conn: &Connection, s: &Settings) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO settings(user_id, lecture_duration, lab_duration, semester_start, semester_end,
                              notif_sound, time_format, theme)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(user_id) DO UPDATE SET
           lecture_duration = excluded.lecture_duration,
           lab_duration = excluded.lab_duration,
           semester_start = excluded.semester_start,
           semester_end = excluded.semester_end,
           notif_sound = excluded.notif_sound,
           time_format = excluded.time_format,
           theme = excluded.theme",
        (
            &s.user_id,
            s.lecture_duration,
            s.lab_duration,
            &s.semester_start,
            &s.semester_end,
            s.notif_sound as i64,
            s.time_format.as_str(),
            s.theme.as_str(),
        ),
    )?;
    Ok(())
}

pub fn insert_activity(conn: &Connection, a: &Activity) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO activities(id, user_id, type, label, time, status, related_id)
         VALUES(?, ?, ?, ?, ?, ?, ?)",
        (
            &a.id,
            &a.user_id,
            a.activity_type.as_str(),
            &a.label,
            &a.time,
            &a.status,
            &a.related_id,
        ),
    )?;
    Ok(())
}

/// Newest first.
pub fn list_activities(
    conn: &Connection,
    user_id: &str,
    activity_type: Option<ActivityType>,
) -> rusqlite::Result<Vec<Activity>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, type, label, time, status, related_id
         FROM activities
         WHERE user_id = ?1 AND (?2 IS NULL OR type = ?2)
         ORDER BY time DESC, rowid DESC",
    )?;
    let rows = stmt
        .query_map((user_id, activity_type.map(ActivityType::as_str)), |row| {
            let type_raw: String = row.get(2)?;
            Ok(Activity {
                id: row.get(0)?,
                user_id: row.get(1)?,
                activity_type: ActivityType::parse(&type_raw)
                    .ok_or_else(|| bad_column(2, "activity type", &type_raw))?,
                label: row.get(3)?,
                time: row.get(4)?,
                status: row.get(5)?,
                related_id: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn load_profile(conn: &Connection, email: &str) -> rusqlite::Result<Option<Profile>> {
    conn.query_row(
        "SELECT email, user_id, name, college, image FROM users WHERE email = ?",
        [email],
        |row| {
            Ok(Profile {
                email: row.get(0)?,
                user_id: row.get(1)?,
                name: row.get(2)?,
                college: row.get(3)?,
                image: row.get(4)?,
            })
        },
    )
    .optional()
}

pub fn save_profile(conn: &Connection, p: &Profile) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO users(email, user_id, name, college, image)
         VALUES(?, ?, ?, ?, ?)
         ON CONFLICT(email) DO UPDATE SET
           user_id = excluded.user_id,
           name = excluded.name,
           college = excluded.college,
           image = excluded.image",
        (&p.email, &p.user_id, &p.name, &p.college, &p.image),
    )?;
    Ok(())
}

pub fn load_counter(conn: &Connection, user_id: &str) -> rusqlite::Result<Option<DailyCounter>> {
    conn.query_row(
        "SELECT user_id, value, start_date, running FROM counters WHERE user_id = ?",
        [user_id],
        |row| {
            Ok(DailyCounter {
                user_id: row.get(0)?,
                counter: row.get(1)?,
                start_date: row.get(2)?,
                running: row.get::<_, i64>(3)? != 0,
            })
        },
    )
    .optional()
}

pub fn save_counter(conn: &Connection, c: &DailyCounter) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO counters(user_id, value, start_date, running)
         VALUES(?, ?, ?, ?)
         ON CONFLICT(user_id) DO UPDATE SET
           value = excluded.value,
           start_date = excluded.start_date,
           running = excluded.running",
        (&c.user_id, c.counter, &c.start_date, c.running as i64),
    )?;
    Ok(())
}

pub fn delete_counter(conn: &Connection, user_id: &str) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM counters WHERE user_id = ?", [user_id])?;
    Ok(())
}
