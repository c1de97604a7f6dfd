use crate::projection::ProjectionError;
use crate::schedule::ScheduleError;
use crate::time::ParseError;
use serde_json::json;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

#[derive(Debug)]
pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        Self::new("bad_params", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", message)
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<rusqlite::Error> for HandlerErr {
    fn from(e: rusqlite::Error) -> Self {
        Self::new("db_query_failed", e.to_string())
    }
}

impl From<ParseError> for HandlerErr {
    fn from(e: ParseError) -> Self {
        Self::new("bad_time", e.to_string())
    }
}

impl From<ScheduleError> for HandlerErr {
    fn from(e: ScheduleError) -> Self {
        Self::bad_params(e.to_string())
    }
}

impl From<ProjectionError> for HandlerErr {
    fn from(e: ProjectionError) -> Self {
        match e {
            ProjectionError::Precondition {
                attended,
                total,
                required,
            } => Self::new("precondition_failed", e.to_string()).with_details(json!({
                "attended": attended,
                "total": total,
                "required": required,
            })),
            ProjectionError::UnreachableTarget { missed, required } => {
                Self::new("unreachable_target", e.to_string()).with_details(json!({
                    "missed": missed,
                    "required": required,
                }))
            }
            ProjectionError::Unbounded { .. } => Self::new("unbounded", e.to_string()),
            ProjectionError::CountOverflow(_) => Self::new("count_overflow", e.to_string()),
            ProjectionError::InvalidRecord { .. } | ProjectionError::InvalidRequirement(_) => {
                Self::bad_params(e.to_string())
            }
        }
    }
}

/// Maps a write failure to the given code, naming the table in the details.
pub fn write_failed(code: &'static str, table: &'static str) -> impl Fn(rusqlite::Error) -> HandlerErr {
    move |e| HandlerErr::new(code, e.to_string()).with_details(json!({ "table": table }))
}
