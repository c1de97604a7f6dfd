//! Attendance projections: how many upcoming classes a student can miss, or
//! must attend, to sit at or above a required percentage.
//!
//! All comparisons are done on integers. The requirement is read as the
//! shortest decimal that round-trips to the given `f64` (so `66.666` is
//! exactly 66666/1000) and the test `attended / total * 100 >= required`
//! becomes `attended * 100 * den >= num * total`, recomputed from the
//! counters each time.

use serde::Serialize;

/// Finest requirement accepted, in decimal places. Keeps every product
/// below within `u128` for `u32` counters.
const MAX_SCALE: usize = 26;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProjectionError {
    #[error("attended ({attended}) exceeds total ({total})")]
    InvalidRecord { attended: u32, total: u32 },
    #[error("required percentage must be within 0..=100 with at most 26 decimal places, got {0}")]
    InvalidRequirement(f64),
    #[error("current attendance {attended}/{total} is below the required {required}%")]
    Precondition {
        attended: u32,
        total: u32,
        required: f64,
    },
    #[error("{required}% cannot be reached after missing {missed} class(es)")]
    UnreachableTarget { missed: u32, required: f64 },
    #[error("a {required}% requirement allows unlimited absences")]
    Unbounded { required: f64 },
    #[error("projected count {0} does not fit in a class counter")]
    CountOverflow(u128),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttendanceRecord {
    pub attended: u32,
    pub total: u32,
    pub required_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "classes", rename_all = "camelCase")]
pub enum Projection {
    CanSkip(u32),
    MustAttend(u32),
}

impl AttendanceRecord {
    pub fn new(attended: u32, total: u32, required_percent: f64) -> Result<Self, ProjectionError> {
        if attended > total {
            return Err(ProjectionError::InvalidRecord { attended, total });
        }
        Requirement::parse(required_percent)?;
        Ok(Self {
            attended,
            total,
            required_percent,
        })
    }

    pub fn percent(&self) -> f64 {
        attendance_percent(self.attended, self.total)
    }

    pub fn meets_requirement(&self) -> bool {
        Requirement::parse(self.required_percent)
            .map(|req| req.met_by(self.attended, self.total))
            .unwrap_or(false)
    }

    /// Routes to whichever projection applies to the current standing.
    pub fn project(&self) -> Result<Projection, ProjectionError> {
        if self.meets_requirement() {
            classes_can_skip(self.attended, self.total, self.required_percent)
                .map(Projection::CanSkip)
        } else {
            classes_needed_to_reach(self.attended, self.total, self.required_percent)
                .map(Projection::MustAttend)
        }
    }
}

/// Percentage attended; no classes held counts as 0%.
pub fn attendance_percent(attended: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    f64::from(attended) / f64::from(total) * 100.0
}

/// A requirement of `num / den` percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Requirement {
    num: u128,
    den: u128,
}

impl Requirement {
    fn parse(required_percent: f64) -> Result<Self, ProjectionError> {
        let invalid = || ProjectionError::InvalidRequirement(required_percent);
        if !required_percent.is_finite() || !(0.0..=100.0).contains(&required_percent) {
            return Err(invalid());
        }
        // Display on f64 never switches to exponent notation.
        let text = required_percent.abs().to_string();
        let (whole, frac) = text.split_once('.').unwrap_or((text.as_str(), ""));
        if frac.len() > MAX_SCALE {
            return Err(invalid());
        }
        let digits = format!("{whole}{frac}");
        let num = digits.parse::<u128>().map_err(|_| invalid())?;
        Ok(Self {
            num,
            den: 10u128.pow(frac.len() as u32),
        })
    }

    /// 100% on the same denominator.
    fn full(self) -> u128 {
        100 * self.den
    }

    fn is_full(self) -> bool {
        self.num >= self.full()
    }

    fn met_by(self, attended: u32, total: u32) -> bool {
        if total == 0 {
            return self.num == 0;
        }
        u128::from(attended) * self.full() >= self.num * u128::from(total)
    }
}

fn check_record(attended: u32, total: u32) -> Result<(), ProjectionError> {
    if attended > total {
        return Err(ProjectionError::InvalidRecord { attended, total });
    }
    Ok(())
}

fn to_count(n: u128) -> Result<u32, ProjectionError> {
    u32::try_from(n).map_err(|_| ProjectionError::CountOverflow(n))
}

/// Largest `n` such that missing the next `n` classes keeps
/// `attended / (total + n)` at or above the requirement.
pub fn classes_can_skip(attended: u32, total: u32, required_percent: f64) -> Result<u32, ProjectionError> {
    check_record(attended, total)?;
    let req = Requirement::parse(required_percent)?;
    if req.num == 0 {
        return Err(ProjectionError::Unbounded {
            required: required_percent,
        });
    }
    if !req.met_by(attended, total) {
        return Err(ProjectionError::Precondition {
            attended,
            total,
            required: required_percent,
        });
    }
    // attended * full >= num * (total + n)  <=>  n <= attended * full / num - total
    let max_total = u128::from(attended) * req.full() / req.num;
    to_count(max_total - u128::from(total))
}

/// Smallest `n` such that attending the next `n` classes brings
/// `(attended + n) / (total + n)` to the requirement.
pub fn classes_needed_to_reach(
    attended: u32,
    total: u32,
    required_percent: f64,
) -> Result<u32, ProjectionError> {
    check_record(attended, total)?;
    let req = Requirement::parse(required_percent)?;
    if req.is_full() && attended < total {
        return Err(ProjectionError::UnreachableTarget {
            missed: total - attended,
            required: required_percent,
        });
    }
    if req.met_by(attended, total) {
        return Ok(0);
    }
    if req.is_full() {
        // Nothing held yet; one attended class is 100%.
        return Ok(1);
    }
    // (a + n) * full >= num * (t + n)  <=>  n * (full - num) >= num * t - a * full
    let deficit = req.num * u128::from(total) - u128::from(attended) * req.full();
    to_count(deficit.div_ceil(req.full() - req.num).max(1))
}

/// Text shown next to a course, matching the wording students already know.
pub fn suggestion(record: &AttendanceRecord) -> String {
    let required = format_percent(record.required_percent);
    match record.project() {
        Ok(Projection::CanSkip(n)) => format!(
            "You can miss {} more class{} and stay above {}%",
            n,
            if n == 1 { "" } else { "es" },
            required
        ),
        Ok(Projection::MustAttend(n)) => format!(
            "Attend next {} class{} to reach {}%",
            n,
            if n == 1 { "" } else { "es" },
            required
        ),
        Err(ProjectionError::UnreachableTarget { .. }) => {
            format!("{}% is no longer reachable this term", required)
        }
        Err(ProjectionError::Unbounded { .. }) => "No attendance requirement".to_string(),
        Err(e) => e.to_string(),
    }
}

fn format_percent(p: f64) -> String {
    if p.fract() == 0.0 {
        format!("{}", p as i64)
    } else {
        format!("{}", p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_total_routes_to_needed() {
        assert!(matches!(
            classes_can_skip(0, 0, 75.0),
            Err(ProjectionError::Precondition { .. })
        ));
        assert_eq!(classes_needed_to_reach(0, 0, 75.0), Ok(1));
        assert_eq!(classes_needed_to_reach(0, 0, 100.0), Ok(1));
    }

    #[test]
    fn zero_requirement_is_unbounded() {
        assert!(matches!(
            classes_can_skip(3, 10, 0.0),
            Err(ProjectionError::Unbounded { .. })
        ));
        assert_eq!(classes_needed_to_reach(3, 10, 0.0), Ok(0));
    }

    #[test]
    fn requirement_is_read_as_written() {
        assert_eq!(
            Requirement::parse(66.666),
            Ok(Requirement { num: 66_666, den: 1_000 })
        );
        assert_eq!(Requirement::parse(75.0), Ok(Requirement { num: 75, den: 1 }));
        assert_eq!(Requirement::parse(0.0), Ok(Requirement { num: 0, den: 1 }));
        assert!(Requirement::parse(100.0).unwrap().is_full());
        assert!(!Requirement::parse(99.996).unwrap().is_full());
        assert!(Requirement::parse(1e-30).is_err());
    }

    #[test]
    fn suggestion_wording() {
        let r = AttendanceRecord::new(80, 100, 75.0).unwrap();
        assert_eq!(suggestion(&r), "You can miss 6 more classes and stay above 75%");
        let r = AttendanceRecord::new(2, 4, 75.0).unwrap();
        assert_eq!(suggestion(&r), "Attend next 4 classes to reach 75%");
        let r = AttendanceRecord::new(3, 4, 75.0).unwrap();
        assert_eq!(suggestion(&r), "You can miss 0 more classes and stay above 75%");
    }
}
