//! Time-of-day values and conversion between the 12-hour display notation
//! (`"hh:mm AM"`) and the 24-hour storage notation (`"HH:MM"`).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub const MINUTES_PER_DAY: u16 = 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("expected HH:MM, got {0:?}")]
    Malformed24(String),
    #[error("expected hh:mm AM|PM, got {0:?}")]
    Malformed12(String),
    #[error("hour {hour} out of range {min}..={max}")]
    HourOutOfRange { hour: u32, min: u32, max: u32 },
    #[error("minute {0} out of range 0..=59")]
    MinuteOutOfRange(u32),
    #[error("time {start} plus {minutes} minutes runs past midnight")]
    PastMidnight { start: TimeOfDay, minutes: u32 },
}

/// Minutes since midnight, always `< 24:00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeFormat {
    #[serde(rename = "12h")]
    TwelveHour,
    #[serde(rename = "24h")]
    TwentyFourHour,
}

impl TimeFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "12h" => Some(Self::TwelveHour),
            "24h" => Some(Self::TwentyFourHour),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TwelveHour => "12h",
            Self::TwentyFourHour => "24h",
        }
    }
}

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay(0);

    pub fn new(hour: u32, minute: u32) -> Result<Self, ParseError> {
        if hour > 23 {
            return Err(ParseError::HourOutOfRange {
                hour,
                min: 0,
                max: 23,
            });
        }
        if minute > 59 {
            return Err(ParseError::MinuteOutOfRange(minute));
        }
        Ok(Self((hour * 60 + minute) as u16))
    }

    pub fn from_minutes(minutes: u16) -> Option<Self> {
        (minutes < MINUTES_PER_DAY).then_some(Self(minutes))
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    pub fn hour(self) -> u32 {
        u32::from(self.0 / 60)
    }

    pub fn minute(self) -> u32 {
        u32::from(self.0 % 60)
    }

    /// Same-day addition; an end time at or past midnight is an error since
    /// class slots never wrap.
    pub fn checked_add_minutes(self, minutes: u32) -> Result<Self, ParseError> {
        let total = u32::from(self.0) + minutes;
        if total >= u32::from(MINUTES_PER_DAY) {
            return Err(ParseError::PastMidnight {
                start: self,
                minutes,
            });
        }
        Ok(Self(total as u16))
    }

    pub fn parse_24h(s: &str) -> Result<Self, ParseError> {
        let malformed = || ParseError::Malformed24(s.to_string());
        let (h, m) = s.split_once(':').ok_or_else(malformed)?;
        if h.len() != 2 || m.len() != 2 {
            return Err(malformed());
        }
        let hour = parse_digits(h).ok_or_else(malformed)?;
        let minute = parse_digits(m).ok_or_else(malformed)?;
        Self::new(hour, minute)
    }

    pub fn parse_12h(s: &str) -> Result<Self, ParseError> {
        let malformed = || ParseError::Malformed12(s.to_string());
        let (clock, meridiem) = s.split_once(' ').ok_or_else(malformed)?;
        let pm = match meridiem {
            "AM" => false,
            "PM" => true,
            _ => return Err(malformed()),
        };
        let (h, m) = clock.split_once(':').ok_or_else(malformed)?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(malformed());
        }
        let hour = parse_digits(h).ok_or_else(malformed)?;
        let minute = parse_digits(m).ok_or_else(malformed)?;
        if !(1..=12).contains(&hour) {
            return Err(ParseError::HourOutOfRange {
                hour,
                min: 1,
                max: 12,
            });
        }
        let hour24 = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, false) => h,
            (h, true) => h + 12,
        };
        Self::new(hour24, minute)
    }

    /// Accepts either notation; a trailing meridiem selects the 12-hour parser.
    pub fn parse_any(s: &str) -> Result<Self, ParseError> {
        let t = s.trim();
        if t.ends_with("AM") || t.ends_with("PM") {
            Self::parse_12h(t)
        } else {
            Self::parse_24h(t)
        }
    }

    pub fn format_24h(self) -> String {
        format!("{:02}:{:02}", self.hour(), self.minute())
    }

    pub fn format_12h(self) -> String {
        let h = self.hour();
        let meridiem = if h >= 12 { "PM" } else { "AM" };
        let h12 = match h % 12 {
            0 => 12,
            v => v,
        };
        format!("{:02}:{:02} {}", h12, self.minute(), meridiem)
    }

    pub fn format(self, format: TimeFormat) -> String {
        match format {
            TimeFormat::TwelveHour => self.format_12h(),
            TimeFormat::TwentyFourHour => self.format_24h(),
        }
    }
}

fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_24h())
    }
}

impl FromStr for TimeOfDay {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_any(s)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.format_24h())
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse_any(&s).map_err(serde::de::Error::custom)
    }
}

pub fn to_24_hour(time_12h: &str) -> Result<String, ParseError> {
    TimeOfDay::parse_12h(time_12h).map(TimeOfDay::format_24h)
}

pub fn to_12_hour(time_24h: &str) -> Result<String, ParseError> {
    TimeOfDay::parse_24h(time_24h).map(TimeOfDay::format_12h)
}

/// Renders a stored time in the user's preferred notation, whichever
/// notation it was stored in.
pub fn format_for_display(time: &str, format: TimeFormat) -> Result<String, ParseError> {
    TimeOfDay::parse_any(time).map(|t| t.format(format))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noon_and_midnight_render_as_twelve() {
        assert_eq!(to_12_hour("00:00").unwrap(), "12:00 AM");
        assert_eq!(to_12_hour("12:00").unwrap(), "12:00 PM");
        assert_eq!(to_24_hour("12:30 AM").unwrap(), "00:30");
        assert_eq!(to_24_hour("12:30 PM").unwrap(), "12:30");
    }

    #[test]
    fn single_digit_hour_is_padded() {
        assert_eq!(to_24_hour("9:05 AM").unwrap(), "09:05");
        assert_eq!(to_24_hour("1:15 PM").unwrap(), "13:15");
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!(to_24_hour("13:00 PM"), Err(ParseError::HourOutOfRange { .. })));
        assert!(matches!(to_24_hour("0:10 AM"), Err(ParseError::HourOutOfRange { .. })));
        assert!(matches!(to_24_hour("10:60 AM"), Err(ParseError::MinuteOutOfRange(60))));
        assert!(matches!(to_24_hour("10:00"), Err(ParseError::Malformed12(_))));
        assert!(matches!(to_24_hour("10:00 am"), Err(ParseError::Malformed12(_))));
        assert!(matches!(to_12_hour("24:00"), Err(ParseError::HourOutOfRange { .. })));
        assert!(matches!(to_12_hour("9:00"), Err(ParseError::Malformed24(_))));
        assert!(matches!(to_12_hour("+9:00"), Err(ParseError::Malformed24(_))));
        assert!(matches!(to_12_hour(""), Err(ParseError::Malformed24(_))));
    }

    #[test]
    fn add_minutes_never_wraps() {
        let t = TimeOfDay::new(23, 0).unwrap();
        assert_eq!(t.checked_add_minutes(59).unwrap().format_24h(), "23:59");
        assert!(matches!(
            t.checked_add_minutes(60),
            Err(ParseError::PastMidnight { .. })
        ));
    }
}
