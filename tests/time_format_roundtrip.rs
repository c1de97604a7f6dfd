use edutracker::time::{self, ParseError, TimeFormat, TimeOfDay};
use proptest::prelude::*;

proptest! {
    #[test]
    fn twenty_four_hour_round_trips(hour in 0u32..24, minute in 0u32..60) {
        let t = format!("{:02}:{:02}", hour, minute);
        let back = time::to_24_hour(&time::to_12_hour(&t).unwrap()).unwrap();
        prop_assert_eq!(back, t);
    }

    #[test]
    fn twelve_hour_round_trips(hour in 1u32..=12, minute in 0u32..60, pm in any::<bool>()) {
        let t = format!("{:02}:{:02} {}", hour, minute, if pm { "PM" } else { "AM" });
        let back = time::to_12_hour(&time::to_24_hour(&t).unwrap()).unwrap();
        prop_assert_eq!(back, t);
    }

    #[test]
    fn display_format_agrees_with_converters(hour in 0u32..24, minute in 0u32..60) {
        let t = TimeOfDay::new(hour, minute).unwrap();
        prop_assert_eq!(
            time::format_for_display(&t.format_24h(), TimeFormat::TwelveHour).unwrap(),
            time::to_12_hour(&t.format_24h()).unwrap()
        );
        prop_assert_eq!(
            time::format_for_display(&t.format_12h(), TimeFormat::TwentyFourHour).unwrap(),
            t.format_24h()
        );
    }
}

#[test]
fn midnight_and_noon_render_as_twelve() {
    assert_eq!(time::to_12_hour("00:00").unwrap(), "12:00 AM");
    assert_eq!(time::to_12_hour("12:00").unwrap(), "12:00 PM");
    assert_eq!(time::to_24_hour("12:30 AM").unwrap(), "00:30");
    assert_eq!(time::to_24_hour("12:30 PM").unwrap(), "12:30");
}

#[test]
fn single_digit_hour_is_canonicalized() {
    assert_eq!(time::to_24_hour("9:05 AM").unwrap(), "09:05");
    assert_eq!(time::to_12_hour(&time::to_24_hour("9:05 PM").unwrap()).unwrap(), "09:05 PM");
}

#[test]
fn malformed_input_is_rejected() {
    assert!(matches!(time::to_24_hour("13:00 PM"), Err(ParseError::HourOutOfRange { .. })));
    assert!(matches!(time::to_24_hour("0:15 AM"), Err(ParseError::HourOutOfRange { .. })));
    assert!(matches!(time::to_12_hour("24:00"), Err(ParseError::HourOutOfRange { .. })));
    assert!(matches!(time::to_12_hour("10:60"), Err(ParseError::MinuteOutOfRange(60))));
    for bad in ["", "9:00", "09:00 am", "09:00AM", "9 AM", "ab:cd PM"] {
        assert!(time::to_24_hour(bad).is_err(), "{bad:?} should not parse as 12h");
    }
    for bad in ["", "9:00", "09:00 AM", "0900", "09:0"] {
        assert!(time::to_12_hour(bad).is_err(), "{bad:?} should not parse as 24h");
    }
}
