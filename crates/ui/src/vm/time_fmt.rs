use chrono::{DateTime, Utc};

#[must_use]
pub fn format_datetime(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M").to_string()
}

/// Countdown as `mm:ss`; minutes are not capped at 59.
#[must_use]
pub fn format_countdown(seconds: u32) -> String {
    let minutes = seconds / 60;
    let remainder = seconds % 60;
    format!("{minutes:02}:{remainder:02}")
}

#[must_use]
pub fn format_elapsed(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let minutes = seconds / 60;
    let remainder = seconds % 60;
    if minutes == 0 {
        format!("{remainder}s")
    } else {
        format!("{minutes}m {remainder:02}s")
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn countdown_pads_minutes_and_seconds() {
        assert_eq!(format_countdown(0), "00:00");
        assert_eq!(format_countdown(59), "00:59");
        assert_eq!(format_countdown(600), "10:00");
        assert_eq!(format_countdown(7_205), "120:05");
    }

    #[test]
    fn elapsed_and_datetime() {
        assert_eq!(format_elapsed(-4), "0s");
        assert_eq!(format_elapsed(42), "42s");
        assert_eq!(format_elapsed(3_725), "62m 05s");
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 0).unwrap();
        assert_eq!(format_datetime(at), "2024-03-09 07:05");
    }
}
