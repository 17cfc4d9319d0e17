//! Whether an absence request was filed too close to its meeting.

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};

use crate::auth::validate;
use crate::errors::AppError;

/// Requests filed less than this many hours before the meeting starts are late.
pub const LATE_WINDOW_HOURS: i64 = 24;

/// Combine a stored meeting date and start time into an instant.
///
/// Stored strings that do not parse are corrupt data, reported as `Parse`.
pub fn meeting_start(
    date: &str,
    start_time: &str,
    offset: FixedOffset,
) -> Result<DateTime<FixedOffset>, AppError> {
    let day = validate::parse_date(date)
        .ok_or_else(|| AppError::Parse(format!("meeting date '{date}'")))?;
    let time = validate::parse_time(start_time)
        .ok_or_else(|| AppError::Parse(format!("meeting start time '{start_time}'")))?;
    offset
        .from_local_datetime(&day.and_time(time))
        .single()
        .ok_or_else(|| AppError::Parse(format!("meeting start '{date} {start_time}'")))
}

/// Late iff the meeting starts in strictly less than 24 hours from `now`,
/// including meetings that already started. Exactly 24 hours is on time.
pub fn is_late(start: DateTime<FixedOffset>, now: DateTime<Utc>) -> bool {
    start.signed_duration_since(now) < Duration::hours(LATE_WINDOW_HOURS)
}

/// Evaluate lateness for a request on `attendance_id`, given the linked meeting's
/// `(date, start_time)` if the attendance row has one.
pub fn evaluate(
    attendance_id: i64,
    meeting: Option<(&str, &str)>,
    offset: FixedOffset,
    now: DateTime<Utc>,
) -> Result<bool, AppError> {
    let (date, start_time) = meeting.ok_or_else(|| {
        AppError::NotFound(format!("meeting for attendance {attendance_id}"))
    })?;
    let start = meeting_start(date, start_time, offset)?;
    Ok(is_late(start, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Offset;

    fn utc() -> FixedOffset {
        Utc.fix()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 4, 12, 0, 0).unwrap()
    }

    #[test]
    fn six_hours_ahead_is_late() {
        assert!(evaluate(1, Some(("2025-03-04", "18:00")), utc(), now()).unwrap());
    }

    #[test]
    fn forty_eight_hours_ahead_is_not_late() {
        assert!(!evaluate(1, Some(("2025-03-06", "12:00")), utc(), now()).unwrap());
    }

    #[test]
    fn exactly_twenty_four_hours_is_not_late() {
        assert!(!evaluate(1, Some(("2025-03-05", "12:00")), utc(), now()).unwrap());
        assert!(evaluate(1, Some(("2025-03-05", "11:59:59")), utc(), now()).unwrap());
    }

    #[test]
    fn past_meeting_is_late() {
        assert!(evaluate(1, Some(("2025-03-01", "09:00")), utc(), now()).unwrap());
    }

    #[test]
    fn offset_shifts_the_meeting_start() {
        // 12:00 at UTC-5 is 17:00 UTC, 29 hours out.
        let est = FixedOffset::west_opt(5 * 3600).unwrap();
        assert!(!evaluate(1, Some(("2025-03-05", "12:00")), est, now()).unwrap());
        let a_second_later = Utc.with_ymd_and_hms(2025, 3, 4, 12, 0, 1).unwrap();
        assert!(evaluate(1, Some(("2025-03-05", "12:00")), utc(), a_second_later).unwrap());
    }

    #[test]
    fn unparseable_schedule_propagates_parse_error() {
        assert!(matches!(
            evaluate(1, Some(("tomorrow", "18:00")), utc(), now()),
            Err(AppError::Parse(_))
        ));
        assert!(matches!(
            evaluate(1, Some(("2025-03-04", "25:00")), utc(), now()),
            Err(AppError::Parse(_))
        ));
    }

    #[test]
    fn missing_meeting_is_not_found() {
        assert!(matches!(evaluate(7, None, utc(), now()), Err(AppError::NotFound(_))));
    }
}
