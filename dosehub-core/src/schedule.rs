use chrono::{NaiveDateTime, NaiveTime};

/// Full minutes elapsed since today's occurrence of the given reminder time.
/// Negative when the reminder is still ahead.
pub fn elapsed_minutes(reminder_time: NaiveTime, now: NaiveDateTime) -> i64 {
    let due = now.date().and_time(reminder_time);

    (now - due).num_seconds().div_euclid(60)
}

/// The clock-face form of a reminder time, e.g. "8:05 AM".
pub fn display_time(time: NaiveTime) -> String {
    time.format("%-l:%M %p").to_string()
}
