//! Resolution of the most recent published model run.

use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, Timelike, Utc};

/// Returns `true` if runs every `interval_hours` hours, starting at 00 UTC, fill a day exactly.
pub fn is_valid_run_interval(interval_hours: u32) -> bool {
    (1..=24).contains(&interval_hours) && 24 % interval_hours == 0
}

/// Computes the timestamp of the latest model run whose data is guaranteed to be published.
///
/// `now` is moved back by `publication_delay_minutes` and its hour of day is floored to a
/// multiple of `run_interval_hours`. The date is kept from the delay-adjusted instant and
/// the minute, second and sub-second parts of the result are zero.
///
/// # Examples
///
/// ```
/// use chrono::{NaiveDate, TimeZone, Utc};
/// use opendata_downloader::most_recent_run_timestamp;
///
/// let now = Utc.with_ymd_and_hms(2020, 6, 26, 14, 25, 0).unwrap();
/// // 14:25 minus 4 hours is 10:25, the latest 3-hourly run before that is 09 UTC.
/// let run = most_recent_run_timestamp(now, 240, 3);
///
/// let expected = NaiveDate::from_ymd_opt(2020, 6, 26).unwrap().and_hms_opt(9, 0, 0).unwrap();
/// assert_eq!(run, expected);
/// ```
pub fn most_recent_run_timestamp(
    now: DateTime<Utc>,
    publication_delay_minutes: u32,
    run_interval_hours: u32,
) -> NaiveDateTime {
    debug_assert!(
        is_valid_run_interval(run_interval_hours),
        "run interval must divide 24"
    );
    let interval = run_interval_hours.max(1);

    let published = now.naive_utc() - Duration::minutes(i64::from(publication_delay_minutes));
    let run_hour = (published.hour() / interval) * interval;

    published.date().and_time(NaiveTime::default()) + Duration::hours(i64::from(run_hour))
}
