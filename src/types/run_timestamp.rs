use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Converts user supplied timestamps into the naive UTC time of a model run.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use opendata_downloader::IntoRunTimestamp;
///
/// let expected = NaiveDate::from_ymd_opt(2020, 6, 26)
///     .unwrap()
///     .and_hms_opt(9, 0, 0)
///     .unwrap();
///
/// assert_eq!("2020-06-26 09:00".into_run_timestamp(), Some(expected));
/// assert_eq!("2020-06-26T09:00:00Z".into_run_timestamp(), Some(expected));
/// assert_eq!("yesterday".into_run_timestamp(), None);
/// ```
pub trait IntoRunTimestamp {
    fn into_run_timestamp(self) -> Option<NaiveDateTime>;
}

impl IntoRunTimestamp for NaiveDateTime {
    fn into_run_timestamp(self) -> Option<NaiveDateTime> {
        Some(self)
    }
}

impl IntoRunTimestamp for NaiveDate {
    fn into_run_timestamp(self) -> Option<NaiveDateTime> {
        Some(self.and_time(NaiveTime::default()))
    }
}

impl IntoRunTimestamp for DateTime<Utc> {
    fn into_run_timestamp(self) -> Option<NaiveDateTime> {
        Some(self.naive_utc())
    }
}

impl IntoRunTimestamp for DateTime<FixedOffset> {
    fn into_run_timestamp(self) -> Option<NaiveDateTime> {
        Some(self.naive_utc())
    }
}

impl IntoRunTimestamp for &str {
    fn into_run_timestamp(self) -> Option<NaiveDateTime> {
        let text = self.trim();
        if let Ok(dt) = text.parse::<DateTime<FixedOffset>>() {
            return dt.into_run_timestamp();
        }
        for format in NAIVE_FORMATS {
            if let Ok(naive_dt) = NaiveDateTime::parse_from_str(text, format) {
                return Some(naive_dt);
            }
        }
        if let Ok(naive_date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return naive_date.into_run_timestamp();
        }
        None
    }
}

impl IntoRunTimestamp for String {
    fn into_run_timestamp(self) -> Option<NaiveDateTime> {
        self.as_str().into_run_timestamp()
    }
}
