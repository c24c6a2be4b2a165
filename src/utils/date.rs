use chrono::{NaiveDate, NaiveDateTime, Utc};

pub const DATE_FMT: &str = "%Y-%m-%dT%H:%M:%S%.f";

pub mod serializer {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde::de::Error;
    use crate::utils::date::DATE_FMT;

    pub fn serialize<S: Serializer>(time: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        format!("{}", time.format(DATE_FMT)).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let str_time: String = Deserialize::deserialize(deserializer)?;
        let time = NaiveDateTime::parse_from_str(&str_time, DATE_FMT).map_err(D::Error::custom)?;
        Ok(time)
    }
}

// Current UTC calendar day; overdue rules compare dates, never times.
pub fn today() -> NaiveDate {
    Utc::now().naive_utc().date()
}

// Whole calendar days past the due date at midnight granularity, clamped at
// zero. A loan due today is not overdue until the next calendar day.
pub fn overdue_days(due_at: NaiveDateTime, today: NaiveDate) -> i64 {
    (today - due_at.date()).num_days().max(0)
}
