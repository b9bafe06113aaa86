use anyhow::Context;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

const TAIPEI_OFFSET_SECS: i32 = 8 * 3600;

pub const LAST_UPDATED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

fn taipei() -> anyhow::Result<FixedOffset> {
    FixedOffset::east_opt(TAIPEI_OFFSET_SECS).context("invalid Taipei offset")
}

/// Snapshot timestamp shown on the dashboard, in Taipei wall-clock time.
pub fn format_last_updated(now_utc: DateTime<Utc>) -> anyhow::Result<String> {
    Ok(now_utc
        .with_timezone(&taipei()?)
        .format(LAST_UPDATED_FORMAT)
        .to_string())
}

/// Taipei calendar date, used to key the daily price history.
pub fn taipei_date(now_utc: DateTime<Utc>) -> anyhow::Result<NaiveDate> {
    Ok(now_utc.with_timezone(&taipei()?).date_naive())
}

pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_in_taipei_time() {
        // 2026-01-05 17:30:05 UTC = 2026-01-06 01:30:05 Taipei
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 17, 30, 5).unwrap();
        assert_eq!(format_last_updated(now).unwrap(), "2026-01-06 01:30:05");
    }

    #[test]
    fn date_rolls_over_at_taipei_midnight() {
        let before = Utc.with_ymd_and_hms(2026, 3, 1, 15, 59, 59).unwrap();
        let after = Utc.with_ymd_and_hms(2026, 3, 1, 16, 0, 0).unwrap();
        assert_eq!(
            taipei_date(before).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
        );
        assert_eq!(date_key(taipei_date(after).unwrap()), "2026-03-02");
    }
}
