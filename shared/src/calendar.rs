use chrono::{DateTime, Days, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Every instant in a dataset is reduced to a calendar date in this fixed
/// offset, never the viewer's local zone.
pub const REFERENCE_UTC_OFFSET_HOURS: i32 = -5;

pub fn reference_offset() -> FixedOffset {
    FixedOffset::east_opt(REFERENCE_UTC_OFFSET_HOURS * 3600).unwrap_or_else(|| Utc.fix())
}

/// Calendar date of `instant` in the reference offset.
pub fn calendar_date(instant: DateTime<FixedOffset>) -> NaiveDate {
    instant.with_timezone(&reference_offset()).date_naive()
}

pub fn from_epoch_millis(millis: i64) -> Option<DateTime<FixedOffset>> {
    DateTime::<Utc>::from_timestamp_millis(millis).map(|dt| dt.with_timezone(&reference_offset()))
}

/// Parse a `YYYY-MM-DD` date with an optional `HH:MM[:SS]` wall time, both
/// read as reference-offset local time. Full RFC 3339 strings are accepted too.
pub fn parse_local(date: &str, time: Option<&str>) -> Option<DateTime<FixedOffset>> {
    let date = date.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        return Some(dt.with_timezone(&reference_offset()));
    }
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date, "%m/%d/%Y"))
        .ok()?;
    let wall = time
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .and_then(|t| {
            NaiveTime::parse_from_str(t, "%H:%M:%S")
                .or_else(|_| NaiveTime::parse_from_str(t, "%H:%M"))
                .ok()
        })
        .unwrap_or(NaiveTime::MIN);
    reference_offset()
        .from_local_datetime(&day.and_time(wall))
        .single()
}

/// Inclusive range of calendar dates covered by a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateBounds {
    pub earliest: NaiveDate,
    pub latest: NaiveDate,
}

impl DateBounds {
    pub fn new(a: NaiveDate, b: NaiveDate) -> Self {
        Self {
            earliest: a.min(b),
            latest: a.max(b),
        }
    }

    pub fn enclosing(dates: impl IntoIterator<Item = NaiveDate>) -> Option<Self> {
        let mut iter = dates.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self::new(first, first), |bounds, date| Self {
            earliest: bounds.earliest.min(date),
            latest: bounds.latest.max(date),
        }))
    }

    pub fn clamp(&self, date: NaiveDate) -> NaiveDate {
        date.clamp(self.earliest, self.latest)
    }

    /// Number of calendar days in the range, both ends included.
    pub fn day_count(&self) -> usize {
        (self.latest - self.earliest).num_days() as usize + 1
    }

    /// The following calendar day, wrapping from `latest` back to `earliest`.
    pub fn next_wrapping(&self, date: NaiveDate) -> NaiveDate {
        let date = self.clamp(date);
        if date >= self.latest {
            return self.earliest;
        }
        date.succ_opt().unwrap_or(self.earliest)
    }

    /// The previous calendar day, wrapping from `earliest` to `latest`.
    pub fn prev_wrapping(&self, date: NaiveDate) -> NaiveDate {
        let date = self.clamp(date);
        if date <= self.earliest {
            return self.latest;
        }
        date.pred_opt().unwrap_or(self.latest)
    }

    /// Zero-based position of `date` in the range, after clamping.
    pub fn offset_of(&self, date: NaiveDate) -> usize {
        (self.clamp(date) - self.earliest).num_days() as usize
    }

    pub fn date_at(&self, offset: usize) -> NaiveDate {
        self.earliest
            .checked_add_days(Days::new(offset as u64))
            .map(|d| self.clamp(d))
            .unwrap_or(self.latest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn epoch_millis_near_midnight_uses_reference_offset() {
        // 2012-04-02T03:30:00Z is still April 1st at UTC-5.
        let instant = from_epoch_millis(1_333_337_400_000).unwrap();
        assert_eq!(calendar_date(instant), d("2012-04-01"));
        // 2012-04-02T05:00:00Z is midnight at UTC-5.
        let instant = from_epoch_millis(1_333_342_800_000).unwrap();
        assert_eq!(calendar_date(instant), d("2012-04-02"));
    }

    #[test]
    fn parses_local_date_and_time() {
        let dt = parse_local("2012-04-02", Some("23:59:00")).unwrap();
        assert_eq!(calendar_date(dt), d("2012-04-02"));
        let dt = parse_local("4/2/2012", None).unwrap();
        assert_eq!(calendar_date(dt), d("2012-04-02"));
        let dt = parse_local("2012-04-03T02:00:00Z", None).unwrap();
        assert_eq!(calendar_date(dt), d("2012-04-02"));
        assert!(parse_local("not a date", None).is_none());
    }

    #[test]
    fn clamps_into_range() {
        let bounds = DateBounds::new(d("2012-01-01"), d("2012-04-02"));
        assert_eq!(bounds.clamp(d("2011-12-25")), d("2012-01-01"));
        assert_eq!(bounds.clamp(d("2013-01-01")), d("2012-04-02"));
        assert_eq!(bounds.clamp(d("2012-02-29")), d("2012-02-29"));
    }

    #[test]
    fn next_wraps_at_latest() {
        let bounds = DateBounds::new(d("2012-01-01"), d("2012-01-03"));
        assert_eq!(bounds.day_count(), 3);
        assert_eq!(bounds.next_wrapping(d("2012-01-01")), d("2012-01-02"));
        assert_eq!(bounds.next_wrapping(d("2012-01-03")), d("2012-01-01"));
        assert_eq!(bounds.prev_wrapping(d("2012-01-01")), d("2012-01-03"));
    }

    #[test]
    fn offsets_round_trip_through_dates() {
        let bounds = DateBounds::new(d("2012-02-27"), d("2012-03-02"));
        assert_eq!(bounds.offset_of(d("2012-03-01")), 3);
        assert_eq!(bounds.date_at(3), d("2012-03-01"));
        assert_eq!(bounds.date_at(99), d("2012-03-02"));
    }
}
