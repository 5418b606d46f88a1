use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::calendar::DateBounds;
use crate::feature::{Feature, FeatureId};

/// Features bucketed by day of year (1-366) and by exact calendar date.
///
/// Built once per dataset. Every indexed feature sits in exactly one bucket
/// of each map, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayIndex {
    by_day_of_year: BTreeMap<u16, Vec<FeatureId>>,
    by_date: BTreeMap<NaiveDate, Vec<FeatureId>>,
    max_bucket: usize,
    len: usize,
}

pub fn day_of_year(date: NaiveDate) -> u16 {
    date.ordinal() as u16
}

impl DayIndex {
    pub fn build(features: &[Feature]) -> Self {
        Self::index_all(features.iter())
    }

    /// Index only the features dated on or before `cutoff`.
    pub fn build_until(features: &[Feature], cutoff: NaiveDate) -> Self {
        Self::index_all(features.iter().filter(|f| f.date <= cutoff))
    }

    fn index_all<'a>(features: impl Iterator<Item = &'a Feature>) -> Self {
        let mut index = Self::default();
        for feature in features {
            index
                .by_day_of_year
                .entry(day_of_year(feature.date))
                .or_default()
                .push(feature.id);
            index.by_date.entry(feature.date).or_default().push(feature.id);
            index.len += 1;
        }
        index.max_bucket = index.by_day_of_year.values().map(Vec::len).max().unwrap_or(0);
        index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the fullest day-of-year bucket.
    pub fn max_bucket(&self) -> usize {
        self.max_bucket
    }

    pub fn on_day_of_year(&self, day: u16) -> &[FeatureId] {
        self.by_day_of_year.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn on_date(&self, date: NaiveDate) -> &[FeatureId] {
        self.by_date.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `(day_of_year, features)` for every non-empty bucket, ascending.
    pub fn day_of_year_buckets(&self) -> impl Iterator<Item = (u16, &[FeatureId])> {
        self.by_day_of_year.iter().map(|(day, ids)| (*day, ids.as_slice()))
    }

    /// `(day_of_year, count)` for every non-empty bucket, ascending.
    pub fn histogram(&self) -> impl Iterator<Item = (u16, usize)> + '_ {
        self.by_day_of_year.iter().map(|(day, ids)| (*day, ids.len()))
    }

    pub fn date_buckets(&self) -> impl Iterator<Item = (NaiveDate, &[FeatureId])> {
        self.by_date.iter().map(|(date, ids)| (*date, ids.as_slice()))
    }

    /// Distinct event dates, ascending.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.by_date.keys().copied()
    }

    pub fn date_bounds(&self) -> Option<DateBounds> {
        let earliest = *self.by_date.keys().next()?;
        let latest = *self.by_date.keys().next_back()?;
        Some(DateBounds::new(earliest, latest))
    }
}
