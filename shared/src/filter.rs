use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::DateBounds;
use crate::feature::Feature;
use crate::playback::SpeedTier;
use crate::season::SeasonSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Everything up to and including the cursor date.
    #[default]
    Cumulative,
    /// Only the cursor date itself.
    Daily,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Visible,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryState {
    Active,
    Inactive,
}

/// Filter outcome for one feature, consumed by the drawing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureState {
    pub visibility: Visibility,
    pub category: CategoryState,
}

impl FeatureState {
    pub fn is_visible(&self) -> bool {
        self.visibility == Visibility::Visible
    }
}

pub fn visible(feature: &Feature, cursor: NaiveDate, mode: FilterMode, active: SeasonSet) -> bool {
    if !active.contains(feature.season) {
        return false;
    }
    match mode {
        FilterMode::Cumulative => feature.date <= cursor,
        FilterMode::Daily => feature.date == cursor,
    }
}

pub fn feature_state(
    feature: &Feature,
    cursor: NaiveDate,
    mode: FilterMode,
    active: SeasonSet,
) -> FeatureState {
    FeatureState {
        visibility: if visible(feature, cursor, mode, active) {
            Visibility::Visible
        } else {
            Visibility::Hidden
        },
        category: if active.contains(feature.season) {
            CategoryState::Active
        } else {
            CategoryState::Inactive
        },
    }
}

/// Everything the viewer controls about which features are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub cursor: NaiveDate,
    pub mode: FilterMode,
    pub active: SeasonSet,
    pub speed: SpeedTier,
    pub playing: bool,
}

impl FilterState {
    pub fn new(cursor: NaiveDate) -> Self {
        Self {
            cursor,
            mode: FilterMode::default(),
            active: SeasonSet::all(),
            speed: SpeedTier::default(),
            playing: false,
        }
    }

    /// Move the cursor, clamped into `bounds`. Returns whether it changed.
    pub fn set_cursor(&mut self, date: NaiveDate, bounds: DateBounds) -> bool {
        let date = bounds.clamp(date);
        let changed = date != self.cursor;
        self.cursor = date;
        changed
    }

    pub fn evaluate(&self, features: &[Feature]) -> Vec<FeatureState> {
        features
            .iter()
            .map(|f| feature_state(f, self.cursor, self.mode, self.active))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::parse_local;
    use crate::feature::{Geometry, LonLat};
    use crate::season::Season;

    fn feature(date: &str, time: &str) -> Feature {
        let at = parse_local(date, Some(time)).unwrap();
        Feature::new(0, Geometry::Point(LonLat::new(0.0, 0.0)), at, 1.0)
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn cumulative_includes_the_cursor_day() {
        let f = feature("2012-04-02", "23:59:59");
        let all = SeasonSet::all();
        assert!(visible(&f, d("2012-04-02"), FilterMode::Cumulative, all));
        assert!(!visible(&f, d("2012-04-01"), FilterMode::Cumulative, all));
    }

    #[test]
    fn daily_matches_exact_calendar_day() {
        let f = feature("2012-04-02", "00:00:00");
        let all = SeasonSet::all();
        assert!(visible(&f, d("2012-04-02"), FilterMode::Daily, all));
        assert!(!visible(&f, d("2012-04-03"), FilterMode::Daily, all));
        assert!(!visible(&f, d("2012-04-01"), FilterMode::Daily, all));
    }

    #[test]
    fn inactive_category_hides_regardless_of_date() {
        let f = feature("2012-04-02", "12:00:00");
        let mut active = SeasonSet::all();
        active.remove(Season::Spring);
        let state = feature_state(&f, d("2012-12-31"), FilterMode::Cumulative, active);
        assert_eq!(state.visibility, Visibility::Hidden);
        assert_eq!(state.category, CategoryState::Inactive);
    }

    #[test]
    fn set_cursor_clamps_to_bounds() {
        let bounds = DateBounds::new(d("2012-01-01"), d("2012-04-02"));
        let mut state = FilterState::new(d("2012-01-01"));
        assert!(state.set_cursor(d("2013-07-04"), bounds));
        assert_eq!(state.cursor, d("2012-04-02"));
        assert!(!state.set_cursor(d("2014-01-01"), bounds));
        state.set_cursor(d("1999-01-01"), bounds);
        assert_eq!(state.cursor, d("2012-01-01"));
    }
}
