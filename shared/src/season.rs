use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Meteorological season of an event, derived from its calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Fall, Season::Winter];

    /// Dec-Feb winter, Mar-May spring, Jun-Aug summer, Sep-Nov fall.
    pub fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Fall,
            _ => Season::Winter,
        }
    }

    pub fn of(date: NaiveDate) -> Self {
        Self::from_month(date.month())
    }

    pub fn label(self) -> &'static str {
        match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
            Season::Winter => "Winter",
        }
    }

    fn bit(self) -> u8 {
        match self {
            Season::Spring => 1,
            Season::Summer => 1 << 1,
            Season::Fall => 1 << 2,
            Season::Winter => 1 << 3,
        }
    }
}

/// Subset of the four seasons, stored as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeasonSet(u8);

impl SeasonSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self(0b1111)
    }

    pub fn contains(self, season: Season) -> bool {
        self.0 & season.bit() != 0
    }

    pub fn insert(&mut self, season: Season) {
        self.0 |= season.bit();
    }

    pub fn remove(&mut self, season: Season) {
        self.0 &= !season.bit();
    }

    /// Flip membership of `season`. Returns whether it is now active.
    pub fn toggle(&mut self, season: Season) -> bool {
        self.0 ^= season.bit();
        self.contains(season)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl Default for SeasonSet {
    fn default() -> Self {
        Self::all()
    }
}

impl FromIterator<Season> for SeasonSet {
    fn from_iter<I: IntoIterator<Item = Season>>(iter: I) -> Self {
        let mut set = Self::empty();
        for season in iter {
            set.insert(season);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn months_map_to_meteorological_seasons() {
        assert_eq!(Season::from_month(1), Season::Winter);
        assert_eq!(Season::from_month(2), Season::Winter);
        assert_eq!(Season::from_month(3), Season::Spring);
        assert_eq!(Season::from_month(5), Season::Spring);
        assert_eq!(Season::from_month(6), Season::Summer);
        assert_eq!(Season::from_month(8), Season::Summer);
        assert_eq!(Season::from_month(9), Season::Fall);
        assert_eq!(Season::from_month(11), Season::Fall);
        assert_eq!(Season::from_month(12), Season::Winter);
    }

    #[test]
    fn toggle_flips_membership() {
        let mut set = SeasonSet::all();
        assert!(!set.toggle(Season::Spring));
        assert!(!set.contains(Season::Spring));
        assert!(set.contains(Season::Winter));
        assert!(set.toggle(Season::Spring));
        assert_eq!(set, SeasonSet::all());
    }

    #[test]
    fn collects_from_iterator() {
        let set: SeasonSet = [Season::Winter, Season::Spring].into_iter().collect();
        assert!(set.contains(Season::Spring) && set.contains(Season::Winter));
        assert!(!set.contains(Season::Summer) && !set.contains(Season::Fall));
        assert!(SeasonSet::empty().is_empty());
    }
}
