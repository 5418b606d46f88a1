use std::cell::Cell;
use std::rc::Rc;

use chrono::NaiveDate;
use hazardmap_shared::filter::visible;
use hazardmap_shared::projection::project_geometry;
use hazardmap_shared::{
    Dataset, DayIndex, FilterMode, RenderSync, Season, SeasonSet, SyncConfig, SyncEvent,
    TickScheduler, ViewState,
};

/// Counts live handles; cancelling or dropping a handle kills it.
#[derive(Default)]
struct CountingScheduler {
    live: Rc<Cell<usize>>,
}

struct Handle(Rc<Cell<usize>>);

impl Drop for Handle {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

impl TickScheduler for CountingScheduler {
    type Handle = Handle;

    fn schedule(&mut self, _after_ms: u32) -> Handle {
        self.live.set(self.live.get() + 1);
        Handle(Rc::clone(&self.live))
    }

    fn cancel(&mut self, handle: Handle) {
        drop(handle);
    }
}

const THREE_TRACKS: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {"type": "Feature",
         "properties": {"date": "2012-01-01", "time": "09:30:00", "mag": 1,
                        "slat": 34.0, "slon": -90.0, "elat": 34.5, "elon": -89.0},
         "geometry": {"type": "LineString", "coordinates": [[-90.0, 34.0], [-89.0, 34.5]]}},
        {"type": "Feature",
         "properties": {"date": "2012-04-02", "time": "16:10:00", "mag": 3,
                        "slat": 35.0, "slon": -88.0, "elat": 35.4, "elon": -87.2},
         "geometry": {"type": "LineString", "coordinates": [[-88.0, 35.0], [-87.2, 35.4]]}},
        {"type": "Feature",
         "properties": {"date": "2012-04-02", "time": "18:45:00", "mag": 2,
                        "slat": 36.0, "slon": -86.0, "elat": 36.2, "elon": -85.5},
         "geometry": {"type": "LineString", "coordinates": [[-86.0, 36.0], [-85.5, 36.2]]}}
    ]
}"#;

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn dataset() -> Dataset {
    Dataset::from_geojson(THREE_TRACKS).unwrap()
}

fn view() -> ViewState {
    ViewState::new(hazardmap_shared::LonLat::new(-88.0, 35.0), 6.0, 1024.0, 768.0)
}

fn sync() -> RenderSync<CountingScheduler> {
    RenderSync::new(dataset(), view(), CountingScheduler::default(), SyncConfig::default())
}

#[test]
fn three_feature_scenario_counts() {
    let mut sync = sync();
    let frame = sync.apply(SyncEvent::CursorChanged(d("2012-04-02"))).unwrap();
    assert_eq!(frame.visible_count, 3);

    let frame = sync.apply(SyncEvent::CursorChanged(d("2012-01-01"))).unwrap();
    assert_eq!(frame.visible_count, 1);

    sync.apply(SyncEvent::ModeChanged(FilterMode::Daily));
    let frame = sync.apply(SyncEvent::CursorChanged(d("2012-04-02"))).unwrap();
    assert_eq!(frame.visible_count, 2);

    let frame = sync.apply(SyncEvent::CursorChanged(d("2012-01-02"))).unwrap();
    assert_eq!(frame.visible_count, 0);
}

#[test]
fn toggling_a_season_updates_all_visuals_in_one_frame() {
    let mut sync = sync();
    let before = sync.current_frame();
    let frame = sync.apply(SyncEvent::CategoryToggled(Season::Spring)).unwrap();
    assert!(frame.revision > before.revision);

    let springs: Vec<usize> = sync
        .dataset()
        .features()
        .iter()
        .filter(|f| f.season == Season::Spring)
        .map(|f| f.id)
        .collect();
    assert_eq!(springs, vec![1, 2]);

    for style in &frame.overlay {
        assert_eq!(style.state.is_visible(), !springs.contains(&style.id));
    }
    for bar in &frame.compass {
        assert_eq!(bar.visible, !springs.contains(&bar.id));
        if springs.contains(&bar.id) {
            assert_eq!(bar.length, 0.0);
        } else {
            assert!(bar.length > 0.0);
        }
    }
    let counts: Vec<(u16, usize)> = frame.graph.iter().map(|b| (b.day_of_year, b.count)).collect();
    assert_eq!(counts, vec![(1, 1), (93, 0)]);
}

#[test]
fn every_feature_lands_in_exactly_one_bucket() {
    let dataset = dataset();
    let index = DayIndex::build(dataset.features());
    for feature in dataset.features() {
        let by_day = index
            .day_of_year_buckets()
            .filter(|(_, ids)| ids.contains(&feature.id))
            .count();
        let by_date = index
            .date_buckets()
            .filter(|(_, ids)| ids.contains(&feature.id))
            .count();
        assert_eq!((by_day, by_date), (1, 1));
    }
}

#[test]
fn cumulative_visibility_never_turns_off_as_the_cursor_advances() {
    let dataset = dataset();
    let bounds = dataset.date_bounds();
    let mut active = SeasonSet::all();
    active.remove(Season::Summer);
    for feature in dataset.features() {
        let mut seen = false;
        for offset in 0..bounds.day_count() {
            let shown = visible(feature, bounds.date_at(offset), FilterMode::Cumulative, active);
            assert!(shown || !seen, "feature {} disappeared", feature.id);
            seen |= shown;
        }
        assert!(seen);
    }
}

#[test]
fn zero_pan_reprojects_to_identical_pixels() {
    let dataset = dataset();
    let original = view();
    let mut panned = original;
    panned.pan_by(0.0, 0.0);
    for feature in dataset.features() {
        assert_eq!(
            project_geometry(&original, &feature.geometry),
            project_geometry(&panned, &feature.geometry)
        );
    }
}

#[test]
fn full_playback_cycle_returns_to_first_date() {
    let mut sync = sync();
    let bounds = sync.date_bounds();
    sync.apply(SyncEvent::SliderDragged(bounds.earliest));
    sync.apply(SyncEvent::PlayClicked);

    let mut wraps = 0;
    let mut previous = sync.filter().cursor;
    for _ in 0..bounds.day_count() {
        let frame = sync.apply(SyncEvent::Tick).unwrap();
        if frame.cursor < previous {
            wraps += 1;
        }
        previous = frame.cursor;
    }
    assert_eq!(sync.filter().cursor, bounds.earliest);
    assert_eq!(wraps, 1);
    assert_eq!(sync.scheduler().live.get(), 1);
}

#[test]
fn pause_drag_and_replay_keep_a_single_timer() {
    let mut sync = sync();
    sync.apply(SyncEvent::PlayClicked);
    sync.apply(SyncEvent::PlayClicked);
    assert_eq!(sync.scheduler().live.get(), 1);
    sync.apply(SyncEvent::SpeedChanged(hazardmap_shared::SpeedTier::Fastest));
    assert_eq!(sync.scheduler().live.get(), 1);
    sync.apply(SyncEvent::SliderDragged(d("2012-02-10")));
    assert_eq!(sync.scheduler().live.get(), 0);
    sync.apply(SyncEvent::PauseClicked);
    assert_eq!(sync.scheduler().live.get(), 0);
    assert_eq!(sync.apply(SyncEvent::Tick), None);
}
