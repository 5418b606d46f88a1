pub mod calendar;
pub mod feature;
pub mod filter;
pub mod geojson;
pub mod index;
pub mod playback;
pub mod projection;
pub mod season;
pub mod sync;

pub use calendar::DateBounds;
pub use feature::{BoundaryLayer, Dataset, Feature, FeatureId, Geometry, LoadError, LoadReport, LonLat};
pub use filter::{FeatureState, FilterMode, FilterState};
pub use index::DayIndex;
pub use playback::{PlaybackState, SpeedTier, TickScheduler};
pub use projection::{Pixel, PixelBounds, ViewState};
pub use season::{Season, SeasonSet};
pub use sync::{FilterFrame, RenderSync, SyncConfig, SyncEvent, ViewFrame};
