use std::path::Path;

use hazardmap_shared::{BoundaryLayer, Dataset, DateBounds, LoadError};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::MAX_DATASET_BYTES;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    Events,
    Boundaries,
}

/// What the client needs to pick a dataset without downloading it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub name: String,
    pub kind: DatasetKind,
    pub feature_count: usize,
    pub skipped: usize,
    pub without_direction: usize,
    pub bounds: Option<DateBounds>,
    pub bytes: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Catalog {
    pub datasets: Vec<DatasetSummary>,
}

impl Catalog {
    pub fn event_datasets(&self) -> impl Iterator<Item = &DatasetSummary> {
        self.datasets
            .iter()
            .filter(|d| d.kind == DatasetKind::Events)
    }
}

/// Dataset name for a catalog file, or `None` if the file is not served.
/// Names follow the same charset the client accepts in `?dataset=`.
pub fn dataset_name(file_name: &str) -> Option<&str> {
    let stem = file_name.strip_suffix(".geojson")?;
    let valid = !stem.is_empty()
        && stem.len() <= 64
        && stem
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then_some(stem)
}

/// Classify one file. Event collections win; a collection with no dated
/// events is accepted as a boundary layer if it carries any lines.
pub fn summarize(name: &str, text: &str, bytes: u64) -> Result<DatasetSummary, LoadError> {
    match Dataset::from_geojson(text) {
        Ok(dataset) => {
            let report = dataset.report();
            Ok(DatasetSummary {
                name: name.to_string(),
                kind: DatasetKind::Events,
                feature_count: dataset.len(),
                skipped: report.skipped.len(),
                without_direction: report.without_direction,
                bounds: Some(dataset.date_bounds()),
                bytes,
            })
        }
        Err(LoadError::NoUsableFeatures { total }) => {
            let layer = BoundaryLayer::from_geojson(text)?;
            if layer.lines.is_empty() {
                return Err(LoadError::NoUsableFeatures { total });
            }
            Ok(DatasetSummary {
                name: name.to_string(),
                kind: DatasetKind::Boundaries,
                feature_count: layer.lines.len(),
                skipped: total.saturating_sub(layer.lines.len()),
                without_direction: 0,
                bounds: None,
                bytes,
            })
        }
        Err(e) => Err(e),
    }
}

/// Scan `dir` for `.geojson` files. Unreadable or invalid files are logged
/// and left out; a missing directory yields an empty catalog.
pub async fn scan(dir: &Path) -> Catalog {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, dir = %dir.display(), "data directory unavailable");
            return Catalog::default();
        }
    };

    let mut datasets = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, dir = %dir.display(), "failed to list data directory");
                break;
            }
        };
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str().and_then(dataset_name) else {
            continue;
        };
        let path = entry.path();

        let bytes = match entry.metadata().await {
            Ok(meta) if meta.is_file() => meta.len(),
            Ok(_) => continue,
            Err(e) => {
                warn!(error = %e, path = %path.display(), "failed to stat dataset");
                continue;
            }
        };
        if bytes > MAX_DATASET_BYTES {
            warn!(path = %path.display(), bytes, "dataset exceeds size limit, skipping");
            continue;
        }

        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, path = %path.display(), "failed to read dataset");
                continue;
            }
        };

        match summarize(name, &text, bytes) {
            Ok(summary) => {
                info!(
                    dataset = %summary.name,
                    kind = ?summary.kind,
                    features = summary.feature_count,
                    skipped = summary.skipped,
                    without_direction = summary.without_direction,
                    "catalogued dataset"
                );
                datasets.push(summary);
            }
            Err(e) => {
                warn!(error = %e, path = %path.display(), "invalid dataset, skipping");
            }
        }
    }

    datasets.sort_by(|a, b| a.name.cmp(&b.name));
    Catalog { datasets }
}
