use hazardmap_shared::{BoundaryLayer, Dataset};

pub const DEFAULT_DATASET: &str = "tornadoes";

/// Which files the page was asked to show, from `?dataset=` and
/// `?boundaries=`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRequest {
    pub dataset: String,
    pub boundaries: Option<String>,
}

impl DataRequest {
    pub fn from_query(search: &str) -> Self {
        let params = web_sys::UrlSearchParams::new_with_str(search).ok();
        let get = |key: &str| params.as_ref().and_then(|p| p.get(key));
        Self::from_params(get("dataset"), get("boundaries"))
    }

    fn from_params(dataset: Option<String>, boundaries: Option<String>) -> Self {
        Self {
            dataset: dataset
                .and_then(|name| clean_name(&name))
                .unwrap_or_else(|| DEFAULT_DATASET.to_string()),
            boundaries: boundaries.and_then(|name| clean_name(&name)),
        }
    }

    pub fn dataset_url(&self) -> String {
        data_url(&self.dataset)
    }

    pub fn boundaries_url(&self) -> Option<String> {
        self.boundaries.as_deref().map(data_url)
    }
}

fn data_url(name: &str) -> String {
    format!("/data/{name}.geojson")
}

/// Dataset names are plain file stems; anything else falls back to the default.
fn clean_name(raw: &str) -> Option<String> {
    let name = raw.trim();
    let valid = !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then(|| name.to_string())
}

async fn fetch_text(url: &str) -> Result<String, String> {
    let resp = gloo_net::http::Request::get(url)
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }

    resp.text().await.map_err(|e| format!("read error: {e}"))
}

fn warn(message: &str) {
    web_sys::console::warn_1(&message.into());
}

/// Fetch and parse the requested dataset. A missing or broken boundary layer
/// only costs the boundary lines.
pub async fn load(request: &DataRequest) -> Result<Dataset, String> {
    let text = fetch_text(&request.dataset_url()).await?;
    let dataset = Dataset::from_geojson(&text).map_err(|e| format!("parse error: {e}"))?;

    let report = dataset.report();
    for skipped in &report.skipped {
        warn(&format!(
            "{}: skipped feature {}: {}",
            request.dataset, skipped.index, skipped.reason
        ));
    }
    if report.without_direction > 0 {
        warn(&format!(
            "{}: {} features have no direction and are left off the compass",
            request.dataset, report.without_direction
        ));
    }

    let Some(url) = request.boundaries_url() else {
        return Ok(dataset);
    };
    let layer = match fetch_text(&url).await {
        Ok(text) => BoundaryLayer::from_geojson(&text).map_err(|e| format!("parse error: {e}")),
        Err(e) => Err(e),
    };
    match layer {
        Ok(layer) => Ok(dataset.with_boundaries(layer)),
        Err(e) => {
            warn(&format!("boundary layer {url}: {e}"));
            Ok(dataset)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_tornadoes() {
        let request = DataRequest::from_params(None, None);
        assert_eq!(request.dataset, "tornadoes");
        assert_eq!(request.dataset_url(), "/data/tornadoes.geojson");
        assert_eq!(request.boundaries_url(), None);
    }

    #[test]
    fn rejects_path_like_names() {
        let request = DataRequest::from_params(Some("../secrets".into()), Some("a/b".into()));
        assert_eq!(request.dataset, DEFAULT_DATASET);
        assert_eq!(request.boundaries, None);
    }

    #[test]
    fn keeps_plain_names() {
        let request =
            DataRequest::from_params(Some(" earthquakes_2012 ".into()), Some("plates".into()));
        assert_eq!(request.dataset_url(), "/data/earthquakes_2012.geojson");
        assert_eq!(request.boundaries_url().as_deref(), Some("/data/plates.geojson"));
    }
}
