use std::path::Path;

use axum::{
    Router,
    extract::Request,
    http::{HeaderValue, header},
    middleware::{self, Next},
    response::Response,
};
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;

use crate::routes;
use crate::state::AppState;

pub(crate) fn build_app(state: AppState, dist_dir: &Path, data_dir: &Path) -> Router {
    let static_assets = ServeDir::new(dist_dir)
        .precompressed_br()
        .precompressed_gzip();
    let datasets = ServeDir::new(data_dir).precompressed_gzip();

    Router::new()
        .route("/api/health", axum::routing::get(routes::api::health))
        .route(
            "/api/datasets",
            axum::routing::get(routes::api::list_datasets),
        )
        .nest_service("/data", datasets)
        .fallback_service(static_assets)
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(set_static_cache_control))
        .with_state(state)
}

async fn set_static_cache_control(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let mut response = next.run(request).await;

    if response.status().is_success()
        && let Some(cache_control) = cache_control_for_path(&path)
    {
        response.headers_mut().insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static(cache_control),
        );
    }

    response
}

fn cache_control_for_path(path: &str) -> Option<&'static str> {
    if is_hashed_bundle_asset(path) {
        return Some("public, max-age=31536000, immutable");
    }

    if path.starts_with("/data/") {
        return Some("public, max-age=3600");
    }

    None
}

fn is_hashed_bundle_asset(path: &str) -> bool {
    let Some(ext) = Path::new(path).extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    if !matches!(ext, "wasm" | "js" | "css") {
        return false;
    }

    let Some(filename) = Path::new(path).file_name().and_then(|name| name.to_str()) else {
        return false;
    };

    filename
        .split(['-', '_', '.'])
        .any(|segment| segment.len() >= 8 && segment.chars().all(|c| c.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::catalog;

    const TRACKS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature",
             "geometry": {"type": "LineString", "coordinates": [[-97.5, 35.3], [-97.3, 35.4]]},
             "properties": {"date": "2012-04-02", "time": "16:10", "mag": 2}}
        ]
    }"#;

    struct Fixture {
        root: PathBuf,
    }

    impl Fixture {
        async fn new(tag: &str) -> Self {
            let root = std::env::temp_dir().join(format!(
                "hazardmap-app-{tag}-{}",
                std::process::id()
            ));
            tokio::fs::create_dir_all(root.join("dist")).await.expect("dist dir");
            tokio::fs::create_dir_all(root.join("data")).await.expect("data dir");
            tokio::fs::write(root.join("dist/index.html"), "<div id=\"app\"></div>")
                .await
                .expect("index");
            tokio::fs::write(root.join("data/tornadoes.geojson"), TRACKS)
                .await
                .expect("dataset");
            Self { root }
        }

        async fn app(&self) -> Router {
            let data = self.root.join("data");
            let state = AppState::new(catalog::scan(&data).await);
            build_app(state, &self.root.join("dist"), &data)
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            std::fs::remove_dir_all(&self.root).ok();
        }
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).expect("request")
    }

    #[test]
    fn immutable_cache_for_hashed_bundle_assets() {
        assert_eq!(
            cache_control_for_path("/hazardmap-client-71578f6b278221f3_bg.wasm"),
            Some("public, max-age=31536000, immutable")
        );
        assert_eq!(
            cache_control_for_path("/index-a93762ff3bf6d63a.css"),
            Some("public, max-age=31536000, immutable")
        );
    }

    #[test]
    fn datasets_get_an_hour_of_cache() {
        assert_eq!(
            cache_control_for_path("/data/tornadoes.geojson"),
            Some("public, max-age=3600")
        );
    }

    #[test]
    fn no_cache_header_override_for_html_or_api() {
        assert_eq!(cache_control_for_path("/"), None);
        assert_eq!(cache_control_for_path("/index.html"), None);
        assert_eq!(cache_control_for_path("/api/datasets"), None);
    }

    #[tokio::test]
    async fn health_reports_catalogued_features() {
        let fixture = Fixture::new("health").await;
        let response = fixture.app().await.oneshot(get("/api/health")).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let health: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(health["status"], "ok");
        assert_eq!(health["datasets"], 1);
        assert_eq!(health["features"], 1);
    }

    #[tokio::test]
    async fn catalog_lists_datasets_and_honours_etag() {
        let fixture = Fixture::new("catalog").await;
        let app = fixture.app().await;

        let response = app.clone().oneshot(get("/api/datasets")).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let etag = response
            .headers()
            .get(header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .expect("etag");
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let catalog: serde_json::Value = serde_json::from_slice(&body).expect("json");
        let first = &catalog["datasets"][0];
        assert_eq!(first["name"], "tornadoes");
        assert_eq!(first["kind"], "events");
        assert_eq!(first["feature_count"], 1);
        assert_eq!(first["bounds"]["earliest"], "2012-04-02");

        let conditional = Request::builder()
            .uri("/api/datasets")
            .header(header::IF_NONE_MATCH, etag)
            .body(Body::empty())
            .expect("request");
        let response = app.oneshot(conditional).await.expect("response");
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn data_files_are_served_with_cache_control() {
        let fixture = Fixture::new("data").await;
        let response = fixture
            .app()
            .await
            .oneshot(get("/data/tornadoes.geojson"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL),
            Some(&HeaderValue::from_static("public, max-age=3600"))
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        assert_eq!(body.as_ref(), TRACKS.as_bytes());
    }

    #[tokio::test]
    async fn unknown_paths_fall_back_to_the_client_bundle() {
        let fixture = Fixture::new("fallback").await;
        let app = fixture.app().await;

        let response = app.clone().oneshot(get("/")).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        assert!(body.starts_with(b"<div id=\"app\">"));

        let missing = app.oneshot(get("/data/nope.geojson")).await.expect("response");
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }
}
