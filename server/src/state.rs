use std::sync::Arc;

use bytes::Bytes;
use tracing::warn;

use crate::catalog::Catalog;

/// Immutable after startup; cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    /// Catalog serialized once at startup.
    pub catalog_json: Arc<Bytes>,
    pub catalog_etag: Arc<str>,
}

impl AppState {
    pub fn new(catalog: Catalog) -> Self {
        let json = serde_json::to_vec(&catalog)
            .map(Bytes::from)
            .unwrap_or_else(|e| {
                warn!(error = %e, "failed to serialize catalog");
                Bytes::from_static(br#"{"datasets":[]}"#)
            });
        let etag = format!("\"catalog-{:08x}\"", crc32fast::hash(&json));
        Self {
            catalog: Arc::new(catalog),
            catalog_json: Arc::new(json),
            catalog_etag: Arc::from(etag),
        }
    }
}
