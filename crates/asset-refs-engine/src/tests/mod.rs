//! Shared fixtures for unit tests.

use crate::asset::{Asset, AssetId, AssetStore, InMemoryAssetStore, StoreError};

/// Store holding an image (42), an SVG diagram (7) and a PDF (9).
pub fn sample_store() -> InMemoryAssetStore {
    [
        Asset::new(42, "image.png", "image/png"),
        Asset::new(7, "diagram.svg", "image/svg+xml"),
        Asset::new(9, "report.pdf", "application/pdf"),
    ]
    .into_iter()
    .collect()
}

/// A store whose backend is down.
pub struct FailingStore;

impl AssetStore for FailingStore {
    fn lookup(&self, _id: AssetId) -> Result<Asset, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    fn path_for(&self, asset: &Asset) -> String {
        format!("/documents/{}", asset.id)
    }
}
