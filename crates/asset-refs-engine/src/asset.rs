//! Assets and the store they are resolved against.
//!
//! The engine never owns asset data. It asks an [`AssetStore`] to turn an
//! internal identifier into an [`Asset`] and, for exports, to compute the
//! portable path of that asset. [`InMemoryAssetStore`] backs the CLI and
//! the tests; hosts plug in their own implementation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Live, store-local identifier of an asset (the "internal form").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub u64);

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AssetId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(AssetId)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub title: String,
    pub mime_type: String,
}

impl Asset {
    pub fn new(id: u64, title: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            id: AssetId(id),
            title: title.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("Asset {0} does not exist")]
    NotFound(AssetId),
    #[error("Asset store unavailable: {0}")]
    Unavailable(String),
}

/// Lookup capability the engine resolves references against.
///
/// Implementations shared between threads must be safe for concurrent
/// reads; the engine itself holds no locks.
pub trait AssetStore {
    fn lookup(&self, id: AssetId) -> Result<Asset, StoreError>;

    /// Portable, location-independent path for `asset` (the "external form").
    fn path_for(&self, asset: &Asset) -> String;
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryAssetStore {
    assets: BTreeMap<AssetId, Asset>,
}

impl InMemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl FromIterator<Asset> for InMemoryAssetStore {
    fn from_iter<I: IntoIterator<Item = Asset>>(iter: I) -> Self {
        Self {
            assets: iter.into_iter().map(|asset| (asset.id, asset)).collect(),
        }
    }
}

impl AssetStore for InMemoryAssetStore {
    fn lookup(&self, id: AssetId) -> Result<Asset, StoreError> {
        self.assets.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    fn path_for(&self, asset: &Asset) -> String {
        format!("/documents/{}/{}", asset.id, asset.title)
    }
}
