use asset_refs_engine::{
    Asset, ContentScope, ExportedReferenceLedger, InMemoryAssetStore, MarkerAttributes,
    RenderSettings,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to read {path}: {source}")]
    DataReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    DataParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Asset manifest used when a command does not name one.
    pub store_manifest: Option<PathBuf>,
    pub markers: MarkerAttributes,
    pub scope: ContentScope,
    pub render: RenderSettings,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the manifest path
        config.store_manifest = config
            .store_manifest
            .map(|path| Self::expand_path(&path).unwrap_or(path));

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/asset-refs");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

/// On-disk list of the assets an [`InMemoryAssetStore`] is built from.
#[derive(Debug, Default, Deserialize)]
pub struct AssetManifest {
    #[serde(default)]
    pub assets: Vec<Asset>,
}

impl AssetManifest {
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        read_toml(path.as_ref())
    }

    pub fn into_store(self) -> InMemoryAssetStore {
        self.assets.into_iter().collect()
    }
}

/// Reads a ledger written by [`write_ledger`].
pub fn read_ledger<P: AsRef<Path>>(path: P) -> Result<ExportedReferenceLedger, ConfigError> {
    read_toml(path.as_ref())
}

pub fn write_ledger<P: AsRef<Path>>(
    path: P,
    ledger: &ExportedReferenceLedger,
) -> anyhow::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(ledger)?)?;
    Ok(())
}

fn read_toml<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::DataReadError {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::DataParseError {
        path: path.to_path_buf(),
        source,
    })
}
