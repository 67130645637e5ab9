use serde::{Deserialize, Serialize};

pub const DEFAULT_INTERNAL_ATTRIBUTE: &str = "data-fileEntryId";
pub const DEFAULT_EXTERNAL_ATTRIBUTE: &str = "export-import-path";

/// Attribute names that mark an element as holding an asset reference.
///
/// These names are the contract with everything else that reads the
/// content, so they are configurable but rarely changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerAttributes {
    /// Carries the live asset id.
    pub internal: String,
    /// Carries the portable asset path.
    pub external: String,
}

impl Default for MarkerAttributes {
    fn default() -> Self {
        Self {
            internal: DEFAULT_INTERNAL_ATTRIBUTE.to_string(),
            external: DEFAULT_EXTERNAL_ATTRIBUTE.to_string(),
        }
    }
}
