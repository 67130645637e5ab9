use crate::asset::{AssetId, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    #[error("Asset not found: {0}")]
    AssetNotFound(AssetId),
    #[error("Asset store error: {0}")]
    Store(String),
    #[error("Malformed content at byte {offset}: {reason}")]
    MalformedContent { offset: usize, reason: String },
    #[error("Resolution protocol violation: {0}")]
    ProtocolViolation(String),
    #[error("Invalid reference pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl From<StoreError> for RewriteError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => RewriteError::AssetNotFound(id),
            StoreError::Unavailable(reason) => RewriteError::Store(reason),
        }
    }
}

impl RewriteError {
    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        RewriteError::MalformedContent {
            offset,
            reason: reason.into(),
        }
    }

    pub(crate) fn violation(reason: impl Into<String>) -> Self {
        RewriteError::ProtocolViolation(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_not_found_maps_to_asset_not_found() {
        let err: RewriteError = StoreError::NotFound(AssetId(7)).into();
        assert!(matches!(err, RewriteError::AssetNotFound(AssetId(7))));
    }

    #[test]
    fn store_unavailable_is_kept_distinct() {
        let err: RewriteError = StoreError::Unavailable("disk offline".to_string()).into();
        assert!(matches!(err, RewriteError::Store(_)));
        assert_eq!(err.to_string(), "Asset store error: disk offline");
    }

    #[test]
    fn malformed_content_reports_offset() {
        let err = RewriteError::malformed(12, "unterminated tag");
        assert_eq!(
            err.to_string(),
            "Malformed content at byte 12: unterminated tag"
        );
    }
}
