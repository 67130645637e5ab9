//! # asset-refs-engine
//!
//! Finds references to binary assets embedded in stored HTML, resolves them
//! against an [`AssetStore`] and rewrites them into another form:
//!
//! - **render**: `<img>` tags become full `<picture>` markup ([`pattern`])
//! - **export**: live ids become portable paths, recorded in a ledger
//! - **import**: portable paths known to the import become live ids again
//! - **validate**: every referenced asset must exist; content is unchanged
//!
//! Export, import and validate work on a lossless parse of the fragment
//! ([`markup`]), so everything but the touched attributes comes back
//! byte-for-byte. Rendering works on regex matches and needs no parse.
//!
//! ```
//! use asset_refs_engine::{Asset, ExportedReferenceLedger, InMemoryAssetStore,
//!     PictureTagRenderer, ReferenceProcessor};
//!
//! let store: InMemoryAssetStore = [Asset::new(42, "image.png", "image/png")]
//!     .into_iter()
//!     .collect();
//! let renderer = PictureTagRenderer::default();
//! let processor = ReferenceProcessor::new(&store, &renderer);
//!
//! let mut ledger = ExportedReferenceLedger::new();
//! let exported = processor
//!     .replace_export_references(r#"<p><img data-fileEntryId="42" src="x"/></p>"#, &mut ledger)
//!     .unwrap();
//! assert_eq!(exported, r#"<p><img export-import-path="/documents/42/image.png" src="x"/></p>"#);
//!
//! let imported = processor
//!     .replace_import_references(&exported, &ledger.to_reference_set())
//!     .unwrap();
//! assert_eq!(imported, r#"<p><img data-fileEntryId="42" src="x"/></p>"#);
//! ```

pub mod asset;
pub mod error;
pub mod marker;
pub mod markup;
pub mod pattern;
pub mod processor;
pub mod render;
pub mod rewrite;
pub mod scope;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use asset::{Asset, AssetId, AssetStore, InMemoryAssetStore, StoreError};
pub use error::RewriteError;
pub use marker::MarkerAttributes;
pub use pattern::{ImgTagTransformer, transform};
pub use processor::{Mode, ReferenceProcessor, RewriteContext};
pub use render::{PictureTagRenderer, RenderSettings, Rendition, TagRenderer};
pub use rewrite::{
    ExportedReference, ExportedReferenceLedger, MarkupReferenceRewriter, Outcome, ReferenceSet,
    Resolution, SkipReason,
};
pub use scope::ContentScope;
