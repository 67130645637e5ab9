//! Host-facing entry points.
//!
//! A [`ReferenceProcessor`] bundles the collaborators a rewrite needs (the
//! asset store, the tag renderer, the marker attribute names and the content
//! scope) and exposes the render, export, import and validate directions.
//! It holds no per-document state: every call builds its own tree, and the
//! ledger or reference set comes from the caller.

use crate::asset::AssetStore;
use crate::error::RewriteError;
use crate::marker::MarkerAttributes;
use crate::pattern::ImgTagTransformer;
use crate::render::TagRenderer;
use crate::rewrite::{ExportedReferenceLedger, MarkupReferenceRewriter, ReferenceSet, Resolution};
use crate::scope::ContentScope;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Export,
    Import,
    Validate,
}

/// Per-call inputs and outputs of [`ReferenceProcessor::rewrite_markup`].
#[derive(Debug, Default)]
pub struct RewriteContext {
    /// Required for [`Mode::Import`].
    pub reference_set: Option<ReferenceSet>,
    /// Filled by [`Mode::Export`].
    pub ledger: ExportedReferenceLedger,
}

impl RewriteContext {
    pub fn for_import(reference_set: ReferenceSet) -> Self {
        Self {
            reference_set: Some(reference_set),
            ledger: ExportedReferenceLedger::default(),
        }
    }
}

pub struct ReferenceProcessor<'a> {
    store: &'a dyn AssetStore,
    renderer: &'a dyn TagRenderer,
    markers: MarkerAttributes,
    scope: ContentScope,
}

impl<'a> ReferenceProcessor<'a> {
    pub fn new(store: &'a dyn AssetStore, renderer: &'a dyn TagRenderer) -> Self {
        Self {
            store,
            renderer,
            markers: MarkerAttributes::default(),
            scope: ContentScope::default(),
        }
    }

    pub fn with_markers(mut self, markers: MarkerAttributes) -> Self {
        self.markers = markers;
        self
    }

    pub fn with_scope(mut self, scope: ContentScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn markers(&self) -> &MarkerAttributes {
        &self.markers
    }

    /// Rewrites markup in the direction given by `mode`.
    ///
    /// Import reads `context.reference_set` and fails with a protocol
    /// violation when it is missing; export appends to `context.ledger`.
    pub fn rewrite_markup(
        &self,
        content: &str,
        mode: Mode,
        context: &mut RewriteContext,
    ) -> Result<String, RewriteError> {
        match mode {
            Mode::Export => self.export(content, &mut context.ledger),
            Mode::Import => {
                let references = context
                    .reference_set
                    .as_ref()
                    .ok_or_else(|| RewriteError::violation("import requires a reference set"))?;
                self.run(content, &mut Resolution::Import(references))
            }
            Mode::Validate => self.run(content, &mut Resolution::Validate),
        }
    }

    /// Replaces live ids with portable paths, recording each asset in `ledger`.
    ///
    /// `ledger` is only extended when the whole export succeeds.
    pub fn replace_export_references(
        &self,
        content: &str,
        ledger: &mut ExportedReferenceLedger,
    ) -> Result<String, RewriteError> {
        self.export(content, ledger)
    }

    /// Replaces portable paths found in `references` with live ids.
    pub fn replace_import_references(
        &self,
        content: &str,
        references: &ReferenceSet,
    ) -> Result<String, RewriteError> {
        self.run(content, &mut Resolution::Import(references))
    }

    /// Fails on the first reference to an asset the store does not have.
    pub fn validate_references(&self, content: &str) -> Result<(), RewriteError> {
        self.run(content, &mut Resolution::Validate).map(|_| ())
    }

    /// Renders `<img>` references into their full tags.
    pub fn render_references(&self, content: &str) -> Result<String, RewriteError> {
        let transformer = ImgTagTransformer::new(self.store, self.renderer, &self.markers)?;
        self.scope
            .apply(content, |region| transformer.transform(region))
    }

    fn export(
        &self,
        content: &str,
        ledger: &mut ExportedReferenceLedger,
    ) -> Result<String, RewriteError> {
        let mut recorded = ExportedReferenceLedger::new();
        let exported = self.run(content, &mut Resolution::Export(&mut recorded))?;
        ledger.merge(recorded);
        Ok(exported)
    }

    fn run(&self, content: &str, resolution: &mut Resolution<'_>) -> Result<String, RewriteError> {
        let rewriter = MarkupReferenceRewriter::new(self.store, self.renderer, &self.markers);
        self.scope
            .apply(content, |region| rewriter.rewrite(region, resolution))
    }
}
