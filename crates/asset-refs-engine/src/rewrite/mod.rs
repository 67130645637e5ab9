//! # Markup Reference Rewriting
//!
//! Parses content into a [`Fragment`], visits every element carrying a
//! marker attribute once, in document order, and serializes the result.
//!
//! Targets are collected before anything is mutated. A replacement that
//! regenerates an element's content detaches the old children, and any
//! target among them is skipped, so nothing produced or removed during the
//! pass is visited. The `<img>` a composite is regenerated from is resolved
//! just before rendering; that counts as its visit.
//!
//! Per element: `Resolving → Replacing | Skipping | Checking`. A failed
//! resolution aborts the whole document.

pub mod resolution;

use log::debug;

use crate::asset::{Asset, AssetStore};
use crate::error::RewriteError;
use crate::marker::MarkerAttributes;
use crate::markup::{Fragment, NodeId};
use crate::render::TagRenderer;

pub use resolution::{
    ExportedReference, ExportedReferenceLedger, Outcome, ReferenceSet, Replacement, Resolution,
    SkipReason,
};

/// Element whose inner image is regenerated when its reference is imported.
const COMPOSITE_ELEMENT: &str = "picture";

/// Runs `visit` on every attached element carrying `attribute`.
pub fn rewrite<F>(content: &str, attribute: &str, mut visit: F) -> Result<String, RewriteError>
where
    F: FnMut(&mut Fragment, NodeId) -> Result<(), RewriteError>,
{
    let mut fragment = Fragment::parse(content)?;

    for id in fragment.elements_with_attribute(attribute) {
        if !fragment.is_attached(id) {
            continue;
        }
        visit(&mut fragment, id)?;
    }

    Ok(fragment.to_html())
}

pub struct MarkupReferenceRewriter<'a> {
    store: &'a dyn AssetStore,
    renderer: &'a dyn TagRenderer,
    markers: &'a MarkerAttributes,
}

impl<'a> MarkupReferenceRewriter<'a> {
    pub fn new(
        store: &'a dyn AssetStore,
        renderer: &'a dyn TagRenderer,
        markers: &'a MarkerAttributes,
    ) -> Self {
        Self {
            store,
            renderer,
            markers,
        }
    }

    /// Rewrites every marker in `content` according to `resolution`.
    ///
    /// Validation returns `content` itself once every reference resolves.
    pub fn rewrite(
        &self,
        content: &str,
        resolution: &mut Resolution<'_>,
    ) -> Result<String, RewriteError> {
        let attribute = resolution.marker(self.markers);
        let rewritten = rewrite(content, attribute, |fragment, id| {
            self.visit(fragment, id, resolution)
        })?;

        if resolution.is_read_only() {
            return Ok(content.to_string());
        }
        Ok(rewritten)
    }

    fn visit(
        &self,
        fragment: &mut Fragment,
        id: NodeId,
        resolution: &mut Resolution<'_>,
    ) -> Result<(), RewriteError> {
        let attribute = resolution.marker(self.markers);
        let Some(value) = fragment
            .element(id)
            .and_then(|element| element.attribute(attribute))
            .map(str::to_string)
        else {
            return Ok(());
        };

        match resolution.resolve(self.store, self.markers, &value) {
            Outcome::Replaced(replacement) => self.apply(fragment, id, replacement, resolution),
            Outcome::Skipped(reason) => {
                debug!("Skipping {attribute}={value:?}: {reason:?}");
                Ok(())
            }
            Outcome::Failed(err) => Err(err),
        }
    }

    fn apply(
        &self,
        fragment: &mut Fragment,
        id: NodeId,
        replacement: Replacement,
        resolution: &mut Resolution<'_>,
    ) -> Result<(), RewriteError> {
        let Some(element) = fragment.element_mut(id) else {
            return Ok(());
        };
        debug!(
            "Replacing {}={:?} on <{}>",
            replacement.attribute,
            replacement.value,
            element.name()
        );
        element.tag.replace_attribute(
            &replacement.from,
            &replacement.attribute,
            &replacement.value,
        );

        if replacement.rerender && element.tag.is_named(COMPOSITE_ELEMENT) {
            self.rerender_composite(fragment, id, &replacement.asset, resolution)?;
        }
        Ok(())
    }

    /// Regenerates the content of a composite from its `<img>`.
    ///
    /// The `<img>` is resolved first, since the node it is rendered from is
    /// detached afterwards and never visited by the main pass. Rendered
    /// markup that is not itself a composite (non-image assets) leaves the
    /// existing children alone.
    fn rerender_composite(
        &self,
        fragment: &mut Fragment,
        id: NodeId,
        asset: &Asset,
        resolution: &mut Resolution<'_>,
    ) -> Result<(), RewriteError> {
        let img = fragment.first_descendant_element(id, "img").ok_or_else(|| {
            RewriteError::violation(format!(
                "<{COMPOSITE_ELEMENT}> referencing asset {} has no <img>",
                asset.id
            ))
        })?;
        self.visit(fragment, img, resolution)?;

        let rendered = self.renderer.render(&fragment.outer_html(img), asset)?;
        let rendered = Fragment::parse(&rendered)?;
        let container = rendered
            .first_element_child(rendered.root())
            .ok_or_else(|| {
                RewriteError::violation(format!(
                    "rendered markup for asset {} contains no element",
                    asset.id
                ))
            })?;

        let is_composite = rendered
            .element(container)
            .is_some_and(|element| element.tag.is_named(COMPOSITE_ELEMENT));
        if !is_composite {
            debug!("Asset {} rendered without <{COMPOSITE_ELEMENT}>, keeping content", asset.id);
            return Ok(());
        }

        fragment.replace_children(id, &rendered, container);
        Ok(())
    }
}
