//! Pattern-based reference transformation.
//!
//! [`transform`] knows nothing about HTML: it finds regex matches, asks a
//! resolver for the asset behind each one and splices in whatever the
//! renderer returns. [`ImgTagTransformer`] is the stock use of it, turning
//! `<img>` tags that carry an asset id into rendered tags.

use regex::{Captures, Regex};

use crate::asset::{Asset, AssetId, AssetStore, StoreError};
use crate::error::RewriteError;
use crate::marker::MarkerAttributes;
use crate::render::TagRenderer;

/// Replaces every resolved match of `pattern` in `content`.
///
/// - `resolve` returning `Ok(None)` leaves the match as it is.
/// - Any `Err` aborts the transform; no partial output is returned.
/// - Rendered text is inserted literally and never rescanned.
pub fn transform<R, F>(
    content: &str,
    pattern: &Regex,
    mut resolve: R,
    mut render: F,
) -> Result<String, RewriteError>
where
    R: FnMut(&Captures<'_>) -> Result<Option<Asset>, RewriteError>,
    F: FnMut(&str, &Asset) -> Result<String, RewriteError>,
{
    if content.is_empty() {
        return Ok(String::new());
    }

    let mut out = String::with_capacity(content.len());
    let mut last = 0;

    for captures in pattern.captures_iter(content) {
        let Some(matched) = captures.get(0) else {
            continue;
        };
        let Some(asset) = resolve(&captures)? else {
            continue;
        };
        out.push_str(&content[last..matched.start()]);
        out.push_str(&render(matched.as_str(), &asset)?);
        last = matched.end();
    }

    out.push_str(&content[last..]);
    Ok(out)
}

/// Renders `<img>` tags that reference an asset by id.
///
/// Tags pointing at assets the store no longer has are logged and left
/// alone; store failures abort.
pub struct ImgTagTransformer<'a> {
    store: &'a dyn AssetStore,
    renderer: &'a dyn TagRenderer,
    pattern: Regex,
}

impl<'a> ImgTagTransformer<'a> {
    pub fn new(
        store: &'a dyn AssetStore,
        renderer: &'a dyn TagRenderer,
        markers: &MarkerAttributes,
    ) -> Result<Self, RewriteError> {
        // The id must fill the whole value: `"42"`, `'42'` or a bare `42`
        // followed by whitespace, `/` or the end of the tag.
        let pattern = Regex::new(&format!(
            r#"(?i)<img\b[^>]*?\s{}\s*=\s*(?:"(\d+)"[^>]*|'(\d+)'[^>]*|(\d+)(?:[\s/][^>]*)?)>"#,
            regex::escape(&markers.internal)
        ))?;
        Ok(Self {
            store,
            renderer,
            pattern,
        })
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    pub fn transform(&self, content: &str) -> Result<String, RewriteError> {
        transform(
            content,
            &self.pattern,
            |captures| self.resolve(captures),
            |tag, asset| self.renderer.render(tag, asset),
        )
    }

    fn resolve(&self, captures: &Captures<'_>) -> Result<Option<Asset>, RewriteError> {
        let Some(value) = (1..=3).find_map(|group| captures.get(group)) else {
            return Ok(None);
        };
        let id: AssetId = value.as_str().parse().map_err(|_| {
            RewriteError::violation(format!("asset id {} is out of range", value.as_str()))
        })?;

        match self.store.lookup(id) {
            Ok(asset) => Ok(Some(asset)),
            Err(StoreError::NotFound(id)) => {
                log::warn!("Leaving image unrendered, asset {id} does not exist");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
}
