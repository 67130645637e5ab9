//! Rendering resolved assets back into markup.

use html_escape::encode_double_quoted_attribute;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::asset::Asset;
use crate::error::RewriteError;
use crate::marker::DEFAULT_INTERNAL_ATTRIBUTE;

/// Builds the markup that replaces a resolved reference.
pub trait TagRenderer {
    /// `original_tag` is the full source of the tag being replaced.
    fn render(&self, original_tag: &str, asset: &Asset) -> Result<String, RewriteError>;
}

impl<F> TagRenderer for F
where
    F: Fn(&str, &Asset) -> Result<String, RewriteError>,
{
    fn render(&self, original_tag: &str, asset: &Asset) -> Result<String, RewriteError> {
        self(original_tag, asset)
    }
}

/// A scaled variant of an image, served at `max_width` pixels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rendition {
    pub name: String,
    pub max_width: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub url_prefix: String,
    pub renditions: Vec<Rendition>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            url_prefix: "/o/adaptive-media/image".to_string(),
            renditions: Vec::new(),
        }
    }
}

/// Wraps image tags in a responsive `<picture>` with one `<source>` per rendition.
#[derive(Debug, Clone)]
pub struct PictureTagRenderer {
    settings: RenderSettings,
    marker: String,
}

impl PictureTagRenderer {
    pub fn new(mut settings: RenderSettings) -> Self {
        settings.renditions.sort_by_key(|r| r.max_width);
        Self {
            settings,
            marker: DEFAULT_INTERNAL_ATTRIBUTE.to_string(),
        }
    }

    /// Attribute the `<picture>` carries the asset id in.
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    fn source_url(&self, asset: &Asset, rendition: &Rendition) -> String {
        format!(
            "{}/{}/{}/{}",
            self.settings.url_prefix.trim_end_matches('/'),
            asset.id,
            rendition.name,
            asset.title
        )
    }
}

impl Default for PictureTagRenderer {
    fn default() -> Self {
        Self::new(RenderSettings::default())
    }
}

impl TagRenderer for PictureTagRenderer {
    fn render(&self, original_tag: &str, asset: &Asset) -> Result<String, RewriteError> {
        if !asset.is_image() {
            return Ok(original_tag.to_string());
        }

        let mut out = String::new();
        let _ = write!(out, r#"<picture {}="{}">"#, self.marker, asset.id);

        let mut previous: Option<u32> = None;
        for rendition in &self.settings.renditions {
            let media = match previous {
                None => format!("(max-width:{}px)", rendition.max_width),
                Some(min) => format!(
                    "(max-width:{}px) and (min-width:{}px)",
                    rendition.max_width, min
                ),
            };
            let _ = write!(
                out,
                r#"<source media="{}" srcset="{}">"#,
                media,
                encode_double_quoted_attribute(&self.source_url(asset, rendition))
            );
            previous = Some(rendition.max_width);
        }

        out.push_str(original_tag);
        out.push_str("</picture>");
        Ok(out)
    }
}
