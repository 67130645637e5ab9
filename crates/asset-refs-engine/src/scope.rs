use serde::{Deserialize, Serialize};

use crate::error::RewriteError;

/// Which parts of a piece of content the rewriters may touch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentScope {
    /// The whole content is one HTML fragment.
    #[default]
    Whole,
    /// Only the text between each `open`/`close` pair is a fragment, as in
    /// structured articles embedding HTML in `<![CDATA[...]]>` sections.
    Delimited { open: String, close: String },
}

impl ContentScope {
    pub fn cdata() -> Self {
        ContentScope::Delimited {
            open: "<![CDATA[".to_string(),
            close: "]]>".to_string(),
        }
    }

    /// Hands each in-scope region to `rewrite` and splices the results back.
    ///
    /// Text outside the regions, delimiters included, is copied unchanged.
    pub fn apply<F>(&self, content: &str, mut rewrite: F) -> Result<String, RewriteError>
    where
        F: FnMut(&str) -> Result<String, RewriteError>,
    {
        let (open, close) = match self {
            ContentScope::Whole => return rewrite(content),
            ContentScope::Delimited { open, close } => (open.as_str(), close.as_str()),
        };
        if open.is_empty() || close.is_empty() {
            return Err(RewriteError::violation("content scope delimiters must not be empty"));
        }

        let mut out = String::with_capacity(content.len());
        let mut rest = content;
        let mut offset = 0;

        while let Some(start) = rest.find(open) {
            let region_start = start + open.len();
            let region_len = rest[region_start..].find(close).ok_or_else(|| {
                RewriteError::malformed(offset + start, format!("{open} without matching {close}"))
            })?;
            let region_end = region_start + region_len;

            out.push_str(&rest[..region_start]);
            out.push_str(&rewrite(&rest[region_start..region_end])?);
            out.push_str(close);

            let consumed = region_end + close.len();
            rest = &rest[consumed..];
            offset += consumed;
        }

        out.push_str(rest);
        Ok(out)
    }
}
