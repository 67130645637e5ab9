use html_escape::{decode_html_entities, encode_double_quoted_attribute};

/// One attribute of an open tag, kept exactly as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Whitespace (and stray `/`) between the previous item and this attribute.
    leading: String,
    /// Source text: name, optional `=`, optional value with its quotes.
    raw: String,
    name: String,
    /// Entity-decoded value; `None` for bare attributes like `hidden`.
    value: Option<String>,
}

impl Attribute {
    fn written(leading: String, name: &str, value: &str) -> Self {
        Self {
            leading,
            raw: format!(r#"{name}="{}""#, encode_double_quoted_attribute(value)),
            name: name.to_string(),
            value: Some(value.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// A parsed `<name attr=value ...>` tag.
///
/// Unmodified tags serialize to their exact source text. Edits rewrite only
/// the attribute they touch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenTag {
    name: String,
    attributes: Vec<Attribute>,
    /// Everything after the last attribute: whitespace plus `>` or `/>`.
    tail: String,
}

impl OpenTag {
    /// Parses the full text of a start tag, `<` through `>`.
    pub fn parse(raw: &str) -> Self {
        let body = raw.strip_prefix('<').unwrap_or(raw);
        let bytes = body.as_bytes();
        let mut i = take_while(bytes, 0, |b| !is_space(b) && b != b'/' && b != b'>');
        let name = body[..i].to_string();
        let mut attributes = Vec::new();

        loop {
            let leading_start = i;
            while i < bytes.len() && (is_space(bytes[i]) || is_lone_slash(bytes, i)) {
                i += 1;
            }
            if i >= bytes.len() || bytes[i] == b'>' || bytes[i..].starts_with(b"/>") {
                return Self {
                    name,
                    attributes,
                    tail: body[leading_start..].to_string(),
                };
            }

            let name_start = i;
            i = take_while(bytes, i, |b| {
                !is_space(b) && b != b'=' && b != b'>' && b != b'/'
            });
            if i == name_start {
                // `=` with no name in front; consume it as a nameless attribute
                i += 1;
            }
            let attr_name = &body[name_start..i];

            let mut value = None;
            let after_name = take_while(bytes, i, is_space);
            if bytes.get(after_name) == Some(&b'=') {
                let value_start = take_while(bytes, after_name + 1, is_space);
                let (value_end, inner) = match bytes.get(value_start).copied() {
                    Some(q @ (b'"' | b'\'')) => {
                        let close = take_while(bytes, value_start + 1, |b| b != q);
                        let end = (close + 1).min(bytes.len());
                        (end, &body[value_start + 1..close])
                    }
                    _ => {
                        let end = take_while(bytes, value_start, |b| !is_space(b) && b != b'>');
                        (end, &body[value_start..end])
                    }
                };
                value = Some(decode_html_entities(inner).into_owned());
                i = value_end;
            }

            attributes.push(Attribute {
                leading: body[leading_start..name_start].to_string(),
                raw: body[name_start..i].to_string(),
                name: attr_name.to_string(),
                value,
            });
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    pub fn is_self_closing(&self) -> bool {
        self.tail.ends_with("/>")
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.is_named(name))
    }

    /// Value of the first attribute called `name` (ASCII case-insensitive).
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.is_named(name))
            .and_then(Attribute::value)
    }

    /// Sets `name` to `value`, in place if present, appended otherwise.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter().position(|a| a.is_named(name)) {
            Some(index) => {
                let leading = std::mem::take(&mut self.attributes[index].leading);
                self.attributes[index] = Attribute::written(leading, name, value);
            }
            None => self
                .attributes
                .push(Attribute::written(" ".to_string(), name, value)),
        }
    }

    pub fn remove_attribute(&mut self, name: &str) -> bool {
        let before = self.attributes.len();
        self.attributes.retain(|a| !a.is_named(name));
        self.attributes.len() != before
    }

    /// Replaces attribute `old` by `name=value` at the same position.
    ///
    /// Falls back to [`Self::set_attribute`] when `old` is absent. Any other
    /// attribute already called `name` is dropped so the result holds it once.
    pub fn replace_attribute(&mut self, old: &str, name: &str, value: &str) {
        let Some(index) = self.attributes.iter().position(|a| a.is_named(old)) else {
            self.set_attribute(name, value);
            return;
        };
        let leading = std::mem::take(&mut self.attributes[index].leading);
        self.attributes[index] = Attribute::written(leading, name, value);

        let mut position = 0;
        self.attributes.retain(|a| {
            let keep = position == index || !a.is_named(name);
            position += 1;
            keep
        });
    }

    pub fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for attribute in &self.attributes {
            out.push_str(&attribute.leading);
            out.push_str(&attribute.raw);
        }
        out.push_str(&self.tail);
    }
}

fn is_space(b: u8) -> bool {
    b.is_ascii_whitespace()
}

fn is_lone_slash(bytes: &[u8], i: usize) -> bool {
    bytes[i] == b'/' && bytes.get(i + 1) != Some(&b'>')
}

fn take_while(bytes: &[u8], mut i: usize, pred: impl Fn(u8) -> bool) -> usize {
    while i < bytes.len() && pred(bytes[i]) {
        i += 1;
    }
    i
}
