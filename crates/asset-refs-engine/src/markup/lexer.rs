//! # Lexer - Tokenizing HTML Fragments
//!
//! Splits a fragment into text runs and markup constructs using [Logos].
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## The Lossless Guarantee
//!
//! Every byte of the input appears in exactly one token, so concatenating
//! token texts reproduces the input. The tree builder relies on this to
//! serialize untouched content byte-for-byte.
//!
//! ## Token Design
//!
//! Logos only sees two patterns: a run of text (`[^<]+`) and a single `<`.
//! Everything that starts with `<` is classified by [`lex_markup`], which
//! scans the remainder by hand and bumps the lexer over the whole construct.
//! Tags need that context (quoted attribute values may contain `>`), and a
//! single entry point avoids prefix conflicts between `<!--`, `<!` and `<`.

use logos::{Lexer, Logos};
use std::ops::Range;

use crate::error::RewriteError;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum LexError {
    #[default]
    Unexpected,
    /// A tag was opened but input ended before its closing `>`.
    UnterminatedTag,
}

impl LexError {
    fn describe(&self) -> &'static str {
        match self {
            LexError::Unexpected => "unexpected input",
            LexError::UnterminatedTag => "unterminated tag",
        }
    }
}

/// What a `<` turned out to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Markup {
    /// `<name ...>` or `<name ... />`
    StartTag,
    /// `</name>`
    EndTag,
    /// `<!-- ... -->`; an unclosed comment runs to the end of input
    Comment,
    /// `<!DOCTYPE ...>`, `<![CDATA[...]>`, `<?...?>`
    Declaration,
    /// A `<` that starts no markup (`a < b`), kept as text
    Stray,
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(error = LexError)]
pub enum TokenKind {
    #[regex(r"[^<]+")]
    Text,

    #[token("<", lex_markup)]
    Markup(Markup),
}

fn lex_markup(lex: &mut Lexer<'_, TokenKind>) -> Result<Markup, LexError> {
    let rest = lex.remainder();
    let bytes = rest.as_bytes();

    match bytes.first() {
        Some(b'!') if rest.starts_with("!--") => {
            let len = rest[3..]
                .find("-->")
                .map_or(rest.len(), |end| 3 + end + 3);
            lex.bump(len);
            Ok(Markup::Comment)
        }
        Some(b'!' | b'?') => match rest.find('>') {
            Some(end) => {
                lex.bump(end + 1);
                Ok(Markup::Declaration)
            }
            None => Ok(Markup::Stray),
        },
        Some(b'/') if bytes.get(1).is_some_and(u8::is_ascii_alphabetic) => match rest.find('>') {
            Some(end) => {
                lex.bump(end + 1);
                Ok(Markup::EndTag)
            }
            None => Ok(Markup::Stray),
        },
        Some(b) if b.is_ascii_alphabetic() => match start_tag_len(bytes) {
            Some(len) => {
                lex.bump(len);
                Ok(Markup::StartTag)
            }
            // A cut-off tag that already assigns a value is a truncated
            // reference; a bare `<name` running to the end is prose.
            None if rest.contains('=') => Err(LexError::UnterminatedTag),
            None => Ok(Markup::Stray),
        },
        _ => Ok(Markup::Stray),
    }
}

/// Length of a start tag body (everything after `<`, up to and including `>`).
///
/// Quotes only open an attribute value directly after `=`, so apostrophes in
/// unquoted values (`title=it's`) do not swallow the rest of the input.
fn start_tag_len(bytes: &[u8]) -> Option<usize> {
    let mut quote: Option<u8> = None;
    let mut after_eq = false;

    for (i, &b) in bytes.iter().enumerate() {
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'>' => return Some(i + 1),
            b'=' => {
                after_eq = true;
                continue;
            }
            b'"' | b'\'' if after_eq => quote = Some(b),
            b if b.is_ascii_whitespace() => continue,
            _ => {}
        }
        after_eq = false;
    }

    None
}

/// A lexed token with its kind, text slice and byte span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub span: Range<usize>,
}

/// Lex the input into a sequence of tokens.
///
/// Fails only on a tag cut off after an `=`; every other byte sequence lexes.
pub fn lex(input: &str) -> Result<Vec<Token<'_>>, RewriteError> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(input);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let kind = result.map_err(|err| lex_error(&err, span.start))?;
        tokens.push(Token {
            kind,
            text: lexer.slice(),
            span,
        });
    }

    Ok(tokens)
}

pub(crate) fn lex_error(err: &LexError, offset: usize) -> RewriteError {
    RewriteError::malformed(offset, err.describe())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn kinds(input: &str) -> Vec<TokenKind> {
        lex(input).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[rstest]
    #[case("")]
    #[case("plain text only")]
    #[case("<p>Hello <b>world</b></p>")]
    #[case("<img data-fileEntryId=\"42\" src=\"x\"/>")]
    #[case("a < b and c > d")]
    #[case("<!-- comment with <img> inside -->after")]
    #[case("<!DOCTYPE html><html></html>")]
    #[case("<a title='1 > 0' href=x>t</a>")]
    #[case("<p>unicode ✓ “quotes”</p>")]
    #[case("<!-- never closed")]
    #[case("if a<b")]
    #[case("x </y")]
    #[case("<!never closed")]
    fn lossless_round_trip(#[case] input: &str) {
        let tokens = lex(input).unwrap();
        let reconstructed: String = tokens.iter().map(|t| t.text).collect();
        assert_eq!(input, reconstructed);
    }

    #[test]
    fn classify_markup() {
        assert_eq!(
            kinds("<p>x</p><!--c--><!DOCTYPE html>"),
            vec![
                TokenKind::Markup(Markup::StartTag),
                TokenKind::Text,
                TokenKind::Markup(Markup::EndTag),
                TokenKind::Markup(Markup::Comment),
                TokenKind::Markup(Markup::Declaration),
            ]
        );
    }

    #[test]
    fn stray_less_than_is_not_a_tag() {
        assert_eq!(
            kinds("1 < 2"),
            vec![
                TokenKind::Text,
                TokenKind::Markup(Markup::Stray),
                TokenKind::Text,
            ]
        );
    }

    #[test]
    fn quoted_gt_stays_inside_tag() {
        let tokens = lex(r#"<img alt="a > b" src="x">"#).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Markup(Markup::StartTag));
    }

    #[test]
    fn apostrophe_in_unquoted_value_does_not_open_quote() {
        let tokens = lex("<a title=it's>x</a>").unwrap();
        assert_eq!(tokens[0].text, "<a title=it's>");
    }

    #[test]
    fn unterminated_tag_is_malformed() {
        let err = lex(r#"<p>ok</p><img src="x"#).unwrap_err();
        assert!(matches!(
            err,
            RewriteError::MalformedContent { offset: 9, .. }
        ));
    }

    #[test]
    fn bare_unterminated_name_is_text() {
        assert_eq!(
            kinds("if a<b"),
            vec![
                TokenKind::Text,
                TokenKind::Markup(Markup::Stray),
                TokenKind::Text,
            ]
        );
    }

    #[test]
    fn spans_cover_input() {
        let tokens = lex("ab<br>cd").unwrap();
        let spans: Vec<_> = tokens.iter().map(|t| t.span.clone()).collect();
        assert_eq!(spans, vec![0..2, 2..6, 6..8]);
    }
}
