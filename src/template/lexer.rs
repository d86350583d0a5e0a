//! Tokenizer for template source.
//!
//! Splits source into text runs and the three delimited forms:
//! `{{ variable }}`, `{% block %}` and `{# comment #}`. Delimited contents are
//! trimmed. Line numbers are 1-based and point at the token's opening delimiter.

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Text,
    Variable,
    Block,
    Comment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub contents: String,
    pub line: usize,
}

impl Token {
    /// First whitespace-separated word of a block token (the tag name).
    #[must_use]
    pub fn tag_name(&self) -> &str {
        self.contents.split_whitespace().next().unwrap_or("")
    }
}

/// Tokenize template source.
///
/// # Errors
///
/// Returns [`Error::Syntax`] when a delimiter is opened but never closed.
pub fn tokenize(source: &str) -> Result<Vec<Token>, Error> {
    let mut tokens = Vec::new();
    let mut rest = source;
    let mut line = 1;

    while !rest.is_empty() {
        let Some(start) = find_open(rest) else {
            tokens.push(Token { kind: TokenKind::Text, contents: rest.to_owned(), line });
            break;
        };

        if start > 0 {
            let text = &rest[..start];
            tokens.push(Token { kind: TokenKind::Text, contents: text.to_owned(), line });
            line += text.matches('\n').count();
        }

        let (kind, close) = match &rest[start..start + 2] {
            "{{" => (TokenKind::Variable, "}}"),
            "{%" => (TokenKind::Block, "%}"),
            _ => (TokenKind::Comment, "#}"),
        };

        let inner_start = start + 2;
        let Some(len) = rest[inner_start..].find(close) else {
            return Err(Error::syntax(line, format!("unclosed '{}' delimiter", &rest[start..inner_start])));
        };
        let inner = &rest[inner_start..inner_start + len];
        tokens.push(Token { kind, contents: inner.trim().to_owned(), line });
        line += inner.matches('\n').count();
        rest = &rest[inner_start + len + close.len()..];
    }

    Ok(tokens)
}

/// Byte offset of the next `{{`, `{%` or `{#`.
fn find_open(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    bytes
        .windows(2)
        .position(|pair| pair[0] == b'{' && matches!(pair[1], b'{' | b'%' | b'#'))
}

#[cfg(test)]
#[path = "lexer_test.rs"]
mod tests;
