//! Recursive descent parser from tokens to a node tree.
//!
//! The parser owns the token stream and exposes the pieces tag parsers need:
//! [`split_contents`] to split a tag into bits, [`parse_bits`] to separate
//! positional from keyword arguments, and [`Parser::parse`] to collect a
//! tag's body up to one of its end markers.

use super::expr::Expr;
use super::lexer::{Token, TokenKind};
use super::node::{self, Node, NodeList};
use crate::error::Error;
use crate::tags;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    #[must_use]
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Parse nodes until a block tag named in `until` (left unconsumed) or EOF.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Syntax`] for unknown tags, malformed tags, or when EOF
    /// is reached while end markers are still expected.
    pub fn parse(&mut self, until: &[&str]) -> Result<NodeList, Error> {
        let mut nodes = Vec::new();

        while let Some(token) = self.tokens.get(self.pos) {
            match token.kind {
                TokenKind::Text => {
                    nodes.push(Node::Text(token.contents.clone()));
                    self.pos += 1;
                }
                TokenKind::Variable => {
                    nodes.push(Node::Variable(Expr::parse(&token.contents, token.line)?));
                    self.pos += 1;
                }
                TokenKind::Comment => self.pos += 1,
                TokenKind::Block => {
                    if until.contains(&token.tag_name()) {
                        return Ok(nodes);
                    }
                    let token = token.clone();
                    self.pos += 1;
                    if let Some(node) = self.parse_tag(&token)? {
                        nodes.push(node);
                    }
                }
            }
        }

        if until.is_empty() {
            Ok(nodes)
        } else {
            let line = self.tokens.last().map_or(1, |t| t.line);
            Err(Error::syntax(line, format!("unclosed tag, expected one of: {}", until.join(", "))))
        }
    }

    /// Consume the end marker that stopped the last [`Parser::parse`] call.
    pub fn next_token(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Skip everything up to and including the `end` block tag.
    fn skip_past(&mut self, end: &str, line: usize) -> Result<(), Error> {
        while let Some(token) = self.next_token() {
            if token.kind == TokenKind::Block && token.tag_name() == end {
                return Ok(());
            }
        }
        Err(Error::syntax(line, format!("unclosed tag, expected {end}")))
    }

    fn parse_tag(&mut self, token: &Token) -> Result<Option<Node>, Error> {
        let node = match token.tag_name() {
            "if" => Node::If(node::parse_if(self, token)?),
            "for" => Node::For(node::parse_for(self, token)?),
            "with" => Node::With(node::parse_with(self, token)?),
            "component" => Node::Component(tags::parse_component(self, token)?),
            "call" => Node::Call(tags::parse_call(self, token)?),
            "load" => return Ok(None),
            "comment" => {
                self.skip_past("endcomment", token.line)?;
                return Ok(None);
            }
            other => {
                return Err(Error::syntax(token.line, format!("invalid block tag '{other}'")));
            }
        };
        Ok(Some(node))
    }
}

/// Split tag contents on whitespace, keeping quoted strings together.
#[must_use]
pub fn split_contents(contents: &str) -> Vec<String> {
    let mut bits = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for ch in contents.chars() {
        match quote {
            Some(q) => {
                current.push(ch);
                if ch == q {
                    quote = None;
                }
            }
            None if ch.is_whitespace() => {
                if !current.is_empty() {
                    bits.push(std::mem::take(&mut current));
                }
            }
            None => {
                if ch == '"' || ch == '\'' {
                    quote = Some(ch);
                }
                current.push(ch);
            }
        }
    }
    if !current.is_empty() {
        bits.push(current);
    }
    bits
}

/// Positional and keyword arguments of a tag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bits {
    pub args: Vec<Expr>,
    pub kwargs: Vec<(String, Expr)>,
}

/// Separate `bits` into positional and `key=value` arguments.
///
/// # Errors
///
/// Returns [`Error::Syntax`] for positional arguments after keywords, repeated
/// keywords, or malformed expressions.
pub fn parse_bits(bits: &[String], tag: &str, line: usize) -> Result<Bits, Error> {
    let mut parsed = Bits::default();

    for bit in bits {
        if let Some((key, value)) = split_kwarg(bit) {
            if parsed.kwargs.iter().any(|(k, _)| k == key) {
                return Err(Error::syntax(line, format!("'{tag}' received multiple values for keyword '{key}'")));
            }
            parsed.kwargs.push((key.to_owned(), Expr::parse(value, line)?));
        } else {
            if !parsed.kwargs.is_empty() {
                return Err(Error::syntax(
                    line,
                    format!("'{tag}' received a positional argument after keyword arguments"),
                ));
            }
            parsed.args.push(Expr::parse(bit, line)?);
        }
    }

    Ok(parsed)
}

/// `key=value` where `key` is an identifier and `=` is not inside quotes.
fn split_kwarg(bit: &str) -> Option<(&str, &str)> {
    let (key, value) = bit.split_once('=')?;
    let is_ident = !key.is_empty()
        && key.chars().all(|c| c.is_alphanumeric() || c == '_')
        && !key.starts_with(|c: char| c.is_ascii_digit());
    (is_ident && !value.is_empty()).then_some((key, value))
}

#[cfg(test)]
#[path = "parser_test.rs"]
mod tests;
