//! Minimal host template engine.
//!
//! Components need a template language to render into and a tag protocol to
//! be invoked from. This module provides just enough of one: variables with
//! dotted lookup and a few filters, `if` / `for` / `with`, and the scoped
//! [`Context`] the composition tags push frames onto.

pub mod context;
pub mod expr;
pub mod lexer;
pub mod node;
pub mod parser;
pub mod value;

pub use context::{Context, Scope};
pub use node::{Node, NodeList};
pub use value::{Map, Value};

use crate::engine::Engine;
use crate::error::Error;

/// A compiled template, ready to render any number of times.
#[derive(Debug)]
pub struct Template {
    name: Option<String>,
    nodes: NodeList,
}

impl Template {
    /// Compile anonymous template source.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Syntax`] for malformed source.
    pub fn compile(source: &str) -> Result<Self, Error> {
        let tokens = lexer::tokenize(source)?;
        let nodes = parser::Parser::new(tokens).parse(&[])?;
        Ok(Self { name: None, nodes })
    }

    /// Compile source registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Syntax`] for malformed source.
    pub fn compile_named(name: impl Into<String>, source: &str) -> Result<Self, Error> {
        let mut template = Self::compile(source)?;
        template.name = Some(name.into());
        Ok(template)
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Render against `context`.
    ///
    /// # Errors
    ///
    /// Propagates any failure raised by nested component or fill tags.
    pub fn render(&self, engine: &Engine, context: &mut Context) -> Result<String, Error> {
        node::render_nodes(&self.nodes, engine, context)
    }
}
