//! Node tree and the built-in control flow tags.

use super::context::Context;
use super::expr::{Condition, Expr};
use super::lexer::Token;
use super::parser::{Parser, parse_bits, split_contents};
use super::value::{Map, Value};
use crate::engine::Engine;
use crate::error::Error;
use crate::tags::{CallNode, ComponentNode};

pub type NodeList = Vec<Node>;

#[derive(Debug)]
pub enum Node {
    Text(String),
    Variable(Expr),
    If(IfNode),
    For(ForNode),
    With(WithNode),
    Component(ComponentNode),
    Call(CallNode),
}

impl Node {
    /// Render this node, appending to `out`.
    ///
    /// # Errors
    ///
    /// Propagates any component, binding or validation failure from nested tags.
    pub fn render(&self, engine: &Engine, context: &mut Context, out: &mut String) -> Result<(), Error> {
        match self {
            Self::Text(text) => out.push_str(text),
            Self::Variable(expr) => out.push_str(&expr.resolve(context).render(engine.config().autoescape)),
            Self::If(node) => node.render(engine, context, out)?,
            Self::For(node) => node.render(engine, context, out)?,
            Self::With(node) => node.render(engine, context, out)?,
            Self::Component(node) => out.push_str(&node.render(engine, context)?),
            Self::Call(node) => node.render(engine, context)?,
        }
        Ok(())
    }
}

/// Render a node list into a fresh string.
///
/// # Errors
///
/// Propagates the first node failure; no partial output is returned.
pub fn render_nodes(nodes: &[Node], engine: &Engine, context: &mut Context) -> Result<String, Error> {
    let mut out = String::new();
    render_into(nodes, engine, context, &mut out)?;
    Ok(out)
}

fn render_into(nodes: &[Node], engine: &Engine, context: &mut Context, out: &mut String) -> Result<(), Error> {
    for node in nodes {
        node.render(engine, context, out)?;
    }
    Ok(())
}

// =============================================================================
// IF
// =============================================================================

#[derive(Debug)]
pub struct IfNode {
    branches: Vec<(Condition, NodeList)>,
    otherwise: NodeList,
}

impl IfNode {
    fn render(&self, engine: &Engine, context: &mut Context, out: &mut String) -> Result<(), Error> {
        for (condition, body) in &self.branches {
            if condition.eval(context) {
                return render_into(body, engine, context, out);
            }
        }
        render_into(&self.otherwise, engine, context, out)
    }
}

pub(crate) fn parse_if(parser: &mut Parser, token: &Token) -> Result<IfNode, Error> {
    let bits = split_contents(&token.contents);
    let mut condition = Condition::parse(&bits[1..], token.line)?;
    let mut branches = Vec::new();
    let mut otherwise = Vec::new();

    loop {
        let body = parser.parse(&["elif", "else", "endif"])?;
        branches.push((condition, body));
        let Some(end) = parser.next_token() else {
            return Err(Error::syntax(token.line, "unclosed if tag"));
        };
        match end.tag_name() {
            "elif" => {
                let bits = split_contents(&end.contents);
                condition = Condition::parse(&bits[1..], end.line)?;
            }
            "else" => {
                otherwise = parser.parse(&["endif"])?;
                parser.next_token();
                break;
            }
            _ => break,
        }
    }

    Ok(IfNode { branches, otherwise })
}

// =============================================================================
// FOR
// =============================================================================

#[derive(Debug)]
pub struct ForNode {
    var: String,
    iterable: Expr,
    body: NodeList,
    empty: NodeList,
}

impl ForNode {
    fn render(&self, engine: &Engine, context: &mut Context, out: &mut String) -> Result<(), Error> {
        let items = self.iterable.resolve(context).iter_items();
        if items.is_empty() {
            return render_into(&self.empty, engine, context, out);
        }

        let len = items.len();
        for (idx, item) in items.into_iter().enumerate() {
            let mut scope = context.push();
            scope.set(self.var.clone(), item);
            scope.set("forloop", forloop(idx, len));
            render_into(&self.body, engine, &mut scope, out)?;
        }
        Ok(())
    }
}

fn forloop(idx: usize, len: usize) -> Value {
    let mut map = Map::new();
    map.insert("counter".into(), Value::from(idx + 1));
    map.insert("counter0".into(), Value::from(idx));
    map.insert("first".into(), Value::Bool(idx == 0));
    map.insert("last".into(), Value::Bool(idx + 1 == len));
    Value::Map(map)
}

pub(crate) fn parse_for(parser: &mut Parser, token: &Token) -> Result<ForNode, Error> {
    let bits = split_contents(&token.contents);
    let [_, var, keyword, iterable] = bits.as_slice() else {
        return Err(Error::syntax(token.line, "for tag must look like 'for x in items'"));
    };
    if keyword != "in" {
        return Err(Error::syntax(token.line, "for tag must look like 'for x in items'"));
    }
    let iterable = Expr::parse(iterable, token.line)?;

    let body = parser.parse(&["empty", "endfor"])?;
    let mut empty = Vec::new();
    if parser.next_token().is_some_and(|t| t.tag_name() == "empty") {
        empty = parser.parse(&["endfor"])?;
        parser.next_token();
    }

    Ok(ForNode { var: var.clone(), iterable, body, empty })
}

// =============================================================================
// WITH
// =============================================================================

#[derive(Debug)]
pub struct WithNode {
    bindings: Vec<(String, Expr)>,
    body: NodeList,
}

impl WithNode {
    fn render(&self, engine: &Engine, context: &mut Context, out: &mut String) -> Result<(), Error> {
        let vars: Map = self.bindings.iter().map(|(k, expr)| (k.clone(), expr.resolve(context))).collect();
        let mut scope = context.push_with(vars);
        render_into(&self.body, engine, &mut scope, out)
    }
}

pub(crate) fn parse_with(parser: &mut Parser, token: &Token) -> Result<WithNode, Error> {
    let bits = split_contents(&token.contents);
    let parsed = parse_bits(&bits[1..], "with", token.line)?;
    if !parsed.args.is_empty() || parsed.kwargs.is_empty() {
        return Err(Error::syntax(token.line, "with tag expects one or more key=value assignments"));
    }
    let body = parser.parse(&["endwith"])?;
    parser.next_token();
    Ok(WithNode { bindings: parsed.kwargs, body })
}

#[cfg(test)]
#[path = "node_test.rs"]
mod tests;
