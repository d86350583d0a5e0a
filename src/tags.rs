//! The composition tags: `component` and `call`.
//!
//! ```text
//! {% component "card" post title="x" only as card %}
//!   {% call card.header size="sm" %}...{% endcall %}
//! {% endcomponent %}
//! ```
//!
//! `component` instantiates a registered component and runs its lifecycle.
//! `call` fills one slot of the component bound to an alias and writes
//! nothing in place; the fill shows up wherever the component's template
//! reads the field.

use tracing::debug;

use crate::component::{Args, Body, Invocation, invoke};
use crate::engine::Engine;
use crate::error::{BindingError, Error};
use crate::template::expr::Expr;
use crate::template::lexer::Token;
use crate::template::parser::{Parser, parse_bits, split_contents};
use crate::template::{Context, Map, NodeList, Value};

// =============================================================================
// COMPONENT
// =============================================================================

#[derive(Debug)]
pub struct ComponentNode {
    name: Expr,
    args: Vec<Expr>,
    kwargs: Vec<(String, Expr)>,
    isolated: bool,
    alias: Option<String>,
    body: NodeList,
}

impl ComponentNode {
    /// Resolve, instantiate and render the component.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RegistryError::NotRegistered`] for unknown names, and
    /// propagates argument, binding and validation failures from the lifecycle.
    pub fn render(&self, engine: &Engine, context: &mut Context) -> Result<String, Error> {
        let name = self.name.resolve(context);
        let name = name.as_str().map_or_else(|| name.render(false), ToOwned::to_owned);
        let ty = engine.registry().get(&name)?;

        let args = Args {
            positional: self.args.iter().map(|expr| expr.resolve(context)).collect(),
            kwargs: resolve_kwargs(&self.kwargs, context),
        };
        let handle = ty.instantiate(args)?;

        let invocation = Invocation { alias: self.alias.as_deref(), isolated: self.isolated };
        invoke(engine, &handle, Body::Nodes(&self.body), context, &invocation)
    }
}

/// `component NAME [args] [kwargs] [only] [as alias]`
pub(crate) fn parse_component(parser: &mut Parser, token: &Token) -> Result<ComponentNode, Error> {
    let mut bits = split_contents(&token.contents);

    let mut alias = None;
    if bits.len() >= 4 && bits[bits.len() - 2] == "as" {
        let name = bits.pop().unwrap_or_default();
        bits.pop();
        if !is_identifier(&name) {
            return Err(Error::syntax(token.line, format!("invalid component alias '{name}'")));
        }
        alias = Some(name);
    }

    let isolated = bits.len() > 2 && bits.last().is_some_and(|bit| bit == "only");
    if isolated {
        bits.pop();
    }

    let parsed = parse_bits(&bits[1..], "component", token.line)?;
    let mut args = parsed.args.into_iter();
    let Some(name) = args.next() else {
        return Err(Error::syntax(
            token.line,
            "call the 'component' tag with a component name as the first parameter",
        ));
    };

    let body = parser.parse(&["endcomponent"])?;
    parser.next_token();

    Ok(ComponentNode { name, args: args.collect(), kwargs: parsed.kwargs, isolated, alias, body })
}

// =============================================================================
// CALL
// =============================================================================

#[derive(Debug)]
pub struct CallNode {
    alias: String,
    field: String,
    kwargs: Vec<(String, Expr)>,
    body: NodeList,
}

impl CallNode {
    /// Fill the aliased component's slot. Emits no output.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError`] when the alias is missing or not a component,
    /// the field is unknown, or `content` is passed as a keyword.
    pub fn render(&self, engine: &Engine, context: &mut Context) -> Result<(), Error> {
        let handle = match context.get(&self.alias) {
            Some(Value::Component(handle)) => handle.clone(),
            Some(_) => return Err(BindingError::NotAComponent(self.alias.clone()).into()),
            None => return Err(BindingError::AliasNotInScope(self.alias.clone()).into()),
        };
        debug!(alias = %self.alias, field = %self.field, "filling slot");

        let kwargs = resolve_kwargs(&self.kwargs, context);
        handle.fill(engine, context, &self.field, Body::Nodes(&self.body), kwargs)
    }
}

/// `call alias.field [kwargs]`
pub(crate) fn parse_call(parser: &mut Parser, token: &Token) -> Result<CallNode, Error> {
    let bits = split_contents(&token.contents);
    let Some(target) = bits.get(1) else {
        return Err(Error::syntax(token.line, "call tag expects 'call alias.field'"));
    };
    let Some((alias, field)) = target.split_once('.') else {
        return Err(Error::syntax(token.line, format!("call target '{target}' must look like 'alias.field'")));
    };
    if !is_identifier(alias) || !is_identifier(field) {
        return Err(Error::syntax(token.line, format!("call target '{target}' must look like 'alias.field'")));
    }

    let parsed = parse_bits(&bits[2..], "call", token.line)?;
    if !parsed.args.is_empty() {
        return Err(Error::syntax(token.line, "call tag accepts keyword arguments only"));
    }

    let body = parser.parse(&["endcall"])?;
    parser.next_token();

    Ok(CallNode { alias: alias.to_owned(), field: field.to_owned(), kwargs: parsed.kwargs, body })
}

// =============================================================================
// HELPERS
// =============================================================================

fn resolve_kwargs(kwargs: &[(String, Expr)], context: &Context) -> Map {
    kwargs.iter().map(|(name, expr)| (name.clone(), expr.resolve(context))).collect()
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(|c| c.is_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit())
}

#[cfg(test)]
#[path = "tags_test.rs"]
mod tests;
