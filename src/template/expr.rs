//! Literal-or-variable expressions, filters and `if` conditions.
//!
//! Expressions are resolved lazily against a [`Context`]. A variable path
//! that does not resolve yields [`Value::Null`], which renders as empty text.

use super::context::Context;
use super::value::Value;
use crate::error::Error;

/// Compile-time literal. Kept separate from [`Value`] so compiled templates
/// stay `Send + Sync` and can be cached by the loader.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Literal {
    fn to_value(&self) -> Value {
        match self {
            Self::None => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::Int(*i),
            Self::Float(f) => Value::Float(*f),
            Self::Str(s) => Value::Str(s.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(Literal),
    /// Dotted path; the first segment is a context name.
    Variable(Vec<String>),
}

impl Operand {
    /// Parse a single literal or variable path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Syntax`] for malformed quoting or illegal path characters.
    pub fn parse(token: &str, line: usize) -> Result<Self, Error> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::syntax(line, "empty expression"));
        }

        if let Some(quote) = token.chars().next().filter(|c| *c == '"' || *c == '\'') {
            if token.len() < 2 || !token.ends_with(quote) {
                return Err(Error::syntax(line, format!("unterminated string literal: {token}")));
            }
            let inner = &token[1..token.len() - 1];
            let escaped = format!("\\{quote}");
            return Ok(Self::Literal(Literal::Str(inner.replace(&escaped, &quote.to_string()))));
        }

        match token {
            "True" | "true" => return Ok(Self::Literal(Literal::Bool(true))),
            "False" | "false" => return Ok(Self::Literal(Literal::Bool(false))),
            "None" | "none" => return Ok(Self::Literal(Literal::None)),
            _ => {}
        }

        let numeric_start = token.starts_with(|c: char| c.is_ascii_digit() || c == '-');
        if numeric_start {
            if let Ok(i) = token.parse::<i64>() {
                return Ok(Self::Literal(Literal::Int(i)));
            }
            if let Ok(f) = token.parse::<f64>() {
                return Ok(Self::Literal(Literal::Float(f)));
            }
        }

        let segments: Vec<String> = token.split('.').map(ToOwned::to_owned).collect();
        let valid = segments
            .iter()
            .all(|s| !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_'));
        if !valid || numeric_start {
            return Err(Error::syntax(line, format!("invalid variable name: {token}")));
        }
        Ok(Self::Variable(segments))
    }

    #[must_use]
    pub fn resolve(&self, context: &Context) -> Value {
        match self {
            Self::Literal(lit) => lit.to_value(),
            Self::Variable(path) => {
                let Some((head, tail)) = path.split_first() else {
                    return Value::Null;
                };
                let mut current = match context.get(head) {
                    Some(value) => value.clone(),
                    None => return Value::Null,
                };
                for segment in tail {
                    match current.get_attr(segment) {
                        Some(next) => current = next,
                        None => return Value::Null,
                    }
                }
                current
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Mark the value as markup.
    Safe,
    /// Substitute the operand when the value is falsy.
    Default(Operand),
    /// Number of characters or items.
    Length,
}

/// An operand followed by zero or more `|filter[:arg]` applications.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub operand: Operand,
    pub filters: Vec<Filter>,
}

impl Expr {
    /// Parse `operand|filter:arg|filter`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Syntax`] for unknown filters or malformed operands.
    pub fn parse(token: &str, line: usize) -> Result<Self, Error> {
        let mut parts = split_outside_quotes(token, '|').into_iter();
        let operand = Operand::parse(parts.next().unwrap_or_default(), line)?;
        let mut filters = Vec::new();

        for part in parts {
            let (name, arg) = match split_outside_quotes(part, ':').as_slice() {
                [name] => (name.trim(), None),
                [name, arg] => (name.trim(), Some(Operand::parse(arg, line)?)),
                _ => return Err(Error::syntax(line, format!("malformed filter: {part}"))),
            };
            let filter = match (name, arg) {
                ("safe", None) => Filter::Safe,
                ("length", None) => Filter::Length,
                ("default", Some(arg)) => Filter::Default(arg),
                ("default", None) => return Err(Error::syntax(line, "default filter requires an argument")),
                (other, _) => return Err(Error::syntax(line, format!("unknown filter: {other}"))),
            };
            filters.push(filter);
        }

        Ok(Self { operand, filters })
    }

    #[must_use]
    pub fn resolve(&self, context: &Context) -> Value {
        let mut value = self.operand.resolve(context);
        for filter in &self.filters {
            value = match filter {
                Filter::Safe => match value {
                    Value::Str(s) => Value::Safe(s),
                    other => other,
                },
                Filter::Default(fallback) => {
                    if value.is_truthy() {
                        value
                    } else {
                        fallback.resolve(context)
                    }
                }
                Filter::Length => Value::from(value.len()),
            };
        }
        value
    }
}

/// Split on `sep`, ignoring separators inside single or double quotes.
fn split_outside_quotes(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (idx, ch) in text.char_indices() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if ch == '"' || ch == '\'' => quote = Some(ch),
            None if ch == sep => {
                parts.push(&text[start..idx]);
                start = idx + ch.len_utf8();
            }
            None => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

// =============================================================================
// CONDITIONS
// =============================================================================

/// Boolean expression used by `if` / `elif`.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Test(Expr),
    Not(Box<Condition>),
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
    Eq(Expr, Expr),
    Ne(Expr, Expr),
}

impl Condition {
    /// Parse tag bits (already split honoring quotes).
    ///
    /// Precedence, loosest first: `or`, `and`, `not`, `==` / `!=`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Syntax`] for empty or dangling conditions.
    pub fn parse(bits: &[String], line: usize) -> Result<Self, Error> {
        if bits.is_empty() {
            return Err(Error::syntax(line, "if tag requires a condition"));
        }
        let mut pos = 0;
        let cond = parse_or(bits, &mut pos, line)?;
        if pos != bits.len() {
            return Err(Error::syntax(line, format!("unexpected '{}' in condition", bits[pos])));
        }
        Ok(cond)
    }

    #[must_use]
    pub fn eval(&self, context: &Context) -> bool {
        match self {
            Self::Test(expr) => expr.resolve(context).is_truthy(),
            Self::Not(inner) => !inner.eval(context),
            Self::And(a, b) => a.eval(context) && b.eval(context),
            Self::Or(a, b) => a.eval(context) || b.eval(context),
            Self::Eq(a, b) => a.resolve(context) == b.resolve(context),
            Self::Ne(a, b) => a.resolve(context) != b.resolve(context),
        }
    }
}

fn parse_or(bits: &[String], pos: &mut usize, line: usize) -> Result<Condition, Error> {
    let mut left = parse_and(bits, pos, line)?;
    while bits.get(*pos).is_some_and(|b| b == "or") {
        *pos += 1;
        let right = parse_and(bits, pos, line)?;
        left = Condition::Or(Box::new(left), Box::new(right));
    }
    Ok(left)
}

fn parse_and(bits: &[String], pos: &mut usize, line: usize) -> Result<Condition, Error> {
    let mut left = parse_not(bits, pos, line)?;
    while bits.get(*pos).is_some_and(|b| b == "and") {
        *pos += 1;
        let right = parse_not(bits, pos, line)?;
        left = Condition::And(Box::new(left), Box::new(right));
    }
    Ok(left)
}

fn parse_not(bits: &[String], pos: &mut usize, line: usize) -> Result<Condition, Error> {
    if bits.get(*pos).is_some_and(|b| b == "not") {
        *pos += 1;
        let inner = parse_not(bits, pos, line)?;
        return Ok(Condition::Not(Box::new(inner)));
    }
    parse_comparison(bits, pos, line)
}

fn parse_comparison(bits: &[String], pos: &mut usize, line: usize) -> Result<Condition, Error> {
    let Some(first) = bits.get(*pos) else {
        return Err(Error::syntax(line, "condition ended unexpectedly"));
    };
    let left = Expr::parse(first, line)?;
    *pos += 1;

    let op = bits.get(*pos).map(String::as_str);
    if !matches!(op, Some("==" | "!=")) {
        return Ok(Condition::Test(left));
    }
    *pos += 1;
    let Some(second) = bits.get(*pos) else {
        return Err(Error::syntax(line, "comparison is missing its right-hand side"));
    };
    let right = Expr::parse(second, line)?;
    *pos += 1;

    Ok(match op {
        Some("==") => Condition::Eq(left, right),
        _ => Condition::Ne(left, right),
    })
}

#[cfg(test)]
#[path = "expr_test.rs"]
mod tests;
