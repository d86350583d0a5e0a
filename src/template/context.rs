//! Scoped variable stack used while rendering.
//!
//! DESIGN
//! ======
//! A `Context` is a stack of frames. Lookups search from the innermost frame
//! outward, so inner bindings shadow outer ones without mutating them.
//! [`Context::push`] returns a [`Scope`] guard that derefs to the context and
//! pops its frame on drop, so every exit path (including `?` returns in the
//! middle of a component render) restores the stack exactly once.

use std::ops::{Deref, DerefMut};

use super::value::{Map, Value};

#[derive(Debug, Clone)]
pub struct Context {
    frames: Vec<Map>,
}

impl Context {
    #[must_use]
    pub fn new() -> Self {
        Self { frames: vec![Map::new()] }
    }

    /// Context whose base frame holds `vars`.
    #[must_use]
    pub fn from_map(vars: Map) -> Self {
        Self { frames: vec![vars] }
    }

    /// Builder-style insert into the innermost frame.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Resolve a name, innermost frame first.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Bind a name in the innermost frame.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.into(), value.into());
        }
    }

    /// Push an empty frame for the lifetime of the returned guard.
    pub fn push(&mut self) -> Scope<'_> {
        self.frames.push(Map::new());
        Scope { context: self }
    }

    /// Push a frame pre-populated with `vars`.
    pub fn push_with(&mut self, vars: Map) -> Scope<'_> {
        self.frames.push(vars);
        Scope { context: self }
    }

    /// Number of frames currently on the stack.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// All visible bindings with shadowing applied.
    #[must_use]
    pub fn flatten(&self) -> Map {
        let mut out = Map::new();
        for frame in &self.frames {
            for (k, v) in frame {
                out.insert(k.clone(), v.clone());
            }
        }
        out
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard for one pushed frame. Dropping it pops the frame.
pub struct Scope<'a> {
    context: &'a mut Context,
}

impl Deref for Scope<'_> {
    type Target = Context;

    fn deref(&self) -> &Context {
        self.context
    }
}

impl DerefMut for Scope<'_> {
    fn deref_mut(&mut self) -> &mut Context {
        self.context
    }
}

impl Drop for Scope<'_> {
    fn drop(&mut self) {
        self.context.frames.pop();
    }
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
