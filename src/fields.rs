//! Slot field declarations and per-instance fill state.
//!
//! DESIGN
//! ======
//! A component type declares its slots once as a list of [`FieldSpec`]s.
//! Every invocation gets its own [`SlotFields`] built from that list, so fill
//! state never leaks between instances. A fill is rendered as soon as its
//! `call` tag is reached, in the caller's context, and only the resulting
//! markup is stored. Reading a field is therefore idempotent.
//!
//! Polymorphic fields have no default binding; they are addressed by
//! `name_variant` only, and each address records which variant it selects.
//!
//! BINDING PRECEDENCE
//! ==================
//! 1. an override passed with the fill
//! 2. the field's declared binding
//! 3. the variant's binding
//! 4. none: the fill body itself is the markup

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::component::{Args, Body, Component, ComponentHandle, ComponentType, Invocation, invoke};
use crate::engine::Engine;
use crate::error::{BindingError, Error, ValidationError};
use crate::template::{Context, Map, Value};

/// Keyword reserved for the rendered fill body on a slot call.
pub const CONTENT_KEYWORD: &str = "content";

// =============================================================================
// DECLARATION
// =============================================================================

/// How many fills a field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// At most one fill; a later fill replaces the earlier one.
    One,
    /// Any number of fills, kept in call order.
    Many,
}

/// Callable binding: receives the fill and returns markup or a component.
pub type SlotFn = Arc<dyn Fn(&SlotCall<'_>) -> Result<SlotOutput, Error> + Send + Sync>;

/// What renders a fill.
#[derive(Clone)]
pub enum Binding {
    /// A component looked up in the engine's registry at fill time.
    Named(String),
    /// A component type. Stored as a constructor so a component may bind its own type.
    Type(fn() -> ComponentType),
    /// Arbitrary code producing markup or a component to render.
    Callable(SlotFn),
}

impl Binding {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    #[must_use]
    pub fn of<T: Component>() -> Self {
        Self::Type(ComponentType::of::<T>)
    }

    #[must_use]
    pub fn callable<F>(f: F) -> Self
    where
        F: Fn(&SlotCall<'_>) -> Result<SlotOutput, Error> + Send + Sync + 'static,
    {
        Self::Callable(Arc::new(f))
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Type(ty) => f.debug_tuple("Type").field(&ty().name()).finish(),
            Self::Callable(_) => f.write_str("Callable(..)"),
        }
    }
}

/// Arguments handed to a callable binding.
pub struct SlotCall<'a> {
    /// Keyword arguments of the fill.
    pub kwargs: &'a Map,
    /// The fill body, already rendered.
    pub content: &'a str,
    /// The component that owns the field.
    pub owner: &'a ComponentHandle,
}

impl SlotCall<'_> {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.kwargs.get(key)
    }
}

/// Result of a callable binding.
pub enum SlotOutput {
    /// Final markup for the fill.
    Markup(String),
    /// A component to render with the fill body as its content.
    Component(ComponentHandle),
}

impl SlotOutput {
    #[must_use]
    pub fn markup(markup: impl Into<String>) -> Self {
        Self::Markup(markup.into())
    }

    #[must_use]
    pub fn component<T: Component>(component: T) -> Self {
        Self::Component(ComponentHandle::new(component))
    }
}

/// Declaration of one slot field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    kind: FieldKind,
    required: bool,
    binding: Option<Binding>,
    variants: Vec<(String, Binding)>,
}

impl FieldSpec {
    /// A field that holds at most one fill.
    #[must_use]
    pub fn renders_one(name: impl Into<String>) -> Self {
        Self::new(name.into(), FieldKind::One)
    }

    /// A field that collects every fill in order.
    #[must_use]
    pub fn renders_many(name: impl Into<String>) -> Self {
        Self::new(name.into(), FieldKind::Many)
    }

    fn new(name: String, kind: FieldKind) -> Self {
        Self { name, kind, required: false, binding: None, variants: Vec::new() }
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Render fills through the component registered as `name`.
    #[must_use]
    pub fn component(self, name: impl Into<String>) -> Self {
        self.binding(Binding::named(name))
    }

    /// Render fills through component type `T`.
    #[must_use]
    pub fn component_type<T: Component>(self) -> Self {
        self.binding(Binding::of::<T>())
    }

    /// Render fills through `f`.
    #[must_use]
    pub fn callable<F>(self, f: F) -> Self
    where
        F: Fn(&SlotCall<'_>) -> Result<SlotOutput, Error> + Send + Sync + 'static,
    {
        self.binding(Binding::callable(f))
    }

    #[must_use]
    pub fn binding(mut self, binding: Binding) -> Self {
        self.binding = Some(binding);
        self
    }

    /// Add a variant, addressable as `{name}_{variant}`.
    #[must_use]
    pub fn variant(mut self, name: impl Into<String>, binding: Binding) -> Self {
        self.variants.push((name.into(), binding));
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    #[must_use]
    pub fn default_binding(&self) -> Option<&Binding> {
        self.binding.as_ref()
    }

    #[must_use]
    pub fn is_polymorphic(&self) -> bool {
        !self.variants.is_empty()
    }

    #[must_use]
    pub fn variant_names(&self) -> Vec<&str> {
        self.variants.iter().map(|(name, _)| name.as_str()).collect()
    }

    fn variant_binding(&self, variant: &str) -> Option<&Binding> {
        self.variants.iter().find(|(name, _)| name == variant).map(|(_, binding)| binding)
    }
}

// =============================================================================
// INSTANCE STATE
// =============================================================================

/// Where a fill lands: the field and, for polymorphic fields, the variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotAddress {
    pub field: String,
    pub variant: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct FieldState {
    filled: bool,
    values: Vec<String>,
    variant: Option<String>,
}

/// Fill state of one component instance.
#[derive(Debug, Clone)]
pub struct SlotFields {
    specs: Arc<[FieldSpec]>,
    states: Vec<FieldState>,
    addresses: HashMap<String, SlotAddress>,
}

impl SlotFields {
    /// Empty fill state for `component`'s declared fields.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::AmbiguousField`] when two declarations map to
    /// the same fill address.
    pub fn new(component: &'static str, specs: Arc<[FieldSpec]>) -> Result<Self, BindingError> {
        let mut addresses = HashMap::new();
        for spec in specs.iter() {
            let targets: Vec<(String, SlotAddress)> = if spec.is_polymorphic() {
                spec.variants
                    .iter()
                    .map(|(variant, _)| {
                        let address = SlotAddress { field: spec.name.clone(), variant: Some(variant.clone()) };
                        (format!("{}_{variant}", spec.name), address)
                    })
                    .collect()
            } else {
                vec![(spec.name.clone(), SlotAddress { field: spec.name.clone(), variant: None })]
            };
            for (target, address) in targets {
                match addresses.entry(target) {
                    Entry::Occupied(taken) => {
                        return Err(BindingError::AmbiguousField { component, address: taken.key().clone() });
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(address);
                    }
                }
            }
        }
        let states = vec![FieldState::default(); specs.len()];
        Ok(Self { specs, states, addresses })
    }

    /// Map a fill target (`header`, `avatar_image`) to its address.
    #[must_use]
    pub fn resolve(&self, target: &str) -> Option<SlotAddress> {
        self.addresses.get(target).cloned()
    }

    /// Binding for an address, before any per-fill override.
    #[must_use]
    pub fn binding_for(&self, address: &SlotAddress) -> Option<Binding> {
        let spec = self.spec(&address.field)?;
        spec.binding.clone().or_else(|| {
            address.variant.as_deref().and_then(|variant| spec.variant_binding(variant).cloned())
        })
    }

    /// Record rendered markup for `address`.
    pub fn store(&mut self, address: &SlotAddress, markup: String) {
        let Some(idx) = self.index(&address.field) else {
            return;
        };
        let kind = self.specs[idx].kind;
        let state = &mut self.states[idx];
        match kind {
            FieldKind::One => state.values = vec![markup],
            FieldKind::Many => state.values.push(markup),
        }
        state.filled = true;
        state.variant.clone_from(&address.variant);
    }

    /// Fail on the first required field, in declaration order, that was never filled.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] naming the component and the field.
    pub fn check(&self, component: &'static str) -> Result<(), ValidationError> {
        for (spec, state) in self.specs.iter().zip(&self.states) {
            if spec.required && !state.filled {
                return Err(ValidationError { component, field: spec.name.clone() });
            }
        }
        Ok(())
    }

    /// Read-only view of a field by its declared name.
    #[must_use]
    pub fn view(&self, name: &str) -> Option<FieldView> {
        let idx = self.index(name)?;
        let spec = &self.specs[idx];
        let state = &self.states[idx];
        Some(FieldView {
            name: spec.name.clone(),
            kind: spec.kind,
            required: spec.required,
            filled: state.filled,
            variant: state.variant.clone(),
            values: state.values.clone(),
        })
    }

    fn spec(&self, name: &str) -> Option<&FieldSpec> {
        self.specs.iter().find(|spec| spec.name == name)
    }

    fn index(&self, name: &str) -> Option<usize> {
        self.specs.iter().position(|spec| spec.name == name)
    }
}

/// Snapshot of a field as templates see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldView {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    pub filled: bool,
    pub variant: Option<String>,
    pub values: Vec<String>,
}

impl FieldView {
    /// The stored markup: a single safe string, or a list for many-fields.
    #[must_use]
    pub fn value(&self) -> Value {
        match self.kind {
            FieldKind::One => self.values.first().map_or(Value::Null, |markup| Value::safe(markup.clone())),
            FieldKind::Many => Value::List(self.values.iter().map(|markup| Value::safe(markup.clone())).collect()),
        }
    }

    /// Template value exposing `filled`, `required`, `value` and `variant`.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("filled".into(), Value::Bool(self.filled));
        map.insert("required".into(), Value::Bool(self.required));
        map.insert("value".into(), self.value());
        map.insert("variant".into(), self.variant.clone().map_or(Value::Null, Value::Str));
        Value::Map(map)
    }
}

// =============================================================================
// FILL
// =============================================================================

/// One fill waiting to be rendered through its binding.
pub struct FieldValue<'a> {
    body: Body<'a>,
    kwargs: Map,
    binding: Option<Binding>,
}

impl<'a> FieldValue<'a> {
    #[must_use]
    pub fn new(body: Body<'a>, kwargs: Map, binding: Option<Binding>) -> Self {
        Self { body, kwargs, binding }
    }

    /// Render the fill in the caller's `context`.
    ///
    /// # Errors
    ///
    /// Propagates registry lookups, argument conversion, and any failure of
    /// the bound component's own render.
    pub fn render(self, engine: &Engine, context: &mut Context, owner: &ComponentHandle) -> Result<String, Error> {
        match self.binding {
            None => self.body.render(engine, context),
            Some(Binding::Named(name)) => {
                let ty = engine.registry().get(&name)?;
                render_bound(engine, context, &ty, self.kwargs, self.body)
            }
            Some(Binding::Type(ty)) => render_bound(engine, context, &ty(), self.kwargs, self.body),
            Some(Binding::Callable(f)) => {
                let content = self.body.render(engine, context)?;
                let call = SlotCall { kwargs: &self.kwargs, content: &content, owner };
                match f(&call)? {
                    SlotOutput::Markup(markup) => Ok(markup),
                    SlotOutput::Component(handle) => {
                        invoke(engine, &handle, Body::Markup(content), context, &Invocation::default())
                    }
                }
            }
        }
    }
}

fn render_bound(
    engine: &Engine,
    context: &mut Context,
    ty: &ComponentType,
    kwargs: Map,
    body: Body<'_>,
) -> Result<String, Error> {
    debug!(component = ty.name(), "rendering fill through bound component");
    let handle = ty.instantiate(Args::from_kwargs(kwargs))?;
    invoke(engine, &handle, body, context, &Invocation::default())
}

#[cfg(test)]
#[path = "fields_test.rs"]
mod tests;
