//! Components and their render lifecycle.
//!
//! DESIGN
//! ======
//! Authors implement [`Component`] on a plain serde struct. Keyword arguments
//! from a tag deserialize straight into the struct, and the struct serializes
//! back out when a template reads `self.attr`. The registry stores a
//! type-erased [`ComponentType`]; each invocation produces a fresh
//! [`ComponentHandle`] that owns the instance and its slot fill state.
//!
//! LIFECYCLE
//! =========
//! 1. instantiate from arguments
//! 2. push a scope, bind the alias, build the context (`self`, author data)
//! 3. create slot fields and render the body, which runs the fills
//! 4. store the body output as `content`, validate required fields
//! 5. render the component template, in an isolated context for `only`

use std::any::TypeId;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::engine::Engine;
use crate::error::{BindingError, Error};
use crate::fields::{Binding, CONTENT_KEYWORD, FieldSpec, FieldValue, FieldView, SlotAddress, SlotFields};
use crate::template::node::render_nodes;
use crate::template::{Context, Map, Node, Template, Value};

// =============================================================================
// AUTHOR API
// =============================================================================

/// A reusable piece of UI with its own template, data and slots.
pub trait Component: Serialize + DeserializeOwned + 'static {
    /// Inline template source. Takes precedence over [`Component::template_name`].
    fn template(&self) -> Option<&str> {
        None
    }

    /// Name of a template for the engine's loader.
    fn template_name(&self) -> Option<String> {
        None
    }

    /// Slot fields declared by this type.
    fn fields() -> Vec<FieldSpec> {
        Vec::new()
    }

    /// Build an instance from tag arguments.
    ///
    /// The default accepts keyword arguments only and deserializes them into
    /// `Self`; override it to take positional arguments.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::UnexpectedPositional`] or [`Error::Arguments`].
    fn from_args(args: Args) -> Result<Self, Error> {
        args.deserialize()
    }

    /// Add author data to the render context. `self` is already bound.
    ///
    /// # Errors
    ///
    /// Any error returned here aborts the render.
    fn get_context_data(&self, _context: &mut Context) -> Result<(), Error> {
        Ok(())
    }
}

/// Arguments of a component invocation.
#[derive(Debug, Clone, Default)]
pub struct Args {
    pub positional: Vec<Value>,
    pub kwargs: Map,
}

impl Args {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_kwargs(kwargs: Map) -> Self {
        Self { positional: Vec::new(), kwargs }
    }

    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    #[must_use]
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.kwargs.get(name)
    }

    /// Deserialize the keyword arguments into `T`.
    ///
    /// An empty keyword map also deserializes into unit structs.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::UnexpectedPositional`] when positional
    /// arguments are present, or [`Error::Arguments`] when the keywords do
    /// not fit `T`.
    pub fn deserialize<T: DeserializeOwned>(self) -> Result<T, Error> {
        let component = short_type_name::<T>();
        if !self.positional.is_empty() {
            return Err(BindingError::UnexpectedPositional { component, count: self.positional.len() }.into());
        }

        let empty = self.kwargs.is_empty();
        let object = serde_json::Value::Object(self.kwargs.iter().map(|(k, v)| (k.clone(), v.to_json())).collect());
        match serde_json::from_value(object) {
            Ok(value) => Ok(value),
            Err(source) if empty => {
                serde_json::from_value(serde_json::Value::Null).map_err(|_| Error::Arguments { component, source })
            }
            Err(source) => Err(Error::Arguments { component, source }),
        }
    }
}

/// `crate::module::Name<..>` -> `Name<..>`
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let path = full.split('<').next().unwrap_or(full);
    match path.rfind("::") {
        Some(idx) => &full[idx + 2..],
        None => full,
    }
}

// =============================================================================
// TYPE ERASURE
// =============================================================================

trait ErasedComponent {
    fn attributes(&self) -> serde_json::Result<serde_json::Value>;
    fn inline_template(&self) -> Option<&str>;
    fn named_template(&self) -> Option<String>;
    fn context_data(&self, context: &mut Context) -> Result<(), Error>;
}

impl<T: Component> ErasedComponent for T {
    fn attributes(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    fn inline_template(&self) -> Option<&str> {
        Component::template(self)
    }

    fn named_template(&self) -> Option<String> {
        Component::template_name(self)
    }

    fn context_data(&self, context: &mut Context) -> Result<(), Error> {
        Component::get_context_data(self, context)
    }
}

type BuildFn = fn(Args) -> Result<Box<dyn ErasedComponent>, Error>;

struct TypeInfo {
    id: TypeId,
    name: &'static str,
    fields: Arc<[FieldSpec]>,
    build: BuildFn,
}

/// A registered component type: how to build it and which slots it declares.
#[derive(Clone)]
pub struct ComponentType {
    info: Arc<TypeInfo>,
}

impl ComponentType {
    #[must_use]
    pub fn of<T: Component>() -> Self {
        Self {
            info: Arc::new(TypeInfo {
                id: TypeId::of::<T>(),
                name: short_type_name::<T>(),
                fields: T::fields().into(),
                build: build::<T>,
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.info.name
    }

    #[must_use]
    pub fn field_specs(&self) -> &[FieldSpec] {
        &self.info.fields
    }

    /// Fail if two declared fields answer to the same fill address.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::AmbiguousField`].
    pub fn check_fields(&self) -> Result<(), BindingError> {
        SlotFields::new(self.name(), Arc::clone(&self.info.fields)).map(drop)
    }

    #[must_use]
    pub fn is<T: Component>(&self) -> bool {
        self.info.id == TypeId::of::<T>()
    }

    /// Build a fresh instance from `args`.
    ///
    /// # Errors
    ///
    /// Propagates the component's [`Component::from_args`] failure.
    pub fn instantiate(&self, args: Args) -> Result<ComponentHandle, Error> {
        let rich: Map = args
            .kwargs
            .iter()
            .filter(|(_, value)| !value.survives_json())
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        let component = (self.info.build)(args)?;
        Ok(ComponentHandle::from_parts(self.clone(), component, rich))
    }
}

fn build<T: Component>(args: Args) -> Result<Box<dyn ErasedComponent>, Error> {
    Ok(Box::new(T::from_args(args)?))
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        self.info.id == other.info.id
    }
}

impl Eq for ComponentType {}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentType").field(&self.info.name).finish()
    }
}

// =============================================================================
// INSTANCE
// =============================================================================

struct ComponentInstance {
    ty: ComponentType,
    component: Box<dyn ErasedComponent>,
    fields: Option<SlotFields>,
    content: String,
    /// Keyword arguments that serde would flatten (safe markup, components),
    /// kept as passed.
    rich_kwargs: Map,
}

/// Shared handle to a live component instance.
///
/// Clones point at the same instance; templates hold one as `self` or under
/// the invocation alias while fills mutate its slot state.
#[derive(Clone)]
pub struct ComponentHandle(Rc<RefCell<ComponentInstance>>);

impl ComponentHandle {
    #[must_use]
    pub fn new<T: Component>(component: T) -> Self {
        Self::from_parts(ComponentType::of::<T>(), Box::new(component), Map::new())
    }

    fn from_parts(ty: ComponentType, component: Box<dyn ErasedComponent>, rich_kwargs: Map) -> Self {
        Self(Rc::new(RefCell::new(ComponentInstance {
            ty,
            component,
            fields: None,
            content: String::new(),
            rich_kwargs,
        })))
    }

    #[must_use]
    pub fn component_type(&self) -> ComponentType {
        self.0.borrow().ty.clone()
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.0.borrow().ty.name()
    }

    #[must_use]
    pub fn same_instance(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Rendered body of the invocation.
    #[must_use]
    pub fn content(&self) -> String {
        self.0.borrow().content.clone()
    }

    pub fn set_content(&self, content: impl Into<String>) {
        self.0.borrow_mut().content = content.into();
    }

    /// Resolve `self.key` in a template: `content`, then slot fields, then
    /// markup or component keywords as passed, then the component's
    /// serialized attributes.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<Value> {
        let instance = self.0.borrow();
        if key == CONTENT_KEYWORD {
            return Some(Value::safe(instance.content.clone()));
        }
        if let Some(view) = instance.fields.as_ref().and_then(|fields| fields.view(key)) {
            return Some(view.to_value());
        }
        if let Some(value) = instance.rich_kwargs.get(key) {
            return Some(value.clone());
        }
        match instance.component.attributes() {
            Ok(json) => Value::from(json).get_attr(key),
            Err(err) => {
                warn!(component = instance.ty.name(), error = %err, "component attributes failed to serialize");
                None
            }
        }
    }

    /// Bind `self` and `extra`, then run the author's context hook.
    ///
    /// # Errors
    ///
    /// Propagates the author hook's error.
    pub fn get_context_data(&self, context: &mut Context, extra: Map) -> Result<(), Error> {
        context.set("self", Value::Component(self.clone()));
        for (name, value) in extra {
            context.set(name, value);
        }
        self.0.borrow().component.context_data(context)
    }

    /// The loader name of the component's template, if any.
    #[must_use]
    pub fn get_template_name(&self) -> Option<String> {
        self.0.borrow().component.named_template()
    }

    /// Resolve the template: inline source first, then the named template.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when neither is provided, and the
    /// loader's error when the named template is missing or malformed.
    pub fn get_template(&self, engine: &Engine) -> Result<Arc<Template>, Error> {
        let instance = self.0.borrow();
        if let Some(source) = instance.component.inline_template() {
            return engine.compile(source);
        }
        match instance.component.named_template() {
            Some(name) => engine.get_template(&name),
            None => Err(Error::Configuration(format!(
                "component {} has no template: provide template() or template_name()",
                instance.ty.name()
            ))),
        }
    }

    /// Give the instance a fresh, empty set of slot fields.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::AmbiguousField`] for conflicting declarations.
    pub fn create_slot_fields(&self) -> Result<(), Error> {
        let mut instance = self.0.borrow_mut();
        let specs = Arc::clone(&instance.ty.info.fields);
        instance.fields = Some(SlotFields::new(instance.ty.name(), specs)?);
        Ok(())
    }

    /// Fail if a required field was left unfilled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`], or [`BindingError::FieldsNotInitialized`]
    /// when fields were declared but never created.
    pub fn check_slot_fields(&self) -> Result<(), Error> {
        let instance = self.0.borrow();
        match &instance.fields {
            Some(fields) => fields.check(instance.ty.name()).map_err(Error::from),
            None if instance.ty.field_specs().is_empty() => Ok(()),
            None => Err(BindingError::FieldsNotInitialized(instance.ty.name()).into()),
        }
    }

    /// Current state of the field declared as `name`.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::FieldsNotInitialized`] or [`BindingError::UnknownField`].
    pub fn field(&self, name: &str) -> Result<FieldView, Error> {
        let instance = self.0.borrow();
        let fields = instance.fields.as_ref().ok_or(BindingError::FieldsNotInitialized(instance.ty.name()))?;
        fields
            .view(name)
            .ok_or_else(|| BindingError::UnknownField { component: instance.ty.name(), field: name.to_owned() }.into())
    }

    /// Map a fill target to its slot address.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::FieldsNotInitialized`] or [`BindingError::UnknownField`].
    pub fn resolve_slot(&self, target: &str) -> Result<SlotAddress, Error> {
        let instance = self.0.borrow();
        let fields = instance.fields.as_ref().ok_or(BindingError::FieldsNotInitialized(instance.ty.name()))?;
        fields
            .resolve(target)
            .ok_or_else(|| BindingError::UnknownField { component: instance.ty.name(), field: target.to_owned() }.into())
    }

    /// Fill the slot `target` with `body`, rendered through the field's binding.
    ///
    /// # Errors
    ///
    /// See [`ComponentHandle::fill_with`].
    pub fn fill(
        &self,
        engine: &Engine,
        context: &mut Context,
        target: &str,
        body: Body<'_>,
        kwargs: Map,
    ) -> Result<(), Error> {
        self.fill_with(engine, context, target, body, kwargs, None)
    }

    /// Fill the slot `target`, optionally overriding the declared binding.
    ///
    /// The body renders in `context` (the caller's scope) before the markup
    /// is stored on this instance.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::ReservedKeyword`] when `kwargs` contains
    /// `content`, slot resolution errors, or any failure while rendering the fill.
    pub fn fill_with(
        &self,
        engine: &Engine,
        context: &mut Context,
        target: &str,
        body: Body<'_>,
        kwargs: Map,
        binding: Option<Binding>,
    ) -> Result<(), Error> {
        if kwargs.contains_key(CONTENT_KEYWORD) {
            return Err(BindingError::ReservedKeyword(CONTENT_KEYWORD.to_owned()).into());
        }

        let address = self.resolve_slot(target)?;
        let binding = binding.or_else(|| self.0.borrow().fields.as_ref().and_then(|f| f.binding_for(&address)));
        let markup = FieldValue::new(body, kwargs, binding).render(engine, context, self)?;

        let mut instance = self.0.borrow_mut();
        debug!(component = instance.ty.name(), field = %address.field, variant = ?address.variant, "slot filled");
        if let Some(fields) = instance.fields.as_mut() {
            fields.store(&address, markup);
        }
        Ok(())
    }

    /// Render the component's template against `context`.
    ///
    /// # Errors
    ///
    /// Propagates template resolution and render errors.
    pub fn render(&self, engine: &Engine, context: &mut Context) -> Result<String, Error> {
        let template = self.get_template(engine)?;
        template.render(engine, context)
    }
}

impl fmt::Debug for ComponentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(instance) => f.debug_struct("ComponentHandle").field("type", &instance.ty.name()).finish(),
            Err(_) => f.write_str("ComponentHandle(<in use>)"),
        }
    }
}

// =============================================================================
// INVOCATION
// =============================================================================

/// Body of an invocation or fill.
pub enum Body<'a> {
    /// Template nodes, rendered in the caller's scope.
    Nodes(&'a [Node]),
    /// Markup that is already rendered.
    Markup(String),
}

impl Body<'_> {
    /// # Errors
    ///
    /// Propagates node render errors.
    pub fn render(self, engine: &Engine, context: &mut Context) -> Result<String, Error> {
        match self {
            Self::Nodes(nodes) => render_nodes(nodes, engine, context),
            Self::Markup(markup) => Ok(markup),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Invocation<'a> {
    pub alias: Option<&'a str>,
    pub isolated: bool,
}

/// Run the full lifecycle of `handle` and return its markup.
pub(crate) fn invoke(
    engine: &Engine,
    handle: &ComponentHandle,
    body: Body<'_>,
    context: &mut Context,
    invocation: &Invocation<'_>,
) -> Result<String, Error> {
    debug!(
        component = handle.type_name(),
        alias = ?invocation.alias,
        isolated = invocation.isolated,
        "rendering component"
    );

    let mut scope = context.push();
    if let Some(alias) = invocation.alias {
        scope.set(alias, Value::Component(handle.clone()));
    }
    handle.get_context_data(&mut scope, Map::new())?;
    handle.create_slot_fields()?;

    let content = body.render(engine, &mut scope)?;
    handle.set_content(content);
    handle.check_slot_fields()?;

    if invocation.isolated {
        let mut isolated = Context::new();
        handle.get_context_data(&mut isolated, Map::new())?;
        handle.render(engine, &mut isolated)
    } else {
        handle.render(engine, &mut scope)
    }
}

#[cfg(test)]
#[path = "component_test.rs"]
mod tests;
