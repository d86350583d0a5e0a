//! Server-side UI components with named slots.
//!
//! A component is a serde struct with a template. Templates invoke
//! components with `{% component %}` and fill their slots with `{% call %}`:
//!
//! ```text
//! {% component "blog" as blog %}
//!   {% call blog.header %}<h1>Posts</h1>{% endcall %}
//!   {% for post in posts %}
//!     {% call blog.posts post=post %}{% endcall %}
//!   {% endfor %}
//! {% endcomponent %}
//! ```
//!
//! Fields are declared with [`FieldSpec`] and may be bound to another
//! component, a component type, or a callable. The component's own template
//! reads fills back through `self.<field>.value` and `self.<field>.filled`.

pub mod component;
pub mod config;
pub mod engine;
pub mod error;
pub mod fields;
pub mod loader;
pub mod registry;
pub mod tags;
pub mod template;

pub use component::{Args, Body, Component, ComponentHandle, ComponentType};
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{BindingError, Error, ErrorCode, RegistryError, ValidationError};
pub use fields::{Binding, FieldKind, FieldSpec, FieldView, SlotCall, SlotOutput};
pub use loader::TemplateLoader;
pub use registry::ComponentRegistry;
pub use template::{Context, Map, Template, Value};
