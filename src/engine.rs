//! Render entry points.
//!
//! An [`Engine`] ties together a component registry, a template loader and
//! the configuration. It is `Send + Sync`; every render builds its own
//! [`Context`] and component instances, so one engine can serve many threads.

use std::sync::Arc;

use tracing::debug;

use crate::component::{Args, Body, Component, ComponentHandle, Invocation, invoke};
use crate::config::EngineConfig;
use crate::error::Error;
use crate::loader::TemplateLoader;
use crate::registry::ComponentRegistry;
use crate::template::{Context, Template};

pub struct Engine {
    registry: Arc<ComponentRegistry>,
    loader: TemplateLoader,
    config: EngineConfig,
}

impl Engine {
    #[must_use]
    pub fn new(registry: Arc<ComponentRegistry>) -> Self {
        Self::with_config(registry, EngineConfig::default())
    }

    #[must_use]
    pub fn with_config(registry: Arc<ComponentRegistry>, config: EngineConfig) -> Self {
        let loader = TemplateLoader::new(config.template_dirs.clone(), config.cache_templates);
        Self { registry, loader, config }
    }

    /// Engine over the global registry, configured from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for malformed environment values.
    pub fn from_env() -> Result<Self, Error> {
        let config = EngineConfig::from_env()?;
        debug!(dirs = config.template_dirs.len(), autoescape = config.autoescape, "engine configured from env");
        Ok(Self::with_config(ComponentRegistry::global(), config))
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn loader(&self) -> &TemplateLoader {
        &self.loader
    }

    /// Make `source` loadable as `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Syntax`] for malformed source.
    pub fn add_template(&self, name: impl Into<String>, source: &str) -> Result<(), Error> {
        self.loader.add(name, source)
    }

    /// Compile inline source through the loader's cache.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Syntax`] for malformed source.
    pub fn compile(&self, source: &str) -> Result<Arc<Template>, Error> {
        self.loader.inline(source)
    }

    /// Load a named template.
    ///
    /// # Errors
    ///
    /// See [`TemplateLoader::load`].
    pub fn get_template(&self, name: &str) -> Result<Arc<Template>, Error> {
        self.loader.load(name)
    }

    /// Render template source against `context`. The source is compiled
    /// for this call only and never cached.
    ///
    /// # Errors
    ///
    /// Propagates syntax, registry, binding and validation errors.
    pub fn render_str(&self, source: &str, context: &mut Context) -> Result<String, Error> {
        Template::compile(source)?.render(self, context)
    }

    /// Render the template called `name` against `context`.
    ///
    /// # Errors
    ///
    /// Propagates loader and render errors.
    pub fn render_template(&self, name: &str, context: &mut Context) -> Result<String, Error> {
        self.get_template(name)?.render(self, context)
    }

    /// Render a registered component with no body, as if invoked by a tag.
    ///
    /// # Errors
    ///
    /// Propagates registry, argument and lifecycle errors.
    pub fn render_component(&self, name: &str, args: Args, context: &mut Context) -> Result<String, Error> {
        let handle = self.registry.get(name)?.instantiate(args)?;
        invoke(self, &handle, Body::Markup(String::new()), context, &Invocation::default())
    }

    /// Render an already built component with no body.
    ///
    /// # Errors
    ///
    /// Propagates lifecycle errors, including unfilled required fields.
    pub fn render_instance<T: Component>(&self, component: T, context: &mut Context) -> Result<String, Error> {
        let handle = ComponentHandle::new(component);
        invoke(self, &handle, Body::Markup(String::new()), context, &Invocation::default())
    }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
