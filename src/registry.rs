//! Name to component type registry.
//!
//! DESIGN
//! ======
//! `RwLock<HashMap<String, ComponentType>>`: registration happens at startup,
//! lookups happen on every `component` tag. Registering the same type twice
//! under a name is a no-op; a different type under a taken name is rejected.
//!
//! A process-wide instance is available through [`ComponentRegistry::global`];
//! tests build their own so they never share state.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, LazyLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info};

use crate::component::{Component, ComponentType};
use crate::error::RegistryError;

static GLOBAL: LazyLock<Arc<ComponentRegistry>> = LazyLock::new(|| Arc::new(ComponentRegistry::new()));

#[derive(Default)]
pub struct ComponentRegistry {
    components: RwLock<HashMap<String, ComponentType>>,
}

impl ComponentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    #[must_use]
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL)
    }

    /// Bind `name` to `ty`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AlreadyRegistered`] when `name` is bound to a
    /// different type, or [`RegistryError::InvalidFields`] when two of the
    /// type's fields share a fill address.
    pub fn register(&self, name: impl Into<String>, ty: ComponentType) -> Result<(), RegistryError> {
        let name = name.into();
        if let Err(source) = ty.check_fields() {
            return Err(RegistryError::InvalidFields { name, source });
        }
        let mut components = self.write();
        if let Some(existing) = components.get(&name) {
            if *existing == ty {
                debug!(%name, component = ty.name(), "component already registered");
                return Ok(());
            }
            return Err(RegistryError::AlreadyRegistered { name, existing: existing.name(), incoming: ty.name() });
        }
        info!(%name, component = ty.name(), "component registered");
        components.insert(name, ty);
        Ok(())
    }

    /// Bind `name` to component type `T`.
    ///
    /// # Errors
    ///
    /// See [`ComponentRegistry::register`].
    pub fn register_type<T: Component>(&self, name: impl Into<String>) -> Result<(), RegistryError> {
        self.register(name, ComponentType::of::<T>())
    }

    /// Remove `name` and return the type it was bound to.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotRegistered`] when nothing is bound.
    pub fn unregister(&self, name: &str) -> Result<ComponentType, RegistryError> {
        let removed = self.write().remove(name).ok_or_else(|| RegistryError::NotRegistered(name.to_owned()))?;
        info!(%name, component = removed.name(), "component unregistered");
        Ok(removed)
    }

    /// Look up the type bound to `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotRegistered`] when nothing is bound.
    pub fn get(&self, name: &str) -> Result<ComponentType, RegistryError> {
        self.read().get(name).cloned().ok_or_else(|| RegistryError::NotRegistered(name.to_owned()))
    }

    /// Snapshot of every registration, ordered by name.
    #[must_use]
    pub fn all(&self) -> BTreeMap<String, ComponentType> {
        self.read().iter().map(|(name, ty)| (name.clone(), ty.clone())).collect()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn clear(&self) {
        let mut components = self.write();
        info!(count = components.len(), "component registry cleared");
        components.clear();
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, ComponentType>> {
        self.components.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, ComponentType>> {
        self.components.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
