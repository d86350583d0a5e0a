//! Template lookup by name and compile caching.
//!
//! Named templates come from two places: sources added in memory with
//! [`TemplateLoader::add`], which always win, and files under the configured
//! template directories, searched in order. Inline component templates are
//! compiled once per distinct source when caching is on, up to
//! [`INLINE_CACHE_LIMIT`] sources; past that they compile on every use.

use std::collections::HashMap;
use std::path::{Component as PathComponent, Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use crate::error::Error;
use crate::template::Template;

/// Most distinct inline sources kept compiled at once.
pub const INLINE_CACHE_LIMIT: usize = 512;

type Cache = RwLock<HashMap<String, Arc<Template>>>;

pub struct TemplateLoader {
    dirs: Vec<PathBuf>,
    cache_enabled: bool,
    added: Cache,
    files: Cache,
    inline: Cache,
}

impl TemplateLoader {
    #[must_use]
    pub fn new(dirs: Vec<PathBuf>, cache_enabled: bool) -> Self {
        Self {
            dirs,
            cache_enabled,
            added: RwLock::default(),
            files: RwLock::default(),
            inline: RwLock::default(),
        }
    }

    #[must_use]
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Compile `source` and make it loadable as `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Syntax`] for malformed source.
    pub fn add(&self, name: impl Into<String>, source: &str) -> Result<(), Error> {
        let name = name.into();
        let template = Arc::new(Template::compile_named(name.clone(), source)?);
        debug!(%name, "template added");
        write(&self.added).insert(name, template);
        Ok(())
    }

    /// Load the template called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TemplateNotFound`] when no source matches,
    /// [`Error::Io`] when a file cannot be read, and [`Error::Syntax`] for
    /// malformed source.
    pub fn load(&self, name: &str) -> Result<Arc<Template>, Error> {
        if let Some(template) = read(&self.added).get(name) {
            return Ok(Arc::clone(template));
        }
        if self.cache_enabled {
            if let Some(template) = read(&self.files).get(name) {
                return Ok(Arc::clone(template));
            }
        }
        if !is_relative_name(name) {
            return Err(Error::TemplateNotFound(name.to_owned()));
        }

        for dir in &self.dirs {
            let path = dir.join(name);
            if !path.is_file() {
                continue;
            }
            let source = std::fs::read_to_string(&path).map_err(|source| Error::Io { path: path.clone(), source })?;
            let template = Arc::new(Template::compile_named(name, &source)?);
            info!(%name, path = %path.display(), "template loaded");
            if self.cache_enabled {
                write(&self.files).insert(name.to_owned(), Arc::clone(&template));
            }
            return Ok(template);
        }

        Err(Error::TemplateNotFound(name.to_owned()))
    }

    /// Compile inline component source, reusing an earlier compile when caching.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Syntax`] for malformed source.
    pub fn inline(&self, source: &str) -> Result<Arc<Template>, Error> {
        if !self.cache_enabled {
            return Ok(Arc::new(Template::compile(source)?));
        }
        if let Some(template) = read(&self.inline).get(source) {
            return Ok(Arc::clone(template));
        }
        let template = Arc::new(Template::compile(source)?);
        let mut cache = write(&self.inline);
        if cache.len() < INLINE_CACHE_LIMIT {
            cache.insert(source.to_owned(), Arc::clone(&template));
        } else {
            debug!(entries = cache.len(), "inline template cache full, not caching");
        }
        Ok(template)
    }

    /// Number of inline sources currently cached.
    #[must_use]
    pub fn inline_cache_len(&self) -> usize {
        read(&self.inline).len()
    }

    /// Drop cached file and inline compiles. Added templates stay.
    pub fn clear_cache(&self) {
        write(&self.files).clear();
        write(&self.inline).clear();
    }
}

/// Template names may not escape the template directories.
fn is_relative_name(name: &str) -> bool {
    !name.is_empty() && Path::new(name).components().all(|part| matches!(part, PathComponent::Normal(_)))
}

fn read(cache: &Cache) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<Template>>> {
    cache.read().unwrap_or_else(PoisonError::into_inner)
}

fn write(cache: &Cache) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Arc<Template>>> {
    cache.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[path = "loader_test.rs"]
mod tests;
