//! Engine configuration parsed from environment variables.

use std::path::PathBuf;

use crate::error::Error;

pub const ENV_TEMPLATE_DIRS: &str = "VIEWCOMPONENT_TEMPLATE_DIRS";
pub const ENV_AUTOESCAPE: &str = "VIEWCOMPONENT_AUTOESCAPE";
pub const ENV_CACHE_TEMPLATES: &str = "VIEWCOMPONENT_CACHE_TEMPLATES";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Directories searched, in order, for named templates.
    pub template_dirs: Vec<PathBuf>,
    /// HTML-escape `{{ value }}` output that is not marked safe.
    pub autoescape: bool,
    /// Keep compiled templates after the first load.
    pub cache_templates: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { template_dirs: Vec::new(), autoescape: true, cache_templates: true }
    }
}

impl EngineConfig {
    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `VIEWCOMPONENT_TEMPLATE_DIRS`: platform path list, empty by default
    /// - `VIEWCOMPONENT_AUTOESCAPE`: boolean, default true
    /// - `VIEWCOMPONENT_CACHE_TEMPLATES`: boolean, default true
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for unparseable booleans.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var_os(key).map(|v| v.to_string_lossy().into_owned()))
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for unparseable booleans.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let template_dirs = lookup(ENV_TEMPLATE_DIRS)
            .map(|raw| std::env::split_paths(&raw).filter(|p| !p.as_os_str().is_empty()).collect())
            .unwrap_or_default();

        Ok(Self {
            template_dirs,
            autoescape: parse_bool(ENV_AUTOESCAPE, lookup(ENV_AUTOESCAPE).as_deref(), defaults.autoescape)?,
            cache_templates: parse_bool(
                ENV_CACHE_TEMPLATES,
                lookup(ENV_CACHE_TEMPLATES).as_deref(),
                defaults.cache_templates,
            )?,
        })
    }
}

fn parse_bool(key: &str, raw: Option<&str>, default: bool) -> Result<bool, Error> {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(default);
    };
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(Error::Configuration(format!("{key}: expected a boolean, got '{other}'"))),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
