//! Error taxonomy for component rendering.
//!
//! DESIGN
//! ======
//! Each concern gets its own `thiserror` enum (registry, binding, validation)
//! and folds into the crate-level [`Error`] through `#[from]`. Every error
//! carries a grepable code via [`ErrorCode`] so callers that surface render
//! failures (HTTP handlers, logs) can match on a stable string.
//!
//! ERROR HANDLING
//! ==============
//! There is no recovery layer. A failure anywhere in the render tree aborts
//! the whole render and propagates to the top-level caller; no partial
//! markup is returned.

use std::path::PathBuf;

// =============================================================================
// ERROR CODES
// =============================================================================

/// Grepable error code for structured error reporting.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Errors produced by [`crate::ComponentRegistry`] lookups and mutations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The name is already bound to a different component type.
    #[error("component name '{name}' is already registered to {existing}, refusing {incoming}")]
    AlreadyRegistered { name: String, existing: &'static str, incoming: &'static str },
    /// No component type is registered under this name.
    #[error("component '{0}' is not registered")]
    NotRegistered(String),
    /// The component type declares slot fields that cannot be addressed.
    #[error("component '{name}' declares invalid slot fields: {source}")]
    InvalidFields {
        name: String,
        #[source]
        source: BindingError,
    },
}

impl ErrorCode for RegistryError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyRegistered { .. } => "E_ALREADY_REGISTERED",
            Self::NotRegistered(_) => "E_NOT_REGISTERED",
            Self::InvalidFields { .. } => "E_INVALID_FIELDS",
        }
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

/// A required slot field was never filled by the caller.
#[derive(Debug, thiserror::Error)]
#[error("required field '{field}' of component {component} was not filled")]
pub struct ValidationError {
    pub component: &'static str,
    pub field: String,
}

impl ErrorCode for ValidationError {
    fn error_code(&self) -> &'static str {
        "E_REQUIRED_FIELD"
    }
}

// =============================================================================
// BINDING
// =============================================================================

/// Mismatches between a fill (or invocation) and what the component declares.
#[derive(Debug, thiserror::Error)]
pub enum BindingError {
    /// The fill names a field the component does not declare.
    #[error("field '{field}' not found in component {component}")]
    UnknownField { component: &'static str, field: String },
    /// The fill passed a keyword that the slot protocol reserves.
    #[error("the '{0}' keyword is reserved and cannot be passed to a call tag")]
    ReservedKeyword(String),
    /// No variable with this name is in scope.
    #[error("component alias '{0}' not found in context")]
    AliasNotInScope(String),
    /// The alias resolved to a value that is not a live component.
    #[error("'{0}' does not refer to a component instance")]
    NotAComponent(String),
    /// Two declared fields answer to the same fill address, e.g. a plain
    /// `avatar_image` next to `avatar` with an `image` variant.
    #[error("component {component} declares fill address '{address}' more than once")]
    AmbiguousField { component: &'static str, address: String },
    /// Slot fields were read or filled before `create_slot_fields` ran.
    #[error("slot fields of component {0} have not been initialized")]
    FieldsNotInitialized(&'static str),
    /// Positional arguments were passed to a component that only takes keywords.
    #[error("component {component} takes no positional arguments, got {count}")]
    UnexpectedPositional { component: &'static str, count: usize },
}

impl ErrorCode for BindingError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownField { .. } => "E_UNKNOWN_FIELD",
            Self::ReservedKeyword(_) => "E_RESERVED_KEYWORD",
            Self::AliasNotInScope(_) => "E_ALIAS_NOT_IN_SCOPE",
            Self::NotAComponent(_) => "E_NOT_A_COMPONENT",
            Self::AmbiguousField { .. } => "E_AMBIGUOUS_FIELD",
            Self::FieldsNotInitialized(_) => "E_FIELDS_NOT_INITIALIZED",
            Self::UnexpectedPositional { .. } => "E_UNEXPECTED_POSITIONAL",
        }
    }
}

// =============================================================================
// CRATE ERROR
// =============================================================================

/// Any failure while compiling or rendering templates and components.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No template is resolvable, or configuration could not be parsed.
    #[error("improperly configured: {0}")]
    Configuration(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Binding(#[from] BindingError),

    /// The template source is malformed.
    #[error("template syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// A named template could not be located by the loader.
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    /// A template file exists but could not be read.
    #[error("failed to read template {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Keyword data could not be converted into the component's fields.
    #[error("invalid arguments for component {component}: {source}")]
    Arguments {
        component: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    pub(crate) fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax { line, message: message.into() }
    }
}

impl ErrorCode for Error {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "E_CONFIGURATION",
            Self::Registry(e) => e.error_code(),
            Self::Validation(e) => e.error_code(),
            Self::Binding(e) => e.error_code(),
            Self::Syntax { .. } => "E_TEMPLATE_SYNTAX",
            Self::TemplateNotFound(_) => "E_TEMPLATE_NOT_FOUND",
            Self::Io { .. } => "E_TEMPLATE_IO",
            Self::Arguments { .. } => "E_COMPONENT_ARGUMENTS",
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
