//! Typed failures of the pure configuration model.

use thiserror::Error;

use crate::core::target::FieldTarget;
use crate::core::values::FieldPath;

/// A field address that does not resolve against the current layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("module {} out of range (deck has {len} modules)", .index + 1)]
    ModuleOutOfRange { index: usize, len: usize },
    #[error("group '{group}' not found in module {module}")]
    GroupNotFound { module: String, group: String },
    #[error("field '{field}' not found in group '{group}' of module {module}")]
    FieldNotFound {
        module: String,
        group: String,
        field: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    #[error("activation predicate panicked")]
    Panicked,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializeError {
    #[error("module {module} has a stale layout; rebuild before serializing")]
    StaleLayout { module: String },
    #[error("group '{group}' of module {module}: {source}")]
    Activation {
        module: String,
        group: String,
        #[source]
        source: ConditionError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("no candidate values for {target}")]
    NoCandidates { target: FieldTarget },
    #[error("{target} is already bound")]
    Duplicate { target: FieldTarget },
}

/// The deck could not be returned to its pre-job state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RestoreError {
    #[error("deck has {found} modules, snapshot has {expected}")]
    ModuleCountChanged { expected: usize, found: usize },
    #[error("module {} is {found}, snapshot has {expected}", .index + 1)]
    ModuleReplaced {
        index: usize,
        expected: String,
        found: String,
    },
    #[error("module {}: field {path} missing after restore", .index + 1)]
    FieldMissing { index: usize, path: FieldPath },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetParseError {
    #[error("expected <module>:<group>.<field>, got '{0}'")]
    Malformed(String),
    #[error("module number must be a positive integer, got '{0}'")]
    BadModule(String),
}
