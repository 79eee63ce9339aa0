//! Error types for the migration engine and its collaborators

use crate::document::Category;
use thiserror::Error;

/// Errors that abort a whole migration call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MigrateError {
    /// Input is not valid UTF-8
    #[error("configuration is not valid UTF-8: {0}")]
    InvalidUtf8(String),

    /// Input is not a well-formed document
    #[error("invalid configuration at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A migrated block could not be rendered back to text
    #[error("cannot serialize block {plugin}: {message}")]
    Serialize { plugin: String, message: String },
}

/// Errors raised by the plugin catalog when loading a document
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PluginError {
    #[error("undefined but requested plugin: {category}.{type_name}")]
    UnknownType { category: Category, type_name: String },

    #[error("plugin {plugin}: unknown option {option:?}")]
    UnknownOption { plugin: String, option: String },

    #[error("plugin {plugin}: option {option:?} must be {expected}")]
    InvalidOption {
        plugin: String,
        option: String,
        expected: String,
    },

    #[error("cannot load document: {0}")]
    Document(#[from] MigrateError),
}

/// Failures reported by the verification harness
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error(transparent)]
    Migrate(#[from] MigrateError),

    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error("expected document declares no plugins")]
    EmptyExpected,

    #[error("no migration was applied")]
    NothingApplied,

    #[error("document without outdated plugins was modified ({applied} migrations applied)")]
    Changed { applied: u64 },

    #[error("plugin identities differ: missing {missing:?}, unexpected {unexpected:?}")]
    Mismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error("cannot read test case: {0}")]
    Io(#[from] std::io::Error),
}
