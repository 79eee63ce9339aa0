//! Plugin catalog used to load documents the way the agent would.
//!
//! Loading instantiates every block and derives an [`Identity`] from its
//! category, type and options. Two documents that load to the same set of
//! identities configure the same pipeline.

pub mod catalog;
pub mod schema;

use crate::codec::{DocumentCodec, TomlCodec};
use crate::document::{Block, Category};
use crate::error::PluginError;
use serde::Serialize;
use serde_json::Value as Json;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use toml::{Table, Value};

pub use schema::{OptionKind, OptionSpec, SchemaDefinition};

/// Factory side of a plugin: knows which options it accepts
pub trait PluginDefinition: Send + Sync {
    fn category(&self) -> Category;
    fn type_name(&self) -> &str;
    fn validate(&self, options: &Table) -> Result<(), PluginError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Identity(String);

impl Identity {
    pub fn of(category: Category, type_name: &str, options: &Table) -> Self {
        let canonical = canonical_json(&Value::Table(options.clone())).to_string();

        let mut hasher = Sha256::new();
        hasher.update(category.section().as_bytes());
        hasher.update([0u8]);
        hasher.update(type_name.as_bytes());
        hasher.update([0u8]);
        hasher.update(canonical.as_bytes());
        Identity(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// serde_json maps are sorted, so key order in the source does not matter
fn canonical_json(value: &Value) -> Json {
    match value {
        Value::String(s) => Json::String(s.clone()),
        Value::Integer(n) => Json::from(*n),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(Json::Number)
            .unwrap_or_else(|| Json::String(f.to_string())),
        Value::Boolean(b) => Json::Bool(*b),
        Value::Datetime(dt) => Json::String(dt.to_string()),
        Value::Array(items) => Json::Array(items.iter().map(canonical_json).collect()),
        Value::Table(table) => Json::Object(
            table
                .iter()
                .map(|(k, v)| (k.clone(), canonical_json(v)))
                .collect(),
        ),
    }
}

/// A loaded plugin instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plugin {
    pub category: Category,
    pub type_name: String,
    pub id: Identity,
}

impl Plugin {
    /// `section.type#<short id>`, used in mismatch reports
    pub fn describe(&self) -> String {
        let id = self.id.as_str();
        format!(
            "{}.{}#{}",
            self.category.section(),
            self.type_name,
            &id[..id.len().min(12)]
        )
    }
}

pub struct PluginRegistry {
    definitions: BTreeMap<(Category, String), Box<dyn PluginDefinition>>,
    codec: Arc<dyn DocumentCodec>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            definitions: BTreeMap::new(),
            codec: Arc::new(TomlCodec::new()),
        }
    }

    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        catalog::register_builtin(&mut registry);
        registry
    }

    pub fn register(&mut self, definition: Box<dyn PluginDefinition>) {
        let key = (definition.category(), definition.type_name().to_string());
        self.definitions.insert(key, definition);
    }

    pub fn get(&self, category: Category, type_name: &str) -> Option<&dyn PluginDefinition> {
        self.definitions
            .get(&(category, type_name.to_string()))
            .map(|d| d.as_ref())
    }

    pub fn instantiate(&self, block: &Block) -> Result<Plugin, PluginError> {
        let definition =
            self.get(block.category(), block.type_name())
                .ok_or_else(|| PluginError::UnknownType {
                    category: block.category(),
                    type_name: block.type_name().to_string(),
                })?;

        definition.validate(block.options())?;

        Ok(Plugin {
            category: block.category(),
            type_name: block.type_name().to_string(),
            id: Identity::of(block.category(), block.type_name(), block.options()),
        })
    }

    /// Parses `input` and instantiates every plugin block, in source order.
    pub fn load_document(&self, input: &[u8]) -> Result<Vec<Plugin>, PluginError> {
        let document = self.codec.parse(input)?;
        document.blocks().map(|b| self.instantiate(b)).collect()
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}
