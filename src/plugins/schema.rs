use crate::document::Category;
use crate::error::PluginError;
use crate::plugins::PluginDefinition;
use crate::rules::helpers::parse_duration;
use toml::{Table, Value};
use tracing::warn;

use OptionKind as Kind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    String,
    Integer,
    Float,
    /// Integer or float
    Number,
    Bool,
    /// Duration string such as `"10s"`, or whole seconds
    Duration,
    StringList,
    Table,
    TableList,
    Any,
}

impl OptionKind {
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            OptionKind::String => value.is_str(),
            OptionKind::Integer => value.is_integer(),
            OptionKind::Float => value.is_float(),
            OptionKind::Number => value.is_integer() || value.is_float(),
            OptionKind::Bool => value.is_bool(),
            OptionKind::Duration => match value {
                Value::String(s) => parse_duration(s).is_some(),
                Value::Integer(n) => *n >= 0,
                _ => false,
            },
            OptionKind::StringList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_str)),
            OptionKind::Table => value.is_table(),
            OptionKind::TableList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_table)),
            OptionKind::Any => true,
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            OptionKind::String => "a string",
            OptionKind::Integer => "an integer",
            OptionKind::Float => "a float",
            OptionKind::Number => "a number",
            OptionKind::Bool => "a boolean",
            OptionKind::Duration => "a duration",
            OptionKind::StringList => "a list of strings",
            OptionKind::Table => "a table",
            OptionKind::TableList => "a list of tables",
            OptionKind::Any => "any value",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    pub name: &'static str,
    pub kind: OptionKind,
    /// Still accepted, but a migration should have removed it
    pub deprecated: bool,
}

impl OptionSpec {
    pub const fn new(name: &'static str, kind: OptionKind) -> Self {
        Self {
            name,
            kind,
            deprecated: false,
        }
    }

    pub const fn deprecated(name: &'static str, kind: OptionKind) -> Self {
        Self {
            name,
            kind,
            deprecated: true,
        }
    }
}

const FILTERS: &[OptionSpec] = &[
    OptionSpec::new("namepass", Kind::StringList),
    OptionSpec::new("namedrop", Kind::StringList),
    OptionSpec::new("fieldpass", Kind::StringList),
    OptionSpec::new("fielddrop", Kind::StringList),
    OptionSpec::new("fieldinclude", Kind::StringList),
    OptionSpec::new("fieldexclude", Kind::StringList),
    OptionSpec::new("tagpass", Kind::Table),
    OptionSpec::new("tagdrop", Kind::Table),
    OptionSpec::new("taginclude", Kind::StringList),
    OptionSpec::new("tagexclude", Kind::StringList),
    OptionSpec::new("metricpass", Kind::String),
    OptionSpec::new("alias", Kind::String),
    OptionSpec::new("log_level", Kind::String),
];

const INPUT_COMMON: &[OptionSpec] = &[
    OptionSpec::new("interval", Kind::Duration),
    OptionSpec::new("precision", Kind::Duration),
    OptionSpec::new("collection_jitter", Kind::Duration),
    OptionSpec::new("collection_offset", Kind::Duration),
    OptionSpec::new("name_override", Kind::String),
    OptionSpec::new("name_prefix", Kind::String),
    OptionSpec::new("name_suffix", Kind::String),
    OptionSpec::new("tags", Kind::Table),
    OptionSpec::new("startup_error_behavior", Kind::String),
];

const OUTPUT_COMMON: &[OptionSpec] = &[
    OptionSpec::new("flush_interval", Kind::Duration),
    OptionSpec::new("flush_jitter", Kind::Duration),
    OptionSpec::new("metric_batch_size", Kind::Integer),
    OptionSpec::new("metric_buffer_limit", Kind::Integer),
    OptionSpec::new("name_override", Kind::String),
    OptionSpec::new("name_prefix", Kind::String),
    OptionSpec::new("name_suffix", Kind::String),
];

const PROCESSOR_COMMON: &[OptionSpec] = &[OptionSpec::new("order", Kind::Integer)];

const AGGREGATOR_COMMON: &[OptionSpec] = &[
    OptionSpec::new("period", Kind::Duration),
    OptionSpec::new("delay", Kind::Duration),
    OptionSpec::new("grace", Kind::Duration),
    OptionSpec::new("drop_original", Kind::Bool),
    OptionSpec::new("name_override", Kind::String),
    OptionSpec::new("name_prefix", Kind::String),
    OptionSpec::new("name_suffix", Kind::String),
    OptionSpec::new("tags", Kind::Table),
];

/// Options every plugin of the category understands
pub fn common_options(category: Category) -> impl Iterator<Item = &'static OptionSpec> {
    let specific = match category {
        Category::Input => INPUT_COMMON,
        Category::Output => OUTPUT_COMMON,
        Category::Processor => PROCESSOR_COMMON,
        Category::Aggregator => AGGREGATOR_COMMON,
    };
    FILTERS.iter().chain(specific.iter())
}

/// Plugin described by static option tables
pub struct SchemaDefinition {
    category: Category,
    type_name: &'static str,
    tables: Vec<&'static [OptionSpec]>,
}

impl SchemaDefinition {
    pub fn new(category: Category, type_name: &'static str, options: &'static [OptionSpec]) -> Self {
        Self {
            category,
            type_name,
            tables: vec![options],
        }
    }

    /// Adds a shared option table, e.g. TLS or parser settings.
    pub fn with(mut self, options: &'static [OptionSpec]) -> Self {
        self.tables.push(options);
        self
    }

    pub fn spec(&self, name: &str) -> Option<&'static OptionSpec> {
        self.tables
            .iter()
            .flat_map(|table| table.iter())
            .chain(common_options(self.category))
            .find(|spec| spec.name == name)
    }
}

impl PluginDefinition for SchemaDefinition {
    fn category(&self) -> Category {
        self.category
    }

    fn type_name(&self) -> &str {
        self.type_name
    }

    fn validate(&self, options: &Table) -> Result<(), PluginError> {
        let plugin = format!("{}.{}", self.category.section(), self.type_name);

        for (name, value) in options {
            let spec = self.spec(name).ok_or_else(|| PluginError::UnknownOption {
                plugin: plugin.clone(),
                option: name.clone(),
            })?;

            if !spec.kind.accepts(value) {
                return Err(PluginError::InvalidOption {
                    plugin,
                    option: name.clone(),
                    expected: spec.kind.describe().to_string(),
                });
            }

            if spec.deprecated {
                warn!(plugin = %plugin, option = %name, "option is deprecated");
            }
        }

        Ok(())
    }
}
