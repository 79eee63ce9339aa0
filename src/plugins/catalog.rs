//! Plugins known to the loader.
//!
//! Only the option tables the migrations and their test cases touch are
//! described; a plugin missing here cannot be loaded.

use crate::document::Category;
use crate::plugins::PluginRegistry;
use crate::plugins::schema::{OptionKind as Kind, OptionSpec, SchemaDefinition};

const TLS_CLIENT: &[OptionSpec] = &[
    OptionSpec::new("tls_ca", Kind::String),
    OptionSpec::new("tls_cert", Kind::String),
    OptionSpec::new("tls_key", Kind::String),
    OptionSpec::new("tls_server_name", Kind::String),
    OptionSpec::new("insecure_skip_verify", Kind::Bool),
];

const TLS_SERVER: &[OptionSpec] = &[
    OptionSpec::new("tls_cert", Kind::String),
    OptionSpec::new("tls_key", Kind::String),
    OptionSpec::new("tls_allowed_cacerts", Kind::StringList),
];

const PARSER: &[OptionSpec] = &[
    OptionSpec::new("data_format", Kind::String),
    OptionSpec::new("tag_keys", Kind::StringList),
    OptionSpec::new("json_name_key", Kind::String),
    OptionSpec::new("json_query", Kind::String),
    OptionSpec::new("json_string_fields", Kind::StringList),
    OptionSpec::new("json_time_key", Kind::String),
    OptionSpec::new("json_time_format", Kind::String),
    OptionSpec::new("json_timezone", Kind::String),
];

const CPU: &[OptionSpec] = &[
    OptionSpec::new("percpu", Kind::Bool),
    OptionSpec::new("totalcpu", Kind::Bool),
    OptionSpec::new("collect_cpu_time", Kind::Bool),
    OptionSpec::new("report_active", Kind::Bool),
    OptionSpec::new("core_tags", Kind::Bool),
];

const DISKIO: &[OptionSpec] = &[
    OptionSpec::new("devices", Kind::StringList),
    OptionSpec::new("skip_serial_number", Kind::Bool),
    OptionSpec::new("device_tags", Kind::StringList),
    OptionSpec::new("name_templates", Kind::StringList),
];

const HTTP: &[OptionSpec] = &[
    OptionSpec::new("urls", Kind::StringList),
    OptionSpec::new("method", Kind::String),
    OptionSpec::new("body", Kind::String),
    OptionSpec::new("content_encoding", Kind::String),
    OptionSpec::new("headers", Kind::Table),
    OptionSpec::new("username", Kind::String),
    OptionSpec::new("password", Kind::String),
    OptionSpec::new("bearer_token", Kind::String),
    OptionSpec::new("timeout", Kind::Duration),
    OptionSpec::new("success_status_codes", Kind::Any),
];

const SOCKET_LISTENER: &[OptionSpec] = &[
    OptionSpec::new("service_address", Kind::String),
    OptionSpec::new("max_connections", Kind::Integer),
    OptionSpec::new("read_buffer_size", Kind::Any),
    OptionSpec::new("read_timeout", Kind::Duration),
    OptionSpec::new("keep_alive_period", Kind::Duration),
    OptionSpec::new("socket_mode", Kind::String),
    OptionSpec::new("content_encoding", Kind::String),
];

const KIBANA: &[OptionSpec] = &[
    OptionSpec::new("servers", Kind::StringList),
    OptionSpec::new("username", Kind::String),
    OptionSpec::new("password", Kind::String),
    OptionSpec::new("timeout", Kind::Duration),
];

const KUBE_INVENTORY: &[OptionSpec] = &[
    OptionSpec::new("url", Kind::String),
    OptionSpec::new("namespace", Kind::String),
    OptionSpec::new("bearer_token", Kind::String),
    OptionSpec::deprecated("bearer_token_string", Kind::String),
    OptionSpec::new("response_timeout", Kind::Duration),
    OptionSpec::new("resource_include", Kind::StringList),
    OptionSpec::new("resource_exclude", Kind::StringList),
    OptionSpec::new("selector_include", Kind::StringList),
    OptionSpec::new("selector_exclude", Kind::StringList),
    OptionSpec::new("node_name", Kind::String),
];

const INFLUXDB: &[OptionSpec] = &[
    OptionSpec::new("urls", Kind::StringList),
    OptionSpec::deprecated("url", Kind::String),
    OptionSpec::deprecated("precision", Kind::String),
    OptionSpec::new("database", Kind::String),
    OptionSpec::new("database_tag", Kind::String),
    OptionSpec::new("exclude_database_tag", Kind::Bool),
    OptionSpec::new("skip_database_creation", Kind::Bool),
    OptionSpec::new("retention_policy", Kind::String),
    OptionSpec::new("write_consistency", Kind::String),
    OptionSpec::new("timeout", Kind::Duration),
    OptionSpec::new("username", Kind::String),
    OptionSpec::new("password", Kind::String),
    OptionSpec::new("user_agent", Kind::String),
    OptionSpec::new("content_encoding", Kind::String),
    OptionSpec::new("http_proxy", Kind::String),
    OptionSpec::new("http_headers", Kind::Table),
    OptionSpec::new("influx_uint_support", Kind::Bool),
];

const WAVEFRONT: &[OptionSpec] = &[
    OptionSpec::new("url", Kind::String),
    OptionSpec::new("token", Kind::String),
    OptionSpec::new("prefix", Kind::String),
    OptionSpec::new("simple_fields", Kind::Bool),
    OptionSpec::new("metric_separator", Kind::String),
    OptionSpec::new("convert_paths", Kind::Bool),
    OptionSpec::new("use_regex", Kind::Bool),
    OptionSpec::new("use_strict", Kind::Bool),
    OptionSpec::new("source_override", Kind::StringList),
    OptionSpec::new("convert_bool", Kind::Bool),
    OptionSpec::new("truncate_tags", Kind::Bool),
    OptionSpec::new("immediate_flush", Kind::Bool),
    OptionSpec::new("http_maximum_batch_size", Kind::Integer),
    OptionSpec::new("timeout", Kind::Duration),
    OptionSpec::deprecated("string_to_number", Kind::Any),
];

const FILE: &[OptionSpec] = &[
    OptionSpec::new("files", Kind::StringList),
    OptionSpec::new("use_batch_format", Kind::Bool),
    OptionSpec::new("rotation_interval", Kind::Duration),
    OptionSpec::new("rotation_max_size", Kind::Any),
    OptionSpec::new("rotation_max_archives", Kind::Integer),
    OptionSpec::new("data_format", Kind::String),
];

const ENUM: &[OptionSpec] = &[OptionSpec::new("mapping", Kind::TableList)];

const BASICSTATS: &[OptionSpec] = &[OptionSpec::new("stats", Kind::StringList)];

pub fn register_builtin(registry: &mut PluginRegistry) {
    let definitions = [
        SchemaDefinition::new(Category::Input, "cpu", CPU),
        SchemaDefinition::new(Category::Input, "mem", &[]),
        SchemaDefinition::new(Category::Input, "diskio", DISKIO),
        SchemaDefinition::new(Category::Input, "http", HTTP)
            .with(TLS_CLIENT)
            .with(PARSER),
        SchemaDefinition::new(Category::Input, "socket_listener", SOCKET_LISTENER)
            .with(TLS_SERVER)
            .with(PARSER),
        SchemaDefinition::new(Category::Input, "kibana", KIBANA).with(TLS_CLIENT),
        SchemaDefinition::new(Category::Input, "kube_inventory", KUBE_INVENTORY).with(TLS_CLIENT),
        SchemaDefinition::new(Category::Output, "influxdb", INFLUXDB).with(TLS_CLIENT),
        SchemaDefinition::new(Category::Output, "wavefront", WAVEFRONT),
        SchemaDefinition::new(Category::Output, "file", FILE),
        SchemaDefinition::new(Category::Processor, "enum", ENUM),
        SchemaDefinition::new(Category::Aggregator, "basicstats", BASICSTATS),
    ];

    for definition in definitions {
        registry.register(Box::new(definition));
    }
}
