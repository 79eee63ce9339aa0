//! The httpjson input was folded into the generic http input with the json
//! parser.

use crate::document::{Block, Category};
use crate::rules::helpers::{replace, set_option, to_duration, to_string_list};
use crate::rules::{Decline, MigrationContext, MigrationOutcome, Registry, Rule, SchemaVersion};
use toml::{Table, Value};

pub fn register(registry: &mut Registry) {
    registry.register(
        Category::Input,
        "httpjson",
        Rule::new("http_with_json_parser", migrate_httpjson).since(SchemaVersion::new(1, 6, 0)),
    );
}

fn migrate_httpjson(
    block: &Block,
    _ctx: &MigrationContext<'_>,
) -> Result<MigrationOutcome, Decline> {
    let has_override = block.option("name_override").is_some();
    let mut options = Table::new();

    for (key, value) in block.options() {
        match key.as_str() {
            "servers" => {
                let urls = to_string_list("servers", value)?;
                set_option(&mut options, "urls", Value::from(urls))?;
            }
            "response_timeout" => {
                set_option(&mut options, "timeout", to_duration("response_timeout", value)?)?;
            }
            "name" => {
                if !has_override {
                    let name = value
                        .as_str()
                        .ok_or_else(|| Decline::new(format!("name: {} is not a string", value)))?;
                    set_option(&mut options, "name_override", Value::String(measurement(name)))?;
                }
            }
            "parameters" => {
                if !value.as_table().is_some_and(Table::is_empty) {
                    return Err(Decline::new(
                        "query parameters have no counterpart in the http input",
                    ));
                }
            }
            "ssl_ca" | "ssl_cert" | "ssl_key" => {
                set_option(&mut options, &key.replacen("ssl_", "tls_", 1), value.clone())?;
            }
            _ => set_option(&mut options, key, value.clone())?,
        }
    }

    if !options.contains_key("urls") {
        return Err(Decline::new("no servers configured"));
    }
    if !options.contains_key("name_override") {
        options.insert("name_override".to_string(), Value::String(measurement("")));
    }
    set_option(&mut options, "data_format", Value::String("json".to_string()))?;

    Ok(replace(Block::new(Category::Input, "http", options)))
}

/// httpjson prefixed every measurement with its own name.
fn measurement(name: &str) -> String {
    if name.is_empty() {
        "httpjson".to_string()
    } else {
        format!("httpjson_{}", name)
    }
}
