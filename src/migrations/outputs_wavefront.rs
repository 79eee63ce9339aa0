//! `string_to_number` on the wavefront output is replaced by enum processors.

use crate::document::builder::BlockBuilder;
use crate::document::{Block, Category};
use crate::rules::helpers::{remove_option, replace, split, to_number};
use crate::rules::{Decline, MigrationContext, MigrationOutcome, Registry, Rule, SchemaVersion};
use toml::{Table, Value};

pub fn register(registry: &mut Registry) {
    registry.register(
        Category::Output,
        "wavefront",
        Rule::new("string_to_number", migrate_string_to_number).since(SchemaVersion::new(1, 5, 0)),
    );
}

fn migrate_string_to_number(
    block: &Block,
    ctx: &MigrationContext<'_>,
) -> Result<MigrationOutcome, Decline> {
    let Some(setting) = block.option("string_to_number") else {
        return Ok(MigrationOutcome::Unchanged);
    };
    let fields = setting
        .as_table()
        .ok_or_else(|| Decline::new("string_to_number must map field names to value tables"))?;

    // 1. One enum processor per field
    let mut processors = Vec::new();
    for (field, spec) in fields {
        let value_mappings = collect_mappings(field, spec)?;
        if value_mappings.is_empty() {
            continue;
        }

        let mut mapping = Table::new();
        mapping.insert("field".to_string(), Value::String(field.clone()));
        mapping.insert("value_mappings".to_string(), Value::Table(value_mappings));
        processors.push(
            BlockBuilder::new(Category::Processor, "enum")
                .option("mapping", vec![Value::Table(mapping)])
                .build(),
        );
    }

    let mut options = block.options().clone();
    remove_option(&mut options, "string_to_number");
    let output = Block::new(Category::Output, "wavefront", options);
    if processors.is_empty() {
        return Ok(replace(output));
    }

    // 2. Processors run in front of every output, not only this one
    if let Some((_, other)) = ctx
        .blocks()
        .find(|(id, b)| *id != ctx.current_id() && b.category() == Category::Output)
    {
        return Err(Decline::new(format!(
            "{} would receive the converted fields as well",
            other.plugin_name()
        )));
    }

    let mut blocks = vec![output];
    blocks.extend(processors);
    Ok(split(blocks))
}

/// Value tables may be given once or as an array of tables per field.
fn collect_mappings(field: &str, spec: &Value) -> Result<Table, Decline> {
    let tables: Vec<&Table> = match spec {
        Value::Table(t) => vec![t],
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_table().ok_or_else(|| {
                    Decline::new(format!("string_to_number.{}: {} is not a table", field, item))
                })
            })
            .collect::<Result<_, _>>()?,
        other => {
            return Err(Decline::new(format!(
                "string_to_number.{}: {} is not a table",
                field, other
            )));
        }
    };

    let mut merged = Table::new();
    for table in tables {
        for (name, number) in table {
            let number = to_number(&format!("string_to_number.{}.{}", field, name), number)?;
            match merged.get(name) {
                Some(existing) if existing != &number => {
                    return Err(Decline::new(format!(
                        "string_to_number.{}: conflicting values for {:?}",
                        field, name
                    )));
                }
                _ => {
                    merged.insert(name.clone(), number);
                }
            }
        }
    }
    Ok(merged)
}
