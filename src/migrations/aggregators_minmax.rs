//! minmax is a subset of basicstats.

use crate::document::{Block, Category};
use crate::rules::helpers::{
    merge_into, options_equal_except, replace, set_option, to_string_list,
};
use crate::rules::{
    Decline, MigrationContext, MigrationOutcome, Registry, Replacement, Rule, SchemaVersion,
};
use toml::Value;

const STATS: [&str; 2] = ["min", "max"];

pub fn register(registry: &mut Registry) {
    registry.register(
        Category::Aggregator,
        "minmax",
        Rule::new("basicstats", migrate_minmax).since(SchemaVersion::new(1, 4, 0)),
    );
}

fn migrate_minmax(block: &Block, ctx: &MigrationContext<'_>) -> Result<MigrationOutcome, Decline> {
    // A basicstats block with the same period and filters can take over
    let partner = ctx.find_sibling(Category::Aggregator, "basicstats", |other| {
        options_equal_except(other.options(), block.options(), &["stats"])
    });

    match partner {
        Some((id, partner)) => {
            let mut options = partner.options().clone();
            // without `stats` basicstats already emits min and max
            if let Some(stats) = partner.option("stats") {
                let mut stats = to_string_list("stats", stats)?;
                for required in STATS {
                    if !stats.iter().any(|s| s == required) {
                        stats.push(required.to_string());
                    }
                }
                options.insert("stats".to_string(), Value::from(stats));
            }
            merge_into(&mut options, block.options())?;
            let merged = Block::new(Category::Aggregator, "basicstats", options);
            Ok(Replacement::single(merged).absorb(id).into())
        }
        None => {
            let mut options = block.options().clone();
            set_option(&mut options, "stats", Value::from(STATS.to_vec()))?;
            Ok(replace(Block::new(Category::Aggregator, "basicstats", options)))
        }
    }
}
