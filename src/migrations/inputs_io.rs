use crate::document::{Block, Category};
use crate::rules::helpers::replace;
use crate::rules::{Decline, MigrationContext, MigrationOutcome, Registry, Rule, SchemaVersion};

pub fn register(registry: &mut Registry) {
    registry.register(
        Category::Input,
        "io",
        Rule::new("rename_to_diskio", migrate_io).since(SchemaVersion::new(0, 10, 0)),
    );
}

fn migrate_io(block: &Block, _ctx: &MigrationContext<'_>) -> Result<MigrationOutcome, Decline> {
    Ok(replace(block.successor("diskio")))
}
