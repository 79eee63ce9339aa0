mod migrator;
mod report;

pub use migrator::{MigrationResult, Migrator};
pub use report::{AppliedMigration, DeclinedMigration, MigrationReport};
