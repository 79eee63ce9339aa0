pub mod codec;
pub mod document;
pub mod engine;
pub mod error;
pub mod loader;
pub mod migrations;
pub mod plugins;
pub mod rules;
pub mod settings;
pub mod verify;

pub use engine::{MigrationReport, MigrationResult, Migrator};
pub use error::{MigrateError, PluginError, VerifyError};
pub use rules::Registry;

use std::sync::{Arc, OnceLock};

/// Migrates `input` with the built-in rules towards the newest schema.
/// Returns the new document and the number of applied migrations.
pub fn apply_migrations(input: &[u8]) -> Result<(Vec<u8>, u64), MigrateError> {
    static MIGRATOR: OnceLock<Migrator> = OnceLock::new();
    let migrator = MIGRATOR.get_or_init(|| Migrator::new(Arc::new(Registry::with_builtin())));

    let result = migrator.migrate(input)?;
    Ok((result.output, result.applied))
}
