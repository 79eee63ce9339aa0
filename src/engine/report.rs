use serde::Serialize;

/// Record of one migration call, for logs and `--json` output
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MigrationReport {
    pub applied: Vec<AppliedMigration>,
    pub declined: Vec<DeclinedMigration>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedMigration {
    pub rule: String,
    /// `section.type` of the migrated block
    pub plugin: String,
    pub line: usize,
    pub successors: Vec<String>,
    pub absorbed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeclinedMigration {
    pub rule: String,
    pub plugin: String,
    pub line: usize,
    pub reason: String,
}

impl MigrationReport {
    pub fn applied_count(&self) -> u64 {
        self.applied.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.applied.is_empty() && self.declined.is_empty()
    }
}
