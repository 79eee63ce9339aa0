//! End-to-end acceptance: migrate a document, load the result the way the
//! agent would and compare it with a hand-written expectation.

use crate::engine::{MigrationReport, Migrator};
use crate::error::VerifyError;
use crate::plugins::{Plugin, PluginRegistry};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

pub const INPUT_FILE: &str = "telegraf.conf";
pub const EXPECTED_FILE: &str = "expected.conf";

#[derive(Debug, Clone)]
pub struct CaseReport {
    pub applied: u64,
    /// Plugins in the expected document
    pub plugins: usize,
    pub report: MigrationReport,
}

/// Result of one `<case>/` directory
#[derive(Debug)]
pub struct CaseResult {
    pub name: String,
    pub outcome: Result<CaseReport, VerifyError>,
}

impl CaseResult {
    pub fn passed(&self) -> bool {
        self.outcome.is_ok()
    }
}

pub struct Verifier<'a> {
    migrator: &'a Migrator,
    plugins: &'a PluginRegistry,
}

impl<'a> Verifier<'a> {
    pub fn new(migrator: &'a Migrator, plugins: &'a PluginRegistry) -> Self {
        Self { migrator, plugins }
    }

    /// Migrating `input` has to apply at least one rule and load into the
    /// same plugins as `expected`, in any order.
    pub fn verify_case(&self, input: &[u8], expected: &[u8]) -> Result<CaseReport, VerifyError> {
        // 1. Expected document
        let expected = self.plugins.load_document(expected)?;
        if expected.is_empty() {
            return Err(VerifyError::EmptyExpected);
        }

        // 2. Migrate
        let result = self.migrator.migrate(input)?;
        if result.applied == 0 {
            return Err(VerifyError::NothingApplied);
        }

        // 3. Reload and compare
        let actual = self.plugins.load_document(&result.output)?;
        compare(&expected, &actual)?;

        Ok(CaseReport {
            applied: result.applied,
            plugins: expected.len(),
            report: result.report,
        })
    }

    /// A document without outdated plugins must come back byte for byte.
    pub fn verify_noop(&self, input: &[u8]) -> Result<MigrationReport, VerifyError> {
        let result = self.migrator.migrate(input)?;
        if result.applied != 0 || result.output != input {
            return Err(VerifyError::Changed {
                applied: result.applied,
            });
        }
        Ok(result.report)
    }

    /// Runs every `<root>/<case>/` directory holding both case files, sorted
    /// by name. Directories without them are skipped.
    pub fn verify_dir(&self, root: &Path) -> Result<Vec<CaseResult>, VerifyError> {
        let mut cases = Vec::new();
        for entry in fs::read_dir(root)? {
            let path = entry?.path();
            if path.join(INPUT_FILE).is_file() && path.join(EXPECTED_FILE).is_file() {
                cases.push(path);
            } else {
                debug!(path = %path.display(), "not a test case, skipping");
            }
        }
        cases.sort();

        let mut results = Vec::with_capacity(cases.len());
        for case in cases {
            let name = case
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let outcome = self.verify_path(&case);
            info!(case = %name, passed = outcome.is_ok(), "test case verified");
            results.push(CaseResult { name, outcome });
        }
        Ok(results)
    }

    fn verify_path(&self, case: &Path) -> Result<CaseReport, VerifyError> {
        let input = fs::read(case.join(INPUT_FILE))?;
        let expected = fs::read(case.join(EXPECTED_FILE))?;
        self.verify_case(&input, &expected)
    }
}

/// Identities as multisets: sort both sides and walk them together.
fn compare(expected: &[Plugin], actual: &[Plugin]) -> Result<(), VerifyError> {
    let mut expected: Vec<&Plugin> = expected.iter().collect();
    let mut actual: Vec<&Plugin> = actual.iter().collect();
    expected.sort_by(|a, b| a.id.cmp(&b.id));
    actual.sort_by(|a, b| a.id.cmp(&b.id));

    let mut missing = Vec::new();
    let mut unexpected = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < expected.len() || j < actual.len() {
        match (expected.get(i), actual.get(j)) {
            (Some(e), Some(a)) if e.id == a.id => {
                i += 1;
                j += 1;
            }
            (Some(e), Some(a)) if e.id < a.id => {
                missing.push(e.describe());
                i += 1;
            }
            (Some(_), Some(a)) => {
                unexpected.push(a.describe());
                j += 1;
            }
            (Some(e), None) => {
                missing.push(e.describe());
                i += 1;
            }
            (None, Some(a)) => {
                unexpected.push(a.describe());
                j += 1;
            }
            (None, None) => break,
        }
    }

    if missing.is_empty() && unexpected.is_empty() {
        Ok(())
    } else {
        Err(VerifyError::Mismatch {
            missing,
            unexpected,
        })
    }
}
