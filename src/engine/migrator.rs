use crate::codec::{DocumentCodec, TomlCodec};
use crate::document::{Block, BlockId, Document, Segment};
use crate::engine::report::{AppliedMigration, DeclinedMigration, MigrationReport};
use crate::error::MigrateError;
use crate::rules::{MigrationContext, MigrationOutcome, Registry, SchemaVersion};
use std::sync::Arc;
use tracing::{debug, info};

/// Output of [`Migrator::migrate`]
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationResult {
    pub output: Vec<u8>,
    pub applied: u64,
    pub report: MigrationReport,
}

/// Runs the registered rules over whole documents.
///
/// Cheap to clone; registry and codec are shared.
#[derive(Clone)]
pub struct Migrator {
    registry: Arc<Registry>,
    codec: Arc<dyn DocumentCodec>,
    target: SchemaVersion,
}

struct Applied {
    rule: &'static str,
    successors: Vec<Block>,
    absorbed: Vec<BlockId>,
}

impl Migrator {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            codec: Arc::new(TomlCodec::new()),
            target: SchemaVersion::LATEST,
        }
    }

    /// Only rules introduced at or before `target` are applied.
    pub fn with_target_version(mut self, target: SchemaVersion) -> Self {
        self.target = target;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn codec(&self) -> &dyn DocumentCodec {
        self.codec.as_ref()
    }

    pub fn target_version(&self) -> SchemaVersion {
        self.target
    }

    /// Parses `input`, migrates every block and serializes the result.
    /// When nothing applies the input bytes are returned untouched.
    pub fn migrate(&self, input: &[u8]) -> Result<MigrationResult, MigrateError> {
        let document = self.codec.parse(input)?;
        let (document, report) = self.migrate_document(document);

        let applied = report.applied_count();
        let output = if applied == 0 {
            input.to_vec()
        } else {
            self.codec.serialize(&document)?
        };

        Ok(MigrationResult {
            output,
            applied,
            report,
        })
    }

    pub fn migrate_document(&self, document: Document) -> (Document, MigrationReport) {
        let segments = document.into_segments();
        let blocks: Vec<&Block> = segments
            .iter()
            .filter_map(|s| match s {
                Segment::Block(b) => Some(b),
                Segment::Text(_) => None,
            })
            .collect();

        let mut report = MigrationReport::default();
        let mut claimed = vec![false; blocks.len()];
        let mut successors: Vec<Option<Vec<Block>>> = vec![None; blocks.len()];

        for (id, block) in blocks.iter().copied().enumerate() {
            if claimed[id] {
                continue;
            }

            let Some(applied) = self.first_replacement(&blocks, &claimed, id, &mut report) else {
                continue;
            };

            info!(
                rule = applied.rule,
                plugin = %block.plugin_name(),
                line = block.line(),
                successors = applied.successors.len(),
                "migration applied"
            );
            report.applied.push(AppliedMigration {
                rule: applied.rule.to_string(),
                plugin: block.plugin_name(),
                line: block.line(),
                successors: applied.successors.iter().map(Block::plugin_name).collect(),
                absorbed: applied
                    .absorbed
                    .iter()
                    .map(|&a| blocks[a].plugin_name())
                    .collect(),
            });

            claimed[id] = true;
            successors[id] = Some(applied.successors);
            for a in applied.absorbed {
                claimed[a] = true;
                successors[a] = Some(Vec::new());
            }
        }

        drop(blocks);

        // Rebuild in source order, successors take the place of their block
        let mut out = Vec::with_capacity(segments.len());
        let mut successors = successors.into_iter();
        let mut removed = false;
        for segment in segments {
            match segment {
                Segment::Block(block) => match successors.next().flatten() {
                    Some(replacement) => {
                        removed = replacement.is_empty();
                        out.extend(replacement.into_iter().map(Segment::Block));
                    }
                    None => {
                        removed = false;
                        out.push(Segment::Block(block));
                    }
                },
                Segment::Text(text) => {
                    // no blank lines left over at the top or doubled up
                    let text = if removed && starts_blank(&out) {
                        strip_leading_blank_lines(&text)
                    } else {
                        text
                    };
                    removed = false;
                    if !text.is_empty() {
                        out.push(Segment::Text(text));
                    }
                }
            }
        }

        (Document::new(out), report)
    }

    /// Tries the candidate rules of one block in registration order and
    /// stops at the first replacement.
    fn first_replacement(
        &self,
        blocks: &[&Block],
        claimed: &[bool],
        id: BlockId,
        report: &mut MigrationReport,
    ) -> Option<Applied> {
        let block = blocks[id];
        let ctx = MigrationContext::new(self.target, blocks, claimed, id);

        for rule in self
            .registry
            .candidates(block.category(), block.type_name(), self.target)
        {
            let outcome = if block.is_fragmented() {
                MigrationOutcome::NotApplicable(
                    "plugin settings are spread over the document".to_string(),
                )
            } else {
                rule.apply(block, &ctx)
            };
            let reason = match outcome {
                MigrationOutcome::Unchanged => continue,
                MigrationOutcome::NotApplicable(reason) => reason,
                MigrationOutcome::Replaced(replacement) => {
                    let (successors, absorbed) = replacement.into_parts();
                    // only whole blocks nobody has replaced or absorbed yet
                    let conflict = absorbed.iter().copied().find(|&a| {
                        a == id
                            || !claimed.get(a).is_some_and(|c| !c)
                            || blocks[a].is_fragmented()
                    });
                    match conflict {
                        None => {
                            return Some(Applied {
                                rule: rule.name(),
                                successors,
                                absorbed,
                            });
                        }
                        Some(a) => format!("cannot absorb block #{}", a),
                    }
                }
            };

            debug!(
                rule = rule.name(),
                plugin = %block.plugin_name(),
                line = block.line(),
                reason = reason.as_str(),
                "migration not applicable"
            );
            report.declined.push(DeclinedMigration {
                rule: rule.name().to_string(),
                plugin: block.plugin_name(),
                line: block.line(),
                reason,
            });
        }

        None
    }
}

/// True when text following `out` would start on a fresh, blank-separated line.
fn starts_blank(out: &[Segment]) -> bool {
    match out.last() {
        None => true,
        Some(Segment::Text(text)) => text.ends_with("\n\n") || text.ends_with("\n\r\n"),
        Some(Segment::Block(_)) => false,
    }
}

fn strip_leading_blank_lines(text: &str) -> String {
    let mut rest = text;
    while let Some(end) = rest.find('\n') {
        if !rest[..end].trim().is_empty() {
            break;
        }
        rest = &rest[end + 1..];
    }
    rest.to_string()
}
