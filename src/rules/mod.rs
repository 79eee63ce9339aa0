pub mod helpers;
mod version;

pub use version::SchemaVersion;

use crate::document::{Block, BlockId, Category};
use std::collections::BTreeMap;
use std::fmt;

/// What a rule decided for one block
#[derive(Debug, Clone, PartialEq)]
pub enum MigrationOutcome {
    /// Block is already in its current shape
    Unchanged,
    /// Block matches the rule but converting it would need a guess.
    /// The block is kept verbatim and nothing is counted.
    NotApplicable(String),
    /// Block is superseded by the given successors
    Replaced(Replacement),
}

/// Successor blocks for one migrated block.
///
/// `absorbed` names other blocks of the document whose settings were folded
/// into the successors; they are dropped from the output.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Replacement {
    blocks: Vec<Block>,
    absorbed: Vec<BlockId>,
}

impl Replacement {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            blocks,
            absorbed: Vec::new(),
        }
    }

    pub fn single(block: Block) -> Self {
        Self::new(vec![block])
    }

    pub fn absorb(mut self, id: BlockId) -> Self {
        if !self.absorbed.contains(&id) {
            self.absorbed.push(id);
        }
        self
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn absorbed(&self) -> &[BlockId] {
        &self.absorbed
    }

    pub fn into_parts(self) -> (Vec<Block>, Vec<BlockId>) {
        (self.blocks, self.absorbed)
    }
}

impl From<Replacement> for MigrationOutcome {
    fn from(replacement: Replacement) -> Self {
        MigrationOutcome::Replaced(replacement)
    }
}

/// A rule's refusal to convert a block. Returned through `?` from the
/// coercion helpers and treated exactly like [`MigrationOutcome::NotApplicable`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct Decline {
    reason: String,
}

impl Decline {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Read-only view handed to a rule together with the block it migrates
pub struct MigrationContext<'a> {
    target: SchemaVersion,
    blocks: &'a [&'a Block],
    claimed: &'a [bool],
    current: BlockId,
}

impl<'a> MigrationContext<'a> {
    pub fn new(
        target: SchemaVersion,
        blocks: &'a [&'a Block],
        claimed: &'a [bool],
        current: BlockId,
    ) -> Self {
        Self {
            target,
            blocks,
            claimed,
            current,
        }
    }

    pub fn target_version(&self) -> SchemaVersion {
        self.target
    }

    pub fn current_id(&self) -> BlockId {
        self.current
    }

    /// Every block of the document in source order
    pub fn blocks(&self) -> impl Iterator<Item = (BlockId, &'a Block)> + '_ {
        self.blocks.iter().copied().enumerate()
    }

    /// First other block of the given plugin type that has not been replaced
    /// or absorbed yet and satisfies `predicate`.
    pub fn find_sibling(
        &self,
        category: Category,
        type_name: &str,
        predicate: impl Fn(&Block) -> bool,
    ) -> Option<(BlockId, &'a Block)> {
        self.blocks().find(|(id, block)| {
            *id != self.current
                && !self.claimed.get(*id).copied().unwrap_or(false)
                && block.category() == category
                && block.type_name() == type_name
                && predicate(*block)
        })
    }
}

pub type MigrationFn = fn(&Block, &MigrationContext<'_>) -> Result<MigrationOutcome, Decline>;

#[derive(Clone, Copy)]
pub struct Rule {
    name: &'static str,
    since: Option<SchemaVersion>,
    apply: MigrationFn,
}

impl Rule {
    pub const fn new(name: &'static str, apply: MigrationFn) -> Self {
        Self {
            name,
            since: None,
            apply,
        }
    }

    /// Qualifies the rule with the schema version that introduced the new
    /// shape. Migrations towards older targets skip it.
    pub const fn since(mut self, version: SchemaVersion) -> Self {
        self.since = Some(version);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn since_version(&self) -> Option<SchemaVersion> {
        self.since
    }

    pub fn applies_to(&self, target: SchemaVersion) -> bool {
        self.since.is_none_or(|since| since <= target)
    }

    pub fn apply(&self, block: &Block, ctx: &MigrationContext<'_>) -> MigrationOutcome {
        match (self.apply)(block, ctx) {
            Ok(outcome) => outcome,
            Err(decline) => MigrationOutcome::NotApplicable(decline.reason),
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("since", &self.since)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleKey {
    pub category: Category,
    pub type_name: String,
}

impl RuleKey {
    pub fn new(category: Category, type_name: &str) -> Self {
        Self {
            category,
            type_name: type_name.to_string(),
        }
    }
}

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.category.section(), self.type_name)
    }
}

/// Rules by plugin, in registration order.
///
/// Filled once at startup by the migration modules, then shared read-only.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    rules: BTreeMap<RuleKey, Vec<Rule>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            rules: BTreeMap::new(),
        }
    }

    /// Registry with every migration module shipped in this crate
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        crate::migrations::register_builtin(&mut registry);
        registry
    }

    /// # Panics
    /// When a rule of the same name is already registered for the plugin.
    pub fn register(&mut self, category: Category, type_name: &str, rule: Rule) {
        let key = RuleKey::new(category, type_name);
        let candidates = self.rules.entry(key.clone()).or_default();
        if candidates.iter().any(|r| r.name == rule.name) {
            panic!("migration {} registered twice for {}", rule.name, key);
        }
        candidates.push(rule);
    }

    pub fn lookup(&self, category: Category, type_name: &str) -> &[Rule] {
        self.rules
            .get(&RuleKey::new(category, type_name))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Rules for the plugin that apply when migrating towards `target`
    pub fn candidates(
        &self,
        category: Category,
        type_name: &str,
        target: SchemaVersion,
    ) -> impl Iterator<Item = &Rule> {
        self.lookup(category, type_name)
            .iter()
            .filter(move |r| r.applies_to(target))
    }

    /// Drops rules before the registry is shared, e.g. rules disabled in the
    /// settings file.
    pub fn retain(&mut self, mut keep: impl FnMut(&RuleKey, &Rule) -> bool) {
        for (key, rules) in self.rules.iter_mut() {
            rules.retain(|r| keep(key, r));
        }
        self.rules.retain(|_, rules| !rules.is_empty());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RuleKey, &Rule)> {
        self.rules
            .iter()
            .flat_map(|(key, rules)| rules.iter().map(move |r| (key, r)))
    }

    pub fn len(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
