pub mod builder;

use std::fmt;
use std::str::FromStr;
use serde::Serialize;
use toml::{Table, Value};

/// Position of a block among the blocks of a document, in source order.
pub type BlockId = usize;

/// Plugin category, i.e. the top-level section a plugin block lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Input,
    Output,
    Processor,
    Aggregator,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Input,
        Category::Output,
        Category::Processor,
        Category::Aggregator,
    ];

    /// Section name used in documents (`inputs`, `outputs`, ...)
    pub fn section(&self) -> &'static str {
        match self {
            Category::Input => "inputs",
            Category::Output => "outputs",
            Category::Processor => "processors",
            Category::Aggregator => "aggregators",
        }
    }

    pub fn from_section(section: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.section() == section)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.section())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_section(s).ok_or_else(|| format!("unknown plugin category: {}", s))
    }
}

/// One plugin block.
///
/// Category and type name are fixed at construction. A migration never edits
/// a block; it produces new blocks that take its place.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    category: Category,
    type_name: String,
    options: Table,
    raw: Option<String>,
    line: usize,
    fragmented: bool,
}

impl Block {
    pub fn new(category: Category, type_name: impl Into<String>, options: Table) -> Self {
        Self {
            category,
            type_name: type_name.into(),
            options,
            raw: None,
            line: 0,
            fragmented: false,
        }
    }

    pub(crate) fn parsed(
        category: Category,
        type_name: String,
        options: Table,
        raw: String,
        line: usize,
    ) -> Self {
        Self {
            category,
            type_name,
            options,
            raw: Some(raw),
            line,
            fragmented: false,
        }
    }

    /// Records that the plugin also has settings outside of this block.
    /// `complete` holds everything the document defines for it, when known.
    pub(crate) fn mark_fragmented(&mut self, complete: Option<Table>) {
        if let Some(options) = complete {
            self.options = options;
        }
        self.fragmented = true;
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn options(&self) -> &Table {
        &self.options
    }

    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    /// Exact source text for blocks read from a document, `None` for blocks
    /// created by a migration.
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    /// 1-based line of the block header, 0 when the block was synthesized.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Part of the plugin is written elsewhere, e.g. a sub-table header placed
    /// after another plugin. Replacing the block would leave that part behind,
    /// so such blocks are never migrated.
    pub fn is_fragmented(&self) -> bool {
        self.fragmented
    }

    /// `section.type`, e.g. `outputs.wavefront`
    pub fn plugin_name(&self) -> String {
        format!("{}.{}", self.category.section(), self.type_name)
    }

    /// A new block of the same category carrying a copy of these options.
    pub fn successor(&self, type_name: impl Into<String>) -> Block {
        Block::new(self.category, type_name, self.options.clone())
    }
}

/// A span of the source document.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Content the engine never looks into: comments, blank lines, global
    /// tables such as `[agent]`.
    Text(String),
    Block(Block),
}

/// Blocks interleaved with opaque text, in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    segments: Vec<Segment>,
}

impl Document {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Block(b) => Some(b),
            Segment::Text(_) => None,
        })
    }

    pub fn block_count(&self) -> usize {
        self.blocks().count()
    }
}
