//! Conversion between raw configuration bytes and [`Document`]s.
//!
//! The engine only talks to [`DocumentCodec`]; [`TomlCodec`] is the
//! implementation for the agent's TOML configuration files.

mod render;
mod scanner;

use crate::document::{Block, Category, Document, Segment};
use crate::error::MigrateError;
use scanner::{Header, Line, LineKind};
use std::collections::HashMap;
use toml::{Table, Value};
use tracing::warn;

pub trait DocumentCodec: Send + Sync {
    fn parse(&self, input: &[u8]) -> Result<Document, MigrateError>;

    /// Must reproduce parsed blocks and text spans byte for byte.
    fn serialize(&self, document: &Document) -> Result<Vec<u8>, MigrateError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TomlCodec;

impl TomlCodec {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentCodec for TomlCodec {
    fn parse(&self, input: &[u8]) -> Result<Document, MigrateError> {
        let text =
            std::str::from_utf8(input).map_err(|e| MigrateError::InvalidUtf8(e.to_string()))?;

        // 1. The document as a whole has to be valid
        let whole: Table = toml::from_str(text).map_err(|e| parse_error(text, 0, &e))?;

        // 2. Split into blocks and opaque text
        let mut splitter = Splitter::new();
        for line in scanner::scan(text) {
            splitter.push(line)?;
        }
        let mut segments = splitter.finish()?;

        // 3. Check the blocks against what the whole document defines
        mark_fragments(&whole, &mut segments);
        Ok(Document::new(segments))
    }

    fn serialize(&self, document: &Document) -> Result<Vec<u8>, MigrateError> {
        let eol = line_ending(document);
        let mut out = String::new();
        let mut after_synthesized = false;

        for segment in document.segments() {
            match segment {
                Segment::Text(text) => {
                    out.push_str(text);
                    after_synthesized = false;
                }
                Segment::Block(block) => match block.raw() {
                    Some(raw) => {
                        out.push_str(raw);
                        after_synthesized = false;
                    }
                    None => {
                        if after_synthesized || (!out.is_empty() && !out.ends_with('\n')) {
                            out.push_str(eol);
                        }
                        out.push_str(&render::render_block(block, eol)?);
                        after_synthesized = true;
                    }
                },
            }
        }

        Ok(out.into_bytes())
    }
}

fn parse_error(text: &str, first_line: usize, err: &toml::de::Error) -> MigrateError {
    let line = err
        .span()
        .map(|span| text[..span.start.min(text.len())].matches('\n').count() + 1)
        .unwrap_or(1);
    MigrateError::Parse {
        line: first_line + line,
        message: err.message().trim().to_string(),
    }
}

/// Line terminator of the first source line, `\n` when there is none.
fn line_ending(document: &Document) -> &'static str {
    let crlf = document
        .segments()
        .iter()
        .filter_map(|s| match s {
            Segment::Text(text) => Some(text.as_str()),
            Segment::Block(block) => block.raw(),
        })
        .find_map(|text| text.find('\n').map(|end| text[..end].ends_with('\r')));

    if crlf == Some(true) { "\r\n" } else { "\n" }
}

/// Every table the document defines for `section.type`, in source order.
fn instances<'a>(whole: &'a Table, category: Category, type_name: &str) -> Vec<&'a Table> {
    let defined = whole
        .get(category.section())
        .and_then(Value::as_table)
        .and_then(|t| t.get(type_name));

    match defined {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_table).collect(),
        Some(Value::Table(t)) => vec![t],
        _ => Vec::new(),
    }
}

/// A plugin can be continued further down the file, by a sub-table header
/// after another block or by keys under its bare section. Its block then
/// differs from the plugin the whole document defines and is marked.
fn mark_fragments(whole: &Table, segments: &mut [Segment]) {
    let mut counts: HashMap<(Category, String), usize> = HashMap::new();
    for segment in segments.iter() {
        if let Segment::Block(block) = segment {
            *counts
                .entry((block.category(), block.type_name().to_string()))
                .or_default() += 1;
        }
    }

    let mut seen: HashMap<(Category, String), usize> = HashMap::new();
    for segment in segments.iter_mut() {
        let Segment::Block(block) = segment else {
            continue;
        };
        let key = (block.category(), block.type_name().to_string());
        let defined = instances(whole, block.category(), block.type_name());
        let total = counts.get(&key).copied().unwrap_or(0);
        let position = seen.entry(key).or_default();
        let index = *position;
        *position += 1;

        if defined.len() != total {
            warn!(
                plugin = %block.plugin_name(),
                line = block.line(),
                "plugin is also defined without a table header, leaving it as is"
            );
            block.mark_fragmented(None);
        } else if defined.get(index).is_some_and(|t| *t != block.options()) {
            warn!(
                plugin = %block.plugin_name(),
                line = block.line(),
                "plugin settings are spread over the document, leaving it as is"
            );
            block.mark_fragmented(defined.get(index).map(|t| (*t).clone()));
        }
    }

    // plugins that have no block at all, e.g. `io = [{}]` under `[inputs]`
    for category in Category::ALL {
        let Some(section) = whole.get(category.section()).and_then(Value::as_table) else {
            continue;
        };
        for type_name in section.keys() {
            let key = (category, type_name.clone());
            if !counts.contains_key(&key) {
                warn!(
                    plugin = %format!("{}.{}", category.section(), type_name),
                    "plugin is not written under its own table header and is not migrated"
                );
            }
        }
    }
}

fn plugin_header(header: &Header) -> Option<(Category, String)> {
    match header.path.as_slice() {
        [section, type_name] => Category::from_section(section).map(|c| (c, type_name.clone())),
        _ => None,
    }
}

struct Draft {
    category: Category,
    type_name: String,
    line: usize,
    text: String,
}

impl Draft {
    /// Sub-tables such as `[inputs.http.headers]` stay with their plugin.
    fn owns(&self, header: &Header) -> bool {
        header.path.len() > 2
            && header.path[0] == self.category.section()
            && header.path[1] == self.type_name
    }

    fn finish(self) -> Result<Block, MigrateError> {
        let table: Table =
            toml::from_str(&self.text).map_err(|e| parse_error(&self.text, self.line - 1, &e))?;

        let options = table
            .get(self.category.section())
            .and_then(Value::as_table)
            .and_then(|t| t.get(&self.type_name))
            .and_then(|v| match v {
                Value::Array(items) => items.last().and_then(Value::as_table),
                Value::Table(t) => Some(t),
                _ => None,
            })
            .cloned()
            .ok_or_else(|| MigrateError::Parse {
                line: self.line,
                message: format!(
                    "plugin {}.{} is not a table",
                    self.category.section(),
                    self.type_name
                ),
            })?;

        Ok(Block::parsed(
            self.category,
            self.type_name,
            options,
            self.text,
            self.line,
        ))
    }
}

struct Splitter {
    segments: Vec<Segment>,
    text: String,
    block: Option<Draft>,
    // blank and comment lines seen inside a block, kept aside until we know
    // whether more block content follows
    trivia: String,
}

impl Splitter {
    fn new() -> Self {
        Self {
            segments: Vec::new(),
            text: String::new(),
            block: None,
            trivia: String::new(),
        }
    }

    fn push(&mut self, line: Line<'_>) -> Result<(), MigrateError> {
        match &line.kind {
            LineKind::Header(header) => {
                if let Some((category, type_name)) = plugin_header(header) {
                    self.close_block()?;
                    self.flush_text();
                    self.block = Some(Draft {
                        category,
                        type_name,
                        line: line.number,
                        text: line.text.to_string(),
                    });
                } else if self.block.as_ref().is_some_and(|d| d.owns(header)) {
                    self.extend_block(line.text);
                } else {
                    self.close_block()?;
                    self.text.push_str(line.text);
                }
            }
            LineKind::Blank | LineKind::Comment => {
                if self.block.is_some() {
                    self.trivia.push_str(line.text);
                } else {
                    self.text.push_str(line.text);
                }
            }
            LineKind::Content => {
                if self.block.is_some() {
                    self.extend_block(line.text);
                } else {
                    self.text.push_str(line.text);
                }
            }
        }
        Ok(())
    }

    fn extend_block(&mut self, text: &str) {
        if let Some(draft) = &mut self.block {
            draft.text.push_str(&std::mem::take(&mut self.trivia));
            draft.text.push_str(text);
        }
    }

    fn close_block(&mut self) -> Result<(), MigrateError> {
        if let Some(draft) = self.block.take() {
            self.segments.push(Segment::Block(draft.finish()?));
        }
        let trivia = std::mem::take(&mut self.trivia);
        self.text.push_str(&trivia);
        Ok(())
    }

    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            self.segments.push(Segment::Text(std::mem::take(&mut self.text)));
        }
    }

    fn finish(mut self) -> Result<Vec<Segment>, MigrateError> {
        self.close_block()?;
        self.flush_text();
        Ok(self.segments)
    }
}
