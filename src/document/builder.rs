use crate::document::{Block, Category, Document, Segment};
use toml::{Table, Value};

pub struct BlockBuilder {
    category: Category,
    type_name: String,
    options: Table,
}

impl BlockBuilder {
    pub fn new(category: Category, type_name: &str) -> Self {
        Self {
            category,
            type_name: type_name.to_string(),
            options: Table::new(),
        }
    }

    pub fn option(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.options.insert(key.to_string(), value.into());
        self
    }

    /// Appends every entry of `options`, keeping their order.
    pub fn options(mut self, options: Table) -> Self {
        for (k, v) in options {
            self.options.insert(k, v);
        }
        self
    }

    pub fn build(self) -> Block {
        Block::new(self.category, self.type_name, self.options)
    }
}

pub struct DocumentBuilder {
    segments: Vec<Segment>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    pub fn text(mut self, text: &str) -> Self {
        self.segments.push(Segment::Text(text.to_string()));
        self
    }

    pub fn block(mut self, block: Block) -> Self {
        self.segments.push(Segment::Block(block));
        self
    }

    /// Starts a block whose options are filled in on the returned builder.
    pub fn plugin(self, category: Category, type_name: &str) -> PluginBuilder {
        PluginBuilder {
            document_builder: self,
            block: BlockBuilder::new(category, type_name),
        }
    }

    pub fn build(self) -> Document {
        Document::new(self.segments)
    }
}

pub struct PluginBuilder {
    document_builder: DocumentBuilder,
    block: BlockBuilder,
}

impl PluginBuilder {
    pub fn option(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.block = self.block.option(key, value);
        self
    }

    pub fn build(self) -> DocumentBuilder {
        self.document_builder.block(self.block.build())
    }
}
