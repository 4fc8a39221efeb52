//! Rich-text document model
//!
//! An in-memory tree of blocks (paragraphs, headings, quotes, lists) and
//! inline text runs, serialized to and from the JSON representation notes
//! are stored as. The serialized form is what list views project to plain
//! text and what the store persists.
//!
//! Invariant: the root always holds at least one block. A document with no
//! visible content is represented by a single empty paragraph, never by an
//! empty root, so the editor always has a block to put the caret in.
//!
//! Fields this crate does not define (`version`, `direction`, `indent`,
//! `mode`, ...) are captured in per-node `extra` maps and written back out
//! unchanged, so foreign documents round-trip losslessly.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::style::StyleList;

/// Current serialized schema version.
pub const CURRENT_SCHEMA_VERSION: u64 = 1;

/// Errors raised when a stored document cannot be rebuilt into a tree.
///
/// Callers that load user content recover with [`Document::empty`] rather
/// than surfacing this to the user.
#[derive(Error, Debug)]
pub enum MalformedDocumentError {
    #[error("content is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("serialized document has no root node")]
    MissingRoot,

    #[error("root node is malformed: {0}")]
    InvalidTree(#[source] serde_json::Error),
}

/// Inline format toggles carried by a text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineFormat {
    Bold,
    Italic,
    Strikethrough,
    Underline,
}

impl InlineFormat {
    const fn bit(self) -> u32 {
        match self {
            InlineFormat::Bold => 1,
            InlineFormat::Italic => 1 << 1,
            InlineFormat::Strikethrough => 1 << 2,
            InlineFormat::Underline => 1 << 3,
        }
    }

    pub const ALL: [InlineFormat; 4] = [
        InlineFormat::Bold,
        InlineFormat::Italic,
        InlineFormat::Strikethrough,
        InlineFormat::Underline,
    ];
}

/// Bitmask of inline formats, stored on the wire as an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormatFlags(u32);

impl FormatFlags {
    pub const fn none() -> Self {
        Self(0)
    }

    pub fn has(self, flag: InlineFormat) -> bool {
        self.0 & flag.bit() != 0
    }

    pub fn set(&mut self, flag: InlineFormat, on: bool) {
        if on {
            self.0 |= flag.bit();
        } else {
            self.0 &= !flag.bit();
        }
    }

    pub fn with(mut self, flag: InlineFormat) -> Self {
        self.set(flag, true);
        self
    }

    pub fn is_plain(self) -> bool {
        self.0 == 0
    }

    pub fn bits(self) -> u32 {
        self.0
    }
}

/// Block alignment, stored as the element `format` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Alignment {
    #[default]
    #[serde(rename = "")]
    None,
    #[serde(rename = "left")]
    Left,
    #[serde(rename = "center")]
    Center,
    #[serde(rename = "right")]
    Right,
    #[serde(rename = "justify")]
    Justify,
}

/// Heading depth, stored as the `tag` field (`h1`..`h3`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeadingLevel {
    #[serde(rename = "h1")]
    H1,
    #[serde(rename = "h2")]
    H2,
    #[serde(rename = "h3")]
    H3,
}

impl HeadingLevel {
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(HeadingLevel::H1),
            2 => Some(HeadingLevel::H2),
            3 => Some(HeadingLevel::H3),
            _ => None,
        }
    }

    pub fn level(self) -> u8 {
        match self {
            HeadingLevel::H1 => 1,
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
        }
    }
}

/// List ordering, stored as the `listType` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListOrdering {
    #[serde(rename = "number")]
    Ordered,
    #[serde(rename = "bullet")]
    Unordered,
}

/// A block container: paragraph, quote, or list item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BlockNode {
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(default)]
    pub format: Alignment,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BlockNode {
    pub fn with_children(children: Vec<Node>) -> Self {
        Self {
            children,
            ..Default::default()
        }
    }
}

/// A heading block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadingNode {
    pub tag: HeadingLevel,
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(default)]
    pub format: Alignment,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An ordered or unordered list; children are list items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListNode {
    #[serde(rename = "listType")]
    pub ordering: ListOrdering,
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An inline text run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TextNode {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub format: FormatFlags,
    #[serde(default)]
    pub style: StyleList,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TextNode {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// One element of the document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Paragraph(BlockNode),
    Heading(HeadingNode),
    Quote(BlockNode),
    List(ListNode),
    ListItem(BlockNode),
    Text(TextNode),
}

/// Discriminant for [`Node`], used by visitors keyed on node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Paragraph,
    Heading,
    Quote,
    List,
    ListItem,
    Text,
}

impl Node {
    pub fn paragraph(children: Vec<Node>) -> Self {
        Node::Paragraph(BlockNode::with_children(children))
    }

    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(TextNode::new(text))
    }

    pub fn empty_paragraph() -> Self {
        Node::paragraph(vec![Node::text("")])
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Paragraph(_) => NodeKind::Paragraph,
            Node::Heading(_) => NodeKind::Heading,
            Node::Quote(_) => NodeKind::Quote,
            Node::List(_) => NodeKind::List,
            Node::ListItem(_) => NodeKind::ListItem,
            Node::Text(_) => NodeKind::Text,
        }
    }

    /// Child sequence for container nodes, `None` for text runs.
    pub fn children(&self) -> Option<&[Node]> {
        match self {
            Node::Paragraph(b) | Node::Quote(b) | Node::ListItem(b) => Some(&b.children),
            Node::Heading(h) => Some(&h.children),
            Node::List(l) => Some(&l.children),
            Node::Text(_) => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Paragraph(b) | Node::Quote(b) | Node::ListItem(b) => Some(&mut b.children),
            Node::Heading(h) => Some(&mut h.children),
            Node::List(l) => Some(&mut l.children),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextNode> {
        match self {
            Node::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextNode> {
        match self {
            Node::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Alignment attribute for block containers that carry one.
    pub fn alignment(&self) -> Option<Alignment> {
        match self {
            Node::Paragraph(b) | Node::Quote(b) | Node::ListItem(b) => Some(b.format),
            Node::Heading(h) => Some(h.format),
            Node::List(_) | Node::Text(_) => None,
        }
    }

    pub fn set_alignment(&mut self, alignment: Alignment) {
        match self {
            Node::Paragraph(b) | Node::Quote(b) | Node::ListItem(b) => b.format = alignment,
            Node::Heading(h) => h.format = alignment,
            Node::List(_) | Node::Text(_) => {}
        }
    }

    /// Concatenated text of this subtree.
    pub fn text_content(&self) -> String {
        match self {
            Node::Text(t) => t.text.clone(),
            _ => {
                let mut out = String::new();
                if let Some(children) = self.children() {
                    for child in children {
                        out.push_str(&child.text_content());
                    }
                }
                out
            }
        }
    }
}

/// The root block container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RootNode {
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A note's rich-text content.
///
/// Constructed from stored JSON with [`Document::from_json`] and dumped
/// back with [`Document::to_json_string`]; both directions are pure
/// structural transforms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub root: RootNode,
    #[serde(rename = "schemaVersion", default = "default_schema_version")]
    pub schema_version: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_schema_version() -> u64 {
    CURRENT_SCHEMA_VERSION
}

impl Default for Document {
    fn default() -> Self {
        Self::empty()
    }
}

impl Document {
    /// The canonical empty document: one paragraph holding one empty run.
    pub fn empty() -> Self {
        Self {
            root: RootNode {
                children: vec![Node::empty_paragraph()],
                extra: Map::new(),
            },
            schema_version: CURRENT_SCHEMA_VERSION,
            extra: Map::new(),
        }
    }

    /// Rebuild a document from its serialized JSON form.
    pub fn from_json(content: &str) -> Result<Self, MalformedDocumentError> {
        let value: Value =
            serde_json::from_str(content).map_err(MalformedDocumentError::Parse)?;
        if value.get("root").is_none() {
            return Err(MalformedDocumentError::MissingRoot);
        }
        let mut document: Document =
            serde_json::from_value(value).map_err(MalformedDocumentError::InvalidTree)?;
        document.ensure_invariant();
        Ok(document)
    }

    /// Rebuild a document, falling back to the canonical empty document on
    /// absent, blank, or malformed content. Never fails; the editor must
    /// always come up with something editable.
    pub fn from_json_or_empty(content: Option<&str>) -> Self {
        let Some(content) = content else {
            return Self::empty();
        };
        if content.trim().is_empty() {
            return Self::empty();
        }
        match Self::from_json(content) {
            Ok(document) => document,
            Err(err) => {
                tracing::debug!("recovering from malformed note content: {err}");
                Self::empty()
            }
        }
    }

    /// Serialize to a JSON value. Pure structural dump.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Serialize to the JSON string the store persists.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// True iff the only content is a single paragraph with no visible text.
    pub fn is_empty(&self) -> bool {
        match self.root.children.as_slice() {
            [Node::Paragraph(block)] => block
                .children
                .iter()
                .all(|child| matches!(child, Node::Text(t) if t.text.is_empty())),
            _ => false,
        }
    }

    /// Top-level blocks under the root.
    pub fn blocks(&self) -> &[Node] {
        &self.root.children
    }

    pub fn blocks_mut(&mut self) -> &mut Vec<Node> {
        &mut self.root.children
    }

    pub fn insert_block(&mut self, index: usize, block: Node) {
        let index = index.min(self.root.children.len());
        self.root.children.insert(index, block);
    }

    /// Remove a top-level block, preserving the ≥1 block invariant: taking
    /// the last block leaves one empty paragraph behind.
    pub fn remove_block(&mut self, index: usize) -> Option<Node> {
        if index >= self.root.children.len() {
            return None;
        }
        let removed = self.root.children.remove(index);
        self.ensure_invariant();
        Some(removed)
    }

    /// Replace the top-level blocks in `range` with `replacement`.
    pub fn splice_blocks(
        &mut self,
        range: std::ops::Range<usize>,
        replacement: Vec<Node>,
    ) {
        self.root.children.splice(range, replacement);
        self.ensure_invariant();
    }

    /// Node at a path of child indices from the root.
    pub fn node_at(&self, path: &[usize]) -> Option<&Node> {
        let (&first, rest) = path.split_first()?;
        let mut node = self.root.children.get(first)?;
        for &index in rest {
            node = node.children()?.get(index)?;
        }
        Some(node)
    }

    pub fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let (&first, rest) = path.split_first()?;
        let mut node = self.root.children.get_mut(first)?;
        for &index in rest {
            node = node.children_mut()?.get_mut(index)?;
        }
        Some(node)
    }

    /// Child sequence of the container at `path`; `[]` addresses the root.
    pub fn container_children_mut(&mut self, path: &[usize]) -> Option<&mut Vec<Node>> {
        if path.is_empty() {
            return Some(&mut self.root.children);
        }
        self.node_at_mut(path)?.children_mut()
    }

    /// Every text run in document order, with its path from the root.
    pub fn text_runs(&self) -> Vec<(Vec<usize>, &TextNode)> {
        let mut runs = Vec::new();
        for (index, block) in self.root.children.iter().enumerate() {
            collect_runs(block, vec![index], &mut runs);
        }
        runs
    }

    pub(crate) fn ensure_invariant(&mut self) {
        if self.root.children.is_empty() {
            self.root.children.push(Node::empty_paragraph());
        }
    }
}

fn collect_runs<'a>(node: &'a Node, path: Vec<usize>, out: &mut Vec<(Vec<usize>, &'a TextNode)>) {
    match node {
        Node::Text(text) => out.push((path, text)),
        _ => {
            if let Some(children) = node.children() {
                for (index, child) in children.iter().enumerate() {
                    let mut child_path = path.clone();
                    child_path.push(index);
                    collect_runs(child, child_path, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document() -> Document {
        let mut doc = Document::empty();
        doc.root.children = vec![
            Node::Heading(HeadingNode {
                tag: HeadingLevel::H1,
                children: vec![Node::text("Title")],
                format: Alignment::None,
                extra: Map::new(),
            }),
            Node::paragraph(vec![
                Node::text("Hello "),
                Node::Text(TextNode {
                    text: "world".to_string(),
                    format: FormatFlags::none().with(InlineFormat::Bold),
                    style: StyleList::parse("color: rgb(0, 0, 255);"),
                    extra: Map::new(),
                }),
            ]),
            Node::List(ListNode {
                ordering: ListOrdering::Unordered,
                children: vec![
                    Node::ListItem(BlockNode::with_children(vec![Node::text("one")])),
                    Node::ListItem(BlockNode::with_children(vec![Node::text("two")])),
                ],
                extra: Map::new(),
            }),
        ];
        doc
    }

    #[test]
    fn test_empty_document_shape() {
        let doc = Document::empty();
        assert!(doc.is_empty());
        assert_eq!(doc.blocks().len(), 1);
        assert!(matches!(doc.blocks()[0], Node::Paragraph(_)));
    }

    #[test]
    fn test_is_empty_rejects_content() {
        let mut doc = Document::empty();
        assert!(doc.is_empty());

        doc.blocks_mut()[0]
            .children_mut()
            .unwrap()
            .push(Node::text("hi"));
        assert!(!doc.is_empty());

        assert!(!sample_document().is_empty());
    }

    #[test]
    fn test_round_trip() {
        let doc = sample_document();
        let json = doc.to_json_string().unwrap();
        let back = Document::from_json(&json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_round_trip_preserves_unknown_fields() {
        let content = r#"{
            "root": {
                "children": [
                    {
                        "type": "paragraph",
                        "format": "center",
                        "children": [
                            {"type": "text", "text": "hi", "format": 3,
                             "mode": "normal", "detail": 0, "version": 1}
                        ],
                        "indent": 0,
                        "version": 1
                    }
                ],
                "direction": "ltr"
            }
        }"#;
        let doc = Document::from_json(content).unwrap();

        // Known fields parsed
        let Node::Paragraph(paragraph) = &doc.blocks()[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(paragraph.format, Alignment::Center);
        let run = paragraph.children[0].as_text().unwrap();
        assert!(run.format.has(InlineFormat::Bold));
        assert!(run.format.has(InlineFormat::Italic));

        // Unknown fields survive a dump
        assert_eq!(paragraph.extra.get("indent"), Some(&Value::from(0)));
        assert_eq!(run.extra.get("mode"), Some(&Value::from("normal")));
        assert_eq!(
            doc.root.extra.get("direction"),
            Some(&Value::from("ltr"))
        );

        let value = doc.to_value().unwrap();
        assert_eq!(value["root"]["direction"], Value::from("ltr"));
        assert_eq!(value["root"]["children"][0]["indent"], Value::from(0));

        let back = Document::from_json(&doc.to_json_string().unwrap()).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_from_json_malformed() {
        assert!(matches!(
            Document::from_json("not json"),
            Err(MalformedDocumentError::Parse(_))
        ));
        assert!(matches!(
            Document::from_json(r#"{"children": []}"#),
            Err(MalformedDocumentError::MissingRoot)
        ));
        assert!(matches!(
            Document::from_json(r#"{"root": {"children": [{"type": "mystery"}]}}"#),
            Err(MalformedDocumentError::InvalidTree(_))
        ));
    }

    #[test]
    fn test_from_json_or_empty_fallback() {
        assert!(Document::from_json_or_empty(None).is_empty());
        assert!(Document::from_json_or_empty(Some("")).is_empty());
        assert!(Document::from_json_or_empty(Some("   ")).is_empty());
        assert!(Document::from_json_or_empty(Some("plain legacy note")).is_empty());

        let doc = sample_document();
        let loaded = Document::from_json_or_empty(Some(&doc.to_json_string().unwrap()));
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_empty_content_parses_with_empty_root() {
        let doc = Document::from_json(r#"{"root": {"children": []}}"#).unwrap();
        // Invariant restored on load
        assert_eq!(doc.blocks().len(), 1);
        assert!(doc.is_empty());
    }

    #[test]
    fn test_remove_last_block_reinserts_paragraph() {
        let mut doc = Document::empty();
        let removed = doc.remove_block(0);
        assert!(removed.is_some());
        assert_eq!(doc.blocks().len(), 1);
        assert!(doc.is_empty());
    }

    #[test]
    fn test_splice_blocks_keeps_invariant() {
        let mut doc = sample_document();
        let len = doc.blocks().len();
        doc.splice_blocks(0..len, Vec::new());
        assert_eq!(doc.blocks().len(), 1);
        assert!(doc.is_empty());
    }

    #[test]
    fn test_node_at_paths() {
        let doc = sample_document();
        assert_eq!(doc.node_at(&[0]).map(Node::kind), Some(NodeKind::Heading));
        assert_eq!(
            doc.node_at(&[2, 1]).map(Node::kind),
            Some(NodeKind::ListItem)
        );
        assert_eq!(
            doc.node_at(&[2, 1, 0]).and_then(Node::as_text).map(|t| t.text.as_str()),
            Some("two")
        );
        assert!(doc.node_at(&[9]).is_none());
        assert!(doc.node_at(&[0, 0, 5]).is_none());
    }

    #[test]
    fn test_text_runs_document_order() {
        let doc = sample_document();
        let runs = doc.text_runs();
        let texts: Vec<&str> = runs.iter().map(|(_, t)| t.text.as_str()).collect();
        assert_eq!(texts, vec!["Title", "Hello ", "world", "one", "two"]);
        assert_eq!(runs[4].0, vec![2, 1, 0]);
    }

    #[test]
    fn test_format_flags_bitmask() {
        let mut flags = FormatFlags::none();
        flags.set(InlineFormat::Bold, true);
        flags.set(InlineFormat::Underline, true);
        assert_eq!(flags.bits(), 1 | 8);
        assert!(flags.has(InlineFormat::Bold));
        assert!(!flags.has(InlineFormat::Italic));
        flags.set(InlineFormat::Bold, false);
        assert_eq!(flags.bits(), 8);
    }

    #[test]
    fn test_heading_level_conversion() {
        assert_eq!(HeadingLevel::from_level(2), Some(HeadingLevel::H2));
        assert_eq!(HeadingLevel::from_level(4), None);
        assert_eq!(HeadingLevel::H3.level(), 3);
    }

    #[test]
    fn test_text_content() {
        let doc = sample_document();
        assert_eq!(doc.blocks()[1].text_content(), "Hello world");
        assert_eq!(doc.blocks()[2].text_content(), "onetwo");
    }
}
