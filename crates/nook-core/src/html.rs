//! HTML import/export mapping
//!
//! Import turns externally authored HTML (a paste, typically) into a
//! document: recognized elements become blocks and inline runs, and the
//! three recognized CSS properties (font size, background color, text
//! color) pass through the style allow-list before landing on a run.
//! Unrecognized elements are descended through transparently.
//!
//! Export is the sanitizing direction: the produced HTML carries only the
//! semantic structure the document model defines. No class attributes, no
//! inline style strings. Editor chrome never leaks into exported markup.
//! Both directions are single top-down passes with one handler per node
//! kind.

use ego_tree::NodeRef;
use scraper::Html;

use crate::document::{
    BlockNode, Document, FormatFlags, HeadingLevel, HeadingNode, InlineFormat, ListNode,
    ListOrdering, Node, TextNode,
};
use crate::style::{extra_styles, ExtraStyleSource, StyleList};

/// Formatting inherited from enclosing inline elements during import.
#[derive(Debug, Clone, Default)]
struct InlineContext {
    flags: FormatFlags,
    style: StyleList,
}

impl InlineContext {
    fn with_element(&self, element: &scraper::node::Element) -> Self {
        let mut ctx = self.clone();
        match element.name() {
            "b" | "strong" => ctx.flags.set(InlineFormat::Bold, true),
            "i" | "em" => ctx.flags.set(InlineFormat::Italic, true),
            "u" => ctx.flags.set(InlineFormat::Underline, true),
            "s" | "strike" | "del" => ctx.flags.set(InlineFormat::Strikethrough, true),
            _ => {}
        }
        let extra = element_extra_styles(element);
        if !extra.is_empty() {
            ctx.style.append_str(&extra);
        }
        ctx
    }
}

/// Compute allow-listed extra styles from an element's `style` attribute.
fn element_extra_styles(element: &scraper::node::Element) -> String {
    let Some(style_attr) = element.attr("style") else {
        return String::new();
    };
    let declared = StyleList::parse(style_attr);
    extra_styles(ExtraStyleSource {
        font_size: declared.get("font-size"),
        background_color: declared.get("background-color"),
        color: declared.get("color"),
    })
}

/// Import pasted HTML into a document. Total: unparseable or empty input
/// yields the canonical empty document.
pub fn from_html(html: &str) -> Document {
    let fragment = Html::parse_fragment(html);
    let mut blocks = Vec::new();
    let mut pending = Vec::new();
    walk_block(
        fragment.tree.root(),
        &InlineContext::default(),
        &mut blocks,
        &mut pending,
    );
    flush_pending(&mut pending, &mut blocks);

    let mut document = Document::empty();
    if !blocks.is_empty() {
        document.root.children = blocks;
    }
    document
}

/// Wrap any accumulated loose inline content into an implicit paragraph.
fn flush_pending(pending: &mut Vec<Node>, blocks: &mut Vec<Node>) {
    if !pending.is_empty() {
        blocks.push(Node::paragraph(std::mem::take(pending)));
    }
}

fn walk_block(
    node: NodeRef<'_, scraper::node::Node>,
    ctx: &InlineContext,
    blocks: &mut Vec<Node>,
    pending: &mut Vec<Node>,
) {
    for child in node.children() {
        match child.value() {
            scraper::node::Node::Element(element) => match element.name() {
                "p" => {
                    flush_pending(pending, blocks);
                    let inner = ctx.with_element(element);
                    blocks.push(Node::paragraph(collect_inline(child, &inner)));
                }
                "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                    flush_pending(pending, blocks);
                    let level = element.name().as_bytes()[1] - b'0';
                    // Depths past three clamp to the smallest heading
                    let tag = HeadingLevel::from_level(level).unwrap_or(HeadingLevel::H3);
                    let inner = ctx.with_element(element);
                    blocks.push(Node::Heading(HeadingNode {
                        tag,
                        children: collect_inline(child, &inner),
                        format: Default::default(),
                        extra: Default::default(),
                    }));
                }
                "blockquote" => {
                    flush_pending(pending, blocks);
                    let inner = ctx.with_element(element);
                    blocks.push(Node::Quote(BlockNode::with_children(collect_inline(
                        child, &inner,
                    ))));
                }
                "ul" | "ol" => {
                    flush_pending(pending, blocks);
                    let ordering = if element.name() == "ol" {
                        ListOrdering::Ordered
                    } else {
                        ListOrdering::Unordered
                    };
                    let inner = ctx.with_element(element);
                    blocks.push(Node::List(ListNode {
                        ordering,
                        children: collect_list_items(child, &inner),
                        extra: Default::default(),
                    }));
                }
                // A stray list item outside a list renders as a paragraph
                "li" => {
                    flush_pending(pending, blocks);
                    let inner = ctx.with_element(element);
                    blocks.push(Node::paragraph(collect_inline(child, &inner)));
                }
                "br" => flush_pending(pending, blocks),
                name if is_inline_tag(name) => {
                    collect_inline_into(child, &ctx.with_element(element), pending);
                }
                // Unknown containers (div, body, the fragment wrapper...)
                // are transparent at block level
                _ => {
                    flush_pending(pending, blocks);
                    walk_block(child, &ctx.with_element(element), blocks, pending);
                    flush_pending(pending, blocks);
                }
            },
            scraper::node::Node::Text(text) => {
                let text: &str = text;
                if !text.trim().is_empty() {
                    pending.push(Node::Text(make_run(text, ctx)));
                }
            }
            _ => {}
        }
    }
}

fn collect_list_items(
    list: NodeRef<'_, scraper::node::Node>,
    ctx: &InlineContext,
) -> Vec<Node> {
    let mut items = Vec::new();
    for child in list.children() {
        if let scraper::node::Node::Element(element) = child.value() {
            if element.name() == "li" {
                let inner = ctx.with_element(element);
                items.push(Node::ListItem(BlockNode::with_children(collect_inline(
                    child, &inner,
                ))));
            }
        }
    }
    items
}

fn collect_inline(node: NodeRef<'_, scraper::node::Node>, ctx: &InlineContext) -> Vec<Node> {
    let mut runs = Vec::new();
    collect_inline_into(node, ctx, &mut runs);
    runs
}

fn collect_inline_into(
    node: NodeRef<'_, scraper::node::Node>,
    ctx: &InlineContext,
    runs: &mut Vec<Node>,
) {
    for child in node.children() {
        match child.value() {
            scraper::node::Node::Text(text) => {
                let text: &str = text;
                // Drop formatting whitespace (newlines/indentation between
                // tags) but keep genuine inter-word spaces
                if text.chars().all(char::is_whitespace) && text.contains('\n') {
                    continue;
                }
                runs.push(Node::Text(make_run(text, ctx)));
            }
            scraper::node::Node::Element(element) => {
                collect_inline_into(child, &ctx.with_element(element), runs);
            }
            _ => {}
        }
    }
}

fn make_run(text: &str, ctx: &InlineContext) -> TextNode {
    TextNode {
        text: text.to_string(),
        format: ctx.flags,
        style: ctx.style.clone(),
        ..Default::default()
    }
}

fn is_inline_tag(name: &str) -> bool {
    matches!(
        name,
        "b" | "strong"
            | "i"
            | "em"
            | "u"
            | "s"
            | "strike"
            | "del"
            | "span"
            | "a"
            | "code"
            | "mark"
            | "font"
            | "small"
            | "sub"
            | "sup"
    )
}

/// Export a document to interchange HTML carrying semantic structure
/// only: presentation attributes (inline styles, classes, alignment) are
/// stripped from the produced markup.
pub fn to_html(document: &Document) -> String {
    let mut out = String::new();
    for (index, block) in document.blocks().iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        render_node(block, &mut out);
    }
    out
}

fn render_node(node: &Node, out: &mut String) {
    match node {
        Node::Paragraph(block) => render_container("p", &block.children, out),
        Node::Quote(block) => render_container("blockquote", &block.children, out),
        Node::ListItem(block) => render_container("li", &block.children, out),
        Node::Heading(heading) => {
            let tag = match heading.tag {
                HeadingLevel::H1 => "h1",
                HeadingLevel::H2 => "h2",
                HeadingLevel::H3 => "h3",
            };
            render_container(tag, &heading.children, out);
        }
        Node::List(list) => {
            let tag = match list.ordering {
                ListOrdering::Ordered => "ol",
                ListOrdering::Unordered => "ul",
            };
            out.push_str(&format!("<{}>", tag));
            for item in &list.children {
                render_node(item, out);
            }
            out.push_str(&format!("</{}>", tag));
        }
        Node::Text(run) => render_text(run, out),
    }
}

fn render_container(tag: &str, children: &[Node], out: &mut String) {
    out.push_str(&format!("<{}>", tag));
    for child in children {
        render_node(child, out);
    }
    out.push_str(&format!("</{}>", tag));
}

fn render_text(run: &TextNode, out: &mut String) {
    let mut open = String::new();
    let mut close = String::new();
    for (flag, tag) in [
        (InlineFormat::Bold, "strong"),
        (InlineFormat::Italic, "em"),
        (InlineFormat::Underline, "u"),
        (InlineFormat::Strikethrough, "s"),
    ] {
        if run.format.has(flag) {
            open.push_str(&format!("<{}>", tag));
            close.insert_str(0, &format!("</{}>", tag));
        }
    }
    out.push_str(&open);
    out.push_str(&escape_html(&run.text));
    out.push_str(&close);
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
