//! Formatting command engine
//!
//! All document mutation funnels through here: inline format toggles,
//! block type changes, alignment, list wrapping, and undo/redo. The engine
//! owns the document, the current selection, and the undo history, and
//! broadcasts the derived toolbar state on a watch channel after every
//! mutation or selection change so the toolbar never reads editor
//! internals directly.
//!
//! Commands are synchronous and mutate in place. Inline formatting splits
//! text runs at the selection boundaries so only the selected span changes.

use serde_json::Map;
use tokio::sync::watch;

use crate::document::{
    Alignment, BlockNode, Document, HeadingLevel, HeadingNode, InlineFormat, ListNode,
    ListOrdering, Node, TextNode,
};
use crate::history::History;
use crate::selection::{Point, Selection};

/// Target of a block type change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    Heading(HeadingLevel),
    Quote,
}

/// What the toolbar shows: inline format flags derived from the current
/// selection, plus undo/redo availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ToolbarState {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub can_undo: bool,
    pub can_redo: bool,
}

impl ToolbarState {
    pub fn has(&self, flag: InlineFormat) -> bool {
        match flag {
            InlineFormat::Bold => self.bold,
            InlineFormat::Italic => self.italic,
            InlineFormat::Underline => self.underline,
            InlineFormat::Strikethrough => self.strikethrough,
        }
    }
}

/// A text run covered by the selection, with the covered character span.
struct RunSpan {
    path: Vec<usize>,
    sel_start: usize,
    sel_end: usize,
}

/// How a top-level block index translates after a structural transform.
enum Remap {
    /// `[orig, rest..]` → `[new, rest..]`
    Stable(usize),
    /// List unwrapped in place: `[orig, item, rest..]` → `[base + item, rest..]`
    Unwrapped(usize),
    /// Block became one item of a list: `[orig, rest..]` → `[list, item, rest..]`
    IntoList { list: usize, item: usize },
    /// List merged into a list: `[orig, item, rest..]` → `[list, base + item, rest..]`
    Merged { list: usize, base: usize },
}

pub struct FormattingEngine {
    document: Document,
    selection: Option<Selection>,
    history: History,
    state_tx: watch::Sender<ToolbarState>,
}

impl FormattingEngine {
    pub fn new(document: Document, history_limit: usize) -> Self {
        let (state_tx, _) = watch::channel(ToolbarState::default());
        let mut engine = Self {
            document,
            selection: None,
            history: History::new(history_limit),
            state_tx,
        };
        engine.refresh_state();
        engine
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Subscribe to toolbar state changes.
    pub fn subscribe(&self) -> watch::Receiver<ToolbarState> {
        self.state_tx.subscribe()
    }

    pub fn toolbar_state(&self) -> ToolbarState {
        *self.state_tx.borrow()
    }

    /// Set the selection, dropping anything that does not resolve to text
    /// runs in the current document.
    pub fn set_selection(&mut self, selection: Option<Selection>) {
        self.selection = selection.filter(|s| s.is_valid(&self.document));
        self.refresh_state();
    }

    /// Select from the first character of the first run to the end of the
    /// last run. No-op on a document with no runs.
    pub fn select_all(&mut self) {
        let runs = self.document.text_runs();
        let (Some((first_path, _)), Some((last_path, last_run))) = (runs.first(), runs.last())
        else {
            return;
        };
        let selection = Selection::new(
            Point::new(first_path.clone(), 0),
            Point::new(last_path.clone(), last_run.text.chars().count()),
        );
        self.set_selection(Some(selection));
    }

    /// Replace the document wholesale (e.g. imported content), recording
    /// the previous state for undo.
    pub fn replace_document(&mut self, document: Document) {
        self.checkpoint();
        self.document = document;
        self.validate_selection();
        self.refresh_state();
    }

    /// Adopt authoritative state reloaded from the store without touching
    /// the undo history.
    pub fn sync_document(&mut self, document: Document) {
        self.document = document;
        self.validate_selection();
        self.refresh_state();
    }

    // ==================== Inline formatting ====================

    /// Flip an inline format over the selected range. The flag counts as
    /// active when every covered non-empty run carries it; toggling drives
    /// every covered run to the opposite. Runs partially covered are split
    /// at the selection boundary. No-op on a caret or missing selection.
    pub fn toggle_inline_format(&mut self, flag: InlineFormat) -> bool {
        let Some(spans) = self.selected_run_spans() else {
            return false;
        };
        let spans: Vec<RunSpan> = spans
            .into_iter()
            .filter(|s| s.sel_start < s.sel_end)
            .collect();
        if spans.is_empty() {
            return false;
        }

        let active = spans.iter().all(|span| {
            self.document
                .node_at(&span.path)
                .and_then(Node::as_text)
                .map(|run| run.format.has(flag))
                .unwrap_or(true)
        });
        let target = !active;

        self.checkpoint();

        let mut new_start: Option<Point> = None;
        let mut new_end: Option<Point> = None;
        // Reverse document order: splits shift only later siblings, which
        // are already processed.
        for (position, span) in spans.iter().enumerate().rev() {
            let (mid_path, mid_len, inserted) = apply_flag_to_span(&mut self.document, span, flag, target);

            // A split before the recorded end point shifts its run index.
            if let Some(end) = new_end.as_mut() {
                shift_sibling_path(&mut end.path, &span.path, inserted);
            }
            if position == spans.len() - 1 {
                new_end = Some(Point::new(mid_path.clone(), mid_len));
            }
            if position == 0 {
                new_start = Some(Point::new(mid_path, 0));
            }
        }

        if let (Some(start), Some(end)) = (new_start, new_end) {
            self.selection = Some(Selection::new(start, end));
        }
        self.validate_selection();
        self.refresh_state();
        true
    }

    // ==================== Block commands ====================

    /// Change the type of every top-level block the selection touches.
    /// Lists dissolve: each item becomes a block of the target kind.
    pub fn set_block_type(&mut self, kind: BlockKind) -> bool {
        let Some((b0, b1)) = self.selected_block_range() else {
            return false;
        };
        self.checkpoint();

        let mut remaps = Vec::new();
        let mut index = b0;
        for orig in b0..=b1 {
            let is_list = matches!(self.document.blocks().get(index), Some(Node::List(_)));
            if is_list {
                let items = match self.document.blocks_mut().remove(index) {
                    Node::List(list) => list.children,
                    other => {
                        // Cannot happen; restore and move on.
                        self.document.blocks_mut().insert(index, other);
                        index += 1;
                        continue;
                    }
                };
                let converted: Vec<Node> = items
                    .into_iter()
                    .map(|item| convert_block(item, kind))
                    .collect();
                let count = converted.len();
                self.document.blocks_mut().splice(index..index, converted);
                remaps.push((orig, Remap::Unwrapped(index)));
                index += count;
            } else {
                if let Some(slot) = self.document.blocks_mut().get_mut(index) {
                    let owned = std::mem::replace(slot, Node::empty_paragraph());
                    *slot = convert_block(owned, kind);
                }
                remaps.push((orig, Remap::Stable(index)));
                index += 1;
            }
        }
        self.document.ensure_invariant();
        self.remap_selection(&remaps);
        self.refresh_state();
        true
    }

    /// Set alignment on the block containers the selection touches. For a
    /// list, only the items the selection actually covers are aligned.
    pub fn set_alignment(&mut self, alignment: Alignment) -> bool {
        let Some((b0, b1)) = self.selected_block_range() else {
            return false;
        };
        let item_bounds = self.selection.as_ref().map(|s| {
            (
                s.start().path.get(1).copied(),
                s.end().path.get(1).copied(),
            )
        });
        self.checkpoint();

        for index in b0..=b1 {
            let Some(block) = self.document.blocks_mut().get_mut(index) else {
                continue;
            };
            match block {
                Node::List(list) => {
                    let last = list.children.len().saturating_sub(1);
                    let from = if index == b0 {
                        item_bounds.and_then(|(s, _)| s).unwrap_or(0)
                    } else {
                        0
                    };
                    let to = if index == b1 {
                        item_bounds.and_then(|(_, e)| e).unwrap_or(last)
                    } else {
                        last
                    };
                    for item in list
                        .children
                        .iter_mut()
                        .skip(from)
                        .take(to.saturating_sub(from) + 1)
                    {
                        item.set_alignment(alignment);
                    }
                }
                other => other.set_alignment(alignment),
            }
        }
        self.refresh_state();
        true
    }

    /// Wrap the selected blocks into one list of `ordering`, one item per
    /// block; lists already in the selection merge their items in (and are
    /// retagged if of the other ordering). When everything selected is
    /// already a list of `ordering`, unwrap back to paragraphs instead, so
    /// applying the same ordering twice restores the original structure.
    pub fn insert_list(&mut self, ordering: ListOrdering) -> bool {
        let Some((b0, b1)) = self.selected_block_range() else {
            return false;
        };
        let all_same = self.document.blocks()[b0..=b1]
            .iter()
            .all(|block| matches!(block, Node::List(list) if list.ordering == ordering));
        self.checkpoint();

        let remaps = if all_same {
            self.unwrap_lists(b0, b1)
        } else {
            self.wrap_into_list(b0, b1, ordering)
        };
        self.document.ensure_invariant();
        self.remap_selection(&remaps);
        self.refresh_state();
        true
    }

    // ==================== History ====================

    pub fn undo(&mut self) -> bool {
        let current = self.document.clone();
        match self.history.undo(current) {
            Some(snapshot) => {
                self.document = snapshot;
                self.validate_selection();
                self.refresh_state();
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        let current = self.document.clone();
        match self.history.redo(current) {
            Some(snapshot) => {
                self.document = snapshot;
                self.validate_selection();
                self.refresh_state();
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ==================== Internals ====================

    fn checkpoint(&mut self) {
        self.history.record(self.document.clone());
    }

    fn validate_selection(&mut self) {
        if let Some(selection) = &self.selection {
            if !selection.is_valid(&self.document) {
                self.selection = None;
            }
        }
    }

    fn refresh_state(&mut self) {
        let state = self.compute_state();
        self.state_tx.send_replace(state);
    }

    fn compute_state(&self) -> ToolbarState {
        let mut state = ToolbarState {
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
            ..Default::default()
        };

        let Some(selection) = &self.selection else {
            return state;
        };
        if !selection.is_valid(&self.document) {
            return state;
        }

        if selection.is_caret() {
            if let Some(run) = self
                .document
                .node_at(&selection.anchor.path)
                .and_then(Node::as_text)
            {
                state.bold = run.format.has(InlineFormat::Bold);
                state.italic = run.format.has(InlineFormat::Italic);
                state.underline = run.format.has(InlineFormat::Underline);
                state.strikethrough = run.format.has(InlineFormat::Strikethrough);
            }
            return state;
        }

        if let Some(spans) = self.selected_run_spans() {
            let covered: Vec<&RunSpan> =
                spans.iter().filter(|s| s.sel_start < s.sel_end).collect();
            if !covered.is_empty() {
                for flag in InlineFormat::ALL {
                    let all = covered.iter().all(|span| {
                        self.document
                            .node_at(&span.path)
                            .and_then(Node::as_text)
                            .map(|run| run.format.has(flag))
                            .unwrap_or(false)
                    });
                    match flag {
                        InlineFormat::Bold => state.bold = all,
                        InlineFormat::Italic => state.italic = all,
                        InlineFormat::Strikethrough => state.strikethrough = all,
                        InlineFormat::Underline => state.underline = all,
                    }
                }
            }
        }
        state
    }

    /// Runs covered by the selection with per-run character spans.
    /// `None` for a missing, invalid, or collapsed selection.
    fn selected_run_spans(&self) -> Option<Vec<RunSpan>> {
        let selection = self.selection.as_ref()?;
        if selection.is_caret() || !selection.is_valid(&self.document) {
            return None;
        }
        let start = selection.start();
        let end = selection.end();

        let runs = self.document.text_runs();
        let start_index = runs.iter().position(|(path, _)| *path == start.path)?;
        let end_index = runs.iter().position(|(path, _)| *path == end.path)?;

        let mut spans = Vec::new();
        for (index, (path, run)) in runs
            .iter()
            .enumerate()
            .take(end_index + 1)
            .skip(start_index)
        {
            let len = run.text.chars().count();
            spans.push(RunSpan {
                path: path.clone(),
                sel_start: if index == start_index { start.offset } else { 0 },
                sel_end: if index == end_index { end.offset } else { len },
            });
        }
        Some(spans)
    }

    fn selected_block_range(&self) -> Option<(usize, usize)> {
        let selection = self.selection.as_ref()?;
        if !selection.is_valid(&self.document) {
            return None;
        }
        let (b0, b1) = selection.block_range()?;
        let last = self.document.blocks().len().checked_sub(1)?;
        Some((b0.min(last), b1.min(last)))
    }

    fn unwrap_lists(&mut self, b0: usize, b1: usize) -> Vec<(usize, Remap)> {
        let mut remaps = Vec::new();
        let mut index = b0;
        for orig in b0..=b1 {
            let items = match self.document.blocks_mut().remove(index) {
                Node::List(list) => list.children,
                other => {
                    self.document.blocks_mut().insert(index, other);
                    remaps.push((orig, Remap::Stable(index)));
                    index += 1;
                    continue;
                }
            };
            let paragraphs: Vec<Node> = items
                .into_iter()
                .map(|item| convert_block(item, BlockKind::Paragraph))
                .collect();
            let count = paragraphs.len();
            self.document.blocks_mut().splice(index..index, paragraphs);
            remaps.push((orig, Remap::Unwrapped(index)));
            index += count;
        }
        remaps
    }

    fn wrap_into_list(
        &mut self,
        b0: usize,
        b1: usize,
        ordering: ListOrdering,
    ) -> Vec<(usize, Remap)> {
        let removed: Vec<Node> = self.document.blocks_mut().drain(b0..=b1).collect();
        let mut items = Vec::new();
        let mut remaps = Vec::new();
        for (offset, block) in removed.into_iter().enumerate() {
            let orig = b0 + offset;
            match block {
                Node::List(list) => {
                    remaps.push((
                        orig,
                        Remap::Merged {
                            list: b0,
                            base: items.len(),
                        },
                    ));
                    items.extend(list.children);
                }
                other => {
                    remaps.push((
                        orig,
                        Remap::IntoList {
                            list: b0,
                            item: items.len(),
                        },
                    ));
                    items.push(to_list_item(other));
                }
            }
        }
        let list = Node::List(ListNode {
            ordering,
            children: items,
            extra: Map::new(),
        });
        self.document.blocks_mut().insert(b0, list);
        remaps
    }

    fn remap_selection(&mut self, remaps: &[(usize, Remap)]) {
        let remapped = self.selection.as_ref().and_then(|selection| {
            let anchor = remap_point(&selection.anchor, remaps)?;
            let focus = remap_point(&selection.focus, remaps)?;
            Some(Selection::new(anchor, focus))
        });
        self.selection = remapped.filter(|s| s.is_valid(&self.document));
    }
}

/// Apply `flag` to the covered span of one run, splitting at the selection
/// boundaries when the run is partially covered. Returns the path of the
/// (possibly new) run holding the covered text, its character length, and
/// how many sibling slots the replacement grew by.
fn apply_flag_to_span(
    document: &mut Document,
    span: &RunSpan,
    flag: InlineFormat,
    on: bool,
) -> (Vec<usize>, usize, usize) {
    let fallback = (span.path.clone(), span.sel_end - span.sel_start, 0);
    let Some((&index, parent_path)) = span.path.split_last() else {
        return fallback;
    };
    let Some(children) = document.container_children_mut(parent_path) else {
        return fallback;
    };
    let Some(run) = children.get_mut(index).and_then(Node::as_text_mut) else {
        return fallback;
    };

    let chars: Vec<char> = run.text.chars().collect();
    let len = chars.len();
    let (from, to) = (span.sel_start.min(len), span.sel_end.min(len));

    if from == 0 && to == len {
        run.format.set(flag, on);
        return (span.path.clone(), len, 0);
    }

    let template = run.clone();
    let mut replacement = Vec::new();
    if from > 0 {
        replacement.push(Node::Text(TextNode {
            text: chars[..from].iter().collect(),
            ..template.clone()
        }));
    }
    let mid_offset = replacement.len();
    let mut mid = TextNode {
        text: chars[from..to].iter().collect(),
        ..template.clone()
    };
    mid.format.set(flag, on);
    replacement.push(Node::Text(mid));
    if to < len {
        replacement.push(Node::Text(TextNode {
            text: chars[to..].iter().collect(),
            ..template
        }));
    }

    let inserted = replacement.len() - 1;
    children.splice(index..index + 1, replacement);

    let mut mid_path = parent_path.to_vec();
    mid_path.push(index + mid_offset);
    (mid_path, to - from, inserted)
}

/// Shift `path`'s run index when `inserted` siblings appeared before it in
/// the same parent (mutation at `mutated_path`).
fn shift_sibling_path(path: &mut [usize], mutated_path: &[usize], inserted: usize) {
    if inserted == 0 || path.len() != mutated_path.len() {
        return;
    }
    let depth = path.len() - 1;
    if path[..depth] == mutated_path[..depth] && path[depth] > mutated_path[depth] {
        path[depth] += inserted;
    }
}

/// Rebuild a block as the given kind, carrying children, alignment, and
/// opaque extra fields across. Lists and text runs pass through untouched;
/// callers dissolve lists before converting their items.
fn convert_block(node: Node, kind: BlockKind) -> Node {
    let (children, format, extra) = match node {
        Node::Paragraph(b) | Node::Quote(b) | Node::ListItem(b) => (b.children, b.format, b.extra),
        Node::Heading(h) => (h.children, h.format, h.extra),
        other => return other,
    };
    let block = BlockNode {
        children,
        format,
        extra,
    };
    match kind {
        BlockKind::Paragraph => Node::Paragraph(block),
        BlockKind::Quote => Node::Quote(block),
        BlockKind::Heading(tag) => Node::Heading(HeadingNode {
            tag,
            children: block.children,
            format: block.format,
            extra: block.extra,
        }),
    }
}

/// Turn a top-level block into a list item, preserving its inline content.
fn to_list_item(node: Node) -> Node {
    match node {
        Node::Paragraph(b) | Node::Quote(b) | Node::ListItem(b) => Node::ListItem(b),
        Node::Heading(h) => Node::ListItem(BlockNode {
            children: h.children,
            format: h.format,
            extra: h.extra,
        }),
        Node::Text(t) => Node::ListItem(BlockNode::with_children(vec![Node::Text(t)])),
        list @ Node::List(_) => list,
    }
}

fn remap_point(point: &Point, remaps: &[(usize, Remap)]) -> Option<Point> {
    let block = point.block_index()?;
    let Some((_, remap)) = remaps.iter().find(|(orig, _)| *orig == block) else {
        return Some(point.clone());
    };
    let mut path = Vec::with_capacity(point.path.len() + 1);
    match remap {
        Remap::Stable(new_index) => {
            path.push(*new_index);
            path.extend_from_slice(&point.path[1..]);
        }
        Remap::Unwrapped(base) => {
            let item = *point.path.get(1)?;
            path.push(base + item);
            path.extend_from_slice(&point.path[2..]);
        }
        Remap::IntoList { list, item } => {
            path.push(*list);
            path.push(*item);
            path.extend_from_slice(&point.path[1..]);
        }
        Remap::Merged { list, base } => {
            let item = *point.path.get(1)?;
            path.push(*list);
            path.push(base + item);
            path.extend_from_slice(&point.path[2..]);
        }
    }
    Some(Point::new(path, point.offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::NodeKind;
    use crate::history::DEFAULT_HISTORY_LIMIT;

    fn two_paragraph_engine() -> FormattingEngine {
        let mut doc = Document::empty();
        doc.root.children = vec![
            Node::paragraph(vec![Node::text("alpha")]),
            Node::paragraph(vec![Node::text("beta")]),
        ];
        FormattingEngine::new(doc, DEFAULT_HISTORY_LIMIT)
    }

    fn select_everything(engine: &mut FormattingEngine) {
        engine.select_all();
        assert!(engine.selection().is_some());
    }

    #[test]
    fn test_toggle_bold_whole_selection() {
        let mut engine = two_paragraph_engine();
        select_everything(&mut engine);

        assert!(engine.toggle_inline_format(InlineFormat::Bold));
        for (_, run) in engine.document().text_runs() {
            assert!(run.format.has(InlineFormat::Bold));
        }
        assert!(engine.toolbar_state().bold);

        // Toggling again removes it everywhere
        assert!(engine.toggle_inline_format(InlineFormat::Bold));
        for (_, run) in engine.document().text_runs() {
            assert!(!run.format.has(InlineFormat::Bold));
        }
        assert!(!engine.toolbar_state().bold);
    }

    #[test]
    fn test_toggle_splits_partial_run() {
        let mut engine = two_paragraph_engine();
        engine.set_selection(Some(Selection::new(
            Point::new(vec![0, 0], 1),
            Point::new(vec![0, 0], 3),
        )));

        assert!(engine.toggle_inline_format(InlineFormat::Italic));

        let Node::Paragraph(paragraph) = &engine.document().blocks()[0] else {
            panic!("expected paragraph");
        };
        let texts: Vec<(&str, bool)> = paragraph
            .children
            .iter()
            .map(|n| {
                let t = n.as_text().unwrap();
                (t.text.as_str(), t.format.has(InlineFormat::Italic))
            })
            .collect();
        assert_eq!(
            texts,
            vec![("a", false), ("lp", true), ("ha", false)]
        );

        // Selection now covers exactly the reformatted span
        let selection = engine.selection().unwrap();
        assert_eq!(selection.start(), &Point::new(vec![0, 1], 0));
        assert_eq!(selection.end(), &Point::new(vec![0, 1], 2));
        assert!(engine.toolbar_state().italic);
    }

    #[test]
    fn test_toggle_spanning_two_runs_with_boundary_split() {
        let mut engine = two_paragraph_engine();
        // "pha" of alpha through "be" of beta
        engine.set_selection(Some(Selection::new(
            Point::new(vec![0, 0], 2),
            Point::new(vec![1, 0], 2),
        )));

        assert!(engine.toggle_inline_format(InlineFormat::Bold));

        let first: Vec<(&str, bool)> = engine.document().blocks()[0]
            .children()
            .unwrap()
            .iter()
            .map(|n| {
                let t = n.as_text().unwrap();
                (t.text.as_str(), t.format.has(InlineFormat::Bold))
            })
            .collect();
        assert_eq!(first, vec![("al", false), ("pha", true)]);

        let second: Vec<(&str, bool)> = engine.document().blocks()[1]
            .children()
            .unwrap()
            .iter()
            .map(|n| {
                let t = n.as_text().unwrap();
                (t.text.as_str(), t.format.has(InlineFormat::Bold))
            })
            .collect();
        assert_eq!(second, vec![("be", true), ("ta", false)]);

        let selection = engine.selection().unwrap();
        assert_eq!(selection.start(), &Point::new(vec![0, 1], 0));
        assert_eq!(selection.end(), &Point::new(vec![1, 0], 2));
    }

    #[test]
    fn test_toggle_across_sibling_runs_same_block() {
        let mut doc = Document::empty();
        doc.root.children = vec![Node::paragraph(vec![Node::text("foo"), Node::text("bar")])];
        let mut engine = FormattingEngine::new(doc, DEFAULT_HISTORY_LIMIT);
        engine.set_selection(Some(Selection::new(
            Point::new(vec![0, 0], 1),
            Point::new(vec![0, 1], 2),
        )));

        assert!(engine.toggle_inline_format(InlineFormat::Underline));

        let runs: Vec<(&str, bool)> = engine.document().blocks()[0]
            .children()
            .unwrap()
            .iter()
            .map(|n| {
                let t = n.as_text().unwrap();
                (t.text.as_str(), t.format.has(InlineFormat::Underline))
            })
            .collect();
        assert_eq!(
            runs,
            vec![("f", false), ("oo", true), ("ba", true), ("r", false)]
        );

        // End point shifted past the start run's split
        let selection = engine.selection().unwrap();
        assert_eq!(selection.start(), &Point::new(vec![0, 1], 0));
        assert_eq!(selection.end(), &Point::new(vec![0, 2], 2));
    }

    #[test]
    fn test_mixed_formatting_applies_to_all() {
        let mut engine = two_paragraph_engine();
        // Bold only the first paragraph
        engine.set_selection(Some(Selection::new(
            Point::new(vec![0, 0], 0),
            Point::new(vec![0, 0], 5),
        )));
        engine.toggle_inline_format(InlineFormat::Bold);

        // Now select everything: not every run is bold, so toggle adds
        select_everything(&mut engine);
        assert!(!engine.toolbar_state().bold);
        engine.toggle_inline_format(InlineFormat::Bold);
        for (_, run) in engine.document().text_runs() {
            assert!(run.format.has(InlineFormat::Bold));
        }
    }

    #[test]
    fn test_caret_and_missing_selection_are_noops() {
        let mut engine = two_paragraph_engine();
        assert!(!engine.toggle_inline_format(InlineFormat::Bold));

        engine.set_selection(Some(Selection::caret(Point::new(vec![0, 0], 2))));
        assert!(!engine.toggle_inline_format(InlineFormat::Bold));
        assert!(!engine.can_undo());
    }

    #[test]
    fn test_invalid_selection_rejected() {
        let mut engine = two_paragraph_engine();
        engine.set_selection(Some(Selection::caret(Point::new(vec![7, 0], 0))));
        assert!(engine.selection().is_none());
    }

    #[test]
    fn test_set_block_type_heading() {
        let mut engine = two_paragraph_engine();
        select_everything(&mut engine);

        assert!(engine.set_block_type(BlockKind::Heading(HeadingLevel::H2)));
        for block in engine.document().blocks() {
            assert_eq!(block.kind(), NodeKind::Heading);
        }
        assert_eq!(engine.document().blocks()[0].text_content(), "alpha");

        // Back to paragraphs
        assert!(engine.set_block_type(BlockKind::Paragraph));
        for block in engine.document().blocks() {
            assert_eq!(block.kind(), NodeKind::Paragraph);
        }
    }

    #[test]
    fn test_set_block_type_quote_at_caret() {
        let mut engine = two_paragraph_engine();
        engine.set_selection(Some(Selection::caret(Point::new(vec![1, 0], 2))));

        assert!(engine.set_block_type(BlockKind::Quote));
        assert_eq!(engine.document().blocks()[0].kind(), NodeKind::Paragraph);
        assert_eq!(engine.document().blocks()[1].kind(), NodeKind::Quote);
    }

    #[test]
    fn test_set_block_type_dissolves_list() {
        let mut engine = two_paragraph_engine();
        select_everything(&mut engine);
        engine.insert_list(ListOrdering::Unordered);
        assert_eq!(engine.document().blocks().len(), 1);

        engine.set_block_type(BlockKind::Paragraph);
        assert_eq!(engine.document().blocks().len(), 2);
        for block in engine.document().blocks() {
            assert_eq!(block.kind(), NodeKind::Paragraph);
        }
    }

    #[test]
    fn test_set_alignment() {
        let mut engine = two_paragraph_engine();
        engine.set_selection(Some(Selection::caret(Point::new(vec![0, 0], 0))));

        assert!(engine.set_alignment(Alignment::Center));
        assert_eq!(
            engine.document().blocks()[0].alignment(),
            Some(Alignment::Center)
        );
        assert_eq!(
            engine.document().blocks()[1].alignment(),
            Some(Alignment::None)
        );
    }

    #[test]
    fn test_set_alignment_on_list_items() {
        let mut engine = two_paragraph_engine();
        select_everything(&mut engine);
        engine.insert_list(ListOrdering::Ordered);

        select_everything(&mut engine);
        engine.set_alignment(Alignment::Right);
        let Node::List(list) = &engine.document().blocks()[0] else {
            panic!("expected list");
        };
        for item in &list.children {
            assert_eq!(item.alignment(), Some(Alignment::Right));
        }
    }

    #[test]
    fn test_insert_list_wraps_and_unwraps() {
        let mut engine = two_paragraph_engine();
        let original = engine.document().clone();
        select_everything(&mut engine);

        assert!(engine.insert_list(ListOrdering::Unordered));
        let Node::List(list) = &engine.document().blocks()[0] else {
            panic!("expected list");
        };
        assert_eq!(list.ordering, ListOrdering::Unordered);
        assert_eq!(list.children.len(), 2);
        assert_eq!(list.children[0].kind(), NodeKind::ListItem);

        // Selection survived the wrap; the same command undoes it
        assert!(engine.insert_list(ListOrdering::Unordered));
        assert_eq!(engine.document(), &original);
    }

    #[test]
    fn test_insert_list_retags_other_ordering() {
        let mut engine = two_paragraph_engine();
        select_everything(&mut engine);
        engine.insert_list(ListOrdering::Unordered);

        select_everything(&mut engine);
        engine.insert_list(ListOrdering::Ordered);
        let Node::List(list) = &engine.document().blocks()[0] else {
            panic!("expected list");
        };
        assert_eq!(list.ordering, ListOrdering::Ordered);
        assert_eq!(list.children.len(), 2);
    }

    #[test]
    fn test_insert_list_merges_mixed_blocks() {
        let mut engine = two_paragraph_engine();
        select_everything(&mut engine);
        engine.insert_list(ListOrdering::Ordered);

        // Add a trailing paragraph, then select everything again
        engine
            .document
            .blocks_mut()
            .push(Node::paragraph(vec![Node::text("gamma")]));
        select_everything(&mut engine);

        engine.insert_list(ListOrdering::Unordered);
        assert_eq!(engine.document().blocks().len(), 1);
        let Node::List(list) = &engine.document().blocks()[0] else {
            panic!("expected list");
        };
        assert_eq!(list.ordering, ListOrdering::Unordered);
        assert_eq!(list.children.len(), 3);
    }

    #[test]
    fn test_undo_redo_restores_document() {
        let mut engine = two_paragraph_engine();
        let original = engine.document().clone();
        select_everything(&mut engine);

        engine.toggle_inline_format(InlineFormat::Bold);
        let bolded = engine.document().clone();
        assert_ne!(&original, engine.document());
        assert!(engine.toolbar_state().can_undo);
        assert!(!engine.toolbar_state().can_redo);

        assert!(engine.undo());
        assert_eq!(engine.document(), &original);
        assert!(engine.toolbar_state().can_redo);

        assert!(engine.redo());
        assert_eq!(engine.document(), &bolded);

        // Exhausted stacks report unavailability
        engine.undo();
        assert!(!engine.undo());
        assert!(!engine.can_undo());
    }

    #[test]
    fn test_watch_subscription_sees_updates() {
        let mut engine = two_paragraph_engine();
        let rx = engine.subscribe();
        assert!(!rx.borrow().bold);

        select_everything(&mut engine);
        engine.toggle_inline_format(InlineFormat::Bold);
        assert!(rx.borrow().bold);
        assert!(rx.borrow().can_undo);
    }

    #[test]
    fn test_replace_document_is_undoable() {
        let mut engine = two_paragraph_engine();
        let original = engine.document().clone();

        let mut replacement = Document::empty();
        replacement.root.children = vec![Node::paragraph(vec![Node::text("imported")])];
        engine.replace_document(replacement.clone());
        assert_eq!(engine.document(), &replacement);

        assert!(engine.undo());
        assert_eq!(engine.document(), &original);
    }

    #[test]
    fn test_sync_document_keeps_history_quiet() {
        let mut engine = two_paragraph_engine();
        let mut reloaded = Document::empty();
        reloaded.root.children = vec![Node::paragraph(vec![Node::text("persisted")])];

        engine.sync_document(reloaded.clone());
        assert_eq!(engine.document(), &reloaded);
        assert!(!engine.can_undo());
    }
}
