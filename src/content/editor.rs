//! The inline editable surface.
//!
//! [`InlineEditor`] owns a [`Tree`], the current [`Selection`] and an
//! [`EditSession`]. A platform layer translates its own input into
//! [`EditorEvent`]s and feeds them to [`InlineEditor::handle`]; whenever an
//! event changes the stored content the new storage-form string comes back.
//!
//! ```
//! use std::time::Instant;
//! use rotulo::config::EditorConfig;
//! use rotulo::content::{ContentMode, EditorEvent, FieldOption, InlineEditor, StyleCommand, StyleKind};
//!
//! let options = vec![FieldOption::new("lot", "Lote")];
//! let mut editor = InlineEditor::new("Lote: {{lot}}", options, ContentMode::Html, &EditorConfig::default());
//! let badge = editor.badges()[0];
//!
//! let now = Instant::now();
//! editor.handle(EditorEvent::ClickBadge(badge), now);
//! let changed = editor.handle(EditorEvent::ApplyStyle(StyleCommand::Toggle(StyleKind::Bold)), now);
//! assert_eq!(changed.as_deref(), Some("Lote: <b>{{lot}}</b>"));
//! ```

use std::time::Instant;

use super::badge::{insert_badge, normalize, promote_tokens, remove_badge, remove_node};
use super::serialize::{self, extract};
use super::style::{self, StyleCommand};
use super::sync::{EditSession, SyncDecision, SyncOutcome};
use super::token::{FieldMap, FieldOption};
use super::tree::{NodeId, NodeKind, Position, Selection, Tree, byte_index};
use super::{ContentMode, load};
use crate::config::{EditorConfig, ProjectorConfig};
use crate::project::{self, Values};

/// Keys the editor reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Backspace,
    Delete,
    Enter,
    Char(char),
    ArrowLeft,
    ArrowRight,
    Escape,
}

/// Input coming from the platform layer.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// Click on a badge body: selects it.
    ClickBadge(NodeId),
    /// Click on a badge's remove affordance.
    ClickBadgeRemove(NodeId),
    PlaceCaret(Position),
    SelectRange { anchor: Position, focus: Position },
    Key(Key),
    /// Pasted or composed text.
    Input(String),
    ApplyStyle(StyleCommand),
    /// Insert a badge for `field` at the caret (field picker).
    InsertField(String),
}

#[derive(Debug, Clone)]
pub struct InlineEditor {
    tree: Tree,
    selection: Selection,
    options: Vec<FieldOption>,
    fields: FieldMap,
    session: EditSession,
}

impl InlineEditor {
    pub fn new(value: &str, options: Vec<FieldOption>, mode: ContentMode, config: &EditorConfig) -> Self {
        let fields = FieldMap::from_options(&options);
        let tree = load(value, mode, &fields);
        let selection = Selection::Caret(end_of(&tree));
        Self {
            tree,
            selection,
            options,
            fields,
            session: EditSession::new(value, config.quiescence()),
        }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn options(&self) -> &[FieldOption] {
        &self.options
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn mode(&self) -> ContentMode {
        self.tree.mode()
    }

    /// Current content in storage form.
    pub fn content(&self) -> String {
        extract(&self.tree)
    }

    /// Visible text, badges shown as `{{Label}}`.
    pub fn display_text(&self) -> String {
        serialize::display_text(&self.tree)
    }

    /// Current content with live values substituted, for previews.
    pub fn preview(&self, values: &Values, config: &ProjectorConfig) -> String {
        project::project(&self.content(), values, config)
    }

    /// Attached badges in document order.
    pub fn badges(&self) -> Vec<NodeId> {
        self.tree
            .leaves()
            .into_iter()
            .filter(|&id| self.tree.is_badge(id))
            .collect()
    }

    /// Feed one event. Returns the new content when it changed.
    pub fn handle(&mut self, event: EditorEvent, now: Instant) -> Option<String> {
        if matches!(event, EditorEvent::Key(_) | EditorEvent::Input(_)) {
            self.session.note_local_edit(now);
        }
        let changed = match event {
            EditorEvent::ClickBadge(badge) => {
                if self.tree.is_badge(badge) && self.tree.is_attached(badge) {
                    self.selection = Selection::Badge(badge);
                }
                false
            }
            EditorEvent::ClickBadgeRemove(badge) => remove_badge(&mut self.tree, &mut self.selection, badge),
            EditorEvent::PlaceCaret(pos) => {
                if self.tree.is_attached(pos.node) {
                    self.selection = Selection::Caret(pos);
                }
                false
            }
            EditorEvent::SelectRange { anchor, focus } => {
                if self.tree.is_attached(anchor.node) && self.tree.is_attached(focus.node) {
                    self.selection = Selection::Range { anchor, focus };
                }
                false
            }
            EditorEvent::Key(key) => self.handle_key(key),
            EditorEvent::Input(text) => self.input(&text),
            EditorEvent::ApplyStyle(command) => self.apply_style(&command),
            EditorEvent::InsertField(field) => self.insert_field(&field),
        };
        if !changed {
            return None;
        }
        self.session.note_local_edit(now);
        normalize(&mut self.tree, &mut self.selection);
        let content = extract(&self.tree);
        if content == self.session.last_rendered() {
            return None;
        }
        self.session.record_emitted(&content);
        Some(content)
    }

    /// Offer a value from the owner of the content.
    ///
    /// A value deferred while the user types is dropped if the editor emits
    /// newer content before going idle.
    pub fn set_value(&mut self, value: &str, now: Instant) -> SyncOutcome {
        match self.session.offer(value, now) {
            SyncDecision::Unchanged => SyncOutcome::Unchanged,
            SyncDecision::Deferred => {
                tracing::debug!("external value deferred while editing");
                SyncOutcome::Deferred
            }
            SyncDecision::Begin => {
                self.reload(value);
                SyncOutcome::Applied
            }
        }
    }

    /// Advance time; applies a deferred value once editing went quiet.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.session.take_ready(now) {
            Some(value) => self.set_value(&value, now) == SyncOutcome::Applied,
            None => false,
        }
    }

    fn reload(&mut self, value: &str) {
        self.tree = load(value, self.tree.mode(), &self.fields);
        self.selection = Selection::Caret(end_of(&self.tree));
        self.session.finish_sync(value);
        tracing::debug!("editor reloaded from external value");
    }

    fn handle_key(&mut self, key: Key) -> bool {
        if let Selection::Badge(badge) = self.selection {
            return self.badge_key(badge, key);
        }
        match key {
            Key::Escape => false,
            Key::ArrowLeft | Key::ArrowRight => {
                self.move_caret(key == Key::ArrowRight);
                false
            }
            Key::Backspace | Key::Delete => {
                if let Selection::Range { anchor, focus } = self.selection {
                    self.delete_range(anchor, focus);
                    return true;
                }
                let Some(caret) = self.caret() else { return false };
                if key == Key::Backspace {
                    self.delete_backward(caret)
                } else {
                    self.delete_forward(caret)
                }
            }
            Key::Enter => {
                if self.tree.mode() == ContentMode::Plain {
                    return false;
                }
                let at = self.insertion_point();
                self.insert_break(at);
                true
            }
            Key::Char(c) if c.is_control() => false,
            Key::Char(c) => {
                let at = self.insertion_point();
                let caret = self.insert_text(at, c.encode_utf8(&mut [0; 4]));
                self.selection = Selection::Caret(caret);
                self.promote();
                true
            }
        }
    }

    /// Keys while a badge is selected: the badge behaves as one atom.
    fn badge_key(&mut self, badge: NodeId, key: Key) -> bool {
        match key {
            Key::Backspace | Key::Delete => remove_badge(&mut self.tree, &mut self.selection, badge),
            Key::Escape => {
                self.selection = Selection::None;
                false
            }
            Key::ArrowLeft => {
                if let Some(pos) = self.tree.position_before(badge) {
                    self.selection = Selection::Caret(pos);
                }
                false
            }
            Key::ArrowRight => {
                if let Some(pos) = self.after_badge(badge) {
                    self.selection = Selection::Caret(pos);
                }
                false
            }
            Key::Enter | Key::Char(_) => false,
        }
    }

    fn input(&mut self, text: &str) -> bool {
        if matches!(self.selection, Selection::Badge(_)) || text.is_empty() {
            return false;
        }
        let mut at = self.insertion_point();
        let html = self.tree.mode() == ContentMode::Html;
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 && html {
                at = self.insert_break(at);
            }
            let line: String = line.chars().filter(|c| !c.is_control()).collect();
            if !line.is_empty() {
                at = self.insert_text(at, &line);
            }
        }
        self.selection = Selection::Caret(at);
        self.promote();
        true
    }

    fn apply_style(&mut self, command: &StyleCommand) -> bool {
        if self.tree.mode() == ContentMode::Plain {
            return false;
        }
        let selection = self.selection;
        match selection {
            Selection::Badge(_) => style::apply_style(&mut self.tree, &self.selection, command),
            Selection::Range { anchor, focus } => {
                let leaves = self.tree.range_leaves(anchor, focus);
                if !style::apply_to_leaves(&mut self.tree, &leaves, command) {
                    return false;
                }
                if let (Some(&first), Some(&last)) = (leaves.first(), leaves.last()) {
                    if let (Some(anchor), Some(focus)) = (self.start_of(first), self.end_of(last)) {
                        self.selection = Selection::Range { anchor, focus };
                    }
                }
                self.promote();
                true
            }
            Selection::Caret(_) | Selection::None => false,
        }
    }

    fn insert_field(&mut self, field: &str) -> bool {
        if let Selection::Badge(badge) = self.selection {
            match self.after_badge(badge) {
                Some(pos) => self.selection = Selection::Caret(pos),
                None => return false,
            }
        }
        let label = self.fields.get(field).unwrap_or(field).to_string();
        let at = self.insertion_point();
        let at = self.container_position(at);
        let (_, placeholder) = insert_badge(&mut self.tree, at.node, at.offset, field, &label);
        self.selection = Selection::Caret(Position::new(placeholder, 0));
        tracing::debug!(field, "field inserted");
        true
    }

    /// Promote typed tokens that name a known option (by value or label).
    fn promote(&mut self) {
        let options = &self.options;
        promote_tokens(&mut self.tree, &mut self.selection, |ident| {
            options
                .iter()
                .find(|o| o.value == ident)
                .or_else(|| options.iter().find(|o| o.label == ident))
                .map(|o| (o.value.clone(), o.label.clone()))
        });
    }

    fn caret(&self) -> Option<Position> {
        match self.selection {
            Selection::Caret(pos) => Some(pos),
            _ => None,
        }
    }

    /// Where typed content goes, consuming a range selection first.
    fn insertion_point(&mut self) -> Position {
        let selection = self.selection;
        match selection {
            Selection::Caret(pos) if self.tree.is_attached(pos.node) => pos,
            Selection::Range { anchor, focus } => self.delete_range(anchor, focus),
            _ => end_of(&self.tree),
        }
    }

    /// Turn any position into a container position, splitting text if needed.
    fn container_position(&mut self, pos: Position) -> Position {
        let fallback = end_of(&self.tree);
        if self.tree.is_container(pos.node) {
            let len = self.tree.children(pos.node).len();
            return Position::new(pos.node, pos.offset.min(len));
        }
        if self.tree.is_text(pos.node) {
            let len = self.tree.text_len(pos.node);
            let at = if pos.offset == 0 {
                self.tree.position_before(pos.node)
            } else if pos.offset >= len {
                self.tree.position_after(pos.node)
            } else {
                let right = self.tree.split_text(pos.node, pos.offset);
                self.tree.position_before(right)
            };
            return at.unwrap_or(fallback);
        }
        self.tree.position_after(pos.node).unwrap_or(fallback)
    }

    /// Insert text at `pos`, extending an adjacent text node when possible.
    /// Returns the caret after the inserted text.
    fn insert_text(&mut self, pos: Position, text: &str) -> Position {
        let count = text.chars().count();
        if let Some(current) = self.tree.text(pos.node) {
            let mut value = current.to_string();
            value.insert_str(byte_index(&value, pos.offset), text);
            self.tree.set_text(pos.node, value);
            return Position::new(pos.node, pos.offset + count);
        }

        let at = self.container_position(pos);
        let children = self.tree.children(at.node).to_vec();
        if let Some(&prev) = at.offset.checked_sub(1).and_then(|i| children.get(i)) {
            if let Some(current) = self.tree.text(prev) {
                let end = current.chars().count();
                let value = format!("{}{}", current, text);
                self.tree.set_text(prev, value);
                return Position::new(prev, end + count);
            }
        }
        if let Some(&next) = children.get(at.offset) {
            if let Some(current) = self.tree.text(next) {
                let value = format!("{}{}", text, current);
                self.tree.set_text(next, value);
                return Position::new(next, count);
            }
        }
        let node = self.tree.create(NodeKind::Text(text.to_string()));
        self.tree.insert(at.node, at.offset, node);
        Position::new(node, count)
    }

    fn insert_break(&mut self, pos: Position) -> Position {
        let at = self.container_position(pos);
        let node = self.tree.create(NodeKind::Break);
        self.tree.insert(at.node, at.offset, node);
        let caret = Position::new(at.node, at.offset + 1);
        self.selection = Selection::Caret(caret);
        caret
    }

    /// Delete every leaf in a range; returns the collapsed caret.
    fn delete_range(&mut self, anchor: Position, focus: Position) -> Position {
        let leaves = self.tree.range_leaves(anchor, focus);
        let start = leaves
            .first()
            .and_then(|&first| self.tree.position_before(first))
            .unwrap_or(anchor);
        self.selection = Selection::Caret(start);
        for leaf in leaves {
            remove_node(&mut self.tree, &mut self.selection, leaf);
        }
        self.caret().unwrap_or(start)
    }

    fn remove_char(&mut self, node: NodeId, index: usize) {
        if let Some(current) = self.tree.text(node) {
            let mut value = current.to_string();
            let at = byte_index(&value, index);
            if at < value.len() {
                value.remove(at);
            }
            self.tree.set_text(node, value);
        }
    }

    /// Remove a non-text atom (break, raw markup) and park the caret there.
    fn remove_atom(&mut self, node: NodeId) -> bool {
        let landing = self.tree.position_before(node);
        remove_node(&mut self.tree, &mut self.selection, node);
        if let Some(pos) = landing {
            self.selection = Selection::Caret(pos);
        }
        true
    }

    fn delete_backward(&mut self, caret: Position) -> bool {
        if self.tree.is_text(caret.node) && caret.offset > 0 {
            self.remove_char(caret.node, caret.offset - 1);
            self.selection = Selection::Caret(Position::new(caret.node, caret.offset - 1));
            return true;
        }
        let leaves = self.tree.leaves();
        let mut k = self.tree.boundary_index(caret, &leaves);
        while k > 0 {
            let leaf = leaves[k - 1];
            match self.tree.kind(leaf) {
                NodeKind::Text(s) if s.is_empty() => k -= 1,
                NodeKind::Text(s) => {
                    let last = s.chars().count() - 1;
                    self.remove_char(leaf, last);
                    self.selection = Selection::Caret(Position::new(leaf, last));
                    return true;
                }
                NodeKind::Placeholder => match self.tree.prev_sibling(leaf).filter(|&b| self.tree.is_badge(b)) {
                    Some(badge) => return remove_badge(&mut self.tree, &mut self.selection, badge),
                    None => k -= 1,
                },
                NodeKind::Badge { .. } => return remove_badge(&mut self.tree, &mut self.selection, leaf),
                _ => return self.remove_atom(leaf),
            }
        }
        false
    }

    fn delete_forward(&mut self, caret: Position) -> bool {
        if self.tree.is_text(caret.node) && caret.offset < self.tree.text_len(caret.node) {
            self.remove_char(caret.node, caret.offset);
            return true;
        }
        let leaves = self.tree.leaves();
        let mut k = self.tree.boundary_index(caret, &leaves);
        while k < leaves.len() {
            let leaf = leaves[k];
            match self.tree.kind(leaf) {
                NodeKind::Text(s) if s.is_empty() => k += 1,
                NodeKind::Placeholder => k += 1,
                NodeKind::Text(_) => {
                    self.remove_char(leaf, 0);
                    self.selection = Selection::Caret(Position::new(leaf, 0));
                    return true;
                }
                NodeKind::Badge { .. } => return remove_badge(&mut self.tree, &mut self.selection, leaf),
                _ => return self.remove_atom(leaf),
            }
        }
        false
    }

    /// Arrow navigation; badges are stepped over as one unit.
    fn move_caret(&mut self, forward: bool) {
        let selection = self.selection;
        let caret = match selection {
            Selection::Caret(pos) => pos,
            Selection::Range { focus, .. } => {
                self.selection = Selection::Caret(focus);
                return;
            }
            _ => return,
        };
        if self.tree.is_text(caret.node) {
            let len = self.tree.text_len(caret.node);
            if forward && caret.offset < len {
                self.selection = Selection::Caret(Position::new(caret.node, caret.offset + 1));
                return;
            }
            if !forward && caret.offset > 0 {
                self.selection = Selection::Caret(Position::new(caret.node, caret.offset - 1));
                return;
            }
        }

        let leaves = self.tree.leaves();
        let k = self.tree.boundary_index(caret, &leaves);
        let target = if forward {
            leaves[k.min(leaves.len())..]
                .iter()
                .copied()
                .find(|&id| !self.tree.is_placeholder(id))
                .and_then(|leaf| match self.tree.kind(leaf) {
                    NodeKind::Text(_) => Some(Position::new(leaf, 1)),
                    NodeKind::Badge { .. } => self.after_badge(leaf),
                    _ => self.tree.position_after(leaf),
                })
        } else {
            leaves[..k.min(leaves.len())].last().copied().and_then(|leaf| match self.tree.kind(leaf) {
                NodeKind::Text(s) => Some(Position::new(leaf, s.chars().count().saturating_sub(1))),
                NodeKind::Placeholder => self
                    .tree
                    .prev_sibling(leaf)
                    .and_then(|badge| self.tree.position_before(badge)),
                _ => self.tree.position_before(leaf),
            })
        };
        if let Some(pos) = target {
            self.selection = Selection::Caret(pos);
        }
    }

    /// The caret spot right after a badge: its placeholder when present.
    fn after_badge(&self, badge: NodeId) -> Option<Position> {
        match self.tree.next_sibling(badge) {
            Some(next) if self.tree.is_placeholder(next) => Some(Position::new(next, 0)),
            _ => self.tree.position_after(badge),
        }
    }

    fn start_of(&self, leaf: NodeId) -> Option<Position> {
        if self.tree.is_text(leaf) {
            Some(Position::new(leaf, 0))
        } else {
            self.tree.position_before(leaf)
        }
    }

    fn end_of(&self, leaf: NodeId) -> Option<Position> {
        if self.tree.is_text(leaf) {
            Some(Position::new(leaf, self.tree.text_len(leaf)))
        } else {
            self.tree.position_after(leaf)
        }
    }
}

fn end_of(tree: &Tree) -> Position {
    let root = tree.root();
    Position::new(root, tree.children(root).len())
}
