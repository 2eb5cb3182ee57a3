//! Arena-backed node tree for the inline editable surface.
//!
//! The tree models exactly what the editor understands: flat text runs,
//! atomic badges, zero-width caret placeholders, line breaks and inline
//! style wrappers. Nodes are addressed by [`NodeId`]; detached nodes stay in
//! the arena but are unreachable from the root.

use super::ContentMode;

/// Handle to a node in a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Inline style wrapper kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WrapperKind {
    Bold,
    Italic,
    Underline,
    /// `<span style="...">`; foreground color lives in the style.
    Span { style: String },
    /// Any other inline tag, kept verbatim.
    Other { tag: String, attrs: String },
}

impl WrapperKind {
    /// A color span with a single `color` declaration.
    pub fn color(value: &str) -> Self {
        WrapperKind::Span {
            style: format!("color: {}", value.trim()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            WrapperKind::Bold => "b",
            WrapperKind::Italic => "i",
            WrapperKind::Underline => "u",
            WrapperKind::Span { .. } => "span",
            WrapperKind::Other { tag, .. } => tag.as_str(),
        }
    }

    pub fn open_tag(&self) -> String {
        match self {
            WrapperKind::Span { style } => {
                format!("<span style=\"{}\">", htmlize::escape_attribute(style.as_str()))
            }
            WrapperKind::Other { tag, attrs } if !attrs.is_empty() => format!("<{} {}>", tag, attrs),
            other => format!("<{}>", other.tag()),
        }
    }

    pub fn close_tag(&self) -> String {
        format!("</{}>", self.tag())
    }

    /// The `color` declaration of a span, if any.
    pub fn foreground(&self) -> Option<&str> {
        match self {
            WrapperKind::Span { style } => style_declarations(style)
                .find(|(prop, _)| prop.eq_ignore_ascii_case("color"))
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// Set (or add) the `color` declaration of a span. No-op for other kinds.
    pub fn set_foreground(&mut self, value: &str) {
        if let WrapperKind::Span { style } = self {
            let mut decls: Vec<String> = Vec::new();
            let mut found = false;
            for (prop, current) in style_declarations(style) {
                if prop.eq_ignore_ascii_case("color") {
                    decls.push(format!("color: {}", value.trim()));
                    found = true;
                } else {
                    decls.push(format!("{}: {}", prop, current));
                }
            }
            if !found {
                decls.push(format!("color: {}", value.trim()));
            }
            *style = decls.join("; ");
        }
    }
}

/// Split a CSS declaration list into `(property, value)` pairs.
fn style_declarations(style: &str) -> impl Iterator<Item = (&str, &str)> {
    style.split(';').filter_map(|decl| {
        let (prop, value) = decl.split_once(':')?;
        let prop = prop.trim();
        if prop.is_empty() {
            return None;
        }
        Some((prop, value.trim()))
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Text(String),
    /// Atomic token representation. `field` is the storage identifier.
    Badge { field: String, label: String },
    /// Zero-width caret landing spot following a badge.
    Placeholder,
    Break,
    /// Markup the editor does not interpret (void tags, comments).
    Raw(String),
    Wrapper(WrapperKind),
}

impl NodeKind {
    fn is_container(&self) -> bool {
        matches!(self, NodeKind::Root | NodeKind::Wrapper(_))
    }
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A point in the tree.
///
/// In a text node `offset` counts chars; in a container it is a child index;
/// at a placeholder it is always 0 and means "right after the badge".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub node: NodeId,
    pub offset: usize,
}

impl Position {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// Explicit editor selection, threaded through every editing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    Caret(Position),
    Range { anchor: Position, focus: Position },
    /// A badge selected by clicking it. No text selection exists.
    Badge(NodeId),
}

impl Selection {
    pub fn positions_mut(&mut self) -> Vec<&mut Position> {
        match self {
            Selection::Caret(pos) => vec![pos],
            Selection::Range { anchor, focus } => vec![anchor, focus],
            Selection::None | Selection::Badge(_) => Vec::new(),
        }
    }
}

/// The editable node tree.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
    mode: ContentMode,
}

impl Tree {
    pub fn new(mode: ContentMode) -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            }],
            root: NodeId(0),
            mode,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn mode(&self) -> ContentMode {
        self.mode
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.0].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Text(_))
    }

    pub fn is_badge(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Badge { .. })
    }

    pub fn is_placeholder(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Placeholder)
    }

    pub fn is_container(&self, id: NodeId) -> bool {
        self.kind(id).is_container()
    }

    /// Text length in chars (0 for non-text nodes).
    pub fn text_len(&self, id: NodeId) -> usize {
        self.text(id).map(|s| s.chars().count()).unwrap_or(0)
    }

    /// Allocate a detached node.
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        let at = self.nodes[parent.0].children.len();
        self.insert(parent, at, child);
    }

    /// Insert `child` at `index` among `parent`'s children, detaching it first.
    pub fn insert(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
    }

    pub fn insert_after(&mut self, sibling: NodeId, node: NodeId) {
        if let (Some(parent), Some(index)) = (self.parent(sibling), self.index_in_parent(sibling)) {
            self.insert(parent, index + 1, node);
        }
    }

    /// Remove `id` from its parent. The subtree stays intact but unreachable.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        index.checked_sub(1).map(|i| self.children(parent)[i])
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    /// Ancestors from the parent outwards, root excluded.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cur = self.parent(id);
        while let Some(node) = cur {
            if node == self.root {
                break;
            }
            out.push(node);
            cur = self.parent(node);
        }
        out
    }

    pub fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(node) = cur {
            if node == ancestor {
                return true;
            }
            cur = self.parent(node);
        }
        false
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        self.is_descendant_of(id, self.root)
    }

    /// All attached nodes in document (pre-)order, root first.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            out.push(id);
            for &child in self.children(id).iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Attached non-container nodes in document order.
    pub fn leaves(&self) -> Vec<NodeId> {
        self.preorder()
            .into_iter()
            .filter(|&id| !self.is_container(id))
            .collect()
    }

    pub fn set_text(&mut self, id: NodeId, value: String) {
        if let NodeKind::Text(s) = &mut self.nodes[id.0].kind {
            *s = value;
        }
    }

    /// Split a text node at a char offset; returns the new right-hand node,
    /// inserted directly after `id`.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> NodeId {
        let text = self.text(id).unwrap_or_default().to_string();
        let at = byte_index(&text, offset);
        let (left, right) = text.split_at(at);
        let (left, right) = (left.to_string(), right.to_string());
        self.set_text(id, left);
        let right_id = self.create(NodeKind::Text(right));
        self.insert_after(id, right_id);
        right_id
    }

    /// Insert a wrapper at `id`'s position and move `id` into it.
    pub fn wrap(&mut self, id: NodeId, kind: WrapperKind) -> NodeId {
        let wrapper = self.create(NodeKind::Wrapper(kind));
        if let (Some(parent), Some(index)) = (self.parent(id), self.index_in_parent(id)) {
            self.insert(parent, index, wrapper);
        }
        self.append(wrapper, id);
        wrapper
    }

    /// Replace a container by its children, in place.
    pub fn unwrap(&mut self, id: NodeId) {
        let (Some(parent), Some(index)) = (self.parent(id), self.index_in_parent(id)) else {
            return;
        };
        let children = self.children(id).to_vec();
        for (offset, child) in children.into_iter().enumerate() {
            self.insert(parent, index + offset, child);
        }
        self.detach(id);
    }

    /// Split every container between `leaf` and `ancestor` (inclusive) so
    /// that `ancestor` ends up holding only the path to `leaf`. Siblings on
    /// either side move into shallow copies of their former containers.
    pub fn isolate(&mut self, ancestor: NodeId, leaf: NodeId) {
        if !self.is_descendant_of(leaf, ancestor) || leaf == ancestor {
            return;
        }
        let mut child = leaf;
        loop {
            let Some(parent) = self.parent(child) else { return };
            let Some(grand) = self.parent(parent) else { return };
            let Some(index) = self.index_in_parent(child) else { return };
            let Some(mut parent_index) = self.index_in_parent(parent) else { return };

            let siblings = self.children(parent).to_vec();
            let shell_kind = self.kind(parent).clone();
            let before = &siblings[..index];
            let after = &siblings[index + 1..];

            if !before.is_empty() {
                let shell = self.create(shell_kind.clone());
                for &node in before {
                    self.append(shell, node);
                }
                self.insert(grand, parent_index, shell);
                parent_index += 1;
            }
            if !after.is_empty() {
                let shell = self.create(shell_kind.clone());
                for &node in after {
                    self.append(shell, node);
                }
                self.insert(grand, parent_index + 1, shell);
            }

            if parent == ancestor {
                return;
            }
            child = parent;
        }
    }

    /// Make a range's boundaries fall between leaves and return every leaf
    /// inside it, in document order.
    pub fn range_leaves(&mut self, a: Position, b: Position) -> Vec<NodeId> {
        let (a, b) = if a.node == b.node && self.is_text(a.node) {
            let (lo, hi) = if a.offset <= b.offset { (a, b) } else { (b, a) };
            let mut hi = self.split_boundary(hi);
            let lo = self.split_boundary(lo);
            // An end-of-text boundary moves onto the piece split off by `lo`.
            if lo.node != a.node && hi.node == a.node && hi.offset > 0 {
                hi = Position::new(lo.node, self.text_len(lo.node));
            }
            (lo, hi)
        } else {
            (self.split_boundary(a), self.split_boundary(b))
        };

        let leaves = self.leaves();
        let x = self.boundary_index(a, &leaves);
        let y = self.boundary_index(b, &leaves);
        let (start, end) = if x <= y { (x, y) } else { (y, x) };
        leaves[start..end].to_vec()
    }

    /// Split a text position so that it sits on a node edge.
    fn split_boundary(&mut self, pos: Position) -> Position {
        if self.is_text(pos.node) {
            let len = self.text_len(pos.node);
            if pos.offset > 0 && pos.offset < len {
                let right = self.split_text(pos.node, pos.offset);
                return Position::new(right, 0);
            }
        }
        pos
    }

    /// Number of leaves (from `leaves`) lying entirely before `pos`.
    pub fn boundary_index(&self, pos: Position, leaves: &[NodeId]) -> usize {
        let index_of = |id: NodeId| leaves.iter().position(|&l| l == id);
        match self.kind(pos.node) {
            NodeKind::Text(_) => {
                let i = index_of(pos.node).unwrap_or(leaves.len());
                if pos.offset == 0 { i } else { (i + 1).min(leaves.len()) }
            }
            NodeKind::Root | NodeKind::Wrapper(_) => {
                let order = self.preorder();
                let rank = |id: NodeId| order.iter().position(|&o| o == id).unwrap_or(order.len());
                let children = self.children(pos.node);
                let limit = match children.get(pos.offset) {
                    Some(&child) => rank(child),
                    None => self.subtree_end_rank(pos.node, &order) + 1,
                };
                leaves.iter().filter(|&&l| rank(l) < limit).count()
            }
            _ => index_of(pos.node).map(|i| i + 1).unwrap_or(leaves.len()),
        }
    }

    fn subtree_end_rank(&self, id: NodeId, order: &[NodeId]) -> usize {
        let mut last = id;
        while let Some(&child) = self.children(last).last() {
            last = child;
        }
        order.iter().position(|&o| o == last).unwrap_or(order.len())
    }

    /// Position just before `id` in its parent.
    pub fn position_before(&self, id: NodeId) -> Option<Position> {
        Some(Position::new(self.parent(id)?, self.index_in_parent(id)?))
    }

    /// Position just after `id` in its parent.
    pub fn position_after(&self, id: NodeId) -> Option<Position> {
        Some(Position::new(self.parent(id)?, self.index_in_parent(id)? + 1))
    }
}

/// Byte index of the `chars`-th char of `s` (clamped to the end).
pub(crate) fn byte_index(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map(|(i, _)| i).unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(tree: &mut Tree, parent: NodeId, s: &str) -> NodeId {
        let id = tree.create(NodeKind::Text(s.into()));
        tree.append(parent, id);
        id
    }

    #[test]
    fn test_wrap_and_unwrap() {
        let mut tree = Tree::new(ContentMode::Html);
        let root = tree.root();
        let a = text(&mut tree, root, "a");
        let b = text(&mut tree, root, "b");
        let w = tree.wrap(b, WrapperKind::Bold);
        assert_eq!(tree.children(root), &[a, w]);
        assert_eq!(tree.ancestors(b), vec![w]);
        tree.unwrap(w);
        assert_eq!(tree.children(root), &[a, b]);
        assert!(!tree.is_attached(w));
    }

    #[test]
    fn test_split_text_multibyte() {
        let mut tree = Tree::new(ContentMode::Html);
        let root = tree.root();
        let t = text(&mut tree, root, "añob");
        let right = tree.split_text(t, 2);
        assert_eq!(tree.text(t), Some("añ"));
        assert_eq!(tree.text(right), Some("ob"));
        assert_eq!(tree.next_sibling(t), Some(right));
    }

    #[test]
    fn test_isolate_splits_wrapper() {
        let mut tree = Tree::new(ContentMode::Html);
        let root = tree.root();
        let w = tree.create(NodeKind::Wrapper(WrapperKind::Bold));
        tree.append(root, w);
        let a = text(&mut tree, w, "a");
        let b = text(&mut tree, w, "b");
        let c = text(&mut tree, w, "c");
        tree.isolate(w, b);
        let top = tree.children(root).to_vec();
        assert_eq!(top.len(), 3);
        assert_eq!(top[1], w);
        assert_eq!(tree.children(w), &[b]);
        assert_eq!(tree.children(top[0]), &[a]);
        assert_eq!(tree.children(top[2]), &[c]);
        assert_eq!(tree.kind(top[0]), &NodeKind::Wrapper(WrapperKind::Bold));
    }

    #[test]
    fn test_range_leaves_same_node() {
        let mut tree = Tree::new(ContentMode::Html);
        let root = tree.root();
        let t = text(&mut tree, root, "hello world");
        let leaves = tree.range_leaves(Position::new(t, 6), Position::new(t, 0));
        assert_eq!(leaves.len(), 1);
        assert_eq!(tree.text(leaves[0]), Some("hello "));
        assert_eq!(tree.leaves().len(), 2);
    }

    #[test]
    fn test_foreground_roundtrip() {
        let mut kind = WrapperKind::Span {
            style: "font-size: 12px; color: red".into(),
        };
        assert_eq!(kind.foreground(), Some("red"));
        kind.set_foreground("#00ff00");
        assert_eq!(
            kind,
            WrapperKind::Span {
                style: "font-size: 12px; color: #00ff00".into()
            }
        );
        let bg = WrapperKind::Span {
            style: "background-color: red".into(),
        };
        assert_eq!(bg.foreground(), None);
    }
}
