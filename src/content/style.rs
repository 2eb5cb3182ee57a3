//! Style applicator: bold / italic / underline / color.
//!
//! Two targets exist. A selected badge is styled by wrapping or unwrapping
//! its ancestor chain directly. A free-text range is styled leaf by leaf,
//! splitting wrappers where only part of their content is affected.

use serde::{Deserialize, Serialize};

use super::ContentMode;
use super::tree::{NodeId, NodeKind, Selection, Tree, WrapperKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleKind {
    Bold,
    Italic,
    Underline,
}

impl StyleKind {
    fn wrapper(self) -> WrapperKind {
        match self {
            StyleKind::Bold => WrapperKind::Bold,
            StyleKind::Italic => WrapperKind::Italic,
            StyleKind::Underline => WrapperKind::Underline,
        }
    }

    fn matches(self, kind: &WrapperKind) -> bool {
        *kind == self.wrapper()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleCommand {
    Toggle(StyleKind),
    /// Set the foreground color (any CSS color value).
    Color(String),
}

/// Apply `command` to the selection. Returns whether the tree changed.
///
/// Carets and empty selections are left alone; plain-mode content has no
/// styling at all.
pub fn apply_style(tree: &mut Tree, selection: &Selection, command: &StyleCommand) -> bool {
    if tree.mode() == ContentMode::Plain {
        return false;
    }
    match *selection {
        Selection::Badge(badge) => apply_to_badge(tree, badge, command),
        Selection::Range { anchor, focus } => {
            let leaves = tree.range_leaves(anchor, focus);
            apply_to_leaves(tree, &leaves, command)
        }
        Selection::Caret(_) | Selection::None => false,
    }
}

/// Nearest ancestor wrapper of the given kind.
pub fn find_style(tree: &Tree, node: NodeId, kind: StyleKind) -> Option<NodeId> {
    tree.ancestors(node)
        .into_iter()
        .find(|&id| matches!(tree.kind(id), NodeKind::Wrapper(w) if kind.matches(w)))
}

/// Nearest ancestor span carrying a `color` declaration.
pub fn find_color(tree: &Tree, node: NodeId) -> Option<NodeId> {
    tree.ancestors(node)
        .into_iter()
        .find(|&id| matches!(tree.kind(id), NodeKind::Wrapper(w) if w.foreground().is_some()))
}

/// Effective foreground color of a node.
pub fn color_of(tree: &Tree, node: NodeId) -> Option<String> {
    let span = find_color(tree, node)?;
    match tree.kind(span) {
        NodeKind::Wrapper(w) => w.foreground().map(str::to_string),
        _ => None,
    }
}

/// Toggle a style or set the color on one badge.
///
/// An existing wrapper is removed for everything it encloses; a new wrapper
/// encloses the badge alone.
pub fn apply_to_badge(tree: &mut Tree, badge: NodeId, command: &StyleCommand) -> bool {
    if !tree.is_badge(badge) || !tree.is_attached(badge) {
        return false;
    }
    match command {
        StyleCommand::Toggle(kind) => match find_style(tree, badge, *kind) {
            Some(wrapper) => tree.unwrap(wrapper),
            None => {
                tree.wrap(badge, kind.wrapper());
            }
        },
        StyleCommand::Color(value) => match find_color(tree, badge) {
            Some(span) => set_color(tree, span, value),
            None => {
                tree.wrap(badge, WrapperKind::color(value));
            }
        },
    }
    tracing::debug!(?badge, ?command, "badge styled");
    true
}

/// Style a run of leaves (as returned by [`Tree::range_leaves`]).
///
/// Toggling removes the style when every text/badge leaf already has it,
/// otherwise adds it to the leaves lacking it. Placeholders travel with
/// their badges when a new wrapper is created, so that neighbouring wrappers
/// can merge; they are never split out of an existing one.
pub fn apply_to_leaves(tree: &mut Tree, leaves: &[NodeId], command: &StyleCommand) -> bool {
    let styled: Vec<NodeId> = leaves
        .iter()
        .copied()
        .filter(|&id| match tree.kind(id) {
            NodeKind::Text(s) => !s.is_empty(),
            NodeKind::Badge { .. } => true,
            _ => false,
        })
        .collect();
    if styled.is_empty() {
        return false;
    }
    let carried: Vec<NodeId> = leaves
        .iter()
        .copied()
        .filter(|&id| styled.contains(&id) || tree.is_placeholder(id))
        .collect();

    match command {
        StyleCommand::Toggle(kind) => {
            let all = styled.iter().all(|&id| find_style(tree, id, *kind).is_some());
            if all {
                for &leaf in &styled {
                    if let Some(wrapper) = find_style(tree, leaf, *kind) {
                        tree.isolate(wrapper, leaf);
                        tree.unwrap(wrapper);
                    }
                }
            } else {
                for &leaf in &carried {
                    if find_style(tree, leaf, *kind).is_none() {
                        let wrapper = tree.wrap(leaf, kind.wrapper());
                        merge_siblings(tree, wrapper);
                    }
                }
            }
        }
        StyleCommand::Color(value) => {
            for &leaf in &carried {
                match find_color(tree, leaf) {
                    Some(_) if tree.is_placeholder(leaf) => {}
                    Some(span) => {
                        tree.isolate(span, leaf);
                        set_color(tree, span, value);
                    }
                    None => {
                        let wrapper = tree.wrap(leaf, WrapperKind::color(value));
                        merge_siblings(tree, wrapper);
                    }
                }
            }
        }
    }
    true
}

fn set_color(tree: &mut Tree, span: NodeId, value: &str) {
    if let NodeKind::Wrapper(kind) = tree.kind_mut(span) {
        kind.set_foreground(value);
    }
}

/// Fold a wrapper into identical wrappers directly before or after it.
fn merge_siblings(tree: &mut Tree, wrapper: NodeId) -> NodeId {
    let mut current = wrapper;
    if let Some(prev) = tree.prev_sibling(current) {
        if tree.kind(prev) == tree.kind(current) {
            for child in tree.children(current).to_vec() {
                tree.append(prev, child);
            }
            tree.detach(current);
            current = prev;
        }
    }
    if let Some(next) = tree.next_sibling(current) {
        if tree.kind(next) == tree.kind(current) {
            for child in tree.children(next).to_vec() {
                tree.append(current, child);
            }
            tree.detach(next);
        }
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::badge::normalize;
    use crate::content::serialize::extract;
    use crate::content::tree::Position;
    use crate::content::{FieldMap, FieldOption, load};
    use pretty_assertions::assert_eq;

    fn fields() -> FieldMap {
        FieldMap::from_options(&[FieldOption::new("lot", "Lote"), FieldOption::new("w", "Peso")])
    }

    fn first_badge(tree: &Tree) -> NodeId {
        tree.leaves()
            .into_iter()
            .find(|&id| tree.is_badge(id))
            .expect("badge present")
    }

    fn styled(tree: &mut Tree, selection: Selection, command: StyleCommand) -> String {
        assert!(apply_style(tree, &selection, &command));
        let mut sel = Selection::None;
        normalize(tree, &mut sel);
        extract(tree)
    }

    #[test]
    fn test_badge_bold_toggle() {
        let mut tree = load("Lote: {{lot}}", ContentMode::Html, &fields());
        let badge = first_badge(&tree);
        let bold = StyleCommand::Toggle(StyleKind::Bold);
        assert_eq!(styled(&mut tree, Selection::Badge(badge), bold.clone()), "Lote: <b>{{lot}}</b>");
        assert_eq!(styled(&mut tree, Selection::Badge(badge), bold), "Lote: {{lot}}");
    }

    #[test]
    fn test_badge_unwrap_keeps_other_wrappers() {
        let mut tree = load("<i><b>{{lot}}</b></i>", ContentMode::Html, &fields());
        let badge = first_badge(&tree);
        let out = styled(&mut tree, Selection::Badge(badge), StyleCommand::Toggle(StyleKind::Italic));
        assert_eq!(out, "<b>{{lot}}</b>");
    }

    #[test]
    fn test_badge_color_mutates_existing_span() {
        let mut tree = load("<span style=\"color: red\">{{lot}}</span>", ContentMode::Html, &fields());
        let badge = first_badge(&tree);
        let out = styled(&mut tree, Selection::Badge(badge), StyleCommand::Color("#0000ff".into()));
        assert_eq!(out, "<span style=\"color: #0000ff\">{{lot}}</span>");
        assert_eq!(color_of(&tree, badge).as_deref(), Some("#0000ff"));
    }

    #[test]
    fn test_badge_color_creates_span() {
        let mut tree = load("{{lot}}", ContentMode::Html, &fields());
        let badge = first_badge(&tree);
        let out = styled(&mut tree, Selection::Badge(badge), StyleCommand::Color("green".into()));
        assert_eq!(out, "<span style=\"color: green\">{{lot}}</span>");
    }

    #[test]
    fn test_range_bold_then_partial_unbold() {
        let mut tree = load("hello world", ContentMode::Html, &fields());
        let text = tree.leaves()[0];
        let range = Selection::Range {
            anchor: Position::new(text, 0),
            focus: Position::new(text, 11),
        };
        let bold = StyleCommand::Toggle(StyleKind::Bold);
        assert_eq!(styled(&mut tree, range, bold.clone()), "<b>hello world</b>");

        let text = tree.leaves()[0];
        let range = Selection::Range {
            anchor: Position::new(text, 6),
            focus: Position::new(text, 11),
        };
        assert_eq!(styled(&mut tree, range, bold), "<b>hello </b>world");
    }

    #[test]
    fn test_range_bold_spanning_badge_merges() {
        let mut tree = load("a{{lot}}b", ContentMode::Html, &fields());
        let leaves = tree.leaves();
        let range = Selection::Range {
            anchor: Position::new(leaves[0], 0),
            focus: Position::new(*leaves.last().expect("leaf"), 1),
        };
        let out = styled(&mut tree, range, StyleCommand::Toggle(StyleKind::Bold));
        assert_eq!(out, "<b>a{{lot}}b</b>");
    }

    #[test]
    fn test_range_color_inside_span_splits() {
        let mut tree = load("<span style=\"color: red\">abc</span>", ContentMode::Html, &fields());
        let text = tree.leaves()[0];
        let range = Selection::Range {
            anchor: Position::new(text, 1),
            focus: Position::new(text, 2),
        };
        let out = styled(&mut tree, range, StyleCommand::Color("blue".into()));
        assert_eq!(
            out,
            "<span style=\"color: red\">a</span><span style=\"color: blue\">b</span><span style=\"color: red\">c</span>"
        );
    }

    #[test]
    fn test_range_unbold_over_badge_leaves_no_empty_wrapper() {
        let mut tree = load("<b>{{lot}}</b>", ContentMode::Html, &fields());
        let root = tree.root();
        let range = Selection::Range {
            anchor: Position::new(root, 0),
            focus: Position::new(root, 1),
        };
        let out = styled(&mut tree, range, StyleCommand::Toggle(StyleKind::Bold));
        assert_eq!(out, "{{lot}}");
    }

    #[test]
    fn test_range_recolor_over_badge_keeps_one_span() {
        let mut tree = load("<span style=\"color: red\">{{lot}}</span>", ContentMode::Html, &fields());
        let root = tree.root();
        let range = Selection::Range {
            anchor: Position::new(root, 0),
            focus: Position::new(root, 1),
        };
        let out = styled(&mut tree, range, StyleCommand::Color("blue".into()));
        assert_eq!(out, "<span style=\"color: blue\">{{lot}}</span>");
    }

    #[test]
    fn test_caret_and_plain_are_noops() {
        let mut tree = load("abc", ContentMode::Html, &fields());
        let text = tree.leaves()[0];
        let caret = Selection::Caret(Position::new(text, 1));
        assert!(!apply_style(&mut tree, &caret, &StyleCommand::Toggle(StyleKind::Bold)));

        let mut plain = load("{{lot}}", ContentMode::Plain, &fields());
        let badge = first_badge(&plain);
        assert!(!apply_style(
            &mut plain,
            &Selection::Badge(badge),
            &StyleCommand::Toggle(StyleKind::Bold)
        ));
    }
}
