//! Badge bookkeeping: insertion, removal, token promotion and the
//! normalization pass that keeps the tree in the shape the editor expects.
//!
//! Every operation that moves or deletes nodes takes the current
//! [`Selection`] and keeps it pointing at the same logical place.

use super::token::scan_tokens;
use super::tree::{NodeId, NodeKind, Position, Selection, Tree, byte_index};

const ZWSP: char = '\u{200B}';

/// Create a badge and its placeholder at a container position.
///
/// Returns `(badge, placeholder)`.
pub fn insert_badge(tree: &mut Tree, parent: NodeId, index: usize, field: &str, label: &str) -> (NodeId, NodeId) {
    let badge = tree.create(NodeKind::Badge {
        field: field.to_string(),
        label: label.to_string(),
    });
    let placeholder = tree.create(NodeKind::Placeholder);
    tree.insert(parent, index, badge);
    tree.insert(parent, index + 1, placeholder);
    (badge, placeholder)
}

/// Delete a badge together with the placeholder that follows it.
///
/// The selection collapses to where the badge was.
pub fn remove_badge(tree: &mut Tree, selection: &mut Selection, badge: NodeId) -> bool {
    if !tree.is_badge(badge) || !tree.is_attached(badge) {
        return false;
    }
    let follower = tree.next_sibling(badge).filter(|&n| tree.is_placeholder(n));
    let landing = tree.position_before(badge);
    if let Some(placeholder) = follower {
        remove_node(tree, selection, placeholder);
    }
    remove_node(tree, selection, badge);
    if let Some(pos) = landing {
        *selection = Selection::Caret(pos);
    }
    tracing::debug!(?badge, "badge removed");
    true
}

/// Detach `node`, re-homing any selection point inside it.
pub fn remove_node(tree: &mut Tree, selection: &mut Selection, node: NodeId) {
    let (Some(parent), Some(index)) = (tree.parent(node), tree.index_in_parent(node)) else {
        return;
    };
    if let Selection::Badge(badge) = *selection {
        if tree.is_descendant_of(badge, node) {
            *selection = Selection::None;
        }
    }
    for pos in selection.positions_mut() {
        if tree.is_descendant_of(pos.node, node) {
            *pos = Position::new(parent, index);
        } else if pos.node == parent && pos.offset > index {
            pos.offset -= 1;
        }
    }
    tree.detach(node);
}

/// Shift container offsets in `parent` at or past `from` by `delta` inserted nodes.
fn shift_positions(selection: &mut Selection, parent: NodeId, from: usize, delta: usize) {
    for pos in selection.positions_mut() {
        if pos.node == parent && pos.offset >= from {
            pos.offset += delta;
        }
    }
}

/// Promote complete `{{x}}` runs inside text nodes to badges.
///
/// `resolve` maps a token identifier to `(field, label)` or rejects it.
/// Returns the badges created, in document order.
pub fn promote_tokens<F>(tree: &mut Tree, selection: &mut Selection, resolve: F) -> Vec<NodeId>
where
    F: Fn(&str) -> Option<(String, String)>,
{
    let mut created = Vec::new();
    let mut queue: Vec<NodeId> = tree
        .leaves()
        .into_iter()
        .filter(|&id| tree.is_text(id))
        .rev()
        .collect();

    while let Some(node) = queue.pop() {
        let Some(text) = tree.text(node).map(str::to_string) else {
            continue;
        };
        let Some((span, field, label)) = scan_tokens(&text)
            .into_iter()
            .find_map(|span| resolve(&span.identifier).map(|(f, l)| (span, f, l)))
        else {
            continue;
        };
        let (Some(parent), Some(index)) = (tree.parent(node), tree.index_in_parent(node)) else {
            continue;
        };

        let start_chars = text[..span.range.start].chars().count();
        let end_chars = start_chars + text[span.range.clone()].chars().count();
        let before = text[..span.range.start].to_string();
        let after = text[span.range.end..].to_string();

        tree.set_text(node, before);
        let (badge, placeholder) = insert_badge(tree, parent, index + 1, &field, &label);
        let rest = tree.create(NodeKind::Text(after));
        tree.insert(parent, index + 3, rest);
        shift_positions(selection, parent, index + 1, 3);

        for pos in selection.positions_mut() {
            if pos.node != node || pos.offset <= start_chars {
                continue;
            }
            *pos = if pos.offset >= end_chars {
                Position::new(rest, pos.offset - end_chars)
            } else {
                Position::new(placeholder, 0)
            };
        }

        tracing::debug!(field = %field, "token promoted to badge");
        created.push(badge);
        queue.push(rest);
    }

    created
}

/// Repair the tree after a mutation.
///
/// Afterwards: no zero-width spaces inside text, no empty text nodes or
/// empty wrappers, every badge followed by exactly one placeholder, no
/// placeholder without a badge before it, no adjacent text nodes.
/// Running it twice is the same as running it once.
pub fn normalize(tree: &mut Tree, selection: &mut Selection) {
    strip_zero_width(tree, selection);
    remove_empty(tree, selection);
    repair_placeholders(tree, selection);
    // Dropping a stray placeholder can leave its wrapper empty.
    remove_empty(tree, selection);
    merge_text(tree, selection);
}

fn strip_zero_width(tree: &mut Tree, selection: &mut Selection) {
    for id in tree.leaves() {
        let Some(text) = tree.text(id) else { continue };
        if !text.contains(ZWSP) {
            continue;
        }
        let text = text.to_string();
        for pos in selection.positions_mut() {
            if pos.node == id {
                let prefix = &text[..byte_index(&text, pos.offset)];
                pos.offset = prefix.chars().filter(|&c| c != ZWSP).count();
            }
        }
        tree.set_text(id, text.replace(ZWSP, ""));
    }
}

fn remove_empty(tree: &mut Tree, selection: &mut Selection) {
    let root = tree.root();
    for id in tree.preorder().into_iter().rev() {
        if id == root {
            continue;
        }
        let empty = match tree.kind(id) {
            NodeKind::Text(s) => s.is_empty(),
            NodeKind::Wrapper(_) => tree.children(id).is_empty(),
            _ => false,
        };
        if empty {
            remove_node(tree, selection, id);
        }
    }
}

fn repair_placeholders(tree: &mut Tree, selection: &mut Selection) {
    let containers: Vec<NodeId> = tree
        .preorder()
        .into_iter()
        .filter(|&id| tree.is_container(id))
        .collect();

    for parent in containers {
        let mut i = 0;
        while i < tree.children(parent).len() {
            let child = tree.children(parent)[i];
            match tree.kind(child) {
                NodeKind::Placeholder => {
                    let after_badge = i > 0 && tree.is_badge(tree.children(parent)[i - 1]);
                    if !after_badge {
                        remove_node(tree, selection, child);
                        continue;
                    }
                }
                NodeKind::Badge { .. } => {
                    let followed = tree
                        .children(parent)
                        .get(i + 1)
                        .is_some_and(|&next| tree.is_placeholder(next));
                    if !followed {
                        let placeholder = tree.create(NodeKind::Placeholder);
                        tree.insert(parent, i + 1, placeholder);
                        shift_positions(selection, parent, i + 1, 1);
                    }
                    i += 1;
                }
                _ => {}
            }
            i += 1;
        }
    }
}

fn merge_text(tree: &mut Tree, selection: &mut Selection) {
    let containers: Vec<NodeId> = tree
        .preorder()
        .into_iter()
        .filter(|&id| tree.is_container(id))
        .collect();

    for parent in containers {
        let mut i = 1;
        while i < tree.children(parent).len() {
            let prev = tree.children(parent)[i - 1];
            let cur = tree.children(parent)[i];
            let (Some(a), Some(b)) = (tree.text(prev), tree.text(cur)) else {
                i += 1;
                continue;
            };
            let offset = a.chars().count();
            let merged = format!("{}{}", a, b);
            for pos in selection.positions_mut() {
                if pos.node == cur {
                    *pos = Position::new(prev, offset + pos.offset);
                }
            }
            tree.set_text(prev, merged);
            remove_node(tree, selection, cur);
        }
    }
}
