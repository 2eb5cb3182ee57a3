//! Tree back to a stored content string.
//!
//! Badges turn back into `{{field}}` tokens inside whatever style wrappers
//! enclose them; placeholders and zero-width spaces are editor-only and
//! never reach the output. The live tree is only read.

use super::ContentMode;
use super::token::token;
use super::tree::{NodeId, NodeKind, Tree};

/// Serialize the editor tree to storage form.
pub fn extract(tree: &Tree) -> String {
    let mut out = String::new();
    for &child in tree.children(tree.root()) {
        emit(tree, child, &mut out);
    }
    out
}

fn emit(tree: &Tree, id: NodeId, out: &mut String) {
    let html = tree.mode() == ContentMode::Html;
    match tree.kind(id) {
        NodeKind::Root => {
            for &child in tree.children(id) {
                emit(tree, child, out);
            }
        }
        NodeKind::Text(text) => {
            let text = text.replace('\u{200B}', "");
            if html {
                out.push_str(&escape_text(&text));
            } else {
                out.push_str(&text);
            }
        }
        NodeKind::Badge { field, .. } => out.push_str(&token(field)),
        NodeKind::Placeholder => {}
        NodeKind::Break => {
            if html {
                out.push_str("<br>");
            }
        }
        NodeKind::Raw(raw) => {
            if html {
                out.push_str(raw);
            }
        }
        NodeKind::Wrapper(kind) => {
            if html {
                out.push_str(&kind.open_tag());
            }
            for &child in tree.children(id) {
                emit(tree, child, out);
            }
            if html {
                out.push_str(&kind.close_tag());
            }
        }
    }
}

/// Escape a text run the way a contenteditable host serializes it.
pub(crate) fn escape_text(text: &str) -> String {
    htmlize::escape_text(text).replace('\u{A0}', "&nbsp;")
}

/// `<openTags>{{field}}<closeTags>` for one badge, with wrappers collected
/// from its ancestor chain (innermost tag closest to the token).
pub fn badge_markup(tree: &Tree, badge: NodeId) -> Option<String> {
    let NodeKind::Badge { field, .. } = tree.kind(badge) else {
        return None;
    };
    let chain: Vec<_> = tree
        .ancestors(badge)
        .into_iter()
        .filter_map(|id| match tree.kind(id) {
            NodeKind::Wrapper(kind) => Some(kind),
            _ => None,
        })
        .collect();

    let mut out = String::new();
    for kind in chain.iter().rev() {
        out.push_str(&kind.open_tag());
    }
    out.push_str(&token(field));
    for kind in &chain {
        out.push_str(&kind.close_tag());
    }
    Some(out)
}

/// Visible text: badges show their label, breaks become newlines.
pub fn display_text(tree: &Tree) -> String {
    tree.leaves()
        .into_iter()
        .map(|id| match tree.kind(id) {
            NodeKind::Text(text) => text.replace('\u{200B}', ""),
            NodeKind::Badge { label, .. } => token(label),
            NodeKind::Break => "\n".to_string(),
            NodeKind::Raw(raw) if raw.starts_with('&') => htmlize::unescape(raw.as_str()).into_owned(),
            _ => String::new(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::html::parse;
    use crate::content::tree::WrapperKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_badge_markup_orders_wrappers() {
        let mut tree = parse("", ContentMode::Html);
        let root = tree.root();
        let badge = tree.create(NodeKind::Badge {
            field: "lot".into(),
            label: "Lote".into(),
        });
        tree.append(root, badge);
        tree.wrap(badge, WrapperKind::Bold);
        tree.wrap(badge, WrapperKind::Italic);
        assert_eq!(badge_markup(&tree, badge).as_deref(), Some("<b><i>{{lot}}</i></b>"));
        assert_eq!(extract(&tree), "<b><i>{{lot}}</i></b>");
    }

    #[test]
    fn test_extract_strips_placeholders_and_zwsp() {
        let mut tree = parse("a\u{200B}b", ContentMode::Html);
        let root = tree.root();
        let placeholder = tree.create(NodeKind::Placeholder);
        tree.append(root, placeholder);
        assert_eq!(extract(&tree), "ab");
    }

    #[test]
    fn test_display_text() {
        let mut tree = parse("Lote: <br>", ContentMode::Html);
        let root = tree.root();
        let badge = tree.create(NodeKind::Badge {
            field: "lot".into(),
            label: "Lote de producción".into(),
        });
        tree.insert(root, 1, badge);
        assert_eq!(display_text(&tree), "Lote: {{Lote de producción}}\n");
    }
}
