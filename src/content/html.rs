//! Parse stored content into an editor [`Tree`].
//!
//! Rich paragraphs are stored as a flat inline HTML fragment: text, `<b>`,
//! `<i>`, `<u>`, styled `<span>`s and `<br>`. That subset is all the parser
//! interprets; any other inline tag becomes a verbatim wrapper, and void or
//! self-closing tags, comments and stray markup become raw leaves. Block
//! structure is never produced.

use regex::Regex;
use std::sync::LazyLock;

use super::ContentMode;
use super::serialize::escape_text;
use super::tree::{NodeId, NodeKind, Tree, WrapperKind};

static STYLE_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^style\s*=\s*(?:"([^"]*)"|'([^']*)')$"#).expect("style pattern is valid")
});

static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(?:#[0-9]+|#[xX][0-9a-fA-F]+|[A-Za-z][A-Za-z0-9]*);").expect("entity pattern is valid"));

const VOID_TAGS: &[&str] = &["area", "col", "embed", "hr", "img", "input", "source", "wbr"];

enum Markup<'a> {
    Text(&'a str),
    Open { name: String, attrs: &'a str, self_closing: bool, raw: &'a str },
    Close { name: String },
    Raw(&'a str),
}

/// Parse `content` without badge annotation.
///
/// In [`ContentMode::Plain`] the whole string is a single text run.
pub fn parse(content: &str, mode: ContentMode) -> Tree {
    let mut tree = Tree::new(mode);
    let root = tree.root();
    if content.is_empty() {
        return tree;
    }
    if mode == ContentMode::Plain {
        let text = tree.create(NodeKind::Text(content.to_string()));
        tree.append(root, text);
        return tree;
    }

    // Open containers with the tag name they were opened with.
    let mut stack: Vec<(NodeId, String)> = vec![(root, String::new())];

    for piece in tokenize(content) {
        let parent = stack.last().map(|(id, _)| *id).unwrap_or(root);
        match piece {
            Markup::Text(text) => append_markup_text(&mut tree, parent, text),
            Markup::Raw(raw) => {
                let node = tree.create(NodeKind::Raw(raw.to_string()));
                tree.append(parent, node);
            }
            Markup::Open { name, attrs, self_closing, raw } => {
                if name == "br" {
                    let node = tree.create(NodeKind::Break);
                    tree.append(parent, node);
                } else if self_closing || VOID_TAGS.contains(&name.as_str()) {
                    let node = tree.create(NodeKind::Raw(raw.to_string()));
                    tree.append(parent, node);
                } else {
                    let node = tree.create(NodeKind::Wrapper(wrapper_kind(&name, attrs)));
                    tree.append(parent, node);
                    stack.push((node, name));
                }
            }
            Markup::Close { name } => {
                // Close up to the matching open tag; stray closers are dropped.
                if let Some(depth) = stack.iter().rposition(|(_, open)| *open == name) {
                    if depth > 0 {
                        stack.truncate(depth);
                    }
                }
            }
        }
    }

    tree
}

/// Decode a text run. Entities that would not be written back the same way
/// (`&quot;`, `&eacute;`, numeric references) stay verbatim as raw leaves.
fn append_markup_text(tree: &mut Tree, parent: NodeId, text: &str) {
    let mut last = 0;
    for m in ENTITY_RE.find_iter(text) {
        let decoded = htmlize::unescape(m.as_str());
        if escape_text(&decoded) == m.as_str() {
            continue;
        }
        if last < m.start() {
            append_text(tree, parent, htmlize::unescape(&text[last..m.start()]).into_owned());
        }
        let node = tree.create(NodeKind::Raw(m.as_str().to_string()));
        tree.append(parent, node);
        last = m.end();
    }
    if last < text.len() {
        append_text(tree, parent, htmlize::unescape(&text[last..]).into_owned());
    }
}

fn append_text(tree: &mut Tree, parent: NodeId, text: String) {
    if let Some(&last) = tree.children(parent).last() {
        if let Some(existing) = tree.text(last) {
            let merged = format!("{}{}", existing, text);
            tree.set_text(last, merged);
            return;
        }
    }
    let node = tree.create(NodeKind::Text(text));
    tree.append(parent, node);
}

fn wrapper_kind(name: &str, attrs: &str) -> WrapperKind {
    match (name, attrs) {
        ("b" | "strong", "") => WrapperKind::Bold,
        ("i" | "em", "") => WrapperKind::Italic,
        ("u", "") => WrapperKind::Underline,
        ("span", attrs) => match STYLE_ATTR_RE.captures(attrs) {
            Some(caps) => {
                let value = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str()).unwrap_or("");
                WrapperKind::Span {
                    style: htmlize::unescape(value).into_owned(),
                }
            }
            None => WrapperKind::Other {
                tag: name.to_string(),
                attrs: attrs.to_string(),
            },
        },
        _ => WrapperKind::Other {
            tag: name.to_string(),
            attrs: attrs.to_string(),
        },
    }
}

/// Split an HTML fragment into text and tag pieces.
fn tokenize(input: &str) -> Vec<Markup<'_>> {
    let mut out = Vec::new();
    let bytes = input.as_bytes();
    let mut text_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }
        let Some((piece, next)) = read_tag(input, i) else {
            i += 1;
            continue;
        };
        if text_start < i {
            out.push(Markup::Text(&input[text_start..i]));
        }
        out.push(piece);
        i = next;
        text_start = next;
    }
    if text_start < input.len() {
        out.push(Markup::Text(&input[text_start..]));
    }
    out
}

/// Read a tag starting at byte `start` (which holds `<`). Returns the piece
/// and the byte index just past it, or `None` when this `<` is plain text.
fn read_tag(input: &str, start: usize) -> Option<(Markup<'_>, usize)> {
    let rest = &input[start..];

    if rest.starts_with("<!--") {
        let end = rest.find("-->").map(|e| start + e + 3)?;
        return Some((Markup::Raw(&input[start..end]), end));
    }

    let after = rest.as_bytes().get(1).copied()?;
    if !(after.is_ascii_alphabetic() || after == b'/') {
        return None;
    }
    let end = start + rest.find('>')? + 1;
    let raw = &input[start..end];
    let inner = &raw[1..raw.len() - 1];

    if let Some(name) = inner.strip_prefix('/') {
        let name = name.trim().to_ascii_lowercase();
        if name.is_empty() {
            return None;
        }
        return Some((Markup::Close { name }, end));
    }

    let (inner, self_closing) = match inner.strip_suffix('/') {
        Some(stripped) => (stripped, true),
        None => (inner, false),
    };
    let name_end = inner
        .find(|c: char| c.is_whitespace())
        .unwrap_or(inner.len());
    let name = inner[..name_end].to_ascii_lowercase();
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return None;
    }
    let attrs = inner[name_end..].trim();
    Some((
        Markup::Open {
            name,
            attrs,
            self_closing,
            raw,
        },
        end,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(tree: &Tree, id: NodeId) -> String {
        match tree.kind(id) {
            NodeKind::Root => tree.children(id).iter().map(|&c| shape(tree, c)).collect(),
            NodeKind::Text(s) => format!("T({})", s),
            NodeKind::Badge { field, .. } => format!("B({})", field),
            NodeKind::Placeholder => "P".into(),
            NodeKind::Break => "BR".into(),
            NodeKind::Raw(s) => format!("R({})", s),
            NodeKind::Wrapper(kind) => format!(
                "{}[{}]",
                kind.tag(),
                tree.children(id).iter().map(|&c| shape(tree, c)).collect::<String>()
            ),
        }
    }

    #[test]
    fn test_parse_nested() {
        let tree = parse("a<b>b<i>c</i></b><br>d", ContentMode::Html);
        assert_eq!(shape(&tree, tree.root()), "T(a)b[T(b)i[T(c)]]BRT(d)");
    }

    #[test]
    fn test_parse_keeps_non_canonical_entities() {
        let tree = parse("a&nbsp;&quot;b&quot;", ContentMode::Html);
        assert_eq!(shape(&tree, tree.root()), "T(a\u{a0})R(&quot;)T(b)R(&quot;)");
    }

    #[test]
    fn test_parse_unescapes_text() {
        let tree = parse("1 &lt; 2 &amp;&amp; 3", ContentMode::Html);
        assert_eq!(shape(&tree, tree.root()), "T(1 < 2 && 3)");
    }

    #[test]
    fn test_parse_lone_angle_bracket_is_text() {
        let tree = parse("a < b", ContentMode::Html);
        assert_eq!(shape(&tree, tree.root()), "T(a < b)");
    }

    #[test]
    fn test_parse_span_color() {
        let tree = parse("<span style='color: red'>x</span>", ContentMode::Html);
        let span = tree.children(tree.root())[0];
        match tree.kind(span) {
            NodeKind::Wrapper(kind) => assert_eq!(kind.foreground(), Some("red")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_unclosed_and_stray() {
        let tree = parse("</i>a<b>b", ContentMode::Html);
        assert_eq!(shape(&tree, tree.root()), "T(a)b[T(b)]");
    }

    #[test]
    fn test_parse_plain_ignores_markup() {
        let tree = parse("<b>x</b>", ContentMode::Plain);
        assert_eq!(shape(&tree, tree.root()), "T(<b>x</b>)");
    }
}
