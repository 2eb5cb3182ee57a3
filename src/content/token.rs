//! Field tokens and the display/storage codec.
//!
//! Content strings carry `{{identifier}}` tokens. The identifier is the only
//! persisted form; the human-readable label is a display-time projection.
//!
//! ```
//! use rotulo::content::token::{FieldMap, FieldOption, to_display, to_storage};
//!
//! let options = [FieldOption::new("lot", "Lote de producción")];
//! let fields = FieldMap::from_options(&options);
//!
//! let shown = to_display("Lote: {{lot}}", &fields);
//! assert_eq!(shown, "Lote: {{Lote de producción}}");
//! assert_eq!(to_storage(&shown, &fields.invert()), "Lote: {{lot}}");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Range;
use std::sync::LazyLock;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^{}]+)\}\}").expect("token pattern is valid"));

/// A substitutable identifier offered to the user.
///
/// Dynamic fields have `value != label` (a data path with a friendly name);
/// manual fields use their key for both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    pub value: String,
    pub label: String,
}

impl FieldOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// A manual field option: the key doubles as the display name.
    pub fn manual(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            value: key.clone(),
            label: key,
        }
    }

    /// Which picker bucket this option belongs to.
    pub fn kind(&self) -> FieldKind {
        if self.value == self.label {
            FieldKind::Manual
        } else {
            FieldKind::Dynamic
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Derived automatically from box/product data.
    Dynamic,
    /// Supplied by the operator at print time.
    Manual,
}

/// One `{{identifier}}` occurrence inside a content string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSpan {
    /// Byte range of the whole token, braces included.
    pub range: Range<usize>,
    pub identifier: String,
}

/// Find every token in `content`, in order.
pub fn scan_tokens(content: &str) -> Vec<TokenSpan> {
    TOKEN_RE
        .captures_iter(content)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let ident = caps.get(1)?;
            Some(TokenSpan {
                range: whole.range(),
                identifier: ident.as_str().to_string(),
            })
        })
        .collect()
}

/// Rewrite every token through `resolve`.
///
/// `resolve` receives the identifier and returns the replacement text, or
/// `None` to leave the literal token in place. Text between tokens is copied
/// through untouched.
pub fn replace_tokens<F>(content: &str, mut resolve: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let mut out = String::with_capacity(content.len());
    let mut last = 0;
    for span in scan_tokens(content) {
        out.push_str(&content[last..span.range.start]);
        match resolve(&span.identifier) {
            Some(replacement) => out.push_str(&replacement),
            None => out.push_str(&content[span.range.clone()]),
        }
        last = span.range.end;
    }
    out.push_str(&content[last..]);
    out
}

/// Format an identifier as a token.
pub fn token(identifier: &str) -> String {
    format!("{{{{{}}}}}", identifier)
}

/// An ordered one-directional identifier map (`field -> label`, or its inverse).
///
/// Insertion order is kept so that inversion is deterministic: when two
/// fields share a label, the later one wins the inverse entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the `field -> label` map from picker options.
    pub fn from_options(options: &[FieldOption]) -> Self {
        let mut map = Self::new();
        for option in options {
            map.insert(option.value.clone(), option.label.clone());
        }
        map
    }

    /// Insert or overwrite a mapping.
    pub fn insert(&mut self, from: String, to: String) {
        match self.index.get(&from) {
            Some(&i) => self.entries[i].1 = to,
            None => {
                self.index.insert(from.clone(), self.entries.len());
                self.entries.push((from, to));
            }
        }
    }

    pub fn get(&self, from: &str) -> Option<&str> {
        self.index.get(from).map(|&i| self.entries[i].1.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(a, b)| (a.as_str(), b.as_str()))
    }

    /// The reverse mapping. Colliding targets collapse onto the last source.
    pub fn invert(&self) -> Self {
        let collisions = self.label_collisions();
        if !collisions.is_empty() {
            tracing::warn!(
                labels = ?collisions,
                "several fields share a label; the inverse map keeps the last one"
            );
        }
        let mut inverse = Self::new();
        for (from, to) in &self.entries {
            inverse.insert(to.clone(), from.clone());
        }
        inverse
    }

    /// Targets shared by more than one source, in first-seen order.
    pub fn label_collisions(&self) -> Vec<String> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for (_, to) in &self.entries {
            *counts.entry(to.as_str()).or_default() += 1;
        }
        let mut seen = Vec::new();
        for (_, to) in &self.entries {
            if counts[to.as_str()] > 1 && !seen.contains(to) {
                seen.push(to.clone());
            }
        }
        seen
    }
}

/// Replace `{{field}}` with `{{label}}` for every mapped field.
pub fn to_display(content: &str, fields: &FieldMap) -> String {
    replace_tokens(content, |ident| fields.get(ident).map(token))
}

/// Replace `{{label}}` with `{{field}}`; `labels` is `FieldMap::invert()` of
/// the display map.
///
/// `to_storage(to_display(c))` gives back `c` only while `c` holds no token
/// spelled like a label: a stored `{{Peso}}` whose field is not `Peso`
/// becomes that label's field.
pub fn to_storage(content: &str, labels: &FieldMap) -> String {
    replace_tokens(content, |ident| labels.get(ident).map(token))
}

/// Display form of `content`, truncated to `limit` characters.
pub fn preview(content: &str, fields: &FieldMap, limit: usize) -> String {
    let shown = to_display(content, fields);
    if shown.chars().count() <= limit {
        return shown;
    }
    let mut cut: String = shown.chars().take(limit).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fields() -> FieldMap {
        FieldMap::from_options(&[
            FieldOption::new("product.weight", "Peso"),
            FieldOption::new("lot", "Lote de producción"),
            FieldOption::manual("Operario"),
        ])
    }

    #[test]
    fn test_scan_tokens() {
        let spans = scan_tokens("a {{x}} b {{product.name}}{{}} {{y");
        let idents: Vec<_> = spans.iter().map(|s| s.identifier.as_str()).collect();
        assert_eq!(idents, vec!["x", "product.name"]);
        assert_eq!(spans[0].range, 2..7);
    }

    #[test]
    fn test_to_display_leaves_unknown_tokens() {
        let out = to_display("{{lot}} / {{unknown}} / {{Operario}}", &fields());
        assert_eq!(out, "{{Lote de producción}} / {{unknown}} / {{Operario}}");
    }

    #[test]
    fn test_inverse_law() {
        let map = fields();
        let content = "<b>{{lot}}</b> pesa {{product.weight}} kg {{x}}";
        let shown = to_display(content, &map);
        assert_eq!(to_storage(&shown, &map.invert()), content);
    }

    #[test]
    fn test_literal_label_token_is_rewritten() {
        let map = fields();
        let shown = to_display("{{Peso}} {{lot}}", &map);
        assert_eq!(shown, "{{Peso}} {{Lote de producción}}");
        assert_eq!(to_storage(&shown, &map.invert()), "{{product.weight}} {{lot}}");
    }

    #[test]
    fn test_label_collision_last_wins() {
        let map = FieldMap::from_options(&[
            FieldOption::new("a", "Same"),
            FieldOption::new("b", "Same"),
        ]);
        assert_eq!(map.label_collisions(), vec!["Same".to_string()]);
        let inverse = map.invert();
        assert_eq!(to_storage("{{Same}}", &inverse), "{{b}}");
        // Round trip collapses both fields onto one.
        let shown = to_display("{{a}}{{b}}", &map);
        assert_eq!(to_storage(&shown, &inverse), "{{b}}{{b}}");
    }

    #[test]
    fn test_preview_truncates_after_conversion() {
        let map = FieldMap::from_options(&[FieldOption::new("x", "Long label")]);
        // Converting first makes the result longer than the stored form.
        assert_eq!(preview("{{x}}", &map, 8), "{{Long l...");
        assert_eq!(preview("{{x}}", &map, 120), "{{Long label}}");
    }

    #[test]
    fn test_field_kind() {
        assert_eq!(FieldOption::new("a.b", "A").kind(), FieldKind::Dynamic);
        assert_eq!(FieldOption::manual("Turno").kind(), FieldKind::Manual);
    }
}
