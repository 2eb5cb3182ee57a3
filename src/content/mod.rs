//! # Label Content
//!
//! Everything between a stored content string and the editing surface:
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`token`] | `{{field}}` scanning and the display/storage codec |
//! | [`tree`] | Editable node tree, positions and selection |
//! | [`html`] | Parsing stored content into a tree |
//! | [`badge`] | Badge insertion/removal, token promotion, normalization |
//! | [`style`] | Bold/italic/underline/color on badges and text ranges |
//! | [`serialize`] | Tree back to a content string |
//! | [`sync`] | Local-edit vs external-value state machine |
//! | [`editor`] | The inline editable surface driven by input events |
//!
//! The one bit-exact contract: content leaving this module always carries
//! tokens in `{{identifier}}` storage form.

pub mod badge;
pub mod editor;
pub mod html;
pub mod serialize;
pub mod style;
pub mod sync;
pub mod token;
pub mod tree;

pub use editor::{EditorEvent, InlineEditor, Key};
pub use serialize::extract;
pub use style::{StyleCommand, StyleKind};
pub use token::{FieldMap, FieldOption, to_display, to_storage};
pub use tree::{NodeId, NodeKind, Position, Selection, Tree, WrapperKind};

use serde::{Deserialize, Serialize};

/// How a content string is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentMode {
    /// Single-line payloads (barcode, QR): no markup, no line breaks.
    Plain,
    /// Rich paragraphs: inline tags and `<br>`.
    #[default]
    Html,
}

/// Build the editor tree for stored content.
///
/// Tokens whose identifier is a key of `fields` become badges labelled with
/// the mapped display text; other tokens stay literal text. The result is
/// normalized.
pub fn load(content: &str, mode: ContentMode, fields: &FieldMap) -> Tree {
    let mut tree = html::parse(content, mode);
    let mut selection = Selection::None;
    badge::promote_tokens(&mut tree, &mut selection, |ident| {
        fields
            .get(ident)
            .map(|label| (ident.to_string(), label.to_string()))
    });
    badge::normalize(&mut tree, &mut selection);
    tree
}
