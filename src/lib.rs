//! # Rotulo - Label Content Engine
//!
//! Rotulo handles the text content of printable labels. It provides:
//!
//! - **Field tokens**: `{{identifier}}` placeholders, the storage/display codec
//! - **Inline editor**: a rich-text tree with atomic field badges, driven by
//!   explicit events and an explicit selection
//! - **Projection**: print-time substitution with derived weight fields,
//!   clock variables and barcode/QR payload validation
//! - **Label documents**: the element union, render and check
//!
//! ## Quick Start
//!
//! ```
//! use rotulo::content::{self, ContentMode, FieldMap, FieldOption};
//!
//! let options = [FieldOption::new("product.name", "Producto")];
//! let fields = FieldMap::from_options(&options);
//!
//! // What the designer shows
//! assert_eq!(content::to_display("<b>{{product.name}}</b>", &fields), "<b>{{Producto}}</b>");
//!
//! // What is stored, after a round trip through the editor tree
//! let tree = content::load("<strong>{{product.name}}</strong>", ContentMode::Html, &fields);
//! assert_eq!(content::extract(&tree), "<b>{{product.name}}</b>");
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`content`] | Tokens, editor tree, badges, styles, editor session |
//! | [`project`] | Print-time projection and symbol encoding |
//! | [`label`] | Label document and element types |
//! | [`printer`] | Printer resolutions |
//! | [`config`] | Configuration |
//! | [`server`] | HTTP preview API |
//! | [`error`] | Error types |

pub mod config;
pub mod content;
pub mod error;
pub mod label;
pub mod printer;
pub mod project;
pub mod server;

// Re-exports for convenience
pub use config::RotuloConfig;
pub use content::{ContentMode, InlineEditor};
pub use error::RotuloError;
pub use label::{Element, Label};
pub use printer::PrinterConfig;
