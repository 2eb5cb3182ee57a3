//! # Label Document
//!
//! A label is a canvas in millimetres plus an ordered list of elements.
//! The same types are the Rust API and the persisted JSON.
//!
//! ```
//! use std::collections::HashMap;
//! use rotulo::config::ProjectorConfig;
//! use rotulo::label::Label;
//!
//! let label = Label::from_json(r#"{
//!     "id": "l1",
//!     "name": "Queso",
//!     "canvas": {"width": 60, "height": 40},
//!     "elements": [{"type": "text", "id": "t1", "x": 2, "y": 2, "content": "Lote {{lot}}"}]
//! }"#).unwrap();
//!
//! let values = HashMap::from([("lot".to_string(), "L-42".to_string())]);
//! let rendered = label.render(&values, &ProjectorConfig::default());
//! assert_eq!(rendered[0].output.text(), Some("Lote L-42"));
//! ```

pub mod render;
pub mod types;

pub use render::{Output, RenderContext, RenderedElement};
pub use types::*;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ProjectorConfig;
use crate::content::token::{FieldOption, scan_tokens};
use crate::content::ContentMode;
use crate::error::RotuloError;
use crate::printer::PrinterConfig;
use crate::project::symbol::{self, Symbology};
use crate::project::{self, Values};

/// Offset applied to a duplicated element, in mm.
pub const DUPLICATE_OFFSET_MM: f32 = 2.0;

/// Label size in millimetres and orientation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Canvas {
    pub width: f32,
    pub height: f32,
    /// Degrees; 90 and 270 swap width and height on the printer.
    #[serde(default)]
    pub rotation: f32,
}

impl Canvas {
    /// Rotation snapped to the nearest quarter turn, in `0..360`.
    pub fn quarter_turn(&self) -> u16 {
        let quarters = (self.rotation.rem_euclid(360.0) / 90.0).round() as u16 % 4;
        quarters * 90
    }

    /// Width and height as fed through the printer.
    pub fn effective_size(&self) -> (f32, f32) {
        if self.quarter_turn() % 180 == 90 {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }

    /// Effective size in printer dots.
    pub fn to_dots(&self, printer: &PrinterConfig) -> (u16, u16) {
        let (w, h) = self.effective_size();
        (printer.mm_to_dots(w), printer.mm_to_dots(h))
    }
}

/// A label design.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub canvas: Canvas,
    #[serde(default)]
    pub elements: Vec<Element>,
}

/// A problem found by [`Label::check`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
    pub message: String,
}

impl Label {
    pub fn new(name: impl Into<String>, canvas: Canvas) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            canvas,
            elements: Vec::new(),
        }
    }

    /// Parse a label document.
    pub fn from_json(json: &str) -> Result<Self, RotuloError> {
        serde_json::from_str(json).map_err(|e| RotuloError::Label(e.to_string()))
    }

    /// Add an element at the top of the stacking order.
    pub fn push(&mut self, element: Element) {
        self.elements.push(element);
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id() == id)
    }

    /// Copy an element right after the original, with a fresh id and a
    /// small offset so the copy is visible.
    pub fn duplicate_element(&mut self, id: &str) -> Option<&Element> {
        let index = self.elements.iter().position(|e| e.id() == id)?;
        let mut copy = self.elements[index].clone();
        let frame = copy.frame_mut();
        frame.id = Uuid::new_v4().to_string();
        frame.x += DUPLICATE_OFFSET_MM;
        frame.y += DUPLICATE_OFFSET_MM;
        self.elements.insert(index + 1, copy);
        self.elements.get(index + 1)
    }

    pub fn remove_element(&mut self, id: &str) -> Option<Element> {
        let index = self.elements.iter().position(|e| e.id() == id)?;
        Some(self.elements.remove(index))
    }

    /// Keys used by more than one keyed element, in first-seen order.
    pub fn duplicate_keys(&self) -> Vec<String> {
        let keys: Vec<&str> = self.elements.iter().filter_map(Element::key).collect();
        let mut duplicates: Vec<String> = Vec::new();
        for (i, key) in keys.iter().enumerate() {
            if keys[..i].contains(key) && !duplicates.iter().any(|d| d == key) {
                duplicates.push(key.to_string());
            }
        }
        if !duplicates.is_empty() {
            tracing::warn!(keys = ?duplicates, label = %self.name, "duplicate field keys");
        }
        duplicates
    }

    /// Picker options for the label's operator-entered keys.
    pub fn manual_field_options(&self) -> Vec<FieldOption> {
        let mut options: Vec<FieldOption> = Vec::new();
        for key in self.elements.iter().filter_map(Element::key) {
            if !options.iter().any(|o| o.value == key) {
                options.push(FieldOption::manual(key));
            }
        }
        options
    }

    /// Dynamic options followed by the label's manual options.
    pub fn field_options(&self, dynamic: &[FieldOption]) -> Vec<FieldOption> {
        let mut options = dynamic.to_vec();
        for manual in self.manual_field_options() {
            if !options.iter().any(|o| o.value == manual.value) {
                options.push(manual);
            }
        }
        options
    }

    /// Project every element against `values`.
    pub fn render(&self, values: &Values, config: &ProjectorConfig) -> Vec<RenderedElement> {
        self.render_at(values, config, Local::now())
    }

    /// [`Label::render`] with an explicit clock.
    pub fn render_at(&self, values: &Values, config: &ProjectorConfig, now: DateTime<Local>) -> Vec<RenderedElement> {
        let ctx = RenderContext::new(values, config, now);
        self.elements
            .iter()
            .map(|element| RenderedElement {
                type_name: element.type_name(),
                frame: element.frame().clone(),
                output: element.render(&ctx),
            })
            .collect()
    }

    /// Duplicate keys and symbol payloads that cannot be encoded.
    ///
    /// Payloads that still contain tokens after projection are skipped:
    /// they can only be judged once values exist.
    pub fn check(&self, values: &Values, config: &ProjectorConfig) -> Vec<Issue> {
        let mut issues: Vec<Issue> = self
            .duplicate_keys()
            .into_iter()
            .map(|key| Issue {
                element: None,
                message: format!("duplicate field key \"{}\"", key),
            })
            .collect();

        for element in &self.elements {
            let Some(symbology) = element.symbology() else { continue };
            let Some((content, _)) = element.content() else { continue };
            let payload = project::project(content, values, config);
            if !scan_tokens(&payload).is_empty() {
                continue;
            }
            if let Err(message) = symbol::validate(symbology, &payload) {
                issues.push(Issue {
                    element: Some(element.id().to_string()),
                    message,
                });
            }
        }
        issues
    }
}

/// Define the Element enum and all dispatch methods from a single list.
///
/// Adding an element type: add one line here, then define the struct in
/// `types.rs` with `impl ElementMeta` and a `render` method.
macro_rules! define_elements {
    ($($variant:ident($inner:ty)),+ $(,)?) => {
        /// The element union. `{"type": "qr", "qrContent": "..."}` in JSON.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "type", rename_all = "snake_case")]
        pub enum Element {
            $($variant($inner),)+
        }

        impl Element {
            pub fn render(&self, ctx: &RenderContext) -> Output {
                match self { $(Element::$variant(e) => e.render(ctx),)+ }
            }

            pub fn frame(&self) -> &Frame {
                match self { $(Element::$variant(e) => e.frame(),)+ }
            }

            pub fn frame_mut(&mut self) -> &mut Frame {
                match self { $(Element::$variant(e) => e.frame_mut(),)+ }
            }

            /// Token-bearing content (from [`ElementMeta::content`]).
            pub fn content(&self) -> Option<(&str, ContentMode)> {
                match self { $(Element::$variant(e) => e.content(),)+ }
            }

            /// Operator-entered key (from [`ElementMeta::key`]).
            pub fn key(&self) -> Option<&str> {
                match self { $(Element::$variant(e) => e.key(),)+ }
            }

            /// Human-readable display label (from [`ElementMeta::label`]).
            pub fn label(&self) -> &'static str {
                match self { $(Element::$variant(_) => <$inner>::label(),)+ }
            }

            /// Designer defaults for every element type.
            pub fn all_editor_defaults() -> Vec<Self> {
                vec![$(Element::$variant(<$inner>::editor_default()),)+]
            }
        }
    };
}

define_elements! {
    Text(FixedText),
    Dynamic(DynamicField),
    Manual(ManualField),
    Select(SelectField),
    Checkbox(CheckboxField),
    Date(DateField),
    Qr(QrCode),
    Barcode(Barcode),
    Sanitary(SanitaryRegister),
    Paragraph(Paragraph),
    Line(Line),
    Image(Image),
}

impl Element {
    pub fn id(&self) -> &str {
        &self.frame().id
    }

    /// The serde type tag (`"text"`, `"qr"`...).
    pub fn type_name(&self) -> String {
        serde_json::to_value(self)
            .ok()
            .and_then(|v| v.get("type").and_then(|t| t.as_str()).map(str::to_string))
            .unwrap_or_default()
    }

    /// The symbology of symbol elements.
    pub fn symbology(&self) -> Option<Symbology> {
        match self {
            Element::Barcode(b) => Some(b.symbology),
            Element::Qr(_) => Some(Symbology::Qr),
            _ => None,
        }
    }
}

/// Element type metadata for the designer.
#[derive(Debug, Clone, Serialize)]
pub struct ElementTypeMeta {
    #[serde(rename = "type")]
    pub type_name: String,
    pub label: String,
}

/// Every element type with its display label.
pub fn element_types() -> Vec<ElementTypeMeta> {
    Element::all_editor_defaults()
        .iter()
        .map(|e| ElementTypeMeta {
            type_name: e.type_name(),
            label: e.label().to_string(),
        })
        .collect()
}

/// An element with designer defaults, by type name.
pub fn default_element(type_name: &str) -> Option<Element> {
    Element::all_editor_defaults()
        .into_iter()
        .find(|e| e.type_name() == type_name)
}
