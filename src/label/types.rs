//! Element struct types for the label document.
//!
//! All types derive `Serialize + Deserialize` with camelCase keys, matching
//! the JSON the label designer persists. Layout attributes shared by every
//! element live in [`Frame`], flattened into each struct.
//!
//! Each element implements [`ElementMeta`] to declare its display label, its
//! editor default and which of its strings carry field tokens.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::render::{Output, RenderContext};
use crate::content::ContentMode;
use crate::content::token::token;
use crate::project::symbol::{self, Symbology};

/// Metadata that every element struct must provide.
pub trait ElementMeta: Sized {
    /// Human-readable display label (e.g. "QR Code", "Manual Field").
    fn label() -> &'static str;

    /// Starter value for the designer: immediately visible, not empty.
    fn editor_default() -> Self;

    fn frame(&self) -> &Frame;

    fn frame_mut(&mut self) -> &mut Frame;

    /// Token-bearing content and how to interpret it.
    fn content(&self) -> Option<(&str, ContentMode)> {
        None
    }

    /// Operator-entered field key, for keyed element types.
    fn key(&self) -> Option<&str> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Position, size and text style, in millimetres from the top-left corner.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
    /// Degrees, clockwise.
    #[serde(default)]
    pub rotation: f32,
    #[serde(default)]
    pub align: Align,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
}

impl Frame {
    fn sized(width: f32, height: f32) -> Self {
        Self {
            x: 5.0,
            y: 5.0,
            width,
            height,
            ..Default::default()
        }
    }
}

macro_rules! impl_frame {
    () => {
        fn frame(&self) -> &Frame {
            &self.frame
        }

        fn frame_mut(&mut self) -> &mut Frame {
            &mut self.frame
        }
    };
}

// ============================================================================
// TEXT ELEMENTS
// ============================================================================

/// Fixed text. May still contain tokens, projected at render time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedText {
    #[serde(flatten)]
    pub frame: Frame,
    #[serde(default)]
    pub content: String,
}

impl ElementMeta for FixedText {
    fn label() -> &'static str { "Text" }
    fn editor_default() -> Self {
        Self { frame: Frame::sized(40.0, 8.0), content: "Texto".into() }
    }
    impl_frame!();
    fn content(&self) -> Option<(&str, ContentMode)> {
        Some((self.content.as_str(), ContentMode::Plain))
    }
}

impl FixedText {
    pub fn render(&self, ctx: &RenderContext) -> Output {
        Output::Text { text: ctx.project(&self.content) }
    }
}

/// A dynamic field bound to a data path (`product.name`, `netWeight`...).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicField {
    #[serde(flatten)]
    pub frame: Frame,
    pub field: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub suffix: String,
}

impl ElementMeta for DynamicField {
    fn label() -> &'static str { "Dynamic Field" }
    fn editor_default() -> Self {
        Self {
            frame: Frame::sized(40.0, 8.0),
            field: "product.name".into(),
            ..Default::default()
        }
    }
    impl_frame!();
}

impl DynamicField {
    pub fn render(&self, ctx: &RenderContext) -> Output {
        let template = format!("{}{}{}", self.prefix, token(&self.field), self.suffix);
        Output::Text { text: ctx.project(&template) }
    }
}

/// Free value typed by the operator at print time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualField {
    #[serde(flatten)]
    pub frame: Frame,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl ElementMeta for ManualField {
    fn label() -> &'static str { "Manual Field" }
    fn editor_default() -> Self {
        Self {
            frame: Frame::sized(40.0, 8.0),
            key: "Operario".into(),
            default_value: None,
        }
    }
    impl_frame!();
    fn key(&self) -> Option<&str> {
        Some(self.key.as_str())
    }
}

impl ManualField {
    pub fn render(&self, ctx: &RenderContext) -> Output {
        Output::Text { text: ctx.keyed_value(&self.key, self.default_value.as_deref()) }
    }
}

/// Operator picks one of a fixed list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectField {
    #[serde(flatten)]
    pub frame: Frame,
    pub key: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl ElementMeta for SelectField {
    fn label() -> &'static str { "Select Field" }
    fn editor_default() -> Self {
        Self {
            frame: Frame::sized(30.0, 8.0),
            key: "Turno".into(),
            options: vec!["Mañana".into(), "Tarde".into(), "Noche".into()],
            default_value: None,
        }
    }
    impl_frame!();
    fn key(&self) -> Option<&str> {
        Some(self.key.as_str())
    }
}

impl SelectField {
    pub fn render(&self, ctx: &RenderContext) -> Output {
        let text = ctx.keyed_value(&self.key, self.default_value.as_deref());
        if ctx.values.contains_key(&self.key) && !self.options.contains(&text) {
            tracing::warn!(key = %self.key, value = %text, "value is not one of the select options");
        }
        Output::Text { text }
    }
}

/// Yes/no box.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckboxField {
    #[serde(flatten)]
    pub frame: Frame,
    pub key: String,
    /// Text printed next to the box.
    #[serde(default)]
    pub text: String,
    /// State when no value is supplied.
    #[serde(default)]
    pub checked: bool,
}

impl ElementMeta for CheckboxField {
    fn label() -> &'static str { "Checkbox" }
    fn editor_default() -> Self {
        Self {
            frame: Frame::sized(30.0, 6.0),
            key: "Revisado".into(),
            text: "Revisado".into(),
            checked: false,
        }
    }
    impl_frame!();
    fn key(&self) -> Option<&str> {
        Some(self.key.as_str())
    }
}

impl CheckboxField {
    pub fn render(&self, ctx: &RenderContext) -> Output {
        let checked = match ctx.values.get(&self.key) {
            Some(value) => is_truthy(value),
            None => self.checked,
        };
        Output::Check { checked, text: ctx.project(&self.text) }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "si" | "sí" | "x" | "on"
    )
}

/// A date typed by the operator, or today shifted by `offset_days`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateField {
    #[serde(flatten)]
    pub frame: Frame,
    pub key: String,
    /// chrono format; the projector's date format when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Days added to today when no value is supplied (e.g. best-before).
    #[serde(default)]
    pub offset_days: i64,
}

impl ElementMeta for DateField {
    fn label() -> &'static str { "Date" }
    fn editor_default() -> Self {
        Self {
            frame: Frame::sized(30.0, 8.0),
            key: "Caducidad".into(),
            format: None,
            offset_days: 30,
        }
    }
    impl_frame!();
    fn key(&self) -> Option<&str> {
        Some(self.key.as_str())
    }
}

impl DateField {
    pub fn render(&self, ctx: &RenderContext) -> Output {
        if let Some(value) = ctx.values.get(&self.key) {
            return Output::Text { text: value.clone() };
        }
        let format = self.format.as_deref().unwrap_or(&ctx.config.date_format);
        let day = ctx.now + Duration::days(self.offset_days);
        Output::Text { text: day.format(format).to_string() }
    }
}

/// Sanitary registration mark text.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitaryRegister {
    #[serde(flatten)]
    pub frame: Frame,
    #[serde(default)]
    pub content: String,
}

impl ElementMeta for SanitaryRegister {
    fn label() -> &'static str { "Sanitary Register" }
    fn editor_default() -> Self {
        Self {
            frame: Frame::sized(25.0, 15.0),
            content: "ES 10.00000/M CE".into(),
        }
    }
    impl_frame!();
    fn content(&self) -> Option<(&str, ContentMode)> {
        Some((self.content.as_str(), ContentMode::Plain))
    }
}

impl SanitaryRegister {
    pub fn render(&self, ctx: &RenderContext) -> Output {
        Output::Text { text: ctx.project(&self.content) }
    }
}

/// Rich paragraph: inline HTML with tokens.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    #[serde(flatten)]
    pub frame: Frame,
    #[serde(default)]
    pub html: String,
}

impl ElementMeta for Paragraph {
    fn label() -> &'static str { "Paragraph" }
    fn editor_default() -> Self {
        Self {
            frame: Frame::sized(60.0, 20.0),
            html: "<b>Ingredientes:</b> ".into(),
        }
    }
    impl_frame!();
    fn content(&self) -> Option<(&str, ContentMode)> {
        Some((self.html.as_str(), ContentMode::Html))
    }
}

impl Paragraph {
    pub fn render(&self, ctx: &RenderContext) -> Output {
        Output::Markup { html: ctx.project_markup(&self.html) }
    }
}

// ============================================================================
// SYMBOLS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCode {
    #[serde(flatten)]
    pub frame: Frame,
    #[serde(default)]
    pub qr_content: String,
}

impl ElementMeta for QrCode {
    fn label() -> &'static str { "QR Code" }
    fn editor_default() -> Self {
        Self {
            frame: Frame::sized(20.0, 20.0),
            qr_content: "https://example.com".into(),
        }
    }
    impl_frame!();
    fn content(&self) -> Option<(&str, ContentMode)> {
        Some((self.qr_content.as_str(), ContentMode::Plain))
    }
}

impl QrCode {
    pub fn render(&self, ctx: &RenderContext) -> Output {
        let payload = ctx.project(&self.qr_content);
        Output::Symbol { symbol: symbol::encode(Symbology::Qr, &payload) }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Barcode {
    #[serde(flatten)]
    pub frame: Frame,
    #[serde(default)]
    pub barcode_content: String,
    #[serde(default)]
    pub symbology: Symbology,
}

impl ElementMeta for Barcode {
    fn label() -> &'static str { "Barcode" }
    fn editor_default() -> Self {
        Self {
            frame: Frame::sized(50.0, 15.0),
            barcode_content: "{{lot}}".into(),
            symbology: Symbology::Code128,
        }
    }
    impl_frame!();
    fn content(&self) -> Option<(&str, ContentMode)> {
        Some((self.barcode_content.as_str(), ContentMode::Plain))
    }
}

impl Barcode {
    pub fn render(&self, ctx: &RenderContext) -> Output {
        let payload = ctx.project(&self.barcode_content);
        Output::Symbol { symbol: symbol::encode(self.symbology, &payload) }
    }
}

// ============================================================================
// GRAPHICS
// ============================================================================

fn default_thickness() -> f32 {
    0.5
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    #[serde(flatten)]
    pub frame: Frame,
    /// Stroke width in mm.
    #[serde(default = "default_thickness")]
    pub thickness: f32,
}

impl Default for Line {
    fn default() -> Self {
        Self {
            frame: Frame::default(),
            thickness: default_thickness(),
        }
    }
}

impl ElementMeta for Line {
    fn label() -> &'static str { "Line" }
    fn editor_default() -> Self {
        Self { frame: Frame::sized(50.0, 0.0), ..Default::default() }
    }
    impl_frame!();
}

impl Line {
    pub fn render(&self, _ctx: &RenderContext) -> Output {
        Output::Line { thickness: self.thickness }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    #[serde(flatten)]
    pub frame: Frame,
    #[serde(default)]
    pub src: String,
}

impl ElementMeta for Image {
    fn label() -> &'static str { "Image" }
    fn editor_default() -> Self {
        Self {
            frame: Frame::sized(20.0, 20.0),
            src: "logo.png".into(),
        }
    }
    impl_frame!();
}

impl Image {
    pub fn render(&self, _ctx: &RenderContext) -> Output {
        Output::Image { src: self.src.clone() }
    }
}
