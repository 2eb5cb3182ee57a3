//! Render output: what each element shows once values are known.

use chrono::{DateTime, Local};
use serde::Serialize;

use super::types::Frame;
use crate::config::ProjectorConfig;
use crate::content::token::token;
use crate::project::{self, Symbol, Values};

/// Values, settings and the clock, shared by every element of one render.
pub struct RenderContext<'a> {
    pub values: &'a Values,
    pub config: &'a ProjectorConfig,
    pub now: DateTime<Local>,
}

impl<'a> RenderContext<'a> {
    pub fn new(values: &'a Values, config: &'a ProjectorConfig, now: DateTime<Local>) -> Self {
        Self { values, config, now }
    }

    pub fn project(&self, content: &str) -> String {
        project::project_at(content, self.values, self.config, self.now)
    }

    pub fn project_markup(&self, content: &str) -> String {
        project::project_markup(content, self.values, self.config, self.now)
    }

    /// Value of an operator-entered key, its default, or the visible token.
    pub fn keyed_value(&self, key: &str, default: Option<&str>) -> String {
        match (self.values.get(key), default) {
            (Some(value), _) => value.clone(),
            (None, Some(default)) => self.project(default),
            (None, None) => token(key),
        }
    }
}

/// Rendered content of one element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Output {
    Text { text: String },
    /// Inline HTML with values escaped.
    Markup { html: String },
    Check { checked: bool, text: String },
    Symbol { symbol: Symbol },
    Line { thickness: f32 },
    Image { src: String },
}

impl Output {
    /// Printable text for text-like output; the error message for a
    /// rejected symbol payload.
    pub fn text(&self) -> Option<&str> {
        match self {
            Output::Text { text } | Output::Check { text, .. } => Some(text.as_str()),
            Output::Markup { html } => Some(html.as_str()),
            Output::Symbol { symbol } => match symbol {
                Symbol::Linear { text, .. } | Symbol::Matrix { text, .. } => Some(text.as_str()),
                Symbol::Invalid { message } => Some(message.as_str()),
            },
            Output::Line { .. } | Output::Image { .. } => None,
        }
    }
}

/// One element after projection, with its layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedElement {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(flatten)]
    pub frame: Frame,
    pub output: Output,
}
