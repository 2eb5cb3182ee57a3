//! # Render Projector
//!
//! Replaces tokens in stored content with live values for on-canvas preview
//! and print. Resolution order for each `{{identifier}}`:
//!
//! 1. an explicit entry in the values map;
//! 2. a derived weight field (`netWeightFormatted`, `netWeight6digits`);
//! 3. a clock variable (`date`, `time`, `datetime`, `iso_date`, `year`);
//! 4. otherwise the literal token stays, so a missing value is visible.
//!
//! ```
//! use std::collections::HashMap;
//! use rotulo::config::ProjectorConfig;
//! use rotulo::project::project;
//!
//! let values = HashMap::from([("netWeight".to_string(), "15,500 kg".to_string())]);
//! let out = project("{{netWeightFormatted}} / {{netWeight6digits}} / {{lot}}", &values, &ProjectorConfig::default());
//! assert_eq!(out, "15,50 / 001550 / {{lot}}");
//! ```

pub mod number;
pub mod symbol;

pub use number::{NumberLocale, format_grouped, parse_decimal, six_digits};
pub use symbol::{Symbol, Symbology};

use chrono::{DateTime, Local};
use std::collections::HashMap;

use crate::config::ProjectorConfig;
use crate::content::token::replace_tokens;

/// Final values at render time: identifier to text.
pub type Values = HashMap<String, String>;

pub const NET_WEIGHT: &str = "netWeight";
pub const NET_WEIGHT_FORMATTED: &str = "netWeightFormatted";
pub const NET_WEIGHT_6DIGITS: &str = "netWeight6digits";

/// Project `content` against `values`, reading the clock for date variables.
pub fn project(content: &str, values: &Values, config: &ProjectorConfig) -> String {
    project_at(content, values, config, Local::now())
}

/// [`project`] with an explicit clock.
pub fn project_at(content: &str, values: &Values, config: &ProjectorConfig, now: DateTime<Local>) -> String {
    let clock = clock_variables(config, now);
    replace_tokens(content, |ident| resolve(ident, values, config, &clock))
}

/// Like [`project_at`], but values are HTML-escaped before insertion, for
/// rich paragraph markup.
pub fn project_markup(content: &str, values: &Values, config: &ProjectorConfig, now: DateTime<Local>) -> String {
    let clock = clock_variables(config, now);
    replace_tokens(content, |ident| {
        resolve(ident, values, config, &clock).map(|v| htmlize::escape_text(v.as_str()).into_owned())
    })
}

fn clock_variables(config: &ProjectorConfig, now: DateTime<Local>) -> HashMap<String, String> {
    if config.builtins {
        builtin_variables(now, &config.date_format)
    } else {
        HashMap::new()
    }
}

fn resolve(ident: &str, values: &Values, config: &ProjectorConfig, clock: &HashMap<String, String>) -> Option<String> {
    if let Some(value) = values.get(ident) {
        return Some(value.clone());
    }
    if let Some(value) = derived_value(ident, values, config) {
        return Some(value);
    }
    clock.get(ident).cloned()
}

/// Compute a derived weight field from `netWeight` (or the configured default).
///
/// Returns `None` for other identifiers and when no weight can be parsed.
pub fn derived_value(ident: &str, values: &Values, config: &ProjectorConfig) -> Option<String> {
    if ident != NET_WEIGHT_FORMATTED && ident != NET_WEIGHT_6DIGITS {
        return None;
    }
    let raw = values
        .get(NET_WEIGHT)
        .map(String::as_str)
        .or(config.net_weight_default.as_deref())?;
    let Some(weight) = parse_decimal(raw) else {
        tracing::warn!(value = raw, "net weight is not a number");
        return None;
    };
    if ident == NET_WEIGHT_FORMATTED {
        Some(format_grouped(weight, 2, &config.locale))
    } else {
        Some(six_digits(weight))
    }
}

/// Clock-derived template variables.
pub fn builtin_variables(now: DateTime<Local>, date_format: &str) -> HashMap<String, String> {
    let mut vars = HashMap::new();

    vars.insert("date".into(), now.format(date_format).to_string()); // 27/01/2026
    vars.insert("time".into(), now.format("%H:%M").to_string()); // 09:30
    vars.insert(
        "datetime".into(),
        format!("{} {}", now.format(date_format), now.format("%H:%M")),
    ); // 27/01/2026 09:30
    vars.insert("year".into(), now.format("%Y").to_string()); // 2026
    vars.insert("iso_date".into(), now.format("%Y-%m-%d").to_string()); // 2026-01-27

    vars
}
