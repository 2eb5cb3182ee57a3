//! # Configuration
//!
//! Settings for the projector and the editor, loadable from a JSON file.
//! Every field has a default, so `{}` is a valid configuration.
//!
//! ```
//! use rotulo::config::RotuloConfig;
//!
//! let config: RotuloConfig = serde_json::from_str(r#"{"editor": {"quiescence_ms": 250}}"#).unwrap();
//! assert_eq!(config.editor.quiescence_ms, 250);
//! assert_eq!(config.projector.date_format, "%d/%m/%Y");
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::RotuloError;
use crate::project::NumberLocale;

fn default_true() -> bool {
    true
}

fn default_quiescence_ms() -> u64 {
    100
}

fn default_date_format() -> String {
    "%d/%m/%Y".to_string()
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RotuloConfig {
    #[serde(default)]
    pub projector: ProjectorConfig,
    #[serde(default)]
    pub editor: EditorConfig,
}

impl RotuloConfig {
    /// Read a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self, RotuloError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| RotuloError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RotuloError> {
        let locale = &self.projector.locale;
        if locale.decimal == locale.group {
            return Err(RotuloError::Config(format!(
                "decimal and group separators must differ (both '{}')",
                locale.decimal
            )));
        }
        Ok(())
    }
}

/// Settings for token projection at render/print time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectorConfig {
    /// Base value for derived net-weight fields when `netWeight` is absent.
    /// `None` leaves the derived tokens unresolved.
    #[serde(default)]
    pub net_weight_default: Option<String>,
    /// Separators used when formatting `netWeightFormatted`.
    #[serde(default)]
    pub locale: NumberLocale,
    /// Resolve `{{date}}`, `{{time}}` and friends from the clock.
    #[serde(default = "default_true")]
    pub builtins: bool,
    /// chrono format for `{{date}}` and date elements without their own format.
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

impl Default for ProjectorConfig {
    fn default() -> Self {
        Self {
            net_weight_default: None,
            locale: NumberLocale::default(),
            builtins: true,
            date_format: default_date_format(),
        }
    }
}

/// Settings for the inline editor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Quiet period after the last keystroke before external values apply.
    #[serde(default = "default_quiescence_ms")]
    pub quiescence_ms: u64,
}

impl EditorConfig {
    pub fn quiescence(&self) -> Duration {
        Duration::from_millis(self.quiescence_ms)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            quiescence_ms: default_quiescence_ms(),
        }
    }
}
