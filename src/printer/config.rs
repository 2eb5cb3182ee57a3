//! # Printer Configuration
//!
//! Resolution presets for label printers. Labels are designed in
//! millimetres; printers address dots.
//!
//! ## Supported Resolutions
//!
//! | Preset | Resolution | Dots per mm | Max width |
//! |--------|------------|-------------|-----------|
//! | DPI_203 | 203 DPI | 8 | 104mm (832 dots) |
//! | DPI_300 | 300 DPI | 11.8 | 106mm (1248 dots) |
//!
//! ## Usage
//!
//! ```
//! use rotulo::printer::PrinterConfig;
//!
//! let config = PrinterConfig::DPI_203;
//! assert_eq!(config.mm_to_dots(50.0), 400);
//! ```

/// # Printer Configuration
///
/// ## Calculations
///
/// ```text
/// dots_per_mm = dpi / 25.4
///
/// For 203 DPI:
///   dots_per_mm = 203 / 25.4 ≈ 8
///   50mm label = 400 dots
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrinterConfig {
    /// Preset name
    pub name: &'static str,

    /// Resolution in dots per inch
    pub dpi: u16,

    /// Maximum print width in dots
    pub max_width_dots: u16,
}

impl PrinterConfig {
    /// 203 DPI desktop label printer, 4 inch head.
    pub const DPI_203: Self = Self {
        name: "203 dpi",
        dpi: 203,
        max_width_dots: 832,
    };

    /// 300 DPI label printer, 4 inch head.
    pub const DPI_300: Self = Self {
        name: "300 dpi",
        dpi: 300,
        max_width_dots: 1248,
    };

    /// Calculate dots per millimeter
    #[inline]
    pub fn dots_per_mm(&self) -> f32 {
        self.dpi as f32 / 25.4
    }

    /// Maximum print width in millimeters
    #[inline]
    pub fn max_width_mm(&self) -> f32 {
        self.max_width_dots as f32 / self.dots_per_mm()
    }

    /// Convert millimeters to dots
    #[inline]
    pub fn mm_to_dots(&self, mm: f32) -> u16 {
        (mm * self.dots_per_mm()).round() as u16
    }

    /// Convert dots to millimeters
    #[inline]
    pub fn dots_to_mm(&self, dots: u16) -> f32 {
        dots as f32 / self.dots_per_mm()
    }

    /// Parse a preset name (`"203"`, `"300dpi"`, `"300 dpi"`).
    pub fn parse(s: &str) -> Result<Self, String> {
        let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
        Self::built_in()
            .into_iter()
            .find(|p| p.dpi.to_string() == digits)
            .ok_or_else(|| format!("Unknown printer '{}'. Use '203' or '300'", s))
    }

    /// List all built-in presets.
    pub fn built_in() -> Vec<Self> {
        vec![Self::DPI_203, Self::DPI_300]
    }
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self::DPI_203
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dots_per_mm() {
        let dpmm = PrinterConfig::DPI_203.dots_per_mm();
        // 203 DPI ≈ 8 dots/mm
        assert!((dpmm - 8.0).abs() < 0.1);
    }

    #[test]
    fn test_mm_to_dots() {
        assert_eq!(PrinterConfig::DPI_203.mm_to_dots(50.0), 400);
        assert_eq!(PrinterConfig::DPI_300.mm_to_dots(25.4), 300);
    }

    #[test]
    fn test_dots_to_mm() {
        let mm = PrinterConfig::DPI_203.dots_to_mm(80);
        assert!((mm - 10.0).abs() < 0.5);
    }

    #[test]
    fn test_max_width_mm() {
        assert!((PrinterConfig::DPI_203.max_width_mm() - 104.0).abs() < 1.0);
    }

    #[test]
    fn test_parse() {
        assert_eq!(PrinterConfig::parse("300dpi"), Ok(PrinterConfig::DPI_300));
        assert_eq!(PrinterConfig::parse("203"), Ok(PrinterConfig::DPI_203));
        assert!(PrinterConfig::parse("600").is_err());
    }

    #[test]
    fn test_default_is_203() {
        assert_eq!(PrinterConfig::default().name, PrinterConfig::DPI_203.name);
    }
}
