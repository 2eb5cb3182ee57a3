//! Barcode and QR payloads.
//!
//! A projected payload is checked against its symbology before anything is
//! encoded. A payload that does not fit renders as a short visible message
//! instead of an unreadable symbol; nothing here returns an error.

use barcoders::sym::code128::Code128;
use barcoders::sym::code39::Code39;
use barcoders::sym::ean13::EAN13;
use qrcode::{EcLevel, QrCode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symbology {
    /// 12 data digits; the check digit is computed.
    Ean13,
    #[default]
    Code128,
    Code39,
    Qr,
}

impl Symbology {
    /// Parse a format name (`ean13`, `code128`, `code39`, `qr`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ean13" | "ean-13" => Some(Self::Ean13),
            "code128" => Some(Self::Code128),
            "code39" => Some(Self::Code39),
            "qr" | "qrcode" | "qr_code" => Some(Self::Qr),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ean13 => "EAN-13",
            Self::Code128 => "Code 128",
            Self::Code39 => "Code 39",
            Self::Qr => "QR",
        }
    }
}

/// An encoded symbol, or the reason it could not be encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Symbol {
    /// 1D barcode: one entry per module, 1 = bar.
    Linear { text: String, modules: Vec<u8> },
    /// 2D matrix, row-major, `width * width` modules.
    Matrix { text: String, width: usize, modules: Vec<bool> },
    Invalid { message: String },
}

impl Symbol {
    pub fn is_valid(&self) -> bool {
        !matches!(self, Symbol::Invalid { .. })
    }

    fn invalid(message: String) -> Self {
        tracing::warn!(%message, "symbol payload rejected");
        Symbol::Invalid { message }
    }
}

const CODE39_EXTRA: &str = " -.$/+%";

/// Check that `payload` fits the symbology.
pub fn validate(symbology: Symbology, payload: &str) -> Result<(), String> {
    if payload.is_empty() {
        return Err(format!("{}: empty payload", symbology.name()));
    }
    if payload.contains("{{") {
        return Err(format!("{}: unresolved field in payload", symbology.name()));
    }
    match symbology {
        Symbology::Ean13 => {
            let digits = payload.chars().count();
            if digits != 12 || !payload.chars().all(|c| c.is_ascii_digit()) {
                return Err(format!("EAN-13: expected 12 digits, got \"{}\"", payload));
            }
        }
        Symbology::Code128 => {
            if let Some(c) = payload.chars().find(|c| !(' '..='~').contains(c)) {
                return Err(format!("Code 128: unsupported character '{}'", c));
            }
        }
        Symbology::Code39 => {
            if let Some(c) = payload
                .chars()
                .find(|c| !(c.is_ascii_uppercase() || c.is_ascii_digit() || CODE39_EXTRA.contains(*c)))
            {
                return Err(format!("Code 39: unsupported character '{}'", c));
            }
        }
        Symbology::Qr => {}
    }
    Ok(())
}

/// EAN-13 check digit for 12 data digits.
pub fn ean13_check_digit(data: &str) -> Option<u32> {
    let digits: Vec<u32> = data.chars().map(|c| c.to_digit(10)).collect::<Option<_>>()?;
    if digits.len() != 12 {
        return None;
    }
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { *d } else { d * 3 })
        .sum();
    Some((10 - sum % 10) % 10)
}

/// Validate and encode.
pub fn encode(symbology: Symbology, payload: &str) -> Symbol {
    if let Err(message) = validate(symbology, payload) {
        return Symbol::invalid(message);
    }
    match symbology {
        Symbology::Ean13 => {
            let check = ean13_check_digit(payload).unwrap_or_default();
            match EAN13::new(payload) {
                Ok(code) => Symbol::Linear {
                    text: format!("{}{}", payload, check),
                    modules: code.encode(),
                },
                Err(e) => Symbol::invalid(format!("EAN-13: {}", e)),
            }
        }
        Symbology::Code128 => {
            // Character set B covers printable ASCII.
            let prefixed = format!("\u{0181}{}", payload);
            match Code128::new(&prefixed) {
                Ok(code) => Symbol::Linear {
                    text: payload.to_string(),
                    modules: code.encode(),
                },
                Err(e) => Symbol::invalid(format!("Code 128: {}", e)),
            }
        }
        Symbology::Code39 => match Code39::new(payload) {
            Ok(code) => Symbol::Linear {
                text: payload.to_string(),
                modules: code.encode(),
            },
            Err(e) => Symbol::invalid(format!("Code 39: {}", e)),
        },
        Symbology::Qr => match QrCode::with_error_correction_level(payload, EcLevel::M) {
            Ok(code) => {
                let width = code.width();
                let mut modules = Vec::with_capacity(width * width);
                for y in 0..width {
                    for x in 0..width {
                        modules.push(code[(x, y)] == qrcode::Color::Dark);
                    }
                }
                Symbol::Matrix {
                    text: payload.to_string(),
                    width,
                    modules,
                }
            }
            Err(e) => Symbol::invalid(format!("QR: {}", e)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ean13_twelve_digits() {
        assert!(validate(Symbology::Ean13, "400638133393").is_ok());
        assert!(validate(Symbology::Ean13, "40063813339").is_err());
        assert!(validate(Symbology::Ean13, "4006381333931").is_err());
        assert!(validate(Symbology::Ean13, "40063813339a").is_err());
    }

    #[test]
    fn test_ean13_check_digit() {
        assert_eq!(ean13_check_digit("400638133393"), Some(1));
        assert_eq!(ean13_check_digit("590123412345"), Some(7));
        assert_eq!(ean13_check_digit("12"), None);
    }

    #[test]
    fn test_encode_ean13() {
        match encode(Symbology::Ean13, "400638133393") {
            Symbol::Linear { text, modules } => {
                assert_eq!(text, "4006381333931");
                assert_eq!(modules.len(), 95);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_invalid_payload_is_visible_not_fatal() {
        let symbol = encode(Symbology::Ean13, "123");
        assert!(!symbol.is_valid());
        let symbol = encode(Symbology::Code128, "{{lot}}");
        assert!(matches!(symbol, Symbol::Invalid { message } if message.contains("unresolved")));
    }

    #[test]
    fn test_code39_charset() {
        assert!(validate(Symbology::Code39, "ABC-123").is_ok());
        assert!(validate(Symbology::Code39, "abc").is_err());
        assert!(encode(Symbology::Code39, "LOT 42").is_valid());
    }

    #[test]
    fn test_code128_and_qr() {
        assert!(encode(Symbology::Code128, "Lote-2024/07").is_valid());
        assert!(validate(Symbology::Code128, "ñ").is_err());
        match encode(Symbology::Qr, "https://example.com/l/42") {
            Symbol::Matrix { width, modules, .. } => assert_eq!(modules.len(), width * width),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_symbology() {
        assert_eq!(Symbology::parse("EAN13"), Some(Symbology::Ean13));
        assert_eq!(Symbology::parse("qr"), Some(Symbology::Qr));
        assert_eq!(Symbology::parse("pdf417"), None);
    }
}
