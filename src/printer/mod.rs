//! # Printer Module
//!
//! Label printer resolutions and unit conversion.
//!
//! ## Modules
//!
//! - [`config`]: Resolution presets and mm/dots conversion

pub mod config;

pub use config::PrinterConfig;
