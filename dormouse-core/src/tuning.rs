// Copyright (C) 2025 Dormouse Project Developers
//
// MIT License

//! dormouse-core - Realtime-database client tuning
//!
//! The tuning values the firmware applies at client bring-up: response
//! buffer size, read timeout, write-size ceiling and scalar serialization
//! precision.  [`RtdbTuning::default`] is exactly the tuning dormouse runs
//! with; individual values can be overridden through the `with_` methods or
//! the client's setters.

use alloc::format;
use alloc::string::String;
use core::fmt;

/// Response buffer size applied at client bring-up, in bytes.
pub const RESPONSE_SIZE: usize = 1024;

/// Read timeout applied at client bring-up, in milliseconds.
pub const READ_TIMEOUT_MS: u32 = 60 * 1000;

/// Float serialization precision applied at client bring-up.
pub const FLOAT_DIGITS: u8 = 2;

/// Double serialization precision applied at client bring-up.
pub const DOUBLE_DIGITS: u8 = 6;

/// Ceiling on the size of a single database write.
///
/// Tiers rather than raw byte counts, named after the vendor SDK convention
/// the original deployment used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteSizeLimit {
    /// 1 KiB.
    Tiny,

    /// 4 KiB.
    Small,

    /// 8 KiB.
    Medium,

    /// 16 KiB.
    Large,

    /// No ceiling.
    Unlimited,
}

impl WriteSizeLimit {
    /// Maximum write payload in bytes, or `None` for no ceiling.
    pub fn max_bytes(&self) -> Option<usize> {
        match self {
            WriteSizeLimit::Tiny => Some(1024),
            WriteSizeLimit::Small => Some(4 * 1024),
            WriteSizeLimit::Medium => Some(8 * 1024),
            WriteSizeLimit::Large => Some(16 * 1024),
            WriteSizeLimit::Unlimited => None,
        }
    }

    /// Tier name.
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteSizeLimit::Tiny => "tiny",
            WriteSizeLimit::Small => "small",
            WriteSizeLimit::Medium => "medium",
            WriteSizeLimit::Large => "large",
            WriteSizeLimit::Unlimited => "unlimited",
        }
    }

    /// Parses a tier name.
    pub fn from_str(tier: &str) -> Option<WriteSizeLimit> {
        match tier {
            "tiny" => Some(WriteSizeLimit::Tiny),
            "small" => Some(WriteSizeLimit::Small),
            "medium" => Some(WriteSizeLimit::Medium),
            "large" => Some(WriteSizeLimit::Large),
            "unlimited" => Some(WriteSizeLimit::Unlimited),
            _ => None,
        }
    }
}

impl fmt::Display for WriteSizeLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Realtime-database client tuning values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtdbTuning {
    response_size: usize,
    read_timeout_ms: u32,
    write_size_limit: WriteSizeLimit,
    float_digits: u8,
    double_digits: u8,
}

impl Default for RtdbTuning {
    fn default() -> Self {
        Self {
            response_size: RESPONSE_SIZE,
            read_timeout_ms: READ_TIMEOUT_MS,
            write_size_limit: WriteSizeLimit::Tiny,
            float_digits: FLOAT_DIGITS,
            double_digits: DOUBLE_DIGITS,
        }
    }
}

impl RtdbTuning {
    /// Response buffer size in bytes.
    pub fn response_size(&self) -> usize {
        self.response_size
    }

    /// Read timeout in milliseconds.
    pub fn read_timeout_ms(&self) -> u32 {
        self.read_timeout_ms
    }

    /// Write-size ceiling tier.
    pub fn write_size_limit(&self) -> WriteSizeLimit {
        self.write_size_limit
    }

    /// Float serialization precision in decimal digits.
    pub fn float_digits(&self) -> u8 {
        self.float_digits
    }

    /// Double serialization precision in decimal digits.
    pub fn double_digits(&self) -> u8 {
        self.double_digits
    }

    pub fn with_response_size(mut self, bytes: usize) -> Self {
        self.response_size = bytes;
        self
    }

    pub fn with_read_timeout_ms(mut self, ms: u32) -> Self {
        self.read_timeout_ms = ms;
        self
    }

    pub fn with_write_size_limit(mut self, limit: WriteSizeLimit) -> Self {
        self.write_size_limit = limit;
        self
    }

    pub fn with_float_digits(mut self, digits: u8) -> Self {
        self.float_digits = digits;
        self
    }

    pub fn with_double_digits(mut self, digits: u8) -> Self {
        self.double_digits = digits;
        self
    }
}

/// Serializes a float as a JSON number with the configured precision.
pub fn format_float(value: f32, digits: u8) -> String {
    format!("{value:.prec$}", prec = digits as usize)
}

/// Serializes a double as a JSON number with the configured precision.
pub fn format_double(value: f64, digits: u8) -> String {
    format!("{value:.prec$}", prec = digits as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bring_up_tuning_matches_contract() {
        let tuning = RtdbTuning::default();
        assert_eq!(tuning.response_size(), 1024);
        assert_eq!(tuning.read_timeout_ms(), 60_000);
        assert_eq!(tuning.write_size_limit(), WriteSizeLimit::Tiny);
        assert_eq!(tuning.float_digits(), 2);
        assert_eq!(tuning.double_digits(), 6);
    }

    #[test]
    fn with_methods_override_individual_values() {
        let tuning = RtdbTuning::default()
            .with_response_size(2048)
            .with_read_timeout_ms(5_000)
            .with_write_size_limit(WriteSizeLimit::Large)
            .with_float_digits(4)
            .with_double_digits(9);
        assert_eq!(tuning.response_size(), 2048);
        assert_eq!(tuning.read_timeout_ms(), 5_000);
        assert_eq!(tuning.write_size_limit(), WriteSizeLimit::Large);
        assert_eq!(tuning.float_digits(), 4);
        assert_eq!(tuning.double_digits(), 9);
    }

    #[test]
    fn tier_ceilings() {
        assert_eq!(WriteSizeLimit::Tiny.max_bytes(), Some(1024));
        assert_eq!(WriteSizeLimit::Small.max_bytes(), Some(4096));
        assert_eq!(WriteSizeLimit::Medium.max_bytes(), Some(8192));
        assert_eq!(WriteSizeLimit::Large.max_bytes(), Some(16384));
        assert_eq!(WriteSizeLimit::Unlimited.max_bytes(), None);
    }

    #[test]
    fn tier_names_round_trip() {
        for tier in [
            WriteSizeLimit::Tiny,
            WriteSizeLimit::Small,
            WriteSizeLimit::Medium,
            WriteSizeLimit::Large,
            WriteSizeLimit::Unlimited,
        ] {
            assert_eq!(WriteSizeLimit::from_str(tier.as_str()), Some(tier));
        }
        assert_eq!(WriteSizeLimit::from_str("huge"), None);
    }

    #[test]
    fn float_precision_is_honoured() {
        assert_eq!(format_float(3.14159, 2), "3.14");
        assert_eq!(format_float(-1.25, 2), "-1.25");
        assert_eq!(format_float(2.0, 0), "2");
    }

    #[test]
    fn double_precision_is_honoured() {
        assert_eq!(format_double(2.718281828459045, 6), "2.718282");
        assert_eq!(format_double(1.5, 6), "1.500000");
    }
}
