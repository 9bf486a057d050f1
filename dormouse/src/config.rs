// Copyright (C) 2025 Dormouse Project Developers
//
// MIT License

//! dormouse - Build-time configuration
//!
//! Credentials and endpoint configuration are compile-time constants,
//! supplied through build environment variables so secrets stay out of the
//! tree.  Every variable has an inert default so the firmware still builds
//! without them - it just won't reach a network or a database until real
//! values are provided.
//!
//! - `DM_STA_SSID` / `DM_STA_PASSWORD`: WiFi network name and passphrase
//! - `DM_DATABASE_URL`: realtime-database endpoint, e.g.
//!   `http://10.0.0.2:9000` (plaintext HTTP - an emulator or a
//!   TLS-terminating proxy)
//! - `DM_DATABASE_SECRET`: legacy access secret, empty for none

/// WiFi network name the station joins.
pub const STA_SSID: &str = match option_env!("DM_STA_SSID") {
    Some(value) => value,
    None => "dormouse",
};

/// WiFi passphrase.
pub const STA_PASSWORD: &str = match option_env!("DM_STA_PASSWORD") {
    Some(value) => value,
    None => "",
};

/// Realtime-database endpoint URL.
pub const DATABASE_URL: &str = match option_env!("DM_DATABASE_URL") {
    Some(value) => value,
    None => "http://10.0.0.2:9000",
};

/// Legacy access secret authorizing database calls.  Empty means
/// unauthenticated.
pub const DATABASE_SECRET: &str = match option_env!("DM_DATABASE_SECRET") {
    Some(value) => value,
    None => "",
};

/// Deep-sleep interval between reporting cycles, unless the database
/// overrides it.
pub const SLEEP_INTERVAL_SECS: u64 = 15 * 60;

/// Longest deep-sleep interval accepted from a database override.
pub const SLEEP_INTERVAL_MAX_SECS: u64 = 24 * 60 * 60;

/// Database path boot reports are pushed under.
pub const BOOT_REPORT_PATH: &str = "/reports/boot";

/// Database path read for a sleep-interval override, in seconds.
pub const SLEEP_INTERVAL_PATH: &str = "/config/sleep_secs";
