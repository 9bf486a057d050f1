// Copyright (C) 2025 Dormouse Project Developers
//
// MIT License

//! dormouse - Default Firmware
//!
//! A dormouse device spends nearly all of its life in deep sleep.  Each
//! power-on session runs the same linear sequence:
//!
//! - Report what woke us (timer, wake button, or a cold boot)
//! - Bring the WiFi station up (bounded retry - roughly 3.5s worst case)
//! - Configure the realtime-database client
//! - Push this boot's report to the database
//! - Read the optional sleep-interval override from the database
//! - Power the radio down and deep sleep until the timer or the wake pin
//!   fires
//!
//! WiFi bring-up failure is not fatal: the device simply sleeps and tries
//! again next cycle.
//!
//! To use, set the `DM_STA_SSID`, `DM_STA_PASSWORD`, `DM_DATABASE_URL` and
//! `DM_DATABASE_SECRET` environment variables and build and flash the
//! project.  See `config.rs` for the defaults and for the other
//! configuration knobs (sleep interval, database paths, wake pin below).

#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![feature(type_alias_impl_trait)]
#![feature(impl_trait_in_assoc_type)]

extern crate alloc;

use alloc::string::String;
use core::time::Duration as CoreDuration;

use embassy_executor::Spawner;
use embassy_net::StackResources;
use embassy_time::Instant;
use esp_alloc as _;
use esp_backtrace as _;
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Input, InputConfig, Pull};
use esp_hal::rtc_cntl::Rtc;
use esp_hal::timer::timg::TimerGroup;
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use serde::Serialize;
use static_cell::make_static;

use dormouse_core::wake::WakeCause;
use dormouse_rtdb::{RtdbAuth, RtdbClient, RtdbConfig, TokenStatus};
use dormouse_util::net::{InterfaceConfig, Wifi};
use dormouse_util::power;

mod config;
mod error;

pub(crate) use error::{DormouseError, ErrorKind};

// Creates app-descriptor required by the esp-idf bootloader.
esp_bootloader_esp_idf::esp_app_desc!();

// Heap size for the application.
pub const HEAP_SIZE: usize = 64 * 1024;

// One socket for the database client, one for DHCP, one for DNS, plus
// spares.
const NUM_SOCKETS: usize = 6;

/// This boot's report, pushed to the database once the client is up.
#[derive(Debug, Serialize)]
struct BootReport {
    version: &'static str,
    wake: WakeCause,
    uptime_ms: u64,
}

// Dormouse default firmware's main function.
//
// This is kept nice and clean to make it easy to see the overall structure,
// which is:
// - Set up the HAL and the heap
// - Report the wakeup cause
// - Set up WiFi and start the WiFi connection and networking tasks
// - Bring the station up (bounded retry)
// - Run the report cycle against the database
// - Enter deep sleep - main never returns, the next cycle starts at boot
#[esp_hal_embassy::main]
async fn main(spawner: Spawner) -> ! {
    // Set up the logger
    esp_println::logger::init_logger_from_env();

    info!("*** dormouse ***");

    // Set up the HAL
    let hal_config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(hal_config);

    // Set up the heap allocator
    esp_alloc::heap_allocator!(size: HEAP_SIZE);

    // Initialize embassy
    let timg1 = TimerGroup::new(peripherals.TIMG1);
    esp_hal_embassy::init(timg1.timer0);

    // Report what woke us, before anything else happens.
    let wake = power::report_wake_cause();

    // The RTC driver performs deep-sleep entry; the wake pin is armed as
    // the external (active low) wake source on the way down.
    let rtc = Rtc::new(peripherals.LPWR);
    let mut wake_pin = Input::new(
        peripherals.GPIO0,
        InputConfig::default().with_pull(Pull::Up),
    );

    // Set up the WiFi interface and start the WiFi connection and
    // networking tasks.
    let sta_stack_resources = make_static!(StackResources::<NUM_SOCKETS>::new());
    let sta_config = InterfaceConfig {
        ssid: String::from(config::STA_SSID),
        password: String::from(config::STA_PASSWORD),
        net: embassy_net::Config::dhcpv4(Default::default()),
    };
    let mut wifi = Wifi::builder::<NUM_SOCKETS>()
        .with_sta_if(sta_config, sta_stack_resources)
        .build(
            &spawner,
            peripherals.TIMG0,
            peripherals.RNG,
            peripherals.WIFI,
        )
        .expect("Failed to initialize WiFi");
    wifi.must_spawn();

    let mut sleep_secs = config::SLEEP_INTERVAL_SECS;

    if wifi.connect_sta().await {
        match run_report_cycle(&wifi, wake).await {
            Ok(Some(secs)) => {
                info!("Value: Sleep interval override {secs}s");
                sleep_secs = secs;
            }
            Ok(None) => {}
            Err(e) => warn!("Error: Report cycle failed: {e}"),
        }
    } else {
        // The caller's decision on bring-up failure: sleep it off and try
        // again next cycle.
        warn!("Error: WiFi bring-up failed; sleeping until next cycle");
    }

    power::enter_deep_sleep(
        &wifi,
        rtc,
        &mut wake_pin,
        CoreDuration::from_secs(sleep_secs),
    )
    .await
}

// Configures the database client, pushes this boot's report, and reads the
// sleep-interval override if one is set.
async fn run_report_cycle(
    wifi: &Wifi,
    wake: WakeCause,
) -> Result<Option<u64>, DormouseError> {
    let stack = wifi
        .net_stack()
        .ok_or(DormouseError::Firmware(ErrorKind::Network))?;

    let rtdb_config = RtdbConfig {
        database_url: String::from(config::DATABASE_URL),
        token_status_callback: Some(log_token_status),
    };
    let auth = if config::DATABASE_SECRET.is_empty() {
        RtdbAuth::none()
    } else {
        RtdbAuth::legacy(config::DATABASE_SECRET)
    };

    let mut client = RtdbClient::begin(stack, rtdb_config, auth)?;
    client.reconnect_network(true);
    debug!("Info:  Database tuning: {:?}", client.tuning());

    let report = BootReport {
        version: env!("CARGO_PKG_VERSION"),
        wake,
        uptime_ms: Instant::now().as_millis(),
    };
    client.push(config::BOOT_REPORT_PATH, &report).await?;
    info!("Ok:    Boot report published");

    let payload = client.get(config::SLEEP_INTERVAL_PATH).await?;
    Ok(parse_sleep_secs(payload))
}

// Parses the sleep-interval override node.  An absent node reads as `null`;
// anything unparseable or out of range is ignored.
fn parse_sleep_secs(payload: &str) -> Option<u64> {
    payload
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|secs| (1..=config::SLEEP_INTERVAL_MAX_SECS).contains(secs))
}

// Token-status diagnostic callback handed to the database client.
fn log_token_status(status: TokenStatus) {
    info!("Info:  Token status: {status}");
}
