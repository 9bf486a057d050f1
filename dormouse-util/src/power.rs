// Copyright (C) 2025 Dormouse Project Developers
//
// MIT License

//! dormouse-util - Deep-sleep power-cycle control
//!
//! A dormouse device lives in cycles: wake, report, sleep.
//! [`enter_deep_sleep`] ends the current cycle - it powers the radio down,
//! arms the wake pin and the sleep timer, and halts into deep sleep.  The
//! call never returns; the next thing that runs is boot.
//! [`report_wake_cause`] is the companion for the other end of the cycle,
//! logging what woke us.  Purely informational - nothing branches on it.

use core::time::Duration as CoreDuration;

use embassy_time::{Duration, Timer};
use esp_hal::gpio::Input;
use esp_hal::rtc_cntl::sleep::{Ext0WakeupSource, TimerWakeupSource, WakeupLevel};
use esp_hal::rtc_cntl::{Rtc, SleepSource, wakeup_cause};
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

use dormouse_core::wake::WakeCause;

use crate::net::Wifi;

// Radio settle time between WiFi shutdown and arming the wake sources.
const RADIO_SETTLE_DELAY: Duration = Duration::from_millis(250);

/// Powers the radio down and enters deep sleep.  This function never
/// returns - execution resumes at boot, from reset.
///
/// The sequence is fixed: disconnect and stop WiFi, wait 250ms for the
/// radio to settle, arm the external wake pin (active low) and the sleep
/// timer, sleep.  Both wake sources are always armed, whatever the
/// duration - a zero duration wakes the device straight back up.
///
/// Arguments:
/// - `wifi`: The WiFi object, used to power the radio down first
/// - `rtc`: The RTC peripheral driver, which performs the sleep entry
/// - `wake_pin`: External wake pin, wakes the device when pulled low
/// - `sleep_duration`: Timer wake duration (microsecond resolution)
pub async fn enter_deep_sleep(
    wifi: &Wifi,
    mut rtc: Rtc<'_>,
    wake_pin: &mut Input<'_>,
    sleep_duration: CoreDuration,
) -> ! {
    info!(
        "Exec:  Entering deep sleep for {}s",
        sleep_duration.as_secs()
    );

    wifi.disconnect_sta().await;
    Timer::after(RADIO_SETTLE_DELAY).await;

    let timer = TimerWakeupSource::new(sleep_duration);
    let ext0 = Ext0WakeupSource::new(wake_pin, WakeupLevel::Low);
    rtc.sleep_deep(&[&ext0, &timer])
}

/// Classifies this boot's SoC wakeup cause.
pub fn boot_wake_cause() -> WakeCause {
    match wakeup_cause() {
        SleepSource::Ext0 => WakeCause::Ext0,
        SleepSource::Ext1 => WakeCause::Ext1,
        SleepSource::Timer => WakeCause::Timer,
        SleepSource::Touchpad => WakeCause::Touchpad,
        SleepSource::Ulp => WakeCause::Ulp,
        // Cold boots and resets report Undefined; everything else is a wake
        // source dormouse never arms.
        _ => WakeCause::NotDeepSleep,
    }
}

/// Logs this boot's wakeup cause classification and returns it.
pub fn report_wake_cause() -> WakeCause {
    let cause = boot_wake_cause();
    info!("Value: {}", cause.description());
    cause
}
