// Copyright (C) 2025 Dormouse Project Developers
//
// MIT License

//! dormouse-core - Deep-sleep wakeup-cause classification
//!
//! After a deep-sleep cycle the SoC records which wake source fired.  The
//! firmware reports it once at boot, purely for diagnostics - nothing
//! branches on it.  The classification and its message strings live here;
//! the embedded side maps the HAL's raw cause register into [`WakeCause`].

use core::fmt;

use serde::Serialize;

/// Why this boot happened, as recorded by the SoC's sleep controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WakeCause {
    /// External signal on the RTC_IO wake pin (EXT0).
    Ext0,

    /// External signal routed through the RTC controller (EXT1).
    Ext1,

    /// The sleep timer expired.
    Timer,

    /// A touchpad was touched.
    Touchpad,

    /// The ULP co-processor requested a wake.
    Ulp,

    /// Cold boot, reset or anything else that is not a deep-sleep wake.
    NotDeepSleep,
}

impl WakeCause {
    /// Human-readable classification, one distinct message per cause.
    pub fn description(&self) -> &'static str {
        match self {
            WakeCause::Ext0 => "Wakeup caused by external signal using RTC_IO",
            WakeCause::Ext1 => "Wakeup caused by external signal using RTC_CNTL",
            WakeCause::Timer => "Wakeup caused by timer",
            WakeCause::Touchpad => "Wakeup caused by touchpad",
            WakeCause::Ulp => "Wakeup caused by ULP program",
            WakeCause::NotDeepSleep => "Wakeup was not caused by deep sleep",
        }
    }

    /// Returns true if this boot resumed from deep sleep.
    pub fn from_deep_sleep(&self) -> bool {
        !matches!(self, WakeCause::NotDeepSleep)
    }
}

impl fmt::Display for WakeCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [WakeCause; 6] = [
        WakeCause::Ext0,
        WakeCause::Ext1,
        WakeCause::Timer,
        WakeCause::Touchpad,
        WakeCause::Ulp,
        WakeCause::NotDeepSleep,
    ];

    #[test]
    fn descriptions_are_pairwise_distinct() {
        for (i, a) in ALL.iter().enumerate() {
            for b in &ALL[i + 1..] {
                assert_ne!(a.description(), b.description(), "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn documented_messages_are_preserved() {
        assert_eq!(
            WakeCause::Ext0.description(),
            "Wakeup caused by external signal using RTC_IO"
        );
        assert_eq!(
            WakeCause::Ext1.description(),
            "Wakeup caused by external signal using RTC_CNTL"
        );
        assert_eq!(WakeCause::Timer.description(), "Wakeup caused by timer");
        assert_eq!(
            WakeCause::Touchpad.description(),
            "Wakeup caused by touchpad"
        );
        assert_eq!(WakeCause::Ulp.description(), "Wakeup caused by ULP program");
        assert_eq!(
            WakeCause::NotDeepSleep.description(),
            "Wakeup was not caused by deep sleep"
        );
    }

    #[test]
    fn only_real_wake_sources_count_as_deep_sleep() {
        for cause in ALL {
            assert_eq!(
                cause.from_deep_sleep(),
                cause != WakeCause::NotDeepSleep,
                "{cause:?}"
            );
        }
    }
}
