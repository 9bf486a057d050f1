// Copyright (C) 2025 Dormouse Project Developers
//
// MIT License

//! dormouse-core - Station connect poll policy
//!
//! WiFi bring-up is a bounded, blocking affair: the firmware polls the link
//! state a fixed number of times with a fixed pause between polls, then
//! reports success or failure and leaves the decision to the caller.  The
//! counting lives here, away from timers and radios, so the exactly-N-polls
//! behaviour can be tested on the host.  The embedded side owns the actual
//! pause and feeds [`ConnectAttempt::record`] the live link state.

/// Number of link polls attempted before giving up on a connection.
pub const CONNECT_POLL_ATTEMPTS: u8 = 7;

/// Pause between link polls, in milliseconds.
pub const CONNECT_POLL_INTERVAL_MS: u64 = 500;

/// Bounded poll policy for station bring-up.
///
/// The default policy polls [`CONNECT_POLL_ATTEMPTS`] times with
/// [`CONNECT_POLL_INTERVAL_MS`] between polls - roughly 3.5 seconds worst
/// case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectPolicy {
    max_polls: u8,
    poll_interval_ms: u64,
}

impl Default for ConnectPolicy {
    fn default() -> Self {
        Self {
            max_polls: CONNECT_POLL_ATTEMPTS,
            poll_interval_ms: CONNECT_POLL_INTERVAL_MS,
        }
    }
}

impl ConnectPolicy {
    /// Creates a policy with a custom poll budget and interval.
    pub fn new(max_polls: u8, poll_interval_ms: u64) -> Self {
        Self {
            max_polls,
            poll_interval_ms,
        }
    }

    /// Maximum number of polls before the attempt is abandoned.
    pub fn max_polls(&self) -> u8 {
        self.max_polls
    }

    /// Pause between polls, in milliseconds.
    pub fn poll_interval_ms(&self) -> u64 {
        self.poll_interval_ms
    }

    /// Starts a fresh connection attempt governed by this policy.
    pub fn begin(&self) -> ConnectAttempt {
        ConnectAttempt {
            policy: *self,
            polls: 0,
        }
    }
}

/// Outcome of recording a single link poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollVerdict {
    /// The link is up - stop polling, the attempt succeeded.
    Connected,

    /// The link is still down and the poll budget is not exhausted - pause
    /// and poll again.
    Retry,

    /// The link is still down and the poll budget is exhausted - the attempt
    /// failed.  The caller decides what happens next.
    GaveUp,
}

/// A single bounded connection attempt.
///
/// Create via [`ConnectPolicy::begin`], then pause for
/// [`ConnectPolicy::poll_interval_ms`] and call [`ConnectAttempt::record`]
/// with the observed link state until it returns something other than
/// [`PollVerdict::Retry`].
#[derive(Debug, Clone)]
pub struct ConnectAttempt {
    policy: ConnectPolicy,
    polls: u8,
}

impl ConnectAttempt {
    /// Records one poll of the link state and returns the verdict.
    pub fn record(&mut self, link_up: bool) -> PollVerdict {
        self.polls = self.polls.saturating_add(1);
        if link_up {
            PollVerdict::Connected
        } else if self.polls >= self.policy.max_polls {
            PollVerdict::GaveUp
        } else {
            PollVerdict::Retry
        }
    }

    /// Number of polls recorded so far.
    pub fn polls(&self) -> u8 {
        self.polls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_bring_up_contract() {
        let policy = ConnectPolicy::default();
        assert_eq!(policy.max_polls(), 7);
        assert_eq!(policy.poll_interval_ms(), 500);
    }

    #[test]
    fn link_down_gives_up_after_exactly_seven_polls() {
        let mut attempt = ConnectPolicy::default().begin();
        for _ in 0..6 {
            assert_eq!(attempt.record(false), PollVerdict::Retry);
        }
        assert_eq!(attempt.record(false), PollVerdict::GaveUp);
        assert_eq!(attempt.polls(), 7);
    }

    #[test]
    fn link_up_connects_on_any_poll_within_budget() {
        for up_on in 1..=7 {
            let mut attempt = ConnectPolicy::default().begin();
            for _ in 1..up_on {
                assert_eq!(attempt.record(false), PollVerdict::Retry);
            }
            assert_eq!(attempt.record(true), PollVerdict::Connected);
            assert_eq!(attempt.polls(), up_on);
        }
    }

    #[test]
    fn link_up_on_final_poll_still_connects() {
        let mut attempt = ConnectPolicy::default().begin();
        for _ in 0..6 {
            attempt.record(false);
        }
        assert_eq!(attempt.record(true), PollVerdict::Connected);
    }

    #[test]
    fn custom_policy_budget_is_honoured() {
        let mut attempt = ConnectPolicy::new(2, 100).begin();
        assert_eq!(attempt.record(false), PollVerdict::Retry);
        assert_eq!(attempt.record(false), PollVerdict::GaveUp);
    }
}
