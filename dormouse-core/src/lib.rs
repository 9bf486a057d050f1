// Copyright (C) 2025 Dormouse Project Developers
//
// MIT License

//! Dormouse is a deep-sleeping ESP32 reporter for Firebase-style realtime
//! databases.
//!
//! dormouse-core - policy and protocol types shared between the firmware
//! and its libraries.
//!
//! This crate is `no_std` and platform agnostic - nothing in here touches
//! hardware, sockets or timers, so the connect policy, the wakeup-cause
//! classification, the client tuning values and the REST request builder can
//! all be exercised on the host.
//!
//! * [`policy`] - the bounded link-poll policy used for WiFi bring-up.
//! * [`wake`] - deep-sleep wakeup-cause classification.
//! * [`tuning`] - realtime-database client tuning values and scalar
//!   serialization.
//! * [`rest`] - realtime-database REST endpoint parsing and request
//!   construction.

#![no_std]

extern crate alloc;

pub mod policy;
pub mod rest;
pub mod tuning;
pub mod wake;

#[doc(inline)]
pub use crate::policy::{ConnectAttempt, ConnectPolicy, PollVerdict};
#[doc(inline)]
pub use crate::rest::{Endpoint, Method};
#[doc(inline)]
pub use crate::tuning::{RtdbTuning, WriteSizeLimit};
#[doc(inline)]
pub use crate::wake::WakeCause;
