// Copyright (C) 2025 Dormouse Project Developers
//
// MIT License

//! Dormouse is a deep-sleeping ESP32 reporter for Firebase-style realtime
//! databases.
//!
//! dormouse-util - embedded helpers for building dormouse firmware.
//!
//! [`net`] - WiFi station bring-up and shutdown, using `esp-wifi` and
//! `embassy-net`.
//!
//! [`power`] - deep-sleep power-cycle control and wakeup-cause reporting,
//! using `esp-hal`'s RTC sleep support.

#![no_std]
#![feature(type_alias_impl_trait)]
#![feature(impl_trait_in_assoc_type)]

extern crate alloc;

pub mod net;
pub mod power;
