// Copyright (C) 2025 Dormouse Project Developers
//
// MIT License

//! dormouse - Error types

use core::fmt;

use dormouse_rtdb::RtdbError;
use dormouse_util::net;

/// Dormouse default firmware error type
#[allow(unused)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DormouseError {
    Rtdb(RtdbError),
    Firmware(ErrorKind),
}

impl fmt::Display for DormouseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DormouseError::Rtdb(rtdb) => write!(f, "{rtdb}"),
            DormouseError::Firmware(kind) => write!(f, "{kind}"),
        }
    }
}

/// DormouseError::Firmware error kinds
#[allow(unused)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Wifi,
    Network,
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Wifi => write!(f, "WiFi bring-up failed"),
            ErrorKind::Network => write!(f, "network unavailable"),
            ErrorKind::Config => write!(f, "configuration error"),
        }
    }
}

impl From<RtdbError> for DormouseError {
    fn from(error: RtdbError) -> Self {
        match error {
            RtdbError::Config(_) => DormouseError::Firmware(ErrorKind::Config),
            _ => DormouseError::Rtdb(error),
        }
    }
}

impl From<net::Error> for DormouseError {
    fn from(error: net::Error) -> Self {
        match error {
            net::Error::Wifi(_) => DormouseError::Firmware(ErrorKind::Wifi),
            net::Error::Config(_) => DormouseError::Firmware(ErrorKind::Config),
        }
    }
}
