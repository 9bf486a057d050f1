// Copyright (C) 2025 Dormouse Project Developers
//
// MIT License

//! dormouse-rtdb library
//!
//! Minimal client for a Firebase-style realtime database, speaking the
//! database's REST surface (`<path>.json`, `auth` query parameter, JSON
//! bodies) over a plain `embassy-net` TCP socket.
//!
//! It is `no_std` and designed to run on the ESP32 alongside
//! [embassy](https://embassy.dev/) and
//! [`esp-hal`](https://docs.espressif.com/projects/rust/).  It requires an
//! `alloc` implementation (such as `esp-alloc`) and an already-connected
//! network stack - the client does not verify connectivity; bringing the
//! station up first is the caller's responsibility.
//!
//! ```text
//!    dormouse Application
//! -------------------------
//!        RtdbClient          --- RtdbError
//! -------------------------
//!    dormouse-core::rest       (request text, endpoint)
//! -------------------------
//!   embassy-net TcpSocket    >=====================<  realtime database
//!                                 plain HTTP/1.1       (REST surface)
//! ```
//!
//! * [`RtdbClient`] owns the endpoint, the authentication context, the
//!   tuning values and the in-flight response state.  One is created per
//!   power-on session via [`RtdbClient::begin`] and threaded through the
//!   firmware by reference.
//! * [`RtdbConfig`] / [`RtdbAuth`] are consumed once by
//!   [`RtdbClient::begin`].
//!
//! The transport is plaintext HTTP only.  Point the client at a realtime
//! database emulator or a TLS-terminating proxy on the local network.

#![no_std]

pub mod client;
mod transport;

#[doc(inline)]
pub use crate::client::{RtdbAuth, RtdbClient, RtdbConfig, TokenStatus, TokenStatusCallback};

extern crate alloc;
use alloc::string::String;
use core::fmt;

use dormouse_core::rest::EndpointError;

/// Core error type used by all dormouse-rtdb operations
///
/// [`RtdbError::is_transport()`] distinguishes errors of the connection
/// itself - the ones automatic network reconnection can help with - from
/// errors the database reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RtdbError {
    /// The client configuration is unusable, e.g. a malformed database URL.
    /// Only returned from [`RtdbClient::begin`].
    Config(String),

    /// The database host name did not resolve.
    Dns,

    /// The TCP connection to the database could not be established.
    Connect,

    /// The connection failed mid-request.
    Network,

    /// The configured read timeout expired before the response arrived.
    Timeout,

    /// The write payload exceeds the configured write-size ceiling.  The
    /// request was not sent.
    PayloadTooLarge(usize),

    /// The response exceeds the configured response buffer size.
    ResponseTooLarge,

    /// The response was not parseable HTTP.
    Protocol,

    /// The database rejected the access secret (HTTP 401/403).  The
    /// token-status callback has been notified.
    Unauthorized,

    /// Any other non-success HTTP status.
    Http(u16),
}

impl RtdbError {
    /// Returns a string representation of the error.
    pub fn as_str(&self) -> &'static str {
        match self {
            RtdbError::Config(_) => "configuration error",
            RtdbError::Dns => "DNS resolution failed",
            RtdbError::Connect => "connect failed",
            RtdbError::Network => "network error",
            RtdbError::Timeout => "read timeout",
            RtdbError::PayloadTooLarge(_) => "payload exceeds write size limit",
            RtdbError::ResponseTooLarge => "response exceeds response size",
            RtdbError::Protocol => "malformed HTTP response",
            RtdbError::Unauthorized => "unauthorized",
            RtdbError::Http(_) => "HTTP error status",
        }
    }

    /// Returns true if the error happened below HTTP - in DNS, connect
    /// establishment or socket I/O.  These are the errors worth retrying
    /// once the network link is back.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            RtdbError::Dns | RtdbError::Connect | RtdbError::Network | RtdbError::Timeout
        )
    }
}

impl fmt::Display for RtdbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RtdbError::Config(detail) => write!(f, "configuration error: {detail}"),
            RtdbError::PayloadTooLarge(size) => {
                write!(f, "payload of {size} bytes exceeds write size limit")
            }
            RtdbError::Http(status) => write!(f, "HTTP error status {status}"),
            other => f.write_str(other.as_str()),
        }
    }
}

impl From<EndpointError> for RtdbError {
    fn from(error: EndpointError) -> Self {
        RtdbError::Config(alloc::format!("{error}"))
    }
}

impl From<embassy_net::tcp::Error> for RtdbError {
    fn from(_error: embassy_net::tcp::Error) -> Self {
        RtdbError::Network
    }
}

impl From<embassy_net::tcp::ConnectError> for RtdbError {
    fn from(_error: embassy_net::tcp::ConnectError) -> Self {
        RtdbError::Connect
    }
}
