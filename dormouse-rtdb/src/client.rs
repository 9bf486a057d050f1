// Copyright (C) 2025 Dormouse Project Developers
//
// MIT License

//! dormouse-rtdb - Client handle and configuration
//!
//! [`RtdbClient::begin`] consumes an [`RtdbConfig`] and an [`RtdbAuth`] and
//! yields the client handle the rest of the firmware performs database
//! traffic through.  The handle carries the in-flight request/response
//! state - every operation overwrites the last HTTP status and payload.

use alloc::string::String;
use core::fmt;

use embassy_net::Stack;
use embassy_time::{Duration, Timer, with_timeout};
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use serde::Serialize;

use dormouse_core::rest::{self, Endpoint, Method};
use dormouse_core::tuning::{self, RtdbTuning, WriteSizeLimit};

use crate::RtdbError;
use crate::transport;

// How long to wait for the link to come back before retrying a failed
// operation, when automatic network reconnection is enabled.
const RECONNECT_WAIT: Duration = Duration::from_secs(10);

/// Authentication state reported through the token-status callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    /// No access secret is configured; requests go out unauthenticated.
    Uninitialized,

    /// The legacy access secret is configured and will be sent with every
    /// request.
    Ready,

    /// The database rejected the access secret.
    Unauthorized,
}

impl fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenStatus::Uninitialized => write!(f, "uninitialized"),
            TokenStatus::Ready => write!(f, "ready"),
            TokenStatus::Unauthorized => write!(f, "unauthorized"),
        }
    }
}

/// Diagnostic callback invoked when the authentication state changes.
pub type TokenStatusCallback = fn(TokenStatus);

/// Authentication context: the legacy access secret, set once at
/// [`RtdbClient::begin`] and never rotated.
#[derive(Debug, Clone, Default)]
pub struct RtdbAuth {
    legacy_token: Option<String>,
}

impl RtdbAuth {
    /// No authentication - requests carry no `auth` parameter.
    pub fn none() -> Self {
        Self { legacy_token: None }
    }

    /// Authenticates every request with the given legacy access secret.
    pub fn legacy(token: impl Into<String>) -> Self {
        Self {
            legacy_token: Some(token.into()),
        }
    }

    /// The configured secret, if any.
    pub fn token(&self) -> Option<&str> {
        self.legacy_token.as_deref()
    }
}

/// Client configuration, consumed once by [`RtdbClient::begin`].
pub struct RtdbConfig {
    /// Database endpoint URL, e.g. `http://10.0.0.2:9000`.
    pub database_url: String,

    /// Optional diagnostic callback for authentication state changes.
    pub token_status_callback: Option<TokenStatusCallback>,
}

/// The realtime-database client handle.
///
/// Owns the parsed endpoint, the authentication context, the tuning values
/// and the in-flight response state.  Construct once per power-on session
/// and thread through the firmware by reference.
///
/// The client assumes the station is already connected - connectivity is
/// a documented precondition of [`RtdbClient::begin`], not something it
/// verifies.
pub struct RtdbClient {
    stack: Stack<'static>,
    endpoint: Endpoint,
    auth: RtdbAuth,
    token_status_callback: Option<TokenStatusCallback>,
    tuning: RtdbTuning,
    reconnect_network: bool,
    last_status: Option<u16>,
    payload: String,
}

impl RtdbClient {
    /// Initializes the client from its configuration and authentication
    /// context.
    ///
    /// Applies the standard tuning ([`RtdbTuning::default`]): 1024-byte
    /// responses, 60 s read timeout, `tiny` write ceiling, 2/6 digit
    /// float/double precision.  Fails only on unusable configuration;
    /// network problems surface per operation.
    ///
    /// Precondition: the network stack is up.  This is not verified here.
    pub fn begin(
        stack: Stack<'static>,
        config: RtdbConfig,
        auth: RtdbAuth,
    ) -> Result<Self, RtdbError> {
        let endpoint = Endpoint::parse(&config.database_url)?;
        info!("Ok:    Database client configured for {endpoint}");

        let client = Self {
            stack,
            endpoint,
            auth,
            token_status_callback: config.token_status_callback,
            tuning: RtdbTuning::default(),
            reconnect_network: false,
            last_status: None,
            payload: String::new(),
        };

        if client.auth.token().is_some() {
            client.notify_token_status(TokenStatus::Ready);
        } else {
            client.notify_token_status(TokenStatus::Uninitialized);
        }

        Ok(client)
    }

    /// Enables or disables automatic network reconnection: with it enabled,
    /// an operation that fails below HTTP waits for the link to return and
    /// retries once.
    pub fn reconnect_network(&mut self, enable: bool) {
        self.reconnect_network = enable;
    }

    /// The endpoint the client talks to.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// The client's current tuning values.
    pub fn tuning(&self) -> &RtdbTuning {
        &self.tuning
    }

    /// Sets the response buffer size in bytes.
    pub fn set_response_size(&mut self, bytes: usize) {
        self.tuning = self.tuning.with_response_size(bytes);
    }

    /// Response buffer size in bytes.
    pub fn response_size(&self) -> usize {
        self.tuning.response_size()
    }

    /// Sets the read timeout in milliseconds.
    pub fn set_read_timeout_ms(&mut self, ms: u32) {
        self.tuning = self.tuning.with_read_timeout_ms(ms);
    }

    /// Read timeout in milliseconds.
    pub fn read_timeout_ms(&self) -> u32 {
        self.tuning.read_timeout_ms()
    }

    /// Sets the write-size ceiling tier.
    pub fn set_write_size_limit(&mut self, limit: WriteSizeLimit) {
        self.tuning = self.tuning.with_write_size_limit(limit);
    }

    /// Write-size ceiling tier.
    pub fn write_size_limit(&self) -> WriteSizeLimit {
        self.tuning.write_size_limit()
    }

    /// Sets the float serialization precision.
    pub fn set_float_digits(&mut self, digits: u8) {
        self.tuning = self.tuning.with_float_digits(digits);
    }

    /// Float serialization precision in decimal digits.
    pub fn float_digits(&self) -> u8 {
        self.tuning.float_digits()
    }

    /// Sets the double serialization precision.
    pub fn set_double_digits(&mut self, digits: u8) {
        self.tuning = self.tuning.with_double_digits(digits);
    }

    /// Double serialization precision in decimal digits.
    pub fn double_digits(&self) -> u8 {
        self.tuning.double_digits()
    }

    /// HTTP status of the last completed exchange.
    pub fn last_status(&self) -> Option<u16> {
        self.last_status
    }

    /// Body of the last completed exchange.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Reads the node at `path`, returning its JSON value.  A missing node
    /// reads as `null`.
    pub async fn get(&mut self, path: &str) -> Result<&str, RtdbError> {
        self.request(Method::Get, path, None).await?;
        Ok(self.payload())
    }

    /// Writes `value` to the node at `path`, replacing it.
    pub async fn set<T: Serialize>(&mut self, path: &str, value: &T) -> Result<(), RtdbError> {
        let body = serde_json::to_string(value).map_err(|_| RtdbError::Protocol)?;
        self.request(Method::Put, path, Some(&body)).await
    }

    /// Writes a raw JSON document to the node at `path`.
    pub async fn set_json(&mut self, path: &str, json: &str) -> Result<(), RtdbError> {
        self.request(Method::Put, path, Some(json)).await
    }

    /// Writes a float with the configured serialization precision.
    pub async fn set_float(&mut self, path: &str, value: f32) -> Result<(), RtdbError> {
        let body = tuning::format_float(value, self.tuning.float_digits());
        self.request(Method::Put, path, Some(&body)).await
    }

    /// Writes a double with the configured serialization precision.
    pub async fn set_double(&mut self, path: &str, value: f64) -> Result<(), RtdbError> {
        let body = tuning::format_double(value, self.tuning.double_digits());
        self.request(Method::Put, path, Some(&body)).await
    }

    /// Appends `value` under `path` with a server-generated key.
    pub async fn push<T: Serialize>(&mut self, path: &str, value: &T) -> Result<(), RtdbError> {
        let body = serde_json::to_string(value).map_err(|_| RtdbError::Protocol)?;
        self.request(Method::Post, path, Some(&body)).await
    }

    /// Merges the fields of a raw JSON document into the node at `path`.
    pub async fn update_json(&mut self, path: &str, json: &str) -> Result<(), RtdbError> {
        self.request(Method::Patch, path, Some(json)).await
    }

    /// Removes the node at `path`.
    pub async fn remove(&mut self, path: &str) -> Result<(), RtdbError> {
        self.request(Method::Delete, path, None).await
    }

    // One database operation: ceiling check, request build, exchange, and
    // the single reconnect-and-retry when enabled.
    async fn request(
        &mut self,
        method: Method,
        path: &str,
        body: Option<&str>,
    ) -> Result<(), RtdbError> {
        if let Some(body) = body
            && let Some(max) = self.tuning.write_size_limit().max_bytes()
            && body.len() > max
        {
            warn!(
                "Error: {} byte payload over the {} write limit",
                body.len(),
                self.tuning.write_size_limit()
            );
            return Err(RtdbError::PayloadTooLarge(body.len()));
        }

        let request = rest::build_request(method, &self.endpoint, path, self.auth.token(), body);

        let exchange =
            match transport::exchange(self.stack, &self.endpoint, &self.tuning, &request).await {
                Ok(exchange) => exchange,
                Err(error) if error.is_transport() && self.reconnect_network => {
                    warn!("Warn:  Database {method} failed ({error}), waiting for network");
                    self.wait_for_link().await?;
                    transport::exchange(self.stack, &self.endpoint, &self.tuning, &request).await?
                }
                Err(error) => return Err(error),
            };

        self.last_status = Some(exchange.status);
        self.payload = exchange.body;

        match exchange.status {
            200..=299 => {
                debug!("Ok:    Database {method} {path} -> {}", exchange.status);
                Ok(())
            }
            401 | 403 => {
                self.notify_token_status(TokenStatus::Unauthorized);
                Err(RtdbError::Unauthorized)
            }
            status => Err(RtdbError::Http(status)),
        }
    }

    // Waits for the network link to come back, bounded by RECONNECT_WAIT.
    async fn wait_for_link(&self) -> Result<(), RtdbError> {
        let wait = async {
            while !self.stack.is_link_up() {
                Timer::after_millis(100).await;
            }
            self.stack.wait_config_up().await;
        };
        with_timeout(RECONNECT_WAIT, wait)
            .await
            .map_err(|_| RtdbError::Network)
    }

    fn notify_token_status(&self, status: TokenStatus) {
        debug!("Info:  Token status: {status}");
        if let Some(callback) = self.token_status_callback {
            callback(status);
        }
    }
}
