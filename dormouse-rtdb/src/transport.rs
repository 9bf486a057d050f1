// Copyright (C) 2025 Dormouse Project Developers
//
// MIT License

//! dormouse-rtdb - HTTP transport over embassy-net
//!
//! One TCP connection per database operation: resolve, connect, write the
//! request, read to connection close (or `Content-Length`), parse the
//! status line and headers with `httparse`, hand the body back.  The
//! configured read timeout bounds the whole response read; the configured
//! response size bounds the body.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::net::Ipv4Addr;
use embassy_net::dns::DnsQueryType;
use embassy_net::tcp::TcpSocket;
use embassy_net::{IpAddress, Stack};
use embassy_time::{Duration, with_timeout};
use embedded_io_async::Write;
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

use dormouse_core::rest::Endpoint;
use dormouse_core::tuning::RtdbTuning;

use crate::RtdbError;

// TCP buffer sizes.  The receive buffer must cover the status line and
// headers on top of the configured response size.
const TCP_TX_BUF_SIZE: usize = 1024;
const HEADER_BUDGET: usize = 1024;

const MAX_HEADERS: usize = 32;

/// A parsed database response: HTTP status plus JSON body.
pub(crate) struct HttpExchange {
    pub(crate) status: u16,
    pub(crate) body: String,
}

/// Performs one request/response exchange against the database endpoint.
pub(crate) async fn exchange(
    stack: Stack<'static>,
    endpoint: &Endpoint,
    tuning: &RtdbTuning,
    request: &str,
) -> Result<HttpExchange, RtdbError> {
    let address = resolve(stack, endpoint.host()).await?;

    let mut rx_buf = vec![0u8; tuning.response_size() + HEADER_BUDGET];
    let mut tx_buf = vec![0u8; TCP_TX_BUF_SIZE];
    let mut socket = TcpSocket::new(stack, &mut rx_buf, &mut tx_buf);

    trace!("Exec:  Connecting to {}:{}", endpoint.host(), endpoint.port());
    socket.connect((address, endpoint.port())).await?;

    socket.write_all(request.as_bytes()).await?;
    socket.flush().await?;

    let timeout = Duration::from_millis(tuning.read_timeout_ms() as u64);
    let raw = match with_timeout(timeout, read_response(&mut socket, tuning)).await {
        Ok(result) => result?,
        Err(_) => {
            warn!("Error: Database read timed out after {}ms", timeout.as_millis());
            return Err(RtdbError::Timeout);
        }
    };

    socket.close();

    parse_response(&raw, tuning)
}

// Resolves the endpoint host - address literals short-circuit DNS.
async fn resolve(stack: Stack<'static>, host: &str) -> Result<IpAddress, RtdbError> {
    if let Ok(address) = host.parse::<Ipv4Addr>() {
        return Ok(IpAddress::Ipv4(address));
    }

    let addresses = stack
        .dns_query(host, DnsQueryType::A)
        .await
        .map_err(|_| RtdbError::Dns)?;
    addresses.first().copied().ok_or(RtdbError::Dns)
}

// Reads the response until the peer closes, the headers' Content-Length is
// satisfied, or the raw budget is exhausted.
async fn read_response(
    socket: &mut TcpSocket<'_>,
    tuning: &RtdbTuning,
) -> Result<Vec<u8>, RtdbError> {
    let budget = tuning.response_size() + HEADER_BUDGET;
    let mut raw: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 512];

    loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&chunk[..n]);
        if raw.len() > budget {
            return Err(RtdbError::ResponseTooLarge);
        }
        if response_complete(&raw) {
            break;
        }
    }

    Ok(raw)
}

// Returns true once the headers are in and Content-Length many body bytes
// have arrived.  Servers that omit Content-Length are read to close.
fn response_complete(raw: &[u8]) -> bool {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut response = httparse::Response::new(&mut headers);
    let header_end = match response.parse(raw) {
        Ok(httparse::Status::Complete(n)) => n,
        _ => return false,
    };

    let content_length = response
        .headers
        .iter()
        .find(|header| header.name.eq_ignore_ascii_case("content-length"))
        .and_then(|header| core::str::from_utf8(header.value).ok())
        .and_then(|value| value.trim().parse::<usize>().ok());

    match content_length {
        Some(length) => raw.len() - header_end >= length,
        None => false,
    }
}

// Splits the raw response into status and body.
fn parse_response(raw: &[u8], tuning: &RtdbTuning) -> Result<HttpExchange, RtdbError> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut response = httparse::Response::new(&mut headers);
    let header_end = match response.parse(raw) {
        Ok(httparse::Status::Complete(n)) => n,
        Ok(httparse::Status::Partial) | Err(_) => {
            warn!("Error: Malformed HTTP response from database");
            return Err(RtdbError::Protocol);
        }
    };

    let status = response.code.ok_or(RtdbError::Protocol)?;

    let body = &raw[header_end..];
    if body.len() > tuning.response_size() {
        return Err(RtdbError::ResponseTooLarge);
    }
    let body = core::str::from_utf8(body).map_err(|_| RtdbError::Protocol)?;

    trace!("Ok:    Database responded {status}, {} body bytes", body.len());
    Ok(HttpExchange {
        status,
        body: String::from(body),
    })
}
