// Copyright (C) 2025 Dormouse Project Developers
//
// MIT License

//! dormouse-core - Realtime-database REST protocol
//!
//! The realtime database exposes every node as `<path>.json`, with an
//! optional `auth` query parameter carrying the legacy access secret.  This
//! module turns a database URL into an [`Endpoint`] and a database operation
//! into the full HTTP/1.1 request text.  Transport lives elsewhere
//! (`dormouse-rtdb`); everything here is pure string work and runs on the
//! host.

use alloc::format;
use alloc::string::String;
use core::fmt;

/// Port used when the database URL does not carry one.
pub const DEFAULT_PORT: u16 = 80;

/// User-Agent header sent with every request.
pub const USER_AGENT: &str = concat!("dormouse/", env!("CARGO_PKG_VERSION"));

/// Error type for endpoint parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointError {
    /// The URL is empty, or empty once the scheme is removed.
    Empty,

    /// The URL carries a scheme other than plain `http`.  The client speaks
    /// plaintext HTTP only; TLS must be terminated in front of it.
    UnsupportedScheme,

    /// The `:port` suffix is not a valid non-zero port number.
    InvalidPort,
}

impl fmt::Display for EndpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointError::Empty => write!(f, "empty database URL"),
            EndpointError::UnsupportedScheme => {
                write!(f, "unsupported URL scheme, only http:// is spoken")
            }
            EndpointError::InvalidPort => write!(f, "invalid port in database URL"),
        }
    }
}

/// A parsed database endpoint: host plus port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Parses a database URL.
    ///
    /// Accepts `http://host`, `http://host:port`, bare `host` and
    /// `host:port` forms; a trailing path is ignored.  Anything with a
    /// non-`http` scheme is rejected.
    pub fn parse(url: &str) -> Result<Endpoint, EndpointError> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(EndpointError::Empty);
        }

        let rest = match trimmed.split_once("://") {
            Some(("http", rest)) => rest,
            Some(_) => return Err(EndpointError::UnsupportedScheme),
            None => trimmed,
        };

        // Drop any path component - the database URL is just an origin.
        let authority = rest.split('/').next().unwrap_or("");

        let (host, port) = match authority.split_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .ok()
                    .filter(|port| *port != 0)
                    .ok_or(EndpointError::InvalidPort)?;
                (host, port)
            }
            None => (authority, DEFAULT_PORT),
        };

        if host.is_empty() {
            return Err(EndpointError::Empty);
        }

        Ok(Endpoint {
            host: String::from(host),
            port,
        })
    }

    /// Host name or address literal.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Value for the HTTP `Host` header - the port is included only when it
    /// is not the default.
    pub fn host_header(&self) -> String {
        if self.port == DEFAULT_PORT {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.host_header())
    }
}

/// HTTP methods used against the realtime-database REST surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Read a node.
    Get,

    /// Write a node, replacing its value.
    Put,

    /// Append under a node with a server-generated key.
    Post,

    /// Merge fields into a node.
    Patch,

    /// Remove a node.
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalizes a database path into its REST `.json` form.
///
/// Leading and trailing slashes are tolerated; the database root maps to
/// `/.json`.
pub fn json_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        String::from("/.json")
    } else {
        format!("/{trimmed}.json")
    }
}

/// Builds the full HTTP/1.1 request text for one database operation.
///
/// The auth token is appended as the `auth` query parameter when present and
/// non-empty.  A body implies `Content-Type: application/json` and an exact
/// `Content-Length`.  Every request closes the connection - the client opens
/// one socket per operation.
pub fn build_request(
    method: Method,
    endpoint: &Endpoint,
    path: &str,
    auth: Option<&str>,
    body: Option<&str>,
) -> String {
    let mut target = json_path(path);
    if let Some(token) = auth.filter(|token| !token.is_empty()) {
        target.push_str("?auth=");
        target.push_str(token);
    }

    let mut request = format!(
        "{method} {target} HTTP/1.1\r\n\
         Host: {host}\r\n\
         User-Agent: {USER_AGENT}\r\n\
         Accept: application/json\r\n\
         Connection: close\r\n",
        host = endpoint.host_header(),
    );
    if let Some(body) = body {
        request.push_str("Content-Type: application/json\r\n");
        request.push_str(&format!("Content-Length: {}\r\n", body.len()));
    }
    request.push_str("\r\n");
    if let Some(body) = body {
        request.push_str(body);
    }
    request
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_http_url() {
        let endpoint = Endpoint::parse("http://db.example.net").unwrap();
        assert_eq!(endpoint.host(), "db.example.net");
        assert_eq!(endpoint.port(), 80);
        assert_eq!(endpoint.host_header(), "db.example.net");
    }

    #[test]
    fn parses_host_port_and_ignores_path() {
        let endpoint = Endpoint::parse("http://10.0.0.2:9000/ignored/path").unwrap();
        assert_eq!(endpoint.host(), "10.0.0.2");
        assert_eq!(endpoint.port(), 9000);
        assert_eq!(endpoint.host_header(), "10.0.0.2:9000");
    }

    #[test]
    fn parses_bare_authority() {
        let endpoint = Endpoint::parse("db.local:8080").unwrap();
        assert_eq!(endpoint.host(), "db.local");
        assert_eq!(endpoint.port(), 8080);
    }

    #[test]
    fn rejects_tls_and_unknown_schemes() {
        assert_eq!(
            Endpoint::parse("https://db.example.net"),
            Err(EndpointError::UnsupportedScheme)
        );
        assert_eq!(
            Endpoint::parse("mqtt://broker"),
            Err(EndpointError::UnsupportedScheme)
        );
    }

    #[test]
    fn rejects_empty_and_bad_ports() {
        assert_eq!(Endpoint::parse(""), Err(EndpointError::Empty));
        assert_eq!(Endpoint::parse("http://"), Err(EndpointError::Empty));
        assert_eq!(
            Endpoint::parse("http://db:0"),
            Err(EndpointError::InvalidPort)
        );
        assert_eq!(
            Endpoint::parse("http://db:notaport"),
            Err(EndpointError::InvalidPort)
        );
    }

    #[test]
    fn json_path_forms() {
        assert_eq!(json_path(""), "/.json");
        assert_eq!(json_path("/"), "/.json");
        assert_eq!(json_path("reports/boot"), "/reports/boot.json");
        assert_eq!(json_path("/reports/boot/"), "/reports/boot.json");
    }

    #[test]
    fn get_request_has_no_body_headers() {
        let endpoint = Endpoint::parse("http://db.local").unwrap();
        let request = build_request(Method::Get, &endpoint, "/config/sleep_secs", None, None);
        assert!(request.starts_with("GET /config/sleep_secs.json HTTP/1.1\r\n"));
        assert!(request.contains("Host: db.local\r\n"));
        assert!(request.contains("Connection: close\r\n"));
        assert!(!request.contains("Content-Length"));
        assert!(request.ends_with("\r\n\r\n"));
    }

    #[test]
    fn put_request_carries_exact_content_length() {
        let endpoint = Endpoint::parse("http://db.local:9000").unwrap();
        let body = r#"{"ok":true}"#;
        let request = build_request(
            Method::Put,
            &endpoint,
            "status",
            Some("s3cret"),
            Some(body),
        );
        assert!(request.starts_with("PUT /status.json?auth=s3cret HTTP/1.1\r\n"));
        assert!(request.contains("Host: db.local:9000\r\n"));
        assert!(request.contains("Content-Type: application/json\r\n"));
        assert!(request.contains(&format!("Content-Length: {}\r\n", body.len())));
        assert!(request.ends_with(body));
    }

    #[test]
    fn empty_auth_token_is_omitted() {
        let endpoint = Endpoint::parse("http://db.local").unwrap();
        let request = build_request(Method::Get, &endpoint, "status", Some(""), None);
        assert!(request.starts_with("GET /status.json HTTP/1.1\r\n"));
        assert!(!request.contains("auth="));
    }
}
