//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. The core builds `HttpRequest`
//! values and parses `HttpResponse` values without ever opening a socket;
//! whoever hosts the core executes the round-trip through the
//! `HttpTransport` seam. That keeps every state machine in this crate
//! deterministic: tests hand in canned responses, real hosts hand in
//! whatever their HTTP stack produced.
//!
//! All fields are owned (`String`, `Vec`) so values can be moved freely
//! between the core and the host.

use thiserror::Error;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

/// An HTTP request described as plain data.
///
/// Built by `JudgeClient::build_*` methods; executed by the host.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// An HTTP response described as plain data.
///
/// Constructed by the host after executing an `HttpRequest`, then handed
/// to `JudgeClient::parse_*` methods.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// Value of the `content-type` header, matched case-insensitively.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
            .map(|(_, value)| value.as_str())
    }

    /// Whether the server declared a JSON body.
    pub fn is_json(&self) -> bool {
        self.content_type()
            .is_some_and(|value| value.contains("application/json"))
    }
}

/// The round-trip itself failed: DNS, connect, TLS, timeout. The server
/// was never heard from, so there is no status code to report.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// The single IO seam of the crate. Hosts implement this once for their
/// HTTP stack; the core never calls anything else.
pub trait HttpTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_lookup_is_case_insensitive() {
        let response = HttpResponse {
            status: 200,
            headers: vec![("Content-Type".to_string(), "application/json; charset=utf-8".to_string())],
            body: String::new(),
        };
        assert_eq!(response.content_type(), Some("application/json; charset=utf-8"));
        assert!(response.is_json());
    }

    #[test]
    fn missing_content_type_is_not_json() {
        let response = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: "OK".to_string(),
        };
        assert_eq!(response.content_type(), None);
        assert!(!response.is_json());
    }

    #[test]
    fn text_content_type_is_not_json() {
        let response = HttpResponse {
            status: 200,
            headers: vec![("content-type".to_string(), "text/plain".to_string())],
            body: "OK".to_string(),
        };
        assert!(!response.is_json());
    }
}
