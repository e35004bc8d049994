//! Wire-level request construction.
//!
//! Turns a captured [`Request`] into an [`OutboundRequest`] ready for the
//! transport: headers copied in order, cookies folded into one `Cookie`
//! header, and the body attached as text or raw bytes.

use crate::method::HttpMethod;
use crate::model::{Body, Cookie, Request};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

pub const CONTENT_LENGTH: &str = "Content-Length";
pub const TRANSFER_ENCODING: &str = "Transfer-Encoding";
pub const COOKIE: &str = "Cookie";

/// Request entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    Text(String),
    Bytes(Vec<u8>),
}

impl Entity {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Entity::Text(text) => text.as_bytes(),
            Entity::Bytes(bytes) => bytes,
        }
    }
}

/// A request in the shape it goes onto the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub method: HttpMethod,
    pub uri: String,
    /// Header lines in send order; names may repeat.
    pub headers: Vec<(String, String)>,
    pub entity: Option<Entity>,
}

impl OutboundRequest {
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// Attach an entity. Ignored for verbs that do not carry one.
    pub fn set_entity(&mut self, entity: Entity) {
        if self.method.encloses_entity() {
            self.entity = Some(entity);
        }
    }

    /// All values of the named header, compared case-insensitively.
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.header_values(name).next().is_some()
    }
}

/// Create the verb-specific request for `uri`, with no headers and no entity.
pub fn create_request(method: HttpMethod, uri: impl Into<String>) -> OutboundRequest {
    OutboundRequest {
        method,
        uri: uri.into(),
        headers: Vec::new(),
        entity: None,
    }
}

/// Fold cookies into a single `Cookie` header value.
///
/// Each value becomes its own `name=value` pair; a cookie without values
/// becomes `name=`. Returns `None` when there are no cookies.
pub fn format_cookies(cookies: &[Cookie]) -> Option<String> {
    if cookies.is_empty() {
        return None;
    }
    let mut pairs: Vec<String> = Vec::new();
    for cookie in cookies {
        if cookie.values.is_empty() {
            pairs.push(format!("{}=", cookie.name));
        } else {
            for value in &cookie.values {
                pairs.push(format!("{}={}", cookie.name, value));
            }
        }
    }
    Some(pairs.join("; "))
}

fn is_recomputed_header(name: &str) -> bool {
    name.eq_ignore_ascii_case(CONTENT_LENGTH) || name.eq_ignore_ascii_case(TRANSFER_ENCODING)
}

/// Build the outbound request for `request`.
///
/// `Content-Length` and `Transfer-Encoding` are never copied; the transport
/// computes framing from the attached entity. In binary mode the body's text
/// form is decoded as Base64.
pub fn build_outbound_request(
    method: HttpMethod,
    uri: impl Into<String>,
    request: &Request,
    binary_body: bool,
) -> Result<OutboundRequest, base64::DecodeError> {
    let mut outbound = create_request(method, uri);

    for header in &request.headers {
        if is_recomputed_header(&header.name) {
            continue;
        }
        if header.values.is_empty() {
            outbound.add_header(header.name.as_str(), "");
        } else {
            for value in &header.values {
                outbound.add_header(header.name.as_str(), value.as_str());
            }
        }
    }

    if let Some(cookie_header) = format_cookies(&request.cookies) {
        outbound.add_header(COOKIE, cookie_header);
    }

    let entity = if binary_body {
        let bytes = match &request.body {
            Some(body) => decode_binary_body(body)?,
            None => Vec::new(),
        };
        Entity::Bytes(bytes)
    } else {
        Entity::Text(request.body.as_ref().map(Body::to_string).unwrap_or_default())
    };
    outbound.set_entity(entity);

    Ok(outbound)
}

fn decode_binary_body(body: &Body) -> Result<Vec<u8>, base64::DecodeError> {
    match body {
        Body::Binary(bytes) => Ok(bytes.clone()),
        Body::Text(text) => BASE64.decode(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Header;

    fn build(method: HttpMethod, request: &Request, binary_body: bool) -> OutboundRequest {
        build_outbound_request(method, "http://localhost/", request, binary_body).unwrap()
    }

    fn request_with_headers(headers: Vec<Header>) -> Request {
        Request::new()
            .with_method("GET")
            .with_url("http://localhost")
            .with_headers(headers)
    }

    #[test]
    fn test_create_request_per_verb() {
        for method in HttpMethod::ALL {
            let request = create_request(method, "http://localhost/");
            assert_eq!(request.method, method);
            assert_eq!(request.uri, "http://localhost/");
            assert!(request.headers.is_empty());
            assert!(request.entity.is_none());
        }
    }

    #[test]
    fn test_set_entity_ignored_for_bodyless_verbs() {
        for method in [
            HttpMethod::Get,
            HttpMethod::Head,
            HttpMethod::Options,
            HttpMethod::Delete,
            HttpMethod::Trace,
        ] {
            let mut request = create_request(method, "http://localhost/");
            request.set_entity(Entity::Text("ignored".into()));
            assert!(request.entity.is_none(), "{method} should not carry a body");
        }
    }

    #[test]
    fn test_headers_copied_in_order_with_repeats() {
        let request = request_with_headers(vec![
            Header::new("headerOneName", ["headerOneValueOne", "headerOneValueTwo"]),
            Header::new("headerTwoName", ["headerTwoValue"]),
            Header::empty("headerThreeName"),
        ]);
        let outbound = build(HttpMethod::Get, &request, false);
        assert_eq!(
            outbound.headers,
            vec![
                ("headerOneName".to_string(), "headerOneValueOne".to_string()),
                ("headerOneName".to_string(), "headerOneValueTwo".to_string()),
                ("headerTwoName".to_string(), "headerTwoValue".to_string()),
                ("headerThreeName".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_framing_headers_dropped_regardless_of_case() {
        let request = request_with_headers(vec![
            Header::new("Content-Length", ["10"]),
            Header::new("content-length", ["10"]),
            Header::new("CONTENT-LENGTH", ["10"]),
            Header::new("Transfer-Encoding", ["chunked"]),
            Header::new("transfer-encoding", ["chunked"]),
            Header::new("tRaNsFeR-eNcOdInG", ["chunked"]),
            Header::new("X-Kept", ["yes"]),
        ]);
        let outbound = build(HttpMethod::Post, &request, false);
        assert!(!outbound.has_header(CONTENT_LENGTH));
        assert!(!outbound.has_header(TRANSFER_ENCODING));
        assert_eq!(outbound.headers.len(), 1);
        assert_eq!(outbound.header_values("x-kept").collect::<Vec<_>>(), vec!["yes"]);
    }

    #[test]
    fn test_format_cookies() {
        let cookies = vec![
            Cookie::new("cookieOneName", ["cookieOneValueOne", "cookieOneValueTwo"]),
            Cookie::new("cookieTwoName", ["cookieTwoValue"]),
            Cookie::empty("cookieThreeName"),
        ];
        assert_eq!(
            format_cookies(&cookies).as_deref(),
            Some(
                "cookieOneName=cookieOneValueOne; cookieOneName=cookieOneValueTwo; \
                 cookieTwoName=cookieTwoValue; cookieThreeName="
            )
        );
    }

    #[test]
    fn test_no_cookie_header_without_cookies() {
        let request = request_with_headers(vec![]);
        let outbound = build(HttpMethod::Get, &request, false);
        assert!(!outbound.has_header(COOKIE));
    }

    #[test]
    fn test_cookie_header_appended_after_headers() {
        let request = request_with_headers(vec![Header::new("headerOneName", ["v"])])
            .with_cookies(vec![Cookie::new("a", ["1"]), Cookie::new("b", ["2"])]);
        let outbound = build(HttpMethod::Get, &request, false);
        assert_eq!(outbound.headers.len(), 2);
        assert_eq!(
            outbound.headers[1],
            ("Cookie".to_string(), "a=1; b=2".to_string())
        );
    }

    #[test]
    fn test_text_body_attached_verbatim() {
        let request = Request::new().with_body("bodyContent");
        let outbound = build(HttpMethod::Post, &request, false);
        assert_eq!(outbound.entity, Some(Entity::Text("bodyContent".into())));
    }

    #[test]
    fn test_missing_body_attaches_empty_entity() {
        let request = Request::new();
        let text = build(HttpMethod::Put, &request, false);
        assert_eq!(text.entity, Some(Entity::Text(String::new())));

        let binary = build(HttpMethod::Put, &request, true);
        assert_eq!(binary.entity, Some(Entity::Bytes(Vec::new())));
    }

    #[test]
    fn test_binary_body_decoded_from_base64_text() {
        let request = Request::new().with_body(Body::text("AJ+Slg=="));
        let outbound = build(HttpMethod::Patch, &request, true);
        assert_eq!(outbound.entity, Some(Entity::Bytes(vec![0, 159, 146, 150])));
    }

    #[test]
    fn test_binary_body_round_trip_is_byte_identical() {
        let bytes: Vec<u8> = (0..=255).collect();
        let request = Request::new().with_body(Body::binary(bytes.clone()));
        let outbound = build(HttpMethod::Post, &request, true);
        assert_eq!(outbound.entity.unwrap().as_bytes(), bytes.as_slice());
    }

    #[test]
    fn test_invalid_base64_body_fails() {
        let request = Request::new().with_body("not base64!");
        let result = build_outbound_request(HttpMethod::Post, "http://localhost/", &request, true);
        assert!(result.is_err());
    }

    #[test]
    fn test_body_not_attached_to_get() {
        let request = Request::new().with_body("bodyContent");
        let outbound = build(HttpMethod::Get, &request, false);
        assert!(outbound.entity.is_none());
    }
}
