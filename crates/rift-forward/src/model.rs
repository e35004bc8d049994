//! Internal request/response representation.
//!
//! These are the values handed over by the intercepting layer and returned to
//! it. Multi-valued headers, cookies and query parameters are modelled as a
//! name with an ordered list of values; an empty list still means "present
//! with an empty value" when serialized onto the wire.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! multi_value_entity {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            pub name: String,
            #[serde(default)]
            pub values: Vec<String>,
        }

        impl $name {
            pub fn new<N, I, V>(name: N, values: I) -> Self
            where
                N: Into<String>,
                I: IntoIterator<Item = V>,
                V: Into<String>,
            {
                Self {
                    name: name.into(),
                    values: values.into_iter().map(Into::into).collect(),
                }
            }

            /// Entry with no values; serializes as `name` with an empty value.
            pub fn empty(name: impl Into<String>) -> Self {
                Self {
                    name: name.into(),
                    values: Vec::new(),
                }
            }
        }
    };
}

multi_value_entity!(
    /// HTTP header, possibly repeated.
    Header
);
multi_value_entity!(
    /// Request cookie.
    Cookie
);
multi_value_entity!(
    /// Query string parameter.
    Parameter
);

/// Message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "UPPERCASE")]
pub enum Body {
    #[serde(rename = "STRING")]
    Text(String),
    #[serde(with = "base64_bytes")]
    Binary(Vec<u8>),
}

impl Body {
    pub fn text(text: impl Into<String>) -> Self {
        Body::Text(text.into())
    }

    pub fn binary(bytes: impl Into<Vec<u8>>) -> Self {
        Body::Binary(bytes.into())
    }
}

/// Text form of a body. Binary bodies render as standard Base64 so that the
/// forwarding path can decode them back to the exact bytes.
impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Text(text) => f.write_str(text),
            Body::Binary(bytes) => f.write_str(&BASE64.encode(bytes)),
        }
    }
}

mod base64_bytes {
    use super::BASE64;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S: Serializer>(bytes: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64.decode(encoded).map_err(serde::de::Error::custom)
    }
}

/// A captured request as seen by the intercepting layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query_string_parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<Header>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cookies: Vec<Cookie>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Body>,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_query_parameters(
        mut self,
        parameters: impl IntoIterator<Item = Parameter>,
    ) -> Self {
        self.query_string_parameters = parameters.into_iter().collect();
        self
    }

    pub fn with_headers(mut self, headers: impl IntoIterator<Item = Header>) -> Self {
        self.headers = headers.into_iter().collect();
        self
    }

    pub fn with_cookies(mut self, cookies: impl IntoIterator<Item = Cookie>) -> Self {
        self.cookies = cookies.into_iter().collect();
        self
    }

    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Response handed back to the intercepting layer.
///
/// The default value carries no status, no headers and no body; it stands for
/// "no answer" when the upstream could not be reached in a recoverable way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<Header>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Body>,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn with_headers(mut self, headers: impl IntoIterator<Item = Header>) -> Self {
        self.headers = headers.into_iter().collect();
        self
    }

    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// First value of the named header, compared case-insensitively.
    pub fn first_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .and_then(|h| h.values.first())
            .map(String::as_str)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Binary(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_body_displays_as_base64() {
        let body = Body::binary(vec![0u8, 159, 146, 150]);
        assert_eq!(body.to_string(), "AJ+Slg==");
    }

    #[test]
    fn test_text_body_displays_verbatim() {
        assert_eq!(Body::text("bodyContent").to_string(), "bodyContent");
    }

    #[test]
    fn test_empty_entity_has_no_values() {
        let header = Header::empty("headerThreeName");
        assert_eq!(header.name, "headerThreeName");
        assert!(header.values.is_empty());
    }

    #[test]
    fn test_request_builder() {
        let request = Request::new()
            .with_method("POST")
            .with_url("http://host:8080/path")
            .with_path("/path")
            .with_query_parameters(vec![Parameter::new("a", ["1", "2"])])
            .with_cookies(vec![Cookie::new("c", ["v"])])
            .with_body("bodyContent");

        assert_eq!(request.method, "POST");
        assert_eq!(request.query_string_parameters[0].values, vec!["1", "2"]);
        assert_eq!(request.body, Some(Body::text("bodyContent")));
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let request = Request::new()
            .with_method("GET")
            .with_query_parameters(vec![Parameter::new("q", ["x"])]);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["method"], "GET");
        assert_eq!(json["queryStringParameters"][0]["name"], "q");
        assert!(json.get("body").is_none());
    }

    #[test]
    fn test_binary_body_json_round_trip() {
        let body = Body::binary(b"\x00\x01binary".to_vec());
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("BINARY"));
        let back: Body = serde_json::from_str(&json).unwrap();
        assert_eq!(back, body);
    }

    #[test]
    fn test_default_response_is_empty() {
        let response = Response::default();
        assert_eq!(response.status_code, None);
        assert!(response.headers.is_empty());
        assert_eq!(response.body, None);
    }

    #[test]
    fn test_first_header_is_case_insensitive() {
        let response =
            Response::new().with_headers(vec![Header::new("Content-Type", ["text/plain"])]);
        assert_eq!(response.first_header("content-type"), Some("text/plain"));
        assert_eq!(response.first_header("x-missing"), None);
    }
}
