//! HTTP method dispatch.
//!
//! Method tokens coming from the intercepting layer are free-form strings.
//! Parsing is total: anything that is not one of the eight known verbs is
//! forwarded as `GET`.

use crate::transport::TransportError;
use std::fmt;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Head,
    Options,
    Put,
    Patch,
    Delete,
    Trace,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Head,
        HttpMethod::Options,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Trace,
    ];

    /// Exact, case-sensitive match on the canonical token; falls back to `GET`.
    pub fn parse(token: &str) -> Self {
        match token {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "HEAD" => HttpMethod::Head,
            "OPTIONS" => HttpMethod::Options,
            "PUT" => HttpMethod::Put,
            "PATCH" => HttpMethod::Patch,
            "DELETE" => HttpMethod::Delete,
            "TRACE" => HttpMethod::Trace,
            other => {
                trace!("No match found for http method [{}]", other);
                HttpMethod::Get
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Trace => "TRACE",
        }
    }

    /// Whether requests of this verb carry an entity. Bodies attached to any
    /// other verb are dropped.
    pub fn encloses_entity(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }

    pub(crate) fn to_reqwest(self) -> Result<reqwest::Method, TransportError> {
        reqwest::Method::from_bytes(self.as_str().as_bytes())
            .map_err(|_| TransportError::InvalidMethod(self.as_str().to_string()))
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
