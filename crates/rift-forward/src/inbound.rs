//! Maps upstream responses back into the internal model.

use crate::model::{Body, Header, Response};
use crate::transport::RawResponse;

/// Materialize a [`Response`] from what the upstream sent.
///
/// Header names keep the order in which they first appeared and every value is
/// kept. The body is read as raw bytes in binary mode and as UTF-8 text
/// otherwise, mirroring how the request body was encoded.
pub fn map_response(raw: RawResponse, binary_body: bool) -> Response {
    let mut headers: Vec<Header> = Vec::new();
    for (name, value) in raw.headers {
        match headers.iter_mut().find(|h| h.name == name) {
            Some(existing) => existing.values.push(value),
            None => headers.push(Header::new(name, [value])),
        }
    }

    let body = if raw.body.is_empty() {
        None
    } else if binary_body {
        Some(Body::Binary(raw.body.to_vec()))
    } else {
        Some(Body::Text(String::from_utf8_lossy(&raw.body).into_owned()))
    };

    Response {
        status_code: Some(raw.status),
        headers,
        body,
    }
}
