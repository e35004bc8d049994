//! Outbound URL construction.
//!
//! The captured URL string is encoded, parsed, and its query string is
//! rebuilt from the request's parameter list. If the URL string carries its
//! own query, that query replaces whatever parameters were set on the request.

use crate::error::ForwardError;
use crate::model::{Parameter, Request};
use url::Url;

/// Characters left untouched by [`encode_url`] besides ASCII letters and digits.
const URL_ALLOWED_CHARACTERS: &[char] = &[
    '-', '.', '_', '~', '!', '$', '&', '\'', '(', ')', '*', '+', ',', ';', '=', ':', '@', '/', '?',
    '#', '[', ']', '%',
];

/// Percent-encode every character that may not appear in a URL.
///
/// Reserved delimiters and existing `%XX` escapes are kept, so the result
/// still parses into the same components.
pub fn encode_url(raw: &str) -> String {
    let mut encoded = String::with_capacity(raw.len());
    let mut buf = [0u8; 4];
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() || URL_ALLOWED_CHARACTERS.contains(&c) {
            encoded.push(c);
        } else {
            encoded.push_str(&urlencoding::encode(c.encode_utf8(&mut buf)));
        }
    }
    encoded
}

/// Decode a raw query string into parameters.
///
/// Pairs are split on `&` and `;`. Repeated names are merged into one
/// parameter, keeping the order in which names and values first appear.
pub fn decode_query(query: &str) -> Vec<Parameter> {
    let mut parameters: Vec<Parameter> = Vec::new();
    for pair in query.split(['&', ';']) {
        let (name, value) = match pair.split_once('=') {
            Some((name, value)) => (name, value),
            None => (pair, ""),
        };
        let name = decode_component(name);
        if name.is_empty() {
            continue;
        }
        let value = decode_component(value);
        match parameters.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.values.push(value),
            None => parameters.push(Parameter::new(name, [value])),
        }
    }
    parameters
}

fn decode_component(component: &str) -> String {
    let spaced = component.replace('+', " ");
    String::from_utf8_lossy(&urlencoding::decode_binary(spaced.as_bytes())).into_owned()
}

/// Serialize parameters as `name=value` pairs joined by `&`.
///
/// A parameter without values contributes `name=`. Returns `None` when there
/// is nothing to emit.
pub fn format_query(parameters: &[Parameter]) -> Option<String> {
    let mut pairs: Vec<String> = Vec::new();
    for parameter in parameters {
        if parameter.values.is_empty() {
            pairs.push(format!("{}=", parameter.name));
        } else {
            for value in &parameter.values {
                pairs.push(format!("{}={}", parameter.name, value));
            }
        }
    }
    let query = pairs.join("&");
    if query.is_empty() {
        None
    } else {
        Some(query)
    }
}

/// Build the authoritative outbound URL for `request`.
///
/// Replaces `request.query_string_parameters` when the URL string has a query
/// of its own. The fragment is never forwarded.
pub fn build_url(request: &mut Request) -> Result<Url, ForwardError> {
    let encoded = encode_url(&request.url);
    let mut url = Url::parse(&encoded).map_err(|source| ForwardError::MalformedUrl {
        url: request.url.clone(),
        source,
    })?;

    if let Some(query) = url.query() {
        request.query_string_parameters = decode_query(query);
    }

    let query = format_query(&request.query_string_parameters);
    url.set_query(query.as_deref());
    url.set_fragment(None);
    Ok(url)
}
