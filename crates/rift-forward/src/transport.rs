//! Transport client.
//!
//! [`Transport`] is the seam between the wire-model adapter and the network.
//! [`HttpTransport`] is the production implementation: shared `reqwest`
//! clients with connection pooling, no cookie store, and a redirect policy that
//! reports loops separately from plain redirect exhaustion.
//!
//! Only GET and HEAD follow 301/302/307/308. Every other verb gets the 3xx
//! back, except a first-hop 303, which is followed as a GET.

use crate::config::ClientConfig;
use crate::outbound::{Entity, OutboundRequest};
use crate::tls::{trust_all_client_config, TrustPolicy};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use url::Url;
use std::error::Error as StdError;
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Response as read off the wire, before mapping to the internal model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    /// Header lines in arrival order; names may repeat.
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Circular redirect to '{url}'")]
    CircularRedirect { url: String },
    #[error("Maximum redirects ({max}) exceeded")]
    TooManyRedirects { max: usize },
    #[error("Invalid URI '{uri}': {source}")]
    InvalidUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Invalid header '{name}'")]
    InvalidHeader { name: String },
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),
    #[error("Failed to build HTTP client: {0}")]
    Build(String),
    #[error(transparent)]
    Io(reqwest::Error),
}

impl TransportError {
    /// Redirect loops are answered with an empty response instead of failing.
    pub fn is_circular_redirect(&self) -> bool {
        matches!(self, TransportError::CircularRedirect { .. })
    }
}

/// Executes outbound requests.
///
/// Implementations must be safe to share between concurrently running
/// forwarding calls.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: OutboundRequest) -> Result<RawResponse, TransportError>;
}

#[derive(Debug, thiserror::Error)]
#[error("circular redirect to {0}")]
struct RedirectLoop(String);

#[derive(Debug, thiserror::Error)]
#[error("more than {0} redirects")]
struct RedirectLimit(usize);

fn redirect_policy(max_redirects: usize, see_other_only: bool) -> reqwest::redirect::Policy {
    reqwest::redirect::Policy::custom(move |attempt| {
        let first_hop = attempt.previous().len() == 1;
        if see_other_only && first_hop && attempt.status() != StatusCode::SEE_OTHER {
            attempt.stop()
        } else if attempt.previous().iter().any(|visited| visited == attempt.url()) {
            let url = attempt.url().to_string();
            attempt.error(RedirectLoop(url))
        } else if attempt.previous().len() > max_redirects {
            attempt.error(RedirectLimit(max_redirects))
        } else {
            attempt.follow()
        }
    })
}

fn find_source<'a, E: StdError + 'static>(err: &'a (dyn StdError + 'static)) -> Option<&'a E> {
    let mut current = err.source();
    while let Some(cause) = current {
        if let Some(found) = cause.downcast_ref::<E>() {
            return Some(found);
        }
        current = cause.source();
    }
    None
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_redirect() {
            if let Some(RedirectLoop(url)) = find_source::<RedirectLoop>(&err) {
                return TransportError::CircularRedirect { url: url.clone() };
            }
            if let Some(RedirectLimit(max)) = find_source::<RedirectLimit>(&err) {
                return TransportError::TooManyRedirects { max: *max };
            }
        }
        TransportError::Io(err)
    }
}

/// `reqwest`-backed transport, created once and shared by every forwarding call.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// GET and HEAD.
    client: reqwest::Client,
    /// Every other verb.
    entity_client: reqwest::Client,
}

impl HttpTransport {
    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        let trust_all = config.secure && config.trust_policy == TrustPolicy::TrustAll;
        if trust_all {
            warn!("TLS certificate verification DISABLED for upstream connections");
        }

        let client = build_client(config, trust_all, false)?;
        let entity_client = build_client(config, trust_all, true)?;

        info!(
            "Upstream client configured: secure={}, trust_policy={:?}, max_redirects={}",
            config.secure, config.trust_policy, config.max_redirects
        );

        Ok(Self {
            client,
            entity_client,
        })
    }

    fn client_for(&self, method: &Method) -> &reqwest::Client {
        if *method == Method::GET || *method == Method::HEAD {
            &self.client
        } else {
            &self.entity_client
        }
    }

    fn to_wire(&self, request: OutboundRequest) -> Result<reqwest::Request, TransportError> {
        let method = request.method.to_reqwest()?;
        let url = Url::parse(&request.uri).map_err(|source| TransportError::InvalidUri {
            uri: request.uri.clone(),
            source,
        })?;

        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| TransportError::InvalidHeader { name: name.clone() })?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| TransportError::InvalidHeader { name: name.clone() })?;
            headers.append(header_name, header_value);
        }

        let body = match request.entity {
            Some(Entity::Text(text)) => {
                if !headers.contains_key(CONTENT_TYPE) {
                    headers.insert(
                        CONTENT_TYPE,
                        HeaderValue::from_static(DEFAULT_TEXT_CONTENT_TYPE),
                    );
                }
                Some(reqwest::Body::from(text))
            }
            Some(Entity::Bytes(bytes)) => Some(reqwest::Body::from(bytes)),
            None => None,
        };

        let mut wire = reqwest::Request::new(method, url);
        *wire.headers_mut() = headers;
        *wire.body_mut() = body;
        Ok(wire)
    }
}

fn build_client(
    config: &ClientConfig,
    trust_all: bool,
    see_other_only: bool,
) -> Result<reqwest::Client, TransportError> {
    let mut builder = reqwest::Client::builder()
        .redirect(redirect_policy(config.max_redirects, see_other_only))
        .referer(false)
        .no_proxy();

    if let Some(secs) = config.connect_timeout_secs {
        builder = builder.connect_timeout(Duration::from_secs(secs));
    }
    if let Some(secs) = config.request_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    if trust_all {
        let tls = trust_all_client_config().map_err(|e| TransportError::Build(e.to_string()))?;
        builder = builder.use_preconfigured_tls(tls);
    }

    builder
        .build()
        .map_err(|e| TransportError::Build(e.to_string()))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: OutboundRequest) -> Result<RawResponse, TransportError> {
        let wire = self.to_wire(request)?;
        debug!("Sending {} {}", wire.method(), wire.url());

        let response = self.client_for(wire.method()).execute(wire).await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.bytes().await?;

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}
