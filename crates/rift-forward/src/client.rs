//! Forwarding entry points.
//!
//! [`ForwardingClient`] owns the shared transport handle and exposes the two
//! calls made by the rest of the proxy: replaying a captured request against
//! its upstream, and pushing a document to a cooperating instance over the
//! control channel.

use crate::config::ClientConfig;
use crate::error::ForwardError;
use crate::inbound::map_response;
use crate::method::HttpMethod;
use crate::model::{Request, Response};
use crate::outbound::{build_outbound_request, create_request, Entity};
use crate::transport::{HttpTransport, Transport, TransportError};
use crate::uri::build_url;
use std::sync::Arc;
use tracing::{debug, enabled, trace, Level};

/// Join a base URI and a path with exactly one `/` between them.
pub fn join_path(base_uri: &str, path: &str) -> String {
    match (base_uri.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{base_uri}{}", &path[1..]),
        (false, false) => format!("{base_uri}/{path}"),
        _ => format!("{base_uri}{path}"),
    }
}

#[derive(Clone)]
pub struct ForwardingClient {
    transport: Arc<dyn Transport>,
}

impl ForwardingClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        Ok(Self::new(Arc::new(HttpTransport::from_config(config)?)))
    }

    /// Client over the default transport, with the trust-all policy applied
    /// when `secure` is set.
    pub fn secure(secure: bool) -> Result<Self, TransportError> {
        Self::from_config(&ClientConfig::secure(secure))
    }

    /// Replay `request` against its upstream and map the answer back.
    ///
    /// A query string inside `request.url` takes precedence over
    /// `request.query_string_parameters`. A redirect loop yields
    /// `Response::default()` instead of an error.
    pub async fn send_request(
        &self,
        mut request: Request,
        binary_body: bool,
    ) -> Result<Response, ForwardError> {
        let url = build_url(&mut request)?;
        let method = HttpMethod::parse(&request.method);
        debug!("{} => {}", method, url);

        let outbound = build_outbound_request(method, url.as_str(), &request, binary_body)
            .map_err(|source| ForwardError::Base64 {
                url: request.url.clone(),
                source,
            })?;

        if enabled!(Level::TRACE) {
            match serde_json::to_string_pretty(&request) {
                Ok(json) => trace!("Proxy sending request:\n{}", json),
                Err(e) => trace!("Could not serialize request for logging: {}", e),
            }
        }

        match self.transport.execute(outbound).await {
            Ok(raw) => Ok(map_response(raw, binary_body)),
            Err(e) if e.is_circular_redirect() => {
                debug!("Circular redirect aborting request: {}", e);
                Ok(Response::default())
            }
            Err(source) => Err(ForwardError::Transport {
                url: request.url,
                source,
            }),
        }
    }

    /// PUT `body` to `base_uri` joined with `path` and return the response
    /// body as text.
    pub async fn send_put_request(
        &self,
        base_uri: &str,
        path: &str,
        body: &str,
    ) -> Result<String, ForwardError> {
        let url = join_path(base_uri, path);
        let mut put = create_request(HttpMethod::Put, url.as_str());
        put.set_entity(Entity::Text(body.to_string()));

        let raw = self
            .transport
            .execute(put)
            .await
            .map_err(|source| ForwardError::ControlChannel {
                url: url.clone(),
                body: body.to_string(),
                source,
            })?;

        Ok(String::from_utf8_lossy(&raw.body).into_owned())
    }
}
