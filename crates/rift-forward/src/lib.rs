//! Upstream forwarding for Rift.
//!
//! Takes a request captured by the intercepting layer, replays it against the
//! real upstream, and maps the upstream's answer back into the internal model.
//!
//! # Module Structure
//!
//! - `model` - Request/response values exchanged with the intercepting layer
//! - `uri` - Outbound URL encoding and query string reconstruction
//! - `outbound` - Header, cookie and body serialization onto the wire
//! - `inbound` - Mapping upstream responses back to the model
//! - `method` - HTTP method parsing and dispatch
//! - `transport` - Transport seam and the shared `reqwest` clients
//! - `tls` - Trust policy for upstream certificates
//! - `client` - Forwarding and control-channel entry points
//! - `config` - Client configuration

pub mod client;
pub mod config;
pub mod error;
pub mod inbound;
pub mod method;
pub mod model;
pub mod outbound;
pub mod tls;
pub mod transport;
pub mod uri;

pub use client::{join_path, ForwardingClient};
pub use config::ClientConfig;
pub use error::ForwardError;
pub use method::HttpMethod;
pub use model::{Body, Cookie, Header, Parameter, Request, Response};
pub use tls::TrustPolicy;
pub use transport::{HttpTransport, RawResponse, Transport, TransportError};
