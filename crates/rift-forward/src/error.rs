use crate::transport::TransportError;

/// Errors surfaced by the forwarding client.
///
/// A circular redirect is not an error at this level; it is answered with an
/// empty response instead.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("Malformed URL [{url}]: {source}")]
    MalformedUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Invalid Base64 body for url [{url}]: {source}")]
    Base64 {
        url: String,
        #[source]
        source: base64::DecodeError,
    },
    #[error("Error while sending request for url [{url}]: {source}")]
    Transport {
        url: String,
        #[source]
        source: TransportError,
    },
    #[error("Exception making request to [{url}] with body [{body}]: {source}")]
    ControlChannel {
        url: String,
        body: String,
        #[source]
        source: TransportError,
    },
}

impl ForwardError {
    /// The transport failure behind this error, if any.
    pub fn transport_error(&self) -> Option<&TransportError> {
        match self {
            ForwardError::Transport { source, .. }
            | ForwardError::ControlChannel { source, .. } => Some(source),
            _ => None,
        }
    }
}
