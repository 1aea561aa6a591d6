use thiserror::Error;

/// Result shape shared by every lookup layer.
pub type Outcome<T> = std::result::Result<T, LookupError>;

/// Broad class of a [`LookupError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MissingIdentity,
    MissingConfiguration,
    Transport,
    UpstreamRejected,
    MalformedResponse,
}

/// Everything that can end a single temperature lookup.
///
/// The `Display` text is what the caller receives as `message`, so URLs carried
/// here never include their query string.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LookupError {
    #[error("Could not identify the client's IP")]
    MissingClientIp,

    #[error("Could not identify the client's IP from '{value}'")]
    InvalidClientIp { value: String },

    #[error("{key} is missing")]
    MissingConfig { key: &'static str },

    #[error("Invalid endpoint '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("{url} returned an error: {reason}")]
    Transport { url: String, reason: String },

    #[error("{url} returned a status code {status} {body}")]
    UpstreamStatus { url: String, status: u16, body: String },

    #[error("{url} returned an empty response")]
    EmptyResponse { url: String },

    #[error("{url} returned a malformed response: {detail}")]
    Malformed { url: String, detail: String },
}

impl LookupError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LookupError::MissingClientIp | LookupError::InvalidClientIp { .. } => {
                ErrorKind::MissingIdentity
            }
            LookupError::MissingConfig { .. } | LookupError::InvalidEndpoint { .. } => {
                ErrorKind::MissingConfiguration
            }
            LookupError::Transport { .. } => ErrorKind::Transport,
            LookupError::UpstreamStatus { .. } => ErrorKind::UpstreamRejected,
            LookupError::EmptyResponse { .. } | LookupError::Malformed { .. } => {
                ErrorKind::MalformedResponse
            }
        }
    }

    pub(crate) fn malformed(url: impl Into<String>, detail: impl Into<String>) -> Self {
        LookupError::Malformed { url: url.into(), detail: detail.into() }
    }
}

/// Keeps upstream bodies short enough to embed in a message.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }

    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
