use reqwest::StatusCode;
use thiserror::Error;

/// Why a WordPress request did not produce data.
///
/// The plain gateway operations log these and return an empty or absent
/// value; the `try_*` operations hand them back to the caller.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("WordPress URL is not configured; set WORDPRESS_URL")]
    ConfigurationMissing,
    #[error("invalid WordPress URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("WordPress API error: {status} for {url}")]
    Status { url: String, status: StatusCode },
    #[error("malformed response from {url}: {source}")]
    Malformed {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl GatewayError {
    /// Classify a transport error, separating timeouts from other failures.
    pub(crate) fn from_transport(url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Network {
                url: url.to_string(),
                source,
            }
        }
    }

    /// Short stable label, used as a structured log field.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigurationMissing => "configuration_missing",
            Self::InvalidUrl { .. } => "invalid_url",
            Self::Client(_) => "client",
            Self::Timeout { .. } => "timeout",
            Self::Network { .. } => "network",
            Self::Status { .. } => "status",
            Self::Malformed { .. } => "malformed",
        }
    }

    /// HTTP status returned by WordPress, if the request got that far.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    /// Whether this indicates a deployment defect rather than a transient failure.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::ConfigurationMissing | Self::InvalidUrl { .. })
    }
}
