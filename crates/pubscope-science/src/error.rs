use pubscope_core::{CoreError, ExitCode, Publication};
use thiserror::Error;

/// External metadata provider a fetch went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Ads,
    Crossref,
    Arxiv,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ads => write!(f, "ADS"),
            Self::Crossref => write!(f, "Crossref"),
            Self::Arxiv => write!(f, "arXiv"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ScienceError {
    #[error("no publications matched \"{0}\"")]
    NoMatch(String),

    #[error("more than one publication matched \"{token}\"")]
    AmbiguousMatch {
        token: String,
        candidates: Vec<Publication>,
    },

    #[error("invalid listing reference \"%{0}\"; expected a positive number or \"*\"")]
    InvalidListingRef(String),

    #[error("cannot auto-learn publication \"{0}\"")]
    CannotAutolearn(String),

    #[error("publication \"{0}\" has no DOI")]
    MissingDoi(String),

    #[error("invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("invalid search: {0}")]
    InvalidSearch(String),

    #[error("{provider} fetch for \"{target}\" failed: {message}")]
    ProviderFetchFailed {
        provider: Provider,
        target: String,
        message: String,
    },

    #[error("malformed {provider} response for \"{target}\": {message}")]
    MalformedProviderPayload {
        provider: Provider,
        target: String,
        message: String,
    },

    #[error("no {provider} credential configured; set `{key}` in the [science] config table")]
    MissingCredential { provider: Provider, key: &'static str },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error from {0}: {1}")]
    ApiError(String, String),

    #[error("rate limit from {0}, retry after {1}s")]
    RateLimit(String, u64),

    #[error(transparent)]
    Store(#[from] CoreError),

    #[error("config error: {0}")]
    Config(String),
}

impl ScienceError {
    pub(crate) fn fetch_failed(provider: Provider, target: &str) -> impl FnOnce(Self) -> Self {
        let target = target.to_string();
        move |err| match err {
            Self::MissingCredential { .. } => err,
            other => Self::ProviderFetchFailed {
                provider,
                target,
                message: other.to_string(),
            },
        }
    }

    pub(crate) fn malformed(provider: Provider, target: &str, message: impl Into<String>) -> Self {
        Self::MalformedProviderPayload {
            provider,
            target: target.to_string(),
            message: message.into(),
        }
    }

    /// Process exit code the `bib` binary reports for this error.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::NoMatch(_) => ExitCode::NotFound,
            Self::AmbiguousMatch { .. } => ExitCode::Conflict,
            _ => ExitCode::GeneralError,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScienceError>;
