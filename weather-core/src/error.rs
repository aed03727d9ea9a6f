use thiserror::Error;

/// Failure of a single provider attempt, or of the whole chain.
///
/// The fallback chain treats every variant the same way: the next provider is
/// tried. Messages end up in the user-visible error payload, so they must never
/// carry credentials or raw upstream bodies.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// Missing or unusable configuration, e.g. no API key.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Network failure or non-success HTTP status.
    #[error("transport error: {0}")]
    Transport(String),

    /// Unexpected or malformed response shape.
    #[error("format error: {0}")]
    Format(String),

    /// A provider panicked.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl WeatherError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }

    /// Wrap a reqwest error, dropping the request URL (it may contain the API key).
    pub fn from_reqwest(context: &str, err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_decode() {
            Self::Format(format!("{context}: {err}"))
        } else {
            Self::Transport(format!("{context}: {err}"))
        }
    }
}
