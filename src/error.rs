use thiserror::Error;

/// Batch-level failures. Any of these aborts the run before the first URL.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Missing class codes: the taxonomy is empty")]
    MissingCodes,

    #[error("Missing prompt template")]
    MissingTemplate,

    #[error("Missing URL list")]
    MissingUrls,

    #[error("Could not read URL file: {0}")]
    UrlSource(String),

    #[error("Could not read class code file: {0}")]
    CodeSource(String),

    #[error("Could not read prompt file: {0}")]
    TemplateSource(String),
}

/// Failures of a single model call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    /// Missing API key or unusable client settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection failed or timed out
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response (auth, rate limit, invalid request)
    #[error("API error: {0}")]
    Api(String),

    /// Body did not match the chat-completions shape
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Why a single URL ended up with an error marker instead of codes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("Unable to fetch content")]
    Fetch,

    #[error(transparent)]
    Classify(#[from] ClassifyError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_message_is_stable() {
        assert_eq!(RowError::Fetch.to_string(), "Unable to fetch content");
    }

    #[test]
    fn classify_error_is_transparent() {
        let err = RowError::from(ClassifyError::Api("429 Too Many Requests".into()));
        assert_eq!(err.to_string(), "API error: 429 Too Many Requests");
    }
}
