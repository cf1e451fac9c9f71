/// Errors from the upstream weather and seismic feeds.
///
/// # Examples
///
/// ```rust
/// use hazmon_feeds::error::FeedError;
///
/// let err = FeedError::Payload {
///     service: "open-meteo",
///     detail: "missing current block".to_string(),
/// };
/// assert!(err.to_string().contains("open-meteo"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// Non-2xx status code from the upstream API.
    #[error("{service} HTTP error: status={status}")]
    Http { service: &'static str, status: u16 },

    /// A 2xx response whose payload is missing required fields or is not
    /// valid JSON for the expected shape.
    #[error("malformed {service} payload: {detail}")]
    Payload {
        service: &'static str,
        detail: String,
    },

    /// Underlying transport error from `reqwest`.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Convenience alias so callers can write `error::Result<T>`.
pub type Result<T> = std::result::Result<T, FeedError>;
