//! Error types for route ingestion and ranking.

/// Errors raised while turning provider records into route summaries.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("malformed route #{index}: {reason}")]
    Malformed { index: usize, reason: String },
    #[error("unknown ranking criterion: {0}")]
    UnknownCriterion(String),
}

impl RouteError {
    pub(crate) fn malformed(index: usize, reason: impl Into<String>) -> Self {
        RouteError::Malformed {
            index,
            reason: reason.into(),
        }
    }
}
