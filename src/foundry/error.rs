// ABOUTME: Error type for calls against the Cloud Foundry v3 API.
// ABOUTME: Separates not-found from other failures so callers can tolerate it.

/// Failure of a single platform call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FoundryError {
    /// The resource does not exist (HTTP 404).
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// The bearer token was rejected (HTTP 401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The platform answered with an error document.
    #[error("API error {status} {title}: {detail}")]
    Api {
        status: u16,
        title: String,
        detail: String,
    },

    /// Connection, TLS, or protocol failure before a response was read.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body did not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The request could not be built locally.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl FoundryError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        FoundryError::NotFound {
            resource: resource.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FoundryError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_not_found_is_not_found() {
        assert!(FoundryError::not_found("app a1").is_not_found());
        assert!(!FoundryError::Transport("reset".into()).is_not_found());
        assert!(
            !FoundryError::Api {
                status: 422,
                title: "CF-UnprocessableEntity".into(),
                detail: "bad".into()
            }
            .is_not_found()
        );
    }
}
