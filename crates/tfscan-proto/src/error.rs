use reqwest::StatusCode;
use thiserror::Error;

/// Everything that can go wrong talking to the catalog/scan service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network failure, timeout, or an unreadable body.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("service returned {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Status {
        status: StatusCode,
        message: Option<String>,
    },

    /// Success status but the body did not have the expected shape.
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The task running the request went away before reporting back.
    #[error("request aborted")]
    Aborted,
}

impl ApiError {
    /// Human-readable message supplied by the service, if it sent one.
    pub fn service_message(&self) -> Option<&str> {
        match self {
            ApiError::Status {
                message: Some(m), ..
            } => Some(m.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message_is_exposed() {
        let err = ApiError::Status {
            status: StatusCode::BAD_REQUEST,
            message: Some("Empty sequence".into()),
        };
        assert_eq!(err.service_message(), Some("Empty sequence"));
        assert_eq!(err.to_string(), "service returned 400 Bad Request: Empty sequence");
    }

    #[test]
    fn test_other_errors_have_no_service_message() {
        let decode = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(ApiError::Decode(decode).service_message(), None);
        assert_eq!(ApiError::Aborted.service_message(), None);

        let bare = ApiError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: None,
        };
        assert_eq!(bare.to_string(), "service returned 500 Internal Server Error");
    }
}
