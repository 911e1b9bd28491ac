use reqwest::StatusCode;
use thiserror::Error;

use crate::transport::Response;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Could not encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Authentication failed for {}", .response.url())]
    AuthenticationFailed { response: Response },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String, response: Response },

    #[error("Unexpected status {status}: {message}")]
    Http {
        status: u16,
        message: String,
        response: Response,
    },

    #[error("Could not read response body: {source}")]
    BodyRead {
        response: Response,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Could not decode response: {source}")]
    Decode {
        response: Response,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// The response handle, when the server answered before the failure.
    pub fn response(&self) -> Option<&Response> {
        match self {
            ApiError::AuthenticationFailed { response }
            | ApiError::NotFound { response, .. }
            | ApiError::Http { response, .. }
            | ApiError::BodyRead { response, .. }
            | ApiError::Decode { response, .. } => Some(response),
            ApiError::RequestFailed(_) | ApiError::InvalidUrl(_) | ApiError::Encode(_) => None,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.response().map(Response::status)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    pub fn suggestion(&self) -> Option<&str> {
        match self {
            ApiError::AuthenticationFailed { .. } => {
                Some("Check the username and API token of the active profile")
            }
            ApiError::NotFound { .. } => Some("Check if the board, epic or user identifier is correct"),
            ApiError::Decode { .. } => {
                Some("The server answered with an unexpected payload; is the base URL correct?")
            }
            ApiError::RequestFailed(_) => Some("Check your network connection or try again later"),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
