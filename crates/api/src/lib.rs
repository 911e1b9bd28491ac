//! Typed client for a Jira instance's agile, webhook and user REST APIs.
//!
//! Every operation has the same shape: build an endpoint path (optionally
//! with a query string), send one request through a [`Transport`], and decode
//! the JSON body into a typed record. Results come back as an
//! [`ApiResponse`] holding the decoded value and the [`Response`] handle;
//! errors carry the handle too whenever the server answered.

pub mod board;
pub mod error;
pub mod issue;
pub mod pagination;
pub mod query;
pub mod transport;
pub mod user;
pub mod webhook;

use std::time::Duration;

use error::{ApiError, Result};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::error;

pub use board::{
    Board, BoardConfiguration, BoardListOptions, BoardPages, BoardService, BoardType, Sprint,
    SprintState,
};
pub use issue::{Epic, Issue, IssueList};
pub use pagination::{collect_pages, PagedResponse, Paginator};
pub use query::{Query, QueryOptions};
pub use transport::{ApiRequest, AuthMethod, HttpTransport, RawResponse, Response, Transport};
pub use user::{User, UserPermissionSearch, UserService};
pub use webhook::{Webhook, WebhookService};

/// A decoded value together with the response it came from.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub data: T,
    pub response: Response,
}

impl<T> ApiResponse<T> {
    pub fn into_data(self) -> T {
        self.data
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            data: f(self.data),
            response: self.response,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ApiClient<T = HttpTransport> {
    transport: T,
}

impl ApiClient<HttpTransport> {
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            transport: HttpTransport::new(base_url)?,
        })
    }

    pub fn with_timeout(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            transport: HttpTransport::with_timeout(base_url, timeout)?,
        })
    }

    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        self.transport.set_auth(AuthMethod::Basic {
            username: username.into(),
            token: token.into(),
        });
        self
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.transport.set_auth(AuthMethod::Bearer {
            token: token.into(),
        });
        self
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn boards(&self) -> BoardService<'_, T> {
        BoardService::new(self)
    }

    pub fn webhooks(&self) -> WebhookService<'_, T> {
        WebhookService::new(self)
    }

    pub fn users(&self) -> UserService<'_, T> {
        UserService::new(self)
    }

    pub async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<R>> {
        self.request(Method::GET, path, Option::<&()>::None).await
    }

    pub async fn post<R: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse<R>> {
        self.request(Method::POST, path, Some(body)).await
    }

    /// Sends a bodiless DELETE; nothing is decoded on success.
    pub async fn delete(&self, path: &str) -> Result<Response> {
        let raw = self.send(Method::DELETE, path, Option::<&()>::None).await?;
        Ok(raw.response)
    }

    pub async fn request<R: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<ApiResponse<R>> {
        let raw = self.send(method, path, body).await?;
        decode(raw)
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<RawResponse> {
        let mut request = ApiRequest::new(method, path);
        if let Some(body) = body {
            let encoded = serde_json::to_vec(body).map_err(ApiError::Encode)?;
            request = request.with_json_body(encoded);
        }
        self.transport.send(request).await
    }
}

fn decode<R: DeserializeOwned>(raw: RawResponse) -> Result<ApiResponse<R>> {
    let RawResponse { response, body } = raw;
    match serde_json::from_slice(&body) {
        Ok(data) => Ok(ApiResponse { data, response }),
        Err(source) => {
            error!(url = %response.url(), "Failed to parse JSON response: {}", source);
            Err(ApiError::Decode { response, source })
        }
    }
}

/// Percent-encodes one path segment (board id, epic id).
pub(crate) fn segment(value: impl std::fmt::Display) -> String {
    urlencoding::encode(&value.to_string()).into_owned()
}
