//! The HTTP seam between resource services and the network.
//!
//! Services describe a request as an [`ApiRequest`] and hand it to a
//! [`Transport`]. The production transport wraps a shared `reqwest::Client`;
//! tests plug in their own implementations.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use tracing::debug;
use url::Url;

use crate::error::{ApiError, Result};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A request relative to the tracker's base URL. `path` may carry a query string.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Vec<u8>>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    pub fn with_json_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }
}

/// Handle to an answered request: status, headers and the final URL.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    url: String,
}

impl Response {
    pub fn new(status: StatusCode, headers: HeaderMap, url: impl Into<String>) -> Self {
        Self {
            status,
            headers,
            url: url.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// A successful exchange: the handle plus the raw body bytes.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub response: Response,
    pub body: Vec<u8>,
}

/// Executes one request and reports non-2xx answers as errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse>;
}

#[derive(Clone, Debug)]
pub enum AuthMethod {
    Basic { username: String, token: String },
    Bearer { token: String },
}

#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    auth: Option<AuthMethod>,
}

impl HttpTransport {
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self> {
        let base_url = normalize_base_url(base_url.as_ref())?;

        let client = Client::builder()
            .user_agent(format!("jira-agile/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(ApiError::RequestFailed)?;

        Ok(Self {
            client,
            base_url,
            auth: None,
        })
    }

    pub fn set_auth(&mut self, auth: AuthMethod) {
        self.auth = Some(auth);
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins an endpoint path onto the base URL, keeping any context path.
    pub fn endpoint_url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Some(AuthMethod::Basic { username, token }) => {
                request.basic_auth(username, Some(token))
            }
            Some(AuthMethod::Bearer { token }) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse> {
        let url = self.endpoint_url(&request.path)?;
        debug!(method = %request.method, url = %url, "Sending request");

        let mut builder = self
            .client
            .request(request.method, url.clone())
            .header(header::ACCEPT, HeaderValue::from_static("application/json"));
        builder = self.apply_auth(builder);

        if let Some(body) = request.body {
            builder = builder
                .header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(body);
        }

        let reply = builder.send().await?;
        let response = Response::new(reply.status(), reply.headers().clone(), reply.url().as_str());

        let body = match reply.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(source) => {
                return Err(ApiError::BodyRead {
                    response,
                    source: Box::new(source),
                })
            }
        };

        check_status(response, body, url.path())
    }
}

/// Maps a non-2xx answer to the matching error, keeping the response handle.
pub(crate) fn check_status(response: Response, body: Vec<u8>, resource: &str) -> Result<RawResponse> {
    let status = response.status();

    if status.is_success() {
        return Ok(RawResponse { response, body });
    }

    match status {
        StatusCode::UNAUTHORIZED => Err(ApiError::AuthenticationFailed { response }),
        StatusCode::NOT_FOUND => Err(ApiError::NotFound {
            resource: resource.to_string(),
            response,
        }),
        _ => {
            let message = String::from_utf8_lossy(&body).into_owned();
            Err(ApiError::Http {
                status: status.as_u16(),
                message,
                response,
            })
        }
    }
}

fn normalize_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim())?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_url_keeps_context_path() {
        let transport = HttpTransport::new("https://tracker.example.com/jira").unwrap();
        let url = transport.endpoint_url("/rest/api/2/myself").unwrap();
        assert_eq!(url.as_str(), "https://tracker.example.com/jira/rest/api/2/myself");
    }

    #[test]
    fn endpoint_url_keeps_query() {
        let transport = HttpTransport::new("https://tracker.example.com/").unwrap();
        let url = transport
            .endpoint_url("rest/agile/1.0/board/10/sprint?maxResults=1000")
            .unwrap();
        assert_eq!(url.path(), "/rest/agile/1.0/board/10/sprint");
        assert_eq!(url.query(), Some("maxResults=1000"));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = HttpTransport::new("not a url").unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl(_)));
    }

    #[test]
    fn check_status_classifies_failures() {
        let response = |status| Response::new(status, HeaderMap::new(), "http://localhost/x");

        let ok = check_status(response(StatusCode::NO_CONTENT), Vec::new(), "/x").unwrap();
        assert_eq!(ok.response.status(), StatusCode::NO_CONTENT);

        let err = check_status(response(StatusCode::UNAUTHORIZED), Vec::new(), "/x").unwrap_err();
        assert!(matches!(err, ApiError::AuthenticationFailed { .. }));

        let err = check_status(
            response(StatusCode::BAD_REQUEST),
            b"{\"errorMessages\":[\"bad\"]}".to_vec(),
            "/x",
        )
        .unwrap_err();
        match err {
            ApiError::Http { status, message, .. } => {
                assert_eq!(status, 400);
                assert!(message.contains("bad"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
