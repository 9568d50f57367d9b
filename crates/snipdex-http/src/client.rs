//! Backend HTTP client

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, redirect, Method, Response};
use serde::Serialize;
use tracing::debug;

use crate::{
    config::HttpConfig,
    error::{HttpError, Result},
};

/// Request body together with the content type it is sent as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    content_type: &'static str,
    bytes: Vec<u8>,
}

impl Payload {
    /// Encode a value as an `application/json` body
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Self {
            content_type: "application/json",
            bytes: serde_json::to_vec(value)?,
        })
    }

    /// Newline-delimited JSON, as bulk endpoints expect
    pub fn ndjson(body: impl Into<String>) -> Self {
        Self {
            content_type: "application/x-ndjson",
            bytes: body.into().into_bytes(),
        }
    }

    pub fn content_type(&self) -> &'static str {
        self.content_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Transport seam between the search backend and the network.
///
/// Implementations return `Ok` only for 2xx responses; any other status is
/// reported as [`HttpError::HttpStatus`] carrying the response body.
#[async_trait]
pub trait HttpClientTrait: Send + Sync {
    async fn request(&self, method: Method, url: &str, body: Option<Payload>) -> Result<Response>;
}

/// reqwest-backed client
pub struct HttpClient {
    inner: reqwest::Client,
    config: HttpConfig,
}

impl HttpClient {
    pub fn new(config: HttpConfig) -> Result<Self> {
        let inner = build_reqwest_client(&config)?;
        Ok(Self { inner, config })
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }
}

fn build_reqwest_client(config: &HttpConfig) -> Result<reqwest::Client> {
    let redirects = match config.max_redirects {
        0 => redirect::Policy::none(),
        limit => redirect::Policy::limited(limit),
    };
    let mut builder = reqwest::Client::builder()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .user_agent(config.user_agent.as_str())
        .redirect(redirects);

    if let Some(proxy) = &config.proxy {
        let proxy =
            reqwest::Proxy::all(proxy).map_err(|e| HttpError::InvalidProxy(e.to_string()))?;
        builder = builder.proxy(proxy);
    }

    builder = match config.pool_idle_timeout {
        Some(idle) => builder.pool_idle_timeout(idle),
        None => builder.pool_max_idle_per_host(0),
    };

    builder
        .build()
        .map_err(|e| HttpError::BuildError(e.to_string()))
}

#[async_trait]
impl HttpClientTrait for HttpClient {
    async fn request(&self, method: Method, url: &str, body: Option<Payload>) -> Result<Response> {
        let parsed: url::Url = url
            .parse()
            .map_err(|e: url::ParseError| HttpError::InvalidUrl(format!("{url}: {e}")))?;
        debug!(
            %method,
            url = %parsed,
            bytes = body.as_ref().map_or(0, Payload::len),
            "sending request"
        );

        let mut builder = self.inner.request(method, parsed);
        if let Some(Payload {
            content_type,
            bytes,
        }) = body
        {
            builder = builder.header(CONTENT_TYPE, content_type).body(bytes);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                HttpError::Timeout(self.config.timeout)
            } else {
                HttpError::RequestFailed(e)
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = match response.text().await {
            Ok(text) if !text.is_empty() => text,
            _ => status.canonical_reason().unwrap_or("no response body").to_string(),
        };
        Err(HttpError::HttpStatus { status, message })
    }
}

/// Build an [`HttpClient`] behind the trait object the backend holds.
pub fn shared_client(config: HttpConfig) -> Result<Arc<dyn HttpClientTrait>> {
    Ok(Arc::new(HttpClient::new(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::{
        matchers::{body_string, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    #[test]
    fn test_client_keeps_its_config() {
        let config = HttpConfig::default()
            .with_timeout(Duration::from_secs(10))
            .without_pooling();

        let client = HttpClient::new(config).unwrap();
        assert_eq!(client.config().timeout, Duration::from_secs(10));
        assert!(client.config().pool_idle_timeout.is_none());
        assert!(shared_client(HttpConfig::bulk()).is_ok());
    }

    #[test]
    fn test_payload_content_types() {
        let json = Payload::json(&serde_json::json!({"a": 1})).unwrap();
        assert_eq!(json.content_type(), "application/json");
        assert_eq!(json.len(), r#"{"a":1}"#.len());

        let ndjson = Payload::ndjson("{}\n{}\n");
        assert_eq!(ndjson.content_type(), "application/x-ndjson");
        assert!(!ndjson.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected_before_sending() {
        let client = HttpClient::new(HttpConfig::default()).unwrap();
        let result = client.request(Method::GET, "not a url", None).await;
        assert!(matches!(result, Err(HttpError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_post_sends_content_type_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/_bulk"))
            .and(header("content-type", "application/x-ndjson"))
            .and(body_string("{\"index\":{}}\n{}\n"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new(HttpConfig::default()).unwrap();
        let response = client
            .request(
                Method::POST,
                &format!("{}/_bulk", server.uri()),
                Some(Payload::ndjson("{\"index\":{}}\n{}\n")),
            )
            .await
            .unwrap();
        assert!(response.status().is_success());
    }

    #[tokio::test]
    async fn test_error_status_is_reported_with_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/snippets"))
            .respond_with(ResponseTemplate::new(400).set_body_string("already exists"))
            .mount(&server)
            .await;

        let client = HttpClient::new(HttpConfig::default()).unwrap();
        let result = client
            .request(
                Method::PUT,
                &format!("{}/snippets", server.uri()),
                Some(Payload::json(&serde_json::json!({})).unwrap()),
            )
            .await;

        match result {
            Err(HttpError::HttpStatus { status, message }) => {
                assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
                assert_eq!(message, "already exists");
            }
            other => panic!("expected HttpStatus error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_error_body_falls_back_to_reason() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = HttpClient::new(HttpConfig::default()).unwrap();
        let err = client
            .request(Method::DELETE, &format!("{}/missing", server.uri()), None)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(reqwest::StatusCode::NOT_FOUND));
        assert!(err.to_string().contains("Not Found"));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_connect_failure() {
        let config = HttpConfig::default().with_timeout(Duration::from_secs(5));
        let client = HttpClient::new(config).unwrap();
        // Nothing listens on port 1 of the loopback interface.
        let err = client
            .request(Method::GET, "http://127.0.0.1:1/", None)
            .await
            .unwrap_err();
        assert!(err.is_connect(), "unexpected error: {err:?}");
    }
}
