//! reqwest-backed [`Transport`].

use crate::config::HttpConfig;
use crate::error::HttpError;
use crate::response::HttpResponse;
use futures::StreamExt;
use request_ledger_core::transport::{Method, Transport, TransportRequest};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::collections::BTreeMap;

/// Transport performing real HTTP requests.
///
/// - Only `http://` and `https://` URLs are accepted
/// - Parameters are appended to the query string
/// - A body is sent as JSON
/// - Any non-2xx status is a failure ([`HttpError::Status`])
/// - Bodies are streamed and capped at `max_response_bytes`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    max_response_bytes: usize,
}

impl HttpTransport {
    /// Create a transport with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            max_response_bytes: HttpConfig::default().max_response_bytes,
        }
    }

    /// Create a transport from explicit settings.
    ///
    /// # Errors
    ///
    /// - [`HttpError::InvalidHeader`] if a default header name or value is invalid
    /// - [`HttpError::ClientBuild`] if the client cannot be built
    pub fn with_config(config: HttpConfig) -> Result<Self, HttpError> {
        let mut builder = Client::builder().default_headers(header_map(&config.default_headers)?);
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }
        let client = builder
            .build()
            .map_err(|e| HttpError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            max_response_bytes: config.max_response_bytes,
        })
    }

    /// Create a transport from `REQUEST_LEDGER_HTTP_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Config`] for unparsable variables, plus the errors
    /// of [`HttpTransport::with_config`].
    pub fn from_env() -> Result<Self, HttpError> {
        Self::with_config(HttpConfig::from_env()?)
    }

    /// Response size limit in bytes.
    #[must_use]
    pub const fn max_response_bytes(&self) -> usize {
        self.max_response_bytes
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<Vec<u8>, HttpError> {
        let mut body_bytes = Vec::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| HttpError::BodyRead(e.to_string()))?;

            if body_bytes.len() + chunk.len() > self.max_response_bytes {
                return Err(HttpError::ResponseTooLarge {
                    limit: self.max_response_bytes,
                });
            }

            body_bytes.extend_from_slice(&chunk);
        }

        Ok(body_bytes)
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    type Response = HttpResponse;
    type Error = HttpError;

    async fn send(&self, request: TransportRequest) -> Result<HttpResponse, HttpError> {
        let TransportRequest {
            method,
            url,
            body,
            params,
        } = request;

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(HttpError::InvalidUrl(url));
        }

        let mut builder = self.client.request(reqwest_method(method), &url);
        if !params.is_empty() {
            builder = builder.query(params.as_pairs());
        }
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| HttpError::RequestFailed(e.to_string()))?;

        let status = response.status();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = self.read_body(response).await?;
        tracing::debug!(%method, %url, status = status.as_u16(), bytes = body.len(), "HTTP response received");

        if !status.is_success() {
            return Err(HttpError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(HttpResponse {
            status: status.as_u16(),
            headers,
            body,
        })
    }
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, HttpError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| HttpError::InvalidHeader(name.clone()))?;
        let header_value =
            HeaderValue::from_str(value).map_err(|_| HttpError::InvalidHeader(name.clone()))?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}
