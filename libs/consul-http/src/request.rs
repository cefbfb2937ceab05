use crate::client::{BufferedService, map_buffer_error, try_acquire_buffer_slot};
use crate::config::TransportSecurity;
use crate::error::{HttpError, InvalidUriKind};
use crate::response::{HttpResponse, ResponseBody};
use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;
use serde::Serialize;
use std::time::Duration;
use tower::Service;

#[derive(Clone, Debug)]
enum BodyKind {
    Empty,
    Json(Bytes),
}

/// HTTP request builder with a fluent API.
///
/// Created by [`HttpClient::get`](crate::HttpClient::get) and friends.
/// Header errors are deferred to [`send()`](RequestBuilder::send) so the
/// chain stays infallible until the request is dispatched.
///
/// ```ignore
/// let resp = client
///     .put("http://127.0.0.1:8500/v1/catalog/register")
///     .header("x-consul-token", token)
///     .timeout(Duration::from_secs(5))
///     .json(&registration)?
///     .send()
///     .await?;
/// ```
#[must_use = "RequestBuilder does nothing until .send() is called"]
pub struct RequestBuilder {
    service: BufferedService,
    max_body_size: usize,
    timeout: Duration,
    method: http::Method,
    url: String,
    headers: Vec<(http::header::HeaderName, http::header::HeaderValue)>,
    body: BodyKind,
    error: Option<HttpError>,
    transport_security: TransportSecurity,
}

impl RequestBuilder {
    pub(crate) fn new(
        service: BufferedService,
        max_body_size: usize,
        timeout: Duration,
        method: http::Method,
        url: String,
        transport_security: TransportSecurity,
    ) -> Self {
        Self {
            service,
            max_body_size,
            timeout,
            method,
            url,
            headers: Vec::new(),
            body: BodyKind::Empty,
            error: None,
            transport_security,
        }
    }

    /// Add a single header to the request
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if self.error.is_some() {
            return self;
        }

        match (
            http::header::HeaderName::try_from(name),
            http::header::HeaderValue::try_from(value),
        ) {
            (Ok(name), Ok(value)) => self.headers.push((name, value)),
            (Err(e), _) => self.error = Some(HttpError::InvalidHeaderName(e)),
            (_, Err(e)) => self.error = Some(HttpError::InvalidHeaderValue(e)),
        }
        self
    }

    /// Add several headers to the request
    pub fn headers<'a, I>(self, headers: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        headers
            .into_iter()
            .fold(self, |builder, (name, value)| builder.header(name, value))
    }

    /// Override the client's default timeout for this request only.
    ///
    /// The timeout covers waiting for a buffer slot, connecting and receiving
    /// the response head; reading the body is not included.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the request body as JSON.
    ///
    /// `Content-Type: application/json` is added unless a content type header
    /// was supplied.
    ///
    /// # Errors
    ///
    /// Returns a deferred header error, or `HttpError::Json` if serialization fails.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, HttpError> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }

        let json_bytes = serde_json::to_vec(body)?;
        self.body = BodyKind::Json(Bytes::from(json_bytes));
        Ok(self)
    }

    /// Validate the URL and its scheme against the transport security mode.
    fn validate_url(&self) -> Result<http::Uri, HttpError> {
        let uri: http::Uri =
            self.url
                .parse()
                .map_err(|e: http::uri::InvalidUri| HttpError::InvalidUri {
                    url: self.url.clone(),
                    kind: InvalidUriKind::ParseError,
                    reason: e.to_string(),
                })?;

        if uri.authority().is_none() {
            return Err(HttpError::InvalidUri {
                url: self.url.clone(),
                kind: InvalidUriKind::MissingAuthority,
                reason: "missing host/authority".to_owned(),
            });
        }

        match uri.scheme_str() {
            Some("https") => Ok(uri),
            Some("http") => match self.transport_security {
                TransportSecurity::AllowInsecureHttp => Ok(uri),
                TransportSecurity::TlsOnly => Err(HttpError::InvalidScheme {
                    scheme: "http".to_owned(),
                    reason: "HTTPS required (transport security is TlsOnly)".to_owned(),
                }),
            },
            Some(scheme) => Err(HttpError::InvalidScheme {
                scheme: scheme.to_owned(),
                reason: "only http:// and https:// schemes are supported".to_owned(),
            }),
            None => Err(HttpError::InvalidUri {
                url: self.url.clone(),
                kind: InvalidUriKind::MissingScheme,
                reason: "missing scheme".to_owned(),
            }),
        }
    }

    /// Send the request.
    ///
    /// Every HTTP status is returned as `Ok`; use
    /// [`HttpResponse::checked_bytes`] or [`HttpResponse::json`] to turn
    /// non-2xx statuses into errors.
    ///
    /// # Errors
    ///
    /// Returns `HttpError` for invalid headers or URL, a rejected scheme,
    /// transport failures, `Timeout` and `Overloaded`.
    pub async fn send(mut self) -> Result<HttpResponse, HttpError> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }

        let uri = self.validate_url()?;
        let mut builder = Request::builder().method(self.method).uri(uri);

        let has_content_type = self
            .headers
            .iter()
            .any(|(name, _)| name == http::header::CONTENT_TYPE);
        if !has_content_type && matches!(self.body, BodyKind::Json(_)) {
            builder = builder.header(http::header::CONTENT_TYPE, "application/json");
        }

        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }

        let body_bytes = match self.body {
            BodyKind::Empty => Bytes::new(),
            BodyKind::Json(b) => b,
        };
        let request = builder.body(Full::new(body_bytes))?;

        let timeout = self.timeout;
        let mut service = self.service;
        let call = async move {
            try_acquire_buffer_slot(&mut service).await?;
            service.call(request).await.map_err(map_buffer_error)
        };

        let inner: Response<ResponseBody> = tokio::time::timeout(timeout, call)
            .await
            .map_err(|_| HttpError::Timeout(timeout))??;

        Ok(HttpResponse {
            inner,
            max_body_size: self.max_body_size,
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use crate::{HttpClient, HttpClientConfig, HttpError, InvalidUriKind};
    use httpmock::prelude::*;
    use std::time::Duration;

    fn test_client() -> HttpClient {
        crate::HttpClientBuilder::with_config(HttpClientConfig::for_testing())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_relative_url_rejected() {
        let result = test_client().get("/v1/catalog/services").send().await;
        assert!(matches!(
            result,
            Err(HttpError::InvalidUri {
                kind: InvalidUriKind::MissingAuthority,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_unsupported_scheme_rejected() {
        let result = test_client().get("ftp://127.0.0.1/v1").send().await;
        assert!(matches!(result, Err(HttpError::InvalidScheme { .. })));
    }

    #[tokio::test]
    async fn test_invalid_header_deferred_to_send() {
        let result = test_client()
            .get("http://127.0.0.1:8500/v1/catalog/services")
            .header("bad header", "x")
            .send()
            .await;
        assert!(matches!(result, Err(HttpError::InvalidHeaderName(_))));
    }

    #[tokio::test]
    async fn test_invalid_header_surfaces_from_json() {
        let result = test_client()
            .put("http://127.0.0.1:8500/v1/catalog/register")
            .header("x-consul-token", "bad\nvalue")
            .json(&serde_json::json!({}));
        assert!(matches!(result, Err(HttpError::InvalidHeaderValue(_))));
    }

    #[tokio::test]
    async fn test_headers_and_explicit_content_type_kept() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(Method::PUT)
                .path("/v1/catalog/register")
                .header("x-consul-token", "t")
                .header("content-type", "application/vnd.consul+json");
            then.status(200);
        });

        test_client()
            .put(&format!("{}/v1/catalog/register", server.base_url()))
            .headers([
                ("x-consul-token", "t"),
                ("content-type", "application/vnd.consul+json"),
            ])
            .json(&serde_json::json!({"Node": "n"}))
            .unwrap()
            .send()
            .await
            .unwrap();
        mock.assert();
    }

    #[tokio::test]
    async fn test_per_request_timeout() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(Method::GET).path("/v1/catalog/services");
            then.status(200).delay(Duration::from_millis(500));
        });

        let result = test_client()
            .get(&format!("{}/v1/catalog/services", server.base_url()))
            .timeout(Duration::from_millis(50))
            .send()
            .await;

        assert!(matches!(
            result,
            Err(HttpError::Timeout(d)) if d == Duration::from_millis(50)
        ));
    }
}
