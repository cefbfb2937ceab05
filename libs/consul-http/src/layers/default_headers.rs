use crate::error::HttpError;
use http::header::{HeaderName, HeaderValue};
use http::{Request, Response};
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Tower layer that inserts default headers into every request.
///
/// A header is only inserted when the request does not already carry it, so
/// per-request values (an ACL token passed for one call, a custom
/// User-Agent) win over client-wide defaults.
#[derive(Clone)]
pub struct DefaultHeadersLayer {
    headers: Arc<Vec<(HeaderName, HeaderValue)>>,
}

impl DefaultHeadersLayer {
    /// Create a layer that sets `User-Agent` to `user_agent`.
    ///
    /// # Errors
    /// Returns `HttpError::InvalidHeaderValue` if the user agent string is not a valid header value
    pub fn try_new(user_agent: impl AsRef<str>) -> Result<Self, HttpError> {
        let user_agent = HeaderValue::from_str(user_agent.as_ref())?;
        Ok(Self {
            headers: Arc::new(vec![(http::header::USER_AGENT, user_agent)]),
        })
    }

    /// Add another default header.
    ///
    /// Header values that carry credentials are marked sensitive so they are
    /// redacted from `Debug` output.
    ///
    /// # Errors
    /// Returns an error if the name or value is not a valid header.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, HttpError> {
        let name = HeaderName::try_from(name)?;
        let mut value = HeaderValue::try_from(value)?;
        if name.as_str().ends_with("token") || name == http::header::AUTHORIZATION {
            value.set_sensitive(true);
        }
        Arc::make_mut(&mut self.headers).push((name, value));
        Ok(self)
    }
}

impl<S> Layer<S> for DefaultHeadersLayer {
    type Service = DefaultHeadersService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        DefaultHeadersService {
            inner,
            headers: Arc::clone(&self.headers),
        }
    }
}

/// Service produced by [`DefaultHeadersLayer`]
#[derive(Clone)]
pub struct DefaultHeadersService<S> {
    inner: S,
    headers: Arc<Vec<(HeaderName, HeaderValue)>>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for DefaultHeadersService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        for (name, value) in self.headers.iter() {
            if !req.headers().contains_key(name) {
                req.headers_mut().insert(name.clone(), value.clone());
            }
        }
        self.inner.call(req)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{HeaderMap, Method, StatusCode};
    use http_body_util::Full;
    use std::sync::Mutex;
    use tower::ServiceExt;

    /// Records the headers of the last request it saw.
    #[derive(Clone, Default)]
    struct RecordHeaders {
        seen: Arc<Mutex<Option<HeaderMap>>>,
    }

    impl Service<Request<Full<Bytes>>> for RecordHeaders {
        type Response = Response<Full<Bytes>>;
        type Error = Box<dyn std::error::Error + Send + Sync>;
        type Future = std::future::Ready<Result<Self::Response, Self::Error>>;

        fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: Request<Full<Bytes>>) -> Self::Future {
            *self.seen.lock().unwrap() = Some(req.headers().clone());
            std::future::ready(Ok(Response::builder()
                .status(StatusCode::OK)
                .body(Full::new(Bytes::new()))
                .unwrap()))
        }
    }

    fn request(extra: Option<(&str, &str)>) -> Request<Full<Bytes>> {
        let mut builder = Request::builder()
            .method(Method::GET)
            .uri("http://127.0.0.1:8500/v1/catalog/services");
        if let Some((name, value)) = extra {
            builder = builder.header(name, value);
        }
        builder.body(Full::new(Bytes::new())).unwrap()
    }

    #[tokio::test]
    async fn test_user_agent_added() {
        let recorder = RecordHeaders::default();
        let layer = DefaultHeadersLayer::try_new("consul-catalog/0.1").unwrap();
        let service = layer.layer(recorder.clone());

        service.oneshot(request(None)).await.unwrap();

        let seen = recorder.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.get(http::header::USER_AGENT).unwrap(), "consul-catalog/0.1");
    }

    #[tokio::test]
    async fn test_request_token_wins_over_default_token() {
        let recorder = RecordHeaders::default();
        let layer = DefaultHeadersLayer::try_new("consul-catalog/0.1")
            .unwrap()
            .with_header("x-consul-token", "agent-default")
            .unwrap();
        let service = layer.layer(recorder.clone());

        service
            .oneshot(request(Some(("x-consul-token", "per-call"))))
            .await
            .unwrap();

        let seen = recorder.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.get("x-consul-token").unwrap(), "per-call");
    }

    #[tokio::test]
    async fn test_default_token_is_sensitive() {
        let recorder = RecordHeaders::default();
        let layer = DefaultHeadersLayer::try_new("ua")
            .unwrap()
            .with_header("x-consul-token", "secret")
            .unwrap();
        let service = layer.layer(recorder.clone());

        service.oneshot(request(None)).await.unwrap();

        let seen = recorder.seen.lock().unwrap().clone().unwrap();
        assert!(seen.get("x-consul-token").unwrap().is_sensitive());
    }

    #[test]
    fn test_invalid_user_agent_rejected() {
        assert!(DefaultHeadersLayer::try_new("bad\x00agent").is_err());
    }
}
