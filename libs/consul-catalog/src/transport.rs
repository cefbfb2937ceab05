use crate::error::ConsulError;
use crate::request::RequestDescriptor;
use async_trait::async_trait;
use serde_json::Value;

/// Response handed back by a [`Transport`].
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    /// Parsed JSON body; `Null` when the body was empty
    pub body: Value,
    /// `X-Consul-Index` of the response, for blocking queries
    pub index: Option<u64>,
}

impl TransportResponse {
    /// A 200 response with the given body and no index
    #[must_use]
    pub fn ok(body: Value) -> Self {
        Self {
            status: 200,
            body,
            index: None,
        }
    }
}

/// The seam between catalog operations and the wire.
///
/// Implementations receive a fully validated descriptor and either return the
/// response or fail; they never see a descriptor that failed validation.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a read (`GET`)
    async fn get(&self, request: &RequestDescriptor) -> Result<TransportResponse, ConsulError>;

    /// Issue a write (`PUT`)
    async fn put(&self, request: &RequestDescriptor) -> Result<TransportResponse, ConsulError>;
}

/// Shapes the transport response into an operation result.
pub type Extractor<T> = fn(TransportResponse) -> T;

/// Response-shape extractors
pub mod extract {
    use super::TransportResponse;
    use serde_json::Value;

    /// The parsed body, verbatim
    #[must_use]
    pub fn body(response: TransportResponse) -> Value {
        response.body
    }

    /// Nothing; used by writes
    #[allow(clippy::needless_pass_by_value)]
    pub fn empty(_response: TransportResponse) {}
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extractors() {
        let resp = TransportResponse::ok(json!({"consul": []}));
        assert_eq!(extract::body(resp.clone()), json!({"consul": []}));
        extract::empty(resp);
    }

    #[test]
    fn extractors_fit_the_alias() {
        let _: Extractor<Value> = extract::body;
        let _: Extractor<()> = extract::empty;
    }
}
