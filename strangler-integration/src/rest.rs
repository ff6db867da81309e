use serde::{de::DeserializeOwned, Serialize};
use std::borrow::Cow;
use std::time::Duration;

/// Default HTTP request timeout: the 10s GET deadline. POST
/// requests (order placement) override [`RestRequest::timeout`] to 30s.
const DEFAULT_HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One HTTP REST request executable by [`crate::client::RestClient`].
///
/// Mirrors `jackbot-integration::protocol::http::rest::RestRequest`, generalized
/// with an `idempotent` flag so the client knows which operations are safe
/// to retry.
pub trait RestRequest {
    type Response: DeserializeOwned;
    type QueryParams: Serialize;
    type Body: Serialize;

    fn path(&self) -> Cow<'static, str>;

    fn method(&self) -> reqwest::Method;

    fn query_params(&self) -> Option<&Self::QueryParams> {
        None
    }

    fn body(&self) -> Option<&Self::Body> {
        None
    }

    fn timeout(&self) -> Duration {
        DEFAULT_HTTP_REQUEST_TIMEOUT
    }

    /// Whether retrying this exact request is safe: all GETs, and any
    /// place/close carrying a `client_order_id` the broker can deduplicate on.
    fn idempotent(&self) -> bool {
        self.method() == reqwest::Method::GET
    }
}
