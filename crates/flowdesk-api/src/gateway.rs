use crate::{ApiError, ApiRequest};
use serde_json::Value;
use std::future::Future;

/// The only outbound boundary to the workflow server.
///
/// One call per invocation: no retries, no backoff. A non-2xx answer is an
/// error and must be treated as "did not happen". A 2xx answer with an empty
/// body resolves to an empty JSON object.
pub trait Gateway: Send + Sync {
    fn request(&self, request: ApiRequest) -> impl Future<Output = Result<Value, ApiError>> + Send;
}

impl<G: Gateway> Gateway for &G {
    fn request(&self, request: ApiRequest) -> impl Future<Output = Result<Value, ApiError>> + Send {
        (**self).request(request)
    }
}
