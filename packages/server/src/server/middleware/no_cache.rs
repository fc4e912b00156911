use axum::http::{
    header::{CACHE_CONTROL, EXPIRES},
    HeaderValue,
};
use tower::layer::util::{Identity, Stack};
use tower::ServiceBuilder;
use tower_http::set_header::SetResponseHeaderLayer;

pub const NO_CACHE: &str = "no-cache, private, max-age=0";

/// HTTP date of the Unix epoch.
pub const EXPIRED: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

pub type NoCacheLayer = ServiceBuilder<
    Stack<
        SetResponseHeaderLayer<HeaderValue>,
        Stack<SetResponseHeaderLayer<HeaderValue>, Identity>,
    >,
>;

/// Disable client caching on every response.
pub fn no_cache() -> NoCacheLayer {
    ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static(NO_CACHE),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            EXPIRES,
            HeaderValue::from_static(EXPIRED),
        ))
}
