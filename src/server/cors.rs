//! CORS for the delivery routes.
//!
//! Media players embedded on other origins need credentials and the range
//! headers exposed, which `Any` origins cannot combine with, so the request
//! `Origin` is mirrored. Requests without an `Origin` still get `*` and the
//! allowed methods and headers, on errors as well as successes.

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

const ALLOW_METHODS: [Method; 3] = [Method::GET, Method::HEAD, Method::OPTIONS];
const ALLOW_HEADERS: [HeaderName; 6] = [
    header::RANGE,
    header::ACCEPT,
    header::ACCEPT_ENCODING,
    header::CONTENT_TYPE,
    header::ORIGIN,
    header::AUTHORIZATION,
];
const EXPOSE_HEADERS: [HeaderName; 6] = [
    header::CONTENT_LENGTH,
    header::CONTENT_RANGE,
    header::ACCEPT_RANGES,
    header::ETAG,
    header::LAST_MODIFIED,
    header::CONTENT_TYPE,
];

fn joined<T: AsRef<str>>(items: &[T]) -> HeaderValue {
    let list = items.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(", ");
    HeaderValue::from_str(&list).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// Mirrors the request origin and answers every `OPTIONS` as a preflight.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(ALLOW_METHODS)
        .allow_headers(ALLOW_HEADERS)
        .expose_headers(EXPOSE_HEADERS)
        .allow_credentials(true)
}

/// Wrap `router` in the CORS layer plus the headers it leaves out.
pub fn apply<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let methods = ALLOW_METHODS.iter().map(Method::as_str).collect::<Vec<_>>();

    router.layer(
        ServiceBuilder::new()
            .layer(SetResponseHeaderLayer::if_not_present(
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::ACCESS_CONTROL_ALLOW_METHODS,
                joined(methods.as_slice()),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                joined(&ALLOW_HEADERS),
            ))
            .layer(cors_layer()),
    )
}
