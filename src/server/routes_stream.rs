//! Video delivery routes.
//!
//! - `GET/HEAD /s/{slug}`: slug-first lookup, browser page or bytes
//! - `GET/HEAD /videos/{video_id}/stream`: id-first lookup, always bytes
//! - `GET /videos/{video_id}/locate`: diagnostics, when enabled

use std::borrow::Cow;

use axum::extract::{RawPathParams, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;

use crate::delivery::player::render_player_page;
use crate::delivery::responder::NO_CACHE;
use crate::delivery::{
    classify, respond, ClientKind, DeliveryError, Diagnosis, Precedence, RedirectDecision,
    StreamTarget,
};

use super::error::AppError;
use super::AppContext;

/// First path parameter, still percent-encoded. The resolver decodes it.
fn handle_param(params: &RawPathParams) -> String {
    params
        .iter()
        .next()
        .map(|(_, raw)| raw.to_string())
        .unwrap_or_default()
}

/// The `Range` header as text. Bytes outside visible ASCII are replaced
/// rather than dropped, so the header still fails parsing with a `416`.
fn range_header(headers: &HeaderMap) -> Option<Cow<'_, str>> {
    headers
        .get(header::RANGE)
        .map(|v| String::from_utf8_lossy(v.as_bytes()))
}

fn request_host(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::HOST).and_then(|v| v.to_str().ok())
}

fn found(location: &str) -> Response {
    let mut response = StatusCode::FOUND.into_response();
    if let Ok(value) = HeaderValue::from_str(location) {
        response.headers_mut().insert(header::LOCATION, value);
    }
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static(NO_CACHE));
    response
}

async fn deliver(
    ctx: &AppContext,
    handle: &str,
    precedence: Precedence,
    negotiate: bool,
    method: &Method,
    headers: &HeaderMap,
) -> Result<Response, DeliveryError> {
    let resolved = ctx.delivery.resolve(handle, precedence).await?;

    if negotiate && classify(headers) == ClientKind::BrowserPage {
        tracing::debug!(video_id = %resolved.record.video_id, "Serving player page");
        let page = render_player_page(&resolved.record, &ctx.config.player);
        let mut response = Html(page).into_response();
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static(NO_CACHE));
        return Ok(response);
    }

    if let RedirectDecision::Redirect(url) =
        ctx.delivery.redirect_decision(&resolved, request_host(headers))
    {
        tracing::info!(video_id = %resolved.record.video_id, %url, "Redirecting to remote source");
        return Ok(found(url.as_str()));
    }

    let located = ctx.delivery.locate(&resolved).await?;
    tracing::info!(
        handle,
        video_id = %resolved.record.video_id,
        lookup = resolved.strategy.as_str(),
        storage = located.strategy,
        "Delivering video"
    );

    let target = StreamTarget::from(located.file);
    respond(method, range_header(headers).as_deref(), &target).await
}

/// `/s/{slug}`
pub async fn short_link(
    State(ctx): State<AppContext>,
    params: RawPathParams,
    method: Method,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let handle = handle_param(&params);
    Ok(deliver(&ctx, &handle, Precedence::SlugFirst, true, &method, &headers).await?)
}

/// `/videos/{video_id}/stream`
pub async fn stream_video(
    State(ctx): State<AppContext>,
    params: RawPathParams,
    method: Method,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let handle = handle_param(&params);
    Ok(deliver(&ctx, &handle, Precedence::IdFirst, false, &method, &headers).await?)
}

/// `/videos/{video_id}/locate`
pub async fn locate_video(
    State(ctx): State<AppContext>,
    params: RawPathParams,
) -> Result<Json<Diagnosis>, AppError> {
    let handle = handle_param(&params);
    let diagnosis = ctx.delivery.diagnose(&handle, Precedence::IdFirst).await?;
    Ok(Json(diagnosis))
}
