use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::debug;

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Incoming request id if the caller sent a usable one.
fn incoming_id(headers: &HeaderMap) -> Option<HeaderValue> {
    let h = headers.get(REQUEST_ID_HEADER)?;
    let v = h.to_str().ok()?;
    if v.trim().is_empty() {
        return None;
    }
    Some(h.clone())
}

fn generate_id() -> HeaderValue {
    let nanos = Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| Utc::now().timestamp_micros() * 1000);
    // Digits and ASCII only, always a valid header value.
    HeaderValue::from_str(&format!("req-{nanos}")).unwrap_or(HeaderValue::from_static("req-0"))
}

/// Propagates or assigns `X-Request-Id` on both the request and the response.
pub async fn request_id_layer(mut req: Request<Body>, next: Next) -> Response {
    let id = incoming_id(req.headers()).unwrap_or_else(generate_id);
    req.headers_mut().insert(REQUEST_ID_HEADER, id.clone());

    debug!(request_id = ?id, method = %req.method(), path = %req.uri().path(), "request");

    let mut res = next.run(req).await;
    res.headers_mut().insert(REQUEST_ID_HEADER, id);
    res
}

/// Request id for log fields; `-` when absent.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("-")
}
