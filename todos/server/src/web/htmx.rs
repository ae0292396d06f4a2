use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};

pub const HX_REQUEST: HeaderName = HeaderName::from_static("hx-request");
pub const HX_REDIRECT: HeaderName = HeaderName::from_static("hx-redirect");
pub const HX_RETARGET: HeaderName = HeaderName::from_static("hx-retarget");
pub const HX_RESWAP: HeaderName = HeaderName::from_static("hx-reswap");

/// Returns true when the request was issued by htmx.
pub fn is_htmx_request(headers: &HeaderMap) -> bool {
    headers
        .get(HX_REQUEST)
        .is_some_and(|value| value.as_bytes() == b"true")
}

/// Redirects the browser to `location`.
///
/// htmx follows redirects inside the XHR and would swap the target page into the current
/// element, so htmx requests get a `200` with `HX-Redirect` instead of a `303`.
pub fn redirect(headers: &HeaderMap, location: &'static str) -> Response {
    if is_htmx_request(headers) {
        (
            StatusCode::OK,
            [(HX_REDIRECT, HeaderValue::from_static(location))],
        )
            .into_response()
    } else {
        Redirect::to(location).into_response()
    }
}

/// Points the swap of an error response at `target`.
pub fn retarget(response: &mut Response, target: &'static str, swap: &'static str) {
    let headers = response.headers_mut();
    headers.insert(HX_RETARGET, HeaderValue::from_static(target));
    headers.insert(HX_RESWAP, HeaderValue::from_static(swap));
}
