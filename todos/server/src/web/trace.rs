use axum::extract::MatchedPath;
use tower_http::trace::MakeSpan;
use tracing::Span;

/// Routes whose requests carry credentials.
const SENSITIVE_ROUTES: [&str; 2] = ["/login", "/signup"];

/// Span maker that flags credential-carrying routes.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilteredMakeSpan;

impl<B> MakeSpan<B> for FilteredMakeSpan {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let uri = request.uri();
        let method = request.method();
        let matched_path = request
            .extensions()
            .get::<MatchedPath>()
            .map(MatchedPath::as_str);

        if SENSITIVE_ROUTES.contains(&uri.path()) {
            tracing::info_span!(
                "request",
                method = %method,
                path = uri.path(),
                matched_path,
                sensitive_route = true,
            )
        } else {
            tracing::info_span!(
                "request",
                method = %method,
                uri = %uri,
                matched_path,
            )
        }
    }
}
