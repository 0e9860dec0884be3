//! Request handlers.
//!
//! The error page flow per request: negotiate the format, resolve the code,
//! pick the active template, consult the cache, render on a miss.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header::{HeaderName, ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::{Json, Router};

use crate::cache::CacheKey;
use crate::format::Format;
use crate::render::RenderContext;

use super::AppState;

const FAVICON: &[u8] = include_bytes!("../../assets/favicon.svg");

/// Build the complete router.
pub(super) fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", any(index_page))
        .route("/healthz", get(health))
        .route("/health", get(health))
        .route("/health/live", get(health))
        .route("/live", get(health))
        .route("/version", get(version))
        .route("/favicon.ico", get(favicon))
        .route("/{page}", any(error_page))
        .fallback(unknown_path)
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "version": crate::VERSION }))
}

async fn favicon() -> impl IntoResponse {
    ([(CONTENT_TYPE, "image/svg+xml")], FAVICON)
}

/// `/` serves the configured default code at the configured status.
async fn index_page(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let status = StatusCode::from_u16(state.config.default_http_code)
        .unwrap_or(StatusCode::OK);
    respond(
        &state,
        state.config.default_code_to_render,
        None,
        &headers,
        status,
    )
}

/// `/{page}`: a parseable code serves that page for any method; everything
/// else is handled like an unknown path.
async fn error_page(
    State(state): State<Arc<AppState>>,
    method: Method,
    Path(page): Path<String>,
    headers: HeaderMap,
) -> Response {
    match parse_page(&page) {
        Some((code, extension)) => respond(&state, code, extension, &headers, StatusCode::OK),
        None => not_found(&state, &method, &headers),
    }
}

/// Unknown paths are served only to GET and HEAD.
async fn unknown_path(
    State(state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
) -> Response {
    not_found(&state, &method, &headers)
}

fn not_found(state: &AppState, method: &Method, headers: &HeaderMap) -> Response {
    if method == Method::GET || method == Method::HEAD {
        respond(state, 404, None, headers, StatusCode::NOT_FOUND)
    } else {
        StatusCode::METHOD_NOT_ALLOWED.into_response()
    }
}

/// Split a path segment into a code and an optional recognized extension.
///
/// `404`, `404.html` and `500.json` parse; `unknown`, `404.png` and `40`
/// do not.
fn parse_page(segment: &str) -> Option<(u16, Option<&str>)> {
    let (code_part, extension) = match segment.rsplit_once('.') {
        Some((code, ext)) => {
            Format::from_extension(ext)?;
            (code, Some(ext))
        }
        None => (segment, None),
    };

    if code_part.len() != 3 || !code_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    code_part.parse::<u16>().ok().map(|code| (code, extension))
}

fn respond(
    state: &AppState,
    code: u16,
    extension: Option<&str>,
    request_headers: &HeaderMap,
    status: StatusCode,
) -> Response {
    let accept = request_headers.get(ACCEPT).and_then(|v| v.to_str().ok());
    let format = Format::negotiate(extension, accept);
    let template = state.rotation.active_template().to_owned();

    // per-request detail fields make cached bytes stale, so skip the cache
    // entirely when details are on
    let cache_key = CacheKey::new(template.clone(), code, format);
    let body = if state.config.show_details {
        None
    } else {
        state.cache.get(&cache_key).map(|bytes| bytes.to_vec())
    };

    let body = match body {
        Some(bytes) => bytes,
        None => {
            let context = build_context(state, code, request_headers);
            match state
                .renderer
                .render(&state.config.templates, &template, &context, format)
            {
                Ok(bytes) => {
                    if !state.config.show_details {
                        state.cache.put(cache_key, bytes.clone());
                    }
                    bytes
                }
                Err(e) => {
                    tracing::error!(code, template = %template, error = %e, "page rendering failed");
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "rendering failed\n",
                    )
                        .into_response();
                }
            }
        }
    };

    let mut response = Response::builder()
        .status(status)
        .header(CONTENT_TYPE, format.content_type())
        .body(Body::from(body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response());

    // copy the allow-listed request headers onto the response
    for name in &state.config.proxy_headers {
        if let (Ok(header), Some(value)) = (
            HeaderName::try_from(name.as_str()),
            request_headers.get(name.as_str()),
        ) {
            response.headers_mut().insert(header, value.clone());
        }
    }

    response
}

fn build_context(state: &AppState, code: u16, headers: &HeaderMap) -> RenderContext {
    let mut context = RenderContext::new(state.config.codes.describe(code));
    context.l10n_enabled = !state.config.disable_l10n;
    context.show_details = state.config.show_details;

    if state.config.show_details {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        context.host = header("host");
        context.original_uri = header("x-original-uri");
        context.forwarded_for = header("x-forwarded-for");
        context.request_id = header("x-request-id");
    }

    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::http::Server;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_router() -> Router {
        Server::new(Config::default()).unwrap().router()
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, HeaderMap, String) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, String::from_utf8_lossy(&body).into_owned())
    }

    fn get(path: &str) -> Request<Body> {
        Request::builder().uri(path).body(Body::empty()).unwrap()
    }

    #[test]
    fn test_parse_page() {
        assert_eq!(parse_page("404"), Some((404, None)));
        assert_eq!(parse_page("404.html"), Some((404, Some("html"))));
        assert_eq!(parse_page("503.htm"), Some((503, Some("htm"))));
        assert_eq!(parse_page("500.json"), Some((500, Some("json"))));

        assert_eq!(parse_page("unknown"), None);
        assert_eq!(parse_page("40"), None);
        assert_eq!(parse_page("4040"), None);
        assert_eq!(parse_page("404.png"), None);
        assert_eq!(parse_page(""), None);
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        for path in ["/healthz", "/health", "/health/live", "/live"] {
            let (status, _, body) = send(test_router(), get(path)).await;
            assert_eq!(status, StatusCode::OK, "unexpected status for {}", path);
            assert_eq!(body, "OK");
        }
    }

    #[tokio::test]
    async fn test_version_endpoint() {
        let (status, _, body) = send(test_router(), get("/version")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("version"));
        assert!(body.contains(crate::VERSION));
    }

    #[tokio::test]
    async fn test_favicon() {
        let (status, headers, _) = send(test_router(), get("/favicon.ico")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[CONTENT_TYPE], "image/svg+xml");
    }

    #[tokio::test]
    async fn test_error_page_basics() {
        let (status, headers, body) = send(test_router(), get("/404")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[CONTENT_TYPE], "text/html; charset=utf-8");
        assert!(body.contains("404"));
        assert!(body.contains("Not Found"));
    }

    #[tokio::test]
    async fn test_extension_selects_format() {
        let (_, headers, body) = send(test_router(), get("/404.json")).await;
        assert_eq!(headers[CONTENT_TYPE], "application/json; charset=utf-8");
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["code"], 404);
    }

    #[tokio::test]
    async fn test_extension_beats_accept_header() {
        let request = Request::builder()
            .uri("/404.json")
            .header(ACCEPT, "text/html")
            .body(Body::empty())
            .unwrap();
        let (_, headers, _) = send(test_router(), request).await;
        assert_eq!(headers[CONTENT_TYPE], "application/json; charset=utf-8");
    }

    #[tokio::test]
    async fn test_accept_header_negotiation() {
        for (accept, expected) in [
            ("application/json", "application/json; charset=utf-8"),
            ("application/xml", "application/xml; charset=utf-8"),
            ("text/plain", "text/plain; charset=utf-8"),
            ("text/html", "text/html; charset=utf-8"),
        ] {
            let request = Request::builder()
                .uri("/500")
                .header(ACCEPT, accept)
                .body(Body::empty())
                .unwrap();
            let (_, headers, _) = send(test_router(), request).await;
            assert_eq!(headers[CONTENT_TYPE], expected, "for Accept: {}", accept);
        }
    }

    #[tokio::test]
    async fn test_xml_body_shape() {
        let request = Request::builder()
            .uri("/500")
            .header(ACCEPT, "application/xml")
            .body(Body::empty())
            .unwrap();
        let (_, _, body) = send(test_router(), request).await;
        assert!(body.starts_with("<?xml"));
        assert!(body.contains("<error>"));
        assert!(body.contains("<code>500</code>"));
    }

    #[tokio::test]
    async fn test_index_page_uses_defaults() {
        let (status, _, body) = send(test_router(), get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("404"));
    }

    #[tokio::test]
    async fn test_index_page_honours_configured_status() {
        let mut config = Config::default();
        config.default_http_code = 503;
        let router = Server::new(config).unwrap().router();
        let (status, _, _) = send(router, get("/")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_unknown_code_still_renders() {
        let (status, _, body) = send(test_router(), get("/777")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("777"));
    }

    #[tokio::test]
    async fn test_any_method_on_error_pages() {
        for method in ["GET", "POST", "PUT", "DELETE", "HEAD"] {
            let request = Request::builder()
                .method(method)
                .uri("/404")
                .body(Body::empty())
                .unwrap();
            let (status, _, _) = send(test_router(), request).await;
            assert_eq!(status, StatusCode::OK, "unexpected status for {}", method);
        }
    }

    #[tokio::test]
    async fn test_unknown_path_is_404_for_get() {
        let (status, _, body) = send(test_router(), get("/unknown/path")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("404"));

        let (status, _, _) = send(test_router(), get("/unknown")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_path_is_405_for_other_methods() {
        for method in ["POST", "PUT", "DELETE"] {
            let request = Request::builder()
                .method(method)
                .uri("/unknown")
                .body(Body::empty())
                .unwrap();
            let (status, _, _) = send(test_router(), request).await;
            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "for {}", method);
        }
    }

    #[tokio::test]
    async fn test_proxy_headers_are_copied() {
        let mut config = Config::default();
        config.proxy_headers = vec!["X-Request-ID".to_owned()];
        let router = Server::new(config).unwrap().router();

        let request = Request::builder()
            .uri("/404")
            .header("X-Request-ID", "abc-123")
            .body(Body::empty())
            .unwrap();
        let (_, headers, _) = send(router, request).await;
        assert_eq!(headers["x-request-id"], "abc-123");
    }

    #[tokio::test]
    async fn test_show_details_injects_request_fields() {
        let mut config = Config::default();
        config.show_details = true;
        let router = Server::new(config).unwrap().router();

        let request = Request::builder()
            .uri("/404.json")
            .header("host", "front.example.com")
            .header("x-request-id", "req-9")
            .body(Body::empty())
            .unwrap();
        let (_, _, body) = send(router, request).await;
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["details"]["host"], "front.example.com");
        assert_eq!(value["details"]["request_id"], "req-9");
    }

    #[tokio::test]
    async fn test_render_failure_maps_to_500() {
        let mut config = Config::default();
        config
            .templates
            .add("broken", "{{ undefined_variable }}")
            .unwrap();
        config.template_name = "broken".to_owned();
        let router = Server::new(config).unwrap().router();

        let (status, _, _) = send(router, get("/404")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_repeated_requests_hit_the_cache() {
        let server = Server::new(Config::default()).unwrap();
        let router = server.router();

        let (_, _, first) = send(router.clone(), get("/404")).await;
        let (_, _, second) = send(router, get("/404")).await;
        assert_eq!(first, second);
    }
}
