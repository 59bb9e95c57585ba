use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{OriginalUri, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::{AppState, config::PROXY_PREFIX};

const ALLOW_ORIGIN: &str = "*";
const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization";

pub async fn forward(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // axum routes HEAD to the GET handler
    if method == Method::HEAD {
        let allow = [(header::ALLOW, HeaderValue::from_static(ALLOW_METHODS))];
        return (StatusCode::METHOD_NOT_ALLOWED, allow).into_response();
    }

    let target = target_url(state.config.backend_origin(), &uri);
    debug!(method = %method, target = %target, "proxying request");

    let mut req = state
        .http
        .request(method.clone(), &target)
        .header(header::CONTENT_TYPE, "application/json");

    if let Some(auth) = headers.get(header::AUTHORIZATION) {
        req = req.header(header::AUTHORIZATION, auth.clone());
    }
    if method != Method::GET {
        req = req.body(body);
    }

    let res = match req.send().await {
        Ok(r) => r,
        Err(err) => return failure(&target, &err),
    };

    let status = res.status();
    let bytes = match res.bytes().await {
        Ok(b) => b,
        Err(err) => return failure(&target, &err),
    };

    debug!(target = %target, %status, bytes = bytes.len(), "proxied response");

    let mut resp = (status, bytes).into_response();
    *resp.headers_mut() = response_headers();
    resp
}

pub async fn preflight() -> Response {
    (StatusCode::OK, cors_headers()).into_response()
}

// The query string is copied as-is.
pub fn target_url(origin: &str, uri: &Uri) -> String {
    let path = uri.path();
    let stripped = path
        .strip_prefix(PROXY_PREFIX)
        .map(|rest| rest.strip_prefix('/').unwrap_or(rest))
        .unwrap_or(path);

    let mut url = format!("{}/{}", origin.trim_end_matches('/'), stripped);
    if let Some(query) = uri.query().filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(query);
    }
    url
}

fn failure(target: &str, err: &reqwest::Error) -> Response {
    warn!(target = %target, error = %err, "proxy request failed");
    let body = serde_json::json!({
        "error": "Failed to proxy request to backend",
        "message": err.to_string(),
    });
    let mut resp = (StatusCode::INTERNAL_SERVER_ERROR, body.to_string()).into_response();
    *resp.headers_mut() = response_headers();
    resp
}

fn cors_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static(ALLOW_ORIGIN));
    headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS));
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS));
    headers
}

fn response_headers() -> HeaderMap {
    let mut headers = cors_headers();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::Request,
    };
    use httpmock::prelude::*;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;

    async fn call(state: Arc<AppState>, req: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
        let resp = crate::app(state).oneshot(req).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, headers, body)
    }

    fn assert_cors(headers: &HeaderMap) {
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], ALLOW_METHODS);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], ALLOW_HEADERS);
    }

    #[test]
    fn target_keeps_query_verbatim() {
        let uri: Uri = "/api/Movies?search=a%20b&sortBy=title".parse().unwrap();
        assert_eq!(
            target_url("http://backend/api/", &uri),
            "http://backend/api/Movies?search=a%20b&sortBy=title"
        );

        let uri: Uri = "/api/Movies/4".parse().unwrap();
        assert_eq!(target_url("http://backend/api", &uri), "http://backend/api/Movies/4");
    }

    #[tokio::test]
    async fn get_is_forwarded_without_body() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/Movies")
                    .query_param("search", "a")
                    .header("content-type", "application/json")
                    .header_missing("content-length")
                    .header_missing("transfer-encoding");
                then.status(200).header("x-backend", "1").json_body(json!([]));
            })
            .await;

        let state = crate::test_state(&server.url("/api"));
        let req = Request::builder()
            .uri("/api/Movies?search=a")
            .body(Body::from("ignored"))
            .unwrap();
        let (status, headers, body) = call(state, req).await;

        mock.assert_async().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert!(headers.get("x-backend").is_none());
        assert_cors(&headers);
        assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!([]));
    }

    #[tokio::test]
    async fn post_body_and_authorization_pass_through() {
        let raw = r#"{ "title" : "Alien",  "rating":5 }"#;
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/Movies")
                    .header("authorization", "Bearer secret")
                    .body(raw);
                then.status(201).json_body(json!({"id": 1}));
            })
            .await;

        let state = crate::test_state(&server.url("/api"));
        let req = Request::builder()
            .method("POST")
            .uri("/api/Movies")
            .header("authorization", "Bearer secret")
            .header("content-type", "text/plain")
            .body(Body::from(raw))
            .unwrap();
        let (status, _, body) = call(state, req).await;

        mock.assert_async().await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!({"id": 1}));
    }

    #[tokio::test]
    async fn backend_error_status_is_reflected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(DELETE).path("/api/Movies/99");
                then.status(404).json_body(json!({"message": "not found"}));
            })
            .await;

        let state = crate::test_state(&server.url("/api"));
        let req =
            Request::builder().method("DELETE").uri("/api/Movies/99").body(Body::empty()).unwrap();
        let (status, headers, body) = call(state, req).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_cors(&headers);
        assert_eq!(
            serde_json::from_slice::<Value>(&body).unwrap(),
            json!({"message": "not found"})
        );
    }

    #[tokio::test]
    async fn unreachable_backend_yields_json_500() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let state = crate::test_state(&format!("http://{addr}/api"));
        let req = Request::builder().uri("/api/Movies").body(Body::empty()).unwrap();
        let (status, headers, body) = call(state, req).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert_cors(&headers);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "Failed to proxy request to backend");
        assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
    }

    #[tokio::test]
    async fn preflight_never_reaches_backend() {
        let state = crate::test_state("http://127.0.0.1:9/api");
        let req = Request::builder()
            .method("OPTIONS")
            .uri("/api/Movies/3")
            .body(Body::empty())
            .unwrap();
        let (status, headers, body) = call(state, req).await;

        assert_eq!(status, StatusCode::OK);
        assert_cors(&headers);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn unsupported_method_is_rejected() {
        let state = crate::test_state("http://127.0.0.1:9/api");
        let req = Request::builder().method("PATCH").uri("/api/Movies/3").body(Body::empty()).unwrap();
        let (status, _, _) = call(state, req).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn head_is_rejected_without_reaching_backend() {
        let state = crate::test_state("http://127.0.0.1:9/api");
        let req = Request::builder()
            .method("HEAD")
            .uri("/api/Movies")
            .body(Body::from("payload"))
            .unwrap();
        let (status, headers, _) = call(state, req).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(headers[header::ALLOW], ALLOW_METHODS);
    }
}
