use std::path::Path;

use axum::Router;
use axum::http::{HeaderName, HeaderValue};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::error::DevError;

/// `SharedArrayBuffer` (and so threaded WASM) is only available to
/// cross-origin isolated pages.
const CROSS_ORIGIN_OPENER_POLICY: HeaderName = HeaderName::from_static("cross-origin-opener-policy");
const CROSS_ORIGIN_EMBEDDER_POLICY: HeaderName =
    HeaderName::from_static("cross-origin-embedder-policy");

/// Static file router for `public_dir`.
///
/// Directories resolve to their `index.html`, missing paths get a 404, and
/// every response, errors included, carries the isolation headers.
pub fn router(public_dir: &Path) -> Router {
    Router::new()
        .fallback_service(ServeDir::new(public_dir))
        .layer(SetResponseHeaderLayer::overriding(
            CROSS_ORIGIN_OPENER_POLICY,
            HeaderValue::from_static("same-origin"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            CROSS_ORIGIN_EMBEDDER_POLICY,
            HeaderValue::from_static("require-corp"),
        ))
        .layer(TraceLayer::new_for_http())
}

/// Bind the listening socket. Done before spawning the server so that a
/// port already in use fails startup.
pub async fn bind(host: &str, port: u16) -> Result<TcpListener, DevError> {
    TcpListener::bind((host, port))
        .await
        .map_err(|source| DevError::Bind { port, source })
}

/// Serve `public_dir` on `listener` until `cancel` fires, then drain open
/// connections.
pub async fn serve(
    listener: TcpListener,
    public_dir: &Path,
    cancel: CancellationToken,
) -> Result<(), DevError> {
    axum::serve(listener, router(public_dir))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use std::fs;
    use tower::ServiceExt;

    async fn get(public_dir: &Path, uri: &str) -> Response {
        router(public_dir)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    fn assert_isolated(response: &Response) {
        let headers = response.headers();
        assert_eq!(headers["cross-origin-opener-policy"], "same-origin");
        assert_eq!(headers["cross-origin-embedder-policy"], "require-corp");
    }

    #[tokio::test]
    async fn existing_file_is_served_with_isolation_headers() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("pkg")).unwrap();
        fs::write(dir.path().join("pkg").join("ant.js"), "export default 1;").unwrap();

        let response = get(dir.path(), "/pkg/ant.js").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_isolated(&response);
        assert!(response.headers().contains_key("last-modified"));
    }

    #[tokio::test]
    async fn missing_file_is_404_with_isolation_headers() {
        let dir = tempfile::tempdir().unwrap();
        let response = get(dir.path(), "/missing.html").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_isolated(&response);
    }

    #[tokio::test]
    async fn root_resolves_to_index() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();

        let response = get(dir.path(), "/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_isolated(&response);
    }

    #[tokio::test]
    async fn head_request_reports_last_modified() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();

        let response = router(dir.path())
            .oneshot(
                Request::builder()
                    .method("HEAD")
                    .uri("/index.html")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("last-modified"));
    }

    #[tokio::test]
    async fn bind_fails_when_port_is_taken() {
        let taken = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let err = bind("127.0.0.1", port).await.unwrap_err();
        assert!(matches!(err, DevError::Bind { port: p, .. } if p == port));
    }

    #[tokio::test]
    async fn serve_returns_after_cancel() {
        let dir = tempfile::tempdir().unwrap();
        let listener = bind("127.0.0.1", 0).await.unwrap();
        let cancel = CancellationToken::new();
        let public_dir = dir.path().to_path_buf();
        let task = tokio::spawn({
            let cancel = cancel.clone();
            async move { serve(listener, &public_dir, cancel).await }
        });

        cancel.cancel();
        let result = tokio::time::timeout(std::time::Duration::from_secs(5), task)
            .await
            .expect("server should shut down")
            .unwrap();
        assert!(result.is_ok());
    }
}
