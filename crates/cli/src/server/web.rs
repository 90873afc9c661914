use axum::routing::get;
use axum::{Json, Router};
use ferrous_mesh_application::ports::DebugHandler;
use std::collections::HashSet;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

const HEALTH_PATH: &str = "/health";

/// Debug front-end: `/health` plus every resolver debug handler.
pub async fn start_web_server(
    listener: TcpListener,
    app: Router,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    info!(bind_address = %listener.local_addr()?, "Starting debug server");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    Ok(())
}

/// Fails when two handlers claim the same path, or one claims `/health`.
pub fn create_app(debug_handlers: Vec<DebugHandler>) -> anyhow::Result<Router> {
    let mut paths: HashSet<String> = HashSet::from([HEALTH_PATH.to_string()]);
    for debug in &debug_handlers {
        if !paths.insert(debug.path.clone()) {
            anyhow::bail!("Debug path '{}' is registered more than once", debug.path);
        }
    }
    info!(debug_paths = ?paths, "Debug routes registered");

    let mut router = Router::new().route(HEALTH_PATH, get(health_handler));

    for debug in debug_handlers {
        let handler = debug.handler;
        router = router.route(
            &debug.path,
            get(move || {
                let handler = handler.clone();
                async move { Json(handler()) }
            }),
        );
    }

    Ok(router.layer(TraceLayer::new_for_http()))
}

async fn health_handler() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use std::net::SocketAddr;

    async fn get(addr: SocketAddr, path: &str) -> String {
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let request = format!(
            "GET {} HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n",
            path
        );
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_health_and_debug_handlers() {
        let handlers = vec![DebugHandler::new(
            "/debug/meshproxy/lookup_table",
            Arc::new(|| serde_json::json!({"all_hosts": ["svc1.ns1."]})),
        )];
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = CancellationToken::new();
        let app = create_app(handlers).unwrap();
        tokio::spawn(start_web_server(listener, app, shutdown.clone()));

        let health = get(addr, "/health").await;
        let dump = get(addr, "/debug/meshproxy/lookup_table").await;
        let missing = get(addr, "/debug/nope").await;

        assert!(health.starts_with("HTTP/1.1 200"));
        assert!(health.ends_with("OK"));
        assert!(dump.starts_with("HTTP/1.1 200"));
        assert!(dump.contains(r#""all_hosts":["svc1.ns1."]"#));
        assert!(missing.starts_with("HTTP/1.1 404"));

        shutdown.cancel();
    }

    #[test]
    fn test_duplicate_debug_paths_rejected() {
        let dump = || serde_json::json!({});
        let handlers = vec![
            DebugHandler::new("/debug/meshproxy/lookup_table", Arc::new(dump)),
            DebugHandler::new("/debug/meshproxy/lookup_table", Arc::new(dump)),
        ];

        let err = create_app(handlers).unwrap_err();

        assert!(err.to_string().contains("/debug/meshproxy/lookup_table"));
    }

    #[test]
    fn test_debug_path_cannot_shadow_health() {
        let handlers = vec![DebugHandler::new("/health", Arc::new(|| serde_json::json!({})))];

        assert!(create_app(handlers).is_err());
    }
}
