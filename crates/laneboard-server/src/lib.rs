//! HTTP API for laneboard.
//!
//! Serves the client board under `/api/v1/clients`. A single store
//! connection is shared by every request behind a mutex, so reassignments
//! are applied one at a time.

mod error;
mod handlers;

pub use error::ApiError;

use anyhow::Result;
use axum::{routing::get, Router};
use laneboard_store::ClientStore;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Server state shared across handlers.
pub struct AppState {
    store: Mutex<ClientStore>,
}

impl AppState {
    /// Wrap an open store.
    #[must_use]
    pub const fn new(store: ClientStore) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    /// Give back the store once no handler holds the state any more.
    fn into_store(self) -> ClientStore {
        self.store
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/clients", get(handlers::list_clients))
        .route(
            "/api/v1/clients/{id}",
            get(handlers::get_client).put(handlers::update_client),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API until `shutdown` resolves, then close the store.
///
/// # Errors
/// Returns error if binding fails, the server fails, or the store fails to close.
pub async fn serve(
    store: ClientStore,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let state = Arc::new(AppState::new(store));
    let app = router(Arc::clone(&state));

    let listener = TcpListener::bind(addr).await?;
    info!(address = %listener.local_addr()?, "Starting laneboard API");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server stopped, releasing store");
    match Arc::try_unwrap(state) {
        Ok(state) => state.into_store().close()?,
        Err(_) => tracing::warn!("Store still referenced at shutdown; leaving it to drop"),
    }
    Ok(())
}

/// Resolve on Ctrl-C, or on SIGTERM where supported.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use laneboard_core::{Client, Lane};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        let mut store = ClientStore::in_memory().unwrap();
        for name in ["Acme", "Birch", "Cobalt"] {
            store.create(name, None, Lane::Backlog).unwrap();
        }
        for name in ["Dune", "Ember"] {
            store.create(name, None, Lane::InProgress).unwrap();
        }
        router(Arc::new(AppState::new(store)))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn ranks(board: &Value, lane: &str) -> Vec<(String, u64)> {
        let clients: Vec<Client> = serde_json::from_value(board.clone()).unwrap();
        clients
            .into_iter()
            .filter(|c| c.status.as_str() == lane)
            .map(|c| (c.name, u64::from(c.priority)))
            .collect()
    }

    #[tokio::test]
    async fn test_list_and_filter() {
        let app = app();

        let (status, all) = send(&app, "GET", "/api/v1/clients", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(all.as_array().unwrap().len(), 5);

        let (status, in_progress) =
            send(&app, "GET", "/api/v1/clients?status=in-progress", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(in_progress.as_array().unwrap().len(), 2);
        assert_eq!(
            ranks(&in_progress, "in-progress"),
            vec![("Dune".to_string(), 1), ("Ember".to_string(), 2)]
        );

        let (status, err) = send(&app, "GET", "/api/v1/clients?status=archived", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["message"], json!("Invalid status"));
        assert!(err["long_message"].as_str().unwrap().contains("archived"));
    }

    #[tokio::test]
    async fn test_get_client() {
        let app = app();

        let (status, client) = send(&app, "GET", "/api/v1/clients/2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(client["name"], json!("Birch"));
        assert_eq!(client["status"], json!("backlog"));

        let (status, err) = send(&app, "GET", "/api/v1/clients/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["message"], json!("Invalid id"));

        let (status, err) = send(&app, "GET", "/api/v1/clients/77", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["message"], json!("Client not found"));
    }

    #[tokio::test]
    async fn test_put_reorders_lanes() {
        let app = app();

        let (status, board) =
            send(&app, "PUT", "/api/v1/clients/2", Some(json!({ "priority": 1 }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            ranks(&board, "backlog"),
            vec![
                ("Birch".to_string(), 1),
                ("Acme".to_string(), 2),
                ("Cobalt".to_string(), 3)
            ]
        );

        let (status, board) = send(
            &app,
            "PUT",
            "/api/v1/clients/1",
            Some(json!({ "status": "in-progress" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            ranks(&board, "backlog"),
            vec![("Birch".to_string(), 1), ("Cobalt".to_string(), 2)]
        );
        assert_eq!(
            ranks(&board, "in-progress"),
            vec![
                ("Dune".to_string(), 1),
                ("Ember".to_string(), 2),
                ("Acme".to_string(), 3)
            ]
        );
    }

    #[tokio::test]
    async fn test_put_rejections_change_nothing() {
        let app = app();
        let (_, before) = send(&app, "GET", "/api/v1/clients", None).await;

        let cases = [
            ("/api/v1/clients/1", json!({ "status": "done" }), "Invalid status"),
            ("/api/v1/clients/1", json!({ "priority": 0 }), "Invalid priority"),
            ("/api/v1/clients/1", json!({ "priority": "soon" }), "Invalid priority"),
            ("/api/v1/clients/1", json!({ "status": "complete", "priority": 1.5 }), "Invalid priority"),
            ("/api/v1/clients/99", json!({ "status": "complete" }), "Client not found"),
            ("/api/v1/clients/-3", json!({}), "Invalid id"),
        ];

        for (uri, body, message) in cases {
            let (status, err) = send(&app, "PUT", uri, Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(err["message"], json!(message), "{uri}");
        }

        let (_, after) = send(&app, "GET", "/api/v1/clients", None).await;
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn test_put_field_types_and_empty_body() {
        let app = app();
        let (_, before) = send(&app, "GET", "/api/v1/clients", None).await;

        let cases = [
            (json!({ "status": 5 }), "Invalid status"),
            (json!({ "status": ["backlog"] }), "Invalid status"),
            (json!({ "priority": { "rank": 1 } }), "Invalid priority"),
            (json!({ "priority": 2_147_483_648_u64 }), "Invalid priority"),
            (json!("move"), "Invalid body"),
        ];
        for (body, message) in cases {
            let (status, err) = send(&app, "PUT", "/api/v1/clients/1", Some(body.clone())).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
            assert_eq!(err["message"], json!(message), "{body}");
        }

        // No body and no content type is a no-op returning the board.
        let (status, board) = send(&app, "PUT", "/api/v1/clients/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(board, before);

        // A JSON body without a content type is still read.
        let request = Request::builder()
            .method("PUT")
            .uri("/api/v1/clients/3")
            .body(Body::from(r#"{"priority": 1}"#))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let (_, after) = send(&app, "GET", "/api/v1/clients?status=backlog", None).await;
        assert_eq!(
            ranks(&after, "backlog"),
            vec![
                ("Cobalt".to_string(), 1),
                ("Acme".to_string(), 2),
                ("Birch".to_string(), 3)
            ]
        );
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], json!("ok"));
    }
}
