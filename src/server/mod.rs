//! # HTTP Preview API
//!
//! JSON endpoints for the label designer: token codec, projection, label
//! render and label check.
//!
//! ## Usage
//!
//! ```bash
//! rotulo serve --listen 0.0.0.0:8080
//! ```

mod handlers;
mod state;

pub use state::{AppState, ServerConfig};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::RotuloConfig;
use crate::error::RotuloError;

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        // Content API
        .route("/api/content/display", post(handlers::content::display))
        .route("/api/content/storage", post(handlers::content::storage))
        .route("/api/content/project", post(handlers::content::project))
        // Label API
        .route("/api/label/render", post(handlers::label::render))
        .route("/api/label/check", post(handlers::label::check))
        .route("/api/label/element-types", get(handlers::label::types))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use rotulo::config::RotuloConfig;
/// use rotulo::server::{serve, ServerConfig};
///
/// # async fn example() -> Result<(), rotulo::error::RotuloError> {
/// let config = ServerConfig {
///     listen_addr: "0.0.0.0:8080".to_string(),
/// };
///
/// serve(config, RotuloConfig::default()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig, rotulo: RotuloConfig) -> Result<(), RotuloError> {
    let app_state = Arc::new(AppState::new(config.clone(), rotulo));
    let app = router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| RotuloError::Server(format!("Failed to bind to {}: {}", config.listen_addr, e)))?;

    tracing::info!(addr = %config.listen_addr, "rotulo server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| RotuloError::Server(format!("Server error: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app() -> Router {
        router(Arc::new(AppState::new(ServerConfig::default(), RotuloConfig::default())))
    }

    async fn post_json(uri: &str, body: Value) -> (StatusCode, String) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_display_and_storage() {
        let fields = json!([{"value": "product.name", "label": "Producto"}]);
        let (status, body) = post_json(
            "/api/content/display",
            json!({"content": "<b>{{product.name}}</b>", "fields": fields}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"content":"<b>{{Producto}}</b>"}"#);

        let (status, body) = post_json(
            "/api/content/storage",
            json!({"content": "{{Producto}} {{Otro}}", "fields": fields}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"content":"{{product.name}} {{Otro}}"}"#);
    }

    #[tokio::test]
    async fn test_storage_rejects_shared_labels() {
        let fields = json!([
            {"value": "a.name", "label": "Nombre"},
            {"value": "b.name", "label": "Nombre"}
        ]);
        let (status, body) = post_json("/api/content/storage", json!({"content": "{{Nombre}}", "fields": fields})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body.contains("Nombre"));
    }

    #[tokio::test]
    async fn test_project_markup_escapes() {
        let (_, body) = post_json(
            "/api/content/project",
            json!({"content": "<b>{{brand}}</b> {{missing}}", "values": {"brand": "A&B"}, "markup": true}),
        )
        .await;
        assert_eq!(body, r#"{"content":"<b>A&amp;B</b> {{missing}}"}"#);
    }

    #[tokio::test]
    async fn test_label_render_and_check() {
        let label = json!({
            "canvas": {"width": 50, "height": 30},
            "elements": [
                {"type": "text", "id": "t", "content": "Lote {{lot}}"},
                {"type": "barcode", "id": "b", "barcodeContent": "{{ean}}", "symbology": "ean13"}
            ]
        });
        let (status, body) = post_json(
            "/api/label/render",
            json!({"label": label, "values": {"lot": "L1", "ean": "400638133393"}}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let rendered: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(rendered[0]["output"]["text"], "Lote L1");
        assert_eq!(rendered[1]["output"]["symbol"]["text"], "4006381333931");

        let (status, body) = post_json("/api/label/check", json!({"label": label, "values": {"ean": "99"}})).await;
        assert_eq!(status, StatusCode::OK);
        let issues: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(issues[0]["element"], "b");
    }

    #[tokio::test]
    async fn test_malformed_label_is_bad_request() {
        let (status, body) = post_json("/api/label/render", json!({"label": {"elements": 3}})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.starts_with("Invalid label"));
    }
}
