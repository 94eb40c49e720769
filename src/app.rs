use std::net::SocketAddr;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{config::AppConfig, llm, nutrition, reports, spoilage, state::AppState, telemetry};

async fn index() -> Json<Value> {
    Json(json!({"status": "ok", "message": "Food Spoilage Detection Backend"}))
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(|| async { "ok" }))
        .merge(nutrition::router())
        .merge(spoilage::router())
        .merge(telemetry::router())
        .merge(reports::router())
        .merge(llm::router())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;

    /// Serves the router on an ephemeral loopback port.
    async fn spawn_app() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, build_app(AppState::fake())).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn index_and_health() {
        let base = spawn_app().await;
        let v: Value = reqwest::get(format!("{base}/")).await.unwrap().json().await.unwrap();
        assert_eq!(v["message"], "Food Spoilage Detection Backend");

        let res = reqwest::get(format!("{base}/health")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.text().await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn extract_nutrition_over_http() {
        let base = spawn_app().await;
        let res = reqwest::Client::new()
            .post(format!("{base}/extract_nutrition"))
            .json(&json!({"text": "Protein 25g Dietary Fiber 12g"}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let v: Value = res.json().await.unwrap();
        assert_eq!(v["status"], "success");
        assert_eq!(v["nutrition"]["benefits"], json!(["High in protein", "High in fiber"]));
    }

    #[tokio::test]
    async fn missing_image_is_json_404() {
        let base = spawn_app().await;
        let res = reqwest::get(format!("{base}/latest_esp32_image")).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let v: Value = res.json().await.unwrap();
        assert_eq!(v, json!({"status": "error", "message": "No image available"}));
    }
}
