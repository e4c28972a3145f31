//! HTTP Observability Server
//!
//! 提供Prometheus metrics和健康检查端点
//!
//! ## 端点
//! - `GET /metrics` - Prometheus格式的指标
//! - `GET /health` - 健康检查（含盘口摘要）
//! - `GET /health/ready` - 就绪检查
//! - `GET /health/live` - 存活检查

use super::health::{HealthChecker, HealthStatus};
use crate::shared::metrics::METRICS;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// 可观测性服务器
pub struct ObservabilityServer {
    addr: SocketAddr,
    health_checker: Arc<HealthChecker>,
}

impl ObservabilityServer {
    pub fn new(addr: SocketAddr, health_checker: Arc<HealthChecker>) -> Self {
        Self {
            addr,
            health_checker,
        }
    }

    pub fn health_checker(&self) -> Arc<HealthChecker> {
        self.health_checker.clone()
    }

    /// 启动HTTP服务器，`shutdown` 完成后优雅退出
    pub async fn run<F>(self, shutdown: F) -> io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        info!("可观测性服务器启动于 {}", listener.local_addr()?);

        axum::serve(listener, router(self.health_checker))
            .with_graceful_shutdown(shutdown)
            .await
    }
}

pub fn router(health_checker: Arc<HealthChecker>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .route("/health/ready", get(readiness_handler))
        .route("/health/live", get(liveness_handler))
        .with_state(health_checker)
}

async fn metrics_handler() -> Response {
    (StatusCode::OK, METRICS.export()).into_response()
}

async fn health_handler(State(checker): State<Arc<HealthChecker>>) -> Response {
    let response = checker.check_health_detailed();

    let status_code = match response.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response)).into_response()
}

async fn readiness_handler(State(checker): State<Arc<HealthChecker>>) -> StatusCode {
    if checker.check_readiness() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn liveness_handler(State(checker): State<Arc<HealthChecker>>) -> StatusCode {
    if checker.check_liveness() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    async fn get(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        METRICS.record_rejection("HTTP-USD", "cancel", crate::shared::protocol::ErrorCode::OrderNotFound);
        let app = router(Arc::new(HealthChecker::new("1.0.0", "HTTP-USD")));

        let (status, body) = get(app, "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("orderbook_rejections_total"));
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let checker = Arc::new(HealthChecker::new("1.0.0", "HTTP-USD"));
        let app = router(checker.clone());

        let (status, body) = get(app.clone(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("HTTP-USD"));

        assert_eq!(get(app.clone(), "/health/live").await.0, StatusCode::OK);
        assert_eq!(get(app.clone(), "/health/ready").await.0, StatusCode::OK);

        checker.set_status(HealthStatus::Unhealthy);
        assert_eq!(get(app.clone(), "/health/ready").await.0, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(get(app.clone(), "/health").await.0, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(get(app, "/health/live").await.0, StatusCode::OK);
    }
}
