//! Health Check
//!
//! 订单簿服务的健康状态，用于负载均衡器和监控系统
//!
//! ## 健康检查端点
//! - `/health` - 详细状态（含盘口摘要）
//! - `/health/ready` - 就绪检查（撮合线程仍在运行且状态健康）
//! - `/health/live` - 存活检查
//!
//! ## 响应格式
//! ```json
//! {
//!   "status": "healthy",
//!   "uptime_seconds": 3600,
//!   "version": "0.1.0",
//!   "timestamp": 1234567890,
//!   "details": { "symbol": "BTC-USD", "book_service_running": true, ... }
//! }
//! ```

use crate::application::services::BookHandle;
use crate::shared::metrics::METRICS;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// 健康状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    /// 降级（部分功能不可用）
    Degraded,
    Unhealthy,
}

/// 健康检查响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub uptime_seconds: u64,
    pub version: String,
    pub timestamp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HealthDetails>,
}

/// 盘口摘要，取自 Prometheus 指标
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthDetails {
    pub symbol: String,
    pub book_service_running: bool,
    pub active_connections: i64,
    pub resting_orders: u64,
    pub best_bid: u64,
    pub best_ask: u64,
    pub last_fill_price: u64,
}

/// 健康检查器
pub struct HealthChecker {
    start_time: SystemTime,
    status: RwLock<HealthStatus>,
    version: String,
    symbol: String,
    /// 撮合线程句柄，用于判断其是否仍在运行
    book: Option<BookHandle>,
}

impl HealthChecker {
    pub fn new(version: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            start_time: SystemTime::now(),
            status: RwLock::new(HealthStatus::Healthy),
            version: version.into(),
            symbol: symbol.into(),
            book: None,
        }
    }

    /// 关联撮合服务，就绪检查会随之失败
    pub fn with_book(mut self, book: BookHandle) -> Self {
        self.book = Some(book);
        self
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time
            .elapsed()
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    fn current_timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    pub fn set_status(&self, status: HealthStatus) {
        *self.status.write() = status;
    }

    pub fn get_status(&self) -> HealthStatus {
        *self.status.read()
    }

    fn book_service_running(&self) -> bool {
        self.book.as_ref().map_or(true, |handle| !handle.is_closed())
    }

    /// 撮合线程退出后视为不健康
    pub fn effective_status(&self) -> HealthStatus {
        if self.book_service_running() {
            self.get_status()
        } else {
            HealthStatus::Unhealthy
        }
    }

    pub fn details(&self) -> HealthDetails {
        let symbol = self.symbol.as_str();
        let gauge = |vec: &prometheus::GaugeVec, labels: &[&str]| vec.with_label_values(labels).get() as u64;
        HealthDetails {
            symbol: self.symbol.clone(),
            book_service_running: self.book_service_running(),
            active_connections: METRICS.active_connections.get(),
            resting_orders: gauge(&METRICS.resting_orders, &[symbol]),
            best_bid: gauge(&METRICS.best_price, &[symbol, "bid"]),
            best_ask: gauge(&METRICS.best_price, &[symbol, "ask"]),
            last_fill_price: gauge(&METRICS.last_fill_price, &[symbol]),
        }
    }

    pub fn check_health(&self) -> HealthResponse {
        HealthResponse {
            status: self.effective_status(),
            uptime_seconds: self.uptime_seconds(),
            version: self.version.clone(),
            timestamp: Self::current_timestamp(),
            details: None,
        }
    }

    pub fn check_health_detailed(&self) -> HealthResponse {
        HealthResponse {
            details: Some(self.details()),
            ..self.check_health()
        }
    }

    /// 存活检查（liveness probe）
    pub fn check_liveness(&self) -> bool {
        true
    }

    /// 就绪检查（readiness probe）
    pub fn check_readiness(&self) -> bool {
        matches!(self.effective_status(), HealthStatus::Healthy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_health_checker_creation() {
        let checker = HealthChecker::new("1.0.0", "BTC-USD");
        assert_eq!(checker.version, "1.0.0");
        assert_eq!(checker.get_status(), HealthStatus::Healthy);
    }

    #[test]
    fn test_status_change() {
        let checker = HealthChecker::new("1.0.0", "BTC-USD");

        checker.set_status(HealthStatus::Degraded);
        assert_eq!(checker.get_status(), HealthStatus::Degraded);
        assert!(!checker.check_readiness());

        checker.set_status(HealthStatus::Healthy);
        assert!(checker.check_readiness());
    }

    #[test]
    fn test_stopped_book_service_is_unhealthy() {
        let (tx, rx) = mpsc::unbounded_channel();
        let checker = HealthChecker::new("1.0.0", "BTC-USD").with_book(BookHandle::new(tx));
        assert!(checker.check_readiness());

        drop(rx);
        assert_eq!(checker.effective_status(), HealthStatus::Unhealthy);
        assert!(!checker.check_readiness());
        // 即使不健康，存活检查也应该通过
        assert!(checker.check_liveness());
        assert!(!checker.details().book_service_running);
    }

    #[test]
    fn test_serialization() {
        let checker = HealthChecker::new("1.0.0", "HEALTH-USD");
        let json = serde_json::to_string(&checker.check_health()).unwrap();
        assert!(json.contains("\"healthy\""));
        assert!(!json.contains("details"));

        let json = serde_json::to_string(&checker.check_health_detailed()).unwrap();
        assert!(json.contains("HEALTH-USD"));
    }
}
