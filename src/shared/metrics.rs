//! Prometheus Metrics Module
//!
//! 订单簿服务的核心指标
//!
//! ## 指标类型
//! - **Counter**: 订单数、拒单数、撤单/改单数、成交量
//! - **Histogram**: 单次操作处理延迟
//! - **Gauge**: 买卖盘深度、最优价、最新成交价、挂单数、活跃连接数
//!
//! ## 使用示例
//! ```rust,ignore
//! use orderbook_engine::shared::metrics::METRICS;
//!
//! METRICS.orders_total.with_label_values(&["BTC-USD", "bid", "limit"]).inc();
//! ```

use crate::domain::orderbook::MatchingBook;
use crate::shared::protocol::{ErrorCode, Side};
use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge_vec, register_histogram_vec, register_int_gauge,
    CounterVec, Encoder, GaugeVec, HistogramVec, IntGauge, TextEncoder,
};

lazy_static! {
    /// 全局Metrics实例
    pub static ref METRICS: Metrics = Metrics::new();
}

pub struct Metrics {
    /// 收到的新订单 (symbol, side, kind: limit/market)
    pub orders_total: CounterVec,

    /// 被拒绝的操作 (symbol, operation, code)
    pub rejections_total: CounterVec,

    pub cancellations_total: CounterVec,

    pub amendments_total: CounterVec,

    /// 成交数量，按主动方方向统计
    pub matched_quantity_total: CounterVec,

    /// 单次操作处理延迟 (微秒)
    pub operation_duration: HistogramVec,

    pub book_depth: GaugeVec,

    pub best_price: GaugeVec,

    pub last_fill_price: GaugeVec,

    pub resting_orders: GaugeVec,

    pub active_connections: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            orders_total: register_counter_vec!(
                "orderbook_orders_total",
                "Total number of new orders received",
                &["symbol", "side", "kind"]
            )
            .expect("orderbook_orders_total registers once"),

            rejections_total: register_counter_vec!(
                "orderbook_rejections_total",
                "Total number of rejected operations by error code",
                &["symbol", "operation", "code"]
            )
            .expect("orderbook_rejections_total registers once"),

            cancellations_total: register_counter_vec!(
                "orderbook_cancellations_total",
                "Total number of successful cancellations",
                &["symbol"]
            )
            .expect("orderbook_cancellations_total registers once"),

            amendments_total: register_counter_vec!(
                "orderbook_amendments_total",
                "Total number of successful amendments",
                &["symbol"]
            )
            .expect("orderbook_amendments_total registers once"),

            matched_quantity_total: register_counter_vec!(
                "orderbook_matched_quantity_total",
                "Total quantity matched, by aggressor side",
                &["symbol", "side"]
            )
            .expect("orderbook_matched_quantity_total registers once"),

            operation_duration: register_histogram_vec!(
                "orderbook_operation_duration_microseconds",
                "Book operation duration in microseconds",
                &["symbol", "operation"],
                vec![1.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0]
            )
            .expect("orderbook_operation_duration_microseconds registers once"),

            book_depth: register_gauge_vec!(
                "orderbook_depth",
                "Resting quantity per side",
                &["symbol", "side"]
            )
            .expect("orderbook_depth registers once"),

            best_price: register_gauge_vec!(
                "orderbook_best_price",
                "Best price per side, 0 when empty",
                &["symbol", "side"]
            )
            .expect("orderbook_best_price registers once"),

            last_fill_price: register_gauge_vec!(
                "orderbook_last_fill_price",
                "Price of the most recent trade",
                &["symbol"]
            )
            .expect("orderbook_last_fill_price registers once"),

            resting_orders: register_gauge_vec!(
                "orderbook_resting_orders",
                "Number of orders resting in the book",
                &["symbol"]
            )
            .expect("orderbook_resting_orders registers once"),

            active_connections: register_int_gauge!(
                "orderbook_active_connections",
                "Number of open client connections"
            )
            .expect("orderbook_active_connections registers once"),
        }
    }

    pub fn record_rejection(&self, symbol: &str, operation: &str, code: ErrorCode) {
        self.rejections_total
            .with_label_values(&[symbol, operation, code.as_str()])
            .inc();
    }

    /// Publishes the book's aggregate state to the gauges.
    pub fn record_book_state<B: MatchingBook>(&self, book: &B) {
        let symbol = book.symbol();
        for side in [Side::Bid, Side::Ask] {
            let best = match side {
                Side::Bid => book.best_bid(),
                Side::Ask => book.best_ask(),
            };
            self.book_depth
                .with_label_values(&[symbol, side.as_str()])
                .set(book.depth(side) as f64);
            self.best_price
                .with_label_values(&[symbol, side.as_str()])
                .set(best.unwrap_or(0) as f64);
        }
        self.last_fill_price
            .with_label_values(&[symbol])
            .set(book.last_fill_price() as f64);
        self.resting_orders
            .with_label_values(&[symbol])
            .set(book.resting_orders() as f64);
    }

    /// 导出Prometheus格式的指标
    pub fn export(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = prometheus::gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!("failed to encode metrics: {}", e);
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
