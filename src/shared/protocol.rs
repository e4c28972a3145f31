use serde::{Deserialize, Serialize};

/// 价格，使用 u64 避免浮点数精度问题（例如 123.45 表示为 12345）；0 表示市价单
pub type Price = u64;

/// 数量
pub type Quantity = u64;

/// 订单ID，由调用方分配，挂单期间不可复用
pub type OrderId = u64;

/// 订单方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    /// The side an incoming order of this side matches against.
    #[inline]
    pub fn opposite(self) -> Side {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }

    /// Lower-case label used in metrics and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Bid => "bid",
            Side::Ask => "ask",
        }
    }
}

/// 新订单请求
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOrderRequest {
    pub order_id: OrderId,
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
}

/// 撤单请求
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOrderRequest {
    pub order_id: OrderId,
}

/// 改单请求（仅数量）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmendOrderRequest {
    pub order_id: OrderId,
    pub quantity: Quantity,
}

/// 盘口快照请求
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRequest {
    /// 每侧返回的价格档位数
    pub levels: u32,
}

/// Final state of an order after `AddOrder` was processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReport {
    pub order_id: OrderId,
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
    pub filled_quantity: Quantity,
    pub remaining_quantity: Quantity,
    pub average_fill_price: f64,
    /// 剩余数量是否已挂入订单簿
    pub resting: bool,
}

/// 单个价格档位的聚合信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    pub price: Price,
    pub quantity: Quantity,
    pub orders: u32,
}

/// 盘口快照，按优先级从优到劣排列
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub symbol: String,
    pub best_bid: Price,
    pub best_ask: Price,
    pub bid_depth: Quantity,
    pub ask_depth: Quantity,
    pub last_fill_price: Price,
    pub bids: Vec<LevelSnapshot>,
    pub asks: Vec<LevelSnapshot>,
}

/// Wire-level error codes. Every book error has its own code so adapters
/// never collapse two failure modes into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    NotEnoughLiquidity,
    OrderNotFound,
    AmendTooLow,
    DuplicateOrderId,
    InvalidOrder,
    Unavailable,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::NotEnoughLiquidity => "not_enough_liquidity",
            ErrorCode::OrderNotFound => "order_not_found",
            ErrorCode::AmendTooLow => "amend_too_low",
            ErrorCode::DuplicateOrderId => "duplicate_order_id",
            ErrorCode::InvalidOrder => "invalid_order",
            ErrorCode::Unavailable => "unavailable",
        }
    }
}

/// 错误回报
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReply {
    pub code: ErrorCode,
    pub message: String,
}

/// 客户端发送给服务器的所有消息的顶层枚举
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientMessage {
    AddOrder(AddOrderRequest),
    CancelOrder(CancelOrderRequest),
    AmendOrder(AmendOrderRequest),
    Snapshot(SnapshotRequest),
}

/// 服务器发送给客户端的所有消息的顶层枚举
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ServerMessage {
    OrderAccepted(OrderReport),
    OrderCancelled { order_id: OrderId },
    OrderAmended { order_id: OrderId, quantity: Quantity },
    Snapshot(BookSnapshot),
    Error(ErrorReply),
}
