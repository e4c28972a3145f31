/// 网络层：长度前缀帧 + JSON/bincode 消息体
///
/// - `codec`: 消息体格式
/// - `server`: 订单 TCP 服务器
/// - `client`: 一问一答客户端

pub mod codec;
pub mod server;
pub mod client;

pub use codec::{CodecError, WireFormat};
pub use server::OrderServer;
pub use client::{ClientError, OrderClient};
