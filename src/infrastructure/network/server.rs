/// 订单 TCP 服务器
///
/// 每个连接一个任务，请求与回报在同一连接上一问一答。帧使用
/// `LengthDelimitedCodec`，帧内按配置的 `WireFormat` 编码。

use super::codec::{WireFormat, MAX_FRAME_LEN};
use crate::application::services::{BookHandle, ServiceError};
use crate::shared::metrics::METRICS;
use crate::shared::protocol::{ClientMessage, ErrorCode, ErrorReply, ServerMessage};
use futures::{SinkExt, StreamExt};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tracing::{debug, error, info, warn};

pub struct OrderServer {
    listener: TcpListener,
    handle: BookHandle,
    format: WireFormat,
}

impl OrderServer {
    pub async fn bind(
        addr: impl ToSocketAddrs,
        handle: BookHandle,
        format: WireFormat,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            handle,
            format,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections until `shutdown` resolves.
    ///
    /// Connections already open keep running until their client disconnects.
    pub async fn run<F>(self, shutdown: F) -> io::Result<()>
    where
        F: Future<Output = ()>,
    {
        info!(addr = %self.local_addr()?, format = ?self.format, "order server listening");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("order server shutting down");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let handle = self.handle.clone();
                        let format = self.format;
                        tokio::spawn(async move {
                            handle_connection(stream, peer, handle, format).await;
                        });
                    }
                    Err(e) => error!(error = %e, "accept failed"),
                }
            }
        }

        Ok(())
    }
}

async fn handle_connection(stream: TcpStream, peer: SocketAddr, handle: BookHandle, format: WireFormat) {
    METRICS.active_connections.inc();
    debug!(%peer, "connection opened");

    let codec = LengthDelimitedCodec::builder()
        .max_frame_length(MAX_FRAME_LEN)
        .new_codec();
    let mut framed = Framed::new(stream, codec);

    while let Some(frame) = framed.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                warn!(%peer, error = %e, "failed to read frame");
                break;
            }
        };

        let reply = match format.decode::<ClientMessage>(&frame) {
            Ok(message) => dispatch(&handle, message).await,
            Err(e) => {
                warn!(%peer, error = %e, "undecodable request");
                error_reply(ErrorCode::InvalidOrder, e.to_string())
            }
        };

        let body = match format.encode(&reply) {
            Ok(body) => body,
            Err(e) => {
                error!(%peer, error = %e, "failed to encode reply");
                break;
            }
        };
        if let Err(e) = framed.send(body).await {
            warn!(%peer, error = %e, "failed to send reply");
            break;
        }
    }

    METRICS.active_connections.dec();
    debug!(%peer, "connection closed");
}

/// Runs one client request against the book and builds its reply.
pub async fn dispatch(handle: &BookHandle, message: ClientMessage) -> ServerMessage {
    let result = match message {
        ClientMessage::AddOrder(request) => handle
            .add_order(request)
            .await
            .map(ServerMessage::OrderAccepted),
        ClientMessage::CancelOrder(request) => handle
            .cancel_order(request.order_id)
            .await
            .map(|()| ServerMessage::OrderCancelled {
                order_id: request.order_id,
            }),
        ClientMessage::AmendOrder(request) => handle
            .amend_order(request)
            .await
            .map(|()| ServerMessage::OrderAmended {
                order_id: request.order_id,
                quantity: request.quantity,
            }),
        ClientMessage::Snapshot(request) => handle
            .snapshot(request.levels as usize)
            .await
            .map(ServerMessage::Snapshot),
    };

    result.unwrap_or_else(|e: ServiceError| error_reply(e.code(), e.to_string()))
}

fn error_reply(code: ErrorCode, message: String) -> ServerMessage {
    ServerMessage::Error(ErrorReply { code, message })
}
