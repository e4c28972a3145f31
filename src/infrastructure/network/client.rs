/// 订单客户端
///
/// 与 `OrderServer` 一问一答的最小客户端，供压测工具和集成测试使用。

use super::codec::{CodecError, WireFormat, MAX_FRAME_LEN};
use crate::shared::protocol::{ClientMessage, ServerMessage};
use futures::{SinkExt, StreamExt};
use std::io;
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_util::codec::{Framed, LengthDelimitedCodec};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("connection closed by server")]
    Closed,
}

pub struct OrderClient {
    framed: Framed<TcpStream, LengthDelimitedCodec>,
    format: WireFormat,
}

impl OrderClient {
    pub async fn connect(addr: impl ToSocketAddrs, format: WireFormat) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        let codec = LengthDelimitedCodec::builder()
            .max_frame_length(MAX_FRAME_LEN)
            .new_codec();
        Ok(Self {
            framed: Framed::new(stream, codec),
            format,
        })
    }

    /// Sends one request and waits for its reply.
    pub async fn request(&mut self, message: &ClientMessage) -> Result<ServerMessage, ClientError> {
        let body = self.format.encode(message)?;
        self.send_raw(body).await
    }

    /// Sends an arbitrary frame body and waits for the reply.
    pub async fn send_raw(&mut self, body: bytes::Bytes) -> Result<ServerMessage, ClientError> {
        self.framed.send(body).await?;
        match self.framed.next().await {
            Some(frame) => Ok(self.format.decode(&frame?)?),
            None => Err(ClientError::Closed),
        }
    }
}
