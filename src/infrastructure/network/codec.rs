/// 消息体编解码
///
/// 帧由 `tokio_util::codec::LengthDelimitedCodec` 负责（4字节长度前缀），
/// 这里只处理帧内的消息体：JSON 或 bincode（通过 serde 接口）。

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// 最大帧长度
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// 消息体格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum WireFormat {
    #[default]
    Json,
    Bincode,
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("json codec error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bincode encode error: {0}")]
    BincodeEncode(#[from] bincode::error::EncodeError),

    #[error("bincode decode error: {0}")]
    BincodeDecode(#[from] bincode::error::DecodeError),
}

impl WireFormat {
    pub fn encode<T: Serialize>(self, message: &T) -> Result<Bytes, CodecError> {
        let body = match self {
            WireFormat::Json => serde_json::to_vec(message)?,
            WireFormat::Bincode => {
                bincode::serde::encode_to_vec(message, bincode::config::standard())?
            }
        };
        Ok(Bytes::from(body))
    }

    pub fn decode<T: DeserializeOwned>(self, body: &[u8]) -> Result<T, CodecError> {
        match self {
            WireFormat::Json => Ok(serde_json::from_slice(body)?),
            WireFormat::Bincode => {
                let (message, _len) =
                    bincode::serde::decode_from_slice(body, bincode::config::standard())?;
                Ok(message)
            }
        }
    }
}
