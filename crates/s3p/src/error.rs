//! Client-level errors, layered as the protocol layers them: transport
//! failures, framing failures, and node-reported status codes.

use thiserror::Error;

use s3p_msg::{ErrorCode, PacketType, S3pMsgError};
use s3p_transport::{FrameReadError, TransportError};

/// Everything a transaction can fail with.
#[derive(Error, Debug)]
pub enum Error {
    /// The byte link failed. Fatal to the transaction, no reconnect.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The frame or its payload did not decode.
    #[error("message error: {0}")]
    Msg(#[from] S3pMsgError),

    /// No complete response frame within the configured timeout.
    #[error("response timeout")]
    Timeout,

    /// The operation was cancelled while waiting.
    #[error("operation cancelled")]
    Cancelled,

    /// The response sequence nibble does not match the request's.
    #[error("sequence mismatch: sent {sent:#03x}, received {received:#03x}")]
    SeqMismatch { sent: u8, received: u8 },

    /// The response type is not the request's twin.
    #[error("unexpected response type: expected {expected}, received {received}")]
    UnexpectedResponseType {
        expected: PacketType,
        received: PacketType,
    },

    /// The response payload is missing its status code byte.
    #[error("empty response payload")]
    EmptyResponse,

    /// The node reported a failure for the operation.
    #[error("node error: {0}")]
    Node(ErrorCode),

    /// A node id from the reserved set was configured.
    #[error("reserved node id {id:#04x}")]
    ReservedNodeId { id: u8 },

    /// A single VMEM request larger than the chunk limit.
    #[error("chunk too large: {len} bytes")]
    ChunkTooLarge { len: usize },

    /// The node's table summary cannot anchor a metadata walk.
    #[error("invalid metadata: {reason}")]
    InvalidMetadata { reason: &'static str },

    /// Reading the upload source or writing the download sink failed.
    #[error("bulk I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<FrameReadError> for Error {
    fn from(err: FrameReadError) -> Self {
        match err {
            FrameReadError::Transport(inner) => Error::Transport(inner),
            FrameReadError::Timeout => Error::Timeout,
            FrameReadError::Cancelled => Error::Cancelled,
        }
    }
}

impl Error {
    /// Whether this failure came back from the node rather than from
    /// the link or the codec.
    pub fn is_node_error(&self) -> bool {
        matches!(self, Error::Node(_))
    }
}
