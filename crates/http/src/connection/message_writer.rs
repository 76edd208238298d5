use std::fmt;
use std::time::Duration;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tokio_util::codec::Encoder;

use crate::codec::ResponseEncoder;
use crate::protocol::{Message, PayloadSize, ResponseHead, SendError};

/// The write half of a connection, type-erased so a [`Response`](crate::response::Response)
/// does not carry the transport type.
pub type BoxWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Encodes response messages into a buffer and pushes it to the transport.
///
/// Every transport write is bounded by the write timeout, re-armed per call.
pub struct MessageWriter {
    writer: BoxWriter,
    buffer: BytesMut,
    encoder: ResponseEncoder,
    write_timeout: Duration,
}

impl fmt::Debug for MessageWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageWriter")
            .field("buffered", &self.buffer.len())
            .field("encoder", &self.encoder)
            .field("write_timeout", &self.write_timeout)
            .finish_non_exhaustive()
    }
}

impl MessageWriter {
    pub fn with_capacity<W>(writer: W, buffer_size: usize, write_timeout: Duration) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            writer: Box::new(writer),
            buffer: BytesMut::with_capacity(buffer_size),
            encoder: ResponseEncoder::new(),
            write_timeout,
        }
    }

    /// Drops anything buffered and forgets a partially encoded response.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.encoder = ResponseEncoder::new();
    }

    #[inline]
    pub fn write<D>(&mut self, item: Message<(ResponseHead, PayloadSize), D>) -> Result<(), SendError>
    where
        D: Buf,
    {
        self.encoder.encode(item, &mut self.buffer)
    }

    /// Hands the buffered bytes to the transport without flushing it.
    pub async fn send(&mut self) -> Result<(), SendError> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let write_timeout = self.write_timeout;
        timeout(write_timeout, self.writer.write_all(&self.buffer)).await.map_err(|_| SendError::Timeout(write_timeout))??;
        self.buffer.clear();
        Ok(())
    }

    /// Sends the buffered bytes and flushes the transport.
    pub async fn flush(&mut self) -> Result<(), SendError> {
        self.send().await?;

        let write_timeout = self.write_timeout;
        timeout(write_timeout, self.writer.flush()).await.map_err(|_| SendError::Timeout(write_timeout))??;
        Ok(())
    }
}
