use super::error::ProtocolError;
use super::message::{CacheMessage, MessageTag};
use crate::constants::{
    FRAME_HEADER_LEN, MAX_FRAME_BODY, READ_BUFFER_SIZE, READ_TIMEOUT, WRITE_TIMEOUT,
};
use bytes::BytesMut;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

/// Reads and writes framed cache messages over an async byte stream.
///
/// Generic over the stream so it can sit on a TCP socket, a TLS stream or
/// one half of a `tokio::io::duplex` pair in tests.
pub struct CacheTransport<S> {
    stream: S,
    read_buf: BytesMut,
    max_frame_body: usize,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl<S> CacheTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            read_buf: BytesMut::with_capacity(READ_BUFFER_SIZE),
            max_frame_body: MAX_FRAME_BODY,
            read_timeout: READ_TIMEOUT,
            write_timeout: WRITE_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, read: Duration, write: Duration) -> Self {
        self.read_timeout = read;
        self.write_timeout = write;
        self
    }

    pub fn with_max_frame_body(mut self, max: usize) -> Self {
        self.max_frame_body = max;
        self
    }

    pub async fn send_message(&mut self, message: &CacheMessage) -> Result<(), ProtocolError> {
        let data = message.encode()?;
        timeout(self.write_timeout, self.stream.write_all(&data))
            .await
            .map_err(|_| ProtocolError::Timeout)??;
        Ok(())
    }

    /// Writes several messages with a single buffered write, preserving order.
    pub async fn send_batch(&mut self, messages: &[CacheMessage]) -> Result<(), ProtocolError> {
        if messages.is_empty() {
            return Ok(());
        }
        let total = messages.iter().map(CacheMessage::encoded_len).sum();
        let mut buf = BytesMut::with_capacity(total);
        for message in messages {
            message.encode_into(&mut buf)?;
        }
        timeout(self.write_timeout, self.stream.write_all(&buf))
            .await
            .map_err(|_| ProtocolError::Timeout)??;
        Ok(())
    }

    pub async fn flush(&mut self) -> Result<(), ProtocolError> {
        timeout(self.write_timeout, self.stream.flush())
            .await
            .map_err(|_| ProtocolError::Timeout)??;
        Ok(())
    }

    pub async fn receive_message(&mut self) -> Result<CacheMessage, ProtocolError> {
        self.fill_to(FRAME_HEADER_LEN).await?;

        // Reject unknown tags before waiting on a body that may never come.
        MessageTag::try_from(self.read_buf[0])?;
        let length = u32::from_be_bytes([
            self.read_buf[1],
            self.read_buf[2],
            self.read_buf[3],
            self.read_buf[4],
        ]) as usize;

        if length > self.max_frame_body {
            return Err(ProtocolError::MessageTooLarge(length));
        }

        let total_len = FRAME_HEADER_LEN + length;
        self.fill_to(total_len).await?;

        let data = self.read_buf.split_to(total_len);
        CacheMessage::decode(data.freeze())
    }

    async fn fill_to(&mut self, len: usize) -> Result<(), ProtocolError> {
        while self.read_buf.len() < len {
            let n = timeout(self.read_timeout, self.stream.read_buf(&mut self.read_buf))
                .await
                .map_err(|_| ProtocolError::Timeout)??;

            if n == 0 {
                return Err(ProtocolError::ConnectionClosed);
            }
        }
        Ok(())
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}
