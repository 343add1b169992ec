//! Framed stream for async I/O.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures_core::Stream;
use futures_util::{Sink, SinkExt, StreamExt};
use mcbp_protocol::Operation;
use pin_project_lite::pin_project;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;

use crate::error::CodecError;
use crate::frame_codec::{Frame, FrameCodec};

pin_project! {
    /// A framed stream over an async I/O transport.
    ///
    /// Yields complete response frames and accepts encoded request frames.
    pub struct FrameStream<T> {
        #[pin]
        inner: Framed<T, FrameCodec>,
    }
}

impl<T> FrameStream<T>
where
    T: AsyncRead + AsyncWrite,
{
    /// Create a new frame stream over the given transport.
    pub fn new(transport: T) -> Self {
        Self {
            inner: Framed::new(transport, FrameCodec::new()),
        }
    }

    /// Create a new frame stream with a custom codec.
    pub fn with_codec(transport: T, codec: FrameCodec) -> Self {
        Self {
            inner: Framed::new(transport, codec),
        }
    }

    /// Get a reference to the underlying transport.
    pub fn get_ref(&self) -> &T {
        self.inner.get_ref()
    }

    /// Get a reference to the codec.
    pub fn codec(&self) -> &FrameCodec {
        self.inner.codec()
    }

    /// Consume the stream and return the underlying transport.
    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }

    /// Bytes received but not yet assembled into a frame.
    pub fn read_buffer(&self) -> &BytesMut {
        self.inner.read_buffer()
    }
}

impl<T> FrameStream<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Send one operation and feed its response back into it.
    ///
    /// The operation's attempt counter is incremented before sending. A
    /// response whose opaque differs from the request is an error; the
    /// operation is left without a response in that case.
    pub async fn round_trip<O>(&mut self, op: &mut O) -> Result<(), CodecError>
    where
        O: Operation + ?Sized,
    {
        let request = op.write()?;
        let expected = op.common().opaque;
        op.common_mut().attempts += 1;

        self.send(request).await?;
        let frame = self.next().await.ok_or(CodecError::ConnectionClosed)??;
        if frame.opaque() != expected {
            tracing::warn!(
                expected,
                actual = frame.opaque(),
                "response does not match request"
            );
            return Err(CodecError::OpaqueMismatch {
                expected,
                actual: frame.opaque(),
            });
        }

        op.read(frame.raw);
        Ok(())
    }
}

impl<T> Stream for FrameStream<T>
where
    T: AsyncRead + Unpin,
{
    type Item = Result<Frame, CodecError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().inner.poll_next(cx)
    }
}

impl<T> Sink<Bytes> for FrameStream<T>
where
    T: AsyncWrite + Unpin,
{
    type Error = CodecError;

    fn poll_ready(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.project().inner.poll_ready(cx)
    }

    fn start_send(self: Pin<&mut Self>, item: Bytes) -> Result<(), Self::Error> {
        self.project().inner.start_send(item)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.project().inner.poll_flush(cx)
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.project().inner.poll_close(cx)
    }
}

impl<T> std::fmt::Debug for FrameStream<T>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameStream")
            .field("transport", self.inner.get_ref())
            .field("codec", self.inner.codec())
            .finish()
    }
}
