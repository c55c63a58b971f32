use bytes::{BufMut, Bytes, BytesMut};
use std::{
    io,
    marker::PhantomPinned,
    pin::Pin,
    task::{Context, Poll, ready},
};
use tokio::io::AsyncRead;

/// Spare capacity reserved before each read.
const READ_CAPACITY: usize = 8 * 1024;

pin_project_lite::pin_project! {
    /// A future to read the next chunk of bytes from an `AsyncRead`.
    ///
    /// Resolves to [`None`] at the end of stream. Returned chunks are split from
    /// `buf`, so the allocation is reused once every chunk is dropped.
    #[derive(Debug)]
    #[must_use = "futures do nothing unless you `.await` or poll them"]
    pub struct ReadChunk<'a, R: ?Sized> {
        reader: &'a mut R,
        buf: &'a mut BytesMut,
        #[pin]
        _pin: PhantomPinned,
    }
}

impl<'a, R: ?Sized> ReadChunk<'a, R> {
    pub fn new(reader: &'a mut R, buf: &'a mut BytesMut) -> Self {
        buf.reserve(READ_CAPACITY);
        Self { reader, buf, _pin: PhantomPinned }
    }
}

impl<R> Future for ReadChunk<'_, R>
where
    R: AsyncRead + Unpin + ?Sized,
{
    type Output = io::Result<Option<Bytes>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let me = self.project();

        let n = {
            let dst = me.buf.chunk_mut();
            let dst = unsafe { dst.as_uninit_slice_mut() };
            let mut buf = tokio::io::ReadBuf::uninit(dst);
            let ptr = buf.filled().as_ptr();
            ready!(AsyncRead::poll_read(Pin::new(&mut **me.reader), cx, &mut buf)?);

            // Ensure the pointer does not change from under us
            assert_eq!(ptr, buf.filled().as_ptr());
            buf.filled().len()
        };

        if n == 0 {
            return Poll::Ready(Ok(None));
        }

        // Safety: This is guaranteed to be the number of initialized (and read)
        // bytes due to the invariants provided by `ReadBuf::filled`.
        unsafe {
            me.buf.advance_mut(n);
        }

        Poll::Ready(Ok(Some(me.buf.split().freeze())))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn read_chunks() {
        let mut reader = &b"hello"[..];
        let mut buf = BytesMut::new();

        let chunk = ReadChunk::new(&mut reader, &mut buf).await.unwrap();
        assert_eq!(chunk.as_deref(), Some(&b"hello"[..]));
        assert!(buf.is_empty());

        let chunk = ReadChunk::new(&mut reader, &mut buf).await.unwrap();
        assert!(chunk.is_none());
    }
}
