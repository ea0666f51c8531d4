//! Buffered, idle-timed access to the request side of a connection.

use std::future::Future;
use std::io;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Default buffer size for socket reads
const BUFFER_SIZE: usize = 8192;

/// Runs an I/O future, turning an expired idle timeout into `TimedOut`.
pub async fn timed<T, F>(idle: Duration, fut: F) -> io::Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    match tokio::time::timeout(idle, fut).await {
        Ok(res) => res,
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("connection idle for more than {:?}", idle),
        )),
    }
}

/// Byte-oriented reader over the input half of a connection.
///
/// Protocol scanners pull one octet at a time; the body copiers work on
/// whatever is buffered. Only reads that actually wait on the peer are
/// subject to the idle timeout.
pub struct ByteReader<R> {
    inner: BufReader<R>,
    idle_timeout: Duration,
}

impl<R: AsyncRead + Unpin> ByteReader<R> {
    pub fn new(inner: R, idle_timeout: Duration) -> Self {
        Self {
            inner: BufReader::with_capacity(BUFFER_SIZE, inner),
            idle_timeout,
        }
    }

    /// Returns the buffered bytes, reading from the peer if none are left.
    /// An empty slice means end of stream.
    pub async fn fill(&mut self) -> io::Result<&[u8]> {
        if self.inner.buffer().is_empty() {
            let idle = self.idle_timeout;
            timed(idle, self.inner.fill_buf()).await?;
        }
        Ok(self.inner.buffer())
    }

    /// Marks `n` buffered bytes as read.
    pub fn consume(&mut self, n: usize) {
        self.inner.consume(n);
    }

    /// Reads one octet, `None` at end of stream.
    pub async fn next_byte(&mut self) -> io::Result<Option<u8>> {
        let byte = match self.fill().await?.first() {
            Some(b) => *b,
            None => return Ok(None),
        };
        self.consume(1);
        Ok(Some(byte))
    }

    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }
}
