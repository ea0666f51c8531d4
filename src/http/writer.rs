use std::io;
use std::time::{Duration, SystemTime};

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};

use crate::http::date::format_http_date;
use crate::http::response::{Response, StatusCode};
use crate::http::stream::timed;

const HTTP_VERSION: &str = "HTTP/1.1";
const CRLF: &str = "\r\n";

/// Chunk size used when streaming a file body
const BUFFER_SIZE: usize = 8192;

/// Status line, common headers and the given headers, ending with the blank
/// line. The handler headers are written in order and are expected to carry
/// Content-Length last.
fn serialize_head(server_name: &str, status: StatusCode, headers: &[(String, String)]) -> BytesMut {
    let mut head = BytesMut::with_capacity(256);

    // Status line
    head.put_slice(
        format!(
            "{} {} {}{}",
            HTTP_VERSION,
            status.as_u16(),
            status.reason_phrase(),
            CRLF
        )
        .as_bytes(),
    );

    // Common headers
    head.put_slice(format!("Server: {}{}", server_name, CRLF).as_bytes());
    head.put_slice(format!("Date: {}{}", format_http_date(SystemTime::now()), CRLF).as_bytes());
    head.put_slice(format!("Connection: close{}", CRLF).as_bytes());

    for (k, v) in headers {
        head.put_slice(format!("{}: {}{}", k, v, CRLF).as_bytes());
    }

    // Header/body separator
    head.put_slice(CRLF.as_bytes());

    head
}

/// Serializes a complete in-memory response.
pub fn serialize_response(server_name: &str, resp: &Response) -> Bytes {
    let mut buf = serialize_head(server_name, resp.status, &resp.headers);
    buf.put_slice(&resp.body);
    buf.freeze()
}

/// Output half of a connection.
///
/// Every response goes through here so they all share one framing: status
/// line, `Server`/`Date`/`Connection: close`, handler headers, Content-Length,
/// blank line, body. Every write is bounded by the idle timeout.
pub struct ResponseWriter<W> {
    out: BufWriter<W>,
    server_name: String,
    idle_timeout: Duration,
}

impl<W: AsyncWrite + Unpin> ResponseWriter<W> {
    pub fn new(out: W, server_name: impl Into<String>, idle_timeout: Duration) -> Self {
        Self {
            out: BufWriter::new(out),
            server_name: server_name.into(),
            idle_timeout,
        }
    }

    /// Writes a whole response held in memory and flushes it.
    pub async fn send(&mut self, response: &Response) -> io::Result<()> {
        let bytes = serialize_response(&self.server_name, response);
        self.write_all(&bytes).await?;
        self.flush().await
    }

    /// Writes the head for a streamed body of `length` bytes, flushes it,
    /// then copies `prefix` followed by everything `body` yields.
    pub async fn send_stream<R>(
        &mut self,
        status: StatusCode,
        headers: &[(String, String)],
        length: u64,
        prefix: &[u8],
        body: &mut R,
    ) -> io::Result<()>
    where
        R: AsyncRead + Unpin,
    {
        let mut all_headers = headers.to_vec();
        all_headers.push(("Content-Length".to_string(), length.to_string()));

        let head = serialize_head(&self.server_name, status, &all_headers);
        self.write_all(&head).await?;
        self.flush().await?;

        self.write_all(prefix).await?;

        let mut chunk = vec![0u8; BUFFER_SIZE];
        loop {
            let n = body.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            self.write_all(&chunk[..n]).await?;
        }

        self.flush().await
    }

    pub async fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        let idle = self.idle_timeout;
        timed(idle, self.out.write_all(bytes)).await
    }

    pub async fn flush(&mut self) -> io::Result<()> {
        let idle = self.idle_timeout;
        timed(idle, self.out.flush()).await
    }

    /// Flushes anything buffered and closes the write direction.
    pub async fn shutdown(&mut self) -> io::Result<()> {
        let idle = self.idle_timeout;
        timed(idle, self.out.shutdown()).await
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}
