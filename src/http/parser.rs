//! Request-line and header-block scanners.
//!
//! Both work directly on the connection's octet stream and never read past
//! the CRLF that ends what they are looking for, so whatever follows (the
//! body) is left untouched for the handler.

use bytes::{BufMut, BytesMut};
use tokio::io::AsyncRead;

use crate::http::error::HttpError;
use crate::http::stream::ByteReader;

/// Longest request line accepted.
const MAX_REQUEST_LINE: usize = 8 * 1024;

/// Prevent unbounded header growth
const MAX_HEADER_BLOCK: usize = 64 * 1024;

/// Header scanner states: the number of octets of `CR LF CR LF` seen.
const SEEN_NOTHING: u8 = 0;
const SEEN_CR: u8 = 1;
const SEEN_CRLF: u8 = 2;
const SEEN_CRLF_CR: u8 = 3;
const SEEN_CRLF_CRLF: u8 = 4;

/// Reads the request line, returning it without its CRLF.
///
/// A CR must be followed by LF. End of stream before the terminator is a
/// protocol error.
pub async fn read_request_line<R>(reader: &mut ByteReader<R>) -> Result<String, HttpError>
where
    R: AsyncRead + Unpin,
{
    let mut line = BytesMut::with_capacity(64);

    while let Some(byte) = reader.next_byte().await? {
        if byte != b'\r' {
            if line.len() >= MAX_REQUEST_LINE {
                return Err(HttpError::protocol("request line too long"));
            }
            line.put_u8(byte);
            continue;
        }

        return match reader.next_byte().await? {
            Some(b'\n') => Ok(latin1(&line)),
            Some(_) => Err(HttpError::protocol("malformed line terminator")),
            None => Err(HttpError::protocol(
                "connection closed before request line complete",
            )),
        };
    }

    Err(HttpError::protocol(
        "connection closed before request line complete",
    ))
}

/// Reads a header block up to and including the blank line that ends it,
/// returning the text with the final empty line removed.
///
/// The block always follows a line that was just terminated (the request
/// line, or a multipart delimiter line), so scanning starts as if a CRLF had
/// already been seen: a bare CRLF is an empty block.
pub async fn read_header_block<R>(reader: &mut ByteReader<R>) -> Result<String, HttpError>
where
    R: AsyncRead + Unpin,
{
    let mut block = BytesMut::with_capacity(512);
    let mut state = SEEN_CRLF;

    while state != SEEN_CRLF_CRLF {
        let byte = match reader.next_byte().await? {
            Some(b) => b,
            None => {
                return Err(HttpError::protocol(
                    "connection closed before header block complete",
                ));
            }
        };

        state = next_state(state, byte);
        block.put_u8(byte);

        if block.len() > MAX_HEADER_BLOCK {
            return Err(HttpError::protocol("header block too large"));
        }
    }

    let strip = if block.ends_with(b"\r\n\r\n") { 4 } else { 2 };
    block.truncate(block.len() - strip);

    tracing::debug!(header = %latin1(&block), "header block read");

    Ok(latin1(&block))
}

fn next_state(state: u8, byte: u8) -> u8 {
    match (state, byte) {
        (SEEN_CRLF, b'\r') => SEEN_CRLF_CR,
        (_, b'\r') => SEEN_CR,
        (SEEN_CR, b'\n') => SEEN_CRLF,
        (SEEN_CRLF_CR, b'\n') => SEEN_CRLF_CRLF,
        _ => SEEN_NOTHING,
    }
}

/// Header octets are ISO-8859-1: each byte maps to the code point of the
/// same value.
fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
