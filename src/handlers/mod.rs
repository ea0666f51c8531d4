//! Method handlers.
//!
//! Each handler reads the rest of the request (header block, body) from the
//! connection and writes a complete response itself. Only protocol and
//! transport failures are returned to the connection.

pub mod get;
pub mod multipart;
pub mod post;

use std::path::{Path, PathBuf};

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use tokio::io::AsyncRead;

use crate::http::error::HttpError;
use crate::http::headers::HeaderMap;
use crate::http::parser::read_header_block;
use crate::http::request::Method;
use crate::http::response::escape_html;
use crate::http::stream::ByteReader;

/// Characters escaped when a file name is put into a link.
const HREF_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Which handler a request goes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Get,
    Post,
    Unsupported(String),
}

impl Route {
    pub fn for_method(method: &Method) -> Self {
        match method {
            Method::GET => Route::Get,
            Method::POST => Route::Post,
            Method::Other(token) => Route::Unsupported(token.clone()),
        }
    }
}

pub(crate) async fn read_headers<R>(reader: &mut ByteReader<R>) -> Result<HeaderMap, HttpError>
where
    R: AsyncRead + Unpin,
{
    let block = read_header_block(reader).await?;
    Ok(HeaderMap::parse(&block))
}

/// Percent-decodes a request path; `None` if the result is not UTF-8.
pub(crate) fn decode_path(raw: &str) -> Option<String> {
    percent_decode_str(raw)
        .decode_utf8()
        .ok()
        .map(|p| p.into_owned())
}

/// Segments of a decoded URL path that name something on disk: empty, `.`
/// and `..` segments are dropped.
fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/')
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
}

/// Maps a decoded URL path onto the filesystem below `root`. The result
/// never leaves `root`.
pub(crate) fn resolve(root: &Path, path: &str) -> PathBuf {
    segments(path).fold(root.to_path_buf(), |acc, segment| acc.join(segment))
}

/// The decoded URL path of whatever `resolve` maps `path` to.
pub(crate) fn normalize(path: &str) -> String {
    let segments: Vec<&str> = segments(path).collect();
    format!("/{}", segments.join("/"))
}

/// `<a href="base/name">name</a></BR>`, every href segment percent-encoded.
pub(crate) fn link(base: &str, name: &str) -> String {
    let href: String = segments(base)
        .chain(std::iter::once(name))
        .map(|segment| format!("/{}", utf8_percent_encode(segment, HREF_ESCAPE)))
        .collect();
    format!(
        "<a href=\"{}\">{}</a></BR>",
        escape_html(&href),
        escape_html(name)
    )
}
