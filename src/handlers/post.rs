//! POST: opaque bodies are drained and acknowledged, multipart bodies are
//! stored as files.

use std::path::PathBuf;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{error, info, trace};

use crate::handlers::multipart::{MultipartDecoder, MultipartOutcome};
use crate::handlers::{decode_path, link, normalize, read_headers, resolve};
use crate::http::error::HttpError;
use crate::http::headers::HeaderMap;
use crate::http::response::{Response, StatusCode};
use crate::http::stream::ByteReader;
use crate::http::writer::ResponseWriter;
use crate::server::ServerContext;

const CONTENT_LENGTH: &str = "Content-Length";
const BOUNDARY_PARAMETER: &str = "boundary";
const MULTIPART_MEDIA_TYPE: &str = "multipart";

/// Body chunk size when draining an opaque body
const DRAIN_CHUNK: usize = 1024;

/// Where the files of a multipart request go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    /// URL path of the directory, used to build links to stored files
    pub relative_path: String,
    pub directory: PathBuf,
}

/// How the body is to be read, as declared by the request headers.
#[derive(Debug, PartialEq, Eq)]
pub enum BodyKind {
    Opaque { length: u64 },
    Multipart { length: u64, boundary: String },
}

pub async fn handle<R, W>(
    ctx: &ServerContext,
    reader: &mut ByteReader<R>,
    writer: &mut ResponseWriter<W>,
    raw_path: &str,
) -> Result<(), HttpError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let headers = read_headers(reader).await?;

    let Some(path) = decode_path(raw_path) else {
        error!(path = raw_path, "request uri could not be decoded");
        writer
            .send(&Response::internal_error(
                "url could not be decoded .. thats all we know",
            ))
            .await?;
        return Ok(());
    };

    let kind = match classify_body(&headers) {
        Ok(kind) => kind,
        Err(reason) => {
            error!(reason = %reason, "rejecting POST request");
            writer.send(&Response::bad_request(&reason)).await?;
            return Ok(());
        }
    };

    match kind {
        BodyKind::Opaque { length } => drain_opaque_body(reader, writer, length).await,
        BodyKind::Multipart { boundary, .. } => {
            let Some(target) = resolve_upload_target(ctx, &path).await else {
                info!(path = %path, "upload location could not be created");
                writer
                    .send(&Response::html(
                        StatusCode::NotFound,
                        "neither the location requested nor default location is available for upload of files<hr>",
                    ))
                    .await?;
                return Ok(());
            };

            let marker = format!("--{}", boundary);
            let outcome = MultipartDecoder::new(reader, &marker, &target.directory)
                .decode()
                .await?;

            match outcome {
                MultipartOutcome::Completed(files) => {
                    send_created(writer, &files, &target.relative_path).await
                }
                MultipartOutcome::Rejected(reason) => {
                    writer.send(&Response::bad_request(&reason)).await?;
                    Ok(())
                }
            }
        }
    }
}

/// Reads `Content-Length` and `Content-Type`. The error is the explanation
/// for a 400 response.
pub fn classify_body(headers: &HeaderMap) -> Result<BodyKind, String> {
    let length = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.parse::<u64>().ok())
        .ok_or_else(|| format!("{} should be properly set", CONTENT_LENGTH))?;

    let Some(content_type) = headers.get("Content-Type") else {
        return Ok(BodyKind::Opaque { length });
    };

    let mut segments = content_type.split(';');
    let media_type = segments.next().unwrap_or_default();
    let primary = media_type.split('/').next().unwrap_or_default().trim();

    if !primary.eq_ignore_ascii_case(MULTIPART_MEDIA_TYPE) {
        return Ok(BodyKind::Opaque { length });
    }

    let boundary = segments
        .filter_map(|p| p.trim().strip_prefix(BOUNDARY_PARAMETER)?.strip_prefix('='))
        .map(unquote)
        .filter(|b| !b.is_empty())
        .last();

    match boundary {
        Some(boundary) => Ok(BodyKind::Multipart {
            length,
            boundary: boundary.to_string(),
        }),
        None => Err(
            "boundary parameter not available in multipart post request".to_string(),
        ),
    }
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// Picks the directory the request path names (creating it), falling back
/// to the configured default upload directory.
pub async fn resolve_upload_target(ctx: &ServerContext, path: &str) -> Option<UploadTarget> {
    let statics = &ctx.config.static_files;

    if !path.is_empty() && path != "/" {
        let directory = resolve(&statics.root, path);
        if usable_directory(&directory).await {
            return Some(UploadTarget {
                relative_path: normalize(path),
                directory,
            });
        }
        error!(path = %path, "upload directory from request uri is not usable");
    }

    let directory = statics.upload_path();
    if usable_directory(&directory).await {
        return Some(UploadTarget {
            relative_path: statics.upload_url(),
            directory,
        });
    }
    error!(dir = %directory.display(), "default upload directory is not usable");

    None
}

async fn usable_directory(directory: &std::path::Path) -> bool {
    if let Ok(m) = tokio::fs::metadata(directory).await {
        return m.is_dir();
    }
    tokio::fs::create_dir_all(directory).await.is_ok()
}

/// Reads and logs exactly `length` body bytes, then acknowledges them.
async fn drain_opaque_body<R, W>(
    reader: &mut ByteReader<R>,
    writer: &mut ResponseWriter<W>,
    length: u64,
) -> Result<(), HttpError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut remaining = length;

    while remaining > 0 {
        let chunk = reader.fill().await?;
        if chunk.is_empty() {
            return Err(HttpError::protocol(
                "connection closed before request body complete",
            ));
        }

        let n = chunk
            .len()
            .min(DRAIN_CHUNK)
            .min(usize::try_from(remaining).unwrap_or(usize::MAX));
        trace!(body = %String::from_utf8_lossy(&chunk[..n]), "POST data");
        reader.consume(n);
        remaining -= n as u64;
    }

    writer
        .send(&Response::ok("request received and analysed successfully<hr>"))
        .await?;
    Ok(())
}

async fn send_created<W>(
    writer: &mut ResponseWriter<W>,
    files: &[String],
    relative_path: &str,
) -> Result<(), HttpError>
where
    W: AsyncWrite + Unpin,
{
    let links: String = files.iter().map(|name| link(relative_path, name)).collect();

    writer
        .send(&Response::html(
            StatusCode::Created,
            &format!(
                "your data has been uploaded to the server. please follow the below links to check uploaded data<hr>{}",
                links
            ),
        ))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.append(*k, *v);
        }
        map
    }

    #[test]
    fn content_length_is_required() {
        assert!(classify_body(&headers(&[])).is_err());
        assert!(classify_body(&headers(&[("Content-Length", "-1")])).is_err());
        assert!(classify_body(&headers(&[("Content-Length", "ten")])).is_err());
        assert_eq!(
            classify_body(&headers(&[("Content-Length", "10")])),
            Ok(BodyKind::Opaque { length: 10 })
        );
    }

    #[test]
    fn multipart_needs_a_boundary() {
        let quoted = headers(&[
            ("Content-Length", "100"),
            ("Content-Type", "Multipart/form-data; boundary=\"AaB03x\""),
        ]);
        assert_eq!(
            classify_body(&quoted),
            Ok(BodyKind::Multipart {
                length: 100,
                boundary: "AaB03x".to_string()
            })
        );

        let missing = headers(&[
            ("Content-Length", "100"),
            ("Content-Type", "multipart/form-data; charset=utf-8"),
        ]);
        assert!(classify_body(&missing).is_err());

        let text = headers(&[("Content-Length", "3"), ("Content-Type", "text/plain")]);
        assert_eq!(classify_body(&text), Ok(BodyKind::Opaque { length: 3 }));
    }
}
