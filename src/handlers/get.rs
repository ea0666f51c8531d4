//! GET: static files, directory listings and `If-Modified-Since`.

use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tracing::{debug, error, info};

use crate::handlers::{decode_path, link, read_headers, resolve};
use crate::http::date::parse_http_date;
use crate::http::error::HttpError;
use crate::http::headers::HeaderMap;
use crate::http::response::{Response, StatusCode, escape_html};
use crate::http::stream::ByteReader;
use crate::http::writer::ResponseWriter;
use crate::server::ServerContext;

const INDEX_FILE: &str = "index.html";

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

    let root = &ctx.config.static_files.root;
    let entity = if path == "/" {
        root.join(INDEX_FILE)
    } else {
        resolve(root, &path)
    };

    let metadata = match tokio::fs::metadata(&entity).await {
        Ok(m) => m,
        Err(_) => {
            info!(path = %path, "file requested does not exist");
            writer.send(&Response::not_found(&path)).await?;
            return Ok(());
        }
    };

    if metadata.is_dir() {
        return send_listing(writer, &entity, &path).await;
    }

    if !is_modified(writer, &headers, &metadata).await? {
        return Ok(());
    }

    send_file(ctx, writer, &entity, &path, metadata.len()).await
}

/// Applies `If-Modified-Since`. Returns false once a response (304 or 400)
/// has been written.
///
/// 304 is sent only when the client's date is strictly later than the file's
/// modification time.
async fn is_modified<W>(
    writer: &mut ResponseWriter<W>,
    headers: &HeaderMap,
    metadata: &std::fs::Metadata,
) -> Result<bool, HttpError>
where
    W: AsyncWrite + Unpin,
{
    let Some(since) = headers.get("If-Modified-Since") else {
        return Ok(true);
    };

    let Some(client_copy) = parse_http_date(since) else {
        error!(value = since, "could not parse If-Modified-Since");
        writer
            .send(&Response::bad_request(&format!(
                "date value in If-Modified-Since can't be parsed - {}",
                escape_html(since)
            )))
            .await?;
        return Ok(false);
    };

    match metadata.modified() {
        Ok(server_copy) if client_copy > server_copy => {
            debug!("client copy is newer, sending 304");
            writer.send(&Response::not_modified()).await?;
            Ok(false)
        }
        Ok(_) => Ok(true),
        Err(e) => {
            debug!(error = %e, "modification time unavailable, sending the file");
            Ok(true)
        }
    }
}

async fn send_listing<W>(
    writer: &mut ResponseWriter<W>,
    directory: &Path,
    path: &str,
) -> Result<(), HttpError>
where
    W: AsyncWrite + Unpin,
{
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(directory).await?;
    while let Some(entry) = entries.next_entry().await? {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();

    let links: String = names.iter().map(|name| link(path, name)).collect();

    writer
        .send(&Response::ok(&format!(
            "The location you requested is a folder. Please follow links below to browse through the files .. <hr>{}",
            links
        )))
        .await?;
    Ok(())
}

async fn send_file<W>(
    ctx: &ServerContext,
    writer: &mut ResponseWriter<W>,
    file_path: &Path,
    path: &str,
    length: u64,
) -> Result<(), HttpError>
where
    W: AsyncWrite + Unpin,
{
    let mut file = match File::open(file_path).await {
        Ok(f) => f,
        Err(e) => {
            info!(path = %path, error = %e, "file requested could not be opened");
            writer.send(&Response::not_found(path)).await?;
            return Ok(());
        }
    };

    // reading the first byte surfaces "exists but unreadable" before the
    // 200 head is committed
    let mut first = [0u8; 1];
    let read = match file.read(&mut first).await {
        Ok(n) => n,
        Err(e) => {
            info!(path = %path, error = %e, "file requested could not be read");
            writer.send(&Response::not_found(path)).await?;
            return Ok(());
        }
    };

    let mut headers = Vec::new();
    let content_type = file_path
        .file_name()
        .and_then(|name| ctx.mime.lookup(&name.to_string_lossy()).map(str::to_string));
    if let Some(content_type) = content_type {
        headers.push(("Content-Type".to_string(), content_type));
    }

    writer
        .send_stream(StatusCode::Ok, &headers, length, &first[..read], &mut file)
        .await?;

    debug!(path = %path, bytes = length, "file sent");
    Ok(())
}
