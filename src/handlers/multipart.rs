//! Decoding of `multipart/*` bodies straight to disk.
//!
//! Parts are never held in memory: bytes go from the connection into the
//! destination file while a [`BoundaryScanner`] watches for the delimiter.
//! The delimiter itself ends up at the tail of the file and is cut off
//! afterwards.

use std::path::Path;

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncRead, AsyncWriteExt, BufWriter};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::http::boundary::BoundaryScanner;
use crate::http::error::HttpError;
use crate::http::headers::{HeaderMap, parse_parameters};
use crate::http::parser::read_header_block;
use crate::http::stream::ByteReader;

/// Highest index tried when disambiguating a file name.
pub const MAX_DUPLICATE_INDEX: u32 = 1024;

/// Result of decoding a whole multipart body.
#[derive(Debug, PartialEq, Eq)]
pub enum MultipartOutcome {
    /// The closing delimiter was reached; names of the files stored, in
    /// body order.
    Completed(Vec<String>),
    /// A part header made the request unacceptable; the reason is meant for
    /// a 400 response. The rest of the body is left unread.
    Rejected(String),
}

/// What happened to one part.
#[derive(Debug, PartialEq, Eq)]
enum PartOutcome {
    Stored(String),
    /// Not stored, body consumed; decoding continues.
    Skipped,
}

/// What a part's `Content-Disposition` asks for.
#[derive(Debug, PartialEq, Eq)]
pub enum PartDisposition {
    /// Store the body under this (directory-free) name.
    File(String),
    /// No usable file name: consume the body and move on.
    Ignore,
    /// Reject the whole request.
    Invalid(String),
}

pub struct MultipartDecoder<'a, R> {
    reader: &'a mut ByteReader<R>,
    /// `--boundary`, used to find the first delimiter
    opening: BoundaryScanner,
    /// `CRLF--boundary`, which ends every part body
    closing: BoundaryScanner,
    directory: &'a Path,
}

impl<'a, R> MultipartDecoder<'a, R>
where
    R: AsyncRead + Unpin,
{
    /// `marker` is the delimiter as it appears in the body: `"--" + boundary`.
    pub fn new(reader: &'a mut ByteReader<R>, marker: &str, directory: &'a Path) -> Self {
        let mut closing = b"\r\n".to_vec();
        closing.extend_from_slice(marker.as_bytes());

        Self {
            reader,
            opening: BoundaryScanner::new(marker.as_bytes()),
            closing: BoundaryScanner::new(closing),
            directory,
        }
    }

    /// Stores every named part in the target directory.
    ///
    /// End of stream anywhere before the closing delimiter is a protocol
    /// error.
    pub async fn decode(mut self) -> Result<MultipartOutcome, HttpError> {
        // preamble
        self.skip_part(true).await?;

        let mut uploaded = Vec::new();

        loop {
            let first = self.expect_byte().await?;
            let second = self.expect_byte().await?;
            if first == b'-' && second == b'-' {
                return Ok(MultipartOutcome::Completed(uploaded));
            }

            // the two bytes were the CRLF ending the delimiter line
            let block = read_header_block(self.reader).await?;
            let headers = HeaderMap::parse(&block);

            match part_disposition(&headers) {
                PartDisposition::Invalid(reason) => {
                    error!(reason = %reason, "rejecting multipart request");
                    return Ok(MultipartOutcome::Rejected(reason));
                }
                PartDisposition::Ignore => {
                    self.skip_part(false).await?;
                }
                PartDisposition::File(name) => {
                    if let PartOutcome::Stored(name) = self.store_part(&name).await? {
                        uploaded.push(name);
                    }
                }
            }
        }
    }

    async fn expect_byte(&mut self) -> Result<u8, HttpError> {
        self.reader
            .next_byte()
            .await?
            .ok_or_else(|| HttpError::protocol("wrong Multipart body format"))
    }

    /// Discards input up to and including the next delimiter.
    async fn skip_part(&mut self, preamble: bool) -> Result<(), HttpError> {
        let scanner = if preamble {
            &mut self.opening
        } else {
            &mut self.closing
        };
        scanner.reset();

        loop {
            let chunk = self.reader.fill().await?;
            if chunk.is_empty() {
                return Err(HttpError::protocol("wrong Multipart body format"));
            }
            match scanner.find(chunk) {
                Some(n) => {
                    self.reader.consume(n);
                    return Ok(());
                }
                None => {
                    let n = chunk.len();
                    self.reader.consume(n);
                }
            }
        }
    }

    async fn store_part(&mut self, suggested: &str) -> Result<PartOutcome, HttpError> {
        let name = match unique_file_name(self.directory, suggested).await {
            Some(name) => name,
            None => uuid_file_name(suggested),
        };
        let path = self.directory.join(&name);

        info!(file = %name, "file is being uploaded");

        let file = match File::create(&path).await {
            Ok(f) => f,
            Err(e) => {
                error!(file = %path.display(), error = %e, "file can't be created");
                self.skip_part(false).await?;
                return Ok(PartOutcome::Skipped);
            }
        };

        let mut out = BufWriter::new(file);
        let written = match self.copy_until_delimiter(&mut out).await {
            Ok(written) => written,
            Err(e) => {
                drop(out);
                if let Err(rm) = tokio::fs::remove_file(&path).await {
                    warn!(file = %path.display(), error = %rm, "partial upload not removed");
                }
                return Err(e);
            }
        };

        let flushed = match out.flush().await {
            Ok(()) => written,
            Err(e) => {
                error!(file = %path.display(), error = %e, "file written but could not flush");
                false
            }
        };
        drop(out);

        if !flushed {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                warn!(file = %path.display(), error = %e, "incomplete upload not removed");
            }
            return Ok(PartOutcome::Skipped);
        }

        if let Err(e) = strip_delimiter(&path, self.closing.len() as u64).await {
            error!(
                file = %path.display(),
                error = %e,
                "file uploaded but the multipart delimiter could not be removed"
            );
            return Ok(PartOutcome::Skipped);
        }

        info!(file = %path.display(), "file created successfully");
        Ok(PartOutcome::Stored(name))
    }

    /// Streams the part body (delimiter included) into `out`.
    ///
    /// Returns whether every byte reached `out`. A failing write does not
    /// stop the copy: input is still consumed up to the delimiter so the
    /// next part starts in the right place.
    async fn copy_until_delimiter(
        &mut self,
        out: &mut BufWriter<File>,
    ) -> Result<bool, HttpError> {
        self.closing.reset();
        let mut sink_ok = true;

        loop {
            let chunk = self.reader.fill().await?;
            if chunk.is_empty() {
                return Err(HttpError::protocol("wrong Multipart body format"));
            }

            let found = self.closing.find(chunk);
            let n = found.unwrap_or(chunk.len());

            if sink_ok {
                if let Err(e) = out.write_all(&chunk[..n]).await {
                    error!(error = %e, "upload write failed, discarding the rest of the part");
                    sink_ok = false;
                }
            }

            self.reader.consume(n);
            if found.is_some() {
                return Ok(sink_ok);
            }
        }
    }
}

/// Reads the file name a part should be stored under.
///
/// A missing `Content-Disposition` or an unquoted `filename` is invalid. No
/// `filename` parameter, or one that is empty once quotes and directories
/// are removed, means the part is ignored.
pub fn part_disposition(headers: &HeaderMap) -> PartDisposition {
    let Some(disposition) = headers.get("Content-Disposition") else {
        return PartDisposition::Invalid(
            "Content-Disposition not available in multipart body".to_string(),
        );
    };

    let params = parse_parameters(disposition);
    let Some(raw) = params.get("filename") else {
        return PartDisposition::Ignore;
    };

    let quoted = raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"');
    if !quoted {
        return PartDisposition::Invalid("filename should be quoted".to_string());
    }

    let unquoted = &raw[1..raw.len() - 1];
    // browsers may send a full client-side path
    let name = unquoted.rsplit(['/', '\\']).next().unwrap_or_default();

    if name.is_empty() || name == "." || name == ".." {
        PartDisposition::Ignore
    } else {
        PartDisposition::File(name.to_string())
    }
}

/// A name for `suggestion` not yet taken in `directory`: the name itself, or
/// `base (n).ext` for the first free n in 2..=1024.
///
/// `None` if the directory cannot be read, the name is taken by a
/// directory, or every index is used. Not atomic against concurrent uploads.
pub async fn unique_file_name(directory: &Path, suggestion: &str) -> Option<String> {
    let is_dir = tokio::fs::metadata(directory)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);
    if !is_dir {
        return None;
    }

    let candidate = directory.join(suggestion);
    match tokio::fs::metadata(&candidate).await {
        Ok(m) if m.is_dir() => return None,
        Ok(_) => {}
        Err(_) => return Some(suggestion.to_string()),
    }

    let (base, extension) = split_extension(suggestion);
    for index in 2..=MAX_DUPLICATE_INDEX {
        let name = match extension {
            Some(ext) => format!("{} ({}).{}", base, index, ext),
            None => format!("{} ({})", base, index),
        };
        if !tokio::fs::try_exists(directory.join(&name))
            .await
            .unwrap_or(true)
        {
            return Some(name);
        }
    }

    None
}

/// Fallback name: a random UUID joined to the suggested name.
pub fn uuid_file_name(suggestion: &str) -> String {
    if suggestion.is_empty() {
        Uuid::new_v4().to_string()
    } else {
        format!("{}__{}", Uuid::new_v4(), suggestion)
    }
}

/// `report.final.pdf` -> (`report.final`, `pdf`). The extension is a
/// trailing run of word characters after the last dot.
fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((base, ext))
            if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') =>
        {
            (base, Some(ext))
        }
        _ => (name, None),
    }
}

async fn strip_delimiter(path: &Path, delimiter_len: u64) -> std::io::Result<()> {
    let file = OpenOptions::new().write(true).open(path).await?;
    let len = file.metadata().await?.len();
    file.set_len(len.saturating_sub(delimiter_len)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disposition(value: &str) -> PartDisposition {
        let mut headers = HeaderMap::new();
        headers.append("Content-Disposition", value);
        part_disposition(&headers)
    }

    #[test]
    fn quoted_file_names_are_accepted() {
        assert_eq!(
            disposition("form-data; name=\"f\"; filename=\"a.txt\""),
            PartDisposition::File("a.txt".to_string())
        );
        assert_eq!(
            disposition("form-data; name=\"f\"; filename=\"C:\\docs\\b.pdf\""),
            PartDisposition::File("b.pdf".to_string())
        );
    }

    #[test]
    fn unusable_file_names() {
        assert_eq!(disposition("form-data; name=\"comment\""), PartDisposition::Ignore);
        assert_eq!(disposition("form-data; filename=\"\""), PartDisposition::Ignore);
        assert_eq!(disposition("form-data; filename=\"dir/\""), PartDisposition::Ignore);
        assert_eq!(
            disposition("form-data; filename=a.txt"),
            PartDisposition::Invalid("filename should be quoted".to_string())
        );
        assert!(matches!(
            part_disposition(&HeaderMap::new()),
            PartDisposition::Invalid(_)
        ));
    }

    #[test]
    fn extensions() {
        assert_eq!(split_extension("a.txt"), ("a", Some("txt")));
        assert_eq!(split_extension("a.tar.gz"), ("a.tar", Some("gz")));
        assert_eq!(split_extension("README"), ("README", None));
        assert_eq!(split_extension("odd.ext-1"), ("odd.ext-1", None));
    }

    #[tokio::test]
    async fn disambiguates_taken_names() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(unique_file_name(dir.path(), "a.txt").await.as_deref(), Some("a.txt"));

        std::fs::write(dir.path().join("a.txt"), b"1").unwrap();
        std::fs::write(dir.path().join("a (2).txt"), b"2").unwrap();
        assert_eq!(
            unique_file_name(dir.path(), "a.txt").await.as_deref(),
            Some("a (3).txt")
        );
    }

    #[tokio::test]
    async fn missing_directory_has_no_unique_name() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert_eq!(unique_file_name(&missing, "a.txt").await, None);
        assert!(uuid_file_name("a.txt").ends_with("__a.txt"));
    }
}
