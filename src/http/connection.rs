use std::fmt::Display;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tracing::{error, info, trace, warn};

use crate::handlers::{self, Route};
use crate::http::error::HttpError;
use crate::http::parser::read_request_line;
use crate::http::request::RequestLine;
use crate::http::response::{Response, escape_html};
use crate::http::stream::ByteReader;
use crate::http::writer::ResponseWriter;
use crate::server::ServerContext;

/// One accepted connection, from request line to close.
///
/// Every connection carries exactly one request; whatever happens, the
/// streams are flushed and closed before `run` returns.
pub struct Connection<S> {
    reader: ByteReader<ReadHalf<S>>,
    writer: ResponseWriter<WriteHalf<S>>,
    peer: String,
    ctx: Arc<ServerContext>,
}

pub enum ConnectionState {
    ReadingRequestLine,
    Routing(RequestLine, String),
    HandlingMethod(Route, String),
    Cleanup,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite,
{
    pub fn new(stream: S, peer: impl Display, ctx: Arc<ServerContext>) -> Self {
        let idle = ctx.idle_timeout();
        let (read_half, write_half) = tokio::io::split(stream);

        Self {
            reader: ByteReader::new(read_half, idle),
            writer: ResponseWriter::new(write_half, ctx.config.server.server_name.clone(), idle),
            peer: peer.to_string(),
            ctx,
        }
    }

    pub async fn run(mut self) {
        let mut state = ConnectionState::ReadingRequestLine;

        loop {
            state = match state {
                ConnectionState::ReadingRequestLine => match self.read_request().await {
                    Ok((line, path)) => ConnectionState::Routing(line, path),
                    Err(e) => {
                        self.fail(e).await;
                        ConnectionState::Cleanup
                    }
                },

                ConnectionState::Routing(line, path) => {
                    info!(peer = %self.peer, method = line.method.as_str(), path = %path, "request");
                    ConnectionState::HandlingMethod(Route::for_method(&line.method), path)
                }

                ConnectionState::HandlingMethod(route, path) => {
                    if let Err(e) = self.dispatch(route, &path).await {
                        self.fail(e).await;
                    }
                    ConnectionState::Cleanup
                }

                ConnectionState::Cleanup => break,
            };
        }

        self.cleanup().await;
    }

    async fn read_request(&mut self) -> Result<(RequestLine, String), HttpError> {
        let raw = read_request_line(&mut self.reader).await?;
        trace!(peer = %self.peer, line = %raw, "request line");

        let line = RequestLine::parse(&raw)?;
        let path = line.path()?;
        Ok((line, path))
    }

    async fn dispatch(&mut self, route: Route, path: &str) -> Result<(), HttpError> {
        let ctx = Arc::clone(&self.ctx);

        match route {
            Route::Get => handlers::get::handle(&ctx, &mut self.reader, &mut self.writer, path).await,
            Route::Post => handlers::post::handle(&ctx, &mut self.reader, &mut self.writer, path).await,
            Route::Unsupported(method) => {
                info!(peer = %self.peer, method = %method, "method not allowed");
                self.writer.send(&Response::method_not_allowed()).await?;
                Ok(())
            }
        }
    }

    /// Protocol errors get a best-effort 400; transport errors end the
    /// connection without another write.
    async fn fail(&mut self, e: HttpError) {
        match e {
            HttpError::Protocol(reason) => {
                warn!(peer = %self.peer, reason = %reason, "illegal request, sending 400");
                let response = Response::bad_request(&escape_html(&reason));
                if let Err(e) = self.writer.send(&response).await {
                    error!(peer = %self.peer, error = %e, "error in read/write of connection");
                }
            }
            HttpError::Io(e) => {
                error!(peer = %self.peer, error = %e, "error in read/write of connection");
            }
        }
    }

    /// Flush, close the output, drop the input, drop the socket. Each step
    /// runs regardless of the previous one failing.
    async fn cleanup(self) {
        let Connection {
            reader,
            mut writer,
            peer,
            ..
        } = self;

        if let Err(e) = writer.flush().await {
            trace!(peer = %peer, error = %e, "flush on close failed");
        }
        if let Err(e) = writer.shutdown().await {
            trace!(peer = %peer, error = %e, "shutdown on close failed");
        }

        let read_half = reader.into_inner();
        let write_half = writer.into_inner();
        drop(read_half);
        // last half dropped closes the socket
        drop(write_half);

        trace!(peer = %peer, "connection closed");
    }
}
