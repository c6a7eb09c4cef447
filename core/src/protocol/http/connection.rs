/*
 * connection.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of jack-http-client, a mutual-TLS HTTP client for build tooling.
 *
 * jack-http-client is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * jack-http-client is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with jack-http-client.  If not, see <http://www.gnu.org/licenses/>.
 */

//! HTTP connection: one stream, drives the H1 parser, invokes ResponseHandler.

use std::io;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tokio_rustls::rustls;
use tracing::{debug, trace, warn};

use crate::error::RequestError;
use crate::protocol::http::h1::{H1ResponseHandler, ParseState, ResponseParser};
use crate::protocol::http::request::{validate_header, Method, Request};
use crate::protocol::http::response::Response;
use crate::protocol::http::ResponseHandler;

const READ_CHUNK: usize = 8192;

/// Bridges H1 parser callbacks to the connection state and user's ResponseHandler.
struct H1Driver<'a> {
    status: &'a mut Option<(u16, Option<String>)>,
    headers: &'a mut Vec<(String, String)>,
    handler: &'a mut dyn ResponseHandler,
    completed: bool,
}

impl H1ResponseHandler for H1Driver<'_> {
    fn status(&mut self, code: u16, reason: Option<&str>) {
        *self.status = Some((code, reason.map(|s| s.to_string())));
    }

    fn header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    fn body_chunk(&mut self, data: &[u8]) {
        self.handler.body_chunk(data);
    }

    fn end_body(&mut self) {
        self.handler.end_body();
    }

    fn trailer(&mut self, name: &str, value: &str) {
        self.handler.header(name, value);
    }

    fn complete(&mut self) {
        self.completed = true;
        self.handler.complete();
    }
}

/// Body framing announced by the response head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Framing {
    content_length: Option<u64>,
    chunked: bool,
}

impl Framing {
    fn from_headers(headers: &[(String, String)]) -> Self {
        let chunked = headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("transfer-encoding"))
            .flat_map(|(_, v)| v.split(','))
            .last()
            .map(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
            .unwrap_or(false);
        // Transfer-Encoding overrides Content-Length (RFC 9112 6.3)
        let content_length = if chunked {
            None
        } else {
            headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, v)| match v.trim().parse::<u64>() {
                    Ok(n) => Some(n),
                    Err(_) => {
                        warn!(value = %v, "ignoring invalid Content-Length");
                        None
                    }
                })
        };
        Self {
            content_length,
            chunked,
        }
    }

    fn has_body(&self) -> bool {
        self.chunked || self.content_length != Some(0)
    }
}

/// HTTP/1.1 connection over any byte stream. Call `send()` once; the request asks the server
/// to close afterwards.
pub struct HttpConnection<S> {
    stream: S,
    /// Host name, for TLS fault messages.
    peer: String,
    read_buf: BytesMut,
    parser: ResponseParser,
    read_timeout: Option<Duration>,
}

impl<S: AsyncRead + AsyncWrite + Unpin> HttpConnection<S> {
    pub fn new(stream: S, peer: impl Into<String>, read_timeout: Option<Duration>) -> Self {
        Self {
            stream,
            peer: peer.into(),
            read_buf: BytesMut::with_capacity(READ_CHUNK),
            parser: ResponseParser::new(),
            read_timeout,
        }
    }

    /// Send the request and run the read loop until the response is complete. Handler is
    /// invoked as data arrives.
    ///
    /// Faults before the final status is known are returned. Faults while draining the body
    /// are logged and the status is returned anyway.
    pub async fn send(
        &mut self,
        request: &Request,
        handler: &mut dyn ResponseHandler,
    ) -> Result<Response, RequestError> {
        if let Err(e) = self.write_request(request).await {
            return Err(tls_fault(&self.peer, e));
        }

        let mut status = None;
        let mut headers = Vec::new();
        let response = self.read_head(&mut status, &mut headers, handler).await?;

        if response.is_error() {
            handler.error(&response);
        } else {
            handler.ok(&response);
        }
        for (name, value) in &headers {
            handler.header(name, value);
        }

        let bodiless = request.method == Method::Head || matches!(response.code, 101 | 204 | 304);
        let framing = Framing::from_headers(&headers);
        if bodiless || !framing.has_body() {
            self.parser.set_body_mode(Some(0), false);
            handler.complete();
            return Ok(response);
        }
        self.parser.set_body_mode(framing.content_length, framing.chunked);
        handler.start_body();
        if let Err(e) = self.drain_body(&mut status, &mut headers, handler).await {
            warn!(error = %e, status = response.code, "response body incomplete");
        }
        Ok(response)
    }

    async fn write_request(&mut self, request: &Request) -> Result<(), RequestError> {
        let mut head = format!(
            "{} {} HTTP/1.1\r\n",
            request.method.as_str(),
            request.path
        );
        for (name, value) in &request.headers {
            validate_header(name, value)?;
            append_header(&mut head, name, value);
        }
        if let Some(body) = &request.body {
            append_header(&mut head, "Content-Length", &body.len().to_string());
        }
        append_header(&mut head, "Connection", "close");
        head.push_str("\r\n");
        trace!(head = %head.trim_end(), "request head");
        self.stream.write_all(head.as_bytes()).await?;
        if let Some(body) = &request.body {
            body.write_to(&mut self.stream).await?;
        }
        self.stream.flush().await?;
        debug!(
            method = request.method.as_str(),
            path = %request.path,
            body_len = request.body.as_ref().map(|b| b.len()).unwrap_or(0),
            "request sent"
        );
        Ok(())
    }

    /// Read up to the end of the final response head, skipping interim 1xx responses.
    async fn read_head(
        &mut self,
        status: &mut Option<(u16, Option<String>)>,
        headers: &mut Vec<(String, String)>,
        handler: &mut dyn ResponseHandler,
    ) -> Result<Response, RequestError> {
        loop {
            *status = None;
            headers.clear();
            self.parser.reset();
            loop {
                let mut driver = H1Driver {
                    status: &mut *status,
                    headers: &mut *headers,
                    handler: &mut *handler,
                    completed: false,
                };
                self.parser
                    .receive(&mut self.read_buf, &mut driver)
                    .map_err(|e| RequestError::protocol(e.to_string()))?;
                if self.parser.state() == ParseState::HeadersComplete {
                    break;
                }
                if self.fill().await? == 0 {
                    return Err(RequestError::protocol(
                        "connection closed before the response head was complete",
                    ));
                }
            }
            let (code, reason) = status
                .take()
                .ok_or_else(|| RequestError::protocol("missing status line"))?;
            if (100..200).contains(&code) && code != 101 {
                debug!(code, "skipping interim response");
                continue;
            }
            debug!(code, reason = reason.as_deref().unwrap_or(""), "response status");
            return Ok(match reason {
                Some(r) => Response::with_reason(code, r),
                None => Response::new(code),
            });
        }
    }

    async fn drain_body(
        &mut self,
        status: &mut Option<(u16, Option<String>)>,
        headers: &mut Vec<(String, String)>,
        handler: &mut dyn ResponseHandler,
    ) -> Result<(), RequestError> {
        let mut driver = H1Driver {
            status,
            headers,
            handler,
            completed: false,
        };
        loop {
            self.parser
                .receive(&mut self.read_buf, &mut driver)
                .map_err(|e| RequestError::protocol(e.to_string()))?;
            if self.parser.state() == ParseState::Idle {
                break;
            }
            if self.fill().await? == 0 {
                if self.parser.is_close_delimited() {
                    self.parser.finish(&mut driver);
                    break;
                }
                return Err(RequestError::protocol("connection closed mid-body"));
            }
        }
        if !driver.completed {
            driver.handler.end_body();
            driver.handler.complete();
        }
        Ok(())
    }

    /// Read more bytes into the parse buffer. Returns 0 at end of stream; an unexpected EOF
    /// (TLS peer closing without close_notify) counts as end of stream.
    async fn fill(&mut self) -> Result<usize, RequestError> {
        let mut tmp = [0u8; READ_CHUNK];
        let read_timeout = self.read_timeout;
        let read = self.stream.read(&mut tmp);
        let result = match read_timeout {
            Some(after) => timeout(after, read)
                .await
                .map_err(|_| RequestError::Timeout { what: "read", after })?,
            None => read.await,
        };
        let n = match result {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => 0,
            Err(e) => return Err(tls_fault(&self.peer, e.into())),
        };
        self.read_buf.extend_from_slice(&tmp[..n]);
        Ok(n)
    }
}

/// A TLS alert or record fault surfacing as an I/O error after the handshake. With TLS 1.3 the
/// server's verdict on the client certificate arrives this way.
fn tls_fault(peer: &str, e: RequestError) -> RequestError {
    match e {
        RequestError::Io(source)
            if source
                .get_ref()
                .and_then(|inner| inner.downcast_ref::<rustls::Error>())
                .is_some() =>
        {
            RequestError::Tls {
                host: peer.to_string(),
                source,
            }
        }
        other => other,
    }
}

fn append_header(head: &mut String, name: &str, value: &str) {
    head.push_str(name);
    head.push_str(": ");
    head.push_str(value);
    head.push_str("\r\n");
}
