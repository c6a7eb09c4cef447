/*
 * parser.rs
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

//! HTTP/1.1 response push parser: status line, headers, body (Content-Length, chunked, or until close).

use bytes::Buf;
use bytes::BytesMut;
use std::io;

/// Callback for HTTP/1.1 response events. The connection implements this and forwards to ResponseHandler.
pub trait H1ResponseHandler {
    fn status(&mut self, code: u16, reason: Option<&str>);
    fn header(&mut self, name: &str, value: &str);
    fn body_chunk(&mut self, data: &[u8]);
    fn end_body(&mut self);
    fn trailer(&mut self, name: &str, value: &str);
    fn complete(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    Idle,
    StatusLine,
    Headers,
    /// Headers done; the connection must call set_body_mode().
    HeadersComplete,
    Body,
    ChunkSize,
    ChunkData,
    ChunkTrailer,
}

/// Push parser for one HTTP/1.1 response. Feed bytes via `receive`; the handler is invoked as
/// complete tokens are parsed.
pub struct ResponseParser {
    state: ParseState,
    /// Content-Length when known (-1 for chunked or read-until-close).
    content_length: i64,
    bytes_received: i64,
    chunk_remaining: i64,
}

fn invalid(message: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message.to_string())
}

impl ResponseParser {
    pub fn new() -> Self {
        Self {
            state: ParseState::StatusLine,
            content_length: -1,
            bytes_received: 0,
            chunk_remaining: 0,
        }
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = ParseState::StatusLine;
        self.content_length = -1;
        self.bytes_received = 0;
        self.chunk_remaining = 0;
    }

    /// True while reading a body that ends when the peer closes the connection.
    pub fn is_close_delimited(&self) -> bool {
        self.state == ParseState::Body && self.content_length < 0
    }

    fn find_crlf(buf: &[u8]) -> Option<usize> {
        buf.windows(2).position(|w| w == b"\r\n")
    }

    /// Consume and parse as much as possible from buf. Partial lines remain in buf.
    pub fn receive<H: H1ResponseHandler + ?Sized>(
        &mut self,
        buf: &mut BytesMut,
        handler: &mut H,
    ) -> Result<(), io::Error> {
        while !buf.is_empty() {
            match self.state {
                ParseState::StatusLine => {
                    let line_end = match Self::find_crlf(buf) {
                        Some(n) => n,
                        None => return Ok(()),
                    };
                    let line = buf.split_to(line_end + 2);
                    let line_str = std::str::from_utf8(&line[..line_end])
                        .map_err(|_| invalid("invalid status line UTF-8"))?;
                    // HTTP/1.1 200 OK, or HTTP/1.1 200
                    let parts: Vec<&str> = line_str.splitn(3, ' ').collect();
                    if !parts[0].starts_with("HTTP/") {
                        return Err(invalid("not an HTTP response"));
                    }
                    let code = parts
                        .get(1)
                        .and_then(|s| s.parse::<u16>().ok())
                        .filter(|c| (100..1000).contains(c))
                        .ok_or_else(|| invalid("invalid status code"))?;
                    let reason = parts.get(2).copied().filter(|r| !r.is_empty());
                    handler.status(code, reason);
                    self.state = ParseState::Headers;
                }
                ParseState::Headers => {
                    let line_end = match Self::find_crlf(buf) {
                        Some(n) => n,
                        None => return Ok(()),
                    };
                    if line_end == 0 {
                        buf.advance(2);
                        self.state = ParseState::HeadersComplete;
                        return Ok(());
                    }
                    let line = buf.split_to(line_end + 2);
                    let line_str = String::from_utf8_lossy(&line[..line_end]);
                    if let Some(colon) = line_str.find(':') {
                        let name = line_str[..colon].trim();
                        let value = line_str[colon + 1..].trim();
                        handler.header(name, value);
                    }
                }
                ParseState::Body => {
                    if self.content_length >= 0 {
                        let remaining = (self.content_length - self.bytes_received) as usize;
                        let to_read = remaining.min(buf.len());
                        if to_read > 0 {
                            let chunk = buf.split_to(to_read);
                            handler.body_chunk(&chunk);
                            self.bytes_received += to_read as i64;
                        }
                        if self.bytes_received >= self.content_length {
                            handler.end_body();
                            handler.complete();
                            self.state = ParseState::Idle;
                        }
                    } else {
                        let chunk = buf.split_to(buf.len());
                        handler.body_chunk(&chunk);
                        return Ok(());
                    }
                }
                ParseState::ChunkSize => {
                    let line_end = match Self::find_crlf(buf) {
                        Some(n) => n,
                        None => return Ok(()),
                    };
                    let line = buf.split_to(line_end + 2);
                    let line_str = std::str::from_utf8(&line[..line_end])
                        .map_err(|_| invalid("invalid chunk size"))?;
                    let hex_part = line_str.split(';').next().unwrap_or(line_str).trim();
                    self.chunk_remaining = i64::from_str_radix(hex_part, 16)
                        .map_err(|_| invalid("invalid chunk size"))?;
                    if self.chunk_remaining == 0 {
                        self.state = ParseState::ChunkTrailer;
                    } else {
                        self.state = ParseState::ChunkData;
                    }
                }
                ParseState::ChunkData => {
                    let to_read = (self.chunk_remaining as usize).min(buf.len());
                    if to_read > 0 {
                        let chunk = buf.split_to(to_read);
                        handler.body_chunk(&chunk);
                        self.chunk_remaining -= to_read as i64;
                    }
                    if self.chunk_remaining == 0 {
                        // chunk data is followed by CRLF
                        if buf.len() >= 2 {
                            buf.advance(2);
                            self.state = ParseState::ChunkSize;
                        } else {
                            return Ok(());
                        }
                    } else {
                        return Ok(());
                    }
                }
                ParseState::HeadersComplete => return Ok(()),
                ParseState::ChunkTrailer => {
                    let line_end = match Self::find_crlf(buf) {
                        Some(n) => n,
                        None => return Ok(()),
                    };
                    if line_end == 0 {
                        buf.advance(2);
                        handler.end_body();
                        handler.complete();
                        self.state = ParseState::Idle;
                    } else {
                        let line = buf.split_to(line_end + 2);
                        let line_str = String::from_utf8_lossy(&line[..line_end]);
                        if let Some(colon) = line_str.find(':') {
                            let name = line_str[..colon].trim();
                            let value = line_str[colon + 1..].trim();
                            handler.trailer(name, value);
                        }
                    }
                }
                ParseState::Idle => return Ok(()),
            }
        }
        Ok(())
    }

    /// Called by the connection once headers are complete.
    pub fn set_body_mode(&mut self, content_length: Option<u64>, chunked: bool) {
        if self.state != ParseState::HeadersComplete {
            return;
        }
        if chunked {
            self.content_length = -1;
            self.state = ParseState::ChunkSize;
        } else if let Some(cl) = content_length {
            self.content_length = cl as i64;
            self.bytes_received = 0;
            if cl == 0 {
                self.state = ParseState::Idle;
            } else {
                self.state = ParseState::Body;
            }
        } else {
            self.content_length = -1;
            self.state = ParseState::Body;
        }
    }

    /// Peer closed the connection: ends a close-delimited body.
    pub fn finish<H: H1ResponseHandler + ?Sized>(&mut self, handler: &mut H) {
        if self.is_close_delimited() {
            handler.end_body();
            handler.complete();
            self.state = ParseState::Idle;
        }
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}
