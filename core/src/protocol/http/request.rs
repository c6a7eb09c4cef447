/*
 * request.rs
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

//! HTTP request: method, path, ordered headers, optional body.

use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::RequestError;
use crate::mime::MultipartBody;

/// HTTP request method. Any RFC 9110 token is accepted and sent verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
    Other(String),
}

fn is_tchar(c: u8) -> bool {
    matches!(c,
        b'0'..=b'9' | b'A'..=b'Z' | b'a'..=b'z' |
        b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' |
        b'^' | b'_' | b'`' | b'|' | b'~'
    )
}

impl Method {
    pub fn parse(s: &str) -> Result<Method, RequestError> {
        Ok(match s {
            "GET" => Method::Get,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            "HEAD" => Method::Head,
            "OPTIONS" => Method::Options,
            "PATCH" => Method::Patch,
            other if !other.is_empty() && other.bytes().all(is_tchar) => {
                Method::Other(other.to_string())
            }
            other => return Err(RequestError::Method(other.to_string())),
        })
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Patch => "PATCH",
            Method::Other(s) => s,
        }
    }
}

/// Check a header for the wire: the name must be an RFC 9110 token and the value must not
/// contain CR, LF or NUL.
pub fn validate_header(name: &str, value: &str) -> Result<(), RequestError> {
    let invalid = |reason| RequestError::Header {
        name: name.to_string(),
        reason,
    };
    if name.is_empty() || !name.bytes().all(is_tchar) {
        return Err(invalid("name is not a token"));
    }
    if value.bytes().any(|c| matches!(c, b'\r' | b'\n' | 0)) {
        return Err(invalid("value contains CR, LF or NUL"));
    }
    Ok(())
}

/// Request payload. Always sent with Content-Length, never chunked.
#[derive(Debug)]
pub enum RequestBody {
    Raw(Bytes),
    Multipart(MultipartBody),
}

impl RequestBody {
    pub fn len(&self) -> u64 {
        match self {
            RequestBody::Raw(b) => b.len() as u64,
            RequestBody::Multipart(m) => m.content_length(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub async fn write_to<W: AsyncWrite + Unpin>(&self, out: &mut W) -> Result<(), RequestError> {
        match self {
            RequestBody::Raw(b) => out.write_all(b).await?,
            RequestBody::Multipart(m) => m.write_to(out).await?,
        }
        Ok(())
    }
}

/// Request as it goes on the wire. Headers keep insertion order; a name may repeat.
#[derive(Debug)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Append a header.
    pub fn header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    /// First value of `name`, compared case-insensitively.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&mut self, body: RequestBody) -> &mut Self {
        self.body = Some(body);
        self
    }
}
