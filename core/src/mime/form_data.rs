/*
 * form_data.rs
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

//! multipart/form-data body (RFC 2388 / RFC 7578).
//!
//! Layout, per field in order:
//! `--B CRLF`, `Content-Disposition: form-data; name="n"[; filename="f"] CRLF`,
//! `Content-Type: text/plain|application/octet-stream CRLF`, `CRLF`, payload, `CRLF`;
//! then `--B-- CRLF`. Part heads are built up front; file payloads are streamed from disk when
//! the body is written, so the length is known before anything is sent.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::error::RequestError;
use crate::mime::utils::{is_valid_boundary, quote_parameter};
use crate::request_spec::FormField;

/// Fixed prefix of every generated boundary.
pub const BOUNDARY_TAG: &str = "----JackBoundary";

const TEXT_CONTENT_TYPE: &str = "text/plain";
const FILE_CONTENT_TYPE: &str = "application/octet-stream";
const FILE_CHUNK: usize = 8192;

static BOUNDARY_SEQ: AtomicU64 = AtomicU64::new(0);

/// Boundary unique for the process lifetime: tag + epoch nanoseconds + sequence number.
pub fn generate_boundary() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let seq = BOUNDARY_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{}{}_{}", BOUNDARY_TAG, nanos, seq)
}

#[derive(Debug)]
enum Payload {
    Text(Bytes),
    File { path: PathBuf, len: u64 },
}

impl Payload {
    fn len(&self) -> u64 {
        match self {
            Payload::Text(b) => b.len() as u64,
            Payload::File { len, .. } => *len,
        }
    }
}

#[derive(Debug)]
struct Part {
    name: String,
    head: Bytes,
    payload: Payload,
}

/// Encoded multipart/form-data body.
#[derive(Debug)]
pub struct MultipartBody {
    boundary: String,
    parts: Vec<Part>,
}

impl MultipartBody {
    /// Encode `fields` with a fresh boundary that does not occur in any literal value.
    pub fn encode(fields: &[FormField]) -> Result<Self, RequestError> {
        let mut boundary = generate_boundary();
        while collides(&boundary, fields) {
            boundary = generate_boundary();
        }
        Self::with_boundary(boundary, fields)
    }

    /// Encode with a caller-chosen boundary. File sizes are taken now.
    pub fn with_boundary(boundary: impl Into<String>, fields: &[FormField]) -> Result<Self, RequestError> {
        let boundary = boundary.into();
        if !is_valid_boundary(&boundary) {
            return Err(RequestError::protocol(format!(
                "invalid multipart boundary {:?}",
                boundary
            )));
        }
        let mut parts = Vec::with_capacity(fields.len());
        for field in fields {
            let part = match field {
                FormField::Literal { name, text } => Part {
                    name: name.clone(),
                    head: part_head(&boundary, name, None, TEXT_CONTENT_TYPE),
                    payload: Payload::Text(Bytes::from(text.clone().into_bytes())),
                },
                FormField::FileUpload { name, path } => {
                    let len = fs::metadata(path)
                        .map_err(|source| RequestError::FormField {
                            name: name.clone(),
                            source,
                        })?
                        .len();
                    let filename = file_name(path);
                    debug!(field = %name, path = %path.display(), len, "file part");
                    Part {
                        name: name.clone(),
                        head: part_head(&boundary, name, Some(&filename), FILE_CONTENT_TYPE),
                        payload: Payload::File {
                            path: path.clone(),
                            len,
                        },
                    }
                }
            };
            parts.push(part);
        }
        Ok(Self { boundary, parts })
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value for the request's `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Exact number of bytes `write_to` produces.
    pub fn content_length(&self) -> u64 {
        let parts: u64 = self
            .parts
            .iter()
            .map(|p| p.head.len() as u64 + p.payload.len() + 2)
            .sum();
        parts + self.closing_delimiter().len() as u64
    }

    fn closing_delimiter(&self) -> String {
        format!("--{}--\r\n", self.boundary)
    }

    /// Write the body. Each file is opened, streamed in fixed-size chunks, and closed before the
    /// next part starts.
    pub async fn write_to<W: AsyncWrite + Unpin>(&self, out: &mut W) -> Result<(), RequestError> {
        for part in &self.parts {
            out.write_all(&part.head).await?;
            match &part.payload {
                Payload::Text(b) => out.write_all(b).await?,
                Payload::File { path, len } => copy_file(&part.name, path, *len, out).await?,
            }
            out.write_all(b"\r\n").await?;
        }
        out.write_all(self.closing_delimiter().as_bytes()).await?;
        Ok(())
    }

    /// Encode into memory.
    pub async fn to_bytes(&self) -> Result<Vec<u8>, RequestError> {
        let mut out = Vec::with_capacity(self.content_length() as usize);
        self.write_to(&mut out).await?;
        Ok(out)
    }
}

fn collides(boundary: &str, fields: &[FormField]) -> bool {
    let delimiter = format!("--{}", boundary);
    fields.iter().any(|f| match f {
        FormField::Literal { name, text } => text.contains(&delimiter) || name.contains(&delimiter),
        FormField::FileUpload { .. } => false,
    })
}

fn part_head(boundary: &str, name: &str, filename: Option<&str>, content_type: &str) -> Bytes {
    let mut out = Vec::new();
    out.extend_from_slice(b"--");
    out.extend_from_slice(boundary.as_bytes());
    out.extend_from_slice(b"\r\n");
    let mut disposition = format!("form-data; name={}", quote_parameter(name));
    if let Some(f) = filename {
        disposition.push_str("; filename=");
        disposition.push_str(&quote_parameter(f));
    }
    append_header(&mut out, "Content-Disposition", &disposition);
    append_header(&mut out, "Content-Type", content_type);
    out.extend_from_slice(b"\r\n");
    Bytes::from(out)
}

fn append_header(out: &mut Vec<u8>, name: &str, value: &str) {
    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(b": ");
    out.extend_from_slice(value.as_bytes());
    out.extend_from_slice(b"\r\n");
}

/// Last path component, as sent in `filename`.
fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

async fn copy_file<W: AsyncWrite + Unpin>(
    name: &str,
    path: &Path,
    len: u64,
    out: &mut W,
) -> Result<(), RequestError> {
    let field_error = |source| RequestError::FormField {
        name: name.to_string(),
        source,
    };
    let file = tokio::fs::File::open(path).await.map_err(field_error)?;
    let mut reader = file.take(len);
    let mut buf = [0u8; FILE_CHUNK];
    let mut copied = 0u64;
    loop {
        let n = reader.read(&mut buf).await.map_err(field_error)?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n]).await?;
        copied += n as u64;
    }
    if copied < len {
        return Err(field_error(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("{} shrank from {} to {} bytes while uploading", path.display(), len, copied),
        )));
    }
    Ok(())
}
