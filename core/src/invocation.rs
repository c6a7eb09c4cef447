/*
 * invocation.rs
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

//! One invocation: load the identity, build the request, run the exchange, stream the body to
//! the diagnostic sink.

use std::fmt;
use std::io::Write;
use std::path::PathBuf;

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::RequestError;
use crate::identity::ClientIdentity;
use crate::mime::MultipartBody;
use crate::net::{self, ServerValidation};
use crate::protocol::http::{
    validate_header, HttpClient, Method, Request, RequestBody, Response, ResponseHandler,
};
use crate::request_spec::{FieldMode, RequestSpec};
use crate::uri::Target;

pub const USER_AGENT: &str = concat!("jack-http-client/", env!("CARGO_PKG_VERSION"));

/// Headers framed by the client itself; caller values are dropped.
const MANAGED_HEADERS: [&str; 4] = ["Host", "Content-Length", "Transfer-Encoding", "Connection"];

/// Result of a completed exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exchange {
    pub status: u16,
    /// Response body bytes written to the diagnostic sink.
    pub body_bytes: u64,
}

/// Positional arguments of one run.
pub struct Invocation {
    pub keystore: PathBuf,
    /// Accepted for interface compatibility; server validation is disabled.
    pub truststore: PathBuf,
    password: String,
    pub spec: RequestSpec,
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("keystore", &self.keystore)
            .field("truststore", &self.truststore)
            .field("password", &"<redacted>")
            .field("spec", &self.spec)
            .finish()
    }
}

impl Invocation {
    pub fn new(
        keystore: impl Into<PathBuf>,
        truststore: impl Into<PathBuf>,
        password: impl Into<String>,
        spec: RequestSpec,
    ) -> Self {
        Self {
            keystore: keystore.into(),
            truststore: truststore.into(),
            password: password.into(),
            spec,
        }
    }

    /// Run the request. The method, URL and headers are checked before the keystore is read; the
    /// body is encoded before any socket is opened.
    pub async fn perform<W: Write>(
        &self,
        settings: &Settings,
        sink: &mut DiagnosticSink<W>,
    ) -> Result<Exchange, RequestError> {
        let method = Method::parse(&self.spec.method)?;
        let target = Target::parse(&self.spec.url)?;
        for (name, value) in &self.spec.headers {
            validate_header(name, value)?;
        }
        debug!(truststore = %self.truststore.display(), "truststore not consulted");

        let identity = ClientIdentity::load(&self.keystore, &self.password)?;
        debug!(
            keystore = %self.keystore.display(),
            certificates = identity.chain().len(),
            "client identity loaded"
        );
        let config = net::mutual_tls_config(identity, ServerValidation::Disabled)?;

        let body = encode_body(&self.spec, settings.field_mode)?;
        let request = build_request(method, &target, &self.spec.headers, body);

        let connector = net::connector(config);
        let mut connection = HttpClient::connect(&target, &connector, settings).await?;
        let response = connection.send(&request, sink).await?;
        sink.flush();
        info!(
            status = response.code,
            body_bytes = sink.bytes_written(),
            "exchange complete"
        );
        Ok(Exchange {
            status: response.code,
            body_bytes: sink.bytes_written(),
        })
    }
}

/// Raw body, multipart body, or none. Any form field makes the request multipart and the raw
/// body is dropped.
pub fn encode_body(spec: &RequestSpec, mode: FieldMode) -> Result<Option<RequestBody>, RequestError> {
    if spec.is_multipart() {
        if spec.data.is_some() {
            debug!("form fields present, raw body ignored");
        }
        let fields = spec.resolve_fields(mode);
        let multipart = MultipartBody::encode(&fields)?;
        debug!(
            parts = multipart.part_count(),
            len = multipart.content_length(),
            boundary = multipart.boundary(),
            "multipart body"
        );
        return Ok(Some(RequestBody::Multipart(multipart)));
    }
    Ok(spec
        .data
        .as_ref()
        .map(|text| RequestBody::Raw(Bytes::from(text.clone().into_bytes()))))
}

/// Assemble the outgoing request: `Host`, caller headers in order, then defaults.
/// `Content-Length` and `Connection` are written by the connection.
pub fn build_request(
    method: Method,
    target: &Target,
    headers: &[(String, String)],
    body: Option<RequestBody>,
) -> Request {
    let multipart_type = match &body {
        Some(RequestBody::Multipart(m)) => Some(m.content_type()),
        _ => None,
    };
    let mut request = Request::new(method, target.path_and_query.clone());
    request.header("Host", target.authority());
    for (name, value) in headers {
        if MANAGED_HEADERS.iter().any(|m| m.eq_ignore_ascii_case(name)) {
            warn!(header = %name, "ignoring caller header managed by the client");
            continue;
        }
        if multipart_type.is_some() && name.eq_ignore_ascii_case("Content-Type") {
            debug!(value = %value, "replacing caller Content-Type for multipart body");
            continue;
        }
        request.header(name.as_str(), value.as_str());
    }
    if let Some(content_type) = multipart_type {
        request.header("Content-Type", content_type);
    }
    if !request.has_header("User-Agent") {
        request.header("User-Agent", USER_AGENT);
    }
    if !request.has_header("Accept") {
        request.header("Accept", "*/*");
    }
    if let Some(body) = body {
        request.body(body);
    }
    request
}

/// Response handler that streams the body to the diagnostic stream (stderr in the binary).
///
/// A failing sink is reported once and then ignored; the outcome is decided by the status.
pub struct DiagnosticSink<W: Write> {
    out: W,
    bytes_written: u64,
    failed: bool,
    response: Option<Response>,
}

impl<W: Write> DiagnosticSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            bytes_written: 0,
            failed: false,
            response: None,
        }
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Final status seen so far, if any.
    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn flush(&mut self) {
        if !self.failed {
            if let Err(e) = self.out.flush() {
                self.fail(e);
            }
        }
    }

    fn fail(&mut self, e: std::io::Error) {
        warn!(error = %e, "cannot write response body to diagnostic stream");
        self.failed = true;
    }
}

impl<W: Write> ResponseHandler for DiagnosticSink<W> {
    fn ok(&mut self, response: &Response) {
        self.response = Some(response.clone());
    }

    fn error(&mut self, response: &Response) {
        debug!(status = response.code, reason = ?response.reason, "server reported an error");
        self.response = Some(response.clone());
    }

    fn header(&mut self, name: &str, value: &str) {
        debug!(%name, %value, "response header");
    }

    fn body_chunk(&mut self, data: &[u8]) {
        if self.failed {
            return;
        }
        match self.out.write_all(data) {
            Ok(()) => self.bytes_written += data.len() as u64,
            Err(e) => self.fail(e),
        }
    }

    fn end_body(&mut self) {
        self.flush();
    }
}
