/*
 * client.rs
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

//! HTTP client: resolve, connect and complete the TLS handshake within the connect timeout.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::{lookup_host, TcpStream};
use tokio::time::{timeout_at, Instant};
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;
use tracing::debug;

use crate::config::Settings;
use crate::error::RequestError;
use crate::net::server_name;
use crate::protocol::http::connection::HttpConnection;
use crate::uri::Target;

/// HTTP client. Create the connection with `HttpClient::connect`, then `send` one request on it.
pub struct HttpClient;

impl HttpClient {
    /// Connect to `target` and perform the TLS handshake. `settings.connect_timeout` bounds the
    /// whole sequence (name resolution, TCP connect, handshake).
    pub async fn connect(
        target: &Target,
        tls: &TlsConnector,
        settings: &Settings,
    ) -> Result<HttpConnection<TlsStream<TcpStream>>, RequestError> {
        let after = settings.connect_timeout;
        let deadline = Instant::now() + after;
        let addr = target.socket_addr();

        let addrs: Vec<SocketAddr> = timeout_at(deadline, lookup_host(addr.as_str()))
            .await
            .map_err(|_| connect_timeout(after))?
            .map_err(|source| RequestError::Resolve {
                host: target.host.clone(),
                source,
            })?
            .collect();
        if addrs.is_empty() {
            return Err(RequestError::Resolve {
                host: target.host.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "no addresses"),
            });
        }

        let tcp = connect_tcp(&addrs, &addr, deadline, after).await?;
        let name = server_name(&target.host)
            .ok_or_else(|| RequestError::url(addr.as_str(), "host is not a valid TLS server name"))?;
        let tls = match timeout_at(deadline, tls.connect(name, tcp)).await {
            Err(_) => return Err(connect_timeout(after)),
            Ok(Err(e)) if e.kind() == io::ErrorKind::TimedOut => return Err(connect_timeout(after)),
            Ok(Err(source)) => {
                return Err(RequestError::Tls {
                    host: target.host.clone(),
                    source,
                })
            }
            Ok(Ok(stream)) => stream,
        };
        let (_, session) = tls.get_ref();
        debug!(
            host = %target.host,
            version = ?session.protocol_version(),
            suite = ?session.negotiated_cipher_suite().map(|s| s.suite()),
            "TLS established"
        );
        Ok(HttpConnection::new(tls, target.host.as_str(), settings.read_timeout))
    }
}

fn connect_timeout(after: Duration) -> RequestError {
    RequestError::Timeout {
        what: "connect",
        after,
    }
}

/// Try each resolved address in turn; the last failure decides the error.
async fn connect_tcp(
    addrs: &[SocketAddr],
    addr: &str,
    deadline: Instant,
    after: Duration,
) -> Result<TcpStream, RequestError> {
    let mut last = None;
    for sock in addrs {
        debug!(%sock, "connecting");
        match timeout_at(deadline, TcpStream::connect(sock)).await {
            Err(_) => return Err(connect_timeout(after)),
            Ok(Ok(tcp)) => {
                tcp.set_nodelay(true)?;
                return Ok(tcp);
            }
            Ok(Err(e)) => {
                debug!(%sock, error = %e, "connect failed");
                last = Some(e);
            }
        }
    }
    let source = last.unwrap_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no addresses"));
    Err(classify_connect_error(addr, source, after))
}

fn classify_connect_error(addr: &str, source: io::Error, after: Duration) -> RequestError {
    match source.kind() {
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::HostUnreachable
        | io::ErrorKind::NetworkUnreachable => RequestError::ConnectionRefused {
            addr: addr.to_string(),
            source,
        },
        io::ErrorKind::TimedOut => connect_timeout(after),
        _ => RequestError::Io(source),
    }
}
