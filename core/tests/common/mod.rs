/*
 * mod.rs
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

//! In-process HTTPS server that demands a client certificate, plus the PKI to go with it.

#![allow(dead_code)]

use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rcgen::{BasicConstraints, Certificate, CertificateParams, DnType, IsCa};
use tempfile::TempDir;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_rustls::rustls::crypto::ring;
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use tokio_rustls::rustls::server::WebPkiClientVerifier;
use tokio_rustls::rustls::{RootCertStore, ServerConfig};
use tokio_rustls::TlsAcceptor;

/// CA plus a server and a client certificate it signed. The client keystore is written to a
/// scratch directory as a PEM bundle (leaf, CA, key).
pub struct Pki {
    pub dir: TempDir,
    pub keystore: PathBuf,
    ca_der: Vec<u8>,
    server_der: Vec<u8>,
    server_key: Vec<u8>,
}

fn ca() -> Certificate {
    let mut params = CertificateParams::new(Vec::new());
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.distinguished_name.push(DnType::CommonName, "jack test CA");
    Certificate::from_params(params).unwrap()
}

fn leaf(name: &str) -> Certificate {
    let mut params = CertificateParams::new(vec![name.to_string()]);
    params.distinguished_name.push(DnType::CommonName, name);
    Certificate::from_params(params).unwrap()
}

impl Pki {
    pub fn new() -> Self {
        let ca = ca();
        let server = leaf("localhost");
        let client = leaf("build-agent");
        let dir = tempfile::tempdir().unwrap();
        let keystore = dir.path().join("client.pem");
        let mut f = std::fs::File::create(&keystore).unwrap();
        write!(
            f,
            "{}{}{}",
            client.serialize_pem_with_signer(&ca).unwrap(),
            ca.serialize_pem().unwrap(),
            client.serialize_private_key_pem()
        )
        .unwrap();
        Self {
            keystore,
            ca_der: ca.serialize_der().unwrap(),
            server_der: server.serialize_der_with_signer(&ca).unwrap(),
            server_key: server.serialize_private_key_der(),
            dir,
        }
    }

    pub fn write_file(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// Server config that rejects clients without a certificate from our CA.
    pub fn server_config(&self) -> Arc<ServerConfig> {
        let provider = Arc::new(ring::default_provider());
        let mut roots = RootCertStore::empty();
        roots.add(CertificateDer::from(self.ca_der.clone())).unwrap();
        let verifier = WebPkiClientVerifier::builder_with_provider(Arc::new(roots), provider.clone())
            .build()
            .unwrap();
        let config = ServerConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .unwrap()
            .with_client_cert_verifier(verifier)
            .with_single_cert(
                vec![CertificateDer::from(self.server_der.clone())],
                PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(self.server_key.clone())),
            )
            .unwrap();
        Arc::new(config)
    }
}

/// What the server saw.
#[derive(Debug)]
pub struct Captured {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub client_certificates: usize,
}

impl Captured {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn header_names(&self) -> Vec<&str> {
        self.headers.iter().map(|(k, _)| k.as_str()).collect()
    }
}

async fn read_request<S: AsyncRead + Unpin>(stream: &mut S) -> (String, Vec<(String, String)>, Vec<u8>) {
    let mut buf = Vec::new();
    let mut tmp = [0u8; 4096];
    let head_end = loop {
        if let Some(i) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break i;
        }
        let n = stream.read(&mut tmp).await.unwrap();
        assert!(n > 0, "client closed before sending a request head");
        buf.extend_from_slice(&tmp[..n]);
    };
    let head = String::from_utf8(buf[..head_end].to_vec()).unwrap();
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap().to_string();
    let headers: Vec<(String, String)> = lines
        .map(|l| {
            let (k, v) = l.split_once(':').unwrap();
            (k.to_string(), v.trim().to_string())
        })
        .collect();
    let len: usize = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .map(|(_, v)| v.parse().unwrap())
        .unwrap_or(0);
    let mut body = buf[head_end + 4..].to_vec();
    while body.len() < len {
        let n = stream.read(&mut tmp).await.unwrap();
        assert!(n > 0, "client closed mid-body");
        body.extend_from_slice(&tmp[..n]);
    }
    (request_line, headers, body)
}

/// Serve one request over mutual TLS with the canned `reply`, then close.
pub async fn serve_once(pki: &Pki, reply: &'static [u8]) -> (SocketAddr, JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let acceptor = TlsAcceptor::from(pki.server_config());
    let handle = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut tls = acceptor.accept(tcp).await.unwrap();
        let client_certificates = tls.get_ref().1.peer_certificates().map(|c| c.len()).unwrap_or(0);
        let (request_line, headers, body) = read_request(&mut tls).await;
        tls.write_all(reply).await.unwrap();
        tls.shutdown().await.unwrap();
        Captured {
            request_line,
            headers,
            body,
            client_certificates,
        }
    });
    (addr, handle)
}

/// Complete the handshake and read the request, then go silent for `hold`.
pub async fn serve_silently(pki: &Pki, hold: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let acceptor = TlsAcceptor::from(pki.server_config());
    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut tls = acceptor.accept(tcp).await.unwrap();
        let _ = read_request(&mut tls).await;
        tokio::time::sleep(hold).await;
    });
    addr
}

/// Run the handshake with `pki`'s server config and serve nothing. A client whose certificate
/// `pki` did not issue is rejected with an alert.
pub async fn serve_handshake_only(pki: &Pki) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let acceptor = TlsAcceptor::from(pki.server_config());
    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        // keep the socket open after a rejection so the alert is read rather than reset
        if let Err((_, mut tcp)) = acceptor.accept(tcp).into_fallible().await {
            let mut rest = Vec::new();
            let _ = tcp.read_to_end(&mut rest).await;
        }
    });
    addr
}

/// Accept TCP and never speak TLS.
pub async fn mute_tcp(hold: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (_tcp, _) = listener.accept().await.unwrap();
        tokio::time::sleep(hold).await;
    });
    addr
}

/// Accept TCP and answer with plaintext HTTP, which no TLS client can handshake with.
pub async fn plaintext_http() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut tcp, _) = listener.accept().await.unwrap();
        let mut tmp = [0u8; 1024];
        let _ = tcp.read(&mut tmp).await;
        let _ = tcp
            .write_all(b"HTTP/1.1 400 Bad Request\r\nContent-Length: 0\r\n\r\n")
            .await;
    });
    addr
}

/// A port nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
