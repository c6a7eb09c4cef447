/*
 * net.rs
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

//! TLS context builder: present the client identity, and apply an explicit server validation policy.
//!
//! The context is built per request and handed to the connector; nothing here touches a
//! process-wide default.

use std::sync::Arc;

use tokio_rustls::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use tokio_rustls::rustls::crypto::{self, CryptoProvider};
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use tokio_rustls::rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use tokio_rustls::TlsConnector;
use tracing::warn;

use crate::identity::{ClientIdentity, IdentityError};

/// How the server's certificate is checked.
///
/// `Disabled` accepts any chain (self-signed, expired, wrong host). The build servers this tool
/// talks to use private certificates, and the truststore slot of the command line is unused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerValidation {
    Disabled,
}

/// Verifier that accepts every server certificate and host name. Handshake signatures are
/// still checked so the peer must hold the key for the certificate it sent.
#[derive(Debug)]
pub struct AcceptAnyServerCert {
    provider: Arc<CryptoProvider>,
}

impl AcceptAnyServerCert {
    pub fn new(provider: Arc<CryptoProvider>) -> Self {
        Self { provider }
    }
}

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, tokio_rustls::rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, tokio_rustls::rustls::Error> {
        crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, tokio_rustls::rustls::Error> {
        crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

fn crypto_provider() -> Arc<CryptoProvider> {
    Arc::new(crypto::ring::default_provider())
}

/// Client config presenting `identity` on the handshake (HTTP/1.1 only, no ALPN).
pub fn mutual_tls_config(
    identity: ClientIdentity,
    validation: ServerValidation,
) -> Result<Arc<ClientConfig>, IdentityError> {
    let provider = crypto_provider();
    let path = identity.path().to_path_buf();
    let builder = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| IdentityError::Malformed {
            path: path.clone(),
            detail: e.to_string(),
        })?;
    let builder = match validation {
        ServerValidation::Disabled => {
            warn!("server certificate validation is disabled");
            builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert::new(provider)))
        }
    };
    let (chain, key) = identity.into_parts();
    let config = builder
        .with_client_auth_cert(chain, key)
        .map_err(|e| IdentityError::Malformed {
            path,
            detail: e.to_string(),
        })?;
    Ok(Arc::new(config))
}

/// Connector for one request.
pub fn connector(config: Arc<ClientConfig>) -> TlsConnector {
    TlsConnector::from(config)
}

/// SNI / verifier name for `host`: DNS names and IP literals are both accepted.
pub fn server_name(host: &str) -> Option<ServerName<'static>> {
    let host = host.trim_start_matches('[').trim_end_matches(']');
    ServerName::try_from(host.to_string()).ok()
}
