/*
 * error.rs
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

//! Faults raised while preparing or performing the request.

use std::io;
use std::time::Duration;

use crate::identity::IdentityError;

/// Everything that can stop the request before a status code is known.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// Keystore unreadable, malformed, or wrong password.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("invalid target URL {url}: {reason}")]
    Url { url: String, reason: String },

    #[error("invalid HTTP method {0:?}")]
    Method(String),

    /// Caller header that cannot be written to the wire as given.
    #[error("invalid header {name:?}: {reason}")]
    Header { name: String, reason: &'static str },

    #[error("cannot resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: io::Error,
    },

    /// Peer actively refused (or could not be routed to) the TCP connection.
    #[error("failed to connect to {addr}: {source}")]
    ConnectionRefused {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Any fault during the TLS handshake.
    #[error("TLS handshake with {host} failed: {source}")]
    Tls {
        host: String,
        #[source]
        source: io::Error,
    },

    #[error("{what} timed out after {after:?}")]
    Timeout { what: &'static str, after: Duration },

    #[error("HTTP protocol error: {0}")]
    Protocol(String),

    /// A form field named a file that could not be read.
    #[error("form field {name:?}: {source}")]
    FormField {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl RequestError {
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    pub fn url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Url {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// True when an I/O fault carries the OS "timed out" kind.
    pub fn is_timeout(&self) -> bool {
        match self {
            RequestError::Timeout { .. } => true,
            RequestError::Io(e) => e.kind() == io::ErrorKind::TimedOut,
            _ => false,
        }
    }
}
