/*
 * uri.rs
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

//! Target URL: https only, authority split into host and port, request-target kept as given.

use url::{Position, Url};

use crate::error::RequestError;

pub const HTTPS_PORT: u16 = 443;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Host as written in the URL; IPv6 literals keep their brackets.
    pub host: String,
    pub port: u16,
    /// Origin-form request target: path plus query, never empty. Fragments are dropped.
    pub path_and_query: String,
}

impl Target {
    pub fn parse(raw: &str) -> Result<Self, RequestError> {
        let url = Url::parse(raw).map_err(|e| RequestError::url(raw, e.to_string()))?;
        if url.scheme() != "https" {
            return Err(RequestError::url(
                raw,
                format!("unsupported scheme {:?}, only https is supported", url.scheme()),
            ));
        }
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| RequestError::url(raw, "missing host"))?
            .to_string();
        let port = url.port_or_known_default().unwrap_or(HTTPS_PORT);
        let mut path_and_query = url[Position::BeforePath..Position::AfterQuery].to_string();
        if path_and_query.is_empty() {
            path_and_query.push('/');
        }
        Ok(Self {
            host,
            port,
            path_and_query,
        })
    }

    /// Value for the `Host` header.
    pub fn authority(&self) -> String {
        if self.port == HTTPS_PORT {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// `host:port` for socket address resolution.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
