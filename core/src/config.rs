/*
 * config.rs
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

//! Per-invocation settings. The command line stays the positional contract; these knobs come
//! from optional flags or environment variables read by the CLI.

use std::time::Duration;

use crate::request_spec::FieldMode;

/// Connect timeout applied to TCP connect plus TLS handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(300);

/// Settings for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub connect_timeout: Duration,
    /// Bound on each read from the server. `None` waits indefinitely.
    pub read_timeout: Option<Duration>,
    pub field_mode: FieldMode,
}

impl Settings {
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_field_mode(mut self, mode: FieldMode) -> Self {
        self.field_mode = mode;
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: None,
            field_mode: FieldMode::Legacy,
        }
    }
}
