/*
 * outcome.rs
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

//! Outcome classification: every run ends in exactly one `OutcomeCode`, whose exit code follows
//! curl's numbering so callers can treat this tool as a drop-in.

use std::fmt;
use std::process::ExitCode;

use crate::error::RequestError;
use crate::invocation::Exchange;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeCode {
    Success,
    ConnectionRefused,
    TlsFailure,
    Timeout,
    HttpClientOrServerError,
    GenericFailure,
    UsageError,
}

impl OutcomeCode {
    pub fn exit_code(self) -> u8 {
        match self {
            OutcomeCode::Success => 0,
            OutcomeCode::ConnectionRefused => 7,
            OutcomeCode::TlsFailure => 35,
            OutcomeCode::Timeout => 28,
            OutcomeCode::HttpClientOrServerError => 22,
            OutcomeCode::GenericFailure | OutcomeCode::UsageError => 1,
        }
    }

    pub fn fault_class(self) -> &'static str {
        match self {
            OutcomeCode::Success => "success",
            OutcomeCode::ConnectionRefused => "connection-refused",
            OutcomeCode::TlsFailure => "tls-error",
            OutcomeCode::Timeout => "timeout",
            OutcomeCode::HttpClientOrServerError => "http-failure",
            OutcomeCode::GenericFailure => "generic-failure",
            OutcomeCode::UsageError => "usage-error",
        }
    }

    pub fn from_status(status: u16) -> Self {
        if status >= 400 {
            OutcomeCode::HttpClientOrServerError
        } else {
            OutcomeCode::Success
        }
    }
}

impl fmt::Display for OutcomeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.fault_class())
    }
}

impl From<OutcomeCode> for ExitCode {
    fn from(code: OutcomeCode) -> Self {
        ExitCode::from(code.exit_code())
    }
}

impl RequestError {
    pub fn outcome(&self) -> OutcomeCode {
        match self {
            _ if self.is_timeout() => OutcomeCode::Timeout,
            RequestError::ConnectionRefused { .. } => OutcomeCode::ConnectionRefused,
            RequestError::Tls { .. } => OutcomeCode::TlsFailure,
            _ => OutcomeCode::GenericFailure,
        }
    }
}

/// Outcome of one invocation, decided by the status when one was received.
pub fn classify(result: &Result<Exchange, RequestError>) -> OutcomeCode {
    match result {
        Ok(exchange) => OutcomeCode::from_status(exchange.status),
        Err(e) => e.outcome(),
    }
}
