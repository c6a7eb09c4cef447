/*
 * lib.rs
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

//! Core of jack-http-client: one HTTPS request per invocation, authenticated with a
//! client certificate, reported as a curl-compatible exit code.
//!
//! Flow: `RequestSpec` (from command-line modifiers) → `ClientIdentity` + `net::mutual_tls_config`
//! → `mime::MultipartBody` or raw body → `protocol::http` exchange → `outcome::classify`.

pub mod config;
pub mod error;
pub mod identity;
pub mod invocation;
pub mod mime;
pub mod net;
pub mod outcome;
pub mod protocol;
pub mod request_spec;
pub mod uri;

pub use config::Settings;
pub use error::RequestError;
pub use identity::{ClientIdentity, IdentityError};
pub use invocation::{DiagnosticSink, Exchange, Invocation};
pub use net::ServerValidation;
pub use outcome::{classify, OutcomeCode};
pub use request_spec::{FieldMode, FormField, Modifier, RequestSpec};
pub use uri::Target;
