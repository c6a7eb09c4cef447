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

//! HTTP/1.1 client with push-parsed responses.
//!
//! - Callback-based response API: `ResponseHandler` with `ok`/`error`, `header`, `start_body`,
//!   `body_chunk`, `end_body`, `complete`.
//! - Buffers: `bytes` crate (BytesMut for the parse buffer).
//! - One request per connection: requests carry `Connection: close` and a fixed `Content-Length`.

mod handler;
mod request;
mod response;

pub mod client;
pub mod connection;
pub mod h1;

pub use client::HttpClient;
pub use connection::HttpConnection;
pub use handler::ResponseHandler;
pub use request::{validate_header, Method, Request, RequestBody};
pub use response::Response;
