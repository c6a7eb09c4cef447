/*
 * handler.rs
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

//! HTTP response handler trait.
//!
//! Events: ok/error → header (×n) → start_body → body_chunk (×n) → end_body → complete.

use crate::protocol::http::response::Response;

/// Handler for response events (push model). The connection drives this as data arrives.
///
/// Transport faults are returned from `HttpConnection::send`, not delivered here.
pub trait ResponseHandler {
    /// Final status below 400.
    fn ok(&mut self, response: &Response);

    /// Final status 400 or above.
    fn error(&mut self, response: &Response);

    /// Called for each response or trailer header. Name may repeat.
    fn header(&mut self, _name: &str, _value: &str) {}

    /// Not called for HEAD, 204 or 304 responses.
    fn start_body(&mut self) {}

    /// Data is only valid for the duration of the call.
    fn body_chunk(&mut self, data: &[u8]);

    fn end_body(&mut self) {}

    fn complete(&mut self) {}
}
