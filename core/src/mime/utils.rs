/*
 * utils.rs
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

//! MIME helpers: RFC 2046 boundary syntax and quoted-string parameters.

/// Checks if a character is valid in a MIME boundary (RFC 2046).
#[inline]
pub fn is_boundary_char(c: u8) -> bool {
    matches!(c,
        b'0'..=b'9' | b'A'..=b'Z' | b'a'..=b'z' |
        b'\'' | b'(' | b')' | b'+' | b'_' | b',' | b'-' | b'.' |
        b'/' | b':' | b'=' | b'?'
    )
}

/// Validates MIME boundary: 1-70 chars from boundary set (RFC 2046).
pub fn is_valid_boundary(boundary: &str) -> bool {
    let b = boundary.as_bytes();
    (1..=70).contains(&b.len()) && b.iter().copied().all(is_boundary_char)
}

/// Quote a parameter value (`name`, `filename`) the way browsers do (HTML5, RFC 7578 §2):
/// `"`, CR and LF are percent-encoded; everything else, backslash included, is kept as is.
pub fn quote_parameter(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("%22"),
            '\r' => out.push_str("%0D"),
            '\n' => out.push_str("%0A"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}
