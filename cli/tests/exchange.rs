/*
 * exchange.rs
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

//! Runs the built binary against the in-process mutual-TLS server: status on stdout, body on
//! stderr, exit code from the status.

#[path = "../../core/tests/common/mod.rs"]
mod common;

use assert_cmd::assert::Assert;
use assert_cmd::Command;
use common::Pki;
use predicates::prelude::*;

/// Run the binary off the runtime so the server task keeps making progress.
async fn jack(pki: &Pki, args: Vec<String>) -> Assert {
    let keystore = pki.keystore.clone();
    tokio::task::spawn_blocking(move || {
        let mut cmd = Command::cargo_bin("jack-http-client").unwrap();
        for var in [
            "JACK_HTTP_CONNECT_TIMEOUT",
            "JACK_HTTP_READ_TIMEOUT",
            "JACK_HTTP_FIELD_MODE",
            "JACK_HTTP_LOG",
        ] {
            cmd.env_remove(var);
        }
        cmd.arg(keystore).arg("ts.jks").arg("changeit").args(args).assert()
    })
    .await
    .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn success_prints_status_and_streams_body_to_stderr() {
    let pki = Pki::new();
    let (addr, server) =
        common::serve_once(&pki, b"HTTP/1.1 200 OK\r\nContent-Length: 7\r\n\r\npayload").await;
    let args = vec![
        "GET".to_string(),
        format!("https://{addr}/artifacts"),
        "header:X-Build=17".to_string(),
    ];
    jack(&pki, args).await.code(0).stdout("200").stderr("payload");

    let seen = server.await.unwrap();
    assert_eq!(seen.request_line, "GET /artifacts HTTP/1.1");
    assert_eq!(seen.header("X-Build"), Some("17"));
    assert_eq!(seen.client_certificates, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn error_status_prints_status_and_exits_22() {
    let pki = Pki::new();
    let (addr, _server) = common::serve_once(
        &pki,
        b"HTTP/1.1 404 Not Found\r\nContent-Type: text/plain\r\n\r\nno such artifact",
    )
    .await;
    let args = vec!["GET".to_string(), format!("https://{addr}/missing")];
    jack(&pki, args)
        .await
        .code(22)
        .stdout("404")
        .stderr(predicate::str::contains("no such artifact"));
}

#[tokio::test(flavor = "multi_thread")]
async fn multipart_upload_from_the_command_line() {
    let pki = Pki::new();
    let report = pki.write_file("report.txt", b"all green");
    let (addr, server) =
        common::serve_once(&pki, b"HTTP/1.1 201 Created\r\nContent-Length: 0\r\n\r\n").await;
    let args = vec![
        "POST".to_string(),
        format!("https://{addr}/upload"),
        "title=nightly".to_string(),
        format!("file={}", report.display()),
    ];
    jack(&pki, args).await.code(0).stdout("201").stderr("");

    let seen = server.await.unwrap();
    let content_type = seen.header("Content-Type").unwrap_or_default();
    assert!(content_type.starts_with("multipart/form-data; boundary="));
    let body = String::from_utf8_lossy(&seen.body);
    assert!(body.contains("form-data; name=\"title\"\r\n"));
    assert!(body.contains("\r\n\r\nnightly\r\n"));
    assert!(body.contains("filename=\"report.txt\""));
    assert!(body.contains("all green"));
}
