/*
 * cli.rs
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

//! Command-line shape: five positionals then modifiers, plus optional knobs that can also come
//! from the environment.

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use jackhttp_core::{FieldMode, Invocation, RequestSpec, Settings};

/// Issue one HTTPS request authenticated with a client certificate.
///
/// Prints the HTTP status code to stdout (no newline) and the response body to stderr.
/// Exit codes: 0 success, 1 usage or other failure, 7 connection refused, 22 status >= 400,
/// 28 timeout, 35 TLS failure.
///
/// Options must come before KEYSTORE; everything from KEYSTORE on is taken verbatim.
#[derive(Debug, Parser)]
#[command(
    name = "jack-http-client",
    version,
    about,
    override_usage = "jack-http-client [OPTIONS] <KEYSTORE> <TRUSTSTORE> <PASSWORD> <METHOD> <URL> [header:Name=Value | data:text | field=value]..."
)]
pub struct Cli {
    /// PEM bundle with the client certificate chain and private key
    #[arg(value_name = "KEYSTORE", allow_hyphen_values = true)]
    pub keystore: PathBuf,

    /// Accepted for compatibility; the server certificate is not validated
    #[arg(value_name = "TRUSTSTORE", allow_hyphen_values = true)]
    pub truststore: PathBuf,

    /// Keystore password, used verbatim
    #[arg(value_name = "PASSWORD", allow_hyphen_values = true)]
    pub password: String,

    #[arg(value_name = "METHOD", allow_hyphen_values = true)]
    pub method: String,

    /// https:// target URL
    #[arg(value_name = "URL", allow_hyphen_values = true)]
    pub url: String,

    #[arg(value_name = "MODIFIER", trailing_var_arg = true, allow_hyphen_values = true)]
    pub modifiers: Vec<String>,

    /// Seconds allowed for connecting, including the TLS handshake
    #[arg(long, value_name = "SECS", env = "JACK_HTTP_CONNECT_TIMEOUT", default_value_t = 300)]
    pub connect_timeout: u64,

    /// Seconds allowed for each read from the server (default: wait indefinitely)
    #[arg(long, value_name = "SECS", env = "JACK_HTTP_READ_TIMEOUT")]
    pub read_timeout: Option<u64>,

    /// How a form field is recognised as a file upload
    #[arg(long, value_enum, env = "JACK_HTTP_FIELD_MODE", default_value_t = FieldModeArg::Legacy)]
    pub field_mode: FieldModeArg,

    /// Log filter for stderr, e.g. "debug" or "jackhttp_core=trace"
    #[arg(long, value_name = "FILTER", env = "JACK_HTTP_LOG", default_value = "off")]
    pub log: String,
}

/// Options that take their value from the following argument.
const VALUE_OPTIONS: [&str; 4] = ["--connect-timeout", "--read-timeout", "--field-mode", "--log"];

/// Ends option parsing at the first positional: everything from KEYSTORE on is passed through
/// verbatim, so a password of `-h` or `--log` is a password. Options must come first.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args = args.into_iter().map(Into::into);
    let mut out: Vec<OsString> = args.next().into_iter().collect();
    while let Some(arg) = args.next() {
        let (is_separator, is_option, takes_value) = {
            let text = arg.to_string_lossy();
            (
                text == "--",
                text.len() > 1 && text.starts_with('-'),
                VALUE_OPTIONS.contains(&text.as_ref()),
            )
        };
        if is_separator {
            out.push(arg);
            break;
        }
        if !is_option {
            out.push(OsString::from("--"));
            out.push(arg);
            break;
        }
        out.push(arg);
        if takes_value {
            out.extend(args.next());
        }
    }
    out.extend(args);
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FieldModeArg {
    /// A value naming an existing file is uploaded as that file
    Legacy,
    /// Only `@path` values are uploaded
    Explicit,
}

impl From<FieldModeArg> for FieldMode {
    fn from(mode: FieldModeArg) -> Self {
        match mode {
            FieldModeArg::Legacy => FieldMode::Legacy,
            FieldModeArg::Explicit => FieldMode::Explicit,
        }
    }
}

impl Cli {
    pub fn settings(&self) -> Settings {
        Settings::default()
            .with_connect_timeout(Duration::from_secs(self.connect_timeout))
            .with_read_timeout(self.read_timeout.map(Duration::from_secs))
            .with_field_mode(self.field_mode.into())
    }

    pub fn invocation(&self) -> Invocation {
        Invocation::new(
            &self.keystore,
            &self.truststore,
            self.password.as_str(),
            RequestSpec::from_modifiers(self.method.as_str(), self.url.as_str(), &self.modifiers),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(normalize_args(
            std::iter::once("jack-http-client").chain(args.iter().copied()),
        ))
    }

    #[test]
    fn positionals_and_modifiers() {
        let cli = parse(&[
            "ks.pem",
            "ts.jks",
            "-pw-",
            "PUT",
            "https://h/upload",
            "header:X-Id=42",
            "file=/tmp/report.txt",
        ])
        .unwrap();
        assert_eq!(cli.password, "-pw-");
        assert_eq!(cli.modifiers, ["header:X-Id=42", "file=/tmp/report.txt"]);
        let inv = cli.invocation();
        assert_eq!(inv.spec.headers, vec![("X-Id".to_string(), "42".to_string())]);
        assert_eq!(inv.spec.fields.len(), 1);
    }

    #[test]
    fn option_lookalikes_after_the_first_positional_are_values() {
        for password in ["-h", "--help", "-V", "--log"] {
            let cli = parse(&["ks.pem", "ts.jks", password, "GET", "https://h/", "--log"]).unwrap();
            assert_eq!(cli.password, password);
            assert_eq!(cli.modifiers, ["--log"]);
            assert_eq!(cli.log, "off");
        }
    }

    #[test]
    fn leading_options_are_still_parsed() {
        let cli = parse(&[
            "--log=debug",
            "--read-timeout",
            "3",
            "ks.pem",
            "ts.jks",
            "pw",
            "GET",
            "https://h/",
        ])
        .unwrap();
        assert_eq!(cli.log, "debug");
        assert_eq!(cli.read_timeout, Some(3));
        assert_eq!(parse(&["-h"]).unwrap_err().kind(), clap::error::ErrorKind::DisplayHelp);
        assert_eq!(parse(&["--bogus"]).unwrap_err().kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn normalize_inserts_separator_once() {
        let args = normalize_args(["jack", "--log", "info", "ks", "ts", "-V", "GET", "https://h/"]);
        assert_eq!(args, ["jack", "--log", "info", "--", "ks", "ts", "-V", "GET", "https://h/"]);
        let args = normalize_args(["jack", "--", "-ks", "ts"]);
        assert_eq!(args, ["jack", "--", "-ks", "ts"]);
    }

    #[test]
    fn fewer_than_five_positionals_is_an_error() {
        let err = parse(&["ks.pem", "ts.jks", "pw", "GET"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn options_build_settings() {
        let cli = parse(&[
            "--connect-timeout",
            "5",
            "--read-timeout",
            "2",
            "--field-mode",
            "explicit",
            "ks.pem",
            "ts.jks",
            "pw",
            "GET",
            "https://h/",
        ])
        .unwrap();
        let settings = cli.settings();
        assert_eq!(settings.connect_timeout, Duration::from_secs(5));
        assert_eq!(settings.read_timeout, Some(Duration::from_secs(2)));
        assert_eq!(settings.field_mode, FieldMode::Explicit);
    }

    #[test]
    fn defaults_match_core_settings() {
        let cli = parse(&["ks.pem", "ts.jks", "pw", "GET", "https://h/"]).unwrap();
        assert_eq!(cli.settings(), Settings::default());
        assert_eq!(cli.log, "off");
    }
}
