/*
 * main.rs
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

//! `jack-http-client` entry point.

use std::io::{self, Write};
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;
use jackhttp_core::{classify, DiagnosticSink, OutcomeCode};
use tracing::{error, info};

mod cli;
mod telemetry;

use cli::Cli;

const PROGRAM: &str = "jack-http-client";

fn main() -> ExitCode {
    let cli = match Cli::try_parse_from(cli::normalize_args(std::env::args_os())) {
        Ok(cli) => cli,
        Err(e) => return usage(e),
    };
    telemetry::init(&cli.log);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "cannot start runtime");
            return report(OutcomeCode::GenericFailure, &e);
        }
    };

    let settings = cli.settings();
    let invocation = cli.invocation();
    let mut sink = DiagnosticSink::new(io::stderr());
    let result = runtime.block_on(invocation.perform(&settings, &mut sink));
    let outcome = classify(&result);
    match &result {
        Ok(exchange) => {
            let mut stdout = io::stdout().lock();
            // the status is the last thing written; a failing stdout cannot be reported anywhere
            let _ = write!(stdout, "{}", exchange.status);
            let _ = stdout.flush();
            info!(status = exchange.status, outcome = %outcome, "done");
            outcome.into()
        }
        Err(e) => {
            error!(error = %e, outcome = %outcome, "request failed");
            report(outcome, e)
        }
    }
}

/// Help and version go to stdout with exit 0; anything else is a usage error (exit 1).
fn usage(e: clap::Error) -> ExitCode {
    let _ = e.print();
    match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
        _ => OutcomeCode::UsageError.into(),
    }
}

fn report(outcome: OutcomeCode, e: &dyn std::fmt::Display) -> ExitCode {
    eprintln!("{PROGRAM}: ({}) {e}", outcome.exit_code());
    outcome.into()
}
