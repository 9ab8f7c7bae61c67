//! Binary entrypoint: one JSON-RPC request in, one response out.
//!
//! The process exits with status 0 whenever a response was written, error
//! responses included. Status 1 means no response could be produced.

use std::io::{self, Write};
use std::process::ExitCode;

use iatk::telemetry;
use iatk_cloud::UnavailableProvider;
use iatk_config::Config;

fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(error) => error.exit(),
    };
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();

    if config.rpc_specs {
        return print_specs(&mut stdout, &mut stderr);
    }
    if let Err(error) = telemetry::initialise(&config) {
        writeln!(stderr, "iatk: {error}").ok();
    }

    let outcome = iatk::run_with_provider(
        io::stdin().lock(),
        &mut stdout,
        &UnavailableProvider,
        &config,
    );
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "no response could be written");
            writeln!(stderr, "iatk: {error}").ok();
            ExitCode::FAILURE
        }
    }
}

fn print_specs(stdout: &mut impl Write, stderr: &mut impl Write) -> ExitCode {
    let printed = iatk::registry::specs_json()
        .map_err(io::Error::other)
        .and_then(|specs| writeln!(stdout, "{specs}"));
    match printed {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            writeln!(stderr, "iatk: failed to print method specs: {error}").ok();
            ExitCode::FAILURE
        }
    }
}
