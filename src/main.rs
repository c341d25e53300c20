//! Binary entrypoint that launches the Barnabas chat server.

use std::process::ExitCode;

use barnabas_chat::start_barnabas;

/// Start the server with configuration from the environment.
fn main() -> ExitCode {
    start_barnabas::run()
}
