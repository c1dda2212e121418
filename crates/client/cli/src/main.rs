//! Line-based terminal client.
mod console;
mod session;

use std::process::ExitCode;

use anyhow::Result;

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = session::SessionConfig::from_env_and_args();
    session::run(config)
}
