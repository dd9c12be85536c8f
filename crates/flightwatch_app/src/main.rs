//! Command-line flight search: submits a search and follows its job until
//! results arrive.

mod platform;

use std::process::ExitCode;

use clap::Parser;
use platform::CliArgs;

fn main() -> anyhow::Result<ExitCode> {
    let args = CliArgs::parse();
    engine_logging::initialize(&args.log_destination(), args.log_level());

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(platform::run(args))
}
