//! The `glnav` binary.

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use glnav_cli::CliArgs;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    match glnav_cli::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err}", "Error:".red().bold());
            ExitCode::from(err.exit_code())
        }
    }
}
