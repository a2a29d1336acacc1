mod cli;
mod commands;
mod error;
mod logging;
mod output;
mod script;
mod styles;

use clap::Parser;
use colored::Colorize;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	if let Err(err) = commands::dispatch(cli).await {
		eprintln!("{} {:#}", "error:".red().bold(), anyhow::Error::from(err));
		std::process::exit(1);
	}
}
