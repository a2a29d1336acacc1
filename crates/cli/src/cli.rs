use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use crate::styles::cli_styles;

#[derive(Parser, Debug)]
#[command(name = "deck")]
#[command(about = "Drive a sessiondeck tab orchestrator from the command line")]
#[command(version)]
#[command(styles = cli_styles())]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format
	#[arg(short = 'f', long, global = true, value_enum, default_value = "text")]
	pub format: OutputFormat,

	/// Config file (defaults to <config dir>/sessiondeck/config.json)
	#[arg(short, long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Resolve address-bar input to the URL it would navigate to
	Resolve {
		/// Raw inputs, e.g. `localhost:3000`, `example.com`, `hello world`
		#[arg(required = true, value_name = "INPUT")]
		inputs: Vec<String>,
	},

	/// Print the effective configuration
	Config,

	/// Replay a JSON-lines script against the in-memory backend
	Replay {
		/// Script file, or `-` for stdin
		#[arg(value_name = "SCRIPT")]
		script: PathBuf,
	},
}
