use std::io::Read as _;
use std::path::{Path, PathBuf};

use sessiondeck::{DeckConfig, NavigationResolver};

use crate::cli::{Cli, Commands};
use crate::error::{CliError, Result};
use crate::output::{self, OutputFormat, ResolvedInput};
use crate::script::{self, Replay};

const CONFIG_FILE: &str = "config.json";

pub async fn dispatch(cli: Cli) -> Result<()> {
	let config = load_config(cli.config.as_deref())?;
	match cli.command {
		Commands::Resolve { inputs } => resolve(&config, &inputs, cli.format),
		Commands::Config => print_config(&config, cli.format),
		Commands::Replay { script } => replay(config, &script, cli.format).await,
	}
}

/// An explicit `--config` must exist. The default location may be absent.
fn load_config(explicit: Option<&Path>) -> Result<DeckConfig> {
	if let Some(path) = explicit {
		return Ok(DeckConfig::load(path)?);
	}
	match default_config_path() {
		Some(path) => Ok(DeckConfig::load_or_default(&path)?),
		None => Ok(DeckConfig::default()),
	}
}

fn default_config_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join("sessiondeck").join(CONFIG_FILE))
}

fn resolve(config: &DeckConfig, inputs: &[String], format: OutputFormat) -> Result<()> {
	let resolver = NavigationResolver::new(config.search_template.as_str());
	let results: Vec<ResolvedInput> = inputs
		.iter()
		.map(|input| {
			let resolved = resolver.resolve(input);
			ResolvedInput {
				input: input.clone(),
				url: resolved.as_ref().map(|r| r.url.clone()),
				kind: resolved.map(|r| r.kind),
			}
		})
		.collect();
	output::print_resolved(&results, format)?;
	Ok(())
}

fn print_config(config: &DeckConfig, format: OutputFormat) -> Result<()> {
	match format {
		OutputFormat::Json => output::print_json(config)?,
		OutputFormat::Text => println!("{}", serde_json::to_string_pretty(config)?),
	}
	Ok(())
}

async fn replay(config: DeckConfig, path: &Path, format: OutputFormat) -> Result<()> {
	let text = read_script(path)?;
	let steps = script::parse(&text)?;
	tracing::info!(target = "sessiondeck", path = %path.display(), steps = steps.len(), "replaying script");

	let replay = Replay::start(config).await?;
	let last = replay
		.run(&steps, |snapshot| output::print_snapshot(snapshot, format))
		.await?;
	output::print_snapshot(&last, format)?;
	Ok(())
}

fn read_script(path: &Path) -> Result<String> {
	let read = |source| CliError::Read {
		path: path.to_path_buf(),
		source,
	};
	if path.as_os_str() == "-" {
		let mut text = String::new();
		std::io::stdin().read_to_string(&mut text).map_err(read)?;
		return Ok(text);
	}
	std::fs::read_to_string(path).map_err(read)
}
