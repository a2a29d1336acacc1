//! Rendering of command results.
//!
//! JSON output is one compact document per line, so a replay that takes
//! several snapshots can be consumed as NDJSON. Text output is for humans.


use std::fmt::Write as _;
use std::io::{self, Write};

use colored::Colorize;
use serde::Serialize;
use sessiondeck::{DeckSnapshot, InputKind, PopupState};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text
	#[default]
	Text,
	/// One JSON document per line
	Json,
}

/// One `deck resolve` result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedInput {
	pub input: String,
	pub url: Option<String>,
	pub kind: Option<InputKind>,
}

pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
	let json = serde_json::to_string(value).map_err(io::Error::other)?;
	writeln!(io::stdout().lock(), "{json}")
}

pub fn print_resolved(results: &[ResolvedInput], format: OutputFormat) -> io::Result<()> {
	match format {
		OutputFormat::Json => print_json(&results),
		OutputFormat::Text => {
			let mut stdout = io::stdout().lock();
			for result in results {
				match &result.url {
					Some(url) => writeln!(stdout, "{url}")?,
					None => writeln!(stdout, "{}", "(ignored)".dimmed())?,
				}
			}
			Ok(())
		}
	}
}

pub fn print_snapshot(snapshot: &DeckSnapshot, format: OutputFormat) -> io::Result<()> {
	match format {
		OutputFormat::Json => print_json(snapshot),
		OutputFormat::Text => {
			let mut stdout = io::stdout().lock();
			write!(stdout, "{}", render_snapshot(snapshot))
		}
	}
}

/// Text table of the tab strip, address bar and popup.
pub fn render_snapshot(snapshot: &DeckSnapshot) -> String {
	let mut out = String::new();
	for tab in &snapshot.tabs {
		let active = snapshot.active_id == Some(tab.id);
		let marker = if active { "*".green().bold() } else { " ".normal() };
		let id = format!("[{}]", tab.id);
		let id = if tab.pinned { id.as_str().bold() } else { id.as_str().normal() };
		let _ = writeln!(
			out,
			"{marker} {id:<5} {:<10} {:<8} {}  {}",
			tab.kind.label(),
			tab.partition.as_str().dimmed(),
			tab.url,
			format!("{:?}", tab.title).as_str().dimmed(),
		);
	}
	let _ = writeln!(out, "address: {}", snapshot.address);
	let _ = writeln!(out, "history: back={} forward={}", snapshot.can_go_back, snapshot.can_go_forward);
	let _ = writeln!(out, "popup: {}", describe_popup(&snapshot.popup));
	out
}

fn describe_popup(popup: &PopupState) -> String {
	let Some(target) = popup.target_tab_id.filter(|_| popup.visible) else {
		return "hidden".to_string();
	};
	let mut text = format!("tab {target} {}", popup.url);
	if popup.hide_timer_armed {
		text.push_str(" (hiding)");
	}
	if popup.editing {
		text.push_str(" (editing)");
	}
	text
}
