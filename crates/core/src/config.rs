//! Orchestrator configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Placeholder substituted with the percent-encoded query.
pub const QUERY_PLACEHOLDER: &str = "{query}";

pub const DEFAULT_HOME_URL: &str = "about:blank";
pub const DEFAULT_SEARCH_TEMPLATE: &str = "https://www.google.com/search?q={query}";
pub const DEFAULT_HIDE_DELAY_MS: u64 = 300;
pub const DEFAULT_USER_AGENT: &str =
	"Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Settings for one orchestrator instance.
///
/// Every field has a default, so a partial (or empty) JSON object is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeckConfig {
	/// Start page of the pinned tab.
	pub home_url: String,
	/// Search-engine URL with a `{query}` placeholder.
	pub search_template: String,
	/// Delay before the hover popup hides after the pointer leaves it.
	pub hide_delay_ms: u64,
	/// User agent every session is created with.
	pub user_agent: String,
}

impl Default for DeckConfig {
	fn default() -> Self {
		Self {
			home_url: DEFAULT_HOME_URL.to_string(),
			search_template: DEFAULT_SEARCH_TEMPLATE.to_string(),
			hide_delay_ms: DEFAULT_HIDE_DELAY_MS,
			user_agent: DEFAULT_USER_AGENT.to_string(),
		}
	}
}

impl DeckConfig {
	/// Reads and validates a JSON config file.
	pub fn load(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path)
			.map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
		let config: Self = serde_json::from_str(&content)
			.map_err(|e| Error::Config(format!("invalid config {}: {e}", path.display())))?;
		config.validate()?;
		Ok(config)
	}

	/// Like [`load`](Self::load), but a missing file yields the defaults.
	pub fn load_or_default(path: &Path) -> Result<Self> {
		if !path.exists() {
			tracing::debug!(target = "sessiondeck", path = %path.display(), "no config file, using defaults");
			return Ok(Self::default());
		}
		Self::load(path)
	}

	pub fn validate(&self) -> Result<()> {
		if !self.search_template.contains(QUERY_PLACEHOLDER) {
			return Err(Error::Config(format!(
				"searchTemplate must contain {QUERY_PLACEHOLDER}: {:?}",
				self.search_template
			)));
		}
		if self.home_url.trim().is_empty() {
			return Err(Error::Config("homeUrl must not be empty".to_string()));
		}
		Ok(())
	}

	pub fn hide_delay(&self) -> Duration {
		Duration::from_millis(self.hide_delay_ms)
	}
}
