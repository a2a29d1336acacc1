//! Tab identifiers, storage partition keys and tab kinds.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Process-unique tab identifier.
///
/// Allocated monotonically by the tab registry and never reused, so anything
/// derived from it (notably [`PartitionKey::for_tab`]) is unique as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(u64);

impl TabId {
	pub const fn new(raw: u64) -> Self {
		Self(raw)
	}

	pub const fn get(self) -> u64 {
		self.0
	}
}

impl fmt::Display for TabId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

const MAIN_PARTITION: &str = "main";
const TAB_PARTITION_PREFIX: &str = "tab:";

/// Name of an isolated cookie/storage namespace.
///
/// The pinned tab lives in `"main"`, every other tab in `"tab:<id>"`. Two
/// sessions in different partitions never share cookies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartitionKey(String);

impl PartitionKey {
	/// The shared partition of the pinned tab.
	pub fn main() -> Self {
		Self(MAIN_PARTITION.to_string())
	}

	/// The dedicated partition of a non-pinned tab.
	pub fn for_tab(id: TabId) -> Self {
		Self(format!("{TAB_PARTITION_PREFIX}{id}"))
	}

	pub fn is_main(&self) -> bool {
		self.0 == MAIN_PARTITION
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for PartitionKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Icon tag for a tab. Carries no behavior.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TabKind {
	/// The pinned home tab.
	Home,
	/// A tab opened by the user or by a page pop-out.
	#[default]
	Generic,
	/// A tab opened for a managed account through the inbound channel.
	Account { label: String },
}

impl TabKind {
	pub fn account(label: impl Into<String>) -> Self {
		Self::Account { label: label.into() }
	}

	/// Short label suitable for a tab strip.
	pub fn label(&self) -> &str {
		match self {
			TabKind::Home => "home",
			TabKind::Generic => "generic",
			TabKind::Account { label } => label,
		}
	}
}
