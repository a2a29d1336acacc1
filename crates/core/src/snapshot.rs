//! Presentation read model.

use serde::Serialize;
use sessiondeck_protocol::{PartitionKey, TabId, TabKind};

use crate::popup::PopupState;

/// Display record of one tab.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabView {
	pub id: TabId,
	pub title: String,
	pub url: String,
	pub pinned: bool,
	pub kind: TabKind,
	pub partition: PartitionKey,
}

/// Everything a UI layer needs to render the tab strip, address bar and popup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckSnapshot {
	/// Tabs in creation order.
	pub tabs: Vec<TabView>,
	pub active_id: Option<TabId>,
	/// Address bar text for the active tab.
	pub address: String,
	pub can_go_back: bool,
	pub can_go_forward: bool,
	pub popup: PopupState,
}

impl DeckSnapshot {
	pub fn tab(&self, id: TabId) -> Option<&TabView> {
		self.tabs.iter().find(|t| t.id == id)
	}

	pub fn active(&self) -> Option<&TabView> {
		self.active_id.and_then(|id| self.tab(id))
	}
}
