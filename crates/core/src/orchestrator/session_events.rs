//! Lifecycle-event fold.

use sessiondeck_protocol::{TabId, TabKind};
use tracing::{debug, trace};

use super::{Orchestrator, fold_live};
use crate::session::{Session, SessionEvent, TabEvent};

/// A tab the caller must create on the orchestrator's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabRequest {
	pub url: String,
	pub kind: TabKind,
	/// The tab whose page asked for it.
	pub opener: TabId,
}

impl<S: Session> Orchestrator<S> {
	/// Folds one session event into the registry.
	///
	/// Events for tabs that no longer exist are dropped. A pop-out request is
	/// handed back as a [`TabRequest`] since session construction belongs to
	/// the caller.
	pub fn on_session_event(&mut self, event: TabEvent) -> Option<TabRequest> {
		let TabEvent { tab_id, event } = event;
		let Some(tab) = self.registry.get_mut(tab_id) else {
			debug!(target = "sessiondeck", %tab_id, event = event.name(), "event for unknown tab dropped");
			return None;
		};
		trace!(target = "sessiondeck", %tab_id, event = event.name(), "session event");

		match event {
			SessionEvent::LoadFinished | SessionEvent::Navigated | SessionEvent::NavigatedInPage => fold_live(tab),
			SessionEvent::TitleUpdated(title) => tab.title = title,
			SessionEvent::NewWindowRequested(url) => {
				debug!(target = "sessiondeck", %tab_id, %url, "pop-out requested");
				return Some(TabRequest {
					url,
					kind: TabKind::Generic,
					opener: tab_id,
				});
			}
		}

		if self.registry.active_id() == Some(tab_id) {
			self.propagate(tab_id);
		}
		None
	}

	/// Pushes a tab's folded fields to the address display and its popup.
	fn propagate(&mut self, tab_id: TabId) {
		let Some(tab) = self.registry.get(tab_id) else {
			return;
		};
		self.address = tab.url().to_string();
		if self.popup.refresh(tab_id, tab.title(), tab.url()) {
			trace!(target = "sessiondeck", %tab_id, "popup refreshed");
		}
	}
}
