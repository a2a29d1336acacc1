//! Pointer and focus input routed to the popup controller.

use sessiondeck_protocol::TabId;
use tracing::debug;

use super::Orchestrator;
use crate::popup::{Anchor, HideTimer};
use crate::session::Session;

impl<S: Session> Orchestrator<S> {
	/// Pointer entered the handle of `id`. Unknown ids are no-ops.
	pub fn hover_tab(&mut self, id: TabId, anchor: Anchor) -> bool {
		let Some(tab) = self.registry.get(id) else {
			return false;
		};
		self.popup.enter_handle(id, anchor, tab.title(), tab.url());
		true
	}

	/// Pointer left the handle of `id`. The returned timer must be scheduled.
	pub fn unhover_tab(&mut self, id: TabId) -> Option<HideTimer> {
		self.popup.leave_handle(id)
	}

	pub fn enter_popup(&mut self) {
		self.popup.enter_popup();
	}

	/// Pointer left the popup surface. The returned timer must be scheduled.
	pub fn leave_popup(&mut self) -> Option<HideTimer> {
		self.popup.leave_popup()
	}

	/// A scheduled hide timer fired. Returns `true` when the popup was hidden.
	pub fn hide_timer_elapsed(&mut self, token: u64) -> bool {
		let hidden = self.popup.timer_elapsed(token);
		if hidden {
			debug!(target = "sessiondeck", token, "popup hidden");
		}
		hidden
	}

	/// The popup's address field gained focus.
	pub fn popup_edit_started(&mut self) {
		self.popup.begin_edit();
	}

	/// The popup's address field lost focus. Reverts to the target's live values.
	pub fn popup_edit_finished(&mut self) {
		let Some(tab) = self.popup.target().and_then(|id| self.registry.get(id)) else {
			return;
		};
		self.popup.end_edit(tab.title(), tab.url());
	}

	/// Submits the popup's address field, navigating the tab it shows.
	pub fn popup_navigate(&mut self, raw: &str) -> Option<String> {
		let id = self.popup.target()?;
		let resolved = self.resolver.resolve(raw)?;
		let tab = self.registry.get_mut(id)?;
		debug!(target = "sessiondeck", tab_id = %id, url = %resolved.url, "navigating from popup");
		tab.session_mut().navigate(&resolved.url);
		self.popup.end_edit(tab.title(), &resolved.url);
		self.popup.refresh(id, tab.title(), &resolved.url);
		if self.registry.active_id() == Some(id) {
			self.address = resolved.url.clone();
		}
		Some(resolved.url)
	}
}
