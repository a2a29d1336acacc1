//! Hover preview popup state machine.
//!
//! ```text
//! Hidden --enter handle(t)--> Visible(t)
//! Visible(t) --leave handle(t) / leave popup--> Visible(t) + armed hide timer
//! Visible(t) --enter popup / enter handle--> Visible(t), timer cancelled
//! Visible(t) --timer expires, pointer not over popup--> Hidden
//! Visible(t) --tab t removed--> Hidden (forced)
//! ```
//!
//! The controller never sleeps. Arming returns a [`HideTimer`] the caller
//! schedules and reports back through [`PopupController::timer_elapsed`];
//! stale tokens are ignored, so a superseded or cancelled timer is harmless
//! even if the caller fails to abort it.

use std::time::Duration;

use serde::Serialize;
use sessiondeck_protocol::TabId;

/// On-screen rectangle of the tab handle the popup is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Anchor {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

/// An armed hide timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HideTimer {
	pub token: u64,
	pub delay: Duration,
}

/// Presentation view of the popup.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupState {
	pub visible: bool,
	pub target_tab_id: Option<TabId>,
	pub hide_timer_armed: bool,
	/// The pointer rests on the popup surface; an expiring timer will not hide it.
	pub pointer_over_popup: bool,
	pub editing: bool,
	pub title: String,
	pub url: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub anchor: Option<Anchor>,
}

#[derive(Debug)]
pub struct PopupController {
	delay: Duration,
	target: Option<TabId>,
	anchor: Option<Anchor>,
	title: String,
	url: String,
	armed: Option<u64>,
	next_token: u64,
	over_popup: bool,
	editing: bool,
}

impl PopupController {
	pub fn new(delay: Duration) -> Self {
		Self {
			delay,
			target: None,
			anchor: None,
			title: String::new(),
			url: String::new(),
			armed: None,
			next_token: 1,
			over_popup: false,
			editing: false,
		}
	}

	pub fn is_visible(&self) -> bool {
		self.target.is_some()
	}

	pub fn target(&self) -> Option<TabId> {
		self.target
	}

	pub fn is_editing(&self) -> bool {
		self.editing
	}

	/// The currently armed timer, if any.
	pub fn armed_timer(&self) -> Option<HideTimer> {
		self.armed.map(|token| HideTimer {
			token,
			delay: self.delay,
		})
	}

	/// Pointer entered the handle of `tab`: show it, seeded with the tab's display fields.
	pub fn enter_handle(&mut self, tab: TabId, anchor: Anchor, title: &str, url: &str) {
		self.cancel_timer();
		self.over_popup = false;
		let retarget = self.target != Some(tab);
		if retarget {
			self.editing = false;
		}
		self.target = Some(tab);
		self.anchor = Some(anchor);
		if !self.editing {
			self.title = title.to_string();
			self.url = url.to_string();
		}
	}

	/// Pointer left the handle of `tab`. Arms the hide timer when that tab is shown.
	pub fn leave_handle(&mut self, tab: TabId) -> Option<HideTimer> {
		if self.target != Some(tab) {
			return None;
		}
		Some(self.arm())
	}

	/// Pointer entered the popup surface.
	pub fn enter_popup(&mut self) {
		if !self.is_visible() {
			return;
		}
		self.cancel_timer();
		self.over_popup = true;
	}

	/// Pointer left the popup surface.
	pub fn leave_popup(&mut self) -> Option<HideTimer> {
		if !self.is_visible() {
			return None;
		}
		self.over_popup = false;
		Some(self.arm())
	}

	/// A scheduled timer fired. Returns `true` when the popup was hidden.
	pub fn timer_elapsed(&mut self, token: u64) -> bool {
		if self.armed != Some(token) {
			return false;
		}
		self.armed = None;
		if self.over_popup {
			return false;
		}
		self.hide();
		true
	}

	/// Forces `Hidden` if the popup shows `tab`. Returns `true` when it did.
	pub fn tab_removed(&mut self, tab: TabId) -> bool {
		if self.target != Some(tab) {
			return false;
		}
		self.hide();
		true
	}

	/// The popup's address field gained focus.
	pub fn begin_edit(&mut self) {
		if self.is_visible() {
			self.editing = true;
		}
	}

	/// The popup's address field lost focus; resume display of live values.
	pub fn end_edit(&mut self, title: &str, url: &str) {
		if !self.editing {
			return;
		}
		self.editing = false;
		self.title = title.to_string();
		self.url = url.to_string();
	}

	/// Pushes live values for `tab`. Ignored when another tab is shown or while editing.
	pub fn refresh(&mut self, tab: TabId, title: &str, url: &str) -> bool {
		if self.target != Some(tab) || self.editing {
			return false;
		}
		self.title = title.to_string();
		self.url = url.to_string();
		true
	}

	pub fn hide(&mut self) {
		self.target = None;
		self.anchor = None;
		self.title.clear();
		self.url.clear();
		self.armed = None;
		self.over_popup = false;
		self.editing = false;
	}

	pub fn state(&self) -> PopupState {
		PopupState {
			visible: self.is_visible(),
			target_tab_id: self.target,
			hide_timer_armed: self.armed.is_some(),
			pointer_over_popup: self.over_popup,
			editing: self.editing,
			title: self.title.clone(),
			url: self.url.clone(),
			anchor: self.anchor,
		}
	}

	fn arm(&mut self) -> HideTimer {
		let token = self.next_token;
		self.next_token += 1;
		self.armed = Some(token);
		HideTimer {
			token,
			delay: self.delay,
		}
	}

	fn cancel_timer(&mut self) {
		self.armed = None;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const TAB: TabId = TabId::new(2);
	const OTHER: TabId = TabId::new(3);

	fn shown() -> PopupController {
		let mut popup = PopupController::new(Duration::from_millis(300));
		popup.enter_handle(TAB, Anchor::default(), "Inbox", "https://a.example");
		popup
	}

	#[test]
	fn entering_handle_shows_seeded_popup() {
		let popup = shown();
		let state = popup.state();
		assert!(state.visible);
		assert_eq!(state.target_tab_id, Some(TAB));
		assert_eq!(state.title, "Inbox");
		assert_eq!(state.url, "https://a.example");
		assert!(!state.hide_timer_armed);
	}

	#[test]
	fn handle_to_popup_before_delay_never_hides() {
		let mut popup = shown();
		let timer = popup.leave_handle(TAB).unwrap();
		popup.enter_popup();
		assert!(popup.state().pointer_over_popup);
		assert!(!popup.timer_elapsed(timer.token));
		assert!(popup.is_visible());

		popup.leave_popup().unwrap();
		assert!(!popup.state().pointer_over_popup);
	}

	#[test]
	fn state_serializes_pointer_flag_in_camel_case() {
		let mut popup = shown();
		popup.enter_popup();
		let value = serde_json::to_value(popup.state()).unwrap();
		assert_eq!(value["pointerOverPopup"], true);
		assert_eq!(value["targetTabId"], 2);
	}

	#[test]
	fn leaving_both_surfaces_hides_after_delay() {
		let mut popup = shown();
		popup.leave_handle(TAB).unwrap();
		popup.enter_popup();
		let timer = popup.leave_popup().unwrap();
		assert_eq!(timer.delay, Duration::from_millis(300));
		assert!(popup.timer_elapsed(timer.token));
		assert_eq!(popup.state(), PopupState::default());
	}

	#[test]
	fn superseded_timer_is_ignored() {
		let mut popup = shown();
		let first = popup.leave_handle(TAB).unwrap();
		popup.enter_handle(TAB, Anchor::default(), "Inbox", "https://a.example");
		let second = popup.leave_handle(TAB).unwrap();
		assert_ne!(first.token, second.token);

		assert!(!popup.timer_elapsed(first.token));
		assert!(popup.is_visible());
		assert!(popup.timer_elapsed(second.token));
	}

	#[test]
	fn leaving_a_different_handle_does_not_arm() {
		let mut popup = shown();
		assert!(popup.leave_handle(OTHER).is_none());
		assert!(popup.armed_timer().is_none());
	}

	#[test]
	fn tab_removal_forces_hidden_regardless_of_timer() {
		let mut popup = shown();
		let timer = popup.leave_handle(TAB).unwrap();
		assert!(popup.tab_removed(TAB));
		assert!(!popup.is_visible());
		assert!(!popup.timer_elapsed(timer.token));
	}

	#[test]
	fn editing_suppresses_refresh_until_focus_loss() {
		let mut popup = shown();
		popup.begin_edit();
		assert!(!popup.refresh(TAB, "Changed", "https://b.example"));
		assert_eq!(popup.state().url, "https://a.example");

		popup.end_edit("Changed", "https://b.example");
		assert!(!popup.is_editing());
		assert_eq!(popup.state().url, "https://b.example");
		assert!(popup.refresh(TAB, "Again", "https://c.example"));
	}

	#[test]
	fn hidden_popup_ignores_surface_events() {
		let mut popup = PopupController::new(Duration::from_millis(300));
		popup.enter_popup();
		assert!(popup.leave_popup().is_none());
		popup.begin_edit();
		assert!(!popup.is_editing());
	}

	#[test]
	fn retargeting_ends_edit_mode() {
		let mut popup = shown();
		popup.begin_edit();
		popup.enter_handle(OTHER, Anchor::default(), "Other", "https://o.example");
		assert!(!popup.is_editing());
		assert_eq!(popup.state().title, "Other");
	}
}
