//! [`Orchestrator`]: the tab registry, popup and address bar behind one API.
//!
//! The orchestrator is sans-IO. Operations that need a collaborator to do
//! asynchronous work are split in two: `begin_*` mutates nothing but the id
//! allocator and hands back what the caller must run (a [`PendingTab`] to
//! construct, cookies to inject), and a completion method folds the result
//! back in. Between the halves any other operation may run, so every
//! completion re-validates the tab id it refers to.

mod hover;
mod inbound;
mod session_events;
#[cfg(test)]
mod tests;

use sessiondeck_protocol::{PartitionKey, TabId, TabKind};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

pub use self::inbound::InboundRequest;
pub use self::session_events::TabRequest;
use crate::config::DeckConfig;
use crate::error::SessionCreationError;
use crate::popup::PopupController;
use crate::registry::{Tab, TabRegistry};
use crate::resolver::NavigationResolver;
use crate::session::{EventSink, Session, SessionSpec, TabEvent};
use crate::snapshot::{DeckSnapshot, TabView};

/// A tab whose id and partition are allocated but whose session is not built yet.
#[derive(Debug)]
pub struct PendingTab {
	id: TabId,
	partition: PartitionKey,
	kind: TabKind,
	pinned: bool,
	url: String,
	user_agent: String,
	events: EventSink,
}

impl PendingTab {
	pub fn id(&self) -> TabId {
		self.id
	}

	pub fn partition(&self) -> &PartitionKey {
		&self.partition
	}

	pub fn kind(&self) -> &TabKind {
		&self.kind
	}

	pub fn is_pinned(&self) -> bool {
		self.pinned
	}

	pub fn url(&self) -> &str {
		&self.url
	}

	/// What the session factory must build.
	pub fn spec(&self) -> SessionSpec {
		SessionSpec {
			tab_id: self.id,
			partition: self.partition.clone(),
			url: self.url.clone(),
			user_agent: self.user_agent.clone(),
		}
	}

	/// Event subscription for the new session.
	pub fn sink(&self) -> EventSink {
		self.events.clone()
	}
}

pub struct Orchestrator<S> {
	registry: TabRegistry<S>,
	popup: PopupController,
	resolver: NavigationResolver,
	address: String,
	home_url: String,
	user_agent: String,
	events: mpsc::UnboundedSender<TabEvent>,
	pinned_claimed: bool,
}

impl<S: Session> Orchestrator<S> {
	/// Creates an orchestrator whose sessions report into `events`.
	///
	/// Fails with [`Error::Config`](crate::Error::Config) when `config` does not validate.
	pub fn new(config: &DeckConfig, events: mpsc::UnboundedSender<TabEvent>) -> crate::Result<Self> {
		config.validate()?;
		Ok(Self {
			registry: TabRegistry::new(),
			popup: PopupController::new(config.hide_delay()),
			resolver: NavigationResolver::new(config.search_template.clone()),
			address: String::new(),
			home_url: config.home_url.clone(),
			user_agent: config.user_agent.clone(),
			events,
			pinned_claimed: false,
		})
	}

	pub fn registry(&self) -> &TabRegistry<S> {
		&self.registry
	}

	pub fn popup(&self) -> &PopupController {
		&self.popup
	}

	pub fn resolver(&self) -> &NavigationResolver {
		&self.resolver
	}

	/// Address bar text for the active tab.
	pub fn address(&self) -> &str {
		&self.address
	}

	/// Claims the pinned home tab. Returns `None` once it is claimed.
	pub fn begin_pinned(&mut self) -> Option<PendingTab> {
		if self.pinned_claimed {
			return None;
		}
		self.pinned_claimed = true;
		let url = self.home_url.clone();
		Some(self.pending(url, TabKind::Home, true))
	}

	/// Allocates the id and partition of a new, non-pinned tab.
	pub fn begin_create(&mut self, url: impl Into<String>, kind: TabKind) -> PendingTab {
		self.pending(url.into(), kind, false)
	}

	fn pending(&mut self, url: String, kind: TabKind, pinned: bool) -> PendingTab {
		let id = self.registry.allocate_id();
		let partition = if pinned { PartitionKey::main() } else { PartitionKey::for_tab(id) };
		debug!(target = "sessiondeck", tab_id = %id, %partition, %url, "allocating tab");
		PendingTab {
			id,
			partition,
			kind,
			pinned,
			url,
			user_agent: self.user_agent.clone(),
			events: EventSink::new(id, self.events.clone()),
		}
	}

	/// Registers the constructed session and activates the tab.
	pub fn finish_create(&mut self, pending: PendingTab, session: S) -> TabId {
		let PendingTab {
			id,
			partition,
			kind,
			pinned,
			url,
			..
		} = pending;
		info!(target = "sessiondeck", tab_id = %id, %partition, kind = kind.label(), pinned, "tab created");
		let mut tab = Tab::new(id, partition, kind, pinned, url, session);
		// Events the session emitted while under construction were dropped as stale.
		fold_live(&mut tab);
		self.registry.insert(tab);
		self.sync_address();
		id
	}

	/// Records a failed construction. The registry is left untouched.
	pub fn fail_create(&mut self, pending: PendingTab, err: &SessionCreationError) {
		warn!(target = "sessiondeck", tab_id = %pending.id, partition = %pending.partition, error = %err, "session creation failed");
		if pending.pinned {
			self.pinned_claimed = false;
		}
	}

	/// Creates a tab with a synchronous session builder.
	pub fn create_tab<F>(&mut self, url: impl Into<String>, kind: TabKind, build: F) -> Result<TabId, SessionCreationError>
	where
		F: FnOnce(SessionSpec, EventSink) -> Result<S, SessionCreationError>,
	{
		let pending = self.begin_create(url, kind);
		self.complete_with(pending, build)
	}

	/// Creates the pinned home tab with a synchronous session builder.
	///
	/// Returns the existing pinned id when it was already created.
	pub fn create_pinned<F>(&mut self, build: F) -> Result<TabId, SessionCreationError>
	where
		F: FnOnce(SessionSpec, EventSink) -> Result<S, SessionCreationError>,
	{
		match self.begin_pinned() {
			Some(pending) => self.complete_with(pending, build),
			None => self
				.registry
				.pinned_id()
				.ok_or_else(|| SessionCreationError::new(PartitionKey::main(), "pinned tab is still being created")),
		}
	}

	fn complete_with<F>(&mut self, pending: PendingTab, build: F) -> Result<TabId, SessionCreationError>
	where
		F: FnOnce(SessionSpec, EventSink) -> Result<S, SessionCreationError>,
	{
		match build(pending.spec(), pending.sink()) {
			Ok(session) => Ok(self.finish_create(pending, session)),
			Err(err) => {
				self.fail_create(pending, &err);
				Err(err)
			}
		}
	}

	/// Focuses `id`. Unknown ids are no-ops.
	pub fn switch_active(&mut self, id: TabId) -> bool {
		if !self.registry.set_active(id) {
			debug!(target = "sessiondeck", tab_id = %id, "switch to unknown tab ignored");
			return false;
		}
		debug!(target = "sessiondeck", tab_id = %id, "tab activated");
		self.sync_address();
		true
	}

	/// Closes `id`, releasing its session. Unknown and pinned ids are no-ops.
	pub fn remove_tab(&mut self, id: TabId) -> bool {
		let Some(removed) = self.registry.remove(id) else {
			debug!(target = "sessiondeck", tab_id = %id, "remove ignored (unknown or pinned)");
			return false;
		};
		if self.popup.tab_removed(id) {
			debug!(target = "sessiondeck", tab_id = %id, "popup hidden for removed tab");
		}
		if removed.was_active {
			self.sync_address();
		}
		info!(
			target = "sessiondeck",
			tab_id = %id,
			partition = %removed.tab.partition(),
			active = ?removed.active.map(|a| a.get()),
			"tab removed"
		);
		drop(removed.tab.into_session());
		true
	}

	/// Resolves address-bar input and navigates the active tab.
	///
	/// Returns the resolved URL, or `None` for blank input or no active tab.
	pub fn navigate(&mut self, raw: &str) -> Option<String> {
		let resolved = self.resolver.resolve(raw)?;
		let tab = self.registry.active_mut()?;
		debug!(target = "sessiondeck", tab_id = %tab.id(), url = %resolved.url, rule = ?resolved.kind, "navigating");
		tab.session_mut().navigate(&resolved.url);
		self.address = resolved.url.clone();
		Some(resolved.url)
	}

	pub fn reload(&mut self) -> bool {
		let Some(tab) = self.registry.active_mut() else {
			return false;
		};
		tab.session_mut().reload();
		true
	}

	pub fn go_back(&mut self) -> bool {
		let Some(tab) = self.registry.active_mut() else {
			return false;
		};
		if !tab.session().can_go_back() {
			return false;
		}
		tab.session_mut().go_back();
		true
	}

	pub fn go_forward(&mut self) -> bool {
		let Some(tab) = self.registry.active_mut() else {
			return false;
		};
		if !tab.session().can_go_forward() {
			return false;
		}
		tab.session_mut().go_forward();
		true
	}

	pub fn snapshot(&self) -> DeckSnapshot {
		let active = self.registry.active();
		DeckSnapshot {
			tabs: self
				.registry
				.iter()
				.map(|tab| TabView {
					id: tab.id(),
					title: tab.title().to_string(),
					url: tab.url().to_string(),
					pinned: tab.is_pinned(),
					kind: tab.kind().clone(),
					partition: tab.partition().clone(),
				})
				.collect(),
			active_id: self.registry.active_id(),
			address: self.address.clone(),
			can_go_back: active.is_some_and(|t| t.session().can_go_back()),
			can_go_forward: active.is_some_and(|t| t.session().can_go_forward()),
			popup: self.popup.state(),
		}
	}

	/// Re-reads the address display from the active tab's live URL.
	///
	/// A popup showing the newly active tab picks up the fields it folded
	/// while inactive.
	fn sync_address(&mut self) {
		let Some(tab) = self.registry.active() else {
			self.address.clear();
			return;
		};
		self.address = live_url(tab);
		if self.popup.refresh(tab.id(), tab.title(), &self.address) {
			trace!(target = "sessiondeck", tab_id = %tab.id(), "popup refreshed");
		}
	}
}

/// Copies the session's live URL and title onto the tab record.
fn fold_live<S: Session>(tab: &mut Tab<S>) {
	if let Some(url) = tab.session().url() {
		tab.url = url;
	}
	if let Some(title) = tab.session().title() {
		tab.title = title;
	}
}

/// The session's live URL, or the cached one before the first load commits.
fn live_url<S: Session>(tab: &Tab<S>) -> String {
	tab.session().url().filter(|u| !u.is_empty()).unwrap_or_else(|| tab.url().to_string())
}
