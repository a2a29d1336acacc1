//! Ordered tab records, the active pointer and the id allocator.
//!
//! Tabs are kept in insertion order in an [`IndexMap`], so "most recently
//! created remaining tab" is simply the tail after a removal.

use indexmap::IndexMap;
use sessiondeck_protocol::{PartitionKey, TabId, TabKind};

/// One managed browsing context plus its display metadata.
#[derive(Debug)]
pub struct Tab<S> {
	id: TabId,
	partition: PartitionKey,
	kind: TabKind,
	pinned: bool,
	pub(crate) url: String,
	pub(crate) title: String,
	session: S,
}

impl<S> Tab<S> {
	pub(crate) fn new(id: TabId, partition: PartitionKey, kind: TabKind, pinned: bool, url: String, session: S) -> Self {
		Self {
			id,
			partition,
			kind,
			pinned,
			url,
			title: String::new(),
			session,
		}
	}

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

	/// Last URL observed from the session.
	pub fn url(&self) -> &str {
		&self.url
	}

	/// Last title observed from the session.
	pub fn title(&self) -> &str {
		&self.title
	}

	pub fn session(&self) -> &S {
		&self.session
	}

	pub fn session_mut(&mut self) -> &mut S {
		&mut self.session
	}

	/// Consumes the tab, handing back its session.
	pub fn into_session(self) -> S {
		self.session
	}
}

/// Outcome of a successful [`TabRegistry::remove`].
#[derive(Debug)]
pub struct Removed<S> {
	pub tab: Tab<S>,
	/// The removed tab held the active pointer.
	pub was_active: bool,
	/// Active tab after the removal.
	pub active: Option<TabId>,
}

#[derive(Debug)]
pub struct TabRegistry<S> {
	next_id: u64,
	tabs: IndexMap<TabId, Tab<S>>,
	active: Option<TabId>,
}

impl<S> Default for TabRegistry<S> {
	fn default() -> Self {
		Self::new()
	}
}

impl<S> TabRegistry<S> {
	pub fn new() -> Self {
		Self {
			next_id: 1,
			tabs: IndexMap::new(),
			active: None,
		}
	}

	/// Returns a fresh id. Ids are never handed out twice.
	pub fn allocate_id(&mut self) -> TabId {
		let id = TabId::new(self.next_id);
		self.next_id += 1;
		id
	}

	/// Inserts a tab at the tail and makes it active.
	pub(crate) fn insert(&mut self, tab: Tab<S>) {
		debug_assert!(!self.tabs.contains_key(&tab.id), "tab ids are never reused");
		debug_assert!(!(tab.pinned && self.pinned_id().is_some()), "only one pinned tab");
		let id = tab.id;
		self.tabs.insert(id, tab);
		self.active = Some(id);
	}

	/// Removes a non-pinned tab, promoting the tail when it was active.
	///
	/// Unknown and pinned ids are no-ops.
	pub(crate) fn remove(&mut self, id: TabId) -> Option<Removed<S>> {
		if self.tabs.get(&id)?.pinned {
			return None;
		}
		let tab = self.tabs.shift_remove(&id)?;
		let was_active = self.active == Some(id);
		if was_active {
			self.active = self.tabs.last().map(|(id, _)| *id);
		}
		Some(Removed {
			tab,
			was_active,
			active: self.active,
		})
	}

	/// Moves the active pointer. Returns `false` for unknown ids.
	pub(crate) fn set_active(&mut self, id: TabId) -> bool {
		if !self.tabs.contains_key(&id) {
			return false;
		}
		self.active = Some(id);
		true
	}

	pub fn contains(&self, id: TabId) -> bool {
		self.tabs.contains_key(&id)
	}

	pub fn get(&self, id: TabId) -> Option<&Tab<S>> {
		self.tabs.get(&id)
	}

	pub(crate) fn get_mut(&mut self, id: TabId) -> Option<&mut Tab<S>> {
		self.tabs.get_mut(&id)
	}

	pub fn active_id(&self) -> Option<TabId> {
		self.active
	}

	pub fn active(&self) -> Option<&Tab<S>> {
		self.active.and_then(|id| self.tabs.get(&id))
	}

	pub(crate) fn active_mut(&mut self) -> Option<&mut Tab<S>> {
		let id = self.active?;
		self.tabs.get_mut(&id)
	}

	pub fn pinned_id(&self) -> Option<TabId> {
		self.tabs.values().find(|t| t.pinned).map(|t| t.id)
	}

	pub fn len(&self) -> usize {
		self.tabs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tabs.is_empty()
	}

	/// Tabs in creation order.
	pub fn iter(&self) -> impl Iterator<Item = &Tab<S>> {
		self.tabs.values()
	}
}
