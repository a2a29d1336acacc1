//! In-memory collaborators for tests and script replay.
//!
//! Provides a [`SessionFactory`] and [`CredentialInjector`] that never touch a
//! real browser engine:
//!
//! - [`MemorySession`]: history-keeping session that reports lifecycle events
//! - [`MemoryPage`]: external handle to a live session, used to simulate what
//!   a page does on its own (title changes, in-page navigation, pop-outs)
//! - [`MemoryJournal`]: shared log of every session command, creation and release
//! - [`MemoryInjector`]: per-partition cookie jars with a failure switch
//!
//! ```ignore
//! let factory = MemorySessionFactory::new();
//! let injector = MemoryInjector::new();
//! let deck = Deck::start(DeckConfig::default(), factory.clone(), injector.clone()).await?;
//! deck.inbound(payload).await?;
//! assert_eq!(injector.attempts().len(), 1);
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use sessiondeck_protocol::{Cookie, PartitionKey, TabId};

use crate::error::{InjectionError, SessionCreationError};
use crate::session::{CredentialInjector, EventSink, Session, SessionEvent, SessionFactory, SessionSpec};

/// A command observed by the in-memory backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalEntry {
	Created { tab_id: TabId, partition: PartitionKey },
	Navigate { tab_id: TabId, url: String },
	Reload { tab_id: TabId },
	Back { tab_id: TabId },
	Forward { tab_id: TabId },
	Released { tab_id: TabId },
}

/// Shared, append-only command log.
#[derive(Debug, Clone, Default)]
pub struct MemoryJournal {
	entries: Arc<Mutex<Vec<JournalEntry>>>,
}

impl MemoryJournal {
	fn push(&self, entry: JournalEntry) {
		self.entries.lock().push(entry);
	}

	pub fn entries(&self) -> Vec<JournalEntry> {
		self.entries.lock().clone()
	}

	pub fn count(&self, predicate: impl Fn(&JournalEntry) -> bool) -> usize {
		self.entries.lock().iter().filter(|e| predicate(e)).count()
	}
}

#[derive(Debug)]
struct PageState {
	/// `(url, title)` entries; `index` points at the current one.
	history: Vec<(String, String)>,
	index: Option<usize>,
}

impl PageState {
	fn current(&self) -> Option<&(String, String)> {
		self.index.and_then(|i| self.history.get(i))
	}

	fn push(&mut self, url: &str) {
		let keep = self.index.map_or(0, |i| i + 1);
		self.history.truncate(keep);
		self.history.push((url.to_string(), title_for(url)));
		self.index = Some(self.history.len() - 1);
	}
}

/// Derives a stand-in document title from a URL: its host, or the URL itself.
pub fn title_for(url: &str) -> String {
	let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
	let host = rest.split(['/', '?', '#']).next().unwrap_or(rest);
	if host.is_empty() { url.to_string() } else { host.to_string() }
}

/// Session backed by an in-memory history list.
///
/// Every committed navigation emits `Navigated` followed by `LoadFinished`.
pub struct MemorySession {
	tab_id: TabId,
	partition: PartitionKey,
	user_agent: String,
	state: Arc<Mutex<PageState>>,
	events: EventSink,
	journal: MemoryJournal,
	factory: Arc<Mutex<FactoryState>>,
}

impl MemorySession {
	pub fn tab_id(&self) -> TabId {
		self.tab_id
	}

	pub fn partition(&self) -> &PartitionKey {
		&self.partition
	}

	pub fn user_agent(&self) -> &str {
		&self.user_agent
	}

	/// URLs in history order.
	pub fn history(&self) -> Vec<String> {
		self.state.lock().history.iter().map(|(url, _)| url.clone()).collect()
	}

	fn commit(&self) {
		self.events.emit(SessionEvent::Navigated);
		self.events.emit(SessionEvent::LoadFinished);
	}
}

impl Session for MemorySession {
	fn navigate(&mut self, url: &str) {
		self.journal.push(JournalEntry::Navigate {
			tab_id: self.tab_id,
			url: url.to_string(),
		});
		self.state.lock().push(url);
		self.commit();
	}

	fn reload(&mut self) {
		self.journal.push(JournalEntry::Reload { tab_id: self.tab_id });
		self.events.emit(SessionEvent::LoadFinished);
	}

	fn go_back(&mut self) {
		self.journal.push(JournalEntry::Back { tab_id: self.tab_id });
		let moved = {
			let mut state = self.state.lock();
			let index = state.index;
			match index {
				Some(i) if i > 0 => {
					state.index = Some(i - 1);
					true
				}
				_ => false,
			}
		};
		if moved {
			self.commit();
		}
	}

	fn go_forward(&mut self) {
		self.journal.push(JournalEntry::Forward { tab_id: self.tab_id });
		let moved = {
			let mut state = self.state.lock();
			let len = state.history.len();
			let index = state.index;
			match index {
				Some(i) if i + 1 < len => {
					state.index = Some(i + 1);
					true
				}
				_ => false,
			}
		};
		if moved {
			self.commit();
		}
	}

	fn can_go_back(&self) -> bool {
		self.state.lock().index.is_some_and(|i| i > 0)
	}

	fn can_go_forward(&self) -> bool {
		let state = self.state.lock();
		state.index.is_some_and(|i| i + 1 < state.history.len())
	}

	fn url(&self) -> Option<String> {
		self.state.lock().current().map(|(url, _)| url.clone())
	}

	fn title(&self) -> Option<String> {
		self.state.lock().current().map(|(_, title)| title.clone())
	}
}

impl Drop for MemorySession {
	fn drop(&mut self) {
		self.factory.lock().pages.remove(&self.tab_id);
		self.journal.push(JournalEntry::Released { tab_id: self.tab_id });
	}
}

/// External handle to a live [`MemorySession`].
#[derive(Clone)]
pub struct MemoryPage {
	state: Arc<Mutex<PageState>>,
	events: EventSink,
}

impl MemoryPage {
	/// Commits the initial load of a session created with autoload disabled.
	pub fn finish_load(&self, url: &str) {
		self.state.lock().push(url);
		self.events.emit(SessionEvent::Navigated);
		self.events.emit(SessionEvent::LoadFinished);
	}

	/// The page changed its document title.
	pub fn set_title(&self, title: &str) {
		{
			let mut state = self.state.lock();
			if let Some(i) = state.index {
				state.history[i].1 = title.to_string();
			}
		}
		self.events.emit(SessionEvent::TitleUpdated(title.to_string()));
	}

	/// Same-document navigation (fragment or history API).
	pub fn navigate_in_page(&self, url: &str) {
		{
			let mut state = self.state.lock();
			let title = state.current().map(|(_, t)| t.clone()).unwrap_or_default();
			state.push(url);
			if let Some(i) = state.index {
				state.history[i].1 = title;
			}
		}
		self.events.emit(SessionEvent::NavigatedInPage);
	}

	/// The page asked for a new window.
	pub fn request_new_window(&self, url: &str) {
		self.events.emit(SessionEvent::NewWindowRequested(url.to_string()));
	}

	/// Raw event, bypassing page state.
	pub fn emit(&self, event: SessionEvent) {
		self.events.emit(event);
	}
}

#[derive(Default)]
struct FactoryState {
	pages: HashMap<TabId, MemoryPage>,
	specs: Vec<SessionSpec>,
}

/// Factory producing [`MemorySession`]s.
#[derive(Clone)]
pub struct MemorySessionFactory {
	state: Arc<Mutex<FactoryState>>,
	journal: MemoryJournal,
	fail_next: Arc<AtomicBool>,
	autoload: bool,
	delay: Option<Duration>,
}

impl Default for MemorySessionFactory {
	fn default() -> Self {
		Self::new()
	}
}

impl MemorySessionFactory {
	pub fn new() -> Self {
		Self {
			state: Arc::default(),
			journal: MemoryJournal::default(),
			fail_next: Arc::new(AtomicBool::new(false)),
			autoload: true,
			delay: None,
		}
	}

	/// Sessions start unloaded; commit with [`MemoryPage::finish_load`].
	pub fn without_autoload(mut self) -> Self {
		self.autoload = false;
		self
	}

	/// Construction takes `delay` of (tokio) time.
	pub fn with_delay(mut self, delay: Duration) -> Self {
		self.delay = Some(delay);
		self
	}

	/// The next construction fails with [`SessionCreationError`].
	pub fn fail_next(&self) {
		self.fail_next.store(true, Ordering::SeqCst);
	}

	pub fn journal(&self) -> &MemoryJournal {
		&self.journal
	}

	/// Handle to the page of a live session. Released sessions have none.
	pub fn page(&self, tab_id: TabId) -> Option<MemoryPage> {
		self.state.lock().pages.get(&tab_id).cloned()
	}

	/// Specs of every construction attempt, in order.
	pub fn specs(&self) -> Vec<SessionSpec> {
		self.state.lock().specs.clone()
	}

	/// Synchronous construction, for driving an orchestrator without a runtime.
	pub fn build(&self, spec: SessionSpec, events: EventSink) -> Result<MemorySession, SessionCreationError> {
		self.state.lock().specs.push(spec.clone());
		if self.fail_next.swap(false, Ordering::SeqCst) {
			return Err(SessionCreationError::new(spec.partition, "simulated engine failure"));
		}

		let state = Arc::new(Mutex::new(PageState {
			history: Vec::new(),
			index: None,
		}));
		self.state.lock().pages.insert(
			spec.tab_id,
			MemoryPage {
				state: Arc::clone(&state),
				events: events.clone(),
			},
		);
		self.journal.push(JournalEntry::Created {
			tab_id: spec.tab_id,
			partition: spec.partition.clone(),
		});

		let session = MemorySession {
			tab_id: spec.tab_id,
			partition: spec.partition,
			user_agent: spec.user_agent,
			state,
			events,
			journal: self.journal.clone(),
			factory: Arc::clone(&self.state),
		};
		if self.autoload {
			session.state.lock().push(&spec.url);
			session.commit();
		}
		Ok(session)
	}
}

#[async_trait]
impl SessionFactory for MemorySessionFactory {
	type Session = MemorySession;

	async fn create(&self, spec: SessionSpec, events: EventSink) -> Result<MemorySession, SessionCreationError> {
		if let Some(delay) = self.delay {
			tokio::time::sleep(delay).await;
		}
		self.build(spec, events)
	}
}

/// Injector writing into per-partition cookie jars.
#[derive(Clone, Default)]
pub struct MemoryInjector {
	jars: Arc<Mutex<HashMap<PartitionKey, Vec<Cookie>>>>,
	attempts: Arc<Mutex<Vec<PartitionKey>>>,
	fail: Arc<AtomicBool>,
	delay: Option<Duration>,
}

impl MemoryInjector {
	pub fn new() -> Self {
		Self::default()
	}

	/// Injection takes `delay` of (tokio) time.
	pub fn with_delay(mut self, delay: Duration) -> Self {
		self.delay = Some(delay);
		self
	}

	/// Makes every following injection fail (or succeed again).
	pub fn set_failing(&self, fail: bool) {
		self.fail.store(fail, Ordering::SeqCst);
	}

	/// Partitions of every injection attempt, in order.
	pub fn attempts(&self) -> Vec<PartitionKey> {
		self.attempts.lock().clone()
	}

	/// Cookies currently stored in `partition`.
	pub fn cookies(&self, partition: &PartitionKey) -> Vec<Cookie> {
		self.jars.lock().get(partition).cloned().unwrap_or_default()
	}

	/// Synchronous injection, for driving an orchestrator without a runtime.
	pub fn inject_now(&self, partition: &PartitionKey, cookies: &[Cookie]) -> Result<(), InjectionError> {
		self.attempts.lock().push(partition.clone());
		if self.fail.load(Ordering::SeqCst) {
			return Err(InjectionError::new(partition.clone(), cookies.len(), "simulated storage failure"));
		}
		let mut jars = self.jars.lock();
		let jar = jars.entry(partition.clone()).or_default();
		for cookie in cookies {
			jar.retain(|c| !(c.name == cookie.name && c.domain == cookie.domain && c.path == cookie.path));
			jar.push(cookie.clone());
		}
		Ok(())
	}
}

#[async_trait]
impl CredentialInjector for MemoryInjector {
	async fn inject(&self, partition: &PartitionKey, cookies: &[Cookie]) -> Result<(), InjectionError> {
		if let Some(delay) = self.delay {
			tokio::time::sleep(delay).await;
		}
		self.inject_now(partition, cookies)
	}
}
