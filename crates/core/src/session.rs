//! Collaborator seams: the per-tab browser session, its factory, and the
//! credential injector.
//!
//! The rendering engine behind a session is opaque. The orchestrator only
//! needs to drive navigation, read back the live URL/title, and receive
//! lifecycle events, which sessions report through the [`EventSink`] they were
//! created with.

use async_trait::async_trait;
use sessiondeck_protocol::{Cookie, PartitionKey, TabId};
use tokio::sync::mpsc;

use crate::error::{InjectionError, SessionCreationError};

/// Lifecycle event reported by a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
	/// The main frame finished loading.
	LoadFinished,
	/// A cross-document navigation committed.
	Navigated,
	/// A same-document navigation (fragment, history API) committed.
	NavigatedInPage,
	/// The document title changed.
	TitleUpdated(String),
	/// The page asked to open a new window.
	NewWindowRequested(String),
}

impl SessionEvent {
	pub fn name(&self) -> &'static str {
		match self {
			SessionEvent::LoadFinished => "load-finished",
			SessionEvent::Navigated => "navigated",
			SessionEvent::NavigatedInPage => "navigated-in-page",
			SessionEvent::TitleUpdated(_) => "title-updated",
			SessionEvent::NewWindowRequested(_) => "new-window-requested",
		}
	}
}

/// A [`SessionEvent`] tagged with the tab that emitted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabEvent {
	pub tab_id: TabId,
	pub event: SessionEvent,
}

/// Creates the channel every session reports into.
pub fn event_channel() -> (mpsc::UnboundedSender<TabEvent>, mpsc::UnboundedReceiver<TabEvent>) {
	mpsc::unbounded_channel()
}

/// Per-tab event subscription handed to a session at creation.
///
/// Events emitted after the tab is removed are still delivered; the
/// orchestrator drops them on its stale-id check.
#[derive(Debug, Clone)]
pub struct EventSink {
	tab_id: TabId,
	tx: mpsc::UnboundedSender<TabEvent>,
}

impl EventSink {
	pub fn new(tab_id: TabId, tx: mpsc::UnboundedSender<TabEvent>) -> Self {
		Self { tab_id, tx }
	}

	pub fn tab_id(&self) -> TabId {
		self.tab_id
	}

	/// Reports an event. Returns `false` once the receiving loop is gone.
	pub fn emit(&self, event: SessionEvent) -> bool {
		self.tx
			.send(TabEvent {
				tab_id: self.tab_id,
				event,
			})
			.is_ok()
	}
}

/// Everything a factory needs to construct one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSpec {
	pub tab_id: TabId,
	pub partition: PartitionKey,
	/// Initial URL to load.
	pub url: String,
	pub user_agent: String,
}

/// One live browsing context, bound to a single partition for its lifetime.
///
/// Exclusively owned by its tab; dropping it releases the underlying context.
pub trait Session: Send + 'static {
	fn navigate(&mut self, url: &str);

	fn reload(&mut self);

	fn go_back(&mut self);

	fn go_forward(&mut self);

	fn can_go_back(&self) -> bool;

	fn can_go_forward(&self) -> bool;

	/// Live URL, `None` until the first load commits.
	fn url(&self) -> Option<String>;

	/// Live document title, `None` until known.
	fn title(&self) -> Option<String>;
}

/// Builds sessions bound to a partition.
#[async_trait]
pub trait SessionFactory: Send + Sync + 'static {
	type Session: Session;

	async fn create(&self, spec: SessionSpec, events: EventSink) -> Result<Self::Session, SessionCreationError>;
}

/// Installs cookies into a partition's storage.
///
/// Stateless from the orchestrator's point of view; every call names its own
/// partition, so concurrent calls never interfere.
#[async_trait]
pub trait CredentialInjector: Send + Sync + 'static {
	async fn inject(&self, partition: &PartitionKey, cookies: &[Cookie]) -> Result<(), InjectionError>;
}
