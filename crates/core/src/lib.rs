//! Tab orchestration for isolated embedded-browser sessions.
//!
//! A deck is a set of browser tabs, each backed by its own storage partition,
//! plus an address bar and a hover preview popup. [`Orchestrator`] holds all of
//! that state and is driven synchronously; the browser engine and cookie store
//! are reached through the [`SessionFactory`], [`Session`] and
//! [`CredentialInjector`] traits.
//!
//! ```ignore
//! let (tx, mut rx) = sessiondeck::event_channel();
//! let factory = MemorySessionFactory::new();
//! let mut deck = Orchestrator::new(&DeckConfig::default(), tx)?;
//! deck.create_pinned(|spec, sink| factory.build(spec, sink))?;
//! deck.navigate("example.com");
//! while let Ok(event) = rx.try_recv() {
//!     deck.on_session_event(event);
//! }
//! ```
//!
//! `sessiondeck-runtime` wraps the orchestrator in a tokio event loop that
//! runs async factories and the popup hide timer.

pub mod config;
pub mod error;
pub mod memory;
pub mod orchestrator;
pub mod popup;
pub mod registry;
pub mod resolver;
pub mod session;
pub mod snapshot;

pub use config::DeckConfig;
pub use error::{Error, InjectionError, Result, SessionCreationError};
pub use orchestrator::{InboundRequest, Orchestrator, PendingTab, TabRequest};
pub use popup::{Anchor, HideTimer, PopupController, PopupState};
pub use registry::{Tab, TabRegistry};
pub use resolver::{InputKind, NavigationResolver, Resolved};
pub use session::{
	CredentialInjector, EventSink, Session, SessionEvent, SessionFactory, SessionSpec, TabEvent, event_channel,
};
pub use sessiondeck_protocol::{Cookie, InboundMessage, PageCookie, PartitionKey, SameSite, TabId, TabKind};
pub use snapshot::{DeckSnapshot, TabView};
