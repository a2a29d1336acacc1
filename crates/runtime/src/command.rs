//! Messages flowing into the deck loop.

use serde_json::Value;
use sessiondeck::{
	Anchor, Cookie, DeckSnapshot, InjectionError, PartitionKey, PendingTab, SessionCreationError, TabId, TabKind,
};
use tokio::sync::oneshot;

type Reply<T> = oneshot::Sender<T>;

/// A request from a [`Deck`](crate::Deck) handle.
#[derive(Debug)]
pub(crate) enum Command {
	CreateTab {
		url: String,
		kind: TabKind,
		reply: Reply<Result<TabId, SessionCreationError>>,
	},
	SwitchActive {
		id: TabId,
		reply: Reply<bool>,
	},
	RemoveTab {
		id: TabId,
		reply: Reply<bool>,
	},
	Navigate {
		input: String,
		reply: Reply<Option<String>>,
	},
	Reload {
		reply: Reply<bool>,
	},
	Back {
		reply: Reply<bool>,
	},
	Forward {
		reply: Reply<bool>,
	},
	Hover {
		id: TabId,
		anchor: Anchor,
		reply: Reply<bool>,
	},
	Unhover {
		id: TabId,
		reply: Reply<()>,
	},
	EnterPopup {
		reply: Reply<()>,
	},
	LeavePopup {
		reply: Reply<()>,
	},
	EditPopup {
		reply: Reply<()>,
	},
	BlurPopup {
		reply: Reply<()>,
	},
	PopupNavigate {
		input: String,
		reply: Reply<Option<String>>,
	},
	/// Replies once the whole inbound protocol has run.
	Inbound {
		payload: Value,
		reply: Reply<Option<TabId>>,
	},
	Snapshot {
		reply: Reply<DeckSnapshot>,
	},
	/// Replies once no construction or injection is in flight.
	Settle {
		reply: Reply<()>,
	},
	Shutdown {
		reply: Reply<()>,
	},
}

/// What to do once a spawned session construction finishes.
#[derive(Debug)]
pub(crate) enum AfterCreate {
	Reply(Reply<Result<TabId, SessionCreationError>>),
	Inject {
		cookies: Vec<Cookie>,
		reply: Reply<Option<TabId>>,
	},
	PopOut,
}

/// Results of work the loop spawned, posted back for folding.
pub(crate) enum Completion<S> {
	SessionReady {
		pending: PendingTab,
		result: Result<S, SessionCreationError>,
		then: AfterCreate,
	},
	InjectionDone {
		id: TabId,
		partition: PartitionKey,
		result: Result<(), InjectionError>,
		reply: Reply<Option<TabId>>,
	},
	HideElapsed {
		token: u64,
	},
}
