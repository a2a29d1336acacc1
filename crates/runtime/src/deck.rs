//! [`Deck`]: cloneable handle to a running deck loop.

use std::sync::Arc;

use serde_json::Value;
use sessiondeck::{
	Anchor, CredentialInjector, DeckConfig, DeckSnapshot, Error, Orchestrator, Result, SessionFactory, TabId, TabKind,
	event_channel,
};
use tokio::sync::{mpsc, oneshot};
use tracing::info;

use crate::command::Command;
use crate::event_loop::DeckLoop;

const COMMAND_BUFFER: usize = 64;

/// Handle to a running deck.
///
/// Every method is a round trip through the loop, so calls from one task are
/// applied in order. Once the loop has stopped every call fails with
/// [`Error::ChannelClosed`].
#[derive(Debug, Clone)]
pub struct Deck {
	tx: mpsc::Sender<Command>,
}

impl Deck {
	/// Creates the pinned home tab and spawns the loop.
	///
	/// Fails when the configuration is invalid or the home session cannot be built.
	pub async fn start<F, I>(config: DeckConfig, factory: F, injector: I) -> Result<Self>
	where
		F: SessionFactory,
		I: CredentialInjector,
	{
		let (events_tx, events_rx) = event_channel();
		let mut orchestrator = Orchestrator::new(&config, events_tx)?;

		let pending = orchestrator.begin_pinned().ok_or_else(|| Error::Config("pinned tab already claimed".into()))?;
		match factory.create(pending.spec(), pending.sink()).await {
			Ok(session) => {
				orchestrator.finish_create(pending, session);
			}
			Err(err) => {
				orchestrator.fail_create(pending, &err);
				return Err(err.into());
			}
		}

		let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
		let deck_loop = DeckLoop::new(orchestrator, Arc::new(factory), Arc::new(injector), rx, events_rx);
		tokio::spawn(deck_loop.run());
		info!(target = "sessiondeck", home = %config.home_url, "deck started");
		Ok(Self { tx })
	}

	async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
		let (reply, rx) = oneshot::channel();
		self.tx.send(make(reply)).await.map_err(|_| Error::ChannelClosed)?;
		rx.await.map_err(|_| Error::ChannelClosed)
	}

	/// Opens a tab in a fresh partition and activates it.
	pub async fn create_tab(&self, url: impl Into<String>, kind: TabKind) -> Result<TabId> {
		let url = url.into();
		let id = self.request(|reply| Command::CreateTab { url, kind, reply }).await??;
		Ok(id)
	}

	pub async fn switch_active(&self, id: TabId) -> Result<bool> {
		self.request(|reply| Command::SwitchActive { id, reply }).await
	}

	pub async fn remove_tab(&self, id: TabId) -> Result<bool> {
		self.request(|reply| Command::RemoveTab { id, reply }).await
	}

	/// Navigates the active tab to resolved address-bar input.
	pub async fn navigate(&self, input: impl Into<String>) -> Result<Option<String>> {
		let input = input.into();
		self.request(|reply| Command::Navigate { input, reply }).await
	}

	pub async fn reload(&self) -> Result<bool> {
		self.request(|reply| Command::Reload { reply }).await
	}

	pub async fn go_back(&self) -> Result<bool> {
		self.request(|reply| Command::Back { reply }).await
	}

	pub async fn go_forward(&self) -> Result<bool> {
		self.request(|reply| Command::Forward { reply }).await
	}

	pub async fn hover(&self, id: TabId, anchor: Anchor) -> Result<bool> {
		self.request(|reply| Command::Hover { id, anchor, reply }).await
	}

	pub async fn unhover(&self, id: TabId) -> Result<()> {
		self.request(|reply| Command::Unhover { id, reply }).await
	}

	pub async fn enter_popup(&self) -> Result<()> {
		self.request(|reply| Command::EnterPopup { reply }).await
	}

	pub async fn leave_popup(&self) -> Result<()> {
		self.request(|reply| Command::LeavePopup { reply }).await
	}

	/// The popup's address field gained focus.
	pub async fn edit_popup(&self) -> Result<()> {
		self.request(|reply| Command::EditPopup { reply }).await
	}

	/// The popup's address field lost focus.
	pub async fn blur_popup(&self) -> Result<()> {
		self.request(|reply| Command::BlurPopup { reply }).await
	}

	pub async fn popup_navigate(&self, input: impl Into<String>) -> Result<Option<String>> {
		let input = input.into();
		self.request(|reply| Command::PopupNavigate { input, reply }).await
	}

	/// Delivers a message posted by an embedded page.
	///
	/// Resolves once the tab is open and its cookie injection has finished,
	/// with `None` when the payload was ignored or the session failed.
	pub async fn inbound(&self, payload: Value) -> Result<Option<TabId>> {
		self.request(|reply| Command::Inbound { payload, reply }).await
	}

	pub async fn snapshot(&self) -> Result<DeckSnapshot> {
		self.request(|reply| Command::Snapshot { reply }).await
	}

	/// Waits until no session construction or injection is in flight and
	/// every queued session event has been folded.
	pub async fn settle(&self) -> Result<()> {
		self.request(|reply| Command::Settle { reply }).await
	}

	/// Stops the loop, releasing every session.
	pub async fn shutdown(&self) -> Result<()> {
		self.request(|reply| Command::Shutdown { reply }).await
	}
}
