//! The single task that owns the orchestrator.
//!
//! Every command, session event and completion is handled to the end before
//! the next one is picked up, so the orchestrator needs no locking. Work that
//! would block (session construction, cookie injection, the popup hide delay)
//! is spawned and reports back as a [`Completion`].

use std::ops::ControlFlow;
use std::sync::Arc;

use sessiondeck::{
	Cookie, CredentialInjector, HideTimer, Orchestrator, PartitionKey, PendingTab, SessionFactory, TabEvent, TabId,
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::command::{AfterCreate, Command, Completion};

pub(crate) struct DeckLoop<F: SessionFactory, I> {
	deck: Orchestrator<F::Session>,
	factory: Arc<F>,
	injector: Arc<I>,
	commands: mpsc::Receiver<Command>,
	events: mpsc::UnboundedReceiver<TabEvent>,
	completions: mpsc::UnboundedReceiver<Completion<F::Session>>,
	completions_tx: mpsc::UnboundedSender<Completion<F::Session>>,
	hide_timer: Option<JoinHandle<()>>,
	in_flight: usize,
	settle_waiters: Vec<oneshot::Sender<()>>,
}

impl<F, I> DeckLoop<F, I>
where
	F: SessionFactory,
	I: CredentialInjector,
{
	pub(crate) fn new(
		deck: Orchestrator<F::Session>,
		factory: Arc<F>,
		injector: Arc<I>,
		commands: mpsc::Receiver<Command>,
		events: mpsc::UnboundedReceiver<TabEvent>,
	) -> Self {
		let (completions_tx, completions) = mpsc::unbounded_channel();
		Self {
			deck,
			factory,
			injector,
			commands,
			events,
			completions,
			completions_tx,
			hide_timer: None,
			in_flight: 0,
			settle_waiters: Vec::new(),
		}
	}

	pub(crate) async fn run(mut self) {
		let mut shutdown = None;
		loop {
			tokio::select! {
				biased;

				Some(done) = self.completions.recv() => self.handle_completion(done),
				Some(event) = self.events.recv() => self.handle_event(event),
				command = self.commands.recv() => {
					let Some(command) = command else {
						break;
					};
					if let ControlFlow::Break(reply) = self.handle_command(command) {
						shutdown = Some(reply);
						break;
					}
				}
			}
			self.notify_settled();
		}

		if let Some(timer) = self.hide_timer.take() {
			timer.abort();
		}
		info!(target = "sessiondeck", tabs = self.deck.registry().len(), "deck loop stopped");
		// Sessions are released before the caller hears back.
		drop(self);
		if let Some(reply) = shutdown {
			let _ = reply.send(());
		}
	}

	fn handle_command(&mut self, command: Command) -> ControlFlow<oneshot::Sender<()>> {
		match command {
			Command::CreateTab { url, kind, reply } => {
				let pending = self.deck.begin_create(url, kind);
				self.spawn_create(pending, AfterCreate::Reply(reply));
			}
			Command::SwitchActive { id, reply } => {
				let _ = reply.send(self.deck.switch_active(id));
			}
			Command::RemoveTab { id, reply } => {
				let removed = self.deck.remove_tab(id);
				self.sync_hide_timer();
				let _ = reply.send(removed);
			}
			Command::Navigate { input, reply } => {
				let _ = reply.send(self.deck.navigate(&input));
			}
			Command::Reload { reply } => {
				let _ = reply.send(self.deck.reload());
			}
			Command::Back { reply } => {
				let _ = reply.send(self.deck.go_back());
			}
			Command::Forward { reply } => {
				let _ = reply.send(self.deck.go_forward());
			}
			Command::Hover { id, anchor, reply } => {
				let shown = self.deck.hover_tab(id, anchor);
				self.sync_hide_timer();
				let _ = reply.send(shown);
			}
			Command::Unhover { id, reply } => {
				let timer = self.deck.unhover_tab(id);
				self.schedule_hide(timer);
				let _ = reply.send(());
			}
			Command::EnterPopup { reply } => {
				self.deck.enter_popup();
				self.sync_hide_timer();
				let _ = reply.send(());
			}
			Command::LeavePopup { reply } => {
				let timer = self.deck.leave_popup();
				self.schedule_hide(timer);
				let _ = reply.send(());
			}
			Command::EditPopup { reply } => {
				self.deck.popup_edit_started();
				let _ = reply.send(());
			}
			Command::BlurPopup { reply } => {
				self.deck.popup_edit_finished();
				let _ = reply.send(());
			}
			Command::PopupNavigate { input, reply } => {
				let _ = reply.send(self.deck.popup_navigate(&input));
			}
			Command::Inbound { payload, reply } => match self.deck.accept_inbound(&payload) {
				Some(request) => self.spawn_create(
					request.pending,
					AfterCreate::Inject {
						cookies: request.cookies,
						reply,
					},
				),
				None => {
					let _ = reply.send(None);
				}
			},
			Command::Snapshot { reply } => {
				let _ = reply.send(self.deck.snapshot());
			}
			Command::Settle { reply } => self.settle_waiters.push(reply),
			Command::Shutdown { reply } => return ControlFlow::Break(reply),
		}
		ControlFlow::Continue(())
	}

	fn handle_event(&mut self, event: TabEvent) {
		if let Some(request) = self.deck.on_session_event(event) {
			debug!(target = "sessiondeck", opener = %request.opener, url = %request.url, "opening pop-out tab");
			let pending = self.deck.begin_create(request.url, request.kind);
			self.spawn_create(pending, AfterCreate::PopOut);
		}
	}

	fn handle_completion(&mut self, done: Completion<F::Session>) {
		match done {
			Completion::SessionReady { pending, result, then } => {
				self.in_flight -= 1;
				let partition = pending.partition().clone();
				match result {
					Ok(session) => {
						let id = self.deck.finish_create(pending, session);
						match then {
							AfterCreate::Reply(reply) => {
								let _ = reply.send(Ok(id));
							}
							AfterCreate::Inject { cookies, reply } => self.spawn_injection(id, partition, cookies, reply),
							AfterCreate::PopOut => {}
						}
					}
					Err(err) => {
						self.deck.fail_create(pending, &err);
						match then {
							AfterCreate::Reply(reply) => {
								let _ = reply.send(Err(err));
							}
							AfterCreate::Inject { reply, .. } => {
								let _ = reply.send(None);
							}
							AfterCreate::PopOut => {}
						}
					}
				}
			}
			Completion::InjectionDone {
				id,
				partition,
				result,
				reply,
			} => {
				self.in_flight -= 1;
				debug!(target = "sessiondeck", tab_id = %id, %partition, ok = result.is_ok(), "injection finished");
				self.deck.injection_finished(id, result);
				let _ = reply.send(Some(id));
			}
			Completion::HideElapsed { token } => {
				if self.deck.hide_timer_elapsed(token) {
					self.hide_timer = None;
				}
			}
		}
	}

	fn spawn_create(&mut self, pending: PendingTab, then: AfterCreate) {
		self.in_flight += 1;
		let factory = Arc::clone(&self.factory);
		let tx = self.completions_tx.clone();
		tokio::spawn(async move {
			let result = factory.create(pending.spec(), pending.sink()).await;
			let _ = tx.send(Completion::SessionReady { pending, result, then });
		});
	}

	fn spawn_injection(
		&mut self,
		id: TabId,
		partition: PartitionKey,
		cookies: Vec<Cookie>,
		reply: oneshot::Sender<Option<TabId>>,
	) {
		self.in_flight += 1;
		let injector = Arc::clone(&self.injector);
		let tx = self.completions_tx.clone();
		tokio::spawn(async move {
			let result = injector.inject(&partition, &cookies).await;
			let _ = tx.send(Completion::InjectionDone {
				id,
				partition,
				result,
				reply,
			});
		});
	}

	/// Replaces the running hide timer with `timer`.
	fn schedule_hide(&mut self, timer: Option<HideTimer>) {
		let Some(timer) = timer else {
			return;
		};
		if let Some(previous) = self.hide_timer.take() {
			previous.abort();
		}
		let tx = self.completions_tx.clone();
		self.hide_timer = Some(tokio::spawn(async move {
			tokio::time::sleep(timer.delay).await;
			let _ = tx.send(Completion::HideElapsed { token: timer.token });
		}));
	}

	/// Aborts the running hide timer once the popup no longer has one armed.
	fn sync_hide_timer(&mut self) {
		if self.deck.popup().armed_timer().is_some() {
			return;
		}
		if let Some(timer) = self.hide_timer.take() {
			timer.abort();
		}
	}

	fn notify_settled(&mut self) {
		if self.settle_waiters.is_empty() {
			return;
		}
		while let Ok(event) = self.events.try_recv() {
			self.handle_event(event);
		}
		if self.in_flight > 0 {
			return;
		}
		for waiter in self.settle_waiters.drain(..) {
			let _ = waiter.send(());
		}
	}
}
