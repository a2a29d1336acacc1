//! JSON-lines replay scripts.
//!
//! One step per line, tagged by `op`. Blank lines and lines starting with `#`
//! are skipped:
//!
//! ```text
//! # open two tabs, close the first
//! {"op": "create", "url": "https://a.example"}
//! {"op": "create", "url": "https://b.example", "label": "studio-b"}
//! {"op": "remove", "id": 2}
//! {"op": "event", "id": 3, "event": "title-updated", "value": "Studio"}
//! {"op": "snapshot"}
//! ```
//!
//! Steps run against the in-memory backend, and the deck is settled after
//! every step so the next one observes all of its effects.

use std::time::Duration;

use anyhow::{Context, bail};
use serde::Deserialize;
use serde_json::Value;
use sessiondeck::memory::{MemoryInjector, MemorySessionFactory};
use sessiondeck::{Anchor, DeckConfig, DeckSnapshot, SessionEvent, TabId, TabKind};
use sessiondeck_runtime::Deck;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Step {
	Create {
		url: String,
		/// Opens the tab as an account tab with this label.
		#[serde(default)]
		label: Option<String>,
	},
	Switch {
		id: TabId,
	},
	Remove {
		id: TabId,
	},
	Navigate {
		input: String,
	},
	Reload,
	Back,
	Forward,
	/// A message posted by an embedded page.
	Inbound {
		payload: Value,
	},
	/// Something the page in tab `id` does on its own.
	Event {
		id: TabId,
		event: PageEvent,
		#[serde(default)]
		value: Option<String>,
	},
	Hover {
		id: TabId,
	},
	Unhover {
		id: TabId,
	},
	EnterPopup,
	LeavePopup,
	EditPopup,
	BlurPopup,
	PopupNavigate {
		input: String,
	},
	Sleep {
		ms: u64,
	},
	Snapshot,
	FailNextSession,
	FailInjection {
		#[serde(default = "enabled")]
		fail: bool,
	},
}

fn enabled() -> bool {
	true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageEvent {
	LoadFinished,
	/// With a `value`, commits a load of that URL first.
	Navigated,
	NavigatedInPage,
	TitleUpdated,
	NewWindowRequested,
}

/// Parses a script into `(line number, step)` pairs.
pub fn parse(text: &str) -> anyhow::Result<Vec<(usize, Step)>> {
	let mut steps = Vec::new();
	for (index, line) in text.lines().enumerate() {
		let line = line.trim();
		if line.is_empty() || line.starts_with('#') {
			continue;
		}
		let number = index + 1;
		let step = serde_json::from_str(line).with_context(|| format!("script line {number}"))?;
		steps.push((number, step));
	}
	Ok(steps)
}

/// A deck on the in-memory backend, driven step by step.
pub struct Replay {
	deck: Deck,
	factory: MemorySessionFactory,
	injector: MemoryInjector,
}

impl Replay {
	pub async fn start(config: DeckConfig) -> sessiondeck::Result<Self> {
		let factory = MemorySessionFactory::new();
		let injector = MemoryInjector::new();
		let deck = Deck::start(config, factory.clone(), injector.clone()).await?;
		Ok(Self {
			deck,
			factory,
			injector,
		})
	}

	/// Runs every step, handing `snapshot` steps to `on_snapshot`.
	///
	/// Returns the final snapshot. The deck is shut down afterwards.
	pub async fn run<F>(self, steps: &[(usize, Step)], mut on_snapshot: F) -> anyhow::Result<DeckSnapshot>
	where
		F: FnMut(&DeckSnapshot) -> std::io::Result<()>,
	{
		for (line, step) in steps {
			debug!(target = "sessiondeck", line, ?step, "replay step");
			if let Some(snapshot) = self.apply(step).await.with_context(|| format!("script line {line}"))? {
				on_snapshot(&snapshot)?;
			}
			self.deck.settle().await?;
		}
		let snapshot = self.deck.snapshot().await?;
		self.deck.shutdown().await?;
		Ok(snapshot)
	}

	async fn apply(&self, step: &Step) -> anyhow::Result<Option<DeckSnapshot>> {
		let deck = &self.deck;
		match step {
			Step::Create { url, label } => {
				let kind = label.as_ref().map_or(TabKind::Generic, TabKind::account);
				match deck.create_tab(url.as_str(), kind).await {
					Ok(_) => {}
					Err(sessiondeck::Error::SessionCreation(err)) => {
						warn!(target = "sessiondeck", %url, error = %err, "create step failed");
					}
					Err(err) => return Err(err.into()),
				}
			}
			Step::Switch { id } => {
				deck.switch_active(*id).await?;
			}
			Step::Remove { id } => {
				deck.remove_tab(*id).await?;
			}
			Step::Navigate { input } => {
				deck.navigate(input.as_str()).await?;
			}
			Step::Reload => {
				deck.reload().await?;
			}
			Step::Back => {
				deck.go_back().await?;
			}
			Step::Forward => {
				deck.go_forward().await?;
			}
			Step::Inbound { payload } => {
				deck.inbound(payload.clone()).await?;
			}
			Step::Event { id, event, value } => self.page_event(*id, *event, value.as_deref())?,
			Step::Hover { id } => {
				deck.hover(*id, Anchor::default()).await?;
			}
			Step::Unhover { id } => deck.unhover(*id).await?,
			Step::EnterPopup => deck.enter_popup().await?,
			Step::LeavePopup => deck.leave_popup().await?,
			Step::EditPopup => deck.edit_popup().await?,
			Step::BlurPopup => deck.blur_popup().await?,
			Step::PopupNavigate { input } => {
				deck.popup_navigate(input.as_str()).await?;
			}
			Step::Sleep { ms } => tokio::time::sleep(Duration::from_millis(*ms)).await,
			Step::Snapshot => {
				deck.settle().await?;
				return Ok(Some(deck.snapshot().await?));
			}
			Step::FailNextSession => self.factory.fail_next(),
			Step::FailInjection { fail } => self.injector.set_failing(*fail),
		}
		Ok(None)
	}

	fn page_event(&self, id: TabId, event: PageEvent, value: Option<&str>) -> anyhow::Result<()> {
		let page = self.factory.page(id).with_context(|| format!("tab {id} has no live session"))?;
		let required = || match value {
			Some(value) => Ok(value),
			None => bail!("event {event:?} needs a value"),
		};
		match event {
			PageEvent::LoadFinished => page.emit(SessionEvent::LoadFinished),
			PageEvent::Navigated => match value {
				Some(url) => page.finish_load(url),
				None => page.emit(SessionEvent::Navigated),
			},
			PageEvent::NavigatedInPage => page.navigate_in_page(required()?),
			PageEvent::TitleUpdated => page.set_title(required()?),
			PageEvent::NewWindowRequested => page.request_new_window(required()?),
		}
		Ok(())
	}
}
