//! Inbound tab-request channel.
//!
//! Accepting a request is three steps the caller sequences: build the session
//! for [`InboundRequest::pending`] and hand it to
//! [`Orchestrator::finish_create`], inject [`InboundRequest::cookies`] into the
//! pending partition, then report the outcome to
//! [`Orchestrator::injection_finished`].

use serde_json::Value;
use sessiondeck_protocol::{Cookie, InboundMessage, PartitionKey, TabId, TabKind};
use tracing::{debug, info, warn};

use super::{Orchestrator, PendingTab};
use crate::error::{InjectionError, SessionCreationError};
use crate::session::{EventSink, Session, SessionSpec};

/// A validated request to open an authenticated tab.
#[derive(Debug)]
pub struct InboundRequest {
	pub pending: PendingTab,
	/// Normalized cookies bound for `pending`'s partition.
	pub cookies: Vec<Cookie>,
}

impl InboundRequest {
	pub fn partition(&self) -> &PartitionKey {
		self.pending.partition()
	}
}

impl<S: Session> Orchestrator<S> {
	/// Validates an inbound payload and allocates its tab.
	///
	/// Anything but a well-formed `OPEN_AUTHENTICATED_TAB` message returns
	/// `None` without touching the registry. A message posted as JSON text
	/// arrives as a string value and is parsed first.
	pub fn accept_inbound(&mut self, payload: &Value) -> Option<InboundRequest> {
		let decoded = match payload {
			Value::String(text) => InboundMessage::decode_str(text),
			value => InboundMessage::decode(value),
		};
		let message = match decoded {
			Ok(message) => message,
			Err(err) => {
				debug!(target = "sessiondeck", error = %err, "inbound message ignored");
				return None;
			}
		};
		let InboundMessage::OpenAuthenticatedTab(request) = message;
		let cookies = request.cookies();
		debug!(
			target = "sessiondeck",
			url = %request.url,
			account = %request.account_label,
			cookies = cookies.len(),
			"authenticated tab requested"
		);
		let pending = self.begin_create(request.url, TabKind::account(request.account_label));
		Some(InboundRequest { pending, cookies })
	}

	/// Completes an injection. Reloads the tab on success so the cookies apply.
	///
	/// Returns `true` when a reload was issued.
	pub fn injection_finished(&mut self, id: TabId, outcome: Result<(), InjectionError>) -> bool {
		if let Err(err) = outcome {
			warn!(target = "sessiondeck", tab_id = %id, error = %err, "credential injection failed, tab left unauthenticated");
			return false;
		}
		let Some(tab) = self.registry.get_mut(id) else {
			debug!(target = "sessiondeck", tab_id = %id, "injected tab closed before reload");
			return false;
		};
		info!(target = "sessiondeck", tab_id = %id, partition = %tab.partition(), "credentials injected, reloading");
		tab.session_mut().reload();
		true
	}

	/// Runs the whole inbound protocol with synchronous collaborators.
	///
	/// Returns the new tab id, or `None` when the payload was ignored or the
	/// session could not be built.
	pub fn open_inbound<B, J>(&mut self, payload: &Value, build: B, inject: J) -> Option<TabId>
	where
		B: FnOnce(SessionSpec, EventSink) -> Result<S, SessionCreationError>,
		J: FnOnce(&PartitionKey, &[Cookie]) -> Result<(), InjectionError>,
	{
		let InboundRequest { pending, cookies } = self.accept_inbound(payload)?;
		let partition = pending.partition().clone();
		let id = self.complete_with(pending, build).ok()?;
		let outcome = inject(&partition, &cookies);
		self.injection_finished(id, outcome);
		Some(id)
	}
}
