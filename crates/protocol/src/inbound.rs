//! Messages embedded pages post to the orchestrator.
//!
//! Pages loaded inside any session may post arbitrary messages; only the
//! envelope below is meaningful:
//!
//! ```text
//! { "type": "OPEN_AUTHENTICATED_TAB", "url": "...", "cookies": [...], "accountLabel": "..." }
//! ```
//!
//! Everything else decodes to an [`InboundError`] which callers log and drop.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::cookie::{Cookie, PageCookie};

/// Discriminant of the only recognized inbound message.
pub const OPEN_AUTHENTICATED_TAB: &str = "OPEN_AUTHENTICATED_TAB";

/// Request to open a new tab pre-authenticated with the given cookies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenAuthenticatedTab {
	pub url: String,
	pub cookies: Vec<PageCookie>,
	pub account_label: String,
}

impl OpenAuthenticatedTab {
	/// Normalized cookies, skipping records with neither domain nor url.
	pub fn cookies(&self) -> Vec<Cookie> {
		self.cookies.iter().map(PageCookie::to_cookie).filter(Cookie::is_addressable).collect()
	}
}

/// A validated inbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InboundMessage {
	#[serde(rename = "OPEN_AUTHENTICATED_TAB")]
	OpenAuthenticatedTab(OpenAuthenticatedTab),
}

/// Why an inbound payload was ignored.
#[derive(Debug, Error)]
pub enum InboundError {
	/// Not an object, or the `type` tag is missing or unknown.
	#[error("unrecognized inbound message{}", tag.as_ref().map(|t| format!(" (type {t:?})")).unwrap_or_default())]
	Unrecognized { tag: Option<String> },

	/// Recognized tag but the body does not have the expected shape.
	#[error("malformed {tag} message: {reason}")]
	Malformed { tag: &'static str, reason: String },
}

impl InboundMessage {
	/// Decodes a raw text payload.
	pub fn decode_str(payload: &str) -> Result<Self, InboundError> {
		let value: Value = serde_json::from_str(payload).map_err(|_| InboundError::Unrecognized { tag: None })?;
		Self::decode(&value)
	}

	/// Validates the discriminant first, then the body.
	pub fn decode(value: &Value) -> Result<Self, InboundError> {
		let tag = value.get("type").and_then(Value::as_str);
		if tag != Some(OPEN_AUTHENTICATED_TAB) {
			return Err(InboundError::Unrecognized {
				tag: tag.map(str::to_string),
			});
		}

		let message = Self::deserialize(value).map_err(|e| InboundError::Malformed {
			tag: OPEN_AUTHENTICATED_TAB,
			reason: e.to_string(),
		})?;

		let InboundMessage::OpenAuthenticatedTab(request) = &message;
		if request.url.trim().is_empty() {
			return Err(InboundError::Malformed {
				tag: OPEN_AUTHENTICATED_TAB,
				reason: "empty url".to_string(),
			});
		}
		Ok(message)
	}
}
