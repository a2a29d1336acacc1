//! Error types for the orchestrator.
//!
//! Callers see session construction failures and configuration problems,
//! plus [`Error::ChannelClosed`] once the runtime loop has stopped. Unknown tab
//! ids and unrecognized inbound messages are silent no-ops. Injection failures
//! are logged, never propagated.

use sessiondeck_protocol::PartitionKey;
use thiserror::Error;

/// Result type alias for orchestrator operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The session capability could not be constructed for a new tab.
///
/// Fatal to the single create call; the registry is left unchanged.
#[derive(Debug, Clone, Error)]
#[error("failed to create session in partition {partition}: {reason}")]
pub struct SessionCreationError {
	pub partition: PartitionKey,
	pub reason: String,
}

impl SessionCreationError {
	pub fn new(partition: PartitionKey, reason: impl Into<String>) -> Self {
		Self {
			partition,
			reason: reason.into(),
		}
	}
}

/// Cookies could not be installed into a partition.
///
/// Non-fatal: the tab stays open, unauthenticated.
#[derive(Debug, Clone, Error)]
#[error("failed to inject {cookies} cookie(s) into partition {partition}: {reason}")]
pub struct InjectionError {
	pub partition: PartitionKey,
	pub cookies: usize,
	pub reason: String,
}

impl InjectionError {
	pub fn new(partition: PartitionKey, cookies: usize, reason: impl Into<String>) -> Self {
		Self {
			partition,
			cookies,
			reason: reason.into(),
		}
	}
}

/// Errors surfaced by the sessiondeck crates.
#[derive(Debug, Error)]
pub enum Error {
	#[error(transparent)]
	SessionCreation(#[from] SessionCreationError),

	/// Invalid or unreadable configuration.
	#[error("configuration error: {0}")]
	Config(String),

	/// The orchestrator loop is gone.
	#[error("orchestrator channel closed")]
	ChannelClosed,
}
