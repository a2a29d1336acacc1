//! Tokio runtime for a [`sessiondeck`] orchestrator.
//!
//! [`Deck::start`] builds the pinned home tab, then moves the orchestrator
//! into a single spawned task. All state changes happen on that task; async
//! collaborators run beside it and post their results back.

mod command;
mod deck;
mod event_loop;

pub use deck::Deck;
