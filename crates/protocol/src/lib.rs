//! Wire types shared by the sessiondeck crates.
//!
//! Types in this crate are pure data: identifiers, partition keys, cookie
//! records and the inbound message envelope that embedded pages post to the
//! orchestrator. Behavior lives in `sessiondeck`.

pub mod cookie;
pub mod ids;
pub mod inbound;

pub use cookie::{Cookie, PageCookie, SameSite};
pub use ids::{PartitionKey, TabId, TabKind};
pub use inbound::{InboundError, InboundMessage, OPEN_AUTHENTICATED_TAB, OpenAuthenticatedTab};
