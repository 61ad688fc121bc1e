//! Inbound event plumbing: named channels, wire records, and the handshake
//! used to sequence the dispatch task with its owner.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

pub mod handshake;
pub mod hub;
pub mod record;

pub use handshake::{Handshake, HandshakeGuard, HandshakePhase};
pub use hub::{EventHub, EventReceiver, EventSender};
pub use record::{Event, EventRecord, EventTag, RecordPayload};

static NEXT_CHANNEL_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique name of an inbound event channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelName(String);

impl ChannelName {
    /// Produces a name that is never handed out twice within this process.
    pub fn generate() -> Self {
        let id = NEXT_CHANNEL_ID.fetch_add(1, Ordering::Relaxed);
        Self(format!("airlink.{}.{id}", std::process::id()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ChannelName {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
