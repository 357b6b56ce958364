//! Event hand-off from exported profile endpoints.
//!
//! BlueZ invokes profile callbacks on the D-Bus dispatch path. Handlers turn
//! each callback into a [`ProfileEvent`] and push it through an [`EventBus`]
//! so the actual work happens on a separate consumer task.

use std::{os::fd::OwnedFd, sync::Arc};

use smol_str::SmolStr;

use crate::profile::{ProfileKind, PropertyBag};

/// A remote peer opened one of our profiles.
///
/// Owns the communication handle; dropping the event closes the channel.
#[derive(Debug)]
pub struct ConnectionEvent {
   pub kind: ProfileKind,
   pub device: SmolStr,
   pub fd: OwnedFd,
   pub properties: PropertyBag,
}

/// Events that can be emitted by profile endpoints.
#[derive(Debug)]
pub enum ProfileEvent {
   NewConnection(ConnectionEvent),
   DisconnectRequested { kind: ProfileKind, device: SmolStr },
   Released(ProfileKind),
}

/// Trait for implementing event emission.
pub trait EventBus: Send + Sync {
   /// Queues an event for the downstream consumer. Must not block.
   fn emit(&self, event: ProfileEvent);
}

/// Type alias for a thread-safe event sender.
pub type EventSender = Arc<dyn EventBus>;
