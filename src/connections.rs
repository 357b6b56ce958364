//! Downstream consumer of profile events.
//!
//! Holds on to the communication handles BlueZ passes us so the RFCOMM
//! channels stay open until the peer or the stack asks for teardown.

use std::{collections::HashMap, os::fd::OwnedFd, time::Instant};

use log::{debug, info, warn};
use smol_str::SmolStr;

use crate::{
   event::{ConnectionEvent, ProfileEvent},
   profile::{ProfileKind, PropertyBag},
};

#[derive(Debug)]
struct ActiveConnection {
   _fd: OwnedFd,
   properties: PropertyBag,
   since: Instant,
}

/// Open profile connections keyed by profile and remote device path.
#[derive(Debug, Default)]
pub struct ConnectionTracker {
   connections: HashMap<(ProfileKind, SmolStr), ActiveConnection>,
}

impl ConnectionTracker {
   pub fn new() -> Self {
      Self::default()
   }

   pub fn handle(&mut self, event: ProfileEvent) {
      match event {
         ProfileEvent::NewConnection(event) => self.open(event),
         ProfileEvent::DisconnectRequested { kind, device } => self.close(kind, &device),
         ProfileEvent::Released(kind) => self.release(kind),
      }
   }

   fn open(&mut self, event: ConnectionEvent) {
      let ConnectionEvent {
         kind,
         device,
         fd,
         properties,
      } = event;

      let previous = self.connections.insert(
         (kind, device.clone()),
         ActiveConnection {
            _fd: fd,
            properties,
            since: Instant::now(),
         },
      );
      if previous.is_some() {
         warn!("{kind} reconnected from {device}, closed the stale channel");
      } else {
         info!("{kind} channel open with {device}");
      }
   }

   fn close(&mut self, kind: ProfileKind, device: &str) {
      match self.connections.remove(&(kind, SmolStr::new(device))) {
         Some(conn) => info!(
            "{kind} channel with {device} closed after {:?} (negotiated {})",
            conn.since.elapsed(),
            conn.properties
         ),
         None => debug!("{kind} disconnect for {device} with no open channel"),
      }
   }

   fn release(&mut self, kind: ProfileKind) {
      let before = self.connections.len();
      self.connections.retain(|(k, _), _| *k != kind);
      let closed = before - self.connections.len();
      if closed > 0 {
         info!("{kind} released, closed {closed} channel(s)");
      }
   }

   pub fn len(&self) -> usize {
      self.connections.len()
   }
}
