//! Concrete profile handlers.
//!
//! Neither handler touches the communication handle itself: both queue an
//! event and return, leaving the channel to the downstream consumer.

use log::debug;
use smol_str::SmolStr;

use crate::{
   event::{ConnectionEvent, EventSender, ProfileEvent},
   profile::{ProfileKind, endpoint::ProfileHandler},
};

/// Handler for the wireless projection service.
pub struct AaWirelessProfile {
   events: EventSender,
}

impl AaWirelessProfile {
   pub fn new(events: EventSender) -> Self {
      Self { events }
   }
}

impl ProfileHandler for AaWirelessProfile {
   fn kind(&self) -> ProfileKind {
      ProfileKind::AaWireless
   }

   fn new_connection(&self, event: ConnectionEvent) {
      if let Some(version) = event.properties.get("Version") {
         debug!("AA Wireless peer {} negotiated version {version}", event.device);
      }
      self.events.emit(ProfileEvent::NewConnection(event));
   }

   fn disconnect_request(&self, device: &str) {
      self.events.emit(ProfileEvent::DisconnectRequested {
         kind: self.kind(),
         device: SmolStr::new(device),
      });
   }

   fn release(&self) {
      self.events.emit(ProfileEvent::Released(self.kind()));
   }
}

/// Handler for the headset compatibility profile.
///
/// Phones expect a headset before they will start the projection
/// handshake; the link only has to stay open.
pub struct HeadsetProfile {
   events: EventSender,
}

impl HeadsetProfile {
   pub fn new(events: EventSender) -> Self {
      Self { events }
   }
}

impl ProfileHandler for HeadsetProfile {
   fn kind(&self) -> ProfileKind {
      ProfileKind::HspHeadset
   }

   fn new_connection(&self, event: ConnectionEvent) {
      self.events.emit(ProfileEvent::NewConnection(event));
   }

   fn disconnect_request(&self, device: &str) {
      self.events.emit(ProfileEvent::DisconnectRequested {
         kind: self.kind(),
         device: SmolStr::new(device),
      });
   }

   fn release(&self) {
      self.events.emit(ProfileEvent::Released(self.kind()));
   }
}
