//! Service endpoint state machine.
//!
//! An endpoint is exported on the bus before its profile is registered, so
//! BlueZ may call into it at any point of the bring-up. The endpoint only
//! tracks its own lifecycle and forwards each accepted callback to a
//! [`ProfileHandler`]; it never looks at adapter or device state.

use std::{
   os::fd::{AsRawFd, OwnedFd},
   sync::Arc,
};

use crossbeam::atomic::AtomicCell;
use log::{info, warn};
use smol_str::SmolStr;

use crate::{
   event::ConnectionEvent,
   profile::{ProfileKind, PropertyBag},
};

/// Capability set every advertised profile implements.
///
/// Callbacks run on the D-Bus dispatch path and must return quickly.
pub trait ProfileHandler: Send + Sync {
   fn kind(&self) -> ProfileKind;
   fn new_connection(&self, event: ConnectionEvent);
   fn disconnect_request(&self, device: &str);
   fn release(&self);
}

/// Logs every callback before delegating to the wrapped handler.
pub struct Logged<H>(pub H);

impl<H: ProfileHandler> ProfileHandler for Logged<H> {
   fn kind(&self) -> ProfileKind {
      self.0.kind()
   }

   fn new_connection(&self, event: ConnectionEvent) {
      info!(
         "{} NewConnection from {} (fd {}, properties {})",
         self.kind(),
         event.device,
         event.fd.as_raw_fd(),
         event.properties
      );
      self.0.new_connection(event);
   }

   fn disconnect_request(&self, device: &str) {
      info!("{} RequestDisconnection from {device}", self.kind());
      self.0.disconnect_request(device);
   }

   fn release(&self) {
      info!("{} Release", self.kind());
      self.0.release();
   }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum EndpointState {
   /// On the bus, profile not yet registered.
   Exported,
   /// Registered, or already called into by BlueZ.
   Active,
   /// The profile manager dropped the registration. Terminal.
   Released,
}

struct EndpointInner {
   handler: Box<dyn ProfileHandler>,
   state: AtomicCell<EndpointState>,
}

/// One advertised profile endpoint. Cheaply cloneable.
#[derive(Clone)]
pub struct ServiceEndpoint(Arc<EndpointInner>);

impl ServiceEndpoint {
   pub fn new(handler: impl ProfileHandler + 'static) -> Self {
      Self(Arc::new(EndpointInner {
         handler: Box::new(handler),
         state: AtomicCell::new(EndpointState::Exported),
      }))
   }

   pub fn kind(&self) -> ProfileKind {
      self.0.handler.kind()
   }

   pub fn state(&self) -> EndpointState {
      self.0.state.load()
   }

   /// Marks the endpoint active once its profile is registered.
   ///
   /// A released endpoint stays released.
   pub fn activate(&self) {
      let _ = self
         .0
         .state
         .compare_exchange(EndpointState::Exported, EndpointState::Active);
   }

   pub fn on_new_connection(&self, device: SmolStr, fd: OwnedFd, properties: PropertyBag) {
      if !self.admit("NewConnection", &device) {
         // Dropping the handle closes the channel BlueZ just opened.
         return;
      }
      self.0.handler.new_connection(ConnectionEvent {
         kind: self.kind(),
         device,
         fd,
         properties,
      });
   }

   pub fn on_disconnect_request(&self, device: &str) {
      if self.admit("RequestDisconnection", device) {
         self.0.handler.disconnect_request(device);
      }
   }

   pub fn on_release(&self) {
      if self.0.state.swap(EndpointState::Released) == EndpointState::Released {
         warn!("{} received Release twice, ignoring", self.kind());
         return;
      }
      self.0.handler.release();
   }

   /// Promotes an exported endpoint to active and rejects released ones.
   fn admit(&self, call: &str, device: &str) -> bool {
      match self
         .0
         .state
         .compare_exchange(EndpointState::Exported, EndpointState::Active)
      {
         Ok(_) | Err(EndpointState::Active) => true,
         Err(state) => {
            warn!(
               "{} received {call} from {device} while {state}, ignoring",
               self.kind()
            );
            false
         },
      }
   }
}
