//! Profile registration with BlueZ's profile manager.

use log::{info, warn};
use smol_str::SmolStr;

use crate::{
   bluez::BluezBus,
   error::Result,
   profile::{ProfileDescriptor, endpoint::ServiceEndpoint},
};

/// Exports endpoints and registers their descriptors, remembering what was
/// registered so it can be withdrawn on shutdown.
#[derive(Debug, Default)]
pub struct ProfileRegistrar {
   registered: Vec<SmolStr>,
}

impl ProfileRegistrar {
   pub fn new() -> Self {
      Self::default()
   }

   /// Exports `endpoint` at the descriptor's path, then registers it.
   ///
   /// The endpoint must be reachable before BlueZ learns about it, since
   /// BlueZ may call it as soon as the registration lands.
   pub async fn register_profile(
      &mut self,
      bus: &impl BluezBus,
      descriptor: &ProfileDescriptor,
      endpoint: ServiceEndpoint,
   ) -> Result<()> {
      let kind = endpoint.kind();
      if !bus
         .export_endpoint(&descriptor.object_path, endpoint.clone())
         .await?
      {
         warn!(
            "An object is already exported at {}, keeping it",
            descriptor.object_path
         );
      }

      bus.register_profile(descriptor).await?;
      endpoint.activate();
      self.registered.push(descriptor.object_path.clone());
      info!(
         "Bluetooth {kind} profile active at {} ({})",
         descriptor.object_path, descriptor.uuid
      );
      Ok(())
   }

   /// Withdraws every registration, newest first. Failures are logged.
   pub async fn unregister_all(&mut self, bus: &impl BluezBus) {
      while let Some(path) = self.registered.pop() {
         match bus.unregister_profile(&path).await {
            Ok(()) => info!("Unregistered profile at {path}"),
            Err(e) => warn!("Failed to unregister profile at {path}: {e}"),
         }
      }
   }

   pub fn registered(&self) -> &[SmolStr] {
      &self.registered
   }
}
