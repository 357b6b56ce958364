//! Local adapter discovery and control.
//!
//! The gateway drives a single adapter. Every operation is a no-op when no
//! adapter was found, so the rest of the bring-up can still proceed.

use log::info;
use smol_str::SmolStr;

use crate::{
   bluez::{ADAPTER_INTERFACE, AdapterSetting, BluezBus, objects_implementing},
   error::Result,
};

/// The adapter the gateway bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterHandle {
   /// Object path, e.g. `/org/bluez/hci0`.
   pub path: SmolStr,
   /// Kernel name, e.g. `hci0`.
   pub name: SmolStr,
}

impl AdapterHandle {
   pub fn from_path(path: &str) -> Self {
      let name = path.rsplit('/').next().unwrap_or(path);
      Self {
         path: SmolStr::new(path),
         name: SmolStr::new(name),
      }
   }
}

/// Picks the first adapter in enumeration order.
pub async fn discover_adapter(bus: &impl BluezBus) -> Result<Option<AdapterHandle>> {
   let objects = bus.managed_objects().await?;
   let adapters = objects_implementing(&objects, ADAPTER_INTERFACE);

   let Some(first) = adapters.first() else {
      info!("Did not find any bluetooth adapters");
      return Ok(None);
   };

   info!("Found {} bluetooth adapters", adapters.len());
   info!("Using bluetooth adapter at path: {}", first.path);
   Ok(Some(AdapterHandle::from_path(&first.path)))
}

/// Sets the alias, then powers the adapter on.
pub async fn power_on(
   bus: &impl BluezBus,
   adapter: Option<&AdapterHandle>,
   alias: &str,
) -> Result<()> {
   let Some(adapter) = adapter else {
      return Ok(());
   };

   bus.set_adapter(adapter, AdapterSetting::Alias(alias.to_string()))
      .await?;
   bus.set_adapter(adapter, AdapterSetting::Powered(true)).await?;
   info!("Bluetooth adapter {} was powered on as {alias:?}", adapter.name);
   Ok(())
}

/// Sets both discoverable and pairable to `enabled`.
pub async fn set_pairable(
   bus: &impl BluezBus,
   adapter: Option<&AdapterHandle>,
   enabled: bool,
) -> Result<()> {
   let Some(adapter) = adapter else {
      return Ok(());
   };

   bus.set_adapter(adapter, AdapterSetting::Discoverable(enabled))
      .await?;
   bus.set_adapter(adapter, AdapterSetting::Pairable(enabled))
      .await?;
   if enabled {
      info!("Bluetooth adapter is now discoverable and pairable");
   } else {
      info!("Bluetooth adapter is hidden and not pairable");
   }
   Ok(())
}
