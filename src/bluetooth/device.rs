//! Remote device lookup and active profile connection.
//!
//! Device paths are looked up fresh each time; BlueZ adds and drops device
//! objects as phones come and go, so nothing here is cached.

use log::info;
use smol_str::SmolStr;
use uuid::Uuid;

use crate::{
   bluez::{BluezBus, DEVICE_INTERFACE, objects_implementing},
   error::Result,
};

/// Picks the first known device in enumeration order.
pub async fn find_connectable_device(bus: &impl BluezBus) -> Result<Option<SmolStr>> {
   let objects = bus.managed_objects().await?;
   let devices = objects_implementing(&objects, DEVICE_INTERFACE);

   let Some(first) = devices.first() else {
      info!("Did not find any connected bluetooth device");
      return Ok(None);
   };

   info!("Found {} bluetooth devices", devices.len());
   info!("Using bluetooth device at path: {}", first.path);
   Ok(Some(first.path.clone()))
}

/// Asks BlueZ to open `uuid` against `device` from our side.
pub async fn request_connect(bus: &impl BluezBus, device: &str, uuid: Uuid) -> Result<()> {
   bus.connect_profile(device, uuid).await?;
   info!("ConnectProfile {uuid} completed on {device}");
   Ok(())
}
