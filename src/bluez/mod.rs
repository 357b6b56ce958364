//! Access to the BlueZ daemon over the system bus.
//!
//! [`BluezBus`] is the narrow set of remote operations the bring-up needs.
//! [`system::SystemBus`] implements it against the real daemon; tests use a
//! recording mock instead.

use smol_str::SmolStr;
use uuid::Uuid;

use crate::{
   bluetooth::adapter::AdapterHandle,
   error::Result,
   profile::{ProfileDescriptor, endpoint::ServiceEndpoint},
};

#[cfg(test)]
pub mod mock;
pub mod proxy;
pub mod system;

pub const ADAPTER_INTERFACE: &str = "org.bluez.Adapter1";
pub const DEVICE_INTERFACE: &str = "org.bluez.Device1";

/// One entry of the BlueZ object tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedObject {
   pub path: SmolStr,
   pub interfaces: Vec<SmolStr>,
}

impl ManagedObject {
   pub fn implements(&self, interface: &str) -> bool {
      self.interfaces.iter().any(|i| i == interface)
   }
}

/// Objects implementing `interface`, in enumeration order.
pub fn objects_implementing<'a>(
   objects: &'a [ManagedObject],
   interface: &str,
) -> Vec<&'a ManagedObject> {
   objects.iter().filter(|o| o.implements(interface)).collect()
}

/// A writable `org.bluez.Adapter1` property.
#[derive(Debug, Clone, PartialEq, Eq, strum::IntoStaticStr)]
pub enum AdapterSetting {
   Alias(String),
   Powered(bool),
   Discoverable(bool),
   Pairable(bool),
}

impl AdapterSetting {
   pub fn name(&self) -> &'static str {
      self.into()
   }
}

/// Remote operations against BlueZ.
///
/// Every call is a suspension point; none of them is retried or timed out
/// at this layer.
pub trait BluezBus {
   /// `GetManagedObjects`, ordered by object path.
   async fn managed_objects(&self) -> Result<Vec<ManagedObject>>;

   async fn set_adapter(&self, adapter: &AdapterHandle, setting: AdapterSetting) -> Result<()>;

   /// Exports `endpoint` as `org.bluez.Profile1` at `path`.
   ///
   /// Returns `false` if an object was already exported there, in which
   /// case the existing one is kept.
   async fn export_endpoint(&self, path: &str, endpoint: ServiceEndpoint) -> Result<bool>;

   async fn register_profile(&self, descriptor: &ProfileDescriptor) -> Result<()>;

   async fn unregister_profile(&self, path: &str) -> Result<()>;

   async fn connect_profile(&self, device: &str, uuid: Uuid) -> Result<()>;

   /// Resolves once the bus connection is gone.
   async fn wait_for_disconnect(&self) -> Result<()>;
}
