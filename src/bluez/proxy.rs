//! zbus proxies for the BlueZ interfaces the gateway calls.

use std::collections::{BTreeMap, HashMap};

use zbus::{
   proxy,
   zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value},
};

/// `a{oa{sa{sv}}}`, keyed so iteration follows object path order.
pub type ManagedObjects = BTreeMap<OwnedObjectPath, BTreeMap<String, HashMap<String, OwnedValue>>>;

#[proxy(
   interface = "org.freedesktop.DBus.ObjectManager",
   default_service = "org.bluez",
   default_path = "/"
)]
pub trait BluezObjectManager {
   fn get_managed_objects(&self) -> zbus::Result<ManagedObjects>;
}

#[proxy(
   interface = "org.bluez.ProfileManager1",
   default_service = "org.bluez",
   default_path = "/org/bluez"
)]
pub trait ProfileManager1 {
   fn register_profile(
      &self,
      profile: &ObjectPath<'_>,
      uuid: &str,
      options: HashMap<&str, Value<'_>>,
   ) -> zbus::Result<()>;

   fn unregister_profile(&self, profile: &ObjectPath<'_>) -> zbus::Result<()>;
}

#[proxy(interface = "org.bluez.Device1", default_service = "org.bluez")]
pub trait Device1 {
   fn connect_profile(&self, uuid: &str) -> zbus::Result<()>;
}
