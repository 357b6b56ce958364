//! Recording stand-in for BlueZ.

use std::{
   collections::{HashMap, HashSet},
   fs::File,
   os::fd::OwnedFd,
};

use parking_lot::Mutex;
use smol_str::SmolStr;
use uuid::Uuid;

use crate::{
   bluetooth::adapter::AdapterHandle,
   bluez::{ADAPTER_INTERFACE, AdapterSetting, BluezBus, DEVICE_INTERFACE, ManagedObject},
   error::{GatewayError, Result},
   profile::{
      AA_WIRELESS_UUID, HSP_HS_UUID, ProfileDescriptor, PropertyBag, endpoint::ServiceEndpoint,
   },
};

/// Remote calls in the order they were made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
   ManagedObjects,
   SetAdapter(SmolStr, AdapterSetting),
   Export(SmolStr),
   RegisterProfile(SmolStr, Uuid, PropertyBag),
   UnregisterProfile(SmolStr),
   ConnectProfile(SmolStr, Uuid),
   WaitForDisconnect,
}

/// A device that opens a channel the moment an endpoint is exported.
pub const EAGER_PEER: &str = "/org/bluez/hci0/dev_00_11_22_33_44_55";

#[derive(Default)]
pub struct MockBus {
   objects: Vec<ManagedObject>,
   calls: Mutex<Vec<Call>>,
   exported: Mutex<HashMap<SmolStr, ServiceEndpoint>>,
   registered: Mutex<HashSet<SmolStr>>,
   failing_setting: Option<&'static str>,
   refuse_connect: bool,
   eager_peer: bool,
}

impl MockBus {
   pub fn new() -> Self {
      Self::default()
   }

   #[must_use]
   pub fn with_object(mut self, path: &str, interfaces: &[&str]) -> Self {
      self.objects.push(ManagedObject {
         path: SmolStr::new(path),
         interfaces: interfaces.iter().map(|i| SmolStr::new(i)).collect(),
      });
      self
   }

   #[must_use]
   pub fn with_adapter(self, path: &str) -> Self {
      self.with_object(path, &[ADAPTER_INTERFACE, "org.bluez.GattManager1"])
   }

   #[must_use]
   pub fn with_device(self, path: &str) -> Self {
      self.with_object(path, &[DEVICE_INTERFACE, "org.freedesktop.DBus.Properties"])
   }

   /// Makes every write of `setting` fail as if the adapter refused it.
   #[must_use]
   pub const fn failing_setting(mut self, setting: &'static str) -> Self {
      self.failing_setting = Some(setting);
      self
   }

   #[must_use]
   pub const fn refusing_connect(mut self) -> Self {
      self.refuse_connect = true;
      self
   }

   /// Simulates a peer calling `NewConnection` right after each export.
   #[must_use]
   pub const fn with_eager_peer(mut self) -> Self {
      self.eager_peer = true;
      self
   }

   pub fn calls(&self) -> Vec<Call> {
      self.calls.lock().clone()
   }

   pub fn export_count(&self, path: &str) -> usize {
      self
         .calls
         .lock()
         .iter()
         .filter(|c| matches!(c, Call::Export(p) if p == path))
         .count()
   }

   pub fn exported(&self, path: &str) -> Option<ServiceEndpoint> {
      self.exported.lock().get(path).cloned()
   }

   fn record(&self, call: Call) {
      self.calls.lock().push(call);
   }
}

/// Options BlueZ insists on for a server registration of `uuid`.
fn required_options(uuid: Uuid) -> &'static [&'static str] {
   if uuid == AA_WIRELESS_UUID {
      &["Role", "Channel"]
   } else if uuid == HSP_HS_UUID {
      &["Name"]
   } else {
      &[]
   }
}

impl BluezBus for MockBus {
   async fn managed_objects(&self) -> Result<Vec<ManagedObject>> {
      self.record(Call::ManagedObjects);
      Ok(self.objects.clone())
   }

   async fn set_adapter(&self, adapter: &AdapterHandle, setting: AdapterSetting) -> Result<()> {
      let name = setting.name();
      self.record(Call::SetAdapter(adapter.path.clone(), setting));
      if self.failing_setting == Some(name) {
         return Err(GatewayError::AdapterControl {
            adapter: adapter.name.clone(),
            setting: name,
            reason: "org.bluez.Error.Busy".to_string(),
         });
      }
      Ok(())
   }

   async fn export_endpoint(&self, path: &str, endpoint: ServiceEndpoint) -> Result<bool> {
      let mut exported = self.exported.lock();
      if exported.contains_key(path) {
         return Ok(false);
      }
      self.record(Call::Export(SmolStr::new(path)));

      if self.eager_peer {
         let fd = OwnedFd::from(File::open("/dev/null")?);
         endpoint.on_new_connection(SmolStr::new(EAGER_PEER), fd, PropertyBag::new());
      }
      exported.insert(SmolStr::new(path), endpoint);
      Ok(true)
   }

   async fn register_profile(&self, descriptor: &ProfileDescriptor) -> Result<()> {
      let path = descriptor.object_path.clone();
      self.record(Call::RegisterProfile(
         path.clone(),
         descriptor.uuid,
         descriptor.options.clone(),
      ));

      if let Some(missing) = required_options(descriptor.uuid)
         .iter()
         .find(|key| descriptor.options.get(key).is_none())
      {
         return Err(GatewayError::InvalidArguments {
            path,
            reason: format!("missing {missing}"),
         });
      }
      if !self.registered.lock().insert(path.clone()) {
         return Err(GatewayError::DuplicateRegistration(path));
      }
      Ok(())
   }

   async fn unregister_profile(&self, path: &str) -> Result<()> {
      self.record(Call::UnregisterProfile(SmolStr::new(path)));
      if self.registered.lock().remove(path) {
         Ok(())
      } else {
         Err(GatewayError::Registration {
            path: SmolStr::new(path),
            reason: "org.bluez.Error.DoesNotExist".to_string(),
         })
      }
   }

   async fn connect_profile(&self, device: &str, uuid: Uuid) -> Result<()> {
      self.record(Call::ConnectProfile(SmolStr::new(device), uuid));
      if self.refuse_connect {
         return Err(GatewayError::ConnectProfile {
            device: SmolStr::new(device),
            uuid,
            reason: "org.bluez.Error.NotAvailable".to_string(),
         });
      }
      Ok(())
   }

   async fn wait_for_disconnect(&self) -> Result<()> {
      self.record(Call::WaitForDisconnect);
      Ok(())
   }
}
