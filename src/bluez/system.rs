//! [`BluezBus`] backed by the real system bus.

use std::collections::HashMap;

use bluer::Session;
use futures::stream::StreamExt;
use log::{debug, info};
use smol_str::SmolStr;
use uuid::Uuid;
use zbus::{
   Connection, MessageStream, connection,
   zvariant::{ObjectPath, Value},
};

use crate::{
   bluetooth::adapter::AdapterHandle,
   bluez::{
      AdapterSetting, BluezBus, ManagedObject,
      proxy::{BluezObjectManagerProxy, Device1Proxy, ProfileManager1Proxy},
   },
   dbus::ProfileObject,
   error::{GatewayError, Result},
   profile::{ProfileDescriptor, PropertyValue, endpoint::ServiceEndpoint},
};

const ERROR_ALREADY_EXISTS: &str = "org.bluez.Error.AlreadyExists";
const ERROR_INVALID_ARGUMENTS: &str = "org.bluez.Error.InvalidArguments";

/// Connection to the system bus plus a BlueZ session for adapter control.
pub struct SystemBus {
   connection: Connection,
   session: Session,
}

impl SystemBus {
   pub async fn connect() -> Result<Self> {
      let connection = connection::Builder::system()?.build().await?;
      if let Some(name) = connection.unique_name() {
         info!("Connected to the system bus as {name}");
      }

      let session = Session::new().await?;
      Ok(Self {
         connection,
         session,
      })
   }
}

impl BluezBus for SystemBus {
   async fn managed_objects(&self) -> Result<Vec<ManagedObject>> {
      let objects = BluezObjectManagerProxy::new(&self.connection)
         .await?
         .get_managed_objects()
         .await?;

      Ok(objects
         .into_iter()
         .map(|(path, interfaces)| ManagedObject {
            path: SmolStr::new(path.as_str()),
            interfaces: interfaces.into_keys().map(SmolStr::from).collect(),
         })
         .collect())
   }

   async fn set_adapter(&self, adapter: &AdapterHandle, setting: AdapterSetting) -> Result<()> {
      let control_error = |setting: &'static str, e: bluer::Error| GatewayError::AdapterControl {
         adapter: adapter.name.clone(),
         setting,
         reason: e.to_string(),
      };

      let name = setting.name();
      let handle = self
         .session
         .adapter(&adapter.name)
         .map_err(|e| control_error(name, e))?;
      debug!("Setting {setting:?} on {}", adapter.path);

      let result = match setting {
         AdapterSetting::Alias(alias) => handle.set_alias(alias).await,
         AdapterSetting::Powered(on) => handle.set_powered(on).await,
         AdapterSetting::Discoverable(on) => handle.set_discoverable(on).await,
         AdapterSetting::Pairable(on) => handle.set_pairable(on).await,
      };
      result.map_err(|e| control_error(name, e))
   }

   async fn export_endpoint(&self, path: &str, endpoint: ServiceEndpoint) -> Result<bool> {
      Ok(self
         .connection
         .object_server()
         .at(path, ProfileObject::new(endpoint))
         .await?)
   }

   async fn register_profile(&self, descriptor: &ProfileDescriptor) -> Result<()> {
      let path = ObjectPath::try_from(descriptor.object_path.as_str()).map_err(zbus::Error::from)?;
      let options: HashMap<&str, Value<'_>> = descriptor
         .options
         .iter()
         .map(|(key, value)| (key, to_variant(value)))
         .collect();

      ProfileManager1Proxy::new(&self.connection)
         .await?
         .register_profile(&path, &descriptor.uuid.to_string(), options)
         .await
         .map_err(|e| registration_error(&descriptor.object_path, e))
   }

   async fn unregister_profile(&self, path: &str) -> Result<()> {
      let object_path = ObjectPath::try_from(path).map_err(zbus::Error::from)?;
      ProfileManager1Proxy::new(&self.connection)
         .await?
         .unregister_profile(&object_path)
         .await
         .map_err(|e| registration_error(path, e))
   }

   async fn connect_profile(&self, device: &str, uuid: Uuid) -> Result<()> {
      Device1Proxy::builder(&self.connection)
         .path(device)?
         .build()
         .await?
         .connect_profile(&uuid.to_string())
         .await
         .map_err(|e| GatewayError::ConnectProfile {
            device: SmolStr::new(device),
            uuid,
            reason: e.to_string(),
         })
   }

   async fn wait_for_disconnect(&self) -> Result<()> {
      let mut stream = MessageStream::from(&self.connection);
      while let Some(message) = stream.next().await {
         if let Err(e) = message {
            debug!("System bus stream error: {e}");
         }
      }
      Ok(())
   }
}

fn to_variant(value: &PropertyValue) -> Value<'_> {
   match value {
      PropertyValue::Str(s) | PropertyValue::Other(s) => Value::from(s.as_str()),
      PropertyValue::U16(v) => Value::U16(*v),
      PropertyValue::Bool(b) => Value::Bool(*b),
   }
}

fn registration_error(path: &str, err: zbus::Error) -> GatewayError {
   let path = SmolStr::new(path);
   if let zbus::Error::MethodError(name, detail, _) = &err {
      match name.as_str() {
         ERROR_ALREADY_EXISTS => return GatewayError::DuplicateRegistration(path),
         ERROR_INVALID_ARGUMENTS => {
            return GatewayError::InvalidArguments {
               path,
               reason: detail.clone().unwrap_or_default(),
            };
         },
         _ => {},
      }
   }
   GatewayError::Registration {
      path,
      reason: err.to_string(),
   }
}
