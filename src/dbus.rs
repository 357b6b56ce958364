//! The `org.bluez.Profile1` object BlueZ calls back into.

use std::collections::HashMap;

use smol_str::SmolStr;
use zbus::{
   interface,
   zvariant::{self, OwnedObjectPath, OwnedValue, Value},
};

use crate::profile::{PropertyBag, PropertyValue, endpoint::ServiceEndpoint};

pub struct ProfileObject {
   endpoint: ServiceEndpoint,
}

impl ProfileObject {
   pub const fn new(endpoint: ServiceEndpoint) -> Self {
      Self { endpoint }
   }
}

#[interface(name = "org.bluez.Profile1")]
impl ProfileObject {
   fn release(&self) {
      self.endpoint.on_release();
   }

   fn new_connection(
      &self,
      device: OwnedObjectPath,
      fd: zvariant::OwnedFd,
      fd_properties: HashMap<String, OwnedValue>,
   ) {
      self.endpoint.on_new_connection(
         SmolStr::new(device.as_str()),
         fd.into(),
         property_bag(fd_properties),
      );
   }

   fn request_disconnection(&self, device: OwnedObjectPath) {
      self.endpoint.on_disconnect_request(device.as_str());
   }
}

fn property_bag(properties: HashMap<String, OwnedValue>) -> PropertyBag {
   let mut entries: Vec<_> = properties.into_iter().collect();
   entries.sort_by(|(a, _), (b, _)| a.cmp(b));

   let mut bag = PropertyBag::new();
   for (key, value) in entries {
      bag.insert(&key, property_value(&value));
   }
   bag
}

fn property_value(value: &Value<'_>) -> PropertyValue {
   match value {
      Value::Str(s) => PropertyValue::Str(s.to_string()),
      Value::U16(v) => PropertyValue::U16(*v),
      Value::Bool(b) => PropertyValue::Bool(*b),
      other => PropertyValue::Other(format!("{other:?}")),
   }
}
