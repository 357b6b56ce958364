//! Bluetooth profile definitions advertised by the gateway.
//!
//! This module holds the well-known identifiers peers look for, the
//! descriptors handed to BlueZ's profile manager, and the typed property
//! bags exchanged with it.

use std::fmt;

use smol_str::SmolStr;
use uuid::Uuid;

pub mod endpoint;
pub mod handlers;

/// Android Auto wireless projection service.
pub const AA_WIRELESS_UUID: Uuid = Uuid::from_u128(0x4de17a00_52cb_11e6_bdf4_0800200c9a66);
/// Headset profile, headset role.
pub const HSP_HS_UUID: Uuid = Uuid::from_u128(0x00001108_0000_1000_8000_00805f9b34fb);
/// Headset profile, audio gateway role. Target of the active connect.
pub const HSP_AG_UUID: Uuid = Uuid::from_u128(0x00001112_0000_1000_8000_00805f9b34fb);

pub const AA_WIRELESS_OBJECT_PATH: &str = "/com/aawgd/bluetooth/aawg";
pub const HSP_HS_OBJECT_PATH: &str = "/com/aawgd/bluetooth/hsp";

/// RFCOMM channel the wireless projection server listens on.
pub const AA_WIRELESS_CHANNEL: u16 = 8;

/// The profiles this daemon advertises.
#[derive(
   Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter,
)]
pub enum ProfileKind {
   #[strum(serialize = "AA Wireless")]
   AaWireless,
   #[strum(serialize = "HSP HS")]
   HspHeadset,
}

impl ProfileKind {
   pub const fn object_path(self) -> &'static str {
      match self {
         Self::AaWireless => AA_WIRELESS_OBJECT_PATH,
         Self::HspHeadset => HSP_HS_OBJECT_PATH,
      }
   }

   pub const fn uuid(self) -> Uuid {
      match self {
         Self::AaWireless => AA_WIRELESS_UUID,
         Self::HspHeadset => HSP_HS_UUID,
      }
   }

   /// Builds the registration descriptor for this profile.
   ///
   /// The option set is exactly what BlueZ needs for each UUID: the
   /// projection service is a server on a fixed channel, while the headset
   /// profile only carries a name and lets BlueZ fill in the rest.
   pub fn descriptor(self) -> ProfileDescriptor {
      let options = match self {
         Self::AaWireless => PropertyBag::new()
            .with("Name", "AA Wireless")
            .with("Role", "server")
            .with("Channel", AA_WIRELESS_CHANNEL),
         Self::HspHeadset => PropertyBag::new().with("Name", "HSP HS"),
      };

      ProfileDescriptor {
         object_path: SmolStr::new_static(self.object_path()),
         uuid: self.uuid(),
         options,
      }
   }
}

/// Everything BlueZ needs to register one profile.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileDescriptor {
   pub object_path: SmolStr,
   pub uuid: Uuid,
   pub options: PropertyBag,
}

/// A typed D-Bus property value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
   Str(String),
   U16(u16),
   Bool(bool),
   /// Any other wire type, kept in its printed form.
   Other(String),
}

impl From<&str> for PropertyValue {
   fn from(value: &str) -> Self {
      Self::Str(value.to_string())
   }
}

impl From<u16> for PropertyValue {
   fn from(value: u16) -> Self {
      Self::U16(value)
   }
}

impl From<bool> for PropertyValue {
   fn from(value: bool) -> Self {
      Self::Bool(value)
   }
}

impl fmt::Display for PropertyValue {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      match self {
         Self::Str(s) => write!(f, "{s:?}"),
         Self::U16(v) => write!(f, "{v}"),
         Self::Bool(b) => write!(f, "{b}"),
         Self::Other(s) => f.write_str(s),
      }
   }
}

/// Ordered key to value mapping, as sent in `a{sv}` arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyBag(Vec<(SmolStr, PropertyValue)>);

impl PropertyBag {
   pub const fn new() -> Self {
      Self(Vec::new())
   }

   /// Inserts or replaces `key`, keeping first-insertion order.
   #[must_use]
   pub fn with(mut self, key: &str, value: impl Into<PropertyValue>) -> Self {
      self.insert(key, value.into());
      self
   }

   pub fn insert(&mut self, key: &str, value: PropertyValue) {
      if let Some(slot) = self.0.iter_mut().find(|(k, _)| k.as_str() == key) {
         slot.1 = value;
      } else {
         self.0.push((SmolStr::new(key), value));
      }
   }

   pub fn get(&self, key: &str) -> Option<&PropertyValue> {
      self.0.iter().find(|(k, _)| k.as_str() == key).map(|(_, v)| v)
   }

   pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
      self.0.iter().map(|(k, v)| (k.as_str(), v))
   }
}

impl fmt::Display for PropertyBag {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str("{")?;
      for (i, (key, value)) in self.iter().enumerate() {
         if i > 0 {
            f.write_str(", ")?;
         }
         write!(f, "{key}: {value}")?;
      }
      f.write_str("}")
   }
}
