//! Error types for the gateway daemon.
//!
//! Remote-call failures are split by the bring-up step that produced them so
//! the orchestrator can report exactly which part of the BlueZ conversation
//! went wrong. Discovery finding nothing is not an error; it is modelled as
//! `None` by the components that search.

use smol_str::SmolStr;
use thiserror::Error;
use uuid::Uuid;

/// Main error type for the gateway daemon.
#[derive(Error, Debug)]
pub enum GatewayError {
   #[error("D-Bus transport error: {0}")]
   Transport(#[from] zbus::Error),

   #[error("Bluetooth session error: {0}")]
   Session(#[from] bluer::Error),

   #[error("Failed to set {setting} on adapter {adapter}: {reason}")]
   AdapterControl {
      adapter: SmolStr,
      setting: &'static str,
      reason: String,
   },

   #[error("Failed to register profile {path}: {reason}")]
   Registration { path: SmolStr, reason: String },

   #[error("Profile {0} is already registered")]
   DuplicateRegistration(SmolStr),

   #[error("Invalid arguments for profile {path}: {reason}")]
   InvalidArguments { path: SmolStr, reason: String },

   #[error("ConnectProfile({uuid}) on {device} failed: {reason}")]
   ConnectProfile {
      device: SmolStr,
      uuid: Uuid,
      reason: String,
   },

   #[error("I/O error: {0}")]
   Io(#[from] std::io::Error),

   #[error("TOML parsing error: {0}")]
   TomlParse(#[from] toml::de::Error),
}

/// Convenience type alias for Results with `GatewayError`.
pub type Result<T> = std::result::Result<T, GatewayError>;
