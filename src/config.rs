//! Configuration for the gateway daemon.
//!
//! The configuration file is optional and read-only: when it is missing the
//! built-in defaults apply and nothing is written back to disk.

use std::{env, fs, path::PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Alias the adapter advertises once powered on.
pub const DEFAULT_ADAPTER_ALIAS: &str = "AA Wireless Gateway Dongle";

/// Main configuration structure for the daemon.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Config {
   #[serde(default = "default_adapter_alias")]
   pub adapter_alias: String,

   #[serde(default = "default_true")]
   pub pairable: bool,

   #[serde(default = "default_true")]
   pub connect_on_startup: bool,
}

fn default_adapter_alias() -> String {
   DEFAULT_ADAPTER_ALIAS.to_string()
}

const fn default_true() -> bool {
   true
}

impl Default for Config {
   fn default() -> Self {
      Self {
         adapter_alias: default_adapter_alias(),
         pairable: default_true(),
         connect_on_startup: default_true(),
      }
   }
}

impl Config {
   /// Loads configuration from disk, falling back to defaults if absent.
   pub fn load() -> Result<Self> {
      let Some(config_path) = Self::config_path() else {
         debug!("No configuration directory, using defaults");
         return Ok(Self::default());
      };

      if config_path.exists() {
         debug!("Reading configuration from {}", config_path.display());
         Self::from_toml(&fs::read_to_string(&config_path)?)
      } else {
         Ok(Self::default())
      }
   }

   pub fn from_toml(contents: &str) -> Result<Self> {
      Ok(toml::from_str(contents)?)
   }

   fn config_path() -> Option<PathBuf> {
      let config_dir = if let Ok(home) = env::var("AAWGD_HOME") {
         PathBuf::from(home)
      } else {
         dirs::config_dir()?.join("aawgd")
      };

      Some(config_dir.join("config.toml"))
   }
}
