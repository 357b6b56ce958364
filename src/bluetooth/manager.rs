//! Bring-up orchestration.
//!
//! Drives the fixed sequence that turns a fresh adapter into an AA Wireless
//! gateway: find the adapter, register both profiles, power on, go
//! discoverable, poke the last known phone, then wait on the bus. Steps run
//! strictly one after another because each depends on the side effects of
//! the previous one. Only "nothing found" is recovered locally; any remote
//! error ends the bring-up.

use log::{debug, info, warn};
use strum::IntoEnumIterator;

use crate::{
   bluetooth::{
      adapter::{self, AdapterHandle},
      device,
      registrar::ProfileRegistrar,
   },
   bluez::BluezBus,
   config::Config,
   error::Result,
   event::EventSender,
   profile::{
      HSP_AG_UUID, ProfileKind,
      endpoint::{Logged, ServiceEndpoint},
      handlers::{AaWirelessProfile, HeadsetProfile},
   },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum BringUpState {
   Disconnected,
   Connected,
   AdapterResolved,
   ProfilesRegistered,
   AdapterPowered,
   AdapterDiscoverable,
   AwaitingPeer,
}

/// Owns the bus, the bound adapter and the exported endpoints for the life
/// of the process.
pub struct BluetoothManager<B> {
   bus: B,
   config: Config,
   events: EventSender,
   state: BringUpState,
   adapter: Option<AdapterHandle>,
   endpoints: Vec<ServiceEndpoint>,
   registrar: ProfileRegistrar,
}

impl<B: BluezBus> BluetoothManager<B> {
   /// Takes over an already established bus connection.
   pub fn new(bus: B, config: Config, events: EventSender) -> Self {
      Self {
         bus,
         config,
         events,
         state: BringUpState::Connected,
         adapter: None,
         endpoints: Vec::new(),
         registrar: ProfileRegistrar::new(),
      }
   }

   /// Runs the bring-up, then blocks until the bus goes away.
   pub async fn run(&mut self) -> Result<()> {
      self.bring_up().await?;
      info!("Waiting for peers");
      self.bus.wait_for_disconnect().await?;
      warn!("System bus connection closed");
      self.advance(BringUpState::Disconnected);
      Ok(())
   }

   pub async fn bring_up(&mut self) -> Result<()> {
      self.adapter = adapter::discover_adapter(&self.bus).await?;
      self.advance(BringUpState::AdapterResolved);

      for kind in ProfileKind::iter() {
         let endpoint = self.endpoint(kind);
         self.endpoints.push(endpoint.clone());
         self
            .registrar
            .register_profile(&self.bus, &kind.descriptor(), endpoint)
            .await?;
      }
      self.advance(BringUpState::ProfilesRegistered);

      adapter::power_on(&self.bus, self.adapter.as_ref(), &self.config.adapter_alias).await?;
      self.advance(BringUpState::AdapterPowered);

      adapter::set_pairable(&self.bus, self.adapter.as_ref(), self.config.pairable).await?;
      self.advance(BringUpState::AdapterDiscoverable);

      self.connect_device().await?;
      self.advance(BringUpState::AwaitingPeer);
      Ok(())
   }

   /// Withdraws our profiles from BlueZ. Best effort.
   pub async fn shutdown(&mut self) {
      for endpoint in &self.endpoints {
         debug!("{} endpoint is {}", endpoint.kind(), endpoint.state());
      }
      info!("Unregistering {} profile(s)", self.registrar.registered().len());
      self.registrar.unregister_all(&self.bus).await;
      self.advance(BringUpState::Disconnected);
   }

   async fn connect_device(&self) -> Result<()> {
      if !self.config.connect_on_startup {
         info!("Not connecting to a device on startup");
         return Ok(());
      }

      let Some(device) = device::find_connectable_device(&self.bus).await? else {
         return Ok(());
      };
      device::request_connect(&self.bus, &device, HSP_AG_UUID).await
   }

   fn endpoint(&self, kind: ProfileKind) -> ServiceEndpoint {
      let events = self.events.clone();
      match kind {
         ProfileKind::AaWireless => ServiceEndpoint::new(Logged(AaWirelessProfile::new(events))),
         ProfileKind::HspHeadset => ServiceEndpoint::new(Logged(HeadsetProfile::new(events))),
      }
   }

   fn advance(&mut self, next: BringUpState) {
      debug!("Bring-up: {} -> {next}", self.state);
      self.state = next;
   }
}

#[cfg(test)]
mod tests {
   use super::*;
   use crate::{
      bluez::{
         AdapterSetting,
         mock::{Call, EAGER_PEER, MockBus},
      },
      error::GatewayError,
      event::{ProfileEvent, testing::RecordingBus},
      profile::{AA_WIRELESS_OBJECT_PATH, HSP_HS_OBJECT_PATH, PropertyBag, endpoint::EndpointState},
   };

   const ADAPTER: &str = "/org/bluez/hci0";
   const PHONE: &str = "/org/bluez/hci0/dev_AA_BB_CC_DD_EE_FF";

   impl<B> BluetoothManager<B> {
      fn bus(&self) -> &B {
         &self.bus
      }

      const fn state(&self) -> BringUpState {
         self.state
      }
   }

   fn manager(
      bus: MockBus,
      config: Config,
   ) -> (BluetoothManager<MockBus>, std::sync::Arc<RecordingBus>) {
      let events = RecordingBus::new();
      (BluetoothManager::new(bus, config, events.clone()), events)
   }

   fn position(calls: &[Call], pred: impl Fn(&Call) -> bool) -> usize {
      calls.iter().position(pred).expect("call not made")
   }

   #[tokio::test]
   async fn test_no_adapter_no_device() {
      let (mut manager, events) = manager(MockBus::new(), Config::default());

      manager.run().await.unwrap();
      assert_eq!(manager.state(), BringUpState::Disconnected);

      let calls = manager.bus().calls();
      assert!(calls.contains(&Call::RegisterProfile(
         AA_WIRELESS_OBJECT_PATH.into(),
         ProfileKind::AaWireless.uuid(),
         PropertyBag::new()
            .with("Name", "AA Wireless")
            .with("Role", "server")
            .with("Channel", 8u16),
      )));
      assert!(calls.contains(&Call::RegisterProfile(
         HSP_HS_OBJECT_PATH.into(),
         ProfileKind::HspHeadset.uuid(),
         PropertyBag::new().with("Name", "HSP HS"),
      )));
      assert!(!calls.iter().any(|c| matches!(c, Call::SetAdapter(..))));
      assert!(!calls.iter().any(|c| matches!(c, Call::ConnectProfile(..))));
      assert_eq!(calls.last(), Some(&Call::WaitForDisconnect));
      assert_eq!(events.len(), 0);
   }

   #[tokio::test]
   async fn test_one_adapter_one_device() {
      let bus = MockBus::new().with_adapter(ADAPTER).with_device(PHONE);
      let (mut manager, _events) = manager(bus, Config::default());

      manager.bring_up().await.unwrap();
      assert_eq!(manager.state(), BringUpState::AwaitingPeer);

      let calls = manager.bus().calls();
      let last_register = calls
         .iter()
         .rposition(|c| matches!(c, Call::RegisterProfile(..)))
         .unwrap();
      let powered = position(&calls, |c| {
         *c == Call::SetAdapter(ADAPTER.into(), AdapterSetting::Powered(true))
      });
      let pairable = position(&calls, |c| {
         *c == Call::SetAdapter(ADAPTER.into(), AdapterSetting::Pairable(true))
      });
      let connect = position(&calls, |c| *c == Call::ConnectProfile(PHONE.into(), HSP_AG_UUID));

      assert!(last_register < powered);
      assert!(powered < pairable);
      assert!(pairable < connect);
      assert!(calls.contains(&Call::SetAdapter(
         ADAPTER.into(),
         AdapterSetting::Alias(crate::config::DEFAULT_ADAPTER_ALIAS.into())
      )));
      assert!(calls.contains(&Call::SetAdapter(
         ADAPTER.into(),
         AdapterSetting::Discoverable(true)
      )));
   }

   #[tokio::test]
   async fn test_peer_connects_before_registration() {
      let bus = MockBus::new().with_eager_peer();
      let (mut manager, events) = manager(bus, Config::default());

      manager.bring_up().await.unwrap();
      assert_eq!(manager.state(), BringUpState::AwaitingPeer);

      let events = events.take();
      assert_eq!(events.len(), 2);
      assert!(events.iter().all(|e| matches!(
         e,
         ProfileEvent::NewConnection(conn) if conn.device == EAGER_PEER
      )));
      assert_eq!(
         manager.bus().exported(AA_WIRELESS_OBJECT_PATH).unwrap().state(),
         EndpointState::Active
      );
   }

   #[tokio::test]
   async fn test_remote_error_stops_bring_up() {
      let bus = MockBus::new()
         .with_adapter(ADAPTER)
         .with_device(PHONE)
         .failing_setting("Discoverable");
      let (mut manager, _events) = manager(bus, Config::default());

      let err = manager.bring_up().await.unwrap_err();
      assert!(matches!(err, GatewayError::AdapterControl { .. }));
      assert_eq!(manager.state(), BringUpState::AdapterPowered);
      assert!(
         !manager
            .bus()
            .calls()
            .iter()
            .any(|c| matches!(c, Call::ConnectProfile(..)))
      );
   }

   #[tokio::test]
   async fn test_connect_failure_is_fatal() {
      let bus = MockBus::new()
         .with_adapter(ADAPTER)
         .with_device(PHONE)
         .refusing_connect();
      let (mut manager, _events) = manager(bus, Config::default());

      let err = manager.run().await.unwrap_err();
      assert!(matches!(err, GatewayError::ConnectProfile { .. }));
      assert_eq!(manager.state(), BringUpState::AdapterDiscoverable);
      assert!(!manager.bus().calls().contains(&Call::WaitForDisconnect));
   }

   #[tokio::test]
   async fn test_connect_on_startup_disabled() {
      let bus = MockBus::new().with_adapter(ADAPTER).with_device(PHONE);
      let config = Config {
         connect_on_startup: false,
         pairable: false,
         ..Config::default()
      };
      let (mut manager, _events) = manager(bus, config);

      manager.bring_up().await.unwrap();
      let calls = manager.bus().calls();
      assert!(!calls.iter().any(|c| matches!(c, Call::ConnectProfile(..))));
      assert!(calls.contains(&Call::SetAdapter(
         ADAPTER.into(),
         AdapterSetting::Pairable(false)
      )));
   }

   #[tokio::test]
   async fn test_shutdown_unregisters_profiles() {
      let (mut manager, _events) = manager(MockBus::new(), Config::default());
      manager.bring_up().await.unwrap();
      for path in [AA_WIRELESS_OBJECT_PATH, HSP_HS_OBJECT_PATH] {
         assert_eq!(
            manager.bus().exported(path).unwrap().state(),
            EndpointState::Active
         );
      }
      manager.shutdown().await;

      let calls = manager.bus().calls();
      assert!(calls.contains(&Call::UnregisterProfile(AA_WIRELESS_OBJECT_PATH.into())));
      assert!(calls.contains(&Call::UnregisterProfile(HSP_HS_OBJECT_PATH.into())));
      assert_eq!(manager.state(), BringUpState::Disconnected);
   }
}
