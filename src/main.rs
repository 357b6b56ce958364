//! AA Wireless gateway Bluetooth daemon.
//!
//! Brings the local adapter up for wireless Android Auto: advertises the
//! projection and headset profiles through BlueZ, makes the adapter
//! discoverable and pairable, asks the last known phone to connect, and
//! then keeps the profile channels open until the system bus goes away.

use std::{sync::Arc, time::Duration};

use crossbeam::queue::SegQueue;
use log::{debug, info};
use tokio::{
   select,
   signal::{self, unix::SignalKind},
   sync::Notify,
   time,
};

use bluetooth::manager::BluetoothManager;
use bluez::system::SystemBus;
use connections::ConnectionTracker;
use event::{EventBus, ProfileEvent};

mod bluetooth;
mod bluez;
mod config;
mod connections;
mod dbus;
mod error;
mod event;
mod profile;

use crate::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
   env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

   info!("Starting AA Wireless gateway daemon...");

   let config = config::Config::load()?;
   info!("Adapter alias: {:?}", config.adapter_alias);

   // Callbacks from BlueZ land here and are processed off the dispatch path
   let event_bus = EventProcessor::new();
   event_bus.clone().spawn_dispatcher();

   let bus = SystemBus::connect().await?;
   let mut manager = BluetoothManager::new(bus, config, event_bus);

   let mut terminate = signal::unix::signal(SignalKind::terminate())?;
   let interrupted = select! {
      result = manager.run() => {
         result?;
         false
      }
      result = signal::ctrl_c() => {
         result?;
         true
      }
      _ = terminate.recv() => true,
   };

   if interrupted {
      info!("Shutting down AA Wireless gateway daemon...");
      manager.shutdown().await;
   }

   Ok(())
}

struct EventProcessor {
   queue: SegQueue<ProfileEvent>,
   notifier: Notify,
}

impl EventProcessor {
   fn new() -> Arc<Self> {
      Arc::new(Self {
         queue: SegQueue::new(),
         notifier: Notify::new(),
      })
   }
}

impl EventProcessor {
   async fn recv(self: &Arc<Self>) -> Option<ProfileEvent> {
      loop {
         if let Some(event) = self.queue.pop() {
            return Some(event);
         }
         let notify = self.notifier.notified();
         if let Some(event) = self.queue.pop() {
            return Some(event);
         }
         if Arc::strong_count(self) == 1 {
            return None;
         }
         // Senders never announce that they are gone, so poll the count.
         let _ = time::timeout(Duration::from_secs(1), notify).await;
      }
   }

   fn spawn_dispatcher(self: Arc<Self>) {
      tokio::spawn(async move {
         let mut tracker = ConnectionTracker::new();
         while let Some(event) = self.recv().await {
            tracker.handle(event);
            debug!("{} profile channel(s) open", tracker.len());
         }
      });
   }
}

impl EventBus for EventProcessor {
   fn emit(&self, event: ProfileEvent) {
      self.queue.push(event);
      self.notifier.notify_waiters();
   }
}
