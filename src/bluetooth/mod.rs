//! Bluetooth bring-up for the gateway.
//!
//! Adapter control, profile registration and device connection are kept
//! as separate steps; the manager sequences them.

pub mod adapter;
pub mod device;
pub mod manager;
pub mod registrar;
