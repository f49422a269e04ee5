//! Application core: request routing, hub events and the port traits.
//!
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
