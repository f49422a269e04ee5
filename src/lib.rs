//! ThermHub firmware library.
//!
//! Exposes the acquisition core, the adapters and the drivers for
//! integration testing and for the binary.  ESP-IDF-specific code is
//! guarded by the `espidf` feature inside each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod context;
pub mod error;
pub mod history;
pub mod logger;
pub mod pins;
pub mod scheduler;
pub mod telemetry;

pub mod adapters;
pub mod drivers;
pub mod sensors;
