//! SoftStart firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod control;
pub mod diagnostics;
pub mod error;
pub mod events;
pub mod fsm;
pub mod phase;
pub mod safety;
pub mod scheduler;
pub mod sensors;

pub mod pins;

// Hardware-facing modules compile on the host too; the ESP-IDF calls
// inside are replaced by simulation stubs.
pub mod adapters;
pub mod drivers;

pub use error::FaultCode;
pub use fsm::StateId as OperatingState;
