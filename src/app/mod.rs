//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the supervisor of the soft-start controller:
//! per-tick orchestration of sensing, safety, the FSM and the actuator
//! write-out.  All interaction with hardware happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
