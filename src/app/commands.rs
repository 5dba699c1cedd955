//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (debug console,
//! boot-time restore, a supervisory host) that the
//! [`AppService`](super::service::AppService) interprets and acts upon.
//! No command starts a boost, and none clears a fault short of a full
//! re-initialisation.

use crate::config::SystemConfig;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Full re-initialisation: clears the fault record, the discharge
    /// profile and every timer, then restarts from `Init`.  The only way
    /// out of `Fault` and `Idle`.
    Reinitialize,

    /// Enter `Idle` with every actuator off.  Rejected while in `Fault`.
    Park,

    /// Replace the live configuration.  Rejected while `Boosting` or if
    /// the new config fails validation.
    UpdateConfig(SystemConfig),
}
