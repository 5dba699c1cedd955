//! Actuator decision logic: when to charge, how hard to discharge.

pub mod charge;
pub mod discharge;
