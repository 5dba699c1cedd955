//! Millisecond timebase using ESP-IDF's esp_timer API.
//!
//! One periodic 1 ms timer advances [`TimeBase`] inside [`IsrShared`].
//! The control loop never reads the hardware clock directly; every
//! elapsed-time decision is made against this counter.
//!
//! Timer callbacks execute in the ESP timer task context (not ISR), so
//! they only touch the atomic counter.  On simulation targets the timer
//! is not started and tests advance the counter by hand.

use crate::events::IsrShared;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

/// Timer period in microseconds.
pub const TICK_PERIOD_US: u64 = 1_000;

#[cfg(target_os = "espidf")]
static mut TICK_TIMER: esp_timer_handle_t = core::ptr::null_mut();

/// SAFETY: TICK_TIMER is written once in `start_tick_timer()` before any
/// timer callbacks fire.  Only called from the single main task.
#[cfg(target_os = "espidf")]
unsafe fn tick_timer() -> esp_timer_handle_t {
    unsafe { TICK_TIMER }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn tick_cb(arg: *mut core::ffi::c_void) {
    // SAFETY: `arg` is the `&'static IsrShared` passed to esp_timer_create.
    let shared = unsafe { &*(arg as *const IsrShared) };
    shared.time.advance(1);
}

/// Start the 1 ms timebase.
#[cfg(target_os = "espidf")]
pub fn start_tick_timer(shared: &'static IsrShared) -> Result<(), i32> {
    // SAFETY: TICK_TIMER is written here once at boot from the single
    // main-task context before any timer callbacks fire.
    unsafe {
        let args = esp_timer_create_args_t {
            callback: Some(tick_cb),
            arg: shared as *const IsrShared as *mut core::ffi::c_void,
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: b"tick1ms\0".as_ptr() as *const _,
            skip_unhandled_events: false,
        };
        let ret = esp_timer_create(&args, &raw mut TICK_TIMER);
        if ret != ESP_OK as i32 {
            log::error!("hw_timer: tick timer create failed (rc={})", ret);
            return Err(ret);
        }
        let ret = esp_timer_start_periodic(tick_timer(), TICK_PERIOD_US);
        if ret != ESP_OK as i32 {
            log::error!("hw_timer: tick timer start failed (rc={})", ret);
            return Err(ret);
        }
    }
    info!("hw_timer: 1 ms timebase started");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn start_tick_timer(_shared: &'static IsrShared) -> Result<(), i32> {
    log::info!("hw_timer(sim): timebase advanced manually");
    Ok(())
}
