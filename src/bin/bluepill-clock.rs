#![warn(unsafe_op_in_unsafe_fn)]
#![no_main]
#![no_std]

use bluepill_clock::{
    tasks,
    thr::{ThrsInit, Vtable},
    Regs,
};
use drone_core::{mem, token::Token};
use drone_cortexm::processor;

/// The vector table.
#[no_mangle]
pub static VTABLE: Vtable = Vtable::new(reset);

/// The entry point.
///
/// # Safety
///
/// This function should only be called by hardware.
#[no_mangle]
pub unsafe extern "C" fn reset() -> ! {
    // Zero the `.bss` section before any static is read.
    unsafe { mem::bss_init() };
    // Copy `.data` initial values from flash.
    unsafe { mem::data_init() };
    // Configure the clocks and report them.
    tasks::root(
        // Register tokens are zero-sized. Safe only if this is the only
        // instance, which also keeps the clock bring-up to a single run.
        unsafe { Regs::take() },
        // Safe only if this is the only instance.
        unsafe { ThrsInit::take() },
    );
    // If the root task returned, always sleep between interrupts.
    loop {
        processor::wait_for_int();
    }
}
