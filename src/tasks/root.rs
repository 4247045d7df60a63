//! The root task.

use crate::{
    clock::{self, ClockRegs},
    consts::{CLOCK, SYS_CLK},
    thr,
    thr::ThrsInit,
    Regs,
};
use drone_cortexm::{reg::prelude::*, thr::prelude::*};

/// The root task handler.
#[inline(never)]
pub fn handler(reg: Regs, thr_init: ThrsInit) {
    let thr = thr::init(thr_init);

    thr.hard_fault.add_once(|| panic!("Hard Fault"));
    thr.nmi.add_once(|| panic!("HSE failure detected by the clock security system"));

    clock::init(
        CLOCK,
        ClockRegs {
            flash_acr: reg.flash_acr,
            rcc_cfgr: reg.rcc_cfgr,
            rcc_cir: reg.rcc_cir,
            rcc_cr: reg.rcc_cr,
        },
        thr.rcc,
    )
    .root_wait();

    println!("SYSCLK: {} Hz", SYS_CLK);
    println!(
        "HCLK: {} Hz, PCLK1: {} Hz, PCLK2: {} Hz",
        CLOCK.hclk(),
        CLOCK.pclk1(),
        CLOCK.pclk2()
    );
    println!("Flash wait states: {}", CLOCK.flash_latency());

    // Enter a sleep state on ISR exit.
    reg.scb_scr.sleeponexit.set_bit();
}
