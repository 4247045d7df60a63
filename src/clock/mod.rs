//! System clock configuration.
//!
//! A [`ClockConfiguration`] is a compile-time constant describing the clock
//! tree. It expands into a [`ClockPlan`], the exact sequence of register
//! writes, which [`init`] applies once at startup.

mod config;
mod init;
mod plan;

pub use self::{
    config::{ClockBuilder, ClockConfiguration, ConfigError, Oscillator, Pll, HSI_FREQ},
    init::{init, ClockRegs},
    plan::{ClockPlan, ClockStep, PllSource, SysClkSource},
};
