//! Project constants.

use crate::clock::ClockConfiguration;
use drone_core::log;

/// HSE crystal frequency.
pub const HSE_FREQ: u32 = 8_000_000;

/// PLL multiplication factor.
pub const PLL_MULT: u32 = 9;

/// Clock tree: 72 MHz from the HSE crystal through the PLL, APB1 halved to
/// stay within 36 MHz.
pub const CLOCK: ClockConfiguration = ClockConfiguration::hse(HSE_FREQ)
    .pll(PLL_MULT)
    .apb1_div(2)
    .css()
    .build();

/// System clock frequency.
pub const SYS_CLK: u32 = CLOCK.sysclk();

// SWO output must stay reachable at HCLK.
const _: () = assert!(
    CLOCK.swo_prescaler(log::baud_rate!()).is_some(),
    "HCLK is below the SWO baud rate"
);
