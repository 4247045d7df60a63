use super::config::{ClockConfiguration, Oscillator};
use core::ops::Deref;

const MAX_STEPS: usize = 7;

/// SYSCLK source, as encoded in RCC_CFGR.SW and RCC_CFGR.SWS.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SysClkSource {
    /// HSI oscillator.
    Hsi,
    /// HSE oscillator.
    Hse,
    /// PLL output.
    Pll,
}

impl SysClkSource {
    /// Returns the SW/SWS field value.
    pub const fn bits(self) -> u32 {
        match self {
            Self::Hsi => 0b00,
            Self::Hse => 0b01,
            Self::Pll => 0b10,
        }
    }
}

/// PLL input, as encoded in RCC_CFGR.PLLSRC.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PllSource {
    /// HSI divided by two.
    HsiDiv2,
    /// HSE, optionally divided by two.
    Hse,
}

/// A single register-level action of the clock bring-up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockStep {
    /// Enable HSE and wait until RCC_CR.HSERDY.
    StartHse {
        /// Set RCC_CR.HSEBYP first.
        bypass: bool,
    },
    /// Set RCC_CR.CSSON.
    EnableCss,
    /// Program RCC_CFGR.PLLSRC, PLLXTPRE and PLLMUL.
    ConfigurePll {
        /// PLL input.
        source: PllSource,
        /// RCC_CFGR.PLLXTPRE.
        hse_div2: bool,
        /// RCC_CFGR.PLLMUL.
        mul_bits: u32,
    },
    /// Enable the PLL and wait until RCC_CR.PLLRDY.
    StartPll,
    /// Program RCC_CFGR.HPRE, PPRE1 and PPRE2.
    SetPrescalers {
        /// RCC_CFGR.HPRE.
        hpre: u32,
        /// RCC_CFGR.PPRE1.
        ppre1: u32,
        /// RCC_CFGR.PPRE2.
        ppre2: u32,
    },
    /// Program FLASH_ACR.LATENCY with the prefetch buffer enabled.
    SetFlashLatency {
        /// Wait states.
        latency: u32,
    },
    /// Switch SYSCLK and wait until RCC_CFGR.SWS confirms it.
    SelectSysClk {
        /// New source.
        source: SysClkSource,
    },
}

/// Ordered steps that bring the clock tree from reset to a configuration.
///
/// Each of [`ClockStep::StartHse`] and [`ClockStep::StartPll`] appears at
/// most once, and [`ClockStep::SelectSysClk`] is always the last step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockPlan {
    steps: [ClockStep; MAX_STEPS],
    len: usize,
}

impl ClockPlan {
    fn new() -> Self {
        Self {
            steps: [ClockStep::SelectSysClk { source: SysClkSource::Hsi }; MAX_STEPS],
            len: 0,
        }
    }

    fn push(&mut self, step: ClockStep) {
        self.steps[self.len] = step;
        self.len += 1;
    }
}

impl Deref for ClockPlan {
    type Target = [ClockStep];

    fn deref(&self) -> &[ClockStep] {
        &self.steps[..self.len]
    }
}

impl ClockConfiguration {
    /// Expands the configuration into register steps.
    ///
    /// The oscillators are started first, the buses and the flash are
    /// prepared for the new frequency, and SYSCLK is switched last.
    pub fn plan(&self) -> ClockPlan {
        let mut plan = ClockPlan::new();
        let mut source = SysClkSource::Hsi;
        if let Oscillator::Hse { bypass, .. } = self.oscillator() {
            plan.push(ClockStep::StartHse { bypass });
            if self.css_enabled() {
                plan.push(ClockStep::EnableCss);
            }
            source = SysClkSource::Hse;
        }
        if let Some(pll) = self.pll_config() {
            plan.push(ClockStep::ConfigurePll {
                source: match self.oscillator() {
                    Oscillator::Hsi => PllSource::HsiDiv2,
                    Oscillator::Hse { .. } => PllSource::Hse,
                },
                hse_div2: pll.hse_div2,
                // PLLMUL encodes x2 as zero.
                mul_bits: pll.mul - 2,
            });
            plan.push(ClockStep::StartPll);
            source = SysClkSource::Pll;
        }
        plan.push(ClockStep::SetPrescalers {
            hpre: hpre_bits(self.ahb_prescaler()),
            ppre1: ppre_bits(self.apb1_prescaler()),
            ppre2: ppre_bits(self.apb2_prescaler()),
        });
        plan.push(ClockStep::SetFlashLatency { latency: self.flash_latency() });
        plan.push(ClockStep::SelectSysClk { source });
        plan
    }
}

/// Encodes an AHB prescaler into RCC_CFGR.HPRE.
pub(super) const fn hpre_bits(div: u32) -> u32 {
    match div {
        2 => 0b1000,
        4 => 0b1001,
        8 => 0b1010,
        16 => 0b1011,
        64 => 0b1100,
        128 => 0b1101,
        256 => 0b1110,
        512 => 0b1111,
        _ => 0b0000,
    }
}

/// Encodes an APB prescaler into RCC_CFGR.PPRE1/PPRE2.
pub(super) const fn ppre_bits(div: u32) -> u32 {
    match div {
        2 => 0b100,
        4 => 0b101,
        8 => 0b110,
        16 => 0b111,
        _ => 0b000,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blue_pill_72mhz_sequence() {
        let clock = ClockConfiguration::hse(8_000_000)
            .pll(9)
            .apb1_div(2)
            .css()
            .build();
        assert_eq!(
            &*clock.plan(),
            &[
                ClockStep::StartHse { bypass: false },
                ClockStep::EnableCss,
                ClockStep::ConfigurePll {
                    source: PllSource::Hse,
                    hse_div2: false,
                    mul_bits: 0b0111,
                },
                ClockStep::StartPll,
                ClockStep::SetPrescalers {
                    hpre: 0b0000,
                    ppre1: 0b100,
                    ppre2: 0b000,
                },
                ClockStep::SetFlashLatency { latency: 2 },
                ClockStep::SelectSysClk {
                    source: SysClkSource::Pll,
                },
            ]
        );
    }

    #[test]
    fn deterministic() {
        let clock = ClockConfiguration::hse(8_000_000)
            .pll(9)
            .apb1_div(2)
            .build();
        assert_eq!(clock.plan(), clock.plan());
        assert_eq!(&*clock.plan(), &*clock.plan());
    }

    #[test]
    fn hsi_only() {
        let clock = ClockConfiguration::hsi().build();
        assert_eq!(
            &*clock.plan(),
            &[
                ClockStep::SetPrescalers {
                    hpre: 0,
                    ppre1: 0,
                    ppre2: 0,
                },
                ClockStep::SetFlashLatency { latency: 0 },
                ClockStep::SelectSysClk {
                    source: SysClkSource::Hsi,
                },
            ]
        );
    }

    #[test]
    fn hse_bypass_without_pll() {
        let clock = ClockConfiguration::hse_bypass(12_000_000).build();
        assert_eq!(
            &*clock.plan(),
            &[
                ClockStep::StartHse { bypass: true },
                ClockStep::SetPrescalers {
                    hpre: 0,
                    ppre1: 0,
                    ppre2: 0,
                },
                ClockStep::SetFlashLatency { latency: 0 },
                ClockStep::SelectSysClk {
                    source: SysClkSource::Hse,
                },
            ]
        );
    }

    #[test]
    fn hsi_pll() {
        let clock = ClockConfiguration::hsi().pll(16).apb1_div(2).build();
        let plan = clock.plan();
        assert_eq!(
            plan[0],
            ClockStep::ConfigurePll {
                source: PllSource::HsiDiv2,
                hse_div2: false,
                mul_bits: 0b1110,
            }
        );
        assert_eq!(plan[1], ClockStep::StartPll);
        assert_eq!(
            plan.last(),
            Some(&ClockStep::SelectSysClk {
                source: SysClkSource::Pll,
            })
        );
    }

    #[test]
    fn pll_multiplier_edges() {
        let mul_bits = |clock: ClockConfiguration| {
            clock.plan().iter().find_map(|step| match *step {
                ClockStep::ConfigurePll { mul_bits, .. } => Some(mul_bits),
                _ => None,
            })
        };
        let low = ClockConfiguration::hse(8_000_000).pll(2).build();
        let high = ClockConfiguration::hse(4_000_000)
            .pll(16)
            .apb1_div(2)
            .build();
        assert_eq!(mul_bits(low), Some(0b0000));
        assert_eq!(mul_bits(high), Some(0b1110));
    }

    #[test]
    fn oscillators_start_at_most_once() {
        let clocks = [
            ClockConfiguration::hsi().build(),
            ClockConfiguration::hsi().pll(9).apb1_div(2).build(),
            ClockConfiguration::hse(8_000_000).css().build(),
            ClockConfiguration::hse_bypass(12_000_000)
                .pll(6)
                .apb1_div(2)
                .build(),
            ClockConfiguration::hse(16_000_000)
                .pll(9)
                .pll_hse_div2()
                .apb1_div(2)
                .css()
                .build(),
        ];
        for clock in clocks.iter() {
            let plan = clock.plan();
            let count = |f: fn(&ClockStep) -> bool| plan.iter().filter(|s| f(s)).count();
            assert!(count(|s| matches!(s, ClockStep::StartHse { .. })) <= 1);
            assert!(count(|s| matches!(s, ClockStep::StartPll)) <= 1);
            assert!(matches!(plan.last(), Some(ClockStep::SelectSysClk { .. })));
        }
    }

    #[test]
    fn switch_comes_last() {
        let clock = ClockConfiguration::hse(16_000_000)
            .pll(9)
            .pll_hse_div2()
            .apb1_div(2)
            .build();
        let plan = clock.plan();
        let position = |f: fn(&ClockStep) -> bool| plan.iter().position(f);
        let switch = position(|s| matches!(s, ClockStep::SelectSysClk { .. }));
        let latency = position(|s| matches!(s, ClockStep::SetFlashLatency { .. }));
        let prescalers = position(|s| matches!(s, ClockStep::SetPrescalers { .. }));
        assert_eq!(switch, Some(plan.len() - 1));
        assert!(latency < switch);
        assert!(prescalers < switch);
    }

    #[test]
    fn prescaler_encoding() {
        assert_eq!(hpre_bits(1), 0b0000);
        assert_eq!(hpre_bits(16), 0b1011);
        assert_eq!(hpre_bits(64), 0b1100);
        assert_eq!(hpre_bits(512), 0b1111);
        assert_eq!(ppre_bits(1), 0b000);
        assert_eq!(ppre_bits(2), 0b100);
        assert_eq!(ppre_bits(16), 0b111);
    }

    #[test]
    fn sysclk_source_encoding() {
        assert_eq!(SysClkSource::Hsi.bits(), 0b00);
        assert_eq!(SysClkSource::Hse.bits(), 0b01);
        assert_eq!(SysClkSource::Pll.bits(), 0b10);
    }
}
