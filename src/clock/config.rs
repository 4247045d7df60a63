use core::fmt;

/// HSI RC oscillator frequency.
pub const HSI_FREQ: u32 = 8_000_000;

const HSE_MIN: u32 = 4_000_000;
const HSE_MAX: u32 = 16_000_000;
const HSE_BYPASS_MIN: u32 = 1_000_000;
const HSE_BYPASS_MAX: u32 = 25_000_000;
const SYSCLK_MAX: u32 = 72_000_000;
const PCLK1_MAX: u32 = 36_000_000;

/// Clock source feeding SYSCLK directly or through the PLL.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Oscillator {
    /// Internal 8 MHz RC oscillator.
    Hsi,
    /// External oscillator.
    Hse {
        /// Crystal or external clock frequency.
        freq: u32,
        /// External clock fed directly into OSC_IN, no crystal.
        bypass: bool,
    },
}

/// PLL settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pll {
    /// Multiplication factor, 2 to 16.
    pub mul: u32,
    /// Divide HSE by two before the PLL.
    pub hse_div2: bool,
}

/// Unchecked clock tree settings.
///
/// Obtained from [`ClockConfiguration::hsi`], [`ClockConfiguration::hse`] or
/// [`ClockConfiguration::hse_bypass`]. Only [`build`](ClockBuilder::build)
/// and [`try_build`](ClockBuilder::try_build) turn it into a
/// [`ClockConfiguration`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockBuilder {
    osc: Oscillator,
    pll: Option<Pll>,
    ahb_div: u32,
    apb1_div: u32,
    apb2_div: u32,
    css: bool,
}

/// Clock tree settings within the device's operating range.
///
/// Built at compile time with the `const fn` builder. A configuration
/// outside the operating range fails constant evaluation:
///
/// ```
/// use bluepill_clock::clock::ClockConfiguration;
///
/// const CLOCK: ClockConfiguration =
///     ClockConfiguration::hse(8_000_000).pll(9).apb1_div(2).build();
/// assert_eq!(CLOCK.sysclk(), 72_000_000);
/// assert_eq!(CLOCK.flash_latency(), 2);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockConfiguration {
    tree: ClockBuilder,
}

/// A clock setting outside the device's operating range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// HSE crystal frequency outside 4-16 MHz.
    HseOutOfRange,
    /// External bypass clock outside 1-25 MHz.
    HseBypassOutOfRange,
    /// PLL multiplier outside 2-16.
    PllMulOutOfRange,
    /// HSE pre-divider requested with HSI feeding the PLL.
    PllDiv2WithoutHse,
    /// SYSCLK above 72 MHz.
    SysClkTooHigh,
    /// AHB prescaler not one of 1, 2, 4, 8, 16, 64, 128, 256, 512.
    InvalidAhbPrescaler,
    /// APB prescaler not one of 1, 2, 4, 8, 16.
    InvalidApbPrescaler,
    /// APB1 clock above 36 MHz.
    Pclk1TooHigh,
    /// Clock security system enabled without HSE.
    CssWithoutHse,
}

impl ConfigError {
    /// Returns a static description of the error.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HseOutOfRange => "HSE crystal frequency must be within 4-16 MHz",
            Self::HseBypassOutOfRange => {
                "HSE bypass clock frequency must be within 1-25 MHz"
            }
            Self::PllMulOutOfRange => "PLL multiplier must be within 2-16",
            Self::PllDiv2WithoutHse => "PLL HSE/2 pre-divider requires HSE",
            Self::SysClkTooHigh => "SYSCLK must not exceed 72 MHz",
            Self::InvalidAhbPrescaler => {
                "AHB prescaler must be 1, 2, 4, 8, 16, 64, 128, 256 or 512"
            }
            Self::InvalidApbPrescaler => "APB prescaler must be 1, 2, 4, 8 or 16",
            Self::Pclk1TooHigh => "PCLK1 must not exceed 36 MHz",
            Self::CssWithoutHse => "clock security system requires HSE",
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ClockBuilder {
    const fn with_osc(osc: Oscillator) -> Self {
        Self {
            osc,
            pll: None,
            ahb_div: 1,
            apb1_div: 1,
            apb2_div: 1,
            css: false,
        }
    }

    /// Routes the oscillator through the PLL with the multiplier `mul`.
    pub const fn pll(mut self, mul: u32) -> Self {
        self.pll = Some(Pll { mul, hse_div2: false });
        self
    }

    /// Divides HSE by two in front of the PLL. No-op without a PLL.
    pub const fn pll_hse_div2(mut self) -> Self {
        if let Some(pll) = self.pll {
            self.pll = Some(Pll { hse_div2: true, ..pll });
        }
        self
    }

    /// Sets the AHB prescaler.
    pub const fn ahb_div(mut self, div: u32) -> Self {
        self.ahb_div = div;
        self
    }

    /// Sets the APB1 (low-speed) prescaler.
    pub const fn apb1_div(mut self, div: u32) -> Self {
        self.apb1_div = div;
        self
    }

    /// Sets the APB2 (high-speed) prescaler.
    pub const fn apb2_div(mut self, div: u32) -> Self {
        self.apb2_div = div;
        self
    }

    /// Enables the clock security system.
    pub const fn css(mut self) -> Self {
        self.css = true;
        self
    }

    /// Validates the settings.
    ///
    /// # Panics
    ///
    /// If the settings are outside the operating range. In a `const` item
    /// this fails the build.
    pub const fn build(self) -> ClockConfiguration {
        match self.try_build() {
            Ok(config) => config,
            Err(err) => panic!("{}", err.as_str()),
        }
    }

    /// Validates the settings, returning the offending one on failure.
    pub const fn try_build(self) -> Result<ClockConfiguration, ConfigError> {
        match self.validate() {
            Ok(()) => Ok(ClockConfiguration { tree: self }),
            Err(err) => Err(err),
        }
    }

    /// Checks the settings against the device's operating ranges.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if let Oscillator::Hse { freq, bypass } = self.osc {
            if bypass {
                if freq < HSE_BYPASS_MIN || freq > HSE_BYPASS_MAX {
                    return Err(ConfigError::HseBypassOutOfRange);
                }
            } else if freq < HSE_MIN || freq > HSE_MAX {
                return Err(ConfigError::HseOutOfRange);
            }
        }
        if let Some(pll) = self.pll {
            if pll.mul < 2 || pll.mul > 16 {
                return Err(ConfigError::PllMulOutOfRange);
            }
            if pll.hse_div2 && matches!(self.osc, Oscillator::Hsi) {
                return Err(ConfigError::PllDiv2WithoutHse);
            }
        }
        if self.sysclk() > SYSCLK_MAX {
            return Err(ConfigError::SysClkTooHigh);
        }
        if !matches!(self.ahb_div, 1 | 2 | 4 | 8 | 16 | 64 | 128 | 256 | 512) {
            return Err(ConfigError::InvalidAhbPrescaler);
        }
        if !matches!(self.apb1_div, 1 | 2 | 4 | 8 | 16)
            || !matches!(self.apb2_div, 1 | 2 | 4 | 8 | 16)
        {
            return Err(ConfigError::InvalidApbPrescaler);
        }
        if self.sysclk() / self.ahb_div / self.apb1_div > PCLK1_MAX {
            return Err(ConfigError::Pclk1TooHigh);
        }
        if self.css && matches!(self.osc, Oscillator::Hsi) {
            return Err(ConfigError::CssWithoutHse);
        }
        Ok(())
    }

    const fn osc_freq(&self) -> u32 {
        match self.osc {
            Oscillator::Hsi => HSI_FREQ,
            Oscillator::Hse { freq, .. } => freq,
        }
    }

    const fn pll_input(&self) -> u32 {
        match (self.osc, self.pll) {
            (Oscillator::Hsi, _) => HSI_FREQ / 2,
            (Oscillator::Hse { freq, .. }, Some(Pll { hse_div2: true, .. })) => freq / 2,
            (Oscillator::Hse { freq, .. }, _) => freq,
        }
    }

    const fn sysclk(&self) -> u32 {
        match self.pll {
            Some(pll) => self.pll_input() * pll.mul,
            None => self.osc_freq(),
        }
    }
}

impl ClockConfiguration {
    /// Runs from the internal RC oscillator, all prescalers at 1.
    pub const fn hsi() -> ClockBuilder {
        ClockBuilder::with_osc(Oscillator::Hsi)
    }

    /// Runs from an external crystal of `freq` Hz.
    pub const fn hse(freq: u32) -> ClockBuilder {
        ClockBuilder::with_osc(Oscillator::Hse { freq, bypass: false })
    }

    /// Runs from an external clock of `freq` Hz fed into OSC_IN.
    pub const fn hse_bypass(freq: u32) -> ClockBuilder {
        ClockBuilder::with_osc(Oscillator::Hse { freq, bypass: true })
    }

    /// Returns the oscillator selection.
    pub const fn oscillator(&self) -> Oscillator {
        self.tree.osc
    }

    /// Returns the PLL settings, if the PLL is used.
    pub const fn pll_config(&self) -> Option<Pll> {
        self.tree.pll
    }

    /// Returns `true` if the clock security system is enabled.
    pub const fn css_enabled(&self) -> bool {
        self.tree.css
    }

    /// Returns the AHB prescaler.
    pub const fn ahb_prescaler(&self) -> u32 {
        self.tree.ahb_div
    }

    /// Returns the APB1 prescaler.
    pub const fn apb1_prescaler(&self) -> u32 {
        self.tree.apb1_div
    }

    /// Returns the APB2 prescaler.
    pub const fn apb2_prescaler(&self) -> u32 {
        self.tree.apb2_div
    }

    /// Returns the frequency of the oscillator.
    pub const fn osc_freq(&self) -> u32 {
        self.tree.osc_freq()
    }

    /// Returns the PLL input frequency. HSI always enters the PLL halved.
    pub const fn pll_input(&self) -> u32 {
        self.tree.pll_input()
    }

    /// Returns the SYSCLK frequency.
    pub const fn sysclk(&self) -> u32 {
        self.tree.sysclk()
    }

    /// Returns the AHB bus and core clock frequency.
    pub const fn hclk(&self) -> u32 {
        self.sysclk() / self.tree.ahb_div
    }

    /// Returns the APB1 peripheral clock frequency.
    pub const fn pclk1(&self) -> u32 {
        self.hclk() / self.tree.apb1_div
    }

    /// Returns the APB2 peripheral clock frequency.
    pub const fn pclk2(&self) -> u32 {
        self.hclk() / self.tree.apb2_div
    }

    /// Returns the number of flash wait states needed at SYSCLK.
    pub const fn flash_latency(&self) -> u32 {
        match self.sysclk() {
            0..=24_000_000 => 0,
            24_000_001..=48_000_000 => 1,
            _ => 2,
        }
    }

    /// Returns the SWO prescaler for `baud_rate` at HCLK, or `None` if HCLK
    /// is too slow to reach it.
    pub const fn swo_prescaler(&self, baud_rate: u32) -> Option<u32> {
        if baud_rate == 0 {
            return None;
        }
        (self.hclk() / baud_rate).checked_sub(1)
    }
}
