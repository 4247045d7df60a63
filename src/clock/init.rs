use super::{ClockConfiguration, ClockStep, PllSource};
use crate::thr;
use core::future::Future;
use drone_core::log;
use drone_cortexm::{fib, reg::prelude::*, swo, thr::prelude::*};
use drone_stm32_map::reg;

/// Register tokens consumed by [`init`].
pub struct ClockRegs {
    /// FLASH_ACR.
    pub flash_acr: reg::flash::Acr<Srt>,
    /// RCC_CFGR.
    pub rcc_cfgr: reg::rcc::Cfgr<Srt>,
    /// RCC_CIR.
    pub rcc_cir: reg::rcc::Cir<Srt>,
    /// RCC_CR.
    pub rcc_cr: reg::rcc::Cr<Srt>,
}

/// Brings the clock tree from the reset state to `config`.
///
/// Applies [`ClockConfiguration::plan`] step by step. Oscillator and PLL
/// readiness is awaited on the RCC interrupt. The register tokens are
/// consumed, so this runs once per boot.
pub async fn init(config: ClockConfiguration, regs: ClockRegs, thr_rcc: thr::Rcc) {
    let ClockRegs {
        flash_acr,
        rcc_cfgr,
        rcc_cir,
        rcc_cr,
    } = regs;

    thr_rcc.enable_int();
    rcc_cir.modify(|r| r.set_hserdyie().set_pllrdyie());

    // Ready flags are moved into the fibers that wait for them. A plan starts
    // each oscillator at most once.
    let reg::rcc::Cir {
        hserdyc,
        hserdyf,
        pllrdyc,
        pllrdyf,
        ..
    } = rcc_cir;
    let mut hserdy = Some((hserdyc, hserdyf));
    let mut pllrdy = Some((pllrdyc, pllrdyf));

    let plan = config.plan();
    for &step in plan.iter() {
        match step {
            ClockStep::StartHse { bypass } => {
                let (hserdyc, hserdyf) = match hserdy.take() {
                    Some(flag) => flag,
                    None => unreachable!("HSE started twice"),
                };
                // Attach a listener that will notify us when RCC_CIR_HSERDYF is asserted.
                let ready = on_rcc(thr_rcc, move || {
                    let ready = hserdyf.read_bit();
                    if ready {
                        hserdyc.set_bit();
                    }
                    ready
                });
                if bypass {
                    // HSEBYP is writable only while HSE is off.
                    rcc_cr.modify(|r| r.set_hsebyp());
                }
                rcc_cr.modify(|r| r.set_hseon());
                ready.await;
            }
            ClockStep::EnableCss => {
                rcc_cr.modify(|r| r.set_csson());
            }
            ClockStep::ConfigurePll { source, hse_div2, mul_bits } => {
                rcc_cfgr.modify(|r| {
                    match source {
                        PllSource::Hse => r.set_pllsrc(),
                        PllSource::HsiDiv2 => r.clear_pllsrc(),
                    };
                    if hse_div2 {
                        r.set_pllxtpre();
                    } else {
                        r.clear_pllxtpre();
                    }
                    r.write_pllmul(mul_bits)
                });
            }
            ClockStep::StartPll => {
                let (pllrdyc, pllrdyf) = match pllrdy.take() {
                    Some(flag) => flag,
                    None => unreachable!("PLL started twice"),
                };
                // Attach a listener that will notify us when RCC_CIR_PLLRDYF is asserted.
                let ready = on_rcc(thr_rcc, move || {
                    let ready = pllrdyf.read_bit();
                    if ready {
                        pllrdyc.set_bit();
                    }
                    ready
                });
                rcc_cr.modify(|r| r.set_pllon());
                ready.await;
            }
            ClockStep::SetPrescalers { hpre, ppre1, ppre2 } => {
                rcc_cfgr.modify(|r| {
                    r.write_hpre(hpre)
                        .write_ppre1(ppre1)
                        .write_ppre2(ppre2)
                });
            }
            ClockStep::SetFlashLatency { latency } => {
                flash_acr.modify(|r| r.set_prftbe().write_latency(latency));
            }
            ClockStep::SelectSysClk { source } => {
                swo::flush();
                if let Some(prescaler) = config.swo_prescaler(log::baud_rate!()) {
                    swo::update_prescaler(prescaler);
                }
                rcc_cfgr.modify(|r| r.write_sw(source.bits()));
                while rcc_cfgr.load().sws() != source.bits() {}
            }
        }
    }
}

/// Returns a future that completes on the first RCC interrupt for which
/// `check` returns `true`.
fn on_rcc<F>(thr_rcc: thr::Rcc, mut check: F) -> impl Future<Output = ()>
where
    F: FnMut() -> bool + Send + 'static,
{
    thr_rcc.add_future(fib::new_fn(move || {
        if check() {
            fib::Complete(())
        } else {
            fib::Yielded(())
        }
    }))
}
