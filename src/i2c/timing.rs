// Licensed under the Apache-2.0 license

//! SCL clock divisor calculation.
//!
//! The controller derives SCL from the module functional clock through a
//! prescaler (CDF) and either a single gradation field (legacy ICCCR
//! layout) or separate HIGH/LOW period registers (Gen3 and later). The
//! formulas below keep the staged integer divisions of the hardware
//! documentation; reordering them changes the rounding and produces
//! divisors that overshoot the requested bus rate.

use crate::i2c::common::TimingConfig;
use crate::i2c::rcar_i2c::Error;

/// SoC generation of the I2C unit. Later generations are supersets of
/// earlier ones for the features this driver touches.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Generation {
    Gen1,
    Gen2,
    Gen3,
    Gen4,
}

impl Generation {
    /// Width of the CDF field in ICCCR.
    #[must_use]
    pub fn cdf_width(self) -> u32 {
        match self {
            Generation::Gen1 => 2,
            _ => 3,
        }
    }
}

/// Register values produced by [`calculate`], plus the SCL rate they
/// actually achieve.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TimingParams {
    /// Achieved SCL frequency; never above the requested rate.
    pub effective_hz: u32,
    pub regs: TimingRegs,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TimingRegs {
    /// Combined gradation/prescaler word for the legacy ICCCR layout.
    Legacy { icccr: u32 },
    /// Separate HIGH/LOW period control (ICCCR2 with CDFD|HLSE|SME).
    Separate {
        cdf: u32,
        schd: u16,
        scld: u16,
        smd: u8,
        fm_plus: bool,
    },
}

fn div_round_up(n: u32, d: u32) -> u32 {
    (n + d - 1) / d
}

fn div_round_closest(n: u32, d: u32) -> u32 {
    (n + d / 2) / d
}

/// Compute divisor settings for `bus_hz` from a functional clock of
/// `rate` Hz.
///
/// Returns [`Error::ClockUnattainable`] when no in-range divisor can keep
/// SCL at or below the requested rate.
pub fn calculate(
    gen: Generation,
    rate: u32,
    bus_hz: u32,
    timing: &TimingConfig,
) -> Result<TimingParams, Error> {
    if rate == 0 || bus_hz == 0 {
        return Err(Error::ClockUnattainable);
    }

    // The internal clock ick must stay below 20 MHz to meet SCL duty
    // requirements, so prescale first.
    let cdf = rate / 20_000_000;
    if cdf >= 1 << gen.cdf_width() {
        return Err(Error::ClockUnattainable);
    }
    let ick = if gen >= Generation::Gen3 {
        rate
    } else {
        rate / (cdf + 1)
    };

    // Bus signal delays compensated in units of internal clock cycles.
    // Staged rounding: to MHz first, then scale by the summed nanoseconds.
    let sum_ns = timing
        .scl_fall_ns
        .saturating_add(timing.scl_rise_ns)
        .saturating_add(timing.scl_int_delay_ns);
    let round = div_round_closest(div_round_closest(ick, 1_000_000) * sum_ns, 1000);

    if gen >= Generation::Gen3 {
        // Separate SCL HIGH/LOW control. One SCL cycle spans
        // 2 * smd + schd + scld internal cycles with a 5:4 HIGH:LOW ratio.
        let smd: u32 = 20;
        let cycles = div_round_up(rate, bus_hz);
        let x = cycles
            .checked_sub(8 + 2 * smd + round)
            .map(|c| div_round_up(c, 9))
            .unwrap_or(0);
        if x == 0 || 5 * x > 0xffff {
            return Err(Error::ClockUnattainable);
        }
        let schd = 4 * x;
        let scld = 5 * x;
        // smd may not reach schd.
        let smd = smd.min(schd - 1);
        let effective_hz = rate / (8 + 2 * smd + 9 * x + round);
        let fm_plus = gen >= Generation::Gen4 && bus_hz > 400_000;
        Ok(TimingParams {
            effective_hz,
            regs: TimingRegs::Separate {
                cdf,
                schd: schd as u16,
                scld: scld as u16,
                smd: smd as u8,
                fm_plus,
            },
        })
    } else {
        // SCL period = (20 + 8 * SCGD + round) / ick, solve for SCGD.
        let cycles = div_round_up(ick, bus_hz);
        let scgd = match cycles.checked_sub(20 + round) {
            Some(c) => div_round_up(c, 8),
            None => return Err(Error::ClockUnattainable),
        };
        if scgd > 0x3f {
            return Err(Error::ClockUnattainable);
        }
        let effective_hz = ick / (20 + 8 * scgd + round);
        Ok(TimingParams {
            effective_hz,
            regs: TimingRegs::Legacy {
                icccr: scgd << gen.cdf_width() | cdf,
            },
        })
    }
}
