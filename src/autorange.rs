//! Hysteresis-banded gain tracking for auto-ranged reads

use crate::config::FullScaleRange;

/// At or below this magnitude (~45% of full scale) the next read moves to a
/// narrower range.
pub const LOW_THRESHOLD: u16 = 921;
/// At or above this magnitude (~90% of full scale) the next read moves to a
/// wider range.
pub const HIGH_THRESHOLD: u16 = 1842;

/// Outcome of one auto-ranged sample
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Step {
    /// Range to use for the next read on this channel
    pub next: FullScaleRange,
    /// The sample clipped and a wider range exists: read again before
    /// reporting anything
    pub retry: bool,
}

const CODE_MAX: i16 = 2047;
const CODE_MIN: i16 = -2048;

fn saturated(code: i16) -> bool {
    code == CODE_MAX || code == CODE_MIN
}

/// Decide the follow-up range for a sample `code` taken at `range`.
pub fn step(range: FullScaleRange, code: i16) -> Step {
    let magnitude = code.unsigned_abs();

    let next = if magnitude <= LOW_THRESHOLD {
        range.narrower()
    } else if magnitude >= HIGH_THRESHOLD {
        range.wider()
    } else {
        None
    }
    .unwrap_or(range);

    Step {
        next,
        retry: saturated(code) && range != FullScaleRange::WIDEST,
    }
}
