//! Countdown budgets per board size.

use crate::*;

/// Countdown used for any size not listed in [`TIME_LIMITS`].
pub const DEFAULT_TIME_LIMIT_SECS: u32 = 120;

/// Closed lookup from board size to countdown seconds.
pub const TIME_LIMITS: [(Coord2, u32); 3] = [((10, 10), 120), ((16, 16), 300), ((16, 30), 600)];

pub fn time_limit_secs(size: Coord2) -> u32 {
    TIME_LIMITS
        .iter()
        .find(|&&(tier_size, _)| tier_size == size)
        .map_or(DEFAULT_TIME_LIMIT_SECS, |&(_, secs)| secs)
}

/// Whole seconds between `start` and `now`, 0 if the clock went backwards.
pub const fn elapsed_secs(start: Millis, now: Millis) -> u64 {
    now.saturating_sub(start) / 1000
}
