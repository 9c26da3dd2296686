use std::time::Duration;

use sapper_core::Millis;
use web_time::{SystemTime, UNIX_EPOCH};

fn since_epoch() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
}

/// Wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> Millis {
    since_epoch().as_millis() as Millis
}

/// Seed for the first board when none was forced on the command line.
pub fn clock_seed() -> u64 {
    let nanos = since_epoch().as_nanos();
    (nanos as u64) ^ ((nanos >> 64) as u64).rotate_left(17) ^ u64::from(std::process::id())
}
