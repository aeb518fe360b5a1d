//! Room code allocation

use tracing::warn;

use crate::game::rng::GameRng;

/// Length of generated room codes
pub const ROOM_CODE_LEN: usize = 5;

/// Random attempts before switching to numeric codes
pub const MAX_CODE_ATTEMPTS: usize = 32;

/// Span of the numeric fallback starting points
const NUMERIC_SPACE: u32 = 1_000_000;

/// Pick a code for which `is_taken` is false. Random codes first; after repeated
/// collisions, probe numeric codes upward from a random start.
pub fn allocate_code(rng: &mut GameRng, is_taken: impl Fn(&str) -> bool) -> String {
    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = rng.room_code(ROOM_CODE_LEN);
        if !is_taken(&code) {
            return code;
        }
    }

    warn!(attempts = MAX_CODE_ATTEMPTS, "Room code collisions, using numeric fallback");
    numeric_fallback(rng.below(NUMERIC_SPACE) as u64, is_taken)
}

/// Terminates as long as only finitely many codes are taken.
fn numeric_fallback(start: u64, is_taken: impl Fn(&str) -> bool) -> String {
    let mut n = start;
    loop {
        let code = format!("{n:06}");
        if !is_taken(&code) {
            return code;
        }
        n += 1;
    }
}
