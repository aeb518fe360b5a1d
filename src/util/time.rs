//! Time utilities for the match clock

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Physics tick rate while a projectile is in flight
pub const SIMULATION_TPS: u32 = 60;
pub const TICK_DURATION_MICROS: u64 = 1_000_000 / SIMULATION_TPS as u64;

/// Time a player has to aim and fire
pub const TURN_DURATION_MS: u64 = 30_000;
/// Time a disconnected player has to come back before forfeiting
pub const RECONNECT_GRACE_MS: u64 = 30_000;
/// Pause between an impact and the next turn
pub const ROUND_ADVANCE_DELAY_MS: u64 = 1_500;

/// Delta time for one physics step (in seconds)
pub fn tick_delta() -> f32 {
    1.0 / SIMULATION_TPS as f32
}

/// Interval between physics ticks
pub fn tick_interval() -> Duration {
    Duration::from_micros(TICK_DURATION_MICROS)
}

/// Converts a deadline on the (pausable) tokio clock into wall-clock Unix millis
/// for clients.
pub fn deadline_to_unix_millis(deadline: tokio::time::Instant) -> u64 {
    let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
    unix_millis() + remaining.as_millis() as u64
}
