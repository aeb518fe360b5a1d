//! Authoritative match snapshot types

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::physics::{ANGLE_MAX_DEG, ANGLE_MIN_DEG, POWER_MAX, POWER_MIN, STARTING_HEALTH};
use super::terrain::Terrain;

/// One of the two fixed player identities of a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Slot {
    A,
    B,
}

impl Slot {
    pub const ALL: [Slot; 2] = [Slot::A, Slot::B];

    pub fn opponent(self) -> Slot {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Slot::A => 0,
            Slot::B => 1,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::A => f.write_str("A"),
            Slot::B => f.write_str("B"),
        }
    }
}

/// Match phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Waiting for the second player
    Lobby,
    /// Active slot is aiming, turn clock running
    Aiming,
    /// Projectile in the air, physics clock running
    ProjectileFlight,
    /// Impact resolved, next turn pending
    RoundEnd,
    /// Winner decided, collecting rematch votes
    MatchEnd,
    /// A player dropped mid-match
    PausedReconnect,
}

impl Phase {
    /// Phases in which a turn belongs to `active_slot`
    pub fn has_turn(self) -> bool {
        matches!(
            self,
            Phase::Aiming | Phase::ProjectileFlight | Phase::RoundEnd | Phase::PausedReconnect
        )
    }

    /// Phases a disconnect interrupts (and pauses)
    pub fn is_in_progress(self) -> bool {
        matches!(self, Phase::Aiming | Phase::ProjectileFlight | Phase::RoundEnd)
    }
}

/// Tank state. `y` is derived from the terrain and refreshed on every terrain change.
#[derive(Debug, Clone, PartialEq)]
pub struct TankState {
    pub x: f32,
    pub y: f32,
    pub angle_deg: f32,
    pub power: f32,
    pub hp: u32,
    pub connected: bool,
}

impl TankState {
    pub fn new(x: f32, angle_deg: f32) -> Self {
        Self {
            x,
            y: 0.0,
            angle_deg,
            power: 70.0,
            hp: STARTING_HEALTH,
            connected: false,
        }
    }

    /// Store aim values clamped to the legal ranges
    pub fn set_aim(&mut self, angle_deg: f32, power: f32) {
        self.angle_deg = clamp_angle(angle_deg);
        self.power = clamp_power(power);
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }
}

pub fn clamp_angle(angle_deg: f32) -> f32 {
    if angle_deg.is_nan() {
        return ANGLE_MIN_DEG;
    }
    angle_deg.clamp(ANGLE_MIN_DEG, ANGLE_MAX_DEG)
}

pub fn clamp_power(power: f32) -> f32 {
    if power.is_nan() {
        return POWER_MIN;
    }
    power.clamp(POWER_MIN, POWER_MAX)
}

/// The single in-flight shell of a room
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub x: f32,
    pub y: f32,
    pub vel_x: f32,
    pub vel_y: f32,
    pub owner: Slot,
}

/// Complete gameplay state of one room
#[derive(Debug, Clone)]
pub struct MatchSnapshot {
    pub phase: Phase,
    pub active_slot: Slot,
    /// Set iff `phase == Aiming`
    pub turn_deadline: Option<Instant>,
    pub seed: u64,
    pub terrain: Terrain,
    pub wind: f32,
    pub tanks: [TankState; 2],
    pub projectile: Option<Projectile>,
    pub winner_slot: Option<Slot>,
}

/// Starting column of each tank as a fraction of world width
const START_FRACTION: [f32; 2] = [0.18, 0.82];
/// Initial aim: both barrels point at the opponent
const START_ANGLE_DEG: [f32; 2] = [45.0, 135.0];

impl MatchSnapshot {
    pub fn new(terrain: Terrain) -> Self {
        let width = terrain.width as f32;
        Self {
            phase: Phase::Lobby,
            active_slot: Slot::A,
            turn_deadline: None,
            seed: 0,
            terrain,
            wind: 0.0,
            tanks: [0, 1].map(|i| TankState::new(width * START_FRACTION[i], START_ANGLE_DEG[i])),
            projectile: None,
            winner_slot: None,
        }
    }

    /// Put both tanks back on their starting columns with full health.
    /// Connectivity is kept; `y` must be re-grounded by the caller.
    pub fn reset_tanks(&mut self) {
        let width = self.terrain.width as f32;
        for (i, tank) in self.tanks.iter_mut().enumerate() {
            let connected = tank.connected;
            *tank = TankState::new(width * START_FRACTION[i], START_ANGLE_DEG[i]);
            tank.connected = connected;
        }
    }

    pub fn tank(&self, slot: Slot) -> &TankState {
        &self.tanks[slot.index()]
    }

    pub fn tank_mut(&mut self, slot: Slot) -> &mut TankState {
        &mut self.tanks[slot.index()]
    }
}
