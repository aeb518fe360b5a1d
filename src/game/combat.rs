//! Combat system - blast damage and win resolution

use super::physics::{BLAST_RADIUS, MAX_DAMAGE};
use super::state::{MatchSnapshot, Slot};

/// Damage dealt to one tank by one blast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageReport {
    pub slot: Slot,
    pub amount: u32,
    pub hp_after: u32,
}

/// Combat system for applying blasts and deciding matches
pub struct CombatSystem;

impl CombatSystem {
    /// Damage for a tank at `distance` from the blast centre, or None outside the radius
    pub fn blast_damage(distance: f32) -> Option<u32> {
        if distance.is_nan() || distance > BLAST_RADIUS {
            return None;
        }
        let falloff = 1.0 - distance / BLAST_RADIUS;
        Some((MAX_DAMAGE * falloff).round().max(1.0) as u32)
    }

    /// Apply radial blast damage around an impact. Only affected tanks are reported.
    pub fn apply_blast_damage(snapshot: &mut MatchSnapshot, x: f32, y: f32) -> Vec<DamageReport> {
        let mut reports = Vec::new();
        for slot in Slot::ALL {
            let tank = snapshot.tank_mut(slot);
            let distance = ((tank.x - x).powi(2) + (tank.y - y).powi(2)).sqrt();
            let Some(amount) = Self::blast_damage(distance) else {
                continue;
            };
            tank.hp = tank.hp.saturating_sub(amount);
            reports.push(DamageReport {
                slot,
                amount,
                hp_after: tank.hp,
            });
        }
        reports
    }

    /// Decide the match after a shot by `shooter`. A mutual kill goes to the
    /// shooter's opponent.
    pub fn resolve_winner(snapshot: &MatchSnapshot, shooter: Slot) -> Option<Slot> {
        let a_alive = snapshot.tank(Slot::A).is_alive();
        let b_alive = snapshot.tank(Slot::B).is_alive();
        match (a_alive, b_alive) {
            (true, true) => None,
            (false, false) => Some(shooter.opponent()),
            (true, false) => Some(Slot::A),
            (false, true) => Some(Slot::B),
        }
    }
}
