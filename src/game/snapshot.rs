//! Snapshot building for network transmission

use crate::util::time::{deadline_to_unix_millis, unix_millis};
use crate::ws::protocol::{ProjectileView, ServerMsg, StateView, TankView, TanksView, TerrainView};

use super::state::{MatchSnapshot, Phase, Projectile, Slot, TankState};

/// Builds wire views of a room's snapshot
pub struct SnapshotBuilder {
    room_code: String,
    /// Snapshots built so far (debug logging only)
    sent: u64,
}

impl SnapshotBuilder {
    pub fn new(room_code: impl Into<String>) -> Self {
        Self {
            room_code: room_code.into(),
            sent: 0,
        }
    }

    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Wire view of the snapshot plus room-level extras
    pub fn state_view(
        &self,
        snapshot: &MatchSnapshot,
        rematch_votes: &[Slot],
        paused_phase: Option<Phase>,
    ) -> StateView {
        StateView {
            room_code: self.room_code.clone(),
            phase: snapshot.phase,
            active_slot: snapshot.phase.has_turn().then_some(snapshot.active_slot),
            turn_ends_at: snapshot.turn_deadline.map(deadline_to_unix_millis),
            seed: snapshot.seed,
            wind: snapshot.wind,
            terrain: TerrainView {
                width: snapshot.terrain.width,
                height: snapshot.terrain.height,
                heights: snapshot.terrain.heights.clone(),
            },
            tanks: TanksView {
                a: tank_view(snapshot.tank(Slot::A)),
                b: tank_view(snapshot.tank(Slot::B)),
            },
            projectile: snapshot.projectile.as_ref().map(projectile_view),
            winner_slot: snapshot.winner_slot,
            rematch_votes: rematch_votes.to_vec(),
            paused_phase,
        }
    }

    /// Build a `state_snapshot` message
    pub fn build(
        &mut self,
        snapshot: &MatchSnapshot,
        rematch_votes: &[Slot],
        paused_phase: Option<Phase>,
    ) -> ServerMsg {
        self.sent += 1;
        ServerMsg::StateSnapshot {
            state: self.state_view(snapshot, rematch_votes, paused_phase),
            server_time: unix_millis(),
        }
    }
}

fn tank_view(tank: &TankState) -> TankView {
    TankView {
        x: tank.x,
        y: tank.y,
        angle_deg: tank.angle_deg,
        power: tank.power,
        hp: tank.hp,
        connected: tank.connected,
    }
}

pub fn projectile_view(projectile: &Projectile) -> ProjectileView {
    ProjectileView {
        x: projectile.x,
        y: projectile.y,
        vx: projectile.vel_x,
        vy: projectile.vel_y,
        owner: projectile.owner,
    }
}
