//! Projectile flight and world constants

use super::rng::GameRng;
use super::state::{clamp_angle, clamp_power, MatchSnapshot, Projectile, Slot};

/// World dimensions
pub const WORLD_WIDTH: usize = 1000;
pub const WORLD_HEIGHT: f32 = 600.0;

/// Downward acceleration (px/s^2)
pub const GRAVITY: f32 = 130.0;
/// Wind force to horizontal acceleration
pub const WIND_SCALE: f32 = 1.0;
/// Maximum absolute wind
pub const WIND_MAX: f32 = 24.0;
/// Muzzle speed per unit of power
pub const PROJECTILE_SPEED_SCALE: f32 = 2.8;

pub const TANK_RADIUS: f32 = 12.0;
/// Gap between a resting tank and the surface
pub const TANK_CLEARANCE: f32 = 2.0;
/// Gap between the tank hull and the spawned shell
pub const MUZZLE_CLEARANCE: f32 = 6.0;
pub const PROJECTILE_RADIUS: f32 = 4.0;

pub const CRATER_RADIUS: f32 = 36.0;
pub const BLAST_RADIUS: f32 = 84.0;
pub const MAX_DAMAGE: f32 = 55.0;
pub const STARTING_HEALTH: u32 = 100;

pub const ANGLE_MIN_DEG: f32 = 5.0;
pub const ANGLE_MAX_DEG: f32 = 175.0;
pub const POWER_MIN: f32 = 20.0;
pub const POWER_MAX: f32 = 120.0;

/// How far past the top or bottom of the world a shell may travel
const VERTICAL_ESCAPE_MARGIN: f32 = WORLD_HEIGHT;

/// What ended a flight
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImpactKind {
    Tank(Slot),
    Terrain,
    OutOfBounds,
}

/// Resolved end point of a flight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impact {
    pub x: f32,
    pub y: f32,
    pub kind: ImpactKind,
}

/// Physics system for shells and tank grounding
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Wind for a new turn, in `[-24, 24]` rounded to one decimal
    pub fn pick_wind(rng: &mut GameRng) -> f32 {
        let raw = rng.range(-WIND_MAX, WIND_MAX);
        ((raw * 10.0).round() / 10.0).clamp(-WIND_MAX, WIND_MAX)
    }

    /// Re-seat both tanks on the current terrain
    pub fn reground_tanks(snapshot: &mut MatchSnapshot) {
        let terrain = &snapshot.terrain;
        for tank in snapshot.tanks.iter_mut() {
            tank.y = terrain.tank_resting_height(tank.x);
        }
    }

    /// Launch a shell from `slot`'s tank using its (clamped) aim.
    /// 0 and 180 degrees are horizontal, 90 is straight up.
    pub fn spawn_projectile(snapshot: &mut MatchSnapshot, slot: Slot) -> Projectile {
        let tank = snapshot.tank_mut(slot);
        tank.angle_deg = clamp_angle(tank.angle_deg);
        tank.power = clamp_power(tank.power);

        let radians = tank.angle_deg.to_radians();
        let dir_x = radians.cos();
        let dir_y = -radians.sin();
        let muzzle = TANK_RADIUS + MUZZLE_CLEARANCE;
        let speed = tank.power * PROJECTILE_SPEED_SCALE;

        let projectile = Projectile {
            x: tank.x + dir_x * muzzle,
            y: tank.y + dir_y * muzzle,
            vel_x: dir_x * speed,
            vel_y: dir_y * speed,
            owner: slot,
        };
        snapshot.projectile = Some(projectile.clone());
        projectile
    }

    /// Advance the live shell by `dt` seconds (semi-implicit Euler) and report an
    /// impact if the flight is over. Checks tanks, then terrain, then bounds.
    pub fn step_projectile(snapshot: &mut MatchSnapshot, dt: f32) -> Option<Impact> {
        let wind = snapshot.wind;
        let projectile = snapshot.projectile.as_mut()?;

        projectile.vel_x += wind * WIND_SCALE * dt;
        projectile.vel_y += GRAVITY * dt;
        projectile.x += projectile.vel_x * dt;
        projectile.y += projectile.vel_y * dt;

        let (x, y) = (projectile.x, projectile.y);

        for slot in Slot::ALL {
            let tank = snapshot.tank(slot);
            if Self::check_circle_hit(x, y, PROJECTILE_RADIUS, tank.x, tank.y, TANK_RADIUS) {
                return Some(Impact {
                    x,
                    y,
                    kind: ImpactKind::Tank(slot),
                });
            }
        }

        let terrain = &snapshot.terrain;
        let max_x = (terrain.width.max(1) - 1) as f32;
        let inside_x = (0.0..=max_x).contains(&x);

        if inside_x {
            let surface = terrain.surface_at(x);
            if y + PROJECTILE_RADIUS >= surface {
                return Some(Impact {
                    x,
                    y: surface,
                    kind: ImpactKind::Terrain,
                });
            }
        }

        let escaped_y = y < -VERTICAL_ESCAPE_MARGIN || y > terrain.height + VERTICAL_ESCAPE_MARGIN;
        if !inside_x || escaped_y {
            return Some(Impact {
                x: x.clamp(0.0, max_x),
                y: y.clamp(0.0, terrain.height),
                kind: ImpactKind::OutOfBounds,
            });
        }

        None
    }

    /// Circle overlap test
    pub fn check_circle_hit(x1: f32, y1: f32, radius1: f32, x2: f32, y2: f32, radius2: f32) -> bool {
        let dx = x2 - x1;
        let dy = y2 - y1;
        let combined_radius = radius1 + radius2;
        dx * dx + dy * dy <= combined_radius * combined_radius
    }
}
