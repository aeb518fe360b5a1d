//! Heightmap terrain: synthesis, grounding and cratering
//!
//! Heights are screen-space y values of the surface (y grows downward), so a
//! larger value means a lower, more cratered surface.

use super::physics::{CRATER_RADIUS, TANK_CLEARANCE, TANK_RADIUS};
use super::rng::GameRng;

/// Sine components as (angular frequency per column, amplitude as a fraction of height)
const TERRAIN_WAVES: [(f32, f32); 3] = [(0.0061, 0.11), (0.0173, 0.055), (0.0419, 0.02)];

/// Baseline surface as a fraction of world height
const TERRAIN_BASELINE: f32 = 0.62;

/// Highest allowed surface (as a fraction of world height)
const TERRAIN_MIN_FRACTION: f32 = 0.3;

/// Gap kept between the lowest surface and the bottom of the world
const TERRAIN_FLOOR_MARGIN: f32 = 20.0;

/// Per-column surface heights of the world
#[derive(Debug, Clone, PartialEq)]
pub struct Terrain {
    pub width: usize,
    pub height: f32,
    pub heights: Vec<f32>,
}

impl Terrain {
    /// Deterministic heightmap for `seed`: three phase-shifted sine waves,
    /// clamped to `[0.3 * height, height - 20]`, then one 3-point smoothing pass.
    pub fn generate(seed: u64, width: usize, height: f32) -> Self {
        let mut rng = GameRng::new(seed);
        let phases: Vec<f32> = TERRAIN_WAVES
            .iter()
            .map(|_| rng.range(0.0, std::f32::consts::TAU))
            .collect();

        let (min, max) = Self::bounds(height);
        let raw: Vec<f32> = (0..width)
            .map(|col| {
                let x = col as f32;
                let offset: f32 = TERRAIN_WAVES
                    .iter()
                    .zip(&phases)
                    .map(|(&(freq, amp), phase)| (x * freq + phase).sin() * amp * height)
                    .sum();
                (height * TERRAIN_BASELINE + offset).clamp(min, max)
            })
            .collect();

        // Averages of in-range values stay in range; the clamp only absorbs rounding.
        let heights = (0..width)
            .map(|col| {
                let lo = col.saturating_sub(1);
                let hi = (col + 1).min(width - 1);
                let window = &raw[lo..=hi];
                (window.iter().sum::<f32>() / window.len() as f32).clamp(min, max)
            })
            .collect();

        Self {
            width,
            height,
            heights,
        }
    }

    /// Legal surface range for a world of the given height
    pub fn bounds(height: f32) -> (f32, f32) {
        (height * TERRAIN_MIN_FRACTION, height - TERRAIN_FLOOR_MARGIN)
    }

    /// Column index under world x
    pub fn column(&self, x: f32) -> usize {
        if self.width == 0 {
            return 0;
        }
        let max = (self.width - 1) as f32;
        let x = if x.is_nan() { 0.0 } else { x };
        x.clamp(0.0, max).round() as usize
    }

    /// Surface height under world x
    pub fn surface_at(&self, x: f32) -> f32 {
        self.heights
            .get(self.column(x))
            .copied()
            .unwrap_or(self.height)
    }

    /// Centre y of a tank resting at x
    pub fn tank_resting_height(&self, x: f32) -> f32 {
        self.surface_at(x) - TANK_RADIUS - TANK_CLEARANCE
    }

    /// Carve a circular crater centred on the impact point. Columns only ever get
    /// deeper; the crater floor never goes below the bottom of the world.
    pub fn deform(&mut self, impact_x: f32, impact_y: f32) {
        let first = (impact_x - CRATER_RADIUS).ceil().max(0.0);
        let last = (impact_x + CRATER_RADIUS).floor();
        if last < 0.0 || first >= self.width as f32 {
            return;
        }
        let last = last.min((self.width - 1) as f32);

        let mut col = first as usize;
        while col as f32 <= last {
            let dx = col as f32 - impact_x;
            let depth = (CRATER_RADIUS * CRATER_RADIUS - dx * dx).max(0.0).sqrt();
            let floor = (impact_y + depth).min(self.height);
            let current = self.heights[col];
            self.heights[col] = current.max(floor);
            col += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::physics::{WORLD_HEIGHT, WORLD_WIDTH};

    #[test]
    fn test_generate_shape_and_bounds() {
        let (min, max) = Terrain::bounds(WORLD_HEIGHT);
        for seed in 0..200u64 {
            let terrain = Terrain::generate(seed.wrapping_mul(0x9E37_79B9_7F4A_7C15), WORLD_WIDTH, WORLD_HEIGHT);
            assert_eq!(terrain.heights.len(), WORLD_WIDTH);
            for h in &terrain.heights {
                assert!(*h >= min && *h <= max, "seed {seed}: {h} outside [{min}, {max}]");
            }
        }
    }

    #[test]
    fn test_generate_is_reproducible() {
        let a = Terrain::generate(12345, WORLD_WIDTH, WORLD_HEIGHT);
        let b = Terrain::generate(12345, WORLD_WIDTH, WORLD_HEIGHT);
        let bits_a: Vec<u32> = a.heights.iter().map(|h| h.to_bits()).collect();
        let bits_b: Vec<u32> = b.heights.iter().map(|h| h.to_bits()).collect();
        assert_eq!(bits_a, bits_b);

        let c = Terrain::generate(54321, WORLD_WIDTH, WORLD_HEIGHT);
        assert_ne!(a.heights, c.heights);
    }

    #[test]
    fn test_smoothing_removes_spikes() {
        let terrain = Terrain::generate(99, WORLD_WIDTH, WORLD_HEIGHT);
        for w in terrain.heights.windows(2) {
            assert!((w[0] - w[1]).abs() < 5.0);
        }
    }

    #[test]
    fn test_resting_height_clamps_column() {
        let terrain = Terrain {
            width: 3,
            height: 100.0,
            heights: vec![50.0, 60.0, 70.0],
        };
        assert_eq!(terrain.column(-40.0), 0);
        assert_eq!(terrain.column(1.4), 1);
        assert_eq!(terrain.column(1.6), 2);
        assert_eq!(terrain.column(500.0), 2);
        assert_eq!(terrain.tank_resting_height(1.0), 60.0 - TANK_RADIUS - TANK_CLEARANCE);
    }

    #[test]
    fn test_deform_is_monotonic() {
        let mut terrain = Terrain::generate(7, WORLD_WIDTH, WORLD_HEIGHT);
        for (x, y) in [(500.0, 350.0), (10.0, 0.0), (999.0, 599.0), (300.0, 100.0), (-20.0, 400.0)] {
            let before = terrain.heights.clone();
            terrain.deform(x, y);
            for (col, (old, new)) in before.iter().zip(&terrain.heights).enumerate() {
                assert!(new >= old, "column {col} rose from {old} to {new}");
                assert!(*new <= WORLD_HEIGHT);
            }
        }
    }

    #[test]
    fn test_deform_carves_crater_profile() {
        let mut terrain = Terrain {
            width: 200,
            height: 600.0,
            heights: vec![300.0; 200],
        };
        terrain.deform(100.0, 300.0);
        assert_eq!(terrain.heights[100], 300.0 + CRATER_RADIUS);
        assert!(terrain.heights[110] > 300.0);
        assert!(terrain.heights[110] < terrain.heights[100]);
        assert_eq!(terrain.heights[100 + CRATER_RADIUS as usize + 1], 300.0);
        assert_eq!(terrain.heights[50], 300.0);
    }

    #[test]
    fn test_deform_above_surface_changes_nothing() {
        let mut terrain = Terrain {
            width: 200,
            height: 600.0,
            heights: vec![300.0; 200],
        };
        terrain.deform(100.0, 100.0);
        assert!(terrain.heights.iter().all(|h| *h == 300.0));
    }
}
