//! Deterministic elevation queries backing every other generator.
//!
//! The field is a pure function of (seed, x, z). Terrain chunks, the road
//! centerline and decoration placement all sample it independently, which is
//! what keeps chunk borders seamless without any cross-chunk stitching.

use noise::{NoiseFn, Simplex};

use crate::config::TerrainSettings;
use crate::mesh::{Normal3, Vertex3};

/// Horizontal offset used by the finite-difference slope and normal probes.
const PROBE_DISTANCE: f32 = 1.0;

/// Fractal simplex heightfield.
pub struct HeightField {
    simplex: Simplex,
    octaves: u32,
    persistence: f64,
    lacunarity: f64,
    frequency: f64,
    height_scale: f64,
}

/// Elevation and steepness at one ground position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightSample {
    pub elevation: f32,
    pub slope_deg: f32,
}

impl HeightField {
    /// Create a heightfield for the given world seed. Two fields built with
    /// equal seeds and settings return bit-identical elevations.
    pub fn new(seed: u32, settings: &TerrainSettings) -> Self {
        Self {
            simplex: Simplex::new(seed),
            octaves: settings.octaves,
            persistence: settings.persistence,
            lacunarity: settings.lacunarity,
            frequency: settings.frequency,
            height_scale: settings.height_scale,
        }
    }

    /// Ground elevation at world position (x, z).
    ///
    /// Octaves are summed with amplitudes 1, p, p^2, ... and frequencies
    /// f, f*l, f*l^2, ... then normalized by the total amplitude, so the
    /// result stays within +/- `height_scale` regardless of octave count.
    pub fn elevation(&self, x: f32, z: f32) -> f32 {
        let mut total = 0.0f64;
        let mut frequency = self.frequency;
        let mut amplitude = 1.0f64;
        let mut max_amplitude = 0.0f64;

        for _ in 0..self.octaves {
            total += self
                .simplex
                .get([x as f64 * frequency, z as f64 * frequency])
                * amplitude;
            max_amplitude += amplitude;
            amplitude *= self.persistence;
            frequency *= self.lacunarity;
        }

        ((total / max_amplitude) * self.height_scale) as f32
    }

    /// Steepness in degrees, from forward differences one unit along each
    /// axis. 0 is flat ground, 90 would be a vertical wall.
    pub fn slope_deg(&self, x: f32, z: f32) -> f32 {
        let here = self.elevation(x, z);
        let dx = self.elevation(x + PROBE_DISTANCE, z) - here;
        let dz = self.elevation(x, z + PROBE_DISTANCE) - here;

        (dx * dx + dz * dz).sqrt().atan().to_degrees()
    }

    /// Upward-facing surface normal at (x, z), from the same forward
    /// differences as [`slope_deg`](Self::slope_deg).
    pub fn surface_normal(&self, x: f32, z: f32) -> Normal3 {
        let here = self.elevation(x, z);
        let dx = self.elevation(x + PROBE_DISTANCE, z) - here;
        let dz = self.elevation(x, z + PROBE_DISTANCE) - here;

        Vertex3::new(-dx, PROBE_DISTANCE, -dz).normalize()
    }

    /// Elevation and slope in one call, for placement code that needs both.
    pub fn sample(&self, x: f32, z: f32) -> HeightSample {
        HeightSample {
            elevation: self.elevation(x, z),
            slope_deg: self.slope_deg(x, z),
        }
    }
}
