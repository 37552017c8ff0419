//! Shoal - creature simulation core
//!
//! Core modules:
//! - `sim`: Per-tick simulation (fish shoal, octopus tentacles, obstacles, water line)
//! - `config`: Data-driven tuning loaded from JSON
//! - `presentation`: Pure-state observers that react to immersion edges

pub mod config;
pub mod presentation;
pub mod sim;

pub use config::{ConfigError, SimConfig};
pub use presentation::{AmbientLoop, AmbientMixer, SceneVisibility};
pub use sim::{TickInput, TickReport, World};

/// Driver constants
pub mod consts {
    /// Fixed simulation timestep used by the headless driver (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Height of the water surface plane
    pub const WATER_LEVEL: f32 = 0.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Exponential smoothing step: move `current` a fraction `factor` toward `target`
#[inline]
pub fn approach(current: f32, target: f32, factor: f32) -> f32 {
    current + (target - current) * factor
}

/// Same as [`approach`] but along the shortest arc between two angles
#[inline]
pub fn approach_angle(current: f32, target: f32, factor: f32) -> f32 {
    current + normalize_angle(target - current) * factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_normalize_angle_wraps() {
        assert!((normalize_angle(3.0 * PI) - (-PI)).abs() < 1e-5);
        assert!((normalize_angle(-3.5 * PI) - 0.5 * PI).abs() < 1e-5);
        assert_eq!(normalize_angle(0.25), 0.25);
    }

    #[test]
    fn test_approach_angle_takes_short_way() {
        // From just below +π to just above -π is a tiny step, not a full turn
        let current = PI - 0.1;
        let target = -PI + 0.1;
        let next = approach_angle(current, target, 0.5);
        assert!((next - PI).abs() < 1e-4);
    }
}
