//! Creature simulation module
//!
//! All behavior lives here. This module has no rendering dependencies:
//! - Plain geometric data in, plain geometric data out
//! - Injected RNG only
//! - One ordered pipeline per tick (see `world`)

pub mod aabb;
pub mod flock;
pub mod immersion;
pub mod obstacles;
pub mod tentacle;
pub mod world;

pub use aabb::Aabb;
pub use flock::{Fish, FishAsset, FinPose, Orientation, PopulationChange, Shoal};
pub use immersion::{Immersion, ImmersionEdge, ImmersionObserver, ImmersionTracker};
pub use obstacles::{Contact, ObstacleRegistry, Shape, Solid, SolidKind};
pub use tentacle::{Octopus, TentacleRig};
pub use world::{TickInput, TickReport, World};

use glam::Vec3;
use rand::Rng;

/// Uniform sample in `[lo, hi)`; returns `lo` for an empty range instead of panicking
#[inline]
pub(crate) fn uniform<R: Rng + ?Sized>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    lo + rng.random::<f32>() * (hi - lo)
}

/// Uniformly distributed direction on the unit sphere
pub(crate) fn random_unit_vector<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    for _ in 0..16 {
        let v = Vec3::new(
            uniform(rng, -1.0, 1.0),
            uniform(rng, -1.0, 1.0),
            uniform(rng, -1.0, 1.0),
        );
        let len_sq = v.length_squared();
        if len_sq > 1.0e-6 && len_sq <= 1.0 {
            return v / len_sq.sqrt();
        }
    }
    Vec3::Y
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_random_unit_vector_is_unit() {
        let mut rng = Pcg32::seed_from_u64(17);
        for _ in 0..500 {
            let v = random_unit_vector(&mut rng);
            assert!((v.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_uniform_range() {
        let mut rng = Pcg32::seed_from_u64(17);
        for _ in 0..500 {
            let x = uniform(&mut rng, -2.0, 3.0);
            assert!((-2.0..3.0).contains(&x));
        }
        assert_eq!(uniform(&mut rng, 1.0, 1.0), 1.0);
    }
}
