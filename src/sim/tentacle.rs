//! Procedural tentacle kinematics
//!
//! Each tentacle is a chain of joints, root to tip. A shared phase clock
//! drives a traveling wave down every chain; a per-chain random phase offset
//! keeps the limbs from rippling in unison. Joint rotations are never set
//! directly, they approach their wave target by exponential smoothing.

use glam::{EulerRot, Quat, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::aabb::Aabb;
use super::uniform;
use crate::approach;
use crate::config::TentacleConfig;

/// One joint as delivered by the asset provider
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RigJoint {
    /// XYZ Euler rest pose relative to the parent joint
    pub rest_rotation: Vec3,
    /// Distance to the next joint along the local -Y axis
    pub length: f32,
}

/// One limb as delivered by the asset provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RigChain {
    /// Root joint position relative to the body origin
    pub anchor: Vec3,
    /// Fixed orientation of the chain's mount on the body
    pub mount: Quat,
    pub joints: Vec<RigJoint>,
}

/// Skeleton description for the octopus
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TentacleRig {
    pub chains: Vec<RigChain>,
}

impl TentacleRig {
    /// Radially arranged limbs hanging outward and down from the mantle
    pub fn procedural(config: &TentacleConfig) -> Self {
        let count = config.chains;
        let chains = (0..count)
            .map(|c| {
                let angle = std::f32::consts::TAU * c as f32 / count as f32;
                let anchor = Vec3::new(
                    angle.cos() * config.anchor_radius,
                    -config.body_half_extents.y * 0.5,
                    angle.sin() * config.anchor_radius,
                );
                // Tilt -Y toward +X, then turn +X toward the anchor direction
                let mount = Quat::from_rotation_y(-angle) * Quat::from_rotation_z(1.2);
                let joints = (0..config.joints_per_chain)
                    .map(|_| RigJoint {
                        rest_rotation: Vec3::new(0.08, 0.0, 0.0),
                        length: config.segment_length,
                    })
                    .collect();
                RigChain {
                    anchor,
                    mount,
                    joints,
                }
            })
            .collect();
        Self { chains }
    }

    pub fn joint_count(&self) -> usize {
        self.chains.iter().map(|c| c.joints.len()).sum()
    }
}

/// Live joint state
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Joint {
    /// Rest pose captured once when the rig is attached
    pub rest: Vec3,
    /// Current XYZ Euler rotation (x = pitch, z = roll)
    pub current: Vec3,
    pub length: f32,
}

/// Live limb state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chain {
    pub anchor: Vec3,
    pub mount: Quat,
    pub joints: Vec<Joint>,
    /// Random offset in [0, 4π) desynchronizing this limb
    pub phase_offset: f32,
}

/// Wave target for one joint: `(pitch, roll)`
///
/// `index` counts from the root, `len` is the chain length. Pitch is clamped
/// to `[min_pitch, max_pitch]`; the range is tighter on the negative side so
/// the limb curls more than it extends.
pub fn joint_target(
    config: &TentacleConfig,
    rest: Vec3,
    phase: f32,
    phase_offset: f32,
    index: usize,
    len: usize,
) -> (f32, f32) {
    let len = len.max(1) as f32;
    let i = index as f32;
    let influence_a = (i + 1.0) / len + 1.0;
    let influence_b = (2.0 * i + 1.0) / len + 1.0;

    let base = (phase * config.wave_speed + phase_offset - i * config.wave_length).sin();
    let wave_a = config.amplitude * base * influence_a.powf(1.5);
    let wave_b = config.amplitude * base * influence_b.powi(3);

    let pitch = (rest.x + wave_a).clamp(config.min_pitch, config.max_pitch);
    let roll = rest.z + config.roll_weight * wave_b.sin() * influence_b;
    (pitch, roll)
}

/// The octopus: body bob plus tentacle chains
#[derive(Debug, Clone)]
pub struct Octopus {
    config: TentacleConfig,
    /// `None` until the asset provider delivers a rig
    chains: Option<Vec<Chain>>,
    phase: f32,
    position: Vec3,
}

impl Octopus {
    pub fn new(config: TentacleConfig) -> Self {
        let position = Vec3::new(0.0, config.bob_baseline, 0.0);
        Self {
            config,
            chains: None,
            phase: 0.0,
            position,
        }
    }

    /// Capture rest poses and assign each chain its random phase offset
    pub fn attach_rig<R: Rng + ?Sized>(&mut self, rig: &TentacleRig, rng: &mut R) {
        let chains: Vec<Chain> = rig
            .chains
            .iter()
            .map(|rc| Chain {
                anchor: rc.anchor,
                mount: rc.mount,
                joints: rc
                    .joints
                    .iter()
                    .map(|j| Joint {
                        rest: j.rest_rotation,
                        current: j.rest_rotation,
                        length: j.length,
                    })
                    .collect(),
                phase_offset: uniform(rng, 0.0, 4.0 * std::f32::consts::PI),
            })
            .collect();

        log::info!(
            "Octopus rig attached: {} chains, {} joints",
            chains.len(),
            rig.joint_count()
        );
        self.chains = Some(chains);
    }

    pub fn is_ready(&self) -> bool {
        self.chains.is_some()
    }

    /// Advance the phase clock, animate every joint and bob the body
    pub fn update(&mut self, dt: f32) {
        let Some(chains) = self.chains.as_mut() else {
            return;
        };

        self.phase += dt * self.config.phase_speed;
        let phase = self.phase;
        let config = &self.config;

        for chain in chains.iter_mut() {
            let len = chain.joints.len();
            for (index, joint) in chain.joints.iter_mut().enumerate() {
                let (pitch, roll) =
                    joint_target(config, joint.rest, phase, chain.phase_offset, index, len);
                joint.current.x = approach(joint.current.x, pitch, config.smoothing);
                joint.current.z = approach(joint.current.z, roll, config.smoothing);
            }
        }

        self.position.y =
            config.bob_baseline + config.bob_amplitude * (phase * config.bob_speed).sin();
    }

    /// World position of every joint across all chains, chain by chain, root to tip
    pub fn joint_positions(&self) -> Vec<Vec3> {
        let Some(chains) = self.chains.as_ref() else {
            return Vec::new();
        };

        let mut positions = Vec::with_capacity(chains.iter().map(|c| c.joints.len()).sum());
        for chain in chains {
            let mut frame = chain.mount;
            let mut at = self.position + chain.anchor;
            for joint in &chain.joints {
                positions.push(at);
                let r = joint.current;
                frame = frame * Quat::from_euler(EulerRot::XYZ, r.x, r.y, r.z);
                at += frame * Vec3::NEG_Y * joint.length;
            }
        }
        positions
    }

    /// Full extent: mantle box plus every joint
    pub fn bounds(&self) -> Option<Aabb> {
        if !self.is_ready() {
            return None;
        }
        let body = Aabb::from_center_size(self.position, self.config.body_half_extents * 2.0);
        let joints = Aabb::from_points(self.joint_positions());
        Some(match joints {
            Some(j) => body.union(&j),
            None => body,
        })
    }

    /// Contact region for fish repulsion, shrunk around the full extent's center
    pub fn trigger_box(&self) -> Option<Aabb> {
        self.bounds()
            .map(|b| b.scaled_about_center(self.config.trigger_scale))
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn chains(&self) -> &[Chain] {
        self.chains.as_deref().unwrap_or(&[])
    }
}
