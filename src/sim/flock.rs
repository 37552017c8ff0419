//! Fish shoal (boids)
//!
//! Each tick every fish reacts to the octopus trigger box, gravity, its
//! neighbors (only while the shared grouped oscillator is on), a random
//! nudge, the water surface, the tank bounds and the tentacle joints.
//! Neighbor forces read a snapshot taken before any fish moves, so the
//! result does not depend on iteration order.
//!
//! Facing is low-passed toward the velocity direction, except that yaw takes
//! the shortest way round and is rewrapped to [-π, π); a plain per-axis
//! low-pass would spin a fish the long way across the ±π seam.
//!
//! Solids are handled after the update by `resolve_contacts`: a fish moving
//! into a solid bounces, and every touching fish is moved back out.

use glam::{EulerRot, Quat, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::aabb::Aabb;
use super::obstacles::ObstacleRegistry;
use super::{random_unit_vector, uniform};
use crate::config::FlockConfig;
use crate::{approach, approach_angle, normalize_angle};

/// Fin flap speed (rad/s) and amplitude (rad)
const FIN_SPEED: f32 = 5.0;
const FIN_AMPLITUDE: f32 = 0.3;
/// Tail sweep speed (rad/s) and amplitude (rad)
const TAIL_SPEED: f32 = 3.0;
const TAIL_AMPLITUDE: f32 = 0.2;

/// Gap left between a fish and a solid after it is moved out
const CONTACT_SKIN: f32 = 1.0e-3;
/// Push-outs per fish per tick; a push can land in a neighboring solid
const CONTACT_PASSES: usize = 4;

/// Fish model metrics supplied by the asset provider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FishAsset {
    /// Half extents of the model's local bounding box
    pub half_extents: Vec3,
}

/// Facing angles; roll only ever receives jitter
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Orientation {
    pub fn to_quat(self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.pitch, self.yaw, self.roll)
    }
}

/// Cosmetic fin and tail angles
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FinPose {
    pub fin: f32,
    pub tail: f32,
}

impl FinPose {
    /// Phase-staggered flap for the fish at `index` at shoal time `time`
    pub fn at(time: f32, index: usize) -> Self {
        let stagger = index as f32;
        Self {
            fin: (time * FIN_SPEED + stagger).sin() * FIN_AMPLITUDE,
            tail: (time * TAIL_SPEED + stagger).sin() * TAIL_AMPLITUDE,
        }
    }
}

/// A single fish
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fish {
    pub index: usize,
    pub position: Vec3,
    pub velocity: Vec3,
    pub orientation: Orientation,
    /// World box, recomputed from the transform every tick
    pub bounds: Aabb,
    pub fins: FinPose,
}

impl Fish {
    fn new(index: usize, position: Vec3, velocity: Vec3, half_extents: Vec3) -> Self {
        let orientation = Orientation::default();
        Self {
            index,
            position,
            velocity,
            orientation,
            bounds: Aabb::from_transform(half_extents, orientation.to_quat(), position),
            fins: FinPose::default(),
        }
    }

    fn refresh_bounds(&mut self, half_extents: Vec3) {
        self.bounds = Aabb::from_transform(half_extents, self.orientation.to_quat(), self.position);
    }
}

/// Outcome of a population toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopulationChange {
    Spawned(usize),
    Cleared(usize),
    /// No fish model yet; nothing happened
    AssetNotReady,
}

/// Cohesion + separation + alignment for fish `index` against a snapshot
///
/// `snapshot` holds `(position, velocity)` of every fish at the start of the
/// neighbor pass. Empty neighborhoods contribute nothing.
pub fn group_force(
    config: &FlockConfig,
    index: usize,
    position: Vec3,
    velocity: Vec3,
    snapshot: &[(Vec3, Vec3)],
) -> Vec3 {
    let mut center = Vec3::ZERO;
    let mut heading = Vec3::ZERO;
    let mut neighbors = 0u32;
    let mut separation = Vec3::ZERO;

    for (other, &(other_pos, other_vel)) in snapshot.iter().enumerate() {
        if other == index {
            continue;
        }
        let offset = position - other_pos;
        let distance = offset.length();

        if distance < config.group_radius {
            center += other_pos;
            heading += other_vel;
            neighbors += 1;
        }
        if distance < config.separation_radius {
            separation += offset.normalize_or_zero() * config.separation_weight
                / distance.max(config.separation_epsilon);
        }
    }

    let mut force = separation;
    if neighbors > 0 {
        let n = neighbors as f32;
        force += (center / n - position) * config.cohesion_weight;
        force += (heading / n - velocity) * config.alignment_weight;
    }
    force
}

/// Inward push for every bound the position is outside of
pub fn boundary_force(config: &FlockConfig, position: Vec3) -> Vec3 {
    let push = |p: f32, min: f32, max: f32| {
        if p < min {
            config.boundary_push
        } else if p > max {
            -config.boundary_push
        } else {
            0.0
        }
    };
    let (min, max) = (config.bounds_min, config.bounds_max);
    Vec3::new(
        push(position.x, min.x, max.x),
        push(position.y, min.y, max.y),
        push(position.z, min.z, max.z),
    )
}

/// Pull toward every joint farther than the max distance, already scaled by `dt`
pub fn attraction(config: &FlockConfig, position: Vec3, joints: &[Vec3], dt: f32) -> Vec3 {
    let max = config.max_attraction_distance;
    joints
        .iter()
        .filter_map(|&joint| {
            let offset = joint - position;
            let distance = offset.length();
            (distance > max).then(|| {
                let strength = config.attraction_force * (distance - max) / max;
                offset / distance * strength * dt
            })
        })
        .sum()
}

/// Pitch and yaw that face along `velocity`
pub fn facing(velocity: Vec3) -> (f32, f32) {
    let dir = velocity.normalize_or_zero();
    let horizontal = (dir.x * dir.x + dir.z * dir.z).sqrt();
    (dir.y.atan2(horizontal), dir.x.atan2(dir.z))
}

/// The fish population and its shared grouping oscillator
#[derive(Debug, Clone)]
pub struct Shoal {
    config: FlockConfig,
    asset: Option<FishAsset>,
    fish: Vec<Fish>,
    grouped: bool,
    group_timer: f32,
    /// Shoal-wide clock driving fin animation
    time: f32,
}

impl Shoal {
    pub fn new(config: FlockConfig) -> Self {
        Self {
            config,
            asset: None,
            fish: Vec::new(),
            grouped: true,
            group_timer: 0.0,
            time: 0.0,
        }
    }

    /// Provide the fish model; until then toggles and updates are no-ops
    pub fn set_asset(&mut self, asset: FishAsset) {
        self.asset = Some(asset);
    }

    pub fn is_ready(&self) -> bool {
        self.asset.is_some()
    }

    /// Spawn the whole population if empty, otherwise clear it
    pub fn toggle_population<R: Rng + ?Sized>(&mut self, rng: &mut R) -> PopulationChange {
        let Some(asset) = self.asset else {
            log::warn!("Population toggle ignored: fish model not loaded");
            return PopulationChange::AssetNotReady;
        };

        if self.fish.is_empty() {
            self.populate(asset, rng);
            log::info!("Spawned {} fish", self.fish.len());
            PopulationChange::Spawned(self.fish.len())
        } else {
            let count = self.clear();
            log::info!("Cleared {} fish", count);
            PopulationChange::Cleared(count)
        }
    }

    fn populate<R: Rng + ?Sized>(&mut self, asset: FishAsset, rng: &mut R) {
        let c = &self.config;
        let w = c.spawn_half_width;
        let s = c.spawn_speed;
        self.fish = (0..c.population)
            .map(|index| {
                let position = Vec3::new(
                    uniform(rng, -w, w),
                    c.water_level + uniform(rng, c.spawn_band_low, c.spawn_band_high),
                    uniform(rng, -w, w),
                );
                let velocity = Vec3::new(uniform(rng, -s, s), 0.0, uniform(rng, -s, s));
                Fish::new(index, position, velocity, asset.half_extents)
            })
            .collect();
    }

    /// Remove every fish and reset the grouping oscillator
    pub fn clear(&mut self) -> usize {
        let count = self.fish.len();
        self.fish.clear();
        self.grouped = true;
        self.group_timer = 0.0;
        count
    }

    /// Advance every fish by `dt`
    ///
    /// `joints` and `trigger` must come from the octopus's update in this same tick.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        joints: &[Vec3],
        trigger: Option<&Aabb>,
        rng: &mut R,
    ) {
        if self.asset.is_none() || self.fish.is_empty() {
            return;
        }
        self.refresh_bounds();
        let config = &self.config;

        // Escape reflex: overrides velocity for this tick
        if let Some(trigger) = trigger {
            let center = trigger.center();
            let jitter = config.trigger_jitter * 0.5;
            for fish in self.fish.iter_mut().filter(|f| f.bounds.intersects(trigger)) {
                let away = (fish.position - center).try_normalize().unwrap_or(Vec3::Y);
                fish.velocity = Vec3::new(
                    away.x * config.projection_force,
                    away.y.abs() * config.projection_force + config.projection_lift,
                    away.z * config.projection_force,
                );
                fish.orientation.pitch += uniform(rng, -jitter, jitter);
                fish.orientation.roll += uniform(rng, -jitter, jitter);
            }
        }

        self.group_timer += dt;
        if self.group_timer > config.group_duration {
            self.grouped = !self.grouped;
            self.group_timer = 0.0;
        }
        self.time += dt;

        let snapshot: Vec<(Vec3, Vec3)> =
            self.fish.iter().map(|f| (f.position, f.velocity)).collect();
        let water = config.water_level;

        for (index, fish) in self.fish.iter_mut().enumerate() {
            fish.velocity.y -= config.gravity * config.gravity_damping * dt;

            // Own state from the snapshot too, so alignment compares like with like
            let mut force = if self.grouped {
                let (position, velocity) = snapshot[index];
                group_force(config, index, position, velocity, &snapshot)
            } else {
                Vec3::ZERO
            };
            force += random_unit_vector(rng) * config.random_force;

            if fish.position.y <= water + 0.1 {
                if rng.random::<f32>() < config.jump_probability {
                    fish.velocity = Vec3::new(
                        uniform(rng, -1.0, 1.0),
                        config.splash_force * (0.5 + uniform(rng, 0.0, 0.3)),
                        uniform(rng, -1.0, 1.0),
                    );
                } else if rng.random::<f32>() < config.dive_probability {
                    fish.velocity.y = -config.splash_force * 0.3;
                }
            }
            if fish.position.y > water {
                fish.velocity *= config.air_friction;
            }

            force += boundary_force(config, fish.position);

            fish.velocity += attraction(config, fish.position, joints, dt);
            fish.velocity += force * dt;
            fish.position += fish.velocity * dt;

            let (pitch, yaw) = facing(fish.velocity);
            let o = &mut fish.orientation;
            o.yaw = normalize_angle(approach_angle(o.yaw, yaw, config.yaw_smoothing));
            o.pitch = approach(o.pitch, pitch, config.pitch_smoothing);

            fish.fins = FinPose::at(self.time, index);

            if fish.position.y < water {
                fish.velocity.y = fish.velocity.y.max(-config.splash_force * 0.2);
            }
        }
    }

    /// Inelastic bounce off a solid with the given contact normal
    ///
    /// Returns false (and does nothing) for an unknown index or a zero normal.
    pub fn handle_collision<R: Rng + ?Sized>(
        &mut self,
        index: usize,
        normal: Vec3,
        rng: &mut R,
    ) -> bool {
        let Some(normal) = normal.try_normalize() else {
            return false;
        };
        let config = &self.config;
        let Some(fish) = self.fish.get_mut(index) else {
            return false;
        };

        let dot = fish.velocity.dot(normal);
        fish.velocity -= normal * (2.0 * dot * config.bounce_restitution);

        let jitter = config.bounce_jitter * 0.5;
        fish.orientation.pitch += uniform(rng, -jitter, jitter);
        fish.orientation.roll += uniform(rng, -jitter, jitter);

        fish.velocity *= config.bounce_damping;
        true
    }

    /// Bounce and separate every fish touching a solid
    ///
    /// A fish whose velocity points into the solid gets the collision
    /// response; every touching fish is then moved out along the contact
    /// normal. Returns how many fish bounced.
    pub fn resolve_contacts<R: Rng + ?Sized>(
        &mut self,
        obstacles: &ObstacleRegistry,
        rng: &mut R,
    ) -> usize {
        let Some(asset) = self.asset else {
            return 0;
        };
        if obstacles.is_empty() {
            return 0;
        }

        let mut bounced = 0;
        for index in 0..self.fish.len() {
            self.fish[index].refresh_bounds(asset.half_extents);
            let mut hit = false;
            for _ in 0..CONTACT_PASSES {
                let Some(contact) = obstacles.contact(&self.fish[index].bounds) else {
                    break;
                };
                if self.fish[index].velocity.dot(contact.normal) < 0.0 {
                    hit |= self.handle_collision(index, contact.normal, rng);
                }
                let fish = &mut self.fish[index];
                fish.position += contact.normal * (contact.depth + CONTACT_SKIN);
                fish.refresh_bounds(asset.half_extents);
            }
            if hit {
                bounced += 1;
            }
        }
        bounced
    }

    pub fn fish(&self) -> &[Fish] {
        &self.fish
    }

    pub fn len(&self) -> usize {
        self.fish.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fish.is_empty()
    }

    pub fn grouped(&self) -> bool {
        self.grouped
    }

    /// Force the grouping oscillator into a state (restarts its timer)
    pub fn set_grouped(&mut self, grouped: bool) {
        self.grouped = grouped;
        self.group_timer = 0.0;
    }

    /// Recompute every fish box from its current transform
    pub fn refresh_bounds(&mut self) {
        let Some(asset) = self.asset else {
            return;
        };
        for fish in &mut self.fish {
            fish.refresh_bounds(asset.half_extents);
        }
    }

    pub fn config(&self) -> &FlockConfig {
        &self.config
    }
}
