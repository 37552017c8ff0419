//! Simulation tuning
//!
//! Every constant the engines use lives here so a JSON file can override it.
//! Missing fields fall back to defaults; `sanitize` makes any parsed config safe.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::WATER_LEVEL;

/// Errors raised while loading a config file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid config JSON.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Fish shoal tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockConfig {
    /// Individuals spawned per population toggle
    pub population: usize,
    /// Spawn positions are drawn in [-w, w) on x and z
    pub spawn_half_width: f32,
    /// Spawn heights are drawn in [water + low, water + high)
    pub spawn_band_low: f32,
    pub spawn_band_high: f32,
    /// Spawn velocities are drawn in [-s, s) on x and z
    pub spawn_speed: f32,
    pub water_level: f32,
    pub gravity: f32,
    /// Multiplier applied to gravity (water drag)
    pub gravity_damping: f32,
    pub splash_force: f32,
    pub attraction_force: f32,
    /// Joints closer than this do not attract
    pub max_attraction_distance: f32,
    pub cohesion_weight: f32,
    pub separation_weight: f32,
    pub alignment_weight: f32,
    /// Radius used for cohesion and alignment
    pub group_radius: f32,
    pub separation_radius: f32,
    /// Floor for the separation denominator
    pub separation_epsilon: f32,
    /// Seconds between flips of the grouped oscillator
    pub group_duration: f32,
    pub random_force: f32,
    pub jump_probability: f32,
    pub dive_probability: f32,
    /// Velocity multiplier per tick while above the water
    pub air_friction: f32,
    pub bounds_min: Vec3,
    pub bounds_max: Vec3,
    pub boundary_push: f32,
    pub projection_force: f32,
    /// Constant added to the upward component of a trigger escape
    pub projection_lift: f32,
    pub trigger_jitter: f32,
    pub yaw_smoothing: f32,
    pub pitch_smoothing: f32,
    /// Fraction of the normal component removed on a solid bounce
    pub bounce_restitution: f32,
    /// Velocity multiplier applied after a solid bounce
    pub bounce_damping: f32,
    pub bounce_jitter: f32,
    /// Local half extents of one fish (asset bounding box)
    pub fish_half_extents: Vec3,
}

impl Default for FlockConfig {
    fn default() -> Self {
        Self {
            population: 50,
            spawn_half_width: 5.0,
            spawn_band_low: -0.2,
            spawn_band_high: 0.3,
            spawn_speed: 0.75,
            water_level: WATER_LEVEL,
            gravity: 9.8,
            gravity_damping: 0.8,
            splash_force: 5.0,
            attraction_force: 2.0,
            max_attraction_distance: 25.0,
            cohesion_weight: 0.2,
            separation_weight: 0.4,
            alignment_weight: 0.1,
            group_radius: 3.0,
            separation_radius: 1.0,
            separation_epsilon: 1.0e-4,
            group_duration: 3.0,
            random_force: 0.4,
            jump_probability: 0.02,
            dive_probability: 0.01,
            air_friction: 0.98,
            bounds_min: Vec3::new(-10.0, -1.0, -10.0),
            bounds_max: Vec3::new(10.0, 4.0, 10.0),
            boundary_push: 2.0,
            projection_force: 15.0,
            projection_lift: 2.0,
            trigger_jitter: 0.3,
            yaw_smoothing: 0.1,
            pitch_smoothing: 0.05,
            bounce_restitution: 0.01,
            bounce_damping: 0.1,
            bounce_jitter: 0.5,
            fish_half_extents: Vec3::new(0.03, 0.04, 0.1),
        }
    }
}

/// Octopus tentacle tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TentacleConfig {
    /// Phase clock advance per second of sim time
    pub phase_speed: f32,
    pub wave_speed: f32,
    /// Phase lag between consecutive joints
    pub wave_length: f32,
    pub amplitude: f32,
    pub roll_weight: f32,
    pub min_pitch: f32,
    pub max_pitch: f32,
    pub smoothing: f32,
    pub bob_baseline: f32,
    pub bob_amplitude: f32,
    pub bob_speed: f32,
    /// Trigger box size relative to the full bounding box
    pub trigger_scale: f32,
    /// Half extents of the mantle, unioned with the joints for the full box
    pub body_half_extents: Vec3,
    /// Default procedural rig shape
    pub chains: usize,
    pub joints_per_chain: usize,
    pub segment_length: f32,
    pub anchor_radius: f32,
}

impl Default for TentacleConfig {
    fn default() -> Self {
        use std::f32::consts::PI;
        Self {
            phase_speed: 0.2,
            wave_speed: 3.5,
            wave_length: 0.5,
            amplitude: 0.2,
            roll_weight: 0.15,
            min_pitch: -PI / 6.0,
            max_pitch: PI / 5.0,
            smoothing: 0.2,
            bob_baseline: -0.1,
            bob_amplitude: 0.05,
            bob_speed: 10.0,
            trigger_scale: 0.5,
            body_half_extents: Vec3::new(0.35, 0.4, 0.35),
            chains: 8,
            joints_per_chain: 6,
            segment_length: 0.18,
            anchor_radius: 0.25,
        }
    }
}

/// Static solid placement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleConfig {
    pub island_position: Vec3,
    pub island_radius_top: f32,
    pub island_radius_bottom: f32,
    pub island_height: f32,
    pub dock_position: Vec3,
    pub dock_size: Vec3,
    /// Rocks placed by rejection sampling
    pub rock_count: usize,
    pub rock_radius: f32,
    pub max_attempts: u32,
    /// Rocks are drawn in [-extent, extent) on x and z
    pub placement_extent: f32,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            island_position: Vec3::new(20.0, 0.0, 20.0),
            island_radius_top: 10.0,
            island_radius_bottom: 12.0,
            island_height: 2.0,
            dock_position: Vec3::new(-15.0, 0.0, -15.0),
            dock_size: Vec3::new(15.0, 0.5, 5.0),
            rock_count: 5,
            rock_radius: 2.0,
            max_attempts: 50,
            placement_extent: 20.0,
        }
    }
}

/// Water line detection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImmersionConfig {
    /// Viewer heights strictly below this count as submerged
    pub threshold: f32,
}

impl Default for ImmersionConfig {
    fn default() -> Self {
        Self {
            threshold: WATER_LEVEL,
        }
    }
}

/// Ambient loop crossfade
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbienceConfig {
    /// Crossfade duration in seconds
    pub fade_duration: f32,
    /// Gain of whichever loop is fully faded in
    pub loop_gain: f32,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
}

impl Default for AmbienceConfig {
    fn default() -> Self {
        Self {
            fade_duration: 1.0,
            loop_gain: 0.5,
            master_volume: 1.0,
        }
    }
}

/// Complete simulation config
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seed for the world RNG
    pub seed: u64,
    pub flock: FlockConfig,
    pub tentacles: TentacleConfig,
    pub obstacles: ObstacleConfig,
    pub immersion: ImmersionConfig,
    pub ambience: AmbienceConfig,
}

impl SimConfig {
    /// Parse a config from JSON text and sanitize it
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let mut config: SimConfig = serde_json::from_str(json)?;
        config.sanitize();
        Ok(config)
    }

    /// Load a config file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Serialize to pretty JSON (for writing a starter config)
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Clamp every field into a usable range; non-finite values take the default
    pub fn sanitize(&mut self) {
        self.flock.sanitize();
        self.tentacles.sanitize();
        self.obstacles.sanitize();

        let d = ImmersionConfig::default();
        self.immersion.threshold = finite_or(self.immersion.threshold, d.threshold);

        let d = AmbienceConfig::default();
        let a = &mut self.ambience;
        a.fade_duration = clamp_finite(a.fade_duration, 0.0, 60.0, d.fade_duration);
        a.loop_gain = clamp_finite(a.loop_gain, 0.0, 1.0, d.loop_gain);
        a.master_volume = clamp_finite(a.master_volume, 0.0, 1.0, d.master_volume);
    }
}

impl FlockConfig {
    fn sanitize(&mut self) {
        let d = Self::default();
        self.population = self.population.min(1_000);
        self.spawn_half_width = clamp_finite(self.spawn_half_width, 0.0, 1_000.0, d.spawn_half_width);
        self.spawn_band_low = clamp_finite(self.spawn_band_low, -100.0, 0.0, d.spawn_band_low);
        self.spawn_band_high = clamp_finite(self.spawn_band_high, 0.0, 100.0, d.spawn_band_high);
        self.spawn_speed = clamp_finite(self.spawn_speed, 0.0, 100.0, d.spawn_speed);
        self.water_level = finite_or(self.water_level, d.water_level);
        self.gravity = clamp_finite(self.gravity, 0.0, 100.0, d.gravity);
        self.gravity_damping = clamp_finite(self.gravity_damping, 0.0, 1.0, d.gravity_damping);
        self.splash_force = clamp_finite(self.splash_force, 0.0, 100.0, d.splash_force);
        self.attraction_force = clamp_finite(self.attraction_force, 0.0, 100.0, d.attraction_force);
        self.max_attraction_distance =
            clamp_finite(self.max_attraction_distance, 0.01, 1_000.0, d.max_attraction_distance);
        self.cohesion_weight = clamp_finite(self.cohesion_weight, 0.0, 10.0, d.cohesion_weight);
        self.separation_weight =
            clamp_finite(self.separation_weight, 0.0, 10.0, d.separation_weight);
        self.alignment_weight = clamp_finite(self.alignment_weight, 0.0, 10.0, d.alignment_weight);
        self.group_radius = clamp_finite(self.group_radius, 0.0, 100.0, d.group_radius);
        self.separation_radius =
            clamp_finite(self.separation_radius, 0.0, self.group_radius.max(0.0), d.separation_radius);
        self.separation_epsilon =
            clamp_finite(self.separation_epsilon, 1.0e-6, 1.0, d.separation_epsilon);
        self.group_duration = clamp_finite(self.group_duration, 0.01, 3_600.0, d.group_duration);
        self.random_force = clamp_finite(self.random_force, 0.0, 100.0, d.random_force);
        self.jump_probability = clamp_finite(self.jump_probability, 0.0, 1.0, d.jump_probability);
        self.dive_probability = clamp_finite(self.dive_probability, 0.0, 1.0, d.dive_probability);
        self.air_friction = clamp_finite(self.air_friction, 0.0, 1.0, d.air_friction);
        self.bounds_min = finite_vec_or(self.bounds_min, d.bounds_min);
        self.bounds_max = finite_vec_or(self.bounds_max, d.bounds_max).max(self.bounds_min);
        self.boundary_push = clamp_finite(self.boundary_push, 0.0, 100.0, d.boundary_push);
        self.projection_force = clamp_finite(self.projection_force, 0.0, 100.0, d.projection_force);
        self.projection_lift = clamp_finite(self.projection_lift, 0.0, 100.0, d.projection_lift);
        self.trigger_jitter = clamp_finite(self.trigger_jitter, 0.0, 3.0, d.trigger_jitter);
        self.yaw_smoothing = clamp_finite(self.yaw_smoothing, 0.0, 1.0, d.yaw_smoothing);
        self.pitch_smoothing = clamp_finite(self.pitch_smoothing, 0.0, 1.0, d.pitch_smoothing);
        self.bounce_restitution =
            clamp_finite(self.bounce_restitution, 0.0, 1.0, d.bounce_restitution);
        self.bounce_damping = clamp_finite(self.bounce_damping, 0.0, 1.0, d.bounce_damping);
        self.bounce_jitter = clamp_finite(self.bounce_jitter, 0.0, 3.0, d.bounce_jitter);
        self.fish_half_extents = finite_vec_or(self.fish_half_extents, d.fish_half_extents).abs();
    }
}

impl TentacleConfig {
    fn sanitize(&mut self) {
        let d = Self::default();
        self.phase_speed = clamp_finite(self.phase_speed, 0.0, 100.0, d.phase_speed);
        self.wave_speed = clamp_finite(self.wave_speed, 0.0, 100.0, d.wave_speed);
        self.wave_length = clamp_finite(self.wave_length, 0.0, 10.0, d.wave_length);
        self.amplitude = clamp_finite(self.amplitude, 0.0, 1.0, d.amplitude);
        self.roll_weight = clamp_finite(self.roll_weight, 0.0, 1.0, d.roll_weight);
        self.min_pitch = clamp_finite(self.min_pitch, -std::f32::consts::PI, 0.0, d.min_pitch);
        self.max_pitch = clamp_finite(self.max_pitch, 0.0, std::f32::consts::PI, d.max_pitch);
        self.smoothing = clamp_finite(self.smoothing, 0.0, 1.0, d.smoothing);
        self.bob_baseline = finite_or(self.bob_baseline, d.bob_baseline);
        self.bob_amplitude = clamp_finite(self.bob_amplitude, 0.0, 10.0, d.bob_amplitude);
        self.bob_speed = clamp_finite(self.bob_speed, 0.0, 100.0, d.bob_speed);
        self.trigger_scale = clamp_finite(self.trigger_scale, 0.0, 1.0, d.trigger_scale);
        self.body_half_extents = finite_vec_or(self.body_half_extents, d.body_half_extents).abs();
        self.chains = self.chains.min(64);
        self.joints_per_chain = self.joints_per_chain.min(64);
        self.segment_length = clamp_finite(self.segment_length, 0.0, 10.0, d.segment_length);
        self.anchor_radius = clamp_finite(self.anchor_radius, 0.0, 10.0, d.anchor_radius);
    }
}

impl ObstacleConfig {
    fn sanitize(&mut self) {
        let d = Self::default();
        self.island_position = finite_vec_or(self.island_position, d.island_position);
        self.island_radius_top = clamp_finite(self.island_radius_top, 0.0, 1_000.0, d.island_radius_top);
        self.island_radius_bottom =
            clamp_finite(self.island_radius_bottom, 0.0, 1_000.0, d.island_radius_bottom);
        self.island_height = clamp_finite(self.island_height, 0.0, 1_000.0, d.island_height);
        self.dock_position = finite_vec_or(self.dock_position, d.dock_position);
        self.dock_size = finite_vec_or(self.dock_size, d.dock_size).abs();
        self.rock_count = self.rock_count.min(256);
        self.rock_radius = clamp_finite(self.rock_radius, 0.0, 1_000.0, d.rock_radius);
        self.max_attempts = self.max_attempts.clamp(1, 10_000);
        self.placement_extent = clamp_finite(self.placement_extent, 0.0, 10_000.0, d.placement_extent);
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

fn clamp_finite(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

fn finite_vec_or(value: Vec3, fallback: Vec3) -> Vec3 {
    if value.is_finite() { value } else { fallback }
}
