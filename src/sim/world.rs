//! Per-tick pipeline
//!
//! Stage order is fixed: obstacles → octopus → shoal → solid contacts →
//! water line. The shoal reads the octopus output of the same tick, passed
//! in as plain snapshots.

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use super::aabb::Aabb;
use super::flock::{FinPose, FishAsset, Orientation, PopulationChange, Shoal};
use super::immersion::{ImmersionEdge, ImmersionObserver, ImmersionTracker};
use super::obstacles::ObstacleRegistry;
use super::tentacle::{Octopus, TentacleRig};
use crate::config::SimConfig;

/// External input for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Spawn or clear the whole shoal before simulating
    pub toggle_population: bool,
    /// Viewer (camera) position; only its height is used
    pub viewer_position: Vec3,
}

/// What happened during a tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Tick counter after this tick
    pub tick: u64,
    pub population: Option<PopulationChange>,
    /// Fish bounced off a solid this tick
    pub bounces: usize,
    pub immersion: Option<ImmersionEdge>,
}

/// Per-fish data for the presentation layer
#[derive(Debug, Clone, Serialize)]
pub struct FishFrame {
    pub position: Vec3,
    pub orientation: Orientation,
    pub fins: FinPose,
}

/// Everything the presentation layer needs after a tick
#[derive(Debug, Clone, Serialize)]
pub struct FrameSnapshot {
    pub tick: u64,
    pub fish: Vec<FishFrame>,
    pub octopus_position: Vec3,
    pub joints: Vec<Vec3>,
    pub trigger: Option<Aabb>,
    pub obstacles: Vec<Aabb>,
    pub submerged: bool,
}

/// Owns every engine and runs them in order
pub struct World {
    config: SimConfig,
    rng: Pcg32,
    obstacles: ObstacleRegistry,
    octopus: Octopus,
    shoal: Shoal,
    immersion: ImmersionTracker,
    time_ticks: u64,
}

impl World {
    /// Build a world with obstacles placed but no creature assets loaded yet
    pub fn new(config: SimConfig) -> Self {
        let mut rng = Pcg32::seed_from_u64(config.seed);
        let obstacles = ObstacleRegistry::place(&config.obstacles, &mut rng);
        let octopus = Octopus::new(config.tentacles.clone());
        let shoal = Shoal::new(config.flock.clone());
        let immersion = ImmersionTracker::new(config.immersion.threshold);

        log::info!("World created with seed {}", config.seed);

        Self {
            config,
            rng,
            obstacles,
            octopus,
            shoal,
            immersion,
            time_ticks: 0,
        }
    }

    /// Build a world with the procedural rig and config-sized fish already loaded
    pub fn with_default_assets(config: SimConfig) -> Self {
        let mut world = Self::new(config);
        let rig = TentacleRig::procedural(&world.config.tentacles);
        world.load_rig(&rig);
        world.load_fish_asset(FishAsset {
            half_extents: world.config.flock.fish_half_extents,
        });
        world
    }

    /// Asset provider hook: the octopus skeleton is ready
    pub fn load_rig(&mut self, rig: &TentacleRig) {
        self.octopus.attach_rig(rig, &mut self.rng);
    }

    /// Asset provider hook: the fish model is ready
    pub fn load_fish_asset(&mut self, asset: FishAsset) {
        self.shoal.set_asset(asset);
    }

    /// Advance the whole simulation by `dt`
    ///
    /// Immersion edges are delivered to every observer before returning.
    pub fn tick(
        &mut self,
        input: &TickInput,
        dt: f32,
        observers: &mut [&mut dyn ImmersionObserver],
    ) -> TickReport {
        let mut report = TickReport::default();

        if input.toggle_population {
            report.population = Some(self.shoal.toggle_population(&mut self.rng));
        }

        self.obstacles.refresh();

        self.octopus.update(dt);
        let joints = self.octopus.joint_positions();
        let trigger = self.octopus.trigger_box();

        self.shoal.update(dt, &joints, trigger.as_ref(), &mut self.rng);
        report.bounces = self.shoal.resolve_contacts(&self.obstacles, &mut self.rng);

        report.immersion = self.immersion.update(input.viewer_position.y);
        if let Some(edge) = report.immersion {
            for observer in observers.iter_mut() {
                observer.on_immersion_change(edge);
            }
        }

        self.time_ticks += 1;
        report.tick = self.time_ticks;
        report
    }

    /// Presentation view of the current state
    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            tick: self.time_ticks,
            fish: self
                .shoal
                .fish()
                .iter()
                .map(|f| FishFrame {
                    position: f.position,
                    orientation: f.orientation,
                    fins: f.fins,
                })
                .collect(),
            octopus_position: self.octopus.position(),
            joints: self.octopus.joint_positions(),
            trigger: self.octopus.trigger_box(),
            obstacles: self.obstacles.boxes().copied().collect(),
            submerged: self.immersion.is_submerged(),
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn shoal(&self) -> &Shoal {
        &self.shoal
    }

    pub fn shoal_mut(&mut self) -> &mut Shoal {
        &mut self.shoal
    }

    pub fn octopus(&self) -> &Octopus {
        &self.octopus
    }

    pub fn obstacles(&self) -> &ObstacleRegistry {
        &self.obstacles
    }

    pub fn obstacles_mut(&mut self) -> &mut ObstacleRegistry {
        &mut self.obstacles
    }

    pub fn immersion(&self) -> &ImmersionTracker {
        &self.immersion
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FlockConfig, ObstacleConfig};
    use crate::consts::SIM_DT;
    use crate::sim::immersion::Immersion;
    use crate::sim::obstacles::{Shape, Solid, SolidKind};

    const TOGGLE: TickInput = TickInput {
        toggle_population: true,
        viewer_position: Vec3::new(0.0, 1.4, 1.0),
    };
    const ABOVE: TickInput = TickInput {
        toggle_population: false,
        viewer_position: Vec3::new(0.0, 1.4, 1.0),
    };

    #[derive(Default)]
    struct Recorder {
        edges: Vec<ImmersionEdge>,
    }

    impl ImmersionObserver for Recorder {
        fn on_immersion_change(&mut self, edge: ImmersionEdge) {
            self.edges.push(edge);
        }
    }

    #[test]
    fn test_world_without_assets_still_ticks() {
        let mut world = World::new(SimConfig::default());
        let report = world.tick(&TOGGLE, SIM_DT, &mut []);
        assert_eq!(report.population, Some(PopulationChange::AssetNotReady));
        assert!(world.shoal().is_empty());
        assert!(world.octopus().joint_positions().is_empty());
        assert_eq!(report.tick, 1);
    }

    #[test]
    fn test_toggle_then_simulate() {
        let mut world = World::with_default_assets(SimConfig::default());
        let report = world.tick(&TOGGLE, SIM_DT, &mut []);
        assert_eq!(report.population, Some(PopulationChange::Spawned(50)));

        for _ in 0..300 {
            world.tick(&ABOVE, SIM_DT, &mut []);
        }
        for fish in world.shoal().fish() {
            assert!(fish.position.is_finite());
            assert!(fish.velocity.is_finite());
        }

        let report = world.tick(&TOGGLE, SIM_DT, &mut []);
        assert_eq!(report.population, Some(PopulationChange::Cleared(50)));
        assert!(world.shoal().is_empty());
    }

    #[test]
    fn test_same_seed_same_world() {
        let mut a = World::with_default_assets(SimConfig::default());
        let mut b = World::with_default_assets(SimConfig::default());
        a.tick(&TOGGLE, SIM_DT, &mut []);
        b.tick(&TOGGLE, SIM_DT, &mut []);
        for _ in 0..60 {
            a.tick(&ABOVE, SIM_DT, &mut []);
            b.tick(&ABOVE, SIM_DT, &mut []);
        }
        let (fa, fb) = (a.shoal().fish(), b.shoal().fish());
        assert_eq!(fa.len(), fb.len());
        for (x, y) in fa.iter().zip(fb) {
            assert_eq!(x.position, y.position);
        }
    }

    #[test]
    fn test_observers_receive_edges_in_order() {
        let mut world = World::with_default_assets(SimConfig::default());
        let mut recorder = Recorder::default();
        let heights = [1.0, 1.0, -1.0, -1.0, 1.0];
        let mut edge_ticks = Vec::new();

        for (i, &h) in heights.iter().enumerate() {
            let input = TickInput {
                toggle_population: false,
                viewer_position: Vec3::new(0.0, h, 0.0),
            };
            if world.tick(&input, SIM_DT, &mut [&mut recorder]).immersion.is_some() {
                edge_ticks.push(i);
            }
        }

        assert_eq!(edge_ticks, vec![2, 4]);
        assert_eq!(recorder.edges.len(), 2);
        assert_eq!(recorder.edges[0].to, Immersion::Submerged);
        assert_eq!(recorder.edges[1].to, Immersion::Surfaced);
    }

    #[test]
    fn test_snapshot_exposes_presentation_data() {
        let mut world = World::with_default_assets(SimConfig::default());
        world.tick(&TOGGLE, SIM_DT, &mut []);
        let snap = world.snapshot();
        assert_eq!(snap.fish.len(), 50);
        assert_eq!(snap.joints.len(), 8 * 6);
        assert!(snap.trigger.is_some());
        assert_eq!(snap.obstacles.len(), world.obstacles().len());
        assert!(!snap.submerged);
        assert!(serde_json::to_string(&snap).is_ok());
    }

    /// Single calm fish spawned at `(0, y, 0)`, no rocks
    fn lone_fish_config(y: f32) -> SimConfig {
        SimConfig {
            flock: FlockConfig {
                population: 1,
                spawn_half_width: 0.0,
                spawn_band_low: y,
                spawn_band_high: y,
                spawn_speed: 0.0,
                random_force: 0.0,
                jump_probability: 0.0,
                dive_probability: 0.0,
                ..Default::default()
            },
            obstacles: ObstacleConfig {
                rock_count: 0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_fish_buried_in_solid_is_moved_out() {
        let mut world = World::with_default_assets(lone_fish_config(-0.5));
        world.tick(&TOGGLE, SIM_DT, &mut []);
        // Drop a block on top of the fish
        let buried_at = world.shoal().fish()[0].position;
        world.obstacles_mut().push(Solid::new(
            SolidKind::Dock,
            Shape::Cuboid { size: Vec3::ONE },
            buried_at,
            Vec3::ZERO,
        ));
        assert!(world.obstacles().intersects_any(&world.shoal().fish()[0].bounds));

        for _ in 0..240 {
            world.tick(&ABOVE, SIM_DT, &mut []);
            for fish in world.shoal().fish() {
                assert!(!world.obstacles().intersects_any(&fish.bounds));
                assert!(fish.position.is_finite());
            }
        }
    }

    #[test]
    fn test_default_worlds_keep_fish_out_of_solids() {
        for seed in 0..4 {
            let config = SimConfig {
                seed,
                ..Default::default()
            };
            let mut world = World::with_default_assets(config);
            world.tick(&TOGGLE, SIM_DT, &mut []);
            for _ in 0..600 {
                world.tick(&ABOVE, SIM_DT, &mut []);
                for fish in world.shoal().fish() {
                    assert!(!world.obstacles().intersects_any(&fish.bounds));
                }
            }
        }
    }

    #[test]
    fn test_trigger_comes_from_same_tick() {
        // A fast, tall bob puts the body about five units up after one tick
        let mut config = lone_fish_config(0.0);
        config.tentacles.bob_amplitude = 5.0;
        config.tentacles.bob_speed =
            std::f32::consts::FRAC_PI_2 / (SIM_DT * config.tentacles.phase_speed);

        let mut reference = World::with_default_assets(config.clone());
        let before = reference.octopus().trigger_box().unwrap();
        reference.tick(&ABOVE, SIM_DT, &mut []);
        let after = reference.octopus().trigger_box().unwrap();

        config.flock.spawn_band_low = after.center().y;
        config.flock.spawn_band_high = after.center().y;
        let mut world = World::with_default_assets(config);
        world.tick(&TOGGLE, SIM_DT, &mut []);

        let fish = &world.shoal().fish()[0];
        let spawn = Aabb::from_center_size(Vec3::new(0.0, after.center().y, 0.0), Vec3::splat(0.3));
        assert!(!before.intersects(&spawn));
        assert!(after.intersects(&spawn));
        // Escape velocity is at least the projection force
        assert!(fish.velocity.length() > 10.0);
    }
}
