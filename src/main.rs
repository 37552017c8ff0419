//! Shoal headless driver
//!
//! Runs the simulation with a scripted viewer that dives below the surface
//! and comes back up, then prints the final frame as JSON.
//!
//! Usage: `shoal [config.json]`, or `shoal --print-config` to dump the
//! defaults as a starter config file.

use glam::Vec3;

use shoal::consts::{MAX_SUBSTEPS, SIM_DT};
use shoal::{AmbientLoop, AmbientMixer, SceneVisibility, SimConfig, TickInput, World};

/// Simulated wall-clock frame time (30 fps host)
const FRAME_TIME: f32 = 1.0 / 30.0;
/// Frames the scripted run lasts
const FRAMES: u32 = 300;

/// Camera path: starts above the water, dips under for the middle third
fn viewer_at(frame: u32) -> Vec3 {
    let t = frame as f32 / FRAMES as f32;
    let y = if (0.33..0.66).contains(&t) { -1.0 } else { 1.4 };
    Vec3::new(0.0, y, 1.0)
}

fn load_config() -> SimConfig {
    let Some(path) = std::env::args().nth(1) else {
        log::info!("No config given, using defaults");
        return SimConfig::default();
    };
    match SimConfig::load(&path) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}; falling back to defaults");
            SimConfig::default()
        }
    }
}

fn main() {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();
    log::info!("Shoal starting...");

    if std::env::args().nth(1).as_deref() == Some("--print-config") {
        match SimConfig::default().to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => log::error!("Failed to serialize config: {e}"),
        }
        return;
    }

    let config = load_config();
    let mut visibility = SceneVisibility::default();
    let mut mixer = AmbientMixer::new(&config.ambience);
    let mut world = World::with_default_assets(config);

    let mut accumulator = 0.0;
    let mut bounces = 0;

    for frame in 0..FRAMES {
        let mut input = TickInput {
            toggle_population: frame == 0,
            viewer_position: viewer_at(frame),
        };

        accumulator += FRAME_TIME;
        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let report = world.tick(&input, SIM_DT, &mut [&mut visibility, &mut mixer]);
            if let Some(change) = report.population {
                log::info!("Tick {}: {:?}", report.tick, change);
            }
            if let Some(edge) = report.immersion {
                log::info!(
                    "Tick {}: {:?} -> {:?} (fish visible: {})",
                    report.tick,
                    edge.from,
                    edge.to,
                    visibility.fish
                );
            }
            bounces += report.bounces;
            mixer.update(SIM_DT);

            // Toggle is one-shot
            input.toggle_population = false;
            accumulator -= SIM_DT;
            substeps += 1;
        }
    }

    log::info!(
        "Done after {} ticks: {} fish, {} bounces, ambience surface={:.2} bubbles={:.2}",
        world.time_ticks(),
        world.shoal().len(),
        bounces,
        mixer.gain(AmbientLoop::Surface),
        mixer.gain(AmbientLoop::Underwater)
    );

    match serde_json::to_string_pretty(&world.snapshot()) {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("Failed to serialize frame: {e}"),
    }
}
