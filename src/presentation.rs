//! Presentation-side reactions to the water line
//!
//! Both types here are pure state driven by immersion edges: the renderer
//! reads the visibility flags, the audio backend reads the loop gains. No
//! device or scene graph is touched.

use crate::config::AmbienceConfig;
use crate::sim::immersion::{Immersion, ImmersionEdge, ImmersionObserver};

/// Surface props hidden while the viewer is under water
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneVisibility {
    pub boat: bool,
    pub fish: bool,
    pub obstacles: bool,
}

impl Default for SceneVisibility {
    fn default() -> Self {
        Self {
            boat: true,
            fish: true,
            obstacles: true,
        }
    }
}

impl ImmersionObserver for SceneVisibility {
    fn on_immersion_change(&mut self, edge: ImmersionEdge) {
        let visible = !edge.to.is_submerged();
        self.boat = visible;
        self.fish = visible;
        self.obstacles = visible;
    }
}

/// Ambient loops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmbientLoop {
    /// Water flowing, heard from above the surface
    Surface,
    /// Bubbles, heard under water
    Underwater,
}

/// Linear crossfade between the surface and underwater loops
#[derive(Debug, Clone)]
pub struct AmbientMixer {
    fade_duration: f32,
    loop_gain: f32,
    master_volume: f32,
    muted: bool,
    target: Immersion,
    /// Seconds since the last edge; `None` when no fade is running
    fade_elapsed: Option<f32>,
}

impl AmbientMixer {
    pub fn new(config: &AmbienceConfig) -> Self {
        Self {
            fade_duration: config.fade_duration,
            loop_gain: config.loop_gain,
            master_volume: config.master_volume.clamp(0.0, 1.0),
            muted: false,
            target: Immersion::Surfaced,
            fade_elapsed: None,
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute both loops
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Advance a running fade
    pub fn update(&mut self, dt: f32) {
        if let Some(elapsed) = self.fade_elapsed.as_mut() {
            *elapsed += dt;
            if *elapsed >= self.fade_duration {
                self.fade_elapsed = None;
            }
        }
    }

    pub fn is_fading(&self) -> bool {
        self.fade_elapsed.is_some()
    }

    /// Fade completion in [0, 1]
    fn progress(&self) -> f32 {
        match self.fade_elapsed {
            Some(_) if self.fade_duration <= 0.0 => 1.0,
            Some(elapsed) => (elapsed / self.fade_duration).min(1.0),
            None => 1.0,
        }
    }

    /// Current output gain of a loop
    pub fn gain(&self, which: AmbientLoop) -> f32 {
        if self.muted {
            return 0.0;
        }
        let p = self.progress();
        let toward = match (self.target, which) {
            (Immersion::Submerged, AmbientLoop::Underwater)
            | (Immersion::Surfaced, AmbientLoop::Surface) => p,
            _ => 1.0 - p,
        };
        self.loop_gain * toward * self.master_volume
    }
}

impl ImmersionObserver for AmbientMixer {
    fn on_immersion_change(&mut self, edge: ImmersionEdge) {
        if edge.to != self.target {
            self.target = edge.to;
            self.fade_elapsed = Some(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIVE: ImmersionEdge = ImmersionEdge {
        from: Immersion::Surfaced,
        to: Immersion::Submerged,
    };
    const SURFACE: ImmersionEdge = ImmersionEdge {
        from: Immersion::Submerged,
        to: Immersion::Surfaced,
    };

    #[test]
    fn test_visibility_follows_edges() {
        let mut vis = SceneVisibility::default();
        vis.on_immersion_change(DIVE);
        assert_eq!(
            vis,
            SceneVisibility {
                boat: false,
                fish: false,
                obstacles: false
            }
        );
        vis.on_immersion_change(SURFACE);
        assert_eq!(vis, SceneVisibility::default());
    }

    #[test]
    fn test_mixer_starts_on_surface_loop() {
        let mixer = AmbientMixer::new(&AmbienceConfig::default());
        assert_eq!(mixer.gain(AmbientLoop::Surface), 0.5);
        assert_eq!(mixer.gain(AmbientLoop::Underwater), 0.0);
        assert!(!mixer.is_fading());
    }

    #[test]
    fn test_mixer_crossfades_over_duration() {
        let mut mixer = AmbientMixer::new(&AmbienceConfig::default());
        mixer.on_immersion_change(DIVE);
        assert!(mixer.is_fading());
        assert_eq!(mixer.gain(AmbientLoop::Surface), 0.5);

        mixer.update(0.5);
        assert!((mixer.gain(AmbientLoop::Surface) - 0.25).abs() < 1e-6);
        assert!((mixer.gain(AmbientLoop::Underwater) - 0.25).abs() < 1e-6);

        mixer.update(0.6);
        assert!(!mixer.is_fading());
        assert_eq!(mixer.gain(AmbientLoop::Surface), 0.0);
        assert_eq!(mixer.gain(AmbientLoop::Underwater), 0.5);
    }

    #[test]
    fn test_mixer_respects_master_and_mute() {
        let mut mixer = AmbientMixer::new(&AmbienceConfig::default());
        mixer.set_master_volume(0.5);
        assert!((mixer.gain(AmbientLoop::Surface) - 0.25).abs() < 1e-6);
        mixer.set_muted(true);
        assert_eq!(mixer.gain(AmbientLoop::Surface), 0.0);
    }
}
