//! Water line state machine
//!
//! Samples the viewer height each tick and reports an edge only when the
//! viewer crosses the surface. There is no hysteresis: a viewer hovering on
//! the threshold flips state on every crossing tick.

use serde::{Deserialize, Serialize};

/// Which side of the surface the viewer is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Immersion {
    #[default]
    Surfaced,
    Submerged,
}

impl Immersion {
    pub fn is_submerged(self) -> bool {
        self == Immersion::Submerged
    }
}

/// A transition between the two states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImmersionEdge {
    pub from: Immersion,
    pub to: Immersion,
}

/// Consumers of immersion edges (visibility toggles, ambience crossfade)
pub trait ImmersionObserver {
    fn on_immersion_change(&mut self, edge: ImmersionEdge);
}

/// Edge detector over the viewer's height
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImmersionTracker {
    threshold: f32,
    state: Immersion,
}

impl ImmersionTracker {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            state: Immersion::Surfaced,
        }
    }

    /// Sample the viewer height; returns an edge only when the state changes
    pub fn update(&mut self, viewer_height: f32) -> Option<ImmersionEdge> {
        let next = if viewer_height < self.threshold {
            Immersion::Submerged
        } else {
            Immersion::Surfaced
        };

        if next == self.state {
            return None;
        }

        let edge = ImmersionEdge {
            from: self.state,
            to: next,
        };
        self.state = next;
        log::debug!("Immersion {:?} -> {:?}", edge.from, edge.to);
        Some(edge)
    }

    pub fn state(&self) -> Immersion {
        self.state
    }

    pub fn is_submerged(&self) -> bool {
        self.state.is_submerged()
    }
}

impl Default for ImmersionTracker {
    fn default() -> Self {
        Self::new(crate::consts::WATER_LEVEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_heights_emit_two_edges() {
        let mut tracker = ImmersionTracker::default();
        let edges: Vec<(usize, ImmersionEdge)> = [1.0, 1.0, -1.0, -1.0, 1.0]
            .iter()
            .enumerate()
            .filter_map(|(i, &h)| tracker.update(h).map(|e| (i, e)))
            .collect();

        assert_eq!(
            edges,
            vec![
                (
                    2,
                    ImmersionEdge {
                        from: Immersion::Surfaced,
                        to: Immersion::Submerged
                    }
                ),
                (
                    4,
                    ImmersionEdge {
                        from: Immersion::Submerged,
                        to: Immersion::Surfaced
                    }
                ),
            ]
        );
    }

    #[test]
    fn test_threshold_itself_counts_as_surfaced() {
        let mut tracker = ImmersionTracker::default();
        assert_eq!(tracker.update(0.0), None);
        assert!(!tracker.is_submerged());
        assert!(tracker.update(-0.0001).is_some());
        assert!(tracker.is_submerged());
    }

    #[test]
    fn test_thrashing_at_threshold_emits_every_crossing() {
        let mut tracker = ImmersionTracker::default();
        let count = [-0.01, 0.0, -0.01, 0.0, -0.01]
            .iter()
            .filter(|&&h| tracker.update(h).is_some())
            .count();
        assert_eq!(count, 5);
    }

    #[test]
    fn test_custom_threshold() {
        let mut tracker = ImmersionTracker::new(2.0);
        assert!(tracker.update(1.5).is_some());
        assert_eq!(tracker.state(), Immersion::Submerged);
    }
}
