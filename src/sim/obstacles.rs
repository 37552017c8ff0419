//! Static solids and overlap queries
//!
//! Solids are placed once at startup: two fixed props, then rocks scattered
//! by rejection sampling so that no two boxes overlap.

use glam::{EulerRot, Quat, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::aabb::Aabb;
use super::uniform;
use crate::config::ObstacleConfig;

/// Local geometry of a solid, centered on its origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Tapered cylinder standing on the Y axis
    Cylinder {
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
    },
    Cuboid { size: Vec3 },
    /// Roughly round rock, bounded by its circumradius
    Rock { radius: f32 },
}

impl Shape {
    /// Half extents of the shape's local bounding box
    pub fn half_extents(&self) -> Vec3 {
        match *self {
            Shape::Cylinder {
                radius_top,
                radius_bottom,
                height,
            } => {
                let r = radius_top.max(radius_bottom);
                Vec3::new(r, height * 0.5, r)
            }
            Shape::Cuboid { size } => size.abs() * 0.5,
            Shape::Rock { radius } => Vec3::splat(radius),
        }
    }
}

/// What a solid represents (for presentation and logging)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolidKind {
    Island,
    Dock,
    Rock,
}

/// A static obstacle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solid {
    pub kind: SolidKind,
    pub shape: Shape,
    pub position: Vec3,
    /// XYZ Euler angles
    pub rotation: Vec3,
    /// World box derived from shape and transform
    pub bounds: Aabb,
}

impl Solid {
    pub fn new(kind: SolidKind, shape: Shape, position: Vec3, rotation: Vec3) -> Self {
        let bounds = solid_bounds(&shape, position, rotation);
        Self {
            kind,
            shape,
            position,
            rotation,
            bounds,
        }
    }

    /// Re-derive `bounds` from the current transform
    pub fn refresh(&mut self) {
        self.bounds = solid_bounds(&self.shape, self.position, self.rotation);
    }
}

fn solid_bounds(shape: &Shape, position: Vec3, rotation: Vec3) -> Aabb {
    let quat = Quat::from_euler(EulerRot::XYZ, rotation.x, rotation.y, rotation.z);
    Aabb::from_transform(shape.half_extents(), quat, position)
}

/// Contact between a probe box and a registered solid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Index of the solid in the registry
    pub solid: usize,
    /// Unit normal pointing from the solid toward the probe
    pub normal: Vec3,
    /// Distance the probe must move along `normal` to clear the solid
    pub depth: f32,
}

/// The fixed set of static solids
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObstacleRegistry {
    solids: Vec<Solid>,
}

impl ObstacleRegistry {
    pub fn new() -> Self {
        Self { solids: Vec::new() }
    }

    /// Build the standard layout: island, dock, then rejection-sampled rocks
    ///
    /// A rock that finds no free spot within `max_attempts` draws is skipped,
    /// so the registry may end up with fewer rocks than requested.
    pub fn place<R: Rng + ?Sized>(config: &ObstacleConfig, rng: &mut R) -> Self {
        let mut registry = Self::new();

        registry.solids.push(Solid::new(
            SolidKind::Island,
            Shape::Cylinder {
                radius_top: config.island_radius_top,
                radius_bottom: config.island_radius_bottom,
                height: config.island_height,
            },
            config.island_position,
            Vec3::ZERO,
        ));
        registry.solids.push(Solid::new(
            SolidKind::Dock,
            Shape::Cuboid {
                size: config.dock_size,
            },
            config.dock_position,
            Vec3::ZERO,
        ));

        let rock = Shape::Rock {
            radius: config.rock_radius,
        };
        let extent = config.placement_extent;
        let mut skipped = 0;

        for _ in 0..config.rock_count {
            let mut placed = None;
            for _ in 0..config.max_attempts {
                let position = Vec3::new(
                    uniform(rng, -extent, extent),
                    0.0,
                    uniform(rng, -extent, extent),
                );
                // Orientation is drawn with the position so the tested box is the committed box
                let rotation = Vec3::new(
                    uniform(rng, 0.0, std::f32::consts::PI),
                    uniform(rng, 0.0, std::f32::consts::PI),
                    uniform(rng, 0.0, std::f32::consts::PI),
                );
                let candidate = Solid::new(SolidKind::Rock, rock, position, rotation);
                if !registry.intersects_any(&candidate.bounds) {
                    placed = Some(candidate);
                    break;
                }
            }

            match placed {
                Some(solid) => registry.solids.push(solid),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            log::warn!(
                "Skipped {} of {} rocks: no free spot after {} attempts",
                skipped,
                config.rock_count,
                config.max_attempts
            );
        }
        log::info!("Placed {} obstacles", registry.solids.len());

        registry
    }

    /// Register an extra solid
    pub fn push(&mut self, solid: Solid) {
        self.solids.push(solid);
    }

    /// Re-derive every box from its solid's transform
    pub fn refresh(&mut self) {
        for solid in &mut self.solids {
            solid.refresh();
        }
    }

    /// Move a solid; its box is updated on the next `refresh`
    pub fn set_transform(&mut self, index: usize, position: Vec3, rotation: Vec3) -> bool {
        match self.solids.get_mut(index) {
            Some(solid) => {
                solid.position = position;
                solid.rotation = rotation;
                true
            }
            None => false,
        }
    }

    /// Does the box intersect any registered solid
    pub fn intersects_any(&self, probe: &Aabb) -> bool {
        self.solids.iter().any(|s| s.bounds.intersects(probe))
    }

    /// First solid the probe overlaps, with the shortest way out of it
    pub fn contact(&self, probe: &Aabb) -> Option<Contact> {
        self.solids.iter().enumerate().find_map(|(solid, s)| {
            s.bounds
                .penetration(probe)
                .map(|(normal, depth)| Contact {
                    solid,
                    normal,
                    depth,
                })
        })
    }

    pub fn solids(&self) -> &[Solid] {
        &self.solids
    }

    pub fn boxes(&self) -> impl Iterator<Item = &Aabb> {
        self.solids.iter().map(|s| &s.bounds)
    }

    pub fn len(&self) -> usize {
        self.solids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solids.is_empty()
    }
}
