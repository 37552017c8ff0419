//! Axis-aligned bounding boxes
//!
//! Every overlap test in the simulation (fish vs trigger, fish vs solid,
//! solid vs solid during placement) goes through this type.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// An axis-aligned box given by its two extreme corners
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size.abs() * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Smallest box holding every point; `None` for an empty iterator
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut aabb = Self {
            min: first,
            max: first,
        };
        for p in points {
            aabb.expand_to(p);
        }
        Some(aabb)
    }

    /// World box of a local box `[-half, half]` after rotation and translation
    pub fn from_transform(half_extents: Vec3, rotation: Quat, translation: Vec3) -> Self {
        // Rotated half extents projected onto each world axis
        let x = rotation * Vec3::X * half_extents.x;
        let y = rotation * Vec3::Y * half_extents.y;
        let z = rotation * Vec3::Z * half_extents.z;
        let half = x.abs() + y.abs() + z.abs();
        Self {
            min: translation - half,
            max: translation + half,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Grow the box to include a point
    pub fn expand_to(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Union of two boxes
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Same center, every side multiplied by `factor`
    pub fn scaled_about_center(&self, factor: f32) -> Aabb {
        Aabb::from_center_size(self.center(), self.size() * factor)
    }

    /// Closed-interval overlap on all three axes (touching faces count)
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Overlap depth along each axis (negative on an axis means separated)
    pub fn overlap(&self, other: &Aabb) -> Vec3 {
        self.max.min(other.max) - self.min.max(other.min)
    }

    /// Shortest way to move `other` out of `self`
    ///
    /// Returns the unit axis pointing from `self` toward `other` and the
    /// distance `other` must travel along it to stop overlapping. Each axis is
    /// tried in both directions, so a box fully inside `self` still exits
    /// through its nearest face. `None` when the boxes do not intersect.
    pub fn penetration(&self, other: &Aabb) -> Option<(Vec3, f32)> {
        if !self.intersects(other) {
            return None;
        }
        let up = self.max - other.min;
        let down = other.max - self.min;

        let mut best = (Vec3::X, f32::INFINITY);
        for (axis, up, down) in [
            (Vec3::X, up.x, down.x),
            (Vec3::Y, up.y, down.y),
            (Vec3::Z, up.z, down.z),
        ] {
            if up < best.1 {
                best = (axis, up);
            }
            if down < best.1 {
                best = (-axis, down);
            }
        }
        Some(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_at(center: Vec3) -> Aabb {
        Aabb::from_center_size(center, Vec3::ONE)
    }

    #[test]
    fn test_intersects_is_symmetric_and_inclusive() {
        let a = unit_at(Vec3::ZERO);
        let touching = unit_at(Vec3::new(1.0, 0.0, 0.0));
        let apart = unit_at(Vec3::new(1.5, 0.0, 0.0));
        assert!(a.intersects(&touching));
        assert!(touching.intersects(&a));
        assert!(!a.intersects(&apart));
        assert!(!apart.intersects(&a));
    }

    #[test]
    fn test_separated_on_one_axis_is_enough() {
        let a = unit_at(Vec3::ZERO);
        let b = unit_at(Vec3::new(0.2, 3.0, 0.2));
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_scaled_about_center_keeps_center() {
        let a = Aabb::new(Vec3::new(-1.0, 0.0, 2.0), Vec3::new(3.0, 4.0, 6.0));
        let half = a.scaled_about_center(0.5);
        assert_eq!(half.center(), a.center());
        assert_eq!(half.size(), a.size() * 0.5);
    }

    #[test]
    fn test_from_points() {
        assert!(Aabb::from_points(std::iter::empty()).is_none());
        let b = Aabb::from_points([Vec3::new(1.0, -2.0, 0.0), Vec3::new(-1.0, 2.0, 5.0)]).unwrap();
        assert_eq!(b.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(b.max, Vec3::new(1.0, 2.0, 5.0));
    }

    #[test]
    fn test_from_transform_rotated_quarter_turn_swaps_axes() {
        let half = Vec3::new(2.0, 0.5, 1.0);
        let rot = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let b = Aabb::from_transform(half, rot, Vec3::new(10.0, 0.0, 0.0));
        assert!((b.size() - Vec3::new(2.0, 1.0, 4.0)).length() < 1e-4);
        assert!((b.center() - Vec3::new(10.0, 0.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_from_transform_diagonal_grows() {
        let half = Vec3::ONE;
        let rot = Quat::from_rotation_y(std::f32::consts::FRAC_PI_4);
        let b = Aabb::from_transform(half, rot, Vec3::ZERO);
        let expected = 2.0 * std::f32::consts::SQRT_2;
        assert!((b.size().x - expected).abs() < 1e-4);
        assert!((b.size().y - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_penetration_exits_through_nearest_face() {
        let solid = Aabb::from_center_size(Vec3::ZERO, Vec3::new(4.0, 4.0, 4.0));
        // Pokes 0.2 into the +X face, deep on the other axes
        let poke = Aabb::from_center_size(Vec3::new(2.3, 0.0, 0.0), Vec3::ONE);
        let (normal, depth) = solid.penetration(&poke).unwrap();
        assert_eq!(normal, Vec3::X);
        assert!((depth - 0.2).abs() < 1e-5);

        let below = Aabb::from_center_size(Vec3::new(0.0, -2.4, 0.0), Vec3::ONE);
        assert_eq!(solid.penetration(&below).unwrap().0, Vec3::NEG_Y);

        let far = unit_at(Vec3::splat(10.0));
        assert_eq!(solid.penetration(&far), None);
    }

    #[test]
    fn test_penetration_of_buried_box() {
        let solid = Aabb::from_center_size(Vec3::ZERO, Vec3::new(4.0, 4.0, 4.0));
        // Fully inside, 0.5 below the top face
        let buried = Aabb::from_center_size(Vec3::new(0.0, 1.0, 0.0), Vec3::ONE);
        let (normal, depth) = solid.penetration(&buried).unwrap();
        assert_eq!(normal, Vec3::Y);
        assert!((depth - 1.5).abs() < 1e-5);

        let moved = Aabb::new(buried.min + normal * depth, buried.max + normal * depth);
        assert!(solid.overlap(&moved).y <= 1e-5);
    }
}
