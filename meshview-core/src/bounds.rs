//! Bounding volumes used for framing and sizing

use crate::{mesh::TriangleMesh, point::*};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Point3f,
    pub max: Point3f,
}

impl Aabb {
    pub fn new(min: Point3f, max: Point3f) -> Self {
        Self { min, max }
    }

    /// Bounds of a point set, `None` when the set is empty
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3f>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut min = first;
        let mut max = first;

        for p in iter {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);

            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }

        Some(Self { min, max })
    }

    /// Extent along each axis
    pub fn size(&self) -> Vector3f {
        self.max - self.min
    }

    /// Center of the box
    pub fn center(&self) -> Point3f {
        nalgebra::center(&self.min, &self.max)
    }

    /// Largest extent of the three axes
    pub fn max_dimension(&self) -> f32 {
        self.size().max()
    }

    /// Smallest box containing both
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// The eight corners, bottom face first
    pub fn corners(&self) -> [Point3f; 8] {
        let (a, b) = (self.min, self.max);
        [
            Point3f::new(a.x, a.y, a.z),
            Point3f::new(b.x, a.y, a.z),
            Point3f::new(b.x, a.y, b.z),
            Point3f::new(a.x, a.y, b.z),
            Point3f::new(a.x, b.y, a.z),
            Point3f::new(b.x, b.y, a.z),
            Point3f::new(b.x, b.y, b.z),
            Point3f::new(a.x, b.y, b.z),
        ]
    }

    /// The twelve box edges as line segments
    pub fn edges(&self) -> Vec<[Point3f; 2]> {
        const EDGES: [[usize; 2]; 12] = [
            [0, 1], [1, 2], [2, 3], [3, 0],
            [4, 5], [5, 6], [6, 7], [7, 4],
            [0, 4], [1, 5], [2, 6], [3, 7],
        ];
        let c = self.corners();
        EDGES.iter().map(|&[i, j]| [c[i], c[j]]).collect()
    }
}

/// Sphere enclosing a point set
///
/// Centered on the bounding-box center with the radius reaching the farthest
/// point, which is what camera framing relies on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingSphere {
    pub center: Point3f,
    pub radius: f32,
}

impl BoundingSphere {
    pub fn from_points(points: &[Point3f]) -> Option<Self> {
        let center = Aabb::from_points(points)?.center();
        let radius_sq = points
            .iter()
            .map(|p| (p - center).norm_squared())
            .fold(0.0_f32, f32::max);
        Some(Self {
            center,
            radius: radius_sq.sqrt(),
        })
    }
}

/// Objects that occupy a region of space
pub trait Bounded {
    /// Axis-aligned bounds, `None` when the object has no geometry
    fn aabb(&self) -> Option<Aabb>;

    /// Center of the bounds
    fn center(&self) -> Option<Point3f> {
        self.aabb().map(|b| b.center())
    }
}

impl Bounded for TriangleMesh {
    fn aabb(&self) -> Option<Aabb> {
        Aabb::from_points(&self.vertices)
    }
}

impl Bounded for [Point3f] {
    fn aabb(&self) -> Option<Aabb> {
        Aabb::from_points(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_points_have_no_bounds() {
        let pts: Vec<Point3f> = Vec::new();
        assert!(Aabb::from_points(&pts).is_none());
        assert!(BoundingSphere::from_points(&pts).is_none());
    }

    #[test]
    fn test_aabb_size_and_center() {
        let pts = vec![Point3f::new(-1.0, 0.0, 2.0), Point3f::new(3.0, 4.0, 6.0)];
        let b = Aabb::from_points(&pts).unwrap();
        assert_eq!(b.size(), Vector3f::new(4.0, 4.0, 4.0));
        assert_eq!(b.center(), Point3f::new(1.0, 2.0, 4.0));
        assert_relative_eq!(b.max_dimension(), 4.0);
    }

    #[test]
    fn test_box_edges() {
        let b = Aabb::new(Point3f::origin(), Point3f::new(1.0, 2.0, 3.0));
        let edges = b.edges();
        assert_eq!(edges.len(), 12);
        let total: f32 = edges.iter().map(|[a, c]| (c - a).norm()).sum();
        assert_relative_eq!(total, 4.0 * (1.0 + 2.0 + 3.0), epsilon = 1e-5);
    }

    #[test]
    fn test_bounding_sphere_radius() {
        let pts = vec![
            Point3f::new(-1.0, -1.0, -1.0),
            Point3f::new(1.0, 1.0, 1.0),
            Point3f::new(0.0, 0.0, 0.0),
        ];
        let s = BoundingSphere::from_points(&pts).unwrap();
        assert_eq!(s.center, Point3f::origin());
        assert_relative_eq!(s.radius, 3.0_f32.sqrt(), epsilon = 1e-6);
    }
}
