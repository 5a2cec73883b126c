//! Axis-aligned bounding boxes
//!
//! `Aabb<D>` is the region type every tree node carries. It is generic over
//! the dimension so the octree (`D = 3`) and quad-tree (`D = 2`) share one
//! implementation of the subdivision arithmetic.

use crate::foundation::math::VecN;

/// Axis-Aligned Bounding Box in `D` dimensions
///
/// Invariant: `min <= max` on every axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb<const D: usize> {
    /// Minimum corner of the bounding box
    pub min: VecN<D>,
    /// Maximum corner of the bounding box
    pub max: VecN<D>,
}

impl<const D: usize> Aabb<D> {
    /// Number of children a region splits into (8 for an octree, 4 for a quad-tree)
    pub const CHILD_COUNT: usize = 1 << D;

    /// Create a new AABB from min and max points
    pub fn new(min: VecN<D>, max: VecN<D>) -> Self {
        debug_assert!(
            min.iter().zip(max.iter()).all(|(lo, hi)| lo <= hi),
            "AABB min must not exceed max"
        );
        Self { min, max }
    }

    /// Create an AABB centered at a point with given half extents
    pub fn from_center_half_extents(center: VecN<D>, half_extents: VecN<D>) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Create a cube (square in 2D) of side `2 * half_size` around `center`
    pub fn cube(center: VecN<D>, half_size: f32) -> Self {
        Self::from_center_half_extents(center, VecN::<D>::from_element(half_size))
    }

    /// Get the center of the AABB
    pub fn center(&self) -> VecN<D> {
        (self.min + self.max) * 0.5
    }

    /// Get the half extents (half-size) of the AABB
    pub fn half_extents(&self) -> VecN<D> {
        (self.max - self.min) * 0.5
    }

    /// Get the full size of the AABB along each axis
    pub fn dimensions(&self) -> VecN<D> {
        self.max - self.min
    }

    /// Smallest edge length
    pub fn smallest_dimension(&self) -> f32 {
        self.dimensions().min()
    }

    /// Check if this AABB contains a point (bounds inclusive)
    pub fn contains_point(&self, point: &VecN<D>) -> bool {
        (0..D).all(|axis| point[axis] >= self.min[axis] && point[axis] <= self.max[axis])
    }

    /// Check if this AABB intersects another AABB
    ///
    /// Boxes that only touch on a face, edge or corner count as intersecting.
    pub fn intersects(&self, other: &Self) -> bool {
        (0..D).all(|axis| self.min[axis] <= other.max[axis] && self.max[axis] >= other.min[axis])
    }

    /// Grow the box around its center so every dimension is multiplied by `multiplier`
    pub fn rescale(&mut self, multiplier: f32) {
        let old_dims = self.dimensions();
        let offset = (old_dims * multiplier - old_dims) * 0.5;
        self.min -= offset;
        self.max += offset;
    }

    /// Region of the child at `index`
    ///
    /// Bit `i` of `index` selects the half along axis `i`: 0 is the negative
    /// half `[min, center]`, 1 the positive half `[center, max]`. Index 0 is
    /// the all-negative child, `CHILD_COUNT - 1` the all-positive one. The
    /// children tile the parent exactly.
    pub fn child_region(&self, index: usize) -> Self {
        debug_assert!(index < Self::CHILD_COUNT);
        let center = self.center();
        let mut min = self.min;
        let mut max = self.max;

        for axis in 0..D {
            if index & (1 << axis) != 0 {
                min[axis] = center[axis];
            } else {
                max[axis] = center[axis];
            }
        }

        Self { min, max }
    }
}
