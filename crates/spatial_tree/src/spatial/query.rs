//! Bounding tests used to drive tree queries

use crate::geometry::{Aabb, Frustum};

/// Shape a query is tested against, one node region at a time
///
/// Implementations must be conservative: returning `false` guarantees that
/// no point inside `region` can satisfy the query.
pub trait BoundingTest<const D: usize> {
    /// Returns `true` if `region` may overlap the query shape
    fn overlaps(&self, region: &Aabb<D>) -> bool;
}

impl<const D: usize> BoundingTest<D> for Aabb<D> {
    fn overlaps(&self, region: &Aabb<D>) -> bool {
        self.intersects(region)
    }
}

impl BoundingTest<3> for Frustum {
    fn overlaps(&self, region: &Aabb<3>) -> bool {
        self.intersects_aabb(region)
    }
}
