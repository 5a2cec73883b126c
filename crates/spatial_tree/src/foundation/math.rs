//! Math utilities and types
//!
//! Thin aliases over `nalgebra` so the trees can be written once for any
//! dimension and still read naturally for the 2D and 3D cases.

pub use nalgebra::{SVector, Vector2, Vector3, Matrix4};

/// Vector of `D` single-precision components
pub type VecN<const D: usize> = SVector<f32, D>;

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Returns `true` if every component of `v` is finite
pub fn is_finite<const D: usize>(v: &VecN<D>) -> bool {
    v.iter().all(|c| c.is_finite())
}
