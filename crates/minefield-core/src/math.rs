//! Vector math used by targeting and detonation.
//!
//! Positions are plain [`glam::Vec3`] values. All range comparisons in the
//! crate are done on squared distances so no square root is taken on the hot
//! path; [`distance`] exists for reporting only.

pub use glam::Vec3;

/// Dot product of two vectors.
#[must_use]
#[inline]
pub fn dot(a: Vec3, b: Vec3) -> f32 {
    a.dot(b)
}

/// Squared distance between two points.
///
/// Symmetric in its arguments: `sqr_distance(a, b) == sqr_distance(b, a)`.
#[must_use]
#[inline]
pub fn sqr_distance(a: Vec3, b: Vec3) -> f32 {
    let delta = a - b;
    dot(delta, delta)
}

/// Euclidean distance between two points.
#[must_use]
#[inline]
pub fn distance(a: Vec3, b: Vec3) -> f32 {
    sqr_distance(a, b).sqrt()
}

/// Inverse-square falloff damage.
///
/// `factor = 1 - sqr_distance / radius_sq`, `damage = factor² * yield`.
///
/// The result is not clamped. A point exactly on the rim takes zero damage and
/// a point beyond the rim takes a positive amount again (the factor goes
/// negative and is squared), so callers that care about range must check it
/// themselves before calling.
#[must_use]
#[inline]
pub fn falloff_damage(sqr_distance: f32, radius_sq: f32, explosive_yield: f32) -> f32 {
    let factor = 1.0 - (sqr_distance / radius_sq);
    (factor * factor) * explosive_yield
}
