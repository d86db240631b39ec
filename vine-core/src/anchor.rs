use crate::raycast::RayHit;
use glam::Vec3;

/// A single accepted growth point of a branch.
///
/// Anchors are created once, when the growth search accepts a ray hit, and
/// never change afterwards.
///
/// ### Fields
/// - `origin` - Surface position of the hit.
/// - `normal` - Unit surface normal at the hit, or `Vec3::ZERO` when the hit
///   reported a degenerate normal.
/// - `offset_origin` - `origin + normal * thickness`; the curve runs through
///   this point so the ribbon rests on the surface instead of clipping into it.
/// - `offset_target` - `origin + normal`; the reference point the growth
///   search casts its probes from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnchorPoint {
    pub origin: Vec3,
    pub normal: Vec3,
    pub offset_origin: Vec3,
    pub offset_target: Vec3,
}

impl AnchorPoint {
    pub fn new(origin: Vec3, normal: Vec3, thickness: f32) -> Self {
        // A zero or NaN normal would poison every offset derived from it.
        let normal = normal.normalize_or_zero();
        Self {
            origin,
            normal,
            offset_origin: origin + normal * thickness,
            offset_target: origin + normal,
        }
    }

    pub fn from_hit(hit: &RayHit, thickness: f32) -> Self {
        Self::new(hit.point, hit.normal, thickness)
    }

    /// Returns `true` if the anchor carries a usable surface normal.
    #[inline]
    pub fn has_normal(&self) -> bool {
        self.normal != Vec3::ZERO
    }
}
