//! Ray-query seam between the growth search and the host scene.
//!
//! The growth search only ever asks one question: "cast a ray, what is the
//! nearest thing it hits?". Hosts answer it by implementing [`RayCaster`].
//! [`Scene`] is a small analytic implementation made of one-sided planes and
//! solid boxes, good enough for tests, benchmarks and the viewer.

use glam::Vec3;

/// Parallel-ray tolerance for the analytic colliders.
const RAY_EPSILON: f32 = 1e-6;

/// Nearest intersection reported by a [`RayCaster`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    /// World-space hit position.
    pub point: Vec3,
    /// Surface normal at `point`, facing the incoming ray.
    pub normal: Vec3,
    /// Distance from the ray origin to `point`, in units of `direction`.
    pub distance: f32,
}

/// Oracle answering nearest-hit ray queries against collidable geometry.
///
/// Implementations must return only the nearest hit within `max_distance`
/// of `origin`. `direction` is expected to be unit length; the growth search
/// always passes normalized directions.
pub trait RayCaster {
    fn cast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit>;
}

impl<T: RayCaster + ?Sized> RayCaster for &T {
    #[inline]
    fn cast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        (**self).cast(origin, direction, max_distance)
    }
}

impl<T: RayCaster + ?Sized> RayCaster for Box<T> {
    #[inline]
    fn cast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        (**self).cast(origin, direction, max_distance)
    }
}

/// Axis-aligned bounding box.
///
/// Used both as a solid collider and as the bounding volume of a
/// [`crate::mesh::RibbonMesh`].
#[derive(Clone, Copy, Debug, PartialEq)]
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

    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    /// Smallest box containing every point, or `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Some(Self { min, max })
    }

    #[inline]
    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Slab test. Rays starting inside the box report no hit, the same way
    /// engine colliders ignore their own interior.
    pub fn cast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;
        let mut normal = Vec3::ZERO;

        for axis in 0..3 {
            let o = origin[axis];
            let d = direction[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);

            if d.abs() < RAY_EPSILON {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }

            let (mut t0, mut t1) = ((lo - o) / d, (hi - o) / d);
            // Entering through the min face means the outward normal is -axis.
            let mut sign = -1.0;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
                sign = 1.0;
            }

            if t0 > t_enter {
                t_enter = t0;
                normal = Vec3::ZERO;
                normal[axis] = sign;
            }
            t_exit = t_exit.min(t1);
        }

        if t_enter > t_exit || t_enter < 0.0 || t_enter > max_distance {
            return None;
        }

        Some(RayHit {
            point: origin + direction * t_enter,
            normal,
            distance: t_enter,
        })
    }
}

/// Collidable primitive of a [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Collider {
    /// Infinite plane through `point`, visible only from the side `normal`
    /// points to.
    Plane { point: Vec3, normal: Vec3 },
    /// Solid axis-aligned box.
    Box(Aabb),
}

impl Collider {
    pub fn plane(point: Vec3, normal: Vec3) -> Self {
        Collider::Plane {
            point,
            normal: normal.normalize_or_zero(),
        }
    }

    pub fn cast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        match *self {
            Collider::Plane { point, normal } => {
                let denom = normal.dot(direction);
                // Parallel rays and rays hitting the back face pass through.
                if denom > -RAY_EPSILON {
                    return None;
                }
                let t = normal.dot(point - origin) / denom;
                if !(0.0..=max_distance).contains(&t) {
                    return None;
                }
                Some(RayHit {
                    point: origin + direction * t,
                    normal,
                    distance: t,
                })
            }
            Collider::Box(aabb) => aabb.cast(origin, direction, max_distance),
        }
    }
}

/// A set of colliders answering ray queries with the nearest hit.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub colliders: Vec<Collider>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, collider: Collider) -> Self {
        self.colliders.push(collider);
        self
    }

    /// A room corner: floor at `y = 0`, walls at `x = -half` and `z = -half`,
    /// and a crate standing on the floor.
    pub fn demo_room(half: f32) -> Self {
        Self::new()
            .with(Collider::plane(Vec3::ZERO, Vec3::Y))
            .with(Collider::Box(Aabb::new(
                Vec3::new(-half - 1.0, 0.0, -half),
                Vec3::new(-half, half, half),
            )))
            .with(Collider::Box(Aabb::new(
                Vec3::new(-half, 0.0, -half - 1.0),
                Vec3::new(half, half, -half),
            )))
            .with(Collider::Box(Aabb::from_center_half_extents(
                Vec3::new(half * 0.3, 1.0, half * 0.2),
                Vec3::splat(1.0),
            )))
    }
}

impl RayCaster for Scene {
    fn cast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        self.colliders
            .iter()
            .filter_map(|c| c.cast(origin, direction, max_distance))
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Aabb {
        Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0))
    }

    #[test]
    fn plane_is_hit_from_the_front_only() {
        let floor = Collider::plane(Vec3::ZERO, Vec3::Y);

        let hit = floor
            .cast(Vec3::new(2.0, 3.0, -1.0), Vec3::NEG_Y, 10.0)
            .expect("downward ray should hit the floor");
        assert_eq!(hit.point, Vec3::new(2.0, 0.0, -1.0));
        assert_eq!(hit.normal, Vec3::Y);
        assert_eq!(hit.distance, 3.0);

        // From below, looking up.
        assert!(floor.cast(Vec3::new(0.0, -1.0, 0.0), Vec3::Y, 10.0).is_none());
        // Parallel to the surface.
        assert!(floor.cast(Vec3::new(0.0, 1.0, 0.0), Vec3::X, 10.0).is_none());
    }

    #[test]
    fn plane_respects_max_distance() {
        let floor = Collider::plane(Vec3::ZERO, Vec3::Y);
        assert!(floor.cast(Vec3::new(0.0, 3.0, 0.0), Vec3::NEG_Y, 2.0).is_none());
        assert!(floor.cast(Vec3::new(0.0, 2.0, 0.0), Vec3::NEG_Y, 2.0).is_some());
    }

    #[test]
    fn box_reports_entry_face_normal() {
        let b = unit_box();

        let hit = b.cast(Vec3::new(-5.0, 0.0, 0.0), Vec3::X, 10.0).unwrap();
        assert_eq!(hit.point, Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(hit.normal, Vec3::NEG_X);
        assert_eq!(hit.distance, 4.0);

        let hit = b.cast(Vec3::new(0.5, 4.0, 0.0), Vec3::NEG_Y, 10.0).unwrap();
        assert_eq!(hit.normal, Vec3::Y);
        assert_eq!(hit.point, Vec3::new(0.5, 1.0, 0.0));
    }

    #[test]
    fn box_ignores_rays_starting_inside_or_missing() {
        let b = unit_box();
        assert!(b.cast(Vec3::ZERO, Vec3::X, 10.0).is_none());
        assert!(b.cast(Vec3::new(-5.0, 3.0, 0.0), Vec3::X, 10.0).is_none());
        // Box behind the ray.
        assert!(b.cast(Vec3::new(5.0, 0.0, 0.0), Vec3::X, 10.0).is_none());
        // Too short.
        assert!(b.cast(Vec3::new(-5.0, 0.0, 0.0), Vec3::X, 3.0).is_none());
    }

    #[test]
    fn scene_returns_nearest_hit() {
        let scene = Scene::new()
            .with(Collider::plane(Vec3::ZERO, Vec3::Y))
            .with(Collider::Box(Aabb::new(
                Vec3::new(-1.0, 0.0, -1.0),
                Vec3::new(1.0, 2.0, 1.0),
            )));

        let hit = scene.cast(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y, 10.0).unwrap();
        assert_eq!(hit.point, Vec3::new(0.0, 2.0, 0.0));

        let hit = scene.cast(Vec3::new(3.0, 5.0, 0.0), Vec3::NEG_Y, 10.0).unwrap();
        assert_eq!(hit.point, Vec3::new(3.0, 0.0, 0.0));

        assert!(Scene::new().cast(Vec3::ZERO, Vec3::X, 10.0).is_none());
    }

    #[test]
    fn aabb_from_points_encloses_all_points() {
        let pts = [
            Vec3::new(1.0, -2.0, 0.0),
            Vec3::new(-1.0, 4.0, 3.0),
            Vec3::new(0.0, 0.0, -5.0),
        ];
        let b = Aabb::from_points(pts).unwrap();
        assert_eq!(b.min, Vec3::new(-1.0, -2.0, -5.0));
        assert_eq!(b.max, Vec3::new(1.0, 4.0, 3.0));
        assert!(pts.iter().all(|&p| b.contains(p)));

        assert!(Aabb::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn demo_room_floor_is_reachable_from_above() {
        let room = Scene::demo_room(6.0);
        let hit = room
            .cast(Vec3::new(3.0, 10.0, 3.0), Vec3::NEG_Y, f32::INFINITY)
            .unwrap();
        assert_eq!(hit.normal, Vec3::Y);
        assert_eq!(hit.point.y, 0.0);
    }
}
