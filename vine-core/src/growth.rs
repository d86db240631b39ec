//! Growth search: proposes the next anchor of a branch by probing the scene.
//!
//! One search step runs in two stages:
//! 1. [`propose_direction`] picks a random heading in the tangent plane of
//!    the last anchor, biased to keep going roughly forward.
//! 2. [`probe_surface`] fires a fixed sequence of rays along that heading
//!    and accepts the first hit:
//!    - [`ProbeKind::Direct`]: straight ahead from the lifted anchor; the
//!      branch runs into a wall.
//!    - [`ProbeKind::SurfaceFollow`]: a scan of rays cast back down at the
//!      surface at increasing distances; the farthest hit before the surface
//!      ends wins, which follows floors and gently curving walls.
//!    - [`ProbeKind::CornerWrap`]: one ray from below the surface back
//!      towards the anchor, catching the face around an edge the branch
//!      just walked off.
//!
//! [`find_next_anchor`] glues both stages together.

use crate::{
    anchor::AnchorPoint,
    config::Config,
    raycast::{RayCaster, RayHit},
};
use glam::Vec3;
use rand::Rng;
use std::f32::consts::TAU;

/// Which probe of the search accepted a hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProbeKind {
    Direct,
    SurfaceFollow,
    CornerWrap,
}

/// A hit accepted by [`probe_surface`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProbeHit {
    pub kind: ProbeKind,
    pub hit: RayHit,
}

/// Uniformly random unit vector perpendicular to `normal`.
///
/// Falls back to a uniformly random unit vector on the sphere when `normal`
/// is degenerate, since there is no tangent plane to sample from.
pub fn random_tangent(normal: Vec3, rng: &mut impl Rng) -> Vec3 {
    let Some(n) = normal.try_normalize() else {
        let z: f32 = rng.random_range(-1.0..=1.0);
        let phi: f32 = rng.random_range(0.0..TAU);
        let r = (1.0 - z * z).max(0.0).sqrt();
        return Vec3::new(r * phi.cos(), r * phi.sin(), z);
    };

    let (b1, b2) = n.any_orthonormal_pair();
    let theta: f32 = rng.random_range(0.0..TAU);
    b1 * theta.cos() + b2 * theta.sin()
}

/// Picks the heading of the next growth step.
///
/// With no `previous` anchor any tangent direction will do. Otherwise the
/// current heading is the step `previous -> last` flattened onto the
/// tangent plane of `last`, and up to `cfg.max_direction_tries` random
/// tangents are drawn until one is within `cfg.min_forward_dot` of it. If
/// none qualifies, the last draw is used anyway: this never fails.
///
/// ### Parameters
/// - `previous` - The anchor before `last`, if the branch has one.
/// - `last` - The anchor the branch grows from.
/// - `cfg` - Supplies the retry budget and the forward bias threshold.
/// - `rng` - Random source; inject a seeded one for reproducible growth.
///
/// ### Returns
/// A unit vector (tangent to `last` whenever `last` has a normal).
pub fn propose_direction(
    previous: Option<&AnchorPoint>,
    last: &AnchorPoint,
    cfg: &Config,
    rng: &mut impl Rng,
) -> Vec3 {
    let forward = previous.and_then(|prev| {
        let step = last.origin - prev.origin;
        let flat = if last.has_normal() {
            step.reject_from_normalized(last.normal)
        } else {
            step
        };
        flat.try_normalize()
    });

    let mut candidate = random_tangent(last.normal, rng);
    let Some(forward) = forward else {
        return candidate;
    };

    for _ in 1..cfg.max_direction_tries {
        if candidate.dot(forward) >= cfg.min_forward_dot {
            break;
        }
        candidate = random_tangent(last.normal, rng);
    }
    candidate
}

/// Runs the fixed probe sequence from `last` along `direction`.
///
/// This is the deterministic half of a search step; given the same scene it
/// always accepts the same hit.
///
/// ### Parameters
/// - `last` - The anchor the branch grows from.
/// - `direction` - Unit heading, usually from [`propose_direction`].
/// - `caster` - Ray oracle for the scene.
/// - `cfg` - Supplies `probe_distance` and `ray_cast_step`.
///
/// ### Returns
/// The accepted hit and the probe that produced it, or `None` if every
/// probe missed.
pub fn probe_surface<C: RayCaster + ?Sized>(
    last: &AnchorPoint,
    direction: Vec3,
    caster: &C,
    cfg: &Config,
) -> Option<ProbeHit> {
    let reach = cfg.probe_distance;
    let start = last.offset_target;

    if let Some(hit) = caster.cast(start, direction, reach) {
        return Some(ProbeHit {
            kind: ProbeKind::Direct,
            hit,
        });
    }

    // Scan forward until the surface below stops answering; the last answer
    // is the farthest point still on the same surface.
    let down = -last.normal;
    let scans = (reach / cfg.ray_cast_step + 1e-4).floor() as usize;
    let followed = (1..=scans)
        .map(|k| k as f32 * cfg.ray_cast_step)
        .map_while(|distance| caster.cast(start + direction * distance, down, reach))
        .last();
    if let Some(hit) = followed {
        return Some(ProbeHit {
            kind: ProbeKind::SurfaceFollow,
            hit,
        });
    }

    let under = start + direction - 2.0 * last.normal;
    caster
        .cast(under, -direction, reach)
        .map(|hit| ProbeHit {
            kind: ProbeKind::CornerWrap,
            hit,
        })
}

/// Proposes and validates the next anchor of a branch.
///
/// ### Parameters
/// - `previous` - The anchor before `last`, if any.
/// - `last` - The current tip of the branch.
/// - `caster` - Ray oracle for the scene.
/// - `rng` - Random source for the direction proposal.
/// - `cfg` - Growth parameters; `branch_thickness` lifts the new anchor.
///
/// ### Returns
/// The new anchor, or `None` when no probe found a surface. `None` is the
/// normal way for a branch to stop growing, not an error.
pub fn find_next_anchor<C: RayCaster + ?Sized>(
    previous: Option<&AnchorPoint>,
    last: &AnchorPoint,
    caster: &C,
    rng: &mut impl Rng,
    cfg: &Config,
) -> Option<AnchorPoint> {
    let direction = propose_direction(previous, last, cfg, rng);
    let accepted = probe_surface(last, direction, caster, cfg)?;

    tracing::trace!(
        kind = ?accepted.kind,
        point = ?accepted.hit.point,
        "accepted growth probe"
    );
    Some(AnchorPoint::from_hit(&accepted.hit, cfg.branch_thickness))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raycast::{Aabb, Collider, Scene};
    use rand::{SeedableRng, rngs::StdRng};

    fn floor() -> Scene {
        Scene::new().with(Collider::plane(Vec3::ZERO, Vec3::Y))
    }

    /// Scene that records every ray it is asked to cast.
    struct Recorder<'a> {
        inner: &'a Scene,
        rays: std::cell::RefCell<Vec<(Vec3, Vec3, f32)>>,
    }

    impl RayCaster for Recorder<'_> {
        fn cast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
            self.rays.borrow_mut().push((origin, direction, max_distance));
            self.inner.cast(origin, direction, max_distance)
        }
    }

    #[test]
    fn random_tangent_is_unit_and_in_plane() {
        let mut rng = StdRng::seed_from_u64(1);
        let normals = [Vec3::Y, Vec3::X, Vec3::new(1.0, 2.0, -3.0)];

        for n in normals {
            for _ in 0..100 {
                let d = random_tangent(n, &mut rng);
                assert!((d.length() - 1.0).abs() < 1e-5);
                assert!(d.dot(n.normalize()).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn random_tangent_with_degenerate_normal_is_still_unit() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..100 {
            let d = random_tangent(Vec3::ZERO, &mut rng);
            assert!((d.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn proposed_direction_prefers_forward() {
        let cfg = Config::default();
        let mut rng = StdRng::seed_from_u64(3);
        let prev = AnchorPoint::new(Vec3::ZERO, Vec3::Y, cfg.branch_thickness);
        let last = AnchorPoint::new(Vec3::new(1.0, 0.0, 0.0), Vec3::Y, cfg.branch_thickness);

        for _ in 0..200 {
            let d = propose_direction(Some(&prev), &last, &cfg, &mut rng);
            // With 40 tries the chance of never landing in the +/-60 degree
            // cone is (2/3)^40, so every proposal should be forward here.
            assert!(d.dot(Vec3::X) >= cfg.min_forward_dot);
            assert!(d.y.abs() < 1e-6);
        }
    }

    #[test]
    fn single_try_budget_accepts_first_sample() {
        let mut cfg = Config::default();
        cfg.max_direction_tries = 1;
        cfg.min_forward_dot = 1.0;

        let prev = AnchorPoint::new(Vec3::ZERO, Vec3::Y, 0.1);
        let last = AnchorPoint::new(Vec3::X, Vec3::Y, 0.1);

        let mut a = StdRng::seed_from_u64(9);
        let mut b = StdRng::seed_from_u64(9);
        let proposed = propose_direction(Some(&prev), &last, &cfg, &mut a);
        assert_eq!(proposed, random_tangent(Vec3::Y, &mut b));
    }

    #[test]
    fn primary_probe_hits_a_wall_ahead() {
        // Floor plus a wall at x = 0 facing +x.
        let scene = floor().with(Collider::plane(Vec3::ZERO, Vec3::X));
        let cfg = Config::default();
        let last = AnchorPoint::new(Vec3::new(1.5, 0.0, 0.0), Vec3::Y, cfg.branch_thickness);

        let accepted = probe_surface(&last, Vec3::NEG_X, &scene, &cfg).unwrap();
        assert_eq!(accepted.kind, ProbeKind::Direct);
        assert_eq!(accepted.hit.normal, Vec3::X);
        assert!(accepted.hit.point.abs_diff_eq(Vec3::new(0.0, 1.0, 0.0), 1e-6));
    }

    #[test]
    fn surface_follow_walks_down_a_wall() {
        // Anchor high on the wall, heading down: the floor is out of reach
        // of the primary probe, so the scan along the wall takes over.
        let scene = floor().with(Collider::plane(Vec3::ZERO, Vec3::X));
        let cfg = Config::default();
        let last = AnchorPoint::new(Vec3::new(0.0, 3.0, 0.0), Vec3::X, cfg.branch_thickness);

        let accepted = probe_surface(&last, Vec3::NEG_Y, &scene, &cfg).unwrap();
        assert_eq!(accepted.kind, ProbeKind::SurfaceFollow);
        assert_eq!(accepted.hit.normal, Vec3::X);
        assert!(accepted.hit.point.abs_diff_eq(Vec3::new(0.0, 1.0, 0.0), 1e-5));
    }

    #[test]
    fn surface_follow_stops_at_the_edge() {
        let scene = Scene::new().with(Collider::Box(Aabb::new(
            Vec3::splat(-1.0),
            Vec3::splat(1.0),
        )));
        let cfg = Config::default();
        let last = AnchorPoint::new(Vec3::new(0.5, 1.0, 0.0), Vec3::Y, cfg.branch_thickness);

        let accepted = probe_surface(&last, Vec3::X, &scene, &cfg).unwrap();
        assert_eq!(accepted.kind, ProbeKind::SurfaceFollow);
        // Probes at x = 0.7 and 0.9 land on the top face; x = 1.1 misses.
        assert!(accepted.hit.point.abs_diff_eq(Vec3::new(0.9, 1.0, 0.0), 1e-5));
        assert_eq!(accepted.hit.normal, Vec3::Y);
    }

    #[test]
    fn surface_follow_scan_stops_after_first_miss() {
        let scene = Scene::new().with(Collider::Box(Aabb::new(
            Vec3::splat(-1.0),
            Vec3::splat(1.0),
        )));
        let recorder = Recorder {
            inner: &scene,
            rays: Default::default(),
        };
        let cfg = Config::default();
        let last = AnchorPoint::new(Vec3::new(0.5, 1.0, 0.0), Vec3::Y, cfg.branch_thickness);

        probe_surface(&last, Vec3::X, &recorder, &cfg).unwrap();

        // One primary probe, then scans at 0.2, 0.4 (hits) and 0.6 (miss).
        assert_eq!(recorder.rays.borrow().len(), 4);
    }

    #[test]
    fn corner_wrap_catches_the_face_below_an_edge() {
        let scene = Scene::new().with(Collider::Box(Aabb::new(
            Vec3::splat(-1.0),
            Vec3::splat(1.0),
        )));
        let cfg = Config::default();
        // So close to the edge that the first scan already misses.
        let last = AnchorPoint::new(Vec3::new(0.95, 1.0, 0.0), Vec3::Y, cfg.branch_thickness);

        let accepted = probe_surface(&last, Vec3::X, &scene, &cfg).unwrap();
        assert_eq!(accepted.kind, ProbeKind::CornerWrap);
        assert_eq!(accepted.hit.normal, Vec3::X);
        assert!(accepted.hit.point.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn all_probes_missing_stops_growth() {
        let cfg = Config::default();
        let mut rng = StdRng::seed_from_u64(4);
        let last = AnchorPoint::new(Vec3::ZERO, Vec3::Y, cfg.branch_thickness);

        assert!(probe_surface(&last, Vec3::X, &Scene::new(), &cfg).is_none());
        assert!(find_next_anchor(None, &last, &Scene::new(), &mut rng, &cfg).is_none());
    }

    #[test]
    fn flat_floor_growth_stays_on_the_floor() {
        let scene = floor();
        let cfg = Config::default();
        let mut rng = StdRng::seed_from_u64(5);

        let mut previous: Option<AnchorPoint> = None;
        let mut last = AnchorPoint::new(Vec3::ZERO, Vec3::Y, cfg.branch_thickness);

        for _ in 0..30 {
            let next = find_next_anchor(previous.as_ref(), &last, &scene, &mut rng, &cfg)
                .expect("an infinite floor never runs out");
            assert_eq!(next.normal, Vec3::Y);
            assert!(next.origin.y.abs() < 1e-5);
            // The scan reaches the full probe distance every time.
            assert!(((next.origin - last.origin).length() - cfg.probe_distance).abs() < 1e-4);
            previous = Some(last);
            last = next;
        }
    }

    #[test]
    fn seeded_search_is_reproducible() {
        let scene = Scene::demo_room(4.0);
        let cfg = Config::default();
        let seed = AnchorPoint::new(Vec3::new(0.0, 0.0, 0.0), Vec3::Y, cfg.branch_thickness);

        let run = || {
            let mut rng = StdRng::seed_from_u64(42);
            let mut anchors = vec![seed];
            while anchors.len() < 15 {
                let last = anchors[anchors.len() - 1];
                let previous = anchors.len().checked_sub(2).map(|i| anchors[i]);
                match find_next_anchor(previous.as_ref(), &last, &scene, &mut rng, &cfg) {
                    Some(a) => anchors.push(a),
                    None => break,
                }
            }
            anchors
        };

        assert_eq!(run(), run());
    }

    /// Always yields zero bits and counts how often it was asked.
    #[derive(Default)]
    struct ZeroRng {
        draws: usize,
    }

    impl rand::RngCore for ZeroRng {
        fn next_u32(&mut self) -> u32 {
            self.draws += 1;
            0
        }

        fn next_u64(&mut self) -> u64 {
            self.draws += 1;
            0
        }

        fn fill_bytes(&mut self, dst: &mut [u8]) {
            self.draws += 1;
            dst.fill(0);
        }
    }

    #[test]
    fn search_step_draws_at_most_the_retry_budget_then_casts_a_fixed_sequence() {
        let mut cfg = Config::default();
        // Unreachable threshold: every proposal is rejected.
        cfg.min_forward_dot = 2.0;
        let prev = AnchorPoint::new(Vec3::new(0.0, 0.0, 1.0), Vec3::Y, cfg.branch_thickness);
        let last = AnchorPoint::new(Vec3::ZERO, Vec3::Y, cfg.branch_thickness);

        let draws_with = |tries: usize, scene: &Scene| {
            let cfg = Config {
                max_direction_tries: tries,
                ..cfg
            };
            let recorder = Recorder {
                inner: scene,
                rays: Default::default(),
            };
            let mut rng = ZeroRng::default();
            find_next_anchor(Some(&prev), &last, &recorder, &mut rng, &cfg);
            (rng.draws, recorder.rays.into_inner().len())
        };

        let empty = Scene::new();
        let (per_sample, rays) = draws_with(1, &empty);
        assert!(per_sample > 0);
        // Direct, first surface-follow miss, corner wrap.
        assert_eq!(rays, 3);

        let (draws, rays) = draws_with(cfg.max_direction_tries, &empty);
        assert_eq!(draws, cfg.max_direction_tries * per_sample);
        assert_eq!(rays, 3);

        // On a floor the direct ray runs parallel and misses, then the full
        // scan answers and the corner probe is never cast.
        let (_, rays) = draws_with(cfg.max_direction_tries, &floor());
        let scans = (cfg.probe_distance / cfg.ray_cast_step).round() as usize;
        assert_eq!(rays, 1 + scans);
    }
}
