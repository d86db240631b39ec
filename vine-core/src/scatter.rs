//! Leaf placement along a branch path.

use crate::{config::Config, curve::VertexPath};
use glam::{Mat3, Quat, Vec3};
use rand::Rng;

/// Below this squared length a vector is treated as zero.
const DEGENERATE_EPSILON: f32 = 1e-12;

/// Where and how to instance one decorative leaf.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub position: Vec3,
    /// Maps local +Y to the surface normal and local +Z towards `aim_point`.
    pub orientation: Quat,
    pub aim_point: Vec3,
    /// Which of the `leaf_variants` interchangeable models to use.
    pub variant: usize,
}

/// Rotation whose local +Z looks along `forward` with local +Y as close to
/// `up` as possible. `None` if the two are parallel or degenerate.
pub fn look_rotation(forward: Vec3, up: Vec3) -> Option<Quat> {
    let z = forward.try_normalize()?;
    let x = up.cross(z).try_normalize()?;
    let y = z.cross(x);
    Some(Quat::from_mat3(&Mat3::from_cols(x, y, z)))
}

fn is_degenerate(v: Vec3) -> bool {
    !v.is_finite() || v.length_squared() < DEGENERATE_EPSILON
}

/// Scatters leaves along `path` every `cfg.leaf_step` of curve time.
///
/// Samples `t = 0, step, 2 * step, ...` while `t < 1 - step`, so the last
/// stretch of the path stays bare. At each sample:
/// - the leaf is lifted `cfg.leaf_lift` off the ribbon along the surface
///   normal and jittered sideways by up to a quarter of the step chord;
/// - it is turned so its up axis follows the surface normal and its
///   forward axis aims at the next sample, lifted and jittered alike.
///
/// A leaf whose next sample sits at the world origin is not aimed; it is
/// only turned so its up axis follows the surface normal.
///
/// Samples whose surface normal is NaN or zero are skipped.
///
/// ### Parameters
/// - `path` - Curve of the branch.
/// - `cfg` - Supplies `leaf_step`, `leaf_lift` and `leaf_variants`.
/// - `rng` - Random source for the jitter and variant choice.
///
/// ### Returns
/// Placements in path order.
pub fn scatter(path: &VertexPath, cfg: &Config, rng: &mut impl Rng) -> Vec<Placement> {
    let step = cfg.leaf_step;
    if !(step > 0.0 && step < 1.0) {
        return Vec::new();
    }
    let variants = cfg.leaf_variants.max(1);

    let mut placements = Vec::new();
    let mut k = 0usize;
    loop {
        let t = k as f32 * step;
        if t >= 1.0 - step {
            break;
        }
        k += 1;

        let up = path.up_at_time(t);
        if is_degenerate(up) {
            continue;
        }
        let point = path.point_at_time(t);
        let next = path.point_at_time(t + step);

        let lateral = (next - point).cross(up);
        let jitter: f32 = rng.random_range(-0.5..0.5);
        let lift = up * cfg.leaf_lift;

        let position = point + lift + lateral * jitter * 0.5;
        let aim_point = next + lift * 2.0 + lateral * jitter;

        let orientation = if next.length_squared() < DEGENERATE_EPSILON {
            Quat::from_rotation_arc(Vec3::Y, up.normalize())
        } else {
            look_rotation(aim_point - position, up)
                .unwrap_or_else(|| Quat::from_rotation_arc(Vec3::Y, up.normalize()))
        };

        placements.push(Placement {
            position,
            orientation,
            aim_point,
            variant: rng.random_range(0..variants),
        });
    }
    placements
}
