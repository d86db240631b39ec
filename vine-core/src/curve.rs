//! Smooth, sampleable paths through a branch's anchors.
//!
//! [`CurveBuilder`] is the seam to a spline library: it turns anchor
//! positions plus per-anchor orientation vectors into a [`VertexPath`], a
//! dense polyline with a moving frame and arclength-normalized times.
//! [`BezierCurve`] is the built-in builder.
//!
//! Frame convention of a [`VertexPath`] sample:
//! - `tangent` - direction of travel.
//! - `normal` - lateral axis, perpendicular to the tangent and to the
//!   anchor orientation. Ribbons are spread along it.
//! - `up` - `tangent × normal`, the anchor orientation made perpendicular
//!   to the tangent. For vines this points away from the surface.

use crate::anchor::AnchorPoint;
use glam::Vec3;

/// Samples closer than this are merged.
const MIN_SAMPLE_SPACING: f32 = 1e-5;

/// Builds a [`VertexPath`] through `points`, oriented by `orientations`.
///
/// Implementations return `None` when fewer than two points are given or
/// when the points do not describe a curve of non-zero length.
pub trait CurveBuilder {
    fn build(&self, points: &[Vec3], orientations: &[Vec3], closed: bool) -> Option<VertexPath>;
}

impl<T: CurveBuilder + ?Sized> CurveBuilder for &T {
    fn build(&self, points: &[Vec3], orientations: &[Vec3], closed: bool) -> Option<VertexPath> {
        (**self).build(points, orientations, closed)
    }
}

/// Builds the open path of a branch: through each anchor's lifted origin,
/// oriented by its surface normal.
pub fn build_path<B: CurveBuilder + ?Sized>(
    builder: &B,
    anchors: &[AnchorPoint],
) -> Option<VertexPath> {
    if anchors.len() < 2 {
        return None;
    }
    let points: Vec<Vec3> = anchors.iter().map(|a| a.offset_origin).collect();
    let orientations: Vec<Vec3> = anchors.iter().map(|a| a.normal).collect();
    builder.build(&points, &orientations, false)
}

/// Piecewise cubic Bézier with automatically placed control points.
///
/// Each interior anchor gets a tangent along the bisector of its incoming
/// and outgoing directions; open ends aim straight at their neighbour. The
/// control arms are `control_scale` times the length of their segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BezierCurve {
    pub samples_per_segment: usize,
    pub control_scale: f32,
}

impl Default for BezierCurve {
    fn default() -> Self {
        Self {
            samples_per_segment: 10,
            control_scale: 0.3,
        }
    }
}

impl BezierCurve {
    pub fn with_samples(samples_per_segment: usize) -> Self {
        Self {
            samples_per_segment,
            ..Self::default()
        }
    }

    fn anchor_tangent(points: &[Vec3], i: usize, closed: bool) -> Vec3 {
        let n = points.len();
        let prev = if i > 0 {
            Some(points[i - 1])
        } else if closed {
            Some(points[n - 1])
        } else {
            None
        };
        let next = if i + 1 < n {
            Some(points[i + 1])
        } else if closed {
            Some(points[0])
        } else {
            None
        };

        let incoming = prev.map_or(Vec3::ZERO, |p| (points[i] - p).normalize_or_zero());
        let outgoing = next.map_or(Vec3::ZERO, |p| (p - points[i]).normalize_or_zero());
        (incoming + outgoing).normalize_or(outgoing)
    }
}

fn cubic(p0: Vec3, c0: Vec3, c1: Vec3, p1: Vec3, t: f32) -> Vec3 {
    let u = 1.0 - t;
    p0 * (u * u * u) + c0 * (3.0 * u * u * t) + c1 * (3.0 * u * t * t) + p1 * (t * t * t)
}

impl CurveBuilder for BezierCurve {
    fn build(&self, points: &[Vec3], orientations: &[Vec3], closed: bool) -> Option<VertexPath> {
        let n = points.len().min(orientations.len());
        if n < 2 {
            return None;
        }
        let points = &points[..n];
        let segments = if closed { n } else { n - 1 };
        let per_segment = self.samples_per_segment.max(1);

        let tangents: Vec<Vec3> = (0..n)
            .map(|i| Self::anchor_tangent(points, i, closed))
            .collect();

        let mut samples = Vec::with_capacity(segments * per_segment + 1);
        let mut sample_orientations = Vec::with_capacity(samples.capacity());
        let mut push = |p: Vec3, o: Vec3| {
            let duplicate = samples.last().is_some_and(|last: &Vec3| {
                last.distance_squared(p) < MIN_SAMPLE_SPACING * MIN_SAMPLE_SPACING
            });
            if !duplicate {
                samples.push(p);
                sample_orientations.push(o);
            }
        };

        for seg in 0..segments {
            let (a, b) = (seg, (seg + 1) % n);
            let (p0, p1) = (points[a], points[b]);
            let arm = p0.distance(p1) * self.control_scale;
            let c0 = p0 + tangents[a] * arm;
            let c1 = p1 - tangents[b] * arm;

            for s in 0..per_segment {
                let t = s as f32 / per_segment as f32;
                let o = orientations[a].lerp(orientations[b], t);
                push(cubic(p0, c0, c1, p1, t), o);
            }
        }
        if !closed {
            push(points[n - 1], orientations[n - 1]);
        }

        VertexPath::new(samples, sample_orientations, closed)
    }
}

/// Dense polyline with a moving frame, sampleable by index or by time.
#[derive(Clone, Debug, PartialEq)]
pub struct VertexPath {
    points: Vec<Vec3>,
    tangents: Vec<Vec3>,
    normals: Vec<Vec3>,
    times: Vec<f32>,
    length: f32,
    closed: bool,
}

impl VertexPath {
    /// Derives tangents and lateral normals from orientation vectors.
    ///
    /// `orientations[i]` is the "up" wish at sample `i`; it is made
    /// perpendicular to the tangent, and the lateral normal is
    /// `up × tangent`. Where that is degenerate the previous normal is
    /// carried over, re-orthogonalized against the new tangent.
    ///
    /// ### Returns
    /// `None` if fewer than two samples are given, the slices differ in
    /// length, or the path has zero length.
    pub fn new(points: Vec<Vec3>, orientations: Vec<Vec3>, closed: bool) -> Option<Self> {
        if points.len() < 2 || points.len() != orientations.len() {
            return None;
        }

        let tangents = Self::central_tangents(&points, closed);
        let mut normals: Vec<Vec3> = Vec::with_capacity(points.len());
        for (t, o) in tangents.iter().zip(&orientations) {
            let lateral = o.cross(*t).try_normalize().or_else(|| {
                normals
                    .last()
                    .and_then(|prev| prev.reject_from_normalized(*t).try_normalize())
            });
            normals.push(lateral.unwrap_or_else(|| t.any_orthonormal_vector()));
        }

        Self::from_frames(points, tangents, normals, closed)
    }

    /// Assembles a path from precomputed frames, as an external spline
    /// library would produce them. Only times and length are derived.
    pub fn from_frames(
        points: Vec<Vec3>,
        tangents: Vec<Vec3>,
        normals: Vec<Vec3>,
        closed: bool,
    ) -> Option<Self> {
        let n = points.len();
        if n < 2 || tangents.len() != n || normals.len() != n {
            return None;
        }

        let mut cumulative = Vec::with_capacity(n);
        let mut acc = 0.0;
        cumulative.push(0.0);
        for w in points.windows(2) {
            acc += w[0].distance(w[1]);
            cumulative.push(acc);
        }
        let length = if closed {
            acc + points[n - 1].distance(points[0])
        } else {
            acc
        };
        if !(length > 0.0) {
            return None;
        }

        let times = cumulative.into_iter().map(|d| d / length).collect();
        Some(Self {
            points,
            tangents,
            normals,
            times,
            length,
            closed,
        })
    }

    fn central_tangents(points: &[Vec3], closed: bool) -> Vec<Vec3> {
        let n = points.len();
        let mut tangents: Vec<Vec3> = Vec::with_capacity(n);
        for i in 0..n {
            let prev = match (i, closed) {
                (0, true) => points[n - 1],
                (0, false) => points[0],
                _ => points[i - 1],
            };
            let next = match (i + 1 == n, closed) {
                (true, true) => points[0],
                (true, false) => points[n - 1],
                _ => points[i + 1],
            };
            let fallback = tangents.last().copied().unwrap_or(Vec3::X);
            tangents.push((next - prev).normalize_or(fallback));
        }
        tangents
    }

    #[inline]
    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Total arclength, including the closing segment of a closed path.
    #[inline]
    pub fn length(&self) -> f32 {
        self.length
    }

    #[inline]
    pub fn point(&self, i: usize) -> Vec3 {
        self.points[i]
    }

    #[inline]
    pub fn tangent(&self, i: usize) -> Vec3 {
        self.tangents[i]
    }

    #[inline]
    pub fn normal(&self, i: usize) -> Vec3 {
        self.normals[i]
    }

    #[inline]
    pub fn up(&self, i: usize) -> Vec3 {
        self.tangents[i].cross(self.normals[i])
    }

    /// Arclength-normalized time of sample `i`.
    #[inline]
    pub fn time(&self, i: usize) -> f32 {
        self.times[i]
    }

    /// Locates `t` between two samples: `(a, b, fraction)`.
    ///
    /// Open paths clamp `t` to `[0, 1]`; closed paths wrap it, with the
    /// closing segment running from the last sample back to the first.
    fn segment_at(&self, t: f32) -> (usize, usize, f32) {
        let n = self.points.len();
        let t = if self.closed {
            t.rem_euclid(1.0)
        } else {
            t.clamp(0.0, 1.0)
        };

        let after = self.times.partition_point(|&time| time <= t);
        let a = after.saturating_sub(1).min(if self.closed { n - 1 } else { n - 2 });
        let b = (a + 1) % n;
        let (ta, tb) = (self.times[a], if b == 0 { 1.0 } else { self.times[b] });
        let span = tb - ta;
        let frac = if span > 0.0 {
            ((t - ta) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        (a, b, frac)
    }

    pub fn point_at_time(&self, t: f32) -> Vec3 {
        let (a, b, f) = self.segment_at(t);
        self.points[a].lerp(self.points[b], f)
    }

    pub fn tangent_at_time(&self, t: f32) -> Vec3 {
        let (a, b, f) = self.segment_at(t);
        self.tangents[a]
            .lerp(self.tangents[b], f)
            .normalize_or(self.tangents[a])
    }

    pub fn normal_at_time(&self, t: f32) -> Vec3 {
        let (a, b, f) = self.segment_at(t);
        self.normals[a]
            .lerp(self.normals[b], f)
            .normalize_or(self.normals[a])
    }

    /// Surface-facing axis at time `t`.
    pub fn up_at_time(&self, t: f32) -> Vec3 {
        self.tangent_at_time(t).cross(self.normal_at_time(t))
    }
}
