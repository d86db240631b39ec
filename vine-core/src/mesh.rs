//! Ribbon mesh synthesis.
//!
//! A ribbon is a flat strip of fixed width and thickness following a
//! [`VertexPath`]. Every path sample contributes eight vertices:
//!
//! ```text
//!   0 ---- 1      top rail (normals +up)
//!   |      |
//!   2 ---- 3      bottom rail (normals -up)
//!   4..7          copies of 0..3 with sideways normals, so the side
//!                 walls shade flat instead of rounding into top/bottom
//! ```
//!
//! The three shells (top, bottom, sides) share the vertex buffer and are
//! kept as separate index groups, ready for one material each.

use crate::{curve::VertexPath, raycast::Aabb};
use glam::{Vec2, Vec3};

/// Vertices emitted per path sample.
pub const VERTS_PER_SAMPLE: usize = 8;

/// Top shell quad between sample `i` (0, 1) and sample `i + 1` (8, 9).
const TOP_MAP: [usize; 6] = [0, 8, 1, 1, 8, 9];

/// Side walls: left (4, 6, 12, 14) and right (5, 7, 13, 15).
const SIDE_MAP: [usize; 12] = [4, 6, 14, 12, 4, 14, 5, 15, 7, 13, 15, 5];

/// Vertex/index buffers of a three-shell ribbon.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RibbonMesh {
    pub vertices: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    /// Top shell, visible from above.
    pub top: Vec<u32>,
    /// Bottom shell, wound the other way so it is visible from below.
    pub bottom: Vec<u32>,
    pub sides: Vec<u32>,
    /// Bounds of `vertices`; `None` while the mesh is empty.
    pub bounds: Option<Aabb>,
}

impl RibbonMesh {
    pub fn from_path(path: &VertexPath, half_width: f32, thickness: f32) -> Self {
        let mut mesh = Self::default();
        mesh.rebuild(path, half_width, thickness);
        mesh
    }

    /// Clears every buffer and regenerates the ribbon from `path`.
    ///
    /// Existing allocations are reused; nothing of the previous geometry
    /// survives.
    ///
    /// ### Parameters
    /// - `path` - Sampled curve; its lateral `normal` spreads the ribbon and
    ///   `tangent × normal` lifts it.
    /// - `half_width` - Distance of each rail from the curve (sign ignored).
    /// - `thickness` - Depth of the bottom rail below the top one.
    pub fn rebuild(&mut self, path: &VertexPath, half_width: f32, thickness: f32) {
        self.clear();

        let n = path.num_points();
        let vert_count = n * VERTS_PER_SAMPLE;
        let quads = if path.is_closed() { n } else { n.saturating_sub(1) };
        let half_width = half_width.abs();

        self.vertices.reserve(vert_count);
        self.normals.reserve(vert_count);
        self.uvs.reserve(vert_count);
        self.top.reserve(quads * TOP_MAP.len());
        self.bottom.reserve(quads * TOP_MAP.len());
        self.sides.reserve(quads * SIDE_MAP.len());

        for i in 0..n {
            let local_up = path.tangent(i).cross(path.normal(i));
            let local_right = path.normal(i);

            let side_a = path.point(i) - local_right * half_width;
            let side_b = path.point(i) + local_right * half_width;
            let drop = local_up * thickness;
            let rail = [side_a, side_b, side_a - drop, side_b - drop];

            self.vertices.extend_from_slice(&rail);
            self.vertices.extend_from_slice(&rail);

            self.normals.extend_from_slice(&[
                local_up,
                local_up,
                -local_up,
                -local_up,
                -local_right,
                local_right,
                -local_right,
                local_right,
            ]);

            let v = path.time(i);
            self.uvs
                .extend((0..VERTS_PER_SAMPLE).map(|k| Vec2::new((k % 2) as f32, v)));

            if i < quads {
                let base = i * VERTS_PER_SAMPLE;
                let wrap = |offset: usize| ((base + offset) % vert_count) as u32;

                self.top.extend(TOP_MAP.iter().map(|&o| wrap(o)));
                // Reversed winding, shifted onto the bottom rail.
                self.bottom.extend(TOP_MAP.iter().rev().map(|&o| wrap(o + 2)));
                self.sides.extend(SIDE_MAP.iter().map(|&o| wrap(o)));
            }
        }

        self.bounds = Aabb::from_points(self.vertices.iter().copied());
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.normals.clear();
        self.uvs.clear();
        self.top.clear();
        self.bottom.clear();
        self.sides.clear();
        self.bounds = None;
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Triangles across all three shells.
    pub fn triangle_count(&self) -> usize {
        (self.top.len() + self.bottom.len() + self.sides.len()) / 3
    }

    /// The three index groups in submesh order: top, bottom, sides.
    pub fn shells(&self) -> [&[u32]; 3] {
        [&self.top, &self.bottom, &self.sides]
    }
}
