//! A single vine branch: its anchors and the geometry derived from them.

use crate::{
    anchor::AnchorPoint,
    config::Config,
    curve::{BezierCurve, CurveBuilder, VertexPath, build_path},
    growth::find_next_anchor,
    mesh::RibbonMesh,
    raycast::RayCaster,
    scatter::{Placement, scatter},
};
use glam::Vec3;
use rand::Rng;

/// Anchors grown across a surface plus the curve, ribbon and leaves built
/// on top of them.
///
/// `anchors` is never empty and never longer than `max_anchor_count`.
/// `path` is `None` while there are fewer than two anchors, and `mesh` is
/// `None` whenever `path` is.
#[derive(Clone, Debug)]
pub struct Branch {
    pub anchors: Vec<AnchorPoint>,
    pub max_anchor_count: usize,
    /// Direction samples per growth step.
    pub max_search_retries: usize,
    /// Spacing of the surface-following probes.
    pub ray_step: f32,
    pub path: Option<VertexPath>,
    pub mesh: Option<RibbonMesh>,
    pub placements: Vec<Placement>,
}

impl Branch {
    /// Seeds a branch with a single root anchor.
    pub fn new(origin: Vec3, normal: Vec3, cfg: &Config) -> Self {
        Self {
            anchors: vec![AnchorPoint::new(origin, normal, cfg.branch_thickness)],
            max_anchor_count: cfg.max_anchor_count,
            max_search_retries: cfg.max_direction_tries,
            ray_step: cfg.ray_cast_step,
            path: None,
            mesh: None,
            placements: Vec::new(),
        }
    }

    #[inline]
    pub fn tip(&self) -> &AnchorPoint {
        // `anchors` is seeded in `new` and only ever appended to.
        &self.anchors[self.anchors.len() - 1]
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.anchors.len() >= self.max_anchor_count
    }

    /// Grows the branch until it is full or the search finds no surface,
    /// then rebuilds its geometry and scatters leaves.
    ///
    /// ### Parameters
    /// - `caster` - Ray oracle for the scene.
    /// - `rng` - Random source for direction proposals and leaf jitter.
    /// - `cfg` - Probe, mesh and scatter parameters. The anchor bound, retry
    ///   count and probe step come from the branch itself.
    ///
    /// ### Returns
    /// Number of anchors added by this call.
    pub fn grow<C: RayCaster + ?Sized>(
        &mut self,
        caster: &C,
        rng: &mut impl Rng,
        cfg: &Config,
    ) -> usize {
        let search = Config {
            max_direction_tries: self.max_search_retries,
            ray_cast_step: self.ray_step,
            ..*cfg
        };

        let before = self.anchors.len();
        while !self.is_full() {
            let n = self.anchors.len();
            let previous = n.checked_sub(2).map(|i| &self.anchors[i]);
            let Some(next) = find_next_anchor(previous, self.tip(), caster, rng, &search)
            else {
                tracing::debug!(
                    anchors = n,
                    max = self.max_anchor_count,
                    tip = ?self.tip().origin,
                    "branch stopped: no surface found"
                );
                break;
            };
            self.anchors.push(next);
        }

        self.rebuild(cfg);
        self.scatter_leaves(cfg, rng);
        self.anchors.len() - before
    }

    /// Rebuilds the curve and ribbon from the current anchors without
    /// growing. Call after changing the width or thickness.
    pub fn rebuild(&mut self, cfg: &Config) {
        let builder = BezierCurve::with_samples(cfg.curve_samples_per_segment);
        self.rebuild_with(&builder, cfg);
    }

    /// Like [`Branch::rebuild`], with a caller supplied curve builder.
    pub fn rebuild_with<B: CurveBuilder + ?Sized>(&mut self, builder: &B, cfg: &Config) {
        self.path = build_path(builder, &self.anchors);

        let Some(path) = &self.path else {
            self.mesh = None;
            self.placements.clear();
            return;
        };

        self.mesh
            .get_or_insert_with(RibbonMesh::default)
            .rebuild(path, cfg.branch_width, cfg.branch_thickness);
    }

    /// Replaces the leaf placements with a fresh scatter along the path.
    pub fn scatter_leaves(&mut self, cfg: &Config, rng: &mut impl Rng) {
        self.placements = match &self.path {
            Some(path) => scatter(path, cfg, rng),
            None => Vec::new(),
        };
    }
}
