//! Vine trees: a fixed fan-out of branches grown from one surface point.

use crate::{
    branch::Branch,
    config::{Config, ConfigError},
    raycast::RayCaster,
    types::BranchIndex,
};
use glam::Vec3;
use rand::Rng;

/// A fan of independent branches sharing one root.
#[derive(Clone, Debug)]
pub struct Tree {
    pub origin: Vec3,
    pub normal: Vec3,
    pub branches: Vec<Branch>,
}

impl Tree {
    /// Validates `cfg` and seeds `cfg.branch_count` branches at `origin`.
    pub fn new(origin: Vec3, normal: Vec3, cfg: &Config) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self::seeded(origin, normal, cfg))
    }

    /// [`Tree::new`] for a config that is already known to be valid.
    pub(crate) fn seeded(origin: Vec3, normal: Vec3, cfg: &Config) -> Self {
        let branches = (0..cfg.branch_count)
            .map(|_| Branch::new(origin, normal, cfg))
            .collect();
        Self {
            origin,
            normal,
            branches,
        }
    }

    /// Grows every branch in turn; returns the total number of anchors added.
    pub fn grow<C: RayCaster + ?Sized>(
        &mut self,
        caster: &C,
        rng: &mut impl Rng,
        cfg: &Config,
    ) -> usize {
        self.branches
            .iter_mut()
            .map(|b| b.grow(caster, rng, cfg))
            .sum()
    }

    /// Rebuilds the geometry of every branch without regrowing.
    pub fn rebuild(&mut self, cfg: &Config) {
        for branch in &mut self.branches {
            branch.rebuild(cfg);
        }
    }

    #[inline]
    pub fn branch(&self, index: BranchIndex) -> Option<&Branch> {
        self.branches.get(index)
    }

    pub fn anchor_count(&self) -> usize {
        self.branches.iter().map(|b| b.anchors.len()).sum()
    }

    pub fn leaf_count(&self) -> usize {
        self.branches.iter().map(|b| b.placements.len()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.branches
            .iter()
            .filter_map(|b| b.mesh.as_ref())
            .map(|m| m.triangle_count())
            .sum()
    }
}
