//! Owning container for every tree planted in a scene.

use crate::{
    config::{Config, ConfigError},
    raycast::{RayCaster, RayHit},
    tree::Tree,
    types::TreeId,
};
use glam::Vec3;
use rand::Rng;

/// Plants, redraws and clears vine trees with one shared, validated config.
#[derive(Clone, Debug)]
pub struct Planter {
    config: Config,
    trees: Vec<Tree>,
}

impl Planter {
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            trees: Vec::new(),
        })
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Replaces the config if it validates. Existing trees keep their
    /// geometry until the next [`Planter::redraw`].
    pub fn set_config(&mut self, config: Config) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Creates a tree rooted at `hit` and grows it to completion.
    pub fn plant<C: RayCaster + ?Sized>(
        &mut self,
        hit: &RayHit,
        caster: &C,
        rng: &mut impl Rng,
    ) -> &Tree {
        let mut tree = Tree::seeded(hit.point, hit.normal, &self.config);
        let added = tree.grow(caster, rng, &self.config);

        let id: TreeId = self.trees.len();
        tracing::debug!(
            id,
            point = ?hit.point,
            anchors_added = added,
            leaves = tree.leaf_count(),
            "planted tree"
        );
        self.trees.push(tree);
        &self.trees[id]
    }

    /// Casts an unbounded ray and plants a tree where it lands.
    ///
    /// Returns `None` when the ray hits nothing (or `direction` is zero).
    pub fn plant_from_ray<C: RayCaster + ?Sized>(
        &mut self,
        origin: Vec3,
        direction: Vec3,
        caster: &C,
        rng: &mut impl Rng,
    ) -> Option<&Tree> {
        let direction = direction.try_normalize()?;
        let hit = caster.cast(origin, direction, f32::INFINITY)?;
        Some(self.plant(&hit, caster, rng))
    }

    /// Rebuilds every tree's geometry with the current config.
    pub fn redraw(&mut self) {
        for tree in &mut self.trees {
            tree.rebuild(&self.config);
        }
    }

    pub fn clear(&mut self) {
        self.trees.clear();
    }

    #[inline]
    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    #[inline]
    pub fn tree(&self, id: TreeId) -> Option<&Tree> {
        self.trees.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raycast::{Collider, Scene};
    use rand::{SeedableRng, rngs::StdRng};

    fn floor() -> Scene {
        Scene::new().with(Collider::plane(Vec3::ZERO, Vec3::Y))
    }

    fn small_config() -> Config {
        let mut cfg = Config::default();
        cfg.branch_count = 2;
        cfg.max_anchor_count = 6;
        cfg
    }

    #[test]
    fn new_rejects_invalid_config() {
        let mut cfg = Config::default();
        cfg.leaf_step = 0.0;
        assert!(Planter::new(cfg).is_err());
    }

    #[test]
    fn plant_grows_a_tree_at_the_hit() {
        let scene = floor();
        let mut planter = Planter::new(small_config()).unwrap();
        let hit = RayHit {
            point: Vec3::new(3.0, 0.0, -2.0),
            normal: Vec3::Y,
            distance: 1.0,
        };

        let tree = planter.plant(&hit, &scene, &mut StdRng::seed_from_u64(1));
        assert_eq!(tree.origin, hit.point);
        assert_eq!(tree.branches.len(), 2);
        assert_eq!(tree.anchor_count(), 2 * 6);
        assert_eq!(planter.trees().len(), 1);
    }

    #[test]
    fn plant_from_ray_lands_on_the_floor() {
        let scene = floor();
        let mut planter = Planter::new(small_config()).unwrap();
        let mut rng = StdRng::seed_from_u64(2);

        let tree = planter
            .plant_from_ray(Vec3::new(1.0, 50.0, 1.0), Vec3::NEG_Y, &scene, &mut rng)
            .expect("ray should reach the floor");
        assert!(tree.origin.abs_diff_eq(Vec3::new(1.0, 0.0, 1.0), 1e-5));

        // Far beyond any probe distance, still a hit.
        assert!(
            planter
                .plant_from_ray(Vec3::new(0.0, 1e4, 0.0), Vec3::NEG_Y, &scene, &mut rng)
                .is_some()
        );
        assert_eq!(planter.trees().len(), 2);
    }

    #[test]
    fn plant_from_ray_missing_everything_plants_nothing() {
        let scene = floor();
        let mut planter = Planter::new(small_config()).unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        assert!(
            planter
                .plant_from_ray(Vec3::new(0.0, 5.0, 0.0), Vec3::Y, &scene, &mut rng)
                .is_none()
        );
        assert!(
            planter
                .plant_from_ray(Vec3::new(0.0, 5.0, 0.0), Vec3::ZERO, &scene, &mut rng)
                .is_none()
        );
        assert!(planter.trees().is_empty());
    }

    #[test]
    fn set_config_validates_and_redraw_applies_it() {
        let scene = floor();
        let mut planter = Planter::new(small_config()).unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        planter.plant_from_ray(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y, &scene, &mut rng);
        let anchors = planter.trees()[0].branches[0].anchors.clone();

        let mut bad = *planter.config();
        bad.branch_width = -1.0;
        assert!(planter.set_config(bad).is_err());
        assert_eq!(planter.config().branch_width, small_config().branch_width);

        let mut wide = *planter.config();
        wide.branch_width = 2.0;
        planter.set_config(wide).unwrap();
        planter.redraw();

        let branch = &planter.tree(0).unwrap().branches[0];
        assert_eq!(branch.anchors, anchors);
        let mesh = branch.mesh.as_ref().unwrap();
        assert!((mesh.vertices[0].distance(mesh.vertices[1]) - 4.0).abs() < 1e-4);
    }

    #[test]
    fn clear_drops_every_tree() {
        let scene = floor();
        let mut planter = Planter::new(small_config()).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        for x in 0..3 {
            planter.plant_from_ray(Vec3::new(x as f32, 5.0, 0.0), Vec3::NEG_Y, &scene, &mut rng);
        }
        assert_eq!(planter.trees().len(), 3);

        planter.clear();
        assert!(planter.trees().is_empty());
        assert!(planter.tree(0).is_none());
    }
}
