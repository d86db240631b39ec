//! Procedural vines that grow across arbitrary surfaces.
//!
//! A vine is planted at a ray hit, grows a few branches by probing the scene
//! with rays, and turns each branch into a smooth ribbon mesh dressed with
//! leaf placements.
//!
//! Main components:
//! - [`raycast`]: ray queries against a scene, and a small primitive scene.
//! - [`anchor`]: surface points a branch grows through.
//! - [`growth`]: the search for the next anchor.
//! - [`curve`]: smooth sampled paths through the anchors.
//! - [`mesh`]: three-shell ribbon geometry along a path.
//! - [`scatter`]: leaf placements along a path.
//! - [`branch`], [`tree`], [`planter`]: ownership and the grow/redraw cycle.
//! - [`config`]: parameters, validation and TOML loading.
//! - [`types`]: shared ids.

pub mod anchor;
pub mod branch;
pub mod config;
pub mod curve;
pub mod growth;
pub mod mesh;
pub mod planter;
pub mod raycast;
pub mod scatter;
pub mod tree;
pub mod types;

pub use config::{Config, ConfigError};
pub use planter::Planter;
pub use raycast::{RayCaster, RayHit, Scene};
