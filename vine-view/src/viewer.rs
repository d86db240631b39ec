//! Interactive vine planter built with eframe/egui.
//!
//! [`Viewer`] owns a [`Planter`] and a primitive [`Scene`], renders both
//! through an orthographic orbit camera and plants a vine wherever the
//! scene is clicked.

use eframe::App;
use glam::Vec3;
use rand::{SeedableRng, rngs::StdRng};
use vine_core::{
    Config, ConfigError, Planter, Scene,
    raycast::{Aabb, Collider},
};

/// Half extent of the demo room the viewer plants into.
const ROOM_HALF: f32 = 8.0;

/// Distance behind the view plane that picking rays start from.
const PICK_BACKOFF: f32 = 1_000.0;

/// Orthographic camera orbiting `target`.
///
/// ### Fields
/// - `yaw` - Rotation around world +Y, in radians.
/// - `pitch` - Elevation above the horizon, in radians.
/// - `zoom` - Pixels per world unit.
/// - `pan` - Screen-space offset in pixels.
/// - `target` - World point at the center of the view.
#[derive(Clone, Copy, Debug)]
pub struct OrbitCamera {
    pub yaw: f32,
    pub pitch: f32,
    pub zoom: f32,
    pub pan: egui::Vec2,
    pub target: Vec3,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            yaw: 0.6,
            pitch: 0.6,
            zoom: 30.0,
            pan: egui::Vec2::ZERO,
            target: Vec3::ZERO,
        }
    }
}

impl OrbitCamera {
    /// `(right, up, eye)` axes; `eye` points from the target to the viewer.
    fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        let eye = Vec3::new(cp * sy, sp, cp * cy);
        let right = Vec3::new(cy, 0.0, -sy);
        (right, eye.cross(right), eye)
    }

    /// Distance towards the viewer; larger is closer.
    fn depth(&self, p: Vec3) -> f32 {
        let (_, _, eye) = self.basis();
        (p - self.target).dot(eye)
    }

    fn world_to_screen(&self, p: Vec3, rect: egui::Rect) -> egui::Pos2 {
        let (right, up, _) = self.basis();
        let d = p - self.target;
        let center = rect.center();
        egui::pos2(
            center.x + d.dot(right) * self.zoom + self.pan.x,
            center.y - d.dot(up) * self.zoom + self.pan.y,
        )
    }

    /// Ray through a screen position, starting well in front of the scene.
    ///
    /// ### Returns
    /// `(origin, direction)` with a unit `direction` looking into the screen.
    fn screen_to_ray(&self, p: egui::Pos2, rect: egui::Rect) -> (Vec3, Vec3) {
        let (right, up, eye) = self.basis();
        let center = rect.center();
        let x = (p.x - center.x - self.pan.x) / self.zoom;
        let y = (center.y - p.y + self.pan.y) / self.zoom;
        let origin = self.target + right * x + up * y + eye * PICK_BACKOFF;
        (origin, -eye)
    }

    fn orbit(&mut self, delta: egui::Vec2) {
        self.yaw -= delta.x * 0.01;
        self.pitch = (self.pitch + delta.y * 0.01).clamp(0.05, 1.5);
    }
}

fn shaded(base: [u8; 3], light: f32) -> egui::Color32 {
    let s = 0.35 + 0.65 * light.clamp(0.0, 1.0);
    let [r, g, b] = base.map(|c| (c as f32 * s) as u8);
    egui::Color32::from_rgb(r, g, b)
}

/// Main application state for the interactive viewer.
///
/// ### Fields
/// - `scene` - Ray oracle the vines grow on.
/// - `planter` - Every planted tree and the active config.
/// - `draft` - Config being edited in the side panel; applied on request.
/// - `config_error` - Why the last apply was rejected, if it was.
/// - `rng` - Seeded random source for growth and leaf jitter.
/// - `camera` - View transform.
/// - `show_leaves` / `show_anchors` - Overlay toggles.
/// - `last_planted` - Anchor count of the most recently planted tree.
pub struct Viewer {
    scene: Scene,
    planter: Planter,
    draft: Config,
    config_error: Option<String>,

    rng: StdRng,
    camera: OrbitCamera,

    show_leaves: bool,
    show_anchors: bool,
    last_planted: Option<usize>,
}

impl Viewer {
    pub fn new(config: Config, seed: u64) -> Result<Self, ConfigError> {
        Ok(Self {
            scene: Scene::demo_room(ROOM_HALF),
            planter: Planter::new(config)?,
            draft: config,
            config_error: None,
            rng: StdRng::seed_from_u64(seed),
            camera: OrbitCamera::default(),
            show_leaves: true,
            show_anchors: false,
            last_planted: None,
        })
    }

    /// Plants a tree where the screen position `p` looks at.
    fn plant_at(&mut self, p: egui::Pos2, rect: egui::Rect) -> bool {
        let (origin, direction) = self.camera.screen_to_ray(p, rect);
        let planted = self
            .planter
            .plant_from_ray(origin, direction, &self.scene, &mut self.rng)
            .map(|tree| (tree.origin, tree.anchor_count()));

        match planted {
            Some((at, anchors)) => {
                tracing::info!(at = ?at, anchors, "planted vine");
                self.last_planted = Some(anchors);
                true
            }
            None => {
                tracing::debug!("click missed the scene");
                false
            }
        }
    }

    fn redraw(&mut self) {
        self.planter.redraw();
        tracing::info!(trees = self.planter.trees().len(), "redrew vines");
    }

    fn clear(&mut self) {
        self.planter.clear();
        self.last_planted = None;
    }

    /// Pushes `draft` into the planter and redraws on success.
    fn apply_config(&mut self) {
        match self.planter.set_config(self.draft) {
            Ok(()) => {
                self.config_error = None;
                tracing::info!("applied config");
                self.redraw();
            }
            Err(err) => {
                tracing::warn!(error = %err, "rejected config");
                self.config_error = Some(err.to_string());
            }
        }
    }

    /// Helper to draw a labeled `usize` [`egui::DragValue`].
    fn labeled_drag_usize(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut usize,
        range: std::ops::RangeInclusive<usize>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Helper to draw a labeled `f32` [`egui::DragValue`].
    fn labeled_drag_f32(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f32,
        range: std::ops::RangeInclusive<f32>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Builds the top panel UI (redraw, clear, overlays, zoom).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("⟳ Redraw").clicked() {
                    self.redraw();
                }
                if ui.button("Clear").clicked() {
                    self.clear();
                }

                ui.separator();
                ui.checkbox(&mut self.show_leaves, "Leaves");
                ui.checkbox(&mut self.show_anchors, "Anchors");

                ui.separator();
                ui.add(egui::Slider::new(&mut self.camera.zoom, 5.0..=120.0).text("Zoom"));
                if ui.button("Reset view").clicked() {
                    self.camera = OrbitCamera::default();
                }
            });
        });
    }

    /// Builds the bottom status bar (tree, anchor, triangle and leaf counts).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        let trees = self.planter.trees();
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if let Some(n) = self.last_planted {
                    ui.label(format!("last planted = {n} anchors"));
                    ui.separator();
                }
                ui.label(format!(
                    "leaves = {}",
                    trees.iter().map(|t| t.leaf_count()).sum::<usize>()
                ));
                ui.label(format!(
                    "triangles = {}",
                    trees.iter().map(|t| t.triangle_count()).sum::<usize>()
                ));
                ui.label(format!(
                    "anchors = {}",
                    trees.iter().map(|t| t.anchor_count()).sum::<usize>()
                ));
                ui.label(format!("trees = {}", trees.len()));
            });
        });
    }

    /// Builds the right-hand configuration panel.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(240.0)
            .show(ctx, |ui| {
                ui.heading("Config");

                ui.separator();
                ui.label("Ribbon");
                Self::labeled_drag_f32(
                    ui,
                    "branch_thickness:",
                    &mut self.draft.branch_thickness,
                    0.01..=2.0,
                    0.005,
                );
                Self::labeled_drag_f32(
                    ui,
                    "branch_width:",
                    &mut self.draft.branch_width,
                    0.01..=5.0,
                    0.01,
                );
                Self::labeled_drag_usize(
                    ui,
                    "curve_samples:",
                    &mut self.draft.curve_samples_per_segment,
                    1..=50,
                    1.0,
                );

                ui.separator();
                ui.label("Growth");
                Self::labeled_drag_usize(
                    ui,
                    "branch_count:",
                    &mut self.draft.branch_count,
                    1..=20,
                    1.0,
                );
                Self::labeled_drag_usize(
                    ui,
                    "max_anchor_count:",
                    &mut self.draft.max_anchor_count,
                    1..=200,
                    1.0,
                );
                Self::labeled_drag_usize(
                    ui,
                    "max_direction_tries:",
                    &mut self.draft.max_direction_tries,
                    1..=200,
                    1.0,
                );
                Self::labeled_drag_f32(
                    ui,
                    "min_forward_dot:",
                    &mut self.draft.min_forward_dot,
                    -1.0..=1.0,
                    0.01,
                );

                ui.separator();
                ui.label("Probes");
                Self::labeled_drag_f32(
                    ui,
                    "ray_cast_step:",
                    &mut self.draft.ray_cast_step,
                    0.01..=2.0,
                    0.01,
                );
                Self::labeled_drag_f32(
                    ui,
                    "probe_distance:",
                    &mut self.draft.probe_distance,
                    0.1..=10.0,
                    0.05,
                );

                ui.separator();
                ui.label("Leaves");
                Self::labeled_drag_f32(
                    ui,
                    "leaf_step:",
                    &mut self.draft.leaf_step,
                    0.01..=0.99,
                    0.005,
                );
                Self::labeled_drag_f32(
                    ui,
                    "leaf_lift:",
                    &mut self.draft.leaf_lift,
                    -1.0..=1.0,
                    0.01,
                );
                Self::labeled_drag_usize(
                    ui,
                    "leaf_variants:",
                    &mut self.draft.leaf_variants,
                    1..=8,
                    1.0,
                );

                ui.separator();
                ui.label("Growth settings apply to the next planting.");
                ui.horizontal(|ui| {
                    if ui.button("Apply").clicked() {
                        self.apply_config();
                    }
                    if ui.button("Reset cfg to default").clicked() {
                        self.draft = Config::default();
                    }
                });

                if let Some(err) = &self.config_error {
                    ui.colored_label(egui::Color32::LIGHT_RED, err);
                }
            });
    }

    fn paint_scene(&self, painter: &egui::Painter, rect: egui::Rect) {
        let stroke = egui::Stroke::new(1.0, egui::Color32::from_gray(70));
        let line = |a: Vec3, b: Vec3| {
            painter.line_segment(
                [
                    self.camera.world_to_screen(a, rect),
                    self.camera.world_to_screen(b, rect),
                ],
                stroke,
            );
        };

        for collider in &self.scene.colliders {
            match *collider {
                Collider::Plane { point, normal } => {
                    let (u, v) = normal.any_orthonormal_pair();
                    let steps = ROOM_HALF as i32;
                    for i in -steps..=steps {
                        let o = i as f32;
                        line(point + u * o - v * ROOM_HALF, point + u * o + v * ROOM_HALF);
                        line(point + v * o - u * ROOM_HALF, point + v * o + u * ROOM_HALF);
                    }
                }
                Collider::Box(aabb) => {
                    for (a, b) in box_edges(&aabb) {
                        line(a, b);
                    }
                }
            }
        }
    }

    /// Depth-sorted, flat-shaded ribbons of every planted tree.
    fn paint_ribbons(&self, painter: &egui::Painter, rect: egui::Rect) {
        let (_, _, eye) = self.camera.basis();
        let light = Vec3::new(0.3, 1.0, 0.5).normalize();

        let mut triangles: Vec<(f32, [egui::Pos2; 3], egui::Color32)> = Vec::new();
        let meshes = self
            .planter
            .trees()
            .iter()
            .flat_map(|t| &t.branches)
            .filter_map(|b| b.mesh.as_ref());

        for mesh in meshes {
            for (shell, base) in mesh.shells().into_iter().zip([
                [86u8, 140, 60],
                [60, 90, 45],
                [110, 80, 50],
            ]) {
                for tri in shell.chunks_exact(3) {
                    let normal = mesh.normals[tri[0] as usize];
                    if normal.dot(eye) <= 0.0 {
                        continue;
                    }
                    let corners = [0, 1, 2].map(|k| mesh.vertices[tri[k] as usize]);
                    let depth = corners.iter().map(|&p| self.camera.depth(p)).sum::<f32>();
                    triangles.push((
                        depth,
                        corners.map(|p| self.camera.world_to_screen(p, rect)),
                        shaded(base, normal.dot(light)),
                    ));
                }
            }
        }

        triangles.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut out = egui::Mesh::default();
        for (_, [a, b, c], color) in triangles {
            let i = out.vertices.len() as u32;
            out.colored_vertex(a, color);
            out.colored_vertex(b, color);
            out.colored_vertex(c, color);
            out.add_triangle(i, i + 1, i + 2);
        }
        painter.add(egui::Shape::mesh(out));
    }

    fn paint_overlays(&self, painter: &egui::Painter, rect: egui::Rect) {
        let branches = self.planter.trees().iter().flat_map(|t| &t.branches);

        for branch in branches {
            if self.show_anchors {
                for a in &branch.anchors {
                    let p = self.camera.world_to_screen(a.offset_origin, rect);
                    painter.circle_filled(p, 2.5, egui::Color32::LIGHT_BLUE);
                }
            }
            if self.show_leaves {
                for leaf in &branch.placements {
                    let p = self.camera.world_to_screen(leaf.position, rect);
                    let tip = leaf.position + leaf.orientation * Vec3::Z * 0.3;
                    let q = self.camera.world_to_screen(tip, rect);
                    let green = 120 + (leaf.variant as u8 % 4) * 30;
                    let color = egui::Color32::from_rgb(60, green, 50);
                    painter.line_segment([p, q], egui::Stroke::new(2.0, color));
                    painter.circle_filled(p, 2.0, color);
                }
            }
        }
    }

    /// Builds the central panel where the scene and vines are drawn.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            if response.dragged_by(egui::PointerButton::Primary) {
                self.camera.orbit(response.drag_delta());
            }
            if response.dragged_by(egui::PointerButton::Secondary) {
                self.camera.pan += response.drag_delta();
            }

            if response.clicked()
                && let Some(p) = response.interact_pointer_pos()
            {
                self.plant_at(p, rect);
            }

            let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 && response.hovered() {
                let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                self.camera.zoom = (self.camera.zoom * factor).clamp(5.0, 120.0);
            }

            if !ctx.wants_keyboard_input() && ctx.input(|i| i.key_pressed(egui::Key::Space)) {
                self.redraw();
            }

            self.paint_scene(&painter, rect);
            self.paint_ribbons(&painter, rect);
            self.paint_overlays(&painter, rect);
        });
    }
}

/// The twelve edges of a box.
fn box_edges(aabb: &Aabb) -> Vec<(Vec3, Vec3)> {
    let corner = |i: usize| {
        Vec3::new(
            if i & 1 == 0 { aabb.min.x } else { aabb.max.x },
            if i & 2 == 0 { aabb.min.y } else { aabb.max.y },
            if i & 4 == 0 { aabb.min.z } else { aabb.max.z },
        )
    };
    (0..8)
        .flat_map(|i| {
            [1, 2, 4]
                .into_iter()
                .filter(move |bit| i & bit == 0)
                .map(move |bit| (corner(i), corner(i | bit)))
        })
        .collect()
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_rect() -> egui::Rect {
        egui::Rect::from_min_size(egui::Pos2::new(0.0, 0.0), egui::vec2(800.0, 600.0))
    }

    fn viewer() -> Viewer {
        let mut cfg = Config::default();
        cfg.branch_count = 2;
        cfg.max_anchor_count = 6;
        Viewer::new(cfg, 7).unwrap()
    }

    #[test]
    fn picking_ray_passes_through_the_projected_point() {
        let mut camera = OrbitCamera::default();
        camera.zoom = 25.0;
        camera.pan = egui::vec2(15.0, -7.0);
        camera.target = Vec3::new(1.0, 0.5, -2.0);
        let rect = test_rect();

        for p in [Vec3::ZERO, Vec3::new(3.0, 1.0, -4.0), Vec3::new(-2.5, 0.0, 6.0)] {
            let screen = camera.world_to_screen(p, rect);
            let (origin, dir) = camera.screen_to_ray(screen, rect);

            assert!((dir.length() - 1.0).abs() < 1e-5);
            // Closest approach of the ray to `p` is (numerically) zero.
            let along = (p - origin).dot(dir);
            let closest = origin + dir * along;
            assert!(closest.distance(p) < 1e-2, "p={p:?}, closest={closest:?}");
        }
    }

    #[test]
    fn camera_basis_is_orthonormal() {
        let camera = OrbitCamera {
            yaw: 2.1,
            pitch: 0.9,
            ..OrbitCamera::default()
        };
        let (right, up, eye) = camera.basis();
        for v in [right, up, eye] {
            assert!((v.length() - 1.0).abs() < 1e-5);
        }
        assert!(right.dot(up).abs() < 1e-5);
        assert!(up.dot(eye).abs() < 1e-5);
        assert!(right.cross(up).abs_diff_eq(eye, 1e-5));
    }

    #[test]
    fn clicking_the_floor_plants_a_tree_there() {
        let mut viewer = viewer();
        let rect = test_rect();
        let spot = Vec3::new(-2.0, 0.0, 4.0);

        let screen = viewer.camera.world_to_screen(spot, rect);
        assert!(viewer.plant_at(screen, rect));

        let tree = &viewer.planter.trees()[0];
        assert!(tree.origin.distance(spot) < 1e-2);
        assert!(tree.normal.abs_diff_eq(Vec3::Y, 1e-6));
        assert_eq!(viewer.last_planted, Some(tree.anchor_count()));
    }

    #[test]
    fn level_click_above_the_walls_plants_nothing() {
        let mut viewer = viewer();
        // Level view: picking rays run parallel to the floor.
        viewer.camera.pitch = 0.0;
        let rect = test_rect();

        // High above the walls, so the ray meets nothing at all.
        assert!(!viewer.plant_at(egui::pos2(400.0, -5_000.0), rect));
        assert!(viewer.planter.trees().is_empty());
    }

    #[test]
    fn rejected_config_keeps_the_previous_one() {
        let mut viewer = viewer();
        let before = *viewer.planter.config();

        viewer.draft.leaf_step = 1.5;
        viewer.apply_config();
        assert!(viewer.config_error.is_some());
        assert_eq!(*viewer.planter.config(), before);

        viewer.draft = Config::default();
        viewer.apply_config();
        assert!(viewer.config_error.is_none());
        assert_eq!(*viewer.planter.config(), Config::default());
    }

    #[test]
    fn clear_removes_all_trees() {
        let mut viewer = viewer();
        let rect = test_rect();
        let screen = viewer.camera.world_to_screen(Vec3::new(-1.0, 0.0, 3.0), rect);
        viewer.plant_at(screen, rect);
        assert!(!viewer.planter.trees().is_empty());

        viewer.clear();
        assert!(viewer.planter.trees().is_empty());
        assert!(viewer.last_planted.is_none());
    }

    #[test]
    fn box_has_twelve_distinct_edges() {
        let edges = box_edges(&Aabb::new(Vec3::ZERO, Vec3::ONE));
        assert_eq!(edges.len(), 12);
        for (a, b) in edges {
            assert!((a.distance(b) - 1.0).abs() < 1e-6);
        }
    }
}
