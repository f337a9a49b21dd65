//! Interactive fractal tree viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns a [`Fractal`] plus the
//! host placement and camera, implements [`eframe::App`] to drive one
//! fractal frame per UI frame, and acts as the rendering boundary by
//! collecting the per-level instance buffers through [`InstanceSink`].

use std::time::Instant;

use eframe::App;
use fractal_core::{
    Fractal, FractalConfig, FractalError, InstanceSink, LevelDraw, MeshSlot, RootPlacement,
    config::{MAX_ANGLE_DEGREES, MAX_DEPTH, MIN_DEPTH},
    store::total_part_count,
    types::Color,
};
use glam::{Quat, Vec2, Vec3};

/// One projected instance, ready to paint.
#[derive(Clone, Copy, Debug)]
struct Segment {
    base: Vec3,
    tip: Vec3,
    width: f32,
    mesh: MeshSlot,
    color: egui::Color32,
}

/// Collects the instance buffers handed over by [`Fractal::render`].
///
/// Each instance becomes a segment running along its scaled up axis,
/// centred on its translation, i.e. a unit-height mesh under that transform.
#[derive(Default)]
struct SegmentSink {
    segments: Vec<Segment>,
}

impl InstanceSink for SegmentSink {
    fn draw_level(&mut self, draw: LevelDraw<'_>) {
        self.segments.reserve(draw.transforms.len());
        for (i, t) in draw.transforms.iter().enumerate() {
            let center = t.translation();
            let half_up = t.up() * 0.5;
            self.segments.push(Segment {
                base: center - half_up,
                tip: center + half_up,
                width: Vec3::from_array(t.x_axis).length(),
                mesh: draw.mesh,
                color: to_color32(draw.instance_color(i)),
            });
        }
    }
}

fn to_color32(c: Color) -> egui::Color32 {
    let u = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    egui::Color32::from_rgb(u(c.x), u(c.y), u(c.z))
}

/// Main application state for the interactive viewer.
///
/// The typical per-frame update is:
/// 1. Handle UI interactions / input.
/// 2. If `running` is `true`, advance the fractal by the frame's `dt`.
/// 3. Render the last completed fractal frame.
///
/// ### Fields
/// - `fractal` - The animated hierarchy.
/// - `cfg` - Config being edited; pushed into `fractal` on change.
/// - `error` - Last rebuild error, shown in the side panel.
///
/// - `host_yaw` - Host object rotation about the vertical, degrees.
/// - `host_turn_speed` - Host yaw speed while running, degrees per second.
/// - `host_scale` - Host object uniform scale.
///
/// - `running` - Whether the fractal is currently animating.
/// - `zoom` - Pixels per world unit.
/// - `pan` - Screen-space pan offset in pixels.
/// - `orbit` - Camera yaw and pitch in radians.
///
/// - `sink` - Instances gathered from the last render.
/// - `last_update_ms` - Wall time of the last fractal update (display only).
pub struct Viewer {
    fractal: Fractal,
    cfg: FractalConfig,
    error: Option<String>,

    host_yaw: f32,
    host_turn_speed: f32,
    host_scale: f32,

    running: bool,
    zoom: f32,
    pan: egui::Vec2,
    orbit: Vec2,

    sink: SegmentSink,
    last_update_ms: f64,
}

impl Viewer {
    /// Creates a viewer around a fractal built from [`FractalConfig::default`].
    ///
    /// ### Returns
    /// A fully-initialized [`Viewer`], or the error from building the fractal.
    pub fn new() -> Result<Self, FractalError> {
        let cfg = FractalConfig::default();
        let fractal = Fractal::new(cfg.clone())?;

        Ok(Self {
            fractal,
            cfg,
            error: None,
            host_yaw: 0.0,
            host_turn_speed: 0.0,
            host_scale: 1.0,
            running: true,
            zoom: 160.0,
            pan: egui::vec2(0.0, 120.0),
            orbit: Vec2::new(0.4, 0.25),
            sink: SegmentSink::default(),
            last_update_ms: 0.0,
        })
    }

    fn placement(&self) -> RootPlacement {
        RootPlacement {
            position: Vec3::ZERO,
            rotation: Quat::from_rotation_y(self.host_yaw.to_radians()),
            scale: Vec3::splat(self.host_scale),
        }
    }

    /// Pushes the edited config into the fractal, rebuilding it.
    ///
    /// Range minimums are pulled down to their maximums first, so dragging
    /// one bound past the other never produces an invalid config. On error
    /// the previous tree keeps running, its last frame stays on screen and
    /// the message is displayed.
    fn rebuild(&mut self) {
        for range in [&mut self.cfg.sag_angle_range, &mut self.cfg.spin_speed_range] {
            range.min = range.min.min(range.max);
        }

        match self.fractal.reconfigure(self.cfg.clone()) {
            Ok(()) => {
                self.error = None;
                self.sink.segments.clear();
            }
            Err(e) => {
                log::warn!("fractal rebuild failed: {e}");
                self.error = Some(e.to_string());
                self.collect();
            }
        }
    }

    /// Rebuilds with a fresh random seed.
    fn reseed(&mut self) {
        self.cfg.seed = rand::random();
        self.rebuild();
    }

    /// Advances the fractal by `dt` seconds and collects its instances.
    fn step(&mut self, dt: f32) {
        self.host_yaw = (self.host_yaw + self.host_turn_speed * dt).rem_euclid(360.0);
        let placement = self.placement();

        let start = Instant::now();
        self.fractal.update(dt, &placement);
        self.last_update_ms = start.elapsed().as_secs_f64() * 1000.0;

        self.collect();
    }

    fn collect(&mut self) {
        self.sink.segments.clear();
        self.fractal.render(&mut self.sink);
    }

    fn camera(&self) -> Quat {
        Quat::from_rotation_x(self.orbit.y) * Quat::from_rotation_y(self.orbit.x)
    }

    /// Converts a view-plane position (camera space, y up) to screen-space.
    fn view_to_screen(&self, p: Vec2, rect: egui::Rect) -> egui::Pos2 {
        let center = rect.center();
        egui::pos2(
            center.x + p.x * self.zoom + self.pan.x,
            center.y - p.y * self.zoom + self.pan.y,
        )
    }

    /// Inverse of [`Viewer::view_to_screen`].
    fn screen_to_view(&self, p: egui::Pos2, rect: egui::Rect) -> Vec2 {
        let center = rect.center();
        let x = (p.x - center.x - self.pan.x) / self.zoom;
        let y = (center.y - p.y + self.pan.y) / self.zoom;
        Vec2::new(x, y)
    }

    /// Orthographic projection of a world position.
    ///
    /// ### Returns
    /// The screen position and the camera-space depth (larger is nearer).
    fn project(&self, camera: Quat, p: Vec3, rect: egui::Rect) -> (egui::Pos2, f32) {
        let v = camera * p;
        (self.view_to_screen(v.truncate(), rect), v.z)
    }

    /// Helper to draw a labeled `f32` [`egui::Slider`]; returns whether it changed.
    fn labeled_slider_f32(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f32,
        range: std::ops::RangeInclusive<f32>,
    ) -> bool {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::Slider::new(value, range)).changed()
        })
        .inner
    }

    /// Builds the top panel UI (run controls, stepping, rebuild).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(if self.running { "⏸ Pause" } else { "▶ Run" })
                    .clicked()
                {
                    self.running = !self.running;
                }

                if ui.button("Step").clicked() {
                    self.step(1.0 / 60.0);
                }

                if ui.button("Rebuild").clicked() {
                    self.rebuild();
                }

                if ui.button("Reseed").clicked() {
                    self.reseed();
                }

                ui.separator();
                ui.add(egui::Slider::new(&mut self.zoom, 10.0..=2000.0).text("Zoom"));
            });
        });
    }

    /// Builds the bottom status bar (part count, update cost).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("update = {:.3} ms", self.last_update_ms));
                ui.separator();
                ui.label(format!("parts = {}", self.fractal.store().part_count()));
                ui.label(format!("levels = {}", self.fractal.store().depth()));
                ui.label(format!("seed = {:#x}", self.cfg.seed));
            });
        });
    }

    /// Builds the right-hand configuration panel.
    ///
    /// Any change to a build parameter triggers a full rebuild.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(240.0)
            .show(ctx, |ui| {
                ui.heading("Fractal");

                let mut changed = false;

                ui.separator();
                ui.horizontal(|ui| {
                    ui.label("depth:");
                    changed |= ui
                        .add(egui::Slider::new(&mut self.cfg.depth, MIN_DEPTH..=MAX_DEPTH))
                        .changed();
                });
                ui.label(format!("{} parts", total_part_count(self.cfg.depth)));

                ui.separator();
                ui.label("Sag (degrees)");
                changed |= Self::labeled_slider_f32(
                    ui,
                    "min:",
                    &mut self.cfg.sag_angle_range.min,
                    0.0..=MAX_ANGLE_DEGREES,
                );
                changed |= Self::labeled_slider_f32(
                    ui,
                    "max:",
                    &mut self.cfg.sag_angle_range.max,
                    0.0..=MAX_ANGLE_DEGREES,
                );

                ui.separator();
                ui.label("Spin speed (degrees/s)");
                changed |= Self::labeled_slider_f32(
                    ui,
                    "min:",
                    &mut self.cfg.spin_speed_range.min,
                    0.0..=MAX_ANGLE_DEGREES,
                );
                changed |= Self::labeled_slider_f32(
                    ui,
                    "max:",
                    &mut self.cfg.spin_speed_range.max,
                    0.0..=MAX_ANGLE_DEGREES,
                );
                changed |= Self::labeled_slider_f32(
                    ui,
                    "reverse chance:",
                    &mut self.cfg.reverse_spin_chance,
                    0.0..=1.0,
                );

                if changed {
                    self.rebuild();
                }

                ui.separator();
                ui.label("Host object");
                Self::labeled_slider_f32(ui, "yaw:", &mut self.host_yaw, 0.0..=360.0);
                Self::labeled_slider_f32(ui, "turn speed:", &mut self.host_turn_speed, -90.0..=90.0);
                Self::labeled_slider_f32(ui, "scale:", &mut self.host_scale, 0.1..=4.0);

                ui.separator();
                if ui.button("Reset cfg to default").clicked() {
                    self.cfg = FractalConfig::default();
                    self.rebuild();
                }

                if let Some(err) = &self.error {
                    ui.separator();
                    ui.colored_label(egui::Color32::LIGHT_RED, err);
                }
            });
    }

    /// Builds the central panel where the fractal is drawn.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            // Primary drag orbits, secondary drag pans.
            if response.dragged_by(egui::PointerButton::Primary) {
                let delta = response.drag_delta();
                self.orbit.x += delta.x * 0.01;
                self.orbit.y = (self.orbit.y + delta.y * 0.01).clamp(-1.5, 1.5);
            } else if response.dragged_by(egui::PointerButton::Secondary) {
                self.pan += response.drag_delta();
            }

            // Zoom around the mouse cursor.
            let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let pointer_screen = response.hover_pos().unwrap_or(rect.center());
                let view_before = self.screen_to_view(pointer_screen, rect);

                let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                self.zoom = (self.zoom * factor).clamp(10.0, 2000.0);

                let screen_after = self.view_to_screen(view_before, rect);
                self.pan += pointer_screen - screen_after;
            }

            if self.running {
                let dt = ctx.input(|i| i.stable_dt).min(0.1);
                self.step(dt);
                ctx.request_repaint();
            } else if !self.fractal.is_frame_ready() {
                // Freshly rebuilt while paused: show the tree at rest.
                self.step(0.0);
            }

            let camera = self.camera();
            let mut projected: Vec<(f32, egui::Pos2, egui::Pos2, &Segment)> = self
                .sink
                .segments
                .iter()
                .map(|s| {
                    let (a, za) = self.project(camera, s.base, rect);
                    let (b, zb) = self.project(camera, s.tip, rect);
                    (0.5 * (za + zb), a, b, s)
                })
                .collect();
            // Back to front.
            projected.sort_by(|a, b| a.0.total_cmp(&b.0));

            for (_, a, b, s) in projected {
                let width = (s.width * self.zoom).max(1.0);
                match s.mesh {
                    MeshSlot::Branch => {
                        painter.line_segment([a, b], egui::Stroke::new(width, s.color));
                    }
                    MeshSlot::Leaf => {
                        painter.circle_filled(a.lerp(b, 0.5), 0.5 * width, s.color);
                    }
                }
            }
        });
    }
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
