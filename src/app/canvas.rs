//! Helper struct for drawing objects in world space onto the screen.
//! World space is y-up. A fitted canvas keeps the aspect ratio, so the
//! requested world rectangle is centred and padded to fill the screen area.

use egui::{Align2, Color32, FontId, Pos2, Rect, Stroke, StrokeKind, Ui, epaint::CircleShape, vec2};
use physlab::simulation::Vector;
use physlab::simulation::camera::CameraView;

const GRID_COLOUR: Color32 = Color32::from_rgb(15, 15, 15);
const AXIS_COLOUR: Color32 = Color32::from_rgb(20, 20, 20);

enum Mapping<'a> {
    Fitted { centre: Vector, scale: f64 },
    Camera { camera: &'a CameraView },
}

pub struct Canvas<'a> {
    ui: &'a Ui,
    screen_extent: Rect,
    mapping: Mapping<'a>,
}

impl<'a> Canvas<'a> {
    /// Shows at least `world_min..world_max` in `screen_extent`.
    pub fn fit(ui: &'a Ui, screen_extent: Rect, world_min: Vector, world_max: Vector) -> Self {
        let span = (world_max - world_min).max(Vector::splat(1e-6));
        let scale = (screen_extent.width() as f64 / span.x).min(screen_extent.height() as f64 / span.y);
        Canvas {
            ui,
            screen_extent,
            mapping: Mapping::Fitted {
                centre: (world_min + world_max) / 2.0,
                scale,
            },
        }
    }

    /// Follows a projectile camera whose viewport is `screen_extent`.
    pub fn with_camera(ui: &'a Ui, screen_extent: Rect, camera: &'a CameraView) -> Self {
        Canvas {
            ui,
            screen_extent,
            mapping: Mapping::Camera { camera },
        }
    }

    pub fn world_to_screen(&self, world: Vector) -> Pos2 {
        match &self.mapping {
            Mapping::Fitted { centre, scale } => {
                let c = self.screen_extent.center();
                Pos2::new(
                    c.x + ((world.x - centre.x) * scale) as f32,
                    c.y - ((world.y - centre.y) * scale) as f32,
                )
            }
            Mapping::Camera { camera } => {
                let local = camera.world_to_screen(world);
                self.screen_extent.min + vec2(local.x as f32, local.y as f32)
            }
        }
    }

    pub fn screen_to_world(&self, screen: Pos2) -> Vector {
        match &self.mapping {
            Mapping::Fitted { centre, scale } => {
                let c = self.screen_extent.center();
                Vector::new(
                    centre.x + (screen.x - c.x) as f64 / scale,
                    centre.y - (screen.y - c.y) as f64 / scale,
                )
            }
            Mapping::Camera { camera } => {
                let local = screen - self.screen_extent.min;
                camera.screen_to_world(Vector::new(local.x as f64, local.y as f64))
            }
        }
    }

    /// Pixels per world unit.
    pub fn scale(&self) -> f32 {
        match &self.mapping {
            Mapping::Fitted { scale, .. } => *scale as f32,
            Mapping::Camera { camera } => camera.scale as f32,
        }
    }

    pub fn draw_filled_circle(&self, pos: Vector, radius: f64, colour: Color32) {
        let screen_pos = self.world_to_screen(pos);
        let screen_radius = radius as f32 * self.scale();
        self.ui
            .painter()
            .add(CircleShape::filled(screen_pos, screen_radius, colour));
    }

    /// A circle of fixed screen size, for particles and markers.
    pub fn draw_dot(&self, pos: Vector, radius_px: f32, colour: Color32) {
        self.ui
            .painter()
            .circle_filled(self.world_to_screen(pos), radius_px, colour);
    }

    pub fn draw_ring(&self, pos: Vector, radius: f64, colour: Color32) {
        self.ui.painter().circle_stroke(
            self.world_to_screen(pos),
            radius as f32 * self.scale(),
            Stroke::new(1.5, colour),
        );
    }

    pub fn draw_segment(&self, from: Vector, to: Vector, width: f32, colour: Color32) {
        self.ui.painter().line_segment(
            [self.world_to_screen(from), self.world_to_screen(to)],
            Stroke::new(width, colour),
        );
    }

    pub fn draw_dashed(&self, from: Vector, to: Vector, colour: Color32) {
        let points = [self.world_to_screen(from), self.world_to_screen(to)];
        self.ui
            .painter()
            .extend(egui::Shape::dashed_line(&points, Stroke::new(1.0, colour), 6.0, 4.0));
    }

    pub fn draw_polyline(&self, points: impl IntoIterator<Item = Vector>, colour: Color32) {
        let screen_points: Vec<Pos2> = points
            .into_iter()
            .filter(|p| p.is_finite())
            .map(|p| self.world_to_screen(p))
            .collect();
        if screen_points.len() < 2 {
            log::error!("Polyline needs at least two finite points");
            return;
        }
        self.ui
            .painter()
            .line(screen_points, Stroke::new(2.0, colour));
    }

    /// Arrow from `origin` along `vector`, both in world units.
    pub fn draw_arrow(&self, origin: Vector, vector: Vector, colour: Color32) {
        let start = self.world_to_screen(origin);
        let end = self.world_to_screen(origin + vector);
        self.ui
            .painter()
            .arrow(start, end - start, Stroke::new(2.0, colour));
    }

    pub fn draw_rect(&self, min: Vector, max: Vector, fill: Color32, outline: Color32) {
        let rect = Rect::from_two_pos(self.world_to_screen(min), self.world_to_screen(max));
        let painter = self.ui.painter();
        painter.rect_filled(rect, 2.0, fill);
        painter.rect_stroke(rect, 2.0, Stroke::new(1.0, outline), StrokeKind::Inside);
    }

    pub fn draw_text(&self, pos: Vector, text: impl ToString, colour: Color32) {
        self.ui.painter().text(
            self.world_to_screen(pos),
            Align2::CENTER_CENTER,
            text,
            FontId::proportional(13.0),
            colour,
        );
    }

    pub fn draw_grid_lines(&self, step: f64) {
        if !(step.is_finite() && step > 0.0) {
            log::error!("Grid step must be positive, got {step}");
            return;
        }
        let min = self.screen_to_world(self.screen_extent.left_bottom());
        let max = self.screen_to_world(self.screen_extent.right_top());

        let mut y = step * (min.y / step).floor();
        while y < max.y {
            self.ui.painter().hline(
                self.screen_extent.x_range(),
                self.world_to_screen(Vector::new(0.0, y)).y,
                Stroke::new(1.0, GRID_COLOUR),
            );
            y += step;
        }
        let mut x = step * (min.x / step).floor();
        while x < max.x {
            self.ui.painter().vline(
                self.world_to_screen(Vector::new(x, 0.0)).x,
                self.screen_extent.y_range(),
                Stroke::new(1.0, GRID_COLOUR),
            );
            x += step;
        }
    }

    pub fn draw_axes(&self) {
        let origin = self.world_to_screen(Vector::ZERO);
        self.ui.painter().vline(
            origin.x,
            self.screen_extent.y_range(),
            Stroke::new(2.0, AXIS_COLOUR),
        );
        self.ui.painter().hline(
            self.screen_extent.x_range(),
            origin.y,
            Stroke::new(2.0, AXIS_COLOUR),
        );
    }
}
