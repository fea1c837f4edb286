//! Auto-scaling camera for the projectile scene.
//!
//! Screen space is in pixels with y pointing down; world space is in metres
//! with y pointing up. `center` is the world point drawn at `offset`.

use log::debug;

use super::{Scalar, Vector};
use crate::config::CameraConfig;

/// Smallest region the camera will fit, so short flights are not blown up.
pub const MIN_VISIBLE_X: (Scalar, Scalar) = (-2.0, 10.0);
pub const MIN_VISIBLE_Y: (Scalar, Scalar) = (0.0, 5.0);

/// Screen margin subtracted from the viewport before fitting.
const VIEWPORT_MARGIN: Scalar = 100.0;

/// Smoothstep easing.
pub fn ease(t: Scalar) -> Scalar {
    t * t * (3.0 - 2.0 * t)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vector,
    pub max: Vector,
}

impl Bounds {
    /// A box containing only the origin.
    pub fn origin() -> Self {
        Bounds {
            min: Vector::ZERO,
            max: Vector::ZERO,
        }
    }

    pub fn include(&mut self, point: Vector) {
        if point.is_finite() {
            self.min = self.min.min(point);
            self.max = self.max.max(point);
        }
    }

    /// Widens the box to the minimum visible span.
    pub fn with_minimum_span(mut self) -> Self {
        self.min.x = self.min.x.min(MIN_VISIBLE_X.0);
        self.max.x = self.max.x.max(MIN_VISIBLE_X.1);
        self.min.y = self.min.y.min(MIN_VISIBLE_Y.0);
        self.max.y = self.max.y.max(MIN_VISIBLE_Y.1);
        self
    }

    pub fn span(&self) -> Vector {
        self.max - self.min
    }

    pub fn center(&self) -> Vector {
        (self.min + self.max) / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowTarget {
    First,
    Second,
    /// Mean position of whichever projectiles are still airborne.
    Both,
}

#[derive(Debug, Clone)]
pub struct CameraView {
    pub scale: Scalar,
    pub target_scale: Scalar,
    pub center: Vector,
    pub target_center: Vector,
    pub offset: Vector,
    pub viewport: Vector,
    auto_scale: bool,
    follow: Option<FollowTarget>,
    /// Latest unscaled host time; independent of the simulation speed.
    clock: Scalar,
    last_interaction: Option<Scalar>,
    config: CameraConfig,
}

impl CameraView {
    pub fn new(config: &CameraConfig) -> Self {
        let viewport = Vector::new(800.0, 500.0);
        CameraView {
            scale: config.base_scale,
            target_scale: config.base_scale,
            center: Vector::ZERO,
            target_center: Vector::ZERO,
            offset: Self::base_offset(viewport),
            viewport,
            auto_scale: true,
            follow: None,
            clock: 0.0,
            last_interaction: None,
            config: config.clone(),
        }
    }

    fn base_offset(viewport: Vector) -> Vector {
        Vector::new(50.0, viewport.y - 50.0)
    }

    pub fn world_to_screen(&self, world: Vector) -> Vector {
        Vector::new(
            self.offset.x + (world.x - self.center.x) * self.scale,
            self.offset.y - (world.y - self.center.y) * self.scale,
        )
    }

    pub fn screen_to_world(&self, screen: Vector) -> Vector {
        Vector::new(
            self.center.x + (screen.x - self.offset.x) / self.scale,
            self.center.y - (screen.y - self.offset.y) / self.scale,
        )
    }

    pub fn auto_scale(&self) -> bool {
        self.auto_scale
    }

    pub fn follow(&self) -> Option<FollowTarget> {
        self.follow
    }

    /// Enabling auto-scale turns following off and forgets past interactions.
    pub fn set_auto_scale(&mut self, enabled: bool) {
        self.auto_scale = enabled;
        if enabled {
            self.follow = None;
            self.last_interaction = None;
        }
    }

    /// Following a projectile turns auto-scale off.
    pub fn set_follow(&mut self, follow: Option<FollowTarget>) {
        self.follow = follow;
        if follow.is_some() {
            self.auto_scale = false;
        }
    }

    /// Keeps the ground line anchored near the bottom-left when the window resizes.
    pub fn set_viewport(&mut self, size: Vector) {
        if size.is_finite() && size.x > 0.0 && size.y > 0.0 && size != self.viewport {
            self.viewport = size;
            self.offset = Self::base_offset(size);
        }
    }

    pub fn pan(&mut self, screen_delta: Vector) {
        if !screen_delta.is_finite() {
            return;
        }
        self.center.x -= screen_delta.x / self.scale;
        self.center.y += screen_delta.y / self.scale;
        self.target_center = self.center;
        self.mark_interaction();
    }

    /// Multiplies the scale by `factor`, keeping the world point under `anchor` fixed.
    pub fn zoom(&mut self, factor: Scalar, anchor: Vector) {
        if !factor.is_finite() || factor <= 0.0 || !anchor.is_finite() {
            return;
        }
        let world = self.screen_to_world(anchor);
        self.scale = (self.scale * factor).clamp(self.config.min_scale, self.config.max_scale);
        self.target_scale = self.scale;
        self.center.x = world.x - (anchor.x - self.offset.x) / self.scale;
        self.center.y = world.y + (anchor.y - self.offset.y) / self.scale;
        self.target_center = self.center;
        self.mark_interaction();
    }

    pub fn reset_view(&mut self) {
        self.scale = self.config.base_scale;
        self.target_scale = self.scale;
        self.center = Vector::ZERO;
        self.target_center = Vector::ZERO;
        self.offset = Self::base_offset(self.viewport);
        self.last_interaction = None;
    }

    /// Moves the host clock forward. Time never runs backwards.
    pub fn set_host_time(&mut self, now: Scalar) {
        if now.is_finite() {
            self.clock = self.clock.max(now);
        }
    }

    fn mark_interaction(&mut self) {
        self.last_interaction = Some(self.clock);
    }

    /// True while a recent manual pan or zoom holds off auto-scaling.
    pub fn suspended(&self) -> bool {
        self.last_interaction
            .is_some_and(|at| self.clock - at < self.config.interaction_cooldown)
    }

    /// Moves toward the fitted or followed view.
    pub fn update(&mut self, bounds: Bounds, centre_on_midpoint: bool, follow_point: Option<Vector>) {
        if self.auto_scale {
            if self.suspended() {
                return;
            }
            self.fit(bounds, centre_on_midpoint);
        } else if let (Some(_), Some(point)) = (self.follow, follow_point) {
            self.target_center = self.center_for(point, self.scale);
        } else {
            return;
        }
        let k = ease(self.config.smoothing);
        self.center += (self.target_center - self.center) * k;
        self.scale += (self.target_scale - self.scale) * k;
    }

    /// Camera centre that draws `point` in the middle of the viewport at `scale`.
    fn center_for(&self, point: Vector, scale: Scalar) -> Vector {
        Vector::new(
            point.x - (self.viewport.x / 2.0 - self.offset.x) / scale,
            point.y + (self.viewport.y / 2.0 - self.offset.y) / scale,
        )
    }

    /// Sets the targets so that `bounds` plus padding fills the viewport.
    pub fn fit(&mut self, bounds: Bounds, centre_on_midpoint: bool) {
        let bounds = bounds.with_minimum_span();
        let span = bounds.span();
        let padding = span * self.config.padding_fraction + Vector::splat(self.config.padding_margin);
        let view = span + padding;
        let available = self.viewport - Vector::splat(VIEWPORT_MARGIN);

        let sx = if view.x > 0.0 { available.x / view.x } else { self.scale };
        let sy = if view.y > 0.0 { available.y / view.y } else { self.scale };
        let target_scale = sx.min(sy);
        let target_scale = if target_scale.is_finite() && target_scale > 0.0 {
            target_scale.clamp(self.config.min_scale, self.config.max_scale)
        } else {
            self.scale
        };

        let mut midpoint = bounds.center();
        if centre_on_midpoint {
            midpoint.x = midpoint.x.max(0.0);
        }
        self.target_scale = target_scale;
        self.target_center = self.center_for(midpoint, target_scale);
        debug!("Camera target scale {target_scale:.3}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn camera() -> CameraView {
        CameraView::new(&CameraConfig::default())
    }

    #[test]
    fn test_transforms_are_inverse() {
        let mut camera = camera();
        camera.center = Vector::new(3.0, -2.0);
        camera.scale = 2.5;
        let world = Vector::new(12.0, 7.0);
        let back = camera.screen_to_world(camera.world_to_screen(world));
        assert_relative_eq!(back.x, world.x, epsilon = 1e-9);
        assert_relative_eq!(back.y, world.y, epsilon = 1e-9);
    }

    #[test]
    fn test_zoom_keeps_anchor_fixed() {
        let mut camera = camera();
        let anchor = Vector::new(300.0, 200.0);
        let before = camera.screen_to_world(anchor);
        camera.zoom(1.1, anchor);
        let after = camera.screen_to_world(anchor);
        assert_relative_eq!(before.x, after.x, epsilon = 1e-9);
        assert_relative_eq!(before.y, after.y, epsilon = 1e-9);
        assert_relative_eq!(camera.scale, 4.4, epsilon = 1e-12);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut camera = camera();
        for _ in 0..100 {
            camera.zoom(1.1, Vector::ZERO);
        }
        assert_eq!(camera.scale, 10.0);
    }

    #[test]
    fn test_interaction_suspends_auto_scale_for_cooldown() {
        let mut camera = camera();
        let mut bounds = Bounds::origin();
        bounds.include(Vector::new(250.0, 60.0));
        camera.set_host_time(10.0);
        camera.pan(Vector::new(10.0, 0.0));
        let held = camera.scale;
        camera.set_host_time(11.0);
        camera.update(bounds, false, None);
        assert!(camera.suspended());
        assert_eq!(camera.scale, held);
        camera.set_host_time(12.5);
        camera.update(bounds, false, None);
        assert!(!camera.suspended());
        assert!(camera.scale < held);
    }

    #[test]
    fn test_host_time_never_runs_backwards() {
        let mut camera = camera();
        camera.set_host_time(5.0);
        camera.zoom(1.1, Vector::ZERO);
        camera.set_host_time(1.0);
        camera.set_host_time(Scalar::NAN);
        assert!(camera.suspended());
        camera.set_host_time(7.0);
        assert!(!camera.suspended());
    }

    #[test]
    fn test_auto_scale_and_follow_are_exclusive() {
        let mut camera = camera();
        camera.set_follow(Some(FollowTarget::Both));
        assert!(!camera.auto_scale());
        camera.set_auto_scale(true);
        assert_eq!(camera.follow(), None);
    }

    #[test]
    fn test_fit_respects_minimum_span_and_limits() {
        let mut camera = camera();
        camera.fit(Bounds::origin(), false);
        // 12 m x 5 m widened by padding: x view = 12 + 12.4 = 24.4, y view = 5 + 11 = 16
        let expected = (700.0_f64 / 24.4).min(400.0 / 16.0).clamp(0.5, 10.0);
        assert_relative_eq!(camera.target_scale, expected);
    }

    #[test]
    fn test_smoothing_never_jumps() {
        let mut camera = camera();
        let mut bounds = Bounds::origin();
        bounds.include(Vector::new(250.0, 60.0));
        camera.update(bounds, false, None);
        let step = (camera.scale - 4.0).abs();
        let total = (camera.target_scale - 4.0).abs();
        assert!(step < total);
        assert_relative_eq!(step, total * ease(0.1), epsilon = 1e-9);
    }
}
