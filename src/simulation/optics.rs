//! Ray geometry for the reflection and refraction benches.
//!
//! Both scenes are y-up. Angles are measured from the surface normal in
//! degrees; incoming light arrives from the upper left.

use log::debug;
use strum_macros::EnumIter;

use super::variables::{INCIDENCE_ANGLE, MIRROR_RADIUS, REFRACTION_ANGLE};
use super::{Scalar, Simulation, StepOutcome, Vector};

/// Length of the primary ray drawn from the mirror.
pub const RAY_LENGTH: Scalar = 120.0;
const EXTRA_RAY_LENGTH: Scalar = 100.0;
const EXTRA_RAY_SPREAD: Scalar = 10.0;
pub const MAX_RAYS: usize = 5;
/// Pointer distance within which a ray end can be grabbed.
pub const HIT_RADIUS: Scalar = 20.0;
const SCENE_MARGIN: Scalar = 50.0;
/// Half-width and height of the reflection scene; the mirror pivot is the origin.
pub const MIRROR_SCENE: Vector = Vector::new(400.0, 400.0);

/// Unit vector pointing up and to the left at `degrees` from the vertical.
fn from_normal_left(degrees: Scalar) -> Vector {
    let (sin, cos) = degrees.to_radians().sin_cos();
    Vector::new(-sin, cos)
}

fn from_normal_right(degrees: Scalar) -> Vector {
    let (sin, cos) = degrees.to_radians().sin_cos();
    Vector::new(sin, cos)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum Surface {
    Smooth,
    Rough,
    SemiMatte,
    Concave,
    Convex,
}

impl Surface {
    pub fn description(&self) -> &'static str {
        match self {
            Surface::Smooth => "Smooth Reflective Surface - Perfect reflection",
            Surface::Rough => "Rough Surface - Diffuse reflection",
            Surface::SemiMatte => "Semi-Matte Surface - Partial reflection",
            Surface::Concave => "Concave Mirror - Converging reflection",
            Surface::Convex => "Convex Mirror - Diverging reflection",
        }
    }

    pub fn image_description(&self) -> &'static str {
        match self {
            Surface::Smooth => "Virtual and upright image",
            Surface::Rough => "No clear image formed (diffuse reflection)",
            Surface::SemiMatte => "Faint virtual image",
            Surface::Concave => "Virtual and upright image (when object is close)",
            Surface::Convex => "Virtual and upright image (always)",
        }
    }

    pub fn curved(&self) -> bool {
        matches!(self, Surface::Concave | Surface::Convex)
    }
}

impl std::fmt::Display for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Surface::Smooth => write!(f, "Smooth"),
            Surface::Rough => write!(f, "Rough"),
            Surface::SemiMatte => write!(f, "Semi-matte"),
            Surface::Concave => write!(f, "Concave"),
            Surface::Convex => write!(f, "Convex"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub incident_end: Vector,
    pub reflected_end: Vector,
}

impl Ray {
    /// Angle between the incoming ray and the normal, in degrees.
    pub fn incidence(&self) -> Scalar {
        self.incident_end.x.abs().atan2(self.incident_end.y.abs()).to_degrees()
    }

    pub fn reflection(&self) -> Scalar {
        self.reflected_end.x.abs().atan2(self.reflected_end.y.abs()).to_degrees()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RayEnd {
    Incident(usize),
    Reflected(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReflectionCommand {
    SetSurface(Surface),
    SetIncidence(Scalar),
    SetMirrorRadius(Scalar),
    AddRay,
    RemoveRay,
    ResetRays,
    /// Moves a grabbed ray end to a scene point.
    Drag(RayEnd, Vector),
}

pub struct ReflectionSimulation {
    surface: Surface,
    incidence: Scalar,
    mirror_radius: Scalar,
    rays: Vec<Ray>,
}

impl Default for ReflectionSimulation {
    fn default() -> Self {
        Self::new()
    }
}

impl ReflectionSimulation {
    pub fn new() -> Self {
        let mut simulation = ReflectionSimulation {
            surface: Surface::Smooth,
            incidence: INCIDENCE_ANGLE.default,
            mirror_radius: MIRROR_RADIUS.default,
            rays: Vec::new(),
        };
        simulation.reset_rays();
        simulation
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    pub fn incidence(&self) -> Scalar {
        self.incidence
    }

    /// Always equal to the incidence.
    pub fn reflection(&self) -> Scalar {
        self.incidence
    }

    pub fn rays(&self) -> &[Ray] {
        &self.rays
    }

    pub fn mirror_radius(&self) -> Scalar {
        self.mirror_radius
    }

    /// Principal focus, half the radius of curvature along the normal.
    pub fn focal_point(&self) -> Option<Vector> {
        match self.surface {
            Surface::Concave => Some(Vector::new(0.0, self.mirror_radius / 2.0)),
            Surface::Convex => Some(Vector::new(0.0, -self.mirror_radius / 2.0)),
            _ => None,
        }
    }

    pub fn centre_of_curvature(&self) -> Option<Vector> {
        match self.surface {
            Surface::Concave => Some(Vector::new(0.0, self.mirror_radius)),
            Surface::Convex => Some(Vector::new(0.0, -self.mirror_radius)),
            _ => None,
        }
    }

    /// Nearest grabbable ray end within [`HIT_RADIUS`] of `point`.
    pub fn hit_test(&self, point: Vector) -> Option<RayEnd> {
        self.rays
            .iter()
            .enumerate()
            .flat_map(|(i, ray)| {
                [
                    (RayEnd::Incident(i), ray.incident_end),
                    (RayEnd::Reflected(i), ray.reflected_end),
                ]
            })
            .map(|(end, at)| (end, at.distance(point)))
            .filter(|(_, distance)| *distance <= HIT_RADIUS)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(end, _)| end)
    }

    fn ray_angle(&self, index: usize) -> Scalar {
        (self.incidence + index as Scalar * EXTRA_RAY_SPREAD).min(INCIDENCE_ANGLE.max)
    }

    fn ray_at(&self, index: usize, length: Scalar) -> Ray {
        let angle = self.ray_angle(index);
        Ray {
            incident_end: from_normal_left(angle) * length,
            reflected_end: from_normal_right(angle) * length,
        }
    }

    fn rebuild_rays(&mut self) {
        let count = self.rays.len().max(1);
        self.rays = (0..count)
            .map(|i| self.ray_at(i, if i == 0 { RAY_LENGTH } else { EXTRA_RAY_LENGTH }))
            .collect();
    }

    fn reset_rays(&mut self) {
        self.rays = vec![self.ray_at(0, RAY_LENGTH)];
    }

    fn clamp_to_scene(point: Vector) -> Vector {
        Vector::new(
            point.x.clamp(-MIRROR_SCENE.x + SCENE_MARGIN, MIRROR_SCENE.x - SCENE_MARGIN),
            point.y.clamp(SCENE_MARGIN, MIRROR_SCENE.y - SCENE_MARGIN),
        )
    }

    /// Sets the angle from a dragged end; the dragged end stays under the
    /// pointer (projected onto the clamped angle) and the partner end is rebuilt.
    fn drag(&mut self, end: RayEnd, point: Vector) {
        if !point.is_finite() {
            return;
        }
        let index = match end {
            RayEnd::Incident(i) | RayEnd::Reflected(i) => i,
        };
        if index >= self.rays.len() {
            return;
        }
        let point = Self::clamp_to_scene(point);
        let measured = point.x.abs().atan2(point.y.abs()).to_degrees();
        let offset = index as Scalar * EXTRA_RAY_SPREAD;
        self.incidence = INCIDENCE_ANGLE.clamp(measured - offset);
        self.rebuild_rays();

        let angle = self.ray_angle(index);
        let distance = point.length();
        let partner = if index == 0 { RAY_LENGTH } else { EXTRA_RAY_LENGTH };
        let ray = &mut self.rays[index];
        match end {
            RayEnd::Incident(_) => {
                ray.incident_end = from_normal_left(angle) * distance;
                ray.reflected_end = from_normal_right(angle) * partner;
            }
            RayEnd::Reflected(_) => {
                ray.reflected_end = from_normal_right(angle) * distance;
                ray.incident_end = from_normal_left(angle) * partner;
            }
        }
        debug!("Dragged {end:?} to incidence {:.1}°", self.incidence);
    }
}

impl Simulation for ReflectionSimulation {
    type Command = ReflectionCommand;

    fn name(&self) -> &'static str {
        "reflection"
    }

    fn apply(&mut self, command: ReflectionCommand) {
        match command {
            ReflectionCommand::SetSurface(surface) => self.surface = surface,
            ReflectionCommand::SetIncidence(v) => {
                self.incidence = INCIDENCE_ANGLE.sanitize(v, self.incidence);
                self.rebuild_rays();
            }
            ReflectionCommand::SetMirrorRadius(v) => {
                self.mirror_radius = MIRROR_RADIUS.sanitize(v, self.mirror_radius)
            }
            ReflectionCommand::AddRay => {
                if self.rays.len() < MAX_RAYS {
                    let ray = self.ray_at(self.rays.len(), EXTRA_RAY_LENGTH);
                    self.rays.push(ray);
                }
            }
            ReflectionCommand::RemoveRay => {
                if self.rays.len() > 1 {
                    self.rays.pop();
                }
            }
            ReflectionCommand::ResetRays => self.reset_rays(),
            ReflectionCommand::Drag(end, point) => self.drag(end, point),
        }
    }

    /// Pure geometry; nothing evolves with time.
    fn step(&mut self, _dt: Scalar) -> StepOutcome {
        StepOutcome::Continue
    }

    fn reset(&mut self) {
        self.incidence = INCIDENCE_ANGLE.default;
        self.reset_rays();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum Medium {
    Air,
    Water,
    Oil,
    Glass,
    Diamond,
}

impl Medium {
    pub fn refractive_index(&self) -> Scalar {
        match self {
            Medium::Air => 1.000,
            Medium::Water => 1.330,
            Medium::Oil => 1.470,
            Medium::Glass => 1.516,
            Medium::Diamond => 2.410,
        }
    }
}

impl std::fmt::Display for Medium {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Medium::Air => write!(f, "Air"),
            Medium::Water => write!(f, "Water"),
            Medium::Oil => write!(f, "Oil"),
            Medium::Glass => write!(f, "Glass"),
            Medium::Diamond => write!(f, "Diamond"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Refraction {
    /// Degrees from the normal; 90 under total internal reflection.
    pub angle: Scalar,
    pub total_internal_reflection: bool,
}

/// Snell's law n₁ sin θ₁ = n₂ sin θ₂, with angles in degrees.
pub fn snell(n1: Scalar, n2: Scalar, incidence: Scalar) -> Refraction {
    let argument = n1 * incidence.to_radians().sin() / n2;
    if !argument.is_finite() || argument.abs() > 1.0 {
        return Refraction {
            angle: 90.0,
            total_internal_reflection: true,
        };
    }
    let angle = argument.clamp(-1.0, 1.0).asin().to_degrees();
    Refraction {
        angle: if angle.is_finite() { angle } else { 90.0 },
        total_internal_reflection: false,
    }
}

/// Critical angle for light going from `n1` into a rarer `n2`.
pub fn critical_angle(n1: Scalar, n2: Scalar) -> Option<Scalar> {
    (n1 > n2).then(|| (n2 / n1).asin().to_degrees())
}

/// Scene size of the refraction bench; the slab spans the middle third.
pub const SLAB_SCENE: Vector = Vector::new(800.0, 450.0);
const ENTRY_X: Scalar = 300.0;
/// Radius of the arc the lamp slides along.
pub const LAMP_RADIUS: Scalar = 120.0;

/// Polyline of a ray through the slab plus the angles at each face.
#[derive(Debug, Clone, PartialEq)]
pub struct SlabTrace {
    pub lamp: Vector,
    pub entry: Vector,
    /// Absent when the ray is totally reflected at the top face.
    pub exit: Option<Vector>,
    /// End of the last drawn segment: below the slab, or back up for a reflection.
    pub end: Vector,
    pub inside: Refraction,
    pub outgoing: Refraction,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RefractionCommand {
    SetOuterMedium(Medium),
    SetSlabMedium(Medium),
    SetIncidence(Scalar),
    /// Slides the lamp toward a scene point.
    DragLamp(Vector),
}

pub struct RefractionSimulation {
    outer: Medium,
    slab: Medium,
    incidence: Scalar,
}

impl Default for RefractionSimulation {
    fn default() -> Self {
        Self::new()
    }
}

impl RefractionSimulation {
    pub fn new() -> Self {
        RefractionSimulation {
            outer: Medium::Air,
            slab: Medium::Glass,
            incidence: REFRACTION_ANGLE.default,
        }
    }

    pub fn media(&self) -> (Medium, Medium) {
        (self.outer, self.slab)
    }

    pub fn incidence(&self) -> Scalar {
        self.incidence
    }

    pub fn top_face(&self) -> Scalar {
        2.0 * SLAB_SCENE.y / 3.0
    }

    pub fn bottom_face(&self) -> Scalar {
        SLAB_SCENE.y / 3.0
    }

    pub fn trace(&self) -> SlabTrace {
        let (n1, n2) = (self.outer.refractive_index(), self.slab.refractive_index());
        let entry = Vector::new(ENTRY_X, self.top_face());
        let lamp = entry + from_normal_left(self.incidence) * LAMP_RADIUS;
        let inside = snell(n1, n2, self.incidence);

        if inside.total_internal_reflection {
            return SlabTrace {
                lamp,
                entry,
                exit: None,
                end: entry + from_normal_right(self.incidence) * LAMP_RADIUS,
                inside,
                outgoing: inside,
            };
        }

        let depth = self.top_face() - self.bottom_face();
        let exit = Vector::new(entry.x + depth * inside.angle.to_radians().tan(), self.bottom_face());
        let outgoing = snell(n2, n1, inside.angle);
        let below = self.bottom_face();
        let end = exit + Vector::new(below * outgoing.angle.to_radians().tan(), -below);
        SlabTrace {
            lamp,
            entry,
            exit: Some(exit),
            end,
            inside,
            outgoing,
        }
    }
}

impl Simulation for RefractionSimulation {
    type Command = RefractionCommand;

    fn name(&self) -> &'static str {
        "refraction"
    }

    fn apply(&mut self, command: RefractionCommand) {
        match command {
            RefractionCommand::SetOuterMedium(medium) => self.outer = medium,
            RefractionCommand::SetSlabMedium(medium) => self.slab = medium,
            RefractionCommand::SetIncidence(v) => {
                self.incidence = REFRACTION_ANGLE.sanitize(v, self.incidence)
            }
            RefractionCommand::DragLamp(point) => {
                if point.is_finite() {
                    let entry = Vector::new(ENTRY_X, self.top_face());
                    let dx = (entry.x - point.x).max(0.0);
                    let dy = (point.y - entry.y).max(0.0);
                    if dx > 0.0 || dy > 0.0 {
                        self.incidence = REFRACTION_ANGLE.clamp(dx.atan2(dy).to_degrees().round());
                    }
                }
            }
        }
    }

    fn step(&mut self, _dt: Scalar) -> StepOutcome {
        StepOutcome::Continue
    }

    fn reset(&mut self) {
        self.incidence = REFRACTION_ANGLE.default;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_snell_air_to_glass() {
        let refraction = snell(1.0, 1.5, 30.0);
        assert_relative_eq!(refraction.angle, 19.47, epsilon = 0.01);
        assert!(!refraction.total_internal_reflection);
    }

    #[test]
    fn test_total_internal_reflection_flagged() {
        let refraction = snell(2.41, 1.0, 60.0);
        assert!(refraction.total_internal_reflection);
        assert_eq!(refraction.angle, 90.0);
        assert_relative_eq!(critical_angle(1.5, 1.0).unwrap(), 41.81, epsilon = 0.01);
        assert_eq!(critical_angle(1.0, 1.5), None);
    }

    #[test]
    fn test_slab_exit_is_parallel_to_entry() {
        let sim = RefractionSimulation::new();
        let trace = sim.trace();
        assert_relative_eq!(trace.outgoing.angle, 30.0, epsilon = 1e-9);
        assert!(trace.exit.unwrap().x > trace.entry.x);
        assert_relative_eq!(trace.lamp.distance(trace.entry), LAMP_RADIUS, epsilon = 1e-9);
    }

    #[test]
    fn test_dense_outer_medium_reflects() {
        let mut sim = RefractionSimulation::new();
        sim.apply(RefractionCommand::SetOuterMedium(Medium::Diamond));
        sim.apply(RefractionCommand::SetSlabMedium(Medium::Air));
        sim.apply(RefractionCommand::SetIncidence(70.0));
        let trace = sim.trace();
        assert!(trace.inside.total_internal_reflection);
        assert_eq!(trace.exit, None);
        assert!(trace.end.y > trace.entry.y);
    }

    #[test]
    fn test_lamp_drag_sets_angle() {
        let mut sim = RefractionSimulation::new();
        let entry = Vector::new(ENTRY_X, sim.top_face());
        sim.apply(RefractionCommand::DragLamp(entry + Vector::new(-100.0, 100.0)));
        assert_eq!(sim.incidence(), 45.0);
        sim.apply(RefractionCommand::DragLamp(entry + Vector::new(-100.0, -50.0)));
        assert_eq!(sim.incidence(), 90.0);
    }

    #[test]
    fn test_reflection_drag_keeps_law() {
        let mut sim = ReflectionSimulation::new();
        sim.apply(ReflectionCommand::AddRay);
        let drags = [
            (RayEnd::Incident(0), Vector::new(-200.0, 80.0)),
            (RayEnd::Reflected(0), Vector::new(30.0, 300.0)),
            (RayEnd::Incident(0), Vector::new(-1000.0, 0.0)),
            (RayEnd::Reflected(1), Vector::new(150.0, 150.0)),
            (RayEnd::Incident(0), Vector::new(0.0, 200.0)),
        ];
        for (end, point) in drags {
            sim.apply(ReflectionCommand::Drag(end, point));
            assert!((1.0..=89.0).contains(&sim.incidence()));
            for ray in sim.rays() {
                assert!((ray.incidence() - ray.reflection()).abs() < 0.1);
            }
        }
    }

    #[test]
    fn test_reflection_drag_follows_pointer() {
        let mut sim = ReflectionSimulation::new();
        sim.apply(ReflectionCommand::Drag(RayEnd::Incident(0), Vector::new(-100.0, 100.0)));
        assert_relative_eq!(sim.incidence(), 45.0, epsilon = 1e-9);
        let ray = sim.rays()[0];
        assert_relative_eq!(ray.incident_end.x, -100.0, epsilon = 1e-9);
        assert_relative_eq!(ray.reflected_end.length(), RAY_LENGTH, epsilon = 1e-9);
    }

    #[test]
    fn test_ray_count_limits() {
        let mut sim = ReflectionSimulation::new();
        for _ in 0..10 {
            sim.apply(ReflectionCommand::AddRay);
        }
        assert_eq!(sim.rays().len(), MAX_RAYS);
        for _ in 0..10 {
            sim.apply(ReflectionCommand::RemoveRay);
        }
        assert_eq!(sim.rays().len(), 1);
    }

    #[test]
    fn test_hit_test_finds_nearest_end() {
        let sim = ReflectionSimulation::new();
        let end = sim.rays()[0].reflected_end;
        assert_eq!(sim.hit_test(end + Vector::new(5.0, 0.0)), Some(RayEnd::Reflected(0)));
        assert_eq!(sim.hit_test(Vector::new(0.0, -300.0)), None);
    }

    #[test]
    fn test_curved_mirror_points() {
        let mut sim = ReflectionSimulation::new();
        assert_eq!(sim.focal_point(), None);
        sim.apply(ReflectionCommand::SetSurface(Surface::Concave));
        assert_eq!(sim.focal_point(), Some(Vector::new(0.0, 100.0)));
        assert_eq!(sim.centre_of_curvature(), Some(Vector::new(0.0, 200.0)));
    }
}
