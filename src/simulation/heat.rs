//! Heat conduction: steady flow through a slab, rod or layered wall, and two
//! bodies in contact relaxing toward a common temperature.
//! To add a new material, add it to the Material enum, then enter its
//! properties in the corresponding branch of Material::retrieve_properties()

use log::{debug, info};
use strum_macros::EnumIter;

use super::history::HistorySeries;
use super::variables::{
    BODY_MASS, BODY_TEMPERATURE, CONDUCTIVITY, CONTACT_AREA, SPECIFIC_HEAT, THICKNESS,
};
use super::{EPSILON, Scalar, Simulation, StepOutcome, safe_div};
use crate::config::HeatConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum Material {
    Copper,
    Aluminum,
    Iron,
    Brass,
    Glass,
    Wood,
    Plastic,
    /// Conductivity and specific heat come from the user.
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialProperties {
    /// W/(m·K)
    pub conductivity: Scalar,
    /// J/(kg·K)
    pub specific_heat: Scalar,
    /// kg/m³
    pub density: Scalar,
    pub name: &'static str,
}

impl Material {
    pub fn properties(&self) -> MaterialProperties {
        self.retrieve_properties()
    }

    fn retrieve_properties(&self) -> MaterialProperties {
        let (conductivity, specific_heat, density, name) = match self {
            Material::Copper => (401.0, 385.0, 8960.0, "Copper"),
            Material::Aluminum => (237.0, 897.0, 2700.0, "Aluminum"),
            Material::Iron => (80.0, 449.0, 7870.0, "Iron"),
            Material::Brass => (109.0, 380.0, 8530.0, "Brass"),
            Material::Glass => (1.0, 840.0, 2500.0, "Glass"),
            Material::Wood => (0.12, 1700.0, 700.0, "Wood"),
            Material::Plastic => (0.2, 1500.0, 950.0, "Plastic"),
            Material::Custom => (CONDUCTIVITY.default, SPECIFIC_HEAT.default, 1000.0, "Custom"),
        };
        MaterialProperties {
            conductivity,
            specific_heat,
            density,
            name,
        }
    }

    pub fn name(&self) -> &'static str {
        self.properties().name
    }
}

impl std::fmt::Display for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum Geometry {
    Slab,
    Rod,
    /// Layers in series; falls back to a plain slab when no layers are given.
    Wall,
}

impl std::fmt::Display for Geometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Geometry::Slab => write!(f, "Slab"),
            Geometry::Rod => write!(f, "Rod"),
            Geometry::Wall => write!(f, "Layered wall"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layer {
    pub thickness: Scalar,
    pub conductivity: Scalar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Body {
    A,
    B,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyParams {
    pub material: Material,
    pub mass: Scalar,
    pub initial_temperature: Scalar,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeatParams {
    pub area: Scalar,
    pub thickness: Scalar,
    pub hot_face: Scalar,
    pub cold_face: Scalar,
    pub material: Material,
    pub custom_conductivity: Scalar,
    pub custom_specific_heat: Scalar,
    pub geometry: Geometry,
    pub layers: Vec<Layer>,
    pub body_a: BodyParams,
    pub body_b: BodyParams,
}

impl Default for HeatParams {
    fn default() -> Self {
        Self {
            area: CONTACT_AREA.default,
            thickness: THICKNESS.default,
            hot_face: 100.0,
            cold_face: 20.0,
            material: Material::Copper,
            custom_conductivity: CONDUCTIVITY.default,
            custom_specific_heat: SPECIFIC_HEAT.default,
            geometry: Geometry::Slab,
            layers: Vec::new(),
            body_a: BodyParams {
                material: Material::Copper,
                mass: BODY_MASS.default,
                initial_temperature: 100.0,
            },
            body_b: BodyParams {
                material: Material::Glass,
                mass: BODY_MASS.default,
                initial_temperature: 20.0,
            },
        }
    }
}

impl HeatParams {
    pub fn conductivity(&self, material: Material) -> Scalar {
        match material {
            Material::Custom => self.custom_conductivity.max(0.0),
            _ => material.properties().conductivity,
        }
    }

    pub fn specific_heat(&self, material: Material) -> Scalar {
        match material {
            Material::Custom => self.custom_specific_heat,
            _ => material.properties().specific_heat,
        }
    }

    fn body(&self, body: Body) -> &BodyParams {
        match body {
            Body::A => &self.body_a,
            Body::B => &self.body_b,
        }
    }

    fn body_mut(&mut self, body: Body) -> &mut BodyParams {
        match body {
            Body::A => &mut self.body_a,
            Body::B => &mut self.body_b,
        }
    }

    pub fn heat_capacity(&self, body: Body) -> Scalar {
        let b = self.body(body);
        b.mass * self.specific_heat(b.material)
    }

    /// Steady heat flow in watts between the two faces for the selected geometry.
    pub fn heat_flow(&self) -> Scalar {
        let delta = self.hot_face - self.cold_face;
        match (self.geometry, self.layers.is_empty()) {
            (Geometry::Wall, false) => layered_heat_flow(delta, self.area, &self.layers),
            _ => conduction(self.conductivity(self.material), self.area, delta, self.thickness),
        }
    }

    /// Heat flow through the same geometry made of each body's material.
    pub fn comparison_flows(&self) -> (Scalar, Scalar) {
        if self.geometry == Geometry::Wall && !self.layers.is_empty() {
            let q = self.heat_flow();
            return (q, q);
        }
        let delta = self.hot_face - self.cold_face;
        (
            conduction(self.conductivity(self.body_a.material), self.area, delta, self.thickness),
            conduction(self.conductivity(self.body_b.material), self.area, delta, self.thickness),
        )
    }

    /// Conductivity across the contact: the mean of both bodies' conductivities.
    pub fn interface_conductivity(&self) -> Scalar {
        (self.conductivity(self.body_a.material) + self.conductivity(self.body_b.material)) / 2.0
    }
}

/// Fourier's law Q = kAΔT/d with the thickness floored at [`EPSILON`].
pub fn conduction(conductivity: Scalar, area: Scalar, delta_t: Scalar, thickness: Scalar) -> Scalar {
    conductivity * area * delta_t / thickness.max(EPSILON)
}

/// Q = ΔT / Σ dᵢ/(kᵢA) for layers in series.
pub fn layered_heat_flow(delta_t: Scalar, area: Scalar, layers: &[Layer]) -> Scalar {
    let resistance: Scalar = layers
        .iter()
        .map(|layer| safe_div(layer.thickness, layer.conductivity * area))
        .sum();
    safe_div(delta_t, resistance)
}

/// Common temperature two bodies settle at: (mA cA TA + mB cB TB) / (mA cA + mB cB).
pub fn final_temperature(capacity_a: Scalar, temp_a: Scalar, capacity_b: Scalar, temp_b: Scalar) -> Scalar {
    safe_div(capacity_a * temp_a + capacity_b * temp_b, capacity_a + capacity_b)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeatEvent {
    EquilibriumReached { temperature: Scalar },
}

#[derive(Debug, Clone, PartialEq)]
pub enum HeatCommand {
    SetArea(Scalar),
    SetThickness(Scalar),
    SetHotFace(Scalar),
    SetColdFace(Scalar),
    SetMaterial(Material),
    SetCustomConductivity(Scalar),
    SetCustomSpecificHeat(Scalar),
    SetGeometry(Geometry),
    AddLayer(Layer),
    ClearLayers,
    SetBodyMaterial(Body, Material),
    SetBodyMass(Body, Scalar),
    SetBodyTemperature(Body, Scalar),
}

pub struct HeatSimulation {
    params: HeatParams,
    temperature_a: Scalar,
    temperature_b: Scalar,
    time: Scalar,
    equilibrium: bool,
    events: Vec<HeatEvent>,
    history: HistorySeries<(Scalar, Scalar)>,
    config: HeatConfig,
}

impl HeatSimulation {
    pub fn new(config: &HeatConfig) -> Self {
        let params = HeatParams::default();
        HeatSimulation {
            temperature_a: params.body_a.initial_temperature,
            temperature_b: params.body_b.initial_temperature,
            params,
            time: 0.0,
            equilibrium: false,
            events: Vec::new(),
            history: HistorySeries::new(config.history_capacity),
            config: config.clone(),
        }
    }

    pub fn params(&self) -> &HeatParams {
        &self.params
    }

    pub fn temperatures(&self) -> (Scalar, Scalar) {
        (self.temperature_a, self.temperature_b)
    }

    pub fn equilibrium(&self) -> bool {
        self.equilibrium
    }

    pub fn history(&self) -> &HistorySeries<(Scalar, Scalar)> {
        &self.history
    }

    /// Current heat flow across the contact, positive from A to B.
    pub fn interface_flow(&self) -> Scalar {
        conduction(
            self.params.interface_conductivity(),
            self.params.area,
            self.temperature_a - self.temperature_b,
            self.params.thickness,
        )
    }

    pub fn final_temperature(&self) -> Scalar {
        final_temperature(
            self.params.heat_capacity(Body::A),
            self.temperature_a,
            self.params.heat_capacity(Body::B),
            self.temperature_b,
        )
    }

    /// Returns the pending one-shot notifications, leaving none behind.
    pub fn drain_events(&mut self) -> Vec<HeatEvent> {
        std::mem::take(&mut self.events)
    }

    fn restore_initial(&mut self) {
        self.temperature_a = self.params.body_a.initial_temperature;
        self.temperature_b = self.params.body_b.initial_temperature;
    }
}

impl Simulation for HeatSimulation {
    type Command = HeatCommand;

    fn name(&self) -> &'static str {
        "heat conduction"
    }

    fn apply(&mut self, command: HeatCommand) {
        debug!("Heat command {command:?}");
        let p = &mut self.params;
        match command {
            HeatCommand::SetArea(v) => p.area = CONTACT_AREA.sanitize(v, p.area),
            HeatCommand::SetThickness(v) => p.thickness = THICKNESS.sanitize(v, p.thickness),
            HeatCommand::SetHotFace(v) => p.hot_face = BODY_TEMPERATURE.sanitize(v, p.hot_face),
            HeatCommand::SetColdFace(v) => p.cold_face = BODY_TEMPERATURE.sanitize(v, p.cold_face),
            HeatCommand::SetMaterial(material) => p.material = material,
            HeatCommand::SetCustomConductivity(v) => {
                p.custom_conductivity = CONDUCTIVITY.sanitize(v, p.custom_conductivity)
            }
            HeatCommand::SetCustomSpecificHeat(v) => {
                p.custom_specific_heat = SPECIFIC_HEAT.sanitize(v, p.custom_specific_heat)
            }
            HeatCommand::SetGeometry(geometry) => p.geometry = geometry,
            HeatCommand::AddLayer(layer) => p.layers.push(Layer {
                thickness: THICKNESS.sanitize(layer.thickness, THICKNESS.default),
                conductivity: CONDUCTIVITY.sanitize(layer.conductivity, CONDUCTIVITY.default),
            }),
            HeatCommand::ClearLayers => p.layers.clear(),
            HeatCommand::SetBodyMaterial(body, material) => p.body_mut(body).material = material,
            HeatCommand::SetBodyMass(body, v) => {
                let b = p.body_mut(body);
                b.mass = BODY_MASS.sanitize(v, b.mass);
            }
            HeatCommand::SetBodyTemperature(body, v) => {
                let b = p.body_mut(body);
                b.initial_temperature = BODY_TEMPERATURE.sanitize(v, b.initial_temperature);
                if self.time == 0.0 {
                    self.restore_initial();
                }
            }
        }
    }

    fn step(&mut self, dt: Scalar) -> StepOutcome {
        if self.equilibrium {
            return StepOutcome::Finished;
        }
        if dt <= 0.0 {
            return StepOutcome::Continue;
        }
        self.time += dt;

        let q = self.interface_flow();
        let capacity_a = self.params.heat_capacity(Body::A).max(EPSILON);
        let capacity_b = self.params.heat_capacity(Body::B).max(EPSILON);
        let next_a = self.temperature_a - q * dt / capacity_a;
        let next_b = self.temperature_b + q * dt / capacity_b;

        let before = self.temperature_a - self.temperature_b;
        if !(next_a.is_finite() && next_b.is_finite()) || (next_a - next_b) * before < 0.0 {
            // A step this large would overshoot; land on the common temperature instead.
            let settled = self.final_temperature();
            self.temperature_a = settled;
            self.temperature_b = settled;
        } else {
            self.temperature_a = next_a;
            self.temperature_b = next_b;
        }
        self.history.push(self.time, (self.temperature_a, self.temperature_b));

        if (self.temperature_a - self.temperature_b).abs() < self.config.equilibrium_threshold {
            self.equilibrium = true;
            let temperature = (self.temperature_a + self.temperature_b) / 2.0;
            info!("Heat conduction reached equilibrium at {temperature:.2} °C");
            self.events.push(HeatEvent::EquilibriumReached { temperature });
            return StepOutcome::Finished;
        }
        StepOutcome::Continue
    }

    fn reset(&mut self) {
        self.restore_initial();
        self.time = 0.0;
        self.equilibrium = false;
        self.events.clear();
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn simulation() -> HeatSimulation {
        HeatSimulation::new(&HeatConfig::default())
    }

    #[test]
    fn test_slab_heat_flow() {
        let params = HeatParams::default();
        // copper, 0.01 m², 80 K across 2 cm
        assert_relative_eq!(params.heat_flow(), 401.0 * 0.01 * 80.0 / 0.02);
    }

    #[test]
    fn test_layered_wall_adds_resistances() {
        let layers = [
            Layer {
                thickness: 0.1,
                conductivity: 1.0,
            },
            Layer {
                thickness: 0.05,
                conductivity: 0.5,
            },
        ];
        // R = 0.1/(1*2) + 0.05/(0.5*2) = 0.1
        assert_relative_eq!(layered_heat_flow(30.0, 2.0, &layers), 300.0);
    }

    #[test]
    fn test_zero_thickness_is_floored() {
        assert!(conduction(1.0, 1.0, 1.0, 0.0).is_finite());
    }

    #[test]
    fn test_custom_material_uses_user_values() {
        let mut sim = simulation();
        sim.apply(HeatCommand::SetMaterial(Material::Custom));
        sim.apply(HeatCommand::SetCustomConductivity(50.0));
        assert_relative_eq!(sim.params().heat_flow(), 50.0 * 0.01 * 80.0 / 0.02);
    }

    #[test]
    fn test_relaxes_to_weighted_mean_and_fires_once() {
        let mut sim = simulation();
        let expected = final_temperature(385.0, 100.0, 840.0, 20.0);
        let mut ticks = 0;
        while sim.step(1.0 / 60.0) == StepOutcome::Continue {
            ticks += 1;
            assert!(ticks < 100_000);
        }
        let (a, b) = sim.temperatures();
        assert_relative_eq!(a, expected, epsilon = 0.02);
        assert_relative_eq!(b, expected, epsilon = 0.02);
        assert_eq!(sim.drain_events().len(), 1);
        sim.step(1.0);
        assert!(sim.drain_events().is_empty());
    }

    #[test]
    fn test_equilibrium_is_sticky() {
        let mut sim = simulation();
        while sim.step(0.25) == StepOutcome::Continue {}
        let settled = sim.temperatures();
        let samples = sim.history().len();
        for _ in 0..50 {
            sim.step(0.25);
        }
        assert_eq!(sim.temperatures(), settled);
        assert_eq!(sim.history().len(), samples);
        sim.reset();
        assert_eq!(sim.temperatures(), (100.0, 20.0));
    }

    #[test]
    fn test_huge_step_does_not_overshoot() {
        let mut sim = simulation();
        sim.apply(HeatCommand::SetBodyMass(Body::A, 0.01));
        sim.apply(HeatCommand::SetBodyMass(Body::B, 0.01));
        assert_eq!(sim.step(10.0), StepOutcome::Finished);
        let (a, b) = sim.temperatures();
        assert!(a >= b);
        assert!(a.is_finite());
    }

    #[test]
    fn test_energy_is_conserved_per_step() {
        let mut sim = simulation();
        let total = |sim: &HeatSimulation| {
            let (a, b) = sim.temperatures();
            385.0 * a + 840.0 * b
        };
        let before = total(&sim);
        for _ in 0..100 {
            sim.step(1.0 / 60.0);
        }
        assert_relative_eq!(total(&sim), before, epsilon = 1e-6);
    }
}
