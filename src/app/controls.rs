//! Parameter panels. Widgets never touch simulation state directly: every
//! edit is pushed to the scheduler as a command and applied on the next tick.

use egui::{Color32, Ui};
use strum::IntoEnumIterator;

use physlab::simulation::camera::FollowTarget;
use physlab::simulation::charge::{ChargeCommand, ChargeMode, ChargeSimulation};
use physlab::simulation::circuit::{CircuitCommand, CircuitSimulation, Topology};
use physlab::simulation::freefall::{FreeFallCommand, FreeFallSimulation, LANES, Planet};
use physlab::simulation::heat::{self, Body, Geometry, HeatCommand, HeatSimulation, Layer};
use physlab::simulation::optics::{
    MAX_RAYS, Medium, ReflectionCommand, ReflectionSimulation, RefractionCommand, RefractionSimulation, Surface,
    critical_angle,
};
use physlab::simulation::pendulum::{PendulumCommand, PendulumKind, PendulumSimulation};
use physlab::simulation::projectile::{Flights, LaunchParameter, ProjectileCommand, ProjectileSimulation, Winner};
use physlab::simulation::thermal::{self, ExpansionKind, ThermalCommand, ThermalSimulation};
use physlab::simulation::variables::*;
use physlab::simulation::{Scalar, Scheduler};

use super::plot::{Trace, bar_chart, line_plot};

const FIRST_COLOUR: Color32 = Color32::from_rgb(255, 110, 90);
const SECOND_COLOUR: Color32 = Color32::from_rgb(90, 160, 255);

/// Slider with a reset button; returns the new value when the user changed it.
fn slider(ui: &mut Ui, label: &str, hover: &str, value: Scalar, variable: &Variable) -> Option<Scalar> {
    let mut edited = value;
    let mut result = None;
    ui.horizontal(|ui| {
        ui.label(label).on_hover_text(hover);
        if ui.add(egui::Slider::new(&mut edited, variable.range())).changed() {
            result = Some(edited);
        }
        if ui.button("↺").on_hover_text("Reset").clicked() {
            result = Some(variable.default);
        }
    });
    result
}

/// Free-text number entry, committed with Enter.
fn typed_value(ui: &mut Ui, id_salt: &str, variable: &Variable) -> Option<Scalar> {
    let id = ui.make_persistent_id(id_salt);
    let mut text = ui.data_mut(|data| data.get_temp::<String>(id)).unwrap_or_default();
    let response = ui.add(egui::TextEdit::singleline(&mut text).desired_width(70.0));
    let committed = response.lost_focus() && ui.input(|input| input.key_pressed(egui::Key::Enter));
    ui.data_mut(|data| data.insert_temp(id, text.clone()));
    if !committed {
        return None;
    }
    match variable.parse(&text) {
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("Ignoring input: {err}");
            None
        }
    }
}

/// Drop-down over every variant of an enum.
fn choose<T>(ui: &mut Ui, id_salt: &str, current: T) -> Option<T>
where
    T: IntoEnumIterator + PartialEq + Copy + std::fmt::Display,
{
    let mut selected = current;
    egui::ComboBox::from_id_salt(id_salt)
        .selected_text(current.to_string())
        .show_ui(ui, |ui| {
            for option in T::iter() {
                ui.selectable_value(&mut selected, option, option.to_string());
            }
        });
    (selected != current).then_some(selected)
}

fn toggle(ui: &mut Ui, label: &str, current: bool) -> Option<bool> {
    let mut value = current;
    ui.checkbox(&mut value, label).changed().then_some(value)
}

fn reading(ui: &mut Ui, label: &str, value: String) {
    ui.horizontal(|ui| {
        ui.label(label);
        ui.monospace(value);
    });
}

pub fn pendulum(ui: &mut Ui, scheduler: &mut Scheduler<PendulumSimulation>) {
    let sim = scheduler.simulation();
    let p = sim.params().clone();
    let mut commands = Vec::new();

    ui.heading("Pendulum");
    ui.horizontal(|ui| {
        for kind in PendulumKind::iter() {
            if ui.radio(sim.kind() == kind, kind.to_string()).clicked() && sim.kind() != kind {
                commands.push(PendulumCommand::SetKind(kind));
            }
        }
    });
    ui.separator();

    match sim.kind() {
        PendulumKind::Single => {
            if let Some(v) = slider(ui, "L", "Length (m)", p.length, &PENDULUM_LENGTH) {
                commands.push(PendulumCommand::SetLength(v));
            }
            if let Some(v) = slider(ui, "m", "Bob mass (kg)", p.mass, &PENDULUM_MASS) {
                commands.push(PendulumCommand::SetMass(v));
            }
            if let Some(v) = slider(ui, "θ₀", "Release angle (°)", p.initial_angle, &PENDULUM_ANGLE) {
                commands.push(PendulumCommand::SetInitialAngle(v));
            }
            if let Some(on) = toggle(ui, "Small-angle approximation", p.small_angle) {
                commands.push(PendulumCommand::SetSmallAngle(on));
            }
        }
        PendulumKind::Double => {
            if let Some(v) = slider(ui, "L₁", "Upper rod length (m)", p.length1, &PENDULUM_LENGTH) {
                commands.push(PendulumCommand::SetLength1(v));
            }
            if let Some(v) = slider(ui, "L₂", "Lower rod length (m)", p.length2, &PENDULUM_LENGTH) {
                commands.push(PendulumCommand::SetLength2(v));
            }
            if let Some(v) = slider(ui, "m₁", "Upper bob mass (kg)", p.mass1, &PENDULUM_MASS) {
                commands.push(PendulumCommand::SetMass1(v));
            }
            if let Some(v) = slider(ui, "m₂", "Lower bob mass (kg)", p.mass2, &PENDULUM_MASS) {
                commands.push(PendulumCommand::SetMass2(v));
            }
            if let Some(v) = slider(ui, "θ₁", "Upper release angle (°)", p.angle1, &PENDULUM_ANGLE) {
                commands.push(PendulumCommand::SetAngle1(v));
            }
            if let Some(v) = slider(ui, "θ₂", "Lower release angle (°)", p.angle2, &PENDULUM_ANGLE) {
                commands.push(PendulumCommand::SetAngle2(v));
            }
            if let Some(on) = toggle(ui, "Trail", p.trail_enabled) {
                commands.push(PendulumCommand::SetTrail(on));
            }
        }
    }
    if let Some(v) = slider(ui, "g", "Gravity (m/s²)", p.gravity, &GRAVITY) {
        commands.push(PendulumCommand::SetGravity(v));
    }
    ui.horizontal(|ui| {
        if let Some(on) = toggle(ui, "Damping", p.damping_enabled) {
            commands.push(PendulumCommand::SetDampingEnabled(on));
        }
        if p.damping_enabled {
            let mut damping = p.damping;
            if ui.add(egui::Slider::new(&mut damping, DAMPING.range())).changed() {
                commands.push(PendulumCommand::SetDamping(damping));
            }
        }
    });

    ui.separator();
    reading(ui, "Time", format!("{:.2} s", sim.time()));
    if sim.kind() == PendulumKind::Single {
        reading(ui, "Period", format!("{:.3} s", sim.period()));
        reading(ui, "Frequency", format!("{:.3} Hz", sim.frequency()));
        reading(ui, "Max speed", format!("{:.3} m/s", sim.max_speed()));
        if let Some(forces) = sim.forces() {
            reading(ui, "Weight", format!("{:.2} N", forces.weight));
            reading(ui, "Tension", format!("{:.2} N", forces.tension));
            reading(ui, "Restoring", format!("{:.2} N", forces.restoring));
        }
    }
    reading(ui, "Speed", format!("{:.3} m/s", sim.speed()));
    let energy = sim.energy();
    bar_chart(
        ui,
        &[
            ("Kinetic (J)".to_owned(), energy.kinetic, FIRST_COLOUR),
            ("Potential (J)".to_owned(), energy.potential, SECOND_COLOUR),
            ("Total (J)".to_owned(), energy.total(), Color32::LIGHT_GREEN),
        ],
    );

    let history = sim.history();
    let times = history.times();
    line_plot(
        ui,
        "Displacement (°)",
        &times,
        &[Trace {
            label: "θ",
            values: history.channel(|s| s.displacement),
            colour: FIRST_COLOUR,
        }],
    );
    line_plot(
        ui,
        "Energy (J)",
        &times,
        &[
            Trace {
                label: "kinetic",
                values: history.channel(|s| s.energy.kinetic),
                colour: FIRST_COLOUR,
            },
            Trace {
                label: "potential",
                values: history.channel(|s| s.energy.potential),
                colour: SECOND_COLOUR,
            },
        ],
    );

    for command in commands {
        scheduler.push(command);
    }
}

fn launch_sliders(ui: &mut Ui, sim: &ProjectileSimulation, slot: usize, commands: &mut Vec<ProjectileCommand>) {
    let Some(p) = sim.launch_params(slot).copied() else {
        return;
    };
    let mut set = |parameter: LaunchParameter| commands.push(ProjectileCommand::Set { slot, parameter });
    if let Some(v) = slider(ui, "v₀", "Launch speed (m/s)", p.speed, &LAUNCH_SPEED) {
        set(LaunchParameter::Speed(v));
    }
    if let Some(v) = slider(ui, "θ", "Launch angle (°)", p.angle, &LAUNCH_ANGLE) {
        set(LaunchParameter::Angle(v));
    }
    if let Some(v) = slider(ui, "g", "Gravity (m/s²)", p.gravity, &GRAVITY) {
        set(LaunchParameter::Gravity(v));
    }
    if let Some(v) = slider(ui, "m", "Mass (kg)", p.mass, &PROJECTILE_MASS) {
        set(LaunchParameter::Mass(v));
    }
    if let Some(on) = toggle(ui, "Air resistance", p.air_resistance) {
        set(LaunchParameter::AirResistance(on));
    }
    if p.air_resistance {
        if let Some(v) = slider(ui, "Cd", "Drag coefficient", p.drag_coefficient, &DRAG_COEFFICIENT) {
            set(LaunchParameter::DragCoefficient(v));
        }
    }
    reading(ui, "Predicted range", format!("{:.1} m", p.predicted_range()));
    reading(ui, "Predicted height", format!("{:.1} m", p.predicted_max_height()));
    reading(ui, "Predicted flight", format!("{:.2} s", p.predicted_time_of_flight()));
}

fn winner_text(winner: Winner) -> &'static str {
    match winner {
        Winner::First => "Projectile 1",
        Winner::Second => "Projectile 2",
        Winner::Tie => "Tie",
    }
}

pub fn projectile(ui: &mut Ui, scheduler: &mut Scheduler<ProjectileSimulation>) {
    let sim = scheduler.simulation();
    let mut commands = Vec::new();
    let mut replay = false;

    ui.heading("Projectile");
    if let Some(on) = toggle(ui, "Compare two projectiles", sim.comparison()) {
        commands.push(ProjectileCommand::SetComparison(on));
    }
    ui.horizontal(|ui| {
        if ui.button("Randomize").clicked() {
            commands.push(ProjectileCommand::Randomize);
        }
        if sim.comparison() && ui.button("Copy 1 → 2").clicked() {
            commands.push(ProjectileCommand::SyncParameters);
        }
        if ui
            .add_enabled(sim.has_flown(), egui::Button::new("Replay"))
            .on_hover_text("Relaunch with the same parameters")
            .clicked()
        {
            replay = true;
        }
    });

    ui.separator();
    ui.colored_label(FIRST_COLOUR, "Projectile 1");
    launch_sliders(ui, sim, 0, &mut commands);
    if sim.comparison() {
        ui.separator();
        ui.colored_label(SECOND_COLOUR, "Projectile 2");
        launch_sliders(ui, sim, 1, &mut commands);
    }

    ui.separator();
    ui.label("Camera");
    let camera = sim.camera();
    ui.horizontal(|ui| {
        if let Some(on) = toggle(ui, "Auto-scale", camera.auto_scale()) {
            commands.push(ProjectileCommand::SetAutoScale(on));
        }
        if ui.button("Reset view").clicked() {
            commands.push(ProjectileCommand::ResetView);
        }
    });
    ui.horizontal(|ui| {
        ui.label("Follow");
        let mut follow = camera.follow();
        let options = [
            (None, "Off"),
            (Some(FollowTarget::First), "1"),
            (Some(FollowTarget::Second), "2"),
            (Some(FollowTarget::Both), "Both"),
        ];
        for (target, label) in options {
            if (target != Some(FollowTarget::Second) || sim.comparison())
                && ui.selectable_value(&mut follow, target, label).clicked()
            {
                commands.push(ProjectileCommand::SetFollow(target));
            }
        }
    });
    reading(ui, "Scale", format!("{:.2} px/m", camera.scale));

    ui.separator();
    reading(ui, "Time", format!("{:.2} s", sim.time()));
    for (i, flight) in sim.flights().iter().enumerate() {
        reading(
            ui,
            &format!("#{} position", i + 1),
            format!("({:.1}, {:.1}) m", flight.position.x, flight.position.y.max(0.0)),
        );
        reading(ui, &format!("#{} speed", i + 1), format!("{:.1} m/s", flight.speed()));
        reading(ui, &format!("#{} max height", i + 1), format!("{:.1} m", flight.max_height()));
    }
    if let Some(results) = sim.results() {
        ui.separator();
        ui.label("Results");
        reading(
            ui,
            "Range",
            format!("{} by {:.1} m", winner_text(results.range_winner), results.range_difference),
        );
        reading(
            ui,
            "Height",
            format!("{} by {:.1} m", winner_text(results.height_winner), results.height_difference),
        );
        reading(
            ui,
            "Flight time",
            format!("{} by {:.2} s", winner_text(results.time_winner), results.time_difference),
        );
    }
    if let Flights::Comparison(_) = sim.flights() {
        let history = sim.history();
        let times = history.times();
        line_plot(
            ui,
            "Speed (m/s)",
            &times,
            &[
                Trace {
                    label: "1",
                    values: history.channel(|s| s.speeds[0]),
                    colour: FIRST_COLOUR,
                },
                Trace {
                    label: "2",
                    values: history.channel(|s| s.speeds[1]),
                    colour: SECOND_COLOUR,
                },
            ],
        );
        line_plot(
            ui,
            "Height (m)",
            &times,
            &[
                Trace {
                    label: "1",
                    values: history.channel(|s| s.heights[0]),
                    colour: FIRST_COLOUR,
                },
                Trace {
                    label: "2",
                    values: history.channel(|s| s.heights[1]),
                    colour: SECOND_COLOUR,
                },
            ],
        );
    }

    for command in commands {
        scheduler.push(command);
    }
    if replay {
        scheduler.reset();
        scheduler.start();
    }
}

pub fn charge(ui: &mut Ui, scheduler: &mut Scheduler<ChargeSimulation>) {
    let sim = scheduler.simulation();
    let mut commands = Vec::new();

    ui.heading("Charging");
    ui.horizontal(|ui| {
        for mode in ChargeMode::iter() {
            if ui.radio(sim.mode() == mode, mode.to_string()).clicked() && sim.mode() != mode {
                commands.push(ChargeCommand::SetMode(mode));
            }
        }
    });
    if sim.mode() == ChargeMode::Induction {
        if let Some(on) = toggle(ui, "Connect to ground", sim.grounded()) {
            commands.push(ChargeCommand::SetGrounded(on));
        }
    }
    ui.label(sim.mode().description());

    ui.separator();
    let q = sim.ledger();
    reading(ui, sim.mode().donor_name(), format!("{:+} e", q.donor));
    reading(ui, sim.mode().acceptor_name(), format!("{:+} e", q.acceptor));
    reading(ui, "Electrons in flight", sim.electrons().len().to_string());
    reading(ui, "Emission", format!("{:.1} /s", sim.emission_rate()));
    if sim.equilibrium() {
        ui.colored_label(Color32::LIGHT_GREEN, "Equilibrium");
    }

    let history = sim.history();
    line_plot(
        ui,
        "Net charge (e)",
        &history.times(),
        &[
            Trace {
                label: sim.mode().donor_name(),
                values: history.channel(|q| q.donor as Scalar),
                colour: FIRST_COLOUR,
            },
            Trace {
                label: sim.mode().acceptor_name(),
                values: history.channel(|q| q.acceptor as Scalar),
                colour: SECOND_COLOUR,
            },
        ],
    );

    for command in commands {
        scheduler.push(command);
    }
}

fn body_controls(ui: &mut Ui, sim: &HeatSimulation, body: Body, commands: &mut Vec<HeatCommand>) {
    let b = match body {
        Body::A => sim.params().body_a,
        Body::B => sim.params().body_b,
    };
    let label = match body {
        Body::A => "Body A",
        Body::B => "Body B",
    };
    ui.horizontal(|ui| {
        ui.label(label);
        if let Some(material) = choose::<heat::Material>(ui, label, b.material) {
            commands.push(HeatCommand::SetBodyMaterial(body, material));
        }
    });
    if let Some(v) = slider(ui, "m", "Mass (kg)", b.mass, &BODY_MASS) {
        commands.push(HeatCommand::SetBodyMass(body, v));
    }
    if let Some(v) = slider(ui, "T₀", "Initial temperature (°C)", b.initial_temperature, &BODY_TEMPERATURE) {
        commands.push(HeatCommand::SetBodyTemperature(body, v));
    }
}

pub fn heat(ui: &mut Ui, scheduler: &mut Scheduler<HeatSimulation>) {
    let sim = scheduler.simulation();
    let p = sim.params();
    let mut commands = Vec::new();

    ui.heading("Heat conduction");
    ui.horizontal(|ui| {
        ui.label("Geometry");
        if let Some(geometry) = choose::<Geometry>(ui, "geometry", p.geometry) {
            commands.push(HeatCommand::SetGeometry(geometry));
        }
        ui.label("Material");
        if let Some(material) = choose::<heat::Material>(ui, "slab-material", p.material) {
            commands.push(HeatCommand::SetMaterial(material));
        }
    });
    if p.material == heat::Material::Custom {
        if let Some(v) = slider(ui, "k", "Conductivity (W/m·K)", p.custom_conductivity, &CONDUCTIVITY) {
            commands.push(HeatCommand::SetCustomConductivity(v));
        }
        if let Some(v) = slider(ui, "c", "Specific heat (J/kg·K)", p.custom_specific_heat, &SPECIFIC_HEAT) {
            commands.push(HeatCommand::SetCustomSpecificHeat(v));
        }
    }
    if let Some(v) = slider(ui, "A", "Contact area (m²)", p.area, &CONTACT_AREA) {
        commands.push(HeatCommand::SetArea(v));
    }
    if let Some(v) = slider(ui, "d", "Thickness (m)", p.thickness, &THICKNESS) {
        commands.push(HeatCommand::SetThickness(v));
    }
    if let Some(v) = slider(ui, "T hot", "Hot face (°C)", p.hot_face, &BODY_TEMPERATURE) {
        commands.push(HeatCommand::SetHotFace(v));
    }
    if let Some(v) = slider(ui, "T cold", "Cold face (°C)", p.cold_face, &BODY_TEMPERATURE) {
        commands.push(HeatCommand::SetColdFace(v));
    }
    if p.geometry == Geometry::Wall {
        ui.horizontal(|ui| {
            ui.label(format!("{} layers", p.layers.len()));
            if ui.button("Add layer").clicked() {
                commands.push(HeatCommand::AddLayer(Layer {
                    thickness: p.thickness,
                    conductivity: p.conductivity(p.material),
                }));
            }
            if ui.button("Clear").clicked() {
                commands.push(HeatCommand::ClearLayers);
            }
        });
    }
    reading(ui, "Heat flow", format!("{:.2} W", p.heat_flow()));
    let (flow_a, flow_b) = p.comparison_flows();
    bar_chart(
        ui,
        &[
            (format!("{} (W)", p.body_a.material), flow_a, FIRST_COLOUR),
            (format!("{} (W)", p.body_b.material), flow_b, SECOND_COLOUR),
        ],
    );

    ui.separator();
    body_controls(ui, sim, Body::A, &mut commands);
    body_controls(ui, sim, Body::B, &mut commands);

    ui.separator();
    let (ta, tb) = sim.temperatures();
    reading(ui, "T A", format!("{ta:.2} °C"));
    reading(ui, "T B", format!("{tb:.2} °C"));
    reading(ui, "Interface flow", format!("{:.2} W", sim.interface_flow()));
    reading(ui, "Final temperature", format!("{:.2} °C", sim.final_temperature()));
    if sim.equilibrium() {
        ui.colored_label(Color32::LIGHT_GREEN, "Equilibrium");
    }
    let history = sim.history();
    line_plot(
        ui,
        "Temperature (°C)",
        &history.times(),
        &[
            Trace {
                label: "A",
                values: history.channel(|t| t.0),
                colour: FIRST_COLOUR,
            },
            Trace {
                label: "B",
                values: history.channel(|t| t.1),
                colour: SECOND_COLOUR,
            },
        ],
    );

    for command in commands {
        scheduler.push(command);
    }
}

pub fn circuit(ui: &mut Ui, scheduler: &mut Scheduler<CircuitSimulation>) {
    let sim = scheduler.simulation();
    let mut commands = Vec::new();

    ui.heading(format!("{} circuit", sim.topology()));
    if let Some(v) = slider(ui, "V", "Supply voltage (V)", sim.voltage(), &VOLTAGE) {
        commands.push(CircuitCommand::SetVoltage(v));
    }
    ui.horizontal(|ui| {
        ui.label("New resistor (Ω)");
        if let Some(v) = typed_value(ui, "new-resistor", &RESISTANCE) {
            commands.push(CircuitCommand::AddResistor(v));
        }
        if ui.button("Add").clicked() {
            commands.push(CircuitCommand::AddResistor(RESISTANCE.default));
        }
    });

    ui.separator();
    for resistor in sim.resistors() {
        ui.horizontal(|ui| {
            if toggle(ui, &format!("R{}", resistor.id + 1), resistor.on).is_some() {
                commands.push(CircuitCommand::Toggle(resistor.id));
            }
            let mut resistance = resistor.resistance;
            if ui
                .add(egui::Slider::new(&mut resistance, RESISTANCE.range()).logarithmic(true))
                .changed()
            {
                commands.push(CircuitCommand::SetResistance {
                    id: resistor.id,
                    resistance,
                });
            }
            if ui.button("✖").on_hover_text("Remove").clicked() {
                commands.push(CircuitCommand::RemoveResistor(resistor.id));
            }
        });
    }

    ui.separator();
    let (readings, summary) = match sim.topology() {
        Topology::Series => {
            let s = sim.series();
            let summary = vec![
                ("Total resistance", format!("{:.2} Ω", s.total_resistance)),
                ("Current", format!("{:.4} A", s.current)),
                ("Power", format!("{:.3} W", s.total_power)),
                ("Circuit", if s.open { "open" } else { "closed" }.to_owned()),
            ];
            (s.readings, summary)
        }
        Topology::Parallel => {
            let s = sim.parallel();
            let equivalent = s
                .equivalent_resistance
                .map_or("∞ (no branch on)".to_owned(), |r| format!("{r:.2} Ω"));
            let summary = vec![
                ("Equivalent resistance", equivalent),
                ("Total current", format!("{:.4} A", s.total_current)),
                ("Power", format!("{:.3} W", s.total_power)),
            ];
            (s.readings, summary)
        }
    };
    for (label, value) in summary {
        reading(ui, label, value);
    }
    egui::Grid::new("readings").striped(true).show(ui, |ui| {
        ui.label("");
        ui.label("I (A)");
        ui.label("V (V)");
        ui.label("P (W)");
        ui.end_row();
        for r in &readings {
            ui.label(format!("R{}", r.id + 1));
            ui.monospace(format!("{:.4}", r.current));
            ui.monospace(format!("{:.3}", r.voltage));
            ui.monospace(format!("{:.3}", r.power));
            ui.end_row();
        }
    });

    for command in commands {
        scheduler.push(command);
    }
}

pub fn reflection(ui: &mut Ui, scheduler: &mut Scheduler<ReflectionSimulation>) {
    let sim = scheduler.simulation();
    let mut commands = Vec::new();

    ui.heading("Reflection");
    ui.horizontal(|ui| {
        ui.label("Surface");
        if let Some(surface) = choose::<Surface>(ui, "surface", sim.surface()) {
            commands.push(ReflectionCommand::SetSurface(surface));
        }
    });
    ui.label(sim.surface().description());
    if let Some(v) = slider(ui, "θi", "Angle of incidence (°)", sim.incidence(), &INCIDENCE_ANGLE) {
        commands.push(ReflectionCommand::SetIncidence(v));
    }
    if sim.surface().curved() {
        if let Some(v) = slider(ui, "R", "Radius of curvature", sim.mirror_radius(), &MIRROR_RADIUS) {
            commands.push(ReflectionCommand::SetMirrorRadius(v));
        }
    }
    ui.horizontal(|ui| {
        if ui
            .add_enabled(sim.rays().len() < MAX_RAYS, egui::Button::new("Add ray"))
            .clicked()
        {
            commands.push(ReflectionCommand::AddRay);
        }
        if ui
            .add_enabled(sim.rays().len() > 1, egui::Button::new("Remove ray"))
            .clicked()
        {
            commands.push(ReflectionCommand::RemoveRay);
        }
        if ui.button("Reset rays").clicked() {
            commands.push(ReflectionCommand::ResetRays);
        }
    });

    ui.separator();
    reading(ui, "Incidence", format!("{:.1}°", sim.incidence()));
    reading(ui, "Reflection", format!("{:.1}°", sim.reflection()));
    reading(ui, "Image", sim.surface().image_description().to_owned());
    if let (Some(f), Some(c)) = (sim.focal_point(), sim.centre_of_curvature()) {
        reading(ui, "Focal length", format!("{:.0}", f.y.abs()));
        reading(ui, "Centre of curvature", format!("{:.0}", c.y.abs()));
    }
    ui.label("Drag a ray end to change the angle.");

    for command in commands {
        scheduler.push(command);
    }
}

pub fn refraction(ui: &mut Ui, scheduler: &mut Scheduler<RefractionSimulation>) {
    let sim = scheduler.simulation();
    let (outer, slab) = sim.media();
    let mut commands = Vec::new();

    ui.heading("Refraction");
    ui.horizontal(|ui| {
        ui.label("Outside");
        if let Some(medium) = choose::<Medium>(ui, "outer-medium", outer) {
            commands.push(RefractionCommand::SetOuterMedium(medium));
        }
        ui.label("Slab");
        if let Some(medium) = choose::<Medium>(ui, "slab-medium", slab) {
            commands.push(RefractionCommand::SetSlabMedium(medium));
        }
    });
    if let Some(v) = slider(ui, "θ₁", "Angle of incidence (°)", sim.incidence(), &REFRACTION_ANGLE) {
        commands.push(RefractionCommand::SetIncidence(v));
    }

    ui.separator();
    let (n1, n2) = (outer.refractive_index(), slab.refractive_index());
    let trace = sim.trace();
    reading(ui, "n₁", format!("{n1:.3}"));
    reading(ui, "n₂", format!("{n2:.3}"));
    reading(ui, "θ₂", format!("{:.2}°", trace.inside.angle));
    reading(ui, "Exit angle", format!("{:.2}°", trace.outgoing.angle));
    if let Some(critical) = critical_angle(n1, n2) {
        reading(ui, "Critical angle", format!("{critical:.2}°"));
    }
    if trace.inside.total_internal_reflection {
        ui.colored_label(Color32::from_rgb(255, 200, 80), "Total internal reflection");
    }
    ui.label("Drag the lamp to change the angle.");

    for command in commands {
        scheduler.push(command);
    }
}

pub fn thermal(ui: &mut Ui, scheduler: &mut Scheduler<ThermalSimulation>) {
    let sim = scheduler.simulation();
    let p = *sim.params();
    let mut commands = Vec::new();

    ui.heading("Thermal expansion");
    ui.horizontal(|ui| {
        for kind in ExpansionKind::iter() {
            if ui.radio(p.kind == kind, kind.to_string()).clicked() && p.kind != kind {
                commands.push(ThermalCommand::SetKind(kind));
            }
        }
    });
    ui.horizontal(|ui| {
        ui.label("Material");
        if let Some(material) = choose::<thermal::Material>(ui, "expansion-material", p.material) {
            commands.push(ThermalCommand::SetMaterial(material));
        }
    });
    ui.horizontal(|ui| {
        if let Some(on) = toggle(ui, "Compare with", p.comparison) {
            commands.push(ThermalCommand::SetComparison(on));
        }
        if p.comparison {
            if let Some(material) = choose::<thermal::Material>(ui, "expansion-comparison", p.comparison_material) {
                commands.push(ThermalCommand::SetComparisonMaterial(material));
            }
        }
    });
    let size = match p.kind {
        ExpansionKind::Linear => slider(ui, "L₀", "Initial length (mm)", p.initial_length, &INITIAL_LENGTH),
        ExpansionKind::Areal => slider(ui, "A₀", "Initial area (mm²)", p.initial_area, &INITIAL_AREA),
        ExpansionKind::Volumetric => slider(ui, "V₀", "Initial volume (mm³)", p.initial_volume, &INITIAL_VOLUME),
    };
    if let Some(v) = size {
        commands.push(ThermalCommand::SetInitialSize(p.kind, v));
    }
    if let Some(v) = slider(ui, "T", "Target temperature (°C)", sim.target(), &EXPANSION_TEMPERATURE) {
        commands.push(ThermalCommand::SetTarget(v));
    }
    if let Some(v) = slider(ui, "Rate", "Ramp rate (°C/s)", p.ramp_rate, &RAMP_RATE) {
        commands.push(ThermalCommand::SetRampRate(v));
    }
    ui.horizontal(|ui| {
        if ui.button("🔥 Heat").clicked() {
            commands.push(ThermalCommand::Heat);
        }
        if ui.button("❄ Cool").clicked() {
            commands.push(ThermalCommand::Cool);
        }
        if ui.button("Hold").clicked() {
            commands.push(ThermalCommand::Hold);
        }
    });

    ui.separator();
    let unit = p.kind.unit();
    reading(ui, "Temperature", format!("{:.1} °C", sim.temperature()));
    reading(ui, "ΔT", format!("{:+.1} °C", sim.delta_t()));
    reading(ui, "α", format!("{:.1e} /°C", p.material.alpha()));
    let primary = sim.primary();
    reading(ui, "Change", format!("{:+.4} {unit}", primary.change));
    reading(ui, "Final size", format!("{:.4} {unit}", primary.final_size));
    if let Some(secondary) = sim.secondary() {
        reading(
            ui,
            &format!("{} change", p.comparison_material),
            format!("{:+.4} {unit}", secondary.change),
        );
    }

    let history = sim.history();
    let mut traces = vec![Trace {
        label: "primary",
        values: history.channel(|s| s.primary),
        colour: FIRST_COLOUR,
    }];
    if p.comparison {
        traces.push(Trace {
            label: "comparison",
            values: history.channel(|s| s.secondary.unwrap_or(0.0)),
            colour: SECOND_COLOUR,
        });
    }
    line_plot(ui, &format!("Expansion ({unit})"), &history.times(), &traces);

    for command in commands {
        scheduler.push(command);
    }
}

pub fn freefall(ui: &mut Ui, scheduler: &mut Scheduler<FreeFallSimulation>) {
    let sim = scheduler.simulation();
    let mut commands = Vec::new();

    ui.heading("Free fall");
    if let Some(on) = toggle(ui, "Air resistance", sim.air_resistance()) {
        commands.push(FreeFallCommand::SetAirResistance(on));
    }
    for lane in 0..LANES {
        let Some(setup) = sim.setup(lane).copied() else {
            continue;
        };
        ui.separator();
        ui.horizontal(|ui| {
            ui.label(format!("Object {}", lane + 1));
            if let Some(planet) = choose::<Planet>(ui, &format!("planet-{lane}"), setup.planet) {
                commands.push(FreeFallCommand::SetPlanet(lane, planet));
            }
        });
        if setup.planet == Planet::Custom {
            ui.horizontal(|ui| {
                ui.label("g (m/s²)");
                if let Some(v) = typed_value(ui, &format!("gravity-{lane}"), &GRAVITY) {
                    commands.push(FreeFallCommand::SetCustomGravity(lane, v));
                }
            });
        }
        if let Some(v) = slider(ui, "h", "Height (ft)", setup.height_feet, &DROP_HEIGHT_FEET) {
            commands.push(FreeFallCommand::SetHeight(lane, v));
        }
        reading(ui, "Gravity", format!("{:.2} m/s²", setup.gravity()));
        reading(ui, "Fall time", format!("{:.2} s", sim.fall_time(&setup)));
    }

    ui.separator();
    ui.horizontal(|ui| {
        if ui.button("Drop").clicked() {
            commands.push(FreeFallCommand::Drop);
        }
        if ui.button("Drop both").clicked() {
            commands.push(FreeFallCommand::DropBoth);
        }
        if ui
            .add_enabled(sim.last_drop().is_some(), egui::Button::new("Replay"))
            .clicked()
        {
            commands.push(FreeFallCommand::ReplayLast);
        }
    });
    for (lane, fall) in sim.falls().iter().enumerate() {
        if let Some(fall) = fall {
            reading(ui, &format!("Object {} time left", lane + 1), format!("{:.2} s", fall.remaining()));
        }
    }

    ui.separator();
    ui.horizontal(|ui| {
        ui.label("History");
        if ui.small_button("Clear").clicked() {
            commands.push(FreeFallCommand::ClearHistory);
        }
    });
    for record in sim.history().iter() {
        ui.label(format!("{} ({:.2} s)", record.value.label, record.value.fall_time));
    }

    for command in commands {
        scheduler.push(command);
    }
}
