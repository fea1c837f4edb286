//! Per-simulator drawing on the central canvas.
//!
//! Scenes only read state, except where the pointer edits the scene (camera
//! pan and zoom, ray ends, the refraction lamp); those edits go through the
//! scheduler as commands like any other control.

use egui::{Color32, Rect, Response, Ui};

use physlab::simulation::Vector;
use physlab::simulation::charge::{ChargeMode, ChargeSimulation, SCENE_SIZE};
use physlab::simulation::circuit::{
    BRANCH_LENGTH, BRANCH_RESISTOR_END, BRANCH_RESISTOR_START, CircuitSimulation, series_layout, series_track_length,
};
use physlab::simulation::freefall::{FreeFallSimulation, LANES};
use physlab::simulation::heat::HeatSimulation;
use physlab::simulation::optics::{
    HIT_RADIUS, MIRROR_SCENE, RayEnd, ReflectionCommand, ReflectionSimulation, RefractionCommand,
    RefractionSimulation, SLAB_SCENE, Surface,
};
use physlab::simulation::pendulum::{Mode, PendulumSimulation};
use physlab::simulation::projectile::{ProjectileCommand, ProjectileSimulation};
use physlab::simulation::thermal::ThermalSimulation;
use physlab::simulation::variables::BODY_TEMPERATURE;
use physlab::simulation::{Scalar, Scheduler};

use super::canvas::Canvas;

const ROD_COLOUR: Color32 = Color32::from_rgb(180, 180, 180);
const BOB_COLOUR: Color32 = Color32::from_rgb(255, 110, 90);
const SECOND_COLOUR: Color32 = Color32::from_rgb(90, 160, 255);
const WIRE_COLOUR: Color32 = Color32::from_rgb(200, 170, 60);
const ELECTRON_COLOUR: Color32 = Color32::from_rgb(120, 200, 255);
const LABEL_COLOUR: Color32 = Color32::LIGHT_GRAY;
const GROUND_COLOUR: Color32 = Color32::from_rgb(70, 110, 60);
const LIGHT_COLOUR: Color32 = Color32::from_rgb(255, 220, 80);

/// Blue at the coldest settable temperature through red at the hottest.
fn temperature_colour(celsius: Scalar) -> Color32 {
    let t = ((celsius - BODY_TEMPERATURE.min) / (BODY_TEMPERATURE.max - BODY_TEMPERATURE.min)).clamp(0.0, 1.0);
    let red = (60.0 + 195.0 * t) as u8;
    let blue = (255.0 - 195.0 * t) as u8;
    Color32::from_rgb(red, 70, blue)
}

pub fn pendulum(ui: &Ui, extent: Rect, scheduler: &Scheduler<PendulumSimulation>) {
    let sim = scheduler.simulation();
    let p = sim.params();
    let reach = match sim.mode() {
        Mode::Single(_) => p.length,
        Mode::Double(_) => p.length1 + p.length2,
    } * 1.2;
    let canvas = Canvas::fit(ui, extent, Vector::new(-reach, -reach), Vector::new(reach, reach * 0.3));

    canvas.draw_segment(Vector::new(-reach * 0.3, 0.0), Vector::new(reach * 0.3, 0.0), 4.0, ROD_COLOUR);
    let (first, second) = sim.bob_positions();

    if let Mode::Double(state) = sim.mode() {
        if state.trail.len() >= 2 {
            canvas.draw_polyline(state.trail.iter().map(|s| s.value), SECOND_COLOUR.gamma_multiply(0.5));
        }
    }

    canvas.draw_segment(Vector::ZERO, first, 2.0, ROD_COLOUR);
    canvas.draw_dot(Vector::ZERO, 4.0, ROD_COLOUR);
    let bob_radius = 0.05 * reach;
    canvas.draw_filled_circle(first, bob_radius, BOB_COLOUR);
    if let Some(second) = second {
        canvas.draw_segment(first, second, 2.0, ROD_COLOUR);
        canvas.draw_filled_circle(second, bob_radius, SECOND_COLOUR);
    }

    if let (Some(forces), Mode::Single(state)) = (sim.forces(), sim.mode()) {
        // Weight is drawn a quarter of the rod long; the others share its scale.
        let per_newton = 0.25 * p.length / forces.weight.max(1e-9);
        let toward_pivot = (-first).normalize_or_zero();
        let swing = Vector::new(state.theta.cos(), state.theta.sin());
        canvas.draw_arrow(first, Vector::new(0.0, -forces.weight * per_newton), Color32::LIGHT_GREEN);
        canvas.draw_arrow(first, toward_pivot * forces.tension * per_newton, Color32::LIGHT_BLUE);
        canvas.draw_arrow(first, swing * -forces.restoring * per_newton, Color32::GOLD);
    }
}

pub fn projectile(ui: &Ui, extent: Rect, response: &Response, scheduler: &mut Scheduler<ProjectileSimulation>) {
    let size = Vector::new(extent.width() as f64, extent.height() as f64);
    if scheduler.simulation().camera().viewport != size {
        scheduler.push(ProjectileCommand::SetViewport(size));
    }
    if response.dragged() {
        let delta = response.drag_delta();
        scheduler.push(ProjectileCommand::Pan(Vector::new(delta.x as f64, delta.y as f64)));
    }
    if response.hovered() {
        let scroll = ui.input(|input| input.smooth_scroll_delta.y);
        if scroll != 0.0 {
            if let Some(pointer) = response.hover_pos() {
                let anchor = pointer - extent.min;
                scheduler.push(ProjectileCommand::Zoom {
                    factor: (scroll as f64 * 0.002).exp(),
                    anchor: Vector::new(anchor.x as f64, anchor.y as f64),
                });
            }
        }
    }

    let sim = scheduler.simulation();
    let canvas = Canvas::with_camera(ui, extent, sim.camera());
    let grid = (100.0 / canvas.scale() as f64).max(1.0);
    let grid = 10f64.powf(grid.log10().ceil());
    canvas.draw_grid_lines(grid);
    canvas.draw_axes();

    for (i, flight) in sim.flights().iter().enumerate() {
        let colour = if i == 0 { BOB_COLOUR } else { SECOND_COLOUR };
        if flight.trajectory.len() >= 2 {
            canvas.draw_polyline(flight.trajectory.iter().copied(), colour);
        }
        let position = Vector::new(flight.position.x, flight.position.y.max(0.0));
        canvas.draw_dot(position, 6.0, colour);
        if flight.airborne() {
            canvas.draw_arrow(position, flight.velocity * 0.2, colour.gamma_multiply(0.6));
        }
    }
    canvas.draw_text(
        canvas.screen_to_world(extent.left_top() + egui::vec2(60.0, 16.0)),
        format!("grid {grid} m"),
        LABEL_COLOUR,
    );
}

pub fn charge(ui: &Ui, extent: Rect, scheduler: &Scheduler<ChargeSimulation>) {
    let sim = scheduler.simulation();
    let (w, h) = (SCENE_SIZE.x, SCENE_SIZE.y);
    let canvas = Canvas::fit(ui, extent, Vector::ZERO, SCENE_SIZE);
    // The charge model works in y-down scene units.
    let at = |x: Scalar, y: Scalar| Vector::new(x, h - y);
    let q = sim.ledger();
    let charge_label = |charge: i32| format!("{charge:+}");

    match sim.mode() {
        ChargeMode::Friction => {
            canvas.draw_rect(at(130.0, h / 2.0 + 40.0), at(190.0, h / 2.0 - 40.0), Color32::from_rgb(200, 190, 170), LABEL_COLOUR);
            canvas.draw_rect(at(w - 230.0, h / 2.0 + 15.0), at(w - 90.0, h / 2.0 - 15.0), Color32::from_rgb(120, 80, 50), LABEL_COLOUR);
            canvas.draw_text(at(160.0, h / 2.0 - 60.0), format!("Wool {}", charge_label(q.donor)), LABEL_COLOUR);
            canvas.draw_text(at(w - 160.0, h / 2.0 - 40.0), format!("Rod {}", charge_label(q.acceptor)), LABEL_COLOUR);
        }
        ChargeMode::Induction => {
            canvas.draw_rect(at(w / 2.0 - 200.0, h / 2.0 + 12.0), at(w / 2.0 - 40.0, h / 2.0 - 12.0), Color32::from_rgb(120, 80, 50), LABEL_COLOUR);
            canvas.draw_text(at(w / 2.0 - 120.0, h / 2.0 - 30.0), "Rod (−)", LABEL_COLOUR);
            canvas.draw_filled_circle(at(w / 2.0 + 100.0, h / 2.0), 50.0, Color32::from_rgb(110, 110, 140));
            canvas.draw_text(at(w / 2.0 + 100.0, h / 2.0 - 70.0), format!("Sphere {}", charge_label(q.donor)), LABEL_COLOUR);
            let ground = at(w / 2.0 + 200.0, h / 2.0 + 80.0);
            if sim.grounded() {
                canvas.draw_segment(at(w / 2.0 + 150.0, h / 2.0), ground, 2.0, WIRE_COLOUR);
            }
            for (i, half_width) in [30.0, 20.0, 10.0].into_iter().enumerate() {
                let y = ground.y - 6.0 * i as Scalar;
                canvas.draw_segment(Vector::new(ground.x - half_width, y), Vector::new(ground.x + half_width, y), 2.0, GROUND_COLOUR);
            }
        }
        ChargeMode::Conduction => {
            canvas.draw_filled_circle(at(w / 2.0 - 120.0, h / 2.0), 60.0, Color32::from_rgb(140, 90, 90));
            canvas.draw_filled_circle(at(w / 2.0 + 120.0, h / 2.0), 60.0, Color32::from_rgb(110, 110, 140));
            canvas.draw_text(at(w / 2.0 - 120.0, h / 2.0 - 80.0), format!("Left {}", charge_label(q.acceptor)), LABEL_COLOUR);
            canvas.draw_text(at(w / 2.0 + 120.0, h / 2.0 - 80.0), format!("Right {}", charge_label(q.donor)), LABEL_COLOUR);
        }
    }

    for electron in sim.electrons() {
        canvas.draw_dot(at(electron.position.x, electron.position.y), 3.0, ELECTRON_COLOUR);
    }
    if sim.equilibrium() {
        canvas.draw_text(at(w / 2.0, 30.0), "Equilibrium", Color32::LIGHT_GREEN);
    }
}

pub fn heat(ui: &Ui, extent: Rect, scheduler: &Scheduler<HeatSimulation>) {
    let sim = scheduler.simulation();
    let p = sim.params();
    let canvas = Canvas::fit(ui, extent, Vector::new(0.0, 0.0), Vector::new(800.0, 500.0));

    // Conductor between the two fixed faces.
    canvas.draw_rect(Vector::new(150.0, 330.0), Vector::new(200.0, 450.0), temperature_colour(p.hot_face), LABEL_COLOUR);
    canvas.draw_rect(Vector::new(600.0, 330.0), Vector::new(650.0, 450.0), temperature_colour(p.cold_face), LABEL_COLOUR);
    let segments = 20;
    for k in 0..segments {
        let t = k as Scalar / segments as Scalar;
        let x = 200.0 + 400.0 * t;
        let temperature = p.hot_face + (p.cold_face - p.hot_face) * (t + 0.5 / segments as Scalar);
        canvas.draw_rect(
            Vector::new(x, 360.0),
            Vector::new(x + 400.0 / segments as Scalar, 420.0),
            temperature_colour(temperature),
            temperature_colour(temperature),
        );
    }
    canvas.draw_text(Vector::new(400.0, 470.0), format!("{} {}: {:.1} W", p.geometry, p.material, p.heat_flow()), LABEL_COLOUR);

    // Two bodies in contact exchanging heat.
    let (ta, tb) = sim.temperatures();
    canvas.draw_rect(Vector::new(200.0, 80.0), Vector::new(400.0, 240.0), temperature_colour(ta), LABEL_COLOUR);
    canvas.draw_rect(Vector::new(400.0, 80.0), Vector::new(600.0, 240.0), temperature_colour(tb), LABEL_COLOUR);
    canvas.draw_text(Vector::new(300.0, 160.0), format!("{}\n{ta:.1} °C", p.body_a.material), Color32::WHITE);
    canvas.draw_text(Vector::new(500.0, 160.0), format!("{}\n{tb:.1} °C", p.body_b.material), Color32::WHITE);
    let flow = sim.interface_flow();
    if flow.abs() > 1e-9 {
        let direction = if flow > 0.0 { 1.0 } else { -1.0 };
        canvas.draw_arrow(Vector::new(400.0 - 40.0 * direction, 60.0), Vector::new(80.0 * direction, 0.0), LIGHT_COLOUR);
    }
    let banner = if sim.equilibrium() {
        format!("Equilibrium at {:.2} °C", sim.final_temperature())
    } else {
        format!("Heading for {:.2} °C", sim.final_temperature())
    };
    canvas.draw_text(Vector::new(400.0, 30.0), banner, LABEL_COLOUR);
}

fn battery(canvas: &Canvas<'_>, centre: Vector, voltage: Scalar) {
    canvas.draw_segment(centre + Vector::new(-16.0, 8.0), centre + Vector::new(16.0, 8.0), 3.0, Color32::WHITE);
    canvas.draw_segment(centre + Vector::new(-8.0, -8.0), centre + Vector::new(8.0, -8.0), 3.0, Color32::WHITE);
    canvas.draw_text(centre + Vector::new(-50.0, 0.0), format!("{voltage:.1} V"), LABEL_COLOUR);
}

fn resistor_box(canvas: &Canvas<'_>, from: Vector, to: Vector, on: bool, label: String) {
    let fill = if on { Color32::from_rgb(90, 70, 50) } else { Color32::from_rgb(40, 40, 40) };
    canvas.draw_rect(from + Vector::new(0.0, -14.0), to + Vector::new(0.0, 14.0), fill, WIRE_COLOUR);
    canvas.draw_text((from + to) / 2.0 + Vector::new(0.0, 28.0), label, LABEL_COLOUR);
}

pub fn series(ui: &Ui, extent: Rect, scheduler: &Scheduler<CircuitSimulation>) {
    let sim = scheduler.simulation();
    let count = sim.resistors().len();
    let layout = series_layout(count);
    let track = series_track_length(count);
    let top = layout.last().map_or(0.0, |span| span.1).max(770.0) + 30.0;
    let height = 260.0;
    let canvas = Canvas::fit(ui, extent, Vector::new(-80.0, -40.0), Vector::new(top + 40.0, height + 60.0));

    // Loop distance runs along the top edge first, then back round the
    // right side, the bottom and the left side.
    let return_leg = (track - top).max(1.0);
    let perimeter = 2.0 * height + top;
    let place = |distance: Scalar| -> Vector {
        let d = distance.rem_euclid(track);
        if d <= top {
            return Vector::new(d, height);
        }
        let s = (d - top) / return_leg * perimeter;
        if s <= height {
            Vector::new(top, height - s)
        } else if s <= height + top {
            Vector::new(top - (s - height), 0.0)
        } else {
            Vector::new(0.0, s - height - top)
        }
    };

    let corners = [
        Vector::new(0.0, height),
        Vector::new(top, height),
        Vector::new(top, 0.0),
        Vector::new(0.0, 0.0),
        Vector::new(0.0, height),
    ];
    canvas.draw_polyline(corners, WIRE_COLOUR);
    battery(&canvas, Vector::new(0.0, height / 2.0), sim.voltage());

    let readings = sim.series().readings;
    for ((start, end), reading) in layout.iter().zip(&readings) {
        resistor_box(
            &canvas,
            Vector::new(*start, height),
            Vector::new(*end, height),
            reading.on,
            format!("R{} {:.0} Ω", reading.id + 1, reading.resistance),
        );
        if !reading.on {
            canvas.draw_text(Vector::new((start + end) / 2.0, height - 30.0), "open", Color32::LIGHT_RED);
        }
    }
    for electron in sim.electrons() {
        canvas.draw_dot(place(electron.distance), 3.0, ELECTRON_COLOUR);
    }
    canvas.draw_text(
        Vector::new(top / 2.0, height / 2.0),
        format!("I = {:.4} A", sim.total_current()),
        LABEL_COLOUR,
    );
}

pub fn parallel(ui: &Ui, extent: Rect, scheduler: &Scheduler<CircuitSimulation>) {
    let sim = scheduler.simulation();
    let resistors = sim.resistors();
    let spacing = 80.0;
    let span = spacing * resistors.len().max(1) as Scalar;
    let canvas = Canvas::fit(
        ui,
        extent,
        Vector::new(-120.0, -spacing),
        Vector::new(BRANCH_LENGTH + 60.0, span + 20.0),
    );

    let lane_y = |index: usize| span - spacing * index as Scalar - spacing / 2.0;
    let bottom = lane_y(resistors.len().saturating_sub(1));
    canvas.draw_segment(Vector::new(0.0, lane_y(0)), Vector::new(0.0, bottom), 2.0, WIRE_COLOUR);
    canvas.draw_segment(
        Vector::new(BRANCH_LENGTH, lane_y(0)),
        Vector::new(BRANCH_LENGTH, bottom),
        2.0,
        WIRE_COLOUR,
    );
    battery(&canvas, Vector::new(-40.0, (lane_y(0) + bottom) / 2.0), sim.voltage());

    let readings = sim.parallel().readings;
    for (index, reading) in readings.iter().enumerate() {
        let y = lane_y(index);
        let colour = if reading.on { WIRE_COLOUR } else { WIRE_COLOUR.gamma_multiply(0.3) };
        canvas.draw_segment(Vector::new(0.0, y), Vector::new(BRANCH_LENGTH, y), 2.0, colour);
        resistor_box(
            &canvas,
            Vector::new(BRANCH_RESISTOR_START, y),
            Vector::new(BRANCH_RESISTOR_END, y),
            reading.on,
            format!("R{} {:.0} Ω  {:.3} A", reading.id + 1, reading.resistance, reading.current),
        );
    }
    for electron in sim.electrons() {
        let Some(index) = resistors.iter().position(|r| r.id == electron.lane) else {
            continue;
        };
        let radius = if electron.in_branch_resistor() { 2.0 } else { 3.0 };
        canvas.draw_dot(Vector::new(electron.distance, lane_y(index)), radius, ELECTRON_COLOUR);
    }
}

pub fn reflection(
    ui: &Ui,
    extent: Rect,
    response: &Response,
    scheduler: &mut Scheduler<ReflectionSimulation>,
    dragging: &mut Option<RayEnd>,
) {
    let lower = match scheduler.simulation().surface() {
        Surface::Convex => -MIRROR_SCENE.y,
        _ => -40.0,
    };
    let min = Vector::new(-MIRROR_SCENE.x, lower);
    let max = Vector::new(MIRROR_SCENE.x, MIRROR_SCENE.y);

    {
        let canvas = Canvas::fit(ui, extent, min, max);
        let pointer = response
            .interact_pointer_pos()
            .map(|pos| canvas.screen_to_world(pos));
        if response.drag_started() {
            *dragging = pointer.and_then(|p| scheduler.simulation().hit_test(p));
        }
        if response.dragged() {
            if let (Some(end), Some(p)) = (*dragging, pointer) {
                scheduler.push(ReflectionCommand::Drag(end, p));
            }
        }
        if response.drag_stopped() {
            *dragging = None;
        }
    }

    let sim = scheduler.simulation();
    let canvas = Canvas::fit(ui, extent, min, max);
    let mirror_colour = Color32::from_rgb(170, 200, 220);
    match sim.surface() {
        Surface::Concave | Surface::Convex => {
            let radius = sim.mirror_radius();
            let sign = if sim.surface() == Surface::Concave { 1.0 } else { -1.0 };
            let centre = Vector::new(0.0, sign * radius);
            let arc = (-30..=30).map(|k| {
                let angle = (k as Scalar).to_radians();
                centre + Vector::new(angle.sin(), -sign * angle.cos()) * radius
            });
            canvas.draw_polyline(arc, mirror_colour);
            if let Some(focus) = sim.focal_point() {
                canvas.draw_dot(focus, 4.0, LIGHT_COLOUR);
                canvas.draw_text(focus + Vector::new(14.0, 0.0), "F", LABEL_COLOUR);
            }
            if let Some(c) = sim.centre_of_curvature() {
                canvas.draw_dot(c, 4.0, Color32::LIGHT_RED);
                canvas.draw_text(c + Vector::new(14.0, 0.0), "C", LABEL_COLOUR);
            }
        }
        surface => {
            let width = if surface == Surface::Smooth { 3.0 } else { 5.0 };
            canvas.draw_segment(Vector::new(-300.0, 0.0), Vector::new(300.0, 0.0), width, mirror_colour);
        }
    }
    canvas.draw_dashed(Vector::ZERO, Vector::new(0.0, MIRROR_SCENE.y * 0.8), LABEL_COLOUR);

    for (i, ray) in sim.rays().iter().enumerate() {
        let alpha = if i == 0 { 1.0 } else { 0.6 };
        canvas.draw_arrow(ray.incident_end, -ray.incident_end, LIGHT_COLOUR.gamma_multiply(alpha));
        canvas.draw_arrow(Vector::ZERO, ray.reflected_end, Color32::from_rgb(255, 160, 60).gamma_multiply(alpha));
        let grabbed = |end: RayEnd| *dragging == Some(end);
        for (end, at) in [
            (RayEnd::Incident(i), ray.incident_end),
            (RayEnd::Reflected(i), ray.reflected_end),
        ] {
            let colour = if grabbed(end) { Color32::WHITE } else { LABEL_COLOUR };
            canvas.draw_ring(at, HIT_RADIUS / 2.0, colour);
        }
    }
    canvas.draw_text(
        Vector::new(0.0, -20.0),
        format!("i = {:.1}°   r = {:.1}°", sim.incidence(), sim.reflection()),
        LABEL_COLOUR,
    );
}

pub fn refraction(ui: &Ui, extent: Rect, response: &Response, scheduler: &mut Scheduler<RefractionSimulation>) {
    let canvas = Canvas::fit(ui, extent, Vector::ZERO, SLAB_SCENE);
    if response.dragged() {
        if let Some(pos) = response.interact_pointer_pos() {
            scheduler.push(RefractionCommand::DragLamp(canvas.screen_to_world(pos)));
        }
    }

    let sim = scheduler.simulation();
    let (outer, slab) = sim.media();
    canvas.draw_rect(
        Vector::new(0.0, sim.bottom_face()),
        Vector::new(SLAB_SCENE.x, sim.top_face()),
        Color32::from_rgba_unmultiplied(120, 170, 220, 60),
        Color32::from_rgb(120, 170, 220),
    );
    canvas.draw_text(Vector::new(SLAB_SCENE.x - 80.0, (sim.top_face() + sim.bottom_face()) / 2.0), slab.to_string(), LABEL_COLOUR);
    canvas.draw_text(Vector::new(SLAB_SCENE.x - 80.0, SLAB_SCENE.y - 30.0), outer.to_string(), LABEL_COLOUR);

    let trace = sim.trace();
    canvas.draw_dashed(
        trace.entry + Vector::new(0.0, 80.0),
        trace.entry - Vector::new(0.0, 80.0),
        LABEL_COLOUR,
    );
    canvas.draw_filled_circle(trace.lamp, 10.0, LIGHT_COLOUR);
    canvas.draw_segment(trace.lamp, trace.entry, 2.0, LIGHT_COLOUR);
    match trace.exit {
        Some(exit) => {
            canvas.draw_segment(trace.entry, exit, 2.0, LIGHT_COLOUR);
            canvas.draw_dashed(exit + Vector::new(0.0, 60.0), exit - Vector::new(0.0, 60.0), LABEL_COLOUR);
            canvas.draw_segment(exit, trace.end, 2.0, LIGHT_COLOUR);
        }
        None => {
            canvas.draw_segment(trace.entry, trace.end, 2.0, Color32::from_rgb(255, 160, 60));
            canvas.draw_text(trace.entry + Vector::new(0.0, -30.0), "Total internal reflection", Color32::LIGHT_RED);
        }
    }
}

pub fn thermal(ui: &Ui, extent: Rect, scheduler: &Scheduler<ThermalSimulation>) {
    let sim = scheduler.simulation();
    let p = sim.params();
    let canvas = Canvas::fit(ui, extent, Vector::new(0.0, 0.0), Vector::new(800.0, 400.0));

    // Relative growth is tiny, so the drawing magnifies it.
    let magnify = 200.0;
    let grow = |material| {
        let reading = sim.reading(material);
        1.0 + magnify * reading.change / p.initial_size().max(1e-9)
    };
    let mut bars = vec![(p.material, BOB_COLOUR, 260.0)];
    if p.comparison {
        bars.push((p.comparison_material, SECOND_COLOUR, 160.0));
    }
    for (material, colour, y) in bars {
        let length = 400.0 * grow(material).max(0.1);
        canvas.draw_rect(Vector::new(100.0, y), Vector::new(100.0 + length, y + 40.0), colour, LABEL_COLOUR);
        canvas.draw_dashed(Vector::new(500.0, y - 10.0), Vector::new(500.0, y + 50.0), LABEL_COLOUR);
        canvas.draw_text(Vector::new(100.0 + length / 2.0, y + 20.0), material.to_string(), Color32::WHITE);
    }

    // Thermometer.
    let fill = ((sim.temperature() + 50.0) / 550.0).clamp(0.0, 1.0) * 250.0;
    canvas.draw_rect(Vector::new(720.0, 80.0), Vector::new(740.0, 330.0), Color32::from_gray(30), LABEL_COLOUR);
    canvas.draw_rect(Vector::new(720.0, 80.0), Vector::new(740.0, 80.0 + fill), Color32::LIGHT_RED, Color32::LIGHT_RED);
    canvas.draw_filled_circle(Vector::new(730.0, 70.0), 18.0, Color32::LIGHT_RED);
    canvas.draw_text(Vector::new(730.0, 350.0), format!("{:.1} °C", sim.temperature()), LABEL_COLOUR);
    canvas.draw_text(
        Vector::new(300.0, 360.0),
        format!("{} expansion, {:?}", p.kind, sim.drive()),
        LABEL_COLOUR,
    );
}

pub fn freefall(ui: &Ui, extent: Rect, scheduler: &Scheduler<FreeFallSimulation>) {
    let sim = scheduler.simulation();
    let tallest = (0..LANES)
        .filter_map(|lane| sim.setup(lane))
        .map(|setup| setup.height_feet)
        .fold(1.0, f64::max);
    let lane_width = tallest * 0.8;
    let canvas = Canvas::fit(
        ui,
        extent,
        Vector::new(-lane_width * 0.2, -tallest * 0.1),
        Vector::new(lane_width * LANES as f64, tallest * 1.15),
    );
    canvas.draw_segment(
        Vector::new(-lane_width * 0.2, 0.0),
        Vector::new(lane_width * LANES as f64, 0.0),
        3.0,
        GROUND_COLOUR,
    );

    for lane in 0..LANES {
        let Some(setup) = sim.setup(lane) else {
            continue;
        };
        let x = lane_width * (lane as f64 + 0.4);
        let colour = if lane == 0 { BOB_COLOUR } else { SECOND_COLOUR };
        canvas.draw_dashed(Vector::new(x, 0.0), Vector::new(x, setup.height_feet), LABEL_COLOUR);
        canvas.draw_text(
            Vector::new(x, setup.height_feet + tallest * 0.07),
            format!("{} · {:.0} ft", setup.planet, setup.height_feet),
            LABEL_COLOUR,
        );
        let height = match &sim.falls()[lane] {
            Some(fall) => fall.setup.height_feet * (1.0 - fall.progress()),
            None => setup.height_feet,
        };
        canvas.draw_dot(Vector::new(x, height), 8.0, colour);
        if let Some(fall) = &sim.falls()[lane] {
            let text = if fall.landed() {
                format!("landed in {:.2} s", fall.duration)
            } else {
                format!("{:.2} s", fall.elapsed)
            };
            canvas.draw_text(Vector::new(x + lane_width * 0.25, height), text, LABEL_COLOUR);
        }
    }
}
