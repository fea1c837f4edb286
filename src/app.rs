//! Contains all application code, including application state and drawing logic

mod canvas;
mod controls;
mod plot;
mod scenes;

use egui::{Rect, Response, Sense, Style};
use log::info;
use std::time::Instant;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use physlab::config::LabConfig;
use physlab::simulation::charge::{ChargeCommand, ChargeMode, ChargeSimulation};
use physlab::simulation::circuit::{CircuitSimulation, Topology};
use physlab::simulation::freefall::FreeFallSimulation;
use physlab::simulation::heat::{HeatEvent, HeatSimulation};
use physlab::simulation::optics::{RayEnd, ReflectionSimulation, RefractionSimulation};
use physlab::simulation::pendulum::PendulumSimulation;
use physlab::simulation::projectile::ProjectileSimulation;
use physlab::simulation::thermal::ThermalSimulation;
use physlab::simulation::variables::SPEED;
use physlab::simulation::{Phase, Scalar, Scheduler, Simulation};

const MONITOR_REFRESH_RATE: u32 = 60;
/// How long the equilibrium banner stays up, in seconds.
const BANNER_SECONDS: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, clap::ValueEnum)]
pub enum SimulatorKind {
    Pendulum,
    Projectile,
    Charge,
    Heat,
    Series,
    Parallel,
    Reflection,
    Refraction,
    Thermal,
    FreeFall,
}

impl std::fmt::Display for SimulatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulatorKind::Pendulum => write!(f, "Pendulum"),
            SimulatorKind::Projectile => write!(f, "Projectile"),
            SimulatorKind::Charge => write!(f, "Charge"),
            SimulatorKind::Heat => write!(f, "Heat flow"),
            SimulatorKind::Series => write!(f, "Series circuit"),
            SimulatorKind::Parallel => write!(f, "Parallel circuit"),
            SimulatorKind::Reflection => write!(f, "Reflection"),
            SimulatorKind::Refraction => write!(f, "Refraction"),
            SimulatorKind::Thermal => write!(f, "Thermal expansion"),
            SimulatorKind::FreeFall => write!(f, "Free fall"),
        }
    }
}

/// Lifecycle controls shared by every scheduler, whatever it drives.
trait Bench {
    fn start(&mut self);
    fn toggle_pause(&mut self);
    fn reset(&mut self);
    fn step_once(&mut self, dt: Scalar);
    fn tick(&mut self, now: Scalar);
    fn phase(&self) -> Phase;
    fn set_time_scale(&mut self, scale: Scalar);
}

impl<S: Simulation> Bench for Scheduler<S> {
    fn start(&mut self) {
        Scheduler::start(self);
    }

    fn toggle_pause(&mut self) {
        Scheduler::toggle_pause(self);
    }

    fn reset(&mut self) {
        Scheduler::reset(self);
    }

    fn step_once(&mut self, dt: Scalar) {
        Scheduler::step_once(self, dt);
    }

    fn tick(&mut self, now: Scalar) {
        Scheduler::tick(self, now);
    }

    fn phase(&self) -> Phase {
        Scheduler::phase(self)
    }

    fn set_time_scale(&mut self, scale: Scalar) {
        Scheduler::set_time_scale(self, scale);
    }
}

/// One scheduler per simulator; they never share state.
pub struct Lab {
    pub pendulum: Scheduler<PendulumSimulation>,
    pub projectile: Scheduler<ProjectileSimulation>,
    pub charge: Scheduler<ChargeSimulation>,
    pub heat: Scheduler<HeatSimulation>,
    pub series: Scheduler<CircuitSimulation>,
    pub parallel: Scheduler<CircuitSimulation>,
    pub reflection: Scheduler<ReflectionSimulation>,
    pub refraction: Scheduler<RefractionSimulation>,
    pub thermal: Scheduler<ThermalSimulation>,
    pub freefall: Scheduler<FreeFallSimulation>,
}

impl Lab {
    pub fn new(config: &LabConfig) -> Self {
        let max_dt = config.scheduler.max_frame_dt;
        let seed = config.seed;
        Lab {
            pendulum: Scheduler::new(PendulumSimulation::new(&config.pendulum), max_dt),
            projectile: Scheduler::new(
                ProjectileSimulation::new(&config.projectile, &config.camera, seed),
                max_dt,
            ),
            charge: Scheduler::new(
                ChargeSimulation::new(ChargeMode::Friction, &config.charge, seed),
                max_dt,
            ),
            heat: Scheduler::new(HeatSimulation::new(&config.heat), max_dt),
            series: Scheduler::new(
                CircuitSimulation::new(Topology::Series, &config.circuit, seed),
                max_dt,
            ),
            parallel: Scheduler::new(
                CircuitSimulation::new(Topology::Parallel, &config.circuit, seed),
                max_dt,
            ),
            reflection: Scheduler::new(ReflectionSimulation::new(), max_dt),
            refraction: Scheduler::new(RefractionSimulation::new(), max_dt),
            thermal: Scheduler::new(ThermalSimulation::new(&config.thermal), max_dt),
            freefall: Scheduler::new(FreeFallSimulation::new(&config.freefall), max_dt),
        }
    }

    fn bench_mut(&mut self, kind: SimulatorKind) -> &mut dyn Bench {
        match kind {
            SimulatorKind::Pendulum => &mut self.pendulum,
            SimulatorKind::Projectile => &mut self.projectile,
            SimulatorKind::Charge => &mut self.charge,
            SimulatorKind::Heat => &mut self.heat,
            SimulatorKind::Series => &mut self.series,
            SimulatorKind::Parallel => &mut self.parallel,
            SimulatorKind::Reflection => &mut self.reflection,
            SimulatorKind::Refraction => &mut self.refraction,
            SimulatorKind::Thermal => &mut self.thermal,
            SimulatorKind::FreeFall => &mut self.freefall,
        }
    }

    /// The charge model has its own speed parameter; everything else runs on scaled time.
    fn set_speed(&mut self, kind: SimulatorKind, speed: Scalar) {
        match kind {
            SimulatorKind::Charge => self.charge.push(ChargeCommand::SetSpeed(speed)),
            _ => self.bench_mut(kind).set_time_scale(speed),
        }
    }
}

pub struct LabApp {
    lab: Lab,
    kind: SimulatorKind,
    speed: f64,
    manual_step_dt: Scalar,
    frame: u32,
    last_n_frames_start: Instant,
    last_n_frames_time_micros: f32,
    dragging: Option<RayEnd>,
    banner: Option<(String, f64)>,
}

impl LabApp {
    /// Called once before the first frame.
    pub fn new(_cc: &eframe::CreationContext<'_>, config: &LabConfig, kind: SimulatorKind) -> Self {
        Self {
            lab: Lab::new(config),
            kind,
            speed: SPEED.default,
            manual_step_dt: config.scheduler.manual_step_dt,

            frame: 0,
            last_n_frames_start: Instant::now(),
            last_n_frames_time_micros: 1e6,

            dragging: None,
            banner: None,
        }
    }

    fn select(&mut self, kind: SimulatorKind) {
        if kind == self.kind {
            return;
        }
        let previous = self.lab.bench_mut(self.kind);
        if previous.phase() == Phase::Running {
            previous.toggle_pause();
        }
        info!("Switching to {kind}");
        self.kind = kind;
        self.dragging = None;
        self.lab.set_speed(kind, self.speed);
    }

    fn drain_notifications(&mut self, now: f64) {
        for event in self.lab.heat.simulation_mut().drain_events() {
            match event {
                HeatEvent::EquilibriumReached { temperature } => {
                    info!("Heat equilibrium reached at {temperature:.2} °C");
                    self.banner = Some((format!("Equilibrium reached at {temperature:.2} °C"), now));
                }
            }
        }
        if self.banner.as_ref().is_some_and(|(_, at)| now - at > BANNER_SECONDS) {
            self.banner = None;
        }
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        let phase = self.lab.bench_mut(self.kind).phase();
        let stopped = matches!(phase, Phase::Idle | Phase::Paused);
        ui.horizontal(|ui| {
            if ui
                .add_enabled(stopped, egui::Button::new("▶"))
                .on_hover_text("Play simulation")
                .clicked()
            {
                self.lab.bench_mut(self.kind).start();
            }
            if ui
                .add_enabled(phase == Phase::Running, egui::Button::new("⏸"))
                .on_hover_text("Pause simulation")
                .clicked()
            {
                self.lab.bench_mut(self.kind).toggle_pause();
            }
            if ui
                .add_enabled(phase != Phase::Idle, egui::Button::new("⟲"))
                .on_hover_text("Restart simulation")
                .clicked()
            {
                self.lab.bench_mut(self.kind).reset();
                self.banner = None;
            }
            if ui
                .add_enabled(stopped, egui::Button::new("⏭"))
                .on_hover_text("Advance simulation by one step")
                .clicked()
            {
                self.lab.bench_mut(self.kind).step_once(self.manual_step_dt);
            }

            ui.separator();

            ui.label("Speed");
            if ui
                .add(egui::Slider::new(&mut self.speed, SPEED.range()))
                .changed()
            {
                self.lab.set_speed(self.kind, self.speed);
            }
            if ui.button("↺").on_hover_text("Reset").clicked() {
                self.speed = SPEED.default;
                self.lab.set_speed(self.kind, self.speed);
            }

            ui.separator();

            ui.label(format!("{phase:?}"));
            if let Some((text, _)) = &self.banner {
                ui.separator();
                ui.colored_label(egui::Color32::from_rgb(120, 220, 120), text);
            }

            ui.separator();

            ui.label(format!("{0:.0} FPS", 6e7 / self.last_n_frames_time_micros));
        });
    }

    fn draw_scene(&mut self, ui: &mut egui::Ui, extent: Rect, response: &Response) {
        match self.kind {
            SimulatorKind::Pendulum => scenes::pendulum(ui, extent, &self.lab.pendulum),
            SimulatorKind::Projectile => scenes::projectile(ui, extent, response, &mut self.lab.projectile),
            SimulatorKind::Charge => scenes::charge(ui, extent, &self.lab.charge),
            SimulatorKind::Heat => scenes::heat(ui, extent, &self.lab.heat),
            SimulatorKind::Series => scenes::series(ui, extent, &self.lab.series),
            SimulatorKind::Parallel => scenes::parallel(ui, extent, &self.lab.parallel),
            SimulatorKind::Reflection => {
                scenes::reflection(ui, extent, response, &mut self.lab.reflection, &mut self.dragging)
            }
            SimulatorKind::Refraction => scenes::refraction(ui, extent, response, &mut self.lab.refraction),
            SimulatorKind::Thermal => scenes::thermal(ui, extent, &self.lab.thermal),
            SimulatorKind::FreeFall => scenes::freefall(ui, extent, &self.lab.freefall),
        }
    }

    fn parameters(&mut self, ui: &mut egui::Ui) {
        match self.kind {
            SimulatorKind::Pendulum => controls::pendulum(ui, &mut self.lab.pendulum),
            SimulatorKind::Projectile => controls::projectile(ui, &mut self.lab.projectile),
            SimulatorKind::Charge => controls::charge(ui, &mut self.lab.charge),
            SimulatorKind::Heat => controls::heat(ui, &mut self.lab.heat),
            SimulatorKind::Series => controls::circuit(ui, &mut self.lab.series),
            SimulatorKind::Parallel => controls::circuit(ui, &mut self.lab.parallel),
            SimulatorKind::Reflection => controls::reflection(ui, &mut self.lab.reflection),
            SimulatorKind::Refraction => controls::refraction(ui, &mut self.lab.refraction),
            SimulatorKind::Thermal => controls::thermal(ui, &mut self.lab.thermal),
            SimulatorKind::FreeFall => controls::freefall(ui, &mut self.lab.freefall),
        }
    }
}

impl eframe::App for LabApp {
    /// Called each time the UI needs repainting
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.frame % MONITOR_REFRESH_RATE == MONITOR_REFRESH_RATE - 1 {
            self.last_n_frames_time_micros = self.last_n_frames_start.elapsed().as_micros() as f32;
            self.last_n_frames_start = Instant::now();
        }
        self.frame = self.frame.wrapping_add(1);

        let now = ctx.input(|input| input.time);
        self.lab.bench_mut(self.kind).tick(now);
        self.drain_notifications(now);

        egui::TopBottomPanel::top("simulators").show(ctx, |ui| {
            ui.horizontal_wrapped(|ui| {
                let mut selected = self.kind;
                for kind in SimulatorKind::iter() {
                    ui.selectable_value(&mut selected, kind, kind.to_string());
                }
                self.select(selected);
            });
        });

        // draws simulation controls at the bottom of the window
        egui::TopBottomPanel::bottom("controls").show(ctx, |ui| self.controls(ui));

        egui::SidePanel::right("parameters")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.parameters(ui));
            });

        let style = Style::default();
        egui::CentralPanel::default()
            .frame(egui::Frame::canvas(&style))
            .show(ctx, |ui| {
                let canvas_extent = ui.available_rect_before_wrap();
                let response = ui.interact(canvas_extent, egui::Id::new("canvas-drag"), Sense::click_and_drag());
                self.draw_scene(ui, canvas_extent, &response);
            });

        ctx.request_repaint();
    }
}
