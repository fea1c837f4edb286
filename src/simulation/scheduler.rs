//! Frame-driven scheduler: turns a host clock into stepper calls.
//!
//! The host calls [`Scheduler::tick`] once per frame with a monotonic time in
//! seconds. Commands pushed by the UI are applied at the start of the next
//! tick, so the stepper only ever sees a consistent parameter set.

use log::{debug, info};
use std::collections::VecDeque;

use super::{Scalar, Simulation, StepOutcome};

/// Timing state owned by a single scheduler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationClock {
    pub running: bool,
    pub paused: bool,
    pub last_timestamp: Option<Scalar>,
    /// Simulated seconds elapsed since the last reset.
    pub accumulated_time: Scalar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Paused,
    Finished,
}

/// What happened during one call to [`Scheduler::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub dt: Scalar,
    pub stepped: bool,
    pub outcome: StepOutcome,
}

impl Tick {
    fn idle() -> Self {
        Tick {
            dt: 0.0,
            stepped: false,
            outcome: StepOutcome::Continue,
        }
    }
}

pub struct Scheduler<S: Simulation> {
    simulation: S,
    clock: SimulationClock,
    commands: VecDeque<S::Command>,
    finished: bool,
    max_frame_dt: Scalar,
    time_scale: Scalar,
}

impl<S: Simulation> Scheduler<S> {
    pub fn new(simulation: S, max_frame_dt: Scalar) -> Self {
        Scheduler {
            simulation,
            clock: SimulationClock::default(),
            commands: VecDeque::new(),
            finished: false,
            max_frame_dt: max_frame_dt.max(0.0),
            time_scale: 1.0,
        }
    }

    pub fn simulation(&self) -> &S {
        &self.simulation
    }

    /// Direct access for reading derived state that needs `&mut` (draining events).
    pub fn simulation_mut(&mut self) -> &mut S {
        &mut self.simulation
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn time_scale(&self) -> Scalar {
        self.time_scale
    }

    pub fn set_time_scale(&mut self, scale: Scalar) {
        self.time_scale = super::variables::SPEED.sanitize(scale, self.time_scale);
    }

    pub fn phase(&self) -> Phase {
        if self.finished {
            Phase::Finished
        } else if !self.clock.running {
            Phase::Idle
        } else if self.clock.paused {
            Phase::Paused
        } else {
            Phase::Running
        }
    }

    pub fn push(&mut self, command: S::Command) {
        self.commands.push_back(command);
    }

    pub fn start(&mut self) {
        if self.clock.running {
            self.resume();
            return;
        }
        if self.finished {
            return;
        }
        info!("Starting {}", self.simulation.name());
        self.drain_commands();
        self.clock.running = true;
        self.clock.paused = false;
        self.clock.last_timestamp = None;
        self.simulation.on_start();
    }

    pub fn pause(&mut self) {
        if self.clock.running && !self.clock.paused {
            debug!("Pausing {}", self.simulation.name());
            self.clock.paused = true;
        }
    }

    /// The first tick after resuming has zero dt, however long the pause was.
    pub fn resume(&mut self) {
        if self.clock.running && self.clock.paused {
            debug!("Resuming {}", self.simulation.name());
            self.clock.paused = false;
            self.clock.last_timestamp = None;
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.clock.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    pub fn reset(&mut self) {
        info!("Resetting {}", self.simulation.name());
        self.clock = SimulationClock::default();
        self.finished = false;
        self.drain_commands();
        self.simulation.reset();
    }

    /// Advances by exactly `dt` while stopped or paused.
    pub fn step_once(&mut self, dt: Scalar) -> Tick {
        self.drain_commands();
        if (self.clock.running && !self.clock.paused) || self.finished {
            return Tick::idle();
        }
        let dt = dt.clamp(0.0, self.max_frame_dt) * self.time_scale;
        self.advance(dt)
    }

    pub fn tick(&mut self, now: Scalar) -> Tick {
        if now.is_finite() {
            self.simulation.observe_host_time(now);
        }
        self.drain_commands();
        if !self.clock.running {
            return Tick::idle();
        }

        let elapsed = match self.clock.last_timestamp {
            Some(last) if now.is_finite() => (now - last).clamp(0.0, self.max_frame_dt),
            _ => 0.0,
        };
        if now.is_finite() {
            self.clock.last_timestamp = Some(now);
        }
        if self.clock.paused {
            return Tick::idle();
        }

        self.advance(elapsed * self.time_scale)
    }

    fn advance(&mut self, dt: Scalar) -> Tick {
        let outcome = self.simulation.step(dt);
        self.clock.accumulated_time += dt;
        if outcome == StepOutcome::Finished {
            info!("{} finished", self.simulation.name());
            self.clock.running = false;
            self.clock.paused = false;
            self.finished = true;
        }
        Tick {
            dt,
            stepped: true,
            outcome,
        }
    }

    fn drain_commands(&mut self) {
        while let Some(command) = self.commands.pop_front() {
            self.simulation.apply(command);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        total: Scalar,
        steps: usize,
        limit: Scalar,
        bursts: usize,
        host_time: Scalar,
    }

    impl Simulation for Counter {
        type Command = Scalar;

        fn name(&self) -> &'static str {
            "counter"
        }

        fn apply(&mut self, command: Scalar) {
            self.limit = command;
        }

        fn step(&mut self, dt: Scalar) -> StepOutcome {
            self.total += dt;
            self.steps += 1;
            if self.limit > 0.0 && self.total >= self.limit {
                StepOutcome::Finished
            } else {
                StepOutcome::Continue
            }
        }

        fn reset(&mut self) {
            self.total = 0.0;
            self.steps = 0;
        }

        fn on_start(&mut self) {
            self.bursts += 1;
        }

        fn observe_host_time(&mut self, now: Scalar) {
            self.host_time = now;
        }
    }

    #[test]
    fn test_first_tick_has_zero_dt() {
        let mut scheduler = Scheduler::new(Counter::default(), 0.25);
        scheduler.start();
        let tick = scheduler.tick(10.0);
        assert_eq!(tick.dt, 0.0);
        assert_eq!(scheduler.simulation().bursts, 1);
        let tick = scheduler.tick(10.1);
        assert!((tick.dt - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_dt_is_clamped() {
        let mut scheduler = Scheduler::new(Counter::default(), 0.25);
        scheduler.start();
        scheduler.tick(0.0);
        assert_eq!(scheduler.tick(100.0).dt, 0.25);
        assert_eq!(scheduler.tick(50.0).dt, 0.0);
    }

    #[test]
    fn test_pause_skips_stepping_without_jump() {
        let mut scheduler = Scheduler::new(Counter::default(), 0.25);
        scheduler.start();
        scheduler.tick(0.0);
        scheduler.pause();
        assert!(!scheduler.tick(0.1).stepped);
        assert!(!scheduler.tick(5.0).stepped);
        assert_eq!(scheduler.phase(), Phase::Paused);
        scheduler.resume();
        assert_eq!(scheduler.tick(5.1).dt, 0.0);
        let tick = scheduler.tick(5.2);
        assert!((tick.dt - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_resume_after_unticked_gap_does_not_jump() {
        let mut scheduler = Scheduler::new(Counter::default(), 0.25);
        scheduler.start();
        scheduler.tick(0.0);
        scheduler.tick(0.1);
        scheduler.pause();
        // Nothing ticks this scheduler while another one is on screen.
        scheduler.resume();
        let tick = scheduler.tick(30.0);
        assert!(tick.stepped);
        assert_eq!(tick.dt, 0.0);
        assert!((scheduler.clock().accumulated_time - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_host_time_is_seen_even_when_idle_or_paused() {
        let mut scheduler = Scheduler::new(Counter::default(), 0.25);
        scheduler.tick(1.0);
        assert_eq!(scheduler.simulation().host_time, 1.0);
        scheduler.start();
        scheduler.pause();
        scheduler.tick(4.0);
        assert_eq!(scheduler.simulation().host_time, 4.0);
        scheduler.tick(Scalar::NAN);
        assert_eq!(scheduler.simulation().host_time, 4.0);
    }

    #[test]
    fn test_commands_apply_before_step_and_finish_stops() {
        let mut scheduler = Scheduler::new(Counter::default(), 1.0);
        scheduler.push(0.5);
        scheduler.start();
        scheduler.tick(0.0);
        assert_eq!(scheduler.simulation().limit, 0.5);
        let tick = scheduler.tick(0.6);
        assert_eq!(tick.outcome, StepOutcome::Finished);
        assert_eq!(scheduler.phase(), Phase::Finished);
        assert!(!scheduler.tick(0.7).stepped);
        scheduler.start();
        assert_eq!(scheduler.phase(), Phase::Finished);
        scheduler.reset();
        assert_eq!(scheduler.phase(), Phase::Idle);
        assert_eq!(scheduler.simulation().steps, 0);
    }

    #[test]
    fn test_step_once_only_when_not_running() {
        let mut scheduler = Scheduler::new(Counter::default(), 1.0);
        assert!(scheduler.step_once(0.1).stepped);
        scheduler.start();
        assert!(!scheduler.step_once(0.1).stepped);
        scheduler.pause();
        assert!(scheduler.step_once(0.1).stepped);
        assert_eq!(scheduler.simulation().steps, 2);
    }

    #[test]
    fn test_time_scale_multiplies_dt() {
        let mut scheduler = Scheduler::new(Counter::default(), 1.0);
        scheduler.set_time_scale(2.0);
        scheduler.start();
        scheduler.tick(0.0);
        assert!((scheduler.tick(0.1).dt - 0.2).abs() < 1e-12);
        scheduler.set_time_scale(Scalar::NAN);
        assert_eq!(scheduler.time_scale(), 2.0);
    }
}
