use crate::buffer::GridBuffer;
use crate::config::{SimulationConfig, SolverParams};
use crate::input::{InputHandle, TouchEvent};
use crate::solver::{Solver, StepReport};
use crate::state::FluidState;
use crate::FluidResult;

#[derive(Debug)]
pub struct FluidSimulation {
    config: SimulationConfig,
    state: FluidState,
    solver: Solver,
    input: InputHandle,
    events: Vec<TouchEvent>,
    frames: u64,
    dropped_frames: u64,
    last_report: Option<StepReport>,
}

impl FluidSimulation {
    pub fn new(config: SimulationConfig) -> FluidResult<Self> {
        config.validate()?;
        let state = FluidState::new(config.width, config.height, config.format)?;
        let solver = Solver::new(state.grid(), config.solver)?;
        Ok(Self {
            config,
            state,
            solver,
            input: InputHandle::new(),
            events: Vec::new(),
            frames: 0,
            dropped_frames: 0,
            last_report: None,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn state(&self) -> &FluidState {
        &self.state
    }

    pub fn input_handle(&self) -> InputHandle {
        self.input.clone()
    }

    pub fn reset(&self) {
        self.input.request_reset();
    }

    pub fn solver_params(&self) -> SolverParams {
        self.solver.params()
    }

    pub fn set_solver_params(&mut self, params: SolverParams) -> FluidResult<()> {
        self.solver.set_params(params)?;
        self.config.solver = params;
        Ok(())
    }

    // Runs one frame with every event queued so far. A failed frame is
    // logged and skipped; the last committed state stays visible and the
    // next call retries.
    pub fn advance(&mut self, dt: f32) -> Option<StepReport> {
        self.input.drain_into(&mut self.events);
        let events = std::mem::take(&mut self.events);
        let outcome = self.step_with_events(&events, dt);
        self.events = events;
        match outcome {
            Ok(report) => Some(report),
            Err(err) => {
                self.dropped_frames += 1;
                log::warn!("frame {} dropped: {err}", self.frames);
                None
            }
        }
    }

    pub fn step_with_events(&mut self, events: &[TouchEvent], dt: f32) -> FluidResult<StepReport> {
        if self.input.take_reset() {
            self.state.reset()?;
            log::info!("fluid state reset before frame {}", self.frames);
        }
        let report = self.solver.step(&mut self.state, events, dt)?;
        self.frames += 1;
        self.last_report = Some(report);
        log::debug!(
            "frame {}: {} events, divergence {:.5} -> {:.5}",
            self.frames,
            report.events_applied,
            report.divergence_before,
            report.divergence_after
        );
        if report.events_dropped > 0 {
            log::warn!("ignored {} non-finite touch events", report.events_dropped);
        }
        Ok(report)
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }

    pub fn last_report(&self) -> Option<StepReport> {
        self.last_report
    }

    pub fn density(&self) -> &GridBuffer {
        self.state.density().source()
    }

    pub fn divergence(&self) -> &GridBuffer {
        self.state.divergence()
    }

    pub fn density_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.density_rgba8_into(&mut out);
        out
    }

    pub fn density_rgba8_into(&self, out: &mut Vec<u8>) {
        let values = self.density().read_values();
        out.resize(values.len(), 0);
        for (byte, value) in out.iter_mut().zip(&values) {
            let t = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
            *byte = (t * 255.0).round() as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::SeedColor;
    use crate::precision::StorageFormat;
    use crate::{FluidError, Vec2};

    fn small_config(format: StorageFormat) -> SimulationConfig {
        SimulationConfig::new(12, 10, format)
    }

    #[test]
    fn new_validates_config() {
        let config = SimulationConfig {
            solver: SolverParams {
                splat_radius: -1.0,
                ..SolverParams::default()
            },
            ..small_config(StorageFormat::Float16)
        };
        assert!(matches!(
            FluidSimulation::new(config),
            Err(FluidError::InvalidConfig(_))
        ));
    }

    #[test]
    fn advance_drains_queue() {
        let mut sim = FluidSimulation::new(small_config(StorageFormat::Float16)).unwrap();
        let input = sim.input_handle();
        input.push(TouchEvent::new(Vec2::new(5.0, 5.0), Vec2::new(2.0, 0.0)));
        input.push(TouchEvent::new(Vec2::new(8.0, 2.0), Vec2::new(0.0, 1.0)));
        let report = sim.advance(1.0).unwrap();
        assert_eq!(report.events_applied, 2);
        assert_eq!(input.pending_len(), 0);
        let report = sim.advance(1.0).unwrap();
        assert_eq!(report.events_applied, 0);
        assert_eq!(sim.frames(), 2);
    }

    #[test]
    fn reset_waits_for_frame_boundary() {
        let mut sim = FluidSimulation::new(small_config(StorageFormat::Float32)).unwrap();
        let seeded = sim.density().read_values();
        sim.input_handle().push(
            TouchEvent::new(Vec2::new(6.0, 5.0), Vec2::new(3.0, 3.0)).with_color(SeedColor::Purple),
        );
        sim.advance(1.0).unwrap();
        assert_ne!(sim.density().read_values(), seeded);

        sim.reset();
        assert_ne!(sim.density().read_values(), seeded);
        let mut frozen = FluidSimulation::new(small_config(StorageFormat::Float32)).unwrap();
        let expected = frozen.advance(1.0).unwrap();
        let report = sim.advance(1.0).unwrap();
        assert_eq!(report, expected);
        assert_eq!(sim.density().read_values(), frozen.density().read_values());
    }

    #[test]
    fn failed_frame_keeps_last_state() {
        let mut sim = FluidSimulation::new(small_config(StorageFormat::Float32)).unwrap();
        sim.advance(1.0).unwrap();
        let density = sim.density().read_values();
        sim.input_handle()
            .push(TouchEvent::new(Vec2::new(3.0, 3.0), Vec2::new(f32::MAX, f32::MAX)));
        assert!(sim.advance(1.0).is_none());
        assert_eq!(sim.dropped_frames(), 1);
        assert_eq!(sim.frames(), 1);
        assert_eq!(sim.density().read_values(), density);
        assert!(sim.advance(1.0).is_some());
    }

    #[test]
    fn rgba8_export_clamps() {
        let sim = FluidSimulation::new(small_config(StorageFormat::Float16)).unwrap();
        let rgba = sim.density_rgba8();
        assert_eq!(rgba.len(), 12 * 10 * 4);
        assert_eq!(&rgba[..4], &[255, 149, 0, 255]);
    }

    #[test]
    fn solver_params_can_change_between_frames() {
        let mut sim = FluidSimulation::new(small_config(StorageFormat::Float16)).unwrap();
        let params = SolverParams {
            jacobi_iterations: 5,
            ..SolverParams::default()
        };
        sim.set_solver_params(params).unwrap();
        assert_eq!(sim.advance(1.0).unwrap().pressure_iterations, 5);
        assert_eq!(sim.config().solver.jacobi_iterations, 5);
    }
}
