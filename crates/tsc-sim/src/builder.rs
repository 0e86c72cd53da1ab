//! Fluent builder for constructing a [`SignalSim`].

use tracing::warn;

use tsc_control::{ControlConfig, DensityController, PreemptionController, SpeedRegulator};
use tsc_core::RunConfig;
use tsc_telemetry::TelemetryAdapter;

use crate::{Arbitration, SignalSim, SimError, SimResult};

/// Fluent builder for [`SignalSim<A>`].
///
/// # Required inputs
///
/// - [`RunConfig`]: step length and optional tick budget
/// - `A: TelemetryAdapter`: the simulator connection
/// - at least one controller
///
/// # Optional inputs (have defaults)
///
/// | Method              | Default                         |
/// |---------------------|---------------------------------|
/// | `.preemption(c)`    | no emergency preemption         |
/// | `.density(c)`       | no density control              |
/// | `.speed(r)`         | no speed regulation             |
/// | `.arbitration(a)`   | `Arbitration::Unsynchronized`   |
///
/// # Example
///
/// ```rust,ignore
/// let controls = ControlConfig::from_path(Path::new("keputih.json"))?;
/// let mut sim = SimBuilder::new(run, world)
///     .controls(&controls)?
///     .arbitration(Arbitration::PreemptionPrecedence)
///     .build()?;
/// sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder<A: TelemetryAdapter> {
    config:      RunConfig,
    adapter:     A,
    preemption:  Option<PreemptionController>,
    density:     Option<DensityController>,
    speed:       Option<SpeedRegulator>,
    arbitration: Arbitration,
}

impl<A: TelemetryAdapter> SimBuilder<A> {
    /// Create a builder with the required inputs.
    pub fn new(config: RunConfig, adapter: A) -> Self {
        Self {
            config,
            adapter,
            preemption:  None,
            density:     None,
            speed:       None,
            arbitration: Arbitration::default(),
        }
    }

    pub fn preemption(mut self, controller: PreemptionController) -> Self {
        self.preemption = Some(controller);
        self
    }

    pub fn density(mut self, controller: DensityController) -> Self {
        self.density = Some(controller);
        self
    }

    pub fn speed(mut self, regulator: SpeedRegulator) -> Self {
        self.speed = Some(regulator);
        self
    }

    pub fn arbitration(mut self, arbitration: Arbitration) -> Self {
        self.arbitration = arbitration;
        self
    }

    /// Build a controller for every section present in `controls`.
    ///
    /// Sections absent from `controls` leave any controller already set
    /// untouched.
    pub fn controls(mut self, controls: &ControlConfig) -> SimResult<Self> {
        controls.validate()?;
        if let Some(p) = &controls.preemption {
            self.preemption = Some(PreemptionController::from_config(p, &controls.classifier)?);
        }
        if let Some(d) = &controls.density {
            self.density = Some(DensityController::from_config(d)?);
        }
        if let Some(band) = controls.speed {
            self.speed = Some(SpeedRegulator::new(band)?);
        }
        Ok(self)
    }

    /// Validate inputs and return a ready-to-run [`SignalSim`].
    pub fn build(self) -> SimResult<SignalSim<A>> {
        self.config.validate()?;

        if self.preemption.is_none() && self.density.is_none() && self.speed.is_none() {
            return Err(SimError::Config("no controller configured".into()));
        }
        if self.arbitration == Arbitration::PreemptionPrecedence && self.preemption.is_none() {
            warn!("preemption precedence requested without a preemption controller; it has no effect");
        }

        Ok(SignalSim {
            clock:       self.config.make_clock(),
            config:      self.config,
            adapter:     self.adapter,
            preemption:  self.preemption,
            density:     self.density,
            speed:       self.speed,
            arbitration: self.arbitration,
        })
    }
}
