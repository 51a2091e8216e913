use anyhow::Result;
use lorentz_common::TimingConfig;
use serde::{Deserialize, Serialize};

/// Slack, in machine epsilons relative to the quotient, for a
/// `total_time / time_step` ratio that lands just above an integer.
const STEP_COUNT_ROUNDING_EPSILONS: f64 = 8.0;

/// Loop granularity and recording density for a run.
///
/// `time_step` should resolve the fastest timescale in the system (the
/// cyclotron period); this is advisory and not checked. A step that is too
/// coarse shows up as energy drift in the diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSimulationConfig")]
pub struct SimulationConfig {
    time_step: f64,
    total_time: f64,
    sample_every_n_steps: u32,
}

/// Unchecked wire form; deserialization goes through [`SimulationConfig::new`].
#[derive(Deserialize)]
struct RawSimulationConfig {
    time_step: f64,
    total_time: f64,
    sample_every_n_steps: u32,
}

impl TryFrom<RawSimulationConfig> for SimulationConfig {
    type Error = anyhow::Error;

    fn try_from(raw: RawSimulationConfig) -> Result<Self> {
        Self::new(raw.time_step, raw.total_time, raw.sample_every_n_steps)
    }
}

impl SimulationConfig {
    pub fn new(time_step: f64, total_time: f64, sample_every_n_steps: u32) -> Result<Self> {
        let config = Self { time_step, total_time, sample_every_n_steps };
        config.validate()?;
        Ok(config)
    }

    /// Rejects timing no run could start from.
    pub fn validate(&self) -> Result<()> {
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            anyhow::bail!("time_step must be positive and finite (got {}).", self.time_step);
        }
        if !(self.total_time.is_finite() && self.total_time >= 0.0) {
            anyhow::bail!("total_time must be non-negative and finite (got {}).", self.total_time);
        }
        if self.sample_every_n_steps == 0 {
            anyhow::bail!("sample_every_n_steps must be at least 1.");
        }
        Ok(())
    }

    /// Converts the `[timing]` section of a scenario file.
    pub fn from_timing(timing: &TimingConfig) -> Result<Self> {
        Self::new(timing.time_step_s, timing.total_time_s, timing.sample_every_n_steps)
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    pub fn sample_every_n_steps(&self) -> u32 {
        self.sample_every_n_steps
    }

    /// Number of fixed steps needed for the elapsed time to reach `total_time`.
    ///
    /// This is `ceil(total_time / time_step)`, except that a ratio exceeding
    /// an integer only by division round-off (a few epsilons) is taken as that
    /// integer, so `1e-9 / 1e-12` is 1000 steps rather than 1001. Any larger
    /// remainder adds a step, so the final time never falls short of
    /// `total_time` by more than round-off and overshoots it by less than
    /// one step.
    pub fn total_steps(&self) -> u64 {
        let ratio = self.total_time / self.time_step;
        let whole = ratio.floor();
        if ratio - whole <= STEP_COUNT_ROUNDING_EPSILONS * f64::EPSILON * whole.max(1.0) {
            whole as u64
        } else {
            ratio.ceil() as u64
        }
    }

    /// Number of states a run records per particle, first and last included.
    pub fn expected_sample_count(&self) -> u64 {
        self.total_steps().div_ceil(u64::from(self.sample_every_n_steps)) + 1
    }
}
