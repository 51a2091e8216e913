use anyhow::Result;
use lorentz_common::{TrajectorySample, Vec2, ELECTRON_CHARGE_C, ELECTRON_MASS_KG};
use serde::{Deserialize, Serialize};

/// Instantaneous kinematic state of one particle.
///
/// Never mutated in place: the integrator returns a fresh `State` per step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Simulation time (s).
    pub time: f64,
    /// Position (m).
    pub position: Vec2,
    /// Velocity (m/s).
    pub velocity: Vec2,
}

impl State {
    pub const fn new(time: f64, position: Vec2, velocity: Vec2) -> Self {
        Self { time, position, velocity }
    }

    /// Flattens into the exporter's `{time, x, y, vx, vy}` record.
    pub fn to_sample(&self) -> TrajectorySample {
        TrajectorySample {
            time_s: self.time,
            x_m: self.position.x,
            y_m: self.position.y,
            vx_m_per_s: self.velocity.x,
            vy_m_per_s: self.velocity.y,
        }
    }
}

/// Physical identity and starting condition of one simulated body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawParticle")]
pub struct Particle {
    mass: f64,
    charge: f64,
    initial_state: State,
}

/// Unchecked wire form; deserialization goes through [`Particle::with_initial_state`].
#[derive(Deserialize)]
struct RawParticle {
    mass: f64,
    charge: f64,
    initial_state: State,
}

impl TryFrom<RawParticle> for Particle {
    type Error = anyhow::Error;

    fn try_from(raw: RawParticle) -> Result<Self> {
        Self::with_initial_state(raw.mass, raw.charge, raw.initial_state)
    }
}

impl Particle {
    /// A particle starting at `t = 0`.
    pub fn new(mass: f64, charge: f64, position: Vec2, velocity: Vec2) -> Result<Self> {
        Self::with_initial_state(mass, charge, State::new(0.0, position, velocity))
    }

    /// A particle starting from an arbitrary (non-negative) time.
    pub fn with_initial_state(mass: f64, charge: f64, initial_state: State) -> Result<Self> {
        let particle = Self { mass, charge, initial_state };
        particle.validate()?;
        Ok(particle)
    }

    /// Rejects a particle no run could start from.
    pub fn validate(&self) -> Result<()> {
        if !(self.mass.is_finite() && self.mass > 0.0) {
            anyhow::bail!("particle mass must be positive and finite (got {}).", self.mass);
        }
        if !self.charge.is_finite() {
            anyhow::bail!("particle charge must be finite (got {}).", self.charge);
        }
        let state = &self.initial_state;
        if !(state.time.is_finite() && state.time >= 0.0) {
            anyhow::bail!("initial time must be non-negative (got {}).", state.time);
        }
        if !(state.position.is_finite() && state.velocity.is_finite()) {
            anyhow::bail!("initial position and velocity must be finite.");
        }
        Ok(())
    }

    /// An electron with the library's default constants.
    pub fn electron(position: Vec2, velocity: Vec2) -> Result<Self> {
        Self::new(ELECTRON_MASS_KG, ELECTRON_CHARGE_C, position, velocity)
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn charge(&self) -> f64 {
        self.charge
    }

    pub fn initial_state(&self) -> State {
        self.initial_state
    }
}
