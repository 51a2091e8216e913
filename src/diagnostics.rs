//! Post-run kinetic-energy checks.
//!
//! A magnetic field does no work, so with `E = 0` kinetic energy must stay
//! constant and any drift is integration error. With a non-zero electric
//! field the energy legitimately changes and a failed check means nothing.
//! The engine never runs these; callers opt in after a run completes.

use crate::particle::Particle;
use crate::simulation::{SimulationResult, Trajectory};
use log::{debug, warn};
use lorentz_common::Vec2;
use serde::{Deserialize, Serialize};

/// Default relative tolerance (0.5 %).
pub const DEFAULT_RELATIVE_TOLERANCE: f64 = 5e-3;

/// Kinetic energy `½ m |v|²` (J).
pub fn kinetic_energy(mass: f64, velocity: Vec2) -> f64 {
    0.5 * mass * velocity.length_squared()
}

/// Worst kinetic-energy excursion from the first sample of one trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyDeviation {
    /// `max |KE(t) - KE(0)| / KE(0)`; equals `max_absolute` when `KE(0) = 0`.
    pub max_relative: f64,
    /// `max |KE(t) - KE(0)|` (J).
    pub max_absolute: f64,
}

/// Thresholds for [`verify_energy_conservation`]. A particle passes when
/// either deviation is within its bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyTolerance {
    pub relative: f64,
    /// Absolute floor (J). Zero disables it.
    pub absolute: f64,
}

impl Default for EnergyTolerance {
    fn default() -> Self {
        Self { relative: DEFAULT_RELATIVE_TOLERANCE, absolute: 0.0 }
    }
}

impl EnergyTolerance {
    pub fn relative(relative: f64) -> Self {
        Self { relative, absolute: 0.0 }
    }

    fn accepts(&self, deviation: &EnergyDeviation) -> bool {
        deviation.max_relative <= self.relative || deviation.max_absolute <= self.absolute
    }
}

/// Outcome of an energy-conservation check, one entry per particle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyCheck {
    pub passed: bool,
    pub max_relative_deviation: Vec<f64>,
    pub max_absolute_deviation: Vec<f64>,
}

impl EnergyCheck {
    /// Largest relative deviation across all particles (0 when there are none).
    pub fn worst_relative_deviation(&self) -> f64 {
        self.max_relative_deviation.iter().copied().fold(0.0, f64::max)
    }
}

/// Measures kinetic-energy drift along `trajectory` for a particle of `mass`.
///
/// An empty trajectory has no deviation. A non-finite energy anywhere reports
/// an infinite deviation so blown-up runs can never pass.
pub fn energy_deviation(mass: f64, trajectory: &Trajectory) -> EnergyDeviation {
    let Some(first) = trajectory.first() else {
        return EnergyDeviation { max_relative: 0.0, max_absolute: 0.0 };
    };

    let e0 = kinetic_energy(mass, first.velocity);
    let denom = if e0 != 0.0 { e0 } else { 1.0 };
    let mut max_absolute: f64 = 0.0;

    for state in trajectory {
        let ek = kinetic_energy(mass, state.velocity);
        if !ek.is_finite() || !e0.is_finite() {
            return EnergyDeviation { max_relative: f64::INFINITY, max_absolute: f64::INFINITY };
        }
        max_absolute = max_absolute.max((ek - e0).abs());
    }

    EnergyDeviation { max_relative: max_absolute / denom.abs(), max_absolute }
}

/// Checks a single trajectory against a relative tolerance.
pub fn check_trajectory(mass: f64, trajectory: &Trajectory, relative_tolerance: f64) -> EnergyCheck {
    let deviation = energy_deviation(mass, trajectory);
    EnergyCheck {
        passed: EnergyTolerance::relative(relative_tolerance).accepts(&deviation),
        max_relative_deviation: vec![deviation.max_relative],
        max_absolute_deviation: vec![deviation.max_absolute],
    }
}

/// Checks every particle of a completed run. `particles` must be the slice
/// the run was started with, so indices line up with the trajectories.
pub fn verify_energy_conservation(
    particles: &[Particle],
    result: &SimulationResult,
    tolerance: EnergyTolerance,
) -> EnergyCheck {
    if particles.len() != result.particle_count() {
        warn!(
            "Energy check given {} particles for {} trajectories; checking the overlap only.",
            particles.len(),
            result.particle_count()
        );
    }

    let deviations: Vec<EnergyDeviation> = particles
        .iter()
        .zip(&result.trajectories)
        .map(|(particle, trajectory)| energy_deviation(particle.mass(), trajectory))
        .collect();

    for (idx, deviation) in deviations.iter().enumerate() {
        debug!(
            "Particle {}: max relative KE deviation {:.3e}, absolute {:.3e} J",
            idx, deviation.max_relative, deviation.max_absolute
        );
    }

    EnergyCheck {
        passed: deviations.iter().all(|d| tolerance.accepts(d)),
        max_relative_deviation: deviations.iter().map(|d| d.max_relative).collect(),
        max_absolute_deviation: deviations.iter().map(|d| d.max_absolute).collect(),
    }
}
