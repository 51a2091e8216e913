//! Charged point particles under the Lorentz force, integrated with fixed-step RK4.

pub mod diagnostics;
pub mod export;
pub mod fields;
pub mod integrator;
pub mod lorentz;
pub mod particle;
pub mod scenario;
pub mod sim_config;
pub mod simulation;

pub use diagnostics::{
    check_trajectory, energy_deviation, kinetic_energy, verify_energy_conservation, EnergyCheck, EnergyDeviation,
    EnergyTolerance, DEFAULT_RELATIVE_TOLERANCE,
};
pub use fields::{Field, Fields, FunctionField, UniformField};
pub use integrator::rk4_step;
pub use lorentz::{
    cyclotron_angular_frequency, cyclotron_period, cyclotron_radius, e_cross_b_drift, lorentz_acceleration,
    lorentz_force, recommended_time_step, RECOMMENDED_STEPS_PER_CYCLOTRON_PERIOD,
};
pub use particle::{Particle, State};
pub use scenario::Scenario;
pub use sim_config::SimulationConfig;
pub use simulation::{run, Simulation, SimulationResult, SimulationStatus, Trajectory};

pub use lorentz_common::{Vec2, Vec3};
