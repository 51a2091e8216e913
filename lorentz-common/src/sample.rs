use serde::{Deserialize, Serialize};

/// One recorded trajectory point in exporter order.
///
/// Field names and order form the flat-file contract:
/// `time_s,x_m,y_m,vx_m_per_s,vy_m_per_s`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySample {
    /// Simulation time (s).
    pub time_s: f64,
    /// Position (m).
    pub x_m: f64,
    pub y_m: f64,
    /// Velocity (m/s).
    pub vx_m_per_s: f64,
    pub vy_m_per_s: f64,
}

/// Column names matching [`TrajectorySample`]'s field order.
pub const SAMPLE_HEADER: [&str; 5] = ["time_s", "x_m", "y_m", "vx_m_per_s", "vy_m_per_s"];

/// A whole particle's recorded samples plus its identity, for structured dumps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryRecord {
    /// Index of the particle in the simulated set.
    pub particle_index: usize,
    pub mass_kg: f64,
    pub charge_c: f64,
    pub samples: Vec<TrajectorySample>,
}
