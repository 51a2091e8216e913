//! Physical constants used as defaults throughout the simulator.

/// Electron rest mass (kg).
pub const ELECTRON_MASS_KG: f64 = 9.109e-31;

/// Elementary charge (C).
pub const ELEMENTARY_CHARGE_C: f64 = 1.602e-19;

/// Electron charge (C).
pub const ELECTRON_CHARGE_C: f64 = -ELEMENTARY_CHARGE_C;
