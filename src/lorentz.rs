//! Lorentz force on a charged particle moving in the plane.
//!
//! F = q (E + v × B), with v = (vx, vy, 0). The magnetic field keeps all three
//! components; only B_z contributes an in-plane force.

use lorentz_common::{Vec2, Vec3};

/// Advisory resolution for magnetised runs. Not enforced anywhere.
pub const RECOMMENDED_STEPS_PER_CYCLOTRON_PERIOD: f64 = 70.0;

/// In-plane part of `v × B` for a planar velocity.
#[inline]
fn planar_cross(velocity: Vec2, magnetic_field: Vec3) -> Vec2 {
    velocity.extend(0.0).cross(magnetic_field).xy()
}

/// Force (N) on `charge` (C) moving at `velocity` (m/s) through `E` (V/m) and `B` (T).
pub fn lorentz_force(charge: f64, velocity: Vec2, electric_field: Vec2, magnetic_field: Vec3) -> Vec2 {
    charge * (electric_field + planar_cross(velocity, magnetic_field))
}

/// Acceleration (m/s²): `(q/m)(E + v × B)`.
///
/// `mass` must be positive; particles validate this at construction.
pub fn lorentz_acceleration(
    charge: f64,
    mass: f64,
    velocity: Vec2,
    electric_field: Vec2,
    magnetic_field: Vec3,
) -> Vec2 {
    (charge / mass) * (electric_field + planar_cross(velocity, magnetic_field))
}

/// Cyclotron angular frequency `|q| B_z / m` (rad/s).
pub fn cyclotron_angular_frequency(charge: f64, mass: f64, bz: f64) -> f64 {
    (charge * bz).abs() / mass
}

/// Cyclotron period (s). Infinite when there is no magnetic field.
pub fn cyclotron_period(charge: f64, mass: f64, bz: f64) -> f64 {
    std::f64::consts::TAU / cyclotron_angular_frequency(charge, mass, bz)
}

/// Larmor radius `m |v| / (|q| B_z)` (m) for an in-plane speed.
pub fn cyclotron_radius(charge: f64, mass: f64, speed: f64, bz: f64) -> f64 {
    mass * speed.abs() / (charge * bz).abs()
}

/// Drift velocity `(E × B) / |B|²` in crossed uniform fields. Independent of charge and mass.
pub fn e_cross_b_drift(electric_field: Vec2, magnetic_field: Vec3) -> Vec2 {
    let b_sq = magnetic_field.length_squared();
    if b_sq == 0.0 {
        return Vec2::zero();
    }
    electric_field.extend(0.0).cross(magnetic_field).xy() / b_sq
}

/// Time step giving `RECOMMENDED_STEPS_PER_CYCLOTRON_PERIOD` steps per gyration.
pub fn recommended_time_step(charge: f64, mass: f64, bz: f64) -> f64 {
    cyclotron_period(charge, mass, bz) / RECOMMENDED_STEPS_PER_CYCLOTRON_PERIOD
}
