//! Fixed-step classic Runge–Kutta (RK4) integrator.
//!
//! Integrates the first-order system `dx/dt = v, dv/dt = a(t, x, v)` with four
//! acceleration evaluations per step. Local truncation error is O(dt^5) and
//! global error O(dt^4) for smooth accelerations.

use crate::particle::State;
use lorentz_common::Vec2;

/// Advance `state` by exactly one step of size `dt`.
///
/// `acceleration` receives `(t, x, v)` and must be pure. Nothing is checked:
/// an unstable step simply produces non-finite values.
pub fn rk4_step<A>(state: &State, dt: f64, acceleration: A) -> State
where
    A: Fn(f64, Vec2, Vec2) -> Vec2,
{
    let t = state.time;
    let x = state.position;
    let v = state.velocity;
    let half_dt = 0.5 * dt;

    // Stage 1: slope at the start of the interval
    let k1_v = acceleration(t, x, v);
    let k1_x = v;

    // Stage 2: midpoint using stage-1 slopes
    let k2_v = acceleration(t + half_dt, x + k1_x * half_dt, v + k1_v * half_dt);
    let k2_x = v + k1_v * half_dt;

    // Stage 3: midpoint using stage-2 slopes
    let k3_v = acceleration(t + half_dt, x + k2_x * half_dt, v + k2_v * half_dt);
    let k3_x = v + k2_v * half_dt;

    // Stage 4: end of the interval using stage-3 slopes
    let k4_v = acceleration(t + dt, x + k3_x * dt, v + k3_v * dt);
    let k4_x = v + k3_v * dt;

    let sixth_dt = dt / 6.0;
    State {
        time: t + dt,
        position: x + sixth_dt * (k1_x + 2.0 * k2_x + 2.0 * k3_x + k4_x),
        velocity: v + sixth_dt * (k1_v + 2.0 * k2_v + 2.0 * k3_v + k4_v),
    }
}
