use lorentz_engine::{
    check_trajectory, cyclotron_radius, e_cross_b_drift, recommended_time_step, run, verify_energy_conservation,
    EnergyTolerance, Fields, FunctionField, Particle, SimulationConfig, SimulationResult, UniformField, Vec2, Vec3,
};
use lorentz_common::{ELECTRON_CHARGE_C, ELECTRON_MASS_KG};
use std::f64::consts::TAU;

/// q = m = B_z = 1: cyclotron frequency 1 rad/s, period 2π.
fn unit_charge(velocity: Vec2) -> Particle {
    Particle::new(1.0, 1.0, Vec2::zero(), velocity).unwrap()
}

fn unit_magnetic_field() -> Fields {
    Fields::uniform(Vec2::zero(), Vec3::new(0.0, 0.0, 1.0))
}

/// Exact gyration for a unit charge starting at the origin with v = (1, 0):
/// centre (0, -1), clockwise, x = sin t, y = cos t - 1.
fn exact_unit_orbit(t: f64) -> (Vec2, Vec2) {
    (Vec2::new(t.sin(), t.cos() - 1.0), Vec2::new(t.cos(), -t.sin()))
}

fn run_unit_orbit(steps_per_period: f64, periods: f64) -> SimulationResult {
    let dt = TAU / steps_per_period;
    let config = SimulationConfig::new(dt, dt * steps_per_period * periods, 1).unwrap();
    run(&[unit_charge(Vec2::new(1.0, 0.0))], &config, &unit_magnetic_field()).unwrap()
}

// ==================================================================================
// Inertial motion
// ==================================================================================

#[test]
fn inertial_motion_is_linear() {
    let particles = [
        Particle::electron(Vec2::new(1e-6, -2e-6), Vec2::new(1e5, -3e4)).unwrap(),
        Particle::new(2.0, 5.0, Vec2::zero(), Vec2::new(-1.5, 0.25)).unwrap(),
    ];
    let config = SimulationConfig::new(1e-3, 2.0, 50).unwrap();
    let result = run(&particles, &config, &Fields::none()).unwrap();

    for (particle, trajectory) in particles.iter().zip(&result.trajectories) {
        let s0 = particle.initial_state();
        for state in trajectory {
            assert_eq!(state.velocity, s0.velocity, "velocity changed at t = {}", state.time);
            let expected = s0.position + s0.velocity * state.time;
            let scale = expected.length().max(s0.velocity.length() * state.time).max(1e-30);
            assert!(
                (state.position - expected).length() / scale < 1e-9,
                "position {:?} expected {:?}",
                state.position,
                expected
            );
        }
    }
}

// ==================================================================================
// Cyclotron motion
// ==================================================================================

#[test]
fn cyclotron_orbit_has_constant_radius() {
    let result = run_unit_orbit(70.0, 10.0);
    let center = Vec2::new(0.0, -1.0);
    let radius = cyclotron_radius(1.0, 1.0, 1.0, 1.0);
    assert_eq!(radius, 1.0);

    for state in &result.trajectories[0] {
        let r = state.position.distance(center);
        assert!((r - radius).abs() < 1e-4, "radius {} at t = {}", r, state.time);
    }
}

#[test]
fn cyclotron_phase_advances_at_omega() {
    let result = run_unit_orbit(70.0, 10.0);
    for state in result.trajectories[0].iter().step_by(37) {
        let (position, velocity) = exact_unit_orbit(state.time);
        assert!((state.position - position).length() < 1e-4, "t = {}: {:?} vs {:?}", state.time, state.position, position);
        assert!((state.velocity - velocity).length() < 1e-4);
    }
}

#[test]
fn electron_orbit_matches_larmor_radius() {
    let (q, m, bz) = (ELECTRON_CHARGE_C, ELECTRON_MASS_KG, 0.1);
    let v0 = Vec2::new(1e5, 0.0);
    let particle = Particle::electron(Vec2::zero(), v0).unwrap();
    let fields = Fields::uniform(Vec2::zero(), Vec3::new(0.0, 0.0, bz));
    let dt = recommended_time_step(q, m, bz);
    let config = SimulationConfig::new(dt, 700.0 * dt, 1).unwrap();
    let result = run(&[particle], &config, &fields).unwrap();

    let radius = cyclotron_radius(q, m, v0.length(), bz);
    // Negative charge gyrates counter-clockwise: F = q v × B points along +y at the start.
    let center = Vec2::new(0.0, radius);
    for state in &result.trajectories[0] {
        let r = state.position.distance(center);
        assert!((r - radius).abs() / radius < 1e-4, "r = {:e}, expected {:e}", r, radius);
    }
}

// ==================================================================================
// Energy conservation
// ==================================================================================

#[test]
fn magnetic_only_energy_is_conserved_over_ten_thousand_steps() {
    let particle = Particle::electron(Vec2::zero(), Vec2::new(1e5, 0.0)).unwrap();
    let fields = Fields::uniform(Vec2::zero(), Vec3::new(0.0, 0.0, 0.1));
    let config = SimulationConfig::new(5e-12, 5e-8, 10).unwrap();
    assert_eq!(config.total_steps(), 10_000);

    let particles = [particle];
    let result = run(&particles, &config, &fields).unwrap();
    let check = verify_energy_conservation(&particles, &result, EnergyTolerance::relative(5e-3));
    assert!(check.passed, "{:?}", check);
    assert!(check.max_relative_deviation[0] < 5e-3);
}

#[test]
fn energy_drift_grows_with_step_size() {
    let drift = |steps_per_period: f64| {
        let result = run_unit_orbit(steps_per_period, 40.0);
        check_trajectory(1.0, &result.trajectories[0], 5e-3).max_relative_deviation[0]
    };
    let fine = drift(70.0);
    let medium = drift(35.0);
    let coarse = drift(15.0);
    assert!(fine < medium && medium < coarse, "{} {} {}", fine, medium, coarse);
}

// ==================================================================================
// Convergence order
// ==================================================================================

#[test]
fn halving_the_step_cuts_global_error_sixteenfold() {
    let error = |steps_per_period: f64| {
        let result = run_unit_orbit(steps_per_period, 1.0);
        let state = result.final_states[0];
        let (position, _) = exact_unit_orbit(state.time);
        (state.position - position).length()
    };
    let coarse = error(32.0);
    let fine = error(64.0);
    let ratio = coarse / fine;
    assert!(ratio > 13.0 && ratio < 19.0, "error ratio {} ({:e} / {:e})", ratio, coarse, fine);
}

// ==================================================================================
// Determinism
// ==================================================================================

#[test]
fn identical_inputs_give_bit_identical_trajectories() {
    let particles: Vec<Particle> = (0..8)
        .map(|i| Particle::new(1.0 + i as f64, 1.0 - 0.3 * i as f64, Vec2::new(i as f64, 0.0), Vec2::new(0.5, i as f64 * 0.1)).unwrap())
        .collect();
    let make_fields = || {
        Fields::new(
            FunctionField(|t: f64, p: Vec2| Vec2::new(0.1 * (t + p.y).sin(), 0.05 * p.x)),
            UniformField(Vec3::new(0.0, 0.0, 0.7)),
        )
    };
    let config = SimulationConfig::new(0.01, 5.0, 7).unwrap();

    let first = run(&particles, &config, &make_fields()).unwrap();
    let second = run(&particles, &config, &make_fields()).unwrap();
    for (a, b) in first.trajectories.iter().zip(&second.trajectories) {
        assert_eq!(a.len(), b.len());
        for (sa, sb) in a.iter().zip(b) {
            assert_eq!(sa.time.to_bits(), sb.time.to_bits());
            assert_eq!(sa.position.x.to_bits(), sb.position.x.to_bits());
            assert_eq!(sa.position.y.to_bits(), sb.position.y.to_bits());
            assert_eq!(sa.velocity.x.to_bits(), sb.velocity.x.to_bits());
            assert_eq!(sa.velocity.y.to_bits(), sb.velocity.y.to_bits());
        }
    }
}

// ==================================================================================
// E×B drift
// ==================================================================================

#[test]
fn crossed_fields_drift_at_e_cross_b_over_b_squared() {
    let e = Vec2::new(0.0, 0.5);
    let b = Vec3::new(0.0, 0.0, 1.0);
    let expected = e_cross_b_drift(e, b);
    assert_eq!(expected, Vec2::new(0.5, 0.0));

    let fields = Fields::uniform(e, b);
    let dt = TAU / 64.0;
    // A whole number of gyrations removes the oscillating part from the average.
    let config = SimulationConfig::new(dt, 100.0 * TAU, 64).unwrap();

    for v0 in [Vec2::new(1.0, 0.0), Vec2::new(-0.3, 2.0), Vec2::zero()] {
        let particle = unit_charge(v0);
        let result = run(&[particle], &config, &fields).unwrap();
        let last = result.trajectories[0].last().unwrap();
        let average_velocity = (last.position - particle.initial_state().position) / last.time;
        assert!(
            (average_velocity - expected).length() < 1e-2 * expected.length(),
            "v0 = {:?}: drift {:?}, expected {:?}",
            v0,
            average_velocity,
            expected
        );
    }
}

#[test]
fn drift_is_independent_of_charge_and_mass() {
    let e = Vec2::new(0.2, 0.0);
    let b = Vec3::new(0.0, 0.0, 2.0);
    let fields = Fields::uniform(e, b);
    let expected = e_cross_b_drift(e, b);

    for (mass, charge) in [(1.0, 1.0), (4.0, -2.0)] {
        let particle = Particle::new(mass, charge, Vec2::zero(), Vec2::zero()).unwrap();
        let period = TAU * mass / (charge * b.z).abs();
        let dt = period / 64.0;
        let config = SimulationConfig::new(dt, 50.0 * period, 64).unwrap();
        let result = run(&[particle], &config, &fields).unwrap();
        let last = result.trajectories[0].last().unwrap();
        let average_velocity = last.position / last.time;
        assert!(
            (average_velocity - expected).length() < 1e-2 * expected.length(),
            "m = {}, q = {}: {:?} vs {:?}",
            mass,
            charge,
            average_velocity,
            expected
        );
    }
}

// ==================================================================================
// Sampling contract
// ==================================================================================

#[test]
fn sample_count_includes_first_and_last() {
    // (dt, total_time, N, ceil(ceil(total_time / dt) / N) + 1)
    let cases = [
        (0.1, 1.0, 3u32, 5u64),
        (0.1, 1.0, 1, 11),
        (0.1, 1.0, 10, 2),
        (0.07, 1.0, 4, 5),
        (0.3, 1.0, 2, 3),
        (0.1, 0.0, 2, 1),
    ];
    for (dt, total, n, expected) in cases {
        let config = SimulationConfig::new(dt, total, n).unwrap();
        let result = run(&[unit_charge(Vec2::new(1.0, 0.0))], &config, &unit_magnetic_field()).unwrap();
        let trajectory = &result.trajectories[0];

        assert_eq!(trajectory.len() as u64, expected, "dt = {}, total = {}, n = {}", dt, total, n);
        assert_eq!(config.expected_sample_count(), expected);

        let times: Vec<f64> = trajectory.iter().map(|s| s.time).collect();
        assert!(times.windows(2).all(|w| w[0] < w[1]), "times not increasing: {:?}", times);
        assert_eq!(trajectory.last(), result.final_states.first());
    }
}

#[test]
fn final_time_overshoots_by_less_than_one_step() {
    let config = SimulationConfig::new(0.3, 1.0, 1).unwrap();
    let result = run(&[unit_charge(Vec2::new(1.0, 0.0))], &config, &Fields::none()).unwrap();
    assert_eq!(result.steps_taken, 4);
    assert!(result.final_time >= 1.0);
    assert!(result.final_time - 1.0 < 0.3);
}

#[test]
fn small_remainders_still_take_a_final_step() {
    let total = 1000.0 + 5e-7;
    let config = SimulationConfig::new(1.0, total, 100).unwrap();
    let result = run(&[unit_charge(Vec2::new(1.0, 0.0))], &config, &Fields::none()).unwrap();
    assert_eq!(result.steps_taken, 1001);
    assert!(result.final_time >= total, "stopped at {} < {}", result.final_time, total);
    assert_eq!(result.trajectories[0].len(), 12);
}

// ==================================================================================
// Configuration errors
// ==================================================================================

#[test]
fn invalid_configuration_is_rejected_up_front() {
    assert!(SimulationConfig::new(0.0, 1.0, 1).is_err());
    assert!(SimulationConfig::new(-0.1, 1.0, 1).is_err());
    assert!(SimulationConfig::new(0.1, -1.0, 1).is_err());
    assert!(Particle::new(0.0, 1.0, Vec2::zero(), Vec2::zero()).is_err());
    assert!(Particle::new(-1.0, 1.0, Vec2::zero(), Vec2::zero()).is_err());
}

#[test]
fn extreme_fields_propagate_without_errors() {
    let fields = Fields::uniform(Vec2::new(1e300, 0.0), Vec3::new(0.0, 0.0, 1e300));
    let config = SimulationConfig::new(1.0, 10.0, 1).unwrap();
    let particles = [unit_charge(Vec2::new(1.0, 0.0))];
    let result = run(&particles, &config, &fields).unwrap();
    assert_eq!(result.steps_taken, 10);
    let check = verify_energy_conservation(&particles, &result, EnergyTolerance::default());
    assert!(!check.passed);
}

// ==================================================================================
// Shipped scenario
// ==================================================================================

#[test]
fn shipped_config_runs_and_conserves_energy() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config.toml");
    let config = lorentz_common::ScenarioConfig::load(&path).unwrap();
    let scenario = lorentz_engine::Scenario::from_config(&config).unwrap();
    assert_eq!(scenario.config.expected_sample_count(), 1001);

    let result = run(&scenario.particles, &scenario.config, &scenario.fields).unwrap();
    assert_eq!(result.trajectories[0].len(), 1001);
    let check = verify_energy_conservation(
        &scenario.particles,
        &result,
        EnergyTolerance::relative(config.output.energy_tolerance),
    );
    assert!(check.passed, "{:?}", check);
}
