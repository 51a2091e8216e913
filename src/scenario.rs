use crate::fields::Fields;
use crate::particle::Particle;
use crate::sim_config::SimulationConfig;
use anyhow::{Context, Result};
use log::{debug, info};
use lorentz_common::{EnsembleConfig, ScenarioConfig, Vec2, Vec3, ELECTRON_CHARGE_C, ELECTRON_MASS_KG};
use rand::distr::Uniform;
use rand::prelude::*;
use rand_distr::Normal;

/// Everything needed to start a run, built from a scenario file.
#[derive(Debug)]
pub struct Scenario {
    pub particles: Vec<Particle>,
    pub fields: Fields,
    pub config: SimulationConfig,
}

impl Scenario {
    pub fn from_config(scenario: &ScenarioConfig) -> Result<Self> {
        scenario.validate()?;
        let config = SimulationConfig::from_timing(&scenario.timing)?;
        let fields = build_fields(scenario);
        let particles = build_particles(scenario)?;
        info!("Scenario built with {} particle(s).", particles.len());
        Ok(Self { particles, fields, config })
    }
}

/// Uniform fields from the `[fields]` section.
pub fn build_fields(scenario: &ScenarioConfig) -> Fields {
    Fields::uniform(
        Vec2::from(scenario.fields.electric_v_per_m),
        Vec3::from(scenario.fields.magnetic_t),
    )
}

/// Explicit `[[particles]]` first, then the `[ensemble]` cloud if present.
pub fn build_particles(scenario: &ScenarioConfig) -> Result<Vec<Particle>> {
    let mut particles = Vec::with_capacity(scenario.particles.len());
    for (idx, p) in scenario.particles.iter().enumerate() {
        let particle = Particle::new(p.mass_kg, p.charge_c, Vec2::from(p.position_m), Vec2::from(p.velocity_m_per_s))
            .with_context(|| format!("invalid particles[{}]", idx))?;
        particles.push(particle);
    }
    if let Some(ensemble) = &scenario.ensemble {
        particles.extend(sample_ensemble(ensemble)?);
    }
    Ok(particles)
}

/// Electrons at the origin with isotropic directions and normally distributed
/// speeds (clamped at zero). The same seed always gives the same cloud.
pub fn sample_ensemble(ensemble: &EnsembleConfig) -> Result<Vec<Particle>> {
    let mut rng = StdRng::seed_from_u64(ensemble.seed);
    let angle_dist = Uniform::new(0.0f64, std::f64::consts::TAU)?;
    let speed_dist = Normal::new(ensemble.speed_mean_m_per_s, ensemble.speed_std_m_per_s)
        .map_err(|e| anyhow::anyhow!("invalid ensemble speed distribution: {}", e))?;

    debug!(
        "Sampling {} electrons (seed {}, speed {:e} ± {:e} m/s)",
        ensemble.count, ensemble.seed, ensemble.speed_mean_m_per_s, ensemble.speed_std_m_per_s
    );

    (0..ensemble.count)
        .map(|_| {
            let theta = rng.sample(&angle_dist);
            let speed = rng.sample(&speed_dist).max(0.0);
            let velocity = Vec2::new(theta.cos(), theta.sin()) * speed;
            Particle::new(ELECTRON_MASS_KG, ELECTRON_CHARGE_C, Vec2::zero(), velocity)
        })
        .collect()
}
