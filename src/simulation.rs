use crate::fields::Fields;
use crate::integrator::rk4_step;
use crate::lorentz::lorentz_acceleration;
use crate::particle::{Particle, State};
use crate::sim_config::SimulationConfig;
use anyhow::{Context, Result};
use log::{debug, info, trace};
use lorentz_common::{TrajectoryRecord, TrajectorySample};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Upper bound on the states reserved per trajectory up front; longer runs grow on demand.
const MAX_RESERVED_SAMPLES: u64 = 4096;

/// Recorded states of one particle, in strictly increasing time order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    states: Vec<State>,
}

impl Trajectory {
    fn with_capacity(capacity: usize) -> Self {
        Self { states: Vec::with_capacity(capacity) }
    }

    fn push(&mut self, state: State) {
        self.states.push(state);
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn first(&self) -> Option<&State> {
        self.states.first()
    }

    pub fn last(&self) -> Option<&State> {
        self.states.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, State> {
        self.states.iter()
    }

    /// The trajectory as exporter records `{time, x, y, vx, vy}`.
    pub fn samples(&self) -> impl Iterator<Item = TrajectorySample> + '_ {
        self.states.iter().map(State::to_sample)
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a State;
    type IntoIter = std::slice::Iter<'a, State>;

    fn into_iter(self) -> Self::IntoIter {
        self.states.iter()
    }
}

/// Everything a finished run produced. Owned by the caller; the engine keeps nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// `trajectories[i]` belongs to the i-th particle passed to the engine.
    pub trajectories: Vec<Trajectory>,
    /// State of each particle after the last step.
    pub final_states: Vec<State>,
    /// Simulated time elapsed when the run stopped (s).
    pub final_time: f64,
    /// Number of RK4 steps taken per particle.
    pub steps_taken: u64,
}

impl SimulationResult {
    pub fn particle_count(&self) -> usize {
        self.trajectories.len()
    }

    pub fn trajectory(&self, particle_index: usize) -> Option<&Trajectory> {
        self.trajectories.get(particle_index)
    }

    pub fn into_trajectories(self) -> Vec<Trajectory> {
        self.trajectories
    }

    /// Pairs each trajectory with its particle's identity for structured export.
    pub fn to_records(&self, particles: &[Particle]) -> Vec<TrajectoryRecord> {
        self.trajectories
            .iter()
            .zip(particles)
            .enumerate()
            .map(|(particle_index, (trajectory, particle))| TrajectoryRecord {
                particle_index,
                mass_kg: particle.mass(),
                charge_c: particle.charge(),
                samples: trajectory.samples().collect(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationStatus {
    Initialized,
    Running,
    Completed,
}

/// Steps a set of independent charged particles through shared fields.
///
/// Drive it in one call with [`Simulation::run_to_completion`], or one step
/// at a time with [`Simulation::step`] (a presentation layer pauses by simply
/// not calling it).
pub struct Simulation<'f> {
    config: SimulationConfig,
    fields: &'f Fields,
    particles: Vec<Particle>,
    /// Latest state per particle.
    states: Vec<State>,
    trajectories: Vec<Trajectory>,
    /// Simulated time elapsed since the start of the run.
    elapsed: f64,
    steps_taken: u64,
    total_steps: u64,
    status: SimulationStatus,
}

impl<'f> Simulation<'f> {
    /// Prepares a run and records each particle's initial state.
    ///
    /// Fails without stepping if the timing or any particle is invalid.
    pub fn new(particles: Vec<Particle>, config: SimulationConfig, fields: &'f Fields) -> Result<Self> {
        config.validate().context("invalid simulation config")?;
        for (idx, particle) in particles.iter().enumerate() {
            particle.validate().with_context(|| format!("invalid particle {}", idx))?;
        }

        let total_steps = config.total_steps();
        let sample_capacity = config.expected_sample_count().min(MAX_RESERVED_SAMPLES) as usize;

        let states: Vec<State> = particles.iter().map(Particle::initial_state).collect();
        let trajectories = states
            .iter()
            .map(|state| {
                let mut trajectory = Trajectory::with_capacity(sample_capacity);
                trajectory.push(*state);
                trajectory
            })
            .collect();

        info!(
            "Simulation initialized: {} particle(s), dt = {:e} s, {} steps, sampling every {} step(s).",
            particles.len(),
            config.time_step(),
            total_steps,
            config.sample_every_n_steps()
        );
        debug!("Fields: {:?}", fields);

        Ok(Self {
            config,
            fields,
            particles,
            states,
            trajectories,
            elapsed: 0.0,
            steps_taken: 0,
            total_steps,
            status: if total_steps == 0 { SimulationStatus::Completed } else { SimulationStatus::Initialized },
        })
    }

    /// Advances every particle by one RK4 step and records samples that are due.
    pub fn step(&mut self) -> Result<()> {
        if self.status == SimulationStatus::Completed {
            anyhow::bail!("simulation already completed after {} steps.", self.steps_taken);
        }
        self.status = SimulationStatus::Running;

        let dt = self.config.time_step();
        let fields = self.fields;

        // Particles never interact, so each one advances independently.
        self.states
            .par_iter_mut()
            .zip(self.particles.par_iter())
            .for_each(|(state, particle)| {
                *state = advance_particle(state, particle, fields, dt);
            });

        self.elapsed += dt;
        self.steps_taken += 1;
        trace!("Step [{}/{}] t = {:e} s", self.steps_taken, self.total_steps, self.elapsed);

        let is_last_step = self.steps_taken == self.total_steps;
        if is_last_step || self.steps_taken % u64::from(self.config.sample_every_n_steps()) == 0 {
            self.record_samples();
        }
        if is_last_step {
            self.status = SimulationStatus::Completed;
            info!("Simulation completed: {} steps, t = {:e} s.", self.steps_taken, self.elapsed);
        }
        Ok(())
    }

    fn record_samples(&mut self) {
        debug!("Recording sample at step {} (t = {:e} s)", self.steps_taken, self.elapsed);
        for (trajectory, state) in self.trajectories.iter_mut().zip(&self.states) {
            trajectory.push(*state);
        }
    }

    /// Steps until the configured duration is covered and hands over the results.
    pub fn run_to_completion(mut self) -> SimulationResult {
        while self.status != SimulationStatus::Completed {
            // step() only fails once completed, which the loop condition excludes.
            if self.step().is_err() {
                break;
            }
        }
        self.into_result()
    }

    /// Hands over whatever has been recorded so far.
    pub fn into_result(self) -> SimulationResult {
        SimulationResult {
            trajectories: self.trajectories,
            final_states: self.states,
            final_time: self.elapsed,
            steps_taken: self.steps_taken,
        }
    }

    pub fn status(&self) -> SimulationStatus {
        self.status
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Latest state of every particle.
    pub fn current_states(&self) -> &[State] {
        &self.states
    }

    pub fn trajectories(&self) -> &[Trajectory] {
        &self.trajectories
    }

    pub fn elapsed_time(&self) -> f64 {
        self.elapsed
    }

    pub fn steps_taken(&self) -> u64 {
        self.steps_taken
    }

    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }
}

/// One RK4 step for one particle, with the Lorentz law evaluated against the shared fields.
fn advance_particle(state: &State, particle: &Particle, fields: &Fields, dt: f64) -> State {
    let (charge, mass) = (particle.charge(), particle.mass());
    rk4_step(state, dt, |t, x, v| {
        lorentz_acceleration(charge, mass, v, fields.electric_at(t, x), fields.magnetic_at(t, x))
    })
}

/// Runs `particles` for the configured duration in one blocking call.
pub fn run(particles: &[Particle], config: &SimulationConfig, fields: &Fields) -> Result<SimulationResult> {
    let simulation = Simulation::new(particles.to_vec(), *config, fields)?;
    Ok(simulation.run_to_completion())
}
