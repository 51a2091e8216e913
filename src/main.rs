use anyhow::Result;
use clap::Parser;
use log::{debug, error, info, warn};
use lorentz_common::{OutputFormat, ScenarioConfig};
use lorentz_engine::{
    cyclotron_period, cyclotron_radius, export, run, verify_energy_conservation, EnergyTolerance, Scenario,
    RECOMMENDED_STEPS_PER_CYCLOTRON_PERIOD,
};
use std::path::PathBuf;
use std::time::Instant;

/// Charged-particle trajectories under the Lorentz force (RK4).
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scenario file (TOML). Built-in single-electron scenario when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Electric field Ex (V/m)
    #[arg(long, allow_negative_numbers = true)]
    ex: Option<f64>,

    /// Electric field Ey (V/m)
    #[arg(long, allow_negative_numbers = true)]
    ey: Option<f64>,

    /// Magnetic field Bz (T)
    #[arg(long, allow_negative_numbers = true)]
    bz: Option<f64>,

    /// Initial velocity vx (m/s), applied to every explicit particle
    #[arg(long, allow_negative_numbers = true)]
    v0x: Option<f64>,

    /// Initial velocity vy (m/s), applied to every explicit particle
    #[arg(long, allow_negative_numbers = true)]
    v0y: Option<f64>,

    /// Physics time step (s)
    #[arg(long)]
    dt: Option<f64>,

    /// Simulated duration (s)
    #[arg(long)]
    total_time: Option<f64>,

    /// Record every N-th step
    #[arg(long)]
    sample_every: Option<u32>,

    /// Output format: csv, json, bincode or messagepack
    #[arg(long, value_parser = parse_format)]
    format: Option<OutputFormat>,

    /// Base name for output files
    #[arg(short, long)]
    output: Option<String>,

    /// Skip the kinetic-energy diagnostic
    #[arg(long)]
    no_energy_check: bool,
}

fn parse_format(value: &str) -> Result<OutputFormat, String> {
    match value.to_ascii_lowercase().as_str() {
        "csv" => Ok(OutputFormat::Csv),
        "json" => Ok(OutputFormat::Json),
        "bincode" | "bin" => Ok(OutputFormat::Bincode),
        "messagepack" | "msgpack" => Ok(OutputFormat::MessagePack),
        other => Err(format!("unknown output format '{}'", other)),
    }
}

impl Args {
    /// Layers command-line overrides on top of the file (or built-in) scenario.
    fn apply_to(&self, config: &mut ScenarioConfig) {
        if let Some(ex) = self.ex {
            config.fields.electric_v_per_m[0] = ex;
        }
        if let Some(ey) = self.ey {
            config.fields.electric_v_per_m[1] = ey;
        }
        if let Some(bz) = self.bz {
            config.fields.magnetic_t[2] = bz;
        }
        for particle in &mut config.particles {
            if let Some(v0x) = self.v0x {
                particle.velocity_m_per_s[0] = v0x;
            }
            if let Some(v0y) = self.v0y {
                particle.velocity_m_per_s[1] = v0y;
            }
        }
        if let Some(dt) = self.dt {
            config.timing.time_step_s = dt;
        }
        if let Some(total_time) = self.total_time {
            config.timing.total_time_s = total_time;
        }
        if let Some(n) = self.sample_every {
            config.timing.sample_every_n_steps = n;
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
        if let Some(output) = &self.output {
            config.output.base_filename = output.clone();
        }
        if self.no_energy_check {
            config.output.check_energy = false;
        }
    }
}

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();
    let args = Args::parse();

    info!("Starting Lorentz RK4 engine...");

    // --- Load Configuration ---
    let mut config = match &args.config {
        Some(path) => ScenarioConfig::load(path)?,
        None => {
            info!("No config file given; using the built-in single-electron scenario.");
            ScenarioConfig::default()
        }
    };
    args.apply_to(&mut config);
    debug!("Scenario: {:#?}", config);

    let scenario = Scenario::from_config(&config)?;
    let bz = config.fields.magnetic_t[2];
    let e_is_zero = config.fields.electric_v_per_m.iter().all(|c| *c == 0.0);

    // Advisory only: the engine runs any positive step.
    if bz != 0.0 {
        for (idx, particle) in scenario.particles.iter().enumerate() {
            let period = cyclotron_period(particle.charge(), particle.mass(), bz);
            let steps_per_period = period / scenario.config.time_step();
            if steps_per_period < RECOMMENDED_STEPS_PER_CYCLOTRON_PERIOD {
                warn!(
                    "Particle {}: only {:.1} steps per cyclotron period (recommended ~{}); expect energy drift.",
                    idx, steps_per_period, RECOMMENDED_STEPS_PER_CYCLOTRON_PERIOD
                );
            }
        }
    }

    // --- Run ---
    let start_time = Instant::now();
    let result = run(&scenario.particles, &scenario.config, &scenario.fields)?;
    info!(
        "Simulation finished in {:.3} seconds ({} steps, t = {:e} s).",
        start_time.elapsed().as_secs_f64(),
        result.steps_taken,
        result.final_time
    );

    for (idx, (particle, state)) in scenario.particles.iter().zip(&result.final_states).enumerate() {
        let speed = particle.initial_state().velocity.length();
        if bz != 0.0 && particle.charge() != 0.0 {
            info!(
                "Particle {}: final position ({:e}, {:e}) m, cyclotron radius {:e} m",
                idx,
                state.position.x,
                state.position.y,
                cyclotron_radius(particle.charge(), particle.mass(), speed, bz)
            );
        } else {
            info!("Particle {}: final position ({:e}, {:e}) m", idx, state.position.x, state.position.y);
        }
    }

    // --- Energy Diagnostic ---
    if config.output.check_energy {
        if !e_is_zero {
            warn!("Electric field is non-zero; kinetic energy is not expected to be conserved.");
        }
        let tolerance = EnergyTolerance::relative(config.output.energy_tolerance);
        let check = verify_energy_conservation(&scenario.particles, &result, tolerance);
        if check.passed {
            info!(
                "Energy check passed (worst relative deviation {:.3e}, tolerance {:.1e}).",
                check.worst_relative_deviation(),
                tolerance.relative
            );
        } else {
            error!(
                "Energy check FAILED (worst relative deviation {:.3e}, tolerance {:.1e}); consider a smaller time step.",
                check.worst_relative_deviation(),
                tolerance.relative
            );
        }
    } else {
        info!("Skipping energy check as per config.");
    }

    // --- Save Recorded Data ---
    info!("Saving recorded data...");
    export::save_result(&result, &scenario.particles, &config.output.base_filename, config.output.format)?;

    info!("Simulation Complete.");
    Ok(())
}
