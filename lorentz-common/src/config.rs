use crate::constants::{ELECTRON_CHARGE_C, ELECTRON_MASS_KG};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

// Configuration for timing
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct TimingConfig {
    pub time_step_s: f64,
    pub total_time_s: f64,
    #[serde(default = "default_sample_every_n_steps")]
    pub sample_every_n_steps: u32,
}

// Uniform fields applied to every particle
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct FieldsConfig {
    /// Electric field (V/m), in-plane.
    #[serde(default)]
    pub electric_v_per_m: [f64; 2],
    /// Magnetic field (T). Only the z-component bends planar motion.
    #[serde(default = "default_magnetic_t")]
    pub magnetic_t: [f64; 3],
}

// One explicitly placed particle
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ParticleConfig {
    #[serde(default)]
    pub position_m: [f64; 2],
    #[serde(default)]
    pub velocity_m_per_s: [f64; 2],
    #[serde(default = "default_mass_kg")]
    pub mass_kg: f64,
    #[serde(default = "default_charge_c")]
    pub charge_c: f64,
}

/// A seeded random cloud of electrons starting at the origin.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct EnsembleConfig {
    pub count: u32,
    #[serde(default)]
    pub seed: u64,
    pub speed_mean_m_per_s: f64,
    #[serde(default)]
    pub speed_std_m_per_s: f64,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Json,
    Bincode,
    MessagePack,
}

// Configuration for output settings
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct OutputConfig {
    #[serde(default = "default_base_filename")]
    pub base_filename: String,
    #[serde(default = "default_format")]
    pub format: OutputFormat,
    /// Run the kinetic-energy diagnostic after the simulation.
    #[serde(default = "default_check_energy")]
    pub check_energy: bool,
    /// Maximum relative kinetic-energy deviation for the diagnostic to pass.
    #[serde(default = "default_energy_tolerance")]
    pub energy_tolerance: f64,
}

impl Default for FieldsConfig {
    fn default() -> Self {
        FieldsConfig {
            electric_v_per_m: [0.0, 0.0],
            magnetic_t: default_magnetic_t(),
        }
    }
}

impl Default for ParticleConfig {
    fn default() -> Self {
        ParticleConfig {
            position_m: [0.0, 0.0],
            velocity_m_per_s: [1e5, 0.0],
            mass_kg: default_mass_kg(),
            charge_c: default_charge_c(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            base_filename: default_base_filename(),
            format: default_format(),
            check_energy: default_check_energy(),
            energy_tolerance: default_energy_tolerance(),
        }
    }
}

/// Top-level scenario configuration, loaded from a TOML file.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ScenarioConfig {
    pub timing: TimingConfig,
    #[serde(default)]
    pub fields: FieldsConfig,
    #[serde(default)]
    pub particles: Vec<ParticleConfig>,
    #[serde(default)]
    pub ensemble: Option<EnsembleConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for ScenarioConfig {
    /// A single electron at the origin moving at 1e5 m/s through a 0.1 T field,
    /// stepped at 5 ps (about 70 steps per cyclotron period) for 10,000 steps.
    fn default() -> Self {
        ScenarioConfig {
            timing: TimingConfig {
                time_step_s: 5e-12,
                total_time_s: 5e-8,
                sample_every_n_steps: default_sample_every_n_steps(),
            },
            fields: FieldsConfig::default(),
            particles: vec![ParticleConfig::default()],
            ensemble: None,
            output: OutputConfig::default(),
        }
    }
}

impl ScenarioConfig {
    /// Loads the scenario configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        let config = Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config '{}': {}", path_ref.display(), e))?;

        Ok(config)
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: ScenarioConfig = toml::from_str(config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects scenario-level mistakes. Timing and per-particle values are
    /// checked by the engine when it builds the run.
    pub fn validate(&self) -> Result<()> {
        if !self.fields.electric_v_per_m.iter().chain(self.fields.magnetic_t.iter()).all(|c| c.is_finite()) {
            anyhow::bail!("field components must be finite.");
        }
        if let Some(ensemble) = &self.ensemble {
            if !(ensemble.speed_mean_m_per_s.is_finite() && ensemble.speed_std_m_per_s.is_finite()) {
                anyhow::bail!("ensemble speeds must be finite.");
            }
            if ensemble.speed_std_m_per_s < 0.0 {
                anyhow::bail!("ensemble.speed_std_m_per_s must not be negative.");
            }
        }
        if self.particles.is_empty() && self.ensemble.as_ref().map_or(true, |e| e.count == 0) {
            anyhow::bail!("scenario defines no particles.");
        }
        if !(self.output.energy_tolerance.is_finite() && self.output.energy_tolerance >= 0.0) {
            anyhow::bail!("energy_tolerance must be non-negative.");
        }
        Ok(())
    }
}

fn default_sample_every_n_steps() -> u32 {
    1
}

fn default_magnetic_t() -> [f64; 3] {
    [0.0, 0.0, 0.1]
}

fn default_mass_kg() -> f64 {
    ELECTRON_MASS_KG
}

fn default_charge_c() -> f64 {
    ELECTRON_CHARGE_C
}

fn default_base_filename() -> String {
    "trajectory".to_string()
}

fn default_format() -> OutputFormat {
    OutputFormat::Csv
}

fn default_check_energy() -> bool {
    true
}

fn default_energy_tolerance() -> f64 {
    5e-3 // 0.5 %, magnetic-only runs at ~70 steps per period stay well inside
}
