pub mod config;
pub mod constants;
pub mod sample;
pub mod vecmath;

// Re-export key types for easier use by dependent crates
pub use config::{EnsembleConfig, FieldsConfig, OutputConfig, OutputFormat, ParticleConfig, ScenarioConfig, TimingConfig};
pub use constants::{ELECTRON_CHARGE_C, ELECTRON_MASS_KG, ELEMENTARY_CHARGE_C};
pub use sample::{TrajectoryRecord, TrajectorySample, SAMPLE_HEADER};
pub use vecmath::{Vec2, Vec3};
