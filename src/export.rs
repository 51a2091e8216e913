//! Flat-file and structured dumps of recorded trajectories.

use crate::particle::Particle;
use crate::simulation::{SimulationResult, Trajectory};
use anyhow::{Context, Result};
use log::info;
use lorentz_common::{OutputFormat, TrajectoryRecord};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes one trajectory as CSV with header `time_s,x_m,y_m,vx_m_per_s,vy_m_per_s`.
pub fn write_trajectory_csv<W: Write>(writer: W, trajectory: &Trajectory) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for sample in trajectory.samples() {
        csv_writer.serialize(sample)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_records_json<W: Write>(writer: W, records: &[TrajectoryRecord]) -> Result<()> {
    serde_json::to_writer(writer, records)?;
    Ok(())
}

pub fn write_records_bincode<W: Write>(writer: W, records: &[TrajectoryRecord]) -> Result<()> {
    bincode::serialize_into(writer, records)?;
    Ok(())
}

pub fn write_records_messagepack<W: Write>(mut writer: W, records: &[TrajectoryRecord]) -> Result<()> {
    rmp_serde::encode::write(&mut writer, records)?;
    Ok(())
}

fn create_file(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("Error creating output file '{}'", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Writes a finished run in `format` next to `base_filename` and returns the paths written.
///
/// CSV produces one `{base}_particle{i}.csv` per particle; the structured
/// formats write a single `{base}_trajectories.{json,bin,msgpack}`.
pub fn save_result(
    result: &SimulationResult,
    particles: &[Particle],
    base_filename: &str,
    format: OutputFormat,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    match format {
        OutputFormat::Csv => {
            for (idx, trajectory) in result.trajectories.iter().enumerate() {
                let path = PathBuf::from(format!("{}_particle{}.csv", base_filename, idx));
                let mut writer = create_file(&path)?;
                write_trajectory_csv(&mut writer, trajectory)
                    .with_context(|| format!("Error writing CSV '{}'", path.display()))?;
                writer.flush()?;
                written.push(path);
            }
        }
        OutputFormat::Json | OutputFormat::Bincode | OutputFormat::MessagePack => {
            let extension = match format {
                OutputFormat::Json => "json",
                OutputFormat::Bincode => "bin",
                _ => "msgpack",
            };
            let path = PathBuf::from(format!("{}_trajectories.{}", base_filename, extension));
            let records = result.to_records(particles);
            let mut writer = create_file(&path)?;
            let outcome = match format {
                OutputFormat::Json => write_records_json(&mut writer, &records),
                OutputFormat::Bincode => write_records_bincode(&mut writer, &records),
                _ => write_records_messagepack(&mut writer, &records),
            };
            outcome.with_context(|| format!("Error serializing trajectories to '{}'", path.display()))?;
            writer.flush()?;
            written.push(path);
        }
    }
    for path in &written {
        info!("Trajectory data saved to {}", path.display());
    }
    Ok(written)
}
