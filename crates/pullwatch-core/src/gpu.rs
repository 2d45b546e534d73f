//! NVIDIA GPU telemetry via `nvidia-smi`.

use std::io::ErrorKind;

use serde::Serialize;
use tracing::{debug, warn};

use crate::command::CommandRunner;
use crate::error::{PullwatchError, Result};

pub const NVIDIA_SMI: &str = "nvidia-smi";

pub const QUERY_ARGS: [&str; 2] = [
    "--query-gpu=gpu_name,memory.used,memory.total,temperature.gpu,utilization.gpu",
    "--format=csv,noheader,nounits",
];

pub const NO_GPU_MESSAGE: &str = "No NVIDIA GPU found";

const FIELD_SEPARATOR: &str = ", ";

/// One GPU as reported by a single `nvidia-smi` query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GpuSample {
    pub name: String,
    /// MiB
    pub memory_used: f64,
    /// MiB
    pub memory_total: f64,
    /// Celsius
    pub temperature: f64,
    /// Percent
    pub utilization: f64,
}

/// Body of the `/gpu` response: either the sample list or an error message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GpuReport {
    Gpus { gpus: Vec<GpuSample> },
    Error { error: String },
}

impl GpuReport {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }
}

/// Parse `csv,noheader,nounits` output, one GPU per line.
pub fn parse_samples(stdout: &str) -> Result<Vec<GpuSample>> {
    let stdout = stdout.trim();
    if stdout.is_empty() {
        return Err(PullwatchError::GpuParse {
            line: String::new(),
            reason: "no output".to_string(),
        });
    }
    stdout.lines().map(parse_line).collect()
}

fn parse_line(line: &str) -> Result<GpuSample> {
    let line = line.trim_end_matches('\r');
    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();

    let [name, used, total, temp, util] = fields.as_slice() else {
        return Err(PullwatchError::GpuParse {
            line: line.to_string(),
            reason: format!("expected 5 fields, got {}", fields.len()),
        });
    };

    Ok(GpuSample {
        name: name.trim().to_string(),
        memory_used: parse_number(line, "memory.used", used)?,
        memory_total: parse_number(line, "memory.total", total)?,
        temperature: parse_number(line, "temperature.gpu", temp)?,
        utilization: parse_number(line, "utilization.gpu", util)?,
    })
}

fn parse_number(line: &str, field: &str, raw: &str) -> Result<f64> {
    raw.trim().parse().map_err(|_| PullwatchError::GpuParse {
        line: line.to_string(),
        reason: format!("{field} is not a number: {raw:?}"),
    })
}

/// Query all GPUs. Never fails: tool and parse errors become [`GpuReport::Error`].
pub fn query_gpus(runner: &dyn CommandRunner) -> GpuReport {
    let output = match runner.run(NVIDIA_SMI, &QUERY_ARGS, None) {
        Ok(out) => out,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("nvidia-smi not found");
            return GpuReport::error(NO_GPU_MESSAGE);
        }
        Err(e) => {
            warn!("nvidia-smi execution failed: {}", e);
            return GpuReport::error(e.to_string());
        }
    };

    if !output.success() {
        debug!(code = ?output.code, stderr = %output.stderr.trim(), "nvidia-smi reported no GPU");
        return GpuReport::error(NO_GPU_MESSAGE);
    }

    match parse_samples(&output.stdout) {
        Ok(gpus) => GpuReport::Gpus { gpus },
        Err(e) => {
            warn!("Failed to parse nvidia-smi output: {}", e);
            GpuReport::error(e.to_string())
        }
    }
}
