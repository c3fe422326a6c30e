//! GPU enumeration through nvidia-smi.

use std::io::ErrorKind;

use tokio::process::Command;

use super::GraphicsController;
use crate::error::{Error, Result};

const QUERY_ARGS: [&str; 2] = [
    "--query-gpu=name,utilization.gpu,memory.used,memory.total",
    "--format=csv,noheader,nounits",
];

/// List the host's NVIDIA controllers.
///
/// A missing binary or a failing query (no driver, no device) means the host
/// exposes no controllers. Output that cannot be understood is a sensor failure.
pub(super) async fn enumerate(binary: &str) -> Result<Vec<GraphicsController>> {
    let output = match Command::new(binary).args(QUERY_ARGS).output().await {
        Ok(output) => output,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!("{} not found, reporting no GPUs", binary);
            return Ok(vec![]);
        }
        Err(e) => {
            return Err(Error::SensorRead(format!("failed to run {}: {}", binary, e)));
        }
    };

    if !output.status.success() {
        tracing::debug!(
            "{} exited with {}: {}",
            binary,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return Ok(vec![]);
    }

    parse_csv(&String::from_utf8_lossy(&output.stdout))
}

/// Parse `name, utilization, memory.used, memory.total` rows.
fn parse_csv(stdout: &str) -> Result<Vec<GraphicsController>> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_row)
        .collect()
}

fn parse_row(line: &str) -> Result<GraphicsController> {
    // Split from the right so a comma inside the product name survives.
    let mut fields = line.rsplitn(4, ',').map(str::trim);
    let (total, used, utilization, name) =
        match (fields.next(), fields.next(), fields.next(), fields.next()) {
            (Some(total), Some(used), Some(utilization), Some(name)) => {
                (total, used, utilization, name)
            }
            _ => {
                return Err(Error::SensorRead(format!(
                    "unexpected nvidia-smi output: {}",
                    line
                )))
            }
        };

    Ok(GraphicsController {
        name: Some(name.to_string()).filter(|n| !n.is_empty()),
        utilization_percent: parse_reading(utilization),
        memory_used_mib: parse_reading(used),
        memory_total_mib: parse_reading(total),
    })
}

/// nvidia-smi prints `[N/A]` or `[Not Supported]` for readings it cannot take.
fn parse_reading(field: &str) -> Option<f64> {
    field.parse::<f64>().ok().filter(|v| v.is_finite())
}
