//! GPU enumeration for hosts without nvidia-smi.
//!
//! macOS asks `system_profiler`, Windows asks `wmic`, and everything else reads
//! the DRM devices under `/sys/class/drm`. These sources report names and
//! VRAM only, so utilization is usually unknown.

use std::path::Path;

use super::GraphicsController;
use crate::error::Result;

const MIB: f64 = 1024.0 * 1024.0;

#[cfg(target_os = "macos")]
pub(super) async fn enumerate() -> Result<Vec<GraphicsController>> {
    Ok(run("system_profiler", &["SPDisplaysDataType"])
        .await
        .map(|stdout| parse_system_profiler(&stdout))
        .unwrap_or_default())
}

#[cfg(target_os = "windows")]
pub(super) async fn enumerate() -> Result<Vec<GraphicsController>> {
    Ok(run(
        "wmic",
        &["path", "Win32_VideoController", "get", "Name,AdapterRAM", "/Format:List"],
    )
    .await
    .map(|stdout| parse_wmic_list(&stdout))
    .unwrap_or_default())
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub(super) async fn enumerate() -> Result<Vec<GraphicsController>> {
    tokio::task::spawn_blocking(|| read_drm(Path::new("/sys/class/drm")))
        .await
        .map_err(|e| crate::error::Error::SensorRead(format!("sensor task failed: {}", e)))
}

/// Stdout of a successful run, `None` if the tool is missing or fails.
#[cfg_attr(not(any(target_os = "macos", target_os = "windows")), allow(dead_code))]
async fn run(program: &str, args: &[&str]) -> Option<String> {
    let output = match tokio::process::Command::new(program).args(args).output().await {
        Ok(output) => output,
        Err(e) => {
            tracing::debug!("Could not run {}: {}", program, e);
            return None;
        }
    };

    if !output.status.success() {
        tracing::debug!("{} exited with {}", program, output.status);
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// One controller per `Chipset Model:` line; `VRAM ...:` lines attach to the
/// controller above them. Apple Silicon reports no VRAM line.
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
fn parse_system_profiler(stdout: &str) -> Vec<GraphicsController> {
    let mut controllers: Vec<GraphicsController> = Vec::new();

    for line in stdout.lines().map(str::trim) {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();

        if key == "Chipset Model" && !value.is_empty() {
            controllers.push(GraphicsController {
                name: Some(value.to_string()),
                ..GraphicsController::default()
            });
        } else if key.starts_with("VRAM") {
            if let Some(current) = controllers.last_mut() {
                current.memory_total_mib = parse_size_mib(value);
            }
        }
    }

    controllers
}

/// `"8 GB"` or `"1536 MB"` in MiB.
fn parse_size_mib(value: &str) -> Option<f64> {
    let mut parts = value.split_whitespace();
    let amount: f64 = parts.next()?.parse().ok()?;
    match parts.next()?.to_ascii_uppercase().as_str() {
        "GB" => Some(amount * 1024.0),
        "MB" => Some(amount),
        _ => None,
    }
}

/// `Key=Value` records separated by blank lines; `AdapterRAM` is in bytes.
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
fn parse_wmic_list(stdout: &str) -> Vec<GraphicsController> {
    let mut controllers = Vec::new();
    let mut current = GraphicsController::default();

    for line in stdout.lines().map(str::trim) {
        if line.is_empty() {
            if current.name.is_some() {
                controllers.push(std::mem::take(&mut current));
            } else {
                current = GraphicsController::default();
            }
            continue;
        }

        if let Some(name) = line.strip_prefix("Name=") {
            current.name = Some(name.trim().to_string()).filter(|n| !n.is_empty());
        } else if let Some(ram) = line.strip_prefix("AdapterRAM=") {
            current.memory_total_mib = ram.trim().parse::<f64>().ok().map(|bytes| bytes / MIB);
        }
    }
    if current.name.is_some() {
        controllers.push(current);
    }

    controllers
}

/// Every `cardN` under `root` that has a PCI vendor, in card order.
///
/// amdgpu exposes VRAM counters and a busy percentage; other drivers only
/// identify the device.
#[cfg_attr(any(target_os = "macos", target_os = "windows"), allow(dead_code))]
fn read_drm(root: &Path) -> Vec<GraphicsController> {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("Cannot read {}: {}", root.display(), e);
            return Vec::new();
        }
    };

    let mut cards: Vec<(u32, std::path::PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name();
            let index = name.to_str()?.strip_prefix("card")?.parse::<u32>().ok()?;
            Some((index, entry.path().join("device")))
        })
        .collect();
    cards.sort_by_key(|(index, _)| *index);

    cards
        .into_iter()
        .filter_map(|(_, device)| drm_controller(&device))
        .collect()
}

fn drm_controller(device: &Path) -> Option<GraphicsController> {
    let read = |file: &str| {
        std::fs::read_to_string(device.join(file))
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };
    let read_number = |file: &str| read(file).and_then(|s| s.parse::<f64>().ok());

    let vendor = read("vendor")?;
    let device_id = read("device").unwrap_or_default();

    let name = read("product_name").unwrap_or_else(|| {
        format!(
            "{} GPU [{}:{}]",
            vendor_name(&vendor),
            vendor.trim_start_matches("0x"),
            device_id.trim_start_matches("0x")
        )
    });

    Some(GraphicsController {
        name: Some(name),
        utilization_percent: read_number("gpu_busy_percent"),
        memory_used_mib: read_number("mem_info_vram_used").map(|b| b / MIB),
        memory_total_mib: read_number("mem_info_vram_total").map(|b| b / MIB),
    })
}

fn vendor_name(vendor: &str) -> &'static str {
    match vendor.to_ascii_lowercase().as_str() {
        "0x10de" => "NVIDIA",
        "0x1002" => "AMD",
        "0x8086" => "Intel",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_profiler_discrete_and_integrated() {
        let stdout = "\
Graphics/Displays:

    Intel UHD Graphics 630:

      Chipset Model: Intel UHD Graphics 630
      Type: GPU
      Bus: Built-In
      VRAM (Dynamic, Max): 1536 MB
      Vendor: Intel

    AMD Radeon Pro 5500M:

      Chipset Model: AMD Radeon Pro 5500M
      Type: GPU
      Bus: PCIe
      VRAM (Total): 8 GB
      Displays:
        Color LCD:
          Resolution: 3072 x 1920 Retina
";
        let controllers = parse_system_profiler(stdout);

        assert_eq!(controllers.len(), 2);
        assert_eq!(controllers[0].name.as_deref(), Some("Intel UHD Graphics 630"));
        assert_eq!(controllers[0].memory_total_mib, Some(1536.0));
        assert_eq!(controllers[1].name.as_deref(), Some("AMD Radeon Pro 5500M"));
        assert_eq!(controllers[1].memory_total_mib, Some(8192.0));
        assert_eq!(controllers[1].utilization_percent, None);
    }

    #[test]
    fn test_system_profiler_apple_silicon() {
        let stdout = "\
Graphics/Displays:

    Apple M2 Pro:

      Chipset Model: Apple M2 Pro
      Type: GPU
      Bus: Built-In
      Total Number of Cores: 19
      Vendor: Apple (0x106b)
      Metal Support: Metal 3
";
        let controllers = parse_system_profiler(stdout);

        assert_eq!(controllers.len(), 1);
        assert_eq!(controllers[0].name.as_deref(), Some("Apple M2 Pro"));
        assert_eq!(controllers[0].memory_total_mib, None);
    }

    #[test]
    fn test_wmic_list() {
        let stdout = "\r\n\r\nAdapterRAM=4293918720\r\nName=NVIDIA GeForce GTX 1650\r\n\r\n\
                      AdapterRAM=1073741824\r\nName=Intel(R) UHD Graphics 630\r\n\r\n\r\n";
        let controllers = parse_wmic_list(stdout);

        assert_eq!(controllers.len(), 2);
        assert_eq!(controllers[0].name.as_deref(), Some("NVIDIA GeForce GTX 1650"));
        assert_eq!(controllers[1].name.as_deref(), Some("Intel(R) UHD Graphics 630"));
        assert_eq!(controllers[1].memory_total_mib, Some(1024.0));
    }

    #[test]
    fn test_wmic_record_without_name_is_skipped() {
        let controllers = parse_wmic_list("AdapterRAM=1048576\n\nName=Basic Display\n");
        assert_eq!(controllers.len(), 1);
        assert_eq!(controllers[0].name.as_deref(), Some("Basic Display"));
        assert_eq!(controllers[0].memory_total_mib, None);
    }

    fn write_device(root: &Path, card: &str, files: &[(&str, &str)]) {
        let device = root.join(card).join("device");
        std::fs::create_dir_all(&device).unwrap();
        for (file, contents) in files {
            std::fs::write(device.join(file), format!("{}\n", contents)).unwrap();
        }
    }

    #[test]
    fn test_drm_amd_and_intel() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_device(
            root,
            "card1",
            &[
                ("vendor", "0x1002"),
                ("device", "0x73bf"),
                ("gpu_busy_percent", "42"),
                ("mem_info_vram_total", "17163091968"),
                ("mem_info_vram_used", "1073741824"),
            ],
        );
        write_device(root, "card0", &[("vendor", "0x8086"), ("device", "0x9a49")]);
        std::fs::create_dir_all(root.join("card1-DP-1")).unwrap();
        std::fs::create_dir_all(root.join("renderD128")).unwrap();

        let controllers = read_drm(root);

        assert_eq!(controllers.len(), 2);
        assert_eq!(controllers[0].name.as_deref(), Some("Intel GPU [8086:9a49]"));
        assert_eq!(controllers[0].memory_total_mib, None);
        assert_eq!(controllers[1].name.as_deref(), Some("AMD GPU [1002:73bf]"));
        assert_eq!(controllers[1].utilization_percent, Some(42.0));
        assert_eq!(controllers[1].memory_used_mib, Some(1024.0));
        assert_eq!(controllers[1].memory_total_mib, Some(16368.0));
    }

    #[test]
    fn test_drm_prefers_product_name_and_skips_vendorless_cards() {
        let dir = tempfile::tempdir().unwrap();
        write_device(
            dir.path(),
            "card0",
            &[("vendor", "0x1002"), ("product_name", "Radeon RX 7900 XTX")],
        );
        write_device(dir.path(), "card2", &[("device", "0x0001")]);

        let controllers = read_drm(dir.path());
        assert_eq!(controllers.len(), 1);
        assert_eq!(controllers[0].name.as_deref(), Some("Radeon RX 7900 XTX"));
    }

    #[test]
    fn test_drm_missing_root() {
        assert!(read_drm(Path::new("/definitely/not/a/drm/root")).is_empty());
    }
}
