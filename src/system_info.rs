//! Host statistics reported by `/health` and the machine-derived app id.

use std::path::Path;
use std::time::{Duration, UNIX_EPOCH};

use chrono::{DateTime, Local};
use serde::Serialize;
use sysinfo::{CpuRefreshKind, Disks, MemoryRefreshKind, RefreshKind, System};

const GB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Debug, Clone, Serialize)]
pub struct CpuStats {
    pub usage_percent: f64,
    pub core_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageStats {
    pub total_gb: f64,
    pub used_gb: f64,
    pub usage_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiskStats {
    pub mount_point: String,
    #[serde(flatten)]
    pub usage: UsageStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct BootStats {
    pub boot_time: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemStats {
    pub cpu: CpuStats,
    pub memory: UsageStats,
    /// The disk holding the log directory, if it can be determined.
    pub disk: Option<DiskStats>,
    pub boot: BootStats,
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

pub fn usage(used_bytes: u64, total_bytes: u64) -> UsageStats {
    let total = total_bytes as f64 / GB;
    let used = used_bytes as f64 / GB;
    let usage_percent = if total_bytes > 0 { used_bytes as f64 / total_bytes as f64 * 100.0 } else { 0.0 };
    UsageStats { total_gb: round1(total), used_gb: round1(used), usage_percent: round1(usage_percent) }
}

/// Longest mount point that contains `target`.
pub fn containing_mount<'a>(mounts: impl IntoIterator<Item = &'a Path>, target: &Path) -> Option<&'a Path> {
    mounts
        .into_iter()
        .filter(|m| target.starts_with(m))
        .max_by_key(|m| m.components().count())
}

fn disk_stats(target: &Path) -> Option<DiskStats> {
    let disks = Disks::new_with_refreshed_list();
    let mount = containing_mount(disks.iter().map(|d| d.mount_point()), target)?;
    let disk = disks.iter().find(|d| d.mount_point() == mount)?;
    let total = disk.total_space();
    let used = total.saturating_sub(disk.available_space());
    Some(DiskStats { mount_point: mount.display().to_string(), usage: usage(used, total) })
}

/// Samples CPU, memory, disk and boot information.
///
/// CPU usage needs two samples, so this takes at least
/// `sysinfo::MINIMUM_CPU_UPDATE_INTERVAL`.
pub async fn collect(log_dir: &Path) -> SystemStats {
    let mut sys = System::new_with_specifics(
        RefreshKind::new()
            .with_cpu(CpuRefreshKind::everything())
            .with_memory(MemoryRefreshKind::everything()),
    );
    sys.refresh_cpu_all();
    tokio::time::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL).await;
    sys.refresh_cpu_all();

    let cpus = sys.cpus();
    let cpu_usage = if cpus.is_empty() {
        0.0
    } else {
        cpus.iter().map(|c| c.cpu_usage() as f64).sum::<f64>() / cpus.len() as f64
    };

    let target = match tokio::fs::canonicalize(log_dir).await {
        Ok(p) => p,
        Err(_) => std::env::current_dir().unwrap_or_else(|_| Path::new("/").to_path_buf()),
    };

    let boot = DateTime::<Local>::from(UNIX_EPOCH + Duration::from_secs(System::boot_time()));

    SystemStats {
        cpu: CpuStats { usage_percent: round1(cpu_usage), core_count: cpus.len() },
        memory: usage(sys.used_memory(), sys.total_memory()),
        disk: disk_stats(&target),
        boot: BootStats { boot_time: boot.format("%Y-%m-%d %H:%M:%S").to_string(), uptime_seconds: System::uptime() },
    }
}

/// Stable 16-hex-digit id for this machine, derived from its host name.
pub fn machine_app_id() -> String {
    let host = System::host_name().unwrap_or_else(|| "localhost".to_string());
    let id = uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_DNS, host.as_bytes());
    id.simple().to_string()[..16].to_string()
}
