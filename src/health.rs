// Health probe payload — process liveness plus a coarse memory reading.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};

const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub timestamp: String,
    pub platform: &'static str,
    pub memory: MemoryReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemoryReport {
    /// Resident set size.
    pub rss: String,
    /// Virtual size of the process. There is no managed heap to report, so
    /// this is an upper bound on address space, not live allocations.
    pub heap: String,
}

impl HealthReport {
    /// Take a snapshot of the running process.
    pub fn capture() -> Self {
        let (rss, virt) = process_memory().unwrap_or((0, 0));
        Self {
            status: "ok",
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            platform: platform_name(std::env::consts::OS),
            memory: MemoryReport {
                rss: format_megabytes(rss),
                heap: format_megabytes(virt),
            },
        }
    }
}

/// Platform identifier in the `darwin` / `win32` / `linux` convention.
fn platform_name(os: &'static str) -> &'static str {
    match os {
        "macos" | "ios" => "darwin",
        "windows" => "win32",
        "solaris" | "illumos" => "sunos",
        other => other,
    }
}

/// Resident and virtual size of this process, in bytes.
fn process_memory() -> Option<(u64, u64)> {
    let pid = sysinfo::get_current_pid().ok()?;
    let mut system = System::new();
    system.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[pid]),
        true,
        ProcessRefreshKind::nothing().with_memory(),
    );
    let process = system.process(pid)?;
    Some((process.memory(), process.virtual_memory()))
}

pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / BYTES_PER_MEGABYTE)
}
