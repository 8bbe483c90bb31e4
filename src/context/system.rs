//! Linux system readings turned into 0–10 context scores
//!
//! - CPU/memory: `sysinfo(2)` one-minute load average normalised by online
//!   CPUs, averaged with memory pressure
//! - Wi-Fi: link quality from `/proc/net/wireless` (0–70 scale)
//!
//! Anything unavailable reports the neutral score.

use std::path::PathBuf;
use tracing::debug;

use super::ContextProvider;
use crate::config::defaults::NEUTRAL_CONTEXT_SCORE;
use crate::types::{normalize_score, ContextSnapshot};

/// Maximum link quality reported by most Linux wireless drivers.
const MAX_LINK_QUALITY: f64 = 70.0;

/// Default location of the wireless statistics table.
const PROC_NET_WIRELESS: &str = "/proc/net/wireless";

/// Context provider backed by the host operating system.
#[derive(Debug, Clone)]
pub struct SystemContext {
    wireless_path: PathBuf,
}

impl SystemContext {
    pub fn new() -> Self {
        Self {
            wireless_path: PathBuf::from(PROC_NET_WIRELESS),
        }
    }

    /// Read Wi-Fi statistics from a different file (tests, containers).
    pub fn with_wireless_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.wireless_path = path.into();
        self
    }

    /// CPU/memory score, higher is healthier.
    pub fn pc_score(&self) -> f64 {
        match read_load_and_memory() {
            Ok((cpu_busy_pct, mem_used_pct)) => {
                let cpu = normalize_score(10.0 - cpu_busy_pct / 10.0);
                let mem = normalize_score(10.0 - mem_used_pct / 10.0);
                round2((cpu + mem) / 2.0)
            }
            Err(e) => {
                debug!(error = %e, "System sensor unavailable, using neutral score");
                NEUTRAL_CONTEXT_SCORE
            }
        }
    }

    /// Wi-Fi score for the interface matching `hint`, or the first listed one.
    pub fn wifi_score(&self, hint: &str) -> f64 {
        match std::fs::read_to_string(&self.wireless_path) {
            Ok(contents) => parse_wireless(&contents, hint).unwrap_or_else(|| {
                debug!(hint, "No wireless interface reported, using neutral score");
                NEUTRAL_CONTEXT_SCORE
            }),
            Err(e) => {
                debug!(path = %self.wireless_path.display(), error = %e, "Wireless stats unavailable");
                NEUTRAL_CONTEXT_SCORE
            }
        }
    }
}

impl Default for SystemContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextProvider for SystemContext {
    fn snapshot(&self, wifi_hint: Option<&str>) -> ContextSnapshot {
        ContextSnapshot::new(self.pc_score(), wifi_hint.map(|hint| self.wifi_score(hint)))
    }

    fn provider_name(&self) -> &'static str {
        "System"
    }
}

/// Parse `/proc/net/wireless` and score the selected interface.
///
/// Prefers the interface whose name equals `hint`; otherwise takes the first
/// data row. Returns `None` when no row parses.
fn parse_wireless(contents: &str, hint: &str) -> Option<f64> {
    let rows: Vec<(&str, f64)> = contents
        .lines()
        .skip(2)
        .filter_map(|line| {
            let (iface, rest) = line.split_once(':')?;
            let quality = rest
                .split_whitespace()
                .nth(1)?
                .trim_end_matches('.')
                .parse::<f64>()
                .ok()?;
            Some((iface.trim(), quality))
        })
        .collect();

    let (_, quality) = rows
        .iter()
        .find(|(iface, _)| *iface == hint)
        .or_else(|| rows.first())?;

    Some(round2(normalize_score(quality / MAX_LINK_QUALITY * 10.0)))
}

/// Returns `(cpu_busy_percent, memory_used_percent)`.
#[cfg(target_os = "linux")]
fn read_load_and_memory() -> Result<(f64, f64), String> {
    use std::mem::MaybeUninit;

    // Load averages are fixed-point with SI_LOAD_SHIFT = 16.
    const LOAD_SCALE: f64 = 65_536.0;

    let mut info = MaybeUninit::<libc::sysinfo>::uninit();
    let result = unsafe { libc::sysinfo(info.as_mut_ptr()) };
    if result != 0 {
        return Err("sysinfo failed".to_string());
    }
    let info = unsafe { info.assume_init() };

    let cpus = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
    let cpus = if cpus > 0 { cpus as f64 } else { 1.0 };

    let load1 = info.loads[0] as f64 / LOAD_SCALE;
    let cpu_busy_pct = (load1 / cpus * 100.0).min(100.0);

    let unit = f64::from(info.mem_unit.max(1));
    let total = info.totalram as f64 * unit;
    let available = (info.freeram as f64 + info.bufferram as f64) * unit;
    if total <= 0.0 {
        return Err("sysinfo reported zero total memory".to_string());
    }
    let mem_used_pct = ((total - available) / total * 100.0).clamp(0.0, 100.0);

    Ok((cpu_busy_pct, mem_used_pct))
}

#[cfg(not(target_os = "linux"))]
fn read_load_and_memory() -> Result<(f64, f64), String> {
    Err("system sensors are only implemented for Linux".to_string())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
Inter-| sta-|   Quality        |   Discarded packets               | Missed | WE
 face | tus | link level noise |  nwid  crypt   frag  retry   misc | beacon | 22
 wlan0: 0000   56.  -54.  -256        0      0      0      0      0        0
 wlan1: 0000   35.  -75.  -256        0      0      0      0      0        0
";

    #[test]
    fn test_parse_wireless_prefers_hinted_interface() {
        assert_eq!(parse_wireless(SAMPLE, "wlan1"), Some(5.0));
    }

    #[test]
    fn test_parse_wireless_falls_back_to_first_row() {
        assert_eq!(parse_wireless(SAMPLE, "home-ssid"), Some(8.0));
    }

    #[test]
    fn test_parse_wireless_empty_table() {
        let header_only: String = SAMPLE.lines().take(2).collect::<Vec<_>>().join("\n");
        assert_eq!(parse_wireless(&header_only, "wlan0"), None);
    }

    #[test]
    fn test_missing_wireless_file_is_neutral() {
        let dir = tempfile::tempdir().unwrap();
        let provider = SystemContext::new().with_wireless_path(dir.path().join("absent"));
        assert_eq!(provider.wifi_score("wlan0"), NEUTRAL_CONTEXT_SCORE);
    }

    #[test]
    fn test_snapshot_reads_wireless_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let provider = SystemContext::new().with_wireless_path(file.path());

        let snapshot = provider.snapshot(Some("wlan0"));
        assert_eq!(snapshot.wifi_score, Some(8.0));
        assert!((0.0..=10.0).contains(&snapshot.cpu_score));
        assert_eq!(provider.snapshot(None).wifi_score, None);
    }
}
