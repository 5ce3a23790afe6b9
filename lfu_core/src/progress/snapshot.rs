use std::time::Duration;

use serde::Serialize;

/// Placeholder shown while a value is not yet known.
pub const UNKNOWN: &str = "--";

/// Progress of the upload at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressInfo {
    /// Whole percent, always within `0..=100`.
    pub percent: u8,
    pub loaded: u64,
    pub total: u64,
    /// Average speed since the upload started, e.g. `"1.5 KB/s"`.
    pub speed: String,
    /// Estimated time left, e.g. `"2m"`, or `--` while the speed is zero.
    pub remaining: String,
    pub speed_bps: f64,
    pub eta_secs: Option<f64>,
}

impl ProgressInfo {
    /// Builds a snapshot from the bytes sent so far, the body size and the
    /// time since the request was opened.
    pub fn compute(loaded: u64, total: u64, elapsed: Duration) -> Self {
        let percent = if total == 0 {
            0
        } else {
            let raw = (loaded as f64 / total as f64) * 100.0;
            raw.round().clamp(0.0, 100.0) as u8
        };

        let secs = elapsed.as_secs_f64();
        let speed_bps = if secs > 0.0 { loaded as f64 / secs } else { 0.0 };

        let eta_secs = if speed_bps > 0.0 {
            Some(total.saturating_sub(loaded) as f64 / speed_bps)
        } else {
            None
        };

        Self {
            percent,
            loaded,
            total,
            speed: format_speed(speed_bps),
            remaining: eta_secs.map(format_time).unwrap_or_else(|| UNKNOWN.to_string()),
            speed_bps,
            eta_secs,
        }
    }
}

fn scale(value: f64, units: &[&str]) -> String {
    let mut size = value;
    let mut unit = 0;
    while size >= 1024.0 && unit < units.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, units[unit])
}

/// Human-readable transfer rate, e.g. `1536.0` → `"1.5 KB/s"`.
pub fn format_speed(bytes_per_second: f64) -> String {
    scale(bytes_per_second, &["B/s", "KB/s", "MB/s", "GB/s"])
}

/// Coarse duration: seconds below a minute, minutes below an hour, else hours.
pub fn format_time(seconds: f64) -> String {
    if seconds < 60.0 {
        format!("{}s", seconds.round() as u64)
    } else if seconds < 3600.0 {
        format!("{}m", (seconds / 60.0).round() as u64)
    } else {
        format!("{}h", (seconds / 3600.0).round() as u64)
    }
}

/// Human-readable byte count, e.g. `1048576` → `"1.0 MB"`.
pub fn format_file_size(bytes: u64) -> String {
    scale(bytes as f64, &["B", "KB", "MB", "GB", "TB"])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_is_half_at_midpoint() {
        let info = ProgressInfo::compute(500, 1000, Duration::from_secs(1));
        assert_eq!(info.percent, 50);
        assert_eq!(info.loaded, 500);
        assert_eq!(info.total, 1000);
    }

    #[test]
    fn percent_is_clamped_when_loaded_overshoots() {
        let info = ProgressInfo::compute(1500, 1000, Duration::from_secs(1));
        assert_eq!(info.percent, 100);
    }

    #[test]
    fn percent_rounds_to_nearest() {
        let info = ProgressInfo::compute(2, 3, Duration::from_secs(1));
        assert_eq!(info.percent, 67);
    }

    #[test]
    fn speed_and_remaining_use_average_rate() {
        // 1024 bytes in 2s → 512 B/s; 1024 bytes left → 2s.
        let info = ProgressInfo::compute(1024, 2048, Duration::from_secs(2));
        assert_eq!(info.speed, "512.0 B/s");
        assert_eq!(info.remaining, "2s");
        assert_eq!(info.eta_secs, Some(2.0));
    }

    #[test]
    fn zero_elapsed_has_unknown_remaining() {
        let info = ProgressInfo::compute(10, 100, Duration::ZERO);
        assert_eq!(info.speed, "0.0 B/s");
        assert_eq!(info.remaining, UNKNOWN);
        assert!(info.eta_secs.is_none());
    }

    #[test]
    fn format_speed_examples() {
        assert_eq!(format_speed(1536.0), "1.5 KB/s");
        assert_eq!(format_speed(500.0), "500.0 B/s");
        assert_eq!(format_speed(3.0 * 1024.0 * 1024.0), "3.0 MB/s");
    }

    #[test]
    fn format_speed_stops_at_largest_unit() {
        let tb_per_sec = 1024.0_f64.powi(4);
        assert_eq!(format_speed(tb_per_sec), "1024.0 GB/s");
    }

    #[test]
    fn format_time_examples() {
        assert_eq!(format_time(45.0), "45s");
        assert_eq!(format_time(120.0), "2m");
        assert_eq!(format_time(7200.0), "2h");
        assert_eq!(format_time(59.4), "59s");
        assert_eq!(format_time(90.0), "2m");
    }

    #[test]
    fn format_file_size_examples() {
        assert_eq!(format_file_size(0), "0.0 B");
        assert_eq!(format_file_size(1024), "1.0 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024 * 1024 * 1024), "5.0 TB");
    }
}
