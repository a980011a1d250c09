use std::time::{Duration, Instant};

const KIB: f32 = 1024.0;
const MIB: f32 = KIB * 1024.0;

/// Byte counter for a streamed download that reports at most once per
/// `interval`.
pub struct TransferMeter {
    total: Option<u64>,
    received: u64,
    interval: Duration,
    window_start: Instant,
    window_bytes: u64,
}

impl TransferMeter {
    pub fn new(total: Option<u64>, interval: Duration) -> Self {
        Self {
            total,
            received: 0,
            interval,
            window_start: Instant::now(),
            window_bytes: 0,
        }
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    /// Missing bytes once the stream ended, when the size was announced.
    pub fn shortfall(&self) -> Option<u64> {
        self.total
            .filter(|total| self.received < *total)
            .map(|total| total - self.received)
    }

    /// Count `bytes` and return a progress line if a report is due.
    pub fn record(&mut self, bytes: usize) -> Option<String> {
        self.received += bytes as u64;
        self.window_bytes += bytes as u64;
        let elapsed = self.window_start.elapsed();
        if elapsed < self.interval {
            return None;
        }
        let speed = self.window_bytes as f32 / elapsed.as_secs_f32();
        self.window_start = Instant::now();
        self.window_bytes = 0;
        Some(self.describe(speed))
    }

    fn describe(&self, bytes_per_sec: f32) -> String {
        match self.total {
            Some(total) if total > 0 => format!(
                "{:.1}% of {} at {}",
                self.received as f32 / total as f32 * 100.0,
                format_size(total),
                format_speed(bytes_per_sec)
            ),
            _ => format!(
                "{} at {}",
                format_size(self.received),
                format_speed(bytes_per_sec)
            ),
        }
    }
}

pub fn format_size(bytes: u64) -> String {
    let bytes = bytes as f32;
    if bytes < KIB {
        format!("{bytes:.0} B")
    } else if bytes < MIB {
        format!("{:.1} KB", bytes / KIB)
    } else {
        format!("{:.1} MB", bytes / MIB)
    }
}

pub fn format_speed(bytes_per_sec: f32) -> String {
    format!("{}/s", format_size(bytes_per_sec.max(0.0) as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_use_binary_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2_048), "2.0 KB");
        assert_eq!(format_speed(5_242_880.0), "5.0 MB/s");
    }

    #[test]
    fn meter_reports_percent_when_size_known() {
        let mut meter = TransferMeter::new(Some(200), Duration::ZERO);
        let line = meter.record(50).unwrap();
        assert!(line.starts_with("25.0% of 200 B at "), "{line}");
        assert_eq!(meter.shortfall(), Some(150));
        meter.record(150);
        assert_eq!(meter.shortfall(), None);
        assert_eq!(meter.received(), 200);
    }

    #[test]
    fn meter_stays_quiet_within_interval() {
        let mut meter = TransferMeter::new(None, Duration::from_secs(3600));
        assert!(meter.record(1024).is_none());
        assert_eq!(meter.shortfall(), None);
    }
}
