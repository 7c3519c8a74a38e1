use std::time::Duration;

use tokio::time::Instant;

/// Elapsed times below this are clamped before dividing.
const MIN_ELAPSED: Duration = Duration::from_micros(1);

/// Timing of a completed transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferStats {
    /// Entry to the `Streaming` state.
    pub started: Instant,
    /// After the sink and session were finalized.
    pub finished: Instant,
    pub total_bytes: u64,
}

impl TransferStats {
    pub fn elapsed(&self) -> Duration { self.finished.saturating_duration_since(self.started) }

    /// Bytes per second.
    pub fn throughput_bps(&self) -> f64 {
        self.total_bytes as f64 / self.elapsed().max(MIN_ELAPSED).as_secs_f64()
    }

    /// KiB per second, the unit the device logs.
    pub fn throughput_kbps(&self) -> f64 { self.throughput_bps() / 1024.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(total_bytes: u64, elapsed: Duration) -> TransferStats {
        let started = Instant::now();
        TransferStats {
            started,
            finished: started + elapsed,
            total_bytes,
        }
    }

    #[test]
    fn test_throughput() {
        let s = stats(1024 * 1024, Duration::from_secs(2));
        assert_eq!(s.elapsed(), Duration::from_secs(2));
        assert_eq!(s.throughput_bps(), 524_288.0);
        assert_eq!(s.throughput_kbps(), 512.0);
    }

    #[test]
    fn test_zero_elapsed_is_finite() {
        let s = stats(8192, Duration::ZERO);
        assert!(s.throughput_bps().is_finite());
        assert!(s.throughput_bps() > 0.0);
    }

    #[test]
    fn test_empty_transfer() {
        let s = stats(0, Duration::from_millis(10));
        assert_eq!(s.throughput_bps(), 0.0);
    }
}
