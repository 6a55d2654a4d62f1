use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;

/// Estimated time to completion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Eta {
    /// No throughput observed yet, or throughput stalled.
    Unknown,
    Remaining(Duration),
}

impl fmt::Display for Eta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eta::Unknown => f.write_str("unknown"),
            Eta::Remaining(d) => {
                let secs = d.as_secs();
                write!(f, "{}h {:02}m {:02}s", secs / 3600, (secs / 60) % 60, secs % 60)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    pub generated_count: u64,
    pub target: u64,
    pub elapsed: Duration,
    /// Records per second over the last interval.
    pub rate: f64,
    /// Records per second since the run started.
    pub overall_rate: f64,
    pub eta: Eta,
    pub percentage: f64,
}

fn rate_over(delta: u64, elapsed_secs: f64) -> f64 {
    if !elapsed_secs.is_finite() || elapsed_secs <= 0.0 {
        return 0.0;
    }
    delta as f64 / elapsed_secs
}

fn percentage(current: u64, target: u64) -> f64 {
    if target == 0 {
        return 100.0;
    }
    (current as f64 / target as f64 * 100.0).clamp(0.0, 100.0)
}

fn eta(current: u64, target: u64, rate: f64) -> Eta {
    if !rate.is_finite() || rate <= 0.0 {
        return Eta::Unknown;
    }
    Duration::try_from_secs_f64(target.saturating_sub(current) as f64 / rate)
        .map(Eta::Remaining)
        .unwrap_or(Eta::Unknown)
}

/// Snapshot for one interval: `previous` records `elapsed_secs` ago, `current`
/// now.
pub fn sample(current: u64, target: u64, previous: u64, elapsed_secs: f64) -> ProgressSnapshot {
    let rate = rate_over(current.saturating_sub(previous), elapsed_secs);
    let elapsed = if elapsed_secs.is_finite() && elapsed_secs > 0.0 {
        Duration::try_from_secs_f64(elapsed_secs).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    };

    ProgressSnapshot {
        generated_count: current,
        target,
        elapsed,
        rate,
        overall_rate: rate,
        eta: eta(current, target, rate),
        percentage: percentage(current, target),
    }
}

/// Rolling progress state for one run.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    target: u64,
    start_count: u64,
    started: Instant,
    previous_count: u64,
    previous_at: Instant,
}

impl ProgressTracker {
    pub fn new(target: u64, start_count: u64, now: Instant) -> Self {
        Self {
            target,
            start_count,
            started: now,
            previous_count: start_count,
            previous_at: now,
        }
    }

    /// Samples against the previous update, then makes this the previous one.
    pub fn update(&mut self, current: u64, now: Instant) -> ProgressSnapshot {
        let interval = now.saturating_duration_since(self.previous_at);
        let elapsed = now.saturating_duration_since(self.started);

        let rate = rate_over(
            current.saturating_sub(self.previous_count),
            interval.as_secs_f64(),
        );
        let overall_rate = rate_over(
            current.saturating_sub(self.start_count),
            elapsed.as_secs_f64(),
        );

        self.previous_count = current;
        self.previous_at = now;

        ProgressSnapshot {
            generated_count: current,
            target: self.target,
            elapsed,
            rate,
            overall_rate,
            eta: eta(current, self.target, rate),
            percentage: percentage(current, self.target),
        }
    }

    pub fn target(&self) -> u64 {
        self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_computes_rate_and_eta() {
        let snapshot = sample(600, 1000, 300, 3.0);
        assert_eq!(snapshot.rate, 100.0);
        assert_eq!(snapshot.eta, Eta::Remaining(Duration::from_secs(4)));
        assert_eq!(snapshot.percentage, 60.0);
    }

    #[test]
    fn test_zero_rate_gives_unknown_eta() {
        let snapshot = sample(300, 1000, 300, 5.0);
        assert_eq!(snapshot.rate, 0.0);
        assert_eq!(snapshot.eta, Eta::Unknown);
    }

    #[test]
    fn test_bad_elapsed_gives_unknown_eta() {
        for elapsed in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let snapshot = sample(500, 1000, 0, elapsed);
            assert_eq!(snapshot.rate, 0.0);
            assert_eq!(snapshot.eta, Eta::Unknown);
        }
    }

    #[test]
    fn test_complete_with_zero_rate_is_unknown() {
        let snapshot = sample(1000, 1000, 1000, 5.0);
        assert_eq!(snapshot.rate, 0.0);
        assert_eq!(snapshot.eta, Eta::Unknown);
        assert_eq!(snapshot.percentage, 100.0);
    }

    #[test]
    fn test_complete_with_progress_has_zero_eta_and_clamped_percentage() {
        let snapshot = sample(1200, 1000, 900, 3.0);
        assert_eq!(snapshot.rate, 100.0);
        assert_eq!(snapshot.eta, Eta::Remaining(Duration::ZERO));
        assert_eq!(snapshot.percentage, 100.0);
    }

    #[test]
    fn test_tracker_rolls_previous_sample() {
        let start = Instant::now();
        let mut tracker = ProgressTracker::new(1000, 100, start);

        let first = tracker.update(300, start + Duration::from_secs(2));
        assert_eq!(first.rate, 100.0);
        assert_eq!(first.overall_rate, 100.0);

        let second = tracker.update(400, start + Duration::from_secs(6));
        assert_eq!(second.rate, 25.0);
        assert_eq!(second.overall_rate, 50.0);
        assert_eq!(second.elapsed, Duration::from_secs(6));
        assert_eq!(second.eta, Eta::Remaining(Duration::from_secs(24)));
    }

    #[test]
    fn test_eta_display() {
        assert_eq!(Eta::Unknown.to_string(), "unknown");
        assert_eq!(
            Eta::Remaining(Duration::from_secs(3723)).to_string(),
            "1h 02m 03s"
        );
    }
}
