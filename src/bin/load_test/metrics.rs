//! Run metrics and pass/fail thresholds.

use std::{
    fmt,
    sync::{
        Mutex,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

/// Counters shared by every virtual user.
#[derive(Debug, Default)]
pub struct Metrics {
    checks: AtomicU64,
    checks_passed: AtomicU64,
    requests: AtomicU64,
    requests_failed: AtomicU64,
    durations: Mutex<Vec<Duration>>,
}

impl Metrics {
    pub fn record_check(&self, passed: bool) {
        self.checks.fetch_add(1, Ordering::Relaxed);
        if passed {
            self.checks_passed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Records a completed request, `duration` is `None` for requests which
    /// got no response.
    pub fn record_request(&self, failed: bool, duration: Option<Duration>) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.requests_failed.fetch_add(1, Ordering::Relaxed);
        }
        if let (Some(duration), Ok(mut durations)) = (duration, self.durations.lock()) {
            durations.push(duration);
        }
    }

    pub fn summary(&self) -> Summary {
        let mut durations = self
            .durations
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default();
        durations.sort_unstable();
        Summary {
            checks: self.checks.load(Ordering::Relaxed),
            checks_passed: self.checks_passed.load(Ordering::Relaxed),
            requests: self.requests.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            p95: percentile(&durations, 95),
        }
    }
}

/// Nearest-rank percentile of sorted durations.
fn percentile(sorted: &[Duration], pct: usize) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let rank = (sorted.len() * pct).div_ceil(100).max(1);
    sorted[rank - 1]
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Summary {
    pub checks: u64,
    pub checks_passed: u64,
    pub requests: u64,
    pub requests_failed: u64,
    pub p95: Duration,
}

impl Summary {
    pub fn checks_rate(&self) -> f64 {
        rate(self.checks_passed, self.checks)
    }

    pub fn failed_rate(&self) -> f64 {
        rate(self.requests_failed, self.requests)
    }
}

fn rate(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "checks............: {:.2}% ({} of {})",
            self.checks_rate() * 100.0,
            self.checks_passed,
            self.checks
        )?;
        writeln!(
            f,
            "http_req_failed...: {:.2}% ({} of {})",
            self.failed_rate() * 100.0,
            self.requests_failed,
            self.requests
        )?;
        writeln!(f, "http_req_duration.: p(95)={}ms", self.p95.as_millis())
    }
}

/// Pass criteria of a run.
#[derive(Clone, Copy, Debug)]
pub struct Thresholds {
    min_checks_rate: f64,
    max_failed_rate: f64,
    max_p95: Duration,
}

impl Thresholds {
    /// Checks above 95%, failures below 1%, p95 below one second.
    pub fn standard() -> Self {
        Self {
            min_checks_rate: 0.95,
            max_failed_rate: 0.01,
            max_p95: Duration::from_millis(1000),
        }
    }

    /// Names of the crossed thresholds, empty when the run passed.
    pub fn violations(&self, summary: &Summary) -> Vec<&'static str> {
        let mut violations = Vec::new();
        if summary.checks_rate() <= self.min_checks_rate {
            violations.push("checks rate>0.95");
        }
        if summary.failed_rate() >= self.max_failed_rate {
            violations.push("http_req_failed rate<0.01");
        }
        if summary.p95 >= self.max_p95 {
            violations.push("http_req_duration p(95)<1000");
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile() {
        let durations: Vec<_> = (1..=100).map(Duration::from_millis).collect();
        assert_eq!(percentile(&durations, 95), Duration::from_millis(95));
        assert_eq!(percentile(&durations[..1], 95), Duration::from_millis(1));
        assert_eq!(percentile(&[], 95), Duration::ZERO);
    }

    #[test]
    fn test_thresholds_pass() {
        let metrics = Metrics::default();
        for _ in 0..100 {
            metrics.record_check(true);
            metrics.record_request(false, Some(Duration::from_millis(120)));
        }
        let summary = metrics.summary();
        assert_eq!(summary.checks_rate(), 1.0);
        assert!(Thresholds::standard().violations(&summary).is_empty());
    }

    #[test]
    fn test_thresholds_fail() {
        let metrics = Metrics::default();
        for i in 0..10 {
            metrics.record_check(i < 9);
            metrics.record_request(i == 0, Some(Duration::from_millis(1500)));
        }
        metrics.record_request(true, None);
        let summary = metrics.summary();
        assert_eq!(summary.requests, 11);
        assert_eq!(summary.requests_failed, 2);
        assert_eq!(
            Thresholds::standard().violations(&summary),
            vec![
                "checks rate>0.95",
                "http_req_failed rate<0.01",
                "http_req_duration p(95)<1000"
            ]
        );
    }

    #[test]
    fn test_empty_run_fails_checks() {
        let summary = Metrics::default().summary();
        assert_eq!(
            Thresholds::standard().violations(&summary),
            vec!["checks rate>0.95"]
        );
    }
}
