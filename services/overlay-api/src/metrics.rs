//! Application metrics collection and reporting.

use metrics::{counter, histogram};
use overlay_common::LayerKind;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::sync::RwLock;

/// Metrics collector for the overlay API.
#[derive(Debug)]
pub struct MetricsCollector {
    pub tiles_rendered: AtomicU64,
    pub render_errors: AtomicU64,
    pub readings_requests: AtomicU64,
    pub readings_errors: AtomicU64,
    pub sessions_created: AtomicU64,
    pub sessions_expired: AtomicU64,

    render_times: RwLock<TimingStats>,
    start_time: Instant,
}

#[derive(Debug, Default)]
struct TimingStats {
    count: u64,
    total_us: u64,
    min_us: u64,
    max_us: u64,
}

impl TimingStats {
    fn record(&mut self, duration_us: u64) {
        self.count += 1;
        self.total_us += duration_us;
        if self.min_us == 0 || duration_us < self.min_us {
            self.min_us = duration_us;
        }
        if duration_us > self.max_us {
            self.max_us = duration_us;
        }
    }

    fn avg_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            (self.total_us as f64 / self.count as f64) / 1000.0
        }
    }
}

/// Point-in-time view served at `/api/metrics`.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub tiles_rendered: u64,
    pub render_errors: u64,
    pub readings_requests: u64,
    pub readings_errors: u64,
    pub sessions_created: u64,
    pub sessions_expired: u64,
    pub render_avg_ms: f64,
    pub render_min_ms: f64,
    pub render_max_ms: f64,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            tiles_rendered: AtomicU64::new(0),
            render_errors: AtomicU64::new(0),
            readings_requests: AtomicU64::new(0),
            readings_errors: AtomicU64::new(0),
            sessions_created: AtomicU64::new(0),
            sessions_expired: AtomicU64::new(0),
            render_times: RwLock::new(TimingStats::default()),
            start_time: Instant::now(),
        }
    }

    /// Record a tile render
    pub async fn record_render(&self, kind: LayerKind, duration_us: u64, success: bool) {
        if success {
            self.tiles_rendered.fetch_add(1, Ordering::Relaxed);
            counter!("overlay_tiles_rendered_total", "kind" => kind.as_str()).increment(1);
        } else {
            self.render_errors.fetch_add(1, Ordering::Relaxed);
            counter!("overlay_render_errors_total", "kind" => kind.as_str()).increment(1);
        }
        histogram!("overlay_render_duration_ms").record(duration_us as f64 / 1000.0);

        let mut times = self.render_times.write().await;
        times.record(duration_us);
    }

    /// Record a current-conditions lookup
    pub fn record_readings_request(&self, success: bool) {
        self.readings_requests.fetch_add(1, Ordering::Relaxed);
        counter!("overlay_readings_requests_total").increment(1);
        if !success {
            self.readings_errors.fetch_add(1, Ordering::Relaxed);
            counter!("overlay_readings_errors_total").increment(1);
        }
    }

    pub fn record_session_created(&self) {
        self.sessions_created.fetch_add(1, Ordering::Relaxed);
        counter!("overlay_sessions_created_total").increment(1);
    }

    pub fn record_sessions_expired(&self, count: u64) {
        self.sessions_expired.fetch_add(count, Ordering::Relaxed);
        counter!("overlay_sessions_expired_total").increment(count);
    }

    pub async fn snapshot(&self) -> MetricsSnapshot {
        let times = self.render_times.read().await;
        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            tiles_rendered: self.tiles_rendered.load(Ordering::Relaxed),
            render_errors: self.render_errors.load(Ordering::Relaxed),
            readings_requests: self.readings_requests.load(Ordering::Relaxed),
            readings_errors: self.readings_errors.load(Ordering::Relaxed),
            sessions_created: self.sessions_created.load(Ordering::Relaxed),
            sessions_expired: self.sessions_expired.load(Ordering::Relaxed),
            render_avg_ms: times.avg_ms(),
            render_min_ms: times.min_us as f64 / 1000.0,
            render_max_ms: times.max_us as f64 / 1000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::assert_approx_eq;

    #[tokio::test]
    async fn test_render_stats() {
        let metrics = MetricsCollector::new();
        metrics.record_render(LayerKind::Wind, 2_000, true).await;
        metrics.record_render(LayerKind::Wind, 4_000, true).await;
        metrics.record_render(LayerKind::Temperature, 1_000, false).await;

        let snapshot = metrics.snapshot().await;
        assert_eq!(snapshot.tiles_rendered, 2);
        assert_eq!(snapshot.render_errors, 1);
        assert_eq!(snapshot.render_min_ms, 1.0);
        assert_eq!(snapshot.render_max_ms, 4.0);
        assert_approx_eq!(snapshot.render_avg_ms, 7.0 / 3.0, 1e-9);
    }

    #[test]
    fn test_readings_counts() {
        let metrics = MetricsCollector::new();
        metrics.record_readings_request(true);
        metrics.record_readings_request(false);
        assert_eq!(metrics.readings_requests.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.readings_errors.load(Ordering::Relaxed), 1);
    }
}
