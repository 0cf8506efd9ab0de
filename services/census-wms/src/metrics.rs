//! Application metrics collection and reporting.

use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::sync::RwLock;

/// Metrics collector for the census WMS API.
#[derive(Debug)]
pub struct MetricsCollector {
    /// Request counts
    pub wms_requests: AtomicU64,
    pub tile_requests: AtomicU64,
    pub overlay_requests: AtomicU64,

    /// Render stats
    pub renders_total: AtomicU64,
    pub render_errors: AtomicU64,

    /// Timing stats (stored as microseconds for atomic ops)
    render_times: RwLock<TimingStats>,

    /// Per-style timing stats
    style_times: RwLock<HashMap<String, TimingStats>>,

    /// Detailed pipeline timing stats
    png_encode_times: RwLock<TimingStats>,
    feature_lookup_times: RwLock<TimingStats>,

    /// Start time for uptime calculation
    start_time: Instant,
}

#[derive(Debug, Default)]
struct TimingStats {
    count: u64,
    total_us: u64,
    min_us: u64,
    max_us: u64,
    last_us: u64,
}

impl TimingStats {
    fn record(&mut self, duration_us: u64) {
        self.count += 1;
        self.total_us += duration_us;
        self.last_us = duration_us;
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

    fn last_ms(&self) -> f64 {
        self.last_us as f64 / 1000.0
    }

    fn min_ms(&self) -> f64 {
        self.min_us as f64 / 1000.0
    }

    fn max_ms(&self) -> f64 {
        self.max_us as f64 / 1000.0
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            wms_requests: AtomicU64::new(0),
            tile_requests: AtomicU64::new(0),
            overlay_requests: AtomicU64::new(0),
            renders_total: AtomicU64::new(0),
            render_errors: AtomicU64::new(0),
            render_times: RwLock::new(TimingStats::default()),
            style_times: RwLock::new(HashMap::new()),
            png_encode_times: RwLock::new(TimingStats::default()),
            feature_lookup_times: RwLock::new(TimingStats::default()),
            start_time: Instant::now(),
        }
    }

    /// Record a WMS request
    pub fn record_wms_request(&self) {
        self.wms_requests.fetch_add(1, Ordering::Relaxed);
        counter!("wms_requests_total").increment(1);
    }

    /// Record an XYZ tile request
    pub fn record_tile_request(&self) {
        self.tile_requests.fetch_add(1, Ordering::Relaxed);
        counter!("tile_requests_total").increment(1);
    }

    /// Record an overlay API request
    pub fn record_overlay_request(&self) {
        self.overlay_requests.fetch_add(1, Ordering::Relaxed);
        counter!("overlay_requests_total").increment(1);
    }

    /// Record a render operation
    pub async fn record_render(&self, duration_us: u64, success: bool) {
        self.renders_total.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.render_errors.fetch_add(1, Ordering::Relaxed);
        }
        counter!("renders_total").increment(1);
        histogram!("render_duration_ms").record(duration_us as f64 / 1000.0);

        let mut times = self.render_times.write().await;
        times.record(duration_us);
    }

    /// Record a render operation attributed to the style that produced it
    pub async fn record_render_with_style(&self, duration_us: u64, success: bool, style: &str) {
        self.record_render(duration_us, success).await;

        if success {
            let mut style_times = self.style_times.write().await;
            style_times
                .entry(style.to_string())
                .or_insert_with(TimingStats::default)
                .record(duration_us);

            histogram!("render_duration_by_style_ms", "style" => style.to_string())
                .record(duration_us as f64 / 1000.0);
            counter!("renders_by_style_total", "style" => style.to_string()).increment(1);
        }
    }

    /// Record PNG encoding time
    pub async fn record_png_encode(&self, duration_us: u64) {
        let mut times = self.png_encode_times.write().await;
        times.record(duration_us);
        histogram!("png_encode_duration_ms").record(duration_us as f64 / 1000.0);
    }

    /// Record point-in-district lookup time
    pub async fn record_feature_lookup(&self, duration_us: u64) {
        let mut times = self.feature_lookup_times.write().await;
        times.record(duration_us);
        histogram!("feature_lookup_duration_ms").record(duration_us as f64 / 1000.0);
    }

    /// Get current metrics snapshot
    pub async fn snapshot(&self) -> MetricsSnapshot {
        let render_times = self.render_times.read().await;
        let style_times = self.style_times.read().await;
        let png_encode_times = self.png_encode_times.read().await;
        let feature_lookup_times = self.feature_lookup_times.read().await;

        let mut style_stats = HashMap::new();
        for (style, stats) in style_times.iter() {
            style_stats.insert(
                style.clone(),
                StyleStats {
                    count: stats.count,
                    avg_ms: stats.avg_ms(),
                    min_ms: stats.min_ms(),
                    max_ms: stats.max_ms(),
                    last_ms: stats.last_ms(),
                },
            );
        }

        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),

            wms_requests: self.wms_requests.load(Ordering::Relaxed),
            tile_requests: self.tile_requests.load(Ordering::Relaxed),
            overlay_requests: self.overlay_requests.load(Ordering::Relaxed),

            renders_total: self.renders_total.load(Ordering::Relaxed),
            render_errors: self.render_errors.load(Ordering::Relaxed),
            render_avg_ms: render_times.avg_ms(),
            render_last_ms: render_times.last_ms(),
            render_min_ms: render_times.min_ms(),
            render_max_ms: render_times.max_ms(),

            style_stats,

            png_encode_avg_ms: png_encode_times.avg_ms(),
            png_encode_last_ms: png_encode_times.last_ms(),
            png_encode_count: png_encode_times.count,

            feature_lookup_avg_ms: feature_lookup_times.avg_ms(),
            feature_lookup_last_ms: feature_lookup_times.last_ms(),
            feature_lookup_count: feature_lookup_times.count,
        }
    }

    /// Reset all counters (useful for testing)
    pub async fn reset(&self) {
        self.wms_requests.store(0, Ordering::Relaxed);
        self.tile_requests.store(0, Ordering::Relaxed);
        self.overlay_requests.store(0, Ordering::Relaxed);
        self.renders_total.store(0, Ordering::Relaxed);
        self.render_errors.store(0, Ordering::Relaxed);

        *self.render_times.write().await = TimingStats::default();
        self.style_times.write().await.clear();
        *self.png_encode_times.write().await = TimingStats::default();
        *self.feature_lookup_times.write().await = TimingStats::default();
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of current metrics for JSON serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,

    // Request counts
    pub wms_requests: u64,
    pub tile_requests: u64,
    pub overlay_requests: u64,

    // Render stats
    pub renders_total: u64,
    pub render_errors: u64,
    pub render_avg_ms: f64,
    pub render_last_ms: f64,
    pub render_min_ms: f64,
    pub render_max_ms: f64,

    // Per-style stats
    pub style_stats: HashMap<String, StyleStats>,

    // Pipeline timing breakdown
    pub png_encode_avg_ms: f64,
    pub png_encode_last_ms: f64,
    pub png_encode_count: u64,

    pub feature_lookup_avg_ms: f64,
    pub feature_lookup_last_ms: f64,
    pub feature_lookup_count: u64,
}

/// Per-style performance statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleStats {
    pub count: u64,
    pub avg_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub last_ms: f64,
}

/// Timer guard for measuring operation duration.
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_micros() as f64 / 1000.0
    }
}
