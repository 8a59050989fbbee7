use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct Metrics {
    // Counters
    total_requests: AtomicUsize,
    successful_requests: AtomicUsize,
    failed_requests: AtomicUsize,

    // Timing (in microseconds)
    total_analyze_time_us: AtomicU64,
    total_fetch_time_us: AtomicU64,
    total_stamp_time_us: AtomicU64,

    // Counts
    documents_analyzed: AtomicUsize,
    funds_fetched: AtomicUsize,
    documents_stamped: AtomicUsize,
    standard_risks_found: AtomicUsize,
    other_risks_found: AtomicUsize,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            total_requests: AtomicUsize::new(0),
            successful_requests: AtomicUsize::new(0),
            failed_requests: AtomicUsize::new(0),
            total_analyze_time_us: AtomicU64::new(0),
            total_fetch_time_us: AtomicU64::new(0),
            total_stamp_time_us: AtomicU64::new(0),
            documents_analyzed: AtomicUsize::new(0),
            funds_fetched: AtomicUsize::new(0),
            documents_stamped: AtomicUsize::new(0),
            standard_risks_found: AtomicUsize::new(0),
            other_risks_found: AtomicUsize::new(0),
        })
    }

    pub fn record_request(&self, success: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_analysis(&self, duration: Duration, standard: usize, other: usize) {
        self.total_analyze_time_us.fetch_add(micros(duration), Ordering::Relaxed);
        self.documents_analyzed.fetch_add(1, Ordering::Relaxed);
        self.standard_risks_found.fetch_add(standard, Ordering::Relaxed);
        self.other_risks_found.fetch_add(other, Ordering::Relaxed);
    }

    pub fn record_fetch(&self, duration: Duration, funds: usize) {
        self.total_fetch_time_us.fetch_add(micros(duration), Ordering::Relaxed);
        self.funds_fetched.fetch_add(funds, Ordering::Relaxed);
    }

    pub fn record_stamp(&self, duration: Duration) {
        self.total_stamp_time_us.fetch_add(micros(duration), Ordering::Relaxed);
        self.documents_stamped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            avg_analyze_time_ms: avg_time_ms(&self.total_analyze_time_us, &self.documents_analyzed),
            avg_fetch_time_ms: avg_time_ms(&self.total_fetch_time_us, &self.funds_fetched),
            avg_stamp_time_ms: avg_time_ms(&self.total_stamp_time_us, &self.documents_stamped),
            documents_analyzed: self.documents_analyzed.load(Ordering::Relaxed),
            funds_fetched: self.funds_fetched.load(Ordering::Relaxed),
            documents_stamped: self.documents_stamped.load(Ordering::Relaxed),
            standard_risks_found: self.standard_risks_found.load(Ordering::Relaxed),
            other_risks_found: self.other_risks_found.load(Ordering::Relaxed),
        }
    }
}

fn micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

fn avg_time_ms(total_us: &AtomicU64, count: &AtomicUsize) -> f64 {
    let total = total_us.load(Ordering::Relaxed) as f64;
    let cnt = count.load(Ordering::Relaxed) as f64;
    if cnt > 0.0 {
        total / cnt / 1000.0 // Convert to ms
    } else {
        0.0
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub avg_analyze_time_ms: f64,
    pub avg_fetch_time_ms: f64,
    pub avg_stamp_time_ms: f64,
    pub documents_analyzed: usize,
    pub funds_fetched: usize,
    pub documents_stamped: usize,
    pub standard_risks_found: usize,
    pub other_risks_found: usize,
}

pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
