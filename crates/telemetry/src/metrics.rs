//! In-process counters and latency samples.
//!
//! Nothing here leaves the process; the runner prints a [`Snapshot`] on
//! request and the edge runtime discards the registry with the instance.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

/// Samples kept per series. Older samples are evicted first.
pub const SERIES_WINDOW: usize = 1024;

/// Named counters and sample series.
///
/// Once a name exists, counting takes only a shared lock on the name table
/// and an atomic add. Each series has its own lock, held for one push.
pub struct MetricsRegistry {
    counters: RwLock<HashMap<String, AtomicU64>>,
    series: RwLock<HashMap<String, Mutex<Window>>>,
    started: Instant,
}

/// Most recent samples of one series plus the all-time count.
#[derive(Default)]
struct Window {
    recent: VecDeque<f64>,
    total: u64,
}

impl Window {
    fn push(&mut self, value: f64) {
        if self.recent.len() == SERIES_WINDOW {
            self.recent.pop_front();
        }
        self.recent.push_back(value);
        self.total += 1;
    }
}

impl MetricsRegistry {
    pub(crate) fn new() -> Self {
        Self {
            counters: RwLock::new(HashMap::new()),
            series: RwLock::new(HashMap::new()),
            started: Instant::now(),
        }
    }

    /// Add one to `name`.
    pub fn increment(&self, name: &str) {
        self.increment_by(name, 1);
    }

    /// Add `value` to `name`.
    pub fn increment_by(&self, name: &str, value: u64) {
        if let Some(count) = self.counters.read().unwrap_or_else(PoisonError::into_inner).get(name) {
            count.fetch_add(value, Ordering::Relaxed);
            return;
        }
        self.counters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.to_owned())
            .or_default()
            .fetch_add(value, Ordering::Relaxed);
    }

    /// Current value of `name`, zero when never touched.
    pub fn counter(&self, name: &str) -> u64 {
        self.counters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map_or(0, |count| count.load(Ordering::Relaxed))
    }

    /// Append one sample to the series `name`, evicting the oldest once
    /// [`SERIES_WINDOW`] samples are held.
    pub fn record(&self, name: &str, value: f64) {
        if let Some(window) = self.series.read().unwrap_or_else(PoisonError::into_inner).get(name) {
            window.lock().unwrap_or_else(PoisonError::into_inner).push(value);
            return;
        }
        self.series
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.to_owned())
            .or_default()
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .push(value);
    }

    /// Samples currently held for `name`.
    pub fn retained(&self, name: &str) -> usize {
        self.series
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map_or(0, |window| window.lock().unwrap_or_else(PoisonError::into_inner).recent.len())
    }

    /// Seconds since the registry was created.
    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    /// Point-in-time copy of everything recorded so far.
    pub fn snapshot(&self) -> Snapshot {
        let counters = self
            .counters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, count)| (name.clone(), count.load(Ordering::Relaxed)))
            .collect();

        let series = self
            .series
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, window)| {
                let window = window.lock().unwrap_or_else(PoisonError::into_inner);
                let values: Vec<f64> = window.recent.iter().copied().collect();
                let summary = Summary {
                    total: window.total,
                    ..Summary::of(&values)
                };
                (name.clone(), summary)
            })
            .collect();

        Snapshot {
            session_id: crate::session_id().to_owned(),
            uptime_secs: self.uptime_secs(),
            counters,
            series,
        }
    }
}

/// Serializable view of a [`MetricsRegistry`].
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// Session the numbers belong to
    pub session_id: String,
    /// Registry age
    pub uptime_secs: u64,
    /// Counter values by name
    pub counters: BTreeMap<String, u64>,
    /// Sample summaries by name
    pub series: BTreeMap<String, Summary>,
}

/// Order statistics over the retained window of one series.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    /// Samples ever recorded, including evicted ones
    pub total: u64,
    /// Samples in the window
    pub count: usize,
    /// Smallest sample
    pub min: f64,
    /// Largest sample
    pub max: f64,
    /// Arithmetic mean
    pub mean: f64,
    /// Median (nearest rank)
    pub p50: f64,
    /// 95th percentile (nearest rank)
    pub p95: f64,
    /// 99th percentile (nearest rank)
    pub p99: f64,
}

impl Summary {
    /// Summarize `values`; an empty series yields all zeros.
    pub fn of(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let rank = |p: f64| {
            let index = (p * sorted.len() as f64).ceil() as usize;
            sorted[index.clamp(1, sorted.len()) - 1]
        };

        Self {
            total: sorted.len() as u64,
            count: sorted.len(),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            mean: sorted.iter().sum::<f64>() / sorted.len() as f64,
            p50: rank(0.50),
            p95: rank(0.95),
            p99: rank(0.99),
        }
    }
}

/// Wall-clock timer that records milliseconds into a series when stopped
/// or dropped, whichever comes first.
pub struct Timer {
    name: String,
    start: Instant,
    done: bool,
}

impl Timer {
    /// Start timing the series `name`.
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
            done: false,
        }
    }

    /// Record now and return the elapsed time.
    pub fn stop(mut self) -> Duration {
        self.finish()
    }

    fn finish(&mut self) -> Duration {
        let elapsed = self.start.elapsed();
        if !std::mem::replace(&mut self.done, true) {
            crate::metrics().record(&self.name, elapsed.as_secs_f64() * 1000.0);
            tracing::debug!(series = %self.name, elapsed_ms = elapsed.as_millis() as u64, "timer finished");
        }
        elapsed
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.finish();
    }
}
