//! Process-wide delivery metrics and their text exposition.
//!
//! Counters are append-only and shared between the scraping loop and the
//! HTTP surface. Increments are atomic; the per-family lock is only taken for
//! writing the first time a label set is seen.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";
pub const OPENMETRICS_CONTENT_TYPE: &str =
    "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// Reason a module's item stream was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptReason {
    Timeout,
    Exhausted,
    Error,
}

impl InterruptReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterruptReason::Timeout => "timeout",
            InterruptReason::Exhausted => "exhausted",
            InterruptReason::Error => "error",
        }
    }
}

impl std::fmt::Display for InterruptReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text format negotiated from the `Accept` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpositionFormat {
    Prometheus,
    OpenMetrics,
}

impl ExpositionFormat {
    pub fn negotiate(accept: Option<&str>) -> Self {
        match accept {
            Some(accept) if accept.contains("application/openmetrics-text") => {
                ExpositionFormat::OpenMetrics
            }
            _ => ExpositionFormat::Prometheus,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExpositionFormat::Prometheus => PROMETHEUS_CONTENT_TYPE,
            ExpositionFormat::OpenMetrics => OPENMETRICS_CONTENT_TYPE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Counter,
    Gauge,
}

struct Family {
    name: &'static str,
    help: &'static str,
    kind: Kind,
    label_names: &'static [&'static str],
    samples: RwLock<BTreeMap<Vec<String>, AtomicU64>>,
}

impl Family {
    fn new(
        name: &'static str,
        help: &'static str,
        kind: Kind,
        label_names: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            help,
            kind,
            label_names,
            samples: RwLock::new(BTreeMap::new()),
        }
    }

    fn with_sample<R>(&self, labels: &[&str], f: impl Fn(&AtomicU64) -> R) -> R {
        debug_assert_eq!(labels.len(), self.label_names.len());
        let key: Vec<String> = labels.iter().map(|l| (*l).to_string()).collect();
        {
            let samples = self.samples.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(sample) = samples.get(&key) {
                return f(sample);
            }
        }
        let mut samples = self.samples.write().unwrap_or_else(PoisonError::into_inner);
        f(samples.entry(key).or_insert_with(|| AtomicU64::new(0)))
    }

    fn add(&self, labels: &[&str], delta: u64) {
        self.with_sample(labels, |s| s.fetch_add(delta, Ordering::Relaxed));
    }

    fn set(&self, labels: &[&str], value: u64) {
        self.with_sample(labels, |s| s.store(value, Ordering::Relaxed));
    }

    fn get(&self, labels: &[&str]) -> u64 {
        let key: Vec<String> = labels.iter().map(|l| (*l).to_string()).collect();
        let samples = self.samples.read().unwrap_or_else(PoisonError::into_inner);
        samples
            .get(&key)
            .map(|s| s.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn sum(&self) -> u64 {
        let samples = self.samples.read().unwrap_or_else(PoisonError::into_inner);
        samples.values().map(|s| s.load(Ordering::Relaxed)).sum()
    }

    fn render(&self, out: &mut String, format: ExpositionFormat) {
        let type_name = match self.kind {
            Kind::Counter => "counter",
            Kind::Gauge => "gauge",
        };
        let _ = writeln!(out, "# HELP {} {}", self.name, self.help);
        let _ = writeln!(out, "# TYPE {} {}", self.name, type_name);

        let suffix = match (format, self.kind) {
            (ExpositionFormat::OpenMetrics, Kind::Counter) => "_total",
            _ => "",
        };

        let samples = self.samples.read().unwrap_or_else(PoisonError::into_inner);
        for (values, sample) in samples.iter() {
            let labels = self
                .label_names
                .iter()
                .zip(values)
                .map(|(name, value)| format!("{name}=\"{}\"", escape_label(value)))
                .collect::<Vec<_>>()
                .join(",");
            let _ = writeln!(
                out,
                "{}{}{{{}}} {}",
                self.name,
                suffix,
                labels,
                sample.load(Ordering::Relaxed)
            );
        }
    }
}

fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Metrics registry for one harness process.
pub struct Metrics {
    push: Family,
    stream_interruptions: Family,
    generator_active: Family,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            push: Family::new("push", "Number of items pushed", Kind::Counter, &["module"]),
            stream_interruptions: Family::new(
                "stream_interruptions",
                "Number of times a module item stream was dropped",
                Kind::Counter,
                &["module", "reason"],
            ),
            generator_active: Family::new(
                "generator_active",
                "Whether a module currently has a live item stream",
                Kind::Gauge,
                &["module"],
            ),
        }
    }

    /// Count one item obtained from `module`.
    pub fn inc_push(&self, module: &str) {
        self.push.add(&[module], 1);
    }

    pub fn push_count(&self, module: &str) -> u64 {
        self.push.get(&[module])
    }

    pub fn push_total(&self) -> u64 {
        self.push.sum()
    }

    pub fn inc_interruption(&self, module: &str, reason: InterruptReason) {
        self.stream_interruptions.add(&[module, reason.as_str()], 1);
    }

    pub fn interruption_count(&self, module: &str, reason: InterruptReason) -> u64 {
        self.stream_interruptions.get(&[module, reason.as_str()])
    }

    pub fn set_generator_active(&self, module: &str, active: bool) {
        self.generator_active.set(&[module], u64::from(active));
    }

    pub fn generator_active(&self, module: &str) -> bool {
        self.generator_active.get(&[module]) == 1
    }

    /// Render every family in the given text format.
    pub fn render(&self, format: ExpositionFormat) -> String {
        let mut out = String::new();
        for family in [&self.push, &self.stream_interruptions, &self.generator_active] {
            family.render(&mut out, format);
        }
        if format == ExpositionFormat::OpenMetrics {
            out.push_str("# EOF\n");
        }
        out
    }
}
