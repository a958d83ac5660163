//! Prometheus text export of the benchmark counters.
//!
//! Counter values are exported as gauges: they drop back to zero on
//! `ResetCounters`, which a Prometheus counter must never do.

use prometheus::{Encoder, Gauge, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};

use crate::buffers::BufferStore;
use crate::counters::CounterSnapshot;

/// Mirrors counter snapshots and buffer shapes into a private registry.
#[derive(Clone)]
pub struct MetricsExporter {
    calls: IntGaugeVec,
    seconds_since_reset: Gauge,
    spectrum_length: IntGauge,
    image_rows: IntGauge,
    image_cols: IntGauge,

    registry: Registry,
}

fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl MetricsExporter {
    /// Create a new exporter
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let calls = IntGaugeVec::new(
            Opts::new(
                "benchtarget_calls",
                "Calls recorded since the last reset, by category",
            ),
            &["category"],
        )?;
        registry.register(Box::new(calls.clone()))?;

        let seconds_since_reset = Gauge::new(
            "benchtarget_seconds_since_reset",
            "Seconds elapsed since the last counter reset",
        )?;
        registry.register(Box::new(seconds_since_reset.clone()))?;

        let spectrum_length = IntGauge::new(
            "benchtarget_spectrum_length",
            "Configured benchmark spectrum length",
        )?;
        registry.register(Box::new(spectrum_length.clone()))?;

        let image_rows = IntGauge::new("benchtarget_image_rows", "Configured benchmark image rows")?;
        registry.register(Box::new(image_rows.clone()))?;

        let image_cols = IntGauge::new(
            "benchtarget_image_cols",
            "Configured benchmark image columns",
        )?;
        registry.register(Box::new(image_cols.clone()))?;

        Ok(Self {
            calls,
            seconds_since_reset,
            spectrum_length,
            image_rows,
            image_cols,
            registry,
        })
    }

    /// Copy a counter snapshot into the gauges
    pub fn record_snapshot(&self, snapshot: &CounterSnapshot) {
        for (category, value) in snapshot.iter() {
            self.calls
                .with_label_values(&[category.name()])
                .set(clamp_i64(value));
        }
        self.seconds_since_reset.set(snapshot.elapsed().as_secs_f64());
    }

    /// Copy the current buffer shapes into the gauges
    pub fn record_buffers(&self, buffers: &BufferStore) {
        let (rows, cols) = buffers.image_size();
        self.spectrum_length.set(clamp_i64(buffers.spectrum_length() as u64));
        self.image_rows.set(clamp_i64(rows as u64));
        self.image_cols.set(clamp_i64(cols as u64));
    }

    /// Gather metrics in Prometheus text format
    pub fn gather_metrics(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buf = vec![];
        encoder.encode(&self.registry.gather(), &mut buf).ok();
        String::from_utf8(buf).unwrap_or_else(|_| String::from("# Error encoding metrics\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counters::{Category, CounterBank};

    #[test]
    fn test_exporter_creation() {
        assert!(MetricsExporter::new().is_ok());
    }

    #[test]
    fn test_record_snapshot() {
        let exporter = MetricsExporter::new().unwrap();
        let bank = CounterBank::new();
        bank.increment(Category::ScalarRead);
        bank.increment(Category::ScalarRead);
        bank.increment(Category::PipeWrite);

        exporter.record_snapshot(&bank.snapshot());
        let text = exporter.gather_metrics();

        assert!(text.contains("benchtarget_calls{category=\"scalar_read\"} 2"));
        assert!(text.contains("benchtarget_calls{category=\"pipe_write\"} 1"));
        assert!(text.contains("benchtarget_calls{category=\"image_read\"} 0"));
        assert!(text.contains("benchtarget_seconds_since_reset"));
    }

    #[test]
    fn test_reset_lowers_gauge() {
        let exporter = MetricsExporter::new().unwrap();
        let bank = CounterBank::new();
        bank.increment(Category::CommandCall);
        exporter.record_snapshot(&bank.snapshot());
        bank.reset_all();
        exporter.record_snapshot(&bank.snapshot());

        let text = exporter.gather_metrics();
        assert!(text.contains("benchtarget_calls{category=\"command_call\"} 0"));
    }

    #[test]
    fn test_record_buffers() {
        let exporter = MetricsExporter::new().unwrap();
        let buffers = BufferStore::new(100, 2, 3).unwrap();
        exporter.record_buffers(&buffers);

        let text = exporter.gather_metrics();
        assert!(text.contains("benchtarget_spectrum_length 100"));
        assert!(text.contains("benchtarget_image_rows 2"));
        assert!(text.contains("benchtarget_image_cols 3"));
    }

    #[test]
    fn test_clamp_i64() {
        assert_eq!(clamp_i64(5), 5);
        assert_eq!(clamp_i64(u64::MAX), i64::MAX);
    }
}
