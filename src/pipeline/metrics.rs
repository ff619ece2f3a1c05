//! Pipeline metrics collection and reporting.
//!
//! Tracks wall time and throughput for each stage. The pipeline is a single
//! synchronous pass, so a stage is timed from the moment it starts until it
//! hands its output to the next one.

use std::time::{Duration, Instant};

/// Metrics for a single pipeline stage.
#[derive(Debug, Default, Clone)]
pub struct StageMetrics {
    /// Stage name
    pub name: &'static str,
    /// Total wall clock time
    pub wall_time: Duration,
    /// Items processed (records, rows, clusters)
    pub items_processed: usize,
    /// Secondary metric (e.g. columns for EXTRACT, skipped for LOAD)
    pub secondary_count: usize,
    /// Secondary metric label
    pub secondary_label: &'static str,
}

impl StageMetrics {
    /// Calculate throughput (items per second).
    pub fn throughput(&self) -> f64 {
        let secs = self.wall_time.as_secs_f64();
        if secs > 0.0 {
            self.items_processed as f64 / secs
        } else {
            0.0
        }
    }

    /// Calculate percentage of total pipeline time.
    pub fn percentage_of(&self, total: Duration) -> f64 {
        if total.as_nanos() > 0 {
            (self.wall_time.as_nanos() as f64 / total.as_nanos() as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Running timer for one stage.
#[derive(Debug)]
pub struct StageTimer {
    name: &'static str,
    start: Instant,
}

impl StageTimer {
    pub fn start(name: &'static str) -> Self {
        tracing::debug!(target: "pipeline", "[{name}] started");
        Self {
            name,
            start: Instant::now(),
        }
    }

    /// Stop the timer and record item counts.
    pub fn finish(self, items: usize) -> StageMetrics {
        StageMetrics {
            name: self.name,
            wall_time: self.start.elapsed(),
            items_processed: items,
            ..Default::default()
        }
    }

    /// Stop the timer with a labelled secondary count.
    pub fn finish_with(self, items: usize, secondary: usize, label: &'static str) -> StageMetrics {
        StageMetrics {
            secondary_count: secondary,
            secondary_label: label,
            ..self.finish(items)
        }
    }
}

/// Log a per-stage breakdown at info level.
pub fn log_summary(stages: &[StageMetrics]) {
    let total: Duration = stages.iter().map(|s| s.wall_time).sum();
    tracing::info!(target: "pipeline", "completed in {:.2?}", total);
    for stage in stages {
        let secondary = if stage.secondary_label.is_empty() {
            String::new()
        } else {
            format!(", {} {}", stage.secondary_count, stage.secondary_label)
        };
        tracing::info!(
            target: "pipeline",
            "  {:<10} {:>9.2?} ({:>5.1}%)  {} items{}  {:.0}/s",
            stage.name,
            stage.wall_time,
            stage.percentage_of(total),
            stage.items_processed,
            secondary,
            stage.throughput()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throughput() {
        let metrics = StageMetrics {
            name: "EXTRACT",
            wall_time: Duration::from_secs(2),
            items_processed: 100,
            ..Default::default()
        };
        assert!((metrics.throughput() - 50.0).abs() < 1e-9);
        assert!((metrics.percentage_of(Duration::from_secs(4)) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_duration() {
        let metrics = StageMetrics::default();
        assert_eq!(metrics.throughput(), 0.0);
        assert_eq!(metrics.percentage_of(Duration::ZERO), 0.0);
    }

    #[test]
    fn test_timer_records_secondary() {
        let metrics = StageTimer::start("LOAD").finish_with(10, 2, "skipped");
        assert_eq!(metrics.name, "LOAD");
        assert_eq!(metrics.items_processed, 10);
        assert_eq!(metrics.secondary_count, 2);
        assert_eq!(metrics.secondary_label, "skipped");
    }
}
