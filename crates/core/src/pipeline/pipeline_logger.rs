use std::collections::HashMap;
use std::time::Instant;

/// Observer for job-level events raised by the use cases.
///
/// Keeps the use cases free of any particular output mechanism; a caller
/// picks `LogPipelineLogger`, `NullPipelineLogger`, or its own.
pub trait PipelineLogger: Send {
    /// Items (chunks, mentions, prices) handled so far out of `total`.
    fn progress(&mut self, current: usize, total: usize);

    /// Wall time spent in one named stage.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// A point-in-time measurement, e.g. words removed or cache hits.
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// End-of-job report. Default: no-op.
    fn summary(&self) {}
}

pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Collects stage timings and metrics and reports them through `log`.
///
/// Progress lines are emitted every `every` items and on the last one.
pub struct LogPipelineLogger {
    every: usize,
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    started: Instant,
    total_items: usize,
    messages: Vec<String>,
}

impl LogPipelineLogger {
    pub fn new(every: usize) -> Self {
        Self {
            every: every.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            started: Instant::now(),
            total_items: 0,
            messages: Vec::new(),
        }
    }

    /// Formatted report, or `None` when nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!(
            "Job summary ({} items, {:.1}s total):",
            self.total_items,
            elapsed_ms / 1000.0
        )];

        let mut stages: Vec<_> = self.timings.iter().collect();
        stages.sort_by(|a, b| a.0.cmp(b.0));
        for (stage, durations) in stages {
            let total_ms: f64 = durations.iter().sum();
            let calls = durations.len();
            lines.push(format!(
                "  {stage:12}: {calls} run(s)  total {total_ms:8.1}ms  avg {:6.1}ms",
                mean(durations)
            ));
        }

        let mut metrics: Vec<_> = self.metrics.iter().collect();
        metrics.sort_by(|a, b| a.0.cmp(b.0));
        for (name, values) in metrics {
            let last = values.last().copied().unwrap_or_default();
            lines.push(format!("  {name}: last {last:.1}, avg {:.1}", mean(values)));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(Vec::as_slice)
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(Vec::as_slice)
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

impl Default for LogPipelineLogger {
    fn default() -> Self {
        Self::new(10)
    }
}

impl PipelineLogger for LogPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.total_items = total;
        if total > 0 && (current % self.every == 0 || current == total) {
            log::info!("Progress: {current}/{total}");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().push(value);
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_logger_accepts_everything() {
        let mut logger = NullPipelineLogger;
        logger.progress(1, 3);
        logger.timing("merge", 2.0);
        logger.metric("removed", 4.0);
        logger.info("done");
        logger.summary();
    }

    #[test]
    fn test_records_timings_and_metrics() {
        let mut logger = LogPipelineLogger::default();
        logger.timing("dedup", 10.0);
        logger.timing("dedup", 30.0);
        logger.metric("cache_hits", 2.0);

        assert_eq!(logger.timings_for("dedup").unwrap(), &[10.0, 30.0]);
        assert_relative_eq!(mean(logger.timings_for("dedup").unwrap()), 20.0);
        assert_eq!(logger.metrics_for("cache_hits").unwrap(), &[2.0]);
        assert!(logger.timings_for("merge").is_none());
    }

    #[test]
    fn test_summary_lists_stages_and_metrics() {
        let mut logger = LogPipelineLogger::new(5);
        logger.progress(4, 4);
        logger.timing("resolve", 12.0);
        logger.metric("unresolved", 1.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.starts_with("Job summary (4 items"));
        assert!(summary.contains("resolve"));
        assert!(summary.contains("unresolved: last 1.0"));
    }

    #[test]
    fn test_empty_summary_is_none() {
        assert!(LogPipelineLogger::new(1).summary_string().is_none());
    }

    #[test]
    fn test_info_keeps_messages() {
        let mut logger = LogPipelineLogger::default();
        logger.info("merged 3 chunks");
        assert_eq!(logger.messages(), &["merged 3 chunks".to_string()]);
    }
}
