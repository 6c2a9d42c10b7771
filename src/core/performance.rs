use std::time::{Duration, Instant};

/// Records named wall-clock measurements across one pipeline run.
pub struct PipelineTimer {
    start_time: Instant,
    measurements: Vec<StageMeasurement>,
    pending: Vec<(String, Instant)>,
}

pub struct StageMeasurement {
    pub name: String,
    pub duration: Duration,
}

impl PipelineTimer {
    pub fn new() -> Self {
        PipelineTimer {
            start_time: Instant::now(),
            measurements: Vec::new(),
            pending: Vec::new(),
        }
    }

    pub fn start(&mut self, name: &str) {
        self.pending.push((name.to_string(), Instant::now()));
    }

    pub fn end(&mut self, name: &str) -> Duration {
        let duration = if let Some(pos) = self
            .pending
            .iter()
            .rposition(|(pending_name, _)| pending_name == name)
        {
            let (_, started) = self.pending.remove(pos);
            started.elapsed()
        } else {
            Duration::ZERO
        };

        self.measurements.push(StageMeasurement {
            name: name.to_string(),
            duration,
        });
        duration
    }

    pub fn total(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn measurements(&self) -> &[StageMeasurement] {
        &self.measurements
    }
}

impl Default for PipelineTimer {
    fn default() -> Self {
        Self::new()
    }
}
