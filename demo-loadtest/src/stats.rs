use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    RegisterStart,
    RegisterFinish,
    LoginStart,
    LoginFinish,
    Ping,
    Iteration,
}

impl Step {
    const ALL: [Step; 6] = [
        Step::RegisterStart,
        Step::RegisterFinish,
        Step::LoginStart,
        Step::LoginFinish,
        Step::Ping,
        Step::Iteration,
    ];

    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Step::RegisterStart => "register_start",
            Step::RegisterFinish => "register_finish",
            Step::LoginStart => "login_start",
            Step::LoginFinish => "login_finish",
            Step::Ping => "ping",
            Step::Iteration => "iteration",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

#[derive(Debug, Default)]
struct Counter {
    count: AtomicU64,
    failures: AtomicU64,
    total_micros: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct StepSummary {
    pub(crate) count: u64,
    pub(crate) failures: u64,
    pub(crate) mean_ms: f64,
}

/// Lock-free request counters shared by all virtual users.
#[derive(Debug, Default)]
pub(crate) struct Stats {
    counters: [Counter; 6],
}

impl Stats {
    pub(crate) fn record(&self, step: Step, elapsed: Duration, ok: bool) {
        let counter = &self.counters[step.index()];
        counter.count.fetch_add(1, Ordering::Relaxed);
        counter
            .total_micros
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
        if !ok {
            counter.failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn summary(&self, step: Step) -> StepSummary {
        let counter = &self.counters[step.index()];
        let count = counter.count.load(Ordering::Relaxed);
        let total_micros = counter.total_micros.load(Ordering::Relaxed);
        StepSummary {
            count,
            failures: counter.failures.load(Ordering::Relaxed),
            mean_ms: if count == 0 {
                0.0
            } else {
                total_micros as f64 / count as f64 / 1000.0
            },
        }
    }

    pub(crate) fn report(&self, elapsed: Duration) {
        tracing::info!("Finished after {:.1}s", elapsed.as_secs_f64());
        for step in Step::ALL {
            let summary = self.summary(step);
            if summary.count == 0 {
                continue;
            }
            tracing::info!(
                "{:<16} {:>8} requests {:>6} failed   mean {:>8.2} ms   {:>8.1}/s",
                step.as_str(),
                summary.count,
                summary.failures,
                summary.mean_ms,
                summary.count as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
            );
        }
    }
}
