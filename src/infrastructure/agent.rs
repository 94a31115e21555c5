//! Trigger and scheduler for iterations
//!
//! Runs one iteration at start, optionally one per fixed period on a
//! background thread, and a last one at shutdown. All iterations go through a
//! single mutex, so they never overlap.

use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use crate::application::{
    parse_options, ApplicationResult, HierarchyService, IterationSummary, Options,
};
use crate::infrastructure::error::{InfraError, InfraResult};

const TIMER_THREAD_NAME: &str = "loadertree-timer";

/// Running agent. Dropping it without `shutdown` skips the final iteration.
pub struct Agent {
    service: Arc<Mutex<HierarchyService>>,
    options: Options,
    timer: Option<thread::JoinHandle<()>>,
    eager: Option<IterationSummary>,
}

impl Agent {
    /// Eager iteration, then arms the periodic timer if `every_n_seconds > 0`.
    ///
    /// A failed eager iteration is logged and leaves a gap; the agent still
    /// starts.
    #[instrument(level = "debug", skip(service))]
    pub fn start(options: Options, service: HierarchyService) -> InfraResult<Self> {
        let period = (options.every_n_seconds > 0)
            .then(|| Duration::from_secs(options.every_n_seconds));
        Self::start_with_period(options.max_packages, period, service)
    }

    /// Parses the option string, reports rejected tokens to `err`, then starts.
    ///
    /// Bad options never prevent the start; defaults fill in.
    pub fn start_from_args(
        args: Option<&str>,
        service: HierarchyService,
        err: &mut dyn Write,
    ) -> InfraResult<Self> {
        let report = parse_options(args);
        report
            .write_errors(err)
            .map_err(|e| InfraError::io("report option errors", e))?;
        Self::start(report.options, service)
    }

    /// Like `start`, with an explicit period instead of whole seconds.
    pub fn start_with_period(
        max_packages: usize,
        period: Option<Duration>,
        service: HierarchyService,
    ) -> InfraResult<Self> {
        let service = Arc::new(Mutex::new(service));
        let eager = match run_locked(&service, max_packages) {
            Ok(summary) => {
                debug!("eager iteration done: {:?}", summary);
                Some(summary)
            }
            Err(e) => {
                warn!("eager iteration failed: {}", e);
                None
            }
        };

        let timer = match period {
            Some(period) if deadline(Instant::now(), period, 1).is_none() => {
                warn!("period {:?} cannot be scheduled, periodic runs disabled", period);
                None
            }
            Some(period) => Some(spawn_timer(service.clone(), max_packages, period)?),
            None => None,
        };

        let every_n_seconds = period.map(|p| p.as_secs()).unwrap_or(0);
        Ok(Self {
            service,
            options: Options {
                max_packages,
                every_n_seconds,
            },
            timer,
            eager,
        })
    }

    pub fn options(&self) -> Options {
        self.options
    }

    /// Summary of the start-time iteration, None if it failed.
    pub fn eager_summary(&self) -> Option<IterationSummary> {
        self.eager
    }

    pub fn is_periodic(&self) -> bool {
        self.timer.is_some()
    }

    /// Runs an extra iteration now, serialized with the scheduled ones.
    pub fn trigger(&self) -> ApplicationResult<IterationSummary> {
        run_locked(&self.service, self.options.max_packages)
    }

    /// Shutdown-time iteration. The timer thread, if any, keeps running until
    /// process exit.
    #[instrument(level = "debug", skip(self))]
    pub fn shutdown(self) -> ApplicationResult<IterationSummary> {
        info!("running shutdown iteration");
        run_locked(&self.service, self.options.max_packages)
    }
}

fn lock(service: &Mutex<HierarchyService>) -> MutexGuard<'_, HierarchyService> {
    // a poisoned lock still guards a usable, possibly partially folded tree
    service.lock().unwrap_or_else(|p| p.into_inner())
}

fn run_locked(
    service: &Mutex<HierarchyService>,
    max_packages: usize,
) -> ApplicationResult<IterationSummary> {
    lock(service).run_iteration(max_packages)
}

/// Fixed-rate timer: the first run is one period after start, later runs are
/// aligned to the start instant rather than to the previous run's end.
fn spawn_timer(
    service: Arc<Mutex<HierarchyService>>,
    max_packages: usize,
    period: Duration,
) -> InfraResult<thread::JoinHandle<()>> {
    debug!("arming timer every {:?}", period);
    thread::Builder::new()
        .name(TIMER_THREAD_NAME.to_string())
        .spawn(move || {
            let start = Instant::now();
            let mut runs: u32 = 0;
            loop {
                runs = runs.saturating_add(1);
                let Some(due) = deadline(start, period, runs) else {
                    warn!("run {} of period {:?} is past the clock range, timer stops", runs, period);
                    return;
                };
                let now = Instant::now();
                if due > now {
                    thread::sleep(due - now);
                }
                if let Err(e) = run_locked(&service, max_packages) {
                    warn!("scheduled iteration failed: {}", e);
                }
            }
        })
        .map_err(|e| InfraError::io("spawn timer thread", e))
}

/// Instant of the `runs`-th scheduled iteration, None when it overflows.
fn deadline(start: Instant, period: Duration, runs: u32) -> Option<Instant> {
    start.checked_add(period.checked_mul(runs)?)
}
