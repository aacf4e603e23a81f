use std::{
    any::Any,
    cell::Cell,
    num::NonZeroUsize,
    panic::{self, AssertUnwindSafe},
    sync::Once,
    time::{Duration, Instant},
};

use crate::{Benchmark, Error, Metric, Reporter, Result};

mod outcome;
pub use outcome::{Outcome, Summary};

mod run;
use run::Run;
pub use run::{Assertion, ProtocolViolation, RunReport};

pub use std::hint::black_box;

/// How the runner picks the `iterations` count handed to each benchmark run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Iterations {
    /// Every run performs exactly this many iterations.
    Fixed(NonZeroUsize),
    /// Grow the count by factors of ten, starting at 1, until the fastest of
    /// [`Iterations::CALIBRATION_SAMPLES`] runs at that count takes at least
    /// `target` of wall-clock time (or until [`Iterations::MAX_AUTO`] is
    /// reached).
    ///
    /// Every calibration run is a complete measurement run; if one of them
    /// fails, it becomes the case's only reported run.
    Auto { target: Duration },
}

impl Iterations {
    pub const MAX_AUTO: usize = 1_000_000_000;
    pub const CALIBRATION_SAMPLES: usize = 2;
}

impl Default for Iterations {
    fn default() -> Self {
        Iterations::Fixed(NonZeroUsize::MIN)
    }
}

/// Something benchmarks can be registered with, under a unique name.
pub trait Register {
    fn register<B: Benchmark + 'static>(&mut self, name: String, benchmark: B) -> Result<()>;
}

struct Case {
    name: String,
    benchmark: Box<dyn Benchmark>,
}

/// Runs registered benchmarks one after another, in registration order.
///
/// Each case is run `repeats` times; every run gets a fresh
/// [`MeasurementRun`](crate::MeasurementRun) and is executed to completion
/// before the next one starts.
pub struct BenchmarkRunner {
    iterations: Iterations,
    repeats: NonZeroUsize,
    cases: Vec<Case>,
}

impl Default for BenchmarkRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl BenchmarkRunner {
    pub const fn new() -> BenchmarkRunner {
        BenchmarkRunner {
            iterations: Iterations::Fixed(NonZeroUsize::MIN),
            repeats: NonZeroUsize::MIN,
            cases: Vec::new(),
        }
    }

    pub fn set_iterations(mut self, it: Iterations) -> Self {
        self.iterations = it;
        self
    }

    pub fn set_repeats(mut self, repeats: NonZeroUsize) -> Self {
        self.repeats = repeats;
        self
    }

    pub fn add<B: Benchmark + 'static>(mut self, name: impl Into<String>, benchmark: B) -> Result<Self> {
        self.register(name.into(), benchmark)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + Clone {
        self.cases.iter().map(|c| c.name.as_str())
    }

    /// Runs every registered case, feeding results to `reporter`.
    ///
    /// Benchmark failures (including panics and protocol violations) end up
    /// in the returned [`Summary`]; only reporter errors abort the run.
    ///
    /// Panics on the runner's thread are not printed by the panic hook while a
    /// benchmark runs; their message is reported as
    /// [`ProtocolViolation::Panicked`] instead. Panics on threads a benchmark
    /// spawns still go to the previously installed hook.
    pub fn run<M: Metric, R: Reporter<M>>(self, metric: &mut M, reporter: &mut R) -> Result<Summary> {
        reporter.planned_cases(self.names())?;

        let repeats = self.repeats.get();
        let mut summary = Summary::default();

        for Case {
            name,
            mut benchmark,
        } in self.cases
        {
            let mut reports = Vec::with_capacity(repeats);

            let iterations = match self.iterations {
                Iterations::Fixed(n) => Ok(n.get()),
                Iterations::Auto { target } => {
                    calibrate(target, |n| timed(&mut *benchmark, &mut *metric, n))
                }
            };

            match iterations {
                Ok(iterations) => {
                    reporter.starting_case(&name, iterations, repeats)?;
                    for repeat_idx in 0..repeats {
                        let report = execute(&mut *benchmark, metric, iterations);
                        summary.record_run(&report);
                        reporter.case_run(&name, repeat_idx, &report)?;

                        let passed = report.passed();
                        reports.push(report);
                        if !passed {
                            break;
                        }
                    }
                }
                Err(report) => {
                    reporter.starting_case(&name, report.iterations, 1)?;
                    summary.record_run(&report);
                    reporter.case_run(&name, 0, &report)?;
                    reports.push(report);
                }
            }

            let outcome = Outcome::from_reports(&reports);
            summary.record_case(&outcome);
            reporter.ending_case(&name, &outcome)?;
        }

        reporter.ended(&summary)?;
        Ok(summary)
    }
}

impl Register for BenchmarkRunner {
    fn register<B: Benchmark + 'static>(&mut self, name: String, benchmark: B) -> Result<()> {
        if self.names().any(|n| n == name) {
            return Err(Error::DuplicateName { name });
        }

        self.cases.push(Case {
            name,
            benchmark: Box::new(benchmark),
        });
        Ok(())
    }
}

thread_local! {
    static QUIET_PANICS: Cell<bool> = const { Cell::new(false) };
}

/// Wraps the current panic hook so that it stays silent on a thread that is
/// inside [`execute`].
fn install_quiet_hook() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !QUIET_PANICS.with(Cell::get) {
                previous(info);
            }
        }));
    });
}

fn execute<M: Metric>(
    benchmark: &mut dyn Benchmark,
    metric: &mut M,
    iterations: usize,
) -> RunReport<M::Unit> {
    install_quiet_hook();
    let mut run = Run::new(metric, iterations);

    let was_quiet = QUIET_PANICS.with(|q| q.replace(true));
    let res = panic::catch_unwind(AssertUnwindSafe(|| benchmark.run(&mut run)));
    QUIET_PANICS.with(|q| q.set(was_quiet));

    if let Err(payload) = res {
        run.panicked(panic_message(payload.as_ref()));
    }

    run.finish()
}

fn timed<M: Metric>(
    benchmark: &mut dyn Benchmark,
    metric: &mut M,
    iterations: usize,
) -> (RunReport<M::Unit>, Duration) {
    let start = Instant::now();
    let report = execute(benchmark, metric, iterations);
    (report, start.elapsed())
}

/// Picks the iteration count for [`Iterations::Auto`]. `sample` runs the
/// benchmark once with the given count and returns its report and wall-clock
/// time.
fn calibrate<U>(
    target: Duration,
    mut sample: impl FnMut(usize) -> (RunReport<U>, Duration),
) -> core::result::Result<usize, RunReport<U>> {
    let mut iterations = 1;
    loop {
        // Scheduling noise only ever adds time, so the fastest sample counts.
        let mut fastest = Duration::MAX;
        for _ in 0..Iterations::CALIBRATION_SAMPLES {
            let (report, elapsed) = sample(iterations);
            if !report.passed() {
                return Err(report);
            }
            fastest = fastest.min(elapsed);
        }

        if fastest >= target || iterations >= Iterations::MAX_AUTO {
            return Ok(iterations);
        }

        iterations = iterations.saturating_mul(10).min(Iterations::MAX_AUTO);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}
