use core::mem;

use thiserror::Error;

use crate::{Metric, MeasurementRun};

/// A single `pass`/`fail` signal, in the order the benchmark sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assertion {
    Pass(String),
    Fail(String),
}

impl Assertion {
    pub fn is_ok(&self) -> bool {
        matches!(self, Assertion::Pass(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Assertion::Pass(m) | Assertion::Fail(m) => m,
        }
    }
}

/// Ways a benchmark can misuse its [`MeasurementRun`].
///
/// The runner records these as failures of the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ProtocolViolation {
    #[error("`tic` was called while timing was already started or finished")]
    TicAgain,
    #[error("`toc` was called before `tic`")]
    TocWithoutTic,
    #[error("`toc` was called more than once")]
    TocAgain,
    #[error("`{signal}` was called after `end`")]
    SignalAfterEnd { signal: &'static str },
    #[error("`end` was called more than once")]
    EndAgain,
    #[error("benchmark returned without calling `end`")]
    MissingEnd,
    #[error("benchmark ended without a complete `tic`/`toc` pair")]
    MissingTiming,
    #[error("benchmark panicked: {message}")]
    Panicked { message: String },
}

/// Everything the runner recorded for one measurement run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport<U> {
    pub iterations: usize,
    /// Present iff the benchmark called both `tic` and `toc`.
    pub elapsed: Option<U>,
    pub assertions: Vec<Assertion>,
    pub violations: Vec<ProtocolViolation>,
}

impl<U> RunReport<U> {
    pub fn passed(&self) -> bool {
        self.violations.is_empty() && self.assertions.iter().all(Assertion::is_ok)
    }

    /// Failure messages: failed assertions first, then protocol violations.
    pub fn failures(&self) -> impl Iterator<Item = String> + '_ {
        self.assertions
            .iter()
            .filter(|a| !a.is_ok())
            .map(|a| a.message().to_string())
            .chain(self.violations.iter().map(ToString::to_string))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Ready,
    Timing,
    Timed,
}

/// The runner's [`MeasurementRun`]: drives the metric and checks the
/// protocol.
pub(crate) struct Run<'m, M: Metric> {
    metric: &'m mut M,
    iterations: usize,
    phase: Phase,
    start: Option<M::Start>,
    elapsed: Option<M::Unit>,
    ended: bool,
    assertions: Vec<Assertion>,
    violations: Vec<ProtocolViolation>,
}

impl<'m, M: Metric> Run<'m, M> {
    pub(crate) fn new(metric: &'m mut M, iterations: usize) -> Self {
        Run {
            metric,
            iterations,
            phase: Phase::Ready,
            start: None,
            elapsed: None,
            ended: false,
            assertions: Vec::new(),
            violations: Vec::new(),
        }
    }

    pub(crate) fn panicked(&mut self, message: String) {
        self.violations.push(ProtocolViolation::Panicked { message });
        // The panic is the failure; a missing `end` on top of it is noise.
        self.ended = true;
    }

    pub(crate) fn finish(mut self) -> RunReport<M::Unit> {
        if !self.ended {
            self.violations.push(ProtocolViolation::MissingEnd);
        } else if self.phase != Phase::Timed && self.violations.is_empty() {
            self.violations.push(ProtocolViolation::MissingTiming);
        }

        RunReport {
            iterations: self.iterations,
            elapsed: self.elapsed,
            assertions: mem::take(&mut self.assertions),
            violations: mem::take(&mut self.violations),
        }
    }

    fn check_not_ended(&mut self, signal: &'static str) {
        if self.ended {
            self.violations
                .push(ProtocolViolation::SignalAfterEnd { signal });
        }
    }
}

impl<M: Metric> MeasurementRun for Run<'_, M> {
    fn iterations(&self) -> usize {
        self.iterations
    }

    #[inline(always)]
    fn tic(&mut self) {
        self.check_not_ended("tic");
        if self.phase != Phase::Ready {
            self.violations.push(ProtocolViolation::TicAgain);
            return;
        }

        self.phase = Phase::Timing;
        self.start = Some(self.metric.start());
    }

    #[inline(always)]
    fn toc(&mut self) {
        // Stop the clock before doing anything else.
        let measurement = self.start.take().map(|s| self.metric.end(s));

        self.check_not_ended("toc");
        match self.phase {
            Phase::Ready => self.violations.push(ProtocolViolation::TocWithoutTic),
            Phase::Timed => self.violations.push(ProtocolViolation::TocAgain),
            Phase::Timing => {
                self.phase = Phase::Timed;
                self.elapsed = measurement;
            }
        }
    }

    fn fail(&mut self, message: &str) {
        self.check_not_ended("fail");
        // Recorded even after `end` so the failure is never lost.
        self.assertions.push(Assertion::Fail(message.to_string()));
    }

    fn pass(&mut self, message: &str) {
        self.check_not_ended("pass");
        self.assertions.push(Assertion::Pass(message.to_string()));
    }

    fn end(&mut self) {
        if self.ended {
            self.violations.push(ProtocolViolation::EndAgain);
        }
        self.ended = true;
    }
}
