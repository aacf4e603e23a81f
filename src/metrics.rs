//! What `tic`/`toc` actually measure.

use core::{
    fmt::{self, Debug},
    marker::PhantomData,
    ops::{Add, Div, Sub},
};

pub trait Metric {
    type Unit: Copy
        + Ord
        + Add<Output = Self::Unit>
        + Sub<Output = Self::Unit>
        + Div<Self::Divisor, Output = Self::Unit>
        + Debug;
    type Divisor: TryFrom<usize> /* = Self::Unit */;
    type Start;

    const UNIT_NAME: &'static str = "unknown";

    fn start(&mut self) -> Self::Start;
    fn end(&mut self, start: Self::Start) -> Self::Unit;
    fn print(u: &Self::Unit, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Debug::fmt(u, f)
    }

    /// The measurement as a plain number, in units of [`UNIT_NAME`].
    ///
    /// Used by machine-readable reporters (and to compute rates).
    ///
    /// [`UNIT_NAME`]: Metric::UNIT_NAME
    fn scalar(u: &Self::Unit) -> f64;
}

/// Displays a [`Metric::Unit`] using [`Metric::print`].
pub struct MetricFmtAdapter<'u, M: Metric>(pub &'u M::Unit, PhantomData<M>);

impl<'u, M: Metric> MetricFmtAdapter<'u, M> {
    pub fn new(u: &'u M::Unit) -> Self {
        MetricFmtAdapter(u, PhantomData)
    }
}

impl<M: Metric> fmt::Display for MetricFmtAdapter<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        M::print(self.0, f)
    }
}

/// A placeholder metric that just returns 1.
///
/// Using this with [`BenchmarkRunner`](crate::BenchmarkRunner) should
/// yield `1` as the "result" for every run; handy for tests that care about
/// the protocol and not about timings.
#[derive(Debug, Default)]
pub struct NoOpMetric;

impl Metric for NoOpMetric {
    type Unit = u32;
    type Start = ();
    type Divisor = u32;

    fn start(&mut self) {}
    fn end(&mut self, (): ()) -> u32 {
        1
    }

    fn scalar(u: &u32) -> f64 {
        f64::from(*u)
    }
}

/// Wall-clock time, via [`std::time::Instant`].
#[derive(Debug, Default)]
pub struct StdSysTime;

use std::time::{Duration, Instant};

impl Metric for StdSysTime {
    type Start = Instant;
    type Unit = Duration;
    type Divisor = u32;

    const UNIT_NAME: &'static str = "time";

    fn start(&mut self) -> Instant {
        Instant::now()
    }

    fn end(&mut self, s: Instant) -> Duration {
        s.elapsed()
    }

    /// Seconds.
    fn scalar(u: &Duration) -> f64 {
        u.as_secs_f64()
    }
}
