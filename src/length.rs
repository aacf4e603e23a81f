//! Benchmarks parameterized by input length.
//!
//! [`create_benchmark`] builds the fixture once, up front, and hands back a
//! [`LengthBenchmark`] that runs the operation under test against it for as
//! many iterations as the runner asks for. Only the loop is timed.

use core::fmt::Debug;
use core::num::NonZeroUsize;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{black_box, Benchmark, Error, MeasurementRun, Result, Session};

/// Seed used by [`create_benchmark`]; fixtures are reproducible across runs.
pub const DEFAULT_SEED: u64 = 0x6c65_6e62_656e_6368;

pub(crate) const LOW: f64 = -10.0;
pub(crate) const HIGH: f64 = 10.0;

/// Input data for a benchmark: `len` values, fixed at creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Fixture(Vec<f64>);

impl Fixture {
    /// `len` values drawn uniformly from `[-10, 10)`.
    pub fn uniform(len: NonZeroUsize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Fixture(
            (0..len.get())
                .map(|_| rng.random_range(LOW..HIGH))
                .collect(),
        )
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// The operation under test.
#[cfg_attr(test, mockall::automock(type Output = f64;))]
pub trait Operation {
    type Output: Debug;

    fn name(&self) -> &'static str;

    /// This is what is actually measured.
    fn apply(&mut self, x: &[f64]) -> Self::Output;

    /// Checks the result of a single call. Runs inside the timed loop, so
    /// keep it cheap.
    fn check(&self, out: &Self::Output) -> core::result::Result<(), String>;

    /// Checks the result of the last call, after timing has stopped.
    #[allow(unused_variables)]
    fn check_last(&self, x: &[f64], out: &Self::Output) -> core::result::Result<(), String> {
        Ok(())
    }
}

fn not_nan(out: f64) -> core::result::Result<(), String> {
    if out.is_nan() {
        Err("should not return NaN".to_string())
    } else {
        Ok(())
    }
}

/// Sum of all elements.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sum;

impl Operation for Sum {
    type Output = f64;

    fn name(&self) -> &'static str {
        "sum"
    }

    fn apply(&mut self, x: &[f64]) -> f64 {
        x.iter().sum()
    }

    fn check(&self, out: &f64) -> core::result::Result<(), String> {
        not_nan(*out)
    }
}

/// Arithmetic mean of all elements.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mean;

impl Operation for Mean {
    type Output = f64;

    fn name(&self) -> &'static str {
        "mean"
    }

    fn apply(&mut self, x: &[f64]) -> f64 {
        x.iter().sum::<f64>() / x.len() as f64
    }

    fn check(&self, out: &f64) -> core::result::Result<(), String> {
        not_nan(*out)
    }

    fn check_last(&self, x: &[f64], out: &f64) -> core::result::Result<(), String> {
        let (min, max) = x
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

        // Summation error can push a mean of identical values just outside.
        let slack = (max - min).abs().max(1.0) * 1e-9;
        if *out < min - slack || *out > max + slack {
            Err(format!("mean {out} is outside of the input range [{min}, {max}]"))
        } else {
            Ok(())
        }
    }
}

/// A benchmark case: an operation paired with the fixture it runs against.
#[derive(Debug)]
pub struct LengthBenchmark<Op: Operation> {
    len: NonZeroUsize,
    fixture: Fixture,
    op: Op,
}

/// Creates a benchmark for inputs of length `len`.
///
/// The fixture is allocated and populated here, once; every run of the
/// returned benchmark reuses it.
pub fn create_benchmark<Op: Operation>(len: NonZeroUsize, op: Op) -> LengthBenchmark<Op> {
    LengthBenchmark::with_fixture(len, Fixture::uniform(len, DEFAULT_SEED), op)
}

/// Like [`create_benchmark`] but for an unchecked length; zero is rejected.
pub fn try_create_benchmark<Op: Operation>(len: usize, op: Op) -> Result<LengthBenchmark<Op>> {
    let len = NonZeroUsize::new(len).ok_or(Error::ZeroLength)?;
    Ok(create_benchmark(len, op))
}

impl<Op: Operation> LengthBenchmark<Op> {
    pub fn with_fixture(len: NonZeroUsize, fixture: Fixture, op: Op) -> Self {
        LengthBenchmark { len, fixture, op }
    }

    pub fn len(&self) -> NonZeroUsize {
        self.len
    }

    pub fn fixture(&self) -> &Fixture {
        &self.fixture
    }

    pub fn operation(&self) -> &Op {
        &self.op
    }
}

impl<Op: Operation> Benchmark for LengthBenchmark<Op> {
    fn run(&mut self, run: &mut dyn MeasurementRun) {
        let mut b = Session::new(run);
        let x = self.fixture.as_slice();

        if x.len() != self.len.get() {
            b.fail(&format!(
                "{}: fixture has {} elements, expected {}",
                self.op.name(),
                x.len(),
                self.len
            ));
            return;
        }

        let iterations = b.iterations();
        let mut last = None;

        b.tic();
        for i in 0..iterations {
            let out = black_box(self.op.apply(black_box(x)));
            if let Err(problem) = self.op.check(&out) {
                b.fail(&format!("{}: iteration {}: {problem}", self.op.name(), i + 1));
                break;
            }
            last = Some(out);
        }
        b.toc();

        if !b.has_failed() {
            if let Some(ref out) = last {
                if let Err(problem) = self.op.check_last(x, out) {
                    b.fail(&format!("{}: {problem}", self.op.name()));
                }
            }
        }

        if !b.has_failed() {
            b.pass("benchmark finished");
        }
        b.end();
    }
}

#[cfg(test)]
mod tests {
    use std::{
        fmt,
        panic::{self, AssertUnwindSafe},
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
    };

    use mockall::predicate::always;

    use super::*;
    use crate::{
        metrics::NoOpMetric,
        testing::{Recorder, Signal},
        BenchmarkRunner, Iterations, Metric, Outcome, Reporter,
    };

    fn nz(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    /// A mock that returns `1.0` and checks for NaN like the real operations.
    fn counting_op(len: usize, calls: Arc<AtomicUsize>) -> MockOperation {
        let mut op = MockOperation::new();
        op.expect_name().return_const("mock");
        op.expect_apply().returning(move |x| {
            assert_eq!(x.len(), len);
            calls.fetch_add(1, Ordering::Relaxed);
            1.0
        });
        op.expect_check().returning(|out| not_nan(*out));
        op.expect_check_last().returning(|_, _| Ok(()));
        op
    }

    #[test]
    fn fixture_has_requested_len_and_range() {
        for len in [1, 10, 1000] {
            let f = Fixture::uniform(nz(len), DEFAULT_SEED);
            assert_eq!(f.len(), len);
            assert!(f.as_slice().iter().all(|v| (LOW..HIGH).contains(v)));
        }
    }

    #[test]
    fn fixture_is_reproducible() {
        assert_eq!(
            Fixture::uniform(nz(64), 7),
            Fixture::uniform(nz(64), 7)
        );
        assert_ne!(
            Fixture::uniform(nz(64), 7),
            Fixture::uniform(nz(64), 8)
        );
    }

    #[test]
    fn zero_length_is_rejected() {
        assert!(matches!(
            try_create_benchmark(0, Sum),
            Err(Error::ZeroLength)
        ));
        assert_eq!(try_create_benchmark(3, Sum).unwrap().len(), nz(3));
    }

    #[test]
    fn correct_operation_follows_the_protocol() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut bench = create_benchmark(nz(10), counting_op(10, calls.clone()));
        let mut rec = Recorder::new(5);

        bench.run(&mut rec);

        assert_eq!(calls.load(Ordering::Relaxed), 5);
        assert_eq!(
            rec.signals,
            [
                Signal::Tic,
                Signal::Toc,
                Signal::Pass("benchmark finished".into()),
                Signal::End,
            ]
        );
    }

    #[test]
    fn operation_runs_exactly_iterations_times() {
        for (len, k) in [(1, 1), (1, 9), (10, 3), (100, 17)] {
            let calls = Arc::new(AtomicUsize::new(0));
            let mut bench = create_benchmark(nz(len), counting_op(len, calls.clone()));
            let mut rec = Recorder::new(k);

            bench.run(&mut rec);

            assert_eq!(calls.load(Ordering::Relaxed), k, "len = {len}");
            assert_eq!(rec.count(&Signal::Tic), 1);
            assert_eq!(rec.count(&Signal::Toc), 1);
            assert_eq!(rec.count(&Signal::End), 1);
            assert!(rec.position(&Signal::Tic) < rec.position(&Signal::Toc));
        }
    }

    #[test]
    fn smallest_len_is_not_special_cased() {
        let mut bench = create_benchmark(nz(1), Sum);
        let mut rec = Recorder::new(2);

        bench.run(&mut rec);

        assert_eq!(bench.fixture().len(), 1);
        assert_eq!(
            rec.signals,
            [
                Signal::Tic,
                Signal::Toc,
                Signal::Pass("benchmark finished".into()),
                Signal::End,
            ]
        );
    }

    #[test]
    fn invalid_result_fails_before_end() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = calls.clone();

        let mut op = MockOperation::new();
        op.expect_name().return_const("mock");
        op.expect_apply().returning(move |_| {
            let n = counted.fetch_add(1, Ordering::Relaxed) + 1;
            if n == 3 {
                f64::NAN
            } else {
                1.0
            }
        });
        op.expect_check().returning(|out| not_nan(*out));
        op.expect_check_last().never();

        let mut bench = create_benchmark(nz(10), op);
        let mut rec = Recorder::new(5);
        bench.run(&mut rec);

        // Fail fast: nothing after the bad call.
        assert_eq!(calls.load(Ordering::Relaxed), 3);
        assert_eq!(rec.fails(), 1);
        assert_eq!(rec.count(&Signal::End), 1);
        assert_eq!(rec.signals.last(), Some(&Signal::End));
        assert!(!rec.signals.iter().any(|s| matches!(s, Signal::Pass(_))));
        assert_eq!(
            rec.signals[1],
            Signal::Fail("mock: iteration 3: should not return NaN".into())
        );
        // `toc` still closes the timed region after the failure.
        assert_eq!(rec.signals[2], Signal::Toc);
    }

    #[test]
    fn aggregate_check_runs_after_toc() {
        let mut op = MockOperation::new();
        op.expect_name().return_const("mock");
        op.expect_apply().times(4).returning(|_| 2.0);
        op.expect_check().times(4).returning(|_| Ok(()));
        op.expect_check_last()
            .with(always(), always())
            .times(1)
            .returning(|_, _| Err("out of range".into()));

        let mut bench = create_benchmark(nz(10), op);
        let mut rec = Recorder::new(4);
        bench.run(&mut rec);

        assert_eq!(
            rec.signals,
            [
                Signal::Tic,
                Signal::Toc,
                Signal::Fail("mock: out of range".into()),
                Signal::End,
            ]
        );
    }

    #[test]
    fn mismatched_fixture_fails_without_timing() {
        let mut bench = LengthBenchmark::with_fixture(nz(10), Fixture::uniform(nz(3), 1), Sum);
        let mut rec = Recorder::new(4);
        bench.run(&mut rec);

        assert_eq!(
            rec.signals,
            [
                Signal::Fail("sum: fixture has 3 elements, expected 10".into()),
                Signal::End,
            ]
        );
    }

    /// Sums its input, but panics on call number `.0`.
    struct PanicsOn(usize, usize);

    impl Operation for PanicsOn {
        type Output = f64;

        fn name(&self) -> &'static str {
            "panics-on"
        }

        fn apply(&mut self, x: &[f64]) -> f64 {
            self.1 += 1;
            if self.1 == self.0 {
                panic!("call {} went wrong", self.1);
            }
            x.iter().sum()
        }

        fn check(&self, out: &f64) -> core::result::Result<(), String> {
            not_nan(*out)
        }
    }

    #[test]
    fn panicking_operation_still_fails_and_ends() {
        let mut bench = create_benchmark(nz(10), PanicsOn(2, 0));
        let mut rec = Recorder::new(5);

        let res = panic::catch_unwind(AssertUnwindSafe(|| bench.run(&mut rec)));

        assert!(res.is_err());
        assert_eq!(bench.operation().1, 2);
        assert_eq!(rec.signals.len(), 3, "{:?}", rec.signals);
        assert_eq!(rec.signals[0], Signal::Tic);
        assert!(matches!(rec.signals[1], Signal::Fail(_)));
        assert_eq!(rec.signals[2], Signal::End);
        assert_eq!(rec.count(&Signal::Toc), 0);
    }

    #[derive(Default)]
    struct Outcomes(Vec<(String, Outcome)>);

    impl<M: Metric> Reporter<M> for Outcomes {
        fn ending_case(&mut self, name: &str, outcome: &Outcome) -> fmt::Result {
            self.0.push((name.to_string(), outcome.clone()));
            Ok(())
        }
    }

    #[test]
    fn panicking_operation_fails_its_case() {
        let runner = BenchmarkRunner::new()
            .set_iterations(Iterations::Fixed(nz(3)))
            .add("panics", create_benchmark(nz(10), PanicsOn(2, 0)))
            .unwrap()
            .add("sums", create_benchmark(nz(10), Sum))
            .unwrap();

        let mut outcomes = Outcomes::default();
        let summary = runner.run(&mut NoOpMetric, &mut outcomes).unwrap();

        assert_eq!(summary.cases, 2);
        assert_eq!(summary.passed_cases, 1);
        assert_eq!(summary.exit_code(), 1);

        let (name, outcome) = &outcomes.0[0];
        assert_eq!(name, "panics");
        match outcome {
            Outcome::Fail(reasons) => {
                assert!(reasons.iter().any(|r| r == "benchmark panicked: call 2 went wrong"), "{reasons:?}");
            }
            Outcome::Pass => panic!("case should have failed"),
        }
        assert_eq!(outcomes.0[1], ("sums".to_string(), Outcome::Pass));
    }

    #[test]
    fn same_len_gives_independent_fixtures() {
        let a = create_benchmark(nz(100), Sum);
        let mut b = create_benchmark(nz(100), Sum);
        assert_eq!(a.fixture(), b.fixture());
        assert_ne!(a.fixture().as_slice().as_ptr(), b.fixture().as_slice().as_ptr());

        let before = a.fixture().clone();
        let mut rec = Recorder::new(10);
        b.run(&mut rec);
        assert_eq!(a.fixture(), &before);
        assert_eq!(b.fixture(), &before);
    }

    #[test]
    fn real_operations_produce_valid_results() {
        let f = Fixture::uniform(nz(1000), DEFAULT_SEED);
        let x = f.as_slice();

        let s = Sum.apply(x);
        assert!(Sum.check(&s).is_ok());

        let m = Mean.apply(x);
        assert!(Mean.check(&m).is_ok());
        assert!(Mean.check_last(x, &m).is_ok());
        assert!((m - s / 1000.0).abs() < 1e-12);

        assert!(Sum.check(&f64::NAN).is_err());
        assert!(Mean.check_last(x, &100.0).is_err());
    }
}
