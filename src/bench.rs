use std::thread;

/// The handle a runner passes to a [`Benchmark`] for one measurement run.
///
/// Every run goes through the same protocol: `tic`, `iterations()` calls of
/// the operation under test, `toc`, any `fail`/`pass` signals, and finally a
/// single `end`. [`Session`] wraps a handle and guarantees the `end`.
pub trait MeasurementRun {
    /// How many times the operation under test should be executed.
    ///
    /// This is chosen by the runner; benchmarks must not derive their own.
    fn iterations(&self) -> usize;
    /// Starts timing.
    fn tic(&mut self);
    /// Stops timing.
    fn toc(&mut self);
    /// Records a failure.
    fn fail(&mut self, message: &str);
    /// Records a success.
    fn pass(&mut self, message: &str);
    /// Terminates the run. Must be the last signal, and must be sent exactly
    /// once.
    fn end(&mut self);
}

pub trait Benchmark {
    /// This is what is actually measured.
    ///
    /// Called once per measurement run. For stuff you wish to have run once
    /// (i.e. fixture setup), use a constructor function.
    fn run(&mut self, run: &mut dyn MeasurementRun);
}

impl<F: FnMut(&mut dyn MeasurementRun)> Benchmark for F {
    fn run(&mut self, run: &mut dyn MeasurementRun) {
        self(run)
    }
}

/// Scoped wrapper around a [`MeasurementRun`] that signals `end` exactly once.
///
/// Dropping a `Session` that was not explicitly [ended](Session::end) sends
/// the `end` signal; if the drop happens while unwinding from a panic, a
/// `fail` is sent first so the panic is not mistaken for a pass.
pub struct Session<'r> {
    run: &'r mut dyn MeasurementRun,
    failed: bool,
    ended: bool,
}

impl<'r> Session<'r> {
    pub fn new(run: &'r mut dyn MeasurementRun) -> Self {
        Session {
            run,
            failed: false,
            ended: false,
        }
    }

    pub fn iterations(&self) -> usize {
        self.run.iterations()
    }

    #[inline(always)]
    pub fn tic(&mut self) {
        self.run.tic()
    }

    #[inline(always)]
    pub fn toc(&mut self) {
        self.run.toc()
    }

    pub fn fail(&mut self, message: &str) {
        self.failed = true;
        self.run.fail(message)
    }

    pub fn pass(&mut self, message: &str) {
        self.run.pass(message)
    }

    /// Whether `fail` has been signaled through this session.
    pub fn has_failed(&self) -> bool {
        self.failed
    }

    pub fn end(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if !self.ended {
            self.ended = true;
            self.run.end();
        }
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        if !self.ended && thread::panicking() {
            self.run.fail("benchmark panicked before it ended");
        }
        self.finish();
    }
}
