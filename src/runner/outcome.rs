use super::RunReport;

/// The verdict for one benchmark case, across all of its runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    Fail(Vec<String>),
}

impl Outcome {
    pub(crate) fn from_reports<'r, U: 'r>(
        reports: impl IntoIterator<Item = &'r RunReport<U>>,
    ) -> Self {
        let reasons: Vec<String> = reports.into_iter().flat_map(|r| r.failures()).collect();

        if reasons.is_empty() {
            Outcome::Pass
        } else {
            Outcome::Fail(reasons)
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass)
    }
}

/// Totals for a whole [`BenchmarkRunner::run`](crate::BenchmarkRunner::run).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Number of cases run.
    pub cases: usize,
    /// Number of cases whose [`Outcome`] was [`Outcome::Pass`].
    pub passed_cases: usize,
    /// Passing assertions, over all runs.
    pub passed_assertions: usize,
    /// Failing assertions and protocol violations, over all runs.
    pub failed_assertions: usize,
}

impl Summary {
    pub(crate) fn record_run<U>(&mut self, report: &RunReport<U>) {
        let passes = report.assertions.iter().filter(|a| a.is_ok()).count();
        self.passed_assertions += passes;
        self.failed_assertions += report.assertions.len() - passes + report.violations.len();
    }

    pub(crate) fn record_case(&mut self, outcome: &Outcome) {
        self.cases += 1;
        if outcome.is_pass() {
            self.passed_cases += 1;
        }
    }

    pub fn failed_cases(&self) -> usize {
        self.cases - self.passed_cases
    }

    pub fn total_assertions(&self) -> usize {
        self.passed_assertions + self.failed_assertions
    }

    pub fn all_passed(&self) -> bool {
        self.failed_cases() == 0
    }

    /// `0` if every case passed, `1` otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.all_passed() {
            0
        } else {
            1
        }
    }
}
