use core::fmt::{self, Write};

use super::io::{Output, OutputAdapter};
use super::Reporter;
use crate::{Assertion, Metric, Outcome, RunReport, Summary};

/// [TAP version 13](https://testanything.org/tap-version-13-specification.html)
/// output.
///
/// Every case gets a `# <name>` comment; every run a YAML block with its
/// `iterations`, `elapsed` ([`Metric::scalar`]) and `rate`
/// (iterations per unit), followed by one numbered test line per assertion:
///
/// ```text
/// TAP version 13
/// # lenbench:len=10
///   ---
///   iterations: 1000
///   elapsed: 0.0000123
///   rate: 81300813.00813009
///   ...
/// ok 1 benchmark finished
///
/// 1..1
/// # total 1
/// # pass  1
///
/// # ok
/// ```
pub struct TapReporter<Out: Output> {
    out: OutputAdapter<Out>,
    next_test: usize,
}

impl<Out: Output> TapReporter<Out> {
    pub fn new(out: Out) -> Self {
        TapReporter {
            out: OutputAdapter(out),
            next_test: 1,
        }
    }

    pub fn into_inner(self) -> Out {
        self.out.0
    }

    fn test_line(&mut self, ok: bool, description: &str) -> fmt::Result {
        let n = self.next_test;
        self.next_test += 1;

        let status = if ok { "ok" } else { "not ok" };
        // Keep descriptions on one line; TAP is line oriented.
        writeln!(self.out, "{status} {n} {}", description.replace('\n', " "))
    }
}

impl<Out: Output, M: Metric> Reporter<M> for TapReporter<Out> {
    fn planned_cases<'n, I: Iterator<Item = &'n str> + Clone>(&mut self, _names: I) -> fmt::Result {
        writeln!(self.out, "TAP version 13")
    }

    fn starting_case(&mut self, name: &str, _iterations: usize, _repeats: usize) -> fmt::Result {
        writeln!(self.out, "# {name}")
    }

    fn case_run(&mut self, _name: &str, _repeat_idx: usize, report: &RunReport<M::Unit>) -> fmt::Result {
        if let Some(ref elapsed) = report.elapsed {
            let elapsed = M::scalar(elapsed);
            writeln!(self.out, "  ---")?;
            writeln!(self.out, "  iterations: {}", report.iterations)?;
            writeln!(self.out, "  elapsed: {elapsed}")?;
            if elapsed > 0.0 {
                writeln!(self.out, "  rate: {}", report.iterations as f64 / elapsed)?;
            }
            writeln!(self.out, "  ...")?;
        }

        for assertion in &report.assertions {
            match assertion {
                Assertion::Pass(m) => self.test_line(true, m)?,
                Assertion::Fail(m) => self.test_line(false, m)?,
            }
        }
        for violation in &report.violations {
            self.test_line(false, &violation.to_string())?;
        }

        Ok(())
    }

    fn ending_case(&mut self, _name: &str, _outcome: &Outcome) -> fmt::Result {
        Ok(())
    }

    fn ended(&mut self, summary: &Summary) -> fmt::Result {
        let total = summary.total_assertions();
        writeln!(self.out)?;
        writeln!(self.out, "1..{total}")?;
        writeln!(self.out, "# total {total}")?;
        writeln!(self.out, "# pass  {}", summary.passed_assertions)?;
        if summary.failed_assertions > 0 {
            writeln!(self.out, "# fail  {}", summary.failed_assertions)?;
        }
        writeln!(self.out)?;
        if summary.all_passed() {
            writeln!(self.out, "# ok")?;
        } else {
            writeln!(self.out, "# not ok")?;
        }
        self.out.0.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{metrics::NoOpMetric, FmtWrite, ProtocolViolation};

    #[test]
    fn formats_runs_and_trailer() {
        let mut s = String::new();
        let mut r = TapReporter::new(FmtWrite(&mut s));

        let ok = RunReport {
            iterations: 5,
            elapsed: Some(1),
            assertions: vec![Assertion::Pass("benchmark finished".into())],
            violations: vec![],
        };
        let bad = RunReport {
            iterations: 5,
            elapsed: None,
            assertions: vec![Assertion::Fail("result was NaN".into())],
            violations: vec![ProtocolViolation::MissingEnd],
        };

        Reporter::<NoOpMetric>::planned_cases(&mut r, ["a", "b"].into_iter()).unwrap();
        Reporter::<NoOpMetric>::starting_case(&mut r, "pkg:len=10", 5, 1).unwrap();
        Reporter::<NoOpMetric>::case_run(&mut r, "pkg:len=10", 0, &ok).unwrap();
        Reporter::<NoOpMetric>::ending_case(&mut r, "pkg:len=10", &Outcome::Pass).unwrap();
        Reporter::<NoOpMetric>::starting_case(&mut r, "pkg:len=100", 5, 1).unwrap();
        Reporter::<NoOpMetric>::case_run(&mut r, "pkg:len=100", 0, &bad).unwrap();
        Reporter::<NoOpMetric>::ended(
            &mut r,
            &Summary {
                cases: 2,
                passed_cases: 1,
                passed_assertions: 1,
                failed_assertions: 2,
            },
        )
        .unwrap();
        drop(r);

        assert_eq!(
            s,
            "TAP version 13\n\
             # pkg:len=10\n\
             \x20 ---\n\
             \x20 iterations: 5\n\
             \x20 elapsed: 1\n\
             \x20 rate: 5\n\
             \x20 ...\n\
             ok 1 benchmark finished\n\
             # pkg:len=100\n\
             not ok 2 result was NaN\n\
             not ok 3 benchmark returned without calling `end`\n\
             \n\
             1..3\n\
             # total 3\n\
             # pass  1\n\
             # fail  2\n\
             \n\
             # not ok\n"
        );
    }
}
