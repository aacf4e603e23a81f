use core::fmt::{self, Write};

use serde::Serialize;

use super::io::{Output, OutputAdapter};
use super::Reporter;
use crate::{Metric, RunReport};

/// One JSON object per run, one run per line.
///
/// ```text
/// {"name":"lenbench:len=10","repeat":0,"iterations":5,"unit":"time","elapsed":1.2e-6,"ok":true,"assertions":[{"ok":true,"message":"benchmark finished"}],"violations":[]}
/// ```
pub struct JsonReporter<Out: Output> {
    out: OutputAdapter<Out>,
}

#[derive(Serialize)]
struct JsonRun<'a> {
    name: &'a str,
    repeat: usize,
    iterations: usize,
    unit: &'static str,
    elapsed: Option<f64>,
    ok: bool,
    assertions: Vec<JsonAssertion<'a>>,
    violations: Vec<String>,
}

#[derive(Serialize)]
struct JsonAssertion<'a> {
    ok: bool,
    message: &'a str,
}

impl<Out: Output> JsonReporter<Out> {
    pub fn new(out: Out) -> Self {
        JsonReporter {
            out: OutputAdapter(out),
        }
    }

    pub fn into_inner(self) -> Out {
        self.out.0
    }
}

impl<Out: Output, M: Metric> Reporter<M> for JsonReporter<Out> {
    fn case_run(&mut self, name: &str, repeat_idx: usize, report: &RunReport<M::Unit>) -> fmt::Result {
        let run = JsonRun {
            name,
            repeat: repeat_idx,
            iterations: report.iterations,
            unit: M::UNIT_NAME,
            elapsed: report.elapsed.as_ref().map(M::scalar),
            ok: report.passed(),
            assertions: report
                .assertions
                .iter()
                .map(|a| JsonAssertion {
                    ok: a.is_ok(),
                    message: a.message(),
                })
                .collect(),
            violations: report.violations.iter().map(ToString::to_string).collect(),
        };

        let line = serde_json::to_string(&run).map_err(|_| fmt::Error)?;
        writeln!(self.out, "{line}")
    }

    fn ended(&mut self, _summary: &crate::Summary) -> fmt::Result {
        self.out.0.flush()
    }
}
