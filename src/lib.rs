#![cfg_attr(docs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod bench;
pub use bench::{Benchmark, MeasurementRun, Session};

mod error;
pub use error::{Error, Result};

mod length;
pub use length::{
    create_benchmark, try_create_benchmark, Fixture, LengthBenchmark, Mean, Operation, Sum,
    DEFAULT_SEED,
};

mod runner;
pub use runner::{
    black_box, Assertion, BenchmarkRunner, Iterations, Outcome, ProtocolViolation, Register,
    RunReport, Summary,
};

mod sweep;
pub use sweep::{case_name, sweep, SweepConfig, DEFAULT_MAX_EXPONENT, DEFAULT_MIN_EXPONENT};

pub mod metrics;
pub use metrics::Metric;

pub mod reporters;
pub use reporters::{FmtWrite, IoWrite, NoOpReporter, Reporter};

#[cfg(test)]
mod testing;
