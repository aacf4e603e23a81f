use core::fmt;

use thiserror::Error;

/// Errors raised while configuring or running benchmarks.
///
/// Failures of the benchmarked operation itself are not errors; they are
/// reported through [`MeasurementRun::fail`](crate::MeasurementRun::fail) and
/// show up in the run's [`Outcome`](crate::Outcome).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A benchmark fixture was requested with a length of zero.
    #[error("input length must be a positive integer")]
    ZeroLength,

    /// The sweep's minimum exponent is larger than its maximum exponent.
    #[error("invalid sweep range: minimum exponent {min} is greater than maximum exponent {max}")]
    InvalidRange {
        /// The requested minimum exponent.
        min: u32,
        /// The requested maximum exponent.
        max: u32,
    },

    /// `10^exponent` cannot be represented as a `usize` on this target.
    #[error("input length 10^{exponent} does not fit in a usize")]
    ExponentOverflow {
        /// The offending exponent.
        exponent: u32,
    },

    /// Two benchmarks were registered under the same name.
    #[error("a benchmark named '{name}' is already registered")]
    DuplicateName {
        /// The name that was registered twice.
        name: String,
    },

    /// A [`Reporter`](crate::reporters::Reporter) failed to write its output.
    #[error("failed to write benchmark report")]
    Report(#[from] fmt::Error),
}

/// A specialized `Result` type for this crate, returning [`Error`] as the
/// error value.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Debug);

    #[test]
    fn messages_name_the_offending_values() {
        let err = Error::InvalidRange { min: 4, max: 2 };
        assert_eq!(
            err.to_string(),
            "invalid sweep range: minimum exponent 4 is greater than maximum exponent 2"
        );

        let err = Error::DuplicateName {
            name: "lenbench:len=10".to_string(),
        };
        assert!(err.to_string().contains("'lenbench:len=10'"));
    }

    #[test]
    fn fmt_errors_convert() {
        let err: Error = fmt::Error.into();
        assert!(matches!(err, Error::Report(_)));
    }
}
