use core::num::NonZeroUsize;

use crate::{Benchmark, Error, Register, Result};

/// Sweep sizes are `10^DEFAULT_MIN_EXPONENT ..= 10^DEFAULT_MAX_EXPONENT` by
/// default.
pub const DEFAULT_MIN_EXPONENT: u32 = 1;
pub const DEFAULT_MAX_EXPONENT: u32 = 6;

/// A geometric progression of input lengths: `10^min, 10^(min + 1), ..., 10^max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepConfig {
    min_exponent: u32,
    max_exponent: u32,
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            min_exponent: DEFAULT_MIN_EXPONENT,
            max_exponent: DEFAULT_MAX_EXPONENT,
        }
    }
}

impl SweepConfig {
    pub fn new(min_exponent: u32, max_exponent: u32) -> Result<Self> {
        if min_exponent > max_exponent {
            return Err(Error::InvalidRange {
                min: min_exponent,
                max: max_exponent,
            });
        }
        if 10usize.checked_pow(max_exponent).is_none() {
            return Err(Error::ExponentOverflow {
                exponent: max_exponent,
            });
        }

        Ok(SweepConfig {
            min_exponent,
            max_exponent,
        })
    }

    pub fn min_exponent(&self) -> u32 {
        self.min_exponent
    }

    pub fn max_exponent(&self) -> u32 {
        self.max_exponent
    }

    /// The input lengths, ascending.
    pub fn lengths(&self) -> impl Iterator<Item = NonZeroUsize> {
        // `new` rules out overflow, so nothing is ever filtered out here.
        (self.min_exponent..=self.max_exponent)
            .filter_map(|i| 10usize.checked_pow(i).and_then(NonZeroUsize::new))
    }
}

/// `"<package>:len=<len>"`.
pub fn case_name(package: &str, len: NonZeroUsize) -> String {
    format!("{package}:len={len}")
}

/// Registers one benchmark per length of `config` with `registrar`.
///
/// `factory` is called once per length, in ascending order. Registration
/// errors are returned as-is; nothing is run here.
pub fn sweep<R, B, F>(config: &SweepConfig, package: &str, mut factory: F, registrar: &mut R) -> Result<()>
where
    R: Register,
    B: Benchmark + 'static,
    F: FnMut(NonZeroUsize) -> B,
{
    for len in config.lengths() {
        registrar.register(case_name(package, len), factory(len))?;
    }

    Ok(())
}
