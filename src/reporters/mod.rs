//! Where results go.
//!
//! The runner never prints anything itself; it calls into a [`Reporter`]
//! which renders (or ignores) what happened.

use core::fmt;

use crate::{Metric, Outcome, RunReport, Summary};

#[allow(unused_variables)]
pub trait Reporter<M: Metric> {
    // Cases go in this order:
    // case 1:
    //   + run 1 (`iterations` iterations)
    //   + run 2
    //     ...
    // case 2:
    //   ...
    //
    fn planned_cases<'n, I: Iterator<Item = &'n str> + Clone>(&mut self, names: I) -> fmt::Result {
        Ok(())
    }
    fn starting_case(&mut self, name: &str, iterations: usize, repeats: usize) -> fmt::Result {
        Ok(())
    }
    fn case_run(&mut self, name: &str, repeat_idx: usize, report: &RunReport<M::Unit>) -> fmt::Result {
        Ok(())
    }
    fn ending_case(&mut self, name: &str, outcome: &Outcome) -> fmt::Result {
        Ok(())
    }

    fn ended(&mut self, summary: &Summary) -> fmt::Result {
        Ok(())
    }
}

/// A placeholder reporter that does nothing.
#[derive(Debug, Default)]
pub struct NoOpReporter;

impl<M: Metric> Reporter<M> for NoOpReporter {}

macro_rules! feature_gated {
    ($mod_name:ident gated with: $($cfg_expr:tt)*) => {
        #[cfg( $($cfg_expr)* )]
        #[cfg_attr(all(docs, not(doctest)), doc(cfg( $($cfg_expr)* )))]
        mod $mod_name;

        #[cfg( $($cfg_expr)* )]
        pub use $mod_name::*;
    };

    ($mod_name:ident gated on $($features:literal),+) => {
        feature_gated![$mod_name gated with: all( $(feature = $features),+ )];
    };
}

mod io;
pub use io::{FmtWrite, IoWrite, Output, Void};

mod basic;
pub use basic::*;

mod tap;
pub use tap::TapReporter;

feature_gated![json gated on "json"];
