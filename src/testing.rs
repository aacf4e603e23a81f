//! Test doubles shared by the unit tests.

use crate::MeasurementRun;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Signal {
    Tic,
    Toc,
    Fail(String),
    Pass(String),
    End,
}

/// A [`MeasurementRun`] that records every signal it receives.
#[derive(Debug)]
pub(crate) struct Recorder {
    iterations: usize,
    pub(crate) signals: Vec<Signal>,
}

impl Recorder {
    pub(crate) fn new(iterations: usize) -> Self {
        Recorder {
            iterations,
            signals: Vec::new(),
        }
    }

    pub(crate) fn count(&self, signal: &Signal) -> usize {
        self.signals.iter().filter(|s| *s == signal).count()
    }

    pub(crate) fn fails(&self) -> usize {
        self.signals
            .iter()
            .filter(|s| matches!(s, Signal::Fail(_)))
            .count()
    }

    pub(crate) fn position(&self, signal: &Signal) -> Option<usize> {
        self.signals.iter().position(|s| s == signal)
    }
}

impl MeasurementRun for Recorder {
    fn iterations(&self) -> usize {
        self.iterations
    }

    fn tic(&mut self) {
        self.signals.push(Signal::Tic)
    }

    fn toc(&mut self) {
        self.signals.push(Signal::Toc)
    }

    fn fail(&mut self, message: &str) {
        self.signals.push(Signal::Fail(message.to_string()))
    }

    fn pass(&mut self, message: &str) {
        self.signals.push(Signal::Pass(message.to_string()))
    }

    fn end(&mut self) {
        self.signals.push(Signal::End)
    }
}
