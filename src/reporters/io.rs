use core::fmt;

// Unifies `core::fmt::Write` and `std::io::Write`.
pub trait Output {
    fn output_str(&mut self, s: &str) -> fmt::Result;
    fn flush(&mut self) -> fmt::Result {
        Ok(())
    }
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct Void;
impl Output for Void {
    fn output_str(&mut self, _s: &str) -> fmt::Result {
        Ok(())
    }
}

/// Output into a [`core::fmt::Write`] impl (i.e. a `String`, or `&mut String`).
#[derive(Debug, Default)]
pub struct FmtWrite<W>(pub W);
impl<W: fmt::Write> Output for FmtWrite<W> {
    #[inline(always)]
    fn output_str(&mut self, s: &str) -> fmt::Result {
        self.0.write_str(s)
    }
}

/// Output into a [`std::io::Write`] impl (i.e. `stdout().lock()`).
///
/// I/O errors are reported as [`fmt::Error`]; the underlying error is lost.
#[derive(Debug)]
pub struct IoWrite<W>(pub W);
impl<W: std::io::Write> Output for IoWrite<W> {
    fn output_str(&mut self, s: &str) -> fmt::Result {
        self.0.write_all(s.as_bytes()).map_err(|_| fmt::Error)
    }

    fn flush(&mut self) -> fmt::Result {
        self.0.flush().map_err(|_| fmt::Error)
    }
}

impl<O: Output + ?Sized> Output for &mut O {
    fn output_str(&mut self, s: &str) -> fmt::Result {
        (**self).output_str(s)
    }

    fn flush(&mut self) -> fmt::Result {
        (**self).flush()
    }
}

/// Lets reporters use `write!` on any [`Output`].
pub(crate) struct OutputAdapter<O>(pub(crate) O);

impl<O: Output> fmt::Write for OutputAdapter<O> {
    #[inline(always)]
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.output_str(s)
    }
}
