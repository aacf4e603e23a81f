use core::fmt::{self, Write};

use owo_colors::{OwoColorize, Style};

use super::io::{Output, OutputAdapter};
use super::Reporter;
use crate::metrics::{Metric, MetricFmtAdapter};
use crate::{Outcome, RunReport, Summary};

/// Human-readable output: a box per case, one line per run, and an
/// `avg ± spread (min to max)` line summarizing the runs.
pub struct BasicReporter<Out: Output, U = ()> {
    out: OutputAdapter<Out>,
    pub format_options: FormatOptions,
    state: State<U>,
}

impl<Out: Output, U> BasicReporter<Out, U> {
    pub fn new(out: Out) -> Self {
        BasicReporter {
            out: OutputAdapter(out),
            format_options: Default::default(),
            state: Default::default(),
        }
    }

    pub fn set_format_options(mut self, options: FormatOptions) -> Self {
        self.format_options = options;
        self
    }

    pub fn into_inner(self) -> Out {
        self.out.0
    }
}

pub struct FormatOptions {
    pub prefix: Option<fn(&mut dyn Write) -> fmt::Result>,
    pub box_style: Style,
    pub box_spec: support::BoxSpec,
    pub iteration_count_style: Style,
    pub case_name_style: Style,
    pub unit_style: Style,
    pub avg_style: Style,
    pub range_style: Style,
    pub min_style: Style,
    pub max_style: Style,
    pub pass_style: Style,
    pub fail_style: Style,
}

impl Default for FormatOptions {
    fn default() -> Self {
        FormatOptions {
            prefix: Some(|f| f.write_str("┆ ")),
            box_style: Style::new().blue(),
            box_spec: support::SINGLE_LINED_BOX,
            iteration_count_style: Style::new(),
            case_name_style: Style::new().bold(),
            unit_style: Style::new().bold(),
            avg_style: Style::new().green().bold(),
            range_style: Style::new().dimmed(),
            min_style: Style::new().yellow(),
            max_style: Style::new().red(),
            pass_style: Style::new().green(),
            fail_style: Style::new().red().bold(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Stats<U> {
    min: U,
    max: U,
    sum: U,
    count: usize,
}

#[derive(Debug)]
enum State<U> {
    WaitingForNextCase,
    RunningCase {
        run_num_width: usize,
        stats: Option<Stats<U>>,
    },
}

impl<U> Default for State<U> {
    fn default() -> Self {
        State::WaitingForNextCase
    }
}

mod support {
    use core::fmt::{self, Display, Write};
    use owo_colors::{OwoColorize, Style};

    // When `unicode-width` is not enabled, this is bad and ignores the fact
    // that printed chars (i.e. emoji) can be wide.
    pub(crate) fn estimated_str_width(s: &str) -> usize {
        #[cfg(not(feature = "unicode-width"))]
        let res = s.chars().count();

        #[cfg(feature = "unicode-width")]
        let res = {
            use unicode_width::UnicodeWidthStr;
            UnicodeWidthStr::width(s)
        };

        res
    }

    pub(crate) fn estimated_num_width(n: usize) -> usize {
        n.checked_ilog10().unwrap_or(0) as usize + 1
    }

    pub(crate) struct Repeat<T>(T, usize);
    impl<T: Display> Display for Repeat<T> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            for _ in 0..self.1 {
                self.0.fmt(f)?
            }

            Ok(())
        }
    }

    pub(crate) struct Joined<A, B>(A, B);
    impl<A: Display, B: Display> Display for Joined<A, B> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            self.0.fmt(f)?;
            self.1.fmt(f)
        }
    }
    pub(crate) trait FmtUtil: Sized {
        fn join<O>(self, other: O) -> Joined<Self, O> {
            Joined(self, other)
        }

        fn times(self, times: usize) -> Repeat<Self> {
            Repeat(self, times)
        }
    }
    impl<A> FmtUtil for A {}

    #[derive(Debug, PartialEq, PartialOrd, Clone, Copy)]
    pub struct BoxSpec {
        top_left: char,
        top_right: char,
        bot_left: char,
        bot_right: char,
        vertical: char,
        horizontal: char,
    }

    pub const SINGLE_LINED_BOX: BoxSpec = BoxSpec {
        top_left: '┌',
        top_right: '┐',
        bot_left: '└',
        bot_right: '┘',
        vertical: '│',
        horizontal: '─',
    };

    pub const DOUBLE_LINED_BOX: BoxSpec = BoxSpec {
        top_left: '╔',
        top_right: '╗',
        bot_left: '╚',
        bot_right: '╝',
        vertical: '║',
        horizontal: '═',
    };

    pub(crate) fn draw_boxed<W: Write>(
        f: &mut W,
        prefix: Option<fn(&mut dyn Write) -> fmt::Result>,
        spec: &BoxSpec,
        content: &str,
        box_style: Style,
        content_style: Style,
    ) -> fmt::Result {
        let lines = content.split_terminator('\n');
        let width = lines.clone().map(estimated_str_width).max().unwrap_or(0);

        macro_rules! line {
            ($(
                ($($tt:tt)+)
            ),* $(,)?) => {
                if let Some(p) = prefix {
                    p(f)?
                }

                $(
                    write!(f, $($tt)+)?;
                )*

                writeln!(f)?;
            };
        }

        // Top:
        line! {
            ("{}", spec.top_left.join(spec.horizontal.times(width + 2))
                .join(spec.top_right)
                .style(box_style)
            ),
        }

        // Content:
        for l in lines {
            line! {
                ("{} ", spec.vertical.style(box_style)),
                ("{}{:pad$}", l.style(content_style), "", pad = width - estimated_str_width(l)),
                (" {}", spec.vertical.style(box_style)),
            }
        }

        // End:
        line! {
            ("{}", spec.bot_left.join(spec.horizontal.times(width + 2))
                    .join(spec.bot_right)
                    .style(box_style)
            ),
        }

        Ok(())
    }
}
use support::*;
pub use support::{BoxSpec, DOUBLE_LINED_BOX, SINGLE_LINED_BOX};

macro_rules! prefixed {
    (($self:ident) <- $(
        ($($tt:tt)+)
    ),* $(,)?) => {
        if let Some(p) = $self.format_options.prefix {
            p(&mut $self.out)?
        }

        prefixed![($self) ++  $(
            ($($tt)*),
        )*];
    };

    // Omit prefix!
    (($self:ident) ++ $(
        ($($tt:tt)+)
    ),* $(,)?) => {
        $(
            write!($self.out, $($tt)+)?;
        )*
    }
}

fn print_stats<M: Metric, W: Write>(
    out: &mut W,
    options: &FormatOptions,
    stats: &Stats<M::Unit>,
) -> fmt::Result {
    let avg: M::Unit = {
        let count: M::Divisor = stats.count.try_into().map_err(|_| fmt::Error)?;
        stats.sum / count
    };
    let range = {
        let upper = stats.max - avg;
        let lower = avg - stats.min;

        upper.max(lower)
    };

    write!(
        out,
        "{} ± {} ",
        MetricFmtAdapter::<M>::new(&avg).style(options.avg_style),
        MetricFmtAdapter::<M>::new(&range).style(options.range_style),
    )?;
    write!(
        out,
        "{}{} {} {}{}",
        "(".dimmed(),
        MetricFmtAdapter::<M>::new(&stats.min).style(options.min_style),
        "to".dimmed(),
        MetricFmtAdapter::<M>::new(&stats.max).style(options.max_style),
        ")".dimmed(),
    )
}

impl<Out, M> Reporter<M> for BasicReporter<Out, M::Unit>
where
    Out: Output,
    M: Metric,
{
    fn starting_case(&mut self, name: &str, iterations: usize, repeats: usize) -> fmt::Result {
        debug_assert!(matches!(self.state, State::WaitingForNextCase));
        self.state = State::RunningCase {
            run_num_width: estimated_num_width(repeats),
            stats: None,
        };

        draw_boxed(
            &mut self.out,
            self.format_options.prefix,
            &self.format_options.box_spec,
            name,
            self.format_options.box_style,
            self.format_options.case_name_style,
        )?;
        prefixed![(self) <- ("\n")];
        prefixed![(self) <-
            ("{}", "Runs (".dimmed()),
            ("{}", iterations.style(self.format_options.iteration_count_style)),
            ("{}", " iterations each, measuring ".dimmed()),
            ("{}", M::UNIT_NAME.style(self.format_options.unit_style)),
            ("{}\n", "):".dimmed()),
        ];

        Ok(())
    }

    fn case_run(&mut self, _name: &str, repeat_idx: usize, report: &RunReport<M::Unit>) -> fmt::Result {
        let State::RunningCase {
            run_num_width,
            stats,
        } = &mut self.state
        else {
            unreachable!("`case_run` outside of a case")
        };
        let run_num_width = *run_num_width;

        if let Some(m) = report.elapsed {
            *stats = Some(match *stats {
                None => Stats {
                    min: m,
                    max: m,
                    sum: m,
                    count: 1,
                },
                Some(s) => Stats {
                    min: s.min.min(m),
                    max: s.max.max(m),
                    sum: s.sum + m,
                    count: s.count + 1,
                },
            });
        }

        prefixed![(self) <-
            (" "),
            ("{: >num_width$}{} ", repeat_idx + 1, '.'.dimmed(), num_width = run_num_width),
        ];
        match report.elapsed {
            Some(ref m) => {
                prefixed![(self) ++ ("{}\n", MetricFmtAdapter::<M>::new(m))];
            }
            None => {
                prefixed![(self) ++ ("{}\n", "(not timed)".dimmed())];
            }
        }

        for failure in report.failures() {
            prefixed![(self) <-
                (" {: >pad$}  ", "", pad = run_num_width),
                ("{} {}\n", '✗'.style(self.format_options.fail_style), failure),
            ];
        }

        Ok(())
    }

    fn ending_case(&mut self, _name: &str, outcome: &Outcome) -> fmt::Result {
        let state = core::mem::take(&mut self.state);
        let State::RunningCase {
            run_num_width,
            stats,
        } = state
        else {
            unreachable!("`ending_case` outside of a case")
        };

        if let Some(stats) = stats {
            prefixed![(self) <- (" {: >pad$}  ", "", pad = run_num_width)];
            print_stats::<M, _>(&mut self.out, &self.format_options, &stats)?;
            prefixed![(self) ++ ("\n")];
        }

        match outcome {
            Outcome::Pass => {
                prefixed![(self) <- (" {}\n", "ok".style(self.format_options.pass_style))];
            }
            Outcome::Fail(reasons) => {
                prefixed![(self) <-
                    (" {} ", "FAILED".style(self.format_options.fail_style)),
                    ("{}\n", format!("({} problem(s))", reasons.len()).dimmed()),
                ];
            }
        }

        prefixed![(self) <- ("\n")];
        writeln!(self.out, "\n")
    }

    fn ended(&mut self, summary: &Summary) -> fmt::Result {
        debug_assert!(matches!(self.state, State::WaitingForNextCase));

        prefixed![(self) <-
            ("{} cases: ", summary.cases),
            ("{} passed", summary.passed_cases.style(self.format_options.pass_style)),
            (", "),
            ("{} failed\n", summary.failed_cases().style(self.format_options.fail_style)),
        ];
        self.out.0.flush()
    }
}
