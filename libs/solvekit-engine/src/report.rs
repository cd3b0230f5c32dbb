/// Human-Facing Run Report
///
/// **Responsibility:**
/// Render the runtime information box, per-case verdicts, output diffs and
/// the final summary. Everything goes to the wrapped writer immediately so
/// long suites give incremental feedback.
///
/// Colouring goes through `colored`, so `NO_COLOR` and its override switch
/// apply.
use crate::comparator::{Comparison, OutputWarning, RenderMode, Verdict};
use crate::process::{ExecutionOutput, ExitOutcome, MAX_CAPTURE_BYTES};
use colored::Colorize;
use solvekit_common::types::{ProblemMeta, TestCase, TestStatus};
use std::io::{self, Write};

const DEFAULT_DIVIDER_WIDTH: usize = 60;
const MAX_DIVIDER_WIDTH: usize = 120;

struct BoxLine {
    text: String,
    width: usize,
}

impl BoxLine {
    fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        let width = text.chars().count();
        Self { text, width }
    }
}

pub struct Reporter<W: Write> {
    out: W,
    terminal_width: Option<usize>,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, terminal_width: Option<usize>) -> Self {
        Self { out, terminal_width }
    }

    pub fn terminal_width(&self) -> Option<usize> {
        self.terminal_width
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn divider(&mut self) -> io::Result<()> {
        let width = self
            .terminal_width
            .unwrap_or(DEFAULT_DIVIDER_WIDTH)
            .min(MAX_DIVIDER_WIDTH);
        writeln!(self.out, "{}", "─".repeat(width).dimmed())
    }

    /// Language, runner settings and whatever is known about the problem
    pub fn runtime_info(&mut self, entries: &[(String, String)], meta: Option<&ProblemMeta>) -> io::Result<()> {
        let mut lines: Vec<BoxLine> = entries
            .iter()
            .map(|(key, value)| BoxLine::plain(format!("{}: {}", key, value)))
            .collect();
        if let Some(meta) = meta {
            if let Some(title) = &meta.title {
                lines.push(BoxLine::plain(format!("Problem: {}", title)));
            }
            if let Some(url) = &meta.url {
                lines.push(BoxLine::plain(format!("Url: {}", url)));
            }
        }
        let title = "ℹ Runtime Information";
        write_box(&mut self.out, &title.bold().to_string(), title.chars().count(), &lines)
    }

    pub fn compile_failure(&mut self, diagnostics: &str) -> io::Result<()> {
        writeln!(self.out, "{} {}", "✖".red(), "Compile Failed!".red())?;
        writeln!(self.out, "{}", diagnostics.trim_end())
    }

    /// Print one executed case. `position`/`total` drive the `[k/M]` prefix.
    pub fn case_result(
        &mut self,
        position: usize,
        total: usize,
        case: &TestCase,
        verdict: &Verdict,
        output: &ExecutionOutput,
    ) -> io::Result<()> {
        self.divider()?;
        let progress = format!("[{}/{}]", position, total).dimmed();
        let elapsed = format!("({} ms)", output.elapsed.as_millis()).dimmed();
        let label = format!("Test Case {}", case.index).white().bold();

        match verdict.status {
            TestStatus::Passed => {
                writeln!(self.out, "{} {} {} {} {}", "✔".green(), progress, label, "Passed!".green(), elapsed)?;
            }
            TestStatus::Failed => {
                writeln!(self.out, "{} {} {} {} {}", "✖".red(), progress, label, "Failed!".yellow(), elapsed)?;
                if let Some(comparison) = &verdict.comparison {
                    self.comparison(comparison, &output.stdout, &case.expected_stdout)?;
                }
            }
            TestStatus::Timeout => {
                writeln!(self.out, "{} {} {} {} {}", "✖".red(), progress, label, "Timeout!".red(), elapsed)?;
                self.partial_output(&output.stdout)?;
            }
            TestStatus::RuntimeError => {
                writeln!(
                    self.out,
                    "{} {} {} {} {}",
                    "✖".red(),
                    progress,
                    label,
                    "Runtime Error Occurred!".red(),
                    elapsed
                )?;
                if let ExitOutcome::Failure { .. } = output.outcome {
                    writeln!(self.out, "{}", format!("Process {}", output.outcome.describe()).dimmed())?;
                }
                self.partial_output(&output.stdout)?;
            }
        }

        if verdict.warning == Some(OutputWarning::EmptyStdout) {
            writeln!(
                self.out,
                "{} {}",
                "⚠".yellow(),
                "stdout is empty, but the program wrote to stderr".yellow()
            )?;
        }
        if !output.stderr.trim().is_empty() {
            writeln!(self.out, "{}", format!("[stderr]\n{}", output.stderr.trim_end()).dimmed())?;
        }
        if output.truncated {
            writeln!(
                self.out,
                "{} {}",
                "⚠".yellow(),
                format!("output truncated after {} MiB", MAX_CAPTURE_BYTES / (1024 * 1024)).yellow()
            )?;
        }
        Ok(())
    }

    fn partial_output(&mut self, stdout: &str) -> io::Result<()> {
        if stdout.trim().is_empty() {
            return Ok(());
        }
        writeln!(self.out, "{}", "[partial stdout]".dimmed())?;
        writeln!(self.out, "{}", stdout.trim_end())
    }

    fn comparison(&mut self, comparison: &Comparison, actual: &str, expected: &str) -> io::Result<()> {
        if let Some(line) = comparison.first_mismatch() {
            writeln!(self.out, "{}", format!("first difference at line {}", line + 1).dimmed())?;
        }
        match comparison.render_mode(self.terminal_width) {
            RenderMode::Verbose => {
                writeln!(self.out, "{}", "actual".dimmed())?;
                writeln!(self.out, "{}", actual.trim_end().red())?;
                writeln!(self.out, "{}", "expected".dimmed())?;
                writeln!(self.out, "{}", expected.trim_end().green())
            }
            RenderMode::SideBySide => {
                let width = comparison.column_width;
                let lines: Vec<BoxLine> = comparison
                    .lines
                    .iter()
                    .map(|pair| {
                        let actual = pair.actual.as_deref().unwrap_or("");
                        let expected = pair.expected.as_deref().unwrap_or("");
                        let text = format!(
                            "{}{} {} {}{}",
                            actual.red(),
                            pad(actual, width),
                            "│".dimmed(),
                            expected.green(),
                            pad(expected, width)
                        );
                        BoxLine {
                            text,
                            width: width * 2 + 3,
                        }
                    })
                    .collect();
                let title = format!("{} {} {} {}", "ℹ".blue(), "actual".red(), "/".dimmed(), "expected".green());
                write_box(&mut self.out, &title, "ℹ actual / expected".chars().count(), &lines)
            }
        }
    }

    pub fn summary(&mut self, all_passed: bool) -> io::Result<()> {
        self.divider()?;
        if all_passed {
            writeln!(self.out, "{}", "All Tests Passed!".bright_green().bold())?;
        } else {
            writeln!(self.out, "{}", "Some Tests Failed!".bright_red().bold())?;
        }
        self.divider()
    }

    /// `view-tests` listing
    pub fn test_listing(&mut self, cases: &[TestCase]) -> io::Result<()> {
        for case in cases {
            self.divider()?;
            writeln!(self.out, "{}", format!("Test {}", case.index).bold())?;
            writeln!(self.out, "{}", "[input]".dimmed())?;
            writeln!(self.out, "{}", case.stdin.trim_end())?;
            writeln!(self.out, "{}", "[expected output]".dimmed())?;
            writeln!(self.out, "{}", case.expected_stdout.trim_end())?;
        }
        self.divider()
    }
}

fn pad(text: &str, width: usize) -> String {
    " ".repeat(width.saturating_sub(text.chars().count()))
}

/// Rounded box, title embedded in the top border, one space of left padding
fn write_box<W: Write>(out: &mut W, title: &str, title_width: usize, lines: &[BoxLine]) -> io::Result<()> {
    let content_width = lines
        .iter()
        .map(|line| line.width)
        .max()
        .unwrap_or(0)
        .max(title_width + 1);
    let inner = content_width + 1;

    writeln!(
        out,
        "{}{}{}",
        "╭─".dimmed(),
        title,
        format!("{}╮", "─".repeat(inner - 1 - title_width)).dimmed()
    )?;
    for line in lines {
        writeln!(
            out,
            "{} {}{}{}",
            "│".dimmed(),
            line.text,
            " ".repeat(content_width - line.width),
            "│".dimmed()
        )?;
    }
    writeln!(out, "{}", format!("╰{}╯", "─".repeat(inner)).dimmed())
}
