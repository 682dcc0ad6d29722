use colored::{Color, ColoredString, Colorize};
use crossterm::terminal;

use crate::locator::SolutionEntry;
use crate::verify::{AnnotatedResult, GroupStats, RunReport, Verdict};

#[macro_export]
macro_rules! print_success {
    ($fmt:literal, $($e:tt)*) => {
        use ::colored::Colorize as _;
        eprintln!("{}", format!($fmt, $($e)*).green())
    }
}

pub fn is_truecolor_supported() -> bool {
    let Ok(v) = std::env::var("COLORTERM") else {
        return false
    };
    matches!(v.as_str(), "truecolor" | "24bit")
}

pub trait ColorTheme {
    fn color(&self) -> Color;
}

impl ColorTheme for log::Level {
    fn color(&self) -> Color {
        use log::Level::*;
        match self {
            Error => Color::BrightRed,
            Warn => Color::BrightYellow,
            Info => Color::Cyan,
            Debug => Color::Magenta,
            Trace => Color::Blue,
        }
    }
}

impl ColorTheme for Verdict {
    fn color(&self) -> Color {
        use Verdict::*;
        if !self::is_truecolor_supported() {
            return match self {
                AC => Color::Green,
                WA => Color::Yellow,
                OK => Color::Cyan,
                TLE => Color::Red,
                RE => Color::Magenta,
                CE => Color::Blue,
            };
        }

        let (r, g, b) = match self {
            AC => (30, 180, 40),
            WA => (210, 138, 4),
            OK => (20, 150, 170),
            TLE => (220, 42, 42),
            RE => (171, 40, 200),
            CE => (60, 90, 200),
        };
        Color::TrueColor { r, g, b }
    }
}

pub fn verdict_icon(verdict: Verdict) -> ColoredString {
    let fg = if is_truecolor_supported() {
        Color::TrueColor {
            r: 255,
            g: 255,
            b: 255,
        }
    } else {
        Color::BrightBlack
    };
    format!(" {:<3} ", verdict.to_string())
        .on_color(verdict.color())
        .bold()
        .color(fg)
}

/// One line per result, failure details, group tables and a closing summary line. Writes to stderr.
pub fn print_run_summary(report: &RunReport) {
    let label_width = report
        .results
        .iter()
        .map(|r| r.result.entry.label().len())
        .max()
        .unwrap_or(0);

    for r in &report.results {
        eprintln!(
            "{} {:<width$} {}",
            self::verdict_icon(r.verdict()),
            r.result.entry.label(),
            format!("[{:.2}ms]", r.result.wall_time_ms).cyan(),
            width = label_width,
        );
    }

    report
        .results
        .iter()
        .filter(|r| !matches!(r.verdict(), Verdict::AC | Verdict::OK))
        .for_each(print_result_detail);

    match &report.baseline {
        Some(b) => eprintln!(
            "\n{} {}/{} ({})",
            "Baseline:".bold(),
            b.author,
            b.language,
            report.meta.baseline_policy
        ),
        None => eprintln!(
            "\n{} none ({})",
            "Baseline:".bold(),
            report.meta.baseline_policy
        ),
    }
    print_group_table("author", &report.summary.by_author);
    print_group_table("language", &report.summary.by_language);

    let bar = "-".repeat(5);
    let total = report.summary.total;
    let passed = report.count_verdicts(Verdict::AC) + report.count_verdicts(Verdict::OK);
    let msg = if passed == total {
        format!("All {} solutions passed ✨", total).green()
    } else if passed > 0 {
        format!("{}/{} solutions failed 💣", total - passed, total).bright_red()
    } else {
        format!("All {} solutions failed 💀", total).bright_red()
    };
    eprintln!("\n{} {} {}", bar, msg, bar);
}

fn print_group_table(title: &str, groups: &[GroupStats]) {
    let key_width = groups
        .iter()
        .map(|g| g.key.len())
        .chain(std::iter::once(title.len()))
        .max()
        .unwrap_or(0);

    eprintln!(
        "{}",
        format!(
            "{:<width$}  {:>5}  {:>5}  {:>6}  {:>10}",
            title,
            "total",
            "ok",
            "failed",
            "avg (ms)",
            width = key_width
        )
        .bold()
    );
    for g in groups {
        let avg = g
            .avg_time_ms
            .map(|ms| format!("{:.2}", ms))
            .unwrap_or_else(|| "-".to_owned());
        eprintln!(
            "{:<width$}  {:>5}  {:>5}  {:>6}  {:>10}",
            g.key,
            g.total,
            g.successful,
            g.failed,
            avg,
            width = key_width
        );
    }
}

pub fn print_result_detail(r: &AnnotatedResult) {
    let (cols, _) = terminal::size().unwrap_or((40, 40));

    const BOLD_LINE: &str = "━";
    const THIN_LINE: &str = "─";

    let bold_bar = BOLD_LINE.repeat(cols as usize).blue().bold();

    eprintln!(
        "\n{}: {} [{:.2}ms]\n{}",
        r.result.entry.label().color(Color::BrightYellow).bold(),
        self::verdict_icon(r.verdict()),
        r.result.wall_time_ms,
        bold_bar,
    );

    fn print_sub_title(s: &str, cols: usize) {
        eprintln!(
            "{}{}",
            s.cyan().bold(),
            THIN_LINE
                .repeat(cols.saturating_sub(s.len() + 1))
                .bright_black(),
        )
    }

    if let Some(error) = &r.result.error {
        print_sub_title("[error]", cols as usize);
        eprintln!("{}", error.bright_red());
    }
    for warning in &r.result.warnings {
        eprintln!("{} {}", "warning:".bright_yellow().bold(), warning);
    }
    if r.verdict() == Verdict::WA {
        print_sub_title("[stdout]", cols as usize);
        if r.result.stdout.is_empty() {
            eprintln!("{}", "<EMPTY>".magenta().dimmed());
        } else {
            eprintln!("{}", r.result.stdout);
        }
    }
    if !r.result.stderr.is_empty() {
        print_sub_title("[stderr]", cols as usize);
        eprintln!("{}", r.result.stderr);
    }

    eprintln!("{}", bold_bar);
}

pub fn print_entries(entries: &[SolutionEntry]) {
    let label_width = entries
        .iter()
        .map(|e| e.label().len())
        .max()
        .unwrap_or(0);
    for e in entries {
        println!(
            "{:<width$}  {:<11}  {}",
            e.label().bold(),
            e.provider.to_string().dimmed(),
            e.directory.to_string_lossy(),
            width = label_width
        );
    }
}
