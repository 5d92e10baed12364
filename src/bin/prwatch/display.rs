use std::{
    io::{self, IsTerminal, Write},
    time::Duration,
};

use anyhow::Result;
use chrono::Local;
use chrono_humanize::HumanTime;
use owo_colors::OwoColorize;
use prwatch::{ApiFailure, BranchName, Presenter, StatusRecord, StatusState};
use tracing::warn;

const CLEAR_SCREEN: &str = "\x1B[2J\x1B[1;1H";
const TRUNCATION_SUFFIX: &str = "...";
const MIN_DESCRIPTION_WIDTH: usize = 10;

/// How status output is decorated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub colors: bool,
    /// Maximum line width; `None` disables truncation.
    pub width: Option<usize>,
}

impl Style {
    pub fn plain() -> Self {
        Self {
            colors: false,
            width: None,
        }
    }

    /// Colours and width for the current stdout.
    pub fn detect() -> Self {
        let is_terminal = io::stdout().is_terminal();
        let colors = is_terminal && std::env::var_os("NO_COLOR").is_none();
        let width = if is_terminal {
            terminal_size::terminal_size().map(|(w, _)| w.0 as usize)
        } else {
            None
        };
        Self { colors, width }
    }
}

fn icon(state: StatusState) -> &'static str {
    match state {
        StatusState::Success => "✔",
        StatusState::Error => "✘",
        StatusState::Failure => "⚠",
        StatusState::Pending => "•",
    }
}

fn colorize(text: &str, state: StatusState, style: Style) -> String {
    if !style.colors {
        return text.to_string();
    }
    match state {
        StatusState::Success => text.green().to_string(),
        StatusState::Error | StatusState::Failure => text.red().to_string(),
        StatusState::Pending => text.yellow().to_string(),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(TRUNCATION_SUFFIX.len());
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(TRUNCATION_SUFFIX);
    truncated
}

/// Writes one status snapshot: a summary line, a blank line, then one line
/// per check. Output depends only on the arguments.
pub fn write_status<W: Write>(
    writer: &mut W,
    branch: &BranchName,
    status: &StatusRecord,
    style: Style,
) -> Result<()> {
    let summary = format!("Build {}", status.state);
    writeln!(
        writer,
        "{} [{}] {}",
        colorize(icon(status.state), status.state, style),
        branch,
        colorize(&summary, status.state, style)
    )?;
    writeln!(writer)?;

    for detail in &status.details {
        let prefix_width = detail.context.chars().count() + 5;
        let description = match style.width {
            Some(width) if width > prefix_width + MIN_DESCRIPTION_WIDTH => {
                truncate(&detail.description, width - prefix_width)
            }
            _ => detail.description.clone(),
        };
        writeln!(
            writer,
            "{} [{}] {}",
            colorize(icon(detail.state), detail.state, style),
            detail.context,
            colorize(&description, detail.state, style)
        )?;
    }
    Ok(())
}

/// Like [`write_status`], optionally clearing the screen first.
pub fn write_snapshot<W: Write>(
    writer: &mut W,
    clear: bool,
    branch: &BranchName,
    status: &StatusRecord,
    style: Style,
) -> Result<()> {
    if clear {
        write!(writer, "{CLEAR_SCREEN}")?;
    }
    write_status(writer, branch, status, style)
}

pub fn write_api_failure<W: Write>(
    writer: &mut W,
    failure: &ApiFailure,
    show_detail: bool,
) -> Result<()> {
    writeln!(writer)?;
    writeln!(writer, "✘ An error occurred while contacting GitHub")?;
    writeln!(writer, "✘ {}", failure.message)?;
    if let Some(url) = &failure.documentation_url {
        writeln!(writer, "✘ Please check {url} to fix the issue")?;
    }
    writeln!(writer)?;
    for hint in failure.hints() {
        writeln!(writer, "• {hint}")?;
    }
    if show_detail {
        writeln!(writer, "{}", failure.detail)?;
    }
    Ok(())
}

pub fn format_next_check(interval: Duration) -> String {
    let Some(delta) = chrono::Duration::from_std(interval).ok() else {
        return format!("Next check in {}s", interval.as_secs());
    };
    match Local::now().checked_add_signed(delta) {
        Some(at) => format!(
            "Next check {} (at {})",
            HumanTime::from(delta),
            at.format("%H:%M:%S")
        ),
        None => format!("Next check {}", HumanTime::from(delta)),
    }
}

/// [`Presenter`] writing status to stdout and everything else to stderr.
pub struct TerminalPresenter {
    style: Style,
    clear_between_polls: bool,
    debug: bool,
}

impl TerminalPresenter {
    pub fn new(style: Style, watching: bool, debug: bool) -> Self {
        Self {
            style,
            clear_between_polls: watching && io::stdout().is_terminal(),
            debug,
        }
    }
}

impl Presenter for TerminalPresenter {
    fn progress(&self, message: &str) {
        eprintln!("• {message}");
    }

    fn render(&self, branch: &BranchName, status: &StatusRecord) {
        let mut stdout = io::stdout().lock();
        if let Err(error) = write_snapshot(
            &mut stdout,
            self.clear_between_polls,
            branch,
            status,
            self.style,
        ) {
            warn!("failed to write status: {error:#}");
        }
    }

    fn report_api_failure(&self, failure: &ApiFailure) {
        if let Err(error) = write_api_failure(&mut io::stderr().lock(), failure, self.debug) {
            warn!("failed to write error report: {error:#}");
        }
    }

    fn waiting(&self, interval: Duration) {
        eprintln!();
        eprintln!("• {}", format_next_check(interval));
    }

    fn warn(&self, message: &str) {
        eprintln!("⚠ {message}");
    }
}

#[cfg(test)]
mod tests {
    use prwatch::CheckDetail;

    use super::*;

    fn branch() -> BranchName {
        BranchName::new("feature-x").unwrap()
    }

    fn detail(state: StatusState, context: &str, description: &str) -> CheckDetail {
        CheckDetail {
            state,
            context: context.to_string(),
            description: description.to_string(),
            target_url: None,
        }
    }

    fn render_to_string(status: &StatusRecord, style: Style) -> String {
        let mut out = Vec::new();
        write_status(&mut out, &branch(), status, style).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn renders_summary_and_one_line_per_check() {
        let status = StatusRecord {
            state: StatusState::Success,
            details: vec![detail(StatusState::Success, "ci/build", "Build passed")],
        };

        let output = render_to_string(&status, Style::plain());

        assert_eq!(
            output,
            "✔ [feature-x] Build success\n\n✔ [ci/build] Build passed\n"
        );
    }

    #[test]
    fn rendering_is_repeatable() {
        let status = StatusRecord {
            state: StatusState::Failure,
            details: vec![
                detail(StatusState::Success, "ci/lint", "Lint passed"),
                detail(StatusState::Failure, "ci/test", "2 tests failed"),
            ],
        };
        let style = Style {
            colors: true,
            width: Some(80),
        };

        assert_eq!(
            render_to_string(&status, style),
            render_to_string(&status, style)
        );
    }

    #[test]
    fn uses_state_icons() {
        let status = StatusRecord {
            state: StatusState::Pending,
            details: vec![
                detail(StatusState::Error, "ci/a", "errored"),
                detail(StatusState::Failure, "ci/b", "failed"),
                detail(StatusState::Pending, "ci/c", "running"),
            ],
        };

        let output = render_to_string(&status, Style::plain());
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines[0], "• [feature-x] Build pending");
        assert_eq!(lines[2], "✘ [ci/a] errored");
        assert_eq!(lines[3], "⚠ [ci/b] failed");
        assert_eq!(lines[4], "• [ci/c] running");
    }

    #[test]
    fn colors_only_when_enabled() {
        let status = StatusRecord {
            state: StatusState::Error,
            details: vec![],
        };
        let colored = render_to_string(
            &status,
            Style {
                colors: true,
                width: None,
            },
        );
        assert!(colored.contains("\x1b["));
        assert!(!render_to_string(&status, Style::plain()).contains("\x1b["));
    }

    #[test]
    fn truncates_long_descriptions_to_width() {
        let status = StatusRecord {
            state: StatusState::Pending,
            details: vec![detail(StatusState::Pending, "ci", &"x".repeat(200))],
        };
        let output = render_to_string(
            &status,
            Style {
                colors: false,
                width: Some(40),
            },
        );
        let line = output.lines().nth(2).unwrap();
        assert_eq!(line.chars().count(), 40);
        assert!(line.ends_with("..."));
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn snapshot_clears_screen_before_status() {
        let status = StatusRecord {
            state: StatusState::Success,
            details: vec![],
        };
        let mut out = Vec::new();
        write_snapshot(&mut out, true, &branch(), &status, Style::plain()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, format!("{CLEAR_SCREEN}✔ [feature-x] Build success\n\n"));
    }

    #[test]
    fn snapshot_reports_clear_screen_failure() {
        let status = StatusRecord {
            state: StatusState::Success,
            details: vec![],
        };
        assert!(write_snapshot(&mut ClosedPipe, true, &branch(), &status, Style::plain()).is_err());
    }

    #[test]
    fn api_failure_mentions_documentation() {
        let failure = ApiFailure {
            message: "Bad credentials".to_string(),
            documentation_url: Some("https://docs.github.com/rest".to_string()),
            detail: "GitHub { source: .. }".to_string(),
        };

        let mut out = Vec::new();
        write_api_failure(&mut out, &failure, false).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Bad credentials"));
        assert!(text.contains("Please check https://docs.github.com/rest"));
        assert!(text.contains("https://github.com/settings/tokens"));
        assert!(!text.contains("GitHub { source"));

        let mut out = Vec::new();
        write_api_failure(&mut out, &failure, true).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("GitHub { source"));
    }

    #[test]
    fn next_check_is_humanized() {
        let text = format_next_check(Duration::from_secs(300));
        assert!(text.starts_with("Next check in 5 minutes"));
    }

    #[test]
    fn next_check_survives_huge_intervals() {
        let text = format_next_check(Duration::from_secs(100_000_000_000_000));
        assert!(text.starts_with("Next check"));
        assert!(!text.contains("(at"));

        let text = format_next_check(Duration::from_secs(u64::MAX));
        assert!(text.starts_with("Next check"));
    }
}
