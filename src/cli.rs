use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use crate::types::{DEFAULT_REMOTE, RunConfig};

const BUILD_INFO_HUMAN: &str = env!("BUILD_INFO_HUMAN");

#[derive(Parser, Default, Debug)]
#[command(
    name = "prwatch",
    about = "Watch the CI status of a branch until it settles, then open its pull request"
)]
#[command(long_version = BUILD_INFO_HUMAN)]
struct CliArgs {
    /// Branch to watch (defaults to the current branch, matched ignoring case)
    #[arg(value_name = "BRANCH", conflicts_with = "branch")]
    pub branch_arg: Option<String>,

    /// Branch to watch, same as the positional argument
    #[arg(short = 'b', long = "branch", value_name = "NAME")]
    pub branch: Option<String>,

    /// Print the current status once and exit instead of watching
    #[arg(long)]
    pub once: bool,

    /// Time between two polls (e.g. 300, 90s, 5m; unitless means seconds)
    #[arg(short = 'i', long, default_value = "300", value_name = "DURATION")]
    pub interval: String,

    /// Remote holding the branch and pointing at the GitHub repository
    #[arg(short = 'r', long, default_value = DEFAULT_REMOTE, value_name = "NAME")]
    pub remote: String,

    /// Give up on a single GitHub request after this long (e.g. 30, 1m)
    #[arg(long, default_value = "30", value_name = "DURATION")]
    pub timeout: String,

    /// Enable debug logging and print raw API errors
    #[arg(long)]
    pub debug: bool,
}

impl CliArgs {
    pub fn validate(&self) -> Result<()> {
        if self.remote.trim().is_empty() {
            anyhow::bail!("--remote cannot be empty");
        }

        for hint in [&self.branch_arg, &self.branch].into_iter().flatten() {
            if hint.trim().is_empty() {
                anyhow::bail!("Branch name cannot be empty");
            }
        }

        Ok(())
    }
}

/// Parses a duration given as plain seconds or with an `s`, `m` or `h`
/// suffix. Zero is rejected since it would turn the watch into a busy loop.
pub fn parse_duration(duration_str: &str) -> Result<Duration> {
    let duration_str = duration_str.trim();

    let (number, multiplier) = if let Some(seconds) = duration_str.strip_suffix('s') {
        (seconds, 1)
    } else if let Some(minutes) = duration_str.strip_suffix('m') {
        (minutes, 60)
    } else if let Some(hours) = duration_str.strip_suffix('h') {
        (hours, 3600)
    } else {
        (duration_str, 1)
    };

    let value: u64 = number.parse().with_context(|| {
        format!(
            "Invalid duration '{}'. Supported formats: unitless number (seconds), '90s', '5m', '1h'",
            duration_str
        )
    })?;

    if value == 0 {
        anyhow::bail!("Duration must be greater than zero, got '{}'", duration_str);
    }

    let Some(seconds) = value.checked_mul(multiplier) else {
        anyhow::bail!("Duration '{}' is too large", duration_str);
    };

    Ok(Duration::from_secs(seconds))
}

fn build_config_from_cli(cli: CliArgs) -> Result<RunConfig> {
    cli.validate()?;

    let poll_interval = parse_duration(&cli.interval)
        .with_context(|| format!("Invalid --interval '{}'", cli.interval))?;
    let request_timeout = parse_duration(&cli.timeout)
        .with_context(|| format!("Invalid --timeout '{}'", cli.timeout))?;

    Ok(RunConfig {
        branch_hint: cli.branch_arg.or(cli.branch).map(|b| b.trim().to_string()),
        poll_interval,
        once: cli.once,
        remote: cli.remote.trim().to_string(),
        request_timeout,
        debug: cli.debug,
    })
}

/// Parses command-line arguments into the settings of a run.
///
/// Clap errors (including `--help` and `--version`) are returned inside the
/// `anyhow::Error` so the caller can downcast and print them.
pub fn parse_args<I, T>(args: I) -> Result<RunConfig>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = CliArgs::try_parse_from(args)?;
    build_config_from_cli(cli)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<RunConfig> {
        parse_args(std::iter::once("prwatch").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_to_watching_current_branch() {
        let config = parse(&[]).unwrap();
        assert_eq!(config, RunConfig::default());
    }

    #[test]
    fn positional_branch_is_the_hint() {
        let config = parse(&["feature-x"]).unwrap();
        assert_eq!(config.branch_hint.as_deref(), Some("feature-x"));
    }

    #[test]
    fn branch_flag_is_equivalent() {
        let config = parse(&["--branch", "feature-x"]).unwrap();
        assert_eq!(config.branch_hint.as_deref(), Some("feature-x"));
    }

    #[test]
    fn positional_and_flag_conflict() {
        let err = parse(&["feature-x", "--branch", "other"]).unwrap_err();
        assert!(err.downcast_ref::<clap::Error>().is_some());
    }

    #[test]
    fn once_and_interval_flags() {
        let config = parse(&["--once", "--interval", "60", "--debug"]).unwrap();
        assert!(config.once);
        assert!(config.debug);
        assert_eq!(config.poll_interval, Duration::from_secs(60));
    }

    #[test]
    fn remote_and_timeout_flags() {
        let config = parse(&["--remote", "upstream", "--timeout", "2m"]).unwrap();
        assert_eq!(config.remote, "upstream");
        assert_eq!(config.request_timeout, Duration::from_secs(120));
    }

    #[test]
    fn invalid_interval_is_rejected() {
        assert!(parse(&["--interval", "soon"]).is_err());
        assert!(parse(&["--interval", "0"]).is_err());
    }

    #[test]
    fn blank_branch_is_rejected() {
        assert!(parse(&["--branch", "  "]).is_err());
    }

    #[test]
    fn parses_duration_suffixes() {
        assert_eq!(parse_duration("45").unwrap(), Duration::from_secs(45));
        assert_eq!(parse_duration("90s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration(" 1h ").unwrap(), Duration::from_secs(3600));
        assert!(parse_duration("-5").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn overflowing_duration_is_rejected() {
        let err = parse_duration("18446744073709551615h").unwrap_err();
        assert!(err.to_string().contains("too large"));
        assert!(parse(&["--interval", "18446744073709551615m"]).is_err());
        assert_eq!(
            parse_duration("18446744073709551615").unwrap(),
            Duration::from_secs(u64::MAX)
        );
    }

    #[test]
    fn help_is_a_clap_error() {
        let err = parse(&["--help"]).unwrap_err();
        let clap_err = err.downcast_ref::<clap::Error>().unwrap();
        assert_eq!(clap_err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
