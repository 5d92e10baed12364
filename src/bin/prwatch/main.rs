mod desktop;
mod display;

use std::process::ExitCode;

use anyhow::Context;
use desktop::SystemDesktop;
use display::{Style, TerminalPresenter};
use prwatch::{
    GitCli, GitHub, PollController, Presenter, RunConfig, TokioScheduler, Vcs, get_github_token,
    parse_args, parse_repo_from_remote_url, resolve_branch,
};

const EXIT_FATAL: u8 = 1;

fn handle_clap_help_version(clap_err: &clap::Error) -> ExitCode {
    use clap::error::ErrorKind;
    match clap_err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            print!("{clap_err}");
            ExitCode::SUCCESS
        }
        _ => {
            eprint!("{clap_err}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn init_tracing(debug: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let default_level = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn fail(message: &str, remediation: &[String]) -> ExitCode {
    eprintln!("✘ {message}");
    for line in remediation {
        eprintln!("✘ {line}");
    }
    ExitCode::from(EXIT_FATAL)
}

async fn run(config: RunConfig) -> ExitCode {
    // Checked before touching git or the network.
    let token = match get_github_token() {
        Ok(token) => token,
        Err(err) => return fail(&err.to_string(), &err.remediation()),
    };

    let presenter = TerminalPresenter::new(Style::detect(), !config.once, config.debug);
    let vcs = GitCli;

    let branch = match resolve_branch(
        &vcs,
        &config.remote,
        config.branch_hint.as_deref(),
        &|message: &str| presenter.progress(message),
    )
    .await
    {
        Ok(branch) => branch,
        Err(err) => return fail(&err.to_string(), &err.remediation()),
    };

    let repo = match vcs
        .remote_url(&config.remote)
        .await
        .and_then(|url| parse_repo_from_remote_url(&url))
        .with_context(|| format!("Cannot tell which GitHub repository '{}' is", config.remote))
    {
        Ok(repo) => repo,
        Err(err) => {
            return fail(
                &format!("{err:#}"),
                &["Make sure the remote points at a GitHub repository".to_string()],
            );
        }
    };

    let forge = match GitHub::connect(token, repo, config.request_timeout) {
        Ok(forge) => forge,
        Err(err) => return fail(&format!("{err:#}"), &[]),
    };

    let outcome = PollController::new(
        branch,
        &config,
        &forge,
        &presenter,
        &SystemDesktop,
        &TokioScheduler,
    )
    .run()
    .await;

    ExitCode::from(outcome.exit_code())
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match parse_args(std::env::args_os()) {
        Ok(config) => config,
        Err(err) => {
            if let Some(clap_err) = err.downcast_ref::<clap::Error>() {
                return handle_clap_help_version(clap_err);
            }
            eprintln!("✘ {err:#}");
            return ExitCode::from(EXIT_FATAL);
        }
    };

    init_tracing(config.debug);
    run(config).await
}
