//! Command dispatch

use std::io::{self, Write};
use std::sync::mpsc;
use std::sync::Arc;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::{parse_options, HierarchyService, Options};
use crate::cli::args::{Cli, Commands, RunArgs};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::infrastructure::{Agent, InfraError, ManifestSource};

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Show { run }) => cmd_show(run),
        Some(Commands::Watch { run }) => cmd_watch(run),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            generate(*shell, &mut cmd, "loadertree", &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::Usage(
            "no command given, try 'loadertree --help'".to_string(),
        )),
    }
}

/// Parses the option string, reports bad tokens to `err`, applies flag
/// overrides.
pub fn resolve_options(run: &RunArgs, err: &mut dyn Write) -> CliResult<Options> {
    let report = parse_options(run.options.as_deref());
    report
        .write_errors(err)
        .map_err(|e| InfraError::io("report option errors", e))?;

    let mut options = report.options;
    if let Some(max_packages) = run.max_packages {
        options.max_packages = max_packages;
    }
    if let Some(every) = run.every {
        options.every_n_seconds = every;
    }
    debug!("effective options: {:?}", options);
    Ok(options)
}

/// Channel receiving one message per termination signal.
///
/// With the `termination` feature of `ctrlc` this covers SIGINT, SIGTERM and
/// SIGHUP, so a service manager stopping the process still gets the final
/// iteration. Can be installed once per process.
pub fn shutdown_signals() -> CliResult<mpsc::Receiver<()>> {
    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .map_err(|e| InfraError::Signal {
        message: e.to_string(),
    })?;
    Ok(rx)
}

fn service_for(run: &RunArgs) -> HierarchyService {
    let source = Arc::new(ManifestSource::new(run.manifest.clone()));
    HierarchyService::new(source, Box::new(io::stdout())).with_style(run.style.into())
}

#[instrument(level = "debug")]
fn cmd_show(run: &RunArgs) -> CliResult<()> {
    let options = resolve_options(run, &mut io::stderr())?;
    let mut service = service_for(run);
    service.run_iteration(options.max_packages)?;
    Ok(())
}

#[instrument(level = "debug")]
fn cmd_watch(run: &RunArgs) -> CliResult<()> {
    let options = resolve_options(run, &mut io::stderr())?;
    if !run.manifest.exists() {
        output::warning(&format!(
            "manifest {} does not exist yet",
            run.manifest.display()
        ));
    }

    let rx = shutdown_signals()?;

    let agent = Agent::start(options, service_for(run))?;
    if agent.is_periodic() {
        output::header(&format!(
            "watching every {}s, Ctrl-C or SIGTERM for the final iteration",
            options.every_n_seconds
        ));
    }

    // sender dropped means no more signals can arrive; shut down either way
    let _ = rx.recv();
    agent.shutdown()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::options::USAGE;
    use crate::cli::args::StyleArg;
    use std::path::PathBuf;

    fn run_args(options: Option<&str>) -> RunArgs {
        RunArgs {
            manifest: PathBuf::from("runtime.toml"),
            options: options.map(str::to_string),
            max_packages: None,
            every: None,
            style: StyleArg::Indented,
        }
    }

    #[test]
    fn given_bad_tokens_when_resolving_then_same_report_as_agent() {
        let mut err = Vec::new();

        let options = resolve_options(&run_args(Some("foo=1,every=2")), &mut err).unwrap();

        assert_eq!(
            String::from_utf8(err).unwrap(),
            format!("Invalid argument: foo=1\n{}\n", USAGE)
        );
        assert_eq!(options.every_n_seconds, 2);
    }

    #[test]
    fn given_flags_when_resolving_then_override_option_string() {
        let mut run = run_args(Some("maxPackages=3,every=10"));
        run.max_packages = Some(1);
        let mut err = Vec::new();

        let options = resolve_options(&run, &mut err).unwrap();

        assert!(err.is_empty());
        assert_eq!(options.max_packages, 1);
        assert_eq!(options.every_n_seconds, 10);
    }
}
