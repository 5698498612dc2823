//! Project build targets
//!
//! Each target is a fixed sequence of cargo invocations. The runner stops at
//! the first failing invocation and exits with its status.

use crate::GlobalOpts;
use clap::{Args, ValueEnum};
use q2_stats_config::Config;
use q2_stats_logger as logger;
use std::fmt;
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Clippy with warnings denied, then a rustfmt check
    Lint,
    /// Run the workspace tests
    Test,
    /// Run the workspace tests under cargo-llvm-cov
    TestCov,
    /// Install the q2-stats binary
    Install,
    /// Install an unoptimized build of the q2-stats binary
    Dev,
    /// Same as distclean
    Clean,
    /// No action
    Distclean,
    /// No action
    All,
}

#[derive(Args, Debug)]
pub struct TaskArgs {
    #[arg(value_enum, default_value_t = Target::All)]
    pub target: Target,

    /// Print the commands instead of running them
    #[arg(long)]
    pub dry_run: bool,
}

/// One cargo invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub args: &'static [&'static str],
}

impl Invocation {
    const fn cargo(args: &'static [&'static str]) -> Self {
        Self { args }
    }

    fn command_line(&self, program: &str) -> String {
        let mut line = program.to_string();
        for arg in self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("{0}")]
    ToolNotFound(String),

    #[error("Failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` failed with exit code {code}")]
    Failed { command: String, code: i32 },

    #[error("`{command}` was terminated by a signal")]
    Terminated { command: String },
}

impl TaskError {
    /// Process exit code to report for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            TaskError::ToolNotFound(_) => 127,
            TaskError::Failed { code, .. } => *code,
            TaskError::Spawn { .. } | TaskError::Terminated { .. } => 1,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .to_possible_value()
            .map(|v| v.get_name().to_string())
            .unwrap_or_else(|| format!("{:?}", self));
        f.write_str(&name)
    }
}

/// The invocation sequence a target stands for.
pub fn resolve(target: Target) -> Vec<Invocation> {
    match target {
        Target::Lint => vec![
            Invocation::cargo(&[
                "clippy",
                "--workspace",
                "--all-targets",
                "--",
                "-D",
                "warnings",
            ]),
            Invocation::cargo(&["fmt", "--all", "--", "--check"]),
        ],
        Target::Test => vec![Invocation::cargo(&["test", "--workspace"])],
        Target::TestCov => vec![Invocation::cargo(&["llvm-cov", "--workspace"])],
        Target::Install => vec![Invocation::cargo(&[
            "install",
            "--path",
            "crates/q2-stats-cli",
        ])],
        Target::Dev => vec![Invocation::cargo(&[
            "install",
            "--debug",
            "--path",
            "crates/q2-stats-cli",
        ])],
        Target::Clean => resolve(Target::Distclean),
        Target::Distclean | Target::All => Vec::new(),
    }
}

pub fn handle_task(args: TaskArgs, opts: &GlobalOpts) -> Result<(), TaskError> {
    let invocations = resolve(args.target);
    if invocations.is_empty() {
        logger::info(&format!("Target '{}' has nothing to do", args.target));
        return Ok(());
    }

    if args.dry_run {
        for invocation in &invocations {
            println!("{}", invocation.command_line("cargo"));
        }
        return Ok(());
    }

    let mut config = Config::load().unwrap_or_else(|e| {
        logger::warn(&format!("Ignoring unreadable config: {}", e));
        Config::default()
    });
    let cargo = config
        .ensure_cargo_path()
        .map_err(|e| TaskError::ToolNotFound(e.to_string()))?;

    for invocation in &invocations {
        run_invocation(&cargo, invocation, opts.quiet)?;
    }
    logger::success(&format!("Target '{}' finished", args.target));
    Ok(())
}

fn run_invocation(cargo: &str, invocation: &Invocation, quiet: bool) -> Result<(), TaskError> {
    let command = invocation.command_line(cargo);
    logger::step(&format!("Running: {}", command));

    let mut cmd = Command::new(cargo);
    cmd.args(invocation.args);

    let status = if quiet {
        let output = cmd
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| TaskError::Spawn {
                command: command.clone(),
                source,
            })?;
        logger::capture_output(&command, &output);
        output.status
    } else {
        cmd.status().map_err(|source| TaskError::Spawn {
            command: command.clone(),
            source,
        })?
    };

    check_status(command, status)
}

fn check_status(command: String, status: ExitStatus) -> Result<(), TaskError> {
    if status.success() {
        return Ok(());
    }
    match status.code() {
        Some(code) => Err(TaskError::Failed { command, code }),
        None => Err(TaskError::Terminated { command }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_TARGETS: [Target; 8] = [
        Target::Lint,
        Target::Test,
        Target::TestCov,
        Target::Install,
        Target::Dev,
        Target::Clean,
        Target::Distclean,
        Target::All,
    ];

    #[test]
    fn test_every_target_resolves_deterministically() {
        for target in ALL_TARGETS {
            assert_eq!(resolve(target), resolve(target), "{}", target);
            assert!(resolve(target).len() <= 2);
        }
    }

    #[test]
    fn test_lint_runs_linter_then_style_check() {
        let lint = resolve(Target::Lint);
        assert_eq!(lint.len(), 2);
        assert_eq!(lint[0].args[0], "clippy");
        assert_eq!(lint[1].command_line("cargo"), "cargo fmt --all -- --check");
    }

    #[test]
    fn test_clean_aliases_distclean() {
        assert_eq!(resolve(Target::Clean), resolve(Target::Distclean));
        assert!(resolve(Target::Distclean).is_empty());
        assert!(resolve(Target::All).is_empty());
    }

    #[test]
    fn test_dev_is_debug_install() {
        let dev = resolve(Target::Dev);
        assert_eq!(
            dev[0].command_line("cargo"),
            "cargo install --debug --path crates/q2-stats-cli"
        );
    }

    #[test]
    fn test_target_display_uses_cli_name() {
        assert_eq!(Target::TestCov.to_string(), "test-cov");
    }

    #[test]
    fn test_exit_codes() {
        let failed = TaskError::Failed {
            command: "cargo test".to_string(),
            code: 101,
        };
        assert_eq!(failed.exit_code(), 101);
        assert_eq!(TaskError::ToolNotFound("no cargo".to_string()).exit_code(), 127);
    }

    #[test]
    fn test_dry_run_does_not_need_cargo() {
        let args = TaskArgs {
            target: Target::Test,
            dry_run: true,
        };
        assert!(handle_task(args, &GlobalOpts::default()).is_ok());
    }
}
