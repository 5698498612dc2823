use clap::{ArgAction, Args, Parser, Subcommand};
use q2_stats_config::Config;
use q2_stats_logger as logger;
use tracing_subscriber::EnvFilter;

mod commands;
mod help;

use commands::{config, plugin, run, task, version};

#[derive(Parser)]
#[command(name = "q2-stats")]
#[command(about = "Pairwise statistical tests for QIIME 2 distributions", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Increase verbosity (-v debug, -vv trace, -vvv child process output)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Emit structured log events as JSON on stderr
    #[arg(long, global = true)]
    pub log_json: bool,
}

impl GlobalOpts {
    fn verbosity(&self) -> u8 {
        if self.quiet {
            logger::QUIET
        } else {
            logger::NORMAL.saturating_add(self.verbose).min(logger::TRACE)
        }
    }

    fn filter_directive(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run a pairwise test on a distribution
    Run {
        #[command(subcommand)]
        action: Option<run::RunAction>,
    },
    /// Inspect, validate and register the plugin
    Plugin {
        #[command(subcommand)]
        command: plugin::PluginCommand,
    },
    /// Run a project build target
    Task(task::TaskArgs),
    /// Show the package version
    Version {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage user configuration
    Config {
        #[command(subcommand)]
        command: config::ConfigCommand,
    },
}

fn init_tracing(opts: &GlobalOpts) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(opts.filter_directive()))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    // A subscriber may already be installed when embedded; keep it.
    let _ = if opts.log_json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
}

/// Mirror console messages to the log file in the configured cache directory.
fn init_log_file() {
    let cache_dir = Config::load().unwrap_or_default().cache_dir();
    let path = logger::log_path_in(&cache_dir);
    if let Err(e) = logger::init_log_file(path.clone()) {
        tracing::debug!("file logging disabled, cannot open {}: {}", path.display(), e);
    }
}

fn main() {
    let cli = Cli::parse();
    logger::set_verbosity(cli.global.verbosity());
    init_tracing(&cli.global);
    init_log_file();

    let result = match cli.command {
        Commands::Run { action } => match action {
            Some(action) => run::handle_run(action, &cli.global),
            None => help::show_run_help(),
        },
        Commands::Plugin { command } => plugin::handle_plugin(command, &cli.global),
        Commands::Task(args) => match task::handle_task(args, &cli.global) {
            Ok(()) => Ok(()),
            Err(e) => {
                logger::error(&e.to_string());
                std::process::exit(e.exit_code());
            }
        },
        Commands::Version { json } => version::show_version(json),
        Commands::Config { command } => config::handle_config(command, &cli.global),
    };

    if let Err(e) = result {
        logger::error(&e);
        logger::debug(&format!("Log file: {}", logger::get_log_path_string()));
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_levels() {
        let quiet = GlobalOpts {
            quiet: true,
            ..Default::default()
        };
        assert_eq!(quiet.verbosity(), logger::QUIET);
        assert_eq!(quiet.filter_directive(), "error");

        let loud = GlobalOpts {
            verbose: 5,
            ..Default::default()
        };
        assert_eq!(loud.verbosity(), logger::TRACE);
        assert_eq!(loud.filter_directive(), "trace");
    }
}
