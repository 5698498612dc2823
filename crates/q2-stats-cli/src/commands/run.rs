use crate::commands::plugin::load_stats_plugin;
use crate::GlobalOpts;
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use q2_stats::table::{read_distribution, write_stats_table};
use q2_stats::{ActionArgs, Distribution, OutputFormat, StatsTable};
use q2_stats_config::Config;
use q2_stats_logger as logger;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

#[derive(Subcommand, Debug)]
pub enum RunAction {
    /// Mann-Whitney U test between independent groups
    #[command(name = "mann-whitney-u")]
    MannWhitneyU(MannWhitneyArgs),
    /// Wilcoxon signed-rank test between matched groups
    #[command(name = "wilcoxon-srt")]
    WilcoxonSrt(WilcoxonArgs),
}

#[derive(Args, Debug)]
pub struct TestOptions {
    /// two-sided, greater or less [default: from config, else two-sided]
    #[arg(long)]
    pub alternative: Option<String>,

    /// auto, exact or asymptotic [default: from config, else auto]
    #[arg(long)]
    pub p_val_approx: Option<String>,

    /// Write the table here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// jsonl or tsv [default: from --output extension, then config, else jsonl]
    #[arg(long)]
    pub format: Option<String>,
}

#[derive(Args, Debug)]
pub struct MannWhitneyArgs {
    /// Distribution table (.jsonl, or TSV otherwise)
    #[arg(long)]
    pub distribution: PathBuf,

    /// reference or all-pairwise
    #[arg(long)]
    pub compare: String,

    #[arg(long)]
    pub reference_group: Option<String>,

    /// Compare every group against the groups of this distribution
    #[arg(long)]
    pub against_each: Option<PathBuf>,

    #[command(flatten)]
    pub options: TestOptions,
}

#[derive(Args, Debug)]
pub struct WilcoxonArgs {
    /// Matched distribution table with a subject column
    #[arg(long)]
    pub distribution: PathBuf,

    /// baseline or consecutive
    #[arg(long)]
    pub compare: String,

    #[arg(long)]
    pub baseline_group: Option<String>,

    /// Report NaN instead of failing when two groups share no subjects
    #[arg(long)]
    pub ignore_empty_comparator: bool,

    #[command(flatten)]
    pub options: TestOptions,
}

pub fn handle_run(action: RunAction, _opts: &GlobalOpts) -> Result<(), String> {
    run_action(action).map_err(|e| format!("{:#}", e))
}

fn run_action(action: RunAction) -> Result<()> {
    let config = Config::load().unwrap_or_else(|e| {
        logger::warn(&format!("Ignoring unreadable config: {}", e));
        Config::default()
    });

    let (action_id, mut args, options) = match action {
        RunAction::MannWhitneyU(a) => {
            let mut args = ActionArgs::new()
                .with_input("distribution", read_input(&a.distribution)?)
                .with_parameter("compare", a.compare);
            if let Some(group) = a.reference_group {
                args = args.with_parameter("reference_group", group);
            }
            if let Some(path) = &a.against_each {
                args = args.with_input("against_each", read_input(path)?);
            }
            ("mann_whitney_u", args, a.options)
        }
        RunAction::WilcoxonSrt(a) => {
            let mut args = ActionArgs::new()
                .with_input("distribution", read_input(&a.distribution)?)
                .with_parameter("compare", a.compare)
                .with_parameter("ignore_empty_comparator", a.ignore_empty_comparator);
            if let Some(group) = a.baseline_group {
                args = args.with_parameter("baseline_group", group);
            }
            ("wilcoxon_srt", args, a.options)
        }
    };

    let format = resolve_format(&options, &config)?;
    args = args
        .with_parameter(
            "alternative",
            options
                .alternative
                .clone()
                .unwrap_or_else(|| config.alternative().to_string()),
        )
        .with_parameter(
            "p_val_approx",
            options
                .p_val_approx
                .clone()
                .unwrap_or_else(|| config.p_val_approx().to_string()),
        );

    let plugin = load_stats_plugin().map_err(anyhow::Error::msg)?;
    logger::step(&format!("Running {}", action_id));
    let pb = logger::spinner(&format!("Computing {}...", action_id));
    let result = plugin.invoke(action_id, args);
    pb.finish_and_clear();
    let table = result?;
    tracing::debug!(action = action_id, comparisons = table.len(), "action finished");

    write_output(&table, options.output.as_deref(), format)
}

fn read_input(path: &Path) -> Result<Distribution> {
    read_distribution(path)
        .with_context(|| format!("Failed to read distribution {}", path.display()))
}

/// Explicit flag, then the output file extension, then the config value.
fn resolve_format(options: &TestOptions, config: &Config) -> Result<OutputFormat> {
    if let Some(format) = &options.format {
        return Ok(format.parse()?);
    }
    let from_extension = options
        .output
        .as_deref()
        .and_then(|p| p.extension())
        .and_then(|e| e.to_str())
        .and_then(|e| e.parse::<OutputFormat>().ok());
    match from_extension {
        Some(format) => Ok(format),
        None => Ok(config.output_format().parse()?),
    }
}

fn write_output(table: &StatsTable, output: Option<&Path>, format: OutputFormat) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_stats_table(table, &mut BufWriter::new(file), format)?;
            logger::success(&format!(
                "Wrote {} comparison(s) to {}",
                table.len(),
                path.display()
            ));
        }
        None => {
            let stdout = io::stdout();
            write_stats_table(table, &mut stdout.lock(), format)?;
        }
    }
    Ok(())
}
