// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use elandoc::app_config::{Config, LogLevel};
use elandoc::elan::{validate_references, TierNode};
use elandoc::file_utils::{FileManager, FileType, EAF_EXTENSION};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a summary of an EAF file
    Inspect {
        /// EAF file to inspect
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check every cross reference in one EAF file or a directory of them
    Validate {
        /// EAF file or directory to validate
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },

    /// Re-export an EAF file in milliseconds with orphan time slots pruned
    Normalize {
        /// EAF file to normalize
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output path (default: <stem>.normalized.eaf next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Force overwrite of an existing output file
        #[arg(short, long)]
        force_overwrite: bool,

        /// Keep referential annotations in the output
        #[arg(long)]
        include_ref: bool,
    },

    /// Print the tier hierarchy of an EAF file
    Tree {
        /// EAF file to read
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Generate shell completions for elandoc
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// elandoc - ELAN annotation document tool
///
/// Reads, checks and rewrites ELAN Annotation Format (EAF) files.
#[derive(Parser, Debug)]
#[command(name = "elandoc")]
#[command(version)]
#[command(about = "ELAN annotation document tool")]
#[command(long_about = "elandoc reads, validates and rewrites ELAN Annotation Format (EAF) files.

EXAMPLES:
    elandoc inspect session.eaf                 # Summary of tiers and time slots
    elandoc inspect --json session.eaf          # Same, as JSON
    elandoc validate corpus/                    # Check every .eaf file below corpus/
    elandoc normalize session.eaf               # Writes session.normalized.eaf
    elandoc normalize -o out.eaf --include-ref session.eaf
    elandoc tree session.eaf                    # Tier hierarchy
    elandoc completions bash > elandoc.bash     # Generate bash completions

CONFIGURATION:
    Configuration is stored in elandoc.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "elandoc.json", global = true)]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,

    /// Report unresolved references while importing
    #[arg(long, global = true)]
    strict: bool,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let color = Self::color_for_level(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "{}{} {:<5} {}\x1B[0m",
                color,
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn main() -> ExitCode {
    // The logger accepts everything; the max level filters
    if let Err(e) = CustomLogger::init(LevelFilter::Trace) {
        eprintln!("Failed to initialize logger: {}", e);
    }
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Run a command; `Ok(false)` means it finished but found problems
fn run(cli: CommandLineOptions) -> Result<bool> {
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "elandoc", &mut std::io::stdout());
        return Ok(true);
    }

    if let Some(level) = &cli.log_level {
        log::set_max_level(LogLevel::from(level.clone()).to_level_filter());
    }

    let mut config = Config::load_or_create(&cli.config_path)?;
    if let Some(level) = cli.log_level {
        config.log_level = level.into();
    }
    if cli.strict {
        config.import.strict = true;
    }
    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.to_level_filter());

    match cli.command {
        Commands::Inspect { file, json } => inspect(&file, json, &config),
        Commands::Validate { path } => validate(&path, &config),
        Commands::Normalize {
            input,
            output,
            force_overwrite,
            include_ref,
        } => {
            if include_ref {
                config.export.include_reference_annotations = true;
            }
            normalize(&input, output, force_overwrite, &config)
        }
        Commands::Tree { file } => tree(&file, &config),
        Commands::Completions { .. } => Ok(true),
    }
}

fn inspect(file: &Path, json: bool, config: &Config) -> Result<bool> {
    let (doc, import) = FileManager::load_document(file, &config.import)?;
    let summary = doc.summary();

    if json {
        let out = serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?;
        println!("{}", out);
        return Ok(import.issues.is_empty());
    }

    println!("File:        {}", file.display());
    println!("Media URL:   {}", summary.media_url.as_deref().unwrap_or("-"));
    println!("Media type:  {}", summary.media_type.as_deref().unwrap_or("-"));
    println!(
        "Time slots:  {} ({} valid)",
        summary.time_slots, summary.valid_time_slots
    );
    println!(
        "Counters:    tier={} an={} ts={}",
        summary.counters.last_used_tier_id,
        summary.counters.last_used_annotation_id,
        summary.counters.last_used_time_slot_id
    );
    println!("Tiers:");
    for tier in &summary.tiers {
        println!(
            "  {:<24} {:<20} aligned={:<5} ref={:<5} parent={}",
            tier.id,
            tier.linguistic_type_ref,
            tier.alignable_annotations,
            tier.reference_annotations,
            tier.parent_ref.as_deref().unwrap_or("-")
        );
    }

    Ok(import.issues.is_empty())
}

fn validate(path: &Path, config: &Config) -> Result<bool> {
    let files = if path.is_dir() {
        FileManager::find_files(path, EAF_EXTENSION)?
    } else if FileManager::file_exists(path) {
        // A single file may carry any extension as long as it holds an EAF document
        if FileManager::detect_file_type(path)? != FileType::Eaf {
            error!("{:?} is not an ELAN annotation document", path);
            return Ok(false);
        }
        vec![path.to_path_buf()]
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", path));
    };

    if files.is_empty() {
        warn!("No .{} files found in {:?}", EAF_EXTENSION, path);
        return Ok(true);
    }

    let mut failed = 0;
    for file in &files {
        let doc = match FileManager::load_document(file, &config.import) {
            Ok((doc, _)) => doc,
            Err(e) => {
                error!("{:?}: {:#}", file, e);
                failed += 1;
                continue;
            }
        };

        let report = validate_references(&doc);
        if report.passed() {
            info!("OK {:?} ({} annotations)", file, report.annotations_checked);
        } else {
            failed += 1;
            warn!("{:?}: {} issue(s)", file, report.issues.len());
            for issue in &report.issues {
                println!("{}: {}", file.display(), issue);
            }
        }
    }

    info!("Validated {} file(s), {} with problems", files.len(), failed);
    Ok(failed == 0)
}

fn normalize(input: &Path, output: Option<PathBuf>, force_overwrite: bool, config: &Config) -> Result<bool> {
    if !FileManager::file_exists(input) {
        return Err(anyhow!("Input file does not exist: {:?}", input));
    }

    let output = output.unwrap_or_else(|| {
        FileManager::generate_output_path(
            input,
            input.parent().unwrap_or(Path::new(".")),
            "normalized",
            EAF_EXTENSION,
        )
    });

    if output.exists() && !force_overwrite {
        warn!("Output file already exists: {:?}. Use -f to force overwrite.", output);
        return Ok(false);
    }

    let (doc, import) = FileManager::load_document(input, &config.import)?;
    let dangling = doc.unwritten_time_slot_refs();
    for (annotation_id, time_slot_ref) in &dangling {
        warn!(
            "Annotation {} keeps reference to {}, which is not written to TIME_ORDER",
            annotation_id, time_slot_ref
        );
    }
    FileManager::save_document(&doc, &output, &config.export)?;

    let pruned = doc.time_slots().len() - doc.valid_time_slots().len();
    info!("Wrote {:?} ({} orphan time slots pruned)", output, pruned);
    Ok(import.issues.is_empty() && dangling.is_empty())
}

fn tree(file: &Path, config: &Config) -> Result<bool> {
    let (doc, _) = FileManager::load_document(file, &config.import)?;
    let forest = doc.tier_tree()?;
    for node in &forest {
        print_node(node, 0);
    }

    let reachable: usize = forest.iter().map(TierNode::tier_count).sum();
    if reachable < doc.tiers().len() {
        warn!(
            "{} tier(s) name a parent that does not exist",
            doc.tiers().len() - reachable
        );
    }
    Ok(true)
}

fn print_node(node: &TierNode<'_>, depth: usize) {
    println!(
        "{}{} [{}] ({} annotations)",
        "  ".repeat(depth),
        node.tier.id,
        node.tier.linguistic_type_ref,
        node.tier.annotations.len()
    );
    for child in &node.children {
        print_node(child, depth + 1);
    }
}
