mod logging;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand, ValueEnum};
use pattern_renamer_core::{
    app_paths, apply_plan, default_copy_folder, export_csv_file, list_files, load_config,
    load_preset, records_from_paths, save_preset, validate_template, ApplyMode,
    ApplyModeSetting, FileRecord, JsonPresetStore, PatternDescriptor, Preset, PresetStore,
    RenamePlan, RenameRule, RenameSession, ScanOptions, StdFileOps,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Parser)]
#[command(name = "pattern-renamer-cli")]
#[command(about = "Detects the shared pattern of a batch of filenames and renames them from a template")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the detected pattern of a batch
    Detect(InputArgs),
    /// Preview, export or apply a template-based rename
    Rename(RenameArgs),
    Preset(PresetArgs),
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
struct InputArgs {
    /// Files to rename, or a single folder to list
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// `--recursive` alone means true; `--recursive=false` overrides the config
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    recursive: Option<bool>,
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    include_hidden: Option<bool>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
}

#[derive(Debug, Args)]
struct RenameArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Template with @paramN, @date[N], @year[N], @month[N], @day[N] and @counter
    #[arg(long)]
    template: Option<String>,
    /// Find/replace rule applied after the template, as FIND=REPLACE (FIND may be a regex)
    #[arg(long = "rule")]
    rules: Vec<String>,
    /// Load template and rules from a saved preset
    #[arg(long)]
    preset: Option<String>,
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
    /// Folder for copy mode (default: renamed_files_<date> next to the sources)
    #[arg(long)]
    output_dir: Option<PathBuf>,
    #[arg(long, default_value_t = false)]
    apply: bool,
    #[arg(long)]
    export_csv: Option<PathBuf>,
    /// Keep duplicate target names instead of adding " (n)" suffixes
    #[arg(long, default_value_t = false)]
    no_dedupe: bool,
}

#[derive(Debug, Args)]
struct PresetArgs {
    #[command(subcommand)]
    action: PresetAction,
}

#[derive(Debug, Subcommand)]
enum PresetAction {
    Save {
        name: String,
        #[arg(long)]
        template: String,
        #[arg(long = "rule")]
        rules: Vec<String>,
    },
    List,
    Show {
        name: String,
    },
}

#[derive(Debug, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    Show,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Copy,
    Rename,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Detect(args) => cmd_detect(args),
        Commands::Rename(args) => cmd_rename(args),
        Commands::Preset(preset) => match preset.action {
            PresetAction::Save {
                name,
                template,
                rules,
            } => cmd_preset_save(&name, template, &rules),
            PresetAction::List => cmd_preset_list(),
            PresetAction::Show { name } => cmd_preset_show(&name),
        },
        Commands::Config(config) => match config.action {
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

fn cmd_detect(args: InputArgs) -> Result<()> {
    let mut session = RenameSession::new();
    session.add_files(collect_records(&args)?);

    let Some(pattern) = session.pattern() else {
        bail!("no files found, so no pattern could be detected");
    };

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(pattern)?),
        OutputFormat::Table => print_pattern(pattern),
    }
    Ok(())
}

fn cmd_rename(args: RenameArgs) -> Result<()> {
    let config = load_config()?;
    let mut session = RenameSession::new();
    session.resolve_collisions = !args.no_dedupe;

    let mut rules = config.rules.clone();
    session.template = config.template.clone();
    if let Some(name) = &args.preset {
        let store = JsonPresetStore::new(app_paths()?.presets_path);
        let preset = load_preset(&store, name)?
            .with_context(|| format!("no preset named \"{name}\""))?;
        session.template = preset.template;
        rules = preset.rules;
    }
    if let Some(template) = &args.template {
        session.template = template.clone();
    }
    rules.extend(parse_rules(&args.rules)?);
    for rule in rules {
        session.add_rule(rule);
    }
    validate_template(&session.template)?;

    session.add_files(collect_records(&args.input)?);
    let plan = session.plan()?;

    if !plan.pattern.is_uniform {
        eprintln!(
            "warning: {} of {} files ({:.1}%) have a different pattern; the dominant pattern is used",
            plan.pattern.minority_count,
            plan.pattern.file_count,
            plan.pattern.minority_ratio() * 100.0
        );
    }

    match args.input.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
        OutputFormat::Table => print_plan(&plan),
    }

    if let Some(path) = &args.export_csv {
        export_csv_file(&plan.results(), path)?;
        eprintln!("exported preview to {}", path.display());
    }

    if !args.apply {
        eprintln!("dry run: no files were changed. Pass --apply to apply.");
        return Ok(());
    }

    let mode = match args.mode.unwrap_or(match config.apply_mode {
        ApplyModeSetting::Copy => ModeArg::Copy,
        ApplyModeSetting::Rename => ModeArg::Rename,
    }) {
        ModeArg::Rename => ApplyMode::Rename,
        ModeArg::Copy => {
            let output_dir = match args.output_dir {
                Some(dir) => dir,
                None => default_copy_folder(&source_folder(&plan)?, Local::now().date_naive()),
            };
            ApplyMode::CopyToFolder { output_dir }
        }
    };
    debug!(?mode, "applying plan");

    let report = apply_plan(&plan, &mode, &StdFileOps)?;
    if let Some(dir) = &report.output_dir {
        eprintln!("output folder: {}", dir.display());
    }
    for failure in report.failures() {
        eprintln!(
            "failed: {} ({})",
            failure
                .old_path
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            failure.outcome.error.as_deref().unwrap_or("unknown error")
        );
    }
    eprintln!(
        "done: {} succeeded, {} failed, {} unchanged",
        report.succeeded, report.failed, report.skipped_unchanged
    );
    info!(succeeded = report.succeeded, failed = report.failed, "rename finished");

    if report.failed > 0 {
        bail!("{} file(s) could not be processed", report.failed);
    }
    Ok(())
}

fn cmd_preset_save(name: &str, template: String, rules: &[String]) -> Result<()> {
    validate_template(&template)?;
    let mut store = JsonPresetStore::new(app_paths()?.presets_path);
    let preset = Preset {
        template,
        rules: parse_rules(rules)?,
    };
    save_preset(&mut store, name, &preset)?;
    println!("saved preset \"{name}\" to {}", store.path().display());
    Ok(())
}

fn cmd_preset_list() -> Result<()> {
    let store = JsonPresetStore::new(app_paths()?.presets_path);
    for (name, data) in store.load_all()? {
        let template = data
            .get("template")
            .and_then(|v| v.as_str())
            .unwrap_or("-");
        println!("{name}\t{template}");
    }
    Ok(())
}

fn cmd_preset_show(name: &str) -> Result<()> {
    let store = JsonPresetStore::new(app_paths()?.presets_path);
    let preset =
        load_preset(&store, name)?.with_context(|| format!("no preset named \"{name}\""))?;
    println!("{}", serde_json::to_string_pretty(&preset)?);
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let paths = app_paths()?;
    println!("config file: {}", paths.config_path.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

/// A single folder argument is listed; anything else is taken as a file list.
fn collect_records(args: &InputArgs) -> Result<Vec<FileRecord>> {
    if let [single] = args.inputs.as_slice() {
        if single.is_dir() {
            let config = load_config()?;
            let options = ScanOptions {
                recursive: args.recursive.unwrap_or(config.recursive_default),
                include_hidden: args.include_hidden.unwrap_or(config.include_hidden_default),
            };
            let result = list_files(single, options)?;
            debug!(
                scanned = result.stats.scanned,
                hidden = result.stats.skipped_hidden,
                "listed folder"
            );
            return Ok(result.records);
        }
    }

    for path in &args.inputs {
        if path.is_dir() {
            bail!(
                "pass either one folder or a list of files: {}",
                path.display()
            );
        }
    }
    Ok(records_from_paths(&args.inputs))
}

fn parse_rules(raw: &[String]) -> Result<Vec<RenameRule>> {
    raw.iter()
        .map(|rule| {
            let (find, replace) = rule
                .split_once('=')
                .with_context(|| format!("rule must look like FIND=REPLACE: {rule}"))?;
            Ok(RenameRule::new(find, replace))
        })
        .collect()
}

fn source_folder(plan: &RenamePlan) -> Result<PathBuf> {
    plan.candidates
        .iter()
        .find_map(|c| c.record.path.as_deref())
        .map(|p| p.parent().unwrap_or_else(|| Path::new(".")).to_path_buf())
        .context("selected files have no folder to copy next to")
}

fn print_pattern(pattern: &PatternDescriptor) {
    if !pattern.is_uniform {
        println!(
            "warning: {} of {} files ({:.1}%) have a different pattern",
            pattern.minority_count,
            pattern.file_count,
            pattern.minority_ratio() * 100.0
        );
    }
    println!("placeholder\ttoken\tkind");
    for (idx, (label, token)) in pattern
        .placeholder_labels()
        .iter()
        .zip(&pattern.tokens)
        .enumerate()
    {
        let kind = if pattern.date_token_indexes.contains(&idx) {
            "date"
        } else if pattern.variable_indexes.contains(&idx) {
            "variable"
        } else {
            "fixed"
        };
        println!("{label}\t{token}\t{kind}");
    }
    println!(
        "\ndelimiter={:?} files={} minority={}",
        pattern.delimiter, pattern.file_count, pattern.minority_count
    );
}

fn print_plan(plan: &RenamePlan) {
    println!("original -> new");
    for candidate in &plan.candidates {
        println!("{} -> {}", candidate.record.name, candidate.new_name);
    }

    println!(
        "\nsummary: files={} changed={} unchanged={} collisions={} minority={}",
        plan.stats.files,
        plan.stats.changed,
        plan.stats.unchanged,
        plan.stats.collisions_resolved,
        plan.stats.minority_files
    );
}
