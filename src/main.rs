use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;
use tracing_appender::non_blocking::WorkerGuard;
use uuid::Uuid;

use diskbroom::cli::args::{CategorySort, Cli, Commands, CompletionShell, ConfigAction, OutputFormat};
use diskbroom::cli::{output, progress};
use diskbroom::common::config::Config;
use diskbroom::common::format;
use diskbroom::duplicates::{DuplicateSet, KeepStrategy};
use diskbroom::junk::SortMode;
use diskbroom::scanner::progress::{NoopObserver, ScanObserver};
use diskbroom::scanner::walker;
use diskbroom::scanner::LargeFileSet;
use diskbroom::Engine;

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    // Config commands must work even when the file on disk is broken
    if let Commands::Config { action } = &cli.command {
        let _guard = init_logging(cli.verbose, &Config::default());
        return cmd_config(&cli, action);
    }

    let config = load_config(&cli)?;
    let _guard = init_logging(cli.verbose, &config);

    match &cli.command {
        Commands::Scan {
            detailed,
            all,
            sort,
        } => cmd_scan(&cli, config, *detailed, *all, *sort),

        Commands::Clean {
            categories,
            dry_run,
            yes,
        } => cmd_clean(&cli, config, categories.as_deref(), *dry_run, *yes),

        Commands::Dup {
            paths,
            min_size,
            verify,
            detailed,
            clean,
            keep,
            yes,
        } => cmd_dup(
            &cli, config, paths, *min_size, *verify, *detailed, *clean, keep, *yes,
        ),

        Commands::Large {
            paths,
            threshold,
            limit,
            clean,
            yes,
        } => cmd_large(&cli, config, paths, *threshold, *limit, *clean, *yes),

        Commands::Size { path } => cmd_size(&cli, path),

        Commands::Config { action } => cmd_config(&cli, action),

        Commands::Completions { shell } => {
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            let shell = match shell {
                CompletionShell::Bash => clap_complete::Shell::Bash,
                CompletionShell::Zsh => clap_complete::Shell::Zsh,
                CompletionShell::Fish => clap_complete::Shell::Fish,
            };
            clap_complete::generate(shell, &mut cmd, "diskbroom", &mut std::io::stdout());
            Ok(())
        }
    }
}

// ─── Setup ────────────────────────────────────────────────────────────────────

fn config_path(cli: &Cli) -> PathBuf {
    cli.config.clone().unwrap_or_else(Config::config_path)
}

fn load_config(cli: &Cli) -> Result<Config> {
    Config::load_from(&config_path(cli))
}

/// stderr logging filtered by `--verbose` / `RUST_LOG`, plus an optional
/// daily log file. The returned guard flushes the file writer on drop.
fn init_logging(verbose: bool, config: &Config) -> Option<WorkerGuard> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("diskbroom=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let (file_layer, guard) = if config.log_to_file && Config::init_dirs().is_ok() {
        let appender = tracing_appender::rolling::daily(Config::logs_dir(), "diskbroom.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (
            Some(fmt::layer().with_writer(writer).with_ansi(false)),
            Some(guard),
        )
    } else {
        (None, None)
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .try_init();
    guard
}

fn expand_roots(paths: &[String]) -> Result<Option<Vec<PathBuf>>> {
    if paths.is_empty() {
        return Ok(None);
    }
    let roots: Vec<PathBuf> = paths.iter().map(|p| walker::expand_home(p)).collect();
    for root in &roots {
        if !root.exists() {
            bail!("Path does not exist: {}", root.display());
        }
    }
    Ok(Some(roots))
}

fn confirm(prompt: &str) -> Result<bool> {
    eprint!("\n  {} {} [y/N] ", "❓", prompt);
    std::io::stderr().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    if input.trim().eq_ignore_ascii_case("y") {
        Ok(true)
    } else {
        eprintln!("  {} Cancelled", "✗".red());
        Ok(false)
    }
}

// ─── Scan ─────────────────────────────────────────────────────────────────────

fn sort_mode(sort: CategorySort) -> SortMode {
    match sort {
        CategorySort::Size => SortMode::SizeDesc,
        CategorySort::Name => SortMode::NameAsc,
    }
}

fn run_junk_scan(cli: &Cli, engine: &Engine) -> diskbroom::junk::JunkAnalyzer {
    let mut analyzer = engine.junk_analyzer();
    let bar = progress::observer(cli.show_progress(), "Measuring junk locations...");
    let observer: &dyn ScanObserver = match &bar {
        Some(b) => b,
        None => &NoopObserver,
    };
    engine.analyze_junk(&mut analyzer, observer);
    if let Some(b) = &bar {
        b.finish(&format!("Measured {} categories", analyzer.categories().len()));
    }
    analyzer
}

fn cmd_scan(cli: &Cli, config: Config, detailed: bool, all: bool, sort: CategorySort) -> Result<()> {
    let engine = Engine::new(config)?;
    let start = Instant::now();
    let mut analyzer = run_junk_scan(cli, &engine);

    if all {
        let ids: Vec<Uuid> = analyzer.categories().iter().map(|c| c.id).collect();
        for id in ids {
            analyzer.toggle_category(id, true);
        }
    }

    let sort = sort_mode(sort);
    match cli.output_format() {
        OutputFormat::Human => {
            output::print_junk_results(&analyzer, sort, detailed, start.elapsed().as_secs_f64())
        }
        OutputFormat::Json => output::print_junk_json(&analyzer, sort),
        OutputFormat::Quiet => output::print_junk_quiet(&analyzer),
    }
    Ok(())
}

// ─── Clean ────────────────────────────────────────────────────────────────────

fn cmd_clean(
    cli: &Cli,
    config: Config,
    categories: Option<&[String]>,
    dry_run: bool,
    yes: bool,
) -> Result<()> {
    let engine = Engine::new(config)?;

    if let Some(keys) = categories {
        let known = engine.junk_analyzer();
        for key in keys {
            if !known.catalog().iter().any(|c| &c.key == key) {
                let all: Vec<&str> = known.catalog().iter().map(|c| c.key.as_str()).collect();
                bail!("Unknown category: {} (known: {})", key, all.join(", "));
            }
        }
    }

    let mut analyzer = run_junk_scan(cli, &engine);

    if let Some(keys) = categories {
        analyzer.deselect_all();
        for key in keys {
            if let Some(id) = analyzer.category_by_key(key).map(|c| c.id) {
                analyzer.toggle_category(id, true);
            }
        }
    }

    let paths = analyzer.selected_paths();
    let bytes = analyzer.selected_bytes();
    let format = cli.output_format();

    if paths.is_empty() {
        match format {
            OutputFormat::Json => output::print_json("clean", &diskbroom::cleaner::CleanReport::default()),
            OutputFormat::Quiet => println!("0 B  0  0"),
            OutputFormat::Human => println!("  {} Nothing to clean!", "✨"),
        }
        return Ok(());
    }

    if dry_run {
        match format {
            OutputFormat::Human => {
                output::print_clean_plan(&paths, bytes);
                println!(
                    "  {} Dry run — would free about {}. No files modified.",
                    "ℹ️",
                    format::format_size(bytes)
                );
            }
            OutputFormat::Json => output::print_json(
                "clean_plan",
                &serde_json::json!({ "paths": paths, "bytes": bytes }),
            ),
            OutputFormat::Quiet => println!("{}  {}", format::format_size(bytes), paths.len()),
        }
        return Ok(());
    }

    if format == OutputFormat::Human {
        output::print_clean_plan(&paths, bytes);
    }
    if !yes
        && !confirm(&format!(
            "Clean {} locations ({})?",
            paths.len(),
            format::format_size(bytes)
        ))?
    {
        return Ok(());
    }

    let report = engine.delete_batch(&paths);
    match format {
        OutputFormat::Human => output::print_clean_report(&report),
        OutputFormat::Json => output::print_json("clean", &report),
        OutputFormat::Quiet => output::print_clean_quiet(&report),
    }
    Ok(())
}

// ─── Dup ──────────────────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
fn cmd_dup(
    cli: &Cli,
    config: Config,
    paths: &[String],
    min_size: Option<u64>,
    verify: bool,
    detailed: bool,
    clean: bool,
    keep: &KeepStrategy,
    yes: bool,
) -> Result<()> {
    let roots = expand_roots(paths)?;
    let engine = Engine::new(config)?;

    let mut dup_config = engine.duplicate_config(roots);
    if let Some(min) = min_size {
        dup_config.min_size = min;
    }
    dup_config.verify |= verify;

    if cli.show_progress() {
        println!();
        println!("  {} Scanning for duplicates in:", "🔍");
        for root in &dup_config.roots {
            println!("    {} {}", "•".dimmed(), format::format_path(root).cyan());
        }
        println!();
    }

    let start = Instant::now();
    let bar = progress::observer(cli.show_progress(), "Collecting files...");
    let observer: &dyn ScanObserver = match &bar {
        Some(b) => b,
        None => &NoopObserver,
    };
    let mut set = DuplicateSet::new(engine.find_duplicates(&dup_config, observer));
    if let Some(b) = &bar {
        b.finish(&format!("{} duplicate groups", set.len()));
    }
    let secs = start.elapsed().as_secs_f64();
    let format = cli.output_format();

    let cleaning = clean && !set.is_empty();
    match format {
        OutputFormat::Human => output::print_dup_results(&set, detailed, secs),
        OutputFormat::Quiet => output::print_dup_quiet(&set),
        // A cleanup reports groups and outcome together below
        OutputFormat::Json if cleaning => {}
        OutputFormat::Json => output::print_json("duplicates", &set),
    }

    if !cleaning {
        return Ok(());
    }

    let found = set.clone();
    if !yes
        && !confirm(&format!(
            "Remove {} duplicate files ({})?",
            set.duplicate_count(),
            format::format_size(set.total_wasted())
        ))?
    {
        return Ok(());
    }

    let report = set.remove_extras(keep, engine.executor());
    match format {
        OutputFormat::Human => output::print_clean_report(&report),
        OutputFormat::Json => output::print_json(
            "duplicates",
            &serde_json::json!({ "groups": found.groups(), "cleanup": report }),
        ),
        OutputFormat::Quiet => output::print_clean_quiet(&report),
    }
    Ok(())
}

// ─── Large ────────────────────────────────────────────────────────────────────

fn cmd_large(
    cli: &Cli,
    config: Config,
    paths: &[String],
    threshold: Option<u64>,
    limit: usize,
    clean: bool,
    yes: bool,
) -> Result<()> {
    let roots = expand_roots(paths)?;
    let engine = Engine::new(config)?;

    let mut finder = engine.large_file_finder(roots);
    if let Some(t) = threshold {
        finder.set_threshold(t);
    }

    let start = Instant::now();
    let bar = progress::observer(cli.show_progress(), "Searching...");
    let observer: &dyn ScanObserver = match &bar {
        Some(b) => b,
        None => &NoopObserver,
    };
    let mut set = LargeFileSet::new(engine.find_large_files(&finder, observer));
    if let Some(b) = &bar {
        b.finish(&format!("{} large files", set.len()));
    }
    let format = cli.output_format();

    match format {
        OutputFormat::Human => output::print_large_results(
            set.files(),
            finder.threshold(),
            limit,
            start.elapsed().as_secs_f64(),
        ),
        OutputFormat::Json => output::print_json("large_files", &set),
        OutputFormat::Quiet => output::print_large_quiet(set.files()),
    }

    if !clean || set.is_empty() {
        return Ok(());
    }
    if !yes
        && !confirm(&format!(
            "Delete {} ({})?",
            format::format_count(set.len()),
            format::format_size(set.total_size())
        ))?
    {
        return Ok(());
    }

    let ids: Vec<Uuid> = set.files().iter().map(|f| f.id).collect();
    let freed = set.delete(&ids, engine.executor());
    match format {
        OutputFormat::Json => output::print_json(
            "large_files_cleanup",
            &serde_json::json!({ "bytes_freed": freed, "remaining": set.files() }),
        ),
        OutputFormat::Quiet => println!("{}  {}", format::format_size(freed), set.len()),
        OutputFormat::Human => {
            println!(
                "  {} Freed {}",
                "✓".green(),
                format::format_size_colored(freed)
            );
            if !set.is_empty() {
                println!(
                    "  {} {} could not be deleted (see log)",
                    "⚠".yellow(),
                    format::format_count(set.len())
                );
            }
            println!();
        }
    }
    Ok(())
}

// ─── Size ─────────────────────────────────────────────────────────────────────

fn cmd_size(cli: &Cli, path: &str) -> Result<()> {
    let path = walker::expand_home(path);
    if !path.exists() {
        bail!("Path does not exist: {}", path.display());
    }
    let bytes = walker::directory_size(&path);

    match cli.output_format() {
        OutputFormat::Human => output::print_size(&path, bytes),
        OutputFormat::Json => output::print_json(
            "size",
            &serde_json::json!({ "path": path, "bytes": bytes }),
        ),
        OutputFormat::Quiet => println!("{}", bytes),
    }
    Ok(())
}

// ─── Config ───────────────────────────────────────────────────────────────────

fn cmd_config(cli: &Cli, action: &ConfigAction) -> Result<()> {
    let path = config_path(cli);
    match action {
        ConfigAction::Init => {
            Config::init_dirs()?;
            if path.exists() {
                println!(
                    "  {} Config already exists at {}",
                    "ℹ️",
                    format::format_path(&path)
                );
            } else {
                Config::default().save_to(&path)?;
                println!(
                    "  {} diskbroom initialized at {}",
                    "✓".green(),
                    format::format_path(&path)
                );
            }
            Ok(())
        }
        ConfigAction::Show => {
            let config = Config::load_from(&path)?;
            let rendered = match cli.output_format() {
                OutputFormat::Json => serde_json::to_string_pretty(&config)?,
                _ => toml::to_string_pretty(&config).context("Failed to render config")?,
            };
            println!("{}", rendered);
            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigAction::Reset => {
            Config::default().save_to(&path)?;
            println!("  {} Configuration reset to defaults", "✓".green());
            Ok(())
        }
    }
}
