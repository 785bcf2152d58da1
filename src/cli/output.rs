use colored::*;
use serde::Serialize;
use std::path::Path;

use crate::cleaner::executor::CleanReport;
use crate::common::format::{self, format_path, format_size, format_size_colored};
use crate::duplicates::DuplicateSet;
use crate::junk::{JunkAnalyzer, JunkCategory, SortMode};
use crate::scanner::large::LargeFile;

/// Print any serializable result as pretty JSON, stamped with the time
pub fn print_json<T: Serialize>(kind: &str, value: &T) {
    let json = serde_json::json!({
        "kind": kind,
        "generated_at": chrono::Local::now().to_rfc3339(),
        "result": value,
    });
    match serde_json::to_string_pretty(&json) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("Error serializing results: {}", e),
    }
}

fn rule() {
    println!("{}", "─".repeat(60).dimmed());
}

// ─── Junk ─────────────────────────────────────────────────────────────────────

/// Print junk categories in human-readable format
pub fn print_junk_results(analyzer: &JunkAnalyzer, sort: SortMode, detailed: bool, secs: f64) {
    println!();
    println!("{}  diskbroom Junk Scan", "🧹");
    rule();
    println!(
        "  Scanned in {}  •  {} found  •  {} selected",
        format::format_duration(secs).cyan(),
        format_size_colored(analyzer.total()),
        format_size_colored(analyzer.selected_bytes())
    );
    rule();
    println!();

    if analyzer.categories().is_empty() {
        println!("  {} Nothing to clean!", "✨");
        println!();
        return;
    }

    for category in analyzer.sorted_categories(sort) {
        print_category(category, detailed);
    }

    rule();
    println!(
        "  {} Selected for cleanup: {}",
        "💾",
        format_size_colored(analyzer.selected_bytes())
    );
    println!(
        "  {} Run {} to preview, {} to clean",
        "💡",
        "diskbroom clean --dry-run".cyan(),
        "diskbroom clean".cyan()
    );
    println!();
}

fn checkbox(selected: bool) -> ColoredString {
    if selected {
        "●".green()
    } else {
        "○".dimmed()
    }
}

fn print_category(category: &JunkCategory, detailed: bool) {
    println!(
        "  {} {:<32} {:>10}  {}",
        checkbox(category.selected),
        category.name.bold(),
        format_size(category.size),
        category.key.dimmed()
    );

    if detailed {
        if !category.description.is_empty() {
            println!("      {} {}", "↳".dimmed(), category.description.dimmed());
        }
        for item in &category.items {
            let hint = if item.recommended { "" } else { " (review)" };
            println!(
                "      {} {:<28} {:>10}  {}{}",
                checkbox(item.selected),
                format::truncate(&item.name, 28),
                format_size(item.size),
                format_path(&item.path).dimmed(),
                hint.yellow()
            );
        }
        println!();
    }
}

pub fn print_junk_json(analyzer: &JunkAnalyzer, sort: SortMode) {
    let json = serde_json::json!({
        "total_bytes": analyzer.total(),
        "selected_bytes": analyzer.selected_bytes(),
        "categories": analyzer.sorted_categories(sort),
    });
    print_json("junk", &json);
}

pub fn print_junk_quiet(analyzer: &JunkAnalyzer) {
    println!(
        "{}  {}  {}",
        format_size(analyzer.total()),
        format_size(analyzer.selected_bytes()),
        analyzer.categories().len()
    );
}

/// Print what a cleanup would touch
pub fn print_clean_plan(paths: &[std::path::PathBuf], bytes: u64) {
    println!();
    println!(
        "  {} Cleanup plan — {} locations, {}",
        "🧹",
        paths.len().to_string().cyan(),
        format_size_colored(bytes)
    );
    for path in paths {
        println!("    {} {}", "•".dimmed(), format_path(path));
    }
    println!();
}

// ─── Cleanup ──────────────────────────────────────────────────────────────────

/// Print a clean operation report
pub fn print_clean_report(report: &CleanReport) {
    println!();
    println!(
        "  {} {} — {} removed ({} to Trash), {}",
        "✓".green(),
        "Cleanup complete".bold(),
        report.removed.to_string().cyan(),
        report.trashed,
        format_size_colored(report.bytes_freed),
    );

    if !report.failures.is_empty() {
        println!();
        println!("  {} {} skipped:", "⚠".yellow(), report.failures.len());
        for (i, err) in report.failures.iter().enumerate().take(10) {
            println!(
                "    {} {}",
                format!("{}.", i + 1).dimmed(),
                err.to_string().dimmed()
            );
        }
        if report.failures.len() > 10 {
            println!(
                "    ... and {} more",
                (report.failures.len() - 10).to_string().dimmed()
            );
        }
    }
    println!();
}

pub fn print_clean_quiet(report: &CleanReport) {
    println!(
        "{}  {}  {}",
        format_size(report.bytes_freed),
        report.removed,
        report.failures.len()
    );
}

// ─── Duplicates ───────────────────────────────────────────────────────────────

pub fn print_dup_results(set: &DuplicateSet, detailed: bool, secs: f64) {
    println!();
    println!("  {} diskbroom Duplicate Scan", "👯");
    rule();
    println!(
        "  Finished in {}",
        format::format_duration(secs).cyan()
    );
    rule();
    println!();

    if set.is_empty() {
        println!("  {} No duplicates found!", "✨");
        println!();
        return;
    }

    for (i, group) in set.groups().iter().enumerate() {
        println!(
            "    Group {} — {} copies of {}, {} wasted",
            (i + 1).to_string().bold(),
            group.paths.len(),
            format_size(group.size),
            format_size(group.wasted_bytes()),
        );

        if detailed {
            for (j, path) in group.paths.iter().enumerate() {
                let (label, shown) = if j == 0 {
                    ("keep →", format_path(path).green().to_string())
                } else {
                    ("  dup →", format_path(path).dimmed().to_string())
                };
                println!("      {} {}", label.dimmed(), shown);
            }
            println!();
        }
    }

    if !detailed {
        println!();
        println!("      Run with {} to see file paths", "--detailed".cyan());
        println!();
    }

    rule();
    println!(
        "  {} {} duplicate groups, {} total wasted space",
        "💾",
        set.len().to_string().cyan(),
        format_size_colored(set.total_wasted()),
    );
    println!(
        "  {} {} duplicate files that could be removed",
        "📄",
        set.duplicate_count().to_string().cyan(),
    );
    println!();
}

pub fn print_dup_quiet(set: &DuplicateSet) {
    println!(
        "{}  {}  {}",
        set.len(),
        set.duplicate_count(),
        format_size(set.total_wasted())
    );
}

// ─── Large files ──────────────────────────────────────────────────────────────

pub fn print_large_results(files: &[LargeFile], threshold: u64, limit: usize, secs: f64) {
    println!();
    println!(
        "  {} diskbroom Large Files (≥ {})",
        "📦",
        format_size(threshold)
    );
    rule();
    let total: u64 = files.iter().map(|f| f.size).sum();
    println!(
        "  {} in {}  •  {}",
        format::format_count(files.len()).cyan(),
        format::format_duration(secs).cyan(),
        format_size_colored(total)
    );
    rule();
    println!();

    if files.is_empty() {
        println!("  {} No large files found!", "✨");
        println!();
        return;
    }

    for file in files.iter().take(limit) {
        println!(
            "    {:>10}  {}",
            format_size(file.size),
            format::truncate(&format_path(&file.path), 70)
        );
    }
    if files.len() > limit {
        println!(
            "    ... and {} more (use {})",
            (files.len() - limit).to_string().dimmed(),
            "--limit".cyan()
        );
    }
    println!();
}

pub fn print_large_quiet(files: &[LargeFile]) {
    let total: u64 = files.iter().map(|f| f.size).sum();
    println!("{}  {}", files.len(), format_size(total));
}

// ─── Size ─────────────────────────────────────────────────────────────────────

pub fn print_size(path: &Path, bytes: u64) {
    println!(
        "  {} {}  {}",
        "📁",
        format_size_colored(bytes),
        format_path(path)
    );
}
