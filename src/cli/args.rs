use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::duplicates::KeepStrategy;

/// diskbroom: find and clear what is filling your disk
#[derive(Parser, Debug)]
#[command(
    name = "diskbroom",
    version,
    about = "Find junk, duplicates and large files, and clean them up",
    long_about = "diskbroom measures cache, log and leftover directories, finds duplicate\n\
                  and oversized files in your user folders, and removes what you pick.\n\
                  Deleted files go to the Trash when one is available.",
    after_help = "EXAMPLES:\n  \
        diskbroom scan                          Measure junk categories\n  \
        diskbroom scan --detailed --json        Every category and item as JSON\n  \
        diskbroom clean --dry-run               Preview the recommended cleanup\n  \
        diskbroom clean --categories xcode -y   Empty the Xcode junk locations\n  \
        diskbroom dup ~/Pictures --detailed     List duplicate photos\n  \
        diskbroom dup --clean --keep oldest -y  Keep the original of each group\n  \
        diskbroom large --threshold 1GB         Files of 1 GB or more\n  \
        diskbroom size ~/Library/Caches         Measure one directory"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to ~/.diskbroom/config.toml)
    #[arg(long, global = true, value_name = "FILE", env = "DISKBROOM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub format: OutputFormat,

    /// Shorthand for --format json
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Quiet mode, minimal output
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

impl Cli {
    /// Effective output format after `--json` / `--quiet`
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else if self.quiet {
            OutputFormat::Quiet
        } else {
            self.format.clone()
        }
    }

    /// Progress bars only make sense for a person watching human output
    pub fn show_progress(&self) -> bool {
        matches!(self.output_format(), OutputFormat::Human)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Measure junk categories (caches, logs, build data, leftovers)
    Scan {
        /// Show individual locations in each category
        #[arg(long)]
        detailed: bool,

        /// Select every location, not only the recommended ones
        #[arg(long)]
        all: bool,

        /// Sort categories
        #[arg(long, default_value = "size")]
        sort: CategorySort,
    },

    /// Remove junk: the recommended selection, or whole categories
    Clean {
        /// Only clean these categories (keys as shown by `scan --detailed`)
        #[arg(long, value_delimiter = ',')]
        categories: Option<Vec<String>>,

        /// Show what would be cleaned without touching anything
        #[arg(long)]
        dry_run: bool,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Find duplicate files
    Dup {
        /// Directories to scan (defaults to your user folders)
        paths: Vec<String>,

        /// Minimum file size to consider (in bytes)
        #[arg(long)]
        min_size: Option<u64>,

        /// Confirm matches with a full-content hash
        #[arg(long)]
        verify: bool,

        /// Show individual files in each group
        #[arg(long)]
        detailed: bool,

        /// Remove all but one file in every group
        #[arg(long)]
        clean: bool,

        /// Which copy survives --clean: first, newest, oldest or dir:<path>
        #[arg(long, default_value = "first", value_parser = parse_keep)]
        keep: KeepStrategy,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Find large files
    Large {
        /// Directories to scan (defaults to your user folders and ~/Library)
        paths: Vec<String>,

        /// Minimum size, e.g. 500MB or 2GB (defaults to the configured threshold)
        #[arg(long, value_parser = parse_size)]
        threshold: Option<u64>,

        /// Maximum number of files to list
        #[arg(long, default_value = "50")]
        limit: usize,

        /// Delete every file found
        #[arg(long)]
        clean: bool,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Measure a file or directory
    Size {
        /// Path to measure
        path: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Print the configuration file location
    Path,

    /// Reset to default configuration
    Reset,

    /// Create ~/.diskbroom and a default config
    Init,
}

#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Quiet,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CategorySort {
    Size,
    Name,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

fn parse_keep(s: &str) -> Result<KeepStrategy, String> {
    s.parse()
}

/// Human sizes ("500MB", "1.5 GiB") or plain byte counts
fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if let Ok(bytes) = s.parse::<u64>() {
        return Ok(bytes);
    }
    s.parse::<bytesize::ByteSize>()
        .map(|b| b.as_u64())
        .map_err(|e| format!("invalid size '{}': {}", s, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("1024"), Ok(1024));
        assert_eq!(parse_size("500MB"), Ok(500_000_000));
        assert_eq!(parse_size("1 GiB"), Ok(1_073_741_824));
        assert!(parse_size("lots").is_err());
    }

    #[test]
    fn test_dup_args() {
        let cli = Cli::try_parse_from([
            "diskbroom", "dup", "/a", "/b", "--clean", "--keep", "newest", "--json",
        ])
        .unwrap();
        assert_eq!(cli.output_format(), OutputFormat::Json);
        match cli.command {
            Commands::Dup {
                paths, clean, keep, ..
            } => {
                assert_eq!(paths, vec!["/a", "/b"]);
                assert!(clean);
                assert_eq!(keep, KeepStrategy::Newest);
            }
            other => panic!("parsed {:?}", other),
        }
    }

    #[test]
    fn test_clean_categories_split_on_comma() {
        let cli =
            Cli::try_parse_from(["diskbroom", "clean", "--categories", "xcode,browser"]).unwrap();
        match cli.command {
            Commands::Clean { categories, .. } => {
                assert_eq!(categories, Some(vec!["xcode".into(), "browser".into()]));
            }
            other => panic!("parsed {:?}", other),
        }
    }

    #[test]
    fn test_rejects_bad_keep_strategy() {
        assert!(Cli::try_parse_from(["diskbroom", "dup", "--keep", "largest"]).is_err());
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
