//! Command-line interface definition using clap.
//!
//! This module defines:
//! - [`Args`] - top-level arguments and global flags
//! - [`Command`] - the subcommands
//! - [`FilterArgs`], [`OutputArgs`], [`ParseArgs`] - argument groups shared by subcommands
//! - [`OutputFormat`] - output format as a clap value
//!
//! The argument groups convert into library configuration types, so the
//! binary only wires them together:
//!
//! ```rust
//! use clap::Parser;
//! use kakaopack::cli::{Args, Command};
//!
//! let args = Args::parse_from(["kakaopack", "parse", "chat.txt", "--after", "2024-01-01"]);
//! let Command::Parse { filter, .. } = args.command else { unreachable!() };
//! assert!(filter.to_config().unwrap().has_date_filter());
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::config::{ContinuationPolicy, DateFallback, ParserConfig};
use crate::core::filter::FilterConfig;
use crate::core::models::OutputConfig;
use crate::error::{KakaopackError, Result};

/// Database used when `--db` is not given.
pub const DEFAULT_DB_PATH: &str = "kakaopack.db";

/// Largest accepted `--gap`, one week.
pub const MAX_THREAD_GAP_MINUTES: i64 = 7 * 24 * 60;

/// Parse KakaoTalk chat exports and keep a de-duplicated history of them.
#[derive(Parser, Debug, Clone)]
#[command(name = "kakaopack")]
#[command(version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    kakaopack parse KakaoTalk_Chat.txt -o chat.csv
    kakaopack parse export.csv --format jsonl --after 2024-01-01
    kakaopack stats KakaoTalk_Chat.txt
    kakaopack import exports/*.txt
    kakaopack rooms
    kakaopack export 1 -o room1.csv --bom
    kakaopack delete-room 1")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// SQLite database for store commands
    #[arg(long, global = true, value_name = "PATH", default_value = DEFAULT_DB_PATH)]
    pub db: PathBuf,

    /// Log more (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Parse an export and write it as CSV, JSON or JSONL
    Parse {
        /// Path to the export file
        input: PathBuf,

        #[command(flatten)]
        parser: ParseArgs,

        #[command(flatten)]
        filter: FilterArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Print statistics for an export file or a stored room
    Stats {
        /// Path to the export file
        #[arg(required_unless_present = "room", conflicts_with = "room")]
        input: Option<PathBuf>,

        /// Use a stored room instead of a file
        #[arg(long, value_name = "ID")]
        room: Option<i64>,

        /// Silence (in minutes, at most one week) that starts a new conversation thread
        #[arg(
            long,
            value_name = "MINUTES",
            default_value_t = crate::stats::DEFAULT_THREAD_GAP_MINUTES,
            value_parser = clap::value_parser!(i64).range(1..=MAX_THREAD_GAP_MINUTES)
        )]
        gap: i64,

        /// Print the statistics as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        parser: ParseArgs,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Import export files into the database
    Import {
        /// Export files to import
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        parser: ParseArgs,
    },

    /// List stored rooms
    Rooms,

    /// List the files imported into a room
    Files {
        /// Room id
        room: i64,
    },

    /// Write a room's merged history to a file or stdout
    Export {
        /// Room id
        room: i64,

        #[command(flatten)]
        filter: FilterArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Delete a room with all its files and messages
    DeleteRoom {
        /// Room id
        room: i64,
    },

    /// Delete one imported file; messages another file also carried are kept
    DeleteFile {
        /// File id
        file: i64,
    },

    /// Show database totals
    Info,
}

/// Parser tuning flags.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct ParseArgs {
    /// Fewer recognized lines than this triggers the table fallback
    #[arg(long, value_name = "N")]
    pub min_rows: Option<usize>,

    /// Append unrecognized lines to the previous message instead of dropping them
    #[arg(long)]
    pub merge_continuations: bool,

    /// Date for messages before the first date header (YYYY-MM-DD, default today)
    #[arg(long, value_name = "DATE", conflicts_with = "skip_undated")]
    pub default_date: Option<String>,

    /// Drop messages before the first date header
    #[arg(long)]
    pub skip_undated: bool,
}

impl ParseArgs {
    /// Builds the parser configuration.
    ///
    /// # Errors
    ///
    /// Returns [`KakaopackError::InvalidDate`] for a malformed `--default-date`.
    pub fn to_config(&self) -> Result<ParserConfig> {
        let mut config = ParserConfig::new();
        if let Some(rows) = self.min_rows {
            config = config.with_min_line_rows(rows);
        }
        if self.merge_continuations {
            config = config.with_continuation(ContinuationPolicy::Merge);
        }
        if let Some(ref date) = self.default_date {
            config = config.with_date_fallback(DateFallback::Fixed(parse_cli_date(date)?));
        } else if self.skip_undated {
            config = config.with_date_fallback(DateFallback::Skip);
        }
        Ok(config)
    }
}

/// Message filter flags.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only messages on or after this day (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub after: Option<String>,

    /// Only messages on or before this day (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub before: Option<String>,

    /// Only messages from this author (repeatable)
    #[arg(long, value_name = "USER")]
    pub from: Vec<String>,

    /// Only messages containing one of these comma-separated keywords
    #[arg(long, value_name = "WORDS")]
    pub keywords: Option<String>,
}

impl FilterArgs {
    /// Builds the filter configuration.
    ///
    /// # Errors
    ///
    /// Returns [`KakaopackError::InvalidDate`] for malformed `--after`/`--before`.
    pub fn to_config(&self) -> Result<FilterConfig> {
        let mut config = FilterConfig::new();
        if let Some(ref after) = self.after {
            config = config.with_date_from(after)?;
        }
        if let Some(ref before) = self.before {
            config = config.with_date_to(before)?;
        }
        for author in &self.from {
            config = config.with_author(author.clone());
        }
        if let Some(ref keywords) = self.keywords {
            config = config.with_keywords_csv(keywords);
        }
        Ok(config)
    }
}

/// Output destination and format flags.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Output file (stdout when omitted)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Output format (default: from the output extension, else CSV)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Add a character-count column
    #[arg(long)]
    pub length: bool,

    /// Start CSV output with a UTF-8 BOM
    #[arg(long)]
    pub bom: bool,
}

impl OutputArgs {
    /// Resolves the output format: explicit flag, then output extension, then CSV.
    pub fn resolve_format(&self) -> crate::format::OutputFormat {
        self.format
            .map(Into::into)
            .or_else(|| {
                self.output
                    .as_deref()
                    .and_then(|path| crate::format::OutputFormat::from_path(path).ok())
            })
            .unwrap_or_default()
    }

    /// Builds the writer configuration.
    pub fn to_config(&self) -> OutputConfig {
        let mut config = OutputConfig::new();
        if self.length {
            config = config.with_length();
        }
        if self.bom {
            config = config.with_bom();
        }
        config
    }

    /// The output path, if writing to a file.
    pub fn path(&self) -> Option<&Path> {
        self.output.as_deref()
    }
}

/// Output format options.
///
/// - [`Csv`](OutputFormat::Csv) - spreadsheet friendly, optional BOM
/// - [`Json`](OutputFormat::Json) - one JSON array
/// - [`Jsonl`](OutputFormat::Jsonl) - one JSON object per line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
    #[value(alias = "ndjson")]
    Jsonl,
}

impl From<OutputFormat> for crate::format::OutputFormat {
    fn from(format: OutputFormat) -> crate::format::OutputFormat {
        match format {
            OutputFormat::Csv => crate::format::OutputFormat::Csv,
            OutputFormat::Json => crate::format::OutputFormat::Json,
            OutputFormat::Jsonl => crate::format::OutputFormat::Jsonl,
        }
    }
}

fn parse_cli_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| KakaopackError::invalid_date(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        let mut full = vec!["kakaopack"];
        full.extend_from_slice(args);
        Args::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_parse_subcommand_defaults() {
        let args = parse(&["parse", "chat.txt"]);
        assert_eq!(args.db, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(args.verbose, 0);
        let Command::Parse {
            input,
            parser,
            output,
            ..
        } = args.command
        else {
            panic!("expected parse");
        };
        assert_eq!(input, PathBuf::from("chat.txt"));
        assert_eq!(parser.to_config().unwrap().min_line_rows, 10);
        assert_eq!(output.resolve_format(), crate::format::OutputFormat::Csv);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = parse(&["rooms", "--db", "history.db", "-vv"]);
        assert_eq!(args.db, PathBuf::from("history.db"));
        assert_eq!(args.verbose, 2);
        assert!(matches!(args.command, Command::Rooms));
    }

    #[test]
    fn test_format_from_output_extension() {
        let args = parse(&["export", "3", "-o", "room.jsonl"]);
        let Command::Export { room, output, .. } = args.command else {
            panic!("expected export");
        };
        assert_eq!(room, 3);
        assert_eq!(output.resolve_format(), crate::format::OutputFormat::Jsonl);

        let explicit = OutputArgs {
            output: Some(PathBuf::from("room.jsonl")),
            format: Some(OutputFormat::Json),
            ..OutputArgs::default()
        };
        assert_eq!(explicit.resolve_format(), crate::format::OutputFormat::Json);
    }

    #[test]
    fn test_parse_args_to_config() {
        let args = ParseArgs {
            min_rows: Some(1),
            merge_continuations: true,
            default_date: Some("2024-01-20".into()),
            skip_undated: false,
        };
        let config = args.to_config().unwrap();
        assert_eq!(config.min_line_rows, 1);
        assert_eq!(config.continuation, ContinuationPolicy::Merge);
        assert_eq!(
            config.date_fallback,
            DateFallback::Fixed(NaiveDate::from_ymd_opt(2024, 1, 20).unwrap())
        );

        let bad = ParseArgs {
            default_date: Some("20/01/2024".into()),
            ..ParseArgs::default()
        };
        assert!(bad.to_config().unwrap_err().is_invalid_date());
    }

    #[test]
    fn test_filter_args_to_config() {
        let args = parse(&[
            "parse", "chat.txt", "--from", "철수", "--from", "영희", "--keywords", "점심,저녁",
        ]);
        let Command::Parse { filter, .. } = args.command else {
            panic!("expected parse");
        };
        let config = filter.to_config().unwrap();
        assert_eq!(config.authors, ["철수", "영희"]);
        assert_eq!(config.keywords, ["점심", "저녁"]);
    }

    #[test]
    fn test_stats_requires_input_or_room() {
        let full = ["kakaopack", "stats"];
        assert!(Args::try_parse_from(full).is_err());
        assert!(Args::try_parse_from(["kakaopack", "stats", "--room", "1"]).is_ok());
        assert!(Args::try_parse_from(["kakaopack", "stats", "a.txt", "--room", "1"]).is_err());
    }

    #[test]
    fn test_stats_gap_range() {
        let gap = |value: &str| {
            Args::try_parse_from(["kakaopack", "stats", "a.txt", "--gap", value]).map(|args| {
                match args.command {
                    Command::Stats { gap, .. } => gap,
                    _ => panic!("expected stats"),
                }
            })
        };
        assert_eq!(gap("45").unwrap(), 45);
        assert_eq!(gap("10080").unwrap(), MAX_THREAD_GAP_MINUTES);
        assert!(gap("0").is_err());
        assert!(gap("-5").is_err());
        assert!(gap("10081").is_err());
        assert!(gap("9223372036854775807").is_err());
    }

    #[test]
    fn test_import_requires_files() {
        assert!(Args::try_parse_from(["kakaopack", "import"]).is_err());
        let args = parse(&["import", "a.txt", "b.csv"]);
        let Command::Import { files, .. } = args.command else {
            panic!("expected import");
        };
        assert_eq!(files.len(), 2);
    }
}
