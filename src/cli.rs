use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::render::OutputFormat;

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Only show failures
    Quiet,
    /// Show rendered output and a summary
    #[default]
    Normal,
    /// Also show warnings and timings
    Verbose,
}

/// Read, validate and render DDMS metadata components
#[derive(Parser, Debug, Clone)]
#[command(name = "ddms-meta")]
#[command(about = "Validate and render DDMS metadata components across schema versions")]
#[command(version)]
pub struct Cli {
    /// Files or directories to process
    #[arg(required = true, help = "Files or directories containing DDMS components")]
    pub paths: Vec<PathBuf>,

    /// Output projection of each valid component
    #[arg(short = 'f', long = "format", value_enum, default_value_t = OutputFormat::Xml)]
    pub format: OutputFormat,

    /// Configuration file (TOML or JSON)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Directory holding controlled vocabulary tables
    #[arg(long = "vocabulary-dir")]
    pub vocabulary_dir: Option<PathBuf>,

    /// Report vocabulary misses on security markings as warnings
    #[arg(long = "cve-warnings")]
    pub cve_warnings: bool,

    /// Pretty-print JSON output
    #[arg(long = "pretty")]
    pub pretty: bool,

    /// Merge security attributes into the JSON object of their component
    #[arg(long = "inline-attributes")]
    pub inline_attributes: bool,

    /// Index repeated output names: 0 never, 1 when repeated, 2 always
    #[arg(long = "index-level", value_parser = clap::value_parser!(u8).range(0..=2))]
    pub index_level: Option<u8>,

    /// File extensions to process (comma-separated)
    #[arg(
        short = 'e',
        long = "extensions",
        default_value = "xml",
        help = "File extensions to process (e.g., 'xml,ddms')"
    )]
    pub extensions: String,

    /// Maximum directory depth to descend into
    #[arg(long = "max-depth")]
    pub max_depth: Option<usize>,

    /// Number of worker threads
    #[arg(
        short = 't',
        long = "threads",
        help = "Number of concurrent worker threads"
    )]
    pub threads: Option<usize>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", help = "Enable verbose output")]
    pub verbose: bool,

    /// Enable quiet mode (failures only)
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Quiet mode",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn get_extensions(&self) -> Vec<String> {
        self.extensions
            .split(',')
            .map(|s| s.trim().trim_start_matches('.').to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn validate(&self) -> Result<(), String> {
        for path in &self.paths {
            if !path.exists() {
                return Err(format!("Path does not exist: {}", path.display()));
            }
        }
        if let Some(threads) = self.threads
            && threads == 0
        {
            return Err("Number of threads must be greater than 0".to_string());
        }
        Ok(())
    }

    pub fn get_thread_count(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get)
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else if self.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }
}
