//! CLI command definitions and handlers

mod analyze;
mod check;
mod corpus;
mod init;
mod validate;

use crate::config::{EngineConfig, TOML_CONFIG};
use crate::models::Method;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use std::path::{Path, PathBuf};

/// Parse a comma-separated method list (heuristic, weighted, dataset, external)
fn parse_method(s: &str) -> Result<Method, String> {
    Method::from_name(s).ok_or_else(|| {
        format!("'{s}' is not a method (expected heuristic, weighted, dataset or external)")
    })
}

/// Parse and validate a sample count (at least 1)
fn parse_samples(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("samples must be at least 1".to_string())
    } else {
        Ok(n)
    }
}

/// aicodechecker - Was this code written by a human or generated by AI?
///
/// Runs independent scoring methods over a snippet and merges them into one
/// verdict with a confidence and an explanation.
#[derive(Parser, Debug)]
#[command(name = "aicodechecker")]
#[command(
    version,
    about = "Classify source code as AI-generated or human-written",
    long_about = "aicodechecker extracts style, structure and repetition features from a code \
snippet and scores it with a heuristic table, a weighted feature model, an optional labeled \
corpus and an optional external language model, then merges the methods into one verdict.\n\n\
Supported languages: Python, JavaScript, Java, C, C++, C#, PHP, Ruby, Go, Rust, Swift, \
Kotlin, Scala, R, MATLAB",
    after_help = "\
Examples:
  aicodechecker analyze snippet.py                 Analyze a file
  cat snippet.js | aicodechecker analyze -         Analyze stdin
  aicodechecker analyze a.py --format json         JSON output for scripting
  aicodechecker check main.c --language c          Syntax sanity check only
  aicodechecker corpus data/corpus.jsonl           Summarize a labeled corpus
  aicodechecker validate --samples 200             Accuracy against the corpus"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Config file (default: aicodechecker.toml or .aicodecheckerrc.json, then user config)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write an aicodechecker.toml with example settings
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Classify one or more files (use - for stdin)
    #[command(after_help = "\
Examples:
  aicodechecker analyze snippet.py
  aicodechecker analyze snippet.py --language python --methods heuristic,weighted
  aicodechecker analyze a.py b.py --format json -o results.json")]
    Analyze {
        /// Files to analyze; `-` or nothing reads stdin
        files: Vec<PathBuf>,

        /// Declared language, or auto to sniff it
        #[arg(long, short = 'l', default_value = "auto")]
        language: String,

        /// Methods to run (default: all)
        #[arg(long, short = 'm', value_delimiter = ',', value_parser = parse_method)]
        methods: Option<Vec<Method>>,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,

        /// Single-line JSON
        #[arg(long)]
        compact: bool,

        /// Output file path (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Use the external model even if the config leaves it off
        #[arg(long)]
        external: bool,

        /// Corpus files to load for the dataset method (overrides config)
        #[arg(long, value_delimiter = ',')]
        corpus: Vec<PathBuf>,
    },

    /// Check that a file parses as its language (delimiters, strings, indentation)
    Check {
        /// File to check; `-` reads stdin
        file: PathBuf,

        /// Declared language, or auto to sniff it
        #[arg(long, short = 'l', default_value = "auto")]
        language: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load a labeled corpus and print its summary
    Corpus {
        /// Corpus files (default: the configured corpus)
        paths: Vec<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Measure accuracy on a deterministic sample of the corpus
    Validate {
        /// Corpus files (default: the configured corpus)
        #[arg(long, value_delimiter = ',')]
        corpus: Vec<PathBuf>,

        /// Number of samples to draw
        #[arg(long, default_value = "100", value_parser = parse_samples)]
        samples: usize,

        /// Sampling seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Also run the dataset method (circular against its own corpus)
        #[arg(long)]
        include_dataset: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Resolve the effective configuration for this invocation
fn load_config(explicit: Option<&Path>) -> Result<EngineConfig> {
    let config = match explicit {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => {
            let cwd = std::env::current_dir().context("Cannot determine current directory")?;
            EngineConfig::discover(&cwd)
        }
    };
    config.validate()?;
    Ok(config)
}

/// Stderr note when no corpus is configured, so the dataset method reads as
/// switched off rather than failing
fn dataset_note(config: &EngineConfig) -> Option<String> {
    (!config.corpus.enabled).then(|| {
        format!(
            "{} dataset method disabled (no [corpus] configured; pass --corpus or set paths in {})",
            style("note:").yellow().bold(),
            TOML_CONFIG
        )
    })
}

/// Read a file, or stdin for `-`
fn read_source(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::Read::read_to_string(&mut std::io::stdin(), &mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

pub fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Init { force } => init::run(Path::new("."), force),

        Commands::Analyze {
            files,
            language,
            methods,
            format,
            compact,
            output,
            external,
            corpus,
        } => {
            let mut config = load_config(config_path)?;
            if external {
                config.external.enabled = true;
            }
            if !corpus.is_empty() {
                config.corpus.paths = corpus;
                config.corpus.enabled = true;
            }
            analyze::run(
                &config,
                &files,
                &language,
                methods,
                &format,
                compact,
                output.as_deref(),
            )
        }

        Commands::Check {
            file,
            language,
            json,
        } => {
            let config = load_config(config_path)?;
            check::run(&config, &file, &language, json)
        }

        Commands::Corpus { paths, json } => {
            let config = load_config(config_path)?;
            corpus::run(&config, &paths, json)
        }

        Commands::Validate {
            corpus,
            samples,
            seed,
            include_dataset,
            json,
        } => {
            let config = load_config(config_path)?;
            validate::run(
                &config,
                &corpus,
                validate::Options {
                    samples,
                    seed,
                    include_dataset,
                    json,
                },
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_note_only_without_corpus() {
        let mut config = EngineConfig::default();
        let note = dataset_note(&config).unwrap();
        assert!(note.contains("dataset method disabled"));
        config.corpus.enabled = true;
        assert!(dataset_note(&config).is_none());
    }

    #[test]
    fn test_parse_method() {
        assert_eq!(parse_method("weighted"), Ok(Method::Weighted));
        assert_eq!(parse_method("LLM"), Ok(Method::External));
        assert!(parse_method("magic").is_err());
    }

    #[test]
    fn test_parse_samples() {
        assert_eq!(parse_samples("10"), Ok(10));
        assert!(parse_samples("0").is_err());
        assert!(parse_samples("many").is_err());
    }

    #[test]
    fn test_cli_parses_analyze() {
        let cli = Cli::try_parse_from([
            "aicodechecker",
            "analyze",
            "a.py",
            "--methods",
            "heuristic,weighted",
            "--format",
            "json",
        ])
        .unwrap();
        match cli.command {
            Commands::Analyze { files, methods, format, .. } => {
                assert_eq!(files, vec![PathBuf::from("a.py")]);
                assert_eq!(methods, Some(vec![Method::Heuristic, Method::Weighted]));
                assert_eq!(format, "json");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
