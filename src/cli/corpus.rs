//! Corpus command - load a labeled corpus and summarize it

use crate::config::EngineConfig;
use crate::corpus::{CorpusSummary, PatternStore};
use anyhow::{Context, Result};
use console::style;
use std::path::PathBuf;

/// Pick explicit paths, else the configured ones
pub(super) fn corpus_paths(config: &EngineConfig, paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let paths = if paths.is_empty() {
        config.corpus.paths.clone()
    } else {
        paths.to_vec()
    };
    if paths.is_empty() {
        anyhow::bail!("No corpus files given and none configured under [corpus] paths");
    }
    Ok(paths)
}

fn render_text(summary: &CorpusSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "\n{} {} samples from {} file(s)\n",
        style("Corpus").bold(),
        style(summary.samples).cyan(),
        summary.sources.len()
    ));
    for source in &summary.sources {
        out.push_str(&format!("  {}\n", style(source).dim()));
    }

    out.push_str(&format!("\n{}\n", style("By class").bold()));
    for (class, count) in &summary.by_class {
        out.push_str(&format!("  {class:<16} {count:>6}\n"));
    }
    out.push_str(&format!("\n{}\n", style("By language").bold()));
    for (lang, count) in &summary.by_language {
        out.push_str(&format!("  {lang:<16} {count:>6}\n"));
    }

    out.push_str(&format!(
        "\nMean length: {:.0} chars  Signatures: {}  Line shapes: {}\n",
        summary.mean_code_chars, summary.signatures, summary.shingles
    ));
    if let Some(dim) = summary.embedding_dim {
        out.push_str(&format!("Embedding dimension: {dim}\n"));
    }
    out.push_str(&format!("Digest: {}\n", style(&summary.digest).dim()));
    out
}

/// Run the corpus command
pub fn run(config: &EngineConfig, paths: &[PathBuf], json: bool) -> Result<()> {
    let paths = corpus_paths(config, paths)?;
    let store = PatternStore::load(&paths, config.normalization_bounds()?)
        .context("Failed to load corpus")?;
    let summary = store.summary();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", render_text(&summary));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corpus_paths_prefers_explicit() {
        let mut config = EngineConfig::default();
        config.corpus.paths = vec![PathBuf::from("configured.jsonl")];
        let explicit = [PathBuf::from("given.jsonl")];
        assert_eq!(corpus_paths(&config, &explicit).unwrap(), explicit.to_vec());
        assert_eq!(
            corpus_paths(&config, &[]).unwrap(),
            vec![PathBuf::from("configured.jsonl")]
        );
    }

    #[test]
    fn test_corpus_paths_requires_some() {
        assert!(corpus_paths(&EngineConfig::default(), &[]).is_err());
    }
}
