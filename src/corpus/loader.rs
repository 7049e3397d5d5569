//! Corpus file loading and validation
//!
//! A corpus file is JSON Lines (one object per line), a JSON array of
//! objects, or a `.csv` table with a header row. The fields are:
//!
//! ```text
//! { "code": "...", "label": "ai" | "human" | 0 | 1 | "<known generator>",
//!   "generator": "gemini", "language": "python", "embedding": [0.1, ...] }
//! ```
//!
//! Column names are matched case-insensitively with a few aliases
//! (`source` for `code`, `class` for `label`, `model` for `generator`). A CSV
//! embedding cell holds a JSON array.
//!
//! `code` and `label` are required. Labels that name neither side nor a known
//! generator load as `unknown` and never vote. Any violation fails the whole
//! load and names the file and row.

use crate::error::{EngineError, EngineResult};
use crate::features::language;
use crate::models::{Language, OriginClass};
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{debug, warn};

/// One validated reference sample
#[derive(Debug, Clone)]
pub struct CorpusSample {
    pub code: String,
    pub class: OriginClass,
    pub language: Language,
    pub embedding: Option<Vec<f64>>,
}

const CODE_COLUMNS: &[&str] = &["code", "source", "content", "snippet"];
const LABEL_COLUMNS: &[&str] = &["label", "class", "target", "is_ai"];
const GENERATOR_COLUMNS: &[&str] = &["generator", "model"];
const LANGUAGE_COLUMNS: &[&str] = &["language", "lang"];
const EMBEDDING_COLUMNS: &[&str] = &["embedding"];

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(default, alias = "source", alias = "content", alias = "snippet")]
    code: Option<String>,
    #[serde(default, alias = "class", alias = "target", alias = "is_ai")]
    label: Option<Value>,
    #[serde(default, alias = "model")]
    generator: Option<String>,
    #[serde(default, alias = "lang")]
    language: Option<String>,
    #[serde(default)]
    embedding: Option<Vec<Value>>,
}

/// Header positions of a CSV corpus
#[derive(Debug, Clone, Copy)]
struct CsvColumns {
    code: usize,
    label: usize,
    generator: Option<usize>,
    language: Option<usize>,
    embedding: Option<usize>,
}

impl CsvColumns {
    fn infer(path: &Path, headers: &csv::StringRecord) -> EngineResult<Self> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.contains(&h.trim().to_lowercase().as_str()))
        };
        let require = |names: &[&str], what: &str| {
            find(names).ok_or_else(|| {
                EngineError::corpus(
                    path,
                    format!("no {what} column (expected one of: {})", names.join(", ")),
                )
            })
        };

        Ok(Self {
            code: require(CODE_COLUMNS, "code")?,
            label: require(LABEL_COLUMNS, "label")?,
            generator: find(GENERATOR_COLUMNS),
            language: find(LANGUAGE_COLUMNS),
            embedding: find(EMBEDDING_COLUMNS),
        })
    }

    fn row(&self, path: &Path, row_no: usize, record: &csv::StringRecord) -> EngineResult<RawRow> {
        let cell = |i: usize| {
            record
                .get(i)
                .filter(|c| !c.trim().is_empty())
                .map(str::to_string)
        };

        let embedding = match self.embedding.and_then(cell) {
            None => None,
            Some(text) => Some(serde_json::from_str::<Vec<Value>>(&text).map_err(|e| {
                EngineError::corpus(
                    path,
                    format!("row {row_no}: embedding is not a JSON array: {e}"),
                )
            })?),
        };

        Ok(RawRow {
            code: cell(self.code),
            label: cell(self.label).map(Value::String),
            generator: self.generator.and_then(cell),
            language: self.language.and_then(cell),
            embedding,
        })
    }
}

/// A parsed corpus file
#[derive(Debug)]
pub struct LoadedFile {
    pub samples: Vec<CorpusSample>,
    /// SHA-256 of the raw file bytes
    pub digest: [u8; 32],
}

/// Generator families recognized when they appear directly as a label.
/// A version suffix is allowed, so `gpt-4o` and `llama3` both count.
const KNOWN_GENERATORS: &[&str] = &[
    "chatgpt",
    "claude",
    "codellama",
    "codestral",
    "copilot",
    "deepseek",
    "gemini",
    "gpt",
    "llama",
    "mistral",
    "phi",
    "qwen",
    "starcoder",
];

fn is_known_generator(label: &str) -> bool {
    KNOWN_GENERATORS.iter().any(|g| {
        label.strip_prefix(g).is_some_and(|rest| {
            rest.is_empty() || !rest.starts_with(|c: char| c.is_ascii_alphabetic())
        })
    })
}

/// Map a raw label (and optional generator) to an origin class.
/// Returns `None` for an empty label; anything unrecognized is `Unknown`.
pub fn coerce_label(label: &str, generator: Option<&str>) -> Option<OriginClass> {
    let label = label.trim().to_lowercase();
    let generator = generator
        .map(|g| g.trim().to_lowercase())
        .filter(|g| !g.is_empty());

    match label.as_str() {
        "" => None,
        "0" | "human" | "manual" | "human-written" | "false" => Some(OriginClass::Human),
        "1" | "ai" | "llm" | "generated" | "machine" | "ai-generated" | "true" => {
            Some(generator.map_or_else(OriginClass::generic_ai, OriginClass::Generator))
        }
        known if is_known_generator(known) => Some(OriginClass::Generator(known.to_string())),
        _ => Some(OriginClass::Unknown),
    }
}

fn label_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn validate_row(path: &Path, row_no: usize, row: RawRow) -> EngineResult<CorpusSample> {
    let fail = |msg: String| EngineError::corpus(path, format!("row {row_no}: {msg}"));

    let code = row
        .code
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| fail("missing or empty `code`".to_string()))?;

    let class = row
        .label
        .as_ref()
        .and_then(label_text)
        .and_then(|l| coerce_label(&l, row.generator.as_deref()))
        .ok_or_else(|| fail("missing or empty `label`".to_string()))?;

    let embedding = match row.embedding {
        None => None,
        Some(values) => {
            let mut out = Vec::with_capacity(values.len());
            for v in &values {
                match v.as_f64() {
                    Some(x) if x.is_finite() => out.push(x),
                    _ => return Err(fail(format!("embedding value {v} is not a finite number"))),
                }
            }
            if out.is_empty() {
                return Err(fail("embedding is empty".to_string()));
            }
            Some(out)
        }
    };

    let language = match row.language.as_deref().and_then(Language::from_tag) {
        Some(lang) => lang,
        None => language::sniff(&code),
    };

    Ok(CorpusSample {
        code,
        class,
        language,
        embedding,
    })
}

/// Rows are numbered by their line in the file, header included
fn parse_csv(path: &Path, content: &str) -> EngineResult<Vec<(usize, RawRow)>> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new().from_reader(content.as_bytes());
    let headers = reader
        .headers()
        .map_err(|e| EngineError::corpus(path, format!("invalid CSV header: {e}")))?
        .clone();
    let columns = CsvColumns::infer(path, &headers)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| EngineError::corpus(path, format!("invalid CSV: {e}")))?;
        let row_no = record
            .position()
            .map_or(rows.len() + 2, |p| p.line() as usize);
        rows.push((row_no, columns.row(path, row_no, &record)?));
    }
    Ok(rows)
}

fn has_extension(path: &Path, wanted: &str) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted))
}

fn parse_rows(path: &Path, content: &str) -> EngineResult<Vec<(usize, RawRow)>> {
    if has_extension(path, "csv") {
        return parse_csv(path, content);
    }

    let is_array = has_extension(path, "json") || content.trim_start().starts_with('[');

    if is_array {
        let rows: Vec<RawRow> = serde_json::from_str(content)
            .map_err(|e| EngineError::corpus(path, format!("invalid JSON array: {e}")))?;
        return Ok(rows.into_iter().enumerate().map(|(i, r)| (i + 1, r)).collect());
    }

    let mut rows = Vec::new();
    for (i, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let row: RawRow = serde_json::from_str(line)
            .map_err(|e| EngineError::corpus(path, format!("row {}: {e}", i + 1)))?;
        rows.push((i + 1, row));
    }
    Ok(rows)
}

/// Read, parse and validate one corpus file
pub fn load_file(path: &Path) -> EngineResult<LoadedFile> {
    let bytes = std::fs::read(path).map_err(|e| EngineError::corpus(path, e.to_string()))?;
    let digest: [u8; 32] = Sha256::digest(&bytes).into();
    let content = String::from_utf8(bytes)
        .map_err(|_| EngineError::corpus(path, "file is not valid UTF-8"))?;

    let rows = parse_rows(path, &content)?;
    if rows.is_empty() {
        return Err(EngineError::corpus(path, "corpus contains no samples"));
    }

    let samples = rows
        .into_iter()
        .map(|(n, row)| validate_row(path, n, row))
        .collect::<EngineResult<Vec<_>>>()?;

    let unknown = samples.iter().filter(|s| !s.class.votes()).count();
    if unknown > 0 {
        warn!(
            "{}: {} row(s) with unrecognized labels load as unknown",
            path.display(),
            unknown
        );
    }
    debug!("Parsed {} samples from {}", samples.len(), path.display());
    Ok(LoadedFile { samples, digest })
}

/// Embedding dimension shared by every sample that has one.
/// Mixed dimensions are a corpus error.
pub fn embedding_dimension(path: &Path, samples: &[CorpusSample]) -> EngineResult<Option<usize>> {
    let mut dim: Option<usize> = None;
    for (i, s) in samples.iter().enumerate() {
        let Some(e) = &s.embedding else { continue };
        match dim {
            None => dim = Some(e.len()),
            Some(d) if d != e.len() => {
                return Err(EngineError::corpus(
                    path,
                    format!(
                        "sample {}: embedding has {} dimensions, expected {d}",
                        i + 1,
                        e.len()
                    ),
                ))
            }
            Some(_) => {}
        }
    }
    Ok(dim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp(name: &str, content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn test_coerce_label() {
        assert_eq!(coerce_label("1", None), Some(OriginClass::generic_ai()));
        assert_eq!(coerce_label("LLM", None), Some(OriginClass::generic_ai()));
        assert_eq!(coerce_label("Human", None), Some(OriginClass::Human));
        assert_eq!(coerce_label("manual", Some("gemini")), Some(OriginClass::Human));
        assert_eq!(
            coerce_label("ai", Some("Gemini")),
            Some(OriginClass::Generator("gemini".into()))
        );
        assert_eq!(
            coerce_label("codestral", None),
            Some(OriginClass::Generator("codestral".into()))
        );
        assert_eq!(
            coerce_label("GPT-4o", None),
            Some(OriginClass::Generator("gpt-4o".into()))
        );
        assert_eq!(coerce_label("  ", None), None);
    }

    #[test]
    fn test_unrecognized_label_is_unknown() {
        assert_eq!(coerce_label("unknown", None), Some(OriginClass::Unknown));
        assert_eq!(coerce_label("Unknown", Some("gemini")), Some(OriginClass::Unknown));
        assert_eq!(coerce_label("2", None), Some(OriginClass::Unknown));
        assert_eq!(coerce_label("gptzero-flagged", None), Some(OriginClass::Unknown));
        assert_eq!(coerce_label("physics", None), Some(OriginClass::Unknown));

        let (_dir, path) = write_tmp(
            "c.jsonl",
            "{\"code\": \"x = 1\", \"label\": \"unknown\"}\n{\"code\": \"y = 2\", \"label\": 2}\n",
        );
        let loaded = load_file(&path).unwrap();
        assert!(loaded.samples.iter().all(|s| s.class == OriginClass::Unknown));
        assert!(loaded.samples.iter().all(|s| !s.class.is_ai()));
    }

    #[test]
    fn test_load_jsonl() {
        let (_dir, path) = write_tmp(
            "c.jsonl",
            "{\"code\": \"def f():\\n    return 1\\n\", \"label\": 1, \"language\": \"python\"}\n\n{\"code\": \"x=1\", \"label\": \"human\"}\n",
        );
        let loaded = load_file(&path).unwrap();
        assert_eq!(loaded.samples.len(), 2);
        assert!(loaded.samples[0].class.is_ai());
        assert_eq!(loaded.samples[0].language, Language::Python);
        assert_eq!(loaded.samples[1].class, OriginClass::Human);
    }

    #[test]
    fn test_load_json_array() {
        let (_dir, path) = write_tmp(
            "c.json",
            r#"[{"code": "int x;", "label": "0", "embedding": [0.5, 1.0]}]"#,
        );
        let loaded = load_file(&path).unwrap();
        assert_eq!(loaded.samples[0].embedding.as_deref(), Some(&[0.5, 1.0][..]));
    }

    #[test]
    fn test_load_csv_infers_columns() {
        let (_dir, path) = write_tmp(
            "c.csv",
            "id,Source,class,model,lang\n\
             0,\"def f():\n    return 1\n\",ai,Gemini,python\n\
             1,x=1,human,,\n\
             2,\"int main() { return 0; }\",2,,c\n",
        );
        let loaded = load_file(&path).unwrap();
        assert_eq!(loaded.samples.len(), 3);
        assert_eq!(loaded.samples[0].code, "def f():\n    return 1\n");
        assert_eq!(loaded.samples[0].class, OriginClass::Generator("gemini".into()));
        assert_eq!(loaded.samples[0].language, Language::Python);
        assert_eq!(loaded.samples[1].class, OriginClass::Human);
        assert_eq!(loaded.samples[2].class, OriginClass::Unknown);
        assert_eq!(loaded.samples[2].language, Language::C);
    }

    #[test]
    fn test_load_csv_embedding_cell() {
        let (_dir, path) = write_tmp(
            "c.csv",
            "code,label,embedding\nx = 1,0,\"[0.25, 0.5]\"\n",
        );
        let loaded = load_file(&path).unwrap();
        assert_eq!(loaded.samples[0].embedding.as_deref(), Some(&[0.25, 0.5][..]));

        let (_dir, path) = write_tmp("c.csv", "code,label,embedding\nx = 1,0,oops\n");
        let err = load_file(&path).unwrap_err().to_string();
        assert!(err.contains("row 2"), "{err}");
        assert!(err.contains("embedding"));
    }

    #[test]
    fn test_csv_errors() {
        let (_dir, path) = write_tmp("c.csv", "text,label\nx = 1,0\n");
        let err = load_file(&path).unwrap_err().to_string();
        assert!(err.contains("no code column"), "{err}");

        let (_dir, path) = write_tmp("c.csv", "code,label\nx = 1,1\n,1\n");
        let err = load_file(&path).unwrap_err().to_string();
        assert!(err.contains("row 3"), "{err}");

        let (_dir, path) = write_tmp("c.csv", "code,label\n");
        assert!(load_file(&path).unwrap_err().to_string().contains("no samples"));
    }

    #[test]
    fn test_json_aliases() {
        let (_dir, path) = write_tmp(
            "c.jsonl",
            "{\"source\": \"x = 1\", \"class\": \"ai\", \"model\": \"llama\"}\n",
        );
        let loaded = load_file(&path).unwrap();
        assert_eq!(loaded.samples[0].class, OriginClass::Generator("llama".into()));
    }

    #[test]
    fn test_digest_is_stable() {
        let (_dir, path) = write_tmp("c.jsonl", "{\"code\": \"a\", \"label\": 1}\n");
        let a = load_file(&path).unwrap().digest;
        let b = load_file(&path).unwrap().digest;
        assert_eq!(a, b);
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = load_file(Path::new("/nonexistent/corpus.jsonl")).unwrap_err();
        assert!(matches!(err, EngineError::CorpusLoad { .. }));
    }

    #[test]
    fn test_row_errors_name_the_row() {
        let (_dir, path) = write_tmp(
            "c.jsonl",
            "{\"code\": \"a\", \"label\": 1}\n{\"code\": \"\", \"label\": 1}\n",
        );
        let err = load_file(&path).unwrap_err().to_string();
        assert!(err.contains("row 2"), "{err}");
        assert!(err.contains("code"));

        let (_dir, path) = write_tmp("c.jsonl", "{\"code\": \"a\"}\n");
        assert!(load_file(&path).unwrap_err().to_string().contains("label"));

        let (_dir, path) = write_tmp("c.jsonl", "not json\n");
        assert!(load_file(&path).is_err());

        let (_dir, path) = write_tmp("c.jsonl", "{\"code\": \"a\", \"label\": 1, \"embedding\": [\"x\"]}\n");
        assert!(load_file(&path).unwrap_err().to_string().contains("embedding"));
    }

    #[test]
    fn test_empty_corpus_is_error() {
        let (_dir, path) = write_tmp("c.jsonl", "\n\n");
        assert!(load_file(&path).is_err());
    }

    #[test]
    fn test_embedding_dimension_must_match() {
        let sample = |e: Vec<f64>| CorpusSample {
            code: "x".into(),
            class: OriginClass::Human,
            language: Language::Unknown,
            embedding: Some(e),
        };
        let ok = vec![sample(vec![1.0, 2.0]), sample(vec![3.0, 4.0])];
        assert_eq!(embedding_dimension(Path::new("c"), &ok).unwrap(), Some(2));
        let bad = vec![sample(vec![1.0, 2.0]), sample(vec![3.0])];
        assert!(embedding_dimension(Path::new("c"), &bad).is_err());
    }
}
