//! Core data models for aicodechecker
//!
//! One analysis request owns its own chain:
//! `CodeSample` -> `FeatureVector` -> `MethodOutcome`s -> `DetectionResult`.
//! Nothing here is mutated after construction.

use crate::features::{Feature, FeatureVector};
use serde::{Deserialize, Serialize};

/// Languages the engine accepts as a declared language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    Java,
    C,
    Cpp,
    CSharp,
    Php,
    Ruby,
    Go,
    Rust,
    Swift,
    Kotlin,
    Scala,
    R,
    Matlab,
    /// Sniffing found no signal; analyzed with generic rules
    Unknown,
}

impl Language {
    /// The declared-language allowlist (everything except `Unknown`)
    pub const SUPPORTED: [Language; 15] = [
        Language::Python,
        Language::JavaScript,
        Language::Java,
        Language::C,
        Language::Cpp,
        Language::CSharp,
        Language::Php,
        Language::Ruby,
        Language::Go,
        Language::Rust,
        Language::Swift,
        Language::Kotlin,
        Language::Scala,
        Language::R,
        Language::Matlab,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::CSharp => "csharp",
            Language::Php => "php",
            Language::Ruby => "ruby",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Swift => "swift",
            Language::Kotlin => "kotlin",
            Language::Scala => "scala",
            Language::R => "r",
            Language::Matlab => "matlab",
            Language::Unknown => "unknown",
        }
    }

    /// Parse a declared language tag. Accepts canonical names and a few
    /// common aliases, case-insensitively. `auto` is handled by the caller.
    pub fn from_tag(tag: &str) -> Option<Language> {
        let lang = match tag.trim().to_lowercase().as_str() {
            "python" | "py" => Language::Python,
            "javascript" | "js" | "node" => Language::JavaScript,
            "java" => Language::Java,
            "c" => Language::C,
            "cpp" | "c++" | "cxx" => Language::Cpp,
            "csharp" | "c#" | "cs" => Language::CSharp,
            "php" => Language::Php,
            "ruby" | "rb" => Language::Ruby,
            "go" | "golang" => Language::Go,
            "rust" | "rs" => Language::Rust,
            "swift" => Language::Swift,
            "kotlin" | "kt" => Language::Kotlin,
            "scala" => Language::Scala,
            "r" => Language::R,
            "matlab" => Language::Matlab,
            _ => return None,
        };
        Some(lang)
    }

    /// True if the tag asks for language sniffing
    pub fn is_auto_tag(tag: &str) -> bool {
        matches!(
            tag.trim().to_lowercase().as_str(),
            "" | "auto" | "detect" | "auto-detect"
        )
    }

    /// Languages whose line comments start with `#`
    pub fn uses_hash_comments(&self) -> bool {
        matches!(self, Language::Python | Language::Ruby | Language::R)
    }

    /// Languages whose line comments start with `%`
    pub fn uses_percent_comments(&self) -> bool {
        matches!(self, Language::Matlab)
    }

    /// Languages where block structure is carried by braces
    pub fn uses_braces(&self) -> bool {
        !matches!(
            self,
            Language::Python | Language::Ruby | Language::Matlab | Language::Unknown
        )
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Ai,
    Human,
}

impl Label {
    /// Scores are "percent confidence the sample is AI-generated"
    pub fn from_score(score: f64) -> Self {
        if score >= 50.0 {
            Label::Ai
        } else {
            Label::Human
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Label::Ai => write!(f, "ai"),
            Label::Human => write!(f, "human"),
        }
    }
}

/// Scoring strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Heuristic,
    Weighted,
    Dataset,
    External,
}

impl Method {
    /// Canonical order used in method breakdowns
    pub const ALL: [Method; 4] = [
        Method::Heuristic,
        Method::Weighted,
        Method::Dataset,
        Method::External,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Heuristic => "heuristic",
            Method::Weighted => "weighted",
            Method::Dataset => "dataset",
            Method::External => "external",
        }
    }

    pub fn from_name(name: &str) -> Option<Method> {
        match name.trim().to_lowercase().as_str() {
            "heuristic" | "basic" => Some(Method::Heuristic),
            "weighted" | "deep" | "weighted-feature" => Some(Method::Weighted),
            "dataset" | "pattern" | "dataset-pattern" => Some(Method::Dataset),
            "external" | "llm" | "external-model" => Some(Method::External),
            _ => None,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Originating class of a reference sample: human, or a generator identity.
/// Unspecified AI origin uses the generator name `ai`. `Unknown` rows are
/// kept for corpus statistics but never vote.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OriginClass {
    Human,
    Generator(String),
    Unknown,
}

impl OriginClass {
    pub const GENERIC_AI: &'static str = "ai";

    pub fn generic_ai() -> Self {
        OriginClass::Generator(Self::GENERIC_AI.to_string())
    }

    pub fn is_ai(&self) -> bool {
        matches!(self, OriginClass::Generator(_))
    }

    /// Whether samples of this class count as evidence either way
    pub fn votes(&self) -> bool {
        !matches!(self, OriginClass::Unknown)
    }

    /// Generator identity, if this is a specific (non-generic) generator
    pub fn generator(&self) -> Option<&str> {
        match self {
            OriginClass::Generator(name) if name != Self::GENERIC_AI => Some(name),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            OriginClass::Human => "human",
            OriginClass::Generator(name) => name,
            OriginClass::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for OriginClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for OriginClass {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One piece of evidence from the pattern store
#[derive(Debug, Clone, Serialize)]
pub struct PatternMatch {
    pub class: OriginClass,
    pub indicator: String,
    /// Similarity strength in [0, 1]
    pub strength: f64,
}

/// Output of a single scoring method
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodResult {
    #[serde(rename = "name")]
    pub method: Method,
    pub label: Label,
    /// Percent confidence the sample is AI-generated, in [0, 100]
    pub score: f64,
    pub indicators: Vec<String>,
}

impl MethodResult {
    /// Build a result; the score is clamped and the label derived from it
    pub fn new(method: Method, score: f64, indicators: Vec<String>) -> Self {
        let score = if score.is_finite() {
            score.clamp(0.0, 100.0)
        } else {
            50.0
        };
        Self {
            method,
            label: Label::from_score(score),
            score,
            indicators,
        }
    }

    /// Same as `new` but with an explicit label (used by the external model,
    /// whose label and score can disagree)
    pub fn with_label(method: Method, label: Label, score: f64, indicators: Vec<String>) -> Self {
        let mut result = Self::new(method, score, indicators);
        result.label = label;
        result
    }
}

/// A method either produced a result or was unavailable for this request
#[derive(Debug, Clone, PartialEq)]
pub enum MethodOutcome {
    Present(MethodResult),
    Unavailable { method: Method, reason: String },
}

impl MethodOutcome {
    pub fn unavailable(method: Method, reason: impl Into<String>) -> Self {
        MethodOutcome::Unavailable {
            method,
            reason: reason.into(),
        }
    }

    pub fn method(&self) -> Method {
        match self {
            MethodOutcome::Present(r) => r.method,
            MethodOutcome::Unavailable { method, .. } => *method,
        }
    }

    pub fn result(&self) -> Option<&MethodResult> {
        match self {
            MethodOutcome::Present(r) => Some(r),
            MethodOutcome::Unavailable { .. } => None,
        }
    }
}

/// Raw code plus its resolved language. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct CodeSample {
    text: String,
    language: Language,
    declared: bool,
    line_count: usize,
    char_count: usize,
}

impl CodeSample {
    pub fn new(text: impl Into<String>, language: Language, declared: bool) -> Self {
        let text = text.into();
        let line_count = text.lines().count();
        let char_count = text.chars().count();
        Self {
            text,
            language,
            declared,
            line_count,
            char_count,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Whether the language was declared by the caller (vs. sniffed)
    pub fn is_declared(&self) -> bool {
        self.declared
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    pub fn char_count(&self) -> usize {
        self.char_count
    }
}

/// Engine input
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisRequest {
    pub code: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub requested_methods: Option<Vec<Method>>,
}

impl AnalysisRequest {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Default::default()
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.requested_methods = Some(methods.into_iter().collect());
        self
    }

    /// Whether a method was requested (all methods when unspecified)
    pub fn wants(&self, method: Method) -> bool {
        self.requested_methods
            .as_ref()
            .map_or(true, |methods| methods.contains(&method))
    }
}

/// Code metrics snapshot derived from the feature vector
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeMetrics {
    pub total_lines: usize,
    pub characters: usize,
    pub comment_ratio: f64,
    pub function_count: usize,
    pub class_count: usize,
    pub import_count: usize,
    pub max_nesting_depth: usize,
    pub cyclomatic_complexity: usize,
    pub token_count: usize,
    pub naming_consistency: f64,
    pub indent_width: usize,
    pub duplicate_line_ratio: f64,
    pub doc_coverage: f64,
}

impl CodeMetrics {
    pub fn from_features(features: &FeatureVector, sample: &CodeSample) -> Self {
        let count = |f: Feature| features.get(f).max(0.0).round() as usize;
        Self {
            total_lines: sample.line_count(),
            characters: sample.char_count(),
            comment_ratio: features.get(Feature::CommentRatio),
            function_count: count(Feature::FunctionCount),
            class_count: count(Feature::ClassCount),
            import_count: count(Feature::ImportCount),
            max_nesting_depth: count(Feature::MaxNestingDepth),
            cyclomatic_complexity: count(Feature::CyclomaticComplexity),
            token_count: count(Feature::TokenCount),
            naming_consistency: features.get(Feature::NamingConsistency),
            indent_width: count(Feature::IndentWidthMode),
            duplicate_line_ratio: features.get(Feature::DuplicateLineRatio),
            doc_coverage: features.get(Feature::DocCoverage),
        }
    }
}

/// Final verdict. The only artifact exposed across the engine boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionResult {
    pub label: Label,
    /// Percent confidence the sample is AI-generated, in [0, 100]
    pub score: f64,
    /// Agreement between methods, in [0, 1]
    pub confidence: f64,
    pub methods: Vec<MethodResult>,
    pub indicators: Vec<String>,
    pub metrics: CodeMetrics,
    pub language: Language,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likely_generator: Option<String>,
    pub explanation: String,
}

impl DetectionResult {
    pub fn method(&self, method: Method) -> Option<&MethodResult> {
        self.methods.iter().find(|m| m.method == method)
    }

    pub fn has_indicator(&self, needle: &str) -> bool {
        self.indicators.iter().any(|i| i.contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_tags() {
        assert_eq!(Language::from_tag("Python"), Some(Language::Python));
        assert_eq!(Language::from_tag("c++"), Some(Language::Cpp));
        assert_eq!(Language::from_tag("C#"), Some(Language::CSharp));
        assert_eq!(Language::from_tag("cobol"), None);
        assert!(Language::is_auto_tag("AUTO"));
        assert!(!Language::is_auto_tag("python"));
        for lang in Language::SUPPORTED {
            assert_eq!(Language::from_tag(lang.as_str()), Some(lang));
        }
    }

    #[test]
    fn test_method_result_clamps() {
        let r = MethodResult::new(Method::Heuristic, 140.0, vec![]);
        assert_eq!(r.score, 100.0);
        assert_eq!(r.label, Label::Ai);

        let r = MethodResult::new(Method::Heuristic, f64::NAN, vec![]);
        assert_eq!(r.score, 50.0);

        let r = MethodResult::new(Method::Weighted, 12.0, vec![]);
        assert_eq!(r.label, Label::Human);
    }

    #[test]
    fn test_method_result_serializes_name() {
        let r = MethodResult::new(Method::Dataset, 60.0, vec!["x".into()]);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["name"], "dataset");
        assert_eq!(json["label"], "ai");
    }

    #[test]
    fn test_origin_class() {
        assert!(!OriginClass::Human.is_ai());
        assert!(OriginClass::generic_ai().is_ai());
        assert_eq!(OriginClass::generic_ai().generator(), None);
        assert_eq!(
            OriginClass::Generator("gemini".into()).generator(),
            Some("gemini")
        );
        assert!(!OriginClass::Unknown.is_ai());
        assert!(!OriginClass::Unknown.votes());
        assert_eq!(OriginClass::Unknown.generator(), None);
        assert_eq!(OriginClass::Unknown.to_string(), "unknown");
    }

    #[test]
    fn test_request_wants() {
        let req = AnalysisRequest::new("x = 1");
        assert!(req.wants(Method::External));
        let req = req.with_methods([Method::Heuristic]);
        assert!(req.wants(Method::Heuristic));
        assert!(!req.wants(Method::Weighted));
    }

    #[test]
    fn test_code_sample_counts() {
        let s = CodeSample::new("a = 1\nb = 2\n", Language::Python, true);
        assert_eq!(s.line_count(), 2);
        assert_eq!(s.char_count(), 12);
        assert!(s.is_declared());
    }
}
