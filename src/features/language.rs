//! Lightweight language sniffing
//!
//! Each language has a handful of weighted syntax signals. A signal counts once
//! no matter how often it matches; the language with the highest total wins.
//! Used both to resolve `auto` and to notice code that plainly is not written
//! in its declared language.

use crate::models::Language;
use regex::Regex;
use std::sync::OnceLock;

/// Minimum total weight before a sniffed language is trusted
const SNIFF_THRESHOLD: f64 = 2.0;

/// Minimum weight of a foreign language before a declared one is questioned
const MISMATCH_THRESHOLD: f64 = 4.0;

const SIGNALS: &[(Language, &str, f64)] = &[
    // Python
    (Language::Python, r"(?m)^\s*(async\s+)?def\s+\w+\s*\(.*\)\s*(->\s*[^:]+)?:\s*$", 3.0),
    (Language::Python, r"(?m)^\s*class\s+\w+(\(.*\))?:\s*$", 3.0),
    (Language::Python, r"(?m)^\s*(from\s+[\w.]+\s+)?import\s+[\w.]+(\s+as\s+\w+)?\s*$", 1.0),
    (Language::Python, r"(?m)^\s*(elif\b|except\b.*:)", 2.0),
    (Language::Python, r"\bself\.\w+", 1.0),
    (Language::Python, r"if\s+__name__\s*==", 3.0),
    (Language::Python, r#"""""#, 1.0),
    // JavaScript
    (Language::JavaScript, r"\bconsole\.(log|error|warn)\b", 3.0),
    (Language::JavaScript, r"\bfunction\s*\w*\s*\(", 1.5),
    (Language::JavaScript, r"(?m)^\s*(const|let|var)\s+\w+\s*=", 1.5),
    (Language::JavaScript, r"=>\s*[{(\w]", 1.0),
    (Language::JavaScript, r"===|!==", 2.0),
    (Language::JavaScript, r"\brequire\s*\(\s*['\x22]", 2.0),
    (Language::JavaScript, r"(?m)^\s*export\s+(default|const|function|class)\b", 3.0),
    (Language::JavaScript, r"\b(document|window)\.\w+", 2.0),
    // Java
    (Language::Java, r"System\.out\.print", 4.0),
    (Language::Java, r"public\s+static\s+void\s+main\s*\(\s*String", 4.0),
    (Language::Java, r"(?m)^\s*import\s+java\.", 4.0),
    (Language::Java, r"(?m)^\s*package\s+[\w.]+;", 3.0),
    (Language::Java, r"\bpublic\s+(final\s+|abstract\s+)?class\s+\w+", 2.0),
    (Language::Java, r"@Override\b", 2.0),
    // C
    (Language::C, r"#include\s*<(stdio|stdlib|string|math|stdint|unistd)\.h>", 4.0),
    (Language::C, r"\bprintf\s*\(", 2.0),
    (Language::C, r"\b(malloc|calloc|free)\s*\(", 2.0),
    (Language::C, r"\bint\s+main\s*\(", 2.0),
    (Language::C, r"(?m)^\s*#define\s+\w+", 1.0),
    // C++
    (Language::Cpp, r"#include\s*<(iostream|vector|string|map|algorithm|memory)>", 4.0),
    (Language::Cpp, r"\bstd::\w+", 3.0),
    (Language::Cpp, r"\b(std::)?cout\s*<<", 3.0),
    (Language::Cpp, r"\btemplate\s*<", 3.0),
    (Language::Cpp, r"using\s+namespace\s+std", 4.0),
    (Language::Cpp, r"\bnullptr\b", 2.0),
    // C#
    (Language::CSharp, r"(?m)^\s*using\s+System(\.[\w.]+)?;", 4.0),
    (Language::CSharp, r"Console\.Write(Line)?\s*\(", 4.0),
    (Language::CSharp, r"\{\s*get;\s*(private\s+)?set;\s*\}", 4.0),
    (Language::CSharp, r"static\s+(async\s+)?\w*\s*Main\s*\(", 4.0),
    (Language::CSharp, r"(?m)^\s*namespace\s+[\w.]+", 2.0),
    // PHP
    (Language::Php, r"<\?php", 6.0),
    (Language::Php, r"\$\w+\s*=", 2.0),
    (Language::Php, r"\$this->", 3.0),
    (Language::Php, r"\becho\s+", 2.0),
    (Language::Php, r"\bfunction\s+\w+\s*\(", 1.0),
    // Ruby
    (Language::Ruby, r"(?m)^\s*def\s+\w+[?!]?\s*(\([^)]*\))?\s*$", 2.0),
    (Language::Ruby, r"(?m)^\s*end\s*$", 2.0),
    (Language::Ruby, r"\bputs\s", 3.0),
    (Language::Ruby, r"\.each\s+do\s*\|", 4.0),
    (Language::Ruby, r"\battr_(accessor|reader|writer)\b", 4.0),
    (Language::Ruby, r"(?m)^\s*require(_relative)?\s+['\x22]", 2.0),
    (Language::Ruby, r"\belsif\b", 4.0),
    // Go
    (Language::Go, r"(?m)^\s*package\s+\w+\s*$", 3.0),
    (Language::Go, r"\bfunc\s+(\(\w+\s+\*?\w+\)\s*)?\w+\s*\(", 3.0),
    (Language::Go, r"\w\s*:=", 2.0),
    (Language::Go, r"\bfmt\.\w+", 4.0),
    (Language::Go, r"(?m)^\s*import\s+\(", 2.0),
    // Rust
    (Language::Rust, r"\bfn\s+\w+\s*(<[^>]*>)?\s*\(", 3.0),
    (Language::Rust, r"\blet\s+mut\b", 4.0),
    (Language::Rust, r"\b(println|format|vec|panic)!\s*[(\[]", 4.0),
    (Language::Rust, r"(?m)^\s*impl\b", 2.0),
    (Language::Rust, r"(?m)^\s*use\s+[\w:]+(::\{[^}]*\})?;", 2.0),
    (Language::Rust, r"\bpub\s+(fn|struct|enum|mod)\b", 3.0),
    (Language::Rust, r"&mut\s", 2.0),
    // Swift
    (Language::Swift, r"(?m)^\s*import\s+(UIKit|Foundation|SwiftUI)\s*$", 5.0),
    (Language::Swift, r"\bfunc\s+\w+\s*\(", 2.0),
    (Language::Swift, r"\bguard\s+let\b", 4.0),
    (Language::Swift, r"\b(var|let)\s+\w+\s*:\s*[A-Z]\w*", 1.0),
    // Kotlin
    (Language::Kotlin, r"\bfun\s+\w+\s*\(", 3.0),
    (Language::Kotlin, r"\bval\s+\w+", 2.0),
    (Language::Kotlin, r"\bdata\s+class\b", 4.0),
    (Language::Kotlin, r"\bwhen\s*\(", 2.0),
    (Language::Kotlin, r"\bprintln\s*\(", 1.0),
    // Scala
    (Language::Scala, r"\bdef\s+\w+\s*(\[[^\]]*\])?\([^)]*\)\s*(:\s*[\w\[\]]+)?\s*=", 4.0),
    (Language::Scala, r"(?m)^\s*object\s+\w+", 2.0),
    (Language::Scala, r"\bcase\s+class\b", 4.0),
    (Language::Scala, r"\bval\s+\w+", 1.0),
    // R
    (Language::R, r"\w\s*<-\s*", 3.0),
    (Language::R, r"\blibrary\s*\(", 4.0),
    (Language::R, r"\bfunction\s*\(", 1.0),
    (Language::R, r"\bc\s*\(", 2.0),
    (Language::R, r"data\.frame", 3.0),
    // MATLAB
    (Language::Matlab, r"(?m)^\s*function\s+(\[[^\]]*\]\s*=\s*|\w+\s*=\s*)?\w+\s*\(", 3.0),
    (Language::Matlab, r"\bdisp\s*\(", 3.0),
    (Language::Matlab, r"\b(zeros|ones|linspace)\s*\(", 2.0),
    (Language::Matlab, r"(?m)^\s*%\s", 1.0),
    (Language::Matlab, r"(?m)^\s*end\s*$", 1.0),
];

static COMPILED: OnceLock<Vec<(Language, Regex, f64)>> = OnceLock::new();

fn signals() -> &'static [(Language, Regex, f64)] {
    COMPILED.get_or_init(|| {
        SIGNALS
            .iter()
            .map(|&(lang, pattern, weight)| (lang, Regex::new(pattern).expect("valid regex"), weight))
            .collect()
    })
}

/// Total signal weight per supported language, in `Language::SUPPORTED` order
pub fn signal_scores(code: &str) -> Vec<(Language, f64)> {
    let mut scores: Vec<(Language, f64)> = Language::SUPPORTED.iter().map(|&l| (l, 0.0)).collect();
    for (lang, re, weight) in signals() {
        if re.is_match(code) {
            if let Some(slot) = scores.iter_mut().find(|(l, _)| l == lang) {
                slot.1 += weight;
            }
        }
    }
    scores
}

/// Best-guess language for the code, `Unknown` when no signal is strong enough.
/// Ties go to the language listed first in the allowlist.
pub fn sniff(code: &str) -> Language {
    let mut best = (Language::Unknown, 0.0);
    for (lang, score) in signal_scores(code) {
        if score > best.1 {
            best = (lang, score);
        }
    }
    if best.1 >= SNIFF_THRESHOLD {
        best.0
    } else {
        Language::Unknown
    }
}

/// Languages whose snippets are routinely valid in each other
fn compatible(a: Language, b: Language) -> bool {
    a == b || matches!((a, b), (Language::C, Language::Cpp) | (Language::Cpp, Language::C))
}

/// If the code shows strong signals of another language and none of the
/// declared one, return the suspected language.
pub fn mismatch(code: &str, declared: Language) -> Option<Language> {
    if declared == Language::Unknown {
        return None;
    }
    let scores = signal_scores(code);
    let declared_score = scores
        .iter()
        .filter(|(l, _)| compatible(*l, declared))
        .map(|(_, s)| *s)
        .fold(0.0, f64::max);
    if declared_score > 0.0 {
        return None;
    }
    scores
        .into_iter()
        .filter(|(l, s)| !compatible(*l, declared) && *s >= MISMATCH_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(l, _)| l)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_python() {
        let code = "import os\n\ndef main():\n    print(os.getcwd())\n";
        assert_eq!(sniff(code), Language::Python);
    }

    #[test]
    fn test_sniff_javascript() {
        let code = "const total = items.reduce((a, b) => a + b, 0);\nconsole.log(total);\n";
        assert_eq!(sniff(code), Language::JavaScript);
    }

    #[test]
    fn test_sniff_rust() {
        let code = "fn main() {\n    let mut v = Vec::new();\n    v.push(1);\n    println!(\"{:?}\", v);\n}\n";
        assert_eq!(sniff(code), Language::Rust);
    }

    #[test]
    fn test_sniff_c_and_cpp() {
        let c = "#include <stdio.h>\nint main(void) {\n    printf(\"hi\\n\");\n    return 0;\n}\n";
        assert_eq!(sniff(c), Language::C);
        let cpp = "#include <iostream>\nusing namespace std;\nint main() { cout << 1; }\n";
        assert_eq!(sniff(cpp), Language::Cpp);
    }

    #[test]
    fn test_sniff_java() {
        let code = "public class Main {\n    public static void main(String[] args) {\n        System.out.println(1);\n    }\n}\n";
        assert_eq!(sniff(code), Language::Java);
    }

    #[test]
    fn test_sniff_prose_is_unknown() {
        assert_eq!(sniff("just some words here"), Language::Unknown);
    }

    #[test]
    fn test_mismatch_detects_foreign_code() {
        let java = "public class Main {\n    public static void main(String[] args) {\n        System.out.println(1);\n    }\n}\n";
        assert_eq!(mismatch(java, Language::Python), Some(Language::Java));
        assert_eq!(mismatch(java, Language::Java), None);
    }

    #[test]
    fn test_mismatch_tolerates_c_family() {
        let cpp = "#include <iostream>\nusing namespace std;\nint main() { cout << 1; }\n";
        assert_eq!(mismatch(cpp, Language::C), None);
    }
}
