//! Source scanner
//!
//! One pass over the text that separates code, comments and string literals
//! line by line. Downstream analyzers work on the comment-free `code` text, so
//! string contents and comment prose never count as identifiers or branches.
//!
//! The scanner is lexical only. It never needs the code to parse; problems it
//! notices (unbalanced delimiters, unterminated literals) are collected in
//! `issues` and the scan carries on.

use crate::models::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentMarker {
    Hash,
    Slash,
    Block,
    Percent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Comment is the only thing on the line
    FullLine,
    /// Comment trails code on the same line
    Inline,
}

#[derive(Debug, Clone)]
pub struct LineComment {
    pub marker: CommentMarker,
    pub placement: Placement,
    /// Comment text length in chars, markers and padding excluded
    pub len: usize,
    /// `///`, `//!`, `/**` or R's `#'`
    pub is_doc: bool,
}

/// Leading whitespace of a line. Tabs count as 4 columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Indent {
    pub width: usize,
    pub tabs: bool,
    pub spaces: bool,
}

impl Indent {
    fn of(raw: &str) -> Self {
        let mut indent = Indent::default();
        for c in raw.chars() {
            match c {
                ' ' => {
                    indent.width += 1;
                    indent.spaces = true;
                }
                '\t' => {
                    indent.width += 4;
                    indent.tabs = true;
                }
                _ => break,
            }
        }
        indent
    }

    pub fn is_mixed(&self) -> bool {
        self.tabs && self.spaces
    }
}

#[derive(Debug, Clone)]
pub struct SourceLine<'a> {
    pub raw: &'a str,
    /// Code with comments stripped and string literals collapsed to `""`
    pub code: String,
    pub comment: Option<LineComment>,
    /// Line belongs to a docstring literal
    pub in_docstring: bool,
    pub indent: Indent,
}

impl SourceLine<'_> {
    pub fn is_blank(&self) -> bool {
        self.raw.trim().is_empty()
    }

    pub fn has_code(&self) -> bool {
        !self.in_docstring && !self.code.trim().is_empty()
    }
}

/// A docstring literal (Python style), by 0-based line span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Docstring {
    pub start: usize,
    pub end: usize,
    pub len: usize,
}

#[derive(Debug)]
pub struct SourceView<'a> {
    pub language: Language,
    pub lines: Vec<SourceLine<'a>>,
    pub docstrings: Vec<Docstring>,
    /// Lexical problems, in order of discovery
    pub issues: Vec<String>,
}

impl<'a> SourceView<'a> {
    pub fn scan(text: &'a str, language: Language) -> Self {
        Scanner::new(language).run(text)
    }

    pub fn code_lines(&self) -> impl Iterator<Item = (usize, &SourceLine<'a>)> {
        self.lines.iter().enumerate().filter(|(_, l)| l.has_code())
    }

    pub fn is_degraded(&self) -> bool {
        !self.issues.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SingleQuote {
    /// `'...'` is a string literal
    Str,
    /// `'x'` is a char literal; a lone `'` is a lifetime or similar
    Char,
    /// `'` is not a quote at all
    Plain,
}

struct LexSyntax {
    line_comments: &'static [(&'static str, CommentMarker)],
    block: Option<(&'static str, &'static str)>,
    single_quote: SingleQuote,
    backtick: bool,
    triple: &'static [&'static str],
    docstrings: bool,
}

const SLASH: &[(&str, CommentMarker)] = &[("//", CommentMarker::Slash)];
const HASH: &[(&str, CommentMarker)] = &[("#", CommentMarker::Hash)];
const SLASH_HASH: &[(&str, CommentMarker)] =
    &[("//", CommentMarker::Slash), ("#", CommentMarker::Hash)];
const PERCENT: &[(&str, CommentMarker)] = &[("%", CommentMarker::Percent)];
const C_BLOCK: Option<(&str, &str)> = Some(("/*", "*/"));

fn lex_syntax(language: Language) -> LexSyntax {
    let c_like = |single_quote, backtick, triple: &'static [&'static str]| LexSyntax {
        line_comments: SLASH,
        block: C_BLOCK,
        single_quote,
        backtick,
        triple,
        docstrings: false,
    };
    match language {
        Language::Python => LexSyntax {
            line_comments: HASH,
            block: None,
            single_quote: SingleQuote::Str,
            backtick: false,
            triple: &["\"\"\"", "'''"],
            docstrings: true,
        },
        Language::Ruby | Language::R => LexSyntax {
            line_comments: HASH,
            block: None,
            single_quote: SingleQuote::Str,
            backtick: false,
            triple: &[],
            docstrings: false,
        },
        Language::Matlab => LexSyntax {
            line_comments: PERCENT,
            block: None,
            single_quote: SingleQuote::Plain,
            backtick: false,
            triple: &[],
            docstrings: false,
        },
        Language::Php => LexSyntax {
            line_comments: SLASH_HASH,
            ..c_like(SingleQuote::Str, false, &[])
        },
        Language::JavaScript => c_like(SingleQuote::Str, true, &[]),
        Language::Go => c_like(SingleQuote::Char, true, &[]),
        Language::Swift => c_like(SingleQuote::Plain, false, &["\"\"\""]),
        Language::Java | Language::Kotlin | Language::Scala => {
            c_like(SingleQuote::Char, false, &["\"\"\""])
        }
        Language::C | Language::Cpp | Language::CSharp | Language::Rust => {
            c_like(SingleQuote::Char, false, &[])
        }
        Language::Unknown => LexSyntax {
            line_comments: SLASH_HASH,
            block: C_BLOCK,
            single_quote: SingleQuote::Str,
            backtick: false,
            triple: &["\"\"\"", "'''"],
            docstrings: true,
        },
    }
}

enum State {
    Code,
    Block { doc: bool },
    Str {
        close: &'static str,
        multiline: bool,
        doc: bool,
    },
}

struct Scanner {
    language: Language,
    syntax: LexSyntax,
    state: State,
    delimiters: Vec<(char, usize)>,
    delimiters_broken: bool,
    doc_start: usize,
    doc_text: String,
    docstrings: Vec<Docstring>,
    issues: Vec<String>,
}

fn starts_with(chars: &[char], at: usize, pat: &str) -> bool {
    let mut i = at;
    for p in pat.chars() {
        if chars.get(i) != Some(&p) {
            return false;
        }
        i += 1;
    }
    true
}

/// Length of a char literal starting at `at` (`'x'`, `'\n'`, `'\u{41}'`), if any
fn char_literal_len(chars: &[char], at: usize) -> Option<usize> {
    match chars.get(at + 1)? {
        '\\' => (at + 3..(at + 12).min(chars.len()))
            .find(|&j| chars[j] == '\'')
            .map(|j| j - at + 1),
        '\'' => None,
        _ => (chars.get(at + 2) == Some(&'\'')).then_some(3),
    }
}

impl Scanner {
    fn new(language: Language) -> Self {
        Self {
            language,
            syntax: lex_syntax(language),
            state: State::Code,
            delimiters: Vec::new(),
            delimiters_broken: false,
            doc_start: 0,
            doc_text: String::new(),
            docstrings: Vec::new(),
            issues: Vec::new(),
        }
    }

    fn run(mut self, text: &str) -> SourceView<'_> {
        let lines: Vec<SourceLine<'_>> = text
            .lines()
            .enumerate()
            .map(|(n, raw)| self.scan_line(n, raw))
            .collect();
        let last = lines.len();

        match self.state {
            State::Block { .. } => self.issues.push("unterminated block comment".to_string()),
            State::Str { .. } => self.issues.push(format!(
                "unterminated string literal at end of input (line {last})"
            )),
            State::Code => {}
        }
        if !self.delimiters_broken {
            if let Some(&(open, line)) = self.delimiters.first() {
                self.issues
                    .push(format!("unclosed '{open}' opened on line {}", line + 1));
            }
        }
        if self.language == Language::Python {
            let tabbed = lines.iter().any(|l| l.has_code() && l.indent.tabs);
            let spaced = lines.iter().any(|l| l.has_code() && l.indent.spaces);
            if tabbed && spaced {
                self.issues
                    .push("inconsistent use of tabs and spaces in indentation".to_string());
            }
        }

        SourceView {
            language: self.language,
            lines,
            docstrings: self.docstrings,
            issues: self.issues,
        }
    }

    fn scan_line<'a>(&mut self, n: usize, raw: &'a str) -> SourceLine<'a> {
        let chars: Vec<char> = raw.chars().collect();
        let mut code = String::new();
        let mut comment: Option<LineComment> = None;
        let mut comment_text = String::new();
        let mut in_docstring = matches!(self.state, State::Str { doc: true, .. });

        if let State::Block { doc } = self.state {
            comment = Some(LineComment {
                marker: CommentMarker::Block,
                placement: Placement::FullLine,
                len: 0,
                is_doc: doc,
            });
        }

        let mut i = 0;
        while i < chars.len() {
            match self.state {
                State::Block { .. } => {
                    let close = self.syntax.block.map_or("*/", |(_, close)| close);
                    if starts_with(&chars, i, close) {
                        self.state = State::Code;
                        i += close.chars().count();
                    } else {
                        comment_text.push(chars[i]);
                        i += 1;
                    }
                }
                State::Str { close, doc, .. } => {
                    if chars[i] == '\\' && close != "`" {
                        if doc {
                            self.doc_text.push(chars[i]);
                        }
                        i += 2;
                        continue;
                    }
                    if starts_with(&chars, i, close) {
                        i += close.chars().count();
                        self.state = State::Code;
                        if doc {
                            self.docstrings.push(Docstring {
                                start: self.doc_start,
                                end: n,
                                len: self.doc_text.trim().chars().count(),
                            });
                        }
                        continue;
                    }
                    if doc {
                        self.doc_text.push(chars[i]);
                    }
                    i += 1;
                }
                State::Code => {
                    if let Some(step) =
                        self.scan_code(n, &chars, i, &mut code, &mut comment, &mut comment_text)
                    {
                        if matches!(self.state, State::Str { doc: true, .. }) {
                            in_docstring = true;
                        }
                        i += step;
                    } else {
                        // Line comment consumed the rest of the line
                        break;
                    }
                }
            }
        }

        match self.state {
            State::Str {
                multiline: false, ..
            } => {
                self.issues
                    .push(format!("unterminated string literal on line {}", n + 1));
                self.state = State::Code;
            }
            State::Str { doc: true, .. } => self.doc_text.push('\n'),
            _ => {}
        }

        if let Some(c) = comment.as_mut() {
            c.len = comment_text
                .trim()
                .trim_start_matches(['*', '/', '!', '#', '%', '\''])
                .trim()
                .chars()
                .count();
        }

        SourceLine {
            raw,
            code,
            comment,
            in_docstring,
            indent: Indent::of(raw),
        }
    }

    /// Scan one position in code state. Returns how many chars were consumed,
    /// or `None` when a line comment swallowed the rest of the line.
    fn scan_code(
        &mut self,
        n: usize,
        chars: &[char],
        i: usize,
        code: &mut String,
        comment: &mut Option<LineComment>,
        comment_text: &mut String,
    ) -> Option<usize> {
        let placement = if code.trim().is_empty() {
            Placement::FullLine
        } else {
            Placement::Inline
        };

        if let Some((open, _)) = self.syntax.block {
            if starts_with(chars, i, open) {
                let doc = starts_with(chars, i, "/**") && !starts_with(chars, i, "/**/");
                if comment.is_none() {
                    *comment = Some(LineComment {
                        marker: CommentMarker::Block,
                        placement,
                        len: 0,
                        is_doc: doc,
                    });
                }
                self.state = State::Block { doc };
                return Some(open.chars().count());
            }
        }

        for &(marker, kind) in self.syntax.line_comments {
            if starts_with(chars, i, marker) {
                if comment.is_none() {
                    let is_doc = starts_with(chars, i, "///")
                        || starts_with(chars, i, "//!")
                        || (self.language == Language::R && starts_with(chars, i, "#'"));
                    *comment = Some(LineComment {
                        marker: kind,
                        placement,
                        len: 0,
                        is_doc,
                    });
                }
                comment_text.extend(&chars[i + marker.chars().count()..]);
                return None;
            }
        }

        for &triple in self.syntax.triple {
            if starts_with(chars, i, triple) {
                let doc = self.syntax.docstrings
                    && code
                        .trim()
                        .chars()
                        .all(|c| matches!(c, 'r' | 'R' | 'u' | 'U' | 'b' | 'B' | 'f' | 'F'));
                if doc {
                    self.doc_start = n;
                    self.doc_text.clear();
                }
                code.push_str("\"\"");
                self.state = State::Str {
                    close: triple,
                    multiline: true,
                    doc,
                };
                return Some(3);
            }
        }

        let c = chars[i];
        match c {
            '"' => self.open_string(code, "\"", false),
            '\'' => match self.syntax.single_quote {
                SingleQuote::Str => self.open_string(code, "'", false),
                SingleQuote::Char => {
                    if let Some(len) = char_literal_len(chars, i) {
                        code.push_str("''");
                        return Some(len);
                    }
                    code.push(c);
                }
                SingleQuote::Plain => code.push(c),
            },
            '`' if self.syntax.backtick => self.open_string(code, "`", true),
            '(' | '[' | '{' => {
                self.delimiters.push((c, n));
                code.push(c);
            }
            ')' | ']' | '}' => {
                self.close_delimiter(c, n);
                code.push(c);
            }
            _ => code.push(c),
        }
        Some(1)
    }

    fn open_string(&mut self, code: &mut String, close: &'static str, multiline: bool) {
        code.push_str("\"\"");
        self.state = State::Str {
            close,
            multiline,
            doc: false,
        };
    }

    fn close_delimiter(&mut self, close: char, n: usize) {
        if self.delimiters_broken {
            return;
        }
        let expected = match close {
            ')' => '(',
            ']' => '[',
            _ => '{',
        };
        match self.delimiters.pop() {
            Some((open, _)) if open == expected => {}
            Some((open, line)) => {
                self.issues.push(format!(
                    "mismatched '{close}' on line {} (expected closer for '{open}' from line {})",
                    n + 1,
                    line + 1
                ));
                self.delimiters_broken = true;
            }
            None => {
                self.issues
                    .push(format!("unbalanced '{close}' on line {}", n + 1));
                self.delimiters_broken = true;
            }
        }
    }
}
