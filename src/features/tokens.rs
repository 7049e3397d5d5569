//! Line tokenizer
//!
//! Splits a line of (comment-free) code into keywords, identifiers, literals
//! and operators. Identifiers keep their original text for naming analysis;
//! `abstract_form` collapses them the way the corpus fingerprints need.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,
    Ident,
    Str,
    Num,
    Op,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}

impl<'a> Token<'a> {
    /// Normalized form: identifiers by shape, literals by kind.
    pub fn abstract_form(&self) -> &'a str {
        match self.kind {
            TokenKind::Keyword | TokenKind::Op => self.text,
            TokenKind::Str => "<STR>",
            TokenKind::Num => "<NUM>",
            TokenKind::Ident => {
                if self.text.len() > 1
                    && self
                        .text
                        .chars()
                        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
                {
                    "<CONST>"
                } else if self.text.starts_with(|c: char| c.is_ascii_uppercase()) {
                    "<TYPE>"
                } else {
                    "<ID>"
                }
            }
        }
    }

    pub fn is_op(&self, op: &str) -> bool {
        self.kind == TokenKind::Op && self.text == op
    }
}

/// Tokenize one line of code.
pub fn tokenize_line(line: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let bytes = line.as_bytes();
    let mut chars = line.char_indices().peekable();

    while let Some(&(start, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }

            '"' | '\'' | '`' => {
                let quote = ch;
                chars.next();
                let mut end = line.len();
                while let Some((i, c)) = chars.next() {
                    if c == '\\' {
                        chars.next();
                        continue;
                    }
                    if c == quote {
                        end = i + c.len_utf8();
                        break;
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Str,
                    text: &line[start..end],
                });
            }

            '0'..='9' => {
                let mut end = start;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '.' || c == '_' {
                        end = i + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Num,
                    text: &line[start..end],
                });
            }

            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let mut end = start;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' || (c == '$' && i == start) {
                        end = i + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let word = &line[start..end];
                let kind = if is_keyword(word) {
                    TokenKind::Keyword
                } else {
                    TokenKind::Ident
                };
                tokens.push(Token { kind, text: word });
            }

            _ => {
                chars.next();
                let len = operator_len(&bytes[start..]);
                // Multi-byte operators are ASCII only, so skipping bytes is safe
                for _ in 1..len {
                    chars.next();
                }
                let end = start + ch.len_utf8().max(len);
                tokens.push(Token {
                    kind: TokenKind::Op,
                    text: &line[start..end],
                });
            }
        }
    }

    tokens
}

/// Length in bytes of the operator starting at `rest` (greedy, up to 3 chars).
fn operator_len(rest: &[u8]) -> usize {
    const THREE: [&[u8]; 7] = [b"===", b"!==", b"...", b">>>", b"<<=", b">>=", b"**="];
    const TWO: [&[u8]; 20] = [
        b"==", b"!=", b">=", b"<=", b"&&", b"||", b"->", b"=>", b"::", b"+=", b"-=", b"*=",
        b"/=", b"..", b"<<", b">>", b":=", b"<-", b"++", b"--",
    ];
    if THREE.iter().any(|op| rest.starts_with(op)) {
        3
    } else if TWO.iter().any(|op| rest.starts_with(op)) {
        2
    } else {
        1
    }
}

/// Check if a token is a language keyword.
/// Combined set across the supported languages, deduplicated.
pub fn is_keyword(word: &str) -> bool {
    matches!(word,
        // Control flow
        "if" | "else" | "elif" | "elsif" | "unless" | "until" | "for" | "foreach" | "while"
        | "do" | "loop" | "break" | "continue" | "next" | "return" | "yield" | "switch"
        | "case" | "default" | "match" | "when" | "select" | "range" | "then" | "end"
        // Error handling
        | "try" | "catch" | "except" | "finally" | "throw" | "throws" | "raise" | "rescue"
        | "ensure" | "guard"
        // Declarations
        | "fn" | "func" | "fun" | "def" | "function" | "let" | "var" | "val" | "const"
        | "static" | "auto" | "type" | "typedef"
        // OOP / types
        | "class" | "struct" | "enum" | "trait" | "interface" | "impl" | "extends"
        | "implements" | "abstract" | "sealed" | "final" | "override" | "virtual"
        | "object" | "companion" | "data" | "record" | "protocol" | "extension"
        // Visibility
        | "pub" | "private" | "protected" | "public" | "internal" | "readonly"
        // Modules / imports
        | "use" | "using" | "mod" | "import" | "export" | "from" | "package" | "as"
        | "crate" | "super" | "namespace" | "include" | "require" | "library"
        // Memory / ownership
        | "mut" | "ref" | "move" | "dyn" | "unsafe" | "extern"
        // Async
        | "async" | "await" | "defer" | "go"
        // Literals / builtins
        | "true" | "false" | "True" | "False" | "TRUE" | "FALSE" | "null" | "nil"
        | "None" | "NULL" | "undefined" | "self" | "Self" | "this" | "new" | "delete"
        | "del"
        // Logic operators
        | "and" | "or" | "not" | "is" | "in"
        // Python specific
        | "lambda" | "pass" | "assert" | "global" | "nonlocal" | "with"
        // JS specific
        | "typeof" | "instanceof" | "void"
        // Primitive types
        | "int" | "long" | "short" | "char" | "float" | "double" | "bool" | "boolean"
        | "byte" | "string" | "unsigned" | "signed" | "usize" | "isize" | "u8" | "u32"
        | "u64" | "i32" | "i64" | "f32" | "f64" | "str"
        // Java/C# specific
        | "synchronized" | "volatile" | "transient" | "native"
        // C/C++ specific
        | "sizeof" | "union" | "goto" | "inline" | "template" | "noexcept" | "constexpr"
        | "where"
    )
}
