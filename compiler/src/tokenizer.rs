use std::{fmt, fs, path::PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::{
    error::PierogiError,
    span::{Position, Span},
};

lazy_static! {
    pub static ref TOKEN_REGEX: Regex = Regex::new(
        r#"(/\*(?s:.)*?\*/|//[^\n]*|"(?:\\.|[^"\\])*"|'[^']*'|\d+|[A-Za-z_][A-Za-z0-9_]*|[{}\[\]();=,>-]|\s+)"#
    ).unwrap();
    pub static ref WHITESPACE_RX: Regex = Regex::new(r"^(//.*|\s+)$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Identifier,
    Number,
    StringLiteral,
    StringExpandable,
    BlockComment,
    OpenBrace,
    CloseBrace,
    OpenBracket,
    CloseBracket,
    OpenParenthesis,
    CloseParenthesis,
    Semicolon,
    Eq,
    Comma,
    Hyphen,
    CloseCaret,
    Enum,
    Struct,
    Message,
    Map,
    Array,
    ReadOnly,
    EndOfFile,
}

/// Keywords reserved by the grammar. None of them may name a field.
pub const KEYWORDS: [(&str, TokenKind); 6] = [
    ("enum", TokenKind::Enum),
    ("struct", TokenKind::Struct),
    ("message", TokenKind::Message),
    ("map", TokenKind::Map),
    ("array", TokenKind::Array),
    ("readonly", TokenKind::ReadOnly),
];

pub fn is_keyword(text: &str) -> bool {
    KEYWORDS.iter().any(|(k, _)| *k == text)
}

impl TokenKind {
    pub fn is_keyword(&self) -> bool {
        KEYWORDS.iter().any(|(_, kind)| kind == self)
    }

    pub fn description(&self) -> &'static str {
        match self {
            TokenKind::Identifier       => "identifier",
            TokenKind::Number           => "number",
            TokenKind::StringLiteral    => "string literal",
            TokenKind::StringExpandable => "string",
            TokenKind::BlockComment     => "block comment",
            TokenKind::OpenBrace        => "\"{\"",
            TokenKind::CloseBrace       => "\"}\"",
            TokenKind::OpenBracket      => "\"[\"",
            TokenKind::CloseBracket     => "\"]\"",
            TokenKind::OpenParenthesis  => "\"(\"",
            TokenKind::CloseParenthesis => "\")\"",
            TokenKind::Semicolon        => "\";\"",
            TokenKind::Eq               => "\"=\"",
            TokenKind::Comma            => "\",\"",
            TokenKind::Hyphen           => "\"-\"",
            TokenKind::CloseCaret       => "\">\"",
            TokenKind::Enum             => "\"enum\"",
            TokenKind::Struct           => "\"struct\"",
            TokenKind::Message          => "\"message\"",
            TokenKind::Map              => "\"map\"",
            TokenKind::Array            => "\"array\"",
            TokenKind::ReadOnly         => "\"readonly\"",
            TokenKind::EndOfFile        => "end of file",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Token {
    pub kind:   TokenKind,
    pub lexeme: String,
    pub span:   Span,
}

impl Token {
    /// Human readable rendering for diagnostics, e.g. `identifier "Foo"`.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::EndOfFile => "end of file".to_string(),
            TokenKind::Identifier | TokenKind::Number | TokenKind::StringLiteral | TokenKind::StringExpandable => {
                format!("{} {}", self.kind.description(), crate::utils::quote(&self.lexeme))
            }
            _ => self.kind.description().to_string(),
        }
    }
}

fn classify(part: &str) -> (TokenKind, String) {
    let first = part.chars().next().unwrap_or_default();
    match first {
        '/' => {
            let body = &part[2..part.len() - 2];
            (TokenKind::BlockComment, body.trim().to_string())
        }
        '"' => (TokenKind::StringExpandable, unescape(&part[1..part.len() - 1])),
        '\'' => (TokenKind::StringLiteral, part[1..part.len() - 1].to_string()),
        '{' => (TokenKind::OpenBrace, part.to_string()),
        '}' => (TokenKind::CloseBrace, part.to_string()),
        '[' => (TokenKind::OpenBracket, part.to_string()),
        ']' => (TokenKind::CloseBracket, part.to_string()),
        '(' => (TokenKind::OpenParenthesis, part.to_string()),
        ')' => (TokenKind::CloseParenthesis, part.to_string()),
        ';' => (TokenKind::Semicolon, part.to_string()),
        '=' => (TokenKind::Eq, part.to_string()),
        ',' => (TokenKind::Comma, part.to_string()),
        '-' => (TokenKind::Hyphen, part.to_string()),
        '>' => (TokenKind::CloseCaret, part.to_string()),
        c if c.is_ascii_digit() => (TokenKind::Number, part.to_string()),
        _ => {
            let kind = KEYWORDS
                .iter()
                .find(|(k, _)| *k == part)
                .map(|(_, kind)| *kind)
                .unwrap_or(TokenKind::Identifier);
            (kind, part.to_string())
        }
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Tokenize one source file. The result has no `EndOfFile` token.
pub fn tokenize_source(text: &str, file: usize) -> Result<Vec<Token>, PierogiError> {
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut column = 1;
    let mut last_end = 0;

    for mat in TOKEN_REGEX.find_iter(text) {
        let start = mat.start();
        let end   = mat.end();
        let part  = mat.as_str();

        if start > last_end {
            // Unexpected text between last_end and start
            let unexpected = &text[last_end..start];
            let here = Position::new(last_end, line, column);
            return Err(PierogiError::Lex {
                message: format!("Unexpected text {}", crate::utils::quote(unexpected)),
                span:    Span::new(file, here, here),
            });
        }

        let begin = Position::new(start, line, column);

        // Update line/column
        let newline_count = part.matches('\n').count();
        if newline_count > 0 {
            line += newline_count;
            if let Some(last_line_part) = part.split('\n').last() {
                column = last_line_part.len() + 1;
            }
        } else {
            column += part.len();
        }

        if !WHITESPACE_RX.is_match(part) && !part.starts_with("//") {
            let (kind, lexeme) = classify(part);
            tokens.push(Token {
                kind,
                lexeme,
                span: Span::new(file, begin, Position::new(end, line, column)),
            });
        }

        last_end = end;
    }

    if last_end != text.len() {
        let unexpected = &text[last_end..];
        let here = Position::new(last_end, line, column);
        return Err(PierogiError::Lex {
            message: format!("Unexpected text {}", crate::utils::quote(unexpected)),
            span:    Span::new(file, here, here),
        });
    }

    Ok(tokens)
}

/// Tokenize a single textual schema, terminated by an `EndOfFile` token.
pub fn tokenize_schema(text: &str) -> Result<Vec<Token>, PierogiError> {
    SchemaLexer::from_textual_schema(text).token_stream()
}

#[derive(Debug, Clone)]
enum Source {
    Text { name: String, text: String },
    Path(PathBuf),
}

/// Produces the complete token stream for one or more schema sources.
#[derive(Debug, Clone)]
pub struct SchemaLexer {
    sources: Vec<Source>,
}

impl SchemaLexer {
    pub fn from_textual_schema(text: &str) -> Self {
        SchemaLexer {
            sources: vec![Source::Text { name: "<schema>".to_string(), text: text.to_string() }],
        }
    }

    pub fn from_schema_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        SchemaLexer {
            sources: paths.into_iter().map(|p| Source::Path(p.into())).collect(),
        }
    }

    /// Display name of the file a span's `file` index refers to.
    pub fn file_name(&self, file: usize) -> Option<String> {
        self.sources.get(file).map(|source| match source {
            Source::Text { name, .. } => name.clone(),
            Source::Path(path) => path.display().to_string(),
        })
    }

    /// Read and tokenize every source in order, appending one `EndOfFile` token.
    pub fn token_stream(&self) -> Result<Vec<Token>, PierogiError> {
        let mut tokens = Vec::new();
        let mut eof = Span::default();

        for (file, source) in self.sources.iter().enumerate() {
            let text = match source {
                Source::Text { text, .. } => text.clone(),
                Source::Path(path) => fs::read_to_string(path)?,
            };
            tokens.extend(tokenize_source(&text, file)?);
            eof = end_of(&text, file);
        }

        tokens.push(Token {
            kind:   TokenKind::EndOfFile,
            lexeme: String::new(),
            span:   eof,
        });
        Ok(tokens)
    }
}

fn end_of(text: &str, file: usize) -> Span {
    let line = text.matches('\n').count() + 1;
    let column = text.rsplit('\n').next().map(|l| l.len()).unwrap_or(0) + 1;
    let here = Position::new(text.len(), line, column);
    Span::new(file, here, here)
}
