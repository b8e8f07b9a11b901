use thiserror::Error;

use crate::{
    span::Span,
    tokenizer::{Token, TokenKind},
    types::TypeBase,
};

#[derive(Debug, Error)]
pub enum PierogiError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Syntax error at {span}: {message}")]
    Lex {
        message: String,
        span:    Span,
    },

    #[error("Expected {}, but found {} at {}{}", one_of(.expected), .actual.describe(), .actual.span, hint_suffix(.hint))]
    UnexpectedToken {
        expected: Vec<TokenKind>,
        actual:   Token,
        hint:     Option<String>,
    },

    #[error("Unknown attribute \"{keyword}\" at {}", .token.span)]
    UnknownAttribute {
        keyword: String,
        token:   Token,
    },

    #[error("Use of reserved identifier \"{name}\" at {span}")]
    ReservedIdentifier {
        name: String,
        span: Span,
    },

    #[error("Invalid key type \"{}\" at {}: map keys must be a base type", .key_type.display(), .key_type.span())]
    InvalidMapKeyType {
        key_type: TypeBase,
    },

    #[error("Multiple definitions for \"{name}\" at {span}")]
    MultipleDefinitions {
        name: String,
        span: Span,
    },

    #[error("Use of unrecognized type name \"{name}\" in definition of \"{used_in}\" at {span}")]
    UnrecognizedType {
        name:    String,
        used_in: String,
        span:    Span,
    },

    #[error("Invalid integer literal \"{lexeme}\" at {span}")]
    InvalidNumber {
        lexeme: String,
        span:   Span,
    },

    #[error("Invalid [{name}] attribute on \"{definition}\" at {span}: {reason}")]
    InvalidAttribute {
        name:       String,
        reason:     String,
        definition: String,
        span:       Span,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PierogiError {
    /// The source location this error points at, if it has one.
    pub fn span(&self) -> Option<Span> {
        match self {
            PierogiError::Lex { span, .. }
            | PierogiError::ReservedIdentifier { span, .. }
            | PierogiError::MultipleDefinitions { span, .. }
            | PierogiError::UnrecognizedType { span, .. }
            | PierogiError::InvalidNumber { span, .. }
            | PierogiError::InvalidAttribute { span, .. } => Some(*span),
            PierogiError::UnexpectedToken { actual, .. } => Some(actual.span),
            PierogiError::UnknownAttribute { token, .. } => Some(token.span),
            PierogiError::InvalidMapKeyType { key_type } => Some(key_type.span()),
            PierogiError::Io(_) | PierogiError::Json(_) => None,
        }
    }
}

fn one_of(kinds: &[TokenKind]) -> String {
    match kinds {
        [] => "nothing".to_string(),
        [single] => single.description().to_string(),
        [init @ .., last] => {
            let init: Vec<&str> = init.iter().map(|k| k.description()).collect();
            format!("{} or {}", init.join(", "), last.description())
        }
    }
}

fn hint_suffix(hint: &Option<String>) -> String {
    match hint {
        Some(h) => format!(". Hint: {}", h),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Position;

    #[test]
    fn unexpected_token_message_lists_alternatives_and_hint() {
        let actual = Token {
            kind:   TokenKind::Identifier,
            lexeme: "x".into(),
            span:   Span::new(0, Position::new(3, 1, 4), Position::new(4, 1, 5)),
        };
        let err = PierogiError::UnexpectedToken {
            expected: vec![TokenKind::StringExpandable, TokenKind::StringLiteral, TokenKind::Number],
            actual,
            hint:     Some("try again".into()),
        };
        assert_eq!(
            err.to_string(),
            "Expected string, string literal or number, but found identifier \"x\" at 1:4. Hint: try again"
        );
        assert_eq!(err.span().map(|s| s.start.column), Some(4));
    }
}
