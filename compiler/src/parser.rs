use std::path::PathBuf;

use indexmap::map::Entry;
use tracing::{debug, warn};

use crate::{
    error::PierogiError,
    span::Span,
    tokenizer::{is_keyword, SchemaLexer, Token, TokenKind},
    types::{AggregateKind, Attribute, BaseType, Definition, DefinitionMap, Field, Schema, TypeBase},
    utils::with_article,
    verifier::{resolve_references, TypeReference},
};

const MESSAGE_INDEX_HINT: &str =
    "Fields in a message must be explicitly indexed: message A { 1 -> string s; 2 -> bool b; }";
const MAP_HINT: &str = "The syntax for map types is: map[KeyType, ValueType].";
const ARRAY_HINT: &str = "The syntax for array types is either array[Type] or Type[].";
const ARRAY_SUFFIX_HINT: &str = "The syntax for array types is T[]. You can't specify a fixed size.";

#[derive(Debug, Clone)]
enum TokenSource {
    Lexer(SchemaLexer),
    Tokens(Vec<Token>),
}

/// Recursive descent parser turning a token stream into a [`Schema`].
///
/// A parser is single-use state: `evaluate` resets the cursor, the definition
/// map and the pending type references before it starts, so calling it again
/// re-parses from scratch. It is not reentrant; share parsers between threads
/// only by giving each thread its own instance.
#[derive(Debug)]
pub struct SchemaParser {
    source:          TokenSource,
    namespace:       String,
    tokens:          Vec<Token>,
    index:           usize,
    definitions:     DefinitionMap,
    type_references: Vec<TypeReference>,
}

/// Parse an already tokenized schema.
pub fn parse_schema(tokens: &[Token], namespace: &str) -> Result<Schema, PierogiError> {
    SchemaParser::from_tokens(tokens.to_vec(), namespace).evaluate()
}

impl SchemaParser {
    pub fn new(lexer: SchemaLexer, namespace: &str) -> Self {
        Self::with_source(TokenSource::Lexer(lexer), namespace)
    }

    pub fn from_textual_schema(text: &str, namespace: &str) -> Self {
        Self::new(SchemaLexer::from_textual_schema(text), namespace)
    }

    pub fn from_schema_paths<I, P>(paths: I, namespace: &str) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self::new(SchemaLexer::from_schema_paths(paths), namespace)
    }

    /// Parse tokens produced elsewhere. A missing trailing `EndOfFile` is added.
    pub fn from_tokens(tokens: Vec<Token>, namespace: &str) -> Self {
        Self::with_source(TokenSource::Tokens(tokens), namespace)
    }

    fn with_source(source: TokenSource, namespace: &str) -> Self {
        SchemaParser {
            source,
            namespace:       namespace.to_string(),
            tokens:          Vec::new(),
            index:           0,
            definitions:     DefinitionMap::new(),
            type_references: Vec::new(),
        }
    }

    /// Tokenize the input, parse every definition, then check that every
    /// named type reference resolves.
    pub fn evaluate(&mut self) -> Result<Schema, PierogiError> {
        self.tokenize()?;
        self.index = 0;
        self.definitions.clear();
        self.type_references.clear();
        debug!(tokens = self.tokens.len(), namespace = %self.namespace, "evaluating schema");

        self.parse_definitions()?;
        resolve_references(&self.definitions, &self.type_references)?;

        debug!(definitions = self.definitions.len(), "schema evaluated");
        Ok(Schema {
            namespace:   self.namespace.clone(),
            definitions: std::mem::take(&mut self.definitions),
        })
    }

    fn tokenize(&mut self) -> Result<(), PierogiError> {
        self.tokens = match &self.source {
            TokenSource::Lexer(lexer) => lexer.token_stream()?,
            TokenSource::Tokens(tokens) => tokens.clone(),
        };
        if self.tokens.last().map(|t| t.kind) != Some(TokenKind::EndOfFile) {
            let span = self.tokens.last().map(|t| t.span).unwrap_or_default();
            let at_end = Span::new(span.file, span.end, span.end);
            self.tokens.push(Token { kind: TokenKind::EndOfFile, lexeme: String::new(), span: at_end });
        }
        Ok(())
    }

    // -- Cursor --

    fn current(&self) -> &Token {
        &self.tokens[self.index]
    }

    fn peek(&self, index: usize) -> &Token {
        &self.tokens[index]
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.current().kind == kind {
            self.index += 1;
            true
        } else {
            false
        }
    }

    /// Eat a token of `kind` and return it. Block comments in the way are skipped.
    fn expect(&mut self, kind: TokenKind, hint: Option<&str>) -> Result<Token, PierogiError> {
        if self.current().kind == TokenKind::BlockComment {
            self.consume_block_comments();
        }
        if !self.eat(kind) {
            return Err(PierogiError::UnexpectedToken {
                expected: vec![kind],
                actual:   self.current().clone(),
                hint:     hint.map(str::to_string),
            });
        }
        Ok(self.peek(self.index - 1).clone())
    }

    /// Consume a run of block comments, keeping only the text of the last one.
    fn consume_block_comments(&mut self) -> String {
        let mut documentation = String::new();
        while self.current().kind == TokenKind::BlockComment {
            documentation = self.current().lexeme.clone();
            self.index += 1;
        }
        documentation
    }

    fn parse_integer(token: &Token) -> Result<i32, PierogiError> {
        token.lexeme.parse::<i32>().map_err(|_| PierogiError::InvalidNumber {
            lexeme: token.lexeme.clone(),
            span:   token.span,
        })
    }

    // -- Grammar --

    /// definition* EOF
    fn parse_definitions(&mut self) -> Result<(), PierogiError> {
        while self.index < self.tokens.len() && !self.eat(TokenKind::EndOfFile) {
            let documentation = self.consume_block_comments();
            // Comments after the last definition.
            if self.current().kind == TokenKind::EndOfFile {
                continue;
            }
            let attributes = self.eat_all_attributes()?;

            let is_read_only = self.eat(TokenKind::ReadOnly);
            let kind = if self.eat(TokenKind::Enum) {
                AggregateKind::Enum
            } else if self.eat(TokenKind::Struct) {
                AggregateKind::Struct
            } else if self.eat(TokenKind::Message) {
                AggregateKind::Message
            } else {
                return Err(PierogiError::UnexpectedToken {
                    expected: vec![TokenKind::Enum, TokenKind::Struct, TokenKind::Message],
                    actual:   self.current().clone(),
                    hint:     None,
                });
            };
            self.declare_aggregate_type(kind, is_read_only, documentation, attributes)?;
        }
        Ok(())
    }

    fn eat_all_attributes(&mut self) -> Result<Vec<Attribute>, PierogiError> {
        let mut attributes = Vec::new();
        while let Some(attribute) = self.eat_attribute()? {
            attributes.push(attribute);
        }
        Ok(attributes)
    }

    /// '[' Identifier ( '(' ( String | Number ) ')' )? ']'
    fn eat_attribute(&mut self) -> Result<Option<Attribute>, PierogiError> {
        if !self.eat(TokenKind::OpenBracket) {
            return Ok(None);
        }
        let keyword_token = self.expect(TokenKind::Identifier, None)?;
        let keyword = keyword_token.lexeme.clone();

        let mut value = String::new();
        let mut is_number = false;
        if self.eat(TokenKind::OpenParenthesis) {
            value = self.current().lexeme.clone();
            let accepts_number = keyword == "opcode";
            if self.eat(TokenKind::StringExpandable)
                || self.eat(TokenKind::StringLiteral)
                || (accepts_number && self.eat(TokenKind::Number))
            {
                is_number = self.peek(self.index - 1).kind == TokenKind::Number;
            } else {
                let mut expected = vec![TokenKind::StringExpandable, TokenKind::StringLiteral];
                if accepts_number {
                    expected.push(TokenKind::Number);
                }
                return Err(PierogiError::UnexpectedToken {
                    expected,
                    actual: self.current().clone(),
                    hint:   None,
                });
            }
            self.expect(TokenKind::CloseParenthesis, None)?;
        }
        self.expect(TokenKind::CloseBracket, None)?;

        Attribute::from_keyword(&keyword, value, is_number)
            .map(Some)
            .ok_or_else(|| PierogiError::UnknownAttribute { keyword, token: keyword_token })
    }

    /// Identifier '{' member* '}'
    fn declare_aggregate_type(
        &mut self,
        kind: AggregateKind,
        is_read_only: bool,
        documentation: String,
        attributes: Vec<Attribute>,
    ) -> Result<(), PierogiError> {
        let name_hint = format!("Did you forget to specify a name for this {}?", kind.keyword());
        let definition_token = self.expect(TokenKind::Identifier, Some(name_hint.as_str()))?;
        self.expect(TokenKind::OpenBrace, None)?;

        let mut fields = Vec::new();
        while !self.eat(TokenKind::CloseBrace) {
            let field_documentation = self.consume_block_comments();
            // Documentation may be the last thing in a body.
            if self.eat(TokenKind::CloseBrace) {
                break;
            }
            fields.push(self.parse_member(kind, &definition_token, field_documentation)?);
        }
        let closing = self.peek(self.index - 1);

        let definition = Definition {
            name:          definition_token.lexeme.clone(),
            is_read_only,
            span:          definition_token.span.combine(&closing.span),
            kind,
            fields,
            documentation,
            attributes,
        };
        debug!(
            name = %definition.name,
            kind = kind.keyword(),
            fields = definition.fields.len(),
            "declared definition"
        );
        match self.definitions.entry(definition.name.clone()) {
            Entry::Occupied(_) => Err(PierogiError::MultipleDefinitions {
                name: definition.name,
                span: definition_token.span,
            }),
            Entry::Vacant(slot) => {
                slot.insert(definition);
                Ok(())
            }
        }
    }

    /// One enum constant, struct field or message field, up to and including ';'.
    fn parse_member(
        &mut self,
        kind: AggregateKind,
        definition_token: &Token,
        documentation: String,
    ) -> Result<Field, PierogiError> {
        let deprecated = match self.eat_attribute()? {
            Some(attribute @ Attribute::Deprecated { .. }) => Some(attribute),
            Some(other) => {
                warn!(
                    attribute = other.name(),
                    definition = %definition_token.lexeme,
                    "only [deprecated] is supported on members; ignoring attribute"
                );
                None
            }
            None => None,
        };

        let mut value = 0;
        if kind == AggregateKind::Message {
            let index_token = self.expect(TokenKind::Number, Some(MESSAGE_INDEX_HINT))?;
            value = Self::parse_integer(&index_token)?;
            // The arrow is lexed as '-' followed by '>'.
            self.expect(TokenKind::Hyphen, Some(MESSAGE_INDEX_HINT))?;
            self.expect(TokenKind::CloseCaret, Some(MESSAGE_INDEX_HINT))?;
        }

        let type_ = match kind {
            AggregateKind::Enum => TypeBase::scalar(BaseType::UInt32, definition_token.span),
            AggregateKind::Struct | AggregateKind::Message => self.parse_type(definition_token)?,
        };

        self.consume_block_comments();
        let candidate = self.current();
        if candidate.kind.is_keyword() || (candidate.kind == TokenKind::Identifier && is_keyword(&candidate.lexeme)) {
            return Err(PierogiError::ReservedIdentifier {
                name: candidate.lexeme.clone(),
                span: candidate.span,
            });
        }
        let name_token = self.expect(TokenKind::Identifier, None)?;

        if kind == AggregateKind::Enum {
            self.expect(TokenKind::Eq, Some("Every constant in an enum must have an explicit literal value."))?;
            let value_token = self.expect(TokenKind::Number, Some("An enum constant must have a literal integer value."))?;
            value = Self::parse_integer(&value_token)?;
        }

        let semicolon_hint = format!("Elements in {} are delimited using semicolons.", with_article(kind.keyword()));
        let end_token = self.expect(TokenKind::Semicolon, Some(semicolon_hint.as_str()))?;

        Ok(Field {
            name: name_token.lexeme,
            type_,
            span: name_token.span.combine(&end_token.span),
            deprecated,
            index_or_value: value,
            documentation,
        })
    }

    /// type := ( map[K, V] | array[T] | BaseType | Identifier ) ('[' ']')*
    ///
    /// `definition_token` names the definition being parsed; it is recorded
    /// next to every named type so an unresolved name can say where it was used.
    fn parse_type(&mut self, definition_token: &Token) -> Result<TypeBase, PierogiError> {
        self.consume_block_comments();
        let mut span = self.current().span;

        let mut type_ = if self.eat(TokenKind::Map) {
            self.expect(TokenKind::OpenBracket, Some(MAP_HINT))?;
            let key = self.parse_type(definition_token)?;
            if !key.is_scalar() {
                return Err(PierogiError::InvalidMapKeyType { key_type: key });
            }
            self.expect(TokenKind::Comma, Some(MAP_HINT))?;
            let value = self.parse_type(definition_token)?;
            let close = self.expect(TokenKind::CloseBracket, Some(MAP_HINT))?;
            span = span.combine(&close.span);
            TypeBase::map(key, value, span)
        } else if self.eat(TokenKind::Array) {
            self.expect(TokenKind::OpenBracket, Some(ARRAY_HINT))?;
            let element = self.parse_type(definition_token)?;
            let close = self.expect(TokenKind::CloseBracket, Some(ARRAY_HINT))?;
            span = span.combine(&close.span);
            let display = format!("{}[]", element.display());
            TypeBase::array(element, span, display)
        } else if let Some(base) = self.current_base_type() {
            let token = self.expect(TokenKind::Identifier, None)?;
            TypeBase::scalar(base, token.span)
        } else {
            let token = self.expect(TokenKind::Identifier, None)?;
            self.type_references.push((token.clone(), definition_token.clone()));
            TypeBase::defined(&token.lexeme, token.span)
        };

        while self.eat(TokenKind::OpenBracket) {
            let close = self.expect(TokenKind::CloseBracket, Some(ARRAY_SUFFIX_HINT))?;
            span = span.combine(&close.span);
            let display = format!("{}[]", type_.display());
            type_ = TypeBase::array(type_, span, display);
        }

        Ok(type_)
    }

    fn current_base_type(&self) -> Option<BaseType> {
        let token = self.current();
        if token.kind == TokenKind::Identifier {
            BaseType::from_name(&token.lexeme)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Schema, PierogiError> {
        SchemaParser::from_textual_schema(text, "Test").evaluate()
    }

    #[test]
    fn struct_with_scalar_field() {
        let schema = parse("struct A { string s; }").unwrap();
        assert_eq!(schema.namespace, "Test");
        let def = schema.definition("A").unwrap();
        assert_eq!(def.kind, AggregateKind::Struct);
        assert_eq!(def.fields.len(), 1);
        assert_eq!(def.fields[0].name, "s");
        assert!(matches!(def.fields[0].type_, TypeBase::Scalar { base: BaseType::String, .. }));
        assert_eq!(def.fields[0].index_or_value, 0);
    }

    #[test]
    fn definition_span_runs_from_name_to_closing_brace() {
        let schema = parse("struct A {\n  string s;\n}").unwrap();
        let def = schema.definition("A").unwrap();
        assert_eq!(def.span.start.offset, 7);
        assert_eq!(def.span.end.line, 3);
        assert_eq!(def.span.end.column, 2);
        let field = &def.fields[0];
        assert_eq!((field.span.start.column, field.span.end.column), (10, 12));
    }

    #[test]
    fn postfix_arrays_nest_left_to_right() {
        let schema = parse("struct A { Foo[][] f; } struct Foo { }").unwrap();
        let field = &schema.definition("A").unwrap().fields[0];
        assert_eq!(field.type_.display(), "Foo[][]");
        match &field.type_ {
            TypeBase::Array { element, .. } => match element.as_ref() {
                TypeBase::Array { element, .. } => {
                    assert!(matches!(element.as_ref(), TypeBase::Defined { name, .. } if name == "Foo"))
                }
                other => panic!("expected inner array, got {:?}", other),
            },
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn member_documentation_keeps_last_comment() {
        let schema = parse("struct A { /* one */ /* two */ string s; /* trailing */ }").unwrap();
        let def = schema.definition("A").unwrap();
        assert_eq!(def.fields.len(), 1);
        assert_eq!(def.fields[0].documentation, "two");
    }

    #[test]
    fn non_deprecated_member_attribute_is_ignored() {
        let schema = parse("struct A { [opcode(1)] string s; }").unwrap();
        assert_eq!(schema.definition("A").unwrap().fields[0].deprecated, None);
    }

    #[test]
    fn attribute_argument_must_be_a_literal() {
        let err = parse("[query(12)] message M { }").unwrap_err();
        match err {
            PierogiError::UnexpectedToken { expected, actual, .. } => {
                assert_eq!(expected, vec![TokenKind::StringExpandable, TokenKind::StringLiteral]);
                assert_eq!(actual.lexeme, "12");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn evaluate_resets_state_between_runs() {
        let mut parser = SchemaParser::from_textual_schema("struct A { B b; } struct B { }", "Test");
        let first = parser.evaluate().unwrap();
        let second = parser.evaluate().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn parse_schema_accepts_tokens_without_eof() {
        let mut tokens = crate::tokenizer::tokenize_schema("enum E { X = 1; }").unwrap();
        tokens.pop();
        let schema = parse_schema(&tokens, "").unwrap();
        assert_eq!(schema.definition("E").unwrap().fields[0].index_or_value, 1);
    }

    #[test]
    fn oversized_integer_is_rejected() {
        let err = parse("enum E { X = 99999999999; }").unwrap_err();
        assert!(matches!(err, PierogiError::InvalidNumber { ref lexeme, .. } if lexeme == "99999999999"));
    }

    #[test]
    fn oversized_message_index_is_rejected() {
        let err = parse("message M { 2147483648 -> int32 a; }").unwrap_err();
        match err {
            PierogiError::InvalidNumber { lexeme, span } => {
                assert_eq!(lexeme, "2147483648");
                assert_eq!(span.start.column, 13);
            }
            other => panic!("expected InvalidNumber, got {:?}", other),
        }
        assert!(parse("message M { 2147483647 -> int32 a; }").is_ok());
    }
}
