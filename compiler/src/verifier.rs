use tracing::trace;

use crate::{
    error::PierogiError,
    tokenizer::Token,
    types::{DefinitionMap, Schema},
};

/// A named-type usage: the type name token and the name token of the definition using it.
pub type TypeReference = (Token, Token);

/// Fails on the first reference, in recording order, whose name was never defined.
///
/// Runs only once every definition is known, so forward and mutually
/// recursive references resolve.
pub fn resolve_references(definitions: &DefinitionMap, references: &[TypeReference]) -> Result<(), PierogiError> {
    for (type_token, definition_token) in references {
        trace!(name = %type_token.lexeme, used_in = %definition_token.lexeme, "resolving type reference");
        if !definitions.contains_key(&type_token.lexeme) {
            return Err(PierogiError::UnrecognizedType {
                name:    type_token.lexeme.clone(),
                used_in: definition_token.lexeme.clone(),
                span:    type_token.span,
            });
        }
    }
    Ok(())
}

/// Checks every attribute payload of every definition.
pub fn verify_attributes(schema: &Schema) -> Result<(), PierogiError> {
    for def in schema.definitions.values() {
        let field_attributes = def.fields.iter().filter_map(|f| f.deprecated.as_ref());
        for attribute in def.attributes.iter().chain(field_attributes) {
            if let Err(reason) = attribute.try_validate() {
                return Err(PierogiError::InvalidAttribute {
                    name:       attribute.name().to_string(),
                    reason,
                    definition: def.name.clone(),
                    span:       def.span,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        span::Span,
        tokenizer::TokenKind,
        types::{AggregateKind, Attribute, Definition},
    };

    fn ident(text: &str) -> Token {
        Token { kind: TokenKind::Identifier, lexeme: text.into(), span: Span::default() }
    }

    fn definition(name: &str, attributes: Vec<Attribute>) -> Definition {
        Definition {
            name:          name.into(),
            is_read_only:  false,
            span:          Span::default(),
            kind:          AggregateKind::Message,
            fields:        vec![],
            documentation: String::new(),
            attributes,
        }
    }

    #[test]
    fn first_unresolved_reference_is_reported() {
        let mut defs = DefinitionMap::new();
        defs.insert("A".into(), definition("A", vec![]));
        let refs = vec![(ident("A"), ident("B")), (ident("X"), ident("B")), (ident("Y"), ident("A"))];
        match resolve_references(&defs, &refs) {
            Err(PierogiError::UnrecognizedType { name, used_in, .. }) => {
                assert_eq!(name, "X");
                assert_eq!(used_in, "B");
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn bad_opcode_fails_verification() {
        let mut definitions = DefinitionMap::new();
        definitions.insert(
            "Ping".into(),
            definition("Ping", vec![Attribute::Opcode { value: "toolong".into(), is_number: false }]),
        );
        let schema = Schema { namespace: String::new(), definitions };
        assert!(matches!(
            verify_attributes(&schema),
            Err(PierogiError::InvalidAttribute { ref name, ref definition, .. }) if name == "opcode" && definition == "Ping"
        ));
    }
}
